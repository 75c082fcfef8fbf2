//! HTML report rendering.
//!
//! Renders ranked analyses into a self-contained HTML page with `maud`,
//! computes the run summary, and writes the page to disk. Delivery lives
//! in `mailer`.

pub mod mailer;

use chrono::{DateTime, Local};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::PipelineSettings;
use crate::types::{format_currency, PropertyAnalysis, ReportError};

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Headline numbers for one run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReportSummary {
    pub total: usize,
    pub yes: usize,
    pub no: usize,
    pub errors: usize,
    /// Sum of upside profit over analyses where it is positive.
    pub total_positive_upside: f64,
}

impl ReportSummary {
    pub fn from_analyses(analyses: &[PropertyAnalysis]) -> Self {
        let yes = analyses.iter().filter(|a| a.decision().is_yes()).count();
        Self {
            total: analyses.len(),
            yes,
            no: analyses.len() - yes,
            errors: analyses.iter().filter(|a| a.is_error()).count(),
            total_positive_upside: analyses
                .iter()
                .map(|a| a.upside_profit())
                .filter(|p| *p > 0.0)
                .sum(),
        }
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} analysed | {} yes | {} no | {} errors | {} total upside",
            self.total,
            self.yes,
            self.no,
            self.errors,
            format_currency(self.total_positive_upside)
        )
    }
}

// ---------------------------------------------------------------------------
// Styling
// ---------------------------------------------------------------------------

/// Profit cell styling tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfitTier {
    Strong,
    Good,
    Positive,
    Negative,
}

impl ProfitTier {
    pub fn for_profit(profit: f64) -> Self {
        if profit > 50_000.0 {
            ProfitTier::Strong
        } else if profit > 30_000.0 {
            ProfitTier::Good
        } else if profit > 0.0 {
            ProfitTier::Positive
        } else {
            ProfitTier::Negative
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            ProfitTier::Strong => "profit-strong",
            ProfitTier::Good => "profit-good",
            ProfitTier::Positive => "profit-positive",
            ProfitTier::Negative => "profit-negative",
        }
    }
}

const STYLE: &str = r#"
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 20px; background-color: #f5f5f5; }
.container { background-color: #fff; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); padding: 30px; margin: 0 auto; }
h1 { color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px; }
.summary { background-color: #ecf0f1; padding: 15px; border-radius: 5px; margin-bottom: 25px; }
.summary-item { display: inline-block; margin-right: 30px; }
.summary-label { font-weight: bold; color: #7f8c8d; }
.yes-count { color: #27ae60; font-weight: bold; }
.no-count { color: #c0392b; font-weight: bold; }
table { width: 100%; border-collapse: collapse; font-size: 13px; }
th { background-color: #3498db; color: #fff; padding: 10px 8px; text-align: left; }
td { padding: 8px; border-bottom: 1px solid #ddd; vertical-align: top; }
tr:nth-child(even) { background-color: #f9f9f9; }
.price-cell { text-align: right; white-space: nowrap; }
.comparables-cell { font-size: 11px; color: #666; max-width: 220px; }
.error-row { background-color: #fff5f5 !important; }
.error-message { color: #c0392b; font-size: 11px; }
.decision-yes { background-color: #d4edda; color: #155724; font-weight: bold; }
.decision-no { background-color: #f8d7da; color: #721c24; }
.profit-strong { background-color: #d4edda; color: #155724; font-weight: bold; }
.profit-good { background-color: #fff3cd; color: #856404; }
.profit-positive { color: #155724; }
.profit-negative { background-color: #f8d7da; color: #721c24; }
.legend { margin-top: 25px; padding: 15px; background-color: #f8f9fa; border-left: 4px solid #3498db; font-size: 13px; }
.footer { margin-top: 20px; font-size: 12px; color: #7f8c8d; }
"#;

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the full report page.
pub fn render(
    analyses: &[PropertyAnalysis],
    settings: &PipelineSettings,
    generated_at: DateTime<Local>,
) -> Markup {
    let summary = ReportSummary::from_analyses(analyses);

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="UTF-8";
                title { "Property Investment Report" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                div class="container" {
                    h1 { "Property Investment Report" }
                    p { "Report date: " (generated_at.format("%B %d, %Y").to_string()) }
                    (summary_block(&summary))
                    table {
                        thead {
                            tr {
                                th { "#" }
                                th { "Property Address" }
                                th { "List Price" }
                                th { "Best Offer Price" }
                                th { "Best Offer Comparables" }
                                th { "Build Up Cost" }
                                th { "Financing Cost" }
                                th { "All Inclusive Cost" }
                                th { "Upside Value" }
                                th { "Upside Comparables" }
                                th { "Upside Profit" }
                                th { "Decision" }
                            }
                        }
                        tbody {
                            @for (idx, analysis) in analyses.iter().enumerate() {
                                (analysis_row(idx + 1, analysis))
                            }
                        }
                    }
                    (legend(settings))
                    div class="footer" {
                        p { "Properties are sorted by Upside Profit (highest first)." }
                        p { "Generated at: " (generated_at.format("%Y-%m-%d %H:%M:%S").to_string()) }
                    }
                }
            }
        }
    }
}

/// Render straight to a string.
pub fn render_html(
    analyses: &[PropertyAnalysis],
    settings: &PipelineSettings,
    generated_at: DateTime<Local>,
) -> String {
    render(analyses, settings, generated_at).into_string()
}

fn summary_block(summary: &ReportSummary) -> Markup {
    html! {
        div class="summary" {
            div class="summary-item" {
                span class="summary-label" { "Total Properties: " }
                span class="summary-value" { (summary.total) }
            }
            div class="summary-item" {
                span class="summary-label" { "Recommended (Yes): " }
                span class="summary-value yes-count" { (summary.yes) }
            }
            div class="summary-item" {
                span class="summary-label" { "Not Recommended (No): " }
                span class="summary-value no-count" { (summary.no) }
            }
            @if summary.errors > 0 {
                div class="summary-item" {
                    span class="summary-label" { "Errors: " }
                    span class="summary-value" { (summary.errors) }
                }
            }
        }
    }
}

fn analysis_row(idx: usize, a: &PropertyAnalysis) -> Markup {
    let decision_class = if a.decision().is_yes() {
        "decision-cell decision-yes"
    } else {
        "decision-cell decision-no"
    };
    let profit_class = format!(
        "price-cell {}",
        ProfitTier::for_profit(a.upside_profit()).css_class()
    );

    html! {
        tr class=[a.is_error().then_some("error-row")] {
            td { (idx) }
            td class="address-cell" {
                (a.subject.address)
                @if let Some(msg) = a.error_message() {
                    br;
                    span class="error-message" { (msg) }
                }
            }
            td class="price-cell" { (format_currency(a.subject.list_price)) }
            td class="price-cell" { (format_currency(a.best_offer_price())) }
            td class="comparables-cell" { (comparables(a.best_offer_comparables())) }
            td class="price-cell" { (format_currency(a.build_up_cost())) }
            td class="price-cell" { (format_currency(a.financing_cost())) }
            td class="price-cell" { (format_currency(a.all_inclusive_cost())) }
            td class="price-cell" { (format_currency(a.upside_value())) }
            td class="comparables-cell" { (comparables(a.upside_comparables())) }
            td class=(profit_class) { (format_currency(a.upside_profit())) }
            td class=(decision_class) { (a.decision().to_string()) }
        }
    }
}

fn comparables(addresses: &[String]) -> Markup {
    html! {
        @if addresses.is_empty() {
            "N/A"
        } @else {
            @for (i, addr) in addresses.iter().enumerate() {
                @if i > 0 { br; }
                "• " (addr)
            }
        }
    }
}

fn legend(settings: &PipelineSettings) -> Markup {
    let costs = &settings.cost_model;
    let search = &settings.comp_search;
    html! {
        div class="legend" {
            strong { "Report Calculations:" }
            ul {
                li { strong { "Best Offer Price: " } "Current list price." }
                li {
                    strong { "Comparables: " }
                    "Sold properties within " (search.radius_miles) " miles, last "
                    (search.max_age_days) " days, priced between 1.5x list and "
                    (format_currency(settings.comp_price_ceiling)) "."
                }
                li {
                    strong { "Build Up Cost: " }
                    (format_currency(costs.cost_per_sqft)) " per square foot."
                }
                li {
                    strong { "Financing Cost: " }
                    (costs.financing_rate * 100.0) "% of (Best Offer Price + Build Up Cost)."
                }
                li { strong { "All Inclusive Cost: " } "Best Offer Price + Build Up Cost + Financing Cost." }
                li { strong { "Upside Value: " } "Highest qualifying comparable sale price." }
                li { strong { "Upside Profit: " } "Upside Value - All Inclusive Cost." }
                li {
                    strong { "Decision: " }
                    "\"Yes\" if Upside Profit > " (format_currency(settings.upside_threshold))
                    ", otherwise \"No\"."
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// `property_report_YYYYMMDD_HHMMSS.html` in the working directory.
pub fn default_report_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("property_report_{}.html", now.format("%Y%m%d_%H%M%S")))
}

pub fn save_to_file(html: &str, path: &Path) -> Result<(), ReportError> {
    fs::write(path, html)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
