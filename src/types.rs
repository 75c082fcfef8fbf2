//! Shared types for the property report pipeline.
//!
//! These types form the data model used across all modules. Provider
//! clients produce `Listing` and `SoldProperty`, the strategy layer turns
//! them into a `Valuation`, and the engine wraps each subject in a
//! `PropertyAnalysis` that the report layer renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::provider::ProviderError;

/// Square footage assumed when a listing doesn't report one.
pub const DEFAULT_SQUARE_FOOTAGE: u32 = 1000;

/// Property type assumed when a listing doesn't report one.
pub const DEFAULT_PROPERTY_TYPE: &str = "Single Family";

// ---------------------------------------------------------------------------
// Query ranges
// ---------------------------------------------------------------------------

/// Inclusive numeric bound pair used in provider queries.
///
/// Serialised as `min:max`, with `*` standing in for an absent bound.
/// A range with neither bound is omitted from the query entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl QueryRange {
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }

    pub fn between(min: i64, max: i64) -> Self {
        Self::new(Some(min), Some(max))
    }

    /// Build a range from float bounds, truncating toward zero.
    pub fn from_f64(min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(min.map(|v| v.trunc() as i64), max.map(|v| v.trunc() as i64))
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Whether the lower bound exceeds the upper bound.
    pub fn is_inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(lo), Some(hi)) if lo > hi)
    }

    /// Query-string value, or `None` when both bounds are absent.
    pub fn to_param(&self) -> Option<String> {
        if self.is_unbounded() {
            return None;
        }
        Some(self.to_string())
    }
}

impl fmt::Display for QueryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<i64>| b.map(|v| v.to_string()).unwrap_or_else(|| "*".to_string());
        write!(f, "{}:{}", bound(self.min), bound(self.max))
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Search filter for one target zip code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipFilter {
    pub zip_code: String,
    pub price: QueryRange,
    pub square_footage: QueryRange,
}

impl ZipFilter {
    pub fn new(zip_code: impl Into<String>) -> Self {
        Self {
            zip_code: zip_code.into(),
            price: QueryRange::default(),
            square_footage: QueryRange::default(),
        }
    }

    pub fn with_price(mut self, price: QueryRange) -> Self {
        self.price = price;
        self
    }

    pub fn with_square_footage(mut self, sqft: QueryRange) -> Self {
        self.square_footage = sqft;
        self
    }
}

impl fmt::Display for ZipFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (price {} | sqft {})",
            self.zip_code, self.price, self.square_footage
        )
    }
}

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A property currently listed for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub address: String,
    pub zip_code: String,
    pub list_price: f64,
    pub square_footage: u32,
    pub property_type: String,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Listing {
    /// Both coordinates, if the provider reported them.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        }
    }

    /// Identity fields carried into the analysis record.
    pub fn subject(&self) -> Subject {
        Subject {
            address: self.address.clone(),
            zip_code: self.zip_code.clone(),
            list_price: self.list_price,
            square_footage: self.square_footage,
            property_type: self.property_type.clone(),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
        }
    }

    #[cfg(test)]
    pub fn sample() -> Self {
        Listing {
            address: "123 Oak St, Austin, TX 78701".to_string(),
            zip_code: "78701".to_string(),
            list_price: 200_000.0,
            square_footage: 1000,
            property_type: "Single Family".to_string(),
            bedrooms: Some(3),
            bathrooms: Some(2.0),
            latitude: Some(30.2672),
            longitude: Some(-97.7431),
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (${:.0} | {} sqft | {})",
            self.address, self.list_price, self.square_footage, self.property_type
        )
    }
}

/// A property with a recorded sale, returned by the radius search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldProperty {
    pub address: String,
    pub sale_price: Option<f64>,
    pub sale_date: Option<DateTime<Utc>>,
    pub square_footage: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
}

/// A sold property that passed the price-band filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredComp {
    pub address: String,
    pub price: f64,
}

impl fmt::Display for FilteredComp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, format_currency(self.price))
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Binary investment recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Decision {
    Yes,
    #[default]
    No,
}

impl Decision {
    pub fn is_yes(&self) -> bool {
        matches!(self, Decision::Yes)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Yes => write!(f, "Yes"),
            Decision::No => write!(f, "No"),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-listing lifecycle
// ---------------------------------------------------------------------------

/// Progress of a single listing through the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingStage {
    Pending,
    CoordinatesChecked,
    CompsFetched,
    CompsFiltered,
    Scored,
}

impl fmt::Display for ListingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingStage::Pending => write!(f, "pending"),
            ListingStage::CoordinatesChecked => write!(f, "coordinates_checked"),
            ListingStage::CompsFetched => write!(f, "comps_fetched"),
            ListingStage::CompsFiltered => write!(f, "comps_filtered"),
            ListingStage::Scored => write!(f, "scored"),
        }
    }
}

/// Why a listing could not be scored. Recorded on the analysis, never fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisFailure {
    #[error("Missing latitude/longitude; cannot search for comparable sales")]
    MissingCoordinates,

    #[error("{0}")]
    ComparablesUnavailable(#[from] ProviderError),

    #[error("No sold properties found within the search radius")]
    NoComparables,

    #[error(
        "None of {candidates} sold properties priced between {} and {}",
        currency(.floor),
        currency(.ceiling)
    )]
    NoQualifyingComparables {
        candidates: usize,
        floor: f64,
        ceiling: f64,
    },
}

impl AnalysisFailure {
    /// The last stage the listing reached before failing.
    pub fn stage(&self) -> ListingStage {
        match self {
            AnalysisFailure::MissingCoordinates => ListingStage::Pending,
            AnalysisFailure::ComparablesUnavailable(_) => ListingStage::CoordinatesChecked,
            AnalysisFailure::NoComparables => ListingStage::CompsFetched,
            AnalysisFailure::NoQualifyingComparables { .. } => ListingStage::CompsFiltered,
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis output
// ---------------------------------------------------------------------------

/// Identity of the analysed listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub address: String,
    pub zip_code: String,
    pub list_price: f64,
    pub square_footage: u32,
    pub property_type: String,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
}

/// Every derived figure for a successfully scored listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub best_offer_price: f64,
    pub best_offer_comparables: Vec<String>,
    pub build_up_cost: f64,
    pub financing_cost: f64,
    pub all_inclusive_cost: f64,
    pub upside_value: f64,
    pub upside_comparables: Vec<String>,
    pub upside_profit: f64,
    pub decision: Decision,
    /// Lowest qualifying comparable price (diagnostic only).
    pub min_comp_price: f64,
    /// Profit against the lowest comparable (diagnostic only).
    pub min_profit: f64,
}

/// Tagged result of analysing one listing.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Scored(Valuation),
    Skipped(AnalysisFailure),
}

/// The unit of output: one analysed listing.
///
/// Skipped analyses report zero for every derived figure and a `No`
/// decision through the accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAnalysis {
    pub subject: Subject,
    pub outcome: AnalysisOutcome,
}

impl PropertyAnalysis {
    pub fn scored(subject: Subject, valuation: Valuation) -> Self {
        Self {
            subject,
            outcome: AnalysisOutcome::Scored(valuation),
        }
    }

    pub fn skipped(subject: Subject, failure: AnalysisFailure) -> Self {
        Self {
            subject,
            outcome: AnalysisOutcome::Skipped(failure),
        }
    }

    pub fn valuation(&self) -> Option<&Valuation> {
        match &self.outcome {
            AnalysisOutcome::Scored(v) => Some(v),
            AnalysisOutcome::Skipped(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AnalysisFailure> {
        match &self.outcome {
            AnalysisOutcome::Scored(_) => None,
            AnalysisOutcome::Skipped(f) => Some(f),
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.failure().map(|f| f.to_string())
    }

    pub fn is_error(&self) -> bool {
        self.failure().is_some()
    }

    fn figure(&self, pick: impl Fn(&Valuation) -> f64) -> f64 {
        self.valuation().map(pick).unwrap_or(0.0)
    }

    pub fn best_offer_price(&self) -> f64 {
        self.figure(|v| v.best_offer_price)
    }

    pub fn build_up_cost(&self) -> f64 {
        self.figure(|v| v.build_up_cost)
    }

    pub fn financing_cost(&self) -> f64 {
        self.figure(|v| v.financing_cost)
    }

    pub fn all_inclusive_cost(&self) -> f64 {
        self.figure(|v| v.all_inclusive_cost)
    }

    pub fn upside_value(&self) -> f64 {
        self.figure(|v| v.upside_value)
    }

    pub fn upside_profit(&self) -> f64 {
        self.figure(|v| v.upside_profit)
    }

    pub fn decision(&self) -> Decision {
        self.valuation().map(|v| v.decision).unwrap_or(Decision::No)
    }

    pub fn best_offer_comparables(&self) -> &[String] {
        self.valuation()
            .map(|v| v.best_offer_comparables.as_slice())
            .unwrap_or(&[])
    }

    pub fn upside_comparables(&self) -> &[String] {
        self.valuation()
            .map(|v| v.upside_comparables.as_slice())
            .unwrap_or(&[])
    }
}

impl fmt::Display for PropertyAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AnalysisOutcome::Scored(v) => write!(
                f,
                "{} | list {} | all-in {} | upside {} | profit {} | {}",
                self.subject.address,
                format_currency(self.subject.list_price),
                format_currency(v.all_inclusive_cost),
                format_currency(v.upside_value),
                format_currency(v.upside_profit),
                v.decision,
            ),
            AnalysisOutcome::Skipped(reason) => {
                write!(f, "{} | skipped: {reason}", self.subject.address)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Format a dollar amount as `$1,234,567` (rounded to whole dollars).
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn currency(value: &f64) -> String {
    format_currency(*value)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures that escape the pipeline and end the run.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Budget exceeded: run would make {estimated} provider calls, limit is {ceiling}")]
    BudgetExceeded { estimated: usize, ceiling: usize },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Report delivery failed: {0}")]
    Delivery(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
