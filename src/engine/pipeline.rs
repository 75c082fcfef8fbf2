//! Property analysis pipeline.
//!
//! Three phases with a hard gate between the second and third:
//!
//! 1. **Scan**: fetch listings for every zip (`ListingScanner`).
//! 2. **Budget**: pure check over the call counts from stage 1. Over
//!    budget aborts the run with no output.
//! 3. **Analyse**: for each listing, in scan order, fetch sold
//!    comparables, filter, price, and decide. Failures are recorded on
//!    that listing's `PropertyAnalysis` and the run continues.
//!
//! The output is ranked by upside profit, descending, with a stable sort.

use super::events::{EventSink, PipelineEvent};
use super::scanner::{ListingBatch, ListingScanner, ListingSearch};
use crate::provider::{SoldQuery, ValuationProvider};
use crate::strategy::{BudgetGuard, CompFilter, CostModel, DecisionEngine};
use crate::types::{
    AnalysisFailure, Coordinates, Listing, ListingStage, PropertyAnalysis, QueryRange,
    ReportError, Valuation, ZipFilter,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Comparable search window below the subject's square footage.
pub const COMP_SQFT_BELOW: i64 = 200;
/// Comparable search window above the subject's square footage.
pub const COMP_SQFT_ABOVE: i64 = 400;
/// Upper bedroom bound for comparable searches.
pub const COMP_MAX_BEDROOMS: i64 = 5;
/// Upper bathroom bound for comparable searches.
pub const COMP_MAX_BATHROOMS: i64 = 4;

/// Sold-comparables search settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompSearch {
    pub radius_miles: f64,
    pub max_age_days: u32,
    pub limit: u32,
}

impl Default for CompSearch {
    fn default() -> Self {
        Self {
            radius_miles: 1.0,
            max_age_days: 180,
            limit: 500,
        }
    }
}

/// Everything the pipeline needs from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub listing_search: ListingSearch,
    pub comp_search: CompSearch,
    pub cost_model: CostModel,
    pub upside_threshold: f64,
    pub comp_price_ceiling: f64,
    pub max_api_calls: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            listing_search: ListingSearch::default(),
            comp_search: CompSearch::default(),
            cost_model: CostModel::default(),
            upside_threshold: 30_000.0,
            comp_price_ceiling: 1_500_000.0,
            max_api_calls: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline<'a> {
    provider: &'a dyn ValuationProvider,
    sink: &'a dyn EventSink,
    scanner: ListingScanner,
    guard: BudgetGuard,
    comp_filter: CompFilter,
    engine: DecisionEngine,
    comp_search: CompSearch,
    property_types: Vec<String>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        provider: &'a dyn ValuationProvider,
        settings: PipelineSettings,
        sink: &'a dyn EventSink,
    ) -> Self {
        let property_types = settings.listing_search.property_types.clone();
        Self {
            provider,
            sink,
            scanner: ListingScanner::new(settings.listing_search),
            guard: BudgetGuard::new(settings.max_api_calls),
            comp_filter: CompFilter::new(settings.comp_price_ceiling),
            engine: DecisionEngine::new(settings.cost_model, settings.upside_threshold),
            comp_search: settings.comp_search,
            property_types,
        }
    }

    /// Run all three phases and return the ranked analyses.
    ///
    /// Only a budget overrun escapes as an error.
    pub async fn run(&self, zips: &[ZipFilter]) -> Result<Vec<PropertyAnalysis>, ReportError> {
        let batch = self.scanner.scan(self.provider, zips, self.sink).await;
        self.check_budget(&batch)?;

        let mut analyses = Vec::with_capacity(batch.listings.len());
        for listing in &batch.listings {
            analyses.push(self.analyze_listing(listing).await);
        }

        let scored = analyses.iter().filter(|a| !a.is_error()).count();
        self.sink.emit(PipelineEvent::RunCompleted {
            analyzed: analyses.len(),
            scored,
            skipped: analyses.len() - scored,
            recommended: analyses.iter().filter(|a| a.decision().is_yes()).count(),
        });

        Ok(rank(analyses))
    }

    fn check_budget(&self, batch: &ListingBatch) -> Result<(), ReportError> {
        let estimate = batch.estimate();
        self.sink.emit(PipelineEvent::BudgetChecked {
            zips_queried: estimate.zips_queried,
            listings: estimate.listings,
            estimated_calls: estimate.total_calls(),
            max_api_calls: self.guard.max_api_calls(),
            headroom: self.guard.headroom(&estimate),
        });

        self.guard.check(&estimate).map_err(|e| {
            self.sink.emit(PipelineEvent::BudgetExceeded {
                estimated_calls: estimate.total_calls(),
                max_api_calls: self.guard.max_api_calls(),
            });
            e
        })
    }

    /// Analyse one listing. Never fails; failures become a skipped record.
    pub async fn analyze_listing(&self, listing: &Listing) -> PropertyAnalysis {
        self.reached(listing, ListingStage::Pending);

        match self.score(listing).await {
            Ok(valuation) => {
                self.reached(listing, ListingStage::Scored);
                self.sink.emit(PipelineEvent::ListingScored {
                    address: listing.address.clone(),
                    list_price: listing.list_price,
                    min_comp_price: valuation.min_comp_price,
                    max_comp_price: valuation.upside_value,
                    all_inclusive_cost: valuation.all_inclusive_cost,
                    min_profit: valuation.min_profit,
                    upside_profit: valuation.upside_profit,
                    decision: valuation.decision,
                });
                PropertyAnalysis::scored(listing.subject(), valuation)
            }
            Err(failure) => {
                self.sink.emit(PipelineEvent::ListingSkipped {
                    address: listing.address.clone(),
                    stage: failure.stage(),
                    reason: failure.to_string(),
                });
                PropertyAnalysis::skipped(listing.subject(), failure)
            }
        }
    }

    async fn score(&self, listing: &Listing) -> Result<Valuation, AnalysisFailure> {
        let center = listing
            .coordinates()
            .ok_or(AnalysisFailure::MissingCoordinates)?;
        self.reached(listing, ListingStage::CoordinatesChecked);

        let query = sold_query_for(listing, center, &self.comp_search, &self.property_types);
        let sold = self.provider.search_sold_properties(&query).await?;
        self.reached(listing, ListingStage::CompsFetched);
        if sold.is_empty() {
            return Err(AnalysisFailure::NoComparables);
        }

        let comps = self.comp_filter.filter(&sold, listing.list_price);
        self.reached(listing, ListingStage::CompsFiltered);
        let comps = comps?;

        Ok(self.engine.evaluate(listing, &comps))
    }

    fn reached(&self, listing: &Listing, stage: ListingStage) {
        self.sink.emit(PipelineEvent::StageReached {
            address: listing.address.clone(),
            stage,
        });
    }
}

/// Sold-comparables query for a subject listing.
///
/// Square footage spans `[sqft - 200, sqft + 400]`, bedrooms
/// `[subject, 5]`, bathrooms `[subject, 4]`.
pub fn sold_query_for(
    listing: &Listing,
    center: Coordinates,
    search: &CompSearch,
    property_types: &[String],
) -> SoldQuery {
    let sqft = i64::from(listing.square_footage);
    SoldQuery {
        center,
        radius_miles: search.radius_miles,
        max_age_days: search.max_age_days,
        bedrooms: QueryRange::new(listing.bedrooms.map(i64::from), Some(COMP_MAX_BEDROOMS)),
        bathrooms: QueryRange::new(
            listing.bathrooms.map(|b| b.trunc() as i64),
            Some(COMP_MAX_BATHROOMS),
        ),
        square_footage: QueryRange::between(
            (sqft - COMP_SQFT_BELOW).max(0),
            sqft + COMP_SQFT_ABOVE,
        ),
        property_types: property_types.to_vec(),
        limit: search.limit,
    }
}

/// Stable sort by upside profit, highest first.
pub fn rank(mut analyses: Vec<PropertyAnalysis>) -> Vec<PropertyAnalysis> {
    analyses.sort_by(|a, b| b.upside_profit().total_cmp(&a.upside_profit()));
    analyses
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
