//! Listing scanner (Phase 1).
//!
//! Queries the provider once per distinct zip, orders each zip's listings
//! cheapest-first, and concatenates them in configured zip order. A failed
//! zip is reported and dropped; the others carry on.
//!
//! The resulting `ListingBatch` is immutable input to the budget check.

use std::collections::HashSet;

use super::events::{EventSink, PipelineEvent};
use crate::provider::{ListingQuery, ListingStatus, ValuationProvider};
use crate::strategy::BudgetEstimate;
use crate::types::{Listing, ZipFilter};

/// Listing-search settings shared by every zip.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSearch {
    /// Empty means all property types.
    pub property_types: Vec<String>,
    pub status: ListingStatus,
    pub limit: u32,
}

impl Default for ListingSearch {
    fn default() -> Self {
        Self {
            property_types: Vec::new(),
            status: ListingStatus::Active,
            limit: 500,
        }
    }
}

impl ListingSearch {
    pub fn query_for(&self, zip: &ZipFilter) -> ListingQuery {
        ListingQuery {
            zip_code: zip.zip_code.clone(),
            property_types: self.property_types.clone(),
            price: zip.price,
            square_footage: zip.square_footage,
            status: self.status,
            limit: self.limit,
        }
    }
}

/// Everything Phase 1 produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingBatch {
    /// Distinct zips a listing search was issued for (failed ones included).
    pub zips_queried: usize,
    /// Listings in processing order.
    pub listings: Vec<Listing>,
}

impl ListingBatch {
    pub fn estimate(&self) -> BudgetEstimate {
        BudgetEstimate::new(self.zips_queried, self.listings.len())
    }
}

/// Phase 1 driver.
pub struct ListingScanner {
    search: ListingSearch,
}

impl ListingScanner {
    pub fn new(search: ListingSearch) -> Self {
        Self { search }
    }

    pub async fn scan(
        &self,
        provider: &dyn ValuationProvider,
        zips: &[ZipFilter],
        sink: &dyn EventSink,
    ) -> ListingBatch {
        let mut seen = HashSet::new();
        let mut batch = ListingBatch::default();

        for zip in zips {
            if !seen.insert(zip.zip_code.as_str()) {
                continue;
            }
            batch.zips_queried += 1;

            match provider.search_listings(&self.search.query_for(zip)).await {
                Ok(mut listings) => {
                    sort_cheapest_first(&mut listings);
                    sink.emit(PipelineEvent::ListingsFetched {
                        zip_code: zip.zip_code.clone(),
                        count: listings.len(),
                    });
                    batch.listings.extend(listings);
                }
                Err(e) => {
                    sink.emit(PipelineEvent::ListingFetchFailed {
                        zip_code: zip.zip_code.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        batch
    }
}

/// Stable ascending sort by list price.
pub fn sort_cheapest_first(listings: &mut [Listing]) {
    listings.sort_by(|a, b| a.list_price.total_cmp(&b.list_price));
}
