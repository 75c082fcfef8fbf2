//! Comparable-sale filter.
//!
//! Narrows the sold properties around a subject to those usable as
//! after-repair anchors: priced at least 1.5× the subject's list price and
//! no higher than the configured ceiling.

use crate::types::{AnalysisFailure, FilteredComp, SoldProperty};

/// A comparable must have sold for at least this multiple of list price.
pub const MIN_PRICE_MULTIPLE: f64 = 1.5;

/// Comparables shown per analysis in the report.
pub const DISPLAY_COMP_COUNT: usize = 5;

/// Price-band filter for sold comparables.
#[derive(Debug, Clone, Copy)]
pub struct CompFilter {
    price_ceiling: f64,
}

impl CompFilter {
    pub fn new(price_ceiling: f64) -> Self {
        Self { price_ceiling }
    }

    /// Lowest qualifying sale price for a subject at `list_price`.
    pub fn price_floor(list_price: f64) -> f64 {
        MIN_PRICE_MULTIPLE * list_price
    }

    /// Keep sold properties inside the band, sorted ascending by price.
    ///
    /// Properties without a sale price are dropped. An empty result is a
    /// recoverable failure for this listing.
    pub fn filter(&self, sold: &[SoldProperty], list_price: f64) -> Result<CompSet, AnalysisFailure> {
        let floor = Self::price_floor(list_price);

        let mut comps: Vec<FilteredComp> = sold
            .iter()
            .filter_map(|s| match s.sale_price {
                Some(price) if price >= floor && price <= self.price_ceiling => Some(FilteredComp {
                    address: s.address.clone(),
                    price,
                }),
                _ => None,
            })
            .collect();

        if comps.is_empty() {
            return Err(AnalysisFailure::NoQualifyingComparables {
                candidates: sold.len(),
                floor,
                ceiling: self.price_ceiling,
            });
        }

        comps.sort_by(|a, b| a.price.total_cmp(&b.price));
        Ok(CompSet { comps })
    }
}

/// Non-empty set of qualifying comparables, ascending by price.
#[derive(Debug, Clone, PartialEq)]
pub struct CompSet {
    comps: Vec<FilteredComp>,
}

impl CompSet {
    pub fn comps(&self) -> &[FilteredComp] {
        &self.comps
    }

    pub fn min_price(&self) -> f64 {
        self.comps.first().map(|c| c.price).unwrap_or(0.0)
    }

    pub fn max_price(&self) -> f64 {
        self.comps.last().map(|c| c.price).unwrap_or(0.0)
    }

    /// `address ($price)` for the first `DISPLAY_COMP_COUNT` comparables.
    pub fn display(&self) -> Vec<String> {
        self.comps
            .iter()
            .take(DISPLAY_COMP_COUNT)
            .map(|c| c.to_string())
            .collect()
    }
}
