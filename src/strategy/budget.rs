//! Provider-call budget guard.
//!
//! Phase 1 spends one call per distinct zip. Phase 3 will spend exactly
//! one sold-comparables call per collected listing. The guard compares
//! that total against the configured ceiling before Phase 3 starts.

use crate::types::ReportError;

/// Provider calls a run has made plus the calls it is about to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetEstimate {
    /// Distinct zips already queried for listings.
    pub zips_queried: usize,
    /// Listings collected across all zips; each costs one comp search.
    pub listings: usize,
}

impl BudgetEstimate {
    pub fn new(zips_queried: usize, listings: usize) -> Self {
        Self {
            zips_queried,
            listings,
        }
    }

    pub fn total_calls(&self) -> usize {
        self.zips_queried + self.listings
    }
}

/// Aborts a run whose estimated call count exceeds the ceiling.
#[derive(Debug, Clone, Copy)]
pub struct BudgetGuard {
    max_api_calls: usize,
}

impl BudgetGuard {
    pub fn new(max_api_calls: usize) -> Self {
        Self { max_api_calls }
    }

    pub fn max_api_calls(&self) -> usize {
        self.max_api_calls
    }

    /// `Ok` when the estimate fits the ceiling (equal is allowed).
    pub fn check(&self, estimate: &BudgetEstimate) -> Result<(), ReportError> {
        let estimated = estimate.total_calls();
        if estimated > self.max_api_calls {
            return Err(ReportError::BudgetExceeded {
                estimated,
                ceiling: self.max_api_calls,
            });
        }
        Ok(())
    }

    /// Calls left after the estimate, or zero if over budget.
    pub fn headroom(&self, estimate: &BudgetEstimate) -> usize {
        self.max_api_calls.saturating_sub(estimate.total_calls())
    }
}
