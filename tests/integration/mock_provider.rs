//! Mock valuation provider for integration testing.
//!
//! Provides a deterministic `ValuationProvider` implementation that
//! serves canned listings per zip and canned sold properties per subject
//! location, and records every call it receives. All in-memory with no
//! external dependencies.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use property_report::provider::{ListingQuery, ProviderError, SoldQuery, ValuationProvider};
use property_report::types::{Coordinates, Listing, SoldProperty};

/// One request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Listings(String),
    Sold(Coordinates),
}

/// A mock provider for deterministic testing.
///
/// Sold-property responses are keyed by the subject's coordinates, so
/// every listing built with `listing()` gets its own comparables.
#[derive(Default)]
pub struct MockProvider {
    listings: HashMap<String, Result<Vec<Listing>, ProviderError>>,
    sold: HashMap<String, Result<Vec<SoldProperty>, ProviderError>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve these listings for a zip.
    pub fn with_listings(mut self, zip: &str, listings: Vec<Listing>) -> Self {
        self.listings.insert(zip.to_string(), Ok(listings));
        self
    }

    /// Fail the listing search for a zip.
    pub fn with_listing_error(mut self, zip: &str, status: u16) -> Self {
        self.listings.insert(
            zip.to_string(),
            Err(ProviderError::http("/listings/sale", status, "mock failure")),
        );
        self
    }

    /// Serve these sold properties around a listing.
    pub fn with_sold(mut self, subject: &Listing, sold: Vec<SoldProperty>) -> Self {
        if let Some(c) = subject.coordinates() {
            self.sold.insert(key(c), Ok(sold));
        }
        self
    }

    /// Fail the sold search around a listing.
    pub fn with_sold_error(mut self, subject: &Listing, status: u16) -> Self {
        if let Some(c) = subject.coordinates() {
            self.sold.insert(
                key(c),
                Err(ProviderError::http("/properties", status, "mock failure")),
            );
        }
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sold_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Sold(_)))
            .count()
    }
}

fn key(c: Coordinates) -> String {
    format!("{:.6},{:.6}", c.latitude, c.longitude)
}

#[async_trait]
impl ValuationProvider for MockProvider {
    async fn search_listings(&self, query: &ListingQuery) -> Result<Vec<Listing>, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Listings(query.zip_code.clone()));
        self.listings
            .get(&query.zip_code)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn search_sold_properties(
        &self,
        query: &SoldQuery,
    ) -> Result<Vec<SoldProperty>, ProviderError> {
        self.calls.lock().unwrap().push(Call::Sold(query.center));
        self.sold
            .get(&key(query.center))
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 1000 sqft listing with coordinates unique to `id`.
pub fn listing(id: u32, zip: &str, list_price: f64) -> Listing {
    Listing {
        address: format!("{id} Test St, Austin, TX {zip}"),
        zip_code: zip.to_string(),
        list_price,
        square_footage: 1000,
        property_type: "Single Family".to_string(),
        bedrooms: Some(3),
        bathrooms: Some(2.0),
        latitude: Some(30.0 + f64::from(id) / 1000.0),
        longitude: Some(-97.0),
    }
}

pub fn sold(address: &str, price: f64) -> SoldProperty {
    SoldProperty {
        address: address.to_string(),
        sale_price: Some(price),
        sale_date: None,
        square_footage: Some(1100),
        bedrooms: Some(3),
        bathrooms: Some(2.0),
    }
}

/// `n` listings in one zip with ids starting at `first_id`.
pub fn listings(first_id: u32, n: u32, zip: &str) -> Vec<Listing> {
    (first_id..first_id + n)
        .map(|id| listing(id, zip, 150_000.0 + f64::from(id)))
        .collect()
}
