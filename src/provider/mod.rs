//! Valuation provider integrations.
//!
//! Defines the `ValuationProvider` trait the pipeline talks to and the
//! query types for its two searches. `rentcast` is the production
//! implementation.

pub mod rentcast;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::types::{Coordinates, Listing, QueryRange, SoldProperty};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Any transport or non-success response from the valuation service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Provider request to {endpoint} failed{}: {message}", status_suffix(.status))]
pub struct ProviderError {
    pub endpoint: String,
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    /// Connection, timeout, or decode failure with no HTTP status.
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Non-2xx response; `body` is the response text as returned.
    pub fn http(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: Some(status),
            message: body.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Listing status filter accepted by the listing search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
pub enum ListingStatus {
    #[default]
    Active,
    Inactive,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "Active",
            ListingStatus::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for the for-sale listing search in one zip code.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub zip_code: String,
    /// Empty means all property types.
    pub property_types: Vec<String>,
    pub price: QueryRange,
    pub square_footage: QueryRange,
    pub status: ListingStatus,
    pub limit: u32,
}

/// Parameters for the sold-property radius search around one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SoldQuery {
    pub center: Coordinates,
    pub radius_miles: f64,
    pub max_age_days: u32,
    pub bedrooms: QueryRange,
    pub bathrooms: QueryRange,
    pub square_footage: QueryRange,
    pub property_types: Vec<String>,
    pub limit: u32,
}

/// Join property types into one query value so several types cost one call.
pub fn join_property_types(types: &[String], delimiter: char) -> Option<String> {
    let joined = types
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(&delimiter.to_string());
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstraction over the external valuation service.
///
/// Each method is exactly one network call. Implementors must not retry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ValuationProvider: Send + Sync {
    /// Search for-sale listings in a zip code.
    async fn search_listings(&self, query: &ListingQuery) -> Result<Vec<Listing>, ProviderError>;

    /// Search properties sold within a radius of a point.
    async fn search_sold_properties(
        &self,
        query: &SoldQuery,
    ) -> Result<Vec<SoldProperty>, ProviderError>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_property_types() {
        let types = vec!["Single Family".to_string(), " Townhouse ".to_string()];
        assert_eq!(
            join_property_types(&types, ',').as_deref(),
            Some("Single Family,Townhouse")
        );
        assert_eq!(
            join_property_types(&types, '|').as_deref(),
            Some("Single Family|Townhouse")
        );
    }

    #[test]
    fn test_join_property_types_empty() {
        assert_eq!(join_property_types(&[], ','), None);
        assert_eq!(join_property_types(&["  ".to_string()], ','), None);
    }

    #[test]
    fn test_provider_error_display() {
        let e = ProviderError::http("/listings/sale", 401, "invalid api key");
        assert_eq!(
            e.to_string(),
            "Provider request to /listings/sale failed (HTTP 401): invalid api key"
        );
        let e = ProviderError::network("/properties", "connection reset");
        assert_eq!(
            e.to_string(),
            "Provider request to /properties failed: connection reset"
        );
    }

    #[test]
    fn test_listing_status() {
        assert_eq!(ListingStatus::default(), ListingStatus::Active);
        assert_eq!(ListingStatus::Inactive.to_string(), "Inactive");
    }
}
