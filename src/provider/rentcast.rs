//! Rentcast valuation API integration.
//!
//! API docs: https://developers.rentcast.io/reference
//! Base URL: https://api.rentcast.io/v1
//! Auth: `X-Api-Key` header on every request.
//!
//! Two endpoints are used:
//! - `/listings/sale`: for-sale listings by zip code
//! - `/properties`: property records, filtered by sale date and radius

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{join_property_types, ListingQuery, ProviderError, SoldQuery, ValuationProvider};
use crate::types::{Listing, SoldProperty, DEFAULT_PROPERTY_TYPE, DEFAULT_SQUARE_FOOTAGE};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.rentcast.io/v1";
const PROVIDER_NAME: &str = "rentcast";

const LISTINGS_ENDPOINT: &str = "/listings/sale";
const PROPERTIES_ENDPOINT: &str = "/properties";

/// `/listings/sale` takes comma-separated types, `/properties` pipe-separated.
const LISTING_TYPE_DELIMITER: char = ',';
const SOLD_TYPE_DELIMITER: char = '|';

// ---------------------------------------------------------------------------
// API response types (Rentcast JSON → Rust)
// ---------------------------------------------------------------------------

/// Sale listing as returned by `/listings/sale`. Only the fields we use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RentcastListing {
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    zip_code: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    square_footage: Option<f64>,
    #[serde(default)]
    property_type: Option<String>,
    #[serde(default)]
    bedrooms: Option<f64>,
    #[serde(default)]
    bathrooms: Option<f64>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

/// Property record as returned by `/properties`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RentcastProperty {
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    last_sale_price: Option<f64>,
    /// ISO-8601 timestamp, e.g. `2024-05-01T00:00:00.000Z`.
    #[serde(default)]
    last_sale_date: Option<String>,
    #[serde(default)]
    square_footage: Option<f64>,
    #[serde(default)]
    bedrooms: Option<f64>,
    #[serde(default)]
    bathrooms: Option<f64>,
}

impl RentcastListing {
    fn into_listing(self) -> Listing {
        let square_footage = self
            .square_footage
            .filter(|s| *s > 0.0)
            .map(|s| s.round() as u32)
            .unwrap_or(DEFAULT_SQUARE_FOOTAGE);

        Listing {
            address: self.formatted_address.unwrap_or_default(),
            zip_code: self.zip_code.unwrap_or_default(),
            list_price: self.price.unwrap_or(0.0),
            square_footage,
            property_type: self
                .property_type
                .unwrap_or_else(|| DEFAULT_PROPERTY_TYPE.to_string()),
            bedrooms: self.bedrooms.map(|b| b.max(0.0) as u32),
            bathrooms: self.bathrooms,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

impl RentcastProperty {
    fn into_sold_property(self) -> SoldProperty {
        let sale_date = self
            .last_sale_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc));

        SoldProperty {
            address: self
                .formatted_address
                .unwrap_or_else(|| "Unknown".to_string()),
            sale_price: self.last_sale_price,
            sale_date,
            square_footage: self.square_footage.map(|s| s.max(0.0).round() as u32),
            bedrooms: self.bedrooms.map(|b| b.max(0.0) as u32),
            bathrooms: self.bathrooms,
        }
    }
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

type Params = Vec<(&'static str, String)>;

/// Query parameters for `/listings/sale`. Absent filters are omitted.
fn listing_params(query: &ListingQuery) -> Params {
    let mut params: Params = vec![("zipCode", query.zip_code.clone())];
    if let Some(types) = join_property_types(&query.property_types, LISTING_TYPE_DELIMITER) {
        params.push(("propertyType", types));
    }
    if let Some(price) = query.price.to_param() {
        params.push(("price", price));
    }
    if let Some(sqft) = query.square_footage.to_param() {
        params.push(("squareFootage", sqft));
    }
    params.push(("status", query.status.as_str().to_string()));
    params.push(("limit", query.limit.to_string()));
    params
}

/// Query parameters for `/properties`.
fn sold_params(query: &SoldQuery) -> Params {
    let mut params: Params = vec![
        ("latitude", query.center.latitude.to_string()),
        ("longitude", query.center.longitude.to_string()),
        ("radius", query.radius_miles.to_string()),
        ("saleDateRange", format!("*:{}", query.max_age_days)),
    ];
    if let Some(beds) = query.bedrooms.to_param() {
        params.push(("bedrooms", beds));
    }
    if let Some(baths) = query.bathrooms.to_param() {
        params.push(("bathrooms", baths));
    }
    if let Some(sqft) = query.square_footage.to_param() {
        params.push(("squareFootage", sqft));
    }
    if let Some(types) = join_property_types(&query.property_types, SOLD_TYPE_DELIMITER) {
        params.push(("propertyType", types));
    }
    params.push(("limit", query.limit.to_string()));
    params
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Rentcast API client.
pub struct RentcastClient {
    http: Client,
    base_url: String,
}

impl RentcastClient {
    /// Create a client authenticated with a static API key. Without a
    /// `timeout` requests run under the HTTP client's default.
    pub fn new(
        api_key: &SecretString,
        base_url: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| ProviderError::network("client", format!("Invalid API key header: {e}")))?;
        key.set_sensitive(true);
        headers.insert("X-Api-Key", key);

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent("property-report/0.1.0");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ProviderError::network("client", format!("Failed to build HTTP client: {e}")))?;

        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET an endpoint and decode a JSON array of `T`.
    ///
    /// A non-array body decodes to an empty list.
    async fn get_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &Params,
    ) -> Result<Vec<T>, ProviderError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, params = ?params, "Rentcast request");

        let resp = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::network(endpoint, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::http(endpoint, status.as_u16(), body));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::network(endpoint, format!("Failed to read response: {e}")))?;

        match body {
            serde_json::Value::Array(_) => serde_json::from_value(body).map_err(|e| {
                ProviderError::network(endpoint, format!("Failed to parse response: {e}"))
            }),
            _ => Ok(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// ValuationProvider trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ValuationProvider for RentcastClient {
    async fn search_listings(&self, query: &ListingQuery) -> Result<Vec<Listing>, ProviderError> {
        let params = listing_params(query);
        let raw: Vec<RentcastListing> = self.get_list(LISTINGS_ENDPOINT, &params).await?;
        let listings: Vec<Listing> = raw.into_iter().map(RentcastListing::into_listing).collect();
        info!(zip = %query.zip_code, count = listings.len(), "Rentcast listings fetched");
        Ok(listings)
    }

    async fn search_sold_properties(
        &self,
        query: &SoldQuery,
    ) -> Result<Vec<SoldProperty>, ProviderError> {
        let params = sold_params(query);
        let raw: Vec<RentcastProperty> = self.get_list(PROPERTIES_ENDPOINT, &params).await?;
        let sold: Vec<SoldProperty> = raw
            .into_iter()
            .map(RentcastProperty::into_sold_property)
            .collect();
        debug!(
            latitude = query.center.latitude,
            longitude = query.center.longitude,
            radius = query.radius_miles,
            count = sold.len(),
            "Rentcast sold properties fetched"
        );
        Ok(sold)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
