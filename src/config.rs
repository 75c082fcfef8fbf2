//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime into a `SecretString`.

use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use crate::engine::{CompSearch, ListingSearch, PipelineSettings};
use crate::provider::rentcast::DEFAULT_BASE_URL;
use crate::provider::ListingStatus;
use crate::strategy::CostModel;
use crate::types::{QueryRange, ReportError, ZipFilter};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    pub filters: FiltersConfig,
    #[serde(default)]
    pub avm: AvmConfig,
    #[serde(default)]
    pub costs: CostsConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key_env: String,
    /// Per-request timeout; unset leaves the HTTP client default.
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "RENTCAST_API_KEY".to_string(),
            timeout_secs: None,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Optional price / square-footage bounds.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_sqft: Option<f64>,
    pub max_sqft: Option<f64>,
}

impl Bounds {
    /// Fields set on `other` replace ours.
    pub fn overlay(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_price: other.min_price.or(self.min_price),
            max_price: other.max_price.or(self.max_price),
            min_sqft: other.min_sqft.or(self.min_sqft),
            max_sqft: other.max_sqft.or(self.max_sqft),
        }
    }

    pub fn price(&self) -> QueryRange {
        QueryRange::from_f64(self.min_price, self.max_price)
    }

    pub fn square_footage(&self) -> QueryRange {
        QueryRange::from_f64(self.min_sqft, self.max_sqft)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FiltersConfig {
    pub zip_codes: Vec<String>,
    #[serde(default)]
    pub property_types: Vec<String>,
    #[serde(flatten)]
    pub bounds: Bounds,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(default = "default_listing_limit")]
    pub limit: u32,
    /// Per-zip bounds, keyed by zip code.
    #[serde(default)]
    pub overrides: HashMap<String, Bounds>,
}

fn default_listing_limit() -> u32 {
    500
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AvmConfig {
    /// Search radius in miles.
    pub max_radius: f64,
    pub days_old: u32,
    /// Result limit for the sold-property search.
    pub comp_count: u32,
}

impl Default for AvmConfig {
    fn default() -> Self {
        Self {
            max_radius: 1.0,
            days_old: 180,
            comp_count: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CostsConfig {
    pub build_up_cost_per_sqft: f64,
    pub financing_rate: f64,
}

impl Default for CostsConfig {
    fn default() -> Self {
        Self {
            build_up_cost_per_sqft: 75.0,
            financing_rate: 0.12,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DecisionConfig {
    pub upside_threshold: f64,
    /// Comparables above this sale price are ignored.
    pub comp_price_threshold: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            upside_threshold: 30_000.0,
            comp_price_threshold: 1_500_000.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BudgetConfig {
    pub max_api_calls: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self { max_api_calls: 500 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key_env: String,
    pub sender_email: String,
    pub sender_name: String,
    pub recipient_emails: Vec<String>,
    pub subject: String,
    pub timeout_secs: Option<u64>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.brevo.com/v3/smtp/email".to_string(),
            api_key_env: "EMAIL_API_KEY".to_string(),
            sender_email: String::new(),
            sender_name: "Property Report".to_string(),
            recipient_emails: Vec::new(),
            subject: "Daily Property Investment Report".to_string(),
            timeout_secs: None,
        }
    }
}

impl EmailConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, ReportError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ReportError::Config(format!("Failed to read config file {path}: {e}")))?;
        Self::from_toml(&contents).map_err(|e| match e {
            ReportError::Config(msg) => ReportError::Config(format!("{path}: {msg}")),
            other => other,
        })
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ReportError> {
        let config: AppConfig = toml::from_str(contents)
            .map_err(|e| ReportError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the run cannot start with.
    pub fn validate(&self) -> Result<(), ReportError> {
        let invalid = |msg: String| Err(ReportError::Config(msg));

        if self.filters.zip_codes.is_empty() {
            return invalid("filters.zip_codes must list at least one zip code".into());
        }
        if self.filters.zip_codes.iter().any(|z| z.trim().is_empty()) {
            return invalid("filters.zip_codes contains a blank entry".into());
        }
        if !(0.0..=1.0).contains(&self.costs.financing_rate) {
            return invalid(format!(
                "costs.financing_rate must be within [0, 1], got {}",
                self.costs.financing_rate
            ));
        }
        if self.costs.build_up_cost_per_sqft < 0.0 {
            return invalid("costs.build_up_cost_per_sqft must not be negative".into());
        }
        if self.decision.upside_threshold < 0.0 {
            return invalid("decision.upside_threshold must not be negative".into());
        }
        if self.decision.comp_price_threshold < 0.0 {
            return invalid("decision.comp_price_threshold must not be negative".into());
        }
        if self.avm.max_radius <= 0.0 {
            return invalid("avm.max_radius must be positive".into());
        }
        if self.budget.max_api_calls == 0 {
            return invalid("budget.max_api_calls must be at least 1".into());
        }
        for zip in self.zip_filters() {
            if zip.price.is_inverted() {
                return invalid(format!("price range {} is inverted for zip {}", zip.price, zip.zip_code));
            }
            if zip.square_footage.is_inverted() {
                return invalid(format!(
                    "square footage range {} is inverted for zip {}",
                    zip.square_footage, zip.zip_code
                ));
            }
        }
        Ok(())
    }

    /// Checks that only matter when the report is actually emailed.
    pub fn validate_delivery(&self) -> Result<(), ReportError> {
        if self.email.recipient_emails.is_empty() {
            return Err(ReportError::Config(
                "email.recipient_emails must list at least one recipient".into(),
            ));
        }
        if self.email.sender_email.trim().is_empty() {
            return Err(ReportError::Config("email.sender_email is not set".into()));
        }
        Ok(())
    }

    /// One filter per configured zip, in configured order, with per-zip
    /// overrides applied.
    pub fn zip_filters(&self) -> Vec<ZipFilter> {
        self.filters
            .zip_codes
            .iter()
            .map(|zip| {
                let zip = zip.trim();
                let bounds = match self.filters.overrides.get(zip) {
                    Some(o) => self.filters.bounds.overlay(o),
                    None => self.filters.bounds,
                };
                ZipFilter::new(zip)
                    .with_price(bounds.price())
                    .with_square_footage(bounds.square_footage())
            })
            .collect()
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            listing_search: ListingSearch {
                property_types: self.filters.property_types.clone(),
                status: self.filters.status,
                limit: self.filters.limit,
            },
            comp_search: CompSearch {
                radius_miles: self.avm.max_radius,
                max_age_days: self.avm.days_old,
                limit: self.avm.comp_count,
            },
            cost_model: CostModel::new(
                self.costs.build_up_cost_per_sqft,
                self.costs.financing_rate,
            ),
            upside_threshold: self.decision.upside_threshold,
            comp_price_ceiling: self.decision.comp_price_threshold,
            max_api_calls: self.budget.max_api_calls,
        }
    }

    /// Resolve an environment variable name to a secret.
    pub fn resolve_secret(env_name: &str) -> Result<SecretString, ReportError> {
        match std::env::var(env_name) {
            Ok(v) if !v.trim().is_empty() => Ok(SecretString::new(v)),
            _ => Err(ReportError::Config(format!(
                "Environment variable not set: {env_name}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
