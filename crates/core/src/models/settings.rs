use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// All tunables of the library. Every section has serde defaults, so a
/// partial JSON document is enough to override a single value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub charts: ChartConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl InsightConfig {
    /// Parse a JSON configuration document and validate it.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: InsightConfig = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidConfig(format!("Failed to parse configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.metrics.validate()?;
        self.charts.validate()?;
        self.client.validate()
    }
}

/// Constants behind the heuristic risk metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Annual risk-free rate subtracted in the Sharpe-like ratio
    pub risk_free_rate: f64,

    /// Lower bound of the Sharpe-like denominator
    pub volatility_floor: f64,

    /// Multiplier on |rate| in the Sharpe-like denominator
    pub damping_factor: f64,

    /// Profit/loss ratio used when winners or losers are missing and the
    /// portfolio is up overall
    pub fallback_ratio_gain: f64,

    /// Same, when the portfolio is flat or down
    pub fallback_ratio_loss: f64,

    /// Generate a flagged placeholder trend when the history is too short
    pub synthetic_trend: bool,

    /// Seed of the placeholder generator, so repeated renders agree
    pub synthetic_seed: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.03,
            volatility_floor: 0.1,
            damping_factor: 0.8,
            fallback_ratio_gain: 2.0,
            fallback_ratio_loss: 0.5,
            synthetic_trend: true,
            synthetic_seed: 42,
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.volatility_floor.is_finite() && self.volatility_floor > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "volatility_floor must be a positive number, got {}",
                self.volatility_floor
            )));
        }
        if !(self.damping_factor.is_finite() && self.damping_factor >= 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "damping_factor must be non-negative, got {}",
                self.damping_factor
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(CoreError::InvalidConfig("risk_free_rate must be finite".into()));
        }
        Ok(())
    }

    /// Replace every value `validate` would reject with its default.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut config = self;
        if !(config.volatility_floor.is_finite() && config.volatility_floor > 0.0) {
            warn!("volatility_floor {} replaced by {}", config.volatility_floor, defaults.volatility_floor);
            config.volatility_floor = defaults.volatility_floor;
        }
        if !(config.damping_factor.is_finite() && config.damping_factor >= 0.0) {
            warn!("damping_factor {} replaced by {}", config.damping_factor, defaults.damping_factor);
            config.damping_factor = defaults.damping_factor;
        }
        if !config.risk_free_rate.is_finite() {
            warn!("risk_free_rate {} replaced by {}", config.risk_free_rate, defaults.risk_free_rate);
            config.risk_free_rate = defaults.risk_free_rate;
        }
        if !config.fallback_ratio_gain.is_finite() {
            config.fallback_ratio_gain = defaults.fallback_ratio_gain;
        }
        if !config.fallback_ratio_loss.is_finite() {
            config.fallback_ratio_loss = defaults.fallback_ratio_loss;
        }
        config
    }
}

/// Chart builder limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Upper bound on histogram buckets
    pub max_histogram_bins: usize,

    /// Positions shown on the allocation ring
    pub allocation_top_n: usize,

    /// Extra stock code → industry entries, consulted before the
    /// built-in table
    pub industries: BTreeMap<String, String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            max_histogram_bins: 8,
            allocation_top_n: 8,
            industries: BTreeMap::new(),
        }
    }
}

impl ChartConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_histogram_bins == 0 {
            return Err(CoreError::InvalidConfig("max_histogram_bins must be at least 1".into()));
        }
        if self.allocation_top_n == 0 {
            return Err(CoreError::InvalidConfig("allocation_top_n must be at least 1".into()));
        }
        Ok(())
    }

    /// Raise zero limits to one.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let mut config = self;
        if config.max_histogram_bins == 0 {
            warn!("max_histogram_bins 0 raised to 1");
            config.max_histogram_bins = 1;
        }
        if config.allocation_top_n == 0 {
            warn!("allocation_top_n 0 raised to 1");
            config.allocation_top_n = 1;
        }
        config
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix of every API path, without a trailing slash
    pub base_url: String,

    /// Client-side deadline for a single request
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `PORTFOLIO_API_BASE_URL` and
    /// `PORTFOLIO_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, CoreError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("PORTFOLIO_API_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(raw) = std::env::var("PORTFOLIO_API_TIMEOUT_SECS") {
            config.timeout_secs = raw.trim().parse().map_err(|_| {
                CoreError::InvalidConfig(format!("PORTFOLIO_API_TIMEOUT_SECS is not a number: '{raw}'"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(CoreError::InvalidConfig("timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Join the base URL and an absolute API path.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim().trim_end_matches('/'), path)
    }
}
