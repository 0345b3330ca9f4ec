use serde::{Deserialize, Serialize};

use super::analytics::MetricsBundle;
use super::chart::{CategorySeries, ScatterPoint};

/// Metrics plus every chart of the portfolio analysis view, built in one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metrics: MetricsBundle,

    /// Total value, total and daily profit/loss over time
    pub value_trend: CategorySeries,

    /// Total and daily return rates over time
    pub rate_trend: CategorySeries,

    pub return_distribution: CategorySeries,

    pub allocation: CategorySeries,

    pub asset_kinds: CategorySeries,

    /// Stock market value, count and profit/loss per industry
    #[serde(default)]
    pub industries: CategorySeries,

    pub risk_return: Vec<ScatterPoint>,

    pub concentration: CategorySeries,

    pub monthly_trend: CategorySeries,
}

impl AnalysisReport {
    /// Whether any chart carries placeholder data.
    #[must_use]
    pub fn has_synthetic_data(&self) -> bool {
        self.metrics.trend.synthetic || self.monthly_trend.synthetic
    }
}
