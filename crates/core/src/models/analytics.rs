use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::holding::AssetKind;
use super::portfolio::Aggregates;

/// Everything the analysis views need, derived from one snapshot of records.
///
/// Recomputed on every call and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsBundle {
    /// Date the bundle was computed for
    pub as_of_date: NaiveDate,

    /// Top-line totals (stored when available, otherwise derived)
    pub totals: Aggregates,

    /// Per-holding breakdown, stocks first then funds
    pub holdings: Vec<HoldingMetrics>,

    pub stock_count: usize,

    pub fund_count: usize,

    pub risk: RiskMetrics,

    pub concentration: Concentration,

    pub trend: TrendSeries,

    /// Overall portfolio score, 0..=100
    pub score: u8,
}

impl MetricsBundle {
    #[must_use]
    pub fn holding_count(&self) -> usize {
        self.stock_count + self.fund_count
    }
}

/// Derived numbers for a single holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingMetrics {
    pub code: String,
    pub name: String,
    pub kind: AssetKind,
    pub position_value: f64,
    pub cost_amount: f64,
    pub profit_loss: f64,
    pub profit_loss_rate: f64,
    /// Share of the holdings' combined value × 100
    pub allocation_pct: f64,
}

/// Heuristic risk/return estimates.
///
/// These come from point-in-time holdings only, not from a return history,
/// so they are indicators rather than statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// `|rate| × 0.8 + 0.1`
    pub volatility: f64,

    /// `(rate − risk_free) / max(floor, |rate| × damping)`
    pub sharpe_ratio: f64,

    /// Fraction of holdings with a strictly positive rate
    pub win_rate: f64,

    /// Mean winning rate over mean losing magnitude
    pub profit_loss_ratio: f64,

    /// True when `profit_loss_ratio` is the policy fallback because winners
    /// or losers were missing
    pub ratio_is_fallback: bool,
}

/// Lorenz-style concentration curve of position values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concentration {
    /// Starts at (0, 0), ends at (100, 100)
    pub curve: Vec<LorenzPoint>,

    /// 0 = perfectly even, towards 1 = concentrated in one position
    pub gini: f64,
}

/// A point on the concentration curve, both axes in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorenzPoint {
    /// Cumulative share of positions
    pub count_pct: f64,
    /// Cumulative share of value
    pub value_pct: f64,
}

/// Monthly return series for the trend view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub points: Vec<MonthlyReturn>,

    /// Placeholder data generated because the history was too short.
    /// Consumers must label it as such.
    pub synthetic: bool,
}

impl TrendSeries {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    /// "YYYY-MM"
    pub month: String,
    /// Return of the month, percent
    pub return_pct: f64,
    /// Running sum of monthly returns, percent
    pub cumulative_pct: f64,
}
