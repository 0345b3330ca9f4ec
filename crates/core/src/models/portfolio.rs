use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::holding::Holding;
use super::statistics::DailyStatistic;

/// Top-line record of a portfolio as stored by the backend.
///
/// The totals are authoritative when the backend has computed them; the
/// metrics engine only derives its own when all of them are zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub id: i64,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Sum of cost-basis amounts
    #[serde(default)]
    pub total_investment: f64,

    /// Sum of position values
    #[serde(default)]
    pub current_value: f64,

    #[serde(default)]
    pub profit_loss: f64,

    /// profit_loss / total_investment, as a fraction
    #[serde(default)]
    pub profit_loss_rate: f64,

    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl PortfolioSummary {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the backend supplied any non-zero top-line number.
    #[must_use]
    pub fn has_stored_totals(&self) -> bool {
        self.total_investment != 0.0
            || self.current_value != 0.0
            || self.profit_loss != 0.0
            || self.profit_loss_rate != 0.0
    }

    /// Stored totals as an `Aggregates` value.
    #[must_use]
    pub fn stored_aggregates(&self) -> Aggregates {
        Aggregates {
            total_investment: self.total_investment,
            current_value: self.current_value,
            profit_loss: self.profit_loss,
            profit_loss_rate: self.profit_loss_rate,
        }
    }
}

/// Full portfolio payload: summary, both holding collections and the
/// daily statistics history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDetail {
    pub portfolio: PortfolioSummary,

    /// Stock positions in creation order
    pub stocks: Vec<Holding>,

    /// Fund positions in creation order
    pub funds: Vec<Holding>,

    /// Daily snapshots, in whatever order the backend returned them
    pub statistics: Vec<DailyStatistic>,
}

impl PortfolioDetail {
    /// Stocks first, then funds.
    #[must_use]
    pub fn holdings(&self) -> Vec<Holding> {
        self.stocks.iter().chain(self.funds.iter()).cloned().collect()
    }

    #[must_use]
    pub fn holding_count(&self) -> usize {
        self.stocks.len() + self.funds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holding_count() == 0
    }
}

/// Aggregated totals over a set of holdings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub total_investment: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_rate: f64,
}

impl Aggregates {
    /// Sum cost amounts and position values; the rate is `0` without investment.
    #[must_use]
    pub fn from_holdings(holdings: &[Holding]) -> Self {
        let total_investment: f64 = holdings.iter().map(Holding::cost_amount).sum();
        let current_value: f64 = holdings.iter().map(Holding::position_value).sum();
        let profit_loss = current_value - total_investment;
        let profit_loss_rate = if total_investment > 0.0 {
            profit_loss / total_investment
        } else {
            0.0
        };
        Self {
            total_investment,
            current_value,
            profit_loss,
            profit_loss_rate,
        }
    }
}
