use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A persisted daily aggregate for one portfolio.
///
/// Rates are fractions (0.05 = 5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatistic {
    pub date: NaiveDate,

    pub total_value: f64,

    #[serde(default)]
    pub total_profit_loss: f64,

    #[serde(default)]
    pub total_profit_loss_rate: f64,

    /// Change versus the previous day
    #[serde(default)]
    pub daily_profit_loss: f64,

    #[serde(default)]
    pub daily_profit_loss_rate: f64,
}

impl DailyStatistic {
    pub fn new(date: NaiveDate, total_value: f64) -> Self {
        Self {
            date,
            total_value,
            total_profit_loss: 0.0,
            total_profit_loss_rate: 0.0,
            daily_profit_loss: 0.0,
            daily_profit_loss_rate: 0.0,
        }
    }
}

/// Copy and sort snapshots oldest-first. The backend does not guarantee order.
#[must_use]
pub fn sorted_by_date(statistics: &[DailyStatistic]) -> Vec<DailyStatistic> {
    let mut sorted = statistics.to_vec();
    sorted.sort_by_key(|s| s.date);
    sorted
}
