use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::analytics::{
    Concentration, HoldingMetrics, LorenzPoint, MetricsBundle, MonthlyReturn, RiskMetrics,
    TrendSeries,
};
use crate::models::holding::{finite_or_zero, AssetKind, Holding};
use crate::models::portfolio::{Aggregates, PortfolioSummary};
use crate::models::settings::MetricsConfig;
use crate::models::statistics::{sorted_by_date, DailyStatistic};

/// Months in the placeholder trend.
const SYNTHETIC_MONTHS: u32 = 12;

/// Placeholder monthly returns are drawn from `[-4%, 4%)`.
const SYNTHETIC_RETURN_SPAN: f64 = 4.0;

/// Computes the derived metrics shown by the analysis views.
///
/// Every function is pure: it reads the records it is handed and returns a
/// value. Absent or non-finite numbers count as zero, divisions by zero
/// resolve to zero, and nothing here returns an error.
pub struct MetricsService {
    config: MetricsConfig,
}

impl MetricsService {
    /// Out-of-range config values fall back to safe ones instead of
    /// producing NaN or empty output.
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Build the full bundle for one portfolio snapshot.
    ///
    /// - Top-line totals (stored when available)
    /// - Per-holding value, profit/loss, rate and allocation
    /// - Heuristic risk metrics
    /// - Concentration curve and Gini coefficient
    /// - Monthly trend (flagged when synthetic)
    /// - Overall score
    pub fn compute_metrics(
        &self,
        portfolio: &PortfolioSummary,
        holdings: &[Holding],
        statistics: &[DailyStatistic],
        as_of: NaiveDate,
    ) -> MetricsBundle {
        debug!(
            "Computing metrics for portfolio {} ({} holdings, {} snapshots)",
            portfolio.id,
            holdings.len(),
            statistics.len()
        );

        let totals = self.top_line(portfolio, holdings);
        let risk = self.risk_metrics(holdings, totals.profit_loss_rate);

        MetricsBundle {
            as_of_date: as_of,
            totals,
            holdings: Self::holding_metrics(holdings),
            stock_count: holdings.iter().filter(|h| h.kind == AssetKind::Stock).count(),
            fund_count: holdings.iter().filter(|h| h.kind == AssetKind::Fund).count(),
            risk,
            concentration: Self::concentration(holdings),
            trend: self.monthly_trend(statistics, as_of),
            score: Self::portfolio_score(&totals, holdings),
        }
    }

    /// Stored totals when the backend has any, otherwise totals derived from
    /// the holdings. A portfolio without holdings has all-zero totals.
    #[must_use]
    pub fn top_line(&self, portfolio: &PortfolioSummary, holdings: &[Holding]) -> Aggregates {
        if holdings.is_empty() {
            return Aggregates::default();
        }
        if portfolio.has_stored_totals() {
            let stored = portfolio.stored_aggregates();
            Aggregates {
                total_investment: finite_or_zero(stored.total_investment),
                current_value: finite_or_zero(stored.current_value),
                profit_loss: finite_or_zero(stored.profit_loss),
                profit_loss_rate: finite_or_zero(stored.profit_loss_rate),
            }
        } else {
            Aggregates::from_holdings(holdings)
        }
    }

    /// Per-holding numbers; allocation is relative to the holdings' combined value.
    #[must_use]
    pub fn holding_metrics(holdings: &[Holding]) -> Vec<HoldingMetrics> {
        let total_value: f64 = holdings.iter().map(Holding::position_value).sum();
        holdings
            .iter()
            .map(|h| {
                let position_value = h.position_value();
                HoldingMetrics {
                    code: h.code.clone(),
                    name: h.name.clone(),
                    kind: h.kind,
                    position_value,
                    cost_amount: h.cost_amount(),
                    profit_loss: h.profit_loss(),
                    profit_loss_rate: h.profit_loss_rate(),
                    allocation_pct: if total_value > 0.0 {
                        position_value / total_value * 100.0
                    } else {
                        0.0
                    },
                }
            })
            .collect()
    }

    /// Share of holdings whose rate is strictly positive; `0` without holdings.
    #[must_use]
    pub fn win_rate(holdings: &[Holding]) -> f64 {
        if holdings.is_empty() {
            return 0.0;
        }
        let winners = holdings.iter().filter(|h| h.profit_loss_rate() > 0.0).count();
        winners as f64 / holdings.len() as f64
    }

    /// Mean winning rate divided by mean losing magnitude.
    ///
    /// Without both winners and losers the ratio is undefined; the policy
    /// fallback is `fallback_ratio_gain` (2.0) when `overall_rate > 0`, else
    /// `fallback_ratio_loss` (0.5). The second element reports whether the
    /// fallback was used.
    #[must_use]
    pub fn profit_loss_ratio(&self, holdings: &[Holding], overall_rate: f64) -> (f64, bool) {
        let rates: Vec<f64> = holdings.iter().map(Holding::profit_loss_rate).collect();
        let gains: Vec<f64> = rates.iter().copied().filter(|r| *r > 0.0).collect();
        let losses: Vec<f64> = rates.iter().copied().filter(|r| *r < 0.0).map(f64::abs).collect();

        if gains.is_empty() || losses.is_empty() {
            let fallback = if finite_or_zero(overall_rate) > 0.0 {
                self.config.fallback_ratio_gain
            } else {
                self.config.fallback_ratio_loss
            };
            return (fallback, true);
        }

        let avg_gain = gains.iter().sum::<f64>() / gains.len() as f64;
        let avg_loss = losses.iter().sum::<f64>() / losses.len() as f64;
        (avg_gain / avg_loss, false)
    }

    /// `|rate| × 0.8 + 0.1`. A point-in-time proxy, not a standard deviation.
    #[must_use]
    pub fn volatility(rate: f64) -> f64 {
        finite_or_zero(rate).abs() * 0.8 + 0.1
    }

    /// `(rate − risk_free) / max(volatility_floor, |rate| × damping_factor)`.
    #[must_use]
    pub fn sharpe_ratio(&self, rate: f64) -> f64 {
        let rate = finite_or_zero(rate);
        let denominator = (rate.abs() * self.config.damping_factor).max(self.config.volatility_floor);
        (rate - self.config.risk_free_rate) / denominator
    }

    #[must_use]
    pub fn risk_metrics(&self, holdings: &[Holding], overall_rate: f64) -> RiskMetrics {
        let (profit_loss_ratio, ratio_is_fallback) = self.profit_loss_ratio(holdings, overall_rate);
        RiskMetrics {
            volatility: Self::volatility(overall_rate),
            sharpe_ratio: self.sharpe_ratio(overall_rate),
            win_rate: Self::win_rate(holdings),
            profit_loss_ratio,
            ratio_is_fallback,
        }
    }

    /// Lorenz curve of position values.
    ///
    /// Positions with no value are ignored; the rest are sorted ascending, so
    /// the curve is convex and never rises above the equality line. The curve
    /// always starts at (0, 0) and ends exactly at (100, 100).
    #[must_use]
    pub fn concentration(holdings: &[Holding]) -> Concentration {
        let mut values: Vec<f64> = holdings
            .iter()
            .map(Holding::position_value)
            .filter(|v| *v > 0.0)
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let origin = LorenzPoint {
            count_pct: 0.0,
            value_pct: 0.0,
        };
        let full = LorenzPoint {
            count_pct: 100.0,
            value_pct: 100.0,
        };

        if values.is_empty() {
            return Concentration {
                curve: vec![origin, full],
                gini: 0.0,
            };
        }

        let n = values.len();
        let total: f64 = values.iter().sum();
        let mut curve = Vec::with_capacity(n + 1);
        curve.push(origin);

        let mut cumulative = 0.0;
        for (i, value) in values.iter().enumerate() {
            cumulative += value;
            if i + 1 == n {
                // pin the end point; summation error must not leave it at 99.999…
                curve.push(full);
            } else {
                let count_pct = (i + 1) as f64 / n as f64 * 100.0;
                let value_pct = (cumulative / total * 100.0).min(count_pct);
                curve.push(LorenzPoint {
                    count_pct,
                    value_pct,
                });
            }
        }

        let gini = gini_from_curve(&curve);
        Concentration { curve, gini }
    }

    /// Monthly returns from the snapshot history.
    ///
    /// Snapshots are sorted, grouped by calendar month, and each month-end
    /// value is compared with the previous month-end (the first month with the
    /// first snapshot). With fewer than two snapshots the history says
    /// nothing; a seeded placeholder series is returned instead when
    /// `synthetic_trend` is enabled, flagged `synthetic: true`.
    #[must_use]
    pub fn monthly_trend(&self, statistics: &[DailyStatistic], as_of: NaiveDate) -> TrendSeries {
        if statistics.len() < 2 {
            if self.config.synthetic_trend {
                debug!("History too short ({} snapshots), using synthetic trend", statistics.len());
                return synthetic_trend(as_of, self.config.synthetic_seed);
            }
            return TrendSeries::empty();
        }

        let sorted = sorted_by_date(statistics);
        let mut month_ends: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for snapshot in &sorted {
            month_ends.insert(
                (snapshot.date.year(), snapshot.date.month()),
                finite_or_zero(snapshot.total_value),
            );
        }

        let mut previous = finite_or_zero(sorted[0].total_value);
        let mut cumulative = 0.0;
        let mut points = Vec::with_capacity(month_ends.len());
        for ((year, month), end_value) in month_ends {
            let return_pct = if previous > 0.0 {
                (end_value / previous - 1.0) * 100.0
            } else {
                0.0
            };
            cumulative += return_pct;
            points.push(MonthlyReturn {
                month: format!("{year:04}-{month:02}"),
                return_pct,
                cumulative_pct: cumulative,
            });
            previous = end_value;
        }

        TrendSeries {
            points,
            synthetic: false,
        }
    }

    /// Score 0..=100 from overall return, diversification and the weight of
    /// the largest position. Starts at 50.
    #[must_use]
    pub fn portfolio_score(totals: &Aggregates, holdings: &[Holding]) -> u8 {
        let rate = finite_or_zero(totals.profit_loss_rate);
        let mut score: i32 = 50;

        score += if rate > 0.2 {
            30
        } else if rate > 0.1 {
            20
        } else if rate > 0.0 {
            10
        } else if rate > -0.1 {
            -10
        } else {
            -20
        };

        if holdings.len() >= 5 {
            score += 10;
        } else if holdings.len() >= 3 {
            score += 5;
        }

        let total_value = finite_or_zero(totals.current_value);
        if total_value > 0.0 {
            let largest = holdings
                .iter()
                .map(Holding::position_value)
                .fold(0.0_f64, f64::max);
            let share = largest / total_value;
            if share < 0.3 {
                score += 10;
            } else if share > 0.6 {
                score -= 10;
            }
        }

        score.clamp(0, 100) as u8
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

/// `1 − 2 × area` under the curve (trapezoids on 0..1 axes), clamped to [0, 1].
fn gini_from_curve(curve: &[LorenzPoint]) -> f64 {
    let area: f64 = curve
        .windows(2)
        .map(|w| {
            let dx = (w[1].count_pct - w[0].count_pct) / 100.0;
            let mean_y = (w[0].value_pct + w[1].value_pct) / 200.0;
            dx * mean_y
        })
        .sum();
    (1.0 - 2.0 * area).clamp(0.0, 1.0)
}

/// Twelve months ending at `as_of`, returns rounded to two decimals.
fn synthetic_trend(as_of: NaiveDate, seed: u64) -> TrendSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cumulative = 0.0;
    let mut points = Vec::with_capacity(SYNTHETIC_MONTHS as usize);

    for back in (0..SYNTHETIC_MONTHS).rev() {
        let month = as_of.checked_sub_months(Months::new(back)).unwrap_or(as_of);
        let return_pct = round2(rng.gen_range(-SYNTHETIC_RETURN_SPAN..SYNTHETIC_RETURN_SPAN));
        cumulative = round2(cumulative + return_pct);
        points.push(MonthlyReturn {
            month: month.format("%Y-%m").to_string(),
            return_pct,
            cumulative_pct: cumulative,
        });
    }

    TrendSeries {
        points,
        synthetic: true,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
