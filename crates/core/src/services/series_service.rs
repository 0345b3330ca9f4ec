use std::collections::HashMap;

use chrono::NaiveDate;
use log::debug;

use crate::models::analytics::{Concentration, TrendSeries};
use crate::models::chart::{CategorySeries, HistogramBin, ScatterPoint, Series, SeriesKind, Tone};
use crate::models::holding::{finite_or_zero, AssetKind, Holding};
use crate::models::intraday::IntradaySeries;
use crate::models::market::IndexHistory;
use crate::models::settings::ChartConfig;
use crate::models::statistics::{sorted_by_date, DailyStatistic};

/// Built-in stock code → industry table.
const INDUSTRIES: &[(&str, &str)] = &[
    ("000001", "Banking"),
    ("000002", "Real estate"),
    ("000009", "Conglomerate"),
    ("000050", "Technology"),
    ("000300", "Financials"),
    ("000858", "Food & beverage"),
    ("002415", "Technology"),
    ("300015", "Technology"),
    ("600000", "Banking"),
    ("600036", "Banking"),
    ("600519", "Food & beverage"),
];

const OTHER_INDUSTRY: &str = "Other";

/// Which trend chart to build from the daily snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendChartKind {
    /// Total value, total profit/loss and daily profit/loss, in currency
    Value,
    /// Total and daily profit/loss rates, in percent
    Rate,
}

/// Turns records and metrics into category/value chart data.
///
/// All numbers are computed here; the frontend only renders. Empty or
/// unusable input yields `CategorySeries::empty()`, never an error.
pub struct SeriesService {
    config: ChartConfig,
}

impl SeriesService {
    /// Out-of-range config values fall back to safe ones instead of
    /// producing NaN or empty output.
    pub fn new(config: ChartConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    /// Daily snapshot history, oldest first.
    pub fn trend_chart(&self, statistics: &[DailyStatistic], kind: TrendChartKind) -> CategorySeries {
        if statistics.is_empty() {
            return CategorySeries::empty();
        }

        let sorted = sorted_by_date(statistics);
        let categories = sorted.iter().map(|s| format_date(s.date)).collect();

        let series = match kind {
            TrendChartKind::Value => vec![
                Series::neutral(
                    "Total value",
                    SeriesKind::Line,
                    sorted.iter().map(|s| finite_or_zero(s.total_value)).collect(),
                ),
                Series::toned(
                    "Total profit/loss",
                    SeriesKind::Line,
                    sorted.iter().map(|s| finite_or_zero(s.total_profit_loss)).collect(),
                ),
                Series::toned(
                    "Daily profit/loss",
                    SeriesKind::Bar,
                    sorted.iter().map(|s| finite_or_zero(s.daily_profit_loss)).collect(),
                ),
            ],
            TrendChartKind::Rate => vec![
                Series::toned(
                    "Total return %",
                    SeriesKind::Line,
                    sorted
                        .iter()
                        .map(|s| round2(finite_or_zero(s.total_profit_loss_rate) * 100.0))
                        .collect(),
                ),
                Series::toned(
                    "Daily return %",
                    SeriesKind::Bar,
                    sorted
                        .iter()
                        .map(|s| round2(finite_or_zero(s.daily_profit_loss_rate) * 100.0))
                        .collect(),
                ),
            ],
        };

        CategorySeries {
            categories,
            series,
            synthetic: false,
        }
    }

    /// Put three index histories on one axis, rebased to 100.
    ///
    /// The axis is the longest date sequence; on a tie the earlier argument
    /// (primary, then secondary, then tertiary) wins.
    pub fn align_indices(
        &self,
        primary: &IndexHistory,
        secondary: &IndexHistory,
        tertiary: &IndexHistory,
    ) -> CategorySeries {
        Self::align_and_normalize(&[primary, secondary, tertiary])
    }

    /// Align any number of histories, in precedence order.
    ///
    /// Each history is looked up by date on the chosen axis (missing dates
    /// become gaps) and divided by its own first positive close on the axis,
    /// × 100. Empty histories contribute no series.
    pub fn align_and_normalize(histories: &[&IndexHistory]) -> CategorySeries {
        let mut axis: Option<&IndexHistory> = None;
        for history in histories {
            if axis.map_or(true, |current| history.len() > current.len()) {
                axis = Some(history);
            }
        }
        let axis = match axis {
            Some(a) if !a.is_empty() => a,
            _ => return CategorySeries::empty(),
        };

        // `points` is public, so its order is not guaranteed
        let mut dates: Vec<NaiveDate> = axis.points.iter().map(|p| p.date).collect();
        dates.sort_unstable();
        dates.dedup();
        let categories = dates.iter().map(|d| format_date(*d)).collect();

        let series = histories
            .iter()
            .filter(|h| !h.is_empty())
            .map(|history| {
                let closes: HashMap<NaiveDate, f64> =
                    history.points.iter().map(|p| (p.date, p.close)).collect();
                let on_axis: Vec<Option<f64>> = dates
                    .iter()
                    .map(|d| closes.get(d).copied().filter(|c| c.is_finite()))
                    .collect();
                let base = on_axis.iter().flatten().copied().find(|c| *c > 0.0);
                let normalized = on_axis
                    .iter()
                    .map(|close| match (close, base) {
                        (Some(c), Some(b)) => Some(c / b * 100.0),
                        _ => None,
                    })
                    .collect();
                Series::sparse(history.name.clone(), SeriesKind::Line, normalized)
            })
            .collect();

        CategorySeries {
            categories,
            series,
            synthetic: false,
        }
    }

    /// Partition `values` into `min(max_bins, n)` equal-width buckets.
    ///
    /// Bucket `i` is `[edge[i], edge[i+1])`, the last one `[edge[n-1], max]`.
    /// All buckets share one edge array, so every sample belongs to exactly
    /// one bucket. Non-finite samples count as zero.
    #[must_use]
    pub fn histogram(values: &[f64], max_bins: usize) -> Vec<HistogramBin> {
        if values.is_empty() {
            return Vec::new();
        }

        let samples: Vec<f64> = values.iter().map(|v| finite_or_zero(*v)).collect();
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let bin_count = max_bins.max(1).min(samples.len());

        // interpolated, since `max − min` can overflow on wide ranges
        let mut edges: Vec<f64> = (0..=bin_count)
            .map(|k| {
                if k == bin_count {
                    return max;
                }
                let t = k as f64 / bin_count as f64;
                (min * (1.0 - t) + max * t).clamp(min, max)
            })
            .collect();
        // rounding must not reorder edges
        for k in 1..edges.len() {
            edges[k] = edges[k].max(edges[k - 1]);
        }

        let mut bins: Vec<HistogramBin> = (0..bin_count)
            .map(|i| HistogramBin {
                start: edges[i],
                end: edges[i + 1],
                members: Vec::new(),
                label: format!("{:.1} ~ {:.1}", edges[i], edges[i + 1]),
            })
            .collect();

        let interior = &edges[1..bin_count];
        for (index, value) in samples.iter().enumerate() {
            let bin = interior.partition_point(|edge| *edge <= *value);
            bins[bin].members.push(index);
        }

        bins
    }

    /// Histogram of holding returns, in percent.
    pub fn return_distribution_chart(&self, holdings: &[Holding]) -> CategorySeries {
        let returns: Vec<f64> = holdings.iter().map(|h| h.profit_loss_rate() * 100.0).collect();
        let bins = Self::histogram(&returns, self.config.max_histogram_bins);
        if bins.is_empty() {
            return CategorySeries::empty();
        }

        let categories = bins
            .iter()
            .map(|b| format!("{:.1}% ~ {:.1}%", b.start, b.end))
            .collect();
        let counts: Vec<f64> = bins.iter().map(|b| b.count() as f64).collect();
        let tones: Vec<Tone> = bins.iter().map(|b| Tone::of(b.start / 2.0 + b.end / 2.0)).collect();

        let mut series = Series::neutral("Holdings", SeriesKind::Bar, counts);
        series.tones = tones;

        CategorySeries {
            categories,
            series: vec![series],
            synthetic: false,
        }
    }

    /// Largest positions by value, descending, capped at `allocation_top_n`.
    pub fn allocation_chart(&self, holdings: &[Holding]) -> CategorySeries {
        let mut positions: Vec<&Holding> =
            holdings.iter().filter(|h| h.position_value() > 0.0).collect();
        if positions.is_empty() {
            return CategorySeries::empty();
        }
        positions.sort_by(|a, b| {
            b.position_value()
                .partial_cmp(&a.position_value())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        positions.truncate(self.config.allocation_top_n);

        let categories = positions.iter().map(|h| h.name.clone()).collect();
        let mut series = Series::neutral(
            "Position value",
            SeriesKind::Pie,
            positions.iter().map(|h| h.position_value()).collect(),
        );
        series.tones = positions.iter().map(|h| Tone::of(h.profit_loss_rate())).collect();

        CategorySeries {
            categories,
            series: vec![series],
            synthetic: false,
        }
    }

    /// Stock vs fund position counts; empty buckets are left out.
    pub fn asset_kind_chart(&self, holdings: &[Holding]) -> CategorySeries {
        let stocks = holdings.iter().filter(|h| h.kind == AssetKind::Stock).count();
        let funds = holdings.iter().filter(|h| h.kind == AssetKind::Fund).count();

        let buckets: Vec<(&str, usize)> = [("Stocks", stocks), ("Funds", funds)]
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .collect();
        if buckets.is_empty() {
            return CategorySeries::empty();
        }

        CategorySeries {
            categories: buckets.iter().map(|(name, _)| name.to_string()).collect(),
            series: vec![Series::neutral(
                "Asset kind",
                SeriesKind::Pie,
                buckets.iter().map(|(_, count)| *count as f64).collect(),
            )],
            synthetic: false,
        }
    }

    /// Stock positions grouped by industry, largest market value first.
    ///
    /// Codes are looked up in `ChartConfig::industries`, then in the
    /// built-in table; anything unknown lands in "Other". Funds are left out.
    pub fn industry_chart(&self, holdings: &[Holding]) -> CategorySeries {
        // (industry, value, count, profit/loss) in first-seen order
        let mut groups: Vec<(String, f64, usize, f64)> = Vec::new();
        for holding in holdings.iter().filter(|h| h.kind == AssetKind::Stock) {
            let industry = self.industry_of(&holding.code);
            let index = match groups.iter().position(|(name, ..)| name == industry) {
                Some(index) => index,
                None => {
                    groups.push((industry.to_string(), 0.0, 0, 0.0));
                    groups.len() - 1
                }
            };
            let group = &mut groups[index];
            group.1 += holding.position_value();
            group.2 += 1;
            group.3 += holding.profit_loss();
        }
        if groups.is_empty() {
            return CategorySeries::empty();
        }
        groups.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        debug!("industry chart: {} industries", groups.len());

        CategorySeries {
            categories: groups.iter().map(|g| g.0.clone()).collect(),
            series: vec![
                Series::neutral(
                    "Market value",
                    SeriesKind::Pie,
                    groups.iter().map(|g| round2(g.1)).collect(),
                ),
                Series::neutral(
                    "Stocks held",
                    SeriesKind::Bar,
                    groups.iter().map(|g| g.2 as f64).collect(),
                ),
                Series::toned(
                    "Profit/loss",
                    SeriesKind::Bar,
                    groups.iter().map(|g| round2(g.3)).collect(),
                ),
            ],
            synthetic: false,
        }
    }

    /// Industry of a stock code: configured entries win over the built-in table.
    #[must_use]
    pub fn industry_of<'a>(&'a self, code: &str) -> &'a str {
        let code = code.trim();
        if let Some(industry) = self.config.industries.get(code) {
            return industry;
        }
        INDUSTRIES
            .iter()
            .find(|(known, _)| *known == code)
            .map_or(OTHER_INDUSTRY, |(_, industry)| *industry)
    }

    /// Risk/return bubbles for positions with value.
    ///
    /// Risk is a heuristic: `|rate| × 50` for stocks, `× 30` for funds.
    /// Bubble size grows with the square root of the position value.
    #[must_use]
    pub fn risk_return_points(holdings: &[Holding]) -> Vec<ScatterPoint> {
        holdings
            .iter()
            .filter(|h| h.position_value() > 0.0)
            .map(|h| {
                let rate = h.profit_loss_rate();
                let risk_weight = match h.kind {
                    AssetKind::Stock => 50.0,
                    AssetKind::Fund => 30.0,
                };
                ScatterPoint {
                    name: h.name.clone(),
                    x: rate.abs() * risk_weight,
                    y: rate * 100.0,
                    size: ((h.position_value() / 1000.0).sqrt() + 10.0).max(15.0),
                    tone: Tone::of(rate),
                }
            })
            .collect()
    }

    /// Lorenz curve plus the equality line, x in percent of positions.
    #[must_use]
    pub fn concentration_chart(concentration: &Concentration) -> CategorySeries {
        if concentration.curve.is_empty() {
            return CategorySeries::empty();
        }
        CategorySeries {
            categories: concentration
                .curve
                .iter()
                .map(|p| format!("{:.1}", p.count_pct))
                .collect(),
            series: vec![
                Series::neutral(
                    "Concentration",
                    SeriesKind::Area,
                    concentration.curve.iter().map(|p| p.value_pct).collect(),
                ),
                Series::neutral(
                    "Equality",
                    SeriesKind::Line,
                    concentration.curve.iter().map(|p| p.count_pct).collect(),
                ),
            ],
            synthetic: false,
        }
    }

    /// Monthly return bars plus the cumulative line. Placeholder data stays flagged.
    #[must_use]
    pub fn monthly_trend_chart(trend: &TrendSeries) -> CategorySeries {
        if trend.is_empty() {
            return CategorySeries::empty();
        }
        if trend.synthetic {
            debug!("Building monthly trend chart from synthetic data");
        }
        CategorySeries {
            categories: trend.points.iter().map(|p| p.month.clone()).collect(),
            series: vec![
                Series::toned(
                    "Monthly return %",
                    SeriesKind::Bar,
                    trend.points.iter().map(|p| p.return_pct).collect(),
                ),
                Series::toned(
                    "Cumulative return %",
                    SeriesKind::Line,
                    trend.points.iter().map(|p| p.cumulative_pct).collect(),
                ),
            ],
            synthetic: trend.synthetic,
        }
    }

    /// Price line toned against the reference price, and volume bars toned
    /// by tick-to-tick direction.
    #[must_use]
    pub fn intraday_chart(series: &IntradaySeries) -> CategorySeries {
        if series.is_empty() {
            return CategorySeries::empty();
        }

        let ticks = series.ticks();
        let reference = series.reference_price();

        let mut price = Series::neutral(
            "Price",
            SeriesKind::Line,
            ticks.iter().map(|t| finite_or_zero(t.price)).collect(),
        );
        price.tones = ticks.iter().map(|t| Tone::of(t.price - reference)).collect();

        let mut volume = Series::neutral(
            "Volume",
            SeriesKind::Bar,
            ticks.iter().map(|t| finite_or_zero(t.volume)).collect(),
        );
        volume.tones = ticks
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let previous = if i == 0 { reference } else { ticks[i - 1].price };
                Tone::of(t.price - previous)
            })
            .collect();

        CategorySeries {
            categories: ticks.iter().map(|t| t.time.format("%H:%M").to_string()).collect(),
            series: vec![price, volume],
            synthetic: false,
        }
    }
}

impl Default for SeriesService {
    fn default() -> Self {
        Self::new(ChartConfig::default())
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
