// ═══════════════════════════════════════════════════════════════════
// Series Tests: SeriesService (trend charts, index alignment,
// histograms, allocation, scatter, Lorenz, intraday)
// ═══════════════════════════════════════════════════════════════════

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};

use portfolio_insight_core::models::analytics::{MonthlyReturn, TrendSeries};
use portfolio_insight_core::models::chart::{SeriesKind, Tone};
use portfolio_insight_core::models::holding::Holding;
use portfolio_insight_core::models::intraday::{IntradaySeries, Tick};
use portfolio_insight_core::models::market::{IndexHistory, IndexPoint};
use portfolio_insight_core::models::settings::ChartConfig;
use portfolio_insight_core::models::statistics::DailyStatistic;
use portfolio_insight_core::services::metrics_service::MetricsService;
use portfolio_insight_core::services::series_service::{SeriesService, TrendChartKind};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn history(name: &str, points: &[(NaiveDate, f64)]) -> IndexHistory {
    IndexHistory::new(
        name,
        points
            .iter()
            .map(|(date, close)| IndexPoint { date: *date, close: *close })
            .collect(),
    )
}

fn stat(date: NaiveDate, value: f64, pl: f64, rate: f64, daily_pl: f64, daily_rate: f64) -> DailyStatistic {
    DailyStatistic {
        date,
        total_value: value,
        total_profit_loss: pl,
        total_profit_loss_rate: rate,
        daily_profit_loss: daily_pl,
        daily_profit_loss_rate: daily_rate,
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Trend chart
// ═══════════════════════════════════════════════════════════════════

mod trend_chart {
    use super::*;

    #[test]
    fn empty_statistics_give_empty_chart() {
        let service = SeriesService::default();
        assert!(service.trend_chart(&[], TrendChartKind::Value).is_empty());
        assert!(service.trend_chart(&[], TrendChartKind::Rate).is_empty());
    }

    #[test]
    fn value_chart_is_sorted_by_date() {
        let service = SeriesService::default();
        let stats = vec![
            stat(d(2024, 1, 3), 1100.0, 100.0, 0.1, 50.0, 0.047),
            stat(d(2024, 1, 2), 1050.0, 50.0, 0.05, -10.0, -0.009),
        ];
        let chart = service.trend_chart(&stats, TrendChartKind::Value);
        assert_eq!(chart.categories, vec!["2024-01-02", "2024-01-03"]);

        let total = chart.series_named("Total value").unwrap();
        assert_eq!(total.values, vec![Some(1050.0), Some(1100.0)]);
        assert_eq!(total.tones, vec![Tone::Neutral, Tone::Neutral]);

        let daily = chart.series_named("Daily profit/loss").unwrap();
        assert_eq!(daily.kind, SeriesKind::Bar);
        assert_eq!(daily.tones, vec![Tone::Loss, Tone::Gain]);
    }

    #[test]
    fn rate_chart_in_rounded_percent() {
        let service = SeriesService::default();
        let stats = vec![stat(d(2024, 1, 2), 1000.0, 0.0, 0.05123, 0.0, -0.00456)];
        let chart = service.trend_chart(&stats, TrendChartKind::Rate);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].values, vec![Some(5.12)]);
        assert_eq!(chart.series[1].values, vec![Some(-0.46)]);
        assert_eq!(chart.series[1].tones, vec![Tone::Loss]);
    }

    #[test]
    fn non_finite_snapshot_values_are_zero() {
        let service = SeriesService::default();
        let stats = vec![stat(d(2024, 1, 2), f64::NAN, 0.0, 0.0, 0.0, 0.0)];
        let chart = service.trend_chart(&stats, TrendChartKind::Value);
        assert_eq!(chart.series[0].values, vec![Some(0.0)]);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Index alignment
// ═══════════════════════════════════════════════════════════════════

mod align_indices {
    use super::*;

    #[test]
    fn identical_histories_give_identical_series() {
        let service = SeriesService::default();
        let points = [(d(2024, 1, 2), 3000.0), (d(2024, 1, 3), 3030.0), (d(2024, 1, 4), 2970.0)];
        let chart = service.align_indices(
            &history("A", &points),
            &history("B", &points),
            &history("C", &points),
        );
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.series[0].values, chart.series[1].values);
        assert_eq!(chart.series[1].values, chart.series[2].values);
        assert_eq!(chart.series[0].values[0], Some(100.0));
    }

    #[test]
    fn longest_history_sets_the_axis() {
        let service = SeriesService::default();
        let short = history("Short", &[(d(2024, 1, 3), 10.0)]);
        let long = history(
            "Long",
            &[(d(2024, 1, 2), 100.0), (d(2024, 1, 3), 110.0), (d(2024, 1, 4), 120.0)],
        );
        let chart = service.align_indices(&short, &long, &IndexHistory::default());
        assert_eq!(chart.categories, vec!["2024-01-02", "2024-01-03", "2024-01-04"]);

        let short_series = chart.series_named("Short").unwrap();
        assert_eq!(short_series.values, vec![None, Some(100.0), None]);
        let long_series = chart.series_named("Long").unwrap();
        assert!((long_series.values[2].unwrap() - 120.0).abs() < 1e-9);
        // empty history contributes nothing
        assert_eq!(chart.series.len(), 2);
    }

    #[test]
    fn ties_go_to_the_earlier_argument() {
        let service = SeriesService::default();
        let primary = history("P", &[(d(2024, 1, 2), 1.0), (d(2024, 1, 3), 1.0)]);
        let secondary = history("S", &[(d(2024, 2, 2), 1.0), (d(2024, 2, 3), 1.0)]);
        let tertiary = history("T", &[(d(2024, 3, 2), 1.0), (d(2024, 3, 3), 1.0)]);

        let chart = service.align_indices(&primary, &secondary, &tertiary);
        assert_eq!(chart.categories, vec!["2024-01-02", "2024-01-03"]);

        let chart = service.align_indices(&IndexHistory::default(), &secondary, &tertiary);
        assert_eq!(chart.categories, vec!["2024-02-02", "2024-02-03"]);
    }

    #[test]
    fn base_is_first_positive_close() {
        let service = SeriesService::default();
        let h = history("H", &[(d(2024, 1, 2), 0.0), (d(2024, 1, 3), 50.0), (d(2024, 1, 4), 75.0)]);
        let chart = service.align_indices(&h, &IndexHistory::default(), &IndexHistory::default());
        assert_eq!(chart.series[0].values, vec![Some(0.0), Some(100.0), Some(150.0)]);
    }

    #[test]
    fn unsorted_points_are_ordered_before_rebasing() {
        let service = SeriesService::default();
        let h = IndexHistory {
            name: "H".into(),
            points: vec![
                IndexPoint { date: d(2024, 1, 4), close: 150.0 },
                IndexPoint { date: d(2024, 1, 2), close: 50.0 },
                IndexPoint { date: d(2024, 1, 3), close: 100.0 },
            ],
        };
        let chart = service.align_indices(&h, &IndexHistory::default(), &IndexHistory::default());
        assert_eq!(chart.categories, vec!["2024-01-02", "2024-01-03", "2024-01-04"]);
        assert_eq!(chart.series[0].values, vec![Some(100.0), Some(200.0), Some(300.0)]);
    }

    #[test]
    fn all_empty_is_empty() {
        let service = SeriesService::default();
        let empty = IndexHistory::default();
        assert!(service.align_indices(&empty, &empty, &empty).is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Histogram
// ═══════════════════════════════════════════════════════════════════

mod histogram {
    use super::*;

    #[test]
    fn empty_input() {
        assert!(SeriesService::histogram(&[], 8).is_empty());
    }

    #[test]
    fn bin_count_capped_by_sample_count() {
        let bins = SeriesService::histogram(&[1.0, 2.0, 3.0, 4.0, 5.0], 8);
        assert_eq!(bins.len(), 5);
        assert!(bins.iter().all(|b| b.count() == 1));
        assert_eq!(bins[0].start, 1.0);
        assert_eq!(bins[4].end, 5.0);
    }

    #[test]
    fn interior_edge_belongs_to_upper_bin() {
        let bins = SeriesService::histogram(&[0.0, 10.0, 5.0], 2);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].members, vec![0]);
        assert_eq!(bins[1].members, vec![1, 2]);
        assert_eq!(bins[0].label, "0.0 ~ 5.0");
    }

    #[test]
    fn identical_samples_land_in_one_bin() {
        let bins = SeriesService::histogram(&[3.0, 3.0, 3.0], 8);
        let total: usize = bins.iter().map(|b| b.count()).sum();
        assert_eq!(total, 3);
        assert_eq!(bins.iter().filter(|b| b.count() > 0).count(), 1);
    }

    #[test]
    fn extreme_range_keeps_edges_finite() {
        let bins = SeriesService::histogram(&[-1e308, 1e308], 2);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].start, -1e308);
        assert_eq!(bins[1].end, 1e308);
        assert_eq!(bins[0].end, bins[1].start);
        for bin in &bins {
            assert!(bin.start.is_finite() && bin.end.is_finite());
            assert!(bin.start <= bin.end);
        }
        assert_eq!(bins[0].members, vec![0]);
        assert_eq!(bins[1].members, vec![1]);
    }

    #[test]
    fn non_finite_samples_count_as_zero() {
        let bins = SeriesService::histogram(&[f64::NAN, 4.0], 2);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[0].members, vec![0]);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Holding charts
// ═══════════════════════════════════════════════════════════════════

mod holding_charts {
    use super::*;

    fn holdings() -> Vec<Holding> {
        vec![
            Holding::stock("A", "Alpha", 100.0, 10.0, 12.0),
            Holding::stock("B", "Beta", 1000.0, 10.0, 11.0),
            Holding::fund("F", "Fund", 100.0, 10.0, 9.5),
            Holding::stock("Z", "Zero", 0.0, 10.0, 9.5),
        ]
    }

    #[test]
    fn return_distribution_counts_every_holding() {
        let chart = SeriesService::default().return_distribution_chart(&holdings());
        let total: f64 = chart.series[0].values.iter().flatten().sum();
        assert_eq!(total, 4.0);
        assert!(chart.categories[0].ends_with('%'));
    }

    #[test]
    fn allocation_is_descending_and_capped() {
        let service = SeriesService::new(ChartConfig {
            allocation_top_n: 2,
            ..ChartConfig::default()
        });
        let chart = service.allocation_chart(&holdings());
        assert_eq!(chart.categories, vec!["Beta", "Alpha"]);
        assert_eq!(chart.series[0].kind, SeriesKind::Pie);
        assert_eq!(chart.series[0].values, vec![Some(11000.0), Some(1200.0)]);
    }

    #[test]
    fn allocation_zero_cap_shows_largest() {
        let service = SeriesService::new(ChartConfig {
            allocation_top_n: 0,
            max_histogram_bins: 0,
            ..ChartConfig::default()
        });
        let chart = service.allocation_chart(&holdings());
        assert_eq!(chart.categories, vec!["Beta"]);

        let distribution = service.return_distribution_chart(&holdings());
        assert_eq!(distribution.categories.len(), 1);
    }

    #[test]
    fn industries_group_stocks_by_value() {
        let holdings = vec![
            Holding::stock("600519", "Moutai", 10.0, 1600.0, 1750.0),
            Holding::stock("000858", "Wuliangye", 100.0, 150.0, 140.0),
            Holding::stock("600036", "CMB", 1000.0, 30.0, 35.0),
            Holding::stock("999999", "Unknown", 10.0, 10.0, 9.0),
            Holding::fund("110011", "Growth", 5000.0, 1.2, 1.3),
        ];
        let chart = SeriesService::default().industry_chart(&holdings);

        assert_eq!(chart.categories, vec!["Banking", "Food & beverage", "Other"]);
        let value = chart.series_named("Market value").unwrap();
        assert_eq!(value.kind, SeriesKind::Pie);
        assert_eq!(value.values, vec![Some(35000.0), Some(31500.0), Some(90.0)]);
        let count = chart.series_named("Stocks held").unwrap();
        assert_eq!(count.values, vec![Some(1.0), Some(2.0), Some(1.0)]);
        let pl = chart.series_named("Profit/loss").unwrap();
        assert_eq!(pl.values, vec![Some(5000.0), Some(500.0), Some(-10.0)]);
        assert_eq!(pl.tones, vec![Tone::Gain, Tone::Gain, Tone::Loss]);
    }

    #[test]
    fn configured_industries_override_the_table() {
        let service = SeriesService::new(ChartConfig {
            industries: BTreeMap::from([
                ("999999".to_string(), "Insurance".to_string()),
                ("600519".to_string(), "Spirits".to_string()),
            ]),
            ..ChartConfig::default()
        });
        assert_eq!(service.industry_of("999999"), "Insurance");
        assert_eq!(service.industry_of(" 600519 "), "Spirits");
        assert_eq!(service.industry_of("000001"), "Banking");
        assert_eq!(service.industry_of("123456"), "Other");
    }

    #[test]
    fn industries_without_stocks_is_empty() {
        let service = SeriesService::default();
        assert!(service.industry_chart(&[]).is_empty());
        assert!(service
            .industry_chart(&[Holding::fund("110011", "Growth", 1.0, 1.0, 1.0)])
            .is_empty());
    }

    #[test]
    fn allocation_without_value_is_empty() {
        let chart = SeriesService::default().allocation_chart(&[Holding::stock("Z", "Z", 0.0, 1.0, 1.0)]);
        assert!(chart.is_empty());
    }

    #[test]
    fn asset_kind_omits_empty_buckets() {
        let service = SeriesService::default();
        let chart = service.asset_kind_chart(&holdings());
        assert_eq!(chart.categories, vec!["Stocks", "Funds"]);
        assert_eq!(chart.series[0].values, vec![Some(3.0), Some(1.0)]);

        let only_stocks = service.asset_kind_chart(&holdings()[..1]);
        assert_eq!(only_stocks.categories, vec!["Stocks"]);
        assert!(service.asset_kind_chart(&[]).is_empty());
    }

    #[test]
    fn risk_return_points_are_deterministic() {
        let points = SeriesService::risk_return_points(&holdings());
        assert_eq!(points.len(), 3);

        let alpha = &points[0];
        assert!((alpha.x - 10.0).abs() < 1e-9);
        assert!((alpha.y - 20.0).abs() < 1e-9);
        assert_eq!(alpha.size, 15.0);
        assert_eq!(alpha.tone, Tone::Gain);

        let fund = &points[2];
        assert!((fund.x - 1.5).abs() < 1e-9);
        assert_eq!(fund.tone, Tone::Loss);

        assert_eq!(points, SeriesService::risk_return_points(&holdings()));
    }

    #[test]
    fn bubble_grows_with_value() {
        let big = Holding::stock("BIG", "Big", 1_000_000.0, 1.0, 1.0);
        let points = SeriesService::risk_return_points(&[big]);
        assert!((points[0].size - (1000.0_f64.sqrt() + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn concentration_chart_has_curve_and_equality_line() {
        let concentration = MetricsService::concentration(&holdings());
        let chart = SeriesService::concentration_chart(&concentration);
        assert_eq!(chart.categories.len(), concentration.curve.len());
        assert_eq!(chart.series[0].kind, SeriesKind::Area);
        assert_eq!(chart.series[1].values.last(), Some(&Some(100.0)));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Monthly trend & intraday
// ═══════════════════════════════════════════════════════════════════

mod other_charts {
    use super::*;

    #[test]
    fn monthly_trend_chart_propagates_synthetic_flag() {
        let trend = TrendSeries {
            points: vec![MonthlyReturn {
                month: "2024-01".into(),
                return_pct: -1.5,
                cumulative_pct: -1.5,
            }],
            synthetic: true,
        };
        let chart = SeriesService::monthly_trend_chart(&trend);
        assert!(chart.synthetic);
        assert_eq!(chart.categories, vec!["2024-01"]);
        assert_eq!(chart.series[0].tones, vec![Tone::Loss]);
    }

    #[test]
    fn empty_trend_gives_empty_chart() {
        assert!(SeriesService::monthly_trend_chart(&TrendSeries::empty()).is_empty());
    }

    #[test]
    fn intraday_chart_tones() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        let series = IntradaySeries::new(
            vec![
                Tick::new(t(9, 30), 10.1, 100.0),
                Tick::new(t(9, 31), 9.9, 80.0),
                Tick::new(t(9, 32), 9.9, 60.0),
            ],
            10.0,
            10.05,
        );
        let chart = SeriesService::intraday_chart(&series);
        assert_eq!(chart.categories, vec!["09:30", "09:31", "09:32"]);

        let price = chart.series_named("Price").unwrap();
        assert_eq!(price.tones, vec![Tone::Gain, Tone::Loss, Tone::Loss]);

        let volume = chart.series_named("Volume").unwrap();
        assert_eq!(volume.tones, vec![Tone::Gain, Tone::Loss, Tone::Flat]);
    }

    #[test]
    fn intraday_chart_of_empty_series() {
        assert!(SeriesService::intraday_chart(&IntradaySeries::default()).is_empty());
    }
}
