pub mod api;
pub mod errors;
pub mod models;
pub mod services;

use std::sync::Arc;

use chrono::NaiveDate;
use log::debug;

use api::{ApiClient, AuthExpiryHandler, SessionStore};
use errors::CoreError;
use models::{
    analytics::MetricsBundle,
    chart::{CategorySeries, Crosshair, PlotRect},
    holding::Holding,
    intraday::IntradaySeries,
    market::IndexHistory,
    portfolio::PortfolioDetail,
    report::AnalysisReport,
    settings::InsightConfig,
    statistics::DailyStatistic,
};
use services::{
    crosshair_service::{CrosshairService, PriceScale},
    metrics_service::MetricsService,
    series_service::{SeriesService, TrendChartKind},
};

/// Main entry point for the portfolio insight core library.
/// Holds the configuration and the pure services; the API client is
/// created on demand from the same configuration.
#[must_use]
pub struct PortfolioInsight {
    config: InsightConfig,
    metrics_service: MetricsService,
    series_service: SeriesService,
    crosshair_service: CrosshairService,
}

impl std::fmt::Debug for PortfolioInsight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioInsight")
            .field("config", &self.config)
            .finish()
    }
}

impl PortfolioInsight {
    /// Build from a validated configuration.
    pub fn new(config: InsightConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Build from a JSON configuration document (partial documents allowed).
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config = InsightConfig::from_json(json)?;
        Ok(Self::build(config))
    }

    fn build(config: InsightConfig) -> Self {
        let metrics_service = MetricsService::new(config.metrics.clone());
        let series_service = SeriesService::new(config.charts.clone());
        let crosshair_service = CrosshairService::new();

        Self {
            config,
            metrics_service,
            series_service,
            crosshair_service,
        }
    }

    #[must_use]
    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    // ── Metrics ─────────────────────────────────────────────────────

    /// Metrics bundle for one portfolio, stocks first then funds.
    pub fn compute_metrics(&self, detail: &PortfolioDetail, as_of: NaiveDate) -> MetricsBundle {
        self.metrics_service.compute_metrics(
            &detail.portfolio,
            &detail.holdings(),
            &detail.statistics,
            as_of,
        )
    }

    /// Metrics and every analysis chart in one call.
    pub fn analyze(&self, detail: &PortfolioDetail, as_of: NaiveDate) -> AnalysisReport {
        let holdings = detail.holdings();
        let metrics = self.metrics_service.compute_metrics(
            &detail.portfolio,
            &holdings,
            &detail.statistics,
            as_of,
        );
        debug!(
            "Analysis for portfolio {}: score {}, {} holdings",
            detail.portfolio.id,
            metrics.score,
            metrics.holding_count()
        );

        AnalysisReport {
            value_trend: self
                .series_service
                .trend_chart(&detail.statistics, TrendChartKind::Value),
            rate_trend: self
                .series_service
                .trend_chart(&detail.statistics, TrendChartKind::Rate),
            return_distribution: self.series_service.return_distribution_chart(&holdings),
            allocation: self.series_service.allocation_chart(&holdings),
            asset_kinds: self.series_service.asset_kind_chart(&holdings),
            industries: self.series_service.industry_chart(&holdings),
            risk_return: SeriesService::risk_return_points(&holdings),
            concentration: SeriesService::concentration_chart(&metrics.concentration),
            monthly_trend: SeriesService::monthly_trend_chart(&metrics.trend),
            metrics,
        }
    }

    // ── Charts ──────────────────────────────────────────────────────

    #[must_use]
    pub fn trend_chart(&self, statistics: &[DailyStatistic], kind: TrendChartKind) -> CategorySeries {
        self.series_service.trend_chart(statistics, kind)
    }

    /// Three index histories on one axis, each rebased to 100.
    #[must_use]
    pub fn compare_indices(
        &self,
        primary: &IndexHistory,
        secondary: &IndexHistory,
        tertiary: &IndexHistory,
    ) -> CategorySeries {
        self.series_service.align_indices(primary, secondary, tertiary)
    }

    #[must_use]
    pub fn return_distribution(&self, holdings: &[Holding]) -> CategorySeries {
        self.series_service.return_distribution_chart(holdings)
    }

    #[must_use]
    pub fn allocation(&self, holdings: &[Holding]) -> CategorySeries {
        self.series_service.allocation_chart(holdings)
    }

    #[must_use]
    pub fn industry_distribution(&self, holdings: &[Holding]) -> CategorySeries {
        self.series_service.industry_chart(holdings)
    }

    // ── Intraday ────────────────────────────────────────────────────

    #[must_use]
    pub fn intraday_chart(&self, series: &IntradaySeries) -> CategorySeries {
        SeriesService::intraday_chart(series)
    }

    #[must_use]
    pub fn price_scale(&self, series: &IntradaySeries) -> Option<PriceScale> {
        PriceScale::from_series(series)
    }

    /// Crosshair for a pointer at `pointer_x`, `None` outside the plot.
    #[must_use]
    pub fn crosshair(
        &self,
        series: &IntradaySeries,
        rect: &PlotRect,
        pointer_x: f64,
    ) -> Option<Crosshair> {
        self.crosshair_service.hit_test(series, rect, pointer_x)
    }

    // ── Backend ─────────────────────────────────────────────────────

    /// HTTP client for the configured backend.
    pub fn api_client(&self) -> Result<ApiClient, CoreError> {
        ApiClient::new(self.config.client.clone())
    }

    /// HTTP client with a caller-provided session store and expiry callback.
    pub fn api_client_with(
        &self,
        session: Arc<dyn SessionStore>,
        auth_handler: Arc<dyn AuthExpiryHandler>,
    ) -> Result<ApiClient, CoreError> {
        let transport = api::http_transport::HttpTransport::new(self.config.client.clone())?;
        Ok(ApiClient::with_parts(Arc::new(transport), session, auth_handler))
    }

    /// Fetch a portfolio (funds included) and analyze it.
    pub async fn fetch_and_analyze(
        &self,
        client: &ApiClient,
        portfolio_id: i64,
        as_of: NaiveDate,
    ) -> Result<AnalysisReport, CoreError> {
        let detail = client.portfolio_detail_with_funds(portfolio_id).await?;
        Ok(self.analyze(&detail, as_of))
    }
}

impl Default for PortfolioInsight {
    fn default() -> Self {
        Self::build(InsightConfig::default())
    }
}
