use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::envelope::unwrap_envelope;
use super::http_transport::HttpTransport;
use super::normalize;
use super::session::{AuthExpiryHandler, MemorySession, NoopAuthHandler, SessionStore};
use super::transport::{ApiRequest, Transport};
use crate::errors::CoreError;
use crate::models::holding::{AssetKind, Holding};
use crate::models::intraday::IntradaySeries;
use crate::models::market::{Favorite, IndexHistory, IndexQuote, NewsChannel, TradeRecord};
use crate::models::portfolio::{PortfolioDetail, PortfolioSummary};
use crate::models::settings::ClientConfig;
use crate::models::statistics::DailyStatistic;

/// Username and password for `/api/user/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Sign-up form for `/api/user/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub nickname: String,
    pub email: String,
    pub phone: String,
}

impl Registration {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        nickname: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            nickname: nickname.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

/// Typed client for the portfolio backend.
///
/// Every call attaches the session's bearer token, unwraps the
/// `{ code, message, data }` envelope and normalizes the payload. A 401
/// clears the session, notifies the injected `AuthExpiryHandler` and
/// returns `CoreError::Unauthorized`.
///
/// Calls are independent; a caller that needs "latest request wins"
/// semantics discards stale results itself.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    auth_handler: Arc<dyn AuthExpiryHandler>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl ApiClient {
    /// HTTP client with an in-memory session and no expiry callback.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        Ok(Self::with_parts(
            Arc::new(HttpTransport::new(config)?),
            Arc::new(MemorySession::new()),
            Arc::new(NoopAuthHandler),
        ))
    }

    pub fn with_parts(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        auth_handler: Arc<dyn AuthExpiryHandler>,
    ) -> Self {
        Self {
            transport,
            session,
            auth_handler,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.token().is_some()
    }

    /// Send one request and return the envelope's `data`.
    pub async fn execute(&self, request: ApiRequest) -> Result<Value, CoreError> {
        let request = match self.session.token() {
            Some(token) => request.bearer(token),
            None => request,
        };
        let label = format!("{} {}", request.method, request.path);

        let response = self.transport.send(request).await?;
        if response.status == 401 {
            warn!("{label}: session expired");
            self.session.clear();
            self.auth_handler.on_auth_expired();
            return Err(CoreError::Unauthorized);
        }

        let data = unwrap_envelope(&response)?;
        debug!("{label}: ok");
        Ok(data)
    }

    // ── Portfolio ───────────────────────────────────────────────────

    pub async fn list_portfolios(&self) -> Result<Vec<PortfolioSummary>, CoreError> {
        let data = self.execute(ApiRequest::get("/api/portfolio/")).await?;
        Ok(normalize::portfolio_list(&data))
    }

    /// Summary, stocks and statistics, plus the fund positions when the
    /// backend includes them.
    pub async fn portfolio_detail(&self, portfolio_id: i64) -> Result<PortfolioDetail, CoreError> {
        let data = self
            .execute(ApiRequest::get(format!("/api/portfolio/{portfolio_id}")))
            .await?;
        Ok(normalize::portfolio_detail(&data))
    }

    /// Detail with the fund positions fetched from their own endpoint.
    pub async fn portfolio_detail_with_funds(
        &self,
        portfolio_id: i64,
    ) -> Result<PortfolioDetail, CoreError> {
        let mut detail = self.portfolio_detail(portfolio_id).await?;
        if detail.funds.is_empty() {
            detail.funds = self.list_funds(portfolio_id).await?;
        }
        Ok(detail)
    }

    pub async fn create_portfolio(
        &self,
        name: &str,
        description: &str,
    ) -> Result<PortfolioSummary, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationError("Portfolio name must not be empty".into()));
        }
        let body = json!({ "portfolio_name": name, "description": description });
        let data = self
            .execute(ApiRequest::post("/api/portfolio/").json(body))
            .await?;
        Ok(normalize::portfolio_summary(&data))
    }

    pub async fn update_portfolio(
        &self,
        portfolio_id: i64,
        name: &str,
        description: &str,
    ) -> Result<PortfolioSummary, CoreError> {
        let body = json!({ "portfolio_name": name.trim(), "description": description });
        let data = self
            .execute(ApiRequest::put(format!("/api/portfolio/{portfolio_id}")).json(body))
            .await?;
        Ok(normalize::portfolio_summary(&data))
    }

    pub async fn delete_portfolio(&self, portfolio_id: i64) -> Result<(), CoreError> {
        self.execute(ApiRequest::delete(format!("/api/portfolio/{portfolio_id}")))
            .await
            .map(|_| ())
    }

    // ── Stock positions ─────────────────────────────────────────────

    pub async fn list_stocks(&self, portfolio_id: i64) -> Result<Vec<Holding>, CoreError> {
        let data = self
            .execute(ApiRequest::get(format!("/api/portfolio/{portfolio_id}/stocks")))
            .await?;
        Ok(normalize::stock_holdings(&data))
    }

    pub async fn add_stock(&self, portfolio_id: i64, holding: &Holding) -> Result<(), CoreError> {
        validate_position(holding, AssetKind::Stock)?;
        self.execute(
            ApiRequest::post(format!("/api/portfolio/{portfolio_id}/stocks"))
                .json(normalize::holding_body(holding)),
        )
        .await
        .map(|_| ())
    }

    pub async fn update_stock(&self, portfolio_id: i64, holding: &Holding) -> Result<(), CoreError> {
        validate_position(holding, AssetKind::Stock)?;
        self.execute(
            ApiRequest::put(format!("/api/portfolio/{portfolio_id}/stocks/{}", holding.code))
                .json(normalize::holding_body(holding)),
        )
        .await
        .map(|_| ())
    }

    pub async fn delete_stock(&self, portfolio_id: i64, code: &str) -> Result<(), CoreError> {
        self.execute(ApiRequest::delete(format!(
            "/api/portfolio/{portfolio_id}/stocks/{code}"
        )))
        .await
        .map(|_| ())
    }

    // ── Fund positions ──────────────────────────────────────────────

    pub async fn list_funds(&self, portfolio_id: i64) -> Result<Vec<Holding>, CoreError> {
        let data = self
            .execute(ApiRequest::get(format!("/api/fund/portfolio/{portfolio_id}/funds")))
            .await?;
        Ok(normalize::fund_holdings(&data))
    }

    pub async fn add_fund(&self, portfolio_id: i64, holding: &Holding) -> Result<(), CoreError> {
        validate_position(holding, AssetKind::Fund)?;
        self.execute(
            ApiRequest::post(format!("/api/fund/portfolio/{portfolio_id}/funds"))
                .json(normalize::holding_body(holding)),
        )
        .await
        .map(|_| ())
    }

    pub async fn update_fund(&self, portfolio_id: i64, holding: &Holding) -> Result<(), CoreError> {
        validate_position(holding, AssetKind::Fund)?;
        self.execute(
            ApiRequest::put(format!(
                "/api/fund/portfolio/{portfolio_id}/funds/{}",
                holding.code
            ))
            .json(normalize::holding_body(holding)),
        )
        .await
        .map(|_| ())
    }

    pub async fn delete_fund(&self, portfolio_id: i64, code: &str) -> Result<(), CoreError> {
        self.execute(ApiRequest::delete(format!(
            "/api/fund/portfolio/{portfolio_id}/funds/{code}"
        )))
        .await
        .map(|_| ())
    }

    // ── Trades & statistics ─────────────────────────────────────────

    pub async fn list_trades(&self, portfolio_id: i64) -> Result<Vec<TradeRecord>, CoreError> {
        let data = self
            .execute(ApiRequest::get(format!("/api/portfolio/{portfolio_id}/trades")))
            .await?;
        Ok(normalize::trade_records(&data))
    }

    /// Record a stock trade; the backend adjusts the position.
    pub async fn create_trade(&self, portfolio_id: i64, trade: &TradeRecord) -> Result<(), CoreError> {
        validate_trade(trade)?;
        self.execute(
            ApiRequest::post(format!("/api/portfolio/{portfolio_id}/trades"))
                .json(normalize::trade_body(trade, AssetKind::Stock)),
        )
        .await
        .map(|_| ())
    }

    pub async fn create_fund_trade(
        &self,
        portfolio_id: i64,
        trade: &TradeRecord,
    ) -> Result<(), CoreError> {
        validate_trade(trade)?;
        self.execute(
            ApiRequest::post(format!(
                "/api/fund/portfolio/{portfolio_id}/funds/{}/trade",
                trade.code
            ))
            .json(normalize::trade_body(trade, AssetKind::Fund)),
        )
        .await
        .map(|_| ())
    }

    /// Ask the backend to refresh stock prices of every portfolio.
    pub async fn update_stock_prices(&self) -> Result<(), CoreError> {
        self.execute(ApiRequest::post("/api/portfolio/update-prices"))
            .await
            .map(|_| ())
    }

    /// Refresh fund NAVs, optionally for one portfolio only.
    pub async fn update_fund_prices(&self, portfolio_id: Option<i64>) -> Result<(), CoreError> {
        let body = match portfolio_id {
            Some(id) => json!({ "portfolio_id": id }),
            None => json!({}),
        };
        self.execute(ApiRequest::post("/api/fund/update-prices").json(body))
            .await
            .map(|_| ())
    }

    /// Have the backend write today's snapshot for every portfolio.
    pub async fn create_daily_statistics(&self) -> Result<Vec<DailyStatistic>, CoreError> {
        let data = self
            .execute(ApiRequest::post("/api/portfolio/statistics/daily"))
            .await?;
        Ok(normalize::daily_statistics(&data))
    }

    // ── Favorites ───────────────────────────────────────────────────

    pub async fn fund_favorites(&self) -> Result<Vec<Favorite>, CoreError> {
        let data = self.execute(ApiRequest::get("/api/fund/favorites")).await?;
        Ok(normalize::favorites(&data))
    }

    pub async fn add_fund_favorite(&self, code: &str, name: &str) -> Result<(), CoreError> {
        require("fund code", code)?;
        self.execute(
            ApiRequest::post("/api/fund/favorites")
                .json(json!({ "fund_code": code.trim(), "fund_name": name.trim() })),
        )
        .await
        .map(|_| ())
    }

    pub async fn remove_fund_favorite(&self, code: &str) -> Result<(), CoreError> {
        self.execute(ApiRequest::delete(format!("/api/fund/favorites/{code}")))
            .await
            .map(|_| ())
    }

    pub async fn update_fund_favorite_note(&self, code: &str, note: &str) -> Result<(), CoreError> {
        self.execute(
            ApiRequest::put(format!("/api/fund/favorites/{code}/note")).json(json!({ "note": note })),
        )
        .await
        .map(|_| ())
    }

    pub async fn stock_favorites(&self) -> Result<Vec<Favorite>, CoreError> {
        let data = self.execute(ApiRequest::get("/api/strategy/favorites")).await?;
        Ok(normalize::favorites(&data))
    }

    pub async fn add_stock_favorite(&self, code: &str, name: &str) -> Result<(), CoreError> {
        require("stock code", code)?;
        self.execute(
            ApiRequest::post("/api/strategy/favorites")
                .json(json!({ "stock_code": code.trim(), "stock_name": name.trim() })),
        )
        .await
        .map(|_| ())
    }

    pub async fn remove_stock_favorite(&self, code: &str) -> Result<(), CoreError> {
        self.execute(ApiRequest::delete(format!("/api/strategy/favorites/{code}")))
            .await
            .map(|_| ())
    }

    pub async fn update_stock_favorite_note(&self, code: &str, note: &str) -> Result<(), CoreError> {
        self.execute(
            ApiRequest::put(format!("/api/strategy/favorites/{code}/note"))
                .json(json!({ "note": note })),
        )
        .await
        .map(|_| ())
    }

    /// Live quotes for a batch of favorite stocks, passed through as
    /// returned. An empty batch is answered locally.
    pub async fn favorite_stocks_realtime(&self, codes: &[&str]) -> Result<Vec<Value>, CoreError> {
        let codes: Vec<&str> = codes
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let data = self
            .execute(
                ApiRequest::post("/api/strategy/favorites/realtime")
                    .json(json!({ "stock_codes": codes })),
            )
            .await?;
        Ok(normalize::items(&data).to_vec())
    }

    // ── Search & quotes ─────────────────────────────────────────────

    /// Fund search results, passed through as returned.
    pub async fn search_funds(&self, keyword: &str) -> Result<Vec<Value>, CoreError> {
        require("keyword", keyword)?;
        let data = self
            .execute(ApiRequest::get("/api/fund/search").query("keyword", keyword.trim()))
            .await?;
        Ok(normalize::items(&data).to_vec())
    }

    pub async fn search_stocks(&self, keyword: &str) -> Result<Vec<Value>, CoreError> {
        require("keyword", keyword)?;
        let data = self
            .execute(ApiRequest::get("/api/stock/search").query("keyword", keyword.trim()))
            .await?;
        Ok(normalize::items(&data).to_vec())
    }

    pub async fn fund_info(&self, code: &str) -> Result<Value, CoreError> {
        self.execute(ApiRequest::get(format!("/api/fund/info/{code}")))
            .await
    }

    pub async fn fund_nav(&self, code: &str) -> Result<Value, CoreError> {
        self.execute(ApiRequest::get(format!("/api/fund/nav/{code}")))
            .await
    }

    /// Quote and `days` of daily history for one stock.
    pub async fn stock_info(&self, symbol: &str, days: u32) -> Result<Value, CoreError> {
        self.execute(
            ApiRequest::get("/api/stock/info")
                .query("symbol", symbol)
                .query("days", days),
        )
        .await
    }

    pub async fn stock_basic_info(&self, symbol: &str) -> Result<Value, CoreError> {
        self.execute(ApiRequest::get("/api/stock/basic_info").query("symbol", symbol))
            .await
    }

    pub async fn stock_news(&self, symbol: &str, limit: u32) -> Result<Vec<Value>, CoreError> {
        let data = self
            .execute(
                ApiRequest::get("/api/stock/news")
                    .query("symbol", symbol)
                    .query("limit", limit),
            )
            .await?;
        Ok(normalize::items(&data).to_vec())
    }

    /// Current session ticks of one stock, ready for the crosshair.
    pub async fn stock_intraday(&self, symbol: &str) -> Result<IntradaySeries, CoreError> {
        let data = self
            .execute(ApiRequest::get("/api/stock/intraday").query("symbol", symbol))
            .await?;
        Ok(normalize::intraday_series(&data))
    }

    /// Latest levels of the three headline indexes.
    pub async fn market_indexes(&self) -> Result<Vec<IndexQuote>, CoreError> {
        let data = self.execute(ApiRequest::get("/api/stock/market_indexes")).await?;
        Ok(normalize::index_quotes(&data))
    }

    /// Daily closes of one index; `period` is `3m`, `1y` or `5y`.
    pub async fn market_trend(&self, index_code: &str, period: &str) -> Result<IndexHistory, CoreError> {
        let data = self
            .execute(
                ApiRequest::get("/api/stock/market_trend")
                    .query("index_code", index_code)
                    .query("period", period),
            )
            .await?;
        Ok(normalize::index_history(&data))
    }

    // ── News ────────────────────────────────────────────────────────

    /// Articles from one feed; `topic` is only sent to the topic feed.
    pub async fn news(
        &self,
        channel: NewsChannel,
        limit: u32,
        topic: Option<&str>,
    ) -> Result<Vec<Value>, CoreError> {
        let mut request = ApiRequest::get(format!("/api/news/{}", channel.path_segment()))
            .query("limit", limit);
        if channel == NewsChannel::Topic {
            let topic = topic.map(str::trim).unwrap_or_default();
            require("topic", topic)?;
            request = request.query("topic", topic);
        }
        let data = self.execute(request).await?;
        Ok(normalize::items(&data).to_vec())
    }

    // ── AI analysis (backend proxy) ─────────────────────────────────

    /// Stock analysis; the backend holds the model credentials.
    pub async fn stock_analysis(&self, prompt: &str, stock_code: Option<&str>) -> Result<Value, CoreError> {
        require("prompt", prompt)?;
        self.execute(
            ApiRequest::post("/api/strategy/ai-analysis")
                .json(json!({ "prompt": prompt.trim(), "stock_code": stock_code })),
        )
        .await
    }

    pub async fn fund_analysis(&self, prompt: &str, fund_code: Option<&str>) -> Result<Value, CoreError> {
        require("prompt", prompt)?;
        self.execute(
            ApiRequest::post("/api/fund/ai-analysis")
                .json(json!({ "prompt": prompt.trim(), "fund_code": fund_code })),
        )
        .await
    }

    pub async fn stock_analysis_history(&self, limit: u32, offset: u32) -> Result<Vec<Value>, CoreError> {
        let data = self
            .execute(
                ApiRequest::get("/api/strategy/analysis-history")
                    .query("limit", limit)
                    .query("offset", offset),
            )
            .await?;
        Ok(normalize::items(&data).to_vec())
    }

    pub async fn fund_analysis_history(&self, limit: u32, offset: u32) -> Result<Vec<Value>, CoreError> {
        let data = self
            .execute(
                ApiRequest::get("/api/fund/analysis-history")
                    .query("limit", limit)
                    .query("offset", offset),
            )
            .await?;
        Ok(normalize::items(&data).to_vec())
    }

    // ── User ────────────────────────────────────────────────────────

    /// Log in and keep the returned token in the session.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), CoreError> {
        require("username", &credentials.username)?;
        require("password", &credentials.password)?;
        let body = serde_json::to_value(credentials)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        let data = self
            .execute(ApiRequest::post("/api/user/login").json(body))
            .await?;
        let token = normalize::token(&data)
            .ok_or_else(|| CoreError::Deserialization("Login response carried no token".into()))?;
        self.session.set_token(token);
        Ok(())
    }

    /// Create an account. The session is left untouched; call `login` next.
    pub async fn register(&self, registration: &Registration) -> Result<(), CoreError> {
        require("username", &registration.username)?;
        require("password", &registration.password)?;
        require("nickname", &registration.nickname)?;
        require("email", &registration.email)?;
        require("phone", &registration.phone)?;
        let body = serde_json::to_value(registration)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        self.execute(ApiRequest::post("/api/user/register").json(body))
            .await
            .map(|_| ())
    }

    /// Tell the backend, then clear the session whatever it answered.
    pub async fn logout(&self) -> Result<(), CoreError> {
        let result = self.execute(ApiRequest::post("/api/user/logout")).await;
        self.session.clear();
        if let Err(e) = &result {
            debug!("Logout request failed, session cleared anyway: {e}");
        }
        result.map(|_| ())
    }

    pub async fn current_user(&self) -> Result<Value, CoreError> {
        self.execute(ApiRequest::get("/api/user/info")).await
    }

    /// Public profile of another user.
    pub async fn user_info(&self, user_id: i64) -> Result<Value, CoreError> {
        self.execute(ApiRequest::get(format!("/api/user/info/{user_id}")))
            .await
    }

    pub async fn user_profile(&self) -> Result<Value, CoreError> {
        self.execute(ApiRequest::get("/api/user-profile/profile"))
            .await
    }

    pub async fn submit_questionnaire(&self, answers: &Value) -> Result<Value, CoreError> {
        if !answers.is_object() {
            return Err(CoreError::ValidationError(
                "Questionnaire answers must be a JSON object".into(),
            ));
        }
        self.execute(ApiRequest::post("/api/user-profile/questionnaire").json(answers.clone()))
            .await
    }
}

fn require(what: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationError(format!("{what} must not be empty")));
    }
    Ok(())
}

fn validate_position(holding: &Holding, expected: AssetKind) -> Result<(), CoreError> {
    if holding.kind != expected {
        return Err(CoreError::ValidationError(format!(
            "Expected a {expected} position, got a {} one",
            holding.kind
        )));
    }
    require("code", &holding.code)?;
    if !(holding.quantity.is_finite() && holding.quantity > 0.0) {
        return Err(CoreError::ValidationError("Quantity must be positive".into()));
    }
    Ok(())
}

fn validate_trade(trade: &TradeRecord) -> Result<(), CoreError> {
    require("code", &trade.code)?;
    if !(trade.price.is_finite() && trade.price > 0.0) {
        return Err(CoreError::ValidationError("Trade price must be positive".into()));
    }
    if !(trade.quantity.is_finite() && trade.quantity > 0.0) {
        return Err(CoreError::ValidationError("Trade quantity must be positive".into()));
    }
    Ok(())
}
