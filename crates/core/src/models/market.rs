use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A daily close of a market index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Close history of one market index, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawIndexHistory")]
pub struct IndexHistory {
    /// Display name, e.g. "SSE Composite"
    pub name: String,
    pub points: Vec<IndexPoint>,
}

#[derive(Deserialize)]
struct RawIndexHistory {
    #[serde(default)]
    name: String,
    #[serde(default)]
    points: Vec<IndexPoint>,
}

impl From<RawIndexHistory> for IndexHistory {
    fn from(raw: RawIndexHistory) -> Self {
        Self::new(raw.name, raw.points)
    }
}

impl IndexHistory {
    /// Build a history; points are sorted by date.
    pub fn new(name: impl Into<String>, mut points: Vec<IndexPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self {
            name: name.into(),
            points,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Latest level of a headline index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub code: String,
    pub name: String,
    pub level: f64,
    pub change: f64,
    /// Fraction, `-0.0033` is −0.33%
    pub change_rate: f64,
}

/// News feeds exposed by the backend aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsChannel {
    Market,
    Breakfast,
    Futu,
    Ths,
    Sina,
    Realtime,
    Topic,
}

impl NewsChannel {
    #[must_use]
    pub fn path_segment(&self) -> &'static str {
        match self {
            NewsChannel::Market => "market",
            NewsChannel::Breakfast => "breakfast",
            NewsChannel::Futu => "futu",
            NewsChannel::Ths => "ths",
            NewsChannel::Sina => "sina",
            NewsChannel::Realtime => "realtime",
            NewsChannel::Topic => "topic",
        }
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeType::Buy => write!(f, "buy"),
            TradeType::Sell => write!(f, "sell"),
        }
    }
}

/// A recorded trade on a portfolio position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(default)]
    pub id: i64,
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub trade_type: TradeType,
    pub price: f64,
    pub quantity: f64,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub fee: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub traded_at: Option<String>,
}

/// A watchlist entry (fund or stock favourite).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub note: Option<String>,
}
