use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// One intraday sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub time: NaiveTime,
    pub price: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Tick {
    pub fn new(time: NaiveTime, price: f64, volume: f64) -> Self {
        Self { time, price, volume }
    }
}

/// Intraday samples of a single security for the current session.
///
/// Ticks are kept sorted by time, also when deserialized. An empty series
/// is the "no data" state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawIntradaySeries")]
pub struct IntradaySeries {
    ticks: Vec<Tick>,

    /// Previous session close, `0` when unknown
    pub previous_close: f64,

    /// Session open, `0` when unknown
    pub open: f64,
}

#[derive(Deserialize)]
struct RawIntradaySeries {
    #[serde(default)]
    ticks: Vec<Tick>,
    #[serde(default)]
    previous_close: f64,
    #[serde(default)]
    open: f64,
}

impl From<RawIntradaySeries> for IntradaySeries {
    fn from(raw: RawIntradaySeries) -> Self {
        Self::new(raw.ticks, raw.previous_close, raw.open)
    }
}

impl IntradaySeries {
    /// Build a series; ticks are stably sorted by time.
    pub fn new(mut ticks: Vec<Tick>, previous_close: f64, open: f64) -> Self {
        ticks.sort_by_key(|t| t.time);
        Self {
            ticks,
            previous_close,
            open,
        }
    }

    #[must_use]
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Tick> {
        self.ticks.get(index)
    }

    /// Reference price for gain/loss colouring: previous close, else open,
    /// else the first tick.
    #[must_use]
    pub fn reference_price(&self) -> f64 {
        if self.previous_close > 0.0 {
            self.previous_close
        } else if self.open > 0.0 {
            self.open
        } else {
            self.ticks.first().map(|t| t.price).unwrap_or(0.0)
        }
    }
}
