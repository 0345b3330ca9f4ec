use serde::{Deserialize, Serialize};

use crate::models::chart::{Crosshair, PlotRect, Tone};
use crate::models::intraday::IntradaySeries;

/// Share of the observed range added above and below the data.
const RANGE_MARGIN: f64 = 0.15;

/// Margin used when every price is equal, relative to the price level.
const FLAT_MARGIN_PCT: f64 = 0.01;

/// Absolute lower bound of the flat-range margin.
const MIN_FLAT_MARGIN: f64 = 0.01;

/// Vertical price range of an intraday plot, margins included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceScale {
    pub min: f64,
    pub max: f64,
}

impl PriceScale {
    /// Observed range over the ticks and the previous close (when known),
    /// widened by 15% of the range on each side.
    ///
    /// A flat series gets `max(|mid| × 1%, 0.01)` instead so the line
    /// is drawn in the middle of the plot. Returns `None` for an empty series.
    #[must_use]
    pub fn from_series(series: &IntradaySeries) -> Option<Self> {
        let mut prices = series
            .ticks()
            .iter()
            .map(|t| t.price)
            .filter(|p| p.is_finite())
            .peekable();
        prices.peek()?;

        let (mut low, mut high) = prices.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p), hi.max(p))
        });
        if series.previous_close.is_finite() && series.previous_close > 0.0 {
            low = low.min(series.previous_close);
            high = high.max(series.previous_close);
        }

        let range = high - low;
        let margin = if range > 0.0 {
            range * RANGE_MARGIN
        } else {
            (((low + high) / 2.0).abs() * FLAT_MARGIN_PCT).max(MIN_FLAT_MARGIN)
        };

        Some(Self {
            min: low - margin,
            max: high + margin,
        })
    }

    #[must_use]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Pixel y of `price`; `max` maps to the top edge, `min` to the bottom.
    #[must_use]
    pub fn y_for(&self, price: f64, rect: &PlotRect) -> f64 {
        let norm = (price - self.min) / self.range().max(1e-9);
        rect.top + rect.height - norm * rect.height
    }
}

/// Pixel x of sample `index` out of `count`, spread evenly over the plot.
/// A single sample sits in the centre.
#[must_use]
pub fn x_for_index(index: usize, count: usize, rect: &PlotRect) -> f64 {
    if count <= 1 {
        return rect.left + rect.width / 2.0;
    }
    rect.left + index as f64 / (count - 1) as f64 * rect.width
}

/// Maps pointer positions over an intraday chart to the nearest sample.
pub struct CrosshairService;

impl CrosshairService {
    pub fn new() -> Self {
        Self
    }

    /// Nearest sample under `pointer_x`.
    ///
    /// `None` when the series is empty or the pointer is outside
    /// `[left, left + width]`. The vertical line tracks the pointer while
    /// the horizontal line and the marker snap to the sample.
    pub fn hit_test(
        &self,
        series: &IntradaySeries,
        rect: &PlotRect,
        pointer_x: f64,
    ) -> Option<Crosshair> {
        if series.is_empty() || !pointer_x.is_finite() || !rect.contains_x(pointer_x) {
            return None;
        }
        let index = Self::index_at(series.len(), rect, pointer_x);
        let tick = series.get(index)?.clone();
        let scale = PriceScale::from_series(series)?;

        let marker_x = x_for_index(index, series.len(), rect);
        let marker_y = scale.y_for(tick.price, rect);

        let reference = series.reference_price();
        let change_pct = if reference > 0.0 {
            (tick.price - reference) / reference * 100.0
        } else {
            0.0
        };

        Some(Crosshair {
            index,
            vertical_x: pointer_x,
            horizontal_y: marker_y,
            marker_x,
            marker_y,
            change_pct,
            tone: Tone::of(change_pct),
            tick,
        })
    }

    /// `round(ratio × (n − 1))`, clamped to the valid range.
    fn index_at(count: usize, rect: &PlotRect, pointer_x: f64) -> usize {
        if count <= 1 || rect.width <= 0.0 {
            return 0;
        }
        let ratio = ((pointer_x - rect.left) / rect.width).clamp(0.0, 1.0);
        let index = (ratio * (count - 1) as f64).round() as usize;
        index.min(count - 1)
    }
}

impl Default for CrosshairService {
    fn default() -> Self {
        Self::new()
    }
}
