use serde::{Deserialize, Serialize};

use super::intraday::Tick;

/// Category/value chart data: one x category per index, any number of
/// series aligned to it.
///
/// Produced by the core and rendered as-is by the frontend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySeries {
    pub categories: Vec<String>,

    pub series: Vec<Series>,

    /// Set when any series carries placeholder data
    #[serde(default)]
    pub synthetic: bool,
}

impl CategorySeries {
    /// The well-defined "no data" result.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.series.is_empty()
    }

    #[must_use]
    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }
}

/// How a series should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Line,
    Bar,
    Area,
    Pie,
}

/// Styling hint for a single data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Gain,
    Loss,
    Flat,
    /// No gain/loss meaning (counts, totals)
    Neutral,
}

impl Tone {
    /// Gain for positive, Loss for negative, Flat for zero.
    #[must_use]
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Tone::Gain
        } else if value < 0.0 {
            Tone::Loss
        } else {
            Tone::Flat
        }
    }
}

/// One named series. `values[i]` belongs to `categories[i]`; `None` is a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub kind: SeriesKind,
    pub values: Vec<Option<f64>>,
    /// Same length as `values`
    pub tones: Vec<Tone>,
}

impl Series {
    /// A series without gain/loss styling.
    pub fn neutral(name: impl Into<String>, kind: SeriesKind, values: Vec<f64>) -> Self {
        let tones = vec![Tone::Neutral; values.len()];
        Self {
            name: name.into(),
            kind,
            values: values.into_iter().map(Some).collect(),
            tones,
        }
    }

    /// A series toned by the sign of each value.
    pub fn toned(name: impl Into<String>, kind: SeriesKind, values: Vec<f64>) -> Self {
        let tones = values.iter().map(|v| Tone::of(*v)).collect();
        Self {
            name: name.into(),
            kind,
            values: values.into_iter().map(Some).collect(),
            tones,
        }
    }

    /// A series that may contain gaps.
    pub fn sparse(name: impl Into<String>, kind: SeriesKind, values: Vec<Option<f64>>) -> Self {
        let tones = vec![Tone::Neutral; values.len()];
        Self {
            name: name.into(),
            kind,
            values,
            tones,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One histogram bucket. `[start, end)` except the last bucket, which is `[start, end]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    /// Indices into the input samples
    pub members: Vec<usize>,
    pub label: String,
}

impl HistogramBin {
    #[must_use]
    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// A bubble on the risk/return scatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub name: String,
    /// Heuristic risk score
    pub x: f64,
    /// Return, percent
    pub y: f64,
    /// Bubble diameter hint
    pub size: f64,
    pub tone: Tone,
}

/// The plotting rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Inclusive on both edges.
    #[must_use]
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.left && x <= self.right()
    }
}

/// Crosshair overlay for an intraday chart.
///
/// The vertical line follows the pointer; the horizontal line and the marker
/// sit on the nearest sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crosshair {
    pub index: usize,
    pub tick: Tick,
    /// x of the vertical line (the pointer)
    pub vertical_x: f64,
    /// y of the horizontal line (the sample)
    pub horizontal_y: f64,
    /// Marker position on the sample
    pub marker_x: f64,
    pub marker_y: f64,
    /// Change versus the reference price, percent
    pub change_pct: f64,
    pub tone: Tone,
}
