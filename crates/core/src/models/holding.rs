use serde::{Deserialize, Serialize};

/// The kind of a held position. Stocks and funds are stored in separate
/// collections server-side and priced differently (share price vs NAV).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Stock,
    Fund,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Stock => write!(f, "stock"),
            AssetKind::Fund => write!(f, "fund"),
        }
    }
}

/// A single stock or fund position inside a portfolio.
///
/// Only the inputs are stored: quantity, average cost and current price.
/// Everything else (position value, profit/loss, rate) is derived on demand
/// so the numbers can never disagree with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Security code, e.g. "600519" or "000001"
    pub code: String,

    /// Display name
    pub name: String,

    pub kind: AssetKind,

    /// Shares or fund units held
    pub quantity: f64,

    /// Average cost per share / unit
    pub avg_cost: f64,

    /// Latest price or NAV per unit (may be stale or zero)
    pub current_price: f64,

    /// Fund category reported by the backend (funds only)
    #[serde(default)]
    pub fund_type: Option<String>,
}

impl Holding {
    /// Build a holding, coercing non-finite or negative numbers to zero.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        kind: AssetKind,
        quantity: f64,
        avg_cost: f64,
        current_price: f64,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            kind,
            quantity: non_negative(quantity),
            avg_cost: non_negative(avg_cost),
            current_price: non_negative(current_price),
            fund_type: None,
        }
    }

    pub fn stock(
        code: impl Into<String>,
        name: impl Into<String>,
        quantity: f64,
        avg_cost: f64,
        current_price: f64,
    ) -> Self {
        Self::new(code, name, AssetKind::Stock, quantity, avg_cost, current_price)
    }

    pub fn fund(
        code: impl Into<String>,
        name: impl Into<String>,
        quantity: f64,
        avg_cost: f64,
        current_price: f64,
    ) -> Self {
        Self::new(code, name, AssetKind::Fund, quantity, avg_cost, current_price)
    }

    pub fn with_fund_type(mut self, fund_type: impl Into<String>) -> Self {
        self.fund_type = Some(fund_type.into());
        self
    }

    /// quantity × current price
    ///
    /// The stored fields are public and deserializable, so every derived
    /// value re-applies the same coercion as `new`.
    #[must_use]
    pub fn position_value(&self) -> f64 {
        finite_or_zero(non_negative(self.quantity) * non_negative(self.current_price))
    }

    /// quantity × average cost
    #[must_use]
    pub fn cost_amount(&self) -> f64 {
        finite_or_zero(non_negative(self.quantity) * non_negative(self.avg_cost))
    }

    #[must_use]
    pub fn profit_loss(&self) -> f64 {
        self.position_value() - self.cost_amount()
    }

    /// `(current_price − avg_cost) / avg_cost`, or `0` when there is no cost basis.
    ///
    /// Agrees with `profit_loss / cost_amount` whenever `quantity > 0`.
    #[must_use]
    pub fn profit_loss_rate(&self) -> f64 {
        let avg_cost = non_negative(self.avg_cost);
        if avg_cost > 0.0 {
            (non_negative(self.current_price) - avg_cost) / avg_cost
        } else {
            0.0
        }
    }
}

/// Coerce NaN, infinities and negatives to zero.
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Coerce NaN and infinities to zero, keeping the sign.
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
