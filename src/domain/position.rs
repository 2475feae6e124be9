//! Position tracking.
//!
//! Side, quantity and entry price live in one record so they cannot drift
//! apart. Invariant: `side == Flat` iff `quantity == 0` iff `entry_price`
//! is `None`; positive quantity is long, negative is short. Only
//! [`Portfolio`](super::portfolio::Portfolio) operations mutate positions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Flat,
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub entry_price: Option<f64>,
}

impl Position {
    pub fn flat(symbol: &str) -> Self {
        Position {
            symbol: symbol.to_string(),
            side: Side::Flat,
            quantity: 0,
            entry_price: None,
        }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    /// Signed mark-to-market value: negative for shorts.
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }
}
