//! Strategy trade decisions.

use std::fmt;

/// Per-bar decision from a strategy. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDecision {
    Buy,
    Sell,
    None,
}

impl fmt::Display for SignalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDecision::Buy => write!(f, "buy"),
            SignalDecision::Sell => write!(f, "sell"),
            SignalDecision::None => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(SignalDecision::Buy.to_string(), "buy");
        assert_eq!(SignalDecision::Sell.to_string(), "sell");
        assert_eq!(SignalDecision::None.to_string(), "none");
    }
}
