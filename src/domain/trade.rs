//! Trade log records.

use std::fmt;

/// Trade actions as they appear in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
    Short,
    BuyToCover,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::Short => write!(f, "SHORT"),
            TradeAction::BuyToCover => write!(f, "BUY_TO_COVER"),
        }
    }
}

impl TradeAction {
    /// True for actions that open or extend a position.
    pub fn is_opening(&self) -> bool {
        matches!(self, TradeAction::Buy | TradeAction::Short)
    }

    /// The opening action a closing action settles against.
    pub fn matching_open(&self) -> Option<TradeAction> {
        match self {
            TradeAction::Sell => Some(TradeAction::Buy),
            TradeAction::BuyToCover => Some(TradeAction::Short),
            _ => None,
        }
    }
}

/// Append-only audit record; insertion order is the total order.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    pub action: TradeAction,
    pub price: f64,
    pub quantity: i64,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_display_forms() {
        assert_eq!(TradeAction::Buy.to_string(), "BUY");
        assert_eq!(TradeAction::Sell.to_string(), "SELL");
        assert_eq!(TradeAction::Short.to_string(), "SHORT");
        assert_eq!(TradeAction::BuyToCover.to_string(), "BUY_TO_COVER");
    }

    #[test]
    fn matching_open_pairs() {
        assert_eq!(TradeAction::Sell.matching_open(), Some(TradeAction::Buy));
        assert_eq!(
            TradeAction::BuyToCover.matching_open(),
            Some(TradeAction::Short)
        );
        assert_eq!(TradeAction::Buy.matching_open(), None);
        assert_eq!(TradeAction::Short.matching_open(), None);
    }

    #[test]
    fn opening_actions() {
        assert!(TradeAction::Buy.is_opening());
        assert!(TradeAction::Short.is_opening());
        assert!(!TradeAction::Sell.is_opening());
        assert!(!TradeAction::BuyToCover.is_opening());
    }
}
