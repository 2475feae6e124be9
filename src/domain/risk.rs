//! Take-profit / stop-loss enforcement.
//!
//! Evaluated before any strategy signal for the bar or tick; when a
//! threshold fires the full position is closed and the strategy never sees
//! that observation.

use super::position::Side;

/// Why the risk check forced an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskExit {
    TakeProfit,
    StopLoss,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskManager {
    /// Percent move from entry that locks in profit.
    pub take_profit_pct: f64,
    /// Percent adverse move from entry that cuts the position.
    pub stop_loss_pct: f64,
}

impl Default for RiskManager {
    fn default() -> Self {
        RiskManager {
            take_profit_pct: 20.0,
            stop_loss_pct: 7.0,
        }
    }
}

impl RiskManager {
    /// Pure threshold check. Long pct = (price - entry) / entry × 100; short
    /// is mirrored so a falling price is profit.
    pub fn evaluate(&self, side: Side, entry_price: f64, price: f64) -> Option<RiskExit> {
        if entry_price <= 0.0 {
            return None;
        }
        let change_pct = match side {
            Side::Long => (price - entry_price) / entry_price * 100.0,
            Side::Short => (entry_price - price) / entry_price * 100.0,
            Side::Flat => return None,
        };
        if change_pct >= self.take_profit_pct {
            Some(RiskExit::TakeProfit)
        } else if change_pct <= -self.stop_loss_pct {
            Some(RiskExit::StopLoss)
        } else {
            None
        }
    }
}
