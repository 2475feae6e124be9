//! Portfolio state machine: cash, positions, trade log, net-worth history.
//!
//! All trading state transitions go through `buy`/`sell`/`short`, which keep
//! the side/quantity/entry-price invariant of [`Position`] intact and append
//! to the audit trail. Rejected or clamped requests emit warnings and never
//! corrupt state.

use std::collections::HashMap;

use tracing::warn;

use super::position::{Position, Side};
use super::trade::{TradeAction, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub initial_capital: f64,
    pub cash: f64,
    pub positions: HashMap<String, Position>,
    pub trade_log: Vec<TradeRecord>,
    pub net_worth_history: Vec<f64>,
}

/// Realized/unrealized split from [`Portfolio::calculate_pnl`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnlBreakdown {
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            initial_capital,
            cash: initial_capital,
            positions: HashMap::new(),
            trade_log: Vec::new(),
            net_worth_history: Vec::new(),
        }
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn side(&self, symbol: &str) -> Side {
        self.positions.get(symbol).map_or(Side::Flat, |p| p.side)
    }

    pub fn quantity(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).map_or(0, |p| p.quantity)
    }

    pub fn entry_price(&self, symbol: &str) -> Option<f64> {
        self.positions.get(symbol).and_then(|p| p.entry_price)
    }

    /// Open (non-flat) positions.
    pub fn open_position_count(&self) -> usize {
        self.positions.values().filter(|p| !p.is_flat()).count()
    }

    pub fn count_action(&self, action: TradeAction) -> usize {
        self.trade_log.iter().filter(|t| t.action == action).count()
    }

    /// Buy `qty` at `price`. Covers first when the symbol is short (capped at
    /// the short quantity, cash moves only by the covered notional); otherwise
    /// opens or extends a long. Rejected without state change when cash is
    /// insufficient for the full request.
    pub fn buy(&mut self, symbol: &str, price: f64, qty: i64) {
        let cost = price * qty as f64;
        if self.cash < cost {
            warn!(
                symbol,
                qty,
                price,
                available = self.cash,
                "not enough cash to buy"
            );
            return;
        }

        let position = self
            .positions
            .entry(symbol.to_string())
            .or_insert_with(|| Position::flat(symbol));

        if position.quantity < 0 {
            let covered = qty.min(-position.quantity);
            self.cash -= price * covered as f64;
            position.quantity += covered;
            if position.quantity == 0 {
                position.side = Side::Flat;
                position.entry_price = None;
            }
            self.trade_log.push(TradeRecord {
                symbol: symbol.to_string(),
                action: TradeAction::BuyToCover,
                price,
                quantity: covered,
                note: Some("short position".into()),
            });
        } else {
            self.cash -= cost;
            position.quantity += qty;
            position.side = Side::Long;
            position.entry_price = Some(price);
            self.trade_log.push(TradeRecord {
                symbol: symbol.to_string(),
                action: TradeAction::Buy,
                price,
                quantity: qty,
                note: None,
            });
        }
    }

    /// Sell `qty` at `price`. Long positions are reduced (clamped to the held
    /// quantity with a warning); a flat symbol opens a short. Selling an
    /// already-short symbol is a warned no-op: further shorting must go
    /// through [`Portfolio::short`].
    pub fn sell(&mut self, symbol: &str, price: f64, qty: i64) {
        let position = self
            .positions
            .entry(symbol.to_string())
            .or_insert_with(|| Position::flat(symbol));

        if position.quantity > 0 {
            let executed = if qty > position.quantity {
                warn!(
                    symbol,
                    requested = qty,
                    held = position.quantity,
                    "partial sell: selling all held"
                );
                position.quantity
            } else {
                qty
            };
            self.cash += price * executed as f64;
            position.quantity -= executed;
            if position.quantity == 0 {
                position.side = Side::Flat;
                position.entry_price = None;
            }
            self.trade_log.push(TradeRecord {
                symbol: symbol.to_string(),
                action: TradeAction::Sell,
                price,
                quantity: executed,
                note: Some("long position".into()),
            });
        } else if position.quantity == 0 {
            // Explicit short open: borrow and sell, cash increases.
            self.cash += price * qty as f64;
            position.quantity = -qty;
            position.side = Side::Short;
            position.entry_price = Some(price);
            self.trade_log.push(TradeRecord {
                symbol: symbol.to_string(),
                action: TradeAction::Short,
                price,
                quantity: qty,
                note: None,
            });
        } else {
            warn!(symbol, "sell requested on an already-short symbol; ignored");
        }
    }

    /// Unconditionally increase the short side. Only the live runner opens
    /// shorts this way; the historical path shorts through [`Portfolio::sell`].
    pub fn short(&mut self, symbol: &str, price: f64, qty: i64) {
        let position = self
            .positions
            .entry(symbol.to_string())
            .or_insert_with(|| Position::flat(symbol));

        self.cash += price * qty as f64;
        position.quantity -= qty;
        position.side = Side::Short;
        position.entry_price = Some(price);
        self.trade_log.push(TradeRecord {
            symbol: symbol.to_string(),
            action: TradeAction::Short,
            price,
            quantity: qty,
            note: None,
        });
    }

    /// Snapshot `cash + Σ quantity × price`. Symbols missing from `prices`
    /// contribute 0 for this snapshot.
    pub fn update_net_worth(&mut self, prices: &HashMap<String, f64>) {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| {
                prices
                    .get(&pos.symbol)
                    .map_or(0.0, |&price| pos.market_value(price))
            })
            .sum();
        self.net_worth_history.push(self.cash + position_value);
    }

    /// Last snapshot, or the initial capital before any snapshot exists.
    pub fn get_final_net_worth(&self) -> f64 {
        self.net_worth_history
            .last()
            .copied()
            .unwrap_or(self.initial_capital)
    }

    /// Realized legs settle against the most recent same-symbol opening trade
    /// in the log; unrealized marks open positions against the last opening
    /// fill. No per-lot cost basis is kept, so multiple partial entries at
    /// different prices skew the result.
    pub fn calculate_pnl(&self, current_prices: &HashMap<String, f64>) -> PnlBreakdown {
        let mut realized_pnl = 0.0;
        let mut unrealized_pnl = 0.0;

        for trade in &self.trade_log {
            let Some(open_action) = trade.action.matching_open() else {
                continue;
            };
            let entry = self
                .last_fill(&trade.symbol, open_action)
                .map(|open| open.price);
            if let Some(entry_price) = entry {
                let direction = if trade.action == TradeAction::Sell {
                    1.0
                } else {
                    -1.0
                };
                realized_pnl += direction * trade.quantity as f64 * (trade.price - entry_price);
            }
        }

        for pos in self.positions.values() {
            let Some(&current_price) = current_prices.get(&pos.symbol) else {
                continue;
            };
            if pos.quantity > 0 {
                if let Some(open) = self.last_fill(&pos.symbol, TradeAction::Buy) {
                    unrealized_pnl += pos.quantity as f64 * (current_price - open.price);
                }
            } else if pos.quantity < 0 {
                if let Some(open) = self.last_fill(&pos.symbol, TradeAction::Short) {
                    unrealized_pnl +=
                        pos.quantity.unsigned_abs() as f64 * (open.price - current_price);
                }
            }
        }

        PnlBreakdown {
            realized_pnl,
            unrealized_pnl,
            total_pnl: realized_pnl + unrealized_pnl,
        }
    }

    fn last_fill(&self, symbol: &str, action: TradeAction) -> Option<&TradeRecord> {
        self.trade_log
            .iter()
            .rev()
            .find(|t| t.symbol == symbol && t.action == action)
    }

    /// Fold a sub-portfolio into this one: cash is summed, position maps are
    /// merged by quantity, trade logs concatenated in insertion order.
    pub fn absorb(&mut self, other: Portfolio) {
        self.cash += other.cash;
        for (symbol, pos) in other.positions {
            let merged = self
                .positions
                .entry(symbol.clone())
                .or_insert_with(|| Position::flat(&symbol));
            merged.quantity += pos.quantity;
            merged.side = match merged.quantity {
                q if q > 0 => Side::Long,
                q if q < 0 => Side::Short,
                _ => Side::Flat,
            };
            merged.entry_price = if merged.quantity == 0 {
                None
            } else {
                pos.entry_price.or(merged.entry_price)
            };
        }
        self.trade_log.extend(other.trade_log);
    }
}
