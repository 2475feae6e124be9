//! Historical simulation over daily bars.
//!
//! Each symbol runs against its own sub-portfolio sized by the allocation
//! plan; the sub-results are folded into one combined portfolio at the end
//! so capital is conserved whatever happens to individual symbols.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::allocation::AllocationPlan;
use crate::domain::bar::PriceBar;
use crate::domain::portfolio::Portfolio;
use crate::domain::risk::{RiskExit, RiskManager};
use crate::domain::signal::SignalDecision;
use crate::domain::strategy::Strategy;
use crate::domain::trade::TradeAction;
use crate::ports::data_port::DataPort;

/// Observations accumulated before the strategy is consulted.
pub const SIGNAL_WARMUP: usize = 50;
/// Fraction of current cash committed per entry.
pub const POSITION_FRACTION: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
}

/// Per-symbol outcome of a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub symbol: String,
    pub final_net_worth: f64,
    pub buy_count: usize,
    pub sell_count: usize,
    pub total_trades: usize,
}

/// Combined outcome across all symbols in the allocation plan.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRunResult {
    pub portfolio: Portfolio,
    pub per_symbol: Vec<RunResult>,
    pub buy_count: usize,
    pub sell_count: usize,
}

/// Drive one symbol's bars through risk checks and the strategy, mutating
/// `portfolio` in place. A fired risk exit closes the full position and
/// ends that bar; the strategy never sees it.
pub fn run_symbol(
    bars: &[PriceBar],
    symbol: &str,
    strategy: &Strategy,
    risk: &RiskManager,
    portfolio: &mut Portfolio,
) -> RunResult {
    let symbol = symbol.to_uppercase();
    let mut window: Vec<f64> = Vec::with_capacity(bars.len());

    for bar in bars {
        let price = bar.close;
        window.push(price);

        if let Some(entry) = portfolio.entry_price(&symbol) {
            let side = portfolio.side(&symbol);
            if let Some(exit) = risk.evaluate(side, entry, price) {
                let qty = portfolio.quantity(&symbol).abs();
                match exit {
                    RiskExit::TakeProfit => {
                        info!(symbol = %symbol, date = %bar.date, price, "take profit hit")
                    }
                    RiskExit::StopLoss => {
                        info!(symbol = %symbol, date = %bar.date, price, "stop loss hit")
                    }
                }
                if portfolio.quantity(&symbol) > 0 {
                    portfolio.sell(&symbol, price, qty);
                } else {
                    portfolio.buy(&symbol, price, qty);
                }
                continue;
            }
        }

        if window.len() < SIGNAL_WARMUP {
            continue;
        }

        let tail_start = window.len().saturating_sub(SIGNAL_WARMUP);
        let decision = strategy.decide(&window[tail_start..], portfolio.side(&symbol));

        match decision {
            SignalDecision::Buy => {
                if portfolio.quantity(&symbol) < 0 {
                    let cover = portfolio.quantity(&symbol).abs();
                    portfolio.buy(&symbol, price, cover);
                }
                let qty = (portfolio.cash * POSITION_FRACTION / price).floor() as i64;
                if qty > 0 {
                    portfolio.buy(&symbol, price, qty);
                }
            }
            SignalDecision::Sell => {
                let held = portfolio.quantity(&symbol);
                if held > 0 {
                    portfolio.sell(&symbol, price, held);
                } else if held == 0 {
                    let qty = (portfolio.cash * POSITION_FRACTION / price).floor() as i64;
                    if qty > 0 {
                        portfolio.sell(&symbol, price, qty);
                    }
                }
            }
            SignalDecision::None => {}
        }

        let prices = std::collections::HashMap::from([(symbol.clone(), price)]);
        portfolio.update_net_worth(&prices);
    }

    RunResult {
        final_net_worth: portfolio.get_final_net_worth(),
        buy_count: portfolio.count_action(TradeAction::Buy),
        sell_count: portfolio.count_action(TradeAction::Sell),
        total_trades: portfolio.trade_log.len(),
        symbol,
    }
}

/// Run every symbol in the plan against its capital slice and fold the
/// sub-portfolios into one. A symbol whose data fetch fails is skipped
/// with a warning; its untouched slice still flows into the combined cash.
pub fn run_multi(
    data: &dyn DataPort,
    plan: &AllocationPlan,
    strategy: &Strategy,
    risk: &RiskManager,
    config: &BacktestConfig,
) -> MultiRunResult {
    let mut combined = Portfolio::new(config.initial_capital);
    combined.cash = 0.0;
    let mut per_symbol = Vec::with_capacity(plan.entries().len());

    for (symbol, capital) in plan.split(config.initial_capital) {
        let mut sub = Portfolio::new(capital);

        match data.fetch_bars(&symbol, config.start_date, config.end_date) {
            Ok(bars) if bars.is_empty() => {
                warn!(symbol = %symbol, "no bars in range; skipping symbol");
            }
            Ok(bars) => {
                info!(symbol = %symbol, bars = bars.len(), capital, "running backtest");
                let result = run_symbol(&bars, &symbol, strategy, risk, &mut sub);
                per_symbol.push(result);
            }
            Err(err) => {
                warn!(symbol = %symbol, error = %err, "data fetch failed; skipping symbol");
            }
        }

        combined.absorb(sub);
    }

    let buy_count = combined.count_action(TradeAction::Buy);
    let sell_count = combined.count_action(TradeAction::Sell);

    MultiRunResult {
        portfolio: combined,
        per_symbol,
        buy_count,
        sell_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::TradesimError;
    use crate::domain::strategy::BollingerStrategy;

    struct FixedBars {
        bars: std::collections::HashMap<String, Vec<PriceBar>>,
    }

    impl DataPort for FixedBars {
        fn fetch_bars(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceBar>, TradesimError> {
            self.bars
                .get(symbol)
                .cloned()
                .ok_or_else(|| TradesimError::NoData {
                    symbol: symbol.to_string(),
                })
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(day as u64 - 1))
            .unwrap()
    }

    fn bars_from_closes(symbol: &str, closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar::from_close(symbol, date(i as u32 + 1), close))
            .collect()
    }

    fn strategy() -> Strategy {
        Strategy::Bollinger(BollingerStrategy::default())
    }

    fn config() -> BacktestConfig {
        BacktestConfig {
            start_date: date(1),
            end_date: date(200),
            initial_capital: 1_000_000.0,
        }
    }

    /// 49 flat warmup bars, then a crash bar that triggers a buy.
    fn crash_closes() -> Vec<f64> {
        let mut closes = vec![100.0; 49];
        closes.push(80.0);
        closes
    }

    #[test]
    fn no_trades_below_warmup() {
        let bars = bars_from_closes("BTC", &vec![100.0; 49]);
        let mut portfolio = Portfolio::new(100_000.0);
        let result = run_symbol(&bars, "BTC", &strategy(), &RiskManager::default(), &mut portfolio);

        assert_eq!(result.total_trades, 0);
        assert!(portfolio.net_worth_history.is_empty());
    }

    #[test]
    fn crash_bar_at_warmup_triggers_buy() {
        let bars = bars_from_closes("BTC", &crash_closes());
        let mut portfolio = Portfolio::new(100_000.0);
        let result = run_symbol(&bars, "BTC", &strategy(), &RiskManager::default(), &mut portfolio);

        assert_eq!(result.buy_count, 1);
        // 10% of 100_000 at 80 = 125 units.
        assert_eq!(portfolio.quantity("BTC"), 125);
        assert_eq!(portfolio.entry_price("BTC"), Some(80.0));
    }

    #[test]
    fn stop_loss_closes_position_and_skips_strategy() {
        // Crash bar opens a long at 80, then a second crash to 70 breaches
        // the 7% stop (-12.5%) and liquidates.
        let mut closes = crash_closes();
        closes.push(70.0);
        let bars = bars_from_closes("BTC", &closes);
        let mut portfolio = Portfolio::new(100_000.0);
        run_symbol(&bars, "BTC", &strategy(), &RiskManager::default(), &mut portfolio);

        assert_eq!(portfolio.quantity("BTC"), 0);
        assert_eq!(portfolio.side("BTC"), crate::domain::position::Side::Flat);
        assert_eq!(portfolio.count_action(TradeAction::Sell), 1);
        // The risk bar skips the net-worth snapshot: only the entry bar
        // recorded one.
        assert_eq!(portfolio.net_worth_history.len(), 1);
    }

    #[test]
    fn take_profit_closes_position() {
        // Long at 80, then a jump to 100 is +25%, above the 20% target.
        let mut closes = crash_closes();
        closes.push(100.0);
        let bars = bars_from_closes("BTC", &closes);
        let mut portfolio = Portfolio::new(100_000.0);
        run_symbol(&bars, "BTC", &strategy(), &RiskManager::default(), &mut portfolio);

        assert_eq!(portfolio.quantity("BTC"), 0);
        // Bought 125 at 80, sold 125 at 100: +2500 on the round trip.
        assert!((portfolio.cash - 102_500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn symbol_is_uppercased() {
        let bars = bars_from_closes("BTC", &crash_closes());
        let mut portfolio = Portfolio::new(100_000.0);
        run_symbol(&bars, "btc", &strategy(), &RiskManager::default(), &mut portfolio);

        assert_eq!(portfolio.quantity("BTC"), 125);
        assert_eq!(portfolio.quantity("btc"), 0);
    }

    #[test]
    fn multi_run_conserves_capital_on_flat_data() {
        let data = FixedBars {
            bars: std::collections::HashMap::from([
                ("BTC".to_string(), bars_from_closes("BTC", &vec![100.0; 60])),
                ("ETH".to_string(), bars_from_closes("ETH", &vec![50.0; 60])),
            ]),
        };
        let plan =
            AllocationPlan::new(vec!["BTC".into(), "ETH".into()], vec![60.0, 40.0]).unwrap();
        let result = run_multi(&data, &plan, &strategy(), &RiskManager::default(), &config());

        // Flat prices produce no signals: all capital survives as cash.
        assert!((result.portfolio.cash - 1_000_000.0).abs() < 1e-6);
        assert_eq!(result.buy_count, 0);
        assert_eq!(result.sell_count, 0);
        assert_eq!(result.per_symbol.len(), 2);
    }

    #[test]
    fn failed_symbol_is_skipped_but_slice_survives() {
        let data = FixedBars {
            bars: std::collections::HashMap::from([(
                "BTC".to_string(),
                bars_from_closes("BTC", &vec![100.0; 60]),
            )]),
        };
        let plan =
            AllocationPlan::new(vec!["BTC".into(), "ETH".into()], vec![50.0, 50.0]).unwrap();
        let result = run_multi(&data, &plan, &strategy(), &RiskManager::default(), &config());

        assert_eq!(result.per_symbol.len(), 1);
        assert_eq!(result.per_symbol[0].symbol, "BTC");
        // ETH's untouched 500k slice still lands in the combined cash.
        assert!((result.portfolio.cash - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn multi_run_is_deterministic() {
        let mut closes: Vec<f64> = (0..80).map(|i| 100.0 + (i % 13) as f64 * 1.5).collect();
        closes.push(60.0);
        let data = FixedBars {
            bars: std::collections::HashMap::from([(
                "BTC".to_string(),
                bars_from_closes("BTC", &closes),
            )]),
        };
        let plan = AllocationPlan::new(vec!["BTC".into()], vec![100.0]).unwrap();

        let first = run_multi(&data, &plan, &strategy(), &RiskManager::default(), &config());
        let second = run_multi(&data, &plan, &strategy(), &RiskManager::default(), &config());

        assert_eq!(first.portfolio.trade_log, second.portfolio.trade_log);
        assert_eq!(
            first.portfolio.net_worth_history,
            second.portfolio.net_worth_history
        );
    }
}
