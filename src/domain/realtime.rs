//! Live tick processing.
//!
//! Ticks arrive on an mpsc channel and are consumed by a single worker
//! thread that owns all mutation of the shared [`RunnerState`]. Readers
//! take the mutex briefly to snapshot logs, positions, or the PnL
//! timeline while the session runs.

use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::backtest::POSITION_FRACTION;
use crate::domain::metrics::PortfolioSummary;
use crate::domain::portfolio::Portfolio;
use crate::domain::risk::{RiskExit, RiskManager};
use crate::domain::signal::SignalDecision;
use crate::domain::strategy::Strategy;

/// Price observations retained per symbol.
const MAX_WINDOW: usize = 1_000;

/// One price observation from a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveConfig {
    pub initial_capital: f64,
    /// Wall-clock session length; ticks after this are ignored.
    pub runtime: Duration,
    /// Minimum interval between repeated identical decisions.
    pub cooldown: Duration,
    /// Price move that bypasses the cooldown.
    pub min_price_change: f64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig {
            initial_capital: 100_000.0,
            runtime: Duration::from_secs(60),
            cooldown: Duration::from_secs(1),
            min_price_change: 0.05,
        }
    }
}

/// Portfolio value sampled after a processed tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PnlPoint {
    pub timestamp: DateTime<Utc>,
    pub portfolio_value: f64,
}

/// Audit record of one acted-upon tick.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub price: f64,
    pub decision: SignalDecision,
}

#[derive(Debug, Clone, Copy)]
struct Debounce {
    last_decision: SignalDecision,
    last_price: f64,
    last_time: Instant,
}

/// All mutable session state. Owned by the consumer thread; external
/// readers go through the runner's snapshot methods.
#[derive(Debug)]
pub struct RunnerState {
    config: LiveConfig,
    strategy: Strategy,
    risk: RiskManager,
    pub portfolio: Portfolio,
    windows: HashMap<String, Vec<f64>>,
    debounce: HashMap<String, Debounce>,
    logs: Vec<LogEntry>,
    pnl_timeline: Vec<PnlPoint>,
    started: Instant,
    active: bool,
}

impl RunnerState {
    pub fn new(config: LiveConfig, strategy: Strategy, risk: RiskManager) -> Self {
        RunnerState {
            portfolio: Portfolio::new(config.initial_capital),
            config,
            strategy,
            risk,
            windows: HashMap::new(),
            debounce: HashMap::new(),
            logs: Vec::new(),
            pnl_timeline: Vec::new(),
            started: Instant::now(),
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn pnl_timeline(&self) -> &[PnlPoint] {
        &self.pnl_timeline
    }

    pub fn price_history(&self, symbol: &str) -> Option<&[f64]> {
        self.windows.get(symbol).map(|w| w.as_slice())
    }

    /// Process one tick end to end: window update, risk check, signal,
    /// debounce, execution, PnL sample. Returns whether the session is
    /// still active afterwards.
    pub fn handle_tick(&mut self, tick: &Tick) -> bool {
        if self.started.elapsed() >= self.config.runtime {
            if self.active {
                info!("session runtime elapsed, going inactive");
                self.active = false;
            }
            return false;
        }
        if !self.active {
            return false;
        }

        let symbol = tick.symbol.to_uppercase();
        let price = tick.price;
        if price <= 0.0 {
            warn!(symbol = %symbol, price, "non-positive price dropped");
            return true;
        }

        let window = self.windows.entry(symbol.clone()).or_default();
        window.push(price);
        if window.len() > MAX_WINDOW {
            window.remove(0);
        }

        // Risk exits bypass the debounce entirely.
        if let Some(entry) = self.portfolio.entry_price(&symbol) {
            let side = self.portfolio.side(&symbol);
            if let Some(exit) = self.risk.evaluate(side, entry, price) {
                let qty = self.portfolio.quantity(&symbol).abs();
                match exit {
                    RiskExit::TakeProfit => info!(symbol = %symbol, price, "take profit hit"),
                    RiskExit::StopLoss => info!(symbol = %symbol, price, "stop loss hit"),
                }
                if self.portfolio.quantity(&symbol) > 0 {
                    self.portfolio.sell(&symbol, price, qty);
                } else {
                    self.portfolio.buy(&symbol, price, qty);
                }
                self.sample_pnl();
                return true;
            }
        }

        let side = self.portfolio.side(&symbol);
        let decision = {
            let window = &self.windows[&symbol];
            self.strategy.decide(window, side)
        };

        if decision != SignalDecision::None && self.should_act(&symbol, decision, price) {
            self.execute(&symbol, decision, price);
            self.logs.push(LogEntry {
                timestamp: Utc::now(),
                symbol: symbol.clone(),
                price,
                decision,
            });
            self.debounce.insert(
                symbol.clone(),
                Debounce {
                    last_decision: decision,
                    last_price: price,
                    last_time: Instant::now(),
                },
            );
        } else {
            debug!(symbol = %symbol, price, %decision, "tick held");
        }

        self.sample_pnl();
        true
    }

    /// A repeat decision is acted on only after the cooldown, unless the
    /// price moved by at least `min_price_change` since the last action.
    fn should_act(&self, symbol: &str, decision: SignalDecision, price: f64) -> bool {
        match self.debounce.get(symbol) {
            None => true,
            Some(prev) => {
                decision != prev.last_decision
                    || (price - prev.last_price).abs() >= self.config.min_price_change
                    || prev.last_time.elapsed() >= self.config.cooldown
            }
        }
    }

    fn execute(&mut self, symbol: &str, decision: SignalDecision, price: f64) {
        match decision {
            SignalDecision::Buy => {
                if self.portfolio.quantity(symbol) < 0 {
                    let cover = self.portfolio.quantity(symbol).abs();
                    self.portfolio.buy(symbol, price, cover);
                }
                let qty = (self.portfolio.cash * POSITION_FRACTION / price).floor() as i64;
                if qty > 0 {
                    self.portfolio.buy(symbol, price, qty);
                }
            }
            SignalDecision::Sell => {
                let held = self.portfolio.quantity(symbol);
                if held > 0 {
                    self.portfolio.sell(symbol, price, held);
                } else {
                    let qty = (self.portfolio.cash * POSITION_FRACTION / price).floor() as i64;
                    if qty > 0 {
                        self.portfolio.short(symbol, price, qty);
                    }
                }
            }
            SignalDecision::None => {}
        }
    }

    fn sample_pnl(&mut self) {
        let prices: HashMap<String, f64> = self
            .windows
            .iter()
            .filter_map(|(symbol, window)| window.last().map(|&p| (symbol.clone(), p)))
            .collect();
        self.portfolio.update_net_worth(&prices);
        self.pnl_timeline.push(PnlPoint {
            timestamp: Utc::now(),
            portfolio_value: self.portfolio.get_final_net_worth(),
        });
    }

    /// End-of-session rollup against the latest observed prices.
    pub fn summary(&self) -> PortfolioSummary {
        let prices: HashMap<String, f64> = self
            .windows
            .iter()
            .filter_map(|(symbol, window)| window.last().map(|&p| (symbol.clone(), p)))
            .collect();
        let pnl = self.portfolio.calculate_pnl(&prices);
        PortfolioSummary {
            initial_capital: self.portfolio.initial_capital,
            cash_balance: self.portfolio.cash,
            unrealized_pnl: pnl.unrealized_pnl,
            final_pnl: pnl.total_pnl,
            final_portfolio_value: self.portfolio.get_final_net_worth(),
            position_count: self.portfolio.open_position_count(),
        }
    }
}

/// Channel-fed session driver. Producers clone [`RealTimeRunner::sender`]
/// and push [`Tick`]s; one consumer thread applies them in arrival order.
pub struct RealTimeRunner {
    state: Arc<Mutex<RunnerState>>,
    sender: Sender<Tick>,
    consumer: JoinHandle<()>,
}

fn lock_state(state: &Arc<Mutex<RunnerState>>) -> std::sync::MutexGuard<'_, RunnerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RealTimeRunner {
    pub fn spawn(config: LiveConfig, strategy: Strategy, risk: RiskManager) -> Self {
        let state = Arc::new(Mutex::new(RunnerState::new(config, strategy, risk)));
        let (sender, receiver) = mpsc::channel::<Tick>();

        let consumer_state = Arc::clone(&state);
        let consumer = std::thread::spawn(move || {
            // Periodic wakeup so the session deadline is enforced even when
            // producers go quiet.
            loop {
                match receiver.recv_timeout(Duration::from_millis(250)) {
                    Ok(tick) => {
                        if !lock_state(&consumer_state).handle_tick(&tick) {
                            break;
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let mut guard = lock_state(&consumer_state);
                        if guard.started.elapsed() >= guard.config.runtime {
                            guard.active = false;
                            break;
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        RealTimeRunner {
            state,
            sender,
            consumer,
        }
    }

    /// Clone handle for feed producers.
    pub fn sender(&self) -> Sender<Tick> {
        self.sender.clone()
    }

    pub fn is_running(&self) -> bool {
        lock_state(&self.state).is_active()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        lock_state(&self.state).logs().to_vec()
    }

    pub fn pnl_timeline(&self) -> Vec<PnlPoint> {
        lock_state(&self.state).pnl_timeline().to_vec()
    }

    pub fn price_history(&self, symbol: &str) -> Vec<f64> {
        lock_state(&self.state)
            .price_history(symbol)
            .map(|w| w.to_vec())
            .unwrap_or_default()
    }

    pub fn positions(&self) -> Vec<crate::domain::position::Position> {
        lock_state(&self.state)
            .portfolio
            .positions
            .values()
            .cloned()
            .collect()
    }

    /// Drop the producer side, drain the consumer, and report the final
    /// state. Consumes the runner.
    pub fn shutdown(self) -> PortfolioSummary {
        let RealTimeRunner {
            state,
            sender,
            consumer,
        } = self;
        drop(sender);
        if consumer.join().is_err() {
            warn!("consumer thread panicked during shutdown");
        }
        lock_state(&state).summary()
    }
}
