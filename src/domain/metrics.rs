//! End-of-run summaries for terminal output.

use std::fmt;

use crate::domain::portfolio::Portfolio;

/// Historical run rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSummary {
    pub initial_capital: f64,
    pub final_net_worth: f64,
    pub total_trades: usize,
    pub buy_count: usize,
    pub sell_count: usize,
    pub total_return_pct: f64,
}

impl BacktestSummary {
    pub fn from_portfolio(portfolio: &Portfolio, buy_count: usize, sell_count: usize) -> Self {
        let final_net_worth = portfolio.get_final_net_worth();
        let total_return_pct = if portfolio.initial_capital > 0.0 {
            (final_net_worth - portfolio.initial_capital) / portfolio.initial_capital * 100.0
        } else {
            0.0
        };
        BacktestSummary {
            initial_capital: portfolio.initial_capital,
            final_net_worth,
            total_trades: portfolio.trade_log.len(),
            buy_count,
            sell_count,
            total_return_pct,
        }
    }
}

impl fmt::Display for BacktestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========== Backtest Summary ==========")?;
        writeln!(f, "Initial capital:   {:>14.2}", self.initial_capital)?;
        writeln!(f, "Final net worth:   {:>14.2}", self.final_net_worth)?;
        writeln!(f, "Total return:      {:>13.2}%", self.total_return_pct)?;
        writeln!(f, "Trades executed:   {:>14}", self.total_trades)?;
        writeln!(f, "  buys:            {:>14}", self.buy_count)?;
        writeln!(f, "  sells:           {:>14}", self.sell_count)?;
        write!(f, "======================================")
    }
}

/// Live session rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub initial_capital: f64,
    pub cash_balance: f64,
    pub unrealized_pnl: f64,
    pub final_pnl: f64,
    pub final_portfolio_value: f64,
    pub position_count: usize,
}

impl fmt::Display for PortfolioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========== Session Summary ===========")?;
        writeln!(f, "Initial capital:   {:>14.2}", self.initial_capital)?;
        writeln!(f, "Cash balance:      {:>14.2}", self.cash_balance)?;
        writeln!(f, "Unrealized PnL:    {:>14.2}", self.unrealized_pnl)?;
        writeln!(f, "Total PnL:         {:>14.2}", self.final_pnl)?;
        writeln!(f, "Portfolio value:   {:>14.2}", self.final_portfolio_value)?;
        writeln!(f, "Open positions:    {:>14}", self.position_count)?;
        write!(f, "======================================")
    }
}
