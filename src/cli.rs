//! CLI definition and dispatch.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::replay_feed::ReplayFeed;
use crate::domain::backtest::run_multi;
use crate::domain::config_validation::{
    load_backtest_settings, load_live_config, validate_strategy_config,
};
use crate::domain::error::TradesimError;
use crate::domain::metrics::BacktestSummary;
use crate::domain::realtime::RealTimeRunner;
use crate::domain::risk::RiskManager;
use crate::domain::strategy::Strategy;
use crate::ports::data_port::DataPort;
use crate::ports::feed_port::PriceFeed;

/// Pacing between replayed ticks in live mode.
const REPLAY_TICK_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Trading strategy simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a historical backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbol override, e.g. BTC,ETH
        #[arg(long)]
        symbols: Option<String>,
        /// Comma-separated allocation override, e.g. 60,40
        #[arg(long)]
        allocations: Option<String>,
    },
    /// Run a live replay session
    Live {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbols,
            allocations,
        } => run_backtest(&config, symbols.as_deref(), allocations.as_deref()),
        Command::Live { config } => run_live(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradesimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_backtest(
    config_path: &PathBuf,
    symbol_override: Option<&str>,
    allocation_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_strategy_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let settings = match load_backtest_settings(&adapter, symbol_override, allocation_override) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let strategy = match Strategy::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Strategy: {}", strategy.name());

    let data_port = CsvAdapter::new(PathBuf::from(&settings.data_dir));
    for (symbol, _) in settings.plan.entries() {
        match data_port.data_range(symbol) {
            Ok(Some((first, last, count))) => {
                eprintln!("{symbol}: {count} bars available, {first} to {last}")
            }
            Ok(None) => eprintln!("{symbol}: no data available"),
            Err(e) => eprintln!("warning: {symbol}: {e}"),
        }
    }
    let risk = RiskManager::default();

    let result = run_multi(&data_port, &settings.plan, &strategy, &risk, &settings.config);

    if result.per_symbol.is_empty() {
        eprintln!("error: no symbol produced any data");
        return ExitCode::from(3);
    }

    for symbol_result in &result.per_symbol {
        println!(
            "{}: net worth {:.2} ({} trades)",
            symbol_result.symbol, symbol_result.final_net_worth, symbol_result.total_trades
        );
    }

    let summary = BacktestSummary::from_portfolio(
        &result.portfolio,
        result.buy_count,
        result.sell_count,
    );
    println!("{summary}");
    ExitCode::SUCCESS
}

fn run_live(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_strategy_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Replay sources bars from the same [backtest] section the historical
    // path uses.
    let settings = match load_backtest_settings(&adapter, None, None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let live_config = match load_live_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let strategy = match Strategy::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Strategy: {}", strategy.name());

    let data_port = CsvAdapter::new(PathBuf::from(&settings.data_dir));
    let mut bars_by_symbol = Vec::new();
    for (symbol, _) in settings.plan.entries() {
        match data_port.fetch_bars(symbol, settings.config.start_date, settings.config.end_date) {
            Ok(bars) => bars_by_symbol.push((symbol.clone(), bars)),
            Err(e) => eprintln!("warning: {symbol}: {e}"),
        }
    }
    if bars_by_symbol.is_empty() {
        eprintln!("error: no symbol produced any data");
        return ExitCode::from(3);
    }

    let feed = ReplayFeed::from_bars(bars_by_symbol, REPLAY_TICK_INTERVAL);
    let runner = RealTimeRunner::spawn(live_config, strategy, RiskManager::default());

    if let Err(e) = feed.run(runner.sender()) {
        eprintln!("error: {e}");
        let _ = runner.shutdown();
        return (&e).into();
    }

    let summary = runner.shutdown();
    println!("{summary}");
    ExitCode::SUCCESS
}
