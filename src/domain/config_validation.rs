//! Parsing and validation of run settings from the configuration port.
//!
//! Every fatal misconfiguration is caught here, before any data is read
//! or any thread is spawned.

use std::time::Duration;

use chrono::NaiveDate;

use crate::domain::allocation::{parse_percentages, parse_symbols, AllocationPlan};
use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TradesimError;
use crate::domain::realtime::LiveConfig;
use crate::ports::config_port::ConfigPort;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Everything a historical run needs, fully validated.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSettings {
    pub plan: AllocationPlan,
    pub config: BacktestConfig,
    pub data_dir: String,
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, TradesimError> {
    config
        .get_string(section, key)
        .ok_or_else(|| TradesimError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn parse_date(section: &str, key: &str, value: &str) -> Result<NaiveDate, TradesimError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| TradesimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("'{value}' is not a {DATE_FORMAT} date"),
    })
}

/// Read and validate the `[backtest]` section. Symbol overrides from the
/// command line take precedence over the file values.
pub fn load_backtest_settings(
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
    allocation_override: Option<&str>,
) -> Result<BacktestSettings, TradesimError> {
    let symbols = match symbol_override {
        Some(list) => parse_symbols(list),
        None => parse_symbols(&require(config, "backtest", "symbols")?),
    };
    if symbols.is_empty() {
        return Err(TradesimError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "symbols".to_string(),
            reason: "at least one symbol is required".to_string(),
        });
    }

    let allocations = match allocation_override {
        Some(list) => Some(parse_percentages(list)?),
        None => config
            .get_string("backtest", "allocations")
            .map(|list| parse_percentages(&list))
            .transpose()?,
    };
    let plan = match allocations {
        Some(percentages) => AllocationPlan::new(symbols, percentages)?,
        None => AllocationPlan::even(symbols)?,
    };

    let start_raw = require(config, "backtest", "start_date")?;
    let end_raw = require(config, "backtest", "end_date")?;
    let start_date = parse_date("backtest", "start_date", &start_raw)?;
    let end_date = parse_date("backtest", "end_date", &end_raw)?;
    if start_date >= end_date {
        return Err(TradesimError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: format!("start {start_date} is not before end {end_date}"),
        });
    }

    let initial_capital = config.get_double("backtest", "initial_capital", 1_000_000.0);
    if initial_capital <= 0.0 {
        return Err(TradesimError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: format!("{initial_capital} must be positive"),
        });
    }

    let data_dir = require(config, "backtest", "data_dir")?;

    Ok(BacktestSettings {
        plan,
        config: BacktestConfig {
            start_date,
            end_date,
            initial_capital,
        },
        data_dir,
    })
}

fn non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TradesimError> {
    let value = config.get_double(section, key, default);
    if value < 0.0 {
        return Err(TradesimError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{value} must not be negative"),
        });
    }
    Ok(value)
}

/// Read and validate the `[live]` section. All keys are optional.
pub fn load_live_config(config: &dyn ConfigPort) -> Result<LiveConfig, TradesimError> {
    let defaults = LiveConfig::default();

    let initial_capital = config.get_double(
        "live",
        "initial_capital",
        defaults.initial_capital,
    );
    if initial_capital <= 0.0 {
        return Err(TradesimError::ConfigInvalid {
            section: "live".to_string(),
            key: "initial_capital".to_string(),
            reason: format!("{initial_capital} must be positive"),
        });
    }

    let runtime = non_negative(
        config,
        "live",
        "runtime_seconds",
        defaults.runtime.as_secs_f64(),
    )?;
    let cooldown = non_negative(
        config,
        "live",
        "cooldown_seconds",
        defaults.cooldown.as_secs_f64(),
    )?;
    let min_price_change =
        non_negative(config, "live", "min_price_change", defaults.min_price_change)?;

    Ok(LiveConfig {
        initial_capital,
        runtime: Duration::from_secs_f64(runtime),
        cooldown: Duration::from_secs_f64(cooldown),
        min_price_change,
    })
}

/// Sanity checks on the `[strategy]` section that apply to every strategy.
pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let window = config.get_int("strategy", "window", 20);
    if window < 2 {
        return Err(TradesimError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "window".to_string(),
            reason: format!("{window} is below the minimum of 2"),
        });
    }
    let num_std = config.get_double("strategy", "num_std", 2.0);
    if num_std <= 0.0 {
        return Err(TradesimError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "num_std".to_string(),
            reason: format!("{num_std} must be positive"),
        });
    }
    let threshold = config.get_double("strategy", "threshold", 1.2);
    if threshold <= 0.0 {
        return Err(TradesimError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "threshold".to_string(),
            reason: format!("{threshold} must be positive"),
        });
    }
    Ok(())
}
