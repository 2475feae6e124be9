pub mod allocation;
pub mod backtest;
pub mod bar;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod portfolio;
pub mod position;
pub mod realtime;
pub mod risk;
pub mod signal;
pub mod strategy;
pub mod trade;
