//! Domain error types.

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("symbol/allocation count mismatch: {symbols} symbols, {allocations} allocations")]
    AllocationMismatch { symbols: usize, allocations: usize },

    #[error("allocations must sum to 100%, got {sum}")]
    AllocationSum { sum: f64 },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data points: required {required}, available {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("live feed error: {reason}")]
    Feed { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Io(_) => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. }
            | TradesimError::AllocationMismatch { .. }
            | TradesimError::AllocationSum { .. } => 2,
            TradesimError::Data { .. } | TradesimError::NoData { .. } => 3,
            TradesimError::InsufficientData { .. } => 4,
            TradesimError::Feed { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
