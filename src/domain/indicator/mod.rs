//! Window indicators over trailing price slices.
//!
//! Band and threshold indicators refuse to compute on fewer observations
//! than their window (`TradesimError::InsufficientData`); the window-size
//! gate belongs to the calling strategy, not here.

pub mod bollinger;
pub mod mean_reversion;
pub mod rsi;
pub mod trend;

/// Arithmetic mean of a slice. Caller guarantees non-empty.
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N, not N-1).
pub(crate) fn std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}
