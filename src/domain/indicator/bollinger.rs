//! Bollinger Bands over a trailing price window.
//!
//! Middle = mean of the last `window` prices; upper/lower = middle ±
//! num_std × population standard deviation. A flat window collapses both
//! bands onto the moving average.

use crate::domain::error::TradesimError;
use crate::domain::indicator::{mean, std_dev};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub window: usize,
    pub num_std: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        BollingerBands {
            window: 20,
            num_std: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerResult {
    pub moving_avg: f64,
    pub upper_band: f64,
    pub lower_band: f64,
}

impl BollingerBands {
    pub fn calculate(&self, prices: &[f64]) -> Result<BollingerResult, TradesimError> {
        if prices.len() < self.window {
            return Err(TradesimError::InsufficientData {
                required: self.window,
                available: prices.len(),
            });
        }

        let tail = &prices[prices.len() - self.window..];
        let moving_avg = mean(tail);
        let dev = std_dev(tail, moving_avg);

        Ok(BollingerResult {
            moving_avg,
            upper_band: moving_avg + self.num_std * dev,
            lower_band: moving_avg - self.num_std * dev,
        })
    }
}
