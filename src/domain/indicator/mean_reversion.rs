//! Z-score overbought/oversold detection.

use crate::domain::error::TradesimError;
use crate::domain::indicator::{mean, std_dev};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanReversion {
    /// Trailing window for the mean and standard deviation.
    pub window: usize,
    /// Z-score cutoff beyond which the price counts as an extreme.
    pub threshold: f64,
}

impl Default for MeanReversion {
    fn default() -> Self {
        MeanReversion {
            window: 20,
            threshold: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeanReversionResult {
    pub overbought: bool,
    pub oversold: bool,
}

impl MeanReversionResult {
    const NEUTRAL: MeanReversionResult = MeanReversionResult {
        overbought: false,
        oversold: false,
    };
}

impl MeanReversion {
    /// A zero standard deviation (flat window) yields the neutral result,
    /// never a division error.
    pub fn calculate(&self, prices: &[f64]) -> Result<MeanReversionResult, TradesimError> {
        if prices.len() < self.window {
            return Err(TradesimError::InsufficientData {
                required: self.window,
                available: prices.len(),
            });
        }

        let tail = &prices[prices.len() - self.window..];
        let m = mean(tail);
        let dev = std_dev(tail, m);
        if dev == 0.0 {
            return Ok(MeanReversionResult::NEUTRAL);
        }

        let deviation = (prices[prices.len() - 1] - m) / dev;
        Ok(MeanReversionResult {
            overbought: deviation > self.threshold,
            oversold: deviation < -self.threshold,
        })
    }
}
