//! Trend classification from exponentially weighted means and a
//! least-squares slope over the trailing window.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Sideways => write!(f, "sideways"),
        }
    }
}

/// Exponentially weighted mean of the last `window` prices, weights
/// `e^t` for `t` evenly spaced over [-1, 0] so the most recent price
/// carries the largest weight.
pub fn exp_weighted_mean(prices: &[f64], window: usize) -> Option<f64> {
    if window == 0 || prices.len() < window {
        return None;
    }
    let tail = &prices[prices.len() - window..];

    let mut weighted = 0.0;
    let mut weight_sum = 0.0;
    for (i, &price) in tail.iter().enumerate() {
        let t = if window == 1 {
            0.0
        } else {
            -1.0 + i as f64 / (window - 1) as f64
        };
        let w = t.exp();
        weighted += price * w;
        weight_sum += w;
    }
    Some(weighted / weight_sum)
}

/// Least-squares slope of the last `window` prices against bar index.
/// Returns 0 when there are too few observations.
pub fn regression_slope(prices: &[f64], window: usize) -> f64 {
    if window < 2 || prices.len() < window {
        return 0.0;
    }
    let tail = &prices[prices.len() - window..];
    let n = window as f64;

    let sum_x = (n - 1.0) * n / 2.0;
    let sum_x2 = (n - 1.0) * n * (2.0 * n - 1.0) / 6.0;
    let sum_y: f64 = tail.iter().sum();
    let sum_xy: f64 = tail.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denom
}

/// Classify the window as up/down/sideways. Requires both EMAs to agree
/// with the slope direction and the slope magnitude to clear the threshold.
pub fn detect_trend(
    prices: &[f64],
    short_window: usize,
    long_window: usize,
    slope_threshold: f64,
) -> Trend {
    if prices.len() < long_window {
        return Trend::Sideways;
    }

    let (Some(short_ema), Some(long_ema)) = (
        exp_weighted_mean(prices, short_window),
        exp_weighted_mean(prices, long_window),
    ) else {
        return Trend::Sideways;
    };
    let slope = regression_slope(prices, long_window);

    if slope.abs() < slope_threshold {
        Trend::Sideways
    } else if short_ema > long_ema && slope > slope_threshold {
        Trend::Up
    } else if short_ema < long_ema && slope < -slope_threshold {
        Trend::Down
    } else {
        Trend::Sideways
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ewm_of_flat_prices_is_the_price() {
        let prices = vec![100.0; 50];
        assert_relative_eq!(exp_weighted_mean(&prices, 20).unwrap(), 100.0);
    }

    #[test]
    fn ewm_weights_recent_prices_more() {
        // Rising series: weighted mean must sit above the simple mean.
        let prices: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ewm = exp_weighted_mean(&prices, 20).unwrap();
        let simple = prices.iter().sum::<f64>() / 20.0;
        assert!(ewm > simple);
    }

    #[test]
    fn ewm_insufficient_data() {
        assert_eq!(exp_weighted_mean(&[1.0, 2.0], 5), None);
        assert_eq!(exp_weighted_mean(&[1.0], 0), None);
    }

    #[test]
    fn slope_of_linear_series() {
        let prices: Vec<f64> = (0..50).map(|i| 10.0 + 0.5 * i as f64).collect();
        assert_relative_eq!(regression_slope(&prices, 50), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn slope_of_flat_series_is_zero() {
        let prices = vec![42.0; 50];
        assert_relative_eq!(regression_slope(&prices, 50), 0.0);
    }

    #[test]
    fn slope_short_series_is_zero() {
        assert_relative_eq!(regression_slope(&[1.0, 2.0], 50), 0.0);
    }

    #[test]
    fn uptrend_detected() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + 0.5 * i as f64).collect();
        assert_eq!(detect_trend(&prices, 20, 50, 0.003), Trend::Up);
    }

    #[test]
    fn downtrend_detected() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 - 0.5 * i as f64).collect();
        assert_eq!(detect_trend(&prices, 20, 50, 0.003), Trend::Down);
    }

    #[test]
    fn flat_series_is_sideways() {
        let prices = vec![100.0; 50];
        assert_eq!(detect_trend(&prices, 20, 50, 0.003), Trend::Sideways);
    }

    #[test]
    fn below_long_window_is_sideways() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(detect_trend(&prices, 20, 50, 0.003), Trend::Sideways);
    }

    #[test]
    fn shallow_slope_is_sideways() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + 0.001 * i as f64).collect();
        assert_eq!(detect_trend(&prices, 20, 50, 0.003), Trend::Sideways);
    }
}
