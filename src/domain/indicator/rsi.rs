//! Relative Strength Index over a trailing price slice.
//!
//! Wilder's smoothing: seed with the simple mean of the first `period`
//! gains/losses, then avg = (prev_avg * (n-1) + current) / n.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss); 100 when there are no
//! losses in the window.

/// Final RSI value for the slice, or `None` below `period + 1` observations.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..prices.len() {
        let change = prices[i] - prices[i - 1];
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        if i <= period {
            avg_gain += gain / period as f64;
            avg_loss += loss / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        }
    }

    if avg_loss == 0.0 {
        Some(100.0)
    } else {
        Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
    }
}
