//! Price bar representation.

use chrono::NaiveDate;

/// A single historical price observation. Sources that lack volume store the
/// placeholder `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// Bar with all price fields set to `close`, for sources that only carry
    /// a single price per observation.
    pub fn from_close(symbol: &str, date: NaiveDate, close: f64) -> Self {
        PriceBar {
            symbol: symbol.to_string(),
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_close_fills_all_fields() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let bar = PriceBar::from_close("BTC", date, 42000.0);

        assert_eq!(bar.symbol, "BTC");
        assert_eq!(bar.date, date);
        assert!((bar.open - 42000.0).abs() < f64::EPSILON);
        assert!((bar.high - 42000.0).abs() < f64::EPSILON);
        assert!((bar.low - 42000.0).abs() < f64::EPSILON);
        assert!((bar.close - 42000.0).abs() < f64::EPSILON);
        assert_eq!(bar.volume, 0);
    }
}
