//! Signal generation strategies.
//!
//! A strategy is a closed variant set: adding one means adding an enum arm,
//! not branching on strings. Instances are constructed per run with explicit
//! configuration; nothing here is shared module state.

use tracing::debug;

use crate::domain::error::TradesimError;
use crate::domain::indicator::bollinger::BollingerBands;
use crate::domain::indicator::mean_reversion::MeanReversion;
use crate::domain::indicator::rsi::rsi;
use crate::domain::indicator::trend::{detect_trend, Trend};
use crate::domain::position::Side;
use crate::domain::signal::SignalDecision;
use crate::ports::config_port::ConfigPort;

/// Band breakout with an RSI confirmation filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerStrategy {
    pub bands: BollingerBands,
    pub rsi_period: usize,
    pub rsi_buy_below: f64,
    pub rsi_sell_above: f64,
}

impl Default for BollingerStrategy {
    fn default() -> Self {
        BollingerStrategy {
            bands: BollingerBands::default(),
            rsi_period: 14,
            rsi_buy_below: 40.0,
            rsi_sell_above: 60.0,
        }
    }
}

impl BollingerStrategy {
    fn decide(&self, prices: &[f64], side: Side) -> SignalDecision {
        if prices.len() < self.bands.window {
            return SignalDecision::None;
        }
        let Ok(bands) = self.bands.calculate(prices) else {
            return SignalDecision::None;
        };
        let Some(strength) = rsi(prices, self.rsi_period) else {
            return SignalDecision::None;
        };
        let Some(&price) = prices.last() else {
            return SignalDecision::None;
        };

        if side != Side::Long && price < bands.lower_band && strength < self.rsi_buy_below {
            SignalDecision::Buy
        } else if side == Side::Long && price > bands.upper_band && strength > self.rsi_sell_above {
            SignalDecision::Sell
        } else {
            SignalDecision::None
        }
    }
}

/// Trend-following with a z-score mean-reversion fallback in sideways
/// markets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanReversionStrategy {
    pub indicator: MeanReversion,
    pub short_window: usize,
    pub long_window: usize,
    pub slope_threshold: f64,
}

impl Default for MeanReversionStrategy {
    fn default() -> Self {
        MeanReversionStrategy {
            indicator: MeanReversion::default(),
            short_window: 20,
            long_window: 50,
            slope_threshold: 0.003,
        }
    }
}

impl MeanReversionStrategy {
    fn decide(&self, prices: &[f64], side: Side) -> SignalDecision {
        let trend = detect_trend(
            prices,
            self.short_window,
            self.long_window,
            self.slope_threshold,
        );
        debug!(%trend, "trend classification");

        match trend {
            Trend::Up if side != Side::Long => SignalDecision::Buy,
            Trend::Down if side != Side::Short => SignalDecision::Sell,
            Trend::Up | Trend::Down => SignalDecision::None,
            Trend::Sideways => {
                let Ok(zones) = self.indicator.calculate(prices) else {
                    return SignalDecision::None;
                };
                if zones.oversold && side != Side::Long {
                    SignalDecision::Buy
                } else if zones.overbought && side != Side::Short {
                    SignalDecision::Sell
                } else {
                    SignalDecision::None
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Bollinger(BollingerStrategy),
    MeanReversion(MeanReversionStrategy),
}

impl Strategy {
    /// Decision for the current observation window and position side.
    /// Returns [`SignalDecision::None`] when data is insufficient; the
    /// underlying indicators are never invoked below their window.
    pub fn decide(&self, prices: &[f64], side: Side) -> SignalDecision {
        match self {
            Strategy::Bollinger(s) => s.decide(prices, side),
            Strategy::MeanReversion(s) => s.decide(prices, side),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Bollinger(_) => "bollinger",
            Strategy::MeanReversion(_) => "mean_reversion",
        }
    }

    /// Build a strategy from `[backtest] strategy` and the `[strategy]`
    /// section. Unknown names are a fatal configuration error.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Strategy, TradesimError> {
        let name = config
            .get_string("backtest", "strategy")
            .unwrap_or_else(|| "bollinger".to_string());

        match name.as_str() {
            "bollinger" => {
                let defaults = BollingerStrategy::default();
                Ok(Strategy::Bollinger(BollingerStrategy {
                    bands: BollingerBands {
                        window: config.get_int(
                            "strategy",
                            "window",
                            defaults.bands.window as i64,
                        ) as usize,
                        num_std: config.get_double("strategy", "num_std", defaults.bands.num_std),
                    },
                    rsi_period: config.get_int(
                        "strategy",
                        "rsi_period",
                        defaults.rsi_period as i64,
                    ) as usize,
                    ..defaults
                }))
            }
            "mean_reversion" => {
                let defaults = MeanReversionStrategy::default();
                Ok(Strategy::MeanReversion(MeanReversionStrategy {
                    indicator: MeanReversion {
                        window: config.get_int(
                            "strategy",
                            "window",
                            defaults.indicator.window as i64,
                        ) as usize,
                        threshold: config.get_double(
                            "strategy",
                            "threshold",
                            defaults.indicator.threshold,
                        ),
                    },
                    short_window: config.get_int(
                        "strategy",
                        "short_window",
                        defaults.short_window as i64,
                    ) as usize,
                    long_window: config.get_int(
                        "strategy",
                        "long_window",
                        defaults.long_window as i64,
                    ) as usize,
                    slope_threshold: config.get_double(
                        "strategy",
                        "slope_threshold",
                        defaults.slope_threshold,
                    ),
                }))
            }
            other => Err(TradesimError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "strategy".to_string(),
                reason: format!("unknown strategy '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn bollinger() -> Strategy {
        Strategy::Bollinger(BollingerStrategy::default())
    }

    fn mean_reversion() -> Strategy {
        Strategy::MeanReversion(MeanReversionStrategy::default())
    }

    #[test]
    fn bollinger_buy_on_crash_below_lower_band() {
        // 19 flat prices then a drop to 80: below the lower band, RSI 0.
        let mut prices = vec![100.0; 19];
        prices.push(80.0);

        let decision = bollinger().decide(&prices, Side::Flat);
        assert_eq!(decision, SignalDecision::Buy);
        assert_eq!(decision.to_string(), "buy");
    }

    #[test]
    fn bollinger_no_buy_when_already_long() {
        let mut prices = vec![100.0; 19];
        prices.push(80.0);

        assert_eq!(bollinger().decide(&prices, Side::Long), SignalDecision::None);
    }

    #[test]
    fn bollinger_sell_needs_long_position() {
        // Rally above the upper band with high RSI.
        let mut prices: Vec<f64> = (0..19).map(|i| 100.0 + (i % 2) as f64 * 0.5).collect();
        prices.push(130.0);

        assert_eq!(bollinger().decide(&prices, Side::Long), SignalDecision::Sell);
        assert_eq!(bollinger().decide(&prices, Side::Flat), SignalDecision::None);
    }

    #[test]
    fn bollinger_flat_window_is_neutral() {
        let prices = vec![100.0; 20];
        assert_eq!(bollinger().decide(&prices, Side::Flat), SignalDecision::None);
    }

    #[test]
    fn bollinger_insufficient_data_is_neutral() {
        let prices = vec![80.0; 19];
        assert_eq!(bollinger().decide(&prices, Side::Flat), SignalDecision::None);
    }

    #[test]
    fn mean_reversion_buys_uptrend() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + 0.5 * i as f64).collect();
        assert_eq!(
            mean_reversion().decide(&prices, Side::Flat),
            SignalDecision::Buy
        );
        assert_eq!(
            mean_reversion().decide(&prices, Side::Long),
            SignalDecision::None
        );
    }

    #[test]
    fn mean_reversion_sells_downtrend() {
        let prices: Vec<f64> = (0..50).map(|i| 200.0 - 0.5 * i as f64).collect();
        assert_eq!(
            mean_reversion().decide(&prices, Side::Flat),
            SignalDecision::Sell
        );
        assert_eq!(
            mean_reversion().decide(&prices, Side::Short),
            SignalDecision::None
        );
    }

    #[test]
    fn mean_reversion_sideways_uses_zscore() {
        // Low-priced flat series with a final dip: the regression slope stays
        // under the threshold (sideways) while the z-score flags oversold.
        let mut prices = vec![1.0; 49];
        prices.push(0.9);

        assert_eq!(
            mean_reversion().decide(&prices, Side::Flat),
            SignalDecision::Buy
        );
    }

    #[test]
    fn mean_reversion_flat_window_is_neutral() {
        let prices = vec![100.0; 50];
        assert_eq!(
            mean_reversion().decide(&prices, Side::Flat),
            SignalDecision::None
        );
    }

    #[test]
    fn from_config_builds_bollinger_with_overrides() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\nstrategy = bollinger\n[strategy]\nwindow = 30\nnum_std = 1.5\n",
        )
        .unwrap();
        let strategy = Strategy::from_config(&adapter).unwrap();

        match strategy {
            Strategy::Bollinger(s) => {
                assert_eq!(s.bands.window, 30);
                assert!((s.bands.num_std - 1.5).abs() < f64::EPSILON);
                assert_eq!(s.rsi_period, 14);
            }
            other => panic!("unexpected strategy: {}", other.name()),
        }
    }

    #[test]
    fn from_config_defaults_to_bollinger() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(Strategy::from_config(&adapter).unwrap().name(), "bollinger");
    }

    #[test]
    fn from_config_rejects_unknown_strategy() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nstrategy = momentum\n").unwrap();
        assert!(Strategy::from_config(&adapter).is_err());
    }

    #[test]
    fn from_config_builds_mean_reversion() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\nstrategy = mean_reversion\n[strategy]\nthreshold = 2.5\n",
        )
        .unwrap();
        match Strategy::from_config(&adapter).unwrap() {
            Strategy::MeanReversion(s) => {
                assert!((s.indicator.threshold - 2.5).abs() < f64::EPSILON);
                assert_eq!(s.long_window, 50);
            }
            other => panic!("unexpected strategy: {}", other.name()),
        }
    }
}
