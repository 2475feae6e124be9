//! Historical replay feed.
//!
//! Replays stored closing prices as live ticks, one producer thread per
//! symbol, pacing sends by a fixed interval. Used to drive the live
//! session loop without a market connection.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::domain::bar::PriceBar;
use crate::domain::error::TradesimError;
use crate::domain::realtime::Tick;
use crate::ports::feed_port::PriceFeed;

pub struct ReplayFeed {
    series: Vec<(String, Vec<f64>)>,
    interval: Duration,
}

impl ReplayFeed {
    pub fn new(series: Vec<(String, Vec<f64>)>, interval: Duration) -> Self {
        Self { series, interval }
    }

    /// Build a feed from fetched daily bars, replaying their closes.
    pub fn from_bars(bars_by_symbol: Vec<(String, Vec<PriceBar>)>, interval: Duration) -> Self {
        let series = bars_by_symbol
            .into_iter()
            .map(|(symbol, bars)| {
                let closes = bars.iter().map(|b| b.close).collect();
                (symbol, closes)
            })
            .collect();
        Self::new(series, interval)
    }
}

impl PriceFeed for ReplayFeed {
    /// Spawns one producer per symbol and blocks until all series are
    /// exhausted. A hung-up receiver stops the affected producer early;
    /// that is a normal session end, not an error.
    fn run(&self, sender: Sender<Tick>) -> Result<(), TradesimError> {
        let mut producers = Vec::with_capacity(self.series.len());

        for (symbol, prices) in &self.series {
            let symbol = symbol.clone();
            let prices = prices.clone();
            let sender = sender.clone();
            let interval = self.interval;

            producers.push(thread::spawn(move || {
                for price in prices {
                    let tick = Tick {
                        symbol: symbol.clone(),
                        price,
                    };
                    if sender.send(tick).is_err() {
                        debug!(symbol = %symbol, "receiver gone, stopping replay");
                        break;
                    }
                    if !interval.is_zero() {
                        thread::sleep(interval);
                    }
                }
            }));
        }
        drop(sender);

        for producer in producers {
            producer.join().map_err(|_| TradesimError::Feed {
                reason: "replay producer thread panicked".to_string(),
            })?;
        }
        Ok(())
    }
}
