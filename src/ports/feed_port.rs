//! Live price feed port.

use std::sync::mpsc::Sender;

use crate::domain::error::TradesimError;
use crate::domain::realtime::Tick;

pub trait PriceFeed {
    /// Produce ticks into `sender` until the source is exhausted or the
    /// receiving side hangs up. Blocks the calling thread.
    fn run(&self, sender: Sender<Tick>) -> Result<(), TradesimError>;
}
