//! Historical data access port.

use chrono::NaiveDate;

use crate::domain::bar::PriceBar;
use crate::domain::error::TradesimError;

pub trait DataPort {
    /// Daily bars for `symbol` within the inclusive date range, sorted by
    /// date ascending.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TradesimError>;

    /// First date, last date, and bar count available for `symbol`, or
    /// `None` when the source cannot answer without a full fetch.
    fn data_range(&self, _symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradesimError> {
        Ok(None)
    }
}
