//! CSV file data adapter.
//!
//! One file per symbol at `{base_path}/{SYMBOL}.csv` with a header row and
//! positional columns `date,open,high,low,close[,volume]`. Volume is
//! optional; missing values are recorded as 0.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::bar::PriceBar;
use crate::domain::error::TradesimError;
use crate::ports::data_port::DataPort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol.to_uppercase()))
    }

    fn field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, TradesimError> {
        let raw = record.get(index).ok_or_else(|| TradesimError::Data {
            reason: format!("missing {name} column"),
        })?;
        raw.trim().parse().map_err(|_| TradesimError::Data {
            reason: format!("invalid {name} value '{raw}'"),
        })
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TradesimError> {
        let symbol = symbol.to_uppercase();
        let path = self.csv_path(&symbol);
        let content = fs::read_to_string(&path).map_err(|e| TradesimError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TradesimError::Data {
                reason: format!("CSV parse error: {e}"),
            })?;

            let date_str = record.get(0).ok_or_else(|| TradesimError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                TradesimError::Data {
                    reason: format!("invalid date '{date_str}': {e}"),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let volume = match record.get(5) {
                Some(raw) if !raw.trim().is_empty() => {
                    raw.trim().parse().map_err(|_| TradesimError::Data {
                        reason: format!("invalid volume value '{raw}'"),
                    })?
                }
                _ => 0,
            };

            bars.push(PriceBar {
                symbol: symbol.clone(),
                date,
                open: Self::field(&record, 1, "open")?,
                high: Self::field(&record, 2, "high")?,
                low: Self::field(&record, 3, "low")?,
                close: Self::field(&record, 4, "close")?,
                volume,
            });
        }

        if bars.is_empty() {
            return Err(TradesimError::NoData { symbol });
        }

        bars.sort_by_key(|bar| bar.date);
        Ok(bars)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradesimError> {
        match self.fetch_bars(symbol, NaiveDate::MIN, NaiveDate::MAX) {
            Ok(bars) => {
                let first = bars[0].date;
                let last = bars[bars.len() - 1].date;
                Ok(Some((first, last, bars.len())))
            }
            Err(TradesimError::NoData { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
