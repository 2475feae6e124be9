//! Capital allocation across symbols.

use crate::domain::error::TradesimError;

/// Allocation tolerance in percentage points.
const SUM_TOLERANCE: f64 = 0.01;

/// Per-symbol capital percentages, validated to sum to 100 before any
/// simulation starts.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPlan {
    entries: Vec<(String, f64)>,
}

impl AllocationPlan {
    pub fn new(symbols: Vec<String>, percentages: Vec<f64>) -> Result<Self, TradesimError> {
        if symbols.len() != percentages.len() {
            return Err(TradesimError::AllocationMismatch {
                symbols: symbols.len(),
                allocations: percentages.len(),
            });
        }
        let sum: f64 = percentages.iter().sum();
        if (sum - 100.0).abs() > SUM_TOLERANCE {
            return Err(TradesimError::AllocationSum { sum });
        }

        let entries = symbols
            .into_iter()
            .map(|s| s.to_uppercase())
            .zip(percentages)
            .collect();
        Ok(AllocationPlan { entries })
    }

    /// Equal split across `symbols`.
    pub fn even(symbols: Vec<String>) -> Result<Self, TradesimError> {
        let count = symbols.len();
        let pct = 100.0 / count.max(1) as f64;
        AllocationPlan::new(symbols, vec![pct; count])
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    /// Sub-portfolio capital for each symbol: `total × pct / 100`.
    pub fn split(&self, total_capital: f64) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|(symbol, pct)| (symbol.clone(), total_capital * pct / 100.0))
            .collect()
    }
}

/// Parse a comma-separated symbol list, e.g. `BTC,ETH`.
pub fn parse_symbols(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a comma-separated percentage list, e.g. `60,40`.
pub fn parse_percentages(input: &str) -> Result<Vec<f64>, TradesimError> {
    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>().map_err(|_| TradesimError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "allocations".to_string(),
                reason: format!("'{s}' is not a number"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn valid_plan() {
        let plan = AllocationPlan::new(
            vec!["btc".into(), "eth".into()],
            vec![60.0, 40.0],
        )
        .unwrap();
        assert_eq!(
            plan.entries(),
            &[("BTC".to_string(), 60.0), ("ETH".to_string(), 40.0)]
        );
    }

    #[test]
    fn count_mismatch_is_fatal() {
        let err = AllocationPlan::new(vec!["BTC".into()], vec![60.0, 40.0]).unwrap_err();
        assert!(matches!(
            err,
            TradesimError::AllocationMismatch {
                symbols: 1,
                allocations: 2
            }
        ));
    }

    #[test]
    fn bad_sum_is_fatal() {
        let err =
            AllocationPlan::new(vec!["BTC".into(), "ETH".into()], vec![60.0, 30.0]).unwrap_err();
        assert!(matches!(err, TradesimError::AllocationSum { .. }));
    }

    #[test]
    fn sum_within_tolerance_is_accepted() {
        assert!(AllocationPlan::new(
            vec!["BTC".into(), "ETH".into()],
            vec![60.005, 40.0]
        )
        .is_ok());
    }

    #[test]
    fn split_conserves_capital() {
        let plan = AllocationPlan::new(
            vec!["BTC".into(), "ETH".into(), "SOL".into()],
            vec![40.0, 30.0, 30.0],
        )
        .unwrap();
        let split = plan.split(1_000_000.0);

        assert_relative_eq!(split[0].1, 400_000.0);
        assert_relative_eq!(split[1].1, 300_000.0);
        assert_relative_eq!(split[2].1, 300_000.0);

        let total: f64 = split.iter().map(|(_, c)| c).sum();
        assert_relative_eq!(total, 1_000_000.0, epsilon = 1e-6);
    }

    #[test]
    fn even_split() {
        let plan = AllocationPlan::even(vec!["A".into(), "B".into(), "C".into(), "D".into()])
            .unwrap();
        for (_, pct) in plan.entries() {
            assert_relative_eq!(*pct, 25.0);
        }
    }

    #[test]
    fn parse_symbol_list() {
        assert_eq!(parse_symbols("btc, eth ,SOL"), vec!["BTC", "ETH", "SOL"]);
        assert!(parse_symbols("").is_empty());
    }

    #[test]
    fn parse_percentage_list() {
        assert_eq!(parse_percentages("60, 40").unwrap(), vec![60.0, 40.0]);
        assert!(parse_percentages("60,forty").is_err());
    }
}
