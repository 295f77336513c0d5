use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Cik, Cusip, FundCode, Quarter, Ticker, ValidationError};

/// Sector assigned to issuers missing from the issuer→sector lookup.
pub const SECTOR_OTHER: &str = "Other";
/// Sector bucket for positions whose CUSIP maps to no tracked ticker.
pub const SECTOR_UNRESOLVED: &str = "Unresolved";

/// Tolerance applied to the weight-sum invariant.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Tracked fund manager. Reference data, never mutated after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fund {
    pub code: FundCode,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    pub style: String,
    pub cik: Cik,
    #[serde(default)]
    pub description: String,
}

impl Fund {
    /// Label for tables and charts, falling back to the code.
    pub fn display_name(&self) -> &str {
        if self.short_name.trim().is_empty() {
            self.code.as_str()
        } else {
            &self.short_name
        }
    }
}

/// A normalized position before portfolio weights are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: Ticker,
    pub cusip: Option<Cusip>,
    pub issuer: String,
    pub sector: String,
    pub resolved: bool,
    pub shares: u64,
    pub market_value: u64,
}

impl Position {
    /// Position on a tracked ticker.
    pub fn resolved(
        ticker: Ticker,
        issuer: impl Into<String>,
        sector: impl Into<String>,
        shares: u64,
        market_value: u64,
    ) -> Self {
        Self {
            ticker,
            cusip: None,
            issuer: issuer.into(),
            sector: sector.into(),
            resolved: true,
            shares,
            market_value,
        }
    }

    /// Position keyed by CUSIP because no tracked ticker matched.
    pub fn unresolved(
        cusip: Cusip,
        issuer: impl Into<String>,
        shares: u64,
        market_value: u64,
    ) -> Self {
        Self {
            ticker: Ticker::from_cusip(&cusip),
            cusip: Some(cusip),
            issuer: issuer.into(),
            sector: String::from(SECTOR_UNRESOLVED),
            resolved: false,
            shares,
            market_value,
        }
    }

    /// Position whose identifier is not a CUSIP at all, keyed by `key`.
    pub fn unidentified(
        key: Ticker,
        issuer: impl Into<String>,
        shares: u64,
        market_value: u64,
    ) -> Self {
        Self {
            ticker: key,
            cusip: None,
            issuer: issuer.into(),
            sector: String::from(SECTOR_UNRESOLVED),
            resolved: false,
            shares,
            market_value,
        }
    }

    pub fn with_cusip(mut self, cusip: Cusip) -> Self {
        self.cusip = Some(cusip);
        self
    }

    /// Re-keys the position as an option or principal-amount line.
    pub fn as_instrument(mut self, instrument: &str) -> Self {
        self.ticker = self.ticker.with_instrument(instrument);
        self
    }
}

/// One position within one fund's one-quarter snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingLine {
    pub ticker: Ticker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cusip: Option<Cusip>,
    pub issuer: String,
    pub sector: String,
    pub resolved: bool,
    pub shares: u64,
    /// Market value in whole US dollars.
    pub market_value: u64,
    /// `market_value / total_value`, within [0, 1].
    pub weight: f64,
}

/// Holdings of exactly one fund for exactly one reporting quarter.
///
/// Holdings are ordered by weight descending with ticker ascending as the
/// tie-break, and their weights sum to 1 within [`WEIGHT_TOLERANCE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub fund: FundCode,
    pub quarter: Quarter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    pub total_value: u64,
    pub holdings: Vec<HoldingLine>,
}

impl PortfolioSnapshot {
    /// Builds a snapshot, deriving the total and every weight from `positions`.
    pub fn new(
        fund: FundCode,
        quarter: Quarter,
        positions: Vec<Position>,
    ) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(positions.len());
        for position in &positions {
            if !seen.insert(position.ticker.clone()) {
                return Err(ValidationError::DuplicateHolding {
                    ticker: position.ticker.to_string(),
                });
            }
        }

        let total_value = positions
            .iter()
            .map(|position| position.market_value)
            .fold(0_u64, u64::saturating_add);
        if total_value == 0 {
            return Err(ValidationError::EmptyPortfolio);
        }

        let mut holdings: Vec<HoldingLine> = positions
            .into_iter()
            .map(|position| HoldingLine {
                weight: position.market_value as f64 / total_value as f64,
                ticker: position.ticker,
                cusip: position.cusip,
                issuer: position.issuer,
                sector: position.sector,
                resolved: position.resolved,
                shares: position.shares,
                market_value: position.market_value,
            })
            .collect();
        holdings.sort_by(compare_by_weight);

        Ok(Self {
            fund,
            quarter,
            accession: None,
            total_value,
            holdings,
        })
    }

    pub fn with_accession(mut self, accession: impl Into<String>) -> Self {
        self.accession = Some(accession.into());
        self
    }

    pub fn holding(&self, ticker: &Ticker) -> Option<&HoldingLine> {
        self.holdings.iter().find(|line| &line.ticker == ticker)
    }

    pub fn weight_sum(&self) -> f64 {
        self.holdings.iter().map(|line| line.weight).sum()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

/// Weight descending, ticker ascending.
pub(crate) fn compare_by_weight(left: &HoldingLine, right: &HoldingLine) -> std::cmp::Ordering {
    right
        .weight
        .total_cmp(&left.weight)
        .then_with(|| left.ticker.cmp(&right.ticker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(raw: &str) -> Ticker {
        Ticker::parse(raw).expect("valid ticker")
    }

    #[test]
    fn snapshot_weights_sum_to_one_and_sort_descending() {
        let snapshot = PortfolioSnapshot::new(
            FundCode::parse("F").expect("valid"),
            Quarter::parse("Q3 2024").expect("valid"),
            vec![
                Position::resolved(ticker("MSFT"), "Microsoft Corp", "Technology", 500, 150_000),
                Position::resolved(ticker("AAPL"), "Apple Inc", "Technology", 1_000, 200_000),
            ],
        )
        .expect("snapshot should build");

        assert_eq!(snapshot.total_value, 350_000);
        assert_eq!(snapshot.holdings[0].ticker.as_str(), "AAPL");
        assert!((snapshot.holdings[0].weight - 0.571_428).abs() < 1e-3);
        assert!((snapshot.holdings[1].weight - 0.428_571).abs() < 1e-3);
        assert!((snapshot.weight_sum() - 1.0).abs() < WEIGHT_TOLERANCE);
    }

    #[test]
    fn equal_weights_break_ties_by_ticker() {
        let snapshot = PortfolioSnapshot::new(
            FundCode::parse("F").expect("valid"),
            Quarter::parse("Q3 2024").expect("valid"),
            vec![
                Position::resolved(ticker("ZTS"), "Zoetis", "Healthcare", 10, 100),
                Position::resolved(ticker("ABT"), "Abbott", "Healthcare", 10, 100),
            ],
        )
        .expect("snapshot should build");

        assert_eq!(snapshot.holdings[0].ticker.as_str(), "ABT");
        assert_eq!(snapshot.holdings[1].ticker.as_str(), "ZTS");
    }

    #[test]
    fn rejects_zero_total_and_duplicates() {
        let fund = FundCode::parse("F").expect("valid");
        let quarter = Quarter::parse("Q3 2024").expect("valid");

        let empty = PortfolioSnapshot::new(fund.clone(), quarter, Vec::new());
        assert!(matches!(empty, Err(ValidationError::EmptyPortfolio)));

        let duplicated = PortfolioSnapshot::new(
            fund,
            quarter,
            vec![
                Position::resolved(ticker("V"), "Visa", "Financials", 1, 10),
                Position::resolved(ticker("V"), "Visa", "Financials", 1, 10),
            ],
        );
        assert!(matches!(duplicated, Err(ValidationError::DuplicateHolding { .. })));
    }
}
