use serde::Serialize;

use crate::{compare_by_weight, FundCode, HoldingLine, PortfolioSnapshot, Quarter};

/// The largest positions of one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopHoldings {
    pub fund: FundCode,
    pub quarter: Quarter,
    pub total_value: u64,
    /// Number of holdings in the full snapshot.
    pub total_holdings: usize,
    pub holdings: Vec<HoldingLine>,
}

impl TopHoldings {
    /// Combined weight of the listed holdings.
    pub fn weight(&self) -> f64 {
        self.holdings.iter().map(|line| line.weight).sum()
    }
}

/// First `count` holdings by weight descending, ticker ascending on ties.
pub fn top_holdings(snapshot: &PortfolioSnapshot, count: usize) -> TopHoldings {
    let mut holdings = snapshot.holdings.clone();
    holdings.sort_by(compare_by_weight);
    holdings.truncate(count);

    TopHoldings {
        fund: snapshot.fund.clone(),
        quarter: snapshot.quarter,
        total_value: snapshot.total_value,
        total_holdings: snapshot.holdings.len(),
        holdings,
    }
}
