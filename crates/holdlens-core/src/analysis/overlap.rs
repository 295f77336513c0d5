use std::collections::BTreeMap;

use serde::Serialize;

use crate::{FundCode, PortfolioSnapshot, Quarter, Ticker};

/// Holdings two funds have in common.
///
/// `first` always orders before `second`, so a cell reads the same from
/// either side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapCell {
    pub first: FundCode,
    pub second: FundCode,
    /// Shared tickers in ascending order.
    pub shared: Vec<Ticker>,
    pub count: usize,
    /// Sum of both funds' weights across the shared tickers, within [0, 2].
    pub combined_weight: f64,
}

/// Pairwise overlap between the latest snapshots of a set of funds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapMatrix {
    /// Funds with a snapshot, in requested order.
    pub funds: Vec<FundCode>,
    /// Requested funds without any snapshot, excluded from the matrix.
    pub missing: Vec<FundCode>,
    /// Quarter of each fund's snapshot.
    pub quarters: BTreeMap<FundCode, Quarter>,
    pub cells: Vec<OverlapCell>,
}

impl OverlapMatrix {
    /// Cell for a pair of distinct funds, in either order. The diagonal is
    /// undefined and returns `None`.
    pub fn get(&self, left: &FundCode, right: &FundCode) -> Option<&OverlapCell> {
        if left == right {
            return None;
        }
        let (first, second) = ordered(left, right);
        self.cells
            .iter()
            .find(|cell| &cell.first == first && &cell.second == second)
    }

    /// Shared-ticker count for a pair; `None` on the diagonal or for unknown
    /// funds.
    pub fn count(&self, left: &FundCode, right: &FundCode) -> Option<usize> {
        self.get(left, right).map(|cell| cell.count)
    }
}

/// Builds the matrix over `snapshots`, one per fund. Later snapshots for an
/// already-seen fund are ignored.
pub fn overlap_matrix<'a>(
    snapshots: impl IntoIterator<Item = &'a PortfolioSnapshot>,
    missing: Vec<FundCode>,
) -> OverlapMatrix {
    let mut seen: Vec<&PortfolioSnapshot> = Vec::new();
    for snapshot in snapshots {
        if seen.iter().all(|existing| existing.fund != snapshot.fund) {
            seen.push(snapshot);
        }
    }

    let mut cells = Vec::new();
    for (index, left) in seen.iter().enumerate() {
        for right in &seen[index + 1..] {
            cells.push(overlap_cell(left, right));
        }
    }

    OverlapMatrix {
        funds: seen.iter().map(|snapshot| snapshot.fund.clone()).collect(),
        missing,
        quarters: seen
            .iter()
            .map(|snapshot| (snapshot.fund.clone(), snapshot.quarter))
            .collect(),
        cells,
    }
}

fn overlap_cell(left: &PortfolioSnapshot, right: &PortfolioSnapshot) -> OverlapCell {
    let right_weights: BTreeMap<&Ticker, f64> = right
        .holdings
        .iter()
        .map(|line| (&line.ticker, line.weight))
        .collect();

    // Summed in ticker order so the result is independent of argument order.
    let mut pairs: Vec<(Ticker, f64)> = left
        .holdings
        .iter()
        .filter_map(|line| {
            right_weights
                .get(&line.ticker)
                .map(|weight| (line.ticker.clone(), line.weight + weight))
        })
        .collect();
    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
    let combined_weight = pairs.iter().map(|(_, weight)| weight).sum();
    let shared: Vec<Ticker> = pairs.into_iter().map(|(ticker, _)| ticker).collect();

    let (first, second) = ordered(&left.fund, &right.fund);
    OverlapCell {
        first: first.clone(),
        second: second.clone(),
        count: shared.len(),
        shared,
        combined_weight,
    }
}

fn ordered<'a>(left: &'a FundCode, right: &'a FundCode) -> (&'a FundCode, &'a FundCode) {
    if left <= right {
        (left, right)
    } else {
        (right, left)
    }
}
