//! In-memory holdings store keyed by (fund, quarter).
//!
//! Each fund owns a quarter-ordered index of immutable snapshots. `put` swaps
//! in a new `Arc` under the write lock; readers holding an older `Arc` keep a
//! valid snapshot until they drop it. Multi-snapshot reads (latest plus prior,
//! latest across funds) happen under one read lock, so analysis never sees a
//! half-applied replacement.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{FundCode, PortfolioSnapshot, Quarter};

/// A fund's latest snapshot and the one chronologically before it.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPair {
    pub latest: Arc<PortfolioSnapshot>,
    pub prior: Option<Arc<PortfolioSnapshot>>,
}

#[derive(Debug, Default)]
struct RepositoryInner {
    funds: HashMap<FundCode, BTreeMap<Quarter, Arc<PortfolioSnapshot>>>,
}

impl RepositoryInner {
    fn quarters(&self, fund: &FundCode) -> Option<&BTreeMap<Quarter, Arc<PortfolioSnapshot>>> {
        self.funds.get(fund)
    }

    fn latest(&self, fund: &FundCode) -> Option<Arc<PortfolioSnapshot>> {
        self.quarters(fund)
            .and_then(|by_quarter| by_quarter.values().next_back())
            .cloned()
    }

    fn prior_to(&self, fund: &FundCode, quarter: Quarter) -> Option<Arc<PortfolioSnapshot>> {
        self.quarters(fund)
            .and_then(|by_quarter| by_quarter.range(..quarter).next_back())
            .map(|(_, snapshot)| Arc::clone(snapshot))
    }
}

/// Thread-safe snapshot store. Cloning shares the underlying store.
#[derive(Debug, Clone, Default)]
pub struct HoldingsRepository {
    inner: Arc<RwLock<RepositoryInner>>,
}

impl HoldingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RepositoryInner> {
        self.inner
            .read()
            .expect("holdings repository lock should not be poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, RepositoryInner> {
        self.inner
            .write()
            .expect("holdings repository lock should not be poisoned")
    }

    /// Stores `snapshot`, replacing (never merging) any snapshot with the same
    /// (fund, quarter) key. Returns the replaced snapshot.
    pub fn put(&self, snapshot: PortfolioSnapshot) -> Option<Arc<PortfolioSnapshot>> {
        let fund = snapshot.fund.clone();
        let quarter = snapshot.quarter;
        self.write()
            .funds
            .entry(fund)
            .or_default()
            .insert(quarter, Arc::new(snapshot))
    }

    pub fn get(&self, fund: &FundCode, quarter: Quarter) -> Option<Arc<PortfolioSnapshot>> {
        self.read()
            .quarters(fund)
            .and_then(|by_quarter| by_quarter.get(&quarter))
            .cloned()
    }

    /// Snapshot for the fund's most recent quarter.
    pub fn latest(&self, fund: &FundCode) -> Option<Arc<PortfolioSnapshot>> {
        self.read().latest(fund)
    }

    /// The fund's snapshot for the closest quarter strictly before `quarter`.
    pub fn prior_to(&self, fund: &FundCode, quarter: Quarter) -> Option<Arc<PortfolioSnapshot>> {
        self.read().prior_to(fund, quarter)
    }

    /// Latest snapshot and its predecessor, read together.
    pub fn latest_with_prior(&self, fund: &FundCode) -> Option<SnapshotPair> {
        let inner = self.read();
        let latest = inner.latest(fund)?;
        let prior = inner.prior_to(fund, latest.quarter);
        Some(SnapshotPair { latest, prior })
    }

    /// Latest snapshot of every listed fund that has one, read together and
    /// returned in `funds` order.
    pub fn latest_for(&self, funds: &[FundCode]) -> Vec<Arc<PortfolioSnapshot>> {
        let inner = self.read();
        funds.iter().filter_map(|fund| inner.latest(fund)).collect()
    }

    /// Up to `count` most recent snapshots, newest first.
    pub fn recent(&self, fund: &FundCode, count: usize) -> Vec<Arc<PortfolioSnapshot>> {
        self.read()
            .quarters(fund)
            .map(|by_quarter| by_quarter.values().rev().take(count).cloned().collect())
            .unwrap_or_default()
    }

    /// Quarters held for the fund, oldest first.
    pub fn quarters(&self, fund: &FundCode) -> Vec<Quarter> {
        self.read()
            .quarters(fund)
            .map(|by_quarter| by_quarter.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Funds with at least one snapshot, in code order.
    pub fn funds(&self) -> Vec<FundCode> {
        let mut funds: Vec<FundCode> = self
            .read()
            .funds
            .iter()
            .filter(|(_, by_quarter)| !by_quarter.is_empty())
            .map(|(fund, _)| fund.clone())
            .collect();
        funds.sort();
        funds
    }

    /// Total number of stored snapshots.
    pub fn len(&self) -> usize {
        self.read().funds.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, Ticker};

    fn snapshot(fund: &str, quarter: &str, ticker: &str, value: u64) -> PortfolioSnapshot {
        PortfolioSnapshot::new(
            FundCode::parse(fund).expect("valid fund"),
            Quarter::parse(quarter).expect("valid quarter"),
            vec![Position::resolved(
                Ticker::parse(ticker).expect("valid ticker"),
                ticker,
                "Technology",
                10,
                value,
            )],
        )
        .expect("valid snapshot")
    }

    #[test]
    fn prior_to_skips_gaps_and_ignores_later_quarters() {
        let repository = HoldingsRepository::new();
        let fund = FundCode::parse("TCI").expect("valid fund");
        repository.put(snapshot("TCI", "Q1 2024", "V", 10));
        repository.put(snapshot("TCI", "Q4 2024", "V", 30));
        repository.put(snapshot("TCI", "Q2 2025", "V", 40));

        let q4 = Quarter::parse("Q4 2024").expect("valid quarter");
        let prior = repository.prior_to(&fund, q4).expect("earlier snapshot");
        assert_eq!(prior.quarter.to_string(), "Q1 2024");

        let q1 = Quarter::parse("Q1 2024").expect("valid quarter");
        assert!(repository.prior_to(&fund, q1).is_none());
    }

    #[test]
    fn recent_is_newest_first_and_bounded() {
        let repository = HoldingsRepository::new();
        let fund = FundCode::parse("AKO").expect("valid fund");
        for quarter in ["Q1 2024", "Q2 2024", "Q3 2024"] {
            repository.put(snapshot("AKO", quarter, "MA", 5));
        }

        let recent: Vec<String> = repository
            .recent(&fund, 2)
            .iter()
            .map(|snapshot| snapshot.quarter.to_string())
            .collect();
        assert_eq!(recent, ["Q3 2024", "Q2 2024"]);
        assert_eq!(repository.len(), 3);
    }
}
