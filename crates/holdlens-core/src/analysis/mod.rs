//! # Analysis Engine
//!
//! Read-only analytics over the snapshots held in a [`HoldingsRepository`].
//!
//! | Operation | Input | Result |
//! |-----------|-------|--------|
//! | [`AnalysisEngine::top_holdings`] | fund, n | [`TopHoldings`] |
//! | [`AnalysisEngine::sector_allocation`] | fund | [`SectorAllocation`] |
//! | [`AnalysisEngine::position_changes`] | fund | [`PositionChanges`] |
//! | [`AnalysisEngine::overlap_matrix`] | funds | [`OverlapMatrix`] |
//! | [`AnalysisEngine::conviction`] | ticker | [`ConvictionScore`] |
//!
//! Every submodule exposes the underlying pure function over plain
//! snapshots. The engine only resolves which snapshots to feed them, reading
//! each set under a single repository lock. Missing data never raises:
//! single-fund operations return `None` (or [`PositionChanges::NoData`]) and
//! multi-fund operations list what was absent.

pub mod changes;
pub mod conviction;
pub mod overlap;
pub mod sectors;
pub mod top_holdings;

use std::sync::Arc;

pub use changes::{ChangeAction, ChangeReport, PositionChange, PositionChanges};
pub use conviction::ConvictionScore;
pub use overlap::{OverlapCell, OverlapMatrix};
pub use sectors::{SectorAllocation, SectorWeight};
pub use top_holdings::TopHoldings;

use crate::config::AnalysisConfig;
use crate::reference::ReferenceData;
use crate::repository::HoldingsRepository;
use crate::{FundCode, Ticker, ValidationError};

/// Analytics facade bound to one repository, reference table and config.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    repository: HoldingsRepository,
    reference: Arc<ReferenceData>,
    config: AnalysisConfig,
}

impl AnalysisEngine {
    pub fn new(
        repository: HoldingsRepository,
        reference: Arc<ReferenceData>,
        config: AnalysisConfig,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            repository,
            reference,
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn top_holdings(&self, fund: &FundCode, count: usize) -> Option<TopHoldings> {
        self.repository
            .latest(fund)
            .map(|snapshot| top_holdings::top_holdings(&snapshot, count))
    }

    pub fn sector_allocation(&self, fund: &FundCode) -> Option<SectorAllocation> {
        self.repository
            .latest(fund)
            .map(|snapshot| sectors::sector_allocation(&snapshot))
    }

    /// Latest snapshot diffed against the one before it.
    pub fn position_changes(&self, fund: &FundCode) -> PositionChanges {
        let Some(pair) = self.repository.latest_with_prior(fund) else {
            return PositionChanges::NoData { fund: fund.clone() };
        };
        let Some(prior) = pair.prior else {
            return PositionChanges::NoPriorData {
                fund: fund.clone(),
                current_quarter: pair.latest.quarter,
            };
        };

        PositionChanges::Compared(changes::position_changes(
            &prior,
            &pair.latest,
            self.config.materiality_threshold,
            self.config.include_unchanged,
        ))
    }

    /// Overlap between the latest snapshots of `funds`. An empty slice means
    /// every tracked fund.
    pub fn overlap_matrix(&self, funds: &[FundCode]) -> OverlapMatrix {
        let funds = self.universe(funds);
        let snapshots = self.repository.latest_for(&funds);
        let missing = funds
            .iter()
            .filter(|fund| snapshots.iter().all(|snapshot| &snapshot.fund != *fund))
            .cloned()
            .collect();
        overlap::overlap_matrix(snapshots.iter().map(Arc::as_ref), missing)
    }

    /// Scores for every ticker held by any tracked fund, ranked.
    pub fn conviction_scores(&self) -> Vec<ConvictionScore> {
        let snapshots = self.repository.latest_for(&self.reference.fund_codes());
        conviction::conviction_scores(
            snapshots.iter().map(Arc::as_ref),
            self.config.high_conviction_min_holders,
        )
    }

    /// Score for one ticker, `None` when no tracked fund holds it.
    pub fn conviction(&self, ticker: &Ticker) -> Option<ConvictionScore> {
        self.conviction_scores()
            .into_iter()
            .find(|score| &score.ticker == ticker)
    }

    /// Tickers held by at least the configured number of funds, ranked.
    pub fn high_conviction(&self) -> Vec<ConvictionScore> {
        self.conviction_scores()
            .into_iter()
            .filter(|score| score.high_conviction)
            .collect()
    }

    fn universe(&self, funds: &[FundCode]) -> Vec<FundCode> {
        if funds.is_empty() {
            return self.reference.fund_codes();
        }
        let mut unique: Vec<FundCode> = Vec::with_capacity(funds.len());
        for fund in funds {
            if !unique.contains(fund) {
                unique.push(fund.clone());
            }
        }
        unique
    }
}
