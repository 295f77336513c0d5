use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::{FundCode, HoldingLine, PortfolioSnapshot, Quarter, Ticker};

/// Quarter-over-quarter classification of one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    New,
    Sold,
    Increased,
    Reduced,
    Unchanged,
}

impl ChangeAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Sold => "SOLD",
            Self::Increased => "INCREASED",
            Self::Reduced => "REDUCED",
            Self::Unchanged => "UNCHANGED",
        }
    }
}

impl Display for ChangeAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionChange {
    pub ticker: Ticker,
    pub issuer: String,
    pub sector: String,
    pub action: ChangeAction,
    pub prior_shares: u64,
    pub current_shares: u64,
    pub prior_value: u64,
    pub current_value: u64,
    pub share_change: i64,
    /// Relative share change; `None` when the ticker is new.
    pub share_change_pct: Option<f64>,
    pub value_change: i64,
}

/// Diff between two snapshots of the same fund.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeReport {
    pub fund: FundCode,
    pub prior_quarter: Quarter,
    pub current_quarter: Quarter,
    /// Current value descending, then prior value descending, then ticker.
    pub changes: Vec<PositionChange>,
}

impl ChangeReport {
    pub fn count(&self, action: ChangeAction) -> usize {
        self.changes
            .iter()
            .filter(|change| change.action == action)
            .count()
    }

    pub fn get(&self, ticker: &Ticker) -> Option<&PositionChange> {
        self.changes.iter().find(|change| &change.ticker == ticker)
    }
}

/// Outcome of a position-change request.
///
/// Missing history is a normal result, never an error, and an empty
/// `Compared` report (nothing moved) stays distinct from `NoPriorData`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PositionChanges {
    /// The fund has no snapshot at all.
    NoData { fund: FundCode },
    /// Only one quarter is held, so there is nothing to compare against.
    NoPriorData { fund: FundCode, current_quarter: Quarter },
    Compared(ChangeReport),
}

impl PositionChanges {
    pub fn report(&self) -> Option<&ChangeReport> {
        match self {
            Self::Compared(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_no_prior_data(&self) -> bool {
        matches!(self, Self::NoPriorData { .. })
    }
}

/// Classifies a ticker from its prior and current share counts.
///
/// Present in both: a relative change at or beyond `threshold` counts as
/// increased or reduced, anything smaller as unchanged.
pub fn classify(
    prior_shares: Option<u64>,
    current_shares: Option<u64>,
    threshold: f64,
) -> Option<ChangeAction> {
    match (prior_shares, current_shares) {
        (None, None) => None,
        (Some(_), None) => Some(ChangeAction::Sold),
        (None, Some(_)) => Some(ChangeAction::New),
        (Some(prior), Some(current)) if prior == current => Some(ChangeAction::Unchanged),
        (Some(0), Some(_)) => Some(ChangeAction::New),
        (Some(prior), Some(current)) => {
            let pct = (current as f64 - prior as f64) / prior as f64;
            if pct >= threshold {
                Some(ChangeAction::Increased)
            } else if pct <= -threshold {
                Some(ChangeAction::Reduced)
            } else {
                Some(ChangeAction::Unchanged)
            }
        }
    }
}

/// Diffs `prior` against `current` ticker by ticker.
pub fn position_changes(
    prior: &PortfolioSnapshot,
    current: &PortfolioSnapshot,
    threshold: f64,
    include_unchanged: bool,
) -> ChangeReport {
    let tickers: BTreeSet<&Ticker> = prior
        .holdings
        .iter()
        .chain(&current.holdings)
        .map(|line| &line.ticker)
        .collect();

    let mut changes = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let before = prior.holding(ticker);
        let after = current.holding(ticker);
        let Some(action) = classify(
            before.map(|line| line.shares),
            after.map(|line| line.shares),
            threshold,
        ) else {
            continue;
        };
        if action == ChangeAction::Unchanged && !include_unchanged {
            continue;
        }
        changes.push(change_entry(ticker, action, before, after));
    }

    changes.sort_by(|left, right| {
        right
            .current_value
            .cmp(&left.current_value)
            .then_with(|| right.prior_value.cmp(&left.prior_value))
            .then_with(|| left.ticker.cmp(&right.ticker))
    });

    ChangeReport {
        fund: current.fund.clone(),
        prior_quarter: prior.quarter,
        current_quarter: current.quarter,
        changes,
    }
}

fn change_entry(
    ticker: &Ticker,
    action: ChangeAction,
    before: Option<&HoldingLine>,
    after: Option<&HoldingLine>,
) -> PositionChange {
    let prior_shares = before.map_or(0, |line| line.shares);
    let current_shares = after.map_or(0, |line| line.shares);
    let prior_value = before.map_or(0, |line| line.market_value);
    let current_value = after.map_or(0, |line| line.market_value);
    let described = after.or(before);

    PositionChange {
        ticker: ticker.clone(),
        issuer: described.map(|line| line.issuer.clone()).unwrap_or_default(),
        sector: described.map(|line| line.sector.clone()).unwrap_or_default(),
        action,
        prior_shares,
        current_shares,
        prior_value,
        current_value,
        share_change: signed_difference(current_shares, prior_shares),
        share_change_pct: (prior_shares > 0)
            .then(|| (current_shares as f64 - prior_shares as f64) / prior_shares as f64),
        value_change: signed_difference(current_value, prior_value),
    }
}

fn signed_difference(current: u64, prior: u64) -> i64 {
    let current = i64::try_from(current).unwrap_or(i64::MAX);
    let prior = i64::try_from(prior).unwrap_or(i64::MAX);
    current.saturating_sub(prior)
}
