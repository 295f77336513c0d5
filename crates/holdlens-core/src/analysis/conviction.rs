use std::collections::BTreeMap;

use serde::Serialize;

use crate::{FundCode, PortfolioSnapshot, Ticker};

/// How widely and how heavily the tracked funds hold one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvictionScore {
    pub ticker: Ticker,
    pub issuer: String,
    pub sector: String,
    pub holder_count: usize,
    /// Mean portfolio weight among holding funds only.
    pub mean_weight: f64,
    /// Holding funds in code order.
    pub holders: Vec<FundCode>,
    pub total_shares: u64,
    pub total_value: u64,
    pub high_conviction: bool,
}

#[derive(Debug)]
struct Accumulator<'a> {
    issuer: &'a str,
    sector: &'a str,
    holders: Vec<FundCode>,
    weight_sum: f64,
    total_shares: u64,
    total_value: u64,
}

/// Scores every ticker held in `snapshots` (one per fund).
///
/// Ordered by holder count descending, then mean weight descending, then
/// ticker ascending. A ticker is high conviction when at least `min_holders`
/// funds hold it.
pub fn conviction_scores<'a>(
    snapshots: impl IntoIterator<Item = &'a PortfolioSnapshot>,
    min_holders: usize,
) -> Vec<ConvictionScore> {
    let mut by_ticker: BTreeMap<&'a Ticker, Accumulator<'a>> = BTreeMap::new();
    for snapshot in snapshots {
        for line in &snapshot.holdings {
            let entry = by_ticker.entry(&line.ticker).or_insert_with(|| Accumulator {
                issuer: &line.issuer,
                sector: &line.sector,
                holders: Vec::new(),
                weight_sum: 0.0,
                total_shares: 0,
                total_value: 0,
            });
            if entry.holders.contains(&snapshot.fund) {
                continue;
            }
            entry.holders.push(snapshot.fund.clone());
            entry.weight_sum += line.weight;
            entry.total_shares = entry.total_shares.saturating_add(line.shares);
            entry.total_value = entry.total_value.saturating_add(line.market_value);
        }
    }

    let mut scores: Vec<ConvictionScore> = by_ticker
        .into_iter()
        .map(|(ticker, mut entry)| {
            entry.holders.sort();
            let holder_count = entry.holders.len();
            ConvictionScore {
                ticker: ticker.clone(),
                issuer: entry.issuer.to_owned(),
                sector: entry.sector.to_owned(),
                holder_count,
                mean_weight: entry.weight_sum / holder_count as f64,
                holders: entry.holders,
                total_shares: entry.total_shares,
                total_value: entry.total_value,
                high_conviction: holder_count >= min_holders,
            }
        })
        .collect();

    scores.sort_by(|left, right| {
        right
            .holder_count
            .cmp(&left.holder_count)
            .then_with(|| right.mean_weight.total_cmp(&left.mean_weight))
            .then_with(|| left.ticker.cmp(&right.ticker))
    });
    scores
}
