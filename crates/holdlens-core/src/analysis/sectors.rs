use std::collections::BTreeMap;

use serde::Serialize;

use crate::{FundCode, PortfolioSnapshot, Quarter};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorWeight {
    pub sector: String,
    pub weight: f64,
    pub market_value: u64,
    pub holdings: usize,
}

/// Sector tag → summed weight for one snapshot. Weights sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorAllocation {
    pub fund: FundCode,
    pub quarter: Quarter,
    /// Weight descending, sector name ascending on ties.
    pub sectors: Vec<SectorWeight>,
}

impl SectorAllocation {
    pub fn weight(&self, sector: &str) -> Option<f64> {
        self.sectors
            .iter()
            .find(|entry| entry.sector == sector)
            .map(|entry| entry.weight)
    }

    pub fn weight_sum(&self) -> f64 {
        self.sectors.iter().map(|entry| entry.weight).sum()
    }

    pub fn as_map(&self) -> BTreeMap<&str, f64> {
        self.sectors
            .iter()
            .map(|entry| (entry.sector.as_str(), entry.weight))
            .collect()
    }
}

pub fn sector_allocation(snapshot: &PortfolioSnapshot) -> SectorAllocation {
    let mut by_sector: BTreeMap<&str, SectorWeight> = BTreeMap::new();
    for line in &snapshot.holdings {
        let entry = by_sector
            .entry(line.sector.as_str())
            .or_insert_with(|| SectorWeight {
                sector: line.sector.clone(),
                weight: 0.0,
                market_value: 0,
                holdings: 0,
            });
        entry.weight += line.weight;
        entry.market_value = entry.market_value.saturating_add(line.market_value);
        entry.holdings += 1;
    }

    let mut sectors: Vec<SectorWeight> = by_sector.into_values().collect();
    sectors.sort_by(|left, right| {
        right
            .weight
            .total_cmp(&left.weight)
            .then_with(|| left.sector.cmp(&right.sector))
    });

    SectorAllocation {
        fund: snapshot.fund.clone(),
        quarter: snapshot.quarter,
        sectors,
    }
}
