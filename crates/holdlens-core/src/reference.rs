//! Read-only reference tables: tracked funds, the CUSIP security master and the
//! issuer→sector lookup.
//!
//! Loaded once at startup and shared as `Arc<ReferenceData>`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Cik, CoreError, Cusip, Fund, FundCode, Ticker, ValidationError, SECTOR_OTHER};

const BUNDLED_REFERENCE: &str = include_str!("../data/reference.json");

/// Security master entry mapping a CUSIP to a tracked ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    pub cusip: Cusip,
    pub ticker: Ticker,
    pub issuer: String,
}

#[derive(Debug, Deserialize)]
struct ReferenceFile {
    funds: Vec<Fund>,
    #[serde(default)]
    securities: Vec<Security>,
    #[serde(default)]
    issuer_sectors: BTreeMap<String, String>,
}

/// Immutable reference tables with lookup indexes.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    funds: Vec<Fund>,
    securities: HashMap<Cusip, Security>,
    issuer_sectors: HashMap<String, String>,
}

impl ReferenceData {
    pub fn new(
        funds: Vec<Fund>,
        securities: Vec<Security>,
        issuer_sectors: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ValidationError> {
        let mut seen_codes = HashSet::with_capacity(funds.len());
        for fund in &funds {
            if !seen_codes.insert(fund.code.clone()) {
                return Err(ValidationError::DuplicateFund {
                    code: fund.code.to_string(),
                });
            }
        }

        let mut by_cusip = HashMap::with_capacity(securities.len());
        for security in securities {
            if by_cusip.contains_key(&security.cusip) {
                return Err(ValidationError::InvalidReference {
                    reason: format!("CUSIP {} is listed more than once", security.cusip),
                });
            }
            by_cusip.insert(security.cusip.clone(), security);
        }

        let issuer_sectors = issuer_sectors
            .into_iter()
            .map(|(issuer, sector)| (issuer_key(&issuer), sector))
            .collect();

        Ok(Self {
            funds,
            securities: by_cusip,
            issuer_sectors,
        })
    }

    /// Reference tables shipped with the crate (five tracked funds).
    pub fn bundled() -> Result<Self, CoreError> {
        Self::from_json_str(BUNDLED_REFERENCE)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let file: ReferenceFile = serde_json::from_str(json)?;
        Ok(Self::new(file.funds, file.securities, file.issuer_sectors)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Tracked funds in reference order.
    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    pub fn fund_codes(&self) -> Vec<FundCode> {
        self.funds.iter().map(|fund| fund.code.clone()).collect()
    }

    pub fn fund(&self, code: &FundCode) -> Option<&Fund> {
        self.funds.iter().find(|fund| &fund.code == code)
    }

    pub fn require_fund(&self, code: &FundCode) -> Result<&Fund, ValidationError> {
        self.fund(code).ok_or_else(|| ValidationError::UnknownFund {
            code: code.to_string(),
        })
    }

    pub fn fund_by_cik(&self, cik: &Cik) -> Option<&Fund> {
        self.funds.iter().find(|fund| &fund.cik == cik)
    }

    pub fn security(&self, cusip: &Cusip) -> Option<&Security> {
        self.securities.get(cusip)
    }

    /// Sector for an issuer name, `Other` when the issuer is not listed.
    pub fn sector_for_issuer(&self, issuer: &str) -> &str {
        self.issuer_sectors
            .get(&issuer_key(issuer))
            .map(String::as_str)
            .unwrap_or(SECTOR_OTHER)
    }
}

/// Case- and punctuation-insensitive issuer key.
fn issuer_key(issuer: &str) -> String {
    issuer
        .split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '&')
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}
