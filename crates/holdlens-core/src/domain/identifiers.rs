use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const CIK_LEN: usize = 10;
const CUSIP_LEN: usize = 9;
const MAX_FUND_CODE_LEN: usize = 16;

/// SEC Central Index Key, normalized to its zero-padded 10-digit form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cik(String);

impl Cik {
    /// Parse a CIK with or without its leading zeros.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCik);
        }
        if !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ValidationError::CikNotNumeric {
                value: trimmed.to_owned(),
            });
        }
        if trimmed.len() > CIK_LEN {
            return Err(ValidationError::CikTooLong {
                len: trimmed.len(),
                max: CIK_LEN,
            });
        }
        if trimmed.bytes().all(|byte| byte == b'0') {
            return Err(ValidationError::CikZero);
        }

        Ok(Self(format!("{trimmed:0>width$}", width = CIK_LEN)))
    }

    /// Zero-padded form used by the submissions API.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Form without leading zeros used by archive folder paths.
    pub fn unpadded(&self) -> &str {
        self.0.trim_start_matches('0')
    }
}

impl Display for Cik {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Cik {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cik> for String {
    fn from(value: Cik) -> Self {
        value.0
    }
}

/// Nine-character CUSIP security identifier as disclosed in 13F tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cusip(String);

impl Cusip {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        let valid = normalized.len() == CUSIP_LEN
            && normalized.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !valid {
            return Err(ValidationError::InvalidCusip {
                value: input.to_owned(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Cusip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Cusip {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cusip> for String {
    fn from(value: Cusip) -> Self {
        value.0
    }
}

/// Short code identifying a tracked fund (`TCI`, `LONEPINE`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FundCode(String);

impl FundCode {
    /// Parse and normalize a fund code to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        let valid = !normalized.is_empty()
            && normalized.len() <= MAX_FUND_CODE_LEN
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(ValidationError::InvalidFundCode {
                value: input.to_owned(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FundCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for FundCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for FundCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FundCode> for String {
    fn from(value: FundCode) -> Self {
        value.0
    }
}
