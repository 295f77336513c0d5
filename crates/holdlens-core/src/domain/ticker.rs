use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Cusip, ValidationError};

const MAX_TICKER_LEN: usize = 15;
const MAX_KEY_LEN: usize = 32;

/// Security key used across snapshots.
///
/// Resolved positions carry their exchange ticker. Positions whose CUSIP has
/// no tracked ticker are keyed by the CUSIP itself so they still line up
/// across funds and quarters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Parse and normalize a ticker to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(ValidationError::TickerTooLong {
                len,
                max: MAX_TICKER_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphabetic() {
                return Err(ValidationError::TickerInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || ch == '.' || ch == '-';
            if !valid {
                return Err(ValidationError::TickerInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    /// Key for a security that could not be mapped to a tracked ticker.
    pub fn from_cusip(cusip: &Cusip) -> Self {
        Self(cusip.as_str().to_owned())
    }

    /// Key for a row whose identifier is not a well-formed CUSIP.
    ///
    /// Keeps ASCII alphanumerics (uppercased) and folds every other run into a
    /// single `-`. `None` when nothing usable is left.
    pub fn from_identifier(raw: &str) -> Option<Self> {
        let mut key = String::with_capacity(raw.len().min(MAX_KEY_LEN));
        for ch in raw.trim().chars() {
            if ch.is_ascii_alphanumeric() {
                key.push(ch.to_ascii_uppercase());
            } else if !key.is_empty() && !key.ends_with('-') {
                key.push('-');
            }
        }
        key.truncate(MAX_KEY_LEN);
        while key.ends_with('-') {
            key.pop();
        }
        (!key.is_empty()).then_some(Self(key))
    }

    /// Key for an option or principal-amount line on this security, kept
    /// apart from the share position (`V` → `V-CALL`).
    pub fn with_instrument(&self, instrument: &str) -> Self {
        Self(format!("{}-{instrument}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Ticker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Ticker {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match Self::parse(&value) {
            Ok(ticker) => Ok(ticker),
            Err(error) => Self::from_identifier(&value)
                .filter(|key| key.0 == value)
                .ok_or(error),
        }
    }
}

impl TryFrom<&str> for Ticker {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}
