use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifiers of the filing sources a snapshot can be ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Edgar,
    Sample,
}

impl SourceId {
    pub const ALL: [Self; 2] = [Self::Edgar, Self::Sample];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edgar => "edgar",
            Self::Sample => "sample",
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "edgar" => Ok(Self::Edgar),
            "sample" => Ok(Self::Sample),
            other => Err(format!(
                "invalid source '{other}', expected one of edgar, sample"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_identifier_back() {
        for source in SourceId::ALL {
            assert_eq!(source.as_str().parse::<SourceId>(), Ok(source));
        }
        assert_eq!(" EDGAR ".parse::<SourceId>(), Ok(SourceId::Edgar));
        assert!("yahoo".parse::<SourceId>().is_err());
    }
}
