//! Runtime configuration for the filing source and the analysis engine.
//!
//! Nothing here is read from ambient globals after construction: callers build
//! (or load) a config once at startup and pass it to the components that need
//! it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

pub const USER_AGENT_ENV: &str = "HOLDLENS_EDGAR_USER_AGENT";
pub const TIMEOUT_ENV: &str = "HOLDLENS_EDGAR_TIMEOUT_MS";

/// SEC EDGAR access settings.
///
/// EDGAR's fair-access policy requires a descriptive `User-Agent` naming the
/// client and a contact address, and caps clients at 10 requests per second.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgarConfig {
    pub user_agent: String,
    pub submissions_base_url: String,
    pub archives_base_url: String,
    /// Per-HTTP-request timeout.
    pub request_timeout: Duration,
    /// Budget for one whole `fetch` when the request carries none.
    pub fetch_timeout: Duration,
    pub quota_window: Duration,
    pub quota_limit: u32,
}

impl EdgarConfig {
    pub fn new(user_agent: impl Into<String>) -> Result<Self, ValidationError> {
        let config = Self {
            user_agent: user_agent.into(),
            submissions_base_url: String::from("https://data.sec.gov"),
            archives_base_url: String::from("https://www.sec.gov/Archives/edgar/data"),
            request_timeout: Duration::from_secs(20),
            fetch_timeout: Duration::from_secs(90),
            quota_window: Duration::from_secs(1),
            quota_limit: 10,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads `HOLDLENS_EDGAR_USER_AGENT` (required) and
    /// `HOLDLENS_EDGAR_TIMEOUT_MS` (optional per-request timeout).
    pub fn from_env() -> Result<Self, ValidationError> {
        let user_agent = std::env::var(USER_AGENT_ENV).unwrap_or_default();
        let mut config = Self::new(user_agent)?;
        if let Some(timeout_ms) = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_millis(timeout_ms);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_urls(
        mut self,
        submissions_base_url: impl Into<String>,
        archives_base_url: impl Into<String>,
    ) -> Self {
        self.submissions_base_url = submissions_base_url.into();
        self.archives_base_url = archives_base_url.into();
        self
    }

    pub fn with_quota(mut self, quota_window: Duration, quota_limit: u32) -> Self {
        self.quota_window = quota_window;
        self.quota_limit = quota_limit;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_agent(&self.user_agent)?;
        if self.quota_limit == 0 {
            return Err(ValidationError::ZeroValue {
                field: "quota_limit",
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ValidationError::ZeroValue {
                field: "request_timeout",
            });
        }
        Ok(())
    }
}

/// A descriptive agent names the client and carries a contact e-mail.
fn validate_user_agent(user_agent: &str) -> Result<(), ValidationError> {
    let mut tokens = user_agent.split_whitespace();
    let has_client = tokens.next().is_some();
    let has_contact = user_agent
        .split_whitespace()
        .skip(1)
        .any(|token| token.contains('@') && token.contains('.'));
    if has_client && has_contact {
        return Ok(());
    }
    Err(ValidationError::InvalidUserAgent {
        value: user_agent.to_owned(),
    })
}

/// Tunables for the analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Relative share-count change at or beyond which a position counts as
    /// increased or reduced.
    pub materiality_threshold: f64,
    /// Holder count at which a ticker is flagged as high conviction.
    pub high_conviction_min_holders: usize,
    /// Emit `Unchanged` entries in position-change output.
    pub include_unchanged: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            materiality_threshold: 0.05,
            high_conviction_min_holders: 3,
            include_unchanged: false,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.materiality_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.materiality_threshold)
        {
            return Err(ValidationError::OutOfUnitRange {
                field: "materiality_threshold",
                value: self.materiality_threshold.to_string(),
            });
        }
        if self.high_conviction_min_holders == 0 {
            return Err(ValidationError::ZeroValue {
                field: "high_conviction_min_holders",
            });
        }
        Ok(())
    }
}
