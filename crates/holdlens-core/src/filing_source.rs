//! Filing source contract and request/response types.
//!
//! A [`FilingSource`] turns an (entity identifier, reporting quarter) pair into
//! the raw disclosure as published, or a [`FilingError`] whose
//! [`FilingErrorKind`] tells the caller what to do next:
//!
//! | Kind | Meaning | Retry? |
//! |------|---------|--------|
//! | `NotFound` | No filing exists for that period | no |
//! | `Unavailable` | Source unreachable or timed out | yes, with backoff |
//! | `RateLimited` | Source is throttling this client | yes, with backoff |
//! | `MalformedFiling` | Payload cannot be parsed into holdings | no |
//! | `InvalidRequest` | Caller supplied an unusable request | no |
//!
//! Sources never retry internally and never cache. Retry policy belongs to the
//! caller (see [`crate::ingest`]).

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Cik, Quarter, SourceId, ValidationError};

/// Failure classification shared by sources and the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingErrorKind {
    NotFound,
    Unavailable,
    RateLimited,
    MalformedFiling,
    InvalidRequest,
}

/// Structured filing error. Every failure is distinguishable by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingError {
    kind: FilingErrorKind,
    message: String,
}

impl FilingError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FilingErrorKind::NotFound, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FilingErrorKind::Unavailable, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FilingErrorKind::RateLimited, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FilingErrorKind::MalformedFiling, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(FilingErrorKind::InvalidRequest, message)
    }

    fn new(kind: FilingErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> FilingErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Only transient source conditions are worth another attempt.
    pub const fn retryable(&self) -> bool {
        matches!(
            self.kind,
            FilingErrorKind::Unavailable | FilingErrorKind::RateLimited
        )
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FilingErrorKind::NotFound => "filing.not_found",
            FilingErrorKind::Unavailable => "filing.unavailable",
            FilingErrorKind::RateLimited => "filing.rate_limited",
            FilingErrorKind::MalformedFiling => "filing.malformed",
            FilingErrorKind::InvalidRequest => "filing.invalid_request",
        }
    }
}

impl Display for FilingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FilingError {}

impl From<ValidationError> for FilingError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_request(error.to_string())
    }
}

/// Request for one entity's filing covering one quarter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingRequest {
    pub cik: Cik,
    pub quarter: Quarter,
    /// Overall budget for the fetch; expiry surfaces as `Unavailable`.
    pub timeout: Option<Duration>,
}

impl FilingRequest {
    /// Builds a request, rejecting quarters that lie in the future.
    pub fn new(cik: Cik, quarter: Quarter) -> Result<Self, FilingError> {
        quarter.ensure_not_future(OffsetDateTime::now_utc().date())?;
        Ok(Self {
            cik,
            quarter,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Reference to one 13F filing in a source's index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRef {
    pub accession: String,
    pub form: String,
    pub filed_on: String,
    pub report_date: String,
    pub quarter: Quarter,
}

impl FilingRef {
    pub fn is_amendment(&self) -> bool {
        self.form.ends_with("/A")
    }
}

/// One disclosed row exactly as the source reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPosition {
    pub issuer: String,
    pub cusip: String,
    /// Share (or principal) amount; `None` when the row omits it.
    #[serde(default)]
    pub shares: Option<u64>,
    /// Market value in whole US dollars.
    #[serde(default)]
    pub value_usd: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put_call: Option<String>,
}

/// Disclosure payload as delivered by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilingPayload {
    /// 13F information table XML document, unparsed.
    InformationTable(String),
    /// Rows already in tabular form.
    Positions(Vec<RawPosition>),
}

/// Raw filing as published for one entity and quarter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFiling {
    pub source: SourceId,
    pub cik: Cik,
    pub quarter: Quarter,
    pub filing: FilingRef,
    pub payload: FilingPayload,
}

/// Filing source adapter contract.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; ingestion shares one source across
/// concurrent per-fund pipelines.
pub trait FilingSource: Send + Sync {
    /// Returns the source identifier.
    fn id(&self) -> SourceId;

    /// Fetches the filing covering `req.quarter` for `req.cik`.
    ///
    /// # Errors
    ///
    /// Returns [`FilingError`] with kind:
    /// - `NotFound` when the entity filed nothing for that period
    /// - `Unavailable` when the source is unreachable or the timeout expires
    /// - `RateLimited` when the source throttles the client
    /// - `MalformedFiling` when the filing index cannot be read
    fn fetch<'a>(
        &'a self,
        req: FilingRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawFiling, FilingError>> + Send + 'a>>;

    /// Lists up to `limit` most recent 13F filings for `cik`, newest first.
    fn list_filings<'a>(
        &'a self,
        cik: Cik,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FilingRef>, FilingError>> + Send + 'a>>;
}
