//! Caller-side ingestion pipeline: fetch → normalize → put.
//!
//! Sources and the normalizer never retry. The [`Ingestor`] wraps each fetch
//! in bounded backoff for `RateLimited`/`Unavailable` failures, runs one task
//! per fund, and reports every (fund, quarter) outcome instead of aborting the
//! run on the first failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::filing_source::{FilingError, FilingErrorKind, FilingRequest, FilingSource};
use crate::normalizer::Normalizer;
use crate::repository::HoldingsRepository;
use crate::retry::RetryConfig;
use crate::{Fund, FundCode, Quarter, SourceId};

/// What happened to one (fund, quarter) ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestStatus {
    Stored {
        accession: Option<String>,
        holdings: usize,
        total_value: u64,
        /// An earlier snapshot with the same key was replaced.
        replaced: bool,
    },
    /// The fund filed nothing for the period.
    NotFound,
    Failed {
        kind: FilingErrorKind,
        code: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub fund: FundCode,
    /// `None` when the fund's filing list itself could not be read.
    pub quarter: Option<Quarter>,
    pub attempts: u32,
    #[serde(flatten)]
    pub status: IngestStatus,
}

impl IngestOutcome {
    fn failed(
        fund: FundCode,
        quarter: Option<Quarter>,
        attempts: u32,
        error: &FilingError,
    ) -> Self {
        Self {
            fund,
            quarter,
            attempts,
            status: IngestStatus::Failed {
                kind: error.kind(),
                code: error.code(),
                message: error.message().to_owned(),
            },
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self.status, IngestStatus::Stored { .. })
    }
}

/// Outcomes of one ingestion run, ordered by fund code then quarter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub source: Option<SourceId>,
    pub outcomes: Vec<IngestOutcome>,
}

impl IngestReport {
    pub fn stored(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_stored()).count()
    }

    pub fn not_found(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == IngestStatus::NotFound)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &IngestOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, IngestStatus::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Drives one filing source into one repository.
#[derive(Clone)]
pub struct Ingestor {
    source: Arc<dyn FilingSource>,
    normalizer: Normalizer,
    repository: HoldingsRepository,
    retry: RetryConfig,
    fetch_timeout: Option<Duration>,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn FilingSource>,
        normalizer: Normalizer,
        repository: HoldingsRepository,
    ) -> Self {
        Self {
            source,
            normalizer,
            repository,
            retry: RetryConfig::default(),
            fetch_timeout: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Per-attempt budget handed to the source with every request.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn repository(&self) -> &HoldingsRepository {
        &self.repository
    }

    /// Ingests one fund for one quarter.
    pub async fn ingest_one(&self, fund: &Fund, quarter: Quarter) -> IngestOutcome {
        let request = match FilingRequest::new(fund.cik.clone(), quarter) {
            Ok(request) => match self.fetch_timeout {
                Some(timeout) => request.with_timeout(timeout),
                None => request,
            },
            Err(error) => {
                return IngestOutcome::failed(fund.code.clone(), Some(quarter), 0, &error);
            }
        };

        let label = format!("{} {quarter}", fund.code);
        let (fetched, attempts) = self
            .retrying(&label, || self.source.fetch(request.clone()))
            .await;
        let raw = match fetched {
            Ok(raw) => raw,
            Err(error) if error.kind() == FilingErrorKind::NotFound => {
                debug!(fund = %fund.code, %quarter, "no filing for quarter");
                return IngestOutcome {
                    fund: fund.code.clone(),
                    quarter: Some(quarter),
                    attempts,
                    status: IngestStatus::NotFound,
                };
            }
            Err(error) => {
                warn!(
                    fund = %fund.code,
                    %quarter,
                    code = error.code(),
                    %error,
                    "filing fetch failed"
                );
                return IngestOutcome::failed(fund.code.clone(), Some(quarter), attempts, &error);
            }
        };

        let snapshot = match self.normalizer.normalize(&raw) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(fund = %fund.code, %quarter, code = error.code(), %error, "filing rejected");
                return IngestOutcome::failed(fund.code.clone(), Some(quarter), attempts, &error);
            }
        };

        let accession = snapshot.accession.clone();
        let holdings = snapshot.len();
        let total_value = snapshot.total_value;
        let replaced = self.repository.put(snapshot).is_some();
        info!(
            fund = %fund.code,
            %quarter,
            source = %raw.source,
            holdings,
            total_value,
            replaced,
            "stored holdings snapshot"
        );

        IngestOutcome {
            fund: fund.code.clone(),
            quarter: Some(quarter),
            attempts,
            status: IngestStatus::Stored {
                accession,
                holdings,
                total_value,
                replaced,
            },
        }
    }

    /// Ingests every listed quarter for every fund, one task per fund.
    pub async fn ingest(&self, funds: &[Fund], quarters: &[Quarter]) -> IngestReport {
        let mut tasks = JoinSet::new();
        for fund in funds {
            let ingestor = self.clone();
            let fund = fund.clone();
            let quarters = quarters.to_vec();
            tasks.spawn(async move {
                let mut outcomes = Vec::with_capacity(quarters.len());
                for quarter in quarters {
                    outcomes.push(ingestor.ingest_one(&fund, quarter).await);
                }
                outcomes
            });
        }
        self.collect(tasks).await
    }

    /// Ingests each fund's `count` most recent filed quarters, as reported by
    /// the source's filing list.
    pub async fn ingest_recent(&self, funds: &[Fund], count: usize) -> IngestReport {
        let mut tasks = JoinSet::new();
        for fund in funds {
            let ingestor = self.clone();
            let fund = fund.clone();
            tasks.spawn(async move { ingestor.ingest_recent_for(&fund, count).await });
        }
        self.collect(tasks).await
    }

    async fn ingest_recent_for(&self, fund: &Fund, count: usize) -> Vec<IngestOutcome> {
        // Amendments share a quarter with their original, so over-fetch.
        let limit = count.saturating_mul(4);
        let label = format!("{} filing list", fund.code);
        let (listed, attempts) = self
            .retrying(&label, || self.source.list_filings(fund.cik.clone(), limit))
            .await;
        let filings = match listed {
            Ok(filings) => filings,
            Err(error) => {
                warn!(fund = %fund.code, code = error.code(), %error, "filing list failed");
                return vec![IngestOutcome::failed(fund.code.clone(), None, attempts, &error)];
            }
        };

        let mut quarters: Vec<Quarter> = Vec::with_capacity(count);
        for filing in filings {
            if quarters.len() == count {
                break;
            }
            if !quarters.contains(&filing.quarter) {
                quarters.push(filing.quarter);
            }
        }
        if quarters.is_empty() {
            debug!(fund = %fund.code, "source lists no 13F filings");
        }

        let mut outcomes = Vec::with_capacity(quarters.len());
        for quarter in quarters {
            outcomes.push(self.ingest_one(fund, quarter).await);
        }
        outcomes
    }

    async fn collect(&self, mut tasks: JoinSet<Vec<IngestOutcome>>) -> IngestReport {
        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(fund_outcomes) => outcomes.extend(fund_outcomes),
                Err(error) => warn!(%error, "ingestion task aborted"),
            }
        }
        outcomes.sort_by(|left, right| {
            left.fund
                .cmp(&right.fund)
                .then_with(|| left.quarter.cmp(&right.quarter))
        });

        IngestReport {
            source: Some(self.source.id()),
            outcomes,
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or the retry
    /// budget runs out. Returns the final result and the attempt count.
    async fn retrying<T, F, Fut>(
        &self,
        label: &str,
        mut operation: F,
    ) -> (Result<T, FilingError>, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FilingError>>,
    {
        let mut attempt = 0_u32;
        loop {
            match operation().await {
                Ok(value) => return (Ok(value), attempt + 1),
                Err(error) if self.retry.should_retry(&error, attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        request = label,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        code = error.code(),
                        "retrying after transient source error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return (Err(error), attempt + 1),
            }
        }
    }
}
