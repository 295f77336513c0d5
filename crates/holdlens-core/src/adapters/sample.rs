use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::debug;

use crate::filing_source::{
    FilingError, FilingPayload, FilingRef, FilingRequest, FilingSource, RawFiling, RawPosition,
};
use crate::{Cik, CoreError, Quarter, SourceId};

const BUNDLED_SAMPLE: &str = include_str!("../../data/sample_filings.json");

#[derive(Debug, Deserialize)]
struct SampleFile {
    filings: Vec<SampleFiling>,
}

#[derive(Debug, Clone, Deserialize)]
struct SampleFiling {
    cik: Cik,
    quarter: Quarter,
    report_date: String,
    positions: Vec<RawPosition>,
}

impl SampleFiling {
    fn filing_ref(&self) -> FilingRef {
        FilingRef {
            accession: format!(
                "SAMPLE-{}-{}Q{}",
                self.cik.unpadded(),
                self.quarter.year(),
                self.quarter.number()
            ),
            form: String::from("13F-HR"),
            filed_on: self.report_date.clone(),
            report_date: self.report_date.clone(),
            quarter: self.quarter,
        }
    }
}

/// Offline filing source over a fixed dataset of already-tabular disclosures.
#[derive(Debug, Clone)]
pub struct SampleFilingSource {
    filings: BTreeMap<(Cik, Quarter), SampleFiling>,
}

impl SampleFilingSource {
    /// Q3 and Q4 2024 disclosures for the five bundled funds.
    pub fn bundled() -> Result<Self, CoreError> {
        Self::from_json_str(BUNDLED_SAMPLE)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let file: SampleFile = serde_json::from_str(json)?;
        let filings = file
            .filings
            .into_iter()
            .map(|filing| ((filing.cik.clone(), filing.quarter), filing))
            .collect();
        Ok(Self { filings })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Quarters held for `cik`, oldest first.
    pub fn quarters(&self, cik: &Cik) -> Vec<Quarter> {
        self.filings
            .keys()
            .filter(|(key_cik, _)| key_cik == cik)
            .map(|(_, quarter)| *quarter)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.filings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filings.is_empty()
    }
}

impl FilingSource for SampleFilingSource {
    fn id(&self) -> SourceId {
        SourceId::Sample
    }

    fn fetch<'a>(
        &'a self,
        req: FilingRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawFiling, FilingError>> + Send + 'a>> {
        Box::pin(async move {
            req.quarter
                .ensure_not_future(OffsetDateTime::now_utc().date())?;

            let Some(filing) = self.filings.get(&(req.cik.clone(), req.quarter)) else {
                debug!(cik = %req.cik, quarter = %req.quarter, "no sample filing for quarter");
                return Err(FilingError::not_found(format!(
                    "sample dataset holds no 13F for CIK {} {}",
                    req.cik, req.quarter
                )));
            };

            Ok(RawFiling {
                source: SourceId::Sample,
                cik: req.cik,
                quarter: req.quarter,
                filing: filing.filing_ref(),
                payload: FilingPayload::Positions(filing.positions.clone()),
            })
        })
    }

    fn list_filings<'a>(
        &'a self,
        cik: Cik,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FilingRef>, FilingError>> + Send + 'a>> {
        Box::pin(async move {
            Ok(self
                .filings
                .iter()
                .rev()
                .filter(|((key_cik, _), _)| key_cik == &cik)
                .map(|(_, filing)| filing.filing_ref())
                .take(limit)
                .collect())
        })
    }
}
