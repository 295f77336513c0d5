use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::debug;

use crate::config::EdgarConfig;
use crate::filing_source::{
    FilingError, FilingErrorKind, FilingPayload, FilingRef, FilingRequest, FilingSource,
    RawFiling,
};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::throttling::RequestThrottle;
use crate::{Cik, Quarter, SourceId};

const FORM_13F: &str = "13F-HR";
const FORM_13F_AMENDMENT: &str = "13F-HR/A";

/// File names filers commonly give the information table, tried last.
const COMMON_INFO_TABLE_NAMES: [&str; 6] = [
    "Form13fInfoTable.xml",
    "form13fInfoTable.xml",
    "form13finfoTable.xml",
    "infotable.xml",
    "InfoTable.xml",
    "INFOTABLE.XML",
];

/// SEC EDGAR filing source.
///
/// One `fetch` walks the submissions index for the CIK, picks the 13F-HR
/// whose report date falls in the requested quarter, then locates and
/// downloads its information table. Every request carries the configured
/// `User-Agent` and waits for the shared request throttle.
#[derive(Clone)]
pub struct EdgarAdapter {
    config: EdgarConfig,
    http_client: Arc<dyn HttpClient>,
    throttle: RequestThrottle,
}

impl EdgarAdapter {
    pub fn new(config: EdgarConfig) -> Self {
        let http_client = Arc::new(ReqwestHttpClient::new(&config.user_agent));
        Self::with_http_client(config, http_client)
    }

    pub fn with_http_client(config: EdgarConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let throttle = RequestThrottle::from_config(&config);
        Self {
            config,
            http_client,
            throttle,
        }
    }

    pub fn config(&self) -> &EdgarConfig {
        &self.config
    }

    fn submissions_url(&self, cik: &Cik) -> String {
        format!(
            "{}/submissions/CIK{}.json",
            self.config.submissions_base_url.trim_end_matches('/'),
            cik.as_str()
        )
    }

    fn filing_folder_url(&self, cik: &Cik, accession: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.archives_base_url.trim_end_matches('/'),
            cik.unpadded(),
            accession.replace('-', "")
        )
    }

    async fn get(&self, url: &str) -> Result<String, FilingError> {
        self.throttle.acquire().await;

        let timeout_ms = u64::try_from(self.config.request_timeout.as_millis()).unwrap_or(u64::MAX);
        let request = HttpRequest::get(url)
            .with_header("User-Agent", &self.config.user_agent)
            .with_header("Accept", "application/json, application/xml, text/xml")
            .with_timeout_ms(timeout_ms);
        debug!(url, "requesting EDGAR document");

        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.timed_out() {
                FilingError::unavailable(format!("EDGAR request timed out: {}", error.message()))
            } else {
                FilingError::unavailable(format!("EDGAR transport error: {}", error.message()))
            }
        })?;

        if response.is_success() {
            return Ok(response.body);
        }
        match response.status {
            404 => Err(FilingError::not_found(format!("EDGAR has no document at {url}"))),
            // EDGAR answers 403 once a client exceeds its fair-access rate.
            403 | 429 => Err(FilingError::rate_limited(format!(
                "EDGAR throttled the request with status {}",
                response.status
            ))),
            status => Err(FilingError::unavailable(format!(
                "EDGAR returned status {status} for {url}"
            ))),
        }
    }

    /// Every 13F filing in the CIK's recent submissions, newest first.
    async fn thirteen_f_filings(&self, cik: &Cik) -> Result<Vec<FilingRef>, FilingError> {
        let body = self
            .get(&self.submissions_url(cik))
            .await
            .map_err(|error| match error.kind() {
                FilingErrorKind::NotFound => {
                    FilingError::not_found(format!("EDGAR has no submissions for CIK {cik}"))
                }
                _ => error,
            })?;

        let submissions: Submissions = serde_json::from_str(&body).map_err(|error| {
            FilingError::malformed(format!(
                "EDGAR submissions for CIK {cik} are not valid JSON: {error}"
            ))
        })?;

        Ok(thirteen_f_refs(submissions.filings.recent))
    }

    async fn fetch_filing(&self, req: &FilingRequest) -> Result<RawFiling, FilingError> {
        let filings = self.thirteen_f_filings(&req.cik).await?;
        let Some(filing) = select_filing(&filings, req.quarter) else {
            debug!(cik = %req.cik, quarter = %req.quarter, "no 13F filing for quarter");
            return Err(FilingError::not_found(format!(
                "CIK {} filed no 13F for {}",
                req.cik, req.quarter
            )));
        };

        let xml = self.locate_information_table(&req.cik, &filing).await?;
        debug!(
            cik = %req.cik,
            quarter = %req.quarter,
            accession = %filing.accession,
            bytes = xml.len(),
            "fetched information table"
        );

        Ok(RawFiling {
            source: SourceId::Edgar,
            cik: req.cik.clone(),
            quarter: req.quarter,
            filing,
            payload: FilingPayload::InformationTable(xml),
        })
    }

    async fn locate_information_table(
        &self,
        cik: &Cik,
        filing: &FilingRef,
    ) -> Result<String, FilingError> {
        let folder = self.filing_folder_url(cik, &filing.accession);
        let mut tried = HashSet::new();

        match self.get(&format!("{folder}/index.json")).await {
            Ok(body) => {
                let listing: FolderIndex = serde_json::from_str(&body).unwrap_or_else(|error| {
                    debug!(%folder, %error, "unreadable filing folder index");
                    FolderIndex::default()
                });
                let (named, others): (Vec<String>, Vec<String>) = listing
                    .directory
                    .item
                    .into_iter()
                    .map(|item| item.name)
                    .filter(|name| name.to_ascii_lowercase().ends_with(".xml"))
                    .partition(|name| looks_like_info_table(name));

                for name in named.into_iter().chain(others) {
                    if let Some(xml) = self.try_document(&folder, &name).await? {
                        if is_information_table(&xml) {
                            return Ok(xml);
                        }
                    }
                    tried.insert(name);
                }
            }
            Err(error) if error.kind() == FilingErrorKind::NotFound => {
                debug!(%folder, "filing folder has no index.json");
            }
            Err(error) => return Err(error),
        }

        for name in COMMON_INFO_TABLE_NAMES {
            if tried.contains(name) {
                continue;
            }
            if let Some(xml) = self.try_document(&folder, name).await? {
                if is_information_table(&xml) {
                    return Ok(xml);
                }
            }
        }

        Err(FilingError::malformed(format!(
            "filing {} has no information table",
            filing.accession
        )))
    }

    async fn try_document(&self, folder: &str, name: &str) -> Result<Option<String>, FilingError> {
        match self.get(&format!("{folder}/{name}")).await {
            Ok(body) => Ok(Some(body)),
            Err(error) if error.kind() == FilingErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl FilingSource for EdgarAdapter {
    fn id(&self) -> SourceId {
        SourceId::Edgar
    }

    fn fetch<'a>(
        &'a self,
        req: FilingRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawFiling, FilingError>> + Send + 'a>> {
        Box::pin(async move {
            req.quarter
                .ensure_not_future(OffsetDateTime::now_utc().date())?;

            let budget = req.timeout.unwrap_or(self.config.fetch_timeout);
            match tokio::time::timeout(budget, self.fetch_filing(&req)).await {
                Ok(result) => result,
                Err(_) => Err(FilingError::unavailable(format!(
                    "EDGAR fetch for CIK {} {} exceeded {} ms",
                    req.cik,
                    req.quarter,
                    budget.as_millis()
                ))),
            }
        })
    }

    fn list_filings<'a>(
        &'a self,
        cik: Cik,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FilingRef>, FilingError>> + Send + 'a>> {
        Box::pin(async move {
            let budget = self.config.fetch_timeout;
            let filings = tokio::time::timeout(budget, self.thirteen_f_filings(&cik))
                .await
                .map_err(|_| {
                    FilingError::unavailable(format!(
                        "EDGAR filing list for CIK {cik} exceeded {} ms",
                        budget.as_millis()
                    ))
                })??;
            Ok(filings.into_iter().take(limit).collect())
        })
    }
}

#[derive(Debug, Deserialize)]
struct Submissions {
    filings: SubmissionFilings,
}

#[derive(Debug, Deserialize)]
struct SubmissionFilings {
    recent: RecentFilings,
}

/// Column-oriented filing list as served by the submissions API.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    #[serde(default)]
    accession_number: Vec<String>,
    #[serde(default)]
    filing_date: Vec<String>,
    #[serde(default)]
    report_date: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FolderIndex {
    #[serde(default)]
    directory: FolderDirectory,
}

#[derive(Debug, Default, Deserialize)]
struct FolderDirectory {
    #[serde(default)]
    item: Vec<FolderItem>,
}

#[derive(Debug, Deserialize)]
struct FolderItem {
    name: String,
}

fn thirteen_f_refs(recent: RecentFilings) -> Vec<FilingRef> {
    let mut refs = Vec::new();
    for (index, form) in recent.form.iter().enumerate() {
        if form != FORM_13F && form != FORM_13F_AMENDMENT {
            continue;
        }
        let (Some(accession), Some(report_date)) = (
            recent.accession_number.get(index),
            recent.report_date.get(index),
        ) else {
            continue;
        };
        let Ok(quarter) = Quarter::from_report_date(report_date) else {
            debug!(%accession, %report_date, "skipping 13F with unreadable report date");
            continue;
        };

        refs.push(FilingRef {
            accession: accession.clone(),
            form: form.clone(),
            filed_on: recent.filing_date.get(index).cloned().unwrap_or_default(),
            report_date: report_date.clone(),
            quarter,
        });
    }

    refs.sort_by(|left, right| {
        right
            .filed_on
            .cmp(&left.filed_on)
            .then_with(|| right.accession.cmp(&left.accession))
    });
    refs
}

/// Latest original report for the quarter, else the latest amendment.
fn select_filing(filings: &[FilingRef], quarter: Quarter) -> Option<FilingRef> {
    let mut for_quarter = filings.iter().filter(|filing| filing.quarter == quarter);
    let first_original = for_quarter.clone().find(|filing| !filing.is_amendment());
    first_original.or_else(|| for_quarter.next()).cloned()
}

fn looks_like_info_table(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".xml")
        && lower
            .find("info")
            .is_some_and(|start| lower[start + 4..].contains("table"))
}

/// True when the document's root element is `informationTable`, whatever its
/// namespace prefix.
fn is_information_table(xml: &str) -> bool {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return element
                    .local_name()
                    .as_ref()
                    .eq_ignore_ascii_case(b"informationTable");
            }
            Ok(Event::Eof) | Err(_) => return false,
            Ok(_) => {}
        }
    }
}
