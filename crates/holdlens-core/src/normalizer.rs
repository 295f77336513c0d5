//! Raw filing → [`PortfolioSnapshot`] normalization.
//!
//! Rules applied to every disclosed row, in order:
//!
//! 1. Rows with a zero or missing share amount, or no market value, are
//!    dropped.
//! 2. The CUSIP is resolved against the security master. Unmatched rows are
//!    kept, keyed by CUSIP, in the `Unresolved` sector so totals reconcile. A
//!    malformed identifier is kept the same way under a key built from the
//!    raw identifier (or the issuer name when the identifier is blank).
//! 3. Resolved rows take their sector from the issuer→sector lookup, falling
//!    back to `Other`.
//! 4. Put/call option rows and principal-amount rows are keyed apart from the
//!    share position (`V-CALL`, `V-PRN`), so share counts stay comparable.
//! 5. Rows sharing a key are summed into one holding.
//!
//! A payload that cannot be parsed, or whose retained rows total zero market
//! value, fails with `MalformedFiling`. No partial snapshot is ever returned.

use std::collections::BTreeMap;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::filing_source::{FilingError, FilingPayload, RawFiling, RawPosition};
use crate::reference::ReferenceData;
use crate::{
    Cusip, PortfolioSnapshot, Position, Quarter, Ticker, ValidationError, SECTOR_OTHER,
};

/// First period whose information table reports values in whole dollars
/// rather than thousands.
const WHOLE_DOLLAR_VALUES_FROM: (i32, u8) = (2022, 4);

/// Converts raw filings into weighted snapshots using the shared reference
/// tables.
#[derive(Debug, Clone)]
pub struct Normalizer {
    reference: Arc<ReferenceData>,
}

impl Normalizer {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Normalizes one filing. Deterministic: the same input always yields an
    /// identical snapshot.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` when the filer is not a tracked fund
    /// - `MalformedFiling` when the payload is unparseable or totals zero
    pub fn normalize(&self, raw: &RawFiling) -> Result<PortfolioSnapshot, FilingError> {
        let fund = self.reference.fund_by_cik(&raw.cik).ok_or_else(|| {
            FilingError::invalid_request(format!("CIK {} is not a tracked fund", raw.cik))
        })?;

        let parsed;
        let rows: &[RawPosition] = match &raw.payload {
            FilingPayload::InformationTable(xml) => {
                parsed = parse_information_table(xml, value_multiplier(raw.quarter))?;
                &parsed
            }
            FilingPayload::Positions(rows) => rows,
        };
        let disclosed = rows.len();

        let mut positions: BTreeMap<Ticker, Position> = BTreeMap::new();
        let mut tally = RowTally::default();
        for row in rows {
            let shares = row.shares.unwrap_or(0);
            if shares == 0 {
                tally.zero_shares += 1;
                continue;
            }
            let Some(market_value) = row.value_usd else {
                tally.no_value += 1;
                continue;
            };
            let Some(position) = self.position(row, shares, market_value) else {
                tally.no_identifier += 1;
                continue;
            };
            if !position.resolved {
                tally.unresolved += 1;
            }
            match positions.get_mut(&position.ticker) {
                Some(existing) => {
                    existing.shares = existing.shares.saturating_add(position.shares);
                    existing.market_value =
                        existing.market_value.saturating_add(position.market_value);
                }
                None => {
                    positions.insert(position.ticker.clone(), position);
                }
            }
        }

        if tally.any() {
            debug!(
                fund = %fund.code,
                quarter = %raw.quarter,
                zero_shares = tally.zero_shares,
                no_value = tally.no_value,
                no_identifier = tally.no_identifier,
                unresolved = tally.unresolved,
                "row hygiene applied"
            );
        }

        let snapshot = PortfolioSnapshot::new(
            fund.code.clone(),
            raw.quarter,
            positions.into_values().collect(),
        )
        .map_err(|error| match error {
            ValidationError::EmptyPortfolio => FilingError::malformed(format!(
                "filing {} for {} {} has zero total market value",
                raw.filing.accession, fund.code, raw.quarter
            )),
            other => FilingError::malformed(other.to_string()),
        })?;

        debug!(
            fund = %fund.code,
            quarter = %raw.quarter,
            disclosed,
            holdings = snapshot.len(),
            total_value = snapshot.total_value,
            "normalized filing"
        );
        Ok(snapshot.with_accession(raw.filing.accession.clone()))
    }

    fn position(&self, row: &RawPosition, shares: u64, market_value: u64) -> Option<Position> {
        let issuer = row.issuer.trim();
        let position = match Cusip::parse(&row.cusip) {
            Ok(cusip) => self.resolve(cusip, issuer, shares, market_value),
            Err(_) => {
                let key = Ticker::from_identifier(&row.cusip)
                    .or_else(|| Ticker::from_identifier(issuer))?;
                Position::unidentified(key, issuer, shares, market_value)
            }
        };
        Some(match instrument(row) {
            Some(instrument) => position.as_instrument(instrument),
            None => position,
        })
    }

    fn resolve(&self, cusip: Cusip, issuer: &str, shares: u64, market_value: u64) -> Position {
        match self.reference.security(&cusip) {
            Some(security) => {
                let mut sector = self.reference.sector_for_issuer(&security.issuer);
                if sector == SECTOR_OTHER {
                    sector = self.reference.sector_for_issuer(issuer);
                }
                Position::resolved(
                    security.ticker.clone(),
                    security.issuer.clone(),
                    sector,
                    shares,
                    market_value,
                )
                .with_cusip(cusip)
            }
            None => Position::unresolved(cusip, issuer, shares, market_value),
        }
    }
}

/// Option rows by `putCall`, then principal-amount rows by `sshPrnamtType`.
fn instrument(row: &RawPosition) -> Option<&'static str> {
    match row.put_call.as_deref().map(str::trim) {
        Some(kind) if kind.eq_ignore_ascii_case("call") => return Some("CALL"),
        Some(kind) if kind.eq_ignore_ascii_case("put") => return Some("PUT"),
        _ => {}
    }
    row.share_type
        .as_deref()
        .filter(|kind| kind.trim().eq_ignore_ascii_case("PRN"))
        .map(|_| "PRN")
}

#[derive(Debug, Default)]
struct RowTally {
    zero_shares: usize,
    no_value: usize,
    no_identifier: usize,
    unresolved: usize,
}

impl RowTally {
    fn any(&self) -> bool {
        self.zero_shares + self.no_value + self.no_identifier + self.unresolved > 0
    }
}

/// Dollars per reported value unit for a period.
pub fn value_multiplier(quarter: Quarter) -> u64 {
    if (quarter.year(), quarter.number()) < WHOLE_DOLLAR_VALUES_FROM {
        1_000
    } else {
        1
    }
}

/// Parses a 13F information table into raw rows, converting values to dollars.
///
/// Element matching uses local names only, so `ns1:`-prefixed and
/// default-namespace documents read the same.
pub fn parse_information_table(
    xml: &str,
    value_multiplier: u64,
) -> Result<Vec<RawPosition>, FilingError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut rows = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<RowFields> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = local_name(&element);
                if path.is_empty() {
                    ensure_root(&name)?;
                    saw_root = true;
                }
                if name == "infoTable" {
                    current = Some(RowFields::default());
                }
                path.push(name);
            }
            Ok(Event::Empty(element)) => {
                if path.is_empty() {
                    ensure_root(&local_name(&element))?;
                    saw_root = true;
                }
            }
            Ok(Event::Text(text)) => {
                if let (Some(row), Some(field)) = (current.as_mut(), path.last()) {
                    let value = text.unescape().map_err(|error| {
                        FilingError::malformed(format!("unreadable text in <{field}>: {error}"))
                    })?;
                    row.set(field, value.trim());
                }
            }
            Ok(Event::CData(data)) => {
                if let (Some(row), Some(field)) = (current.as_mut(), path.last()) {
                    row.set(field, String::from_utf8_lossy(&data).trim());
                }
            }
            Ok(Event::End(_)) => {
                if path.pop().as_deref() == Some("infoTable") {
                    if let Some(row) = current.take() {
                        rows.push(row.finish(value_multiplier));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                return Err(FilingError::malformed(format!(
                    "information table is not well-formed XML near byte {}: {error}",
                    reader.buffer_position()
                )));
            }
        }
    }

    if !saw_root {
        return Err(FilingError::malformed(
            "document has no informationTable root element",
        ));
    }
    Ok(rows)
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn ensure_root(name: &str) -> Result<(), FilingError> {
    if name.eq_ignore_ascii_case("informationTable") {
        Ok(())
    } else {
        Err(FilingError::malformed(format!(
            "root element is <{name}>, expected <informationTable>"
        )))
    }
}

#[derive(Debug, Default)]
struct RowFields {
    issuer: String,
    cusip: Option<String>,
    value: Option<String>,
    shares: Option<String>,
    share_type: Option<String>,
    put_call: Option<String>,
}

impl RowFields {
    fn set(&mut self, field: &str, value: &str) {
        match field {
            "nameOfIssuer" => self.issuer.push_str(value),
            "cusip" => self.cusip = Some(value.to_owned()),
            "value" => self.value = Some(value.to_owned()),
            "sshPrnamt" => self.shares = Some(value.to_owned()),
            "sshPrnamtType" => self.share_type = Some(value.to_owned()),
            "putCall" => self.put_call = Some(value.to_owned()),
            _ => {}
        }
    }

    /// Amounts that are absent, non-numeric or overflow come back as `None`
    /// and the normalizer drops the row.
    fn finish(self, value_multiplier: u64) -> RawPosition {
        let value_usd = self
            .value
            .as_deref()
            .and_then(parse_amount)
            .and_then(|value| value.checked_mul(value_multiplier));

        RawPosition {
            issuer: self.issuer,
            cusip: self.cusip.unwrap_or_default(),
            shares: self.shares.as_deref().and_then(parse_amount),
            value_usd,
            share_type: self.share_type,
            put_call: self.put_call,
        }
    }
}

/// Non-negative whole amount; tolerates thousands separators and a zero
/// fractional part.
fn parse_amount(raw: &str) -> Option<u64> {
    let cleaned: String = raw.chars().filter(|ch| *ch != ',').collect();
    if let Ok(amount) = cleaned.parse::<u64>() {
        return Some(amount);
    }
    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 && amount < u64::MAX as f64 => {
            Some(amount.round() as u64)
        }
        _ => None,
    }
}
