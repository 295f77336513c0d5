//! Behavior-driven tests for the in-memory holdings repository and the
//! reference data it is keyed against.

use std::io::Write;
use std::sync::Arc;
use std::thread;

use holdlens_core::{
    CoreError, FundCode, HoldingsRepository, PortfolioSnapshot, Position, Quarter, ReferenceData,
    Ticker, ValidationError,
};

fn fund(code: &str) -> FundCode {
    FundCode::parse(code).expect("valid fund code")
}

fn quarter(raw: &str) -> Quarter {
    Quarter::parse(raw).expect("valid quarter")
}

fn snapshot(code: &str, period: &str, holdings: &[(&str, u64)]) -> PortfolioSnapshot {
    let positions = holdings
        .iter()
        .map(|(ticker, value)| {
            Position::resolved(
                Ticker::parse(ticker).expect("valid ticker"),
                format!("{ticker} Inc"),
                "Technology",
                value / 10,
                *value,
            )
        })
        .collect();
    PortfolioSnapshot::new(fund(code), quarter(period), positions).expect("valid snapshot")
}

// =============================================================================
// Storage semantics
// =============================================================================

#[test]
fn stored_snapshot_reads_back_unchanged() {
    // Given: An empty repository
    let repository = HoldingsRepository::new();
    let original = snapshot("TCI", "Q4 2024", &[("MSFT", 600), ("V", 400)]);

    // When: A snapshot is stored and read back
    let replaced = repository.put(original.clone());
    let stored = repository
        .get(&fund("TCI"), quarter("Q4 2024"))
        .expect("snapshot stored");

    // Then: It is the same snapshot, and nothing was replaced
    assert!(replaced.is_none());
    assert_eq!(*stored, original);
    assert_eq!(repository.len(), 1);
}

#[test]
fn storing_the_same_period_replaces_rather_than_merges() {
    // Given: A stored Q4 snapshot
    let repository = HoldingsRepository::new();
    repository.put(snapshot("TCI", "Q4 2024", &[("MSFT", 600), ("V", 400)]));

    // When: A corrected Q4 snapshot with different holdings arrives
    let replaced = repository.put(snapshot("TCI", "Q4 2024", &[("GOOG", 1_000)]));

    // Then: The old one is handed back and the new one stands alone
    let replaced = replaced.expect("previous snapshot returned");
    assert_eq!(replaced.len(), 2);

    let current = repository
        .get(&fund("TCI"), quarter("Q4 2024"))
        .expect("snapshot stored");
    let tickers: Vec<&str> = current.holdings.iter().map(|line| line.ticker.as_str()).collect();
    assert_eq!(tickers, ["GOOG"]);
    assert_eq!(repository.len(), 1);
}

#[test]
fn unknown_fund_or_quarter_reads_as_absent() {
    let repository = HoldingsRepository::new();
    repository.put(snapshot("TCI", "Q4 2024", &[("MSFT", 1)]));

    assert!(repository.get(&fund("AKO"), quarter("Q4 2024")).is_none());
    assert!(repository.get(&fund("TCI"), quarter("Q3 2024")).is_none());
    assert!(repository.latest(&fund("AKO")).is_none());
    assert!(repository.latest_with_prior(&fund("AKO")).is_none());
}

// =============================================================================
// Period navigation
// =============================================================================

#[test]
fn latest_and_prior_follow_quarter_order_not_insertion_order() {
    // Given: Quarters stored out of order, with a gap
    let repository = HoldingsRepository::new();
    repository.put(snapshot("AKO", "Q4 2024", &[("MSFT", 3)]));
    repository.put(snapshot("AKO", "Q1 2024", &[("MSFT", 1)]));
    repository.put(snapshot("AKO", "Q2 2024", &[("MSFT", 2)]));

    // When: The latest and its predecessor are requested
    let pair = repository
        .latest_with_prior(&fund("AKO"))
        .expect("fund has snapshots");

    // Then: Q4 is latest and the nearest earlier stored quarter is Q2
    assert_eq!(pair.latest.quarter, quarter("Q4 2024"));
    assert_eq!(
        pair.prior.as_ref().map(|prior| prior.quarter),
        Some(quarter("Q2 2024"))
    );
    assert_eq!(
        repository.prior_to(&fund("AKO"), quarter("Q2 2024")).map(|s| s.quarter),
        Some(quarter("Q1 2024"))
    );
    assert!(repository.prior_to(&fund("AKO"), quarter("Q1 2024")).is_none());

    // And: Listings run oldest-first for quarters, newest-first for recents
    assert_eq!(
        repository.quarters(&fund("AKO")),
        [quarter("Q1 2024"), quarter("Q2 2024"), quarter("Q4 2024")]
    );
    let recent: Vec<Quarter> = repository
        .recent(&fund("AKO"), 2)
        .iter()
        .map(|snapshot| snapshot.quarter)
        .collect();
    assert_eq!(recent, [quarter("Q4 2024"), quarter("Q2 2024")]);
}

#[test]
fn single_quarter_fund_has_no_prior() {
    let repository = HoldingsRepository::new();
    repository.put(snapshot("EGERTON", "Q4 2024", &[("AMZN", 5)]));

    let pair = repository
        .latest_with_prior(&fund("EGERTON"))
        .expect("fund has a snapshot");
    assert!(pair.prior.is_none());
}

#[test]
fn latest_for_skips_funds_without_snapshots() {
    let repository = HoldingsRepository::new();
    repository.put(snapshot("TCI", "Q3 2024", &[("V", 1)]));
    repository.put(snapshot("TCI", "Q4 2024", &[("V", 1)]));
    repository.put(snapshot("AKO", "Q4 2024", &[("V", 1)]));

    let latest = repository.latest_for(&[fund("TCI"), fund("LONEPINE"), fund("AKO")]);

    let keys: Vec<(String, Quarter)> = latest
        .iter()
        .map(|snapshot| (snapshot.fund.to_string(), snapshot.quarter))
        .collect();
    assert_eq!(
        keys,
        [
            (String::from("TCI"), quarter("Q4 2024")),
            (String::from("AKO"), quarter("Q4 2024")),
        ]
    );
    assert_eq!(repository.funds(), [fund("AKO"), fund("TCI")]);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn readers_see_whole_snapshots_while_a_writer_replaces_them() {
    // Given: A stored snapshot and two alternative versions of it
    let repository = HoldingsRepository::new();
    repository.put(snapshot("TCI", "Q4 2024", &[("MSFT", 500), ("V", 500)]));

    // When: One thread keeps replacing the period while others read it
    let writer = {
        let repository = repository.clone();
        thread::spawn(move || {
            for round in 0..200 {
                let next = if round % 2 == 0 {
                    snapshot("TCI", "Q4 2024", &[("GOOG", 700), ("AON", 300)])
                } else {
                    snapshot("TCI", "Q4 2024", &[("MSFT", 500), ("V", 500)])
                };
                repository.put(next);
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let repository = repository.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let current = repository
                        .get(&fund("TCI"), quarter("Q4 2024"))
                        .expect("period never disappears");
                    let tickers: Vec<&str> =
                        current.holdings.iter().map(|line| line.ticker.as_str()).collect();

                    // Then: Every read is one complete version, never a blend
                    assert!(
                        tickers == ["MSFT", "V"] || tickers == ["GOOG", "AON"],
                        "torn read: {tickers:?}"
                    );
                    assert!((current.weight_sum() - 1.0).abs() < 1e-9);
                }
            })
        })
        .collect();

    writer.join().expect("writer thread panicked");
    for reader in readers {
        reader.join().expect("reader thread panicked");
    }
    assert_eq!(repository.len(), 1);
}

#[test]
fn snapshots_handed_out_survive_later_replacement() {
    let repository = HoldingsRepository::new();
    repository.put(snapshot("TCI", "Q4 2024", &[("MSFT", 1)]));
    let held: Arc<PortfolioSnapshot> = repository.latest(&fund("TCI")).expect("stored");

    repository.put(snapshot("TCI", "Q4 2024", &[("V", 1)]));

    assert_eq!(held.holdings[0].ticker.as_str(), "MSFT");
}

// =============================================================================
// Reference data files
// =============================================================================

const REFERENCE_JSON: &str = r#"{
    "funds": [
        {"code": "TCI", "name": "TCI Fund Management", "short_name": "TCI",
         "style": "Concentrated Quality", "cik": "1647251"},
        {"code": "AKO", "name": "AKO Capital", "style": "Quality Growth", "cik": "0001606058"}
    ],
    "securities": [
        {"cusip": "594918104", "ticker": "MSFT", "issuer": "Microsoft Corp"}
    ],
    "issuer_sectors": {"Microsoft Corp": "Technology"}
}"#;

#[test]
fn reference_data_loads_from_a_file() {
    // Given: A reference file on disk
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(REFERENCE_JSON.as_bytes()).expect("write reference");

    // When: It is loaded
    let reference = ReferenceData::load(file.path()).expect("valid reference file");

    // Then: Funds keep file order and lookups work
    assert_eq!(reference.fund_codes(), [fund("TCI"), fund("AKO")]);
    let ako = reference.fund(&fund("AKO")).expect("AKO tracked");
    assert_eq!(ako.cik.as_str(), "0001606058");
    assert_eq!(ako.display_name(), "AKO");
    assert_eq!(reference.sector_for_issuer("MICROSOFT CORP."), "Technology");
    assert_eq!(reference.sector_for_issuer("Unlisted Co"), "Other");
}

#[test]
fn reference_data_with_duplicate_funds_is_rejected() {
    let duplicated = REFERENCE_JSON.replace("\"code\": \"AKO\"", "\"code\": \"TCI\"");

    let error = ReferenceData::from_json_str(&duplicated).expect_err("duplicate fund");

    assert!(matches!(
        error,
        CoreError::Validation(ValidationError::DuplicateFund { ref code }) if code == "TCI"
    ));
}

#[test]
fn missing_reference_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");

    let error = ReferenceData::load(dir.path().join("absent.json")).expect_err("no file");

    assert!(matches!(error, CoreError::Io(_)));
}
