//! Behavior-driven tests for the analysis engine.
//!
//! Snapshots are built by hand and stored in a repository so each scenario
//! states exactly which holdings every fund reports.

use std::collections::BTreeSet;
use std::sync::Arc;

use holdlens_core::{
    AnalysisConfig, AnalysisEngine, ChangeAction, Cik, Fund, FundCode, HoldingsRepository,
    PortfolioSnapshot, Position, PositionChanges, Quarter, ReferenceData, Ticker,
    ValidationError, WEIGHT_TOLERANCE,
};

const FUNDS: [(&str, &str); 5] = [
    ("ALPHA", "1000001"),
    ("BETA", "1000002"),
    ("GAMMA", "1000003"),
    ("DELTA", "1000004"),
    ("EPSILON", "1000005"),
];

fn fund(code: &str) -> FundCode {
    FundCode::parse(code).expect("valid fund code")
}

fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).expect("valid ticker")
}

fn quarter(raw: &str) -> Quarter {
    Quarter::parse(raw).expect("valid quarter")
}

fn reference() -> Arc<ReferenceData> {
    let funds = FUNDS
        .iter()
        .map(|(code, cik)| Fund {
            code: fund(code),
            name: format!("{code} Capital"),
            short_name: (*code).to_owned(),
            style: String::from("Long-only"),
            cik: Cik::parse(cik).expect("valid cik"),
            description: String::new(),
        })
        .collect();
    Arc::new(ReferenceData::new(funds, Vec::new(), Vec::new()).expect("valid reference"))
}

/// `(ticker, sector, shares, market value)` rows for one fund and quarter.
fn snapshot(code: &str, period: &str, rows: &[(&str, &str, u64, u64)]) -> PortfolioSnapshot {
    let positions = rows
        .iter()
        .map(|(symbol, sector, shares, value)| {
            Position::resolved(ticker(symbol), format!("{symbol} Inc"), *sector, *shares, *value)
        })
        .collect();
    PortfolioSnapshot::new(fund(code), quarter(period), positions).expect("valid snapshot")
}

fn engine_with(config: AnalysisConfig, snapshots: Vec<PortfolioSnapshot>) -> AnalysisEngine {
    let repository = HoldingsRepository::new();
    for snapshot in snapshots {
        repository.put(snapshot);
    }
    AnalysisEngine::new(repository, reference(), config).expect("valid config")
}

fn engine(snapshots: Vec<PortfolioSnapshot>) -> AnalysisEngine {
    engine_with(AnalysisConfig::default(), snapshots)
}

// =============================================================================
// Position changes
// =============================================================================

#[test]
fn when_a_fund_swaps_msft_for_goog_changes_show_sold_and_new() {
    // Given: Q3 {AAPL 1000, MSFT 500} and Q4 {AAPL 1000, GOOG 300}
    let engine = engine(vec![
        snapshot(
            "ALPHA",
            "Q3 2024",
            &[
                ("AAPL", "Technology", 1_000, 200_000),
                ("MSFT", "Technology", 500, 150_000),
            ],
        ),
        snapshot(
            "ALPHA",
            "Q4 2024",
            &[
                ("AAPL", "Technology", 1_000, 230_000),
                ("GOOG", "Technology", 300, 55_000),
            ],
        ),
    ]);

    // When: Position changes are requested
    let changes = engine.position_changes(&fund("ALPHA"));

    // Then: MSFT was sold, GOOG is new, AAPL is omitted as unchanged
    let report = changes.report().expect("two quarters available");
    assert_eq!(report.prior_quarter, quarter("Q3 2024"));
    assert_eq!(report.current_quarter, quarter("Q4 2024"));
    assert_eq!(report.changes.len(), 2);

    let msft = report.get(&ticker("MSFT")).expect("MSFT reported");
    assert_eq!(msft.action, ChangeAction::Sold);
    assert_eq!(msft.share_change, -500);
    assert_eq!(msft.current_value, 0);

    let goog = report.get(&ticker("GOOG")).expect("GOOG reported");
    assert_eq!(goog.action, ChangeAction::New);
    assert_eq!(goog.share_change, 300);
    assert_eq!(goog.share_change_pct, None);

    assert!(report.get(&ticker("AAPL")).is_none());
}

#[test]
fn unchanged_positions_are_listed_when_configured() {
    // Given: A config that keeps unchanged entries
    let config = AnalysisConfig {
        include_unchanged: true,
        ..AnalysisConfig::default()
    };
    let engine = engine_with(
        config,
        vec![
            snapshot("ALPHA", "Q3 2024", &[("AAPL", "Technology", 1_000, 200_000)]),
            snapshot("ALPHA", "Q4 2024", &[("AAPL", "Technology", 1_000, 250_000)]),
        ],
    );

    // When/Then: AAPL appears as unchanged even though its value moved
    let changes = engine.position_changes(&fund("ALPHA"));
    let report = changes.report().expect("two quarters available");
    let aapl = report.get(&ticker("AAPL")).expect("AAPL listed");
    assert_eq!(aapl.action, ChangeAction::Unchanged);
    assert_eq!(aapl.value_change, 50_000);
}

#[test]
fn share_changes_at_the_materiality_threshold_count() {
    // Given: Moves of exactly 5%, just under 5%, and a 20% cut
    let engine = engine(vec![
        snapshot(
            "BETA",
            "Q3 2024",
            &[
                ("AAPL", "Technology", 1_000, 100),
                ("MSFT", "Technology", 1_000, 100),
                ("NVDA", "Technology", 1_000, 100),
            ],
        ),
        snapshot(
            "BETA",
            "Q4 2024",
            &[
                ("AAPL", "Technology", 1_050, 100),
                ("MSFT", "Technology", 1_049, 100),
                ("NVDA", "Technology", 800, 100),
            ],
        ),
    ]);

    // When: Changes are classified with the default 5% threshold
    let changes = engine.position_changes(&fund("BETA"));
    let report = changes.report().expect("two quarters available");

    // Then: The boundary is inclusive
    assert_eq!(report.get(&ticker("AAPL")).map(|c| c.action), Some(ChangeAction::Increased));
    assert!(report.get(&ticker("MSFT")).is_none());
    let nvda = report.get(&ticker("NVDA")).expect("NVDA reported");
    assert_eq!(nvda.action, ChangeAction::Reduced);
    let pct = nvda.share_change_pct.expect("prior shares known");
    assert!((pct + 0.2).abs() < 1e-12);
}

#[test]
fn every_ticker_gets_exactly_one_classification() {
    // Given: A quarter pair that exercises every action
    let config = AnalysisConfig {
        include_unchanged: true,
        ..AnalysisConfig::default()
    };
    let prior = snapshot(
        "GAMMA",
        "Q3 2024",
        &[
            ("AAPL", "Technology", 100, 100),
            ("MSFT", "Technology", 100, 100),
            ("NVDA", "Technology", 100, 100),
            ("XOM", "Energy", 100, 100),
        ],
    );
    let latest = snapshot(
        "GAMMA",
        "Q4 2024",
        &[
            ("AAPL", "Technology", 100, 120),
            ("MSFT", "Technology", 200, 220),
            ("NVDA", "Technology", 50, 40),
            ("AMZN", "Technology", 10, 30),
        ],
    );
    let expected: BTreeSet<Ticker> = prior
        .holdings
        .iter()
        .chain(&latest.holdings)
        .map(|line| line.ticker.clone())
        .collect();
    let engine = engine_with(config, vec![prior, latest]);

    // When: Changes are requested with unchanged entries kept
    let changes = engine.position_changes(&fund("GAMMA"));
    let report = changes.report().expect("two quarters available");

    // Then: The union of both quarters is covered, each ticker once
    let reported: Vec<Ticker> = report
        .changes
        .iter()
        .map(|change| change.ticker.clone())
        .collect();
    let distinct: BTreeSet<Ticker> = reported.iter().cloned().collect();
    assert_eq!(reported.len(), distinct.len(), "duplicate entries: {reported:?}");
    assert_eq!(distinct, expected);

    // And: Each lands in exactly the bucket its share counts imply
    let action = |symbol: &str| report.get(&ticker(symbol)).map(|change| change.action);
    assert_eq!(action("AAPL"), Some(ChangeAction::Unchanged));
    assert_eq!(action("MSFT"), Some(ChangeAction::Increased));
    assert_eq!(action("NVDA"), Some(ChangeAction::Reduced));
    assert_eq!(action("XOM"), Some(ChangeAction::Sold));
    assert_eq!(action("AMZN"), Some(ChangeAction::New));
    let counted: usize = [
        ChangeAction::New,
        ChangeAction::Sold,
        ChangeAction::Increased,
        ChangeAction::Reduced,
        ChangeAction::Unchanged,
    ]
    .into_iter()
    .map(|action| report.count(action))
    .sum();
    assert_eq!(counted, expected.len());
}

#[test]
fn a_single_quarter_reports_no_prior_data() {
    let engine = engine(vec![snapshot(
        "GAMMA",
        "Q4 2024",
        &[("AAPL", "Technology", 1, 1)],
    )]);

    let changes = engine.position_changes(&fund("GAMMA"));

    assert!(changes.is_no_prior_data());
    assert!(matches!(
        changes,
        PositionChanges::NoPriorData { current_quarter, .. } if current_quarter == quarter("Q4 2024")
    ));
    assert!(matches!(
        engine.position_changes(&fund("DELTA")),
        PositionChanges::NoData { .. }
    ));
}

// =============================================================================
// Single-fund views
// =============================================================================

#[test]
fn top_holdings_break_weight_ties_by_ticker() {
    // Given: Two equal-weight positions ahead of a smaller one
    let engine = engine(vec![snapshot(
        "ALPHA",
        "Q4 2024",
        &[
            ("MSFT", "Technology", 10, 400),
            ("AMZN", "Technology", 10, 400),
            ("V", "Financials", 10, 200),
        ],
    )]);

    // When: The top two are requested
    let top = engine.top_holdings(&fund("ALPHA"), 2).expect("snapshot stored");

    // Then: Ties resolve alphabetically and totals describe the full book
    let tickers: Vec<&str> = top.holdings.iter().map(|line| line.ticker.as_str()).collect();
    assert_eq!(tickers, ["AMZN", "MSFT"]);
    assert_eq!(top.total_holdings, 3);
    assert_eq!(top.total_value, 1_000);
    assert!((top.weight() - 0.8).abs() < 1e-9);

    // And: Asking for more than exist returns them all
    let all = engine.top_holdings(&fund("ALPHA"), 50).expect("snapshot stored");
    assert_eq!(all.holdings.len(), 3);
    assert!(engine.top_holdings(&fund("DELTA"), 5).is_none());
}

#[test]
fn sector_allocation_sums_holding_weights_per_sector() {
    let engine = engine(vec![snapshot(
        "BETA",
        "Q4 2024",
        &[
            ("MSFT", "Technology", 1, 300),
            ("GOOG", "Technology", 1, 200),
            ("V", "Financials", 1, 400),
            ("XOM", "Energy", 1, 100),
        ],
    )]);

    let allocation = engine.sector_allocation(&fund("BETA")).expect("snapshot stored");

    let order: Vec<&str> = allocation
        .sectors
        .iter()
        .map(|sector| sector.sector.as_str())
        .collect();
    assert_eq!(order, ["Technology", "Financials", "Energy"]);
    assert!((allocation.weight("Technology").unwrap_or_default() - 0.5).abs() < 1e-12);
    assert_eq!(allocation.sectors[0].holdings, 2);
    assert!((allocation.weight_sum() - 1.0).abs() < WEIGHT_TOLERANCE);
}

// =============================================================================
// Cross-fund views
// =============================================================================

fn three_fund_engine() -> AnalysisEngine {
    engine(vec![
        snapshot(
            "ALPHA",
            "Q4 2024",
            &[
                ("NVDA", "Technology", 10, 100),
                ("MSFT", "Technology", 10, 500),
                ("V", "Financials", 10, 400),
            ],
        ),
        snapshot(
            "BETA",
            "Q4 2024",
            &[
                ("NVDA", "Technology", 10, 150),
                ("MSFT", "Technology", 10, 250),
                ("AMZN", "Technology", 10, 600),
            ],
        ),
        snapshot(
            "GAMMA",
            "Q3 2024",
            &[
                ("NVDA", "Technology", 10, 50),
                ("XOM", "Energy", 10, 950),
            ],
        ),
    ])
}

#[test]
fn overlap_is_symmetric_and_lists_missing_funds() {
    // Given: Three funds with snapshots and two without
    let engine = three_fund_engine();

    // When: The overlap across all tracked funds is computed
    let matrix = engine.overlap_matrix(&[]);

    // Then: Every pair is present once, readable in either order
    assert_eq!(matrix.funds, [fund("ALPHA"), fund("BETA"), fund("GAMMA")]);
    assert_eq!(matrix.missing, [fund("DELTA"), fund("EPSILON")]);
    assert_eq!(matrix.cells.len(), 3);

    let alpha_beta = matrix.get(&fund("ALPHA"), &fund("BETA")).expect("pair present");
    assert_eq!(alpha_beta, matrix.get(&fund("BETA"), &fund("ALPHA")).expect("pair present"));
    assert_eq!(alpha_beta.shared, [ticker("MSFT"), ticker("NVDA")]);
    assert!((alpha_beta.combined_weight - (0.1 + 0.5 + 0.15 + 0.25)).abs() < 1e-9);

    assert_eq!(matrix.count(&fund("ALPHA"), &fund("GAMMA")), Some(1));
    assert_eq!(matrix.count(&fund("GAMMA"), &fund("BETA")), Some(1));
    assert_eq!(matrix.count(&fund("ALPHA"), &fund("ALPHA")), None);

    // And: Each fund is compared on its own latest quarter
    assert_eq!(matrix.quarters.get(&fund("GAMMA")), Some(&quarter("Q3 2024")));
}

#[test]
fn overlap_of_a_requested_subset_ignores_duplicates() {
    let engine = three_fund_engine();

    let matrix = engine.overlap_matrix(&[fund("BETA"), fund("ALPHA"), fund("BETA")]);

    assert_eq!(matrix.funds, [fund("BETA"), fund("ALPHA")]);
    assert!(matrix.missing.is_empty());
    assert_eq!(matrix.cells.len(), 1);
    assert_eq!(matrix.count(&fund("ALPHA"), &fund("BETA")), Some(2));
}

#[test]
fn ticker_held_by_three_funds_is_high_conviction() {
    // Given: NVDA at weights 0.10, 0.15 and 0.05 across three funds
    let engine = three_fund_engine();

    // When: NVDA is scored
    let nvda = engine.conviction(&ticker("NVDA")).expect("NVDA is held");

    // Then: Three holders with a mean weight of 0.10
    assert_eq!(nvda.holder_count, 3);
    assert!((nvda.mean_weight - 0.10).abs() < WEIGHT_TOLERANCE);
    assert_eq!(nvda.holders, [fund("ALPHA"), fund("BETA"), fund("GAMMA")]);
    assert_eq!(nvda.total_value, 300);
    assert!(nvda.high_conviction);

    // And: It is the only high-conviction ticker
    let high: Vec<Ticker> = engine
        .high_conviction()
        .into_iter()
        .map(|score| score.ticker)
        .collect();
    assert_eq!(high, [ticker("NVDA")]);
}

/// Latest quarters: MSFT held by 5 funds, NVDA by 4, AAPL by 3, AMZN by 2,
/// TSLA and XOM by 1. TSLA was also held by ALPHA and BETA in Q3.
fn five_fund_snapshots() -> Vec<PortfolioSnapshot> {
    vec![
        snapshot(
            "ALPHA",
            "Q3 2024",
            &[("TSLA", "Consumer", 10, 100), ("MSFT", "Technology", 10, 100)],
        ),
        snapshot(
            "ALPHA",
            "Q4 2024",
            &[
                ("MSFT", "Technology", 10, 500),
                ("NVDA", "Technology", 10, 300),
                ("AAPL", "Technology", 10, 200),
            ],
        ),
        snapshot("BETA", "Q3 2024", &[("TSLA", "Consumer", 10, 100)]),
        snapshot(
            "BETA",
            "Q4 2024",
            &[
                ("MSFT", "Technology", 10, 400),
                ("NVDA", "Technology", 10, 400),
                ("AAPL", "Technology", 10, 100),
                ("AMZN", "Technology", 10, 100),
            ],
        ),
        snapshot(
            "GAMMA",
            "Q4 2024",
            &[
                ("MSFT", "Technology", 10, 300),
                ("NVDA", "Technology", 10, 200),
                ("AAPL", "Technology", 10, 100),
                ("TSLA", "Consumer", 10, 400),
            ],
        ),
        snapshot(
            "DELTA",
            "Q4 2024",
            &[
                ("MSFT", "Technology", 10, 600),
                ("NVDA", "Technology", 10, 100),
                ("AMZN", "Technology", 10, 300),
            ],
        ),
        snapshot(
            "EPSILON",
            "Q4 2024",
            &[("MSFT", "Technology", 10, 200), ("XOM", "Energy", 10, 800)],
        ),
    ]
}

#[test]
fn high_conviction_set_is_every_ticker_at_the_holder_threshold() {
    for (min_holders, expected) in [
        (3, vec!["AAPL", "MSFT", "NVDA"]),
        (4, vec!["MSFT", "NVDA"]),
        (5, vec!["MSFT"]),
    ] {
        // Given: Five tracked funds with latest snapshots
        let config = AnalysisConfig {
            high_conviction_min_holders: min_holders,
            ..AnalysisConfig::default()
        };
        let engine = engine_with(config, five_fund_snapshots());

        // When: High conviction and all scores are computed
        let high: BTreeSet<Ticker> = engine
            .high_conviction()
            .into_iter()
            .map(|score| score.ticker)
            .collect();
        let scores = engine.conviction_scores();

        // Then: High conviction is exactly the scores at or above the threshold
        let filtered: BTreeSet<Ticker> = scores
            .iter()
            .filter(|score| score.holder_count >= min_holders)
            .map(|score| score.ticker.clone())
            .collect();
        assert_eq!(high, filtered, "min_holders={min_holders}");
        let expected: BTreeSet<Ticker> = expected.into_iter().map(ticker).collect();
        assert_eq!(high, expected, "min_holders={min_holders}");

        // And: Only latest quarters count, so TSLA has a single holder
        let tsla = scores
            .iter()
            .find(|score| score.ticker == ticker("TSLA"))
            .expect("TSLA held by GAMMA");
        assert_eq!(tsla.holder_count, 1);
        assert_eq!(scores.len(), 6);
    }
}

#[test]
fn conviction_ranks_by_holders_then_mean_weight() {
    let engine = three_fund_engine();

    let ranked: Vec<(String, usize)> = engine
        .conviction_scores()
        .into_iter()
        .map(|score| (score.ticker.to_string(), score.holder_count))
        .collect();

    assert_eq!(
        ranked,
        [
            (String::from("NVDA"), 3),
            (String::from("MSFT"), 2),
            (String::from("XOM"), 1),
            (String::from("AMZN"), 1),
            (String::from("V"), 1),
        ]
    );
    assert!(engine.conviction(&ticker("TSLA")).is_none());
}

#[test]
fn invalid_analysis_config_is_rejected() {
    let config = AnalysisConfig {
        materiality_threshold: 1.5,
        ..AnalysisConfig::default()
    };

    let error = AnalysisEngine::new(HoldingsRepository::new(), reference(), config)
        .expect_err("threshold out of range");

    assert!(matches!(error, ValidationError::OutOfUnitRange { .. }));
}
