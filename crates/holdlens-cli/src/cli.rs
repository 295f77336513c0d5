//! CLI argument definitions for holdlens.
//!
//! The core keeps snapshots in memory only, so every command ingests the
//! selected source before it analyses anything.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `funds` | List tracked funds |
//! | `ingest` | Ingest recent 13F filings and report per-quarter outcomes |
//! | `top` | Largest holdings of one fund |
//! | `sectors` | Sector allocation of one fund |
//! | `changes` | Quarter-over-quarter position changes of one fund |
//! | `overlap` | Shared holdings between every pair of funds |
//! | `conviction` | Tickers held across funds, ranked |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--source` | `sample` | Filing source (sample, edgar) |
//! | `--quarters` | `2` | Recent filed quarters to ingest per fund |
//! | `--reference` | bundled | Reference data JSON file |
//!
//! # Examples
//!
//! ```bash
//! holdlens top TCI --limit 5
//! holdlens changes AKO --format json --pretty
//! HOLDLENS_EDGAR_USER_AGENT="acme-research ops@acme.io" holdlens --source edgar conviction
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// holdlens - 13F holdings tracker for a fixed set of fund managers
#[derive(Debug, Parser)]
#[command(
    name = "holdlens",
    author,
    version,
    about = "13F holdings tracker and cross-fund analytics",
    long_about = "holdlens ingests quarterly 13F filings for a fixed set of fund managers and \
derives top holdings, sector allocation, position changes, cross-fund overlap and \
conviction scores.\n\
\n\
Use 'holdlens <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Filing source to ingest from.
    ///
    /// - sample: bundled Q3/Q4 2024 disclosures, offline
    /// - edgar: live SEC EDGAR; requires HOLDLENS_EDGAR_USER_AGENT
    #[arg(long, global = true, value_enum, default_value_t = SourceSelector::Sample)]
    pub source: SourceSelector,

    /// Number of most recent filed quarters to ingest per fund.
    #[arg(long, global = true, default_value_t = 2)]
    pub quarters: usize,

    /// Reference data file (tracked funds, securities, sectors).
    #[arg(long, global = true)]
    pub reference: Option<PathBuf>,

    /// Per-attempt fetch budget in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Relative share change that counts as increased or reduced.
    #[arg(long, global = true, default_value_t = 0.05)]
    pub materiality: f64,

    /// Holder count at which a ticker is high conviction.
    #[arg(long, global = true, default_value_t = 3)]
    pub min_holders: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table.
    Table,
    /// Single JSON document.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    Sample,
    Edgar,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List tracked funds.
    Funds,

    /// Ingest recent filings and report what was stored.
    ///
    /// Exits with status 3 when any fund/quarter failed.
    Ingest,

    /// Largest holdings of a fund's latest snapshot.
    ///
    ///   holdlens top TCI
    ///   holdlens top LONEPINE --limit 5
    Top(TopArgs),

    /// Sector allocation of a fund's latest snapshot.
    Sectors(FundArgs),

    /// Position changes between a fund's two latest quarters.
    Changes(ChangesArgs),

    /// Shared tickers between every pair of funds.
    ///
    ///   holdlens overlap
    ///   holdlens overlap TCI AKO EGERTON
    Overlap(OverlapArgs),

    /// Tickers held by several funds, ranked by holder count.
    ///
    ///   holdlens conviction
    ///   holdlens conviction --all
    ///   holdlens conviction --ticker MSFT
    Conviction(ConvictionArgs),
}

#[derive(Debug, Args)]
pub struct FundArgs {
    /// Fund code (e.g. TCI, AKO).
    pub fund: String,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    /// Fund code (e.g. TCI, AKO).
    pub fund: String,

    /// Number of holdings to show.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct ChangesArgs {
    /// Fund code (e.g. TCI, AKO).
    pub fund: String,

    /// Also list positions that did not change materially.
    #[arg(long, default_value_t = false)]
    pub include_unchanged: bool,
}

#[derive(Debug, Args)]
pub struct OverlapArgs {
    /// Fund codes to compare; all tracked funds when omitted.
    pub funds: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ConvictionArgs {
    /// Score a single ticker.
    #[arg(long, conflicts_with = "all")]
    pub ticker: Option<String>,

    /// List every ticker, not just high-conviction ones.
    #[arg(long, default_value_t = false)]
    pub all: bool,
}
