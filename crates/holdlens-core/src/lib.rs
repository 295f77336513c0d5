//! # Holdlens Core
//!
//! 13F filing ingestion, holdings normalization and cross-fund analytics.
//!
//! ## Overview
//!
//! - **Filing sources** fetch a fund's 13F information table for a quarter
//!   (SEC EDGAR, or a bundled offline dataset)
//! - **Normalizer** turns a raw filing into a weighted [`PortfolioSnapshot`]
//! - **Repository** keeps snapshots per (fund, quarter) in memory
//! - **Analysis engine** derives top holdings, sector allocation, position
//!   changes, overlap and conviction scores
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Filing source implementations (EDGAR, sample) |
//! | [`analysis`] | Analysis engine and the pure analytics behind it |
//! | [`config`] | EDGAR and analysis configuration |
//! | [`domain`] | Identifiers, quarters, funds, holdings, snapshots |
//! | [`error`] | Validation and top-level error types |
//! | [`filing_source`] | Filing source trait, requests and structured errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`ingest`] | Fetch → normalize → store pipeline with retry |
//! | [`normalizer`] | Raw filing → snapshot conversion |
//! | [`reference`] | Tracked funds, security master, sector lookup |
//! | [`repository`] | In-memory snapshot store |
//! | [`retry`] | Backoff schedule for transient failures |
//! | [`source`] | Filing source identifiers |
//! | [`throttling`] | Request pacing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use holdlens_core::{
//!     AnalysisConfig, AnalysisEngine, HoldingsRepository, Ingestor, Normalizer,
//!     ReferenceData, SampleFilingSource,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reference = Arc::new(ReferenceData::bundled()?);
//!     let repository = HoldingsRepository::new();
//!     let ingestor = Ingestor::new(
//!         Arc::new(SampleFilingSource::bundled()?),
//!         Normalizer::new(Arc::clone(&reference)),
//!         repository.clone(),
//!     );
//!     ingestor.ingest_recent(reference.funds(), 2).await;
//!
//!     let engine = AnalysisEngine::new(repository, reference, AnalysisConfig::default())?;
//!     for score in engine.high_conviction() {
//!         println!("{} held by {} funds", score.ticker, score.holder_count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Filing Source   │────▶│ HTTP Client      │
//! │ (EDGAR/sample)  │     │ + throttle       │
//! └────────┬────────┘     └──────────────────┘
//!          │ RawFiling
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Normalizer      │────▶│ Reference Data   │
//! └────────┬────────┘     └──────────────────┘
//!          │ PortfolioSnapshot
//!          ▼
//! ┌─────────────────┐
//! │ Repository      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Analysis Engine │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Sources and the normalizer fail with a [`FilingError`] whose kind decides
//! what the caller does next:
//!
//! ```rust
//! use holdlens_core::{FilingError, FilingErrorKind};
//!
//! fn handle_error(error: FilingError) {
//!     match error.kind() {
//!         FilingErrorKind::RateLimited | FilingErrorKind::Unavailable => {
//!             // Back off and retry
//!         }
//!         FilingErrorKind::NotFound => {
//!             // Nothing filed for that quarter
//!         }
//!         _ => {}
//!     }
//! }
//! ```

pub mod adapters;
pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod filing_source;
pub mod http_client;
pub mod ingest;
pub mod normalizer;
pub mod reference;
pub mod repository;
pub mod retry;
pub mod source;
pub mod throttling;

// Filing sources
pub use adapters::{EdgarAdapter, SampleFilingSource};

// Analysis
pub use analysis::{
    AnalysisEngine, ChangeAction, ChangeReport, ConvictionScore, OverlapCell, OverlapMatrix,
    PositionChange, PositionChanges, SectorAllocation, SectorWeight, TopHoldings,
};

// Configuration
pub use config::{AnalysisConfig, EdgarConfig};

// Domain models
pub(crate) use domain::compare_by_weight;
pub use domain::{
    Cik, Cusip, Fund, FundCode, HoldingLine, PortfolioSnapshot, Position, Quarter, Ticker,
    SECTOR_OTHER, SECTOR_UNRESOLVED, WEIGHT_TOLERANCE,
};

// Error types
pub use error::{CoreError, ValidationError};

// Filing source contract
pub use filing_source::{
    FilingError, FilingErrorKind, FilingPayload, FilingRef, FilingRequest, FilingSource,
    RawFiling, RawPosition,
};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Pipeline
pub use ingest::{IngestOutcome, IngestReport, IngestStatus, Ingestor};
pub use normalizer::Normalizer;
pub use reference::{ReferenceData, Security};
pub use repository::{HoldingsRepository, SnapshotPair};
pub use retry::{Backoff, RetryConfig};
pub use source::SourceId;
pub use throttling::RequestThrottle;
