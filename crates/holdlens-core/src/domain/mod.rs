//! # Domain Models
//!
//! Canonical domain types for 13F holdings.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Fund`] | Tracked fund manager (code, name, style, CIK) |
//! | [`Position`] | Normalized position before weighting |
//! | [`HoldingLine`] | One weighted position inside a snapshot |
//! | [`PortfolioSnapshot`] | One fund's holdings for one quarter |
//! | [`Quarter`] | Ordered reporting quarter (`Q4 2024`) |
//! | [`Cik`] | Zero-padded SEC Central Index Key |
//! | [`Cusip`] | Nine-character security identifier |
//! | [`Ticker`] | Security key (ticker, or CUSIP when unresolved) |
//! | [`FundCode`] | Short fund code |
//!
//! ## Validation
//!
//! Identifiers validate at construction, and [`PortfolioSnapshot::new`]
//! derives weights itself so a snapshot can never violate the weight-sum
//! invariant:
//!
//! ```rust,ignore
//! use holdlens_core::{FundCode, PortfolioSnapshot, Position, Quarter, Ticker};
//!
//! let snapshot = PortfolioSnapshot::new(
//!     FundCode::parse("TCI")?,
//!     Quarter::parse("Q4 2024")?,
//!     vec![Position::resolved(Ticker::parse("V")?, "Visa Inc", "Financials", 10, 2_780)],
//! )?;
//! assert_eq!(snapshot.holdings[0].weight, 1.0);
//! ```

mod identifiers;
mod models;
mod quarter;
mod ticker;

pub use identifiers::{Cik, Cusip, FundCode};
pub(crate) use models::compare_by_weight;
pub use models::{
    Fund, HoldingLine, PortfolioSnapshot, Position, SECTOR_OTHER, SECTOR_UNRESOLVED,
    WEIGHT_TOLERANCE,
};
pub use quarter::Quarter;
pub use ticker::Ticker;
