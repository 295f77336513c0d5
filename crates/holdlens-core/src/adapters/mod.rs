//! Filing source implementations.
//!
//! | Adapter | Source |
//! |---------|--------|
//! | [`EdgarAdapter`] | SEC EDGAR submissions API and filing archives |
//! | [`SampleFilingSource`] | Bundled Q3/Q4 2024 disclosures, offline |

pub mod edgar;
pub mod sample;

pub use edgar::EdgarAdapter;
pub use sample::SampleFilingSource;
