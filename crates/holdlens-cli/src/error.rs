use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] holdlens_core::ValidationError),

    #[error(transparent)]
    Core(#[from] holdlens_core::CoreError),

    #[error("command error: {0}")]
    Command(String),

    #[error("ingestion incomplete: {failed} of {total} fund/quarter fetches failed")]
    IngestFailed { failed: usize, total: usize },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Core(_) => 4,
            Self::IngestFailed { .. } => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
