use thiserror::Error;

use tickerbrief_core::{ConfigError, GenerationError, NotifyError, PipelineError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no market data could be collected for any ticker")]
    NoData,

    #[error(transparent)]
    Delivery(#[from] NotifyError),

    #[error("model listing failed: {0}")]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<PipelineError> for CliError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Config(error) => Self::Config(error),
            PipelineError::Delivery(error) => Self::Delivery(error),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Validation(_) => 2,
            Self::NoData => 3,
            Self::Delivery(_) => 4,
            Self::Generation(_) => 5,
            Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
