use quantum_core::{AggregatorError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(ValidationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    Aggregator {
        message: String,
        #[source]
        source: AggregatorError,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<AggregatorError> for CliError {
    fn from(source: AggregatorError) -> Self {
        Self::Aggregator {
            message: format!("{} ({})", source, source.code()),
            source,
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 78,
            Self::Validation(_) => 2,
            Self::Aggregator { source, .. } => match source {
                AggregatorError::InvalidSymbol(_) | AggregatorError::InvalidQuery(_) => 2,
                AggregatorError::Vendor(_) => 3,
                AggregatorError::Aggregation(_) => 4,
            },
            Self::Serialization(_) => 5,
            Self::Io(_) => 10,
        }
    }
}
