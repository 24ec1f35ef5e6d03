//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Input could not be decoded
    #[error("failed to parse {input}: {message}")]
    ParseFailed {
        /// Input name (file or record description)
        input: String,
        /// Error message
        message: String,
    },

    /// Input decoded but is structurally incompatible
    #[error("schema mismatch in {input}: {message}")]
    Schema {
        /// Input name
        input: String,
        /// Error message
        message: String,
    },

    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl IngestionError {
    pub fn parse_failed(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseFailed {
            input: input.into(),
            message: message.into(),
        }
    }

    pub fn schema(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            input: input.into(),
            message: message.into(),
        }
    }
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::ParseFailed { input, message } => {
                ContractError::input_parse(input, message)
            }
            IngestionError::Schema { input, message } => ContractError::schema(input, message),
            IngestionError::Io { source, .. } => ContractError::Io(source),
        }
    }
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;
