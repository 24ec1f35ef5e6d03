//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// An input file is missing
    #[error("{input} not found: {path}")]
    InputNotFound { input: String, path: String },

    /// Output directory cannot be used
    #[error("Output directory {path} is not usable: {message}")]
    OutputDir { path: String, message: String },

    /// Pipeline execution error
    #[error("Pipeline execution failed: {message}")]
    PipelineExecution { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn input_not_found(input: impl Into<String>, path: impl Into<String>) -> Self {
        Self::InputNotFound {
            input: input.into(),
            path: path.into(),
        }
    }

    pub fn output_dir(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OutputDir {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn pipeline_execution(message: impl Into<String>) -> Self {
        Self::PipelineExecution {
            message: message.into(),
        }
    }
}
