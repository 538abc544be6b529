//! Errors that abort a CLI command before it can render a result.

use thiserror::Error;

use crate::config::ConfigError;

/// Infrastructure failures. Domain outcomes such as validation or transport
/// errors are rendered to the output instead.
#[derive(Debug, Error)]
pub enum CliError {
    /// Settings could not be interpreted.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
