//! Error types for the Resource Manager client.

use thiserror::Error;

/// Result type alias for client construction.
pub type ArmResult<T> = Result<T, ArmError>;

/// Errors raised while setting up an [`crate::ArmClient`].
///
/// Failures of individual calls are reported as
/// [`azimport_core::ProviderError`] instead.
#[derive(Error, Debug)]
pub enum ArmError {
    #[error("No access token configured (set {0})")]
    MissingToken(&'static str),

    #[error("Invalid Resource Manager endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
