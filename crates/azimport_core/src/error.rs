//! Error types for the discovery core.

use thiserror::Error;

/// Result type alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Result type alias for calls made through a [`crate::ResourceClient`].
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures surfaced by the upstream provider API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ProviderError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            code: None,
            message: message.into(),
        }
    }

    /// Authentication and authorization rejections, plus cancellation.
    ///
    /// These cannot be fixed by retrying the next page or the next group and
    /// move a generator into its `Failed` state.
    pub fn is_hard(&self) -> bool {
        match self {
            Self::Status { status, .. } => matches!(status, 401 | 403),
            Self::Cancelled => true,
            Self::Transport(_) | Self::Decode(_) => false,
        }
    }

    /// Throttling and server-side failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_) => true,
            Self::Decode(_) | Self::Cancelled => false,
        }
    }
}

/// Errors that can occur while discovering resources.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Malformed resource ID '{id}': {reason}")]
    MalformedId { id: String, reason: String },

    #[error("Provider error while listing {operation}: {source}")]
    Provider {
        operation: String,
        #[source]
        source: ProviderError,
    },

    #[error("Discovery cancelled")]
    Cancelled,

    #[error("{family} discovery failed (scope: {scope}): {source}")]
    Family {
        family: String,
        scope: String,
        #[source]
        source: Box<DiscoveryError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DiscoveryError {
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a provider failure, keeping cancellation distinct.
    pub fn provider(operation: impl Into<String>, source: ProviderError) -> Self {
        match source {
            ProviderError::Cancelled => Self::Cancelled,
            source => Self::Provider {
                operation: operation.into(),
                source,
            },
        }
    }

    /// Attach the family and scope a failure happened in.
    pub fn in_family(self, family: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::Family {
            family: family.into(),
            scope: scope.into(),
            source: Box::new(self),
        }
    }

    /// Strip any [`DiscoveryError::Family`] wrappers.
    pub fn root(&self) -> &DiscoveryError {
        match self {
            Self::Family { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Self::Cancelled)
    }

    /// See [`ProviderError::is_hard`].
    pub fn is_hard(&self) -> bool {
        match self.root() {
            Self::Provider { source, .. } => source.is_hard(),
            Self::Cancelled | Self::InvalidConfig(_) => true,
            _ => false,
        }
    }
}
