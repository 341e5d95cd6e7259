//! Resource Manager HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use azimport_core::{
    Page, PageRequest, ProviderError, ProviderResult, ResourceClient,
    DEFAULT_RESOURCE_MANAGER_ENDPOINT,
};

use crate::error::{ArmError, ArmResult};

/// Environment variable holding the bearer token.
pub const ACCESS_TOKEN_ENV: &str = "ARM_ACCESS_TOKEN";
/// Environment variable overriding the Resource Manager endpoint.
pub const ENDPOINT_ENV: &str = "ARM_RESOURCE_MANAGER_ENDPOINT";
/// Upper bound for any single wait between attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Tuning knobs for [`ArmClient`].
#[derive(Debug, Clone)]
pub struct ArmClientOptions {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every further one, up to
    /// [`MAX_RETRY_DELAY`]. A `Retry-After` header takes precedence.
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for ArmClientOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Authenticated Resource Manager client.
#[derive(Debug, Clone)]
pub struct ArmClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    options: ArmClientOptions,
}

/// A failed attempt and the server's requested wait, if it sent one.
#[derive(Debug)]
struct Rejection {
    error: ProviderError,
    retry_after: Option<Duration>,
}

impl From<ProviderError> for Rejection {
    fn from(error: ProviderError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ArmClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> ArmResult<Self> {
        Self::with_options(endpoint, token, ArmClientOptions::default())
    }

    pub fn with_options(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        options: ArmClientOptions,
    ) -> ArmResult<Self> {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ArmError::InvalidEndpoint(endpoint));
        }
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ArmError::MissingToken(ACCESS_TOKEN_ENV));
        }

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("azimport/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            token,
            options,
        })
    }

    /// Build a client from `ARM_ACCESS_TOKEN` and `ARM_RESOURCE_MANAGER_ENDPOINT`.
    pub fn from_env() -> ArmResult<Self> {
        let token = std::env::var(ACCESS_TOKEN_ENV)
            .map_err(|_| ArmError::MissingToken(ACCESS_TOKEN_ENV))?;
        let endpoint = std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RESOURCE_MANAGER_ENDPOINT.to_string());
        Self::new(endpoint, token)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Absolute URL for a page request.
    ///
    /// Continuation links are used as returned, except that a relative link
    /// is resolved against the endpoint.
    pub fn request_url(&self, request: &PageRequest) -> String {
        match request {
            PageRequest::First(op) => format!(
                "{}{}?api-version={}",
                self.endpoint, op.path, op.api_version
            ),
            PageRequest::Next(link) if link.starts_with('/') => {
                format!("{}{}", self.endpoint, link)
            }
            PageRequest::Next(link) => link.clone(),
        }
    }

    async fn send_once(&self, url: &str) -> Result<Page, Rejection> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(Rejection {
                error: parse_error_body(status.as_u16(), &body),
                retry_after,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()).into())
    }
}

/// Map a non-success response to a [`ProviderError::Status`].
///
/// Resource Manager reports failures as `{"error": {"code", "message"}}`;
/// other bodies are passed through as the message.
pub fn parse_error_body(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ProviderError::Status {
            status,
            message: envelope
                .error
                .message
                .or_else(|| envelope.error.code.clone())
                .unwrap_or_default(),
            code: envelope.error.code,
        },
        Err(_) => ProviderError::Status {
            status,
            code: None,
            message: body.trim().to_string(),
        },
    }
}

/// Wait before retry number `attempt` (1-based): `base * 2^(attempt - 1)`,
/// capped at [`MAX_RETRY_DELAY`].
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
}

/// `Retry-After` in delta-seconds form. Resource Manager does not send the
/// HTTP-date form.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl ResourceClient for ArmClient {
    async fn fetch_page(
        &self,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> ProviderResult<Page> {
        let url = self.request_url(request);
        let mut attempt: u32 = 0;
        let mut requested_wait: Option<Duration> = None;

        loop {
            if attempt > 0 {
                let delay = requested_wait
                    .map(|wait| wait.min(MAX_RETRY_DELAY))
                    .unwrap_or_else(|| backoff_delay(self.options.base_delay, attempt));
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            debug!("GET {} (attempt {})", url, attempt + 1);
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                result = self.send_once(&url) => result,
            };

            match result {
                Ok(page) => return Ok(page),
                Err(rejection)
                    if rejection.error.is_retryable() && attempt < self.options.max_retries =>
                {
                    warn!(
                        "Request to {} failed (attempt {}/{}): {}",
                        url,
                        attempt + 1,
                        self.options.max_retries.saturating_add(1),
                        rejection.error
                    );
                    requested_wait = rejection.retry_after;
                    attempt += 1;
                }
                Err(rejection) => return Err(rejection.error),
            }
        }
    }
}
