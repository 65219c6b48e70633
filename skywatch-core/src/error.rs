//! Error taxonomy for the weather core.
//!
//! Validation failures (`InvalidLocation`, `InvalidRange`, `InvalidArgument`,
//! `UnknownStrategy`) are returned straight to the caller and never retried.
//! `ProviderError` is produced by the source adapters and is normally absorbed
//! by [`crate::resilience::ResilientSource`] before it reaches the service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Unknown strategy '{0}'. Supported strategies: standard, outdoor_activity, travel_safety, health_impact.")]
    UnknownStrategy(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

/// Coarse classification of an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// 401/403. Retrying will not help until credentials change.
    AuthenticationFailed,
    /// 404 for the queried location.
    LocationNotFound,
    /// 429.
    RateLimited,
    /// 5xx.
    ServiceUnavailable,
    /// Connect/read failure or timeout.
    Transport,
    /// Body could not be parsed or lacks a required field.
    InvalidPayload,
    Other,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::AuthenticationFailed => "authentication failed",
            ProviderErrorKind::LocationNotFound => "location not found",
            ProviderErrorKind::RateLimited => "rate limited",
            ProviderErrorKind::ServiceUnavailable => "service unavailable",
            ProviderErrorKind::Transport => "transport failure",
            ProviderErrorKind::InvalidPayload => "invalid payload",
            ProviderErrorKind::Other => "provider error",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("{provider}: {kind} ({message}){}", status_suffix(.status))]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub provider: String,
    pub message: String,
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind, provider: provider.into(), message: message.into(), status: None }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::RateLimited
                | ProviderErrorKind::ServiceUnavailable
                | ProviderErrorKind::Transport
        )
    }

    pub fn is_fatal(&self) -> bool {
        self.kind == ProviderErrorKind::AuthenticationFailed
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" [status {code}]")).unwrap_or_default()
}
