use crate::{
    config::{Config, HttpSettings},
    error::{ProviderError, ProviderErrorKind},
    model::Location,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
    record::WeatherRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use std::{convert::TryFrom, fmt::Debug};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// An upstream source of current observations.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Fetch the current observation for `location`. One outbound call.
    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, ProviderError>;

    /// Best-effort liveness probe. Never fails; any error reads as `false`.
    async fn is_available(&self) -> bool;

    fn provider_name(&self) -> &str;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherSource>> {
    let provider_config = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `skywatch configure {id}` and enter your API key."
        )
    })?;

    let http = build_http_client(&config.http)?;
    let api_key = provider_config.api_key.clone();

    let boxed: Box<dyn WeatherSource> = match id {
        ProviderId::OpenWeather => {
            let mut provider = OpenWeatherProvider::with_client(api_key, http);
            if let Some(url) = &provider_config.base_url {
                provider = provider.with_base_url(url.clone());
            }
            Box::new(provider)
        }
        ProviderId::WeatherApi => {
            let mut provider = WeatherApiProvider::with_client(api_key, http);
            if let Some(url) = &provider_config.base_url {
                provider = provider.with_base_url(url.clone());
            }
            Box::new(provider)
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

/// HTTP client bounded by the configured timeouts and pool size.
pub fn build_http_client(settings: &HttpSettings) -> anyhow::Result<Client> {
    let client = Client::builder()
        .connect_timeout(settings.connect_timeout())
        .timeout(settings.call_timeout())
        .pool_max_idle_per_host(settings.max_connections)
        .build()?;
    Ok(client)
}

/// Map a non-success upstream status to the error taxonomy.
pub fn classify_status(provider: &str, status: StatusCode, body: &str) -> ProviderError {
    let kind = match status.as_u16() {
        401 | 403 => ProviderErrorKind::AuthenticationFailed,
        404 => ProviderErrorKind::LocationNotFound,
        429 => ProviderErrorKind::RateLimited,
        s if s >= 500 => ProviderErrorKind::ServiceUnavailable,
        _ => ProviderErrorKind::Other,
    };

    let err = ProviderError::new(kind, provider, truncate_body(body)).with_status(status.as_u16());
    match kind {
        ProviderErrorKind::AuthenticationFailed => {
            tracing::error!(provider, status = status.as_u16(), "provider rejected credentials")
        }
        ProviderErrorKind::RateLimited => {
            tracing::warn!(provider, "provider rate limit reached")
        }
        _ => tracing::warn!(provider, status = status.as_u16(), "provider request failed"),
    }
    err
}

pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> ProviderError {
    let what = if err.is_timeout() { "request timed out" } else { "request failed" };
    tracing::warn!(provider, error = %err, "{what}");
    ProviderError::new(ProviderErrorKind::Transport, provider, format!("{what}: {err}"))
}

pub(crate) fn payload_error(provider: &str, message: impl Into<String>) -> ProviderError {
    ProviderError::new(ProviderErrorKind::InvalidPayload, provider, message)
}

pub(crate) fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::OpenWeather, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn default_provider_from_config_errors_when_not_set() {
        let cfg = Config::default();
        let err = default_provider_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No default provider configured"));
        assert!(msg.contains("Hint: run `skywatch configure"));
    }

    #[test]
    fn default_provider_from_config_works_when_set_and_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "KEY".to_string());

        let provider = default_provider_from_config(&cfg).unwrap();
        assert_eq!(provider.provider_name(), "weatherapi");
    }

    #[test]
    fn status_classification() {
        let kind = |code: u16| {
            classify_status("p", StatusCode::from_u16(code).unwrap(), "").kind
        };
        assert_eq!(kind(401), ProviderErrorKind::AuthenticationFailed);
        assert_eq!(kind(403), ProviderErrorKind::AuthenticationFailed);
        assert_eq!(kind(404), ProviderErrorKind::LocationNotFound);
        assert_eq!(kind(429), ProviderErrorKind::RateLimited);
        assert_eq!(kind(500), ProviderErrorKind::ServiceUnavailable);
        assert_eq!(kind(503), ProviderErrorKind::ServiceUnavailable);
        assert_eq!(kind(400), ProviderErrorKind::Other);
        assert_eq!(classify_status("p", StatusCode::IM_A_TEAPOT, "").status, Some(418));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "é".repeat(300);
        let short = truncate_body(&body);
        assert!(short.ends_with("..."));
        assert!(short.len() <= 203);
    }
}
