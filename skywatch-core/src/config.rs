use anyhow::{Context, Result, anyhow};
use chrono::Duration as ChronoDuration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{assessment::StrategyKind, provider::ProviderId};

/// Configuration for a single provider (API key, optional endpoint override).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Replaces the provider's public endpoint, e.g. for a proxy or a test server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_age_minutes: i64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { max_age_minutes: crate::record::DEFAULT_MAX_AGE_MINUTES }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub enabled: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Outbound HTTP limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub max_connections: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { connect_timeout_ms: 5_000, read_timeout_ms: 10_000, max_connections: 10 }
    }
}

impl HttpSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Upper bound for one complete outbound call.
    pub fn call_timeout(&self) -> Duration {
        self.connect_timeout() + self.read_timeout()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Time the circuit stays open before a trial call is let through.
    pub cool_down_secs: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self { failure_threshold: 5, cool_down_secs: 60 }
    }
}

impl BreakerSettings {
    pub fn cool_down(&self) -> Duration {
        Duration::from_secs(self.cool_down_secs)
    }
}

/// What the reporting service needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportingSettings {
    pub max_cache_age: ChronoDuration,
    pub alerts_enabled: bool,
}

impl Default for ReportingSettings {
    fn default() -> Self {
        Self {
            max_cache_age: ChronoDuration::minutes(crate::record::DEFAULT_MAX_AGE_MINUTES),
            alerts_enabled: true,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "weatherapi".
    pub default_provider: Option<String>,

    /// Optional default assessment strategy, e.g. "travel_safety".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_strategy: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub alerts: AlertSettings,

    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub circuit_breaker: BreakerSettings,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `skywatch configure <provider>` (e.g. `skywatch configure openweather`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    /// Strategy the assessor starts with; `standard` when unset.
    pub fn default_strategy_kind(&self) -> Result<StrategyKind> {
        match &self.default_strategy {
            None => Ok(StrategyKind::default()),
            Some(name) => StrategyKind::try_from(name.as_str())
                .with_context(|| format!("Invalid default_strategy in config: '{name}'")),
        }
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    pub fn set_default_strategy(&mut self, kind: StrategyKind) {
        self.default_strategy = Some(kind.as_str().to_string());
    }

    pub fn reporting_settings(&self) -> ReportingSettings {
        ReportingSettings {
            max_cache_age: ChronoDuration::minutes(self.cache.max_age_minutes),
            alerts_enabled: self.alerts.enabled,
        }
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skywatch", "skywatch")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        let base_url = self.provider_config(provider_id).and_then(|cfg| cfg.base_url.clone());
        self.providers
            .insert(provider_id.as_str().to_string(), ProviderConfig { api_key, base_url });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }
}
