//! Reporting engine: cache-aside retrieval, history queries and alerts.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    config::ReportingSettings,
    error::{Result, WeatherError},
    model::Location,
    record::WeatherRecord,
    resilience::ResilientSource,
    store::WeatherRecordStore,
};

pub use crate::units::{celsius_to_fahrenheit, fahrenheit_to_celsius};

#[derive(Debug)]
pub struct WeatherService {
    source: ResilientSource,
    store: Arc<dyn WeatherRecordStore>,
    settings: ReportingSettings,
}

impl WeatherService {
    pub fn new(
        source: ResilientSource,
        store: Arc<dyn WeatherRecordStore>,
        settings: ReportingSettings,
    ) -> Self {
        Self { source, store, settings }
    }

    pub fn settings(&self) -> &ReportingSettings {
        &self.settings
    }

    pub fn source(&self) -> &ResilientSource {
        &self.source
    }

    /// Current observation for `location`, served from the store while fresh.
    ///
    /// A stale or missing entry triggers exactly one upstream fetch. Upstream
    /// failures never surface here: the caller receives a degraded record.
    pub async fn get_current_weather(&self, location: &Location) -> Result<WeatherRecord> {
        validate(location)?;
        let key = location.cache_key();

        match self.store.find_most_recent_by_key(&key)? {
            Some(cached) if cached.is_fresh_within(self.settings.max_cache_age) => {
                tracing::debug!(%key, age_minutes = cached.age_minutes(), "cache hit");
                return Ok(cached);
            }
            Some(stale) => {
                tracing::debug!(%key, age_minutes = stale.age_minutes(), "cache entry stale");
            }
            None => tracing::debug!(%key, "cache miss"),
        }

        let fetched = self.source.fetch(location).await;
        if fetched.is_degraded() {
            return Ok(fetched);
        }

        tracing::info!(%key, provider = fetched.data_source(), "fetched fresh weather");
        match self.store.save(fetched.clone()) {
            Ok(saved) => Ok(saved),
            Err(e) => {
                tracing::warn!(%key, error = %e, "failed to cache weather record");
                Ok(fetched)
            }
        }
    }

    /// Stored observations fetched within `[start, end]`, newest first.
    pub fn get_historical_weather(
        &self,
        location: &Location,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<WeatherRecord>> {
        validate(location)?;
        if start > end {
            return Err(WeatherError::InvalidRange(format!(
                "start {start} is after end {end}"
            )));
        }
        self.store.find_by_key_and_fetched_between(&location.cache_key(), start, end)
    }

    /// Up to `limit` most recent stored observations, newest first.
    pub fn get_recent_weather(&self, location: &Location, limit: i64) -> Result<Vec<WeatherRecord>> {
        validate(location)?;
        if limit <= 0 {
            return Err(WeatherError::InvalidArgument(format!(
                "limit must be positive, got {limit}"
            )));
        }
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        self.store.find_recent_by_key(&location.cache_key(), limit)
    }

    pub fn clear_cache(&self, location: &Location) -> Result<()> {
        self.store.clear_for_key(&location.cache_key())
    }

    pub async fn is_source_available(&self) -> bool {
        self.source.is_available().await
    }

    /// Human-facing alerts for `record`; empty when alerting is disabled.
    pub fn analyze_for_alerts(&self, record: &WeatherRecord) -> Vec<String> {
        if !self.settings.alerts_enabled {
            return Vec::new();
        }
        derive_alerts(record)
    }
}

fn validate(location: &Location) -> Result<()> {
    if location.is_valid() {
        Ok(())
    } else {
        Err(WeatherError::InvalidLocation(format!(
            "'{location}' needs a city and country, or a postal code"
        )))
    }
}

/// Threshold alerts in a fixed order. Temperature yields at most one alert;
/// wind, visibility and UV are checked independently.
pub fn derive_alerts(record: &WeatherRecord) -> Vec<String> {
    let mut alerts = Vec::new();

    if record.condition().is_severe() {
        alerts.push(format!("SEVERE WEATHER ALERT: {}", record.condition().description));
    }

    if let Some(t) = record.temperature_f() {
        if t > 100.0 {
            alerts.push(format!("EXTREME HEAT WARNING: Temperature is {t:.1}°F"));
        } else if t > 90.0 {
            alerts.push(format!("HEAT ADVISORY: Temperature is {t:.1}°F"));
        } else if t < 0.0 {
            alerts.push(format!("EXTREME COLD WARNING: Temperature is {t:.1}°F"));
        } else if t < 20.0 {
            alerts.push(format!("COLD ADVISORY: Temperature is {t:.1}°F"));
        }
    }

    if let Some(mph) = record.wind_mph() {
        if mph > 50.0 {
            alerts.push(format!("HIGH WIND WARNING: Wind speed is {mph:.1} mph"));
        } else if mph > 30.0 {
            alerts.push(format!("WIND ADVISORY: Wind speed is {mph:.1} mph"));
        }
    }

    if let Some(miles) = record.visibility_miles().filter(|&v| v < 1.0) {
        alerts.push(format!("LOW VISIBILITY WARNING: Visibility is {miles:.2} miles"));
    }

    if let Some(uv) = record.uv_index().filter(|&uv| uv >= 8.0) {
        alerts.push(format!("UV ADVISORY: UV index is {uv:.0}"));
    }

    alerts
}
