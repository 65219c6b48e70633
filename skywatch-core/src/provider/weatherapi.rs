use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    model::{Humidity, Location, Temperature, WeatherCondition, WindSpeed},
    provider::{classify_status, payload_error, transport_error, truncate_body, unix_to_utc},
    record::WeatherRecord,
    units,
};

use super::WeatherSource;

const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1";
const NAME: &str = "weatherapi";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    http: Client,
    base_url: String,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_client(api_key, Client::new())
    }

    pub fn with_client(api_key: String, http: Client) -> Self {
        Self { api_key, http, base_url: DEFAULT_BASE_URL.to_string() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn location_query(location: &Location) -> String {
        location
            .postal_code()
            .map(str::to_string)
            .unwrap_or_else(|| location.query_string())
    }

    async fn fetch_current(&self, location: &Location) -> Result<WaResponse, ProviderError> {
        let url = format!("{}/current.json", self.base_url);
        let query = Self::location_query(location);

        tracing::debug!(provider = NAME, %location, "requesting current conditions");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", query.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(NAME, e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| transport_error(NAME, e))?;

        if !status.is_success() {
            return Err(classify_status(NAME, status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            payload_error(NAME, format!("failed to parse current JSON: {e}: {}", truncate_body(&body)))
        })
    }

    fn to_record(location: &Location, parsed: WaResponse) -> Result<WeatherRecord, ProviderError> {
        let current = parsed.current.ok_or_else(|| payload_error(NAME, "missing 'current' block"))?;

        let temperature = match (current.temp_f, current.temp_c) {
            (Some(f), _) => Temperature::from_fahrenheit(f),
            (None, Some(c)) => Temperature::from_celsius(c),
            (None, None) => return Err(payload_error(NAME, "missing temperature")),
        };
        let humidity = current.humidity.ok_or_else(|| payload_error(NAME, "missing humidity"))?;
        let humidity = Humidity::new(humidity).map_err(|e| payload_error(NAME, e.to_string()))?;
        let wind = match (current.wind_mph, current.wind_kph) {
            (Some(mph), _) => WindSpeed::from_mph(mph),
            (None, Some(kph)) => WindSpeed::from_kph(kph),
            (None, None) => return Err(payload_error(NAME, "missing wind speed")),
        }
        .map_err(|e| payload_error(NAME, e.to_string()))?;
        let condition = current
            .condition
            .ok_or_else(|| payload_error(NAME, "missing weather condition"))?;

        let mut weather_condition = WeatherCondition::new(condition.text);
        if let Some(icon) = condition.icon {
            weather_condition = weather_condition.with_icon(icon);
        }

        let now = Utc::now();
        let recorded_at = current
            .last_updated_epoch
            .or(parsed.location.and_then(|l| l.localtime_epoch))
            .and_then(unix_to_utc)
            .unwrap_or(now);
        let visibility = current.vis_miles.or(current.vis_km.map(units::km_to_miles));

        Ok(WeatherRecord::builder(location.clone(), weather_condition)
            .temperature(temperature)
            .humidity(humidity)
            .wind(wind)
            .pressure_inhg(current.pressure_mb.map(units::hpa_to_inhg))
            .visibility_miles(visibility)
            .uv_index(current.uv)
            .recorded_at(recorded_at)
            .fetched_at(now)
            .data_source(NAME)
            .build())
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    localtime_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_f: Option<f64>,
    temp_c: Option<f64>,
    humidity: Option<i32>,
    wind_mph: Option<f64>,
    wind_kph: Option<f64>,
    pressure_mb: Option<f64>,
    vis_miles: Option<f64>,
    vis_km: Option<f64>,
    uv: Option<f64>,
    condition: Option<WaCondition>,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: Option<WaLocation>,
    current: Option<WaCurrent>,
}

#[async_trait]
impl WeatherSource for WeatherApiProvider {
    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, ProviderError> {
        let parsed = self.fetch_current(location).await?;
        Self::to_record(location, parsed)
    }

    async fn is_available(&self) -> bool {
        let probe = Location::new("London", "GB");
        match self.fetch_current(&probe).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(provider = NAME, error = %e, "availability probe failed");
                false
            }
        }
    }

    fn provider_name(&self) -> &str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_prefers_postal_code() {
        let loc = Location::new("Austin", "US").with_postal_code("78701");
        assert_eq!(WeatherApiProvider::location_query(&loc), "78701");
        let loc = Location::new("Austin", "US").with_state("TX");
        assert_eq!(WeatherApiProvider::location_query(&loc), "Austin,TX,US");
    }

    #[test]
    fn metric_only_payload_is_normalized() {
        let parsed: WaResponse = serde_json::from_str(
            r#"{
                "location": { "localtime_epoch": 1700000000 },
                "current": {
                    "temp_c": 0.0,
                    "humidity": 75,
                    "wind_kph": 16.09344,
                    "pressure_mb": 1000.0,
                    "vis_km": 1.609344,
                    "uv": 2.0,
                    "condition": { "text": "Light snow", "icon": "//cdn/snow.png" }
                }
            }"#,
        )
        .unwrap();

        let record = WeatherApiProvider::to_record(&Location::new("Oslo", "NO"), parsed).unwrap();
        assert!((record.temperature_f().unwrap() - 32.0).abs() < 1e-9);
        assert!((record.wind_mph().unwrap() - 10.0).abs() < 1e-9);
        assert!((record.visibility_miles().unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(record.uv_index(), Some(2.0));
        assert_eq!(record.recorded_at().timestamp(), 1_700_000_000);
        assert!(record.condition().is_snowy());
    }

    #[test]
    fn out_of_range_humidity_is_a_payload_error() {
        let parsed: WaResponse = serde_json::from_str(
            r#"{ "current": { "temp_f": 70.0, "humidity": 140, "wind_mph": 3.0, "condition": { "text": "Sunny" } } }"#,
        )
        .unwrap();
        let err = WeatherApiProvider::to_record(&Location::new("Oslo", "NO"), parsed).unwrap_err();
        assert_eq!(err.kind, crate::error::ProviderErrorKind::InvalidPayload);
    }
}
