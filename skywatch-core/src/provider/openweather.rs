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

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const NAME: &str = "openweather";

/// Unit system requested from OpenWeather. Whatever comes back is
/// normalized to °F and mph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwUnits {
    /// Kelvin, m/s.
    Standard,
    /// Celsius, m/s.
    Metric,
    /// Fahrenheit, mph.
    #[default]
    Imperial,
}

impl OwUnits {
    fn as_str(&self) -> &'static str {
        match self {
            OwUnits::Standard => "standard",
            OwUnits::Metric => "metric",
            OwUnits::Imperial => "imperial",
        }
    }

    fn temperature(&self, value: f64) -> Temperature {
        match self {
            OwUnits::Standard => Temperature::from_fahrenheit(units::kelvin_to_fahrenheit(value)),
            OwUnits::Metric => Temperature::from_celsius(value),
            OwUnits::Imperial => Temperature::from_fahrenheit(value),
        }
    }

    fn wind(&self, value: f64) -> crate::error::Result<WindSpeed> {
        match self {
            OwUnits::Standard | OwUnits::Metric => WindSpeed::from_mps(value),
            OwUnits::Imperial => WindSpeed::from_mph(value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    base_url: String,
    units: OwUnits,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_client(api_key, Client::new())
    }

    pub fn with_client(api_key: String, http: Client) -> Self {
        Self { api_key, http, base_url: DEFAULT_BASE_URL.to_string(), units: OwUnits::default() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_units(mut self, units: OwUnits) -> Self {
        self.units = units;
        self
    }

    /// Postal code (scoped by country when known) is preferred over the
    /// free-text city query.
    fn location_query(location: &Location) -> (&'static str, String) {
        match location.postal_code() {
            Some(postal) if !location.country.trim().is_empty() => {
                ("zip", format!("{postal},{}", location.country.trim()))
            }
            Some(postal) => ("zip", postal.to_string()),
            None => ("q", location.query_string()),
        }
    }

    async fn fetch_current(&self, location: &Location) -> Result<OwCurrentResponse, ProviderError> {
        let url = format!("{}/weather", self.base_url);
        let (param, query) = Self::location_query(location);

        tracing::debug!(provider = NAME, %location, "requesting current conditions");

        let res = self
            .http
            .get(&url)
            .query(&[
                (param, query.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
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

    fn to_record(&self, location: &Location, parsed: OwCurrentResponse) -> Result<WeatherRecord, ProviderError> {
        let main = parsed.main.ok_or_else(|| payload_error(NAME, "missing 'main' block"))?;
        let temp = main.temp.ok_or_else(|| payload_error(NAME, "missing temperature"))?;
        let humidity = main.humidity.ok_or_else(|| payload_error(NAME, "missing humidity"))?;
        let wind = parsed
            .wind
            .and_then(|w| w.speed)
            .ok_or_else(|| payload_error(NAME, "missing wind speed"))?;
        let weather = parsed
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| payload_error(NAME, "missing weather condition"))?;

        let humidity = Humidity::new(humidity).map_err(|e| payload_error(NAME, e.to_string()))?;
        let wind = self.units.wind(wind).map_err(|e| payload_error(NAME, e.to_string()))?;

        let mut condition = WeatherCondition::new(weather.description);
        if let Some(icon) = weather.icon {
            condition = condition.with_icon(icon);
        }

        let now = Utc::now();
        let recorded_at = parsed.dt.and_then(unix_to_utc).unwrap_or(now);

        Ok(WeatherRecord::builder(location.clone(), condition)
            .temperature(self.units.temperature(temp))
            .humidity(humidity)
            .wind(wind)
            .pressure_inhg(main.pressure.map(units::hpa_to_inhg))
            .visibility_miles(parsed.visibility.map(units::meters_to_miles))
            .uv_index(None)
            .recorded_at(recorded_at)
            .fetched_at(now)
            .data_source(NAME)
            .build())
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    humidity: Option<i32>,
    /// hPa.
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: Option<i64>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    /// Meters.
    visibility: Option<f64>,
}

#[async_trait]
impl WeatherSource for OpenWeatherProvider {
    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, ProviderError> {
        let parsed = self.fetch_current(location).await?;
        self.to_record(location, parsed)
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
    fn postal_code_query_is_scoped_by_country() {
        let loc = Location::new("Austin", "US").with_postal_code("78701");
        assert_eq!(OpenWeatherProvider::location_query(&loc), ("zip", "78701,US".to_string()));

        let loc = Location::from_postal_code("78701");
        assert_eq!(OpenWeatherProvider::location_query(&loc), ("zip", "78701".to_string()));

        let loc = Location::new("Austin", "US").with_state("TX");
        assert_eq!(OpenWeatherProvider::location_query(&loc), ("q", "Austin,TX,US".to_string()));
    }

    #[test]
    fn metric_payload_is_normalized() {
        let provider = OpenWeatherProvider::new("k".into()).with_units(OwUnits::Metric);
        let parsed: OwCurrentResponse = serde_json::from_str(
            r#"{
                "dt": 1700000000,
                "main": { "temp": 20.0, "humidity": 40, "pressure": 1000.0 },
                "weather": [{ "description": "clear sky", "icon": "01d" }],
                "wind": { "speed": 10.0 },
                "visibility": 1609.344
            }"#,
        )
        .unwrap();

        let record = provider.to_record(&Location::new("Austin", "US"), parsed).unwrap();
        assert!((record.temperature_f().unwrap() - 68.0).abs() < 1e-9);
        assert!((record.wind_mph().unwrap() - 22.369_362_920_544_02).abs() < 1e-6);
        assert!((record.pressure_inhg().unwrap() - 29.53).abs() < 1e-9);
        assert!((record.visibility_miles().unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(record.condition().icon.as_deref(), Some("01d"));
        assert_eq!(record.recorded_at().timestamp(), 1_700_000_000);
    }

    #[test]
    fn missing_required_field_is_a_payload_error() {
        let provider = OpenWeatherProvider::new("k".into());
        let parsed: OwCurrentResponse = serde_json::from_str(
            r#"{ "main": { "temp": 70.0 }, "weather": [{ "description": "clear" }], "wind": { "speed": 3.0 } }"#,
        )
        .unwrap();
        let err = provider.to_record(&Location::new("Austin", "US"), parsed).unwrap_err();
        assert_eq!(err.kind, crate::error::ProviderErrorKind::InvalidPayload);
        assert!(err.message.contains("humidity"));
    }
}
