//! The `WeatherRecord` aggregate and the physics derived from it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Humidity, Location, Temperature, WeatherCondition, WindSpeed};

pub const DEFAULT_MAX_AGE_MINUTES: i64 = 30;

/// Marker appended to the data-source label of degraded records.
pub const FALLBACK_SUFFIX: &str = "-fallback";

/// One observation for one location, immutable once built.
///
/// Temperature, humidity and wind are only absent on degraded records
/// produced when the upstream provider could not be reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    id: Option<Uuid>,
    location: Location,
    temperature: Option<Temperature>,
    humidity: Option<Humidity>,
    wind: Option<WindSpeed>,
    condition: WeatherCondition,
    pressure_inhg: Option<f64>,
    visibility_miles: Option<f64>,
    uv_index: Option<f64>,
    recorded_at: DateTime<Utc>,
    fetched_at: DateTime<Utc>,
    data_source: String,
}

/// Builder for [`WeatherRecord`]. Each quantity has already validated
/// itself on construction.
#[derive(Debug, Clone)]
pub struct WeatherRecordBuilder {
    record: WeatherRecord,
}

impl WeatherRecordBuilder {
    pub fn id(mut self, id: Uuid) -> Self {
        self.record.id = Some(id);
        self
    }

    pub fn temperature(mut self, temperature: Temperature) -> Self {
        self.record.temperature = Some(temperature);
        self
    }

    pub fn humidity(mut self, humidity: Humidity) -> Self {
        self.record.humidity = Some(humidity);
        self
    }

    pub fn wind(mut self, wind: WindSpeed) -> Self {
        self.record.wind = Some(wind);
        self
    }

    pub fn pressure_inhg(mut self, pressure: Option<f64>) -> Self {
        self.record.pressure_inhg = pressure;
        self
    }

    pub fn visibility_miles(mut self, visibility: Option<f64>) -> Self {
        self.record.visibility_miles = visibility;
        self
    }

    pub fn uv_index(mut self, uv: Option<f64>) -> Self {
        self.record.uv_index = uv;
        self
    }

    pub fn recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.record.recorded_at = at;
        self
    }

    pub fn fetched_at(mut self, at: DateTime<Utc>) -> Self {
        self.record.fetched_at = at;
        self
    }

    pub fn data_source(mut self, source: impl Into<String>) -> Self {
        self.record.data_source = source.into();
        self
    }

    pub fn build(self) -> WeatherRecord {
        self.record
    }
}

impl WeatherRecord {
    /// Start a record; both timestamps default to now.
    pub fn builder(location: Location, condition: WeatherCondition) -> WeatherRecordBuilder {
        let now = Utc::now();
        WeatherRecordBuilder {
            record: WeatherRecord {
                id: None,
                location,
                temperature: None,
                humidity: None,
                wind: None,
                condition,
                pressure_inhg: None,
                visibility_miles: None,
                uv_index: None,
                recorded_at: now,
                fetched_at: now,
                data_source: String::new(),
            },
        }
    }

    /// Degraded stand-in used when the provider is unreachable.
    pub fn unavailable(location: Location, provider: &str) -> Self {
        Self::builder(location, WeatherCondition::unavailable())
            .data_source(format!("{provider}{FALLBACK_SUFFIX}"))
            .build()
    }

    /// Copy carrying a store-assigned identity.
    pub fn with_id(&self, id: Uuid) -> Self {
        Self { id: Some(id), ..self.clone() }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn temperature(&self) -> Option<Temperature> {
        self.temperature
    }

    pub fn humidity(&self) -> Option<Humidity> {
        self.humidity
    }

    pub fn wind(&self) -> Option<WindSpeed> {
        self.wind
    }

    pub fn condition(&self) -> &WeatherCondition {
        &self.condition
    }

    pub fn pressure_inhg(&self) -> Option<f64> {
        self.pressure_inhg
    }

    pub fn visibility_miles(&self) -> Option<f64> {
        self.visibility_miles
    }

    pub fn uv_index(&self) -> Option<f64> {
        self.uv_index
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    pub fn is_degraded(&self) -> bool {
        self.data_source.ends_with(FALLBACK_SUFFIX)
    }

    pub fn temperature_f(&self) -> Option<f64> {
        self.temperature.map(|t| t.fahrenheit())
    }

    pub fn wind_mph(&self) -> Option<f64> {
        self.wind.map(|w| w.mph())
    }

    pub fn age_minutes(&self) -> i64 {
        self.age_minutes_at(Utc::now())
    }

    pub fn age_minutes_at(&self, now: DateTime<Utc>) -> i64 {
        (now - self.fetched_at).num_minutes()
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_within(Duration::minutes(DEFAULT_MAX_AGE_MINUTES))
    }

    pub fn is_fresh_within(&self, max_age: Duration) -> bool {
        Utc::now() - self.fetched_at <= max_age
    }

    pub fn has_severe_conditions(&self) -> bool {
        self.condition.is_severe()
            || self.temperature_f().is_some_and(|f| !(0.0..=100.0).contains(&f))
            || self.wind_mph().is_some_and(|mph| mph > 30.0)
    }

    /// Rothfusz regression of Steadman's apparent temperature. Below 80°F the
    /// actual temperature is returned.
    pub fn heat_index(&self) -> Option<f64> {
        let t = self.temperature_f()?;
        let Some(humidity) = self.humidity else {
            return Some(t);
        };
        if t < 80.0 {
            return Some(t);
        }
        let r = f64::from(humidity.percent());
        Some(
            -42.379 + 2.049_015_23 * t + 10.143_331_27 * r
                - 0.224_755_41 * t * r
                - 0.006_837_83 * t * t
                - 0.054_817_17 * r * r
                + 0.001_228_74 * t * t * r
                + 0.000_852_82 * t * r * r
                - 0.000_001_99 * t * t * r * r,
        )
    }

    /// North American / UK wind-chill index. Outside `T <= 50°F, V > 3 mph`
    /// the actual temperature is returned.
    pub fn wind_chill(&self) -> Option<f64> {
        let t = self.temperature_f()?;
        let Some(v) = self.wind_mph() else {
            return Some(t);
        };
        if t > 50.0 || v <= 3.0 {
            return Some(t);
        }
        let v16 = v.powf(0.16);
        Some(35.74 + 0.6215 * t - 35.75 * v16 + 0.4275 * t * v16)
    }

    pub fn feels_like(&self) -> Option<f64> {
        let t = self.temperature_f()?;
        if t > 80.0 {
            self.heat_index()
        } else if t <= 50.0 && self.wind_mph().is_some_and(|v| v > 3.0) {
            self.wind_chill()
        } else {
            Some(t)
        }
    }

    pub fn is_favorable_for_outdoor(&self) -> bool {
        let (Some(temperature), Some(humidity), Some(wind)) =
            (self.temperature, self.humidity, self.wind)
        else {
            return false;
        };
        !self.has_severe_conditions()
            && self.condition.is_outdoor_suitable()
            && temperature.is_moderate()
            && !humidity.is_high()
            && !wind.is_strong()
    }
}
