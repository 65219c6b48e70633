//! Immutable value objects: location and the physical quantities an
//! observation is made of.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, WeatherError},
    units,
};

/// Where an observation applies. Valid when city and country are both set,
/// or when a postal code is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    /// ISO-3166 alpha-2 code.
    pub country: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

impl Location {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self { city: city.into(), country: country.into(), state: None, postal_code: None }
    }

    pub fn from_postal_code(postal_code: impl Into<String>) -> Self {
        Self {
            city: String::new(),
            country: String::new(),
            state: None,
            postal_code: Some(postal_code.into()),
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn is_valid(&self) -> bool {
        let has_city = !self.city.trim().is_empty();
        let has_country = !self.country.trim().is_empty();
        (has_city && has_country) || self.postal_code().is_some()
    }

    /// Identity under which cached records are grouped: the postal code when
    /// present, otherwise the normalized `city|state|country` triple.
    pub fn cache_key(&self) -> String {
        match self.postal_code() {
            Some(postal) => postal.to_uppercase(),
            None => format!(
                "{}|{}|{}",
                self.city.trim().to_lowercase(),
                self.state().unwrap_or_default().to_lowercase(),
                self.country.trim().to_lowercase(),
            ),
        }
    }

    /// Free-text `city,state,country` query used by providers that lack a
    /// postal-code lookup.
    pub fn query_string(&self) -> String {
        let mut parts = vec![self.city.trim()];
        if let Some(state) = self.state() {
            parts.push(state);
        }
        parts.push(self.country.trim());
        parts.retain(|p| !p.is_empty());
        parts.join(",")
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let query = self.query_string();
        match (query.is_empty(), self.postal_code()) {
            (false, Some(postal)) => write!(f, "{query} ({postal})"),
            (true, Some(postal)) => f.write_str(postal),
            _ => f.write_str(&query),
        }
    }
}

/// Temperature with both scales kept consistent at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    fahrenheit: f64,
    celsius: f64,
}

impl Temperature {
    pub const HOT_ABOVE_F: f64 = 85.0;
    pub const COLD_AT_OR_BELOW_F: f64 = 32.0;

    pub fn from_fahrenheit(fahrenheit: f64) -> Self {
        Self { fahrenheit, celsius: units::fahrenheit_to_celsius(fahrenheit) }
    }

    pub fn from_celsius(celsius: f64) -> Self {
        Self { fahrenheit: units::celsius_to_fahrenheit(celsius), celsius }
    }

    pub fn fahrenheit(&self) -> f64 {
        self.fahrenheit
    }

    pub fn celsius(&self) -> f64 {
        self.celsius
    }

    pub fn is_hot(&self) -> bool {
        self.fahrenheit > Self::HOT_ABOVE_F
    }

    pub fn is_cold(&self) -> bool {
        self.fahrenheit <= Self::COLD_AT_OR_BELOW_F
    }

    pub fn is_moderate(&self) -> bool {
        !self.is_hot() && !self.is_cold()
    }
}

impl std::fmt::Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}°F ({:.1}°C)", self.fahrenheit, self.celsius)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumidityComfort {
    TooDry,
    Dry,
    Comfortable,
    Humid,
    TooHumid,
}

impl HumidityComfort {
    pub fn as_str(&self) -> &'static str {
        match self {
            HumidityComfort::TooDry => "too dry",
            HumidityComfort::Dry => "dry",
            HumidityComfort::Comfortable => "comfortable",
            HumidityComfort::Humid => "humid",
            HumidityComfort::TooHumid => "too humid",
        }
    }
}

/// Relative humidity, whole percent in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Humidity(u8);

impl Humidity {
    pub fn new(percent: i32) -> Result<Self> {
        if !(0..=100).contains(&percent) {
            return Err(WeatherError::InvalidArgument(format!(
                "humidity must be between 0 and 100, got {percent}"
            )));
        }
        Ok(Self(percent as u8))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    pub fn is_high(&self) -> bool {
        self.0 > 80
    }

    pub fn is_low(&self) -> bool {
        self.0 < 20
    }

    pub fn is_comfortable(&self) -> bool {
        (30..=60).contains(&self.0)
    }

    pub fn comfort(&self) -> HumidityComfort {
        match self.0 {
            0..=19 => HumidityComfort::TooDry,
            20..=29 => HumidityComfort::Dry,
            30..=60 => HumidityComfort::Comfortable,
            61..=80 => HumidityComfort::Humid,
            _ => HumidityComfort::TooHumid,
        }
    }
}

impl TryFrom<i32> for Humidity {
    type Error = WeatherError;

    fn try_from(value: i32) -> Result<Self> {
        Humidity::new(value)
    }
}

impl From<Humidity> for i32 {
    fn from(value: Humidity) -> Self {
        value.0 as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindCategory {
    Calm,
    Moderate,
    Strong,
    Dangerous,
}

/// Wind speed, stored in mph.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct WindSpeed {
    mph: f64,
}

/// Lower mph bound of Beaufort forces 1 through 12.
const BEAUFORT_LOWER_BOUNDS_MPH: [f64; 12] =
    [1.0, 4.0, 8.0, 13.0, 19.0, 25.0, 32.0, 39.0, 47.0, 55.0, 64.0, 73.0];

impl WindSpeed {
    pub fn from_mph(mph: f64) -> Result<Self> {
        Self::checked(mph, "mph")
    }

    pub fn from_kph(kph: f64) -> Result<Self> {
        Self::checked(kph, "kph").map(|w| Self { mph: units::kph_to_mph(w.mph) })
    }

    pub fn from_mps(mps: f64) -> Result<Self> {
        Self::checked(mps, "m/s").map(|w| Self { mph: units::mps_to_mph(w.mph) })
    }

    pub fn from_knots(knots: f64) -> Result<Self> {
        Self::checked(knots, "knots").map(|w| Self { mph: units::knots_to_mph(w.mph) })
    }

    fn checked(value: f64, unit: &str) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(WeatherError::InvalidArgument(format!(
                "wind speed must be a non-negative number, got {value} {unit}"
            )));
        }
        Ok(Self { mph: value })
    }

    pub fn mph(&self) -> f64 {
        self.mph
    }

    pub fn kph(&self) -> f64 {
        units::mph_to_kph(self.mph)
    }

    pub fn mps(&self) -> f64 {
        units::mph_to_mps(self.mph)
    }

    pub fn knots(&self) -> f64 {
        units::mph_to_knots(self.mph)
    }

    pub fn category(&self) -> WindCategory {
        if self.mph < 5.0 {
            WindCategory::Calm
        } else if self.mph <= 15.0 {
            WindCategory::Moderate
        } else if self.mph <= 30.0 {
            WindCategory::Strong
        } else {
            WindCategory::Dangerous
        }
    }

    pub fn is_calm(&self) -> bool {
        self.category() == WindCategory::Calm
    }

    pub fn is_moderate(&self) -> bool {
        self.category() == WindCategory::Moderate
    }

    /// Above 15 mph, dangerous winds included.
    pub fn is_strong(&self) -> bool {
        self.mph > 15.0
    }

    pub fn is_dangerous(&self) -> bool {
        self.category() == WindCategory::Dangerous
    }

    pub fn beaufort(&self) -> u8 {
        BEAUFORT_LOWER_BOUNDS_MPH.iter().take_while(|&&bound| self.mph >= bound).count() as u8
    }
}

impl std::fmt::Display for WindSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} mph", self.mph)
    }
}

const SEVERE_KEYWORDS: &[&str] = &[
    "thunderstorm",
    "tornado",
    "hurricane",
    "tropical storm",
    "blizzard",
    "hail",
    "ice storm",
    "freezing rain",
    "squall",
    "severe",
    "extreme",
];
const CLEAR_KEYWORDS: &[&str] = &["clear", "sunny", "fair"];
const CLOUDY_KEYWORDS: &[&str] = &["cloud", "overcast", "partly", "fog", "mist", "haze"];
const RAINY_KEYWORDS: &[&str] = &["rain", "drizzle", "shower"];
const SNOWY_KEYWORDS: &[&str] = &["snow", "sleet", "flurr", "ice pellets"];

/// Sentinel description carried by degraded records.
pub const UNAVAILABLE_DESCRIPTION: &str = "data unavailable";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub description: String,
    pub icon: Option<String>,
}

impl WeatherCondition {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), icon: None }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn unavailable() -> Self {
        Self::new(UNAVAILABLE_DESCRIPTION)
    }

    fn matches_any(&self, vocabulary: &[&str]) -> bool {
        let lower = self.description.to_lowercase();
        vocabulary.iter().any(|word| lower.contains(word))
    }

    pub fn is_severe(&self) -> bool {
        self.matches_any(SEVERE_KEYWORDS)
    }

    pub fn is_clear(&self) -> bool {
        self.matches_any(CLEAR_KEYWORDS)
    }

    pub fn is_cloudy(&self) -> bool {
        self.matches_any(CLOUDY_KEYWORDS)
    }

    pub fn is_rainy(&self) -> bool {
        self.matches_any(RAINY_KEYWORDS)
    }

    pub fn is_snowy(&self) -> bool {
        self.matches_any(SNOWY_KEYWORDS)
    }

    pub fn has_precipitation(&self) -> bool {
        self.is_rainy() || self.is_snowy()
    }

    pub fn is_outdoor_suitable(&self) -> bool {
        if self.is_severe() {
            return false;
        }
        self.is_clear() || (self.is_cloudy() && !self.has_precipitation())
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_validity() {
        assert!(Location::new("Austin", "US").is_valid());
        assert!(Location::from_postal_code("78701").is_valid());
        assert!(!Location::new("Austin", "").is_valid());
        assert!(!Location::new("", "US").is_valid());
        assert!(!Location::new("  ", "US").with_postal_code("  ").is_valid());
    }

    #[test]
    fn cache_key_prefers_postal_code() {
        let with_postal = Location::new("Austin", "US").with_postal_code(" 78701 ");
        assert_eq!(with_postal.cache_key(), "78701");

        let without = Location::new("Austin", "US").with_state("TX");
        assert_eq!(without.cache_key(), "austin|tx|us");
        assert_eq!(without.query_string(), "Austin,TX,US");
    }

    #[test]
    fn temperature_scales_stay_consistent() {
        let t = Temperature::from_celsius(37.0);
        assert!((t.fahrenheit() - 98.6).abs() < 1e-9);
        let t = Temperature::from_fahrenheit(212.0);
        assert!((t.celsius() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn temperature_classification() {
        assert!(Temperature::from_fahrenheit(85.1).is_hot());
        assert!(Temperature::from_fahrenheit(85.0).is_moderate());
        assert!(Temperature::from_fahrenheit(32.0).is_cold());
        assert!(Temperature::from_fahrenheit(32.1).is_moderate());
    }

    #[test]
    fn humidity_rejects_out_of_range() {
        for bad in [-1, 101, 150, i32::MIN] {
            assert!(matches!(Humidity::new(bad), Err(WeatherError::InvalidArgument(_))));
        }
        for good in 0..=100 {
            assert!(Humidity::new(good).is_ok());
        }
    }

    #[test]
    fn humidity_predicates_are_mutually_exclusive() {
        for p in 0..=100 {
            let h = Humidity::new(p).unwrap();
            let flags = [h.is_high(), h.is_low(), h.is_comfortable()];
            assert!(flags.iter().filter(|&&f| f).count() <= 1, "percent {p}");
        }
    }

    #[test]
    fn humidity_comfort_bands() {
        assert_eq!(Humidity::new(10).unwrap().comfort(), HumidityComfort::TooDry);
        assert_eq!(Humidity::new(25).unwrap().comfort(), HumidityComfort::Dry);
        assert_eq!(Humidity::new(45).unwrap().comfort(), HumidityComfort::Comfortable);
        assert_eq!(Humidity::new(70).unwrap().comfort(), HumidityComfort::Humid);
        assert_eq!(Humidity::new(95).unwrap().comfort(), HumidityComfort::TooHumid);
    }

    #[test]
    fn zero_wind_is_calm_in_any_unit() {
        assert!(WindSpeed::from_kph(0.0).unwrap().is_calm());
        assert!(WindSpeed::from_mph(0.0).unwrap().is_calm());
    }

    #[test]
    fn negative_wind_is_rejected() {
        assert!(WindSpeed::from_mph(-1.0).is_err());
        assert!(WindSpeed::from_kph(-0.1).is_err());
        assert!(WindSpeed::from_mps(-3.0).is_err());
        assert!(WindSpeed::from_knots(-2.0).is_err());
        assert!(WindSpeed::from_mph(f64::NAN).is_err());
    }

    #[test]
    fn wind_categories() {
        assert_eq!(WindSpeed::from_mph(4.9).unwrap().category(), WindCategory::Calm);
        assert_eq!(WindSpeed::from_mph(5.0).unwrap().category(), WindCategory::Moderate);
        assert_eq!(WindSpeed::from_mph(15.0).unwrap().category(), WindCategory::Moderate);
        assert_eq!(WindSpeed::from_mph(15.5).unwrap().category(), WindCategory::Strong);
        assert_eq!(WindSpeed::from_mph(30.0).unwrap().category(), WindCategory::Strong);
        assert_eq!(WindSpeed::from_mph(30.1).unwrap().category(), WindCategory::Dangerous);
        assert!(WindSpeed::from_mph(31.0).unwrap().is_strong());
    }

    #[test]
    fn beaufort_boundaries() {
        let scale = |mph: f64| WindSpeed::from_mph(mph).unwrap().beaufort();
        assert_eq!(scale(0.0), 0);
        assert_eq!(scale(0.9), 0);
        assert_eq!(scale(1.0), 1);
        assert_eq!(scale(7.9), 2);
        assert_eq!(scale(8.0), 3);
        assert_eq!(scale(72.9), 11);
        assert_eq!(scale(73.0), 12);
        assert_eq!(scale(120.0), 12);
    }

    #[test]
    fn wind_unit_accessors() {
        let w = WindSpeed::from_kph(16.09344).unwrap();
        assert!((w.mph() - 10.0).abs() < 1e-9);
        assert!((w.kph() - 16.09344).abs() < 1e-9);
        let w = WindSpeed::from_mps(10.0).unwrap();
        assert!((w.mps() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn condition_vocabulary_is_case_insensitive() {
        assert!(WeatherCondition::new("TORNADO warning").is_severe());
        assert!(WeatherCondition::new("Sunny").is_clear());
        assert!(WeatherCondition::new("Light Rain Showers").is_rainy());
        assert!(WeatherCondition::new("snow flurries").is_snowy());
        assert!(WeatherCondition::new("Overcast clouds").is_cloudy());
    }

    #[test]
    fn outdoor_suitability() {
        assert!(WeatherCondition::new("clear sky").is_outdoor_suitable());
        assert!(WeatherCondition::new("partly cloudy").is_outdoor_suitable());
        assert!(!WeatherCondition::new("cloudy with light rain").is_outdoor_suitable());
        assert!(!WeatherCondition::new("thunderstorm").is_outdoor_suitable());
        assert!(!WeatherCondition::unavailable().is_outdoor_suitable());
    }
}
