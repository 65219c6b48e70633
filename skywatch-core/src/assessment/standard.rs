use crate::{
    assessment::{
        AssessmentStrategy, UNKNOWN_RATING, clamp_rating, lacks_measurements,
        unavailable_description,
    },
    record::WeatherRecord,
};

/// General-purpose reading built on the record's own classifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStrategy;

impl AssessmentStrategy for StandardStrategy {
    fn name(&self) -> &'static str {
        "Standard"
    }

    fn is_dangerous(&self, record: &WeatherRecord) -> bool {
        record.has_severe_conditions()
            || record.heat_index().is_some_and(|hi| hi > 105.0)
            || record.wind_chill().is_some_and(|wc| wc < -10.0)
    }

    fn is_good_for_outdoor(&self, record: &WeatherRecord) -> bool {
        record.is_favorable_for_outdoor()
    }

    fn comfort_rating(&self, record: &WeatherRecord) -> u8 {
        if lacks_measurements(record) {
            return UNKNOWN_RATING;
        }
        let mut score = 5;

        if let Some(t) = record.temperature() {
            if (65.0..=80.0).contains(&t.fahrenheit()) {
                score += 2;
            } else if t.is_moderate() {
                score += 1;
            } else {
                score -= 2;
            }
        }

        if let Some(h) = record.humidity() {
            if h.is_comfortable() {
                score += 1;
            } else if h.is_high() || h.is_low() {
                score -= 1;
            }
        }

        if record.wind().is_some_and(|w| w.is_strong()) {
            score -= 1;
        }

        let condition = record.condition();
        if condition.is_severe() {
            score -= 3;
        } else if condition.is_outdoor_suitable() {
            score += 1;
        }

        clamp_rating(score)
    }

    fn weather_description(&self, record: &WeatherRecord) -> String {
        let (Some(t), Some(h), Some(w)) = (record.temperature(), record.humidity(), record.wind())
        else {
            return unavailable_description(record);
        };

        let mut text = format!(
            "{} in {}: {}",
            record.condition(),
            record.location(),
            t,
        );
        if let Some(feels) = record.feels_like().filter(|f| (f - t.fahrenheit()).abs() >= 1.0) {
            text.push_str(&format!(", feels like {feels:.0}°F"));
        }
        text.push_str(&format!(
            ". Humidity {}% ({}), wind {} (Beaufort {}). Comfort {}/10.",
            h.percent(),
            h.comfort().as_str(),
            w,
            w.beaufort(),
            self.comfort_rating(record),
        ));

        if self.is_dangerous(record) {
            text.push_str(" Dangerous conditions: limit time outside.");
        } else if self.is_good_for_outdoor(record) {
            text.push_str(" A good day to be outside.");
        }
        text
    }
}
