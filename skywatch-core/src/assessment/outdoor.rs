use crate::{
    assessment::{
        AssessmentStrategy, UNKNOWN_RATING, clamp_rating, lacks_measurements,
        unavailable_description,
    },
    record::WeatherRecord,
};

/// Tuned for exercise and recreation: narrower comfort bands, only
/// outright severe weather counts as dangerous.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutdoorActivityStrategy;

fn temperature_points(f: f64) -> i32 {
    match f {
        f if (60.0..=75.0).contains(&f) => 3,
        f if (50.0..60.0).contains(&f) || (75.0..=85.0).contains(&f) => 1,
        f if (40.0..50.0).contains(&f) || (85.0..=95.0).contains(&f) => -1,
        _ => -3,
    }
}

fn humidity_points(percent: u8) -> i32 {
    match percent {
        30..=50 => 1,
        20..=29 | 51..=70 => 0,
        _ => -2,
    }
}

fn wind_points(mph: f64) -> i32 {
    if (3.0..=10.0).contains(&mph) {
        1
    } else if mph < 3.0 {
        0
    } else if mph <= 20.0 {
        -1
    } else {
        -2
    }
}

fn outlook(rating: u8) -> &'static str {
    match rating {
        9..=10 => "Excellent",
        7..=8 => "Good",
        5..=6 => "Fair",
        3..=4 => "Poor",
        _ => "Unsuitable",
    }
}

impl AssessmentStrategy for OutdoorActivityStrategy {
    fn name(&self) -> &'static str {
        "Outdoor Activity"
    }

    fn is_dangerous(&self, record: &WeatherRecord) -> bool {
        record.has_severe_conditions()
    }

    fn is_good_for_outdoor(&self, record: &WeatherRecord) -> bool {
        let (Some(t), Some(h), Some(w)) = (record.temperature(), record.humidity(), record.wind())
        else {
            return false;
        };
        !record.has_severe_conditions()
            && t.is_moderate()
            && !h.is_high()
            && !w.is_strong()
            && record.condition().is_outdoor_suitable()
    }

    fn comfort_rating(&self, record: &WeatherRecord) -> u8 {
        if lacks_measurements(record) {
            return UNKNOWN_RATING;
        }
        let mut score = 5;

        if let Some(t) = record.temperature() {
            score += temperature_points(t.fahrenheit());
        }
        if let Some(h) = record.humidity() {
            score += humidity_points(h.percent());
        }
        if let Some(w) = record.wind() {
            score += wind_points(w.mph());
        }

        let condition = record.condition();
        if condition.is_severe() {
            score -= 4;
        } else if condition.has_precipitation() {
            score -= 2;
        } else if condition.is_clear() {
            score += 1;
        }

        clamp_rating(score)
    }

    fn weather_description(&self, record: &WeatherRecord) -> String {
        let (Some(t), Some(h), Some(w)) = (record.temperature(), record.humidity(), record.wind())
        else {
            return unavailable_description(record);
        };

        let rating = self.comfort_rating(record);
        let mut notes = Vec::new();

        if record.has_severe_conditions() {
            notes.push("Severe weather: stay indoors.".to_string());
        }
        let f = t.fahrenheit();
        if (60.0..=75.0).contains(&f) {
            notes.push("Ideal temperature for exercise.".to_string());
        } else if f > 85.0 {
            notes.push(format!("Hot at {f:.0}°F: hydrate and avoid midday exertion."));
        } else if f < 40.0 {
            notes.push(format!("Cold at {f:.0}°F: dress in layers."));
        }
        if h.percent() > 70 {
            notes.push("High humidity will make exertion harder.".to_string());
        }
        if w.mph() > 10.0 {
            notes.push(format!("Breezy at {:.0} mph: expect headwinds on a bike.", w.mph()));
        }
        if record.condition().has_precipitation() {
            notes.push("Precipitation expected: consider an indoor alternative.".to_string());
        }

        let mut text = format!(
            "{} outlook for outdoor activities ({rating}/10): {}.",
            outlook(rating),
            record.condition()
        );
        for note in notes {
            text.push(' ');
            text.push_str(&note);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample;

    #[test]
    fn only_severe_weather_is_dangerous() {
        let s = OutdoorActivityStrategy;
        assert!(!s.is_dangerous(&sample(96.0, 65, 5.0, "clear")));
        assert!(s.is_dangerous(&sample(70.0, 50, 5.0, "hail")));
        assert!(s.is_dangerous(&sample(70.0, 50, 35.0, "clear")));
    }

    #[test]
    fn best_bands_score_ten() {
        // 5 + 3 + 1 + 1 + 1 = 11, clamped to 10
        assert_eq!(OutdoorActivityStrategy.comfort_rating(&sample(68.0, 40, 6.0, "sunny")), 10);
    }

    #[test]
    fn banded_penalties() {
        // 5 - 1 (88°F) - 2 (humidity 85) - 2 (25 mph) - 2 (rain) = -2 -> 1
        assert_eq!(OutdoorActivityStrategy.comfort_rating(&sample(88.0, 85, 25.0, "rain")), 1);
        // 5 + 1 (55°F) + 0 (60%) - 1 (15 mph) + 0 (overcast) = 5
        assert_eq!(OutdoorActivityStrategy.comfort_rating(&sample(55.0, 60, 15.0, "overcast")), 5);
    }

    #[test]
    fn outdoor_requires_every_condition() {
        let s = OutdoorActivityStrategy;
        assert!(s.is_good_for_outdoor(&sample(70.0, 50, 8.0, "partly cloudy")));
        assert!(!s.is_good_for_outdoor(&sample(70.0, 85, 8.0, "partly cloudy")));
        assert!(!s.is_good_for_outdoor(&sample(70.0, 50, 18.0, "partly cloudy")));
        assert!(!s.is_good_for_outdoor(&sample(70.0, 50, 8.0, "drizzle")));
    }

    #[test]
    fn description_gives_outlook_and_tips() {
        let text = OutdoorActivityStrategy.weather_description(&sample(92.0, 75, 12.0, "clear"));
        assert!(text.contains("outdoor activities"));
        assert!(text.contains("hydrate"));
        assert!(text.contains("humidity"));
        assert!(text.contains("Breezy"));
    }
}
