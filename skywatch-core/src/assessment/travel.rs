use crate::{
    assessment::{
        AssessmentStrategy, UNKNOWN_RATING, clamp_rating, lacks_measurements,
        unavailable_description,
    },
    record::WeatherRecord,
};

/// Road-travel reading. The comfort rating is a safety score and
/// "good for outdoor" means "safe to travel".
#[derive(Debug, Clone, Copy, Default)]
pub struct TravelSafetyStrategy;

const FREEZING_F: f64 = 32.0;
const NEAR_FREEZING_F: f64 = 35.0;

fn visibility_penalty(miles: f64) -> i32 {
    if miles < 0.25 {
        5
    } else if miles < 0.5 {
        4
    } else if miles < 1.0 {
        3
    } else if miles < 3.0 {
        1
    } else {
        0
    }
}

fn wind_penalty(mph: f64) -> i32 {
    if mph > 40.0 {
        4
    } else if mph > 30.0 {
        3
    } else if mph > 20.0 {
        1
    } else {
        0
    }
}

fn risk_label(score: u8) -> &'static str {
    match score {
        8..=10 => "safe",
        5..=7 => "use caution",
        3..=4 => "hazardous",
        _ => "dangerous",
    }
}

impl AssessmentStrategy for TravelSafetyStrategy {
    fn name(&self) -> &'static str {
        "Travel Safety"
    }

    fn is_dangerous(&self, record: &WeatherRecord) -> bool {
        record.has_severe_conditions()
            || record.temperature_f().is_some_and(|f| f <= FREEZING_F)
            || record.visibility_miles().is_some_and(|v| v < 1.0)
            || record.wind_mph().is_some_and(|mph| mph > 30.0)
    }

    fn is_good_for_outdoor(&self, record: &WeatherRecord) -> bool {
        !lacks_measurements(record) && !self.is_dangerous(record)
    }

    fn comfort_rating(&self, record: &WeatherRecord) -> u8 {
        if lacks_measurements(record) {
            return UNKNOWN_RATING;
        }
        let mut score = 10;

        if let Some(f) = record.temperature_f() {
            if f <= FREEZING_F {
                score -= 3;
            } else if f <= NEAR_FREEZING_F {
                score -= 1;
            }
        }
        if let Some(miles) = record.visibility_miles() {
            score -= visibility_penalty(miles);
        }
        if let Some(mph) = record.wind_mph() {
            score -= wind_penalty(mph);
        }
        if record.has_severe_conditions() {
            score -= 4;
        }

        clamp_rating(score)
    }

    fn weather_description(&self, record: &WeatherRecord) -> String {
        let (Some(f), Some(mph)) = (record.temperature_f(), record.wind_mph()) else {
            return unavailable_description(record);
        };

        let score = self.comfort_rating(record);
        let mut text = format!("Travel safety {score}/10 ({}).", risk_label(score));

        if f <= FREEZING_F {
            text.push_str(&format!(" Freezing at {f:.0}°F: icy roads likely."));
        } else if f <= NEAR_FREEZING_F {
            text.push_str(&format!(" Near freezing at {f:.0}°F: watch for black ice on bridges."));
        }

        match record.visibility_miles() {
            Some(v) if v < 1.0 => text.push_str(&format!(
                " Visibility only {v:.2} miles: use low beams and slow down."
            )),
            Some(v) if v < 3.0 => {
                text.push_str(&format!(" Visibility reduced to {v:.1} miles."))
            }
            Some(_) => text.push_str(" Visibility is good."),
            None => {}
        }

        if mph > 30.0 {
            text.push_str(&format!(
                " Strong crosswinds at {mph:.0} mph: high-profile vehicles at risk."
            ));
        } else if mph > 20.0 {
            text.push_str(&format!(" Gusty at {mph:.0} mph."));
        }

        if record.condition().is_severe() {
            text.push_str(&format!(
                " {}: postpone non-essential travel.",
                record.condition()
            ));
        }
        text
    }
}
