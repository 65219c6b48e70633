use crate::{
    assessment::{
        AssessmentStrategy, UNKNOWN_RATING, clamp_rating, lacks_measurements,
        unavailable_description,
    },
    record::WeatherRecord,
};

/// Physiological reading: heat and cold stress, UV exposure, pressure
/// swings. The rating is the inverse of health risk.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthImpactStrategy;

const PRESSURE_LOW_INHG: f64 = 29.8;
const PRESSURE_HIGH_INHG: f64 = 30.2;

fn heat_penalty(heat_index: f64) -> i32 {
    if heat_index > 103.0 {
        4
    } else if heat_index > 90.0 {
        2
    } else if heat_index > 80.0 {
        1
    } else {
        0
    }
}

fn cold_penalty(wind_chill: f64) -> i32 {
    if wind_chill < -20.0 {
        5
    } else if wind_chill < 0.0 {
        3
    } else if wind_chill < 32.0 {
        1
    } else {
        0
    }
}

fn uv_penalty(uv: f64) -> i32 {
    if uv >= 11.0 {
        4
    } else if uv >= 8.0 {
        3
    } else if uv >= 6.0 {
        2
    } else if uv >= 3.0 {
        1
    } else {
        0
    }
}

/// Distance of `inhg` outside the normal band, zero inside it.
fn pressure_deviation(inhg: f64) -> f64 {
    if inhg < PRESSURE_LOW_INHG {
        PRESSURE_LOW_INHG - inhg
    } else if inhg > PRESSURE_HIGH_INHG {
        inhg - PRESSURE_HIGH_INHG
    } else {
        0.0
    }
}

fn pressure_penalty(inhg: f64) -> i32 {
    let deviation = pressure_deviation(inhg);
    if deviation > 0.5 {
        2
    } else if deviation > 0.0 {
        1
    } else {
        0
    }
}

fn risk_label(rating: u8) -> &'static str {
    match rating {
        8..=10 => "low health risk",
        5..=7 => "moderate health risk",
        3..=4 => "high health risk",
        _ => "very high health risk",
    }
}

impl AssessmentStrategy for HealthImpactStrategy {
    fn name(&self) -> &'static str {
        "Health Impact"
    }

    fn is_dangerous(&self, record: &WeatherRecord) -> bool {
        record.heat_index().is_some_and(|hi| hi > 103.0)
            || record.wind_chill().is_some_and(|wc| wc < 0.0)
            || record.uv_index().is_some_and(|uv| uv >= 8.0)
    }

    fn is_good_for_outdoor(&self, record: &WeatherRecord) -> bool {
        let (Some(t), Some(h)) = (record.temperature(), record.humidity()) else {
            return false;
        };
        !self.is_dangerous(record)
            && t.is_moderate()
            && !h.is_high()
            && !h.is_low()
            && record.uv_index().is_none_or(|uv| uv <= 5.0)
    }

    fn comfort_rating(&self, record: &WeatherRecord) -> u8 {
        if lacks_measurements(record) {
            return UNKNOWN_RATING;
        }
        let mut score = 10;

        if let Some(hi) = record.heat_index() {
            score -= heat_penalty(hi);
        }
        if let Some(wc) = record.wind_chill() {
            score -= cold_penalty(wc);
        }
        if let Some(uv) = record.uv_index() {
            score -= uv_penalty(uv);
        }
        if let Some(p) = record.pressure_inhg() {
            score -= pressure_penalty(p);
        }

        clamp_rating(score)
    }

    fn weather_description(&self, record: &WeatherRecord) -> String {
        let (Some(hi), Some(wc), Some(h)) = (record.heat_index(), record.wind_chill(), record.humidity())
        else {
            return unavailable_description(record);
        };

        let rating = self.comfort_rating(record);
        let mut text = format!("Health outlook {rating}/10 ({}).", risk_label(rating));

        if hi > 103.0 {
            text.push_str(&format!(
                " Heat index {hi:.0}°F: high risk of heat exhaustion, stay hydrated and seek shade."
            ));
        } else if hi > 90.0 {
            text.push_str(&format!(" Heat index {hi:.0}°F: moderate heat stress."));
        }

        if wc < 0.0 {
            text.push_str(&format!(
                " Wind chill {wc:.0}°F: frostbite possible on exposed skin within 30 minutes."
            ));
        } else if wc < 32.0 {
            text.push_str(&format!(" Wind chill {wc:.0}°F: mild cold stress, dress warmly."));
        }

        match record.uv_index() {
            Some(uv) if uv >= 8.0 => text.push_str(&format!(
                " UV index {uv:.0}: very high, avoid midday sun and use SPF 30+."
            )),
            Some(uv) if uv >= 3.0 => {
                text.push_str(&format!(" UV index {uv:.0}: wear sunscreen."))
            }
            _ => {}
        }

        if let Some(p) = record.pressure_inhg().filter(|&p| pressure_deviation(p) > 0.0) {
            text.push_str(&format!(
                " Pressure {p:.2} inHg is outside the normal range; sensitive individuals may notice headaches or joint pain."
            ));
        }

        if h.is_high() {
            text.push_str(" Very humid air can aggravate breathing difficulties.");
        } else if h.is_low() {
            text.push_str(" Dry air may irritate skin and airways.");
        }
        text
    }
}
