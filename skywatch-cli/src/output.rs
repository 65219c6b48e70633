use chrono::Local;
use skywatch_core::{WeatherAssessor, WeatherRecord};

pub fn print_record(record: &WeatherRecord) {
    println!("Weather for {} ({})", record.location(), record.data_source());

    if record.is_degraded() {
        println!("  Current data is unavailable; the provider could not be reached.");
        return;
    }

    println!("  Condition:   {}", record.condition());
    if let Some(t) = record.temperature() {
        println!("  Temperature: {t}");
    }
    if let Some(feels) = record.feels_like() {
        println!("  Feels like:  {feels:.1}°F");
    }
    if let Some(h) = record.humidity() {
        println!("  Humidity:    {}% ({})", h.percent(), h.comfort().as_str());
    }
    if let Some(w) = record.wind() {
        println!("  Wind:        {w} / {:.1} km/h (Beaufort {})", w.kph(), w.beaufort());
    }
    if let Some(p) = record.pressure_inhg() {
        println!("  Pressure:    {p:.2} inHg");
    }
    if let Some(v) = record.visibility_miles() {
        println!("  Visibility:  {v:.1} mi");
    }
    if let Some(uv) = record.uv_index() {
        println!("  UV index:    {uv:.0}");
    }
    println!(
        "  Observed:    {}",
        record.recorded_at().with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
}

pub fn print_alerts(alerts: &[String]) {
    if alerts.is_empty() {
        println!("\nNo active alerts.");
        return;
    }
    println!("\nAlerts:");
    for alert in alerts {
        println!("  - {alert}");
    }
}

pub fn print_assessment(assessor: &WeatherAssessor, record: &WeatherRecord) {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    let kind = assessor.default_strategy();

    println!("\n{} assessment", kind.strategy().name());
    println!("  Rating:      {}/10", assessor.comfort_rating(record));
    println!("  Dangerous:   {}", yes_no(assessor.is_dangerous(record)));
    println!("  Outdoor:     {}", yes_no(assessor.is_good_for_outdoor(record)));
    println!("  {}", assessor.weather_description(record));
}
