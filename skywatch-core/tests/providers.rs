//! Integration tests for the HTTP adapters using wiremock.
//!
//! These tests verify unit normalization and status classification against a
//! mock upstream, and that the resilient wrapper turns failures into fallbacks.

use std::{sync::Arc, time::Duration};

use skywatch_core::{
    CircuitBreaker, Location, ProviderErrorKind, ResilientSource, WeatherSource,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openweather_body() -> serde_json::Value {
    serde_json::json!({
        "dt": 1_717_000_000,
        "name": "Austin",
        "main": { "temp": 86.5, "feels_like": 90.1, "humidity": 55, "pressure": 1012.0 },
        "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "wind": { "speed": 12.0, "deg": 180 },
        "visibility": 10000
    })
}

fn austin() -> Location {
    Location::new("Austin", "US").with_state("TX").with_postal_code("78701")
}

#[tokio::test]
async fn openweather_success_is_normalized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("zip", "78701,US"))
        .and(query_param("appid", "KEY"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openweather_body()))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(mock_server.uri());
    let record = provider.fetch(&austin()).await.unwrap();

    assert_eq!(record.temperature_f(), Some(86.5));
    assert_eq!(record.humidity().unwrap().percent(), 55);
    assert_eq!(record.wind_mph(), Some(12.0));
    assert!((record.pressure_inhg().unwrap() - 1012.0 * 0.02953).abs() < 1e-9);
    assert!((record.visibility_miles().unwrap() - 6.2137).abs() < 1e-3);
    assert_eq!(record.uv_index(), None);
    assert_eq!(record.condition().description, "clear sky");
    assert_eq!(record.recorded_at().timestamp(), 1_717_000_000);
    assert_eq!(record.data_source(), "openweather");
    assert!(!record.is_degraded());
}

#[tokio::test]
async fn openweather_uses_city_query_without_postal_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Austin,TX,US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openweather_body()))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(mock_server.uri());
    let location = Location::new("Austin", "US").with_state("TX");
    assert!(provider.fetch(&location).await.is_ok());
}

#[tokio::test]
async fn openweather_error_statuses_are_classified() {
    let cases = [
        (401, ProviderErrorKind::AuthenticationFailed),
        (403, ProviderErrorKind::AuthenticationFailed),
        (404, ProviderErrorKind::LocationNotFound),
        (429, ProviderErrorKind::RateLimited),
        (502, ProviderErrorKind::ServiceUnavailable),
        (400, ProviderErrorKind::Other),
    ];

    for (status, expected) in cases {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "cod": status, "message": "nope"
            })))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(mock_server.uri());
        let err = provider.fetch(&austin()).await.unwrap_err();

        assert_eq!(err.kind, expected, "status {status}");
        assert_eq!(err.status, Some(status));
        assert_eq!(err.provider, "openweather");
    }
}

#[tokio::test]
async fn malformed_payload_is_a_payload_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(mock_server.uri());
    let err = provider.fetch(&austin()).await.unwrap_err();
    assert_eq!(err.kind, ProviderErrorKind::InvalidPayload);
}

#[tokio::test]
async fn weatherapi_success_is_normalized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/current.json"))
        .and(query_param("key", "WKEY"))
        .and(query_param("q", "78701"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "location": { "name": "Austin", "country": "USA", "localtime_epoch": 1_717_000_100 },
            "current": {
                "last_updated_epoch": 1_717_000_000,
                "temp_c": 30.0,
                "temp_f": 86.0,
                "humidity": 60,
                "wind_mph": 9.4,
                "wind_kph": 15.1,
                "pressure_mb": 1015.0,
                "vis_km": 16.0,
                "vis_miles": 9.0,
                "uv": 8.0,
                "condition": { "text": "Partly cloudy", "icon": "//cdn.weatherapi.com/116.png" }
            }
        })))
        .mount(&mock_server)
        .await;

    let provider = WeatherApiProvider::new("WKEY".into()).with_base_url(mock_server.uri());
    let record = provider.fetch(&austin()).await.unwrap();

    assert_eq!(record.temperature_f(), Some(86.0));
    assert_eq!(record.wind_mph(), Some(9.4));
    assert_eq!(record.visibility_miles(), Some(9.0));
    assert_eq!(record.uv_index(), Some(8.0));
    assert_eq!(record.recorded_at().timestamp(), 1_717_000_000);
    assert!(record.condition().is_cloudy());
    assert_eq!(provider.provider_name(), "weatherapi");
}

#[tokio::test]
async fn resilient_source_falls_back_on_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let provider = WeatherApiProvider::new("WKEY".into()).with_base_url(mock_server.uri());
    let resilient = ResilientSource::new(
        Arc::new(provider),
        CircuitBreaker::new(5, Duration::from_secs(60)),
        Duration::from_secs(5),
    );

    let record = resilient.fetch(&austin()).await;
    assert!(record.is_degraded());
    assert_eq!(record.data_source(), "weatherapi-fallback");
    assert_eq!(resilient.breaker().consecutive_failures(), 1);
}

#[tokio::test]
async fn not_found_does_not_count_against_the_circuit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(mock_server.uri());
    let resilient = ResilientSource::new(
        Arc::new(provider),
        CircuitBreaker::new(1, Duration::from_secs(60)),
        Duration::from_secs(5),
    );

    for _ in 0..3 {
        assert!(resilient.fetch(&austin()).await.is_degraded());
    }
    assert_eq!(resilient.breaker().consecutive_failures(), 0);
}

#[tokio::test]
async fn slow_upstream_is_cut_off_by_the_call_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(openweather_body())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(mock_server.uri());
    let resilient = ResilientSource::new(
        Arc::new(provider),
        CircuitBreaker::new(5, Duration::from_secs(60)),
        Duration::from_millis(50),
    );

    let err = resilient.try_fetch(&austin()).await.unwrap_err();
    assert_eq!(err.kind, ProviderErrorKind::Transport);
    assert!(resilient.fetch(&austin()).await.is_degraded());
}

#[tokio::test]
async fn availability_probe_never_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(mock_server.uri());
    assert!(!provider.is_available().await);

    let unreachable = OpenWeatherProvider::new("KEY".into()).with_base_url("http://127.0.0.1:9");
    assert!(!unreachable.is_available().await);
}
