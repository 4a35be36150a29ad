//! End-to-end tests of the orchestrator over the real HTTP transport,
//! against a local wiremock server standing in for OpenWeatherMap.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use weather_core::{
    DataKind, ErrorCategory, HttpTransport, WeatherEvent, WeatherService,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_API_KEY: &str = "0123456789abcdef0123456789abcdef";

const CURRENT_BODY: &str = r#"{
    "name": "London", "id": 2643743,
    "sys": {"country": "GB", "sunrise": 1695447600, "sunset": 1695491100},
    "coord": {"lat": 51.5073, "lon": -0.1276},
    "main": {"temp": 12.3, "feels_like": 11.0, "temp_min": 10.0, "temp_max": 14.0,
             "humidity": 70, "pressure": 1008},
    "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
    "wind": {"speed": 5.1, "deg": 250},
    "clouds": {"all": 75},
    "dt": 1695464400,
    "timezone": 3600,
    "cod": 200
}"#;

const FORECAST_BODY: &str = r#"{
    "city": {"name": "London", "coord": {"lat": 51.5073, "lon": -0.1276}},
    "list": [
        {"dt_txt": "2025-09-23 09:00:00", "main": {"temp": 14.0},
         "weather": [{"main": "Clouds", "description": "few clouds", "icon": "02d", "id": 801}],
         "wind": {"speed": 3.0, "deg": 200}, "clouds": {"all": 20}, "pop": 0.1},
        {"dt_txt": "2025-09-23 12:00:00", "main": {"temp": 18.0},
         "weather": [{"main": "Rain", "description": "light rain", "icon": "10d", "id": 500}],
         "wind": {"speed": 4.5, "deg": 180, "gust": 7.2}, "clouds": {"all": 75}, "pop": 0.35}
    ]
}"#;

async fn service_against(
    server: &MockServer,
) -> (WeatherService, mpsc::UnboundedReceiver<WeatherEvent>) {
    let (service, rx) = WeatherService::new(TEST_API_KEY, Arc::new(HttpTransport::new()));
    let service = service
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(5));
    (service, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<WeatherEvent>) -> Vec<WeatherEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn current_weather_roundtrip_then_cache_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "London"))
        .and(query_param("appid", TEST_API_KEY))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(CURRENT_BODY, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let (service, mut rx) = service_against(&server).await;

    service.request_current_weather("London").await;
    let events = drain(&mut rx);

    assert_eq!(
        events[0],
        WeatherEvent::LoadingStarted {
            city: "London".to_string(),
            kind: DataKind::Current
        }
    );
    let WeatherEvent::CurrentWeatherReady { city, data } = &events[1] else {
        panic!("expected ready event, got {:?}", events[1]);
    };
    assert_eq!(city, "London");
    assert_eq!(data.temperature, 12.3);
    assert_eq!(data.country_code, "GB");
    assert!(data.is_valid());
    assert_eq!(
        events[2],
        WeatherEvent::CacheUpdated {
            city: "London".to_string(),
            kind: DataKind::Current
        }
    );

    // Within the validity window the second request never hits the wire
    // (the mock's expect(1) would fail otherwise).
    service.request_current_weather("London").await;
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], WeatherEvent::CurrentWeatherReady { .. }));
}

#[tokio::test]
async fn forecast_roundtrip_produces_daily_summaries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FORECAST_BODY, "application/json"))
        .mount(&server)
        .await;

    let (service, mut rx) = service_against(&server).await;

    service.request_forecast("London").await;
    let events = drain(&mut rx);

    let WeatherEvent::ForecastReady { data, .. } = &events[1] else {
        panic!("expected forecast ready, got {:?}", events[1]);
    };
    assert_eq!(data.total_entries(), 2);
    assert_eq!(data.entries[1].precipitation_probability, 35.0);

    let summaries = data.daily_summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].min_temp, 14.0);
    assert_eq!(summaries[0].max_temp, 18.0);
    // Bucket of 2: midpoint entry carries the dominant condition.
    assert_eq!(summaries[0].dominant_condition, "Rain");
}

#[tokio::test]
async fn provider_404_is_reported_as_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw(r#"{"cod": "404", "message": "city not found"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let (service, mut rx) = service_against(&server).await;

    service.request_current_weather("Atlantis").await;
    let events = drain(&mut rx);

    assert_eq!(
        events[1],
        WeatherEvent::ErrorOccurred {
            city: "Atlantis".to_string(),
            message: "location not found".to_string(),
            category: ErrorCategory::Api,
        }
    );
    assert!(!service.has_valid_cache("Atlantis", DataKind::Current));
}

#[tokio::test]
async fn provider_500_is_reported_as_provider_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (service, mut rx) = service_against(&server).await;

    service.request_current_weather("London").await;
    let events = drain(&mut rx);

    assert!(matches!(
        &events[1],
        WeatherEvent::ErrorOccurred { category: ErrorCategory::Api, message, .. }
            if message == "provider unavailable"
    ));
}

#[tokio::test]
async fn slow_provider_times_out_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(CURRENT_BODY, "application/json")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let (service, rx) = WeatherService::new(TEST_API_KEY, Arc::new(HttpTransport::new()));
    let service = service
        .with_base_url(server.uri())
        .with_timeout(Duration::from_millis(100));
    let mut rx = rx;

    service.request_current_weather("London").await;
    let events = drain(&mut rx);

    assert_eq!(
        events[1],
        WeatherEvent::ErrorOccurred {
            city: "London".to_string(),
            message: "request timed out".to_string(),
            category: ErrorCategory::Network,
        }
    );
}
