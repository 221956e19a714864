//! Integration tests for the OpenWeather provider using wiremock.

use std::{sync::Arc, time::Duration};

use cityweather_core::{
    Coordinator, FetchError, GeocodeProvider, MemoryStorage, PinnedCities, Providers, Suggester,
    Units, WeatherProvider, provider::openweather::OpenWeatherProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> Arc<OpenWeatherProvider> {
    Arc::new(
        OpenWeatherProvider::with_base_url("TEST_KEY".into(), &server.uri(), Duration::from_secs(5))
            .unwrap(),
    )
}

fn paris_json() -> serde_json::Value {
    serde_json::json!({
        "name": "Paris",
        "coord": {"lon": 2.35, "lat": 48.85},
        "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d"}],
        "main": {"temp": 18.0, "feels_like": 17.4, "humidity": 64, "pressure": 1016},
        "visibility": 10000,
        "wind": {"speed": 4.1, "deg": 230},
        "clouds": {"all": 20},
        "dt": 1700010000,
        "sys": {"country": "FR", "sunrise": 1699987000, "sunset": 1700021000},
        "cod": 200
    })
}

fn geocode_json() -> serde_json::Value {
    serde_json::json!([
        {"name": "Paris", "lat": 48.85, "lon": 2.35, "country": "FR", "state": "Ile-de-France"},
        {"name": "Paris", "lat": 33.66, "lon": -95.55, "country": "US", "state": "Texas"},
        {"name": "Paris", "lat": 36.30, "lon": -88.32, "country": "US"}
    ])
}

#[tokio::test]
async fn test_geocode_sends_text_and_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Par"))
        .and(query_param("limit", "5"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let suggestions = provider(&mock_server).geocode("Par", 5).await.unwrap();

    assert_eq!(suggestions.len(), 3);
    assert_eq!(suggestions[0].to_string(), "Paris, Ile-de-France, FR");
    assert_eq!(suggestions[2].state, None);
}

#[tokio::test]
async fn test_suggester_swallows_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let suggester = Suggester::new(provider(&mock_server));
    assert!(suggester.suggest("Paris").await.is_empty());
}

#[tokio::test]
async fn test_current_maps_all_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Paris"))
        .and(query_param("units", "imperial"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_json()))
        .mount(&mock_server)
        .await;

    let record = provider(&mock_server).current("Paris", Units::Imperial).await.unwrap();

    assert_eq!(record.location_name, "Paris");
    assert_eq!(record.region.as_deref(), Some("FR"));
    assert_eq!(record.temperature, 18.0);
    assert_eq!(record.feels_like, 17.4);
    assert_eq!(record.humidity_pct, 64);
    assert_eq!(record.pressure_hpa, 1016);
    assert_eq!(record.wind_speed, 4.1);
    assert_eq!(record.cloudiness_pct, 20);
    assert_eq!(record.visibility_m, Some(10_000));
    assert_eq!(record.sunrise.timestamp(), 1_699_987_000);
    assert_eq!(record.sunset.timestamp(), 1_700_021_000);
    assert_eq!(record.condition_code, Some(801));
    assert_eq!(record.condition, "few clouds");
    assert_eq!(record.units, Units::Imperial);
}

#[tokio::test]
async fn test_current_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&mock_server)
        .await;

    let err = provider(&mock_server).current("Atlantis", Units::Metric).await.unwrap_err();

    match err {
        FetchError::NotFound { city, status } => {
            assert_eq!(city, "Atlantis");
            assert_eq!(status, Some(404));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_current_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Paris",
            "main": "not an object"
        })))
        .mount(&mock_server)
        .await;

    let err = provider(&mock_server).current("Paris", Units::Metric).await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
}

#[tokio::test]
async fn test_current_network_failure() {
    // Nothing listens on a port that was bound and released.
    let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let provider = OpenWeatherProvider::with_base_url(
        "TEST_KEY".into(),
        &format!("http://127.0.0.1:{port}"),
        Duration::from_secs(5),
    )
    .unwrap();

    let err = provider.current("Paris", Units::Metric).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
    assert_eq!(err.user_message(), "Could not reach the weather service");
}

#[tokio::test]
async fn test_current_timeout_is_network_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(paris_json())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::with_base_url(
        "TEST_KEY".into(),
        &mock_server.uri(),
        Duration::from_secs(1),
    )
    .unwrap();

    let err = provider.current("Paris", Units::Metric).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
    assert_eq!(err.user_message(), "Could not reach the weather service");
}

#[tokio::test]
async fn test_coordinator_type_select_and_pin() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_json()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Paris"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_json()))
        .mount(&mock_server)
        .await;

    let provider = provider(&mock_server);
    let providers = Providers { geocode: provider.clone(), weather: provider };
    let storage = MemoryStorage::new();
    let coord = Coordinator::new(
        providers,
        Units::Metric,
        PinnedCities::load(Box::new(storage.clone())),
    );

    assert!(coord.input("Par").await);
    assert_eq!(coord.state().suggestions().len(), 3);

    assert!(coord.select(0).await);
    assert_eq!(coord.state().active().unwrap().temperature, 18.0);

    coord.pin_active().unwrap();

    let reloaded = PinnedCities::load(Box::new(storage));
    assert_eq!(reloaded.list().len(), 1);
    assert_eq!(reloaded.list()[0].location_name, "Paris");
    assert!(coord.state().active().is_none());
}
