//! Integration tests for the OpenWeatherMap client
//!
//! Runs the client against a local fake of the forecast endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{web, App, HttpResponse};
use serde_json::json;
use weatherbot::config::WeatherConfig;
use weatherbot::models::City;
use weatherbot::services::{OpenWeatherMapClient, WeatherError, WeatherSource};

use crate::common::forecast_json;

type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

fn client(base_url: &str) -> OpenWeatherMapClient {
    OpenWeatherMapClient::new(&WeatherConfig {
        api_key: Some("test-key".to_string()),
        api_url: base_url.trim_end_matches('/').to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

/// Starts a fake forecast endpoint answering every request with `status` and `body`
fn fake_owm(status: u16, body: serde_json::Value, captured: Captured) -> actix_test::TestServer {
    actix_test::start(move || {
        let body = body.clone();
        let captured = captured.clone();
        App::new().route(
            "/data/2.5/forecast",
            web::get().to(move |query: web::Query<HashMap<String, String>>| {
                captured.lock().unwrap().push(query.into_inner());
                let body = body.clone();
                async move {
                    HttpResponse::build(
                        actix_web::http::StatusCode::from_u16(status).unwrap(),
                    )
                    .json(body)
                }
            }),
        )
    })
}

#[actix_web::test]
async fn test_fetch_by_name() {
    let captured = Captured::default();
    let srv = fake_owm(200, forecast_json(), captured.clone());

    let forecast = client(&srv.url(""))
        .forecast(&City::named("San Jose"))
        .await
        .unwrap();

    assert_eq!(forecast.list.len(), 5);
    assert_eq!(forecast.current().unwrap().main.temp, 21.0);

    let queries = captured.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["q"], "San Jose");
    assert_eq!(queries[0]["appid"], "test-key");
    assert_eq!(queries[0]["units"], "metric");
}

#[actix_web::test]
async fn test_fetch_by_coordinates() {
    let captured = Captured::default();
    let srv = fake_owm(200, forecast_json(), captured.clone());

    client(&srv.url(""))
        .forecast(&City::with_coordinates("Chicago", 41.8781, -87.6298))
        .await
        .unwrap();

    let queries = captured.lock().unwrap();
    assert_eq!(queries[0]["lat"], "41.8781");
    assert_eq!(queries[0]["lon"], "-87.6298");
    assert!(!queries[0].contains_key("q"));
}

#[actix_web::test]
async fn test_error_status_is_reported() {
    let srv = fake_owm(
        401,
        json!({ "cod": 401, "message": "Invalid API key" }),
        Captured::default(),
    );

    let result = client(&srv.url("")).forecast(&City::named("Dallas")).await;

    match result {
        Err(WeatherError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid API key"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[actix_web::test]
async fn test_empty_forecast_is_an_error() {
    let srv = fake_owm(200, json!({ "cod": "200", "list": [] }), Captured::default());

    let result = client(&srv.url("")).forecast(&City::named("Dallas")).await;

    assert!(matches!(result, Err(WeatherError::EmptyForecast)));
}

#[actix_web::test]
async fn test_malformed_body_is_a_decode_error() {
    let srv = fake_owm(200, json!({ "list": "nope" }), Captured::default());

    let result = client(&srv.url("")).forecast(&City::named("Dallas")).await;

    assert!(matches!(result, Err(WeatherError::Decode(_))));
}

#[actix_web::test]
async fn test_unreachable_server_is_a_request_error() {
    let result = client("http://127.0.0.1:9")
        .forecast(&City::named("Dallas"))
        .await;

    assert!(matches!(result, Err(WeatherError::Request(_))));
}
