//! Integration tests for the live posters
//!
//! Runs the webhook and X/Twitter posters against local fake endpoints.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{http::StatusCode, web, App, HttpRequest, HttpResponse};
use serde_json::{json, Value};
use weatherbot::config::{TwitterConfig, WebhookConfig};
use weatherbot::models::{MediaAttachment, OutgoingPost};
use weatherbot::services::posting::{Poster, TwitterPoster, WebhookPoster};

fn post(with_media: bool) -> OutgoingPost {
    OutgoingPost {
        city: "Dallas".to_string(),
        text: "Hello, Dallas!👋".to_string(),
        alt_text: "Weather graphic for Dallas".to_string(),
        media: with_media.then(|| MediaAttachment {
            file_name: "its_going_to_rain.png".to_string(),
            mime_type: "image/png",
            bytes: vec![1, 2, 3],
        }),
    }
}

// =============================================================================
// Webhook
// =============================================================================

#[derive(Debug, Clone)]
struct Delivery {
    timestamp: Option<String>,
    request_id: Option<String>,
    signature: Option<String>,
    body: Vec<u8>,
}

type Deliveries = Arc<Mutex<Vec<Delivery>>>;

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn fake_webhook(status: u16, deliveries: Deliveries) -> actix_test::TestServer {
    actix_test::start(move || {
        let deliveries = deliveries.clone();
        App::new().route(
            "/hook",
            web::post().to(move |req: HttpRequest, body: web::Bytes| {
                deliveries.lock().unwrap().push(Delivery {
                    timestamp: header(&req, "X-Weatherbot-Timestamp"),
                    request_id: header(&req, "X-Weatherbot-Request-ID"),
                    signature: header(&req, "X-Weatherbot-Signature"),
                    body: body.to_vec(),
                });
                async move {
                    HttpResponse::build(StatusCode::from_u16(status).unwrap()).body("nope")
                }
            }),
        )
    })
}

fn webhook(url: String, secret: Option<&str>) -> WebhookPoster {
    WebhookPoster::new(
        &WebhookConfig {
            url: Some(url),
            secret: secret.map(str::to_string),
        },
        Duration::from_secs(5),
    )
    .unwrap()
}

#[actix_web::test]
async fn test_webhook_delivers_signed_payload() {
    let deliveries = Deliveries::default();
    let srv = fake_webhook(200, deliveries.clone());

    let result = webhook(srv.url("/hook"), Some("s3cret"))
        .publish(&post(true))
        .await;

    assert!(result.success);
    assert_eq!(result.http_status, Some(200));

    let delivery = deliveries.lock().unwrap()[0].clone();
    let timestamp = delivery.timestamp.unwrap();
    let expected = WebhookPoster::generate_signature("s3cret", &timestamp, &delivery.body);
    assert_eq!(delivery.signature.unwrap(), format!("sha256={}", expected));
    assert_eq!(result.post_id, delivery.request_id);

    let payload: Value = serde_json::from_slice(&delivery.body).unwrap();
    assert_eq!(payload["event"], "weather_post");
    assert_eq!(payload["city"], "Dallas");
    assert_eq!(payload["image"]["data"], "AQID");
}

#[actix_web::test]
async fn test_webhook_without_secret_is_unsigned() {
    let deliveries = Deliveries::default();
    let srv = fake_webhook(204, deliveries.clone());

    let result = webhook(srv.url("/hook"), None).publish(&post(false)).await;

    assert!(result.success);
    let delivery = deliveries.lock().unwrap()[0].clone();
    assert!(delivery.signature.is_none());

    let payload: Value = serde_json::from_slice(&delivery.body).unwrap();
    assert!(payload["image"].is_null());
}

#[actix_web::test]
async fn test_webhook_error_status_is_a_failure() {
    let srv = fake_webhook(500, Deliveries::default());

    let result = webhook(srv.url("/hook"), None).publish(&post(false)).await;

    assert!(!result.success);
    assert_eq!(result.http_status, Some(500));
    assert_eq!(result.error_message.as_deref(), Some("HTTP 500: nope"));
}

#[actix_web::test]
async fn test_webhook_unreachable_is_a_failure() {
    let result = webhook("http://127.0.0.1:9/hook".to_string(), None)
        .publish(&post(false))
        .await;

    assert!(!result.success);
    assert!(result.http_status.is_none());
}

// =============================================================================
// X/Twitter
// =============================================================================

#[derive(Clone, Copy)]
struct TwitterBehaviour {
    upload_status: u16,
    tweet_status: u16,
}

#[derive(Default)]
struct TwitterLog {
    paths: Vec<String>,
    tweets: Vec<Value>,
    auth: Vec<String>,
}

type SharedLog = Arc<Mutex<TwitterLog>>;

fn fake_twitter(behaviour: TwitterBehaviour, log: SharedLog) -> actix_test::TestServer {
    actix_test::start(move || {
        let log = log.clone();
        App::new().default_service(web::to(move |req: HttpRequest, body: web::Json<Value>| {
            let mut log_guard = log.lock().unwrap();
            let path = req.path().to_string();
            log_guard.paths.push(path.clone());
            if let Some(auth) = header(&req, "Authorization") {
                log_guard.auth.push(auth);
            }

            let (status, response) = match path.as_str() {
                "/2/media/upload" => (behaviour.upload_status, json!({ "data": { "id": "m-1" } })),
                "/2/media/metadata" => (200, json!({ "data": {} })),
                "/2/tweets" => {
                    log_guard.tweets.push(body.into_inner());
                    (
                        behaviour.tweet_status,
                        json!({ "data": { "id": "t-42", "text": "ok" } }),
                    )
                }
                _ => (404, json!({})),
            };
            drop(log_guard);

            async move { HttpResponse::build(StatusCode::from_u16(status).unwrap()).json(response) }
        }))
    })
}

fn twitter(url: String) -> TwitterPoster {
    TwitterPoster::new(
        &TwitterConfig {
            access_token: Some("user-token".to_string()),
            api_url: url,
        },
        Duration::from_secs(5),
    )
    .unwrap()
}

#[actix_web::test]
async fn test_twitter_posts_with_media() {
    let log = SharedLog::default();
    let srv = fake_twitter(
        TwitterBehaviour {
            upload_status: 200,
            tweet_status: 201,
        },
        log.clone(),
    );

    let result = twitter(srv.url("")).publish(&post(true)).await;

    assert!(result.success);
    assert_eq!(result.post_id.as_deref(), Some("t-42"));

    let log = log.lock().unwrap();
    assert_eq!(
        log.paths,
        vec!["/2/media/upload", "/2/media/metadata", "/2/tweets"]
    );
    assert!(log.auth.iter().all(|a| a == "Bearer user-token"));
    assert_eq!(log.tweets[0]["media"]["media_ids"][0], "m-1");
    assert_eq!(log.tweets[0]["text"], "Hello, Dallas!👋");
}

#[actix_web::test]
async fn test_twitter_media_failure_posts_text_only() {
    let log = SharedLog::default();
    let srv = fake_twitter(
        TwitterBehaviour {
            upload_status: 500,
            tweet_status: 201,
        },
        log.clone(),
    );

    let result = twitter(srv.url("")).publish(&post(true)).await;

    assert!(result.success);
    let log = log.lock().unwrap();
    assert_eq!(log.paths, vec!["/2/media/upload", "/2/tweets"]);
    assert!(log.tweets[0].get("media").is_none());
}

#[actix_web::test]
async fn test_twitter_rate_limit_is_not_retried() {
    let log = SharedLog::default();
    let srv = fake_twitter(
        TwitterBehaviour {
            upload_status: 200,
            tweet_status: 429,
        },
        log.clone(),
    );

    let result = twitter(srv.url("")).publish(&post(false)).await;

    assert!(!result.success);
    assert_eq!(result.http_status, Some(429));
    assert_eq!(result.error_message.as_deref(), Some("Rate limit exceeded"));
    assert_eq!(log.lock().unwrap().tweets.len(), 1);
}

#[actix_web::test]
async fn test_twitter_without_token_fails_without_request() {
    let log = SharedLog::default();
    let srv = fake_twitter(
        TwitterBehaviour {
            upload_status: 200,
            tweet_status: 201,
        },
        log.clone(),
    );

    let poster = TwitterPoster::new(
        &TwitterConfig {
            access_token: None,
            api_url: srv.url(""),
        },
        Duration::from_secs(5),
    )
    .unwrap();

    let result = poster.publish(&post(false)).await;

    assert!(!result.success);
    assert!(log.lock().unwrap().paths.is_empty());
}
