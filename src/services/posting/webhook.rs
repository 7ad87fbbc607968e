//! Webhook poster.
//!
//! Sends the composed update as an HTTP POST with a JSON payload.
//! Supports HMAC-SHA256 signature verification for security.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use super::{describe_request_error, PostResult, Poster};
use crate::config::{PostMode, WebhookConfig};
use crate::error::{AppError, AppResult};
use crate::models::{OutgoingPost, WebhookImage, WebhookPayload};

type HmacSha256 = Hmac<Sha256>;

/// Webhook poster
pub struct WebhookPoster {
    client: reqwest::Client,
    url: Option<String>,
    secret: Option<String>,
}

impl WebhookPoster {
    /// Creates a new webhook poster
    pub fn new(config: &WebhookConfig, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            secret: config.secret.clone(),
        })
    }

    /// Generates HMAC-SHA256 signature over `timestamp.payload`
    pub fn generate_signature(secret: &str, timestamp: &str, payload: &[u8]) -> String {
        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            // HMAC accepts keys of any length
            Err(_) => return String::new(),
        };
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn build_payload(post: &OutgoingPost, request_id: &str) -> WebhookPayload {
        WebhookPayload {
            event: "weather_post",
            request_id: request_id.to_string(),
            city: post.city.clone(),
            text: post.text.clone(),
            alt_text: post.alt_text.clone(),
            image: post.media.as_ref().map(|media| WebhookImage {
                file_name: media.file_name.clone(),
                mime_type: media.mime_type,
                data: STANDARD.encode(&media.bytes),
            }),
            sent_at: Utc::now(),
        }
    }
}

#[async_trait]
impl Poster for WebhookPoster {
    async fn publish(&self, post: &OutgoingPost) -> PostResult {
        let Some(url) = self.url.as_deref() else {
            return PostResult::failure("Webhook URL is not configured".to_string(), None);
        };

        let request_id = Uuid::new_v4().to_string();
        let payload = Self::build_payload(post, &request_id);

        let body = match serde_json::to_vec(&payload) {
            Ok(b) => b,
            Err(e) => {
                return PostResult::failure(format!("Failed to serialize payload: {}", e), None)
            }
        };

        let timestamp = Utc::now().timestamp().to_string();

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("X-Weatherbot-Timestamp", &timestamp)
            .header("X-Weatherbot-Request-ID", &request_id);

        if let Some(ref secret) = self.secret {
            let signature = Self::generate_signature(secret, &timestamp, &body);
            request = request.header("X-Weatherbot-Signature", format!("sha256={}", signature));
        }

        match request.body(body).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if response.status().is_success() {
                    log::info!("Post for {} delivered to webhook", post.city);
                    PostResult::success(Some(status), Some(request_id))
                } else {
                    let error_body = response.text().await.unwrap_or_default();
                    let error_msg = if error_body.is_empty() {
                        format!("HTTP {}", status)
                    } else {
                        format!("HTTP {}: {}", status, error_body)
                    };
                    PostResult::failure(error_msg, Some(status))
                }
            }
            Err(e) => PostResult::failure(describe_request_error(&e), None),
        }
    }

    fn validate_config(&self) -> AppResult<()> {
        let url = self
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::Validation("Webhook URL is required".to_string()))?;

        let parsed_url = url::Url::parse(url)
            .map_err(|_| AppError::Validation("Invalid webhook URL format".to_string()))?;

        if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
            return Err(AppError::Validation(
                "Webhook URL must use HTTP or HTTPS".to_string(),
            ));
        }

        Ok(())
    }

    fn mode(&self) -> PostMode {
        PostMode::Webhook
    }
}
