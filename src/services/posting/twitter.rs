//! X/Twitter poster (API v2, OAuth 2.0 user-context bearer token).
//!
//! The image is uploaded first and its alt text attached; if either step
//! fails the post goes out text-only. Rate limiting is reported as a failure
//! and not retried.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{describe_request_error, PostResult, Poster};
use crate::config::{PostMode, TwitterConfig};
use crate::error::{AppError, AppResult};
use crate::models::{MediaAttachment, OutgoingPost};

/// X/Twitter poster
pub struct TwitterPoster {
    client: reqwest::Client,
    api_url: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: String,
}

impl TwitterPoster {
    /// Creates a new X/Twitter poster
    pub fn new(config: &TwitterConfig, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    /// Request body for creating a post
    pub fn post_body(text: &str, media_id: Option<&str>) -> serde_json::Value {
        match media_id {
            Some(id) => json!({ "text": text, "media": { "media_ids": [id] } }),
            None => json!({ "text": text }),
        }
    }

    async fn post_json(
        &self,
        token: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(format!("{}{}", self.api_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
    }

    /// Uploads the image and attaches its alt text, returning the media id
    async fn upload_media(
        &self,
        token: &str,
        media: &MediaAttachment,
        alt_text: &str,
    ) -> Result<String, String> {
        let upload = json!({
            "media": STANDARD.encode(&media.bytes),
            "media_category": "tweet_image",
            "media_type": media.mime_type,
        });

        let response = self
            .post_json(token, "/2/media/upload", &upload)
            .await
            .map_err(|e| describe_request_error(&e))?;
        if !response.status().is_success() {
            return Err(format!("Media upload returned HTTP {}", response.status().as_u16()));
        }
        let media_id = response
            .json::<DataEnvelope<CreatedId>>()
            .await
            .map_err(|e| format!("Invalid media upload response: {}", e))?
            .data
            .id;

        let metadata = json!({
            "id": media_id,
            "metadata": { "alt_text": { "text": alt_text } },
        });
        let response = self
            .post_json(token, "/2/media/metadata", &metadata)
            .await
            .map_err(|e| describe_request_error(&e))?;
        if !response.status().is_success() {
            return Err(format!("Alt text returned HTTP {}", response.status().as_u16()));
        }

        Ok(media_id)
    }
}

#[async_trait]
impl Poster for TwitterPoster {
    async fn publish(&self, post: &OutgoingPost) -> PostResult {
        let Some(token) = self.access_token.as_deref() else {
            log::error!("Twitter client not initialized. Aborting post.");
            return PostResult::failure("TWITTER_ACCESS_TOKEN is not set".to_string(), None);
        };

        let media_id = match &post.media {
            Some(media) => {
                log::info!("Uploading media: {} for {}", media.file_name, post.city);
                match self.upload_media(token, media, &post.alt_text).await {
                    Ok(id) => {
                        log::info!("Media uploaded and alt text added successfully.");
                        Some(id)
                    }
                    Err(e) => {
                        log::error!("Failed to upload media or add alt text for {}: {}", post.city, e);
                        None
                    }
                }
            }
            None => None,
        };

        let body = Self::post_body(&post.text, media_id.as_deref());
        let response = match self.post_json(token, "/2/tweets", &body).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Error posting for {}: {}", post.city, e);
                return PostResult::failure(describe_request_error(&e), None);
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            log::warn!("Rate limit exceeded. Will not retry.");
            return PostResult::failure("Rate limit exceeded".to_string(), Some(status.as_u16()));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            log::error!("Twitter API response error details: {}", error_body);
            let error_msg = if error_body.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                format!("HTTP {}: {}", status.as_u16(), error_body)
            };
            return PostResult::failure(error_msg, Some(status.as_u16()));
        }

        let post_id = response
            .json::<DataEnvelope<CreatedId>>()
            .await
            .ok()
            .map(|created| created.data.id);

        log::info!("Post for {} published successfully!", post.city);
        log::info!(
            "Final post ({} chars): \n{}",
            post.text.chars().count(),
            post.text
        );
        PostResult::success(Some(status.as_u16()), post_id)
    }

    fn validate_config(&self) -> AppResult<()> {
        if self.access_token.is_none() {
            return Err(AppError::Validation(
                "TWITTER_ACCESS_TOKEN is required to post to X/Twitter".to_string(),
            ));
        }

        let parsed = url::Url::parse(&self.api_url)
            .map_err(|_| AppError::Validation("Invalid TWITTER_API_URL format".to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::Validation(
                "TWITTER_API_URL must use HTTP or HTTPS".to_string(),
            ));
        }

        Ok(())
    }

    fn mode(&self) -> PostMode {
        PostMode::Twitter
    }
}
