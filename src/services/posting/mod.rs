//! Post publishers using the Strategy pattern.
//!
//! Each delivery channel (dry run, X/Twitter, webhook) implements [`Poster`].
//! A failed delivery is reported through [`PostResult`], never a panic.

pub mod dry_run;
pub mod twitter;
pub mod webhook;

use async_trait::async_trait;

use crate::config::{PostMode, PostingConfig};
use crate::error::AppResult;
use crate::models::OutgoingPost;

pub use dry_run::DryRunPoster;
pub use twitter::TwitterPoster;
pub use webhook::WebhookPoster;

// =============================================================================
// Post Result
// =============================================================================

/// Result of a publish attempt
#[derive(Debug)]
pub struct PostResult {
    /// Whether the post was published
    pub success: bool,
    /// HTTP status code (if applicable)
    pub http_status: Option<u16>,
    /// Error message (if failed)
    pub error_message: Option<String>,
    /// Identifier assigned by the platform (if any)
    pub post_id: Option<String>,
}

impl PostResult {
    /// Creates a successful result
    pub fn success(http_status: Option<u16>, post_id: Option<String>) -> Self {
        Self {
            success: true,
            http_status,
            error_message: None,
            post_id,
        }
    }

    /// Creates a failed result
    pub fn failure(error_message: String, http_status: Option<u16>) -> Self {
        Self {
            success: false,
            http_status,
            error_message: Some(error_message),
            post_id: None,
        }
    }
}

// =============================================================================
// Poster Trait
// =============================================================================

/// Trait for post publishers (Strategy pattern)
#[async_trait]
pub trait Poster: Send + Sync {
    /// Publish a composed post
    async fn publish(&self, post: &OutgoingPost) -> PostResult;

    /// Check that the poster has everything it needs to publish
    fn validate_config(&self) -> AppResult<()>;

    /// The mode this poster implements
    fn mode(&self) -> PostMode;
}

// =============================================================================
// Poster Factory
// =============================================================================

/// Creates the poster for a mode
pub fn create_poster(mode: PostMode, config: &PostingConfig) -> AppResult<Box<dyn Poster>> {
    Ok(match mode {
        PostMode::DryRun => Box::new(DryRunPoster::new()),
        PostMode::Twitter => Box::new(TwitterPoster::new(&config.twitter, config.timeout)?),
        PostMode::Webhook => Box::new(WebhookPoster::new(&config.webhook, config.timeout)?),
    })
}

/// Creates the configured poster, falling back to a dry run when the live
/// poster cannot be built or is missing credentials
pub fn select_poster(config: &PostingConfig) -> Box<dyn Poster> {
    let poster = create_poster(config.mode, config)
        .and_then(|poster| poster.validate_config().map(|_| poster));

    match poster {
        Ok(poster) => {
            log::info!("Poster initialized: {}", poster.mode());
            poster
        }
        Err(e) => {
            log::error!(
                "Error initializing {:?} poster: {}. Falling back to dry run.",
                config.mode,
                e
            );
            Box::new(DryRunPoster::new())
        }
    }
}

/// Maps a transport error to a short failure message
pub(crate) fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timed out".to_string()
    } else if e.is_connect() {
        "Connection failed".to_string()
    } else {
        format!("Request failed: {}", e)
    }
}
