use async_trait::async_trait;

use super::{PostResult, Poster};
use crate::config::PostMode;
use crate::error::AppResult;
use crate::models::OutgoingPost;

/// Logs the post instead of publishing it
#[derive(Debug, Default)]
pub struct DryRunPoster;

impl DryRunPoster {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Poster for DryRunPoster {
    async fn publish(&self, post: &OutgoingPost) -> PostResult {
        log::info!("[TEST MODE] Skipping actual post for {}.", post.city);
        log::info!("--- Simulated Post ---");
        log::info!("{}", post.text);
        match &post.media {
            Some(media) => log::info!(
                "Image: '{}' ({} bytes) with Alt Text:\n{}",
                media.file_name,
                media.bytes.len(),
                post.alt_text
            ),
            None => log::info!("No image. Alt Text:\n{}", post.alt_text),
        }
        log::info!("--- End Simulated Post ---");

        PostResult::success(None, None)
    }

    fn validate_config(&self) -> AppResult<()> {
        Ok(())
    }

    fn mode(&self) -> PostMode {
        PostMode::DryRun
    }
}
