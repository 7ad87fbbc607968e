use std::path::Path;

use tokio::fs;

use crate::models::MediaAttachment;

/// Loads the image attached to every post.
///
/// A missing or unreadable file is logged and the post goes out without media.
pub async fn load_media(path: &Path) -> Option<MediaAttachment> {
    match fs::read(path).await {
        Ok(bytes) => Some(MediaAttachment {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string()),
            mime_type: mime_type_for(path),
            bytes,
        }),
        Err(e) => {
            log::error!(
                "Image not found at '{}' ({}). Posting without image.",
                path.display(),
                e
            );
            None
        }
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
