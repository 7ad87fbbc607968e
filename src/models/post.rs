use serde::Serialize;

/// Image attached to a post
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAttachment {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// A fully composed update, ready to hand to a poster
#[derive(Debug, Clone)]
pub struct OutgoingPost {
    pub city: String,
    /// Final text, already fitted to the platform limit
    pub text: String,
    pub alt_text: String,
    pub media: Option<MediaAttachment>,
}

/// JSON body sent by the webhook poster
#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    pub event: &'static str,
    pub request_id: String,
    pub city: String,
    pub text: String,
    pub alt_text: String,
    pub image: Option<WebhookImage>,
    pub sent_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct WebhookImage {
    pub file_name: String,
    pub mime_type: &'static str,
    /// Base64 (standard alphabet) image bytes
    pub data: String,
}
