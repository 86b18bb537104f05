//! Video metadata lookup
//!
//! Fetches title and channel name through YouTube's oEmbed endpoint when a
//! video is added. Any failure degrades to a placeholder record.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::VideoRecord;

/// Default oEmbed endpoint
pub const DEFAULT_OEMBED_URL: &str = "https://www.youtube.com/oembed";

/// Fetch timeout in seconds
pub const DEFAULT_LOOKUP_TIMEOUT: u64 = 10;

/// Errors from a metadata lookup
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Lookup returned status {0}")]
    Status(u16),

    #[error("Malformed lookup response: {0}")]
    Malformed(String),
}

/// Metadata returned by a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetails {
    pub title: String,
    pub author: String,
}

/// Source of video metadata
pub trait VideoLookup {
    fn lookup(
        &self,
        video_id: &str,
    ) -> impl Future<Output = Result<VideoDetails, LookupError>> + Send;
}

/// oEmbed response body (only the fields we use)
#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
}

/// Looks videos up through the oEmbed endpoint
#[derive(Debug, Clone)]
pub struct OEmbedClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OEmbedClient {
    /// Create a client for `endpoint` with the given timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; studytube/1.0)")
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Client for the public endpoint with the default timeout
    pub fn with_defaults() -> Result<Self, LookupError> {
        Self::new(
            DEFAULT_OEMBED_URL,
            Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT),
        )
    }
}

impl VideoLookup for OEmbedClient {
    async fn lookup(&self, video_id: &str) -> Result<VideoDetails, LookupError> {
        let watch_url = format!("https://www.youtube.com/watch?v={}", video_id);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_oembed(&body)
    }
}

/// Parse an oEmbed JSON body
fn parse_oembed(body: &str) -> Result<VideoDetails, LookupError> {
    let parsed: OEmbedResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;

    match (parsed.title, parsed.author_name) {
        (Some(title), Some(author)) => Ok(VideoDetails { title, author }),
        _ => Err(LookupError::Malformed(
            "missing title or author_name".to_string(),
        )),
    }
}

/// Build a record for `video_id`, falling back to a placeholder on any failure
pub async fn fetch_video_record<L: VideoLookup>(lookup: &L, video_id: &str) -> VideoRecord {
    match lookup.lookup(video_id).await {
        Ok(details) => {
            debug!("Fetched metadata for {}: {}", video_id, details.title);
            VideoRecord::new(video_id, details.title, details.author)
        }
        Err(e) => {
            warn!("Metadata lookup failed for {}: {}", video_id, e);
            VideoRecord::placeholder(video_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UNKNOWN_AUTHOR, UNKNOWN_TITLE};

    struct FailingLookup;

    impl VideoLookup for FailingLookup {
        async fn lookup(&self, _video_id: &str) -> Result<VideoDetails, LookupError> {
            Err(LookupError::Status(404))
        }
    }

    struct FixedLookup;

    impl VideoLookup for FixedLookup {
        async fn lookup(&self, video_id: &str) -> Result<VideoDetails, LookupError> {
            Ok(VideoDetails {
                title: format!("Lecture {}", video_id),
                author: "MIT OpenCourseWare".to_string(),
            })
        }
    }

    #[test]
    fn test_parse_oembed() {
        let body = r#"{
            "title": "Lecture 1: Kinematics",
            "author_name": "MIT OpenCourseWare",
            "type": "video",
            "thumbnail_url": "https://i.ytimg.com/vi/x/hqdefault.jpg"
        }"#;
        let details = parse_oembed(body).unwrap();
        assert_eq!(details.title, "Lecture 1: Kinematics");
        assert_eq!(details.author, "MIT OpenCourseWare");
    }

    #[test]
    fn test_parse_oembed_malformed() {
        assert!(matches!(
            parse_oembed("<html>Not Found</html>"),
            Err(LookupError::Malformed(_))
        ));
        assert!(matches!(
            parse_oembed(r#"{"title": "no author"}"#),
            Err(LookupError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_falls_back_on_failure() {
        let video = fetch_video_record(&FailingLookup, "dQw4w9WgXcQ").await;
        assert_eq!(video.id, "dQw4w9WgXcQ");
        assert_eq!(video.title, UNKNOWN_TITLE);
        assert_eq!(video.author, UNKNOWN_AUTHOR);
        assert!(!video.watched);
        assert_eq!(video.progress, 0.0);
    }

    #[tokio::test]
    async fn test_fetch_uses_details() {
        let video = fetch_video_record(&FixedLookup, "dQw4w9WgXcQ").await;
        assert_eq!(video.title, "Lecture dQw4w9WgXcQ");
        assert_eq!(video.author, "MIT OpenCourseWare");
    }
}
