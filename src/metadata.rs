use log::{debug, warn};
use serde::Deserialize;

use crate::{VideoId, VideoMetadata};

pub const DEFAULT_OEMBED_URL: &str = "https://www.youtube.com/oembed";

const DEFAULT_AUTHOR: &str = "Unknown";

/// Thumbnail resolution tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailQuality {
    Medium,
    #[default]
    High,
}

impl ThumbnailQuality {
    fn file_stem(&self) -> &str {
        match self {
            ThumbnailQuality::Medium => "mqdefault",
            ThumbnailQuality::High => "hqdefault",
        }
    }
}

/// Thumbnail URL for a video; no request is made
pub fn thumbnail_url(video_id: &VideoId, quality: ThumbnailQuality) -> String {
    format!("https://img.youtube.com/vi/{video_id}/{}.jpg", quality.file_stem())
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
}

/// Looks up video title and author through an oEmbed endpoint
#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    client: reqwest::Client,
    endpoint: String,
    quality: ThumbnailQuality,
}

impl MetadataFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: DEFAULT_OEMBED_URL.to_string(),
            quality: ThumbnailQuality::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_thumbnail_quality(mut self, quality: ThumbnailQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Fetch metadata, falling back to placeholders if the endpoint fails.
    ///
    /// Metadata is cosmetic, so this never returns an error: transcript
    /// retrieval must not be blocked by it.
    pub async fn fetch(&self, video_id: &VideoId) -> VideoMetadata {
        let oembed = match self.request(video_id).await {
            Ok(oembed) => Some(oembed),
            Err(e) => {
                warn!("oEmbed lookup failed for {video_id}: {e}");
                None
            }
        };

        let (title, author) = oembed
            .map(|o| (non_empty(o.title), non_empty(o.author_name)))
            .unwrap_or((None, None));

        VideoMetadata {
            video_id: video_id.clone(),
            title: title.unwrap_or_else(|| format!("Video {video_id}")),
            author: author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            thumbnail_url: thumbnail_url(video_id, self.quality),
        }
    }

    async fn request(&self, video_id: &VideoId) -> reqwest::Result<OEmbedResponse> {
        let watch_url = video_id.watch_url();
        debug!("Fetching oEmbed metadata: {} for {watch_url}", self.endpoint);

        self.client
            .get(&self.endpoint)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
