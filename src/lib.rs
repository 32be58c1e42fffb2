pub mod captions;
pub mod config;
pub mod error;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod timestamp;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use error::{CaptionError, Result, TranscriptError};

/// Canonical 11-character YouTube video id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Title, author and thumbnail for a video
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub video_id: VideoId,
    pub title: String,
    pub author: String,
    pub thumbnail_url: String,
}

/// A single timed caption as delivered by a caption source
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptCue {
    pub offset: f64,
    pub duration: f64,
    pub text: String,
}

/// A caption with its offset rendered as `HH:MM:SS.mmm`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedCue {
    pub timestamp: String,
    pub text: String,
    pub duration: f64,
}

/// Complete transcript for a video
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub video_id: VideoId,
    pub title: String,
    pub author: String,
    #[serde(rename = "thumbnail")]
    pub thumbnail_url: String,
    #[serde(rename = "transcript")]
    pub cues: Vec<FormattedCue>,
}

static URL_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(
            r"(?:youtube\.com/watch\?(?:[^#\n]*?&)?v=|youtu\.be/|youtube(?:-nocookie)?\.com/(?:embed|shorts|live)/)([^&\n?#/]+)",
        )
        .expect("valid URL pattern"),
        Regex::new(r"^([a-zA-Z0-9_-]{11})$").expect("valid bare id pattern"),
    ]
});

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid video id pattern"));

/// Resolve a video id from a watch, short, embed or shorts URL, or a bare id
pub fn resolve_video_id(input: &str) -> Result<VideoId> {
    let trimmed = input.trim();

    let candidate = URL_PATTERNS
        .iter()
        .find_map(|re| re.captures(trimmed).map(|caps| caps[1].to_string()));

    match candidate {
        Some(id) if VIDEO_ID.is_match(&id) => Ok(VideoId(id)),
        _ => Err(TranscriptError::InvalidUrl(input.to_string())),
    }
}
