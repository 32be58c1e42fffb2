use std::time::Duration;

use thiserror::Error;

/// Failure of a single video's pipeline run
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("invalid YouTube URL or video ID: {0}")]
    InvalidUrl(String),

    #[error("failed to fetch transcript: {0}")]
    CaptionFetch(#[from] CaptionError),
}

/// Failure of a caption source
#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("could not find player response in watch page")]
    PlayerResponseNotFound,

    #[error("no captions available for video {0}")]
    NoCaptionsAvailable(String),

    #[error("malformed player response: {0}")]
    PlayerResponseJson(#[source] serde_json::Error),

    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("error parsing caption XML: {0}")]
    Xml(String),

    #[error("could not start caption extractor: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("{0}")]
    Extractor(String),

    #[error("caption extractor timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, TranscriptError>;
