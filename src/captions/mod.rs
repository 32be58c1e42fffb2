pub mod delegated;
pub mod direct;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{CaptionError, TranscriptCue, VideoId};

pub use delegated::DelegatedSource;
pub use direct::{DirectSource, ProxyPool};

/// Clamp a cue offset or duration to a finite, non-negative value
pub(crate) fn non_negative_seconds(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// Languages tried when no preference is configured
pub const DEFAULT_LANGUAGES: &[&str] = &["vi", "en"];

/// How caption cues are obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Fetch the watch page and timed-text XML directly
    #[default]
    Direct,
    /// Run an external caption extractor process
    Delegated,
}

/// Something that can produce the ordered caption cues for a video
#[async_trait]
pub trait CaptionSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_cues(&self, video_id: &VideoId) -> Result<Vec<TranscriptCue>, CaptionError>;
}

/// A caption stream listed in the player response, not yet fetched
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptionTrack {
    #[serde(rename = "languageCode")]
    pub language_code: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(default, rename = "name", deserialize_with = "display_name")]
    pub display_name: String,
}

#[derive(Deserialize)]
struct TrackName {
    #[serde(rename = "simpleText")]
    simple_text: Option<String>,
    runs: Option<Vec<TrackNameRun>>,
}

#[derive(Deserialize)]
struct TrackNameRun {
    text: String,
}

fn display_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = Option::<TrackName>::deserialize(deserializer)?;
    Ok(name
        .and_then(|n| {
            n.simple_text
                .or_else(|| n.runs.map(|runs| runs.into_iter().map(|r| r.text).collect()))
        })
        .unwrap_or_default())
}

/// Ordered list of preferred caption languages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePreference(Vec<String>);

impl LanguagePreference {
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(languages.into_iter().map(Into::into).collect())
    }

    pub fn languages(&self) -> &[String] {
        &self.0
    }

    /// First track matching a preferred language, else the first track listed
    pub fn select<'a>(&self, tracks: &'a [CaptionTrack]) -> Option<&'a CaptionTrack> {
        self.0
            .iter()
            .find_map(|lang| tracks.iter().find(|t| &t.language_code == lang))
            .or_else(|| tracks.first())
    }
}

impl Default for LanguagePreference {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGES.iter().copied())
    }
}
