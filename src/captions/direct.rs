use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;

use super::{CaptionSource, CaptionTrack, LanguagePreference, non_negative_seconds};
use crate::{CaptionError, TranscriptCue, VideoId};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const WATCH_URL_BASE: &str = "https://www.youtube.com/watch";

static PLAYER_RESPONSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ytInitialPlayerResponse\s*=\s*\{").expect("valid player response pattern"));

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

/// Forwarding proxies tried in rotation.
///
/// The cursor only advances when a request through the current proxy gets a
/// non-success response, so the next call uses the next proxy.
#[derive(Debug, Default)]
pub struct ProxyPool {
    prefixes: Vec<String>,
    cursor: AtomicUsize,
}

impl ProxyPool {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self {
            prefixes,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Proxy prefix the next request will use
    pub fn current(&self) -> Option<&str> {
        if self.prefixes.is_empty() {
            return None;
        }
        let idx = self.cursor.load(Ordering::Relaxed) % self.prefixes.len();
        Some(&self.prefixes[idx])
    }

    fn rotate(&self) {
        if !self.prefixes.is_empty() {
            self.cursor.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// URL to request for `target`, routed through the current proxy if any
    fn route(&self, target: &str) -> String {
        match self.current() {
            Some(prefix) => format!("{prefix}{}", urlencoding::encode(target)),
            None => target.to_string(),
        }
    }
}

/// Reads captions straight from the watch page and the timed-text endpoint
#[derive(Debug)]
pub struct DirectSource {
    client: reqwest::Client,
    proxies: ProxyPool,
    languages: LanguagePreference,
    watch_url_base: String,
}

impl DirectSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            proxies: ProxyPool::default(),
            languages: LanguagePreference::default(),
            watch_url_base: WATCH_URL_BASE.to_string(),
        }
    }

    pub fn with_proxies(mut self, proxies: Vec<String>) -> Self {
        self.proxies = ProxyPool::new(proxies);
        self
    }

    pub fn with_languages(mut self, languages: LanguagePreference) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_watch_url_base(mut self, base: impl Into<String>) -> Self {
        self.watch_url_base = base.into();
        self
    }

    pub fn proxies(&self) -> &ProxyPool {
        &self.proxies
    }

    async fn fetch_text(&self, target: &str) -> Result<String, CaptionError> {
        let url = self.proxies.route(target);
        debug!("Fetching {target} via {url}");

        let resp = self.client.get(&url).header("User-Agent", USER_AGENT).send().await?;

        let status = resp.status();
        if !status.is_success() {
            self.proxies.rotate();
            if let Some(next) = self.proxies.current() {
                warn!("Request for {target} returned {status}; next attempt uses proxy {next}");
            }
            return Err(CaptionError::Status {
                url: target.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(resp.text().await?)
    }

    async fn caption_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, CaptionError> {
        let watch_url = format!("{}?v={video_id}", self.watch_url_base);
        let html = self.fetch_text(&watch_url).await?;

        let json = extract_player_response(&html).ok_or(CaptionError::PlayerResponseNotFound)?;
        let player: PlayerResponse = serde_json::from_str(json).map_err(CaptionError::PlayerResponseJson)?;

        let tracks = player
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default();

        if tracks.is_empty() {
            return Err(CaptionError::NoCaptionsAvailable(video_id.to_string()));
        }
        Ok(tracks)
    }
}

#[async_trait]
impl CaptionSource for DirectSource {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn fetch_cues(&self, video_id: &VideoId) -> Result<Vec<TranscriptCue>, CaptionError> {
        let tracks = self.caption_tracks(video_id).await?;
        let track = self
            .languages
            .select(&tracks)
            .ok_or_else(|| CaptionError::NoCaptionsAvailable(video_id.to_string()))?;

        debug!(
            "Using caption track: lang={} name={:?} ({} available)",
            track.language_code,
            track.display_name,
            tracks.len()
        );

        let xml = self.fetch_text(&track.base_url).await?;
        parse_caption_xml(&xml)
    }
}

/// Slice out the `ytInitialPlayerResponse` object literal from a watch page
fn extract_player_response(html: &str) -> Option<&str> {
    let m = PLAYER_RESPONSE.find(html)?;
    let start = m.end() - 1;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in html[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_caption_xml(xml: &str) -> Result<Vec<TranscriptCue>, CaptionError> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut cues = Vec::new();
    let mut current: Option<(f64, f64, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = 0.0;
                let mut dur = 0.0;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value)
                        .parse::<f64>()
                        .map_or(0.0, non_negative_seconds);
                    match attr.key.as_ref() {
                        b"start" => start = value,
                        b"dur" => dur = value,
                        _ => {}
                    }
                }
                current = Some((start, dur, String::new()));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((_, _, ref mut text)) = current {
                    let raw = e.unescape().map_err(|err| CaptionError::Xml(err.to_string()))?;
                    text.push_str(&raw);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some((_, _, ref mut text)) = current {
                    text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                if let Some((offset, duration, raw)) = current.take() {
                    let text = clean_cue_text(&raw);
                    if !text.is_empty() {
                        cues.push(TranscriptCue { offset, duration, text });
                    }
                }
            }
            Ok(Event::Empty(_)) => {
                // Self-closing <text .../> carries no text
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CaptionError::Xml(e.to_string())),
            _ => {}
        }
    }

    Ok(cues)
}

/// Decode entities left after XML unescaping, flatten newlines and trim
fn clean_cue_text(raw: &str) -> String {
    html_escape::decode_html_entities(raw)
        .replace("\r\n", " ")
        .replace('\n', " ")
        .trim()
        .to_string()
}
