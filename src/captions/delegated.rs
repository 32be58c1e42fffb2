use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use tokio::process::Command;

use super::{CaptionSource, non_negative_seconds};
use crate::{CaptionError, TranscriptCue, VideoId};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const RATE_LIMITED: &str =
    "Your IP has been blocked by YouTube. Please try again later or use a VPN to change your IP address.";

/// JSON printed by the extractor on stdout
#[derive(Debug, Deserialize)]
struct ExtractorResponse {
    success: bool,
    #[serde(default)]
    transcript: Vec<ExtractorCue>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractorCue {
    start: f64,
    duration: f64,
    text: String,
}

/// Hands the video id to an external caption extractor process.
///
/// The program is run as `<program> <args...> <video_id>` and must print
/// `{"success": true, "transcript": [{"start", "duration", "text"}]}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone)]
pub struct DelegatedSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl DelegatedSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build from a full command line, program first
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CaptionSource for DelegatedSource {
    fn name(&self) -> &'static str {
        "delegated"
    }

    async fn fetch_cues(&self, video_id: &VideoId) -> Result<Vec<TranscriptCue>, CaptionError> {
        debug!("Running caption extractor: {} {:?} {video_id}", self.program, self.args);

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(video_id.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(CaptionError::Spawn)?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CaptionError::Timeout(self.timeout))?
            .map_err(CaptionError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("caption extractor exited with {}", output.status)
            } else {
                stderr
            };
            return Err(CaptionError::Extractor(message));
        }

        parse_response(&output.stdout)
    }
}

fn parse_response(stdout: &[u8]) -> Result<Vec<TranscriptCue>, CaptionError> {
    let response: ExtractorResponse = serde_json::from_slice(stdout)
        .map_err(|e| CaptionError::Extractor(format!("failed to parse transcript result: {e}")))?;

    if !response.success {
        let message = response
            .error
            .unwrap_or_else(|| "failed to fetch transcript".to_string());
        return Err(CaptionError::Extractor(explain_failure(message)));
    }

    Ok(response
        .transcript
        .into_iter()
        .map(|c| TranscriptCue {
            offset: non_negative_seconds(c.start),
            duration: non_negative_seconds(c.duration),
            text: c.text,
        })
        .collect())
}

/// Replace rate-limit diagnostics with an actionable message
fn explain_failure(message: String) -> String {
    let lower = message.to_lowercase();
    if message.contains("IP") || lower.contains("blocked") || lower.contains("too many requests") {
        RATE_LIMITED.to_string()
    } else {
        message
    }
}
