use log::{debug, info, warn};

use crate::captions::CaptionSource;
use crate::metadata::MetadataFetcher;
use crate::timestamp::format_timestamp;
use crate::{FormattedCue, Result, Transcript, TranscriptCue, VideoMetadata, resolve_video_id};

/// Merge metadata and cues into a transcript.
///
/// Cue order is preserved; cues with blank text are dropped.
pub fn assemble(metadata: VideoMetadata, cues: Vec<TranscriptCue>) -> Transcript {
    let cues = cues
        .into_iter()
        .filter_map(|cue| {
            let text = cue.text.trim();
            (!text.is_empty()).then(|| FormattedCue {
                timestamp: format_timestamp(cue.offset),
                text: text.to_string(),
                duration: cue.duration,
            })
        })
        .collect();

    Transcript {
        video_id: metadata.video_id,
        title: metadata.title,
        author: metadata.author,
        thumbnail_url: metadata.thumbnail_url,
        cues,
    }
}

/// Progress of one video in a batch
#[derive(Debug)]
pub enum JobStatus {
    Pending,
    Downloading,
    Completed(Transcript),
    Failed(crate::TranscriptError),
}

impl JobStatus {
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed(_) => "completed",
            JobStatus::Failed(_) => "error",
        }
    }
}

/// One submitted URL and where it got to
#[derive(Debug)]
pub struct VideoJob {
    pub url: String,
    pub status: JobStatus,
}

/// URL in, transcript out
pub struct Pipeline {
    metadata: MetadataFetcher,
    captions: Box<dyn CaptionSource>,
}

impl Pipeline {
    pub fn new(metadata: MetadataFetcher, captions: Box<dyn CaptionSource>) -> Self {
        Self { metadata, captions }
    }

    /// Resolve, fetch metadata and captions, and assemble a transcript
    pub async fn get_transcript(&self, url: &str) -> Result<Transcript> {
        let video_id = resolve_video_id(url)?;
        debug!("Resolved {url} to {video_id}; caption source: {}", self.captions.name());

        let (metadata, cues) = tokio::join!(self.metadata.fetch(&video_id), self.captions.fetch_cues(&video_id));
        let cues = cues?;

        let transcript = assemble(metadata, cues);
        info!("Assembled transcript for {video_id}: {} cues", transcript.cues.len());
        Ok(transcript)
    }

    /// Process URLs one at a time, in order.
    ///
    /// `observer` sees every status transition as `(index, job)`. A failed
    /// video does not stop the ones after it.
    pub async fn run_batch<F>(&self, urls: &[String], mut observer: F) -> Vec<VideoJob>
    where
        F: FnMut(usize, &VideoJob),
    {
        let mut jobs: Vec<VideoJob> = urls
            .iter()
            .map(|url| VideoJob {
                url: url.clone(),
                status: JobStatus::Pending,
            })
            .collect();

        for (idx, job) in jobs.iter().enumerate() {
            observer(idx, job);
        }

        for idx in 0..jobs.len() {
            jobs[idx].status = JobStatus::Downloading;
            observer(idx, &jobs[idx]);

            jobs[idx].status = match self.get_transcript(&jobs[idx].url).await {
                Ok(transcript) => JobStatus::Completed(transcript),
                Err(e) => {
                    warn!("Transcript failed for {}: {e}", jobs[idx].url);
                    JobStatus::Failed(e)
                }
            };
            observer(idx, &jobs[idx]);
        }

        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CaptionError, TranscriptError, VideoId};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Returns fixed cues, except for one video id that always fails
    struct StubSource {
        failing_id: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl StubSource {
        fn new(failing_id: Option<&'static str>) -> Self {
            Self {
                failing_id,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl CaptionSource for StubSource {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_cues(&self, video_id: &VideoId) -> std::result::Result<Vec<TranscriptCue>, CaptionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_id == Some(video_id.as_str()) {
                return Err(CaptionError::NoCaptionsAvailable(video_id.to_string()));
            }
            Ok(vec![
                TranscriptCue {
                    offset: 0.0,
                    duration: 2.0,
                    text: "Hi".to_string(),
                },
                TranscriptCue {
                    offset: 61.25,
                    duration: 1.5,
                    text: format!("from {video_id}"),
                },
            ])
        }
    }

    fn metadata(id: &str) -> VideoMetadata {
        VideoMetadata {
            video_id: resolve_video_id(id).unwrap(),
            title: "Title".to_string(),
            author: "Author".to_string(),
            thumbnail_url: format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"),
        }
    }

    async fn pipeline(source: StubSource) -> (Pipeline, MockServer) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Stub Video",
                "author_name": "Stub Channel"
            })))
            .mount(&server)
            .await;
        let fetcher =
            MetadataFetcher::new(reqwest::Client::new()).with_endpoint(format!("{}/oembed", server.uri()));
        (Pipeline::new(fetcher, Box::new(source)), server)
    }

    #[test]
    fn test_assemble_drops_empty_cue() {
        let cues = vec![
            TranscriptCue {
                offset: 0.0,
                duration: 2.0,
                text: "Hi".to_string(),
            },
            TranscriptCue {
                offset: 2.0,
                duration: 0.0,
                text: String::new(),
            },
        ];
        let transcript = assemble(metadata("dQw4w9WgXcQ"), cues);
        assert_eq!(
            transcript.cues,
            vec![FormattedCue {
                timestamp: "00:00:00.000".to_string(),
                text: "Hi".to_string(),
                duration: 2.0,
            }]
        );
    }

    #[test]
    fn test_assemble_preserves_order_and_metadata() {
        let cues = vec![
            TranscriptCue {
                offset: 3661.5,
                duration: 1.0,
                text: "late".to_string(),
            },
            TranscriptCue {
                offset: 1.0,
                duration: 1.0,
                text: "early".to_string(),
            },
        ];
        let transcript = assemble(metadata("dQw4w9WgXcQ"), cues);
        assert_eq!(transcript.title, "Title");
        assert_eq!(transcript.author, "Author");
        assert_eq!(transcript.video_id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(transcript.cues[0].timestamp, "01:01:01.500");
        assert_eq!(transcript.cues[1].text, "early");
    }

    #[test]
    fn test_assemble_passes_through_empty() {
        let transcript = assemble(metadata("dQw4w9WgXcQ"), vec![]);
        assert!(transcript.cues.is_empty());
    }

    #[tokio::test]
    async fn test_get_transcript_end_to_end() {
        let (pipeline, _server) = pipeline(StubSource::new(None)).await;
        let transcript = pipeline.get_transcript("https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(transcript.title, "Stub Video");
        assert_eq!(transcript.author, "Stub Channel");
        assert_eq!(transcript.cues.len(), 2);
        assert_eq!(transcript.cues[1].timestamp, "00:01:01.250");
        assert_eq!(transcript.cues[1].text, "from dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_invalid_url_skips_caption_source() {
        let source = StubSource::new(None);
        let calls = source.calls.clone();
        let (pipeline, _server) = pipeline(source).await;
        let err = pipeline.get_transcript("https://vimeo.com/12345").await.unwrap_err();
        assert!(matches!(err, TranscriptError::InvalidUrl(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_caption_failure_is_caption_fetch_error() {
        let (pipeline, _server) = pipeline(StubSource::new(Some("dQw4w9WgXcQ"))).await;
        let err = pipeline.get_transcript("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(
            err,
            TranscriptError::CaptionFetch(CaptionError::NoCaptionsAvailable(_))
        ));
    }

    #[tokio::test]
    async fn test_same_id_twice_yields_independent_transcripts() {
        let source = StubSource::new(None);
        let calls = source.calls.clone();
        let (pipeline, _server) = pipeline(source).await;
        let urls = vec![
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            "https://youtu.be/dQw4w9WgXcQ".to_string(),
        ];
        let jobs = pipeline.run_batch(&urls, |_, _| {}).await;

        let transcripts: Vec<&Transcript> = jobs
            .iter()
            .map(|j| match &j.status {
                JobStatus::Completed(t) => t,
                other => panic!("unexpected status {other:?}"),
            })
            .collect();
        assert_eq!(transcripts.len(), 2);
        assert_eq!(transcripts[0], transcripts[1]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let (pipeline, _server) = pipeline(StubSource::new(Some("bbbbbbbbbbb"))).await;
        let urls = vec![
            "aaaaaaaaaaa".to_string(),
            "bbbbbbbbbbb".to_string(),
            "ccccccccccc".to_string(),
        ];

        let mut transitions = Vec::new();
        let jobs = pipeline
            .run_batch(&urls, |idx, job| transitions.push((idx, job.status.label())))
            .await;

        let labels: Vec<&str> = jobs.iter().map(|j| j.status.label()).collect();
        assert_eq!(labels, ["completed", "error", "completed"]);
        assert!(matches!(&jobs[1].status, JobStatus::Failed(TranscriptError::CaptionFetch(_))));

        assert_eq!(
            transitions,
            vec![
                (0, "pending"),
                (1, "pending"),
                (2, "pending"),
                (0, "downloading"),
                (0, "completed"),
                (1, "downloading"),
                (1, "error"),
                (2, "downloading"),
                (2, "completed"),
            ]
        );
    }
}
