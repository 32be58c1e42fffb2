use crate::Transcript;

/// Render transcript as plain text, one `timestamp<TAB>text` line per cue
pub fn render_text(transcript: &Transcript) -> String {
    transcript
        .cues
        .iter()
        .map(|c| format!("{}\t{}", c.timestamp, c.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render transcript as pretty-printed JSON
pub fn render_json(transcript: &Transcript) -> serde_json::Result<String> {
    serde_json::to_string_pretty(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FormattedCue, resolve_video_id};

    fn sample_transcript() -> Transcript {
        Transcript {
            video_id: resolve_video_id("dQw4w9WgXcQ").unwrap(),
            title: "Test Video".to_string(),
            author: "Tester".to_string(),
            thumbnail_url: "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string(),
            cues: vec![
                FormattedCue {
                    timestamp: "00:00:00.000".to_string(),
                    text: "Hello world".to_string(),
                    duration: 1.5,
                },
                FormattedCue {
                    timestamp: "00:00:01.500".to_string(),
                    text: "This is a test".to_string(),
                    duration: 2.0,
                },
            ],
        }
    }

    #[test]
    fn test_render_text() {
        let t = sample_transcript();
        assert_eq!(render_text(&t), "00:00:00.000\tHello world\n00:00:01.500\tThis is a test");
    }

    #[test]
    fn test_render_text_empty() {
        let mut t = sample_transcript();
        t.cues.clear();
        assert_eq!(render_text(&t), "");
    }

    #[test]
    fn test_render_json_matches_api_payload() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&sample_transcript()).unwrap()).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["author", "thumbnail", "title", "transcript", "videoId"]);
        assert_eq!(json["videoId"], "dQw4w9WgXcQ");
        assert_eq!(json["thumbnail"], "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg");
        assert_eq!(json["transcript"][1]["timestamp"], "00:00:01.500");
        assert_eq!(json["transcript"][1]["text"], "This is a test");
        assert_eq!(json["transcript"][1]["duration"], 2.0);
    }
}
