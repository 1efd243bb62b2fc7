//! Wire shapes sent and received over the provider websocket (§6
//! "ASR wire protocol"). Parsing lives in its own module, separate from
//! `client.rs`'s connection management, the way the teacher keeps
//! Deepgram's response shape (`deepgram_streaming.rs`) apart from the
//! session that owns the socket.

use serde::{Deserialize, Serialize};
use translate_core::TranscriptSegment;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderFrame {
    Results(ResultsFrame),
    UtteranceEnd(UtteranceEndFrame),
    Metadata(serde_json::Value),
    Error(ErrorFrame),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct ResultsFrame {
    pub channel: Channel,
    pub is_final: bool,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
pub struct Alternative {
    pub transcript: String,
    pub confidence: f32,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UtteranceEndFrame {
    pub last_word_end: f64,
}

#[derive(Debug, Deserialize)]
pub struct ErrorFrame {
    pub description: String,
}

/// Outbound control frames, sent as JSON text over the same socket as
/// binary audio (§6).
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ControlFrame {
    KeepAlive,
    Finalize,
    CloseStream,
}

fn next_transcript_id(language_override: Option<&str>) -> String {
    let _ = language_override;
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("transcript-{}-{:06x}", n, rand::random::<u32>() & 0xffffff)
}

/// Turn a provider `Results` frame into the core's `TranscriptSegment`
/// shape (§3), rounding provider seconds to milliseconds and resolving
/// the segment's language (§4.1 "language handling for `multi`"): when
/// the session is configured for provider auto-detect (`session_language
/// == "multi"`), the provider's own per-alternative `language` is used;
/// otherwise the segment is stamped with the session's configured
/// source language, overriding whatever the provider reports.
pub fn segment_from_results(frame: &ResultsFrame, session_language: &str) -> Option<TranscriptSegment> {
    let alt = frame.channel.alternatives.first()?;
    if alt.transcript.is_empty() {
        return None;
    }
    let start_ms = (frame.start * 1000.0).round() as u64;
    let end_ms = ((frame.start + frame.duration) * 1000.0).round() as u64;
    let language = if session_language == "multi" {
        alt.language.clone().unwrap_or_else(|| session_language.to_string())
    } else {
        session_language.to_string()
    };
    Some(TranscriptSegment {
        id: next_transcript_id(Some(&language)),
        text: alt.transcript.clone(),
        confidence: alt.confidence,
        is_final: frame.is_final,
        start_ms: Some(start_ms),
        end_ms: Some(end_ms),
        language,
        timestamp: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_results_frame_into_segment() {
        let raw = serde_json::json!({
            "type": "Results",
            "channel": { "alternatives": [{ "transcript": "hello there", "confidence": 0.92 }] },
            "is_final": true,
            "start": 1.5,
            "duration": 0.8,
        });
        let frame: ProviderFrame = serde_json::from_value(raw).unwrap();
        let ProviderFrame::Results(results) = frame else {
            panic!("expected Results frame");
        };
        let segment = segment_from_results(&results, "en").unwrap();
        assert_eq!(segment.text, "hello there");
        assert_eq!(segment.start_ms, Some(1500));
        assert_eq!(segment.end_ms, Some(2300));
        assert!(segment.id.starts_with("transcript-"));
    }

    #[test]
    fn empty_transcript_yields_no_segment() {
        let frame = ResultsFrame {
            channel: Channel {
                alternatives: vec![Alternative {
                    transcript: String::new(),
                    confidence: 0.0,
                    language: None,
                }],
            },
            is_final: false,
            start: 0.0,
            duration: 0.0,
        };
        assert!(segment_from_results(&frame, "en").is_none());
    }

    #[test]
    fn configured_source_language_overrides_provider_language() {
        let frame = ResultsFrame {
            channel: Channel {
                alternatives: vec![Alternative {
                    transcript: "hola".to_string(),
                    confidence: 0.9,
                    language: Some("es".to_string()),
                }],
            },
            is_final: true,
            start: 0.0,
            duration: 1.0,
        };
        let segment = segment_from_results(&frame, "en").unwrap();
        assert_eq!(segment.language, "en");
    }

    #[test]
    fn multi_session_uses_provider_detected_language() {
        let frame = ResultsFrame {
            channel: Channel {
                alternatives: vec![Alternative {
                    transcript: "hola".to_string(),
                    confidence: 0.9,
                    language: Some("es".to_string()),
                }],
            },
            is_final: true,
            start: 0.0,
            duration: 1.0,
        };
        let segment = segment_from_results(&frame, "multi").unwrap();
        assert_eq!(segment.language, "es");
    }

    #[test]
    fn multi_session_without_provider_language_falls_back_to_session_language() {
        let frame = ResultsFrame {
            channel: Channel {
                alternatives: vec![Alternative {
                    transcript: "hola".to_string(),
                    confidence: 0.9,
                    language: None,
                }],
            },
            is_final: true,
            start: 0.0,
            duration: 1.0,
        };
        let segment = segment_from_results(&frame, "multi").unwrap();
        assert_eq!(segment.language, "multi");
    }
}
