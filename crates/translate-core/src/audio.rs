//! Audio frame types.
//!
//! The core treats audio as opaque PCM bytes produced by an external
//! capture source (§1 Purpose & Scope: "Audio capture is external; the
//! core consumes PCM frames and a start/stop control"). Byte-level
//! encoding conversion is delegated to that source, so this type carries
//! no resampling or VAD logic — only what downstream components need for
//! keep-alive timing and metrics (byte counts).

use std::sync::Arc;
use std::time::Instant;

/// Channel count. The ASR wire protocol (§6) always sends `channels=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channels {
    #[default]
    Mono,
    Stereo,
}

impl Channels {
    pub fn count(&self) -> u8 {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

/// A single chunk of raw PCM audio handed to the ASR Stream Adapter
/// (C1). Opaque beyond its byte length and arrival sequence.
#[derive(Clone)]
pub struct AudioFrame {
    /// Raw PCM bytes (s16le per the wire protocol default).
    pub bytes: Arc<[u8]>,
    pub sample_rate_hz: u32,
    pub channels: Channels,
    /// Monotonic sequence assigned by the capture source.
    pub sequence: u64,
    pub captured_at: Instant,
}

impl std::fmt::Debug for AudioFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFrame")
            .field("byte_len", &self.bytes.len())
            .field("sample_rate_hz", &self.sample_rate_hz)
            .field("channels", &self.channels)
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl AudioFrame {
    pub fn new(bytes: Vec<u8>, sample_rate_hz: u32, channels: Channels, sequence: u64) -> Self {
        Self {
            bytes: bytes.into(),
            sample_rate_hz,
            channels,
            sequence,
            captured_at: Instant::now(),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_len_matches_input() {
        let frame = AudioFrame::new(vec![0u8; 320], 16000, Channels::Mono, 1);
        assert_eq!(frame.byte_len(), 320);
        assert_eq!(frame.channels.count(), 1);
    }
}
