//! Synced real-time display types (§3 "DisplayPair", §4.7).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Recent,
    Older,
    Oldest,
}

impl Position {
    /// §3: "`position` and `opacity` are a function of insertion order".
    pub fn opacity(self) -> f32 {
        match self {
            Position::Recent => 1.0,
            Position::Older => 0.6,
            Position::Oldest => 0.3,
        }
    }

    /// Shift one slot toward the back of the display (recent -> older ->
    /// oldest -> falls off, `None`).
    pub fn shifted(self) -> Option<Position> {
        match self {
            Position::Recent => Some(Position::Older),
            Position::Older => Some(Position::Oldest),
            Position::Oldest => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalSide {
    pub text: String,
    pub is_final: bool,
    pub ts: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSide {
    pub text: String,
    pub is_complete: bool,
    pub ts: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayMeta {
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub complete_time: Option<chrono::DateTime<chrono::Utc>>,
    pub position: Position,
    pub opacity: f32,
    /// `max(height(original), height(translation))`; both sides render
    /// at this height once either side finalizes.
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayPair {
    pub pair_id: String,
    pub original: OriginalSide,
    pub translation: TranslationSide,
    pub display: DisplayMeta,
    pub segment_id: Option<String>,
}

/// Approximate a single line's render height the way the teacher's
/// display sizing estimates text height elsewhere: by counting wrapped
/// lines at a fixed character budget. One unit per wrapped line.
pub fn estimate_height(text: &str, chars_per_line: usize) -> u32 {
    if text.is_empty() {
        return 1;
    }
    let chars_per_line = chars_per_line.max(1);
    (text.chars().count().div_ceil(chars_per_line)).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_matches_spec_constants() {
        assert_eq!(Position::Recent.opacity(), 1.0);
        assert_eq!(Position::Older.opacity(), 0.6);
        assert_eq!(Position::Oldest.opacity(), 0.3);
    }

    #[test]
    fn oldest_has_no_further_shift() {
        assert_eq!(Position::Oldest.shifted(), None);
        assert_eq!(Position::Recent.shifted(), Some(Position::Older));
    }
}
