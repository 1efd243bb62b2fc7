//! Paragraph-builder output (§3 "Paragraph", §4.5).

use crate::transcript::TranscriptSegment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: String,
    pub segments: Vec<TranscriptSegment>,
    pub raw_text: String,
    pub cleaned_text: Option<String>,
    pub start_ms: u64,
    pub end_ms: u64,
    pub word_count: usize,
    /// Filled in once the low-priority `paragraph_`-routed translation
    /// job for this paragraph completes (§4.8).
    pub translated_text: Option<String>,
}
