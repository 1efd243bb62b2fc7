//! Sentence-combiner output (§3 "CombinedSentence", §4.2).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CombinedSentence {
    pub id: String,
    pub segment_ids: Vec<String>,
    pub original_text: String,
    pub start_ts: chrono::DateTime<chrono::Utc>,
    pub end_ts: chrono::DateTime<chrono::Utc>,
    pub segment_count: usize,
}
