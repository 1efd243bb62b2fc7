//! Progressive summary and vocabulary types (§3, §4.6).

use serde::{Deserialize, Serialize};

/// Cumulative word-count thresholds at which a progressive summary
/// fires, at most once each (§4.6, invariant P4).
pub const DEFAULT_SUMMARY_THRESHOLDS: [u32; 4] = [400, 800, 1600, 2400];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub source_text: String,
    pub target_text: String,
    pub threshold_words: Option<u32>,
    pub periodic: bool,
    pub created_ts: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub term: String,
    pub definition: String,
    pub context: Option<String>,
}
