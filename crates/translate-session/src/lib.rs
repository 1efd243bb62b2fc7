//! Session memory (C12, §3/§4.8): the append-only record of one
//! listening session. `SessionStore` is meant to have exactly one
//! owner — the orchestrator (C8) — and exposes a message-style API so
//! nothing outside it ever holds a mutable reference into the record
//! across an await point.

use parking_lot::Mutex;
use translate_core::session::HistoryEntry;
use translate_core::{CombinedSentence, Paragraph, SessionRecord, Summary, TranscriptSegment, VocabularyItem};

pub fn new_session_id() -> String {
    format!(
        "session-{}-{:06x}",
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u32>() & 0xffffff
    )
}

pub struct SessionStore {
    current: Mutex<Option<SessionRecord>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// Begin a fresh session, discarding whatever was there before.
    /// Returns the generated session id.
    pub fn start(&self, src_lang: &str, tgt_lang: &str) -> String {
        let session_id = new_session_id();
        *self.current.lock() = Some(SessionRecord::new(session_id.clone(), src_lang, tgt_lang));
        session_id
    }

    /// End the session, stamping `end_ts`, and hand back the final
    /// record for report generation. The store is left empty.
    pub fn end(&self) -> Option<SessionRecord> {
        let mut record = self.current.lock().take()?;
        record.end_ts = Some(chrono::Utc::now());
        Some(record)
    }

    pub fn is_active(&self) -> bool {
        self.current.lock().is_some()
    }

    pub fn snapshot(&self) -> Option<SessionRecord> {
        self.current.lock().clone()
    }

    pub fn record_final_segment(&self, segment: TranscriptSegment) {
        if let Some(record) = self.current.lock().as_mut() {
            record.record_final_segment(segment);
        }
    }

    pub fn record_realtime_translation(&self, segment_id: &str, translation: &str) -> bool {
        let mut guard = self.current.lock();
        let Some(record) = guard.as_mut() else {
            return false;
        };
        let Some(entry) = record.find_history_mut(segment_id) else {
            return false;
        };
        entry.realtime_translation = Some(translation.to_string());
        true
    }

    /// Attach a resolved `CombinedSentence` to every history entry it
    /// covers so the high-quality translation (once it lands) can find
    /// its way back to all of them.
    pub fn record_combined(&self, combined: CombinedSentence) {
        let mut guard = self.current.lock();
        let Some(record) = guard.as_mut() else {
            return;
        };
        for segment_id in &combined.segment_ids {
            if let Some(entry) = record.find_history_mut(segment_id) {
                entry.combined = Some(combined.clone());
            }
        }
    }

    /// §4.8 "upgrade": replace the realtime translation on every history
    /// entry whose combined sentence matches `combined_id`.
    pub fn upgrade_combined_translation(&self, combined_id: &str, translation: &str) -> bool {
        let mut guard = self.current.lock();
        let Some(record) = guard.as_mut() else {
            return false;
        };
        let mut upgraded = false;
        for entry in entries_for_combined(record, combined_id) {
            entry.combined_translation = Some(translation.to_string());
            upgraded = true;
        }
        upgraded
    }

    pub fn record_paragraph(&self, paragraph: Paragraph) {
        if let Some(record) = self.current.lock().as_mut() {
            record.paragraphs.push(paragraph);
        }
    }

    pub fn upgrade_paragraph_translation(&self, paragraph_id: &str, translation: &str) -> bool {
        let mut guard = self.current.lock();
        let Some(record) = guard.as_mut() else {
            return false;
        };
        let Some(paragraph) = record.paragraphs.iter_mut().find(|p| p.id == paragraph_id) else {
            return false;
        };
        paragraph.translated_text = Some(translation.to_string());
        true
    }

    pub fn record_summary(&self, summary: Summary) {
        if let Some(record) = self.current.lock().as_mut() {
            record.summaries.push(summary);
        }
    }

    pub fn record_vocabulary(&self, item: VocabularyItem) {
        if let Some(record) = self.current.lock().as_mut() {
            record.vocabulary.push(item);
        }
    }

    pub fn cumulative_word_count(&self) -> u32 {
        self.current
            .lock()
            .as_ref()
            .map(|r| r.cumulative_word_count())
            .unwrap_or(0)
    }

    pub fn has_summary_at_threshold(&self, threshold: u32) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|r| r.has_summary_at_threshold(threshold))
    }

    /// `clearHistory`: wipe accumulated history/paragraphs/summaries/
    /// vocabulary without ending the session itself.
    pub fn clear_history(&self) {
        if let Some(record) = self.current.lock().as_mut() {
            record.history.clear();
            record.paragraphs.clear();
            record.summaries.clear();
            record.vocabulary.clear();
        }
    }

    pub fn history_page(&self, limit: Option<usize>, offset: Option<usize>) -> Vec<HistoryEntry> {
        let guard = self.current.lock();
        let Some(record) = guard.as_ref() else {
            return Vec::new();
        };
        let offset = offset.unwrap_or(0);
        let iter = record.history.iter().skip(offset).cloned();
        match limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

fn entries_for_combined<'a, 'b>(
    record: &'a mut SessionRecord,
    combined_id: &'b str,
) -> impl Iterator<Item = &'a mut HistoryEntry> + use<'a, 'b> {
    record.history.iter_mut().filter(move |entry| {
        entry
            .combined
            .as_ref()
            .is_some_and(|c| c.id == combined_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(id: &str) -> TranscriptSegment {
        TranscriptSegment {
            id: id.to_string(),
            text: "hello world".to_string(),
            confidence: 0.9,
            is_final: true,
            start_ms: Some(0),
            end_ms: Some(500),
            language: "en".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn start_creates_active_session() {
        let store = SessionStore::new();
        let id = store.start("en", "es");
        assert!(store.is_active());
        assert_eq!(store.snapshot().unwrap().session_id, id);
    }

    #[test]
    fn record_final_segment_then_translate() {
        let store = SessionStore::new();
        store.start("en", "es");
        store.record_final_segment(segment("seg-1"));
        assert!(store.record_realtime_translation("seg-1", "hola mundo"));
        let entry = &store.snapshot().unwrap().history[0];
        assert_eq!(entry.realtime_translation.as_deref(), Some("hola mundo"));
    }

    #[test]
    fn combined_upgrade_applies_to_all_covered_segments() {
        let store = SessionStore::new();
        store.start("en", "es");
        store.record_final_segment(segment("seg-1"));
        store.record_final_segment(segment("seg-2"));
        let combined = CombinedSentence {
            id: "combined-1".to_string(),
            segment_ids: vec!["seg-1".to_string(), "seg-2".to_string()],
            original_text: "hello world hello world".to_string(),
            start_ts: chrono::Utc::now(),
            end_ts: chrono::Utc::now(),
            segment_count: 2,
        };
        store.record_combined(combined);
        assert!(store.upgrade_combined_translation("combined-1", "hola mundo hola mundo"));
        let snapshot = store.snapshot().unwrap();
        assert!(snapshot
            .history
            .iter()
            .all(|e| e.combined_translation.as_deref() == Some("hola mundo hola mundo")));
    }

    #[test]
    fn clear_history_keeps_session_active() {
        let store = SessionStore::new();
        store.start("en", "es");
        store.record_final_segment(segment("seg-1"));
        store.clear_history();
        assert!(store.is_active());
        assert!(store.snapshot().unwrap().history.is_empty());
    }

    #[test]
    fn end_stamps_end_ts_and_clears_store() {
        let store = SessionStore::new();
        store.start("en", "es");
        let ended = store.end().unwrap();
        assert!(ended.end_ts.is_some());
        assert!(!store.is_active());
    }

    #[test]
    fn history_page_respects_limit_and_offset() {
        let store = SessionStore::new();
        store.start("en", "es");
        for i in 0..5 {
            store.record_final_segment(segment(&format!("seg-{i}")));
        }
        let page = store.history_page(Some(2), Some(1));
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].segment.id, "seg-1");
    }
}
