//! Transcript shaping stages that sit between the ASR adapter (C1) and
//! the translation queue (C3): the Sentence Combiner (C2), Paragraph
//! Builder (C5), Progressive Summarizer (C6), and Stream Coalescer
//! (C10). Each stage is an independent, session-scoped accumulator the
//! orchestrator drives — none of them talk to each other directly.

pub mod coalescer;
pub mod combiner;
pub mod paragraph;
pub mod summarizer;

pub use coalescer::{CoalescedUpdate, StreamCoalescer};
pub use combiner::SentenceCombiner;
pub use paragraph::ParagraphBuilder;
pub use summarizer::{ProgressiveSummarizer, SummaryTrigger, SummaryTriggerKind};
