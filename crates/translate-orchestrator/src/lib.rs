//! Pipeline Orchestrator (C8, §4.8): the only component that holds
//! mutable session state directly. Everything else exposes a
//! message-style API; this crate owns the wiring between them and
//! enforces the cross-component invariants the spec calls out (fan-out
//! order, same-language shortcut, teardown draining).
//!
//! Grounded on the teacher's `GoldLoanAgent` (`voice-agent-agent`): one
//! struct holding `Arc`s to every child collaborator plus a broadcast
//! event sender, constructed once per session and driven by an
//! event-loop of background tasks rather than a single `process()` call
//! (the teacher's agent is turn-based; this domain is stream-based, so
//! the loop shape comes from `translate-asr`'s reader/keepalive tasks
//! instead).

mod report;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use translate_asr::{AsrClient, AsrEvent};
use translate_config::Settings;
use translate_core::error::{Error, Result};
use translate_core::traits::{GatewayRequest, LlmGateway, Purpose};
use translate_core::{
    AsrEventData, AudioFrame, CombinedSentence, ErrorEventData, Paragraph, PipelineEvent,
    Priority, RoutePrefix, SegmentEventData, SessionStatus, StatusEventData, TranscriptSegment,
    TranslationEventData, TranslationJob,
};
use translate_display::DisplayManager;
use translate_events::{CorrelationMap, EventBus, MetricsRegistry};
use translate_pipeline::coalescer::{CoalescedUpdate, StreamCoalescer};
use translate_pipeline::combiner::SentenceCombiner;
use translate_pipeline::paragraph::ParagraphBuilder;
use translate_pipeline::summarizer::ProgressiveSummarizer;
use translate_queue::{QueueManager, QueueOutcome};

pub use report::FinalReport;

const STOP_DRAIN_GRACE: Duration = Duration::from_secs(5);

struct ActiveSession {
    src_lang: String,
    tgt_lang: String,
    correlation_id: String,
    combiner: Arc<SentenceCombiner>,
    paragraph: Arc<ParagraphBuilder>,
    summarizer: Arc<ProgressiveSummarizer>,
    coalescer: Arc<StreamCoalescer>,
    queue: Arc<QueueManager>,
    asr: AsrClient,
    tasks: Vec<JoinHandle<()>>,
}

pub struct Orchestrator {
    settings: Settings,
    gateway: Arc<dyn LlmGateway>,
    asr_provider_url: String,
    asr_api_key: String,
    session: Arc<translate_session::SessionStore>,
    display: Arc<DisplayManager>,
    events: Arc<EventBus>,
    correlation: Arc<CorrelationMap>,
    metrics: Arc<MetricsRegistry>,
    active: Mutex<Option<ActiveSession>>,
}

impl Orchestrator {
    pub fn new(
        settings: Settings,
        gateway: Arc<dyn LlmGateway>,
        asr_provider_url: String,
        asr_api_key: String,
    ) -> Arc<Self> {
        let (events, _internal_rx) = EventBus::new(1024);
        let display = DisplayManager::new(settings.display.clone());
        let metrics = MetricsRegistry::new(settings.metrics.clone());
        metrics.spawn_collector();
        let correlation = CorrelationMap::new();
        correlation.spawn_sweeper(Duration::from_secs(10));

        Arc::new(Self {
            settings,
            gateway,
            asr_provider_url,
            asr_api_key,
            session: Arc::new(translate_session::SessionStore::new()),
            display,
            events,
            correlation,
            metrics,
            active: Mutex::new(None),
        })
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn is_listening(&self) -> bool {
        self.active.lock().is_some()
    }

    /// §4.8 "On startListening": reset children, open C1, start the
    /// periodic summary ticker, emit `status(listening)`.
    pub async fn start_listening(
        self: &Arc<Self>,
        src_lang: String,
        tgt_lang: String,
        correlation_id: Option<String>,
    ) -> Result<String> {
        if self.is_listening() {
            self.stop_listening(None).await?;
        }

        let correlation_id = self.correlation.track(correlation_id.as_deref());
        self.session.start(&src_lang, &tgt_lang);
        self.display.reset();

        let combiner = Arc::new(SentenceCombiner::new(self.settings.combiner));
        let paragraph = Arc::new(ParagraphBuilder::new(self.settings.paragraph.clone()));
        let summarizer = Arc::new(ProgressiveSummarizer::new(self.settings.summary.clone()));

        let (commits_tx, commits_rx) = mpsc::channel(256);
        let coalescer = StreamCoalescer::new(self.settings.coalescer, commits_tx);

        let (outcomes_tx, outcomes_rx) = mpsc::channel(256);
        let queue = QueueManager::new(self.settings.queue, self.gateway.clone(), outcomes_tx);
        queue.spawn_dispatch_loop();

        let (asr_events_tx, asr_events_rx) = mpsc::channel(256);
        let asr = AsrClient::new(
            self.asr_provider_url.clone(),
            self.asr_api_key.clone(),
            self.settings.asr.clone(),
            src_lang.clone(),
            asr_events_tx,
        );
        asr.connect().await.map_err(|e| Error::Asr(e.to_string()))?;

        let mut tasks = Vec::new();
        tasks.push(self.spawn_commit_loop(commits_rx, correlation_id.clone()));
        tasks.push(self.spawn_outcome_loop(outcomes_rx, correlation_id.clone()));
        tasks.push(self.spawn_asr_loop(
            asr_events_rx,
            combiner.clone(),
            paragraph.clone(),
            summarizer.clone(),
            coalescer.clone(),
            queue.clone(),
            src_lang.clone(),
            tgt_lang.clone(),
            correlation_id.clone(),
        ));
        tasks.push(self.spawn_summary_ticker(summarizer.clone(), correlation_id.clone()));

        *self.active.lock() = Some(ActiveSession {
            src_lang,
            tgt_lang,
            correlation_id: correlation_id.clone(),
            combiner,
            paragraph,
            summarizer,
            coalescer,
            queue,
            asr,
            tasks,
        });

        self.events
            .publish(
                PipelineEvent::Status(StatusEventData {
                    status: SessionStatus::Listening,
                    detail: None,
                }),
                &correlation_id,
            )
            .await;
        Ok(correlation_id)
    }

    pub async fn ingest_audio(&self, frame: &AudioFrame) -> Result<()> {
        let asr = {
            let guard = self.active.lock();
            guard.as_ref().map(|s| s.asr.clone())
        };
        let Some(asr) = asr else {
            return Err(Error::Validation("not listening".to_string()));
        };
        // §5 backpressure: audio send errors are recoverable and never
        // stall the pipeline.
        if let Err(e) = asr.send_audio(frame).await {
            tracing::warn!(error = %e, "audio send failed");
            self.metrics.record_error("ASR_SEND_ERROR");
        }
        Ok(())
    }

    /// §4.8 "On stopListening": cancel pending low-priority jobs first,
    /// flush C2/C5, drain C3 up to a grace period, close C1, generate
    /// the final report, publish `status(stopped)`.
    pub async fn stop_listening(&self, correlation_id: Option<String>) -> Result<Option<FinalReport>> {
        let Some(mut active) = self.active.lock().take() else {
            return Ok(None);
        };
        let correlation_id = correlation_id.unwrap_or(active.correlation_id.clone());

        if let Some(combined) = active.combiner.force_emit() {
            self.handle_combined(&active, combined).await;
        }
        if let Some(paragraph) = active.paragraph.force_close() {
            self.handle_paragraph(&active, paragraph).await;
        }

        let _ = tokio::time::timeout(STOP_DRAIN_GRACE, drain_queue(&active.queue)).await;

        if let Err(e) = active.asr.disconnect().await {
            tracing::warn!(error = %e, "asr disconnect failed");
        }
        for task in active.tasks.drain(..) {
            task.abort();
        }

        let report = self.generate_final_report(&active).await;
        if let Some(summary) = report.summary.clone() {
            self.events
                .publish(
                    PipelineEvent::FinalReport(translate_core::FinalReportData {
                        session_id: report.session_id.clone(),
                        summary,
                        vocabulary: report.vocabulary.clone(),
                    }),
                    &correlation_id,
                )
                .await;
        }

        self.events
            .publish(
                PipelineEvent::Status(StatusEventData {
                    status: SessionStatus::Stopped,
                    detail: None,
                }),
                &correlation_id,
            )
            .await;

        Ok(Some(report))
    }

    pub fn get_history(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Vec<translate_core::session::HistoryEntry> {
        self.session.history_page(limit, offset)
    }

    pub fn clear_history(&self) {
        self.session.clear_history();
    }

    fn spawn_commit_loop(
        self: &Arc<Self>,
        mut commits_rx: mpsc::Receiver<CoalescedUpdate>,
        correlation_id: String,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            while let Some(update) = commits_rx.recv().await {
                this.display.update_original(&update.key, &update.text, false);
                this.metrics.record_ui_update(true);
                this.publish_segment_snapshot(&correlation_id).await;
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_asr_loop(
        self: &Arc<Self>,
        mut asr_events_rx: mpsc::Receiver<AsrEvent>,
        combiner: Arc<SentenceCombiner>,
        paragraph: Arc<ParagraphBuilder>,
        summarizer: Arc<ProgressiveSummarizer>,
        coalescer: Arc<StreamCoalescer>,
        queue: Arc<QueueManager>,
        src_lang: String,
        tgt_lang: String,
        correlation_id: String,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            while let Some(event) = asr_events_rx.recv().await {
                match event {
                    AsrEvent::Segment(segment) => {
                        this.metrics.record_segment();
                        if segment.is_final {
                            this.handle_final_segment(
                                &segment,
                                &combiner,
                                &paragraph,
                                &summarizer,
                                &queue,
                                &src_lang,
                                &tgt_lang,
                                &correlation_id,
                            )
                            .await;
                        } else {
                            coalescer.update(segment.id.clone(), segment.text.clone(), false);
                        }
                        this.events
                            .publish(
                                PipelineEvent::Asr(AsrEventData { segment }),
                                &correlation_id,
                            )
                            .await;
                    }
                    AsrEvent::Connected => {
                        tracing::info!("asr connected");
                    }
                    AsrEvent::UtteranceEnd => {
                        let threshold = this.settings.paragraph.silence_threshold_ms;
                        if let Some(closed) = paragraph.close_on_silence(threshold) {
                            this.handle_paragraph_owned(&queue, &src_lang, &tgt_lang, &correlation_id, closed).await;
                        }
                    }
                    AsrEvent::Error { kind, message, recoverable } => {
                        this.metrics.record_error(kind.as_str());
                        this.events
                            .publish(
                                PipelineEvent::Error(ErrorEventData {
                                    kind: kind.as_str().to_string(),
                                    message,
                                    recoverable,
                                }),
                                &correlation_id,
                            )
                            .await;
                    }
                    AsrEvent::Disconnected { reason } => {
                        tracing::warn!(reason, "asr disconnected");
                    }
                    AsrEvent::ReconnectionFailed => {
                        this.metrics.record_error("ASR_RECONNECT_EXHAUSTED");
                        this.events
                            .publish(
                                PipelineEvent::Error(ErrorEventData {
                                    kind: "ASR_RECONNECT_EXHAUSTED".to_string(),
                                    message: "asr reconnection attempts exhausted".to_string(),
                                    recoverable: false,
                                }),
                                &correlation_id,
                            )
                            .await;
                    }
                }
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_final_segment(
        self: &Arc<Self>,
        segment: &TranscriptSegment,
        combiner: &Arc<SentenceCombiner>,
        paragraph: &Arc<ParagraphBuilder>,
        summarizer: &Arc<ProgressiveSummarizer>,
        queue: &Arc<QueueManager>,
        src_lang: &str,
        tgt_lang: &str,
        correlation_id: &str,
    ) {
        self.display.update_original(&segment.id, &segment.text, true);
        self.publish_segment_snapshot(correlation_id).await;
        self.session.record_final_segment(segment.clone());

        if !segment.text.trim().is_empty() {
            if let Err(e) = self
                .enqueue_translation(
                    queue,
                    RoutePrefix::Realtime.apply(&segment.id),
                    segment.text.clone(),
                    src_lang,
                    tgt_lang,
                    Priority::Normal,
                    correlation_id,
                )
                .await
            {
                tracing::warn!(error = %e, segment_id = %segment.id, "failed to enqueue realtime translation");
            }
        }

        if let Some(combined) = combiner.push_final(segment.clone()) {
            self.handle_combined_owned(queue, src_lang, tgt_lang, correlation_id, combined).await;
        }
        if let Some(closed) = paragraph.push_final(segment.clone()) {
            self.handle_paragraph_owned(queue, src_lang, tgt_lang, correlation_id, closed).await;
        }

        let cumulative = self.session.cumulative_word_count();
        if let Some(trigger) = summarizer.check_threshold(cumulative, src_lang) {
            self.run_summary(src_lang, tgt_lang, correlation_id, trigger.threshold_words, false)
                .await;
        }
    }

    async fn handle_combined(&self, active: &ActiveSession, combined: CombinedSentence) {
        self.handle_combined_owned(&active.queue, &active.src_lang, &active.tgt_lang, &active.correlation_id, combined)
            .await;
    }

    async fn handle_combined_owned(
        &self,
        queue: &Arc<QueueManager>,
        src_lang: &str,
        tgt_lang: &str,
        correlation_id: &str,
        combined: CombinedSentence,
    ) {
        self.session.record_combined(combined.clone());
        let key_id = RoutePrefix::History.apply(&combined.id);
        if let Err(e) = self
            .enqueue_translation(
                queue,
                key_id,
                combined.original_text.clone(),
                src_lang,
                tgt_lang,
                Priority::Low,
                correlation_id,
            )
            .await
        {
            tracing::warn!(error = %e, combined_id = %combined.id, "failed to enqueue combined translation");
        }
        self.events
            .publish(PipelineEvent::CombinedSentence(combined), correlation_id)
            .await;
    }

    async fn handle_paragraph(&self, active: &ActiveSession, paragraph: Paragraph) {
        self.handle_paragraph_owned(&active.queue, &active.src_lang, &active.tgt_lang, &active.correlation_id, paragraph)
            .await;
    }

    async fn handle_paragraph_owned(
        &self,
        queue: &Arc<QueueManager>,
        src_lang: &str,
        tgt_lang: &str,
        correlation_id: &str,
        paragraph: Paragraph,
    ) {
        self.session.record_paragraph(paragraph.clone());
        let key_id = RoutePrefix::Paragraph.apply(&paragraph.id);
        let text = paragraph.cleaned_text.clone().unwrap_or_else(|| paragraph.raw_text.clone());
        if let Err(e) = self
            .enqueue_translation(queue, key_id, text, src_lang, tgt_lang, Priority::Low, correlation_id)
            .await
        {
            tracing::warn!(error = %e, paragraph_id = %paragraph.id, "failed to enqueue paragraph translation");
        }
        self.events
            .publish(PipelineEvent::ParagraphComplete(paragraph), correlation_id)
            .await;
    }

    /// §4.8 "same-language shortcut": enqueues nothing and resolves the
    /// job locally when `src_lang == tgt_lang`, still flowing through
    /// the event bus so ordering is preserved for downstream consumers.
    #[allow(clippy::too_many_arguments)]
    async fn enqueue_translation(
        &self,
        queue: &Arc<QueueManager>,
        key_id: String,
        source_text: String,
        src_lang: &str,
        tgt_lang: &str,
        priority: Priority,
        correlation_id: &str,
    ) -> Result<()> {
        if src_lang == tgt_lang {
            let outcome = QueueOutcome::Completed(translate_core::TranslationResult {
                key_id,
                translated_text: source_text,
                model: "identity".to_string(),
                confidence: 1.0,
                latency_ms: 0,
            });
            self.apply_outcome(outcome, correlation_id).await;
            return Ok(());
        }
        let job = TranslationJob::new(key_id.clone(), source_text, src_lang, tgt_lang, priority);
        match queue.enqueue(job) {
            Ok(()) => Ok(()),
            Err(Error::QueueOverflow) => {
                self.apply_outcome(QueueOutcome::Overflow { key_id }, correlation_id).await;
                Err(Error::QueueOverflow)
            }
            Err(e) => Err(e),
        }
    }

    fn spawn_outcome_loop(
        self: &Arc<Self>,
        mut outcomes_rx: mpsc::Receiver<QueueOutcome>,
        correlation_id: String,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            while let Some(outcome) = outcomes_rx.recv().await {
                this.apply_outcome(outcome, &correlation_id).await;
            }
        })
    }

    async fn apply_outcome(&self, outcome: QueueOutcome, correlation_id: &str) {
        match outcome {
            QueueOutcome::Completed(result) => {
                let (route, base_id) = RoutePrefix::strip(&result.key_id);
                self.display.complete_translation(base_id, &result.translated_text);
                match route {
                    RoutePrefix::Realtime => {
                        self.session.record_realtime_translation(base_id, &result.translated_text);
                    }
                    RoutePrefix::History => {
                        self.session.upgrade_combined_translation(base_id, &result.translated_text);
                    }
                    RoutePrefix::Paragraph => {
                        self.session.upgrade_paragraph_translation(base_id, &result.translated_text);
                    }
                }
                self.events
                    .publish(
                        PipelineEvent::Translation(TranslationEventData { result }),
                        correlation_id,
                    )
                    .await;
                self.publish_segment_snapshot(correlation_id).await;
            }
            QueueOutcome::Failed { key_id, error } => {
                tracing::warn!(key_id, error, "translation job failed");
                self.metrics.record_error("TRANSLATION_FAILED");
                self.events
                    .publish(
                        PipelineEvent::Error(ErrorEventData {
                            kind: "TRANSLATION_FAILED".to_string(),
                            message: error,
                            recoverable: true,
                        }),
                        correlation_id,
                    )
                    .await;
            }
            QueueOutcome::Overflow { key_id } => {
                let (route, _) = RoutePrefix::strip(&key_id);
                tracing::warn!(key_id, "queue overflow");
                self.metrics.record_error("QUEUE_OVERFLOW");
                if route != RoutePrefix::Realtime {
                    return;
                }
                self.events
                    .publish(
                        PipelineEvent::Error(ErrorEventData {
                            kind: "QUEUE_OVERFLOW".to_string(),
                            message: format!("dropped job {key_id}"),
                            recoverable: true,
                        }),
                        correlation_id,
                    )
                    .await;
            }
        }
    }

    async fn publish_segment_snapshot(&self, correlation_id: &str) {
        let pairs = self.display.snapshot();
        self.events
            .publish(PipelineEvent::Segment(SegmentEventData { pairs }), correlation_id)
            .await;
    }

    fn spawn_summary_ticker(
        self: &Arc<Self>,
        summarizer: Arc<ProgressiveSummarizer>,
        correlation_id: String,
    ) -> JoinHandle<()> {
        let this = self.clone();
        let interval_ms = this.settings.summary.periodic_interval_ms;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            loop {
                ticker.tick().await;
                if summarizer.check_periodic().is_none() {
                    continue;
                }
                let (src_lang, tgt_lang) = {
                    let guard = this.active.lock();
                    let Some(active) = guard.as_ref() else { break };
                    (active.src_lang.clone(), active.tgt_lang.clone())
                };
                this.run_summary(&src_lang, &tgt_lang, &correlation_id, None, true).await;
            }
        })
    }

    async fn run_summary(
        &self,
        src_lang: &str,
        tgt_lang: &str,
        correlation_id: &str,
        threshold_words: Option<u32>,
        periodic: bool,
    ) {
        let source_text = match self.session.snapshot() {
            Some(record) => record
                .history
                .iter()
                .map(|h| h.segment.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            None => return,
        };
        if source_text.trim().is_empty() {
            return;
        }

        let request = GatewayRequest {
            purpose: Purpose::Summary,
            system_prompt: format!("Summarize this {src_lang} lecture transcript concisely."),
            user_content: source_text,
            max_tokens: None,
        };
        let summary_text = match self.gateway.complete(request).await {
            Ok(response) => response.content,
            Err(e) => {
                tracing::warn!(error = %e, "summary generation failed");
                self.metrics.record_error("SUMMARY_FAILED");
                return;
            }
        };

        let target_text = if src_lang == tgt_lang {
            summary_text.clone()
        } else {
            let translate_request = GatewayRequest {
                purpose: Purpose::SummaryTranslate,
                system_prompt: format!("Translate this summary from {src_lang} to {tgt_lang}."),
                user_content: summary_text.clone(),
                max_tokens: None,
            };
            match self.gateway.complete(translate_request).await {
                Ok(response) => response.content,
                Err(e) => {
                    tracing::warn!(error = %e, "summary translation failed");
                    self.metrics.record_error("SUMMARY_TRANSLATE_FAILED");
                    summary_text.clone()
                }
            }
        };

        let summary = translate_core::Summary {
            id: uuid::Uuid::new_v4().to_string(),
            source_text: summary_text,
            target_text,
            threshold_words,
            periodic,
            created_ts: chrono::Utc::now(),
        };
        self.session.record_summary(summary.clone());

        let event = if periodic {
            PipelineEvent::PeriodicSummary(summary)
        } else {
            PipelineEvent::ProgressiveSummary(summary)
        };
        self.events.publish(event, correlation_id).await;
    }

    async fn generate_final_report(&self, active: &ActiveSession) -> FinalReport {
        report::generate(&self.gateway, &self.session, active.src_lang.clone()).await
    }
}

async fn drain_queue(queue: &Arc<QueueManager>) {
    while queue.pending_len() > 0 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
