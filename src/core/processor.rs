//! The batch pipeline.
//!
//! [`Pipeline::run`] walks the conversations of one archive in order:
//!
//! ```text
//! load ledger -> for each conversation:
//!     fingerprint -> already done? skip
//!     prompt -> generate -> extract -> write artifact
//!     append ledger entry (success or failure) -> session record
//! -> release transport
//! ```
//!
//! A failing conversation is recorded and the batch moves on. Only setup
//! problems (ledger unreadable, transport not acquirable) and a ledger that
//! can no longer be appended to end the run. The transport is acquired
//! lazily on the first conversation that needs the model and released
//! exactly once on every exit path.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::extract::ResponseExtractor;
use super::fingerprint::Fingerprint;
use super::ledger::DedupLedger;
use super::models::{AnalysisArtifact, AnalysisRecord, LedgerEntry, SessionRecord};
use super::output::{JsonlSessionStore, SessionStore, write_artifact};
use super::prompt::PromptBuilder;
use crate::Conversation;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::inference::Generate;
use crate::progress::{Progress, ProgressCallback};
use crate::transport::{Session, Transport};

/// A conversation that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationFailure {
    /// 1-based position in the archive.
    pub ordinal: usize,
    pub chat_name: String,
    pub error: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Conversations in the archive.
    pub total: usize,
    /// Conversations analyzed in this run.
    pub processed: usize,
    /// Conversations already in the ledger, repeated within the archive, or empty.
    pub skipped: usize,
    /// Conversations that failed in this run.
    pub failed: usize,
    /// Artifact files written, in archive order.
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<ConversationFailure>,
}

impl RunReport {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Some conversations failed.
    pub fn is_partial(&self) -> bool {
        self.failed > 0
    }

    /// Nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Sequential, resumable analysis of an archive's conversations.
pub struct Pipeline<T, G, S = JsonlSessionStore> {
    transport: T,
    generator: G,
    store: S,
    ledger: DedupLedger,
    config: PipelineConfig,
    prompt: PromptBuilder,
    extractor: ResponseExtractor,
    progress: Option<ProgressCallback>,
}

impl<T, G> Pipeline<T, G, JsonlSessionStore>
where
    T: Transport,
    G: Generate,
{
    /// Pipeline writing session records to `<output_dir>/sessions.jsonl`.
    pub fn new(transport: T, generator: G, config: PipelineConfig) -> Self {
        let store = JsonlSessionStore::in_dir(&config.output_dir);
        let ledger = DedupLedger::open(config.ledger_path());
        let prompt = PromptBuilder::default().with_max_chars(config.max_prompt_chars);
        Self {
            transport,
            generator,
            store,
            ledger,
            config,
            prompt,
            extractor: ResponseExtractor::default(),
            progress: None,
        }
    }
}

impl<T, G, S> Pipeline<T, G, S>
where
    T: Transport,
    G: Generate,
    S: SessionStore,
{
    /// Replaces the session store.
    pub fn with_session_store<S2: SessionStore>(self, store: S2) -> Pipeline<T, G, S2> {
        Pipeline {
            transport: self.transport,
            generator: self.generator,
            store,
            ledger: self.ledger,
            config: self.config,
            prompt: self.prompt,
            extractor: self.extractor,
            progress: self.progress,
        }
    }

    /// Sets a callback invoked after each conversation.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: ResponseExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyzes every conversation of `source` not yet in the ledger.
    ///
    /// `source` is only recorded, never read.
    pub async fn run(&self, source: &Path, conversations: &[Conversation]) -> Result<RunReport> {
        let mut done = self.ledger.load()?;
        let mut report = RunReport::new(conversations.len());
        let mut session: Option<T::Session> = None;

        info!(
            source = %source.display(),
            conversations = conversations.len(),
            already_done = done.len(),
            "run started"
        );

        let outcome = self
            .process_all(&mut session, source, conversations, &mut done, &mut report)
            .await;

        if let Some(active) = session {
            active.release().await;
        }
        outcome?;

        info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "run finished"
        );
        Ok(report)
    }

    async fn process_all(
        &self,
        session: &mut Option<T::Session>,
        source: &Path,
        conversations: &[Conversation],
        done: &mut HashSet<Fingerprint>,
        report: &mut RunReport,
    ) -> Result<()> {
        let source_file = source.display().to_string();
        let total = conversations.len();

        for (idx, conversation) in conversations.iter().enumerate() {
            let ordinal = idx + 1;
            let hash = Fingerprint::of_conversation(conversation);

            if conversation.is_empty() || done.contains(&hash) {
                report.skipped += 1;
                self.report_progress(ordinal, total);
                continue;
            }

            let endpoint = match session.as_ref() {
                Some(active) => active.endpoint().to_string(),
                None => {
                    let active = self.transport.acquire().await?;
                    let endpoint = active.endpoint().to_string();
                    info!(%endpoint, "transport ready");
                    *session = Some(active);
                    endpoint
                }
            };

            match self
                .analyze(&endpoint, &source_file, ordinal, conversation, &hash)
                .await
            {
                Ok((path, record)) => {
                    self.ledger.append(&LedgerEntry::succeeded(
                        &source_file,
                        conversation.display_name(),
                        path.display().to_string(),
                        self.generator.model(),
                        &endpoint,
                        hash.clone(),
                    ))?;
                    self.store_session(&source_file, &endpoint, conversation, &hash, Ok(record));
                    done.insert(hash);
                    report.processed += 1;
                    report.outputs.push(path);
                }
                Err(e) if !e.is_per_conversation() => return Err(e),
                Err(e) => {
                    warn!(
                        ordinal,
                        chat = conversation.display_name(),
                        error = %e,
                        "conversation failed"
                    );
                    if let Some(preview) = e.preview() {
                        debug!(preview, "unextractable model output");
                    }
                    let error = e.to_string();
                    self.ledger.append(&LedgerEntry::failed(
                        &source_file,
                        conversation.display_name(),
                        self.generator.model(),
                        &endpoint,
                        hash.clone(),
                        &error,
                    ))?;
                    self.store_session(
                        &source_file,
                        &endpoint,
                        conversation,
                        &hash,
                        Err(error.clone()),
                    );
                    report.failed += 1;
                    report.failures.push(ConversationFailure {
                        ordinal,
                        chat_name: conversation.display_name().to_string(),
                        error,
                    });
                }
            }

            self.report_progress(ordinal, total);
        }

        Ok(())
    }

    #[instrument(skip_all, fields(ordinal = ordinal, chat = %conversation.display_name()))]
    async fn analyze(
        &self,
        endpoint: &str,
        source_file: &str,
        ordinal: usize,
        conversation: &Conversation,
        hash: &Fingerprint,
    ) -> Result<(PathBuf, AnalysisRecord)> {
        let prompt = self.prompt.build(conversation);
        let answer = self.generator.generate(endpoint, &prompt).await?;
        let object = self.extractor.extract(&answer)?;
        let record = AnalysisRecord::from_object(object);

        let artifact = AnalysisArtifact {
            id: Uuid::now_v7(),
            source_file: source_file.to_string(),
            chat_id: conversation.id().to_string(),
            chat_name: conversation.display_name().to_string(),
            created_at: Utc::now(),
            host: endpoint.to_string(),
            model: self.generator.model().to_string(),
            chat_hash: hash.clone(),
            result: record,
        };
        let path = write_artifact(&self.config.output_dir, ordinal, &artifact)?;
        info!(path = %path.display(), "artifact written");

        Ok((path, artifact.result))
    }

    fn store_session(
        &self,
        source_file: &str,
        endpoint: &str,
        conversation: &Conversation,
        hash: &Fingerprint,
        outcome: std::result::Result<AnalysisRecord, String>,
    ) {
        let (success, result, error) = match outcome {
            Ok(record) => (true, Some(record), None),
            Err(error) => (false, None, Some(error)),
        };
        let record = SessionRecord {
            id: Uuid::now_v7(),
            source_file: source_file.to_string(),
            chat_name: conversation.display_name().to_string(),
            created_at: Utc::now(),
            host: endpoint.to_string(),
            model: self.generator.model().to_string(),
            chat_hash: hash.clone(),
            success,
            result,
            error,
        };
        if let Err(e) = self.store.store(&record) {
            warn!(error = %e, "session record not stored");
        }
    }

    fn report_progress(&self, items_processed: usize, total_items: usize) {
        if let Some(callback) = &self.progress {
            callback(Progress::new(items_processed, total_items));
        }
    }
}
