//! Core processing logic for chatdigest.
//!
//! This module contains:
//! - [`fingerprint`] - content hashes deciding whether a conversation is new
//! - [`ledger`] - the append-only history of processing attempts
//! - [`prompt`] - prompt construction
//! - [`extract`] - recovery of a JSON object from model output
//! - [`models`] - records written by the pipeline
//! - [`output`] - artifact files, session records, CSV export
//! - [`processor`] - the pipeline tying it all together
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use chatdigest::config::{InferenceConfig, PipelineConfig, TransportConfig};
//! use chatdigest::core::Pipeline;
//! use chatdigest::inference::InferenceClient;
//! use chatdigest::parsers::load_archive;
//! use chatdigest::transport::TransportManager;
//!
//! # #[tokio::main]
//! # async fn main() -> chatdigest::Result<()> {
//! let source = Path::new("data/result.json");
//! let conversations = load_archive(source)?;
//!
//! let pipeline = Pipeline::new(
//!     TransportManager::new(TransportConfig::direct("http://localhost:11434")),
//!     InferenceClient::new(InferenceConfig::new())?,
//!     PipelineConfig::new(),
//! );
//! let report = pipeline.run(source, &conversations).await?;
//! println!("{} analyzed, {} failed", report.processed, report.failed);
//! # Ok(())
//! # }
//! ```

pub mod extract;
pub mod fingerprint;
pub mod ledger;
pub mod models;
pub mod output;
pub mod processor;
pub mod prompt;

pub use extract::{KEY_REWRITES, ResponseExtractor};
pub use fingerprint::Fingerprint;
pub use ledger::DedupLedger;
pub use models::{AnalysisArtifact, AnalysisRecord, LedgerEntry, SessionRecord};
pub use output::{JsonlSessionStore, SessionStore, export_csv, write_artifact};
pub use processor::{ConversationFailure, Pipeline, RunReport};
pub use prompt::{INSTRUCTION_HEADER, PromptBuilder};
