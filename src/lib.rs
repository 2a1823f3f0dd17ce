//! # chatdigest
//!
//! Turns chat-export archives into structured, per-conversation analyses
//! produced by a text-generation model (Ollama-style `/api/generate`).
//!
//! ## Overview
//!
//! - **Archives**: Telegram "export all chats" JSON, single-chat JSON
//!   exports, bare message arrays, and plain-text transcripts are normalized
//!   into [`Conversation`]s.
//! - **Idempotent runs**: every conversation is fingerprinted; an append-only
//!   ledger remembers which fingerprints were analyzed successfully, so a
//!   rerun only touches new or changed conversations.
//! - **Tolerant extraction**: the model's answer may be fenced, wrapped in
//!   prose or carry misspelled keys; a JSON object is recovered anyway.
//! - **Transports**: the model is reached directly or through an SSH port
//!   forward that lives exactly as long as the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use chatdigest::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let source = Path::new("data/result.json");
//! let conversations = load_archive(source)?;
//!
//! let pipeline = Pipeline::new(
//!     TransportManager::new(TransportConfig::direct("http://localhost:11434")),
//!     InferenceClient::new(InferenceConfig::new().with_model("gemma3n"))?,
//!     PipelineConfig::new().with_output_dir("output"),
//! );
//!
//! let report = pipeline.run(source, &conversations).await?;
//! println!("{} analyzed, {} skipped, {} failed", report.processed, report.skipped, report.failed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - [`parsers`] - archive shape detection ([`parsers::load_archive`])
//! - [`parsing`] - Telegram message text helpers shared by the parsers
//! - [`core`] - fingerprints, ledger, prompt, extraction, outputs, [`core::Pipeline`]
//! - [`transport`] - direct and SSH-tunneled access to the model server
//! - [`inference`] - the streaming `/api/generate` client
//! - [`config`] - configuration structs
//! - [`progress`] - progress callbacks
//! - [`cli`] - command-line arguments (feature `cli`)
//! - [`error`] - [`ChatdigestError`] and [`Result`]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod conversation;
pub mod core;
pub mod error;
pub mod inference;
pub mod parsers;
pub mod parsing;
pub mod progress;
pub mod transport;

pub use conversation::Conversation;
pub use error::{ChatdigestError, Result};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatdigest::prelude::*;
/// ```
pub mod prelude {
    pub use crate::Conversation;

    pub use crate::error::{ChatdigestError, Result};

    pub use crate::config::{InferenceConfig, PipelineConfig, TransportConfig, TunnelConfig};

    pub use crate::parsers::{load_archive, parse_archive};

    pub use crate::core::{
        AnalysisArtifact, AnalysisRecord, DedupLedger, Fingerprint, JsonlSessionStore, Pipeline,
        ResponseExtractor, RunReport, SessionStore,
    };

    pub use crate::inference::{Generate, InferenceClient};

    pub use crate::transport::{Session, Transport, TransportManager};

    pub use crate::progress::{Progress, ProgressCallback};
}
