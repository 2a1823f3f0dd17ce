//! Unified error types for chatdigest.
//!
//! This module provides a single [`ChatdigestError`] enum that covers all error
//! cases in the library. The variants split into two groups:
//!
//! - **Setup errors** end a run: [`Format`](ChatdigestError::Format),
//!   [`LedgerIo`](ChatdigestError::LedgerIo), [`Config`](ChatdigestError::Config)
//!   and a [`Transport`](ChatdigestError::Transport) failure while the tunnel
//!   is being acquired.
//! - **Per-conversation errors** are caught by the pipeline, recorded in the
//!   ledger and the batch moves on: [`Transport`](ChatdigestError::Transport),
//!   [`StreamDecode`](ChatdigestError::StreamDecode),
//!   [`Extraction`](ChatdigestError::Extraction).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for chatdigest operations.
///
/// # Example
///
/// ```rust
/// use chatdigest::error::Result;
/// use chatdigest::Conversation;
///
/// fn my_function() -> Result<Vec<Conversation>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatdigestError>;

/// The error type for all chatdigest operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatdigestError {
    /// An I/O error occurred outside the ledger.
    ///
    /// Typically the archive file is missing or an artifact could not be
    /// written.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive does not match any recognized export shape.
    #[error("Unrecognized archive format{}: {message}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    Format {
        /// Description of what's wrong
        message: String,
        /// The file path, if available
        path: Option<PathBuf>,
    },

    /// The inference endpoint could not be reached or answered with an error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A line of the streamed model response is not valid JSON.
    #[error("Failed to decode response stream at line {line}: {source}")]
    StreamDecode {
        /// 1-based line number within the response body
        line: usize,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// No JSON object could be recovered from the model output.
    #[error("Could not extract a JSON object from model output: {message}")]
    Extraction {
        /// Description of what's wrong
        message: String,
        /// Leading part of the text the extractor gave up on
        preview: String,
    },

    /// The history ledger could not be read or written.
    #[error("Ledger error at {}: {source}", path.display())]
    LedgerIo {
        /// Ledger file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Number of characters of model output kept in an extraction error.
const PREVIEW_CHARS: usize = 200;

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatdigestError {
    /// Creates a format error without a file path.
    pub fn format(message: impl Into<String>) -> Self {
        ChatdigestError::Format {
            message: message.into(),
            path: None,
        }
    }

    /// Attaches a file path to a format error. Other variants pass through.
    #[must_use]
    pub fn with_path(self, file: impl Into<PathBuf>) -> Self {
        match self {
            ChatdigestError::Format { message, .. } => ChatdigestError::Format {
                message,
                path: Some(file.into()),
            },
            other => other,
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        ChatdigestError::Transport(message.into())
    }

    /// Creates an extraction error, keeping a short preview of the input.
    pub fn extraction(message: impl Into<String>, text: &str) -> Self {
        ChatdigestError::Extraction {
            message: message.into(),
            preview: text.chars().take(PREVIEW_CHARS).collect(),
        }
    }

    /// Creates a ledger I/O error.
    pub fn ledger_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ChatdigestError::LedgerIo {
            path: path.into(),
            source,
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        ChatdigestError::Config(message.into())
    }

    /// Returns `true` if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatdigestError::Io(_))
    }

    /// Returns `true` if this is an archive format error.
    pub fn is_format(&self) -> bool {
        matches!(self, ChatdigestError::Format { .. })
    }

    /// Returns `true` if this is a transport error.
    pub fn is_transport(&self) -> bool {
        matches!(self, ChatdigestError::Transport(_))
    }

    /// Returns `true` if this is a stream decode error.
    pub fn is_stream_decode(&self) -> bool {
        matches!(self, ChatdigestError::StreamDecode { .. })
    }

    /// Returns `true` if this is an extraction error.
    pub fn is_extraction(&self) -> bool {
        matches!(self, ChatdigestError::Extraction { .. })
    }

    /// Returns `true` if this is a ledger error.
    pub fn is_ledger_io(&self) -> bool {
        matches!(self, ChatdigestError::LedgerIo { .. })
    }

    /// Leading part of the model output an extraction error gave up on.
    pub fn preview(&self) -> Option<&str> {
        match self {
            ChatdigestError::Extraction { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Returns `true` if this error only affects the conversation being
    /// processed and the batch should continue.
    pub fn is_per_conversation(&self) -> bool {
        matches!(
            self,
            ChatdigestError::Transport(_)
                | ChatdigestError::StreamDecode { .. }
                | ChatdigestError::Extraction { .. }
                | ChatdigestError::Io(_)
                | ChatdigestError::Json(_)
        )
    }

    /// Returns `true` for errors that end a run before or outside the
    /// per-conversation loop.
    ///
    /// A [`Transport`](ChatdigestError::Transport) error is only fatal while
    /// the transport is being acquired; the pipeline propagates it directly
    /// in that case.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(
            self,
            ChatdigestError::Format { .. }
                | ChatdigestError::LedgerIo { .. }
                | ChatdigestError::Config(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
