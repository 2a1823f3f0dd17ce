//! Chat archive parsers.
//!
//! An archive is normalized into an ordered list of [`Conversation`]s by a
//! closed set of shape parsers, tried in a fixed order. Each one either
//! claims the document or declines it:
//!
//! 1. [`MultiChatParser`] - `{"chats": {"list": [...]}}` or `{"list": [...]}`
//! 2. [`SingleChatParser`] - `[...]` or `{"messages": [...]}`
//!
//! When neither claims the document the archive is rejected with
//! [`ChatdigestError::Format`].
//!
//! # Example
//!
//! ```rust
//! use chatdigest::parsers::parse_archive;
//!
//! let convs = parse_archive(br#"[{"text": "hi"}]"#)?;
//! assert_eq!(convs[0].messages, vec!["hi"]);
//! # Ok::<(), chatdigest::ChatdigestError>(())
//! ```

mod multi_chat;
mod single_chat;

pub use multi_chat::MultiChatParser;
pub use single_chat::SingleChatParser;

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::Conversation;
use crate::error::{ChatdigestError, Result};

/// Result of offering a document to one shape parser.
#[derive(Debug)]
pub enum ParseOutcome {
    /// The parser recognized the shape and produced conversations.
    Matched(Vec<Conversation>),
    /// The document does not have this parser's shape.
    NotMatched,
}

/// Trait implemented by every archive shape parser.
pub trait ArchiveParser: Send + Sync {
    /// Returns the human-readable name of the shape.
    fn name(&self) -> &'static str;

    /// Tries to interpret an already-decoded JSON document.
    fn parse_value(&self, root: &Value) -> ParseOutcome;
}

/// Shape parsers in the order they are tried.
///
/// Multi-chat comes first: a full Telegram export is an object too, and must
/// not be mistaken for a single chat.
pub const PARSERS: &[&dyn ArchiveParser] = &[&MultiChatParser, &SingleChatParser];

/// Normalizes a decoded JSON document.
pub fn parse_value(root: &Value) -> Result<Vec<Conversation>> {
    for parser in PARSERS {
        if let ParseOutcome::Matched(conversations) = parser.parse_value(root) {
            debug!(shape = parser.name(), count = conversations.len(), "archive shape recognized");
            return Ok(conversations);
        }
    }

    let found = match root {
        Value::Object(_) => "an object without `messages`, `list` or `chats.list`",
        Value::Array(_) => "an array",
        Value::String(_) => "a string",
        Value::Number(_) => "a number",
        Value::Bool(_) => "a boolean",
        Value::Null => "null",
    };
    Err(ChatdigestError::format(format!(
        "expected a message list, an object with `messages`, or a chat list; found {found}"
    )))
}

/// Parses raw archive bytes.
pub fn parse_archive(bytes: &[u8]) -> Result<Vec<Conversation>> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| ChatdigestError::format(format!("invalid JSON: {e}")))?;
    parse_value(&root)
}

/// Parses an archive held in a string.
pub fn parse_archive_str(content: &str) -> Result<Vec<Conversation>> {
    parse_archive(content.as_bytes())
}

/// Treats a plain-text transcript as one conversation, one message per
/// non-blank line.
pub fn parse_transcript(name: &str, content: &str) -> Conversation {
    let messages = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();
    Conversation::new("1", name, messages)
}

/// Loads an archive from disk.
///
/// Files with a `.json` extension go through [`parse_archive`]; anything else
/// is read as a plain-text transcript named after the file stem.
pub fn load_archive(path: &Path) -> Result<Vec<Conversation>> {
    info!(path = %path.display(), "loading archive");

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let bytes = fs::read(path)?;
        parse_archive(&bytes).map_err(|e| e.with_path(path))
    } else {
        let content = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("chat_1");
        Ok(vec![parse_transcript(name, &content)])
    }
}
