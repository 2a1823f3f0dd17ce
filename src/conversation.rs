//! Normalized conversation type shared by every archive shape.
//!
//! All archive parsers convert their input into [`Conversation`]s: a named,
//! ordered list of plain-text messages. Sender names, timestamps and message
//! ids are dropped on purpose, so two exports of the same dialogue produce the
//! same [`Fingerprint`](crate::core::Fingerprint).
//!
//! # Examples
//!
//! ```
//! use chatdigest::Conversation;
//!
//! let conv = Conversation::new("42", "Alice", vec!["Hi".into(), "Price?".into()]);
//! assert_eq!(conv.display_name(), "Alice");
//! assert_eq!(conv.joined_text(), "Hi\nPrice?");
//! ```

use serde::{Deserialize, Serialize};

/// A single conversation extracted from a chat archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Identifier from the archive (chat id, or the ordinal when absent).
    pub id: String,

    /// Human-readable chat name used for output file names.
    pub display_name: String,

    /// Message texts in archive order. Never contains empty strings.
    pub messages: Vec<String>,
}

impl Conversation {
    /// Creates a conversation.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        messages: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            messages,
        }
    }

    /// Returns the chat identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the chat name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the message texts.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the conversation has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Message texts joined with `'\n'`.
    ///
    /// This is both the text sent to the model and the input of the
    /// fingerprint.
    pub fn joined_text(&self) -> String {
        self.messages.join("\n")
    }
}
