//! Content fingerprints used for idempotent runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Conversation;

/// SHA-256 of a conversation's newline-joined message text, as lowercase hex.
///
/// No normalization is applied: any edit to any message changes the
/// fingerprint and forces the conversation to be analyzed again. Chat name and
/// id are not part of the input.
///
/// # Example
///
/// ```
/// use chatdigest::core::Fingerprint;
///
/// let fp = Fingerprint::of_text("hello world");
/// assert_eq!(fp.as_str().len(), 64);
/// assert_eq!(fp, Fingerprint::of_messages(&["hello world".to_string()]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hashes the exact UTF-8 bytes of `text`.
    pub fn of_text(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hashes messages joined with `'\n'`.
    pub fn of_messages(messages: &[String]) -> Self {
        Self::of_text(&messages.join("\n"))
    }

    /// Hashes a conversation's message text.
    pub fn of_conversation(conversation: &Conversation) -> Self {
        Self::of_messages(conversation.messages())
    }

    /// Returns the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
