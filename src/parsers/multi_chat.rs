//! Multi-conversation archive parser.

use serde_json::Value;
use tracing::warn;

use super::{ArchiveParser, ParseOutcome};
use crate::Conversation;
use crate::parsing::telegram::{id_to_string, is_chat_message, message_text};

/// Parser for archives holding many chats.
///
/// Recognizes Telegram Desktop's "export all chats" layout and a bare
/// top-level `list`:
/// ```json
/// {
///   "chats": {
///     "list": [
///       {
///         "name": "Client A",
///         "id": 1001,
///         "messages": [
///           {"type": "message", "text": "Hello"},
///           {"type": "service", "action": "pin_message"}
///         ]
///       }
///     ]
///   }
/// }
/// ```
///
/// Only entries with `"type": "message"` contribute text. Chats without a
/// `name` are called `chat_<ordinal>` (1-based, counting every entry).
#[derive(Debug, Default, Clone, Copy)]
pub struct MultiChatParser;

impl MultiChatParser {
    pub fn new() -> Self {
        Self
    }
}

/// Finds the chat list: `chats.list` first, then a top-level `list`.
fn chat_list(root: &Value) -> Option<&Vec<Value>> {
    root.get("chats")
        .and_then(|chats| chats.get("list"))
        .and_then(Value::as_array)
        .or_else(|| root.get("list").and_then(Value::as_array))
}

fn parse_chat(ordinal: usize, entry: &Value) -> Option<Conversation> {
    let Some(messages) = entry.get("messages").and_then(Value::as_array) else {
        warn!(ordinal, "chat entry has no messages list, skipping");
        return None;
    };

    let display_name = entry
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("chat_{ordinal}"), ToString::to_string);

    let id = entry
        .get("id")
        .and_then(id_to_string)
        .unwrap_or_else(|| ordinal.to_string());

    let texts = messages
        .iter()
        .filter(|msg| is_chat_message(msg))
        .filter_map(message_text)
        .collect();

    Some(Conversation::new(id, display_name, texts))
}

impl ArchiveParser for MultiChatParser {
    fn name(&self) -> &'static str {
        "multi-chat archive"
    }

    fn parse_value(&self, root: &Value) -> ParseOutcome {
        let Some(list) = chat_list(root) else {
            return ParseOutcome::NotMatched;
        };

        let conversations = list
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| parse_chat(idx + 1, entry))
            .collect();

        ParseOutcome::Matched(conversations)
    }
}
