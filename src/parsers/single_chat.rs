//! Single-conversation archive parser.

use serde_json::Value;

use super::{ArchiveParser, ParseOutcome};
use crate::Conversation;
use crate::parsing::telegram::{id_to_string, message_text};

/// Name given to a single conversation that carries no name of its own.
const DEFAULT_NAME: &str = "chat_1";

/// Parser for exports of one chat.
///
/// Accepts either a bare array of message objects or a Telegram single-chat
/// export:
/// ```json
/// {
///   "name": "Chat Name",
///   "id": 4242,
///   "messages": [
///     {"type": "message", "text": "Hello" | ["Hello", {"type": "link", "text": "url"}]}
///   ]
/// }
/// ```
///
/// Message types are not inspected here: service events carry empty text and
/// are dropped with every other blank message.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleChatParser;

impl SingleChatParser {
    pub fn new() -> Self {
        Self
    }
}

fn collect_texts(messages: &[Value]) -> Vec<String> {
    messages.iter().filter_map(message_text).collect()
}

impl ArchiveParser for SingleChatParser {
    fn name(&self) -> &'static str {
        "single chat"
    }

    fn parse_value(&self, root: &Value) -> ParseOutcome {
        match root {
            Value::Array(messages) => ParseOutcome::Matched(vec![Conversation::new(
                "1",
                DEFAULT_NAME,
                collect_texts(messages),
            )]),
            Value::Object(obj) => {
                let Some(messages) = obj.get("messages").and_then(Value::as_array) else {
                    return ParseOutcome::NotMatched;
                };

                let name = obj
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(DEFAULT_NAME);
                let id = obj
                    .get("id")
                    .and_then(id_to_string)
                    .unwrap_or_else(|| "1".to_string());

                ParseOutcome::Matched(vec![Conversation::new(id, name, collect_texts(messages))])
            }
            _ => ParseOutcome::NotMatched,
        }
    }
}
