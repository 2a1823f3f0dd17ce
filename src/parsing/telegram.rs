//! Shared Telegram message helpers.
//!
//! Both archive shapes store messages the way Telegram Desktop exports them,
//! so the single-chat and multi-chat parsers share the text handling here.

use serde_json::Value;

/// Telegram's marker for a regular chat message. Everything else
/// (`"service"`, pinned messages, joins) is an event.
pub const MESSAGE_TYPE: &str = "message";

/// Extracts text content from Telegram's complex `text` field.
///
/// The `text` field in Telegram exports can be:
/// - A simple string: `"Hello"`
/// - An array with strings and objects: `["Text", {"type": "link", "text": "url"}]`
///
/// Fragments are concatenated in order. Anything else yields an empty string.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use chatdigest::parsing::telegram::extract_telegram_text;
///
/// let simple = json!("Hello world");
/// assert_eq!(extract_telegram_text(&simple), "Hello world");
///
/// let complex = json!([
///     "Check this: ",
///     {"type": "link", "text": "https://example.com"}
/// ]);
/// assert_eq!(extract_telegram_text(&complex), "Check this: https://example.com");
/// ```
pub fn extract_telegram_text(text_value: &Value) -> String {
    match text_value {
        Value::String(s) => s.clone(),
        Value::Array(arr) => arr
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.as_str()),
                Value::Object(obj) => obj.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect::<String>(),
        _ => String::new(),
    }
}

/// Returns the trimmed text of a message object.
///
/// Returns `None` if the entry is not an object, has no `text` field, or the
/// text is blank.
pub fn message_text(msg: &Value) -> Option<String> {
    let text_value = msg.as_object()?.get("text")?;
    let content = extract_telegram_text(text_value);
    let trimmed = content.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Returns `true` if the entry's `type` marks it as a chat message.
pub fn is_chat_message(msg: &Value) -> bool {
    msg.get("type").and_then(Value::as_str) == Some(MESSAGE_TYPE)
}

/// Renders a Telegram `id` (number or string) as a string.
pub fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}
