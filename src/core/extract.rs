//! Recovery of a JSON object from free-form model output.
//!
//! Models reliably produce one JSON object per answer but wrap it
//! inconsistently: fenced code blocks, a sentence before or after, a
//! misspelled key. [`ResponseExtractor`] undoes that:
//!
//! 1. If the text has a ```` ``` ```` fence, the candidate is the block body
//!    (language tag skipped) up to the closing fence or the end of the text.
//! 2. Otherwise the candidate is the span from the first `{` to the last `}`.
//! 3. The candidate must parse as a JSON object. If the simple span does not
//!    parse (a stray `}` later in the prose), the first complete JSON value
//!    starting at the first `{` is decoded instead.
//! 4. Known misspelled keys are renamed at every depth.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ChatdigestError, Result};

const FENCE: &str = "```";

/// Misspellings models produce for the requested keys, and their fixes.
pub const KEY_REWRITES: &[(&str, &str)] = &[
    ("surnary", "summary"),
    ("sumary", "summary"),
    ("summery", "summary"),
    ("summury", "summary"),
    ("has_oder", "has_order"),
    ("has_ordr", "has_order"),
    ("hasorder", "has_order"),
    ("total_summ", "total_sum"),
    ("totalsum", "total_sum"),
    ("total_some", "total_sum"),
    ("complain", "complaint"),
    ("compliant", "complaint"),
    ("order_detail", "order_details"),
    ("orderdetails", "order_details"),
    ("order_deatils", "order_details"),
];

/// Extracts one JSON object from assembled model output.
///
/// # Example
///
/// ```
/// use chatdigest::core::ResponseExtractor;
///
/// let text = "Here is the result:\n```json\n{\"has_order\": true, \"surnary\": \"ok\"}\n```\nThanks";
/// let obj = ResponseExtractor::default().extract(text)?;
/// assert_eq!(obj["summary"], "ok");
/// assert_eq!(obj["has_order"], true);
/// # Ok::<(), chatdigest::ChatdigestError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ResponseExtractor {
    rewrites: &'static [(&'static str, &'static str)],
}

impl Default for ResponseExtractor {
    fn default() -> Self {
        Self::new(KEY_REWRITES)
    }
}

impl ResponseExtractor {
    /// Creates an extractor with the given `(misspelled, canonical)` table.
    pub fn new(rewrites: &'static [(&'static str, &'static str)]) -> Self {
        Self { rewrites }
    }

    /// Recovers the JSON object from `text`.
    pub fn extract(&self, text: &str) -> Result<Map<String, Value>> {
        let fenced = fenced_block(text);
        let source = fenced.unwrap_or(text);
        let candidate = match fenced {
            Some(block) => block,
            None => brace_span(text)
                .ok_or_else(|| ChatdigestError::extraction("no `{ ... }` span in output", text))?,
        };

        let object = match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(ChatdigestError::extraction(
                    format!("expected a JSON object, found {}", kind(&other)),
                    text,
                ));
            }
            Err(e) => {
                debug!(error = %e, "candidate span is not valid JSON, decoding first value");
                first_object(source).ok_or_else(|| {
                    ChatdigestError::extraction(format!("invalid JSON: {e}"), text)
                })?
            }
        };

        Ok(self.rewrite_keys(object))
    }

    fn canonical<'a>(&self, key: &'a str) -> &'a str {
        self.rewrites
            .iter()
            .find(|(wrong, _)| *wrong == key)
            .map_or(key, |&(_, right)| right)
    }

    fn rewrite_keys(&self, object: Map<String, Value>) -> Map<String, Value> {
        let mut fixed = Map::with_capacity(object.len());
        for (key, value) in &object {
            let target = self.canonical(key);
            // A correctly spelled duplicate wins over its misspelling.
            if target != key && object.contains_key(target) {
                continue;
            }
            fixed.insert(target.to_string(), self.rewrite_value(value.clone()));
        }
        fixed
    }

    fn rewrite_value(&self, value: Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.rewrite_keys(map)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.rewrite_value(v)).collect())
            }
            other => other,
        }
    }
}

/// Body of the first fenced block, trimmed.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let rest = &text[open + FENCE.len()..];

    // An info string such as `json` sits alone on the opening line.
    let body_start = match rest.find('\n') {
        Some(nl)
            if rest[..nl]
                .trim()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')) =>
        {
            nl + 1
        }
        _ => 0,
    };

    let body = &rest[body_start..];
    let close = body.find(FENCE).unwrap_or(body.len());
    Some(body[..close].trim())
}

/// Inclusive span from the first `{` to the last `}`.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Decodes the first complete JSON value that starts at the first `{`.
fn first_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
    match values.next() {
        Some(Ok(Value::Object(map))) => Some(map),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "an object",
        Value::Array(_) => "an array",
        Value::String(_) => "a string",
        Value::Number(_) => "a number",
        Value::Bool(_) => "a boolean",
        Value::Null => "null",
    }
}
