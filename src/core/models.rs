//! Records written by the pipeline.
//!
//! - [`AnalysisRecord`] - what the model said about one conversation
//! - [`AnalysisArtifact`] - the per-conversation output file
//! - [`LedgerEntry`] - one line of the append-only history ledger
//! - [`SessionRecord`] - the row handed to a [`SessionStore`](crate::core::output::SessionStore)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::fingerprint::Fingerprint;

/// Structured analysis of one conversation.
///
/// Built leniently from the object the model returned: missing fields take
/// their defaults, and keys the pipeline does not know are kept in `extra` so
/// nothing the model produced is lost. Field values are not checked for
/// business meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Whether the client placed an order.
    #[serde(default)]
    pub has_order: bool,

    /// Item parameters (material, color, size, price, quantity), as emitted.
    #[serde(default)]
    pub order_details: Option<Value>,

    /// Complaint or claim text, if any.
    #[serde(default)]
    pub complaint: Option<String>,

    /// Order total.
    #[serde(default)]
    pub total_sum: Option<f64>,

    /// Short summary of the conversation.
    #[serde(default)]
    pub summary: String,

    /// Any other keys the model emitted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisRecord {
    /// Builds a record from an extracted JSON object.
    ///
    /// # Example
    ///
    /// ```
    /// use chatdigest::core::AnalysisRecord;
    /// use serde_json::json;
    ///
    /// let obj = json!({"has_order": true, "total_sum": "1 500", "summary": "oak table"});
    /// let record = AnalysisRecord::from_object(obj.as_object().unwrap().clone());
    /// assert!(record.has_order);
    /// assert_eq!(record.total_sum, Some(1500.0));
    /// ```
    pub fn from_object(mut obj: Map<String, Value>) -> Self {
        let has_order = obj.remove("has_order").is_some_and(|v| truthy(&v));
        let order_details = obj.remove("order_details").filter(|v| !v.is_null());
        let complaint = obj.remove("complaint").and_then(|v| optional_text(&v));
        let summary = obj
            .remove("summary")
            .and_then(|v| optional_text(&v))
            .unwrap_or_default();

        let total_sum = match obj.remove("total_sum") {
            Some(raw) => {
                let parsed = number(&raw);
                if parsed.is_none() && !raw.is_null() {
                    obj.insert("total_sum_raw".to_string(), raw);
                }
                parsed
            }
            None => None,
        };

        Self {
            has_order,
            order_details,
            complaint,
            total_sum,
            summary,
            extra: obj,
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "да" | "1"
        ),
        _ => false,
    }
}

/// `null`, `false` and blank strings mean "nothing to report".
fn optional_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

/// Reads a number, tolerating thousands separators and currency suffixes.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Parses an amount written by a human: `"45 000"`, `"$2,500 USD"`,
/// `"12 300,50 руб"`, `"1.500,50"`.
///
/// With both `,` and `.` present the last one is the decimal mark. A lone
/// separator followed by exactly three digits is a thousands separator when
/// it is `,`, and ambiguous when it is `.`; ambiguous amounts yield `None`.
/// Grouped digits must come in threes.
fn parse_amount(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    let (negative, body) = match kept.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, kept.as_str()),
    };
    let body = body.trim_matches(|c| c == '.' || c == ',');
    if body.is_empty() || body.contains('-') {
        return None;
    }

    let decimal = match (body.rfind(','), body.rfind('.')) {
        (None, None) => None,
        (Some(comma), Some(dot)) => Some(comma.max(dot)),
        (Some(idx), None) | (None, Some(idx)) => {
            let sep = body.as_bytes()[idx];
            let repeated = body.bytes().filter(|&b| b == sep).count() > 1;
            let digits_after = body.len() - idx - 1;
            if repeated {
                None
            } else if digits_after != 3 || &body[..idx] == "0" {
                Some(idx)
            } else if sep == b',' {
                None
            } else {
                return None;
            }
        }
    };

    let (integer, fraction) = match decimal {
        Some(idx) => (&body[..idx], &body[idx + 1..]),
        None => (body, ""),
    };
    if let Some(idx) = decimal {
        if integer.contains(char::from(body.as_bytes()[idx])) {
            return None;
        }
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let groups: Vec<&str> = integer.split(['.', ',']).collect();
    if groups.len() > 1 {
        let first_ok = (1..=3).contains(&groups[0].len());
        if !first_ok || groups[1..].iter().any(|g| g.len() != 3) {
            return None;
        }
    }

    let mut normalized = String::with_capacity(body.len() + 1);
    if negative {
        normalized.push('-');
    }
    normalized.push_str(&groups.concat());
    if !fraction.is_empty() {
        normalized.push('.');
        normalized.push_str(fraction);
    }
    normalized.parse().ok()
}

/// The per-conversation output file.
///
/// Field names are what the export projection reads: `source_file`,
/// `created_at`, `model`, `chat_hash` and `result.*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisArtifact {
    pub id: Uuid,
    pub source_file: String,
    pub chat_id: String,
    pub chat_name: String,
    pub created_at: DateTime<Utc>,
    pub host: String,
    pub model: String,
    pub chat_hash: Fingerprint,
    pub result: AnalysisRecord,
}

/// One processing attempt, as stored in the history ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub timestamp: DateTime<Utc>,
    pub chat_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub model: String,
    pub host: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_hash: Option<Fingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LedgerEntry {
    /// Entry for a conversation whose artifact was written.
    pub fn succeeded(
        chat_file: impl Into<String>,
        chat_name: impl Into<String>,
        output: impl Into<String>,
        model: impl Into<String>,
        host: impl Into<String>,
        chat_hash: Fingerprint,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            chat_file: chat_file.into(),
            chat_name: Some(chat_name.into()),
            output: Some(output.into()),
            model: model.into(),
            host: host.into(),
            success: true,
            chat_hash: Some(chat_hash),
            error: None,
        }
    }

    /// Entry for a conversation that failed.
    pub fn failed(
        chat_file: impl Into<String>,
        chat_name: impl Into<String>,
        model: impl Into<String>,
        host: impl Into<String>,
        chat_hash: Fingerprint,
        error: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            chat_file: chat_file.into(),
            chat_name: Some(chat_name.into()),
            output: None,
            model: model.into(),
            host: host.into(),
            success: false,
            chat_hash: Some(chat_hash),
            error: Some(error.into()),
        }
    }
}

/// Outcome of one conversation, success or failure, for secondary storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub source_file: String,
    pub chat_name: String,
    pub created_at: DateTime<Utc>,
    pub host: String,
    pub model: String,
    pub chat_hash: Fingerprint,
    pub success: bool,
    pub result: Option<AnalysisRecord>,
    pub error: Option<String>,
}
