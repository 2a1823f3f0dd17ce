//! Prompt construction.

use crate::Conversation;

/// Instruction block sent ahead of every conversation.
pub const INSTRUCTION_HEADER: &str = "\
You are an analyst of client correspondence.
The input is a dialogue exported from a messenger (Telegram format).
Extract structured information from it:

- whether an order was placed (`has_order`)
- item parameters: material, color, size, price, quantity (`order_details`)
- complaints or claims, if any (`complaint`)
- the order total (`total_sum`)
- a short summary of the chat (`summary`)

If some information is missing, say so explicitly (for example `has_order: false`).
Reply strictly with a single JSON object.

The dialogue is enclosed between the <chat> ... </chat> tags.";

/// Default character budget for the conversation text.
pub const DEFAULT_MAX_CHARS: usize = 15_000;

/// Builds prompts from a fixed header and a character budget.
///
/// # Example
///
/// ```
/// use chatdigest::Conversation;
/// use chatdigest::core::PromptBuilder;
///
/// let conv = Conversation::new("1", "Alice", vec!["Hello".into()]);
/// let prompt = PromptBuilder::default().build(&conv);
/// assert!(prompt.starts_with("<system>"));
/// assert!(prompt.ends_with("<chat>\nHello\n</chat>"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    header: &'static str,
    max_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(INSTRUCTION_HEADER, DEFAULT_MAX_CHARS)
    }
}

impl PromptBuilder {
    pub fn new(header: &'static str, max_chars: usize) -> Self {
        Self { header, max_chars }
    }

    /// Sets the character budget for the conversation text.
    #[must_use]
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Renders the prompt for one conversation.
    ///
    /// Only the conversation text is cut to the budget (counted in
    /// characters, not bytes); the header and both tags are always intact.
    pub fn build(&self, conversation: &Conversation) -> String {
        let text = conversation.joined_text();
        let chat = truncate_chars(&text, self.max_chars);
        format!(
            "<system>\n{}\n</system>\n<chat>\n{}\n</chat>",
            self.header, chat
        )
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_layout() {
        let conv = Conversation::new("1", "x", vec!["a".into(), "b".into()]);
        let prompt = PromptBuilder::default().build(&conv);
        assert!(prompt.contains(INSTRUCTION_HEADER));
        assert!(prompt.ends_with("<chat>\na\nb\n</chat>"));
    }

    #[test]
    fn test_truncation_keeps_closing_tag() {
        let conv = Conversation::new("1", "x", vec!["abcdefghij".into()]);
        let prompt = PromptBuilder::default().with_max_chars(4).build(&conv);
        assert!(prompt.ends_with("<chat>\nabcd\n</chat>"));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("Привет", 3), "При");
        assert_eq!(truncate_chars("ab", 10), "ab");
        assert_eq!(truncate_chars("ab", 0), "");
    }
}
