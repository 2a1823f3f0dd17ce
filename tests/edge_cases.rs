//! Edge case tests for chatdigest
//!
//! These tests cover archive shapes, model answers and names that the
//! regular unit tests only touch lightly.

use chatdigest::Conversation;
use chatdigest::core::output::{artifact_file_name, slugify};
use chatdigest::core::prompt::truncate_chars;
use chatdigest::core::{AnalysisRecord, Fingerprint, PromptBuilder, ResponseExtractor};
use chatdigest::parsers::{parse_archive_str, parse_transcript};

fn extract(text: &str) -> serde_json::Map<String, serde_json::Value> {
    ResponseExtractor::default().extract(text).unwrap()
}

// =========================================================================
// Archive shapes
// =========================================================================

#[test]
fn test_empty_array_is_one_empty_conversation() {
    let convs = parse_archive_str("[]").unwrap();
    assert_eq!(convs.len(), 1);
    assert!(convs[0].is_empty());
}

#[test]
fn test_empty_chat_list() {
    let convs = parse_archive_str(r#"{"chats": {"list": []}}"#).unwrap();
    assert!(convs.is_empty());
}

#[test]
fn test_top_level_list_without_chats_wrapper() {
    let convs = parse_archive_str(
        r#"{"list": [{"name": "A", "messages": [{"type": "message", "text": "x"}]}]}"#,
    )
    .unwrap();
    assert_eq!(convs[0].display_name, "A");
    assert_eq!(convs[0].messages, vec!["x"]);
}

#[test]
fn test_chat_entry_without_messages_keeps_ordinals() {
    let convs = parse_archive_str(
        r#"{"chats": {"list": [
            {"name": "Broken"},
            {"messages": [{"type": "message", "text": "second"}]}
        ]}}"#,
    )
    .unwrap();
    assert_eq!(convs.len(), 1);
    assert_eq!(convs[0].display_name, "chat_2");
    assert_eq!(convs[0].id, "2");
}

#[test]
fn test_multi_chat_drops_service_events() {
    let convs = parse_archive_str(
        r#"{"chats": {"list": [{"name": "A", "messages": [
            {"type": "service", "action": "phone_call", "text": "called"},
            {"type": "message", "text": "kept"},
            {"text": "no type"}
        ]}]}}"#,
    )
    .unwrap();
    assert_eq!(convs[0].messages, vec!["kept"]);
}

#[test]
fn test_fragment_lists_and_non_string_texts() {
    let convs = parse_archive_str(
        r#"[
            {"text": ["a ", {"type": "bold", "text": "b"}, 7, {"type": "link"}, " c"]},
            {"text": 42},
            {"text": null},
            {"text": "   "},
            "not an object"
        ]"#,
    )
    .unwrap();
    assert_eq!(convs[0].messages, vec!["a b c"]);
}

#[test]
fn test_string_chat_id_and_blank_name() {
    let convs =
        parse_archive_str(r#"{"name": "   ", "id": " user42 ", "messages": [{"text": "hi"}]}"#)
            .unwrap();
    assert_eq!(convs[0].id, "user42");
    assert_eq!(convs[0].display_name, "chat_1");
}

#[test]
fn test_unrecognized_shapes_are_format_errors() {
    for input in [r#"{"foo": 1}"#, "42", "\"text\"", "null", "{not json"] {
        let err = parse_archive_str(input).unwrap_err();
        assert!(err.is_format(), "{input}: {err}");
    }
}

#[test]
fn test_unicode_messages_survive() {
    let convs = parse_archive_str(
        r#"[{"text": "Привет мир!"}, {"text": "こんにちは"}, {"text": "👨‍👩‍👧 family"}]"#,
    )
    .unwrap();
    assert_eq!(convs[0].joined_text(), "Привет мир!\nこんにちは\n👨‍👩‍👧 family");
}

#[test]
fn test_transcript_blank_lines_and_crlf() {
    let conv = parse_transcript("call", "first\r\n\r\n  second \r\n\t\n");
    assert_eq!(conv.messages, vec!["first", "second"]);
}

// =========================================================================
// Fingerprints
// =========================================================================

#[test]
fn test_fingerprint_ignores_names_and_ids() {
    let a = Conversation::new("1", "Alice", vec!["hi".into()]);
    let b = Conversation::new("99", "Someone else", vec!["hi".into()]);
    assert_eq!(Fingerprint::of_conversation(&a), Fingerprint::of_conversation(&b));
}

#[test]
fn test_fingerprint_message_boundaries_matter_only_through_newlines() {
    let split = Fingerprint::of_messages(&["a".into(), "b".into()]);
    assert_eq!(split, Fingerprint::of_text("a\nb"));
    assert_ne!(split, Fingerprint::of_text("ab"));
}

// =========================================================================
// Extraction of model answers
// =========================================================================

#[test]
fn test_unterminated_fence() {
    let obj = extract("```json\n{\"summary\": \"cut off\"}\n");
    assert_eq!(obj["summary"], "cut off");
}

#[test]
fn test_fence_without_language_tag() {
    let obj = extract("```\n{\"summary\": \"bare\"}\n```");
    assert_eq!(obj["summary"], "bare");
}

#[test]
fn test_stray_brace_after_object() {
    let obj = extract("Result: {\"summary\": \"ok\"} (note: ignore the } here)");
    assert_eq!(obj["summary"], "ok");
}

#[test]
fn test_nested_misspellings_are_fixed() {
    let obj = extract(r#"{"order_detail": [{"surnary": "inner"}], "complain": null}"#);
    assert_eq!(obj["order_details"][0]["summary"], "inner");
    assert!(obj.contains_key("complaint"));
}

#[test]
fn test_correct_key_wins_over_misspelling() {
    let obj = extract(r#"{"summary": "right", "surnary": "wrong"}"#);
    assert_eq!(obj["summary"], "right");
    assert_eq!(obj.len(), 1);
}

#[test]
fn test_answers_without_an_object() {
    for text in [
        "",
        "I cannot help with that.",
        "[1, 2, 3]",
        "} backwards {",
        "```json\n[1]\n```",
    ] {
        let err = ResponseExtractor::default().extract(text).unwrap_err();
        assert!(err.is_extraction(), "{text:?}: {err}");
    }
}

#[test]
fn test_record_from_messy_answer() {
    let obj = extract(
        "Sure!\n```json\n{\"has_oder\": \"да\", \"total_summ\": \"45 000 тг\", \"surnary\": \"Oak table\", \"city\": \"Almaty\"}\n```",
    );
    let record = AnalysisRecord::from_object(obj);
    assert!(record.has_order);
    assert_eq!(record.total_sum, Some(45000.0));
    assert_eq!(record.summary, "Oak table");
    assert_eq!(record.extra["city"], "Almaty");
}

// =========================================================================
// Prompt budget
// =========================================================================

#[test]
fn test_truncation_counts_characters() {
    assert_eq!(truncate_chars("héllo", 2), "hé");
    assert_eq!(truncate_chars("🔥🔥🔥", 1), "🔥");
    assert_eq!(truncate_chars("abc", 0), "");
    assert_eq!(truncate_chars("abc", 10), "abc");
}

#[test]
fn test_prompt_keeps_closing_tag_when_truncated() {
    let long = "я".repeat(50_000);
    let conv = Conversation::new("1", "x", vec![long]);
    let prompt = PromptBuilder::default().with_max_chars(100).build(&conv);
    assert!(prompt.ends_with("\n</chat>"));
    assert_eq!(prompt.matches('я').count(), 100);
}

// =========================================================================
// Artifact names
// =========================================================================

#[test]
fn test_slug_edge_cases() {
    assert_eq!(slugify(""), "chat");
    assert_eq!(slugify("   "), "chat");
    assert_eq!(slugify("🔥 VIP 🔥"), "vip");
    assert_eq!(slugify("Client; with; semicolons"), "client_with_semicolons");
    assert_eq!(slugify("Иван Петров"), "иван_петров");
    assert_eq!(slugify("a/../b"), "a_b");
}

#[test]
fn test_artifact_names_stay_inside_output_dir() {
    let name = artifact_file_name(12, "../../etc/passwd");
    assert_eq!(name, "0012_etc_passwd_analysis.json");
    assert!(!name.contains('/'));
}

#[test]
fn test_large_ordinals_widen() {
    assert_eq!(artifact_file_name(12345, "x"), "12345_x_analysis.json");
}
