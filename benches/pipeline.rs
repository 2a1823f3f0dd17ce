//! Benchmarks for the CPU-bound stages of a chatdigest run.
//!
//! Run with: `cargo bench`
//! Run specific group: `cargo bench --bench pipeline -- extract`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chatdigest::Conversation;
use chatdigest::core::{Fingerprint, PromptBuilder, ResponseExtractor};
use chatdigest::parsers::parse_archive_str;

// =============================================================================
// Test Data Generators
// =============================================================================

fn generate_multi_chat_json(chats: usize, per_chat: usize) -> String {
    let mut list = Vec::with_capacity(chats);
    for c in 0..chats {
        let mut messages = Vec::with_capacity(per_chat);
        for m in 0..per_chat {
            if m % 10 == 9 {
                messages.push(format!(
                    r#"{{"id": {m}, "type": "service", "action": "pin_message", "text": ""}}"#
                ));
            } else if m % 5 == 2 {
                messages.push(format!(
                    r#"{{"id": {m}, "type": "message", "text": ["Order ", {{"type": "bold", "text": "#{m}"}}, " please"]}}"#
                ));
            } else {
                messages.push(format!(
                    r#"{{"id": {m}, "type": "message", "from": "Client", "text": "Message number {m} in chat {c}"}}"#
                ));
            }
        }
        list.push(format!(
            r#"{{"name": "Chat {c}", "id": {c}, "type": "personal_chat", "messages": [{}]}}"#,
            messages.join(",")
        ));
    }
    format!(r#"{{"chats": {{"list": [{}]}}}}"#, list.join(",\n"))
}

fn generate_conversation(messages: usize) -> Conversation {
    Conversation::new(
        "1",
        "Bench",
        (0..messages)
            .map(|i| format!("Message number {i}: walnut shelf, 120x40, qty {}", i % 5 + 1))
            .collect(),
    )
}

fn generate_model_output(extra_keys: usize) -> String {
    let mut fields = vec![
        r#""has_oder": true"#.to_string(),
        r#""order_detail": [{"material": "oak", "color": "natural", "quantity": 2}]"#.to_string(),
        r#""total_summ": "45 000""#.to_string(),
        r#""surnary": "Client ordered two oak tables""#.to_string(),
    ];
    for i in 0..extra_keys {
        fields.push(format!(r#""note_{i}": {{"complain": "late by {i} days"}}"#));
    }
    format!(
        "Sure! Here is the analysis:\n```json\n{{{}}}\n```\nLet me know if you need more.",
        fields.join(", ")
    )
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_archive_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive_parsing");

    for chats in [10_usize, 100, 1_000] {
        let json = generate_multi_chat_json(chats, 50);
        group.throughput(Throughput::Elements((chats * 50) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chats), &json, |b, json| {
            b.iter(|| {
                let conversations = parse_archive_str(black_box(json)).unwrap();
                black_box(conversations)
            });
        });
    }
    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for size in [10_usize, 100, 1_000] {
        let conv = generate_conversation(size);
        group.throughput(Throughput::Bytes(conv.joined_text().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &conv, |b, conv| {
            b.iter(|| black_box(Fingerprint::of_conversation(black_box(conv))));
        });
    }
    group.finish();
}

fn bench_prompt(c: &mut Criterion) {
    let mut group = c.benchmark_group("prompt");
    let builder = PromptBuilder::default();

    for size in [10_usize, 100, 1_000] {
        let conv = generate_conversation(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &conv, |b, conv| {
            b.iter(|| black_box(builder.build(black_box(conv))));
        });
    }
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    let extractor = ResponseExtractor::default();

    for keys in [0_usize, 50, 500] {
        let text = generate_model_output(keys);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(keys), &text, |b, text| {
            b.iter(|| black_box(extractor.extract(black_box(text)).unwrap()));
        });
    }
    group.finish();
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(
    benches,
    bench_archive_parsing,
    bench_fingerprint,
    bench_prompt,
    bench_extract,
);

criterion_main!(benches);
