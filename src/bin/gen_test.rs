//! Synthetic archive generator for load-testing chatdigest.
//!
//! Writes a Telegram "export all chats" file mixing clean chats with the
//! shapes the parser has to survive: service events, fragment-list texts,
//! empty chats, repeated chats and hostile Unicode.
//!
//! Usage: cargo run --features gen-test --bin gen_test -- [chats] [messages] [output]
//! Example: cargo run --features gen-test --bin gen_test -- 500 40 data/heavy.json

use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};

const ZALGO_CHARS: &[char] = &[
    '\u{0300}', '\u{0301}', '\u{0302}', '\u{0303}', '\u{0304}', '\u{0305}', '\u{0306}', '\u{0307}',
    '\u{0308}', '\u{0309}', '\u{030A}', '\u{030B}', '\u{030C}', '\u{030D}', '\u{030E}', '\u{030F}',
];

const EMOJIS: &[&str] = &["😀", "🤔", "🔥", "👍", "❤️", "🏳️‍🌈", "🇰🇿", "👨‍👩‍👧‍👦", "🤷‍♀️"];

const CHAT_NAMES: &[&str] = &[
    "Alice",
    "Иван Петров",
    "村上",
    "محمد",
    "Client; with; semicolons",
    "Client \"quoted\"",
    "🔥 VIP 🔥",
    "   ",
    "",
];

const ORDER_LINES: &[&str] = &[
    "Hello, I'd like to order an oak table",
    "What colors do you have?",
    "Size 120x80, walnut finish please",
    "How much is delivery to Almaty?",
    "Total is 45 000, is that ok?",
    "The shelf arrived scratched, I want a refund",
    "Thanks, everything is fine!",
    "Здравствуйте, сколько стоит доставка?",
];

const SERVICE_ACTIONS: &[&str] = &[
    "pin_message",
    "phone_call",
    "join_group_by_link",
    "edit_group_title",
];

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();

    let chats: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(200);
    let per_chat: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(30);
    let output = args.get(3).map(|s| s.as_str()).unwrap_or("heavy_archive.json");

    println!("🧪 Archive Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Chats:    {}", chats);
    println!("   Messages: {} per chat", per_chat);
    println!("   Output:   {}", output);
    println!();

    let start = Instant::now();
    let mut rng = rand::thread_rng();

    let mut list: Vec<Value> = Vec::with_capacity(chats);
    for i in 0..chats {
        let chat = match i % 25 {
            // A chat with no messages at all
            7 => json!({"name": "Empty chat", "id": i, "type": "personal_chat", "messages": []}),
            // A chat without a messages array
            13 => json!({"name": "Broken chat", "id": i}),
            // An exact repeat of the previous chat: same fingerprint
            19 if !list.is_empty() => list[list.len() - 1].clone(),
            _ => generate_chat(&mut rng, i, per_chat),
        };
        list.push(chat);

        if (i + 1) % 100 == 0 {
            eprint!("\r   Generated {}/{} chats", i + 1, chats);
        }
    }

    let archive = json!({
        "about": "Synthetic export generated by gen_test",
        "chats": {"about": "", "list": list},
    });

    let file = File::create(output)?;
    let mut writer = BufWriter::with_capacity(1024 * 1024, file);
    serde_json::to_writer_pretty(&mut writer, &archive)?;
    writer.flush()?;

    let elapsed = start.elapsed();
    let mb = std::fs::metadata(output)?.len() as f64 / 1_000_000.0;

    println!("\n\n✅ Done!");
    println!("   Size: {:.2} MB", mb);
    println!("   Time: {:.2}s", elapsed.as_secs_f64());
    Ok(())
}

fn generate_chat(rng: &mut impl Rng, index: usize, per_chat: usize) -> Value {
    let mut messages = Vec::with_capacity(per_chat);
    for m in 0..per_chat {
        let id = index * 10_000 + m;
        if rng.gen_ratio(1, 8) {
            let action = SERVICE_ACTIONS.choose(rng).copied().unwrap_or("pin_message");
            messages.push(json!({"id": id, "type": "service", "action": action, "text": ""}));
            continue;
        }

        let from = if m % 2 == 0 { "Client" } else { "Manager" };
        messages.push(json!({
            "id": id,
            "type": "message",
            "date_unixtime": (1_700_000_000 + id).to_string(),
            "from": from,
            "text": generate_text(rng, m),
        }));
    }

    let name = CHAT_NAMES[index % CHAT_NAMES.len()];
    let mut chat = json!({"type": "personal_chat", "messages": messages});
    // Some chats lack a name or an id and fall back to their ordinal.
    if index % 11 != 3 {
        chat["name"] = json!(format!("{name} #{index}"));
    }
    if index % 17 != 5 {
        chat["id"] = json!(index as u64 + 4_000_000_000);
    }
    chat
}

fn generate_text(rng: &mut impl Rng, index: usize) -> Value {
    let line = ORDER_LINES[index % ORDER_LINES.len()];
    match index % 12 {
        // Fragment lists, as Telegram writes rich text
        3 => json!([
            "Check this: ",
            {"type": "link", "text": "https://shop.example.com/oak"},
            " and ",
            {"type": "bold", "text": line},
        ]),
        5 => {
            let emojis: Vec<&str> = (0..20).filter_map(|_| EMOJIS.choose(rng).copied()).collect();
            json!(format!("{line} {}", emojis.join("")))
        }
        7 => json!(zalgo(line, rng)),
        // Whitespace-only and non-string texts are dropped by the parser
        9 => json!("   "),
        10 => json!(42),
        _ => json!(line),
    }
}

fn zalgo(text: &str, rng: &mut impl Rng) -> String {
    let mut result = String::new();
    for c in text.chars() {
        result.push(c);
        for _ in 0..rng.gen_range(1..=4) {
            result.push(ZALGO_CHARS[rng.gen_range(0..ZALGO_CHARS.len())]);
        }
    }
    result
}
