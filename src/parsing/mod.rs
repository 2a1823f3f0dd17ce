//! Shared parsing utilities.
//!
//! This module contains the message-level helpers used by every archive
//! parser in [`crate::parsers`].

pub mod telegram;

pub use telegram::{extract_telegram_text, is_chat_message, message_text};
