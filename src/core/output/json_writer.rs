//! Per-conversation analysis artifacts.
//!
//! One pretty-printed JSON file per processed conversation, named
//! `<ordinal:04>_<slug>_analysis.json` so a directory listing keeps archive
//! order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::models::AnalysisArtifact;
use crate::error::Result;

/// Suffix shared by every artifact file name.
pub const ARTIFACT_SUFFIX: &str = "_analysis.json";

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").unwrap());

/// Turns a chat name into a file-name-safe slug.
///
/// Runs of non-word characters collapse to one `_`, the result is lowercased
/// and stripped of leading and trailing `_`. An empty result becomes `chat`.
///
/// # Example
///
/// ```
/// use chatdigest::core::output::slugify;
///
/// assert_eq!(slugify("Alice & Bob!"), "alice_bob");
/// assert_eq!(slugify("Заказ №5"), "заказ_5");
/// assert_eq!(slugify("!!!"), "chat");
/// ```
pub fn slugify(name: &str) -> String {
    let replaced = NON_WORD.replace_all(name, "_").to_lowercase();
    let slug = replaced.trim_matches('_');
    if slug.is_empty() {
        "chat".to_string()
    } else {
        slug.to_string()
    }
}

/// File name for the `ordinal`-th conversation (1-based).
pub fn artifact_file_name(ordinal: usize, chat_name: &str) -> String {
    format!("{ordinal:04}_{}{ARTIFACT_SUFFIX}", slugify(chat_name))
}

/// Serializes an artifact as pretty JSON.
pub fn to_json(artifact: &AnalysisArtifact) -> Result<String> {
    Ok(serde_json::to_string_pretty(artifact)?)
}

/// Writes an artifact into `dir`, creating it if needed, and returns the
/// path written.
pub fn write_artifact(dir: &Path, ordinal: usize, artifact: &AnalysisArtifact) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(artifact_file_name(ordinal, &artifact.chat_name));
    fs::write(&path, to_json(artifact)?)?;
    Ok(path)
}

/// Reads an artifact back.
pub fn read_artifact(path: &Path) -> Result<AnalysisArtifact> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
