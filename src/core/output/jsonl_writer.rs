//! Session records as JSON Lines.
//!
//! Every processed conversation, successful or not, produces one
//! [`SessionRecord`]. Where those records go is the [`SessionStore`]'s
//! business; [`JsonlSessionStore`] appends them to a local `.jsonl` file,
//! one object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::models::SessionRecord;
use crate::error::Result;

/// Default file name inside the output directory.
pub const SESSIONS_FILE: &str = "sessions.jsonl";

/// Secondary sink for per-conversation outcomes.
///
/// The pipeline logs and ignores store failures, so implementations should
/// report them instead of panicking.
pub trait SessionStore {
    /// Stores one record.
    fn store(&self, record: &SessionRecord) -> Result<()>;
}

/// Appends session records to a JSON Lines file.
#[derive(Debug, Clone)]
pub struct JsonlSessionStore {
    path: PathBuf,
}

impl JsonlSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store writing `sessions.jsonl` inside `output_dir`.
    pub fn in_dir(output_dir: &Path) -> Self {
        Self::new(output_dir.join(SESSIONS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonlSessionStore {
    fn store(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        let line = serde_json::to_string(record)?;
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}

/// Store that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionStore;

impl SessionStore for NoopSessionStore {
    fn store(&self, _record: &SessionRecord) -> Result<()> {
        Ok(())
    }
}
