//! Append-only history ledger.
//!
//! The ledger is a JSON Lines file (`history.jsonl`). Every processing attempt
//! appends one [`LedgerEntry`]; nothing is ever rewritten. At startup the
//! successful fingerprints are read back and form the set of conversations a
//! run must skip.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use super::fingerprint::Fingerprint;
use super::models::LedgerEntry;
use crate::error::{ChatdigestError, Result};

/// The subset of a ledger line needed to rebuild the dedup set.
///
/// Older lines written without `chat_hash` still parse and are ignored.
#[derive(Deserialize)]
struct LedgerLine {
    success: bool,
    #[serde(default)]
    chat_hash: Option<Fingerprint>,
}

/// Handle to the ledger file. Assumes a single writer process.
#[derive(Debug, Clone)]
pub struct DedupLedger {
    path: PathBuf,
}

impl DedupLedger {
    /// Creates a handle; the file is not touched until [`load`](Self::load)
    /// or [`append`](Self::append).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the ledger path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every successful fingerprint.
    ///
    /// A missing file is an empty ledger. Lines that are not valid entries
    /// are skipped.
    pub fn load(&self) -> Result<HashSet<Fingerprint>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no ledger yet, starting fresh");
                return Ok(HashSet::new());
            }
            Err(e) => return Err(ChatdigestError::ledger_io(&self.path, e)),
        };

        let mut done = HashSet::new();
        let mut skipped = 0usize;

        // Raw byte lines: a line torn mid-character by an interrupted append
        // is malformed, not an I/O failure.
        for (idx, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line.map_err(|e| ChatdigestError::ledger_io(&self.path, e))?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match serde_json::from_slice::<LedgerLine>(&line) {
                Ok(LedgerLine {
                    success: true,
                    chat_hash: Some(hash),
                }) => {
                    done.insert(hash);
                }
                Ok(_) => {}
                Err(e) => {
                    skipped += 1;
                    debug!(line = idx + 1, error = %e, "skipping malformed ledger line");
                }
            }
        }

        info!(
            path = %self.path.display(),
            processed = done.len(),
            skipped,
            "ledger loaded"
        );
        Ok(done)
    }

    /// Appends one entry as a single JSON line.
    pub fn append(&self, entry: &LedgerEntry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ChatdigestError::ledger_io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ChatdigestError::ledger_io(&self.path, e))?;

        // Start on a fresh line if the previous append was cut short.
        let mut line = String::new();
        let clean_end =
            ends_with_newline(&mut file).map_err(|e| ChatdigestError::ledger_io(&self.path, e))?;
        if !clean_end {
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(entry)?);
        line.push('\n');

        file.write_all(line.as_bytes())
            .map_err(|e| ChatdigestError::ledger_io(&self.path, e))?;

        Ok(())
    }
}

/// `true` for an empty file or one whose last byte is `\n`.
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn success(text: &str) -> LedgerEntry {
        LedgerEntry::succeeded(
            "chat.json",
            "Alice",
            "out.json",
            "gemma3n",
            "http://localhost:11434",
            Fingerprint::of_text(text),
        )
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let ledger = DedupLedger::open(dir.path().join("history.jsonl"));
        assert!(ledger.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_parent_and_roundtrips() {
        let dir = tempdir().unwrap();
        let ledger = DedupLedger::open(dir.path().join("nested/out/history.jsonl"));

        ledger.append(&success("a")).unwrap();
        ledger.append(&success("b")).unwrap();

        let done = ledger.load().unwrap();
        assert_eq!(done.len(), 2);
        assert!(done.contains(&Fingerprint::of_text("a")));

        let content = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_failures_do_not_count() {
        let dir = tempdir().unwrap();
        let ledger = DedupLedger::open(dir.path().join("history.jsonl"));
        ledger
            .append(&LedgerEntry::failed(
                "chat.json",
                "Bob",
                "gemma3n",
                "host",
                Fingerprint::of_text("b"),
                "boom",
            ))
            .unwrap();
        assert!(ledger.load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_and_legacy_lines_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let good = serde_json::to_string(&success("kept")).unwrap();
        let content = format!(
            "not json at all\n\n{{\"timestamp\":\"2024-01-01T00:00:00Z\",\"chat_file\":\"x\",\"model\":\"m\",\"host\":\"h\",\"success\":true}}\n{good}\n{{\"success\": \"maybe\"}}\n"
        );
        fs::write(&path, content).unwrap();

        let done = DedupLedger::open(&path).load().unwrap();
        assert_eq!(done.len(), 1);
        assert!(done.contains(&Fingerprint::of_text("kept")));
    }

    #[test]
    fn test_torn_multibyte_line_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let good = serde_json::to_string(&success("kept")).unwrap();

        let mut bytes = format!("{good}\n").into_bytes();
        let torn = "{\"chat_name\":\"И".as_bytes();
        bytes.extend_from_slice(&torn[..torn.len() - 1]);
        fs::write(&path, &bytes).unwrap();

        let done = DedupLedger::open(&path).load().unwrap();
        assert_eq!(done.len(), 1);
        assert!(done.contains(&Fingerprint::of_text("kept")));
    }

    #[test]
    fn test_append_after_torn_line_starts_new_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        fs::write(&path, b"{\"success\":true,\"chat_name\":\"\xd0").unwrap();

        let ledger = DedupLedger::open(&path);
        ledger.append(&success("after")).unwrap();

        let done = ledger.load().unwrap();
        assert_eq!(done.len(), 1);
        assert!(done.contains(&Fingerprint::of_text("after")));
        assert_eq!(fs::read(&path).unwrap().split(|&b| b == b'\n').count(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_uncreatable_directory_is_ledger_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let ledger = DedupLedger::open(blocker.join("history.jsonl"));
        let err = ledger.append(&success("a")).unwrap_err();
        assert!(err.is_ledger_io());
    }
}
