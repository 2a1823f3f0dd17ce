//! CSV export of analysis artifacts.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::json_writer::{ARTIFACT_SUFFIX, read_artifact};
use crate::core::models::AnalysisArtifact;
use crate::error::Result;

/// Column order of the export.
pub const EXPORT_COLUMNS: [&str; 8] = [
    "chat_name",
    "created_at",
    "has_order",
    "total_sum",
    "complaint",
    "summary",
    "model",
    "chat_hash",
];

/// One exported row: the flat projection of an artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub chat_name: String,
    pub created_at: String,
    pub has_order: bool,
    pub total_sum: Option<f64>,
    pub complaint: Option<String>,
    pub summary: String,
    pub model: String,
    pub chat_hash: String,
}

impl From<&AnalysisArtifact> for ExportRow {
    fn from(artifact: &AnalysisArtifact) -> Self {
        Self {
            chat_name: artifact.chat_name.clone(),
            created_at: artifact.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            has_order: artifact.result.has_order,
            total_sum: artifact.result.total_sum,
            complaint: artifact.result.complaint.clone(),
            summary: artifact.result.summary.clone(),
            model: artifact.model.clone(),
            chat_hash: artifact.chat_hash.to_string(),
        }
    }
}

impl ExportRow {
    fn record(&self) -> [String; 8] {
        [
            self.chat_name.clone(),
            self.created_at.clone(),
            self.has_order.to_string(),
            self.total_sum.map(|t| t.to_string()).unwrap_or_default(),
            self.complaint.clone().unwrap_or_default(),
            self.summary.clone(),
            self.model.clone(),
            self.chat_hash.clone(),
        ]
    }
}

/// Artifact files in `dir`, sorted by name.
pub fn artifact_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(ARTIFACT_SUFFIX))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Reads every artifact in `dir` and projects it to a row.
///
/// Files that cannot be read or parsed are skipped with a warning.
pub fn collect_rows(dir: &Path) -> Result<Vec<ExportRow>> {
    let mut rows = Vec::new();
    for path in artifact_paths(dir)? {
        match read_artifact(&path) {
            Ok(artifact) => rows.push(ExportRow::from(&artifact)),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable artifact"),
        }
    }
    Ok(rows)
}

/// Writes the export of `dir` to `writer` and returns the number of rows.
///
/// # Format
/// - Delimiter: `;`
/// - Columns: see [`EXPORT_COLUMNS`]
/// - Encoding: UTF-8
pub fn export_csv<W: Write>(dir: &Path, writer: W) -> Result<usize> {
    let rows = collect_rows(dir)?;
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);

    csv_writer.write_record(EXPORT_COLUMNS)?;
    for row in &rows {
        csv_writer.write_record(row.record())?;
    }
    csv_writer.flush()?;

    info!(dir = %dir.display(), rows = rows.len(), "export written");
    Ok(rows.len())
}

/// Writes the export of `dir` to a file.
pub fn write_csv(dir: &Path, output_path: &Path) -> Result<usize> {
    let file = File::create(output_path)?;
    export_csv(dir, file)
}

/// Returns the export of `dir` as a string.
pub fn to_csv(dir: &Path) -> Result<String> {
    let mut buffer = Vec::new();
    export_csv(dir, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::output::write_artifact;
    use crate::core::{AnalysisRecord, Fingerprint};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;
    use uuid::Uuid;

    fn artifact(name: &str, total: Option<f64>) -> AnalysisArtifact {
        AnalysisArtifact {
            id: Uuid::now_v7(),
            source_file: "chat.json".into(),
            chat_id: "1".into(),
            chat_name: name.into(),
            created_at: Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap(),
            host: "h".into(),
            model: "gemma3n".into(),
            chat_hash: Fingerprint::of_text(name),
            result: AnalysisRecord {
                has_order: total.is_some(),
                total_sum: total,
                complaint: None,
                summary: format!("{name} summary"),
                ..AnalysisRecord::default()
            },
        }
    }

    #[test]
    fn test_export_rows_in_file_order() {
        let dir = tempdir().unwrap();
        write_artifact(dir.path(), 2, &artifact("Bob", None)).unwrap();
        write_artifact(dir.path(), 1, &artifact("Alice", Some(1500.0))).unwrap();
        fs::write(dir.path().join("history.jsonl"), "{}\n").unwrap();

        let csv = to_csv(dir.path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "chat_name;created_at;has_order;total_sum;complaint;summary;model;chat_hash"
        );
        assert!(
            lines[1].starts_with("Alice;2024-06-15 12:30:00;true;1500;;Alice summary;gemma3n;")
        );
        assert!(lines[2].starts_with("Bob;2024-06-15 12:30:00;false;;;Bob summary;"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_broken_artifact_is_skipped() {
        let dir = tempdir().unwrap();
        write_artifact(dir.path(), 1, &artifact("Alice", None)).unwrap();
        fs::write(dir.path().join("0002_bad_analysis.json"), "not json").unwrap();

        let mut out = Vec::new();
        assert_eq!(export_csv(dir.path(), &mut out).unwrap(), 1);
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let dir = tempdir().unwrap();
        let err = to_csv(&dir.path().join("nope")).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempdir().unwrap();
        write_artifact(dir.path(), 1, &artifact("Alice", Some(10.5))).unwrap();
        let out = dir.path().join("export.csv");

        assert_eq!(write_csv(dir.path(), &out).unwrap(), 1);
        let content = fs::read_to_string(out).unwrap();
        assert!(content.contains(";10.5;"));
    }
}
