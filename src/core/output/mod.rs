//! Pipeline outputs.
//!
//! - [`write_artifact`] - one pretty JSON file per analyzed conversation
//! - [`SessionStore`] / [`JsonlSessionStore`] - secondary per-conversation records
//! - [`export_csv`] / [`write_csv`] / [`to_csv`] - flat CSV projection of a
//!   directory of artifacts
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use chatdigest::core::output::write_csv;
//!
//! let rows = write_csv(Path::new("output"), Path::new("output/export.csv"))?;
//! println!("{rows} rows exported");
//! # Ok::<(), chatdigest::ChatdigestError>(())
//! ```

mod csv_writer;
mod json_writer;
mod jsonl_writer;

pub use csv_writer::{
    EXPORT_COLUMNS, ExportRow, artifact_paths, collect_rows, export_csv, to_csv, write_csv,
};
pub use json_writer::{
    ARTIFACT_SUFFIX, artifact_file_name, read_artifact, slugify, to_json, write_artifact,
};
pub use jsonl_writer::{JsonlSessionStore, NoopSessionStore, SESSIONS_FILE, SessionStore};
