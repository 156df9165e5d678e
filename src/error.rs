//! Typed errors for the fatal failure paths of the library.
//!
//! Per-table and per-row parse failures are never errors; they are recorded in
//! [`crate::diagnostics`]. Only whole-file and output failures surface here.

use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dump file is missing, unreadable, or fails to decompress.
    #[error("cannot read dump file {}: {source}", path.display())]
    DumpUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the persisted identifier map failed.
    #[error("identifier map I/O failed for {}: {source}", path.display())]
    IdMapIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted identifier map is not valid JSON of the expected shape.
    #[error("identifier map {} is malformed: {source}", path.display())]
    IdMapFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A persisted mapping holds a value that is not a UUID.
    #[error("identifier map {} holds an invalid id {value:?} for {entity_type}/{source_id}", path.display())]
    IdMapValue {
        path: PathBuf,
        entity_type: String,
        source_id: String,
        value: String,
    },

    /// The YAML configuration could not be loaded.
    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Writing a batch of documents to the output sink failed.
    #[error("failed to write collection '{collection}': {source}")]
    Sink {
        collection: String,
        #[source]
        source: std::io::Error,
    },
}
