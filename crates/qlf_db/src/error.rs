//! Error types for feature database loading.

use std::path::PathBuf;

/// Errors that can occur while loading feature tables.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A table or the database directory could not be read.
    #[error("failed to read database '{path}': {source}")]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A table line is malformed.
    #[error("{file}:{line}: {message}")]
    Parse {
        /// Name of the table file.
        file: String,
        /// 1-based line number.
        line: usize,
        /// What is wrong with the line.
        message: String,
    },

    /// The same feature name is defined twice.
    #[error("duplicate feature '{feature}' in {file}:{line}")]
    DuplicateFeature {
        /// The repeated feature name.
        feature: String,
        /// Name of the table file holding the second definition.
        file: String,
        /// 1-based line number of the second definition.
        line: usize,
    },

    /// The database path is not a directory.
    #[error("database path '{0}' is not a directory")]
    NotADirectory(PathBuf),

    /// The directory holds no `*.db` tables.
    #[error("no feature tables (*.db) found in '{0}'")]
    Empty(PathBuf),
}
