use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by project lifecycle operations.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// An operation needed an active project but none is set.
    #[error("no active project")]
    NoActiveProject,

    /// The target name already has a registry entry or a directory on disk.
    #[error("project `{0}` already exists")]
    DuplicateName(String),

    /// The named project is not registered.
    #[error("`{0}` is not a project")]
    NotFound(String),

    /// A path expected to be a directory is something else. Signals external
    /// corruption and is never silently recovered.
    #[error("`{}` exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// An optional directory could not be provided. Only surfaced from
    /// `output_dir`; `request_directory` reports the same condition as
    /// `Ok(None)` so callers can skip the path instead of failing.
    #[error("could not create directory `{}`", .0.display())]
    DirectoryCreationFailed(PathBuf),

    /// The per-user data directory could not be resolved from the platform.
    #[error("could not resolve a base data directory")]
    NoBaseDirectory,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry error: {0}")]
    Registry(#[from] redb::Error),

    #[error("attributes serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// redb reports each transaction phase with its own error type; fold them all
// into the wrapped `redb::Error` so `?` works throughout the registry.
macro_rules! from_redb {
    ($($err:ty),+) => {
        $(impl From<$err> for ProjectError {
            fn from(err: $err) -> Self {
                ProjectError::Registry(err.into())
            }
        })+
    };
}

from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError
);
