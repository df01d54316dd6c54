// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Failures the merge pipeline reports by kind.
///
/// Everything that is not one of these travels as a plain `anyhow::Error`
/// with context attached at the file boundary.
#[derive(Debug, Error)]
pub enum MergeError {
    /// An interactive selection came back empty or was cancelled.
    #[error("{0}")]
    UserAbort(String),

    /// An intermediate file vanished between writing and re-reading it.
    #[error("intermediate file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("{file}: matrix #{matrix} has {count} rows keyed by '{label}'")]
    AmbiguousTargetRow {
        file: String,
        matrix: usize,
        label: String,
        count: usize,
    },

    #[error("{file}: matrix #{matrix} has no row keyed by '{label}' while other matrices do")]
    MissingTargetRow {
        file: String,
        matrix: usize,
        label: String,
    },

    #[error("{file}: {rows} rows matched '{label}' but the entity roster has {roster} names")]
    RosterMismatch {
        file: String,
        label: String,
        rows: usize,
        roster: usize,
    },

    /// The file named entities but none of its blocks were closed.
    #[error("{file}: no complete matrix block for an entity roster of {roster} names")]
    NoCompleteBlocks { file: String, roster: usize },

    #[error("entity '{entity}': cannot add a {got}-value row to a {expected}-value row")]
    LengthMismatch {
        entity: String,
        expected: usize,
        got: usize,
    },

    #[error("{file}: entity '{entity}' has non-numeric value '{value}'")]
    InvalidNumber {
        file: String,
        entity: String,
        value: String,
    },

    #[error("entity '{entity}' has no value for label '{label}' at position {index}")]
    MissingValue {
        entity: String,
        label: String,
        index: usize,
    },
}

impl MergeError {
    pub fn abort(reason: impl Into<String>) -> Self {
        MergeError::UserAbort(reason.into())
    }

    pub fn is_user_abort(&self) -> bool {
        matches!(self, MergeError::UserAbort(_))
    }
}

/// True when `err` (or anything in its chain) is a user-triggered abort.
pub fn is_user_abort(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<MergeError>())
        .any(MergeError::is_user_abort)
}
