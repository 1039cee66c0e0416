//! Error type shared by the tab core.
//!
//! `TabStore::load` and `TabStore::save` recover from the persistence
//! variants themselves: a failed load becomes an empty result, a failed save
//! becomes a log line. Their `try_` forms hand them to the caller.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TabError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("no tab named {0:?} in this group")]
    UnknownTab(String),

    #[error("tab name must not be empty")]
    EmptyName,

    #[error("tab name {name:?} is longer than {max} characters")]
    NameTooLong { name: String, max: usize },

    #[error("pattern must not be empty")]
    EmptyPattern,

    #[error("a tab named {0:?} already exists in this group")]
    DuplicateName(String),

    #[error("{field} is longer than {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("{field} must not contain the '{delimiter}' character")]
    ReservedDelimiter {
        field: &'static str,
        delimiter: char,
    },

    #[error("{field} must fit on one line")]
    LineBreak { field: &'static str },

    #[error("failed to read tab file: {0}")]
    PersistenceRead(#[from] ReadError),

    #[error("failed to write tab file: {0}")]
    PersistenceWrite(#[source] io::Error),
}

/// Reasons a tab file could not be decoded.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("bad schema version line {0:?}")]
    BadVersion(String),

    #[error("schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("line {line}: expected {expected} fields, found {found}")]
    MalformedRecord {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {source}")]
    StoredPattern {
        line: usize,
        #[source]
        source: Box<TabError>,
    },
}

pub type Result<T, E = TabError> = std::result::Result<T, E>;
