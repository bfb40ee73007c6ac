//! Typed failures that are reported through a `Reporter` rather than propagated.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Failure contained at a single tree entry. Reported, never propagated.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid entry `{name}` under {parent}: {reason}")]
    Malformed {
        parent: Utf8PathBuf,
        name: String,
        reason: String,
    },
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create file {path}: {source}")]
    FileCreate {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Input problems that stop a schema from loading.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unsupported schema extension for {path} (expected `.json`)")]
    UnsupportedExtension { path: Utf8PathBuf },
    #[error("schema not found at {path}")]
    SourceNotFound { path: Utf8PathBuf },
    #[error("failed to parse schema {origin}: {reason}")]
    ParseFailure { origin: String, reason: String },
    #[error("schema has {count} top-level entries; expected a single root")]
    AmbiguousRoot { count: usize },
    #[error("schema root `{name}` is not a directory")]
    RootNotDirectory { name: String },
}

/// Problems running the external `git` tool.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("`{program}` is not installed or not on PATH")]
    ToolUnavailable { program: String },
    #[error("`{command}` could not be run: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed with exit code {code:?}")]
    Failed { command: String, code: Option<i32> },
}
