//! Turns JSON layout descriptions into [`RepoSpec`]s.
//!
//! A layout is a nested object: keys are entry names, values are either a
//! nested object (a directory) or the string `"file"`. Nothing here touches
//! the filesystem beyond reading the schema file.

use std::fs;
use std::io;

use camino::Utf8Path;
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::report::{Event, Reporter};
use crate::tree::{RepoSpec, TreeNode};

/// Value that marks an entry as a file.
pub const FILE_MARKER: &str = "file";
pub const SCHEMA_EXTENSION: &str = "json";

/// Convert an in-memory layout with exactly one top-level entry.
///
/// An empty object yields `Ok(None)`.
pub fn from_value(value: &Value) -> Result<Option<RepoSpec>, SchemaError> {
    let Value::Object(map) = value else {
        return Err(SchemaError::ParseFailure {
            origin: "literal".to_owned(),
            reason: format!("expected an object at the top level, found {}", describe(value)),
        });
    };
    match single_root(map) {
        Some(spec) => spec.map(Some),
        None if map.is_empty() => Ok(None),
        None => Err(SchemaError::AmbiguousRoot { count: map.len() }),
    }
}

/// Load a `.json` layout from disk.
///
/// A document with one top-level directory uses it as the root. Anything
/// else is placed under a root named after the file stem.
pub fn load_path(path: &Utf8Path) -> Result<Option<RepoSpec>, SchemaError> {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SCHEMA_EXTENSION));
    if !has_extension {
        return Err(SchemaError::UnsupportedExtension {
            path: path.to_owned(),
        });
    }

    let raw = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => SchemaError::SourceNotFound {
            path: path.to_owned(),
        },
        _ => SchemaError::ParseFailure {
            origin: path.to_string(),
            reason: err.to_string(),
        },
    })?;

    let stem = path.file_stem().unwrap_or_default();
    load_str(&raw, path.as_str(), stem)
}

/// Parse layout JSON; `stem` names the root when the document has no single
/// top-level directory.
pub fn load_str(raw: &str, origin: &str, stem: &str) -> Result<Option<RepoSpec>, SchemaError> {
    let value: Value = serde_json::from_str(raw).map_err(|err| SchemaError::ParseFailure {
        origin: origin.to_owned(),
        reason: err.to_string(),
    })?;
    let Value::Object(map) = &value else {
        return Err(SchemaError::ParseFailure {
            origin: origin.to_owned(),
            reason: format!("expected an object at the top level, found {}", describe(&value)),
        });
    };
    if map.is_empty() {
        return Ok(None);
    }
    if let Some(Ok(spec)) = single_root(map) {
        return Ok(Some(spec));
    }
    Ok(Some(RepoSpec {
        name: stem.to_owned(),
        root: classify(&value),
    }))
}

/// Like [`load_path`], but reports the error and yields nothing.
pub fn load_or_report(path: &Utf8Path, reporter: &mut dyn Reporter) -> Option<RepoSpec> {
    match load_path(path) {
        Ok(Some(spec)) => Some(spec),
        Ok(None) => {
            reporter.notice(&format!("{} describes no entries; nothing to create", path));
            None
        }
        Err(err) => {
            reporter.record(Event::SchemaRejected(err));
            None
        }
    }
}

fn single_root(map: &Map<String, Value>) -> Option<Result<RepoSpec, SchemaError>> {
    if map.len() != 1 {
        return None;
    }
    let (name, value) = map.iter().next()?;
    Some(match value {
        Value::Object(_) => Ok(RepoSpec {
            name: name.clone(),
            root: classify(value),
        }),
        _ => Err(SchemaError::RootNotDirectory { name: name.clone() }),
    })
}

fn classify(value: &Value) -> TreeNode {
    match value {
        Value::Object(map) => TreeNode::Directory(
            map.iter()
                .map(|(name, child)| (name.clone(), classify(child)))
                .collect(),
        ),
        Value::String(marker) if marker == FILE_MARKER => TreeNode::File,
        other => TreeNode::Malformed(describe(other)),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "an array".to_owned(),
        Value::Object(_) => "an object".to_owned(),
    }
}
