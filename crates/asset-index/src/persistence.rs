//! Index document read/write.
//!
//! Writes replace the whole document atomically: the JSON is written to a
//! temp file in the destination directory and renamed over the target, so a
//! failed run leaves the previous document untouched.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{IndexError, Result};

/// State of the index document found on disk before a run.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorDocument {
    Missing,
    /// Present but not valid JSON; carries the parse error.
    Malformed(String),
    Loaded(Value),
}

/// Reads the previously generated document at `path`.
///
/// Parse failures are not errors: the caller decides how to degrade. An I/O
/// failure other than "not found" is returned, because overwriting a document
/// we could not read would discard its curated metadata unseen.
pub fn read_prior(path: &Path) -> Result<PriorDocument> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(PriorDocument::Missing),
        Err(error) => return Err(IndexError::Io(error)),
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(PriorDocument::Loaded(value)),
        Err(error) => Ok(PriorDocument::Malformed(error.to_string())),
    }
}

/// Serializes `document` as pretty JSON with a trailing newline and
/// atomically replaces `path` with it.
pub fn write_document<T: Serialize + ?Sized>(path: &Path, document: &T) -> Result<()> {
    let mut serialized = serde_json::to_vec_pretty(document)
        .map_err(|error| IndexError::Serialization(error.to_string()))?;
    serialized.push(b'\n');

    replace_file(path, |file| file.write_all(&serialized))?;
    log::debug!("wrote index {} ({} bytes)", path.display(), serialized.len());
    Ok(())
}

/// Replaces `path` with whatever `fill` writes into a sibling temp file.
/// On failure the temp file is removed and `path` keeps its old contents.
pub(crate) fn replace_file(
    path: &Path,
    fill: impl FnOnce(&mut File) -> io::Result<()>,
) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|error| IndexError::write(parent, error))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|error| IndexError::write(path, error))?;
    fill(tmp.as_file_mut())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|error| IndexError::write(path, error))?;
    tmp.persist(path)
        .map_err(|error| IndexError::write(path, error.error))?;
    Ok(())
}
