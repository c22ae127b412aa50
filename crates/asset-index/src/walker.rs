//! Asset directory walking.
//!
//! Both listings return paths relative to the walked root, joined with `/`
//! regardless of host conventions, because the paths end up inside URLs.
//! Results are always sorted with [`locale_cmp`] so two runs over the same
//! tree produce the same sequence.

use std::cmp::Ordering;
use std::fs::{self, DirEntry};
use std::io::ErrorKind;
use std::path::Path;

use rayon::prelude::*;

use crate::error::{IndexError, Result};

/// Name of the generated index document inside a collection directory.
pub const INDEX_FILENAME: &str = "index.json";

/// Set of recognized file extensions, stored lower-cased without the dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: Vec<String>,
}

impl ExtensionSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        extensions.sort();
        extensions.dedup();
        Self { extensions }
    }

    /// Returns true if the path's lower-cased extension is in the set.
    pub fn matches(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .map(|ext| self.extensions.iter().any(|known| *known == ext))
            .unwrap_or(false)
    }
}

/// Locale-style ordering: case-insensitive first, byte order as tie-break.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| a.cmp(b))
}

/// Recursively lists every file under `root` whose extension is recognized.
///
/// A missing root is a normal condition and yields an empty list. Failing to
/// read a directory that does exist is an error, since a partial listing
/// would silently drop entries from the index.
pub fn walk(root: &Path, extensions: &ExtensionSet) -> Result<Vec<String>> {
    if !root_exists(root)? {
        log::info!("asset root {} does not exist; nothing to walk", root.display());
        return Ok(Vec::new());
    }

    let mut files = walk_dir(root, "", extensions)?;
    files.sort_unstable_by(|a, b| locale_cmp(a, b));
    log::debug!("walked {} ({} files)", root.display(), files.len());
    Ok(files)
}

/// Lists the files directly inside `root` (no recursion), skipping the
/// collection's own index document.
pub fn list_flat(root: &Path, extensions: &ExtensionSet) -> Result<Vec<String>> {
    if !root_exists(root)? {
        log::info!("asset root {} does not exist; nothing to list", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in read_entries(root)? {
        let file_type = entry
            .file_type()
            .map_err(|error| IndexError::read_dir(entry.path(), error))?;
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == INDEX_FILENAME || !extensions.matches(&name) {
            continue;
        }
        files.push(name);
    }
    files.sort_unstable_by(|a, b| locale_cmp(a, b));
    Ok(files)
}

fn root_exists(root: &Path) -> Result<bool> {
    match fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => Ok(true),
        Ok(_) => Err(IndexError::InvalidInput(format!(
            "asset root {} is not a directory",
            root.display()
        ))),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
        Err(error) => Err(IndexError::read_dir(root, error)),
    }
}

fn read_entries(dir: &Path) -> Result<Vec<DirEntry>> {
    fs::read_dir(dir)
        .and_then(|iter| iter.collect::<std::io::Result<Vec<_>>>())
        .map_err(|error| IndexError::read_dir(dir, error))
}

/// Walks one directory level, recursing into subdirectories in parallel.
/// Symlinks are neither followed nor emitted.
fn walk_dir(dir: &Path, prefix: &str, extensions: &ExtensionSet) -> Result<Vec<String>> {
    let nested = read_entries(dir)?
        .into_par_iter()
        .map(|entry| {
            let file_type = entry
                .file_type()
                .map_err(|error| IndexError::read_dir(entry.path(), error))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };

            if file_type.is_dir() {
                walk_dir(&entry.path(), &relative, extensions)
            } else if file_type.is_file() && extensions.matches(&relative) {
                Ok(vec![relative])
            } else {
                Ok(Vec::new())
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(nested.into_iter().flatten().collect())
}
