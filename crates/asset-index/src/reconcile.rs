//! Index reconciliation.
//!
//! A run lists the collection's current files, loads the previous index
//! document as a baseline, merges the two and writes a complete replacement.
//! Only files present on disk appear in the output; curated fields of those
//! files are carried over from the baseline.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::{Collection, CollectionKind};
use crate::document::{
    asset_document, derived_entry, entry_file, merge_entry, parse_asset_document, AssetRecord,
    DocumentIndex, IconEntry, MapEntry, RawEntry,
};
use crate::error::{IndexError, Result};
use crate::persistence::{read_prior, write_document, PriorDocument};
use crate::walker::{list_flat, locale_cmp, walk};

/// Where the merge baseline came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
    /// No previous document existed.
    Fresh,
    /// The previous document was loaded and merged.
    Prior,
    /// A previous document existed but could not be used; every entry was
    /// rebuilt from defaults.
    Discarded(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub collection: String,
    pub index_path: PathBuf,
    pub baseline: Baseline,
    /// Number of entries in the written document.
    pub entries: usize,
    /// Files with no baseline entry.
    pub added: Vec<String>,
    /// Baseline entries whose file is gone.
    pub removed: Vec<String>,
    /// Files carried over from the baseline.
    pub retained: usize,
    /// Baseline entries dropped for having no usable `file` name.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Skipped { collection: String, reason: String },
    Written(ReconcileReport),
}

/// Reconciles one collection and writes its index document.
///
/// A missing collection root skips the collection without touching its
/// index. Unreadable directories and write failures are returned as errors;
/// the previous document is left as it was.
pub fn reconcile(collection: &Collection) -> Result<ReconcileOutcome> {
    match fs::metadata(&collection.root) {
        Ok(_) => {}
        Err(error) if error.kind() == ErrorKind::NotFound => {
            log::warn!(
                "collection {}: root {} does not exist, skipping",
                collection.name,
                collection.root.display()
            );
            return Ok(ReconcileOutcome::Skipped {
                collection: collection.name.clone(),
                reason: format!("root {} does not exist", collection.root.display()),
            });
        }
        Err(error) => return Err(IndexError::read_dir(&collection.root, error)),
    }

    let report = match collection.kind {
        CollectionKind::Documents => reconcile_documents(collection)?,
        CollectionKind::Maps => reconcile_assets::<MapEntry>(collection)?,
        CollectionKind::Icons => reconcile_assets::<IconEntry>(collection)?,
    };

    log::info!(
        "collection {}: {} entries (+{} -{} ={}) -> {}",
        report.collection,
        report.entries,
        report.added.len(),
        report.removed.len(),
        report.retained,
        report.index_path.display()
    );
    Ok(ReconcileOutcome::Written(report))
}

/// Reconciles collections one after another. A fatal error in one collection
/// is reported in its slot and does not stop the rest.
pub fn reconcile_all(collections: &[Collection]) -> Vec<(String, Result<ReconcileOutcome>)> {
    collections
        .iter()
        .map(|collection| {
            let result = reconcile(collection);
            if let Err(error) = &result {
                log::error!("collection {} failed: {error}", collection.name);
            }
            (collection.name.clone(), result)
        })
        .collect()
}

fn reconcile_documents(collection: &Collection) -> Result<ReconcileReport> {
    let index_path = collection.index_path();
    let files = list_flat(&collection.root, &collection.extension_set())?;

    let (prior, baseline) = load_baseline(&collection.name, &index_path, |value| {
        serde_json::from_value::<DocumentIndex>(value)
            .map(|index| index.files)
            .map_err(|error| error.to_string())
    })?;
    let prior = prior.unwrap_or_default();

    let current: HashSet<&str> = files.iter().map(String::as_str).collect();
    let previous: HashSet<&str> = prior.iter().map(String::as_str).collect();
    let added = sorted(files.iter().filter(|f| !previous.contains(f.as_str())));
    let removed = sorted(prior.iter().filter(|f| !current.contains(f.as_str())));
    let retained = files.len() - added.len();

    write_document(&index_path, &DocumentIndex { files: files.clone() })?;

    Ok(ReconcileReport {
        collection: collection.name.clone(),
        index_path,
        baseline,
        entries: files.len(),
        added,
        removed,
        retained,
        skipped: 0,
    })
}

fn reconcile_assets<R: AssetRecord>(collection: &Collection) -> Result<ReconcileReport> {
    let index_path = collection.index_path();
    let files = walk(&collection.root, &collection.extension_set())?;

    let (prior, baseline) =
        load_baseline(&collection.name, &index_path, parse_asset_document::<R>)?;
    let prior = prior.unwrap_or_default();
    for reason in &prior.skipped {
        log::warn!(
            "collection {}: dropping unusable entry of {} ({reason})",
            collection.name,
            index_path.display()
        );
    }
    let skipped = prior.skipped.len();
    let mut lookup: HashMap<String, RawEntry> = prior
        .entries
        .into_iter()
        .filter_map(|entry| Some((entry_file(&entry)?.to_string(), entry)))
        .collect();

    let (entries, added) = merge_entries::<R>(&files, &mut lookup)
        .map_err(|error| IndexError::Serialization(error.to_string()))?;
    let removed = sorted(lookup.keys());
    let retained = entries.len() - added.len();
    let entry_count = entries.len();

    write_document(&index_path, &asset_document::<R>(entries))?;

    Ok(ReconcileReport {
        collection: collection.name.clone(),
        index_path,
        baseline,
        entries: entry_count,
        added,
        removed,
        retained,
        skipped,
    })
}

/// Maps every current file to its merged or derived entry, consuming matched
/// baseline entries from `lookup`. Returns the entries in file order plus the
/// files that had no baseline entry.
fn merge_entries<R: AssetRecord>(
    files: &[String],
    lookup: &mut HashMap<String, RawEntry>,
) -> serde_json::Result<(Vec<RawEntry>, Vec<String>)> {
    let mut added = Vec::new();
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let entry = match lookup.remove(file) {
            Some(prior) => merge_entry::<R>(prior, file)?,
            None => {
                added.push(file.clone());
                derived_entry::<R>(file)?
            }
        };
        entries.push(entry);
    }
    Ok((entries, added))
}

/// Loads and parses the previous document. Anything unusable degrades to an
/// empty baseline with a warning instead of failing the run.
fn load_baseline<T>(
    collection: &str,
    index_path: &Path,
    parse: impl FnOnce(Value) -> std::result::Result<T, String>,
) -> Result<(Option<T>, Baseline)> {
    let reason = match read_prior(index_path)? {
        PriorDocument::Missing => return Ok((None, Baseline::Fresh)),
        PriorDocument::Loaded(value) => match parse(value) {
            Ok(parsed) => return Ok((Some(parsed), Baseline::Prior)),
            Err(error) => format!("unexpected shape: {error}"),
        },
        PriorDocument::Malformed(error) => format!("invalid JSON: {error}"),
    };

    log::warn!(
        "collection {collection}: ignoring previous index {} ({reason}); curated metadata in it will not be carried over",
        index_path.display()
    );
    Ok((None, Baseline::Discarded(reason)))
}

fn sorted<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut items: Vec<String> = items.cloned().collect();
    items.sort_unstable_by(|a, b| locale_cmp(a, b));
    items
}
