//! Asset index reconciliation.
//!
//! This crate keeps the JSON index documents of an asset tree in sync with
//! the files on disk:
//! - Recursive and flat directory listings with extension filtering
//! - Default display metadata for new assets
//! - Merge of the current file set with the previous index, preserving
//!   curator-entered fields
//! - Atomic index document writes
//! - Import of markdown stat blocks into per-record JSON files

pub mod config;
pub mod derive;
pub mod document;
pub mod error;
pub mod import;
pub mod persistence;
pub mod reconcile;
pub mod walker;

pub use config::{Collection, CollectionKind, ReindexConfig};
pub use document::{AssetRecord, DocumentIndex, IconEntry, MapEntry, RawEntry};
pub use error::{IndexError, Result};
pub use import::{import_monsters, ImportReport};
pub use reconcile::{reconcile, reconcile_all, Baseline, ReconcileOutcome, ReconcileReport};
pub use walker::{walk, ExtensionSet};
