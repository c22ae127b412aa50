use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};
use crate::walker::{ExtensionSet, INDEX_FILENAME};

pub const REINDEX_CONFIG_FILENAME: &str = "reindex.json";

pub const DOCUMENT_EXTENSIONS: &[&str] = &["json"];
pub const MAP_EXTENSIONS: &[&str] = &["webp", "png", "jpg", "jpeg"];
pub const ICON_EXTENSIONS: &[&str] = &["webp", "png", "jpg", "jpeg", "svg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// One JSON record per file; the index is the file list.
    Documents,
    /// Map images described by `{"maps": [...]}`.
    Maps,
    /// Token/portrait images described by `{"icons": [...]}`.
    Icons,
}

impl CollectionKind {
    pub fn default_extensions(self) -> &'static [&'static str] {
        match self {
            CollectionKind::Documents => DOCUMENT_EXTENSIONS,
            CollectionKind::Maps => MAP_EXTENSIONS,
            CollectionKind::Icons => ICON_EXTENSIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub kind: CollectionKind,
    pub root: PathBuf,
    /// Index document location; defaults to `<root>/index.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<PathBuf>,
    /// Overrides the kind's recognized extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
}

impl Collection {
    pub fn new(name: impl Into<String>, kind: CollectionKind, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            root: root.into(),
            index: None,
            extensions: None,
        }
    }

    pub fn documents(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self::new(name, CollectionKind::Documents, root)
    }

    pub fn maps(root: impl Into<PathBuf>) -> Self {
        Self::new("maps", CollectionKind::Maps, root)
    }

    pub fn icons(root: impl Into<PathBuf>) -> Self {
        Self::new("icons", CollectionKind::Icons, root)
    }

    pub fn with_index(mut self, index: impl Into<PathBuf>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn index_path(&self) -> PathBuf {
        self.index
            .clone()
            .unwrap_or_else(|| self.root.join(INDEX_FILENAME))
    }

    pub fn extension_set(&self) -> ExtensionSet {
        match &self.extensions {
            Some(extensions) => ExtensionSet::new(extensions),
            None => ExtensionSet::new(self.kind.default_extensions()),
        }
    }

    fn resolve_against(&mut self, base: &Path) {
        if self.root.is_relative() {
            self.root = base.join(&self.root);
        }
        if let Some(index) = self.index.as_mut() {
            if index.is_relative() {
                *index = base.join(&*index);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReindexConfig {
    pub collections: Vec<Collection>,
}

impl ReindexConfig {
    /// Stock site layout: JSON records under `data/`, images under `assets/`.
    pub fn default_for(site_root: &Path) -> Self {
        Self {
            collections: vec![
                Collection::documents("monsters", site_root.join("data/monsters")),
                Collection::documents("spells", site_root.join("data/spells")),
                Collection::maps(site_root.join("assets/maps")),
                Collection::icons(site_root.join("assets/icons")),
            ],
        }
    }

    /// Loads a config file; relative collection paths resolve against the
    /// directory containing the file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|error| {
            IndexError::Config(format!("failed to read {}: {error}", path.display()))
        })?;
        let mut config: ReindexConfig = serde_json::from_slice(&bytes).map_err(|error| {
            IndexError::Config(format!("failed to parse {}: {error}", path.display()))
        })?;
        config.validate()?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for collection in &mut config.collections {
            collection.resolve_against(base);
        }
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut names: Vec<&str> = self.collections.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(IndexError::Config(format!(
                "duplicate collection name {}",
                pair[0]
            )));
        }
        if let Some(empty) = self.collections.iter().find(|c| c.name.trim().is_empty()) {
            return Err(IndexError::Config(format!(
                "collection rooted at {} has an empty name",
                empty.root.display()
            )));
        }
        Ok(())
    }
}
