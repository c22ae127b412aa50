use futures_util::future::join_all;

use crate::config::PageCatalogEntry;
use crate::fetch::{join_path, Fetcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub group: String,
    pub title: String,
    pub path: String,
    title_lower: String,
    /// Lower-cased document body; empty when the document failed to load.
    text_lower: String,
}

impl SearchEntry {
    pub fn new(entry: &PageCatalogEntry, text: &str) -> Self {
        Self {
            group: entry.group.clone(),
            title: entry.title.clone(),
            path: entry.path.clone(),
            title_lower: entry.title.to_lowercase(),
            text_lower: text.to_lowercase(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.title_lower.contains(needle) || self.text_lower.contains(needle)
    }
}

/// Full-text index over the page catalog, in catalog order. Built once and
/// read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    /// Fetches every catalog document once. A page that fails to load is
    /// still indexed, with empty text, so it can match on its title.
    pub async fn build(
        fetcher: &dyn Fetcher,
        content_base: &str,
        catalog: &[PageCatalogEntry],
    ) -> Self {
        let texts = join_all(catalog.iter().map(|entry| async move {
            let path = join_path(content_base, &entry.path);
            match fetcher.fetch_text(&path).await {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(path = %path, %error, "indexing page without text");
                    String::new()
                }
            }
        }))
        .await;

        let entries = catalog
            .iter()
            .zip(texts)
            .map(|(entry, text)| SearchEntry::new(entry, &text))
            .collect();
        Self { entries }
    }

    pub fn from_entries(entries: Vec<SearchEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring match on title or body, at most `limit`
    /// hits in catalog order. A blank query matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&SearchEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| entry.matches(&needle))
            .take(limit)
            .collect()
    }
}
