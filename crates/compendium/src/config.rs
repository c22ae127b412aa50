use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CompendiumError, CompendiumResult};

pub const DEFAULT_CONCURRENCY: usize = 12;
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 30;
pub const DEFAULT_CONTENT_BASE: &str = "content";

/// One navigable document of the site. Catalog order drives both the nav
/// panel and search result order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCatalogEntry {
    pub group: String,
    pub title: String,
    /// Content path relative to the content base, e.g. `rules/house.md`.
    pub path: String,
}

impl PageCatalogEntry {
    pub fn new(
        group: impl Into<String>,
        title: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            title: title.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Accept cached responses, however stale.
    Aggressive,
    /// Always revalidate; used against a local development origin.
    Bypass,
}

impl CacheMode {
    /// Local development origins bypass caches, everything else caches.
    pub fn for_origin(origin: &str) -> Self {
        let host = Url::parse(origin)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase));
        match host.as_deref() {
            Some("localhost" | "127.0.0.1" | "0.0.0.0" | "[::1]" | "::1") => CacheMode::Bypass,
            Some(host) if host.ends_with(".localhost") => CacheMode::Bypass,
            _ => CacheMode::Aggressive,
        }
    }

    /// `Cache-Control` request directive for this mode.
    pub fn cache_control(self) -> &'static str {
        match self {
            CacheMode::Aggressive => "max-stale",
            CacheMode::Bypass => "no-cache",
        }
    }
}

fn default_content_base() -> String {
    DEFAULT_CONTENT_BASE.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_max_search_results() -> usize {
    DEFAULT_MAX_SEARCH_RESULTS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Origin the content is served from, e.g. `https://campaign.example/`.
    pub origin: String,
    #[serde(default = "default_content_base")]
    pub content_base: String,
    pub pages: Vec<PageCatalogEntry>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,
    /// Explicit cache mode; derived from `origin` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_mode: Option<CacheMode>,
}

impl SiteConfig {
    pub fn new(origin: impl Into<String>, pages: Vec<PageCatalogEntry>) -> Self {
        Self {
            origin: origin.into(),
            content_base: default_content_base(),
            pages,
            concurrency: DEFAULT_CONCURRENCY,
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
            cache_mode: None,
        }
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.cache_mode
            .unwrap_or_else(|| CacheMode::for_origin(&self.origin))
    }

    pub fn load(path: &Path) -> CompendiumResult<Self> {
        let bytes = std::fs::read(path).map_err(|error| {
            CompendiumError::InvalidInput(format!(
                "failed to read site config {}: {error}",
                path.display()
            ))
        })?;
        let config: SiteConfig = serde_json::from_slice(&bytes).map_err(|error| {
            CompendiumError::InvalidInput(format!(
                "failed to parse site config {}: {error}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CompendiumResult<()> {
        if self.pages.is_empty() {
            return Err(CompendiumError::InvalidInput(
                "page catalog is empty".to_string(),
            ));
        }
        if let Some(entry) = self.pages.iter().find(|entry| entry.path.trim().is_empty()) {
            return Err(CompendiumError::InvalidInput(format!(
                "catalog entry {} has an empty path",
                entry.title
            )));
        }
        Url::parse(&self.origin).map_err(|error| {
            CompendiumError::InvalidInput(format!("invalid origin {}: {error}", self.origin))
        })?;
        Ok(())
    }
}
