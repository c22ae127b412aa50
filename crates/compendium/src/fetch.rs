//! Content transport.
//!
//! Everything the loader and router read goes through [`Fetcher`], so the
//! same pipeline runs against an HTTP origin or a local directory.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Url;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::config::{CacheMode, SiteConfig};
use crate::error::{CompendiumError, CompendiumResult};

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the raw body stored at `path` (relative, `/`-separated).
    async fn fetch(&self, path: &str) -> CompendiumResult<Vec<u8>>;

    async fn fetch_text(&self, path: &str) -> CompendiumResult<String> {
        let bytes = self.fetch(path).await?;
        String::from_utf8(bytes)
            .map_err(|error| CompendiumError::Parse(format!("{path} is not UTF-8: {error}")))
    }
}

pub type SharedFetcher = Arc<dyn Fetcher>;

/// `join_path("content/", "/a.md")` -> `"content/a.md"`.
pub fn join_path(base: &str, file: &str) -> String {
    let base = base.trim_end_matches('/');
    let file = file.trim_start_matches('/');
    if base.is_empty() {
        file.to_string()
    } else {
        format!("{base}/{file}")
    }
}

/// Fetches over HTTP relative to a fixed origin.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: Url,
    cache_mode: CacheMode,
}

impl HttpFetcher {
    pub fn new(origin: &str, cache_mode: CacheMode) -> CompendiumResult<Self> {
        let mut origin = Url::parse(origin).map_err(|error| {
            CompendiumError::InvalidInput(format!("invalid origin {origin}: {error}"))
        })?;
        // Url::join replaces the last segment unless the base ends with '/'.
        if !origin.path().ends_with('/') {
            let path = format!("{}/", origin.path());
            origin.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|error| CompendiumError::Internal(format!("failed to build http client: {error}")))?;
        Ok(Self {
            client,
            origin,
            cache_mode,
        })
    }

    pub fn from_config(config: &SiteConfig) -> CompendiumResult<Self> {
        Self::new(&config.origin, config.cache_mode())
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }

    pub fn url_for(&self, path: &str) -> CompendiumResult<Url> {
        self.origin
            .join(path.trim_start_matches('/'))
            .map_err(|error| CompendiumError::InvalidInput(format!("invalid path {path}: {error}")))
    }

    /// GET request for `path`, carrying the cache headers of the configured mode.
    pub fn request(&self, path: &str) -> CompendiumResult<reqwest::Request> {
        let url = self.url_for(path)?;
        let mut request = self
            .client
            .get(url)
            .header(CACHE_CONTROL, self.cache_mode.cache_control());
        if self.cache_mode == CacheMode::Bypass {
            request = request.header(PRAGMA, "no-cache");
        }
        request
            .build()
            .map_err(|error| CompendiumError::InvalidInput(format!("{path}: {error}")))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> CompendiumResult<Vec<u8>> {
        let request = self.request(path)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|error| CompendiumError::Fetch(format!("{path}: {error}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CompendiumError::Http {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| CompendiumError::Fetch(format!("failed to read body of {path}: {error}")))?;
        Ok(bytes.to_vec())
    }
}

/// Reads content from a local directory, for offline builds and previews.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> CompendiumResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(CompendiumError::InvalidInput(format!(
                "path escapes content root: {path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, path: &str) -> CompendiumResult<Vec<u8>> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Err(CompendiumError::NotFound(path.to_string()))
            }
            Err(error) => Err(CompendiumError::Fetch(format!(
                "failed to read {}: {error}",
                full.display()
            ))),
        }
    }
}
