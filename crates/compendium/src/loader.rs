//! Batch loading of collection records.
//!
//! Individual failures never fail a batch: a record that cannot be fetched
//! or parsed is logged and left out. Batch results come back in completion
//! order, not input order.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::{SiteConfig, DEFAULT_CONCURRENCY};
use crate::error::{CompendiumError, CompendiumResult};
use crate::fetch::{join_path, SharedFetcher};

/// Name of a collection's file list inside its base path.
pub const COLLECTION_INDEX: &str = "index.json";

#[derive(Debug, Deserialize)]
struct CollectionIndex {
    files: Vec<String>,
}

pub struct ContentLoader {
    fetcher: SharedFetcher,
    concurrency: usize,
}

impl ContentLoader {
    pub fn new(fetcher: SharedFetcher) -> Self {
        Self {
            fetcher,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn from_config(fetcher: SharedFetcher, config: &SiteConfig) -> Self {
        Self::new(fetcher).with_concurrency(config.concurrency)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetches and parses `{base_path}/{filename}` for every filename, with
    /// at most `concurrency` requests in flight.
    ///
    /// `min(concurrency, filenames.len())` workers share one cursor; each
    /// claims the next unclaimed filename until the list is exhausted. The
    /// workers run interleaved on the calling task.
    pub async fn load_many<T, S>(&self, base_path: &str, filenames: &[S], concurrency: usize) -> Vec<T>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        let workers = concurrency.max(1).min(filenames.len());
        let cursor = AtomicUsize::new(0);
        let cursor = &cursor;

        let batches = join_all((0..workers).map(|_| async move {
            let mut loaded = Vec::new();
            loop {
                let index = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(filename) = filenames.get(index) else {
                    break;
                };
                if let Some(record) = self.try_load(base_path, filename.as_ref()).await {
                    loaded.push(record);
                }
            }
            loaded
        }))
        .await;

        batches.into_iter().flatten().collect()
    }

    /// [`load_many`](Self::load_many) with the loader's configured concurrency.
    pub async fn load_all<T, S>(&self, base_path: &str, filenames: &[S]) -> Vec<T>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        self.load_many(base_path, filenames, self.concurrency).await
    }

    /// One request at a time, in input order. Same failure policy as
    /// [`load_many`](Self::load_many).
    pub async fn load_sequential<T, S>(&self, base_path: &str, filenames: &[S]) -> Vec<T>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        let mut loaded = Vec::with_capacity(filenames.len());
        for filename in filenames {
            if let Some(record) = self.try_load(base_path, filename.as_ref()).await {
                loaded.push(record);
            }
        }
        loaded
    }

    /// Reads `{base_path}/index.json` and loads every record it lists.
    ///
    /// Unlike single records, an unusable collection index is an error: there
    /// is nothing to load without it.
    pub async fn load_collection<T>(&self, base_path: &str) -> CompendiumResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let index: CollectionIndex = self.load(base_path, COLLECTION_INDEX).await?;
        tracing::debug!(
            base_path,
            files = index.files.len(),
            "loading collection"
        );
        Ok(self.load_all(base_path, &index.files).await)
    }

    /// Fetches and parses a single record.
    pub async fn load<T: DeserializeOwned>(&self, base_path: &str, filename: &str) -> CompendiumResult<T> {
        let path = join_path(base_path, filename);
        let bytes = self.fetcher.fetch(&path).await?;
        serde_json::from_slice(&bytes)
            .map_err(|error| CompendiumError::Parse(format!("{path}: {error}")))
    }

    async fn try_load<T: DeserializeOwned>(&self, base_path: &str, filename: &str) -> Option<T> {
        match self.load(base_path, filename).await {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(base_path, filename, %error, "skipping record");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Fetcher;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MapFetcher {
        files: HashMap<String, &'static str>,
    }

    #[async_trait]
    impl Fetcher for MapFetcher {
        async fn fetch(&self, path: &str) -> CompendiumResult<Vec<u8>> {
            self.files
                .get(path)
                .map(|body| body.as_bytes().to_vec())
                .ok_or_else(|| CompendiumError::Http {
                    status: 404,
                    path: path.to_string(),
                })
        }
    }

    fn loader(files: &[(&str, &'static str)]) -> ContentLoader {
        let files = files
            .iter()
            .map(|(path, body)| (path.to_string(), *body))
            .collect();
        ContentLoader::new(Arc::new(MapFetcher { files }))
    }

    #[tokio::test]
    async fn sequential_keeps_input_order_and_skips_failures() {
        let loader = loader(&[
            ("data/a.json", r#"{"name":"a"}"#),
            ("data/b.json", "not json"),
            ("data/c.json", r#"{"name":"c"}"#),
        ]);
        let loaded: Vec<Value> = loader
            .load_sequential("data", &["c.json", "b.json", "missing.json", "a.json"])
            .await;
        let names: Vec<&str> = loaded.iter().map(|v| v["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn empty_batch_and_zero_concurrency() {
        let loader = loader(&[("data/a.json", "{}")]);
        let none: Vec<Value> = loader.load_many("data", &[] as &[&str], 12).await;
        assert!(none.is_empty());
        let one: Vec<Value> = loader.load_many("data", &["a.json"], 0).await;
        assert_eq!(one.len(), 1);
    }

    #[tokio::test]
    async fn load_collection_reads_index_first() {
        let loader = loader(&[
            ("data/spells/index.json", r#"{"files":["fireball.json","shield.json"]}"#),
            ("data/spells/fireball.json", r#"{"name":"Fireball"}"#),
            ("data/spells/shield.json", r#"{"name":"Shield"}"#),
        ]);
        let mut names: Vec<String> = loader
            .load_collection::<Value>("data/spells")
            .await
            .unwrap()
            .into_iter()
            .map(|v| v["name"].as_str().unwrap().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Fireball", "Shield"]);
    }

    #[tokio::test]
    async fn load_collection_without_index_fails() {
        let loader = loader(&[]);
        let err = loader.load_collection::<Value>("data/spells").await.unwrap_err();
        assert_eq!(
            err,
            CompendiumError::Http {
                status: 404,
                path: "data/spells/index.json".to_string()
            }
        );
    }
}
