//! Runtime side of the compendium: loads indexed records, renders pages and
//! serves navigation and search over the page catalog.

pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod markdown;
pub mod routing;

pub use crate::config::{CacheMode, PageCatalogEntry, SiteConfig};
pub use crate::error::{CompendiumError, CompendiumResult};
pub use crate::fetch::{DirFetcher, Fetcher, HttpFetcher, SharedFetcher};
pub use crate::loader::ContentLoader;
pub use crate::routing::{NavPanel, Router, SearchIndex, View};
