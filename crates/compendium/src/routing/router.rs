use crate::config::{PageCatalogEntry, SiteConfig};
use crate::error::{CompendiumError, CompendiumResult};
use crate::fetch::{join_path, SharedFetcher};
use crate::markdown::{escape_html, render};
use crate::routing::nav::{fragment_for, path_from_fragment, NavPanel};
use crate::routing::search::SearchIndex;

/// A single search result as shown in the results view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub group: String,
    pub title: String,
    pub path: String,
    pub href: String,
}

/// Content of the main view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Nothing navigated yet.
    Empty,
    Page {
        entry: PageCatalogEntry,
        html: String,
    },
    /// The active page could not be loaded.
    NotFound {
        entry: PageCatalogEntry,
    },
    SearchResults {
        query: String,
        hits: Vec<SearchHit>,
    },
}

impl View {
    pub fn to_html(&self) -> String {
        match self {
            View::Empty => String::new(),
            View::Page { html, .. } => html.clone(),
            View::NotFound { entry } => format!(
                "<div class=\"not-found\"><h1>Not found</h1><p>Could not load <code>{}</code>.</p></div>",
                escape_html(&entry.path)
            ),
            View::SearchResults { query, hits } => {
                let mut html = format!("<h1>Search: {}</h1>", escape_html(query));
                if hits.is_empty() {
                    html.push_str("<p>No results.</p>");
                    return html;
                }
                html.push_str("<ul class=\"search-results\">");
                for hit in hits {
                    html.push_str(&format!(
                        "<li><a href=\"{}\">{}</a> <span class=\"group\">{}</span></li>",
                        escape_html(&hit.href),
                        escape_html(&hit.title),
                        escape_html(&hit.group)
                    ));
                }
                html.push_str("</ul>");
                html
            }
        }
    }
}

/// Hash-addressed single-page navigation over a fixed page catalog.
///
/// The location fragment selects the active catalog entry; a missing or
/// unknown fragment selects the first entry. Each navigation rebuilds the
/// nav panel and replaces the main view with the rendered document.
pub struct Router {
    catalog: Vec<PageCatalogEntry>,
    content_base: String,
    max_results: usize,
    fetcher: SharedFetcher,
    active: usize,
    nav: NavPanel,
    view: View,
    search_index: Option<SearchIndex>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("catalog", &self.catalog.len())
            .field("active", &self.active)
            .field("view", &self.view)
            .finish()
    }
}

impl Router {
    pub fn new(config: &SiteConfig, fetcher: SharedFetcher) -> CompendiumResult<Self> {
        if config.pages.is_empty() {
            return Err(CompendiumError::InvalidInput(
                "page catalog is empty".to_string(),
            ));
        }
        let nav = NavPanel::build(&config.pages, &config.pages[0].path);
        Ok(Self {
            catalog: config.pages.clone(),
            content_base: config.content_base.clone(),
            max_results: config.max_search_results,
            fetcher,
            active: 0,
            nav,
            view: View::Empty,
            search_index: None,
        })
    }

    /// Builds the search index and shows the page addressed by `fragment`.
    pub async fn init(&mut self, fragment: Option<&str>) -> &View {
        let index = SearchIndex::build(self.fetcher.as_ref(), &self.content_base, &self.catalog).await;
        tracing::debug!(pages = index.len(), "search index ready");
        self.search_index = Some(index);
        self.navigate(fragment).await
    }

    /// Catalog position addressed by a fragment.
    pub fn resolve(&self, fragment: Option<&str>) -> usize {
        fragment
            .and_then(path_from_fragment)
            .and_then(|path| self.catalog.iter().position(|entry| entry.path == path))
            .unwrap_or(0)
    }

    /// Handles a location change.
    pub async fn navigate(&mut self, fragment: Option<&str>) -> &View {
        self.active = self.resolve(fragment);
        let entry = self.catalog[self.active].clone();
        self.nav = NavPanel::build(&self.catalog, &entry.path);

        let path = join_path(&self.content_base, &entry.path);
        self.view = match self.fetcher.fetch_text(&path).await {
            Ok(text) => View::Page {
                html: render(&text),
                entry,
            },
            Err(error) => {
                tracing::warn!(path = %path, %error, "page failed to load");
                View::NotFound { entry }
            }
        };
        &self.view
    }

    /// Runs a search and shows the results. A blank query leaves the current
    /// view as it is and returns `None`.
    pub fn search(&mut self, query: &str) -> Option<&View> {
        if query.trim().is_empty() {
            return None;
        }
        let hits = match &self.search_index {
            Some(index) => index
                .search(query, self.max_results)
                .into_iter()
                .map(|entry| SearchHit {
                    group: entry.group.clone(),
                    title: entry.title.clone(),
                    path: entry.path.clone(),
                    href: fragment_for(&entry.path),
                })
                .collect(),
            None => {
                tracing::debug!("search before the index was built");
                Vec::new()
            }
        };
        self.view = View::SearchResults {
            query: query.trim().to_string(),
            hits,
        };
        Some(&self.view)
    }

    pub fn catalog(&self) -> &[PageCatalogEntry] {
        &self.catalog
    }

    pub fn active(&self) -> &PageCatalogEntry {
        &self.catalog[self.active]
    }

    pub fn nav(&self) -> &NavPanel {
        &self.nav
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn search_index(&self) -> Option<&SearchIndex> {
        self.search_index.as_ref()
    }
}
