//! Hash-based navigation and full-text search over the page catalog.

pub mod nav;
pub mod router;
pub mod search;

pub use nav::{fragment_for, path_from_fragment, NavGroup, NavItem, NavPanel};
pub use router::{Router, SearchHit, View};
pub use search::{SearchEntry, SearchIndex};
