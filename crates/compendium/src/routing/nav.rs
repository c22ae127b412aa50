use crate::config::PageCatalogEntry;
use crate::markdown::escape_html;

/// `#` followed by the percent-encoded content path.
pub fn fragment_for(path: &str) -> String {
    format!("#{}", urlencoding::encode(path))
}

/// Decodes a location fragment (with or without the leading `#`).
/// Returns `None` for an empty or undecodable fragment.
pub fn path_from_fragment(fragment: &str) -> Option<String> {
    let encoded = fragment.strip_prefix('#').unwrap_or(fragment);
    if encoded.is_empty() {
        return None;
    }
    urlencoding::decode(encoded)
        .ok()
        .map(|decoded| decoded.into_owned())
        .filter(|decoded| !decoded.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub title: String,
    pub path: String,
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavGroup {
    pub label: String,
    pub items: Vec<NavItem>,
}

/// Navigation panel: catalog entries grouped by label. Groups appear in the
/// order their first entry appears in the catalog; entries keep catalog
/// order within a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavPanel {
    pub groups: Vec<NavGroup>,
}

impl NavPanel {
    pub fn build(catalog: &[PageCatalogEntry], active_path: &str) -> Self {
        let mut groups: Vec<NavGroup> = Vec::new();
        for entry in catalog {
            let item = NavItem {
                title: entry.title.clone(),
                path: entry.path.clone(),
                href: fragment_for(&entry.path),
                active: entry.path == active_path,
            };
            match groups.iter_mut().find(|group| group.label == entry.group) {
                Some(group) => group.items.push(item),
                None => groups.push(NavGroup {
                    label: entry.group.clone(),
                    items: vec![item],
                }),
            }
        }
        Self { groups }
    }

    pub fn active(&self) -> Option<&NavItem> {
        self.groups
            .iter()
            .flat_map(|group| group.items.iter())
            .find(|item| item.active)
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<nav>");
        for group in &self.groups {
            html.push_str(&format!(
                "<section><h2>{}</h2><ul>",
                escape_html(&group.label)
            ));
            for item in &group.items {
                let class = if item.active { " class=\"active\"" } else { "" };
                html.push_str(&format!(
                    "<li><a href=\"{}\"{class}>{}</a></li>",
                    escape_html(&item.href),
                    escape_html(&item.title)
                ));
            }
            html.push_str("</ul></section>");
        }
        html.push_str("</nav>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<PageCatalogEntry> {
        vec![
            PageCatalogEntry::new("Core", "House Rules", "rules/house.md"),
            PageCatalogEntry::new("World", "Gazetteer", "world/gazetteer.md"),
            PageCatalogEntry::new("Core", "Combat", "rules/combat.md"),
        ]
    }

    #[test]
    fn fragments_round_trip_through_encoding() {
        let fragment = fragment_for("world/the city.md");
        assert_eq!(fragment, "#world%2Fthe%20city.md");
        assert_eq!(
            path_from_fragment(&fragment).as_deref(),
            Some("world/the city.md")
        );
        assert_eq!(path_from_fragment("#"), None);
        assert_eq!(path_from_fragment(""), None);
    }

    #[test]
    fn groups_keep_first_appearance_and_catalog_order() {
        let nav = NavPanel::build(&catalog(), "rules/combat.md");
        let labels: Vec<&str> = nav.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Core", "World"]);
        let core: Vec<&str> = nav.groups[0].items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(core, vec!["House Rules", "Combat"]);
        assert_eq!(nav.active().map(|i| i.title.as_str()), Some("Combat"));
    }

    #[test]
    fn html_marks_active_entry() {
        let nav = NavPanel::build(&catalog(), "world/gazetteer.md");
        let html = nav.to_html();
        assert!(html.contains("<a href=\"#world%2Fgazetteer.md\" class=\"active\">Gazetteer</a>"));
        assert!(html.contains("<a href=\"#rules%2Fhouse.md\">House Rules</a>"));
    }
}
