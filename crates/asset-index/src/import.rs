//! Record importers.
//!
//! An importer turns authoring sources into the one-JSON-file-per-record
//! layout of a document-backed collection, then reconciles that collection
//! so its `index.json` lists exactly the records on disk.

pub mod monster;

use std::collections::{BTreeMap, HashSet};

use crate::reconcile::ReconcileOutcome;

pub use monster::{import_monsters, Monster, MonsterParser};

/// `key: value` header between two `---` lines, plus the text after it.
///
/// Only a flat subset is understood: one `key: value` per line, blank lines
/// and `#` comments ignored, anything without a colon skipped. A later
/// duplicate key replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub fields: BTreeMap<String, String>,
    pub body: String,
}

impl FrontMatter {
    /// Splits `text` into header fields and body. Text without a complete
    /// header is all body.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let opened = lines.len() >= 3 && lines[0].trim() == "---";
        let close = opened
            .then(|| lines.iter().skip(1).position(|line| line.trim() == "---"))
            .flatten()
            .map(|offset| offset + 1);
        let Some(close) = close else {
            return Self {
                fields: BTreeMap::new(),
                body: text.to_string(),
            };
        };

        let mut fields = BTreeMap::new();
        for line in &lines[1..close] {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                fields.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        Self {
            fields,
            body: lines[close + 1..].join("\n").trim_start_matches('\n').to_string(),
        }
    }

    /// Field value, empty when absent.
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or_default()
    }
}

/// Removes one pair of matching surrounding quotes.
pub fn strip_quotes(text: &str) -> &str {
    let text = text.trim();
    let quoted = text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')));
    if quoted {
        text[1..text.len() - 1].trim()
    } else {
        text
    }
}

/// `[medium, humanoid, "cr1/4"]` -> `["medium", "humanoid", "cr1/4"]`.
/// Anything not wrapped in brackets is an empty list.
pub fn parse_bracket_list(text: &str) -> Vec<String> {
    let Some(inner) = text
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return Vec::new();
    };
    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| strip_quotes(item).to_string())
        .collect()
}

/// Hands out unique record file names: `goblin.json`, `goblin-2.json`, ...
#[derive(Debug, Default)]
pub struct RecordNames {
    taken: HashSet<String>,
}

impl RecordNames {
    pub fn claim(&mut self, slug: &str) -> String {
        let mut name = format!("{slug}.json");
        let mut suffix = 2;
        while self.taken.contains(&name) {
            name = format!("{slug}-{suffix}.json");
            suffix += 1;
        }
        self.taken.insert(name.clone());
        name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// `(source file name, record file name)` in import order.
    pub written: Vec<(String, String)>,
    /// Result of reconciling the output collection afterwards.
    pub index: ReconcileOutcome,
}
