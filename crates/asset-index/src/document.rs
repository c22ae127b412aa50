//! Index document schemas.
//!
//! Image entries are described by typed records: a fixed set of known fields
//! plus an `extra` bag holding every curator field this crate does not model.
//! The records define what a *derived* entry looks like. Entries coming from
//! a previous document are merged as raw JSON objects, so a curated value of
//! an unexpected type (or an explicit `null`) is carried over verbatim.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::derive::{folder_from_path, folder_title, kind_from_path, title_from_filename};

/// An index entry as stored on disk.
pub type RawEntry = Map<String, Value>;

/// Index of a document-backed collection: the file list is the whole index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIndex {
    pub files: Vec<String>,
}

/// An entry of an image-backed index document.
pub trait AssetRecord: Serialize + DeserializeOwned {
    /// Name of the array holding the entries (`{"maps": [...]}`).
    const DOCUMENT_KEY: &'static str;

    /// Full default entry for a file with no prior record.
    fn derived(file: &str) -> Self;

    /// Values used to fill the fields a prior entry lacks. Structural
    /// defaults follow the prior entry's own values where it has them.
    fn defaults_for(_prior: &RawEntry, file: &str) -> Self {
        Self::derived(file)
    }
}

/// Accepts `null` where a list is expected.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    /// Free-form: either a label (`"large"`) or a grid description object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blurb: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssetRecord for MapEntry {
    const DOCUMENT_KEY: &'static str = "maps";

    fn derived(file: &str) -> Self {
        let folder = folder_from_path(file);
        Self {
            file: file.to_string(),
            title: Some(title_from_filename(file)),
            folder_title: Some(folder_title(&folder)),
            folder: Some(folder),
            tags: Vec::new(),
            size: Some(Value::String(String::new())),
            blurb: Some(String::new()),
            extra: Map::new(),
        }
    }

    fn defaults_for(prior: &RawEntry, file: &str) -> Self {
        let mut defaults = Self::derived(file);
        if let Some(Value::String(folder)) = prior.get("folder") {
            defaults.folder_title = Some(folder_title(folder));
            defaults.folder = Some(folder.clone());
        }
        defaults
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconEntry {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `pc`, `npc`, `monster` or `other` when derived; curators may set any value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blurb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssetRecord for IconEntry {
    const DOCUMENT_KEY: &'static str = "icons";

    fn derived(file: &str) -> Self {
        Self {
            file: file.to_string(),
            title: Some(title_from_filename(file)),
            kind: Some(kind_from_path(file).as_str().to_string()),
            tags: Vec::new(),
            blurb: Some(String::new()),
            credit: Some(String::new()),
            extra: Map::new(),
        }
    }
}

fn to_entry<R: Serialize>(record: &R) -> serde_json::Result<RawEntry> {
    match serde_json::to_value(record)? {
        Value::Object(entry) => Ok(entry),
        _ => Err(serde::ser::Error::custom("record is not a JSON object")),
    }
}

/// Default entry for a file with no prior record.
pub fn derived_entry<R: AssetRecord>(file: &str) -> serde_json::Result<RawEntry> {
    to_entry(&R::derived(file))
}

/// Carries a prior entry forward. Every key it already has is kept as it is,
/// whatever its type; only absent keys are filled with defaults.
pub fn merge_entry<R: AssetRecord>(
    mut prior: RawEntry,
    file: &str,
) -> serde_json::Result<RawEntry> {
    let defaults = to_entry(&R::defaults_for(&prior, file))?;
    for (key, value) in defaults {
        prior.entry(key).or_insert(value);
    }
    prior.insert("file".to_string(), Value::String(file.to_string()));
    Ok(prior)
}

/// The `file` name of an entry, if it has a usable one.
pub fn entry_file(entry: &RawEntry) -> Option<&str> {
    entry
        .get("file")
        .and_then(Value::as_str)
        .filter(|file| !file.is_empty())
}

/// Builds `{ "<key>": [entries...] }` for an image-backed collection.
pub fn asset_document<R: AssetRecord>(entries: Vec<RawEntry>) -> Value {
    let entries = entries.into_iter().map(Value::Object).collect();
    let mut document = Map::new();
    document.insert(R::DOCUMENT_KEY.to_string(), Value::Array(entries));
    Value::Object(document)
}

/// Entries read from a previous image-backed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorEntries {
    pub entries: Vec<RawEntry>,
    /// One message per entry that was dropped for having no usable `file`.
    pub skipped: Vec<String>,
}

/// Extracts the entries of an image-backed document.
///
/// Anything other than an object carrying an array under the expected key is
/// a schema mismatch. Within the array each entry stands on its own: one
/// that is not an object with a string `file` is skipped, the rest are kept.
pub fn parse_asset_document<R: AssetRecord>(document: Value) -> Result<PriorEntries, String> {
    let Value::Object(mut object) = document else {
        return Err("index document is not a JSON object".to_string());
    };
    let Some(Value::Array(items)) = object.remove(R::DOCUMENT_KEY) else {
        return Err(format!("index document has no \"{}\" array", R::DOCUMENT_KEY));
    };

    let mut parsed = PriorEntries::default();
    for (position, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(entry) if entry_file(&entry).is_some() => parsed.entries.push(entry),
            Value::Object(_) => parsed
                .skipped
                .push(format!("entry {position} has no \"file\" name")),
            _ => parsed
                .skipped
                .push(format!("entry {position} is not an object")),
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawEntry {
        match value {
            Value::Object(entry) => entry,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn derived_map_entry_has_every_field() {
        let entry = derived_entry::<MapEntry>("feywild/yggdrasil.webp").unwrap();
        assert_eq!(
            Value::Object(entry),
            json!({
                "file": "feywild/yggdrasil.webp",
                "title": "Yggdrasil",
                "folder": "feywild",
                "folder_title": "Feywild",
                "tags": [],
                "size": "",
                "blurb": ""
            })
        );
    }

    #[test]
    fn unknown_fields_land_in_extra() {
        let entry: MapEntry = serde_json::from_value(json!({
            "file": "a.webp",
            "notes": "secret door behind the altar",
            "grid": { "w": 20, "h": 30 }
        }))
        .unwrap();
        assert_eq!(entry.extra.len(), 2);
        assert!(entry.tags.is_empty());
        assert!(entry.folder.is_none());
    }

    #[test]
    fn typed_entries_accept_null_tags() {
        let entry: IconEntry =
            serde_json::from_value(json!({ "file": "pcs/aria.png", "tags": null })).unwrap();
        assert!(entry.tags.is_empty());
    }

    #[test]
    fn merged_map_prefers_curated_folder() {
        let prior = raw(json!({
            "file": "feywild/yggdrasil.webp",
            "title": "World Tree",
            "folder": "planes",
            "notes": "keep me"
        }));
        let merged = merge_entry::<MapEntry>(prior, "feywild/yggdrasil.webp").unwrap();
        assert_eq!(merged["folder"], "planes");
        assert_eq!(merged["folder_title"], "Planes");
        assert_eq!(merged["title"], "World Tree");
        assert_eq!(merged["notes"], "keep me");
        assert_eq!(merged["size"], "");
    }

    #[test]
    fn merged_icon_keeps_curated_kind() {
        let prior = raw(json!({
            "file": "monsters/lich.svg",
            "kind": "npc",
            "credit": "game-icons.net"
        }));
        let merged = merge_entry::<IconEntry>(prior, "monsters/lich.svg").unwrap();
        assert_eq!(merged["kind"], "npc");
        assert_eq!(merged["credit"], "game-icons.net");
        assert_eq!(merged["title"], "Lich");
        assert_eq!(merged["blurb"], "");
    }

    #[test]
    fn merge_keeps_values_of_unexpected_type_verbatim() {
        let prior = raw(json!({
            "file": "b.webp",
            "title": 42,
            "tags": null,
            "blurb": null,
            "folder": ["odd"]
        }));
        let merged = merge_entry::<MapEntry>(prior, "b.webp").unwrap();
        assert_eq!(merged["title"], 42);
        assert_eq!(merged["tags"], Value::Null);
        assert_eq!(merged["blurb"], Value::Null);
        assert_eq!(merged["folder"], json!(["odd"]));
        assert_eq!(merged["folder_title"], "Unsorted");
    }

    #[test]
    fn parse_skips_only_unusable_entries() {
        let parsed = parse_asset_document::<MapEntry>(json!({
            "maps": [
                { "file": "a.webp", "notes": "keep me" },
                { "title": "No File" },
                "b.webp",
                { "file": "c.webp", "tags": "not-a-list" }
            ]
        }))
        .unwrap();
        let files: Vec<&str> = parsed.entries.iter().filter_map(entry_file).collect();
        assert_eq!(files, vec!["a.webp", "c.webp"]);
        assert_eq!(parsed.skipped.len(), 2);
        assert!(parsed.skipped[0].contains("entry 1"));
    }

    #[test]
    fn parse_rejects_wrong_document_key() {
        let err = parse_asset_document::<MapEntry>(json!({ "icons": [] })).unwrap_err();
        assert!(err.contains("maps"));
        assert!(parse_asset_document::<MapEntry>(json!({ "maps": {} })).is_err());
        assert!(parse_asset_document::<MapEntry>(json!([1, 2])).is_err());
    }
}
