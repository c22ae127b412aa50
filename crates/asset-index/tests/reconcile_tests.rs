use std::fs::{self, File};
use std::path::Path;

use asset_index::{
    reconcile, reconcile_all, Baseline, Collection, IndexError, ReconcileOutcome, ReconcileReport,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

fn written(outcome: ReconcileOutcome) -> ReconcileReport {
    match outcome {
        ReconcileOutcome::Written(report) => report,
        other => panic!("expected a written index, got {other:?}"),
    }
}

#[test]
fn document_index_is_sorted_and_skips_itself() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("monsters");
    touch(&root, "b.json");
    touch(&root, "a.json");
    touch(&root, "readme.txt");

    let collection = Collection::documents("monsters", &root);
    written(reconcile(&collection).unwrap());
    // The generated index.json must not list itself on the next run.
    let report = written(reconcile(&collection).unwrap());

    assert_eq!(
        read_json(&root.join("index.json")),
        json!({ "files": ["a.json", "b.json"] })
    );
    assert_eq!(report.retained, 2);
    assert!(report.added.is_empty());
}

#[test]
fn reconciling_twice_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("maps");
    touch(&root, "feywild/yggdrasil.webp");
    touch(&root, "city.png");
    let collection = Collection::maps(&root);

    written(reconcile(&collection).unwrap());
    let first = fs::read(root.join("index.json")).unwrap();
    let report = written(reconcile(&collection).unwrap());
    let second = fs::read(root.join("index.json")).unwrap();

    assert_eq!(first, second);
    assert_eq!(report.baseline, Baseline::Prior);
    assert_eq!(report.retained, 2);
}

#[test]
fn fresh_map_entries_get_derived_defaults() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("maps");
    touch(&root, "upper-canopy.webp");
    touch(&root, "feywild/yggdrasil.webp");

    let report = written(reconcile(&Collection::maps(&root)).unwrap());
    assert_eq!(report.baseline, Baseline::Fresh);
    assert_eq!(report.added.len(), 2);

    let document = read_json(&root.join("index.json"));
    let maps = document["maps"].as_array().unwrap();
    assert_eq!(maps[0]["file"], "feywild/yggdrasil.webp");
    assert_eq!(maps[0]["folder"], "feywild");
    assert_eq!(maps[0]["folder_title"], "Feywild");
    assert_eq!(maps[1]["title"], "Upper Canopy");
    assert_eq!(maps[1]["folder"], "");
    assert_eq!(maps[1]["folder_title"], "Unsorted");
    assert_eq!(maps[1]["tags"], json!([]));
}

#[test]
fn curated_fields_survive_reconciliation() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("maps");
    touch(&root, "feywild/yggdrasil.webp");
    fs::write(
        root.join("index.json"),
        serde_json::to_vec(&json!({
            "maps": [{
                "file": "feywild/yggdrasil.webp",
                "title": "The World Tree",
                "tags": ["feywild", "tree"],
                "size": { "w": 40, "h": 60 },
                "blurb": "Roots to the underworld.",
                "notes": "DM only: hidden door at 12,7"
            }]
        }))
        .unwrap(),
    )
    .unwrap();

    written(reconcile(&Collection::maps(&root)).unwrap());

    let entry = &read_json(&root.join("index.json"))["maps"][0];
    assert_eq!(entry["title"], "The World Tree");
    assert_eq!(entry["tags"], json!(["feywild", "tree"]));
    assert_eq!(entry["size"], json!({ "w": 40, "h": 60 }));
    assert_eq!(entry["blurb"], "Roots to the underworld.");
    assert_eq!(entry["notes"], "DM only: hidden door at 12,7");
    assert_eq!(entry["folder"], "feywild");
}

#[test]
fn curated_folder_wins_over_derived_folder() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("maps");
    touch(&root, "feywild/yggdrasil.webp");
    touch(&root, "feywild/glade.webp");
    fs::write(
        root.join("index.json"),
        serde_json::to_vec(&json!({
            "maps": [
                { "file": "feywild/yggdrasil.webp", "folder": "planes/outer" },
                { "file": "feywild/glade.webp", "title": "Glade" }
            ]
        }))
        .unwrap(),
    )
    .unwrap();

    written(reconcile(&Collection::maps(&root)).unwrap());

    let maps = read_json(&root.join("index.json"))["maps"].clone();
    assert_eq!(maps[0]["file"], "feywild/glade.webp");
    assert_eq!(maps[0]["folder"], "feywild");
    assert_eq!(maps[1]["folder"], "planes/outer");
    assert_eq!(maps[1]["folder_title"], "Planes / Outer");
}

#[test]
fn deleted_files_are_dropped() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("icons");
    touch(&root, "pcs/aria.png");
    touch(&root, "monsters/lich.svg");
    let collection = Collection::icons(&root);
    written(reconcile(&collection).unwrap());

    fs::remove_file(root.join("monsters/lich.svg")).unwrap();
    let report = written(reconcile(&collection).unwrap());

    assert_eq!(report.removed, vec!["monsters/lich.svg"]);
    let document = read_json(&root.join("index.json"));
    let icons = document["icons"].as_array().unwrap();
    assert_eq!(icons.len(), 1);
    assert_eq!(icons[0]["file"], "pcs/aria.png");
    assert_eq!(icons[0]["kind"], "pc");
    assert_eq!(icons[0]["credit"], "");
}

#[test]
fn corrupted_index_degrades_to_defaults() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("maps");
    touch(&root, "city.webp");
    fs::write(root.join("index.json"), b"{ not json").unwrap();

    let report = written(reconcile(&Collection::maps(&root)).unwrap());
    assert!(matches!(report.baseline, Baseline::Discarded(_)));
    assert_eq!(report.added, vec!["city.webp"]);
    assert_eq!(
        read_json(&root.join("index.json"))["maps"][0]["title"],
        "City"
    );
}

#[test]
fn index_with_wrong_shape_degrades_to_defaults() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("data");
    touch(&root, "goblin.json");
    fs::write(root.join("index.json"), br#"{ "files": "goblin.json" }"#).unwrap();

    let report = written(reconcile(&Collection::documents("monsters", &root)).unwrap());
    assert!(matches!(report.baseline, Baseline::Discarded(_)));
    assert_eq!(
        read_json(&root.join("index.json")),
        json!({ "files": ["goblin.json"] })
    );
}

#[test]
fn missing_root_is_skipped_without_writing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("missing");
    let collection = Collection::maps(&root).with_index(temp.path().join("maps.json"));

    let outcome = reconcile(&collection).unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Skipped { .. }));
    assert!(!temp.path().join("maps.json").exists());
}

#[test]
fn failing_collection_does_not_stop_the_others() {
    let temp = TempDir::new().unwrap();
    let bogus_root = temp.path().join("not-a-dir.webp");
    File::create(&bogus_root).unwrap();
    let good_root = temp.path().join("spells");
    touch(&good_root, "fireball.json");

    let results = reconcile_all(&[
        Collection::maps(&bogus_root).with_index(temp.path().join("maps.json")),
        Collection::documents("spells", &good_root),
    ]);

    assert_eq!(results.len(), 2);
    assert!(results[0].1.is_err());
    assert!(!temp.path().join("maps.json").exists());
    assert!(matches!(results[1].1, Ok(ReconcileOutcome::Written(_))));
    assert_eq!(
        read_json(&good_root.join("index.json")),
        json!({ "files": ["fireball.json"] })
    );
}

#[test]
fn one_odd_entry_does_not_discard_the_others() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("icons");
    touch(&root, "a.webp");
    touch(&root, "b.webp");
    touch(&root, "c.webp");
    fs::write(
        root.join("index.json"),
        serde_json::to_vec(&json!({
            "icons": [
                { "file": "a.webp", "title": "Curated A", "notes": "keep me", "tags": ["x"] },
                { "file": "b.webp", "tags": null, "blurb": null, "title": 7 },
                { "title": "orphan without a file" },
                "c.webp"
            ]
        }))
        .unwrap(),
    )
    .unwrap();

    let report = written(reconcile(&Collection::icons(&root)).unwrap());
    assert_eq!(report.baseline, Baseline::Prior);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.added, vec!["c.webp"]);
    assert_eq!(report.retained, 2);

    let document = read_json(&root.join("index.json"));
    let icons = document["icons"].as_array().unwrap();
    assert_eq!(icons[0]["title"], "Curated A");
    assert_eq!(icons[0]["notes"], "keep me");
    assert_eq!(icons[0]["tags"], json!(["x"]));
    assert_eq!(icons[1]["title"], 7);
    assert_eq!(icons[1]["tags"], Value::Null);
    assert_eq!(icons[1]["blurb"], Value::Null);
    assert_eq!(icons[1]["credit"], "");
    assert_eq!(icons[2]["title"], "C");
}

#[cfg(unix)]
#[test]
fn failed_write_leaves_previous_index_untouched() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let root = temp.path().join("maps");
    touch(&root, "city.webp");
    touch(&root, "harbor.webp");
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();
    let index = out.join("maps.json");
    fs::write(
        &index,
        br#"{ "maps": [ { "file": "city.webp", "notes": "curated" } ] }"#,
    )
    .unwrap();
    let before = fs::read(&index).unwrap();

    fs::set_permissions(&out, fs::Permissions::from_mode(0o555)).unwrap();
    // Privileged users ignore directory permissions; nothing to check then.
    if File::create(out.join("writable")).is_ok() {
        fs::set_permissions(&out, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = reconcile(&Collection::maps(&root).with_index(&index));
    fs::set_permissions(&out, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(IndexError::Write { .. })));
    assert_eq!(fs::read(&index).unwrap(), before);
    assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
}
