//! Creature stat blocks authored as markdown with a front-matter header.
//!
//! Header fields carry the statistics (`size`, `armor_class`, `hit_points`,
//! `speed`, ability scores, `skills`, `languages`, `challenge`, `tags`). The
//! body holds `***Name.*** text` blocks: those before the first `###`
//! heading are traits, those under `### Actions` are actions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parse_bracket_list, strip_quotes, FrontMatter, ImportReport, RecordNames};
use crate::config::Collection;
use crate::derive::slugify_or;
use crate::error::{IndexError, Result};
use crate::persistence::write_document;
use crate::reconcile::reconcile;
use crate::walker::locale_cmp;

const SIZES: &[&str] = &["Tiny", "Small", "Medium", "Large", "Huge", "Gargantuan"];
const NUMBER_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];
const MISSING: &str = "—";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub size: String,
    #[serde(rename = "type")]
    pub creature_type: CreatureType,
    pub alignment: String,
    /// Armor class, or `"—"` when the header has none.
    pub ac: Value,
    pub hp: HitPoints,
    /// Movement mode (`walk`, `fly`, ...) to feet.
    pub speed: BTreeMap<String, i64>,
    pub abilities: Abilities,
    pub skills: BTreeMap<String, i64>,
    pub languages: Vec<String>,
    pub challenge: Challenge,
    pub traits: Vec<Feature>,
    pub actions: Vec<Action>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureType {
    #[serde(rename = "type")]
    pub kind: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub average: i64,
    pub formula: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abilities {
    #[serde(rename = "str")]
    pub strength: i64,
    #[serde(rename = "dex")]
    pub dexterity: i64,
    #[serde(rename = "con")]
    pub constitution: i64,
    #[serde(rename = "int")]
    pub intelligence: i64,
    #[serde(rename = "wis")]
    pub wisdom: i64,
    #[serde(rename = "cha")]
    pub charisma: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub cr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
    pub proficiency_bonus: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRange {
    pub normal: i64,
    pub long: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Damage {
    pub avg: i64,
    pub formula: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// An action block. Recognized weapon attacks get their numbers pulled out;
/// everything else is `type: "special"` with only the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_hit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reach_ft: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_ft: Option<AttackRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub damage: Vec<Damage>,
    pub text: String,
}

/// Compiled patterns for stat-block parsing. Build once per import.
#[derive(Debug, Clone)]
pub struct MonsterParser {
    integer: Regex,
    hit_points: Regex,
    speed: Regex,
    skill: Regex,
    challenge: Regex,
    parenthesized: Regex,
    block_start: Regex,
    blank_runs: Regex,
    melee_or_ranged: Regex,
    melee: Regex,
    ranged: Regex,
    to_hit: Regex,
    reach: Regex,
    range: Regex,
    targets: Regex,
    hit_damage: Regex,
}

impl MonsterParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            integer: Regex::new(r"-?\d+")?,
            hit_points: Regex::new(r"^\s*(\d+)\s*\(([^)]+)\)")?,
            speed: Regex::new(r"(?i)^(?:(walk|fly|swim|climb|burrow)\s+)?(\d+)\s*ft")?,
            skill: Regex::new(r"^(.+?)\s*([+-]\d+)\s*$")?,
            challenge: Regex::new(r"(?i)^\s*([0-9]+(?:/[0-9]+)?)\s*(?:\((\d+)\s*XP\))?")?,
            parenthesized: Regex::new(r"^([^()]+)\(([^)]+)\)\s*$")?,
            block_start: Regex::new(r"^\*\*\*(.+?)\.\*\*\*\s*(.*)$")?,
            blank_runs: Regex::new(r"\n{3,}")?,
            melee_or_ranged: Regex::new(r"(?i)\bMelee or Ranged Weapon Attack:")?,
            melee: Regex::new(r"(?i)\bMelee Weapon Attack:")?,
            ranged: Regex::new(r"(?i)\bRanged Weapon Attack:")?,
            to_hit: Regex::new(r"(?i)\+(\d+)\s+to hit")?,
            reach: Regex::new(r"(?i)reach\s+(\d+)\s*ft")?,
            range: Regex::new(r"(?i)range\s+(\d+)\s*/\s*(\d+)\s*ft")?,
            targets: Regex::new(
                r"(?i)\b(one|two|three|four|five|six|seven|eight|nine|ten)\s+target",
            )?,
            hit_damage: Regex::new(r"(?i)Hit:\s*(\d+)\s*\(([^)]+)\)\s*([a-z]+)\s+damage")?,
        })
    }

    /// Parses one markdown stat block. `fallback_name` is used when the
    /// header has no `name` field.
    pub fn parse(&self, fallback_name: &str, text: &str) -> Monster {
        let header = FrontMatter::parse(text);
        let header_tags = parse_bracket_list(header.get("tags"));
        let name = header
            .fields
            .get("name")
            .map(String::as_str)
            .unwrap_or(fallback_name);
        let (size, creature_type) = self.size_and_type(header.get("size"), header_tags);
        let (average, formula) = self.hit_points(header.get("hit_points"));
        let (cr, xp) = self.challenge(strip_quotes(header.get("challenge")));
        let ability = |key: &str| self.first_integer(header.get(key)).unwrap_or(10);

        let sections = split_sections(&header.body);
        let preamble = sections.get("_preamble").map(String::as_str);
        let action_section = sections.get("actions").map(String::as_str);
        let traits = self
            .collect_blocks(preamble.unwrap_or_default())
            .into_iter()
            .filter(|(name, text)| !name.is_empty() && !text.is_empty())
            .map(|(name, text)| Feature { name, text })
            .collect();
        let actions = self
            .collect_blocks(action_section.unwrap_or_default())
            .into_iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, text)| self.action(name, &text))
            .collect();

        let alignment = header.get("alignment").trim();
        Monster {
            name: strip_quotes(name).to_string(),
            size: size.unwrap_or_else(|| "Medium".to_string()),
            creature_type,
            alignment: if alignment.is_empty() {
                "unaligned".to_string()
            } else {
                alignment.to_string()
            },
            ac: self
                .first_integer(header.get("armor_class"))
                .map(Value::from)
                .unwrap_or_else(|| Value::from(MISSING)),
            hp: HitPoints {
                average: average.unwrap_or(0),
                formula: formula.unwrap_or_default(),
            },
            speed: self.speed(header.get("speed")),
            abilities: Abilities {
                strength: ability("str"),
                dexterity: ability("dex"),
                constitution: ability("con"),
                intelligence: ability("int"),
                wisdom: ability("wis"),
                charisma: ability("cha"),
            },
            skills: self.skills(strip_quotes(header.get("skills"))),
            languages: split_list(strip_quotes(header.get("languages"))),
            challenge: Challenge {
                cr: cr.unwrap_or_else(|| MISSING.to_string()),
                xp,
                proficiency_bonus: 2,
            },
            traits,
            actions,
            source: header.get("layout").to_string(),
        }
    }

    fn first_integer(&self, text: &str) -> Option<i64> {
        self.integer
            .find(text)
            .and_then(|found| found.as_str().parse().ok())
    }

    /// `"13 (3d8)"` -> `(13, "3d8")`; a bare number has no formula.
    fn hit_points(&self, text: &str) -> (Option<i64>, Option<String>) {
        if text.is_empty() {
            return (None, None);
        }
        match self.hit_points.captures(text) {
            Some(caps) => (caps[1].parse().ok(), Some(caps[2].trim().to_string())),
            None => (self.first_integer(text), None),
        }
    }

    /// `"20 ft., fly 50 ft."` -> `{walk: 20, fly: 50}`.
    fn speed(&self, text: &str) -> BTreeMap<String, i64> {
        let mut speed = BTreeMap::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some(caps) = self.speed.captures(part) else {
                continue;
            };
            let mode = caps
                .get(1)
                .map(|mode| mode.as_str().to_lowercase())
                .unwrap_or_else(|| "walk".to_string());
            if let Ok(feet) = caps[2].parse() {
                speed.insert(mode, feet);
            }
        }
        speed
    }

    /// `"Perception +5, Stealth +4"` -> `{Perception: 5, Stealth: 4}`.
    fn skills(&self, text: &str) -> BTreeMap<String, i64> {
        text.split(',')
            .map(str::trim)
            .filter_map(|part| self.skill.captures(part))
            .filter_map(|caps| {
                let bonus = caps[2].trim_start_matches('+').parse().ok()?;
                Some((caps[1].trim().to_string(), bonus))
            })
            .collect()
    }

    /// `"1/4 (50 XP)"` -> `("1/4", 50)`. Unrecognized text is kept as the
    /// rating.
    fn challenge(&self, text: &str) -> (Option<String>, Option<i64>) {
        if text.is_empty() {
            return (None, None);
        }
        match self.challenge.captures(text) {
            Some(caps) => (
                Some(caps[1].to_string()),
                caps.get(2).and_then(|xp| xp.as_str().parse().ok()),
            ),
            None => (Some(text.trim().to_string()), None),
        }
    }

    /// `"Medium humanoid (aarakocra)"` -> size `Medium`, type `humanoid`,
    /// tags: header tags plus `aarakocra`, deduplicated case-insensitively.
    fn size_and_type(
        &self,
        text: &str,
        header_tags: Vec<String>,
    ) -> (Option<String>, CreatureType) {
        if text.is_empty() {
            return (
                None,
                CreatureType {
                    kind: "unknown".to_string(),
                    tags: header_tags,
                },
            );
        }

        let mut rest = text.trim();
        let mut size = None;
        for candidate in SIZES {
            let lowered = rest.to_lowercase();
            if lowered.starts_with(&format!("{} ", candidate.to_lowercase())) {
                size = Some(candidate.to_string());
                rest = rest[candidate.len()..].trim();
                break;
            }
        }

        let (base, extra_tag) = match self.parenthesized.captures(rest) {
            Some(caps) => (
                caps.get(1).map_or("", |m| m.as_str()).trim(),
                caps.get(2).map(|m| m.as_str().trim().to_string()),
            ),
            None => (rest, None),
        };
        let kind = base
            .split_whitespace()
            .next()
            .map(str::to_lowercase)
            .unwrap_or_else(|| "unknown".to_string());

        let mut tags: Vec<String> = Vec::new();
        let candidates = header_tags
            .iter()
            .map(|tag| tag.trim().to_string())
            .chain(extra_tag);
        for tag in candidates {
            if tag.is_empty() {
                continue;
            }
            let lowered = tag.to_lowercase();
            if !tags.iter().any(|seen| seen.to_lowercase() == lowered) {
                tags.push(tag);
            }
        }

        (size, CreatureType { kind, tags })
    }

    fn starts_block(&self, line: &str) -> bool {
        let line = line.trim();
        line.starts_with("### ") || self.block_start.is_match(line)
    }

    /// Collects `***Name.*** text` blocks. A block runs until the next block,
    /// a `###` heading or the end; blank lines inside it become paragraph
    /// breaks.
    fn collect_blocks(&self, section: &str) -> Vec<(String, String)> {
        let lines: Vec<&str> = section.lines().collect();
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let Some(caps) = self.block_start.captures(lines[i].trim()) else {
                i += 1;
                continue;
            };
            let name = caps[1].trim().to_string();
            let first = caps.get(2).map_or("", |m| m.as_str()).trim();
            let mut buffer: Vec<&str> = Vec::new();
            if !first.is_empty() {
                buffer.push(first);
            }

            i += 1;
            while i < lines.len() {
                let line = lines[i].trim();
                if line.is_empty() {
                    let mut next = i;
                    while next < lines.len() && lines[next].trim().is_empty() {
                        next += 1;
                    }
                    i = next;
                    if next < lines.len() && self.starts_block(lines[next]) {
                        break;
                    }
                    buffer.push("");
                    continue;
                }
                if self.starts_block(line) {
                    break;
                }
                buffer.push(line);
                i += 1;
            }

            let text = buffer.join("\n");
            let text = self.blank_runs.replace_all(text.trim(), "\n\n").into_owned();
            blocks.push((name, text));
        }
        blocks
    }

    /// Reads a weapon attack line such as
    /// `Melee Weapon Attack: +4 to hit, reach 5 ft., one target. Hit: 5 (1d6 + 2) slashing damage.`
    fn action(&self, name: String, text: &str) -> Action {
        let raw = text.trim().to_string();
        let kind = if self.melee_or_ranged.is_match(&raw) {
            "melee_or_ranged_weapon_attack"
        } else if self.melee.is_match(&raw) {
            "melee_weapon_attack"
        } else if self.ranged.is_match(&raw) {
            "ranged_weapon_attack"
        } else {
            return Action {
                name,
                kind: "special".to_string(),
                to_hit: None,
                reach_ft: None,
                range_ft: None,
                targets: None,
                damage: Vec::new(),
                text: raw,
            };
        };

        let number = |pattern: &Regex| {
            pattern
                .captures(&raw)
                .and_then(|caps| caps[1].parse::<i64>().ok())
        };
        let to_hit = number(&self.to_hit);
        let reach_ft = number(&self.reach);
        let range_ft = self.range.captures(&raw).and_then(|caps| {
            Some(AttackRange {
                normal: caps[1].parse().ok()?,
                long: caps[2].parse().ok()?,
            })
        });
        let targets = self.targets.captures(&raw).and_then(|caps| {
            let word = caps[1].to_lowercase();
            NUMBER_WORDS
                .iter()
                .position(|known| *known == word)
                .map(|index| index as i64 + 1)
        });
        let damage = self
            .hit_damage
            .captures(&raw)
            .and_then(|caps| {
                Some(Damage {
                    avg: caps[1].parse().ok()?,
                    formula: caps[2].trim().to_string(),
                    kind: caps[3].to_lowercase(),
                })
            })
            .into_iter()
            .collect();

        Action {
            name,
            kind: kind.to_string(),
            to_hit,
            reach_ft,
            range_ft,
            targets,
            damage,
            text: raw,
        }
    }
}

/// Splits a body at `### ` headings into sections keyed by the lower-cased
/// heading. Text before the first heading is `_preamble`.
fn split_sections(body: &str) -> BTreeMap<String, String> {
    let mut sections = BTreeMap::new();
    let mut current = "_preamble".to_string();
    let mut buffer: Vec<&str> = Vec::new();
    for line in body.lines() {
        if let Some(heading) = line.trim().strip_prefix("### ") {
            sections.insert(current, buffer.join("\n").trim().to_string());
            current = heading.trim().to_lowercase();
            buffer.clear();
            continue;
        }
        buffer.push(line);
    }
    sections.insert(current, buffer.join("\n").trim().to_string());
    sections
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `.md` files directly inside `dir`, in locale order.
fn markdown_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(dir).map_err(|error| IndexError::read_dir(dir, error))? {
        let entry = entry.map_err(|error| IndexError::read_dir(dir, error))?;
        let is_file = entry
            .file_type()
            .map_err(|error| IndexError::read_dir(dir, error))?
            .is_file();
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if is_file && name.ends_with(".md") {
            sources.push(entry.path());
        }
    }
    sources.sort_by(|a, b| {
        let a = a.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let b = b.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        locale_cmp(&a, &b)
    });
    Ok(sources)
}

/// Converts every markdown stat block in `source_dir` into
/// `<out_dir>/<slug>.json`, then reconciles `out_dir` as the `monsters`
/// document collection.
///
/// Records are named after the slugged monster name; collisions get `-2`,
/// `-3`, ... suffixes in source order. Records already in `out_dir` from
/// earlier runs are left in place and stay indexed.
pub fn import_monsters(source_dir: &Path, out_dir: &Path) -> Result<ImportReport> {
    let parser = MonsterParser::new()?;
    let mut names = RecordNames::default();
    let mut written = Vec::new();

    for path in markdown_sources(source_dir)? {
        let text = fs::read_to_string(&path).map_err(|error| IndexError::read(&path, error))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let monster = parser.parse(&stem, &text);
        let record = names.claim(&slugify_or(&monster.name, "monster"));
        write_document(&out_dir.join(&record), &monster)?;
        log::info!("converted {file_name} -> {record}");
        written.push((file_name, record));
    }

    let index = reconcile(&Collection::documents("monsters", out_dir))?;
    log::info!(
        "imported {} monsters into {}",
        written.len(),
        out_dir.display()
    );
    Ok(ImportReport { written, index })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOBLIN: &str = "---
layout: monster-manual
name: \"Goblin\"
tags: [small, humanoid, Goblinoid]
size: Small humanoid (goblinoid)
alignment: neutral evil
armor_class: 15 (leather armor, shield)
hit_points: 7 (2d6)
speed: 30 ft., climb 20 ft.
str: 8 (-1)
dex: 14 (+2)
wis: 8 (-1)
skills: \"Stealth +6, Perception -1\"
languages: Common, Goblin
challenge: 1/4 (50 XP)
---

***Nimble Escape.*** The goblin can take the Disengage or Hide action
as a bonus action on each of its turns.

### Actions

***Scimitar.*** Melee Weapon Attack: +4 to hit, reach 5 ft., one target. Hit: 5 (1d6 + 2) slashing damage.

***Shortbow.*** Ranged Weapon Attack: +4 to hit, range 80/320 ft., one target. Hit: 5 (1d6 + 2) piercing damage.

***Cackle.*** The goblin laughs.


It is unsettling.
";

    fn parser() -> MonsterParser {
        MonsterParser::new().expect("patterns compile")
    }

    #[test]
    fn parses_header_statistics() {
        let monster = parser().parse("goblin-file", GOBLIN);
        assert_eq!(monster.name, "Goblin");
        assert_eq!(monster.size, "Small");
        assert_eq!(monster.creature_type.kind, "humanoid");
        assert_eq!(
            monster.creature_type.tags,
            vec!["small", "humanoid", "Goblinoid"]
        );
        assert_eq!(monster.alignment, "neutral evil");
        assert_eq!(monster.ac, Value::from(15));
        assert_eq!(monster.hp.average, 7);
        assert_eq!(monster.hp.formula, "2d6");
        assert_eq!(monster.speed.get("walk"), Some(&30));
        assert_eq!(monster.speed.get("climb"), Some(&20));
        assert_eq!(monster.abilities.strength, 8);
        assert_eq!(monster.abilities.dexterity, 14);
        assert_eq!(monster.abilities.constitution, 10);
        assert_eq!(monster.skills.get("Stealth"), Some(&6));
        assert_eq!(monster.skills.get("Perception"), Some(&-1));
        assert_eq!(monster.languages, vec!["Common", "Goblin"]);
        assert_eq!(monster.challenge.cr, "1/4");
        assert_eq!(monster.challenge.xp, Some(50));
        assert_eq!(monster.source, "monster-manual");
    }

    #[test]
    fn parses_traits_and_actions() {
        let monster = parser().parse("goblin", GOBLIN);
        assert_eq!(monster.traits.len(), 1);
        assert_eq!(monster.traits[0].name, "Nimble Escape");
        assert_eq!(
            monster.traits[0].text,
            "The goblin can take the Disengage or Hide action\nas a bonus action on each of its turns."
        );

        assert_eq!(monster.actions.len(), 3);
        let scimitar = &monster.actions[0];
        assert_eq!(scimitar.kind, "melee_weapon_attack");
        assert_eq!(scimitar.to_hit, Some(4));
        assert_eq!(scimitar.reach_ft, Some(5));
        assert_eq!(scimitar.targets, Some(1));
        assert_eq!(
            scimitar.damage,
            vec![Damage {
                avg: 5,
                formula: "1d6 + 2".to_string(),
                kind: "slashing".to_string()
            }]
        );

        let shortbow = &monster.actions[1];
        assert_eq!(shortbow.kind, "ranged_weapon_attack");
        assert_eq!(
            shortbow.range_ft,
            Some(AttackRange {
                normal: 80,
                long: 320
            })
        );

        let cackle = &monster.actions[2];
        assert_eq!(cackle.kind, "special");
        assert_eq!(cackle.text, "The goblin laughs.\n\nIt is unsettling.");
    }

    #[test]
    fn defaults_for_a_bare_document() {
        let monster = parser().parse("Mystery Beast", "Just prose, no header.");
        assert_eq!(monster.name, "Mystery Beast");
        assert_eq!(monster.size, "Medium");
        assert_eq!(monster.creature_type.kind, "unknown");
        assert_eq!(monster.alignment, "unaligned");
        assert_eq!(monster.ac, Value::from("—"));
        assert_eq!(monster.hp.average, 0);
        assert_eq!(monster.challenge.cr, "—");
        assert_eq!(monster.challenge.xp, None);
        assert!(monster.traits.is_empty());
        assert!(monster.actions.is_empty());

        let value = serde_json::to_value(&monster).unwrap();
        assert!(value["challenge"].get("xp").is_none());
        assert_eq!(value["abilities"]["cha"], 10);
    }

    #[test]
    fn unknown_challenge_text_is_kept() {
        let (cr, xp) = parser().challenge("varies");
        assert_eq!(cr.as_deref(), Some("varies"));
        assert_eq!(xp, None);
    }

    #[test]
    fn sections_are_keyed_by_lowercased_heading() {
        let sections = split_sections("intro\n### Actions\nhit\n### Legendary Actions\nmore");
        assert_eq!(sections["_preamble"], "intro");
        assert_eq!(sections["actions"], "hit");
        assert_eq!(sections["legendary actions"], "more");
    }
}
