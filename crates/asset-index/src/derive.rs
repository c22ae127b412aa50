//! Default display metadata for assets that have no curated index entry.
//!
//! Everything here is pure and total: any input string produces a value.
//! Casing rules are ASCII-oriented; non-ASCII letters are left untouched and
//! count as word boundaries.

/// Icon taxonomy derived from the first path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Pc,
    Npc,
    Monster,
    Other,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Pc => "pc",
            AssetKind::Npc => "npc",
            AssetKind::Monster => "monster",
            AssetKind::Other => "other",
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Uppercases every ASCII word character that starts a word.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_word = false;
    for c in text.chars() {
        let word = is_word_char(c);
        if word && !previous_is_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        previous_is_word = word;
    }
    out
}

/// `"upper-canopy.webp"` -> `"Upper Canopy"`.
pub fn title_from_filename(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    let stem = match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    };

    let mut spaced = String::with_capacity(stem.len());
    let mut in_separator = false;
    for c in stem.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !in_separator {
                spaced.push(' ');
            }
            in_separator = true;
        } else {
            spaced.push(c);
            in_separator = false;
        }
    }

    title_case(spaced.trim())
}

/// Directory part of a relative path; empty for files at the root.
pub fn folder_from_path(rel_path: &str) -> String {
    rel_path
        .rsplit_once('/')
        .map(|(folder, _)| folder.to_string())
        .unwrap_or_default()
}

/// `""` -> `"Unsorted"`, `"feywild/upper"` -> `"Feywild / Upper"`.
pub fn folder_title(folder: &str) -> String {
    if folder.is_empty() {
        return "Unsorted".to_string();
    }
    folder
        .split('/')
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" / ")
}

pub fn kind_from_path(rel_path: &str) -> AssetKind {
    let first = rel_path.split('/').next().unwrap_or_default();
    match first.to_lowercase().as_str() {
        "pcs" => AssetKind::Pc,
        "npcs" => AssetKind::Npc,
        "monsters" => AssetKind::Monster,
        _ => AssetKind::Other,
    }
}

/// Base letter of a Latin letter with a diacritic (`é` -> `e`).
fn strip_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        other => other,
    }
}

/// Lower-case ASCII slug used for record file names (`<slug>.json`).
pub fn slugify(text: &str) -> String {
    slugify_or(text, "item")
}

/// Like [`slugify`], with the slug to use when nothing alphanumeric is left.
pub fn slugify_or(text: &str, fallback: &str) -> String {
    let expanded = text.trim().replace('ß', "ss");
    let mut slug = String::with_capacity(expanded.len());
    let mut pending_dash = false;
    for c in expanded.chars().map(strip_diacritic) {
        let lower = c.to_ascii_lowercase();
        if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(lower);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_from_dashed_filename() {
        assert_eq!(title_from_filename("upper-canopy.webp"), "Upper Canopy");
    }

    #[test]
    fn title_collapses_mixed_separator_runs() {
        assert_eq!(title_from_filename("old__mill - ruins.png"), "Old Mill Ruins");
        assert_eq!(title_from_filename("  _lonely_.jpg"), "Lonely");
    }

    #[test]
    fn title_ignores_folders_and_keeps_existing_capitals() {
        assert_eq!(title_from_filename("feywild/yggdrasil.webp"), "Yggdrasil");
        assert_eq!(title_from_filename("NPC_portrait.png"), "NPC Portrait");
    }

    #[test]
    fn title_without_extension_or_dotfile() {
        assert_eq!(title_from_filename("tavern"), "Tavern");
        assert_eq!(title_from_filename(".hidden"), ".Hidden");
    }

    #[test]
    fn title_case_is_ascii_only() {
        assert_eq!(title_from_filename("dragon's-lair.webp"), "Dragon'S Lair");
    }

    #[test]
    fn folder_from_nested_and_root_paths() {
        assert_eq!(folder_from_path("feywild/yggdrasil.webp"), "feywild");
        assert_eq!(folder_from_path("a/b/c.png"), "a/b");
        assert_eq!(folder_from_path("city.webp"), "");
    }

    #[test]
    fn folder_titles() {
        assert_eq!(folder_title(""), "Unsorted");
        assert_eq!(folder_title("feywild"), "Feywild");
        assert_eq!(folder_title("feywild/upper_canopy"), "Feywild / Upper_canopy");
    }

    #[test]
    fn kinds_follow_first_segment() {
        assert_eq!(kind_from_path("pcs/aria.png"), AssetKind::Pc);
        assert_eq!(kind_from_path("NPCs/bram.png"), AssetKind::Npc);
        assert_eq!(kind_from_path("monsters/boss/lich.svg"), AssetKind::Monster);
        assert_eq!(kind_from_path("props/chest.png"), AssetKind::Other);
        assert_eq!(kind_from_path("pcs.png"), AssetKind::Other);
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Goblin Boss"), "goblin-boss");
        assert_eq!(slugify("  Feuerball (Ritual) "), "feuerball-ritual");
        assert_eq!(slugify("Große Kraft"), "grosse-kraft");
        assert_eq!(slugify("!!!"), "item");
        assert_eq!(slugify_or("", "monster"), "monster");
    }

    #[test]
    fn slugs_drop_diacritics() {
        assert_eq!(slugify("Élan Vital"), "elan-vital");
        assert_eq!(slugify("Señor Ñandú"), "senor-nandu");
    }
}
