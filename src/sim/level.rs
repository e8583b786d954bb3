/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.toml` files, loaded in file-name order)
///   2. Built-in embedded levels
///
/// ## Level format (`.toml`):
///   ```toml
///   name = "Level 1"
///   row_count = 2
///   column_count = 3
///   background = "navy"
///   bricks = """
///   S S S
///   _ I _
///   """
///
///   [[brick_types]]
///   id = "S"
///   texture = "red"
///   hit_points = 1
///   hit_sound = "hit-soft"
///   break_sound = "break-soft"
///   break_score = 50
///
///   [indestructible]
///   id = "I"
///   texture = "grey"
///   hit_sound = "hit-metal"
///   ```
///
/// Whitespace inside grid rows is ignored and blank lines are skipped.
/// `_` marks an empty cell; characters that match no brick id are skipped too.
///
/// Everything is validated here: a `LevelDef` that leaves this module is
/// well-formed, so layout and the step never have to defend against it.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::brick::{BrickType, Durability};

/// Grid character for "no brick here".
pub const EMPTY_CELL: char = '_';

/// A validated level description.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDef {
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub background: String,
    /// Breakable types in file order.
    pub brick_types: Vec<BrickType>,
    pub indestructible: BrickType,
    /// Grid rows, whitespace removed.
    pub layout: Vec<Vec<char>>,
}

impl LevelDef {
    /// Brick type for a grid character, if any.
    pub fn brick_type(&self, cell: char) -> Option<&BrickType> {
        if cell == EMPTY_CELL {
            return None;
        }
        self.brick_types
            .iter()
            .chain(std::iter::once(&self.indestructible))
            .find(|t| t.id == cell)
    }
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("{name}: {reason}")]
    Invalid { name: String, reason: String },
    #[error("no playable levels")]
    NoLevels,
}

// ── TOML schema ──

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TomlLevel {
    #[serde(default)]
    name: Option<String>,
    row_count: usize,
    column_count: usize,
    #[serde(default = "default_background")]
    background: String,
    bricks: String,
    brick_types: Vec<TomlBrickType>,
    indestructible: TomlIndestructible,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TomlBrickType {
    id: String,
    texture: String,
    hit_points: u32,
    hit_sound: String,
    break_sound: String,
    break_score: u32,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TomlIndestructible {
    id: String,
    texture: String,
    hit_sound: String,
}

fn default_background() -> String { "black".into() }

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Level list for a game: the levels directory if it yields anything,
/// otherwise the built-in set.
pub fn load_levels(levels_dir: &Path) -> Result<Vec<LevelDef>, LevelError> {
    if levels_dir.is_dir() {
        let levels = load_from_directory(levels_dir);
        if !levels.is_empty() {
            log::info!("loaded {} level(s) from {}", levels.len(), levels_dir.display());
            return Ok(levels);
        }
        log::warn!("no valid levels in {}, using built-in levels", levels_dir.display());
    }
    embedded_levels()
}

/// Parse and validate one level document. `fallback_name` is used when the
/// document has no `name` and in error messages.
pub fn parse_level(fallback_name: &str, text: &str) -> Result<LevelDef, LevelError> {
    let raw: TomlLevel = toml::from_str(text).map_err(|source| LevelError::Parse {
        name: fallback_name.to_string(),
        source,
    })?;
    let name = raw.name.clone().unwrap_or_else(|| fallback_name.to_string());
    validate(name, raw)
}

/// Read one level file from disk.
pub fn load_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    parse_level(&stem, &text)
}

// ══════════════════════════════════════════════════════════════
// Validation
// ══════════════════════════════════════════════════════════════

fn validate(name: String, raw: TomlLevel) -> Result<LevelDef, LevelError> {
    let invalid = |reason: String| LevelError::Invalid { name: name.clone(), reason };

    if raw.column_count == 0 {
        return Err(invalid("column_count must be at least 1".into()));
    }
    if raw.brick_types.is_empty() {
        return Err(invalid("at least one breakable brick type is required".into()));
    }

    let mut seen = HashSet::new();
    let mut brick_types = Vec::with_capacity(raw.brick_types.len());
    for t in &raw.brick_types {
        let id = parse_id(&t.id).map_err(|r| invalid(r))?;
        if !seen.insert(id) {
            return Err(invalid(format!("duplicate brick id '{id}'")));
        }
        if t.hit_points == 0 {
            return Err(invalid(format!("brick '{id}' needs at least one hit point")));
        }
        if t.break_score == 0 {
            return Err(invalid(format!("brick '{id}' needs a non-zero break score")));
        }
        brick_types.push(BrickType {
            id,
            texture: t.texture.clone(),
            durability: Durability::Breakable(t.hit_points),
            hit_sound: t.hit_sound.clone(),
            break_sound: t.break_sound.clone(),
            break_score: t.break_score,
        });
    }

    let solid_id = parse_id(&raw.indestructible.id).map_err(|r| invalid(r))?;
    if !seen.insert(solid_id) {
        return Err(invalid(format!("duplicate brick id '{solid_id}'")));
    }
    let indestructible = BrickType {
        id: solid_id,
        texture: raw.indestructible.texture.clone(),
        durability: Durability::Indestructible,
        hit_sound: raw.indestructible.hit_sound.clone(),
        break_sound: String::new(),
        break_score: 0,
    };

    let layout = parse_grid(&raw.bricks);
    if layout.len() != raw.row_count {
        return Err(invalid(format!(
            "row_count is {} but the grid has {} row(s)",
            raw.row_count,
            layout.len()
        )));
    }
    if let Some((i, row)) = layout.iter().enumerate().find(|(_, r)| r.len() > raw.column_count) {
        return Err(invalid(format!(
            "grid row {} has {} cells, column_count is {}",
            i + 1,
            row.len(),
            raw.column_count
        )));
    }

    let breakable: HashSet<char> = brick_types.iter().map(|t| t.id).collect();
    if !layout.iter().flatten().any(|c| breakable.contains(c)) {
        return Err(invalid("grid contains no breakable bricks".into()));
    }

    Ok(LevelDef {
        name,
        row_count: raw.row_count,
        column_count: raw.column_count,
        background: raw.background,
        brick_types,
        indestructible,
        layout,
    })
}

fn parse_id(id: &str) -> Result<char, String> {
    let mut chars = id.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c == EMPTY_CELL => Err(format!("'{EMPTY_CELL}' is reserved for empty cells")),
        (Some(c), None) if c.is_whitespace() => Err("brick id cannot be whitespace".into()),
        (Some(c), None) => Ok(c),
        _ => Err(format!("brick id '{id}' must be exactly one character")),
    }
}

fn parse_grid(text: &str) -> Vec<Vec<char>> {
    text.lines()
        .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .toml files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("could not list {}: {e}", dir.display());
            return vec![];
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |x| x == "toml"))
        .collect();
    paths.sort();

    paths
        .iter()
        .filter_map(|path| match load_level_file(path) {
            Ok(def) => Some(def),
            Err(e) => {
                log::warn!("skipping level file: {e}");
                None
            }
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[(&str, &str)] = &[
    ("level1", include_str!("../../levels/level1.toml")),
    ("level2", include_str!("../../levels/level2.toml")),
    ("level3", include_str!("../../levels/level3.toml")),
];

pub fn embedded_levels() -> Result<Vec<LevelDef>, LevelError> {
    EMBEDDED.iter().map(|(name, text)| parse_level(name, text)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name = "Tiny"
row_count = 2
column_count = 3
bricks = """
S S S
_ I Q
"""

[[brick_types]]
id = "S"
texture = "red"
hit_points = 2
hit_sound = "hit-soft"
break_sound = "break-soft"
break_score = 10

[indestructible]
id = "I"
texture = "grey"
hit_sound = "hit-metal"
"#;

    #[test]
    fn embedded_levels_are_valid() {
        let levels = embedded_levels().expect("built-in levels parse");
        assert_eq!(levels.len(), 3);
        for level in &levels {
            assert_eq!(level.layout.len(), level.row_count);
            assert_eq!(level.indestructible.durability, Durability::Indestructible);
        }
    }

    #[test]
    fn minimal_level_parses() {
        let def = parse_level("fallback", MINIMAL).unwrap();
        assert_eq!(def.name, "Tiny");
        assert_eq!(def.background, "black");
        assert_eq!(def.layout, vec![vec!['S', 'S', 'S'], vec!['_', 'I', 'Q']]);
        assert_eq!(def.brick_types[0].durability, Durability::Breakable(2));
        assert_eq!(def.indestructible.break_score, 0);
    }

    #[test]
    fn brick_type_lookup() {
        let def = parse_level("fallback", MINIMAL).unwrap();
        assert_eq!(def.brick_type('S').map(|t| t.id), Some('S'));
        assert_eq!(def.brick_type('I').map(|t| t.durability), Some(Durability::Indestructible));
        assert!(def.brick_type('_').is_none());
        assert!(def.brick_type('Q').is_none());
    }

    #[test]
    fn missing_name_uses_fallback() {
        let text = MINIMAL.replace("name = \"Tiny\"\n", "");
        let def = parse_level("level9", &text).unwrap();
        assert_eq!(def.name, "level9");
    }

    #[test]
    fn row_count_mismatch_rejected() {
        let text = MINIMAL.replace("row_count = 2", "row_count = 3");
        assert!(matches!(parse_level("x", &text), Err(LevelError::Invalid { .. })));
    }

    #[test]
    fn wide_row_rejected() {
        let text = MINIMAL.replace("column_count = 3", "column_count = 2");
        assert!(matches!(parse_level("x", &text), Err(LevelError::Invalid { .. })));
    }

    #[test]
    fn duplicate_id_rejected() {
        let text = MINIMAL.replace("id = \"I\"", "id = \"S\"");
        assert!(matches!(parse_level("x", &text), Err(LevelError::Invalid { .. })));
    }

    #[test]
    fn long_id_rejected() {
        let text = MINIMAL.replace("id = \"S\"", "id = \"SS\"");
        assert!(matches!(parse_level("x", &text), Err(LevelError::Invalid { .. })));
    }

    #[test]
    fn zero_hit_points_rejected() {
        let text = MINIMAL.replace("hit_points = 2", "hit_points = 0");
        assert!(matches!(parse_level("x", &text), Err(LevelError::Invalid { .. })));
    }

    #[test]
    fn grid_without_breakables_rejected() {
        let text = MINIMAL.replace("S S S", "I I I");
        assert!(matches!(parse_level("x", &text), Err(LevelError::Invalid { .. })));
    }

    #[test]
    fn missing_indestructible_is_parse_error() {
        let cut = MINIMAL.find("[indestructible]").unwrap();
        assert!(matches!(parse_level("x", &MINIMAL[..cut]), Err(LevelError::Parse { .. })));
    }

    #[test]
    fn directory_levels_sorted_and_bad_files_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.toml"), MINIMAL.replace("Tiny", "Second")).unwrap();
        std::fs::write(dir.path().join("a.toml"), MINIMAL.replace("Tiny", "First")).unwrap();
        std::fs::write(dir.path().join("c.toml"), "not = [valid").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let levels = load_levels(dir.path()).unwrap();
        let names: Vec<_> = levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["First", "Second"]);
    }

    #[test]
    fn empty_directory_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let levels = load_levels(dir.path()).unwrap();
        assert_eq!(levels.len(), 3);
    }

    #[test]
    fn missing_directory_falls_back_to_builtin() {
        let levels = load_levels(Path::new("/definitely/not/here")).unwrap();
        assert_eq!(levels.len(), 3);
    }
}
