/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// The logger is configured from this file, so problems found while loading
/// are collected in `GameConfig::warnings` and logged by the caller once the
/// logger is up.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub rules: RulesConfig,
    pub controls: ControlsConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub log_file: PathBuf,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RulesConfig {
    /// Spare balls after the first one.
    pub lives: u32,
    /// Fraction of the swept frame distance the ball covers, in (0, 1].
    /// Above 1 the ball would overshoot the contact plane.
    pub ball_speed: f32,
    /// Seconds the level banner stays up before the next serve.
    pub transition_secs: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControlsConfig {
    /// Keyboard / d-pad paddle speed, world units per second.
    pub paddle_speed: f32,
    pub frame_sleep_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub launch: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            lives: default_lives(),
            ball_speed: default_ball_speed(),
            transition_secs: default_transition_secs(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    controls: TomlControls,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_ball_speed")]
    ball_speed: f32,
    #[serde(default = "default_transition_secs")]
    transition_secs: f32,
}

#[derive(Deserialize, Debug)]
struct TomlControls {
    #[serde(default = "default_paddle_speed")]
    paddle_speed: f32,
    #[serde(default = "default_frame_sleep")]
    frame_sleep_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_launch")]
    launch: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_lives() -> u32 { 1 }
fn default_ball_speed() -> f32 { 0.6 }
fn default_transition_secs() -> f32 { 1.5 }
fn default_paddle_speed() -> f32 { 1.2 }
fn default_frame_sleep() -> u64 { 5 }

fn default_launch() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_log_file() -> String { "breakout.log".into() }

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            lives: default_lives(),
            ball_speed: default_ball_speed(),
            transition_secs: default_transition_secs(),
        }
    }
}

impl Default for TomlControls {
    fn default() -> Self {
        TomlControls {
            paddle_speed: default_paddle_speed(),
            frame_sleep_ms: default_frame_sleep(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            launch: default_launch(),
            restart: default_restart(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_file: default_log_file(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        Self::load_from(&candidate_dirs())
    }

    /// Load using an explicit list of search directories.
    pub fn load_from(search_dirs: &[PathBuf]) -> Self {
        let mut warnings = vec![];
        let toml_cfg = load_toml(search_dirs, &mut warnings);

        let levels_dir = resolve_dir(search_dirs, &toml_cfg.general.levels_dir);

        let mut rules = RulesConfig {
            lives: toml_cfg.rules.lives,
            ball_speed: toml_cfg.rules.ball_speed,
            transition_secs: toml_cfg.rules.transition_secs,
        };
        if !(rules.ball_speed.is_finite() && rules.ball_speed > 0.0 && rules.ball_speed <= 1.0) {
            warnings.push(format!("rules.ball_speed {} is outside (0, 1], using default", rules.ball_speed));
            rules.ball_speed = default_ball_speed();
        }
        if !(rules.transition_secs.is_finite() && rules.transition_secs >= 0.0) {
            warnings.push(format!("rules.transition_secs {} is invalid, using default", rules.transition_secs));
            rules.transition_secs = default_transition_secs();
        }

        let mut controls = ControlsConfig {
            paddle_speed: toml_cfg.controls.paddle_speed,
            frame_sleep_ms: toml_cfg.controls.frame_sleep_ms,
        };
        if !(controls.paddle_speed.is_finite() && controls.paddle_speed > 0.0) {
            warnings.push(format!("controls.paddle_speed {} is not a positive number, using default", controls.paddle_speed));
            controls.paddle_speed = default_paddle_speed();
        }

        GameConfig {
            rules,
            controls,
            gamepad: GamepadConfig {
                launch: toml_cfg.gamepad.launch,
                restart: toml_cfg.gamepad.restart,
                quit: toml_cfg.gamepad.quit,
            },
            levels_dir,
            log_file: PathBuf::from(toml_cfg.general.log_file),
            warnings,
        }
    }
}

/// Absolute paths are used as-is; relative ones are searched for in the
/// candidate dirs, defaulting to CWD-relative.
fn resolve_dir(search_dirs: &[PathBuf], dir: &str) -> PathBuf {
    if Path::new(dir).is_absolute() {
        return PathBuf::from(dir);
    }
    search_dirs.iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or_else(|| PathBuf::from(dir))
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so data next to the real binary is still found.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!("{}: parse error, using default settings: {e}", path.display()));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_with(text: &str) -> (tempfile::TempDir, GameConfig) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), text).unwrap();
        let cfg = GameConfig::load_from(&[dir.path().to_path_buf()]);
        (dir, cfg)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = GameConfig::load_from(&[dir.path().to_path_buf()]);
        assert_eq!(cfg.rules, RulesConfig::default());
        assert_eq!(cfg.controls.frame_sleep_ms, 5);
        assert_eq!(cfg.gamepad.launch, vec!["A", "Start"]);
        assert_eq!(cfg.log_file, PathBuf::from("breakout.log"));
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let (_dir, cfg) = load_with("[rules]\nlives = 5\n");
        assert_eq!(cfg.rules.lives, 5);
        assert_eq!(cfg.rules.ball_speed, 0.6);
        assert_eq!(cfg.controls.paddle_speed, 1.2);
    }

    #[test]
    fn broken_file_falls_back_with_warning() {
        let (_dir, cfg) = load_with("[rules\nlives = ");
        assert_eq!(cfg.rules, RulesConfig::default());
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn non_positive_speed_replaced() {
        let (_dir, cfg) = load_with("[rules]\nball_speed = -1.0\n[controls]\npaddle_speed = 0.0\n");
        assert_eq!(cfg.rules.ball_speed, 0.6);
        assert_eq!(cfg.controls.paddle_speed, 1.2);
        assert_eq!(cfg.warnings.len(), 2);
    }

    #[test]
    fn ball_speed_above_one_replaced() {
        let (_dir, cfg) = load_with("[rules]\nball_speed = 1.5\n");
        assert_eq!(cfg.rules.ball_speed, 0.6);
        assert_eq!(cfg.warnings.len(), 1);

        let (_dir, cfg) = load_with("[rules]\nball_speed = 1.0\n");
        assert_eq!(cfg.rules.ball_speed, 1.0);
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn one_ball_by_default() {
        assert_eq!(RulesConfig::default().lives, 1);
    }

    #[test]
    fn levels_dir_found_in_search_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("my_levels")).unwrap();
        std::fs::write(dir.path().join("config.toml"), "[general]\nlevels_dir = \"my_levels\"\n").unwrap();
        let cfg = GameConfig::load_from(&[dir.path().to_path_buf()]);
        assert_eq!(cfg.levels_dir, dir.path().join("my_levels"));
    }
}
