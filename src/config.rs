/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD), or from an
/// explicit path given on the command line. Falls back to defaults if the
/// file is missing, unreadable, or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub track: TrackConfig,
    pub display: DisplayConfig,
    pub session: SessionConfig,
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackConfig {
    pub width: usize,
    pub height: usize,
    pub split: usize, // first column of the right-hand half
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    pub cell_width: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub settle_delay: Duration,   // between registering drivers and starting
    pub request_timeout: Duration,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    track: TomlTrack,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    session: TomlSession,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlTrack {
    #[serde(default = "default_width")]
    width: usize,
    #[serde(default = "default_height")]
    height: usize,
    #[serde(default = "default_split")]
    split: usize,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_cell_width")]
    cell_width: usize,
}

#[derive(Deserialize, Debug)]
struct TomlSession {
    #[serde(default = "default_settle_delay")]
    settle_delay_ms: u64,
    #[serde(default = "default_request_timeout")]
    request_timeout_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_width() -> usize { 6 }
fn default_height() -> usize { 9 }
fn default_split() -> usize { 3 }
fn default_cell_width() -> usize { 10 }
fn default_settle_delay() -> u64 { 2000 }   // drivers need a moment to come online
fn default_request_timeout() -> u64 { 10_000 }
fn default_log_level() -> String { "info".into() }

impl Default for TomlTrack {
    fn default() -> Self {
        TomlTrack {
            width: default_width(),
            height: default_height(),
            split: default_split(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay { cell_width: default_cell_width() }
    }
}

impl Default for TomlSession {
    fn default() -> Self {
        TomlSession {
            settle_delay_ms: default_settle_delay(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog { level: default_log_level() }
    }
}

// ── Loading ──

impl ViewerConfig {
    /// Load config from `explicit`, or search for `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let toml_cfg = match explicit {
            Some(path) => read_toml(path).unwrap_or_default(),
            None => candidate_dirs()
                .iter()
                .map(|d| d.join(CONFIG_FILE))
                .find(|p| p.exists())
                .and_then(|p| read_toml(&p))
                .unwrap_or_default(),
        };
        ViewerConfig::from_toml(toml_cfg)
    }

    fn from_toml(t: TomlConfig) -> Self {
        ViewerConfig {
            track: TrackConfig {
                width: t.track.width.max(1),
                height: t.track.height.max(1),
                split: t.track.split,
            },
            display: DisplayConfig {
                cell_width: t.display.cell_width.max(1),
            },
            session: SessionConfig {
                settle_delay: Duration::from_millis(t.session.settle_delay_ms),
                request_timeout: Duration::from_millis(t.session.request_timeout_ms),
            },
            log_level: t.log.level,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
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

    dirs
}

/// Read and parse one config file. Problems are reported and yield `None`.
/// Runs before logging is set up, hence plain stderr.
fn read_toml(path: &Path) -> Option<TomlConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Warning: could not read {}: {e}", path.display());
            return None;
        }
    };
    match toml::from_str::<TomlConfig>(&text) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!("Warning: {} parse error: {e}", path.display());
            eprintln!("Using default settings.");
            None
        }
    }
}
