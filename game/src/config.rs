use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::randomizer::RandomizerKind;
use crate::shapes::{PieceKind, Vec2i, offsets};

pub const DEFAULT_COLUMNS: usize = 12;
pub const DEFAULT_ROWS: usize = 20;
pub const DEFAULT_GRAVITY_INTERVAL: Duration = Duration::from_millis(1_000);
pub const DEFAULT_LOCK_DEBOUNCE: Duration = Duration::from_millis(100);
pub const DEFAULT_PREVIEW_LEN: usize = 1;
pub const MIN_DIMENSION: usize = 4;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("board must be at least {min}x{min}, got {columns}x{rows}")]
    BoardTooSmall {
        columns: usize,
        rows: usize,
        min: usize,
    },
    #[error("spawn column {column} puts a {kind:?} piece outside a {columns}-column board")]
    SpawnColumnOutOfRange {
        column: usize,
        columns: usize,
        kind: PieceKind,
    },
    #[error("spawn row {spawn_row} is not below the top of a {rows}-row board")]
    SpawnRowOutOfRange { spawn_row: usize, rows: usize },
    #[error("gravity interval must be non-zero")]
    ZeroGravityInterval,
}

/// Construction-time settings. Fixed for the lifetime of a controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Anchor column for new pieces; `None` centers the spawn.
    #[serde(default)]
    pub spawn_column: Option<usize>,
    /// Rows below the top visible row at which pieces spawn.
    #[serde(default)]
    pub spawn_row: usize,
    #[serde(default = "default_gravity_interval", with = "crate::serde_duration")]
    pub gravity_interval: Duration,
    /// Minimum time between two accepted locks.
    #[serde(default = "default_lock_debounce", with = "crate::serde_duration")]
    pub lock_debounce: Duration,
    #[serde(default = "default_preview_len")]
    pub preview_len: usize,
    #[serde(default)]
    pub randomizer: RandomizerKind,
    #[serde(default)]
    pub seed: u64,
}

fn default_columns() -> usize {
    DEFAULT_COLUMNS
}

fn default_rows() -> usize {
    DEFAULT_ROWS
}

fn default_gravity_interval() -> Duration {
    DEFAULT_GRAVITY_INTERVAL
}

fn default_lock_debounce() -> Duration {
    DEFAULT_LOCK_DEBOUNCE
}

fn default_preview_len() -> usize {
    DEFAULT_PREVIEW_LEN
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            spawn_column: None,
            spawn_row: 0,
            gravity_interval: DEFAULT_GRAVITY_INTERVAL,
            lock_debounce: DEFAULT_LOCK_DEBOUNCE,
            preview_len: DEFAULT_PREVIEW_LEN,
            randomizer: RandomizerKind::default(),
            seed: 0,
        }
    }
}

impl GameConfig {
    pub fn with_board(mut self, columns: usize, rows: usize) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn spawn_column(&self) -> usize {
        self.spawn_column
            .unwrap_or_else(|| (self.columns / 2).saturating_sub(1))
    }

    /// Anchor of a freshly spawned piece. Row 0 is the bottom of the board.
    pub fn spawn_anchor(&self) -> Vec2i {
        let top = self.rows.saturating_sub(1).saturating_sub(self.spawn_row);
        Vec2i::new(self.spawn_column() as i32, top as i32)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns < MIN_DIMENSION || self.rows < MIN_DIMENSION {
            return Err(ConfigError::BoardTooSmall {
                columns: self.columns,
                rows: self.rows,
                min: MIN_DIMENSION,
            });
        }
        if self.spawn_row >= self.rows {
            return Err(ConfigError::SpawnRowOutOfRange {
                spawn_row: self.spawn_row,
                rows: self.rows,
            });
        }
        if self.gravity_interval.is_zero() {
            return Err(ConfigError::ZeroGravityInterval);
        }

        let column = self.spawn_column() as i32;
        for kind in PieceKind::ALL {
            let fits = offsets(kind, 0)
                .iter()
                .all(|o| (0..self.columns as i32).contains(&(column + o.x)));
            if !fits {
                return Err(ConfigError::SpawnColumnOutOfRange {
                    column: self.spawn_column(),
                    columns: self.columns,
                    kind,
                });
            }
        }
        Ok(())
    }
}

/// JSON-backed config location.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os("BLOCKFALL_CONFIG_PATH") {
            return Self::new(explicit);
        }

        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(base.join("blockfall").join("config.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored config, falling back to defaults when the file is
    /// missing, unreadable or invalid.
    pub fn load(&self) -> GameConfig {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return GameConfig::default(),
            Err(e) => {
                warn!("reading {}: {e}; using default config", self.path.display());
                return GameConfig::default();
            }
        };

        let config = match serde_json::from_slice::<GameConfig>(&bytes) {
            Ok(config) => config,
            Err(e) => {
                warn!("parsing {}: {e}; using default config", self.path.display());
                return GameConfig::default();
            }
        };

        if let Err(e) = config.validate() {
            warn!("{}: {e}; using default config", self.path.display());
            return GameConfig::default();
        }
        config
    }

    pub fn save(&self, config: &GameConfig) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(config)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }
}
