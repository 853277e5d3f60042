//! Runtime configuration.
//!
//! Settings come from a TOML file (`gridstep.toml` in the working directory, then the
//! user config directory, or whatever `GRIDSTEP_CONFIG` points to). Every field has a
//! default, so a missing or partial file is fine.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gridstep_data::{MIN_WALLS, MIN_WATER};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::control::DEFAULT_GAME_SPEED;
use crate::generate::MapLayout;
use crate::map_library::MapLibrary;

pub const CONFIG_FILE: &str = "gridstep.toml";
pub const CONFIG_ENV: &str = "GRIDSTEP_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds per tick.
    pub game_speed: f64,
    /// Name whose map library is used.
    pub profile: String,
    /// Root directory holding one map library per profile.
    pub map_dir: PathBuf,
    /// Walls on a generated map.
    pub walls: usize,
    /// Water tiles on a generated map.
    pub water: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_speed: DEFAULT_GAME_SPEED,
            profile: "default".to_string(),
            map_dir: PathBuf::from("maps"),
            walls: MIN_WALLS,
            water: MIN_WATER,
        }
    }
}

impl Config {
    pub fn layout(&self) -> MapLayout {
        MapLayout {
            walls: self.walls,
            water: self.water,
        }
    }

    /// Map library of the configured profile.
    pub fn library(&self) -> MapLibrary {
        MapLibrary::for_profile(&self.map_dir, &self.profile)
    }

    /// Replace unusable values with defaults, logging each replacement.
    fn sanitized(mut self) -> Self {
        if !(self.game_speed.is_finite() && self.game_speed > 0.0) {
            warn!(
                "config: game_speed {} is not a positive number, using {DEFAULT_GAME_SPEED}",
                self.game_speed
            );
            self.game_speed = DEFAULT_GAME_SPEED;
        }
        if let Err(err) = self.layout().check() {
            warn!("config: {err}; using {MIN_WALLS} walls and {MIN_WATER} water");
            self.walls = MIN_WALLS;
            self.water = MIN_WATER;
        }
        self
    }
}

/// Where the configuration is read from.
pub fn config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_ENV)
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }
    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("gridstep").join(CONFIG_FILE))
        .filter(|path| path.is_file())
        .unwrap_or(local)
}

/// Parse a configuration file.
///
/// # Errors
/// - if the file cannot be read or is not valid TOML for [`Config`]
pub fn load_config_from(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
    let config: Config = toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))?;
    Ok(config.sanitized())
}

/// Load the configuration from [`config_path`], falling back to defaults on any problem.
pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        info!("no config file at {}, using defaults", path.display());
        return Config::default();
    }
    match load_config_from(&path) {
        Ok(config) => {
            info!("config loaded from {}", path.display());
            config
        },
        Err(err) => {
            warn!("{err:#}; using default config");
            Config::default()
        },
    }
}
