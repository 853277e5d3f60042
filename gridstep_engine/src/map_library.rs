//! Named map storage.
//!
//! Each profile gets its own directory of maps, one RON file per map. Maps are validated
//! before they are written and again when they are read back, so anything loaded from the
//! library is playable.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use gridstep_data::Grid;
use log::{info, warn};
use rand::Rng;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::GRIDSTEP_VERSION;
use crate::generate::{MapError, MapLayout, generate_map_with};
use crate::slug::sanitize_slug;

pub const MAP_EXTENSION: &str = "ron";

/// On-disk representation of a saved map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFile {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub grid: Grid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEntryStatus {
    Ready,
    /// Parsed, but not playable.
    Invalid { message: String },
    /// Could not be read or parsed.
    Corrupted { message: String },
}

/// A map file found in the library directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub slug: String,
    /// Display name stored in the file, if it could be read.
    pub name: Option<String>,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub status: MapEntryStatus,
}

/// Directory of saved maps for one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLibrary {
    dir: PathBuf,
}

impl MapLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Library for `profile` under the shared `root` directory.
    pub fn for_profile(root: impl AsRef<Path>, profile: &str) -> Self {
        Self::new(root.as_ref().join(sanitize_slug(profile, "default")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path a map called `name` is stored under.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{MAP_EXTENSION}", sanitize_slug(name, "map")))
    }

    /// Validate and store `grid` as `name`, replacing any map with the same slug.
    ///
    /// # Errors
    /// - if the grid is not playable, or the file cannot be written
    pub fn save(&self, name: &str, grid: &Grid) -> Result<PathBuf> {
        grid.validate()
            .map_err(MapError::from)
            .with_context(|| format!("refusing to save map '{name}'"))?;
        fs::create_dir_all(&self.dir).with_context(|| format!("creating {}", self.dir.display()))?;
        let file = MapFile {
            name: name.trim().to_string(),
            version: GRIDSTEP_VERSION.to_string(),
            grid: grid.clone(),
        };
        let text = ron::ser::to_string_pretty(&file, PrettyConfig::new().depth_limit(2))
            .with_context(|| format!("serializing map '{name}'"))?;
        let path = self.path_for(name);
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        info!("saved map '{name}' to {}", path.display());
        Ok(path)
    }

    /// Read back the map called `name`.
    ///
    /// # Errors
    /// - if the file is missing, unparsable, or holds an unplayable grid
    pub fn load(&self, name: &str) -> Result<Grid> {
        let path = self.path_for(name);
        let file = read_map_file(&path)?;
        file.grid
            .validate()
            .map_err(MapError::from)
            .with_context(|| format!("map file {}", path.display()))?;
        info!("loaded map '{}' from {}", file.name, path.display());
        Ok(file.grid)
    }

    /// Delete the map called `name`. Returns false if there was no such map.
    ///
    /// # Errors
    /// - if the file exists but cannot be removed
    pub fn remove(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        info!("removed map {}", path.display());
        Ok(true)
    }

    /// Every map file in the library, sorted by slug. Unreadable files are listed with a
    /// non-ready status rather than failing the whole listing.
    ///
    /// # Errors
    /// - if the directory exists but cannot be read
    pub fn list(&self) -> Result<Vec<MapEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir).with_context(|| format!("reading {}", self.dir.display()))? {
            let entry = entry.with_context(|| format!("enumerating {}", self.dir.display()))?;
            if let Some(map) = map_entry(&entry) {
                entries.push(map);
            }
        }
        entries.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(entries)
    }

    /// First playable map in listing order, if any.
    ///
    /// # Errors
    /// - if the directory cannot be read
    pub fn first(&self) -> Result<Option<Grid>> {
        for entry in self.list()? {
            if entry.status != MapEntryStatus::Ready {
                warn!("skipping unusable map {}", entry.path.display());
                continue;
            }
            return read_map_file(&entry.path).map(|file| Some(file.grid));
        }
        Ok(None)
    }
}

/// The map a full reset switches to: the library's first map, or a freshly generated one.
///
/// # Errors
/// - if `layout` cannot fit on the map
pub fn first_or_generate<R: Rng + ?Sized>(library: Option<&MapLibrary>, layout: MapLayout, rng: &mut R) -> Result<Grid> {
    if let Some(library) = library {
        match library.first() {
            Ok(Some(grid)) => return Ok(grid),
            Ok(None) => {},
            Err(err) => warn!("map library unavailable, generating instead: {err:#}"),
        }
    }
    Ok(generate_map_with(layout, rng)?)
}

fn read_map_file(path: &Path) -> Result<MapFile> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading map file {}", path.display()))?;
    ron::from_str::<MapFile>(&raw).with_context(|| format!("parsing map file {}", path.display()))
}

fn map_entry(entry: &fs::DirEntry) -> Option<MapEntry> {
    let path = entry.path();
    if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(MAP_EXTENSION) {
        return None;
    }
    let slug = path.file_stem().and_then(|stem| stem.to_str())?.to_string();
    let modified = entry.metadata().ok().and_then(|meta| meta.modified().ok());
    let (name, status) = match read_map_file(&path) {
        Ok(file) => {
            let status = match file.grid.validate() {
                Ok(()) => MapEntryStatus::Ready,
                Err(err) => MapEntryStatus::Invalid {
                    message: err.to_string(),
                },
            };
            (Some(file.name), status)
        },
        Err(err) => (
            None,
            MapEntryStatus::Corrupted {
                message: format!("{err:#}"),
            },
        ),
    };
    Some(MapEntry {
        slug,
        name,
        path,
        modified,
        status,
    })
}

/// Human-friendly age of a file, e.g. `5m ago`.
pub fn format_modified(modified: SystemTime) -> String {
    SystemTime::now()
        .duration_since(modified)
        .map_or_else(|_| "in the future".to_string(), format_age)
}

fn format_age(age: Duration) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = MINUTE * 60;
    const DAY: u64 = HOUR * 24;

    let secs = age.as_secs();
    match secs {
        0..30 => "just now".to_string(),
        30..MINUTE => format!("{secs}s ago"),
        MINUTE..HOUR => format!("{}m ago", secs / MINUTE),
        HOUR..DAY => format!("{}h ago", secs / HOUR),
        _ => format!("{}d ago", secs / DAY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstep_data::{Position, Tile};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;

    fn playable(goal: (i32, i32)) -> Grid {
        let mut grid = Grid::default();
        grid.set(Position::new(goal.0, goal.1), Tile::Goal);
        grid.set(Position::new(1, 1), Tile::Wall);
        grid
    }

    #[test]
    fn save_then_load() -> Result<()> {
        let dir = tempdir()?;
        let library = MapLibrary::for_profile(dir.path(), "Ada Lovelace");
        assert!(library.dir().ends_with("ada-lovelace"));

        let path = library.save("Zig Zag", &playable((3, 7)))?;
        assert!(path.ends_with("zig-zag.ron"));
        assert_eq!(library.load("zig zag")?, playable((3, 7)));
        Ok(())
    }

    #[test]
    fn unplayable_maps_are_not_saved() -> Result<()> {
        let dir = tempdir()?;
        let library = MapLibrary::new(dir.path());
        assert!(library.save("empty", &Grid::default()).is_err());
        assert!(library.list()?.is_empty());
        Ok(())
    }

    #[test]
    fn missing_directory_lists_nothing() -> Result<()> {
        let dir = tempdir()?;
        let library = MapLibrary::new(dir.path().join("nowhere"));
        assert!(library.list()?.is_empty());
        assert_eq!(library.first()?, None);
        Ok(())
    }

    #[test]
    fn listing_reports_status_and_first_skips_bad_files() -> Result<()> {
        let dir = tempdir()?;
        let library = MapLibrary::new(dir.path());
        library.save("beta", &playable((5, 5)))?;
        fs::write(dir.path().join("alpha.ron"), "not ron at all")?;
        let no_goal = MapFile {
            name: "Aardvark".into(),
            version: String::new(),
            grid: Grid::default(),
        };
        fs::write(dir.path().join("aardvark.ron"), ron::to_string(&no_goal)?)?;
        fs::write(dir.path().join("notes.txt"), "ignored")?;

        let entries = library.list()?;
        let slugs: Vec<_> = entries.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["aardvark", "alpha", "beta"]);
        assert!(matches!(entries[0].status, MapEntryStatus::Invalid { .. }));
        assert!(matches!(entries[1].status, MapEntryStatus::Corrupted { .. }));
        assert_eq!(entries[2].status, MapEntryStatus::Ready);
        assert_eq!(entries[2].name.as_deref(), Some("beta"));

        assert_eq!(library.first()?, Some(playable((5, 5))));
        Ok(())
    }

    #[test]
    fn remove_reports_whether_anything_was_deleted() -> Result<()> {
        let dir = tempdir()?;
        let library = MapLibrary::new(dir.path());
        library.save("gone", &playable((2, 2)))?;
        assert!(library.remove("gone")?);
        assert!(!library.remove("gone")?);
        Ok(())
    }

    #[test]
    fn first_or_generate_prefers_saved_maps() -> Result<()> {
        let dir = tempdir()?;
        let library = MapLibrary::new(dir.path());
        let mut rng = StdRng::seed_from_u64(11);

        let generated = first_or_generate(Some(&library), MapLayout::default(), &mut rng)?;
        assert!(generated.validate().is_ok());

        library.save("saved", &playable((8, 1)))?;
        let chosen = first_or_generate(Some(&library), MapLayout::default(), &mut rng)?;
        assert_eq!(chosen, playable((8, 1)));
        Ok(())
    }

    #[test]
    fn ages_are_bucketed() {
        assert_eq!(format_age(Duration::from_secs(5)), "just now");
        assert_eq!(format_age(Duration::from_secs(45)), "45s ago");
        assert_eq!(format_age(Duration::from_secs(600)), "10m ago");
        assert_eq!(format_age(Duration::from_secs(7200)), "2h ago");
        assert_eq!(format_age(Duration::from_secs(3 * 86_400)), "3d ago");
    }
}
