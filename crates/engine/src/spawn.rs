use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::assets::ImageLoader;
use crate::config::{AssetLayout, WorldConfig};
use crate::entity::{Entity, EntityRegistry, RegistryError, SheetLayout, Species};
use crate::geometry::Vec2;

pub const DEFAULT_CREATURE_SHEET: &str = "Sprites/creatures.png";

#[derive(Debug, Error)]
pub enum SpawnTableError {
    #[error("failed to read spawn table {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse spawn table {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpawnEntry {
    pub species: Species,
    pub x: f32,
    pub y: f32,
}

impl SpawnEntry {
    pub fn new(species: Species, x: f32, y: f32) -> Self {
        Self { species, x, y }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpawnTableDocument {
    #[serde(default)]
    sprite_sheet: Option<PathBuf>,
    #[serde(default)]
    sheet_rows: Option<u32>,
    #[serde(default)]
    sheet_columns: Option<u32>,
    maps: BTreeMap<String, Vec<SpawnEntry>>,
}

/// Creatures placed when a map becomes active, keyed by exact map name.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnTable {
    maps: BTreeMap<String, Vec<SpawnEntry>>,
    sprite_sheet: PathBuf,
    sheet_layout: SheetLayout,
}

impl Default for SpawnTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SpawnTable {
    pub fn builtin() -> Self {
        let mut maps = BTreeMap::new();
        maps.insert(
            "field".to_string(),
            vec![
                SpawnEntry::new(Species::Slime, 300.0, 300.0),
                SpawnEntry::new(Species::Bat, 400.0, 400.0),
            ],
        );
        maps.insert(
            "cave".to_string(),
            vec![SpawnEntry::new(Species::Skeleton, 200.0, 200.0)],
        );
        Self {
            maps,
            sprite_sheet: PathBuf::from(DEFAULT_CREATURE_SHEET),
            sheet_layout: SheetLayout::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, SpawnTableError> {
        let raw = fs::read_to_string(path).map_err(|source| SpawnTableError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }

    /// Parses a table document. `path` is only used in error messages.
    pub fn from_json_str(raw: &str, path: &Path) -> Result<Self, SpawnTableError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let document: SpawnTableDocument = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|error| {
                let json_path = error.path().to_string();
                SpawnTableError::Parse {
                    path: path.to_path_buf(),
                    json_path,
                    source: error.into_inner(),
                }
            })?;

        let defaults = SheetLayout::default();
        Ok(Self {
            maps: document.maps,
            sprite_sheet: document
                .sprite_sheet
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CREATURE_SHEET)),
            sheet_layout: SheetLayout {
                rows: document.sheet_rows.unwrap_or(defaults.rows),
                columns: document.sheet_columns.unwrap_or(defaults.columns),
            },
        })
    }

    /// Entries for `map_name`. Unknown names have no entries.
    pub fn entries_for(&self, map_name: &str) -> &[SpawnEntry] {
        self.maps.get(map_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn map_names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    pub fn sprite_sheet(&self) -> &Path {
        &self.sprite_sheet
    }

    /// Adds the creatures listed for `map_name` to `registry`. Missing sprite art
    /// falls back to default frame sizes; a full registry stops the population.
    /// Returns how many creatures were added.
    pub fn populate(
        &self,
        registry: &mut EntityRegistry,
        map_name: &str,
        config: &WorldConfig,
        layout: &AssetLayout,
        images: &mut dyn ImageLoader,
    ) -> usize {
        let entries = self.entries_for(map_name);
        if entries.is_empty() {
            debug!(map = map_name, "spawn_table_no_entries");
            return 0;
        }

        let sheet_path = layout.asset_path(&self.sprite_sheet);
        let mut spawned = 0;
        for entry in entries {
            let mut creature =
                Entity::creature(entry.species, entry.position(), config.creature_scale);
            match images.load_image(&sheet_path) {
                Ok(handle) => creature = creature.with_sprite(handle, self.sheet_layout),
                Err(error) => {
                    warn!(
                        path = %sheet_path.display(),
                        error = %error,
                        "creature_sprite_load_failed"
                    );
                }
            }

            match registry.add(creature) {
                Ok(_) => spawned += 1,
                Err(RegistryError::CapacityExceeded { capacity, rejected }) => {
                    warn!(
                        map = map_name,
                        capacity,
                        species = ?entry.species,
                        "spawn_rejected_registry_full"
                    );
                    (*rejected).release(images);
                    break;
                }
                Err(error) => {
                    warn!(map = map_name, error = %error, "spawn_failed");
                }
            }
        }
        spawned
    }
}
