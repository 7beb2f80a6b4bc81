use std::path::{Path, PathBuf};

pub const BASE_TILE_SIZE: u32 = 16;
pub const PIXEL_SCALE: f32 = 2.0;
pub const DEFAULT_REGISTRY_CAPACITY: usize = 100;
pub const COLLISION_LAYER_NAME: &str = "Collision";
pub const TRANSITION_LAYER_NAME: &str = "MapTransition";

#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Source pixels per tile edge. Fixed per game, never read from map files.
    pub tile_size: u32,
    /// Document pixels to world pixels.
    pub pixel_scale: f32,
    pub registry_capacity: usize,
    pub creature_scale: f32,
    pub rng_seed: Option<u64>,
    pub collision_layer_name: String,
    pub transition_layer_name: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_size: BASE_TILE_SIZE,
            pixel_scale: PIXEL_SCALE,
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
            creature_scale: PIXEL_SCALE,
            rng_seed: None,
            collision_layer_name: COLLISION_LAYER_NAME.to_string(),
            transition_layer_name: TRANSITION_LAYER_NAME.to_string(),
        }
    }
}

impl WorldConfig {
    /// Edge length of one tile in world pixels.
    pub fn world_tile_px(&self) -> f32 {
        self.tile_size as f32 * self.pixel_scale
    }
}

/// Where map, tileset and sprite files live under the asset root.
#[derive(Debug, Clone)]
pub struct AssetLayout {
    pub root: PathBuf,
    pub maps_dir: PathBuf,
    pub tilesets_dir: PathBuf,
    pub map_extension: String,
    pub tileset_extension: String,
}

impl AssetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            maps_dir: Path::new("Tiled").join("Tiledmaps"),
            tilesets_dir: Path::new("Tiled").join("Tilesets"),
            map_extension: "tmj".to_string(),
            tileset_extension: "tsj".to_string(),
        }
    }

    pub fn map_path(&self, map_name: &str) -> PathBuf {
        self.root
            .join(&self.maps_dir)
            .join(format!("{map_name}.{}", self.map_extension))
    }

    pub fn tilesets_path(&self) -> PathBuf {
        self.root.join(&self.tilesets_dir)
    }

    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}
