mod document;
mod loader;
mod paths;
mod world;

use std::path::PathBuf;

use thiserror::Error;

pub use loader::{
    load_world_map, parse_transition_name, try_load_world_map, TransitionNameError,
    TransitionTarget,
};
pub use world::{
    unload_world_map, MapTransition, ResolvedTile, TileCollision, TileLayer, Tileset, WorldMap,
};

#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}
