use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod assets;
pub mod collision;
pub mod config;
pub mod entity;
pub mod geometry;
pub mod map;
pub mod map_names;
pub mod session;
pub mod spawn;

pub use assets::{DiskImageLoader, ImageHandle, ImageLoadError, ImageLoader};
pub use collision::{
    actors_overlap, entity_collision_rect, move_with_world_collision, world_blocks, AxisBlocked,
};
pub use config::{AssetLayout, WorldConfig, BASE_TILE_SIZE, PIXEL_SCALE};
pub use entity::{
    AttackKind, AvatarIntent, Entity, EntityId, EntityKind, EntityRegistry, RegistryError,
    SimulationMode, Species, SweepReport,
};
pub use geometry::{
    point_in_polygon, rect_corners_in_polygon, rect_intersects_polygon, rect_intersects_rect,
    segments_intersect, Polygon, Rect, Vec2,
};
pub use map::{
    load_world_map, try_load_world_map, unload_world_map, MapLoadError, MapTransition,
    TileLayer, Tileset, WorldMap,
};
pub use map_names::{validate_map_name, MapNameError};
pub use session::{
    AppliedTransition, MapSession, SessionError, TickReport, TransitionOutcome, TransitionState,
};
pub use spawn::{SpawnEntry, SpawnTable, SpawnTableError};

pub const ASSET_ROOT_ENV_VAR: &str = "FIELDWALK_ASSET_ROOT";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error(
        "FIELDWALK_ASSET_ROOT is set but does not point to an asset root: {path}\n\
A valid root contains a Tiled/ directory."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not find an asset root by walking upward from: {start_dir}\n\
Expected a directory containing Tiled/.\n\
Set {env_var} explicitly, for example:\n\
export {env_var}=\"/path/to/game/assets\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Asset layout rooted at `FIELDWALK_ASSET_ROOT`, or at the nearest ancestor of
/// the current directory that contains `Tiled/`.
pub fn resolve_asset_layout() -> Result<AssetLayout, StartupError> {
    resolve_root().map(AssetLayout::new)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ASSET_ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_asset_root(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let start_dir = env::current_dir().map_err(StartupError::CurrentDir)?;
            find_asset_root(&start_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&start_dir),
                env_var: ASSET_ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ASSET_ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_asset_root(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .find(|candidate| is_asset_root(candidate))
        .map(normalize_path)
}

fn is_asset_root(path: &Path) -> bool {
    path.join("Tiled").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn asset_root_requires_tiled_dir() {
        let temp = TempDir::new().expect("tempdir");
        assert!(!is_asset_root(temp.path()));
        fs::create_dir_all(temp.path().join("Tiled")).expect("mkdir");
        assert!(is_asset_root(temp.path()));
    }

    #[test]
    fn asset_root_is_found_from_nested_dir() {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir_all(temp.path().join("Tiled").join("Tiledmaps")).expect("mkdir");
        let nested = temp.path().join("build").join("debug");
        fs::create_dir_all(&nested).expect("mkdir");

        let found = find_asset_root(&nested).expect("root");
        assert_eq!(found, normalize_path(temp.path()));
    }
}
