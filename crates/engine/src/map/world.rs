use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::assets::{ImageHandle, ImageLoader};
use crate::geometry::{Polygon, Rect, Vec2};

/// Collision shapes authored on a single tile inside its tileset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileCollision {
    pub polygons: Vec<Polygon>,
}

#[derive(Debug, Default)]
pub struct Tileset {
    pub(crate) name: String,
    pub(crate) first_gid: u32,
    pub(crate) source: PathBuf,
    pub(crate) image_path: PathBuf,
    pub(crate) image: Option<ImageHandle>,
    pub(crate) tile_width: u32,
    pub(crate) tile_height: u32,
    pub(crate) tile_count: u32,
    pub(crate) columns: u32,
    pub(crate) image_width: u32,
    pub(crate) image_height: u32,
    pub(crate) collisions: HashMap<u32, TileCollision>,
}

impl Tileset {
    /// Zero-valued stand-in for a tileset that failed to load. Keeps its id range
    /// so later tilesets still resolve, but never yields a drawable tile.
    pub(crate) fn placeholder(first_gid: u32, source: PathBuf) -> Self {
        Self {
            first_gid,
            source,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn first_gid(&self) -> u32 {
        self.first_gid
    }

    pub fn source(&self) -> &std::path::Path {
        &self.source
    }

    pub fn image_path(&self) -> &std::path::Path {
        &self.image_path
    }

    pub fn image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    pub fn image_size(&self) -> (u32, u32) {
        match &self.image {
            Some(handle) => (handle.width(), handle.height()),
            None => (self.image_width, self.image_height),
        }
    }

    pub fn columns(&self) -> u32 {
        if self.columns > 0 {
            return self.columns;
        }
        if self.tile_width == 0 {
            return 0;
        }
        self.image_size().0 / self.tile_width
    }

    pub fn tile_collision(&self, local_id: u32) -> Option<&TileCollision> {
        self.collisions.get(&local_id)
    }

    pub fn is_placeholder(&self) -> bool {
        self.tile_width == 0 || self.tile_height == 0
    }

    fn release(self, images: &mut dyn ImageLoader) {
        if let Some(handle) = self.image {
            images.unload_image(handle);
        }
    }
}

/// Row-major tile grid. `-1` is an empty cell, anything else a zero-based id.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub(crate) name: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) tiles: Vec<i32>,
}

impl TileLayer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tiles(&self) -> &[i32] {
        &self.tiles
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<i32> {
        self.index_of(x, y)
            .and_then(|index| self.tiles.get(index).copied())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapTransition {
    pub target_map: String,
    /// World pixels in the target map.
    pub spawn_position: Vec2,
    /// Document pixels in the current map.
    pub trigger_area: Polygon,
}

/// Where a tile's art lives: which tileset, which cell, and its pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTile {
    pub tileset_index: usize,
    pub local_id: u32,
    pub source_rect: Rect,
}

#[derive(Debug, Default)]
pub struct WorldMap {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) tile_size: u32,
    pub(crate) tilesets: Vec<Tileset>,
    pub(crate) tile_layers: Vec<TileLayer>,
    pub(crate) collision_layer: Vec<Polygon>,
    pub(crate) transitions: Vec<MapTransition>,
}

impl WorldMap {
    /// The value a failed load produces.
    pub fn empty(tile_size: u32) -> Self {
        Self {
            tile_size,
            ..Self::default()
        }
    }

    /// An empty map means the load failed; there is nothing to render or collide with.
    pub fn is_empty(&self) -> bool {
        self.tile_layers.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    pub fn tile_layers(&self) -> &[TileLayer] {
        &self.tile_layers
    }

    pub fn tile_layer_count(&self) -> usize {
        self.tile_layers.len()
    }

    pub fn collision_layer(&self) -> &[Polygon] {
        &self.collision_layer
    }

    pub fn transitions(&self) -> &[MapTransition] {
        &self.transitions
    }

    /// Index of the tileset with the greatest first gid not exceeding `internal_id + 1`.
    pub fn tileset_index_for(&self, internal_id: i32) -> Option<usize> {
        if internal_id < 0 {
            return None;
        }
        let gid = internal_id as u32 + 1;
        let mut found = None;
        for (index, tileset) in self.tilesets.iter().enumerate() {
            if tileset.first_gid > gid {
                break;
            }
            found = Some(index);
        }
        found
    }

    pub fn resolve_tile(&self, internal_id: i32) -> Option<ResolvedTile> {
        let tileset_index = self.tileset_index_for(internal_id)?;
        let tileset = &self.tilesets[tileset_index];
        let columns = tileset.columns();
        if tileset.is_placeholder() || columns == 0 {
            return None;
        }
        let local_id = internal_id as u32 + 1 - tileset.first_gid;
        if local_id >= tileset.tile_count {
            return None;
        }
        let source_x = (local_id % columns).checked_mul(tileset.tile_width)?;
        let source_y = (local_id / columns).checked_mul(tileset.tile_height)?;
        let source_rect = Rect::new(
            source_x as f32,
            source_y as f32,
            tileset.tile_width as f32,
            tileset.tile_height as f32,
        );
        Some(ResolvedTile {
            tileset_index,
            local_id,
            source_rect,
        })
    }

    /// World-pixel rectangle covered by grid cell `(x, y)`.
    pub fn tile_dest_rect(&self, x: u32, y: u32, scale: f32) -> Rect {
        let edge = self.tile_size as f32 * scale;
        Rect::new(x as f32 * edge, y as f32 * edge, edge, edge)
    }

    /// Releases every tileset image. Polygon, grid and name storage is dropped with `self`.
    pub fn unload(self, images: &mut dyn ImageLoader) {
        let tileset_count = self.tilesets.len();
        for tileset in self.tilesets {
            tileset.release(images);
        }
        debug!(tileset_count, "world_map_unloaded");
    }
}

pub fn unload_world_map(map: WorldMap, images: &mut dyn ImageLoader) {
    map.unload(images);
}
