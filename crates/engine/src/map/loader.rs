use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assets::ImageLoader;
use crate::config::{AssetLayout, WorldConfig};
use crate::geometry::{Polygon, Vec2};
use crate::map_names::{validate_map_name, MapNameError};

use super::document::{
    parse_embedded_tileset, parse_json_document, LayerDocument, MapDocument, ObjectDocument,
    ObjectGroupDocument, PointDocument, TileData, TileLayerDocument, TilesetDocument,
    TilesetReference,
};
use super::paths::{resolve_relative, tileset_document_path};
use super::world::{MapTransition, TileCollision, TileLayer, Tileset, WorldMap};
use super::MapLoadError;

/// Tiled stores horizontal, vertical and diagonal flip flags in the top three bits.
const GID_FLIP_FLAGS_MASK: u32 = 0xE000_0000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionNameError {
    #[error("expected '<map>:<tileX>,<tileY>'")]
    MissingSeparator,
    #[error("tile coordinates are not numbers")]
    InvalidCoordinates,
    #[error(transparent)]
    InvalidMapName(#[from] MapNameError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTarget {
    pub map_name: String,
    pub tile_x: f32,
    pub tile_y: f32,
}

/// Parses a transition object name of the form `<targetMap>:<tileX>,<tileY>`.
/// Tile coordinates may be fractional.
pub fn parse_transition_name(name: &str) -> Result<TransitionTarget, TransitionNameError> {
    let (map_name, coordinates) = name
        .split_once(':')
        .ok_or(TransitionNameError::MissingSeparator)?;
    let (raw_x, raw_y) = coordinates
        .split_once(',')
        .ok_or(TransitionNameError::MissingSeparator)?;
    validate_map_name(map_name)?;
    let tile_x = raw_x
        .trim()
        .parse::<f32>()
        .map_err(|_| TransitionNameError::InvalidCoordinates)?;
    let tile_y = raw_y
        .trim()
        .parse::<f32>()
        .map_err(|_| TransitionNameError::InvalidCoordinates)?;
    if !tile_x.is_finite() || !tile_y.is_finite() {
        return Err(TransitionNameError::InvalidCoordinates);
    }
    Ok(TransitionTarget {
        map_name: map_name.to_string(),
        tile_x,
        tile_y,
    })
}

/// Loads a map and logs instead of failing. A failed load yields [`WorldMap::empty`].
pub fn load_world_map(
    path: &Path,
    config: &WorldConfig,
    layout: &AssetLayout,
    images: &mut dyn ImageLoader,
) -> WorldMap {
    match try_load_world_map(path, config, layout, images) {
        Ok(map) => map,
        Err(error) => {
            warn!(path = %path.display(), error = %error, "world_map_load_failed");
            WorldMap::empty(config.tile_size)
        }
    }
}

pub fn try_load_world_map(
    path: &Path,
    config: &WorldConfig,
    layout: &AssetLayout,
    images: &mut dyn ImageLoader,
) -> Result<WorldMap, MapLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| MapLoadError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let document: MapDocument = parse_json_document(&raw, path)?;
    let map_dir = path.parent().unwrap_or_else(|| Path::new(""));

    let tilesets = load_tilesets(&document.tilesets, path, map_dir, layout, images);

    let counts = count_layers(&document.layers, config);
    let mut tile_layers = Vec::with_capacity(counts.tile_layers);
    let mut collision_layer = Vec::with_capacity(counts.collision_objects);
    let mut transitions = Vec::with_capacity(counts.transition_objects);

    for layer in &document.layers {
        match layer {
            LayerDocument::Tilelayer(layer) => {
                if let Some(tile_layer) = build_tile_layer(layer, &document, path) {
                    tile_layers.push(tile_layer);
                }
            }
            LayerDocument::Objectgroup(group) if group.name == config.collision_layer_name => {
                collision_layer.extend(group.objects.iter().map(object_polygon));
            }
            LayerDocument::Objectgroup(group) if group.name == config.transition_layer_name => {
                transitions.extend(build_transitions(group, config, path));
            }
            LayerDocument::Objectgroup(_) | LayerDocument::Unsupported => {}
        }
    }

    info!(
        path = %path.display(),
        width = document.width,
        height = document.height,
        tileset_count = tilesets.len(),
        tile_layer_count = tile_layers.len(),
        collision_polygon_count = collision_layer.len(),
        transition_count = transitions.len(),
        "world_map_loaded"
    );

    Ok(WorldMap {
        width: document.width,
        height: document.height,
        tile_size: config.tile_size,
        tilesets,
        tile_layers,
        collision_layer,
        transitions,
    })
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LayerCounts {
    tile_layers: usize,
    collision_objects: usize,
    transition_objects: usize,
}

fn count_layers(layers: &[LayerDocument], config: &WorldConfig) -> LayerCounts {
    let mut counts = LayerCounts::default();
    for layer in layers {
        match layer {
            LayerDocument::Tilelayer(layer) => {
                if matches!(layer.data, Some(TileData::Ids(_))) {
                    counts.tile_layers += 1;
                }
            }
            LayerDocument::Objectgroup(group) if group.name == config.collision_layer_name => {
                counts.collision_objects += group.objects.len();
            }
            LayerDocument::Objectgroup(group) if group.name == config.transition_layer_name => {
                counts.transition_objects += group.objects.len();
            }
            LayerDocument::Objectgroup(_) | LayerDocument::Unsupported => {}
        }
    }
    counts
}

fn load_tilesets(
    references: &[TilesetReference],
    map_path: &Path,
    map_dir: &Path,
    layout: &AssetLayout,
    images: &mut dyn ImageLoader,
) -> Vec<Tileset> {
    let mut tilesets = Vec::with_capacity(references.len());
    for reference in references {
        tilesets.push(load_tileset(reference, map_path, map_dir, layout, images));
    }

    let ordered = tilesets
        .windows(2)
        .all(|pair| pair[0].first_gid < pair[1].first_gid);
    if !ordered {
        warn!(path = %map_path.display(), "tileset_first_gids_not_increasing_sorting");
        tilesets.sort_by_key(|tileset| tileset.first_gid);
    }
    tilesets
}

fn load_tileset(
    reference: &TilesetReference,
    map_path: &Path,
    map_dir: &Path,
    layout: &AssetLayout,
    images: &mut dyn ImageLoader,
) -> Tileset {
    let (document_path, parsed) = match &reference.source {
        Some(source) => {
            let document_path = tileset_document_path(map_dir, source, layout);
            let parsed = fs::read_to_string(&document_path)
                .map_err(|source| MapLoadError::ReadFile {
                    path: document_path.clone(),
                    source,
                })
                .and_then(|raw| parse_json_document::<TilesetDocument>(&raw, &document_path));
            (document_path, parsed)
        }
        None => (
            map_path.to_path_buf(),
            parse_embedded_tileset(&reference.embedded, map_path),
        ),
    };

    let document = match parsed {
        Ok(document) => document,
        Err(error) => {
            warn!(
                first_gid = reference.firstgid,
                path = %document_path.display(),
                error = %error,
                "tileset_load_failed"
            );
            return Tileset::placeholder(reference.firstgid, document_path);
        }
    };

    let document_dir = document_path.parent().unwrap_or_else(|| Path::new(""));
    let image_path = resolve_relative(document_dir, &document.image);
    let image = match images.load_image(&image_path) {
        Ok(handle) => Some(handle),
        Err(error) => {
            warn!(
                first_gid = reference.firstgid,
                image = %image_path.display(),
                error = %error,
                "tileset_image_load_failed"
            );
            None
        }
    };

    let collisions = build_tile_collisions(&document, &document_path);
    debug!(
        name = %document.name,
        first_gid = reference.firstgid,
        tile_count = document.tilecount,
        collision_tile_count = collisions.len(),
        "tileset_loaded"
    );

    Tileset {
        name: document.name,
        first_gid: reference.firstgid,
        source: document_path,
        image_path,
        image,
        tile_width: document.tilewidth,
        tile_height: document.tileheight,
        tile_count: document.tilecount,
        columns: document.columns,
        image_width: document.imagewidth,
        image_height: document.imageheight,
        collisions,
    }
}

fn build_tile_collisions(
    document: &TilesetDocument,
    document_path: &Path,
) -> HashMap<u32, TileCollision> {
    let mut collisions = HashMap::new();
    for tile in &document.tiles {
        let Some(group) = &tile.objectgroup else {
            continue;
        };
        if tile.id >= document.tilecount {
            warn!(
                path = %document_path.display(),
                tile_id = tile.id,
                tile_count = document.tilecount,
                "tile_collision_id_out_of_range"
            );
            continue;
        }
        let polygons: Vec<Polygon> = group.objects.iter().map(object_polygon).collect();
        if !polygons.is_empty() {
            collisions.insert(tile.id, TileCollision { polygons });
        }
    }
    collisions
}

fn build_tile_layer(
    layer: &TileLayerDocument,
    document: &MapDocument,
    path: &Path,
) -> Option<TileLayer> {
    let ids = match &layer.data {
        Some(TileData::Ids(ids)) => ids,
        Some(TileData::Encoded(_)) => {
            warn!(path = %path.display(), layer = %layer.name, "tile_layer_encoded_data_unsupported");
            return None;
        }
        None => {
            warn!(path = %path.display(), layer = %layer.name, "tile_layer_missing_data");
            return None;
        }
    };

    let width = layer.width.unwrap_or(document.width);
    let height = layer.height.unwrap_or(document.height);
    let expected = width as usize * height as usize;
    if ids.len().saturating_mul(2) < expected {
        warn!(
            path = %path.display(),
            layer = %layer.name,
            expected,
            actual = ids.len(),
            "tile_layer_data_too_short"
        );
        return None;
    }
    if ids.len() != expected {
        warn!(
            path = %path.display(),
            layer = %layer.name,
            expected,
            actual = ids.len(),
            "tile_layer_size_mismatch"
        );
    }

    let mut tiles: Vec<i32> = ids.iter().take(expected).map(|&raw| internal_tile_id(raw)).collect();
    tiles.resize(expected, -1);

    Some(TileLayer {
        name: layer.name.clone(),
        width,
        height,
        tiles,
    })
}

/// Document ids are 1-based with 0 meaning empty; internal ids are 0-based with -1 empty.
pub(crate) fn internal_tile_id(raw_gid: u32) -> i32 {
    let gid = raw_gid & !GID_FLIP_FLAGS_MASK;
    if gid == 0 {
        -1
    } else {
        (gid - 1) as i32
    }
}

fn build_transitions(
    group: &ObjectGroupDocument,
    config: &WorldConfig,
    path: &Path,
) -> Vec<MapTransition> {
    let world_tile_px = config.world_tile_px();
    let mut transitions = Vec::with_capacity(group.objects.len());
    for object in &group.objects {
        let target = match parse_transition_name(&object.name) {
            Ok(target) => target,
            Err(error) => {
                debug!(
                    path = %path.display(),
                    name = %object.name,
                    reason = %error,
                    "transition_name_malformed_skipped"
                );
                continue;
            }
        };
        transitions.push(MapTransition {
            target_map: target.map_name,
            spawn_position: Vec2::new(target.tile_x * world_tile_px, target.tile_y * world_tile_px),
            trigger_area: object_polygon(object),
        });
    }
    transitions
}

/// Polygon (falling back to polyline, then to the object's rectangle) offset by the
/// object's position. Ellipses, points and shapeless objects come back empty.
fn object_polygon(object: &ObjectDocument) -> Polygon {
    let offset = |point: &PointDocument| Vec2::new(object.x + point.x, object.y + point.y);
    if let Some(points) = object.polygon.as_ref().or(object.polyline.as_ref()) {
        return Polygon::new(points.iter().map(offset).collect());
    }
    if object.ellipse || object.point || object.width <= 0.0 || object.height <= 0.0 {
        return Polygon::default();
    }
    Polygon::new(vec![
        Vec2::new(object.x, object.y),
        Vec2::new(object.x + object.width, object.y),
        Vec2::new(object.x + object.width, object.y + object.height),
        Vec2::new(object.x, object.y + object.height),
    ])
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::assets::testing::CountingImageLoader;
    use crate::map::unload_world_map;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    const GRASS_TILESET: &str = r#"{
        "name": "grass", "tilewidth": 16, "tileheight": 16, "tilecount": 16,
        "columns": 4, "imagewidth": 64, "imageheight": 64,
        "image": "../../Art/grass.png",
        "tiles": [
            {"id": 2, "objectgroup": {"objects": [
                {"x": 0, "y": 0, "polygon": [{"x":0,"y":0},{"x":16,"y":0},{"x":16,"y":8}]}
            ]}},
            {"id": 40, "objectgroup": {"objects": [{"x": 0, "y": 0, "width": 4, "height": 4}]}}
        ]
    }"#;

    const WATER_TILESET: &str = r#"{
        "name": "water", "tilewidth": 16, "tileheight": 16, "tilecount": 8,
        "imagewidth": 32, "imageheight": 64, "image": "../../Art/water.png"
    }"#;

    const FIELD_MAP: &str = r#"{
        "width": 3, "height": 2,
        "tilesets": [
            {"firstgid": 1, "source": "../Tilesets/Grass.tsx"},
            {"firstgid": 17, "source": "../Tilesets/Water.tsx"}
        ],
        "layers": [
            {"type": "tilelayer", "name": "ground", "data": [0, 5, 17, 18, 2147483649, 0]},
            {"type": "tilelayer", "name": "decor", "data": [0, 0, 0, 0, 0, 3]},
            {"type": "objectgroup", "name": "Collision", "objects": [
                {"x": 10, "y": 20, "polygon": [{"x":0,"y":0},{"x":8,"y":0},{"x":8,"y":8}]},
                {"x": 5, "y": 5, "polyline": [{"x":0,"y":0},{"x":0,"y":30}]},
                {"x": 40, "y": 0, "width": 16, "height": 8},
                {"x": 0, "y": 0, "point": true}
            ]},
            {"type": "objectgroup", "name": "MapTransition", "objects": [
                {"name": "cave:0,10", "x": 32, "y": 0,
                 "polygon": [{"x":0,"y":0},{"x":16,"y":0},{"x":16,"y":16},{"x":0,"y":16}]},
                {"name": "not a transition", "x": 0, "y": 0,
                 "polygon": [{"x":0,"y":0},{"x":1,"y":0},{"x":1,"y":1}]},
                {"name": "house:2.5,1", "x": 0, "y": 48, "width": 16, "height": 16}
            ]},
            {"type": "objectgroup", "name": "Props", "objects": [
                {"x": 1, "y": 1, "width": 2, "height": 2}
            ]}
        ]
    }"#;

    struct Fixture {
        _temp: TempDir,
        layout: AssetLayout,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().expect("tempdir");
        let layout = AssetLayout::new(temp.path());
        write(&layout.tilesets_path().join("Grass.tsj"), GRASS_TILESET);
        write(&layout.tilesets_path().join("Water.tsj"), WATER_TILESET);
        write(&layout.map_path("field"), FIELD_MAP);
        Fixture {
            _temp: temp,
            layout,
        }
    }

    fn load(fixture: &Fixture, name: &str, images: &mut CountingImageLoader) -> WorldMap {
        load_world_map(
            &fixture.layout.map_path(name),
            &WorldConfig::default(),
            &fixture.layout,
            images,
        )
    }

    #[test]
    fn tile_ids_convert_from_one_based_document_encoding() {
        assert_eq!(internal_tile_id(0), -1);
        assert_eq!(internal_tile_id(5), 4);
        assert_eq!(internal_tile_id(0x8000_0001), 0);
        assert_eq!(internal_tile_id(0xE000_0000), -1);
    }

    #[test]
    fn loads_layers_tilesets_collision_and_transitions() {
        let fixture = fixture();
        let mut images = CountingImageLoader::new(64, 64);
        let map = load(&fixture, "field", &mut images);

        assert!(!map.is_empty());
        assert_eq!((map.width(), map.height()), (3, 2));
        assert_eq!(map.tile_size(), 16);
        assert_eq!(map.tile_layer_count(), 2);
        assert_eq!(map.tile_layers()[0].name(), "ground");
        assert_eq!(map.tile_layers()[0].tiles(), &[-1, 4, 16, 17, 0, -1]);
        assert_eq!(map.tile_layers()[1].tiles(), &[-1, -1, -1, -1, -1, 2]);

        assert_eq!(map.tilesets().len(), 2);
        assert_eq!(map.tilesets()[0].first_gid(), 1);
        assert_eq!(map.tilesets()[1].first_gid(), 17);
        assert_eq!(map.tilesets()[1].columns(), 4);
        assert_eq!(
            map.tilesets()[0].image_path(),
            fixture.layout.root.join("Art").join("grass.png")
        );
        assert_eq!(images.loads.len(), 2);

        let collision = map.collision_layer();
        assert_eq!(collision.len(), 4);
        assert_eq!(collision[0].points()[1], Vec2::new(18.0, 20.0));
        assert_eq!(collision[1].len(), 2);
        assert_eq!(collision[2].points()[2], Vec2::new(56.0, 8.0));
        assert!(collision[3].is_degenerate());

        let transitions = map.transitions();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].target_map, "cave");
        assert_eq!(transitions[0].spawn_position, Vec2::new(0.0, 320.0));
        assert_eq!(transitions[0].trigger_area.points()[0], Vec2::new(32.0, 0.0));
        assert_eq!(transitions[1].target_map, "house");
        assert_eq!(transitions[1].spawn_position, Vec2::new(80.0, 32.0));
        assert_eq!(transitions[1].trigger_area.len(), 4);
    }

    #[test]
    fn document_tile_five_resolves_against_greatest_first_gid() {
        let fixture = fixture();
        let mut images = CountingImageLoader::new(64, 64);
        let map = load(&fixture, "field", &mut images);

        let internal = map.tile_layers()[0].tile_at(1, 0).expect("cell");
        assert_eq!(internal, 4);
        assert_eq!(map.tileset_index_for(internal), Some(0));
        assert_eq!(map.tileset_index_for(16), Some(1));
    }

    #[test]
    fn per_tile_collisions_are_indexed_by_local_id() {
        let fixture = fixture();
        let mut images = CountingImageLoader::new(64, 64);
        let map = load(&fixture, "field", &mut images);

        let grass = &map.tilesets()[0];
        assert_eq!(grass.tile_collision(2).map(|c| c.polygons.len()), Some(1));
        assert!(grass.tile_collision(40).is_none());
        assert!(grass.tile_collision(0).is_none());
    }

    #[test]
    fn load_then_unload_releases_every_image() {
        let fixture = fixture();
        let mut images = CountingImageLoader::new(64, 64);
        let map = load(&fixture, "field", &mut images);
        assert_eq!(images.live_count(), 2);

        unload_world_map(map, &mut images);
        assert_eq!(images.live_count(), 0);
        assert_eq!(images.unloads, 2);
    }

    #[test]
    fn missing_file_yields_empty_map() {
        let fixture = fixture();
        let mut images = CountingImageLoader::new(64, 64);
        let map = load(&fixture, "nowhere", &mut images);
        assert!(map.is_empty());
        assert_eq!(images.live_count(), 0);

        let err = try_load_world_map(
            &fixture.layout.map_path("nowhere"),
            &WorldConfig::default(),
            &fixture.layout,
            &mut images,
        )
        .expect_err("missing");
        assert!(matches!(err, MapLoadError::ReadFile { .. }));
    }

    #[test]
    fn malformed_json_yields_empty_map() {
        let fixture = fixture();
        write(&fixture.layout.map_path("broken"), "{ \"width\": 3, ");
        let mut images = CountingImageLoader::new(64, 64);
        let map = load(&fixture, "broken", &mut images);
        assert!(map.is_empty());
        assert_eq!(map.tile_size(), 16);
    }

    #[test]
    fn missing_tileset_becomes_placeholder_and_map_still_loads() {
        let fixture = fixture();
        write(
            &fixture.layout.map_path("sparse"),
            r#"{"width": 1, "height": 1,
                "tilesets": [{"firstgid": 1, "source": "../Tilesets/Gone.tsx"},
                             {"firstgid": 9, "source": "../Tilesets/Water.tsx"}],
                "layers": [{"type": "tilelayer", "name": "g", "data": [9]}]}"#,
        );
        let mut images = CountingImageLoader::new(32, 64);
        let map = load(&fixture, "sparse", &mut images);

        assert_eq!(map.tile_layer_count(), 1);
        assert!(map.tilesets()[0].is_placeholder());
        assert_eq!(map.tilesets()[0].first_gid(), 1);
        assert_eq!(map.resolve_tile(8).map(|tile| tile.tileset_index), Some(1));
        assert_eq!(images.loads.len(), 1);
    }

    #[test]
    fn missing_tileset_image_keeps_tileset_metadata() {
        let fixture = fixture();
        let mut images = CountingImageLoader::new(64, 64);
        images
            .missing
            .insert(fixture.layout.root.join("Art").join("water.png"));
        let map = load(&fixture, "field", &mut images);

        let water = &map.tilesets()[1];
        assert!(water.image().is_none());
        assert_eq!(water.image_size(), (32, 64));
        assert_eq!(water.columns(), 2);
        assert_eq!(images.live_count(), 1);
    }

    #[test]
    fn embedded_tileset_and_short_layer_are_handled() {
        let fixture = fixture();
        write(
            &fixture.layout.map_path("inline"),
            r#"{"width": 2, "height": 2,
                "tilesets": [{"firstgid": 1, "name": "inline", "tilewidth": 16, "tileheight": 16,
                              "tilecount": 4, "imagewidth": 32, "imageheight": 32,
                              "image": "../../Art/inline.png"}],
                "layers": [{"type": "tilelayer", "name": "g", "data": [1, 2, 3]},
                           {"type": "tilelayer", "name": "b64", "data": "AAAA"}]}"#,
        );
        let mut images = CountingImageLoader::new(32, 32);
        let map = load(&fixture, "inline", &mut images);

        assert_eq!(map.tile_layer_count(), 1);
        assert_eq!(map.tile_layers()[0].tiles(), &[0, 1, 2, -1]);
        assert_eq!(map.tilesets()[0].name(), "inline");
        assert_eq!(
            images.loads,
            vec![fixture.layout.root.join("Art").join("inline.png")]
        );
    }

    #[test]
    fn layer_with_far_too_little_data_is_dropped() {
        let fixture = fixture();
        write(
            &fixture.layout.map_path("huge"),
            r#"{"width": 100000, "height": 100000,
                "tilesets": [{"firstgid": 1, "source": "../Tilesets/Grass.tsx"}],
                "layers": [{"type": "tilelayer", "name": "g", "data": [1]},
                           {"type": "tilelayer", "name": "small", "width": 2, "height": 1,
                            "data": [1, 2]}]}"#,
        );
        let mut images = CountingImageLoader::new(64, 64);
        let map = load(&fixture, "huge", &mut images);

        assert_eq!(map.tile_layer_count(), 1);
        assert_eq!(map.tile_layers()[0].name(), "small");
    }

    #[test]
    fn out_of_order_tilesets_are_sorted() {
        let fixture = fixture();
        write(
            &fixture.layout.map_path("swapped"),
            r#"{"width": 1, "height": 1,
                "tilesets": [{"firstgid": 17, "source": "../Tilesets/Water.tsx"},
                             {"firstgid": 1, "source": "../Tilesets/Grass.tsx"}],
                "layers": [{"type": "tilelayer", "name": "g", "data": [1]}]}"#,
        );
        let mut images = CountingImageLoader::new(64, 64);
        let map = load(&fixture, "swapped", &mut images);
        let gids: Vec<u32> = map.tilesets().iter().map(Tileset::first_gid).collect();
        assert_eq!(gids, vec![1, 17]);
    }

    #[test]
    fn transition_names_parse_or_reject() {
        let target = parse_transition_name("targetMap:0,10").expect("valid");
        assert_eq!(target.map_name, "targetMap");
        assert_eq!((target.tile_x, target.tile_y), (0.0, 10.0));
        assert_eq!(parse_transition_name("cave: 1.5 , 2").expect("spaces").tile_x, 1.5);

        assert_eq!(
            parse_transition_name("door"),
            Err(TransitionNameError::MissingSeparator)
        );
        assert_eq!(
            parse_transition_name("cave:1"),
            Err(TransitionNameError::MissingSeparator)
        );
        assert_eq!(
            parse_transition_name("cave:x,2"),
            Err(TransitionNameError::InvalidCoordinates)
        );
        assert!(matches!(
            parse_transition_name(":1,2"),
            Err(TransitionNameError::InvalidMapName(MapNameError::Empty))
        ));
        assert!(matches!(
            parse_transition_name("../secret:1,2"),
            Err(TransitionNameError::InvalidMapName(_))
        ));
    }
}
