use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::MapLoadError;

#[derive(Debug, Deserialize)]
pub(crate) struct MapDocument {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub tilesets: Vec<TilesetReference>,
    #[serde(default)]
    pub layers: Vec<LayerDocument>,
}

/// Either an external `source` reference or an embedded tileset body.
#[derive(Debug, Deserialize)]
pub(crate) struct TilesetReference {
    pub firstgid: u32,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(flatten)]
    pub embedded: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum LayerDocument {
    Tilelayer(TileLayerDocument),
    Objectgroup(ObjectGroupDocument),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TileLayerDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub data: Option<TileData>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TileData {
    Ids(Vec<u32>),
    Encoded(String),
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ObjectGroupDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObjectDocument {
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub polygon: Option<Vec<PointDocument>>,
    #[serde(default)]
    pub polyline: Option<Vec<PointDocument>>,
    #[serde(default)]
    pub ellipse: bool,
    #[serde(default)]
    pub point: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct PointDocument {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TilesetDocument {
    #[serde(default)]
    pub name: String,
    pub tilewidth: u32,
    pub tileheight: u32,
    pub tilecount: u32,
    #[serde(default)]
    pub columns: u32,
    pub imagewidth: u32,
    pub imageheight: u32,
    pub image: String,
    #[serde(default)]
    pub tiles: Vec<TileDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TileDocument {
    pub id: u32,
    #[serde(default)]
    pub objectgroup: Option<ObjectGroupDocument>,
}

pub(crate) fn parse_json_document<T: DeserializeOwned>(
    raw: &str,
    path: &Path,
) -> Result<T, MapLoadError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer)
        .map_err(|error| parse_error(path, error))
}

pub(crate) fn parse_embedded_tileset(
    embedded: &Map<String, Value>,
    path: &Path,
) -> Result<TilesetDocument, MapLoadError> {
    serde_path_to_error::deserialize::<_, TilesetDocument>(Value::Object(embedded.clone()))
        .map_err(|error| parse_error(path, error))
}

fn parse_error(path: &Path, error: serde_path_to_error::Error<serde_json::Error>) -> MapLoadError {
    let json_path = error.path().to_string();
    MapLoadError::Parse {
        path: path.to_path_buf(),
        json_path,
        source: error.into_inner(),
    }
}
