// src/loader/json_loader.rs
use crate::error::MapError;
use crate::ir_map::*;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    width: usize,
    #[serde(default)]
    height: usize,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" expected here
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    source: String,
}

#[derive(Deserialize)]
struct JsonMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    layers: Vec<JsonLayer>,
    tilesets: Vec<JsonTilesetRef>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct ExternalTileset {
    tilewidth: u32,
    tileheight: u32,
    tilecount: u32,
    columns: u32,
    image: String,
    imagewidth: u32,
    imageheight: u32,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

/// Directory that relative paths inside `path` are resolved against.
pub(crate) fn base_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"))
}

/// Reads and parses one JSON description file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, MapError> {
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn json_property_to_ir(prop: JsonProperty) -> Result<(String, String), MapError> {
    let JsonProperty { name, kind, value } = prop;

    match kind.as_deref() {
        None | Some("bool") | Some("int") | Some("float") | Some("object") | Some("string")
        | Some("file") | Some("color") | Some("class") => {}
        Some(other) => {
            return Err(MapError::UnsupportedPropertyType {
                name,
                kind: other.to_owned(),
            });
        }
    }

    let text = match value {
        JsonValue::String(s) => s,
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    };
    Ok((name, text))
}

fn properties_from_json(props: Vec<JsonProperty>) -> Result<Attributes, MapError> {
    let mut out = Attributes::new();
    for p in props {
        let (name, value) = json_property_to_ir(p)?;
        out.insert(name, value);
    }
    Ok(out)
}

/// Decodes a Tiled JSON map and its external tilesets.
///
/// Returns the IR and the directory image paths are relative to.
pub fn decode_map_file_to_ir(path: &Path) -> Result<(IrMap, PathBuf), MapError> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::InvalidMap(format!(
            "Map file must be a JSON file: {}",
            path.display()
        )));
    }

    let j: JsonMap = read_json(path)?;
    let map_dir = base_dir(path);

    // Build IR tilesets
    let mut ir_tilesets = Vec::with_capacity(j.tilesets.len());
    for ts in &j.tilesets {
        if !ts.source.ends_with(".json") {
            return Err(MapError::InvalidMap(format!(
                "External tileset must be JSON: {}",
                ts.source
            )));
        }
        let ts_path = map_dir.join(&ts.source);
        let ext: ExternalTileset = read_json(&ts_path)?;
        debug!("Decoded tileset {} (first gid {})", ts_path.display(), ts.firstgid);

        // Image stays relative to the tileset file's directory, expressed from map_dir.
        let image = match Path::new(&ts.source).parent() {
            Some(p) if !p.as_os_str().is_empty() => p.join(&ext.image).to_string_lossy().into_owned(),
            _ => ext.image,
        };

        ir_tilesets.push(IrTileset {
            first_gid: ts.firstgid,
            image,
            image_w: ext.imagewidth,
            image_h: ext.imageheight,
            tile_w: ext.tilewidth,
            tile_h: ext.tileheight,
            tilecount: ext.tilecount,
            columns: ext.columns,
            spacing: ext.spacing,
            margin: ext.margin,
            properties: properties_from_json(ext.properties)?,
            tiles: ext
                .tiles
                .into_iter()
                .map(|tile| -> Result<IrTileMetadata, MapError> {
                    Ok(IrTileMetadata {
                        id: tile.id,
                        properties: properties_from_json(tile.properties)?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        });
    }

    // Sort by first_gid to make LUT building trivial
    ir_tilesets.sort_by_key(|t| t.first_gid);

    let max_gid = ir_tilesets.iter().map(IrTileset::last_gid).max().unwrap_or(0);

    // Build IR layers
    let mut ir_layers = Vec::with_capacity(j.layers.len());
    for l in j.layers {
        let properties = properties_from_json(l.properties)?;
        let layer_kind = match l.kind.as_deref().unwrap_or("tilelayer") {
            "tilelayer" => {
                for &raw_gid in &l.data {
                    let gid = raw_gid & GID_MASK;
                    if gid != 0 && gid > max_gid {
                        return Err(MapError::InvalidTileGid {
                            layer: l.name.clone(),
                            gid,
                            max_gid,
                        });
                    }
                }
                IrLayerKind::Tiles {
                    width: l.width,
                    height: l.height,
                    data: l.data,
                }
            }
            other => IrLayerKind::Unsupported(other.to_owned()),
        };
        ir_layers.push(IrLayer {
            name: l.name,
            visible: l.visible,
            properties,
            kind: layer_kind,
        });
    }

    Ok((
        IrMap {
            width: j.width,
            height: j.height,
            tile_w: j.tilewidth,
            tile_h: j.tileheight,
            properties: properties_from_json(j.properties)?,
            tilesets: ir_tilesets,
            layers: ir_layers,
        },
        map_dir,
    ))
}
