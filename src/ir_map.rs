// src/ir_map.rs
use std::collections::btree_map::{self, BTreeMap};

/// Strips Tiled's flip flags (bits 29..31) from a raw tile id.
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// String key/value metadata attached to tiles, layers and maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key`, or `default` when the attribute is absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// True iff the attribute is present and equal to `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key)?.parse().ok()
    }

    /// Copies every entry of `other` in, replacing existing keys.
    pub fn override_with(&mut self, other: &Attributes) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.values.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Canonical, format-agnostic map.
#[derive(Debug, Clone)]
pub struct IrMap {
    pub width: u32,
    pub height: u32,
    pub tile_w: u32,
    pub tile_h: u32,
    pub properties: Attributes,
    pub tilesets: Vec<IrTileset>, // must be sorted by first_gid
    pub layers: Vec<IrLayer>,     // draw order: array order
}

/// One image atlas with a regular grid.
#[derive(Debug, Clone)]
pub struct IrTileset {
    pub first_gid: u32,
    pub image: String,
    pub image_w: u32,
    pub image_h: u32,
    pub tile_w: u32,
    pub tile_h: u32,
    pub tilecount: u32,
    pub columns: u32,
    pub spacing: u32, // 0 if not used
    pub margin: u32,  // 0 if not used
    pub properties: Attributes,
    pub tiles: Vec<IrTileMetadata>,
}

impl IrTileset {
    pub fn last_gid(&self) -> u32 {
        self.first_gid + self.tilecount.saturating_sub(1)
    }
}

#[derive(Debug, Clone)]
pub struct IrTileMetadata {
    pub id: u32,
    pub properties: Attributes,
}

#[derive(Debug, Clone)]
pub enum IrLayerKind {
    Tiles {
        width: usize,
        height: usize,
        data: Vec<u32>, // raw GIDs (flip flags allowed)
    },
    Unsupported(String),
}

#[derive(Debug, Clone)]
pub struct IrLayer {
    pub name: String,
    pub visible: bool,
    pub properties: Attributes,
    pub kind: IrLayerKind,
}
