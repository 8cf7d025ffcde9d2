use std::path::PathBuf;
use std::{error, fmt, io};

use serde_json::Error as SerdeError;

/// Errors raised while building levels, sprites, fonts or configuration.
///
/// Loading is all-or-nothing: any of these aborts the whole load.
#[derive(Debug)]
pub enum MapError {
    /// Reading a file failed.
    Io { path: PathBuf, source: io::Error },
    /// A JSON description could not be parsed.
    Json { path: PathBuf, source: SerdeError },
    /// An image could not be decoded.
    Image { path: PathBuf, message: String },
    /// Structurally invalid map (zero sizes, wrong file kind, ...).
    InvalidMap(String),
    /// A layer's data length does not match `width * height`.
    InvalidLayerSize { layer: String, expected: usize, actual: usize },
    /// A layer references a tile id that no tileset provides.
    InvalidTileGid { layer: String, gid: u32, max_gid: u32 },
    /// Property with a `type` the loader does not understand.
    UnsupportedPropertyType { name: String, kind: String },
    /// Declared image geometry differs from the decoded image.
    GeometryMismatch {
        path: PathBuf,
        expected: (i32, i32),
        actual: (i32, i32),
    },
    /// Goal floor tiles and goal blocks differ in number.
    GoalMismatch { floors: usize, blocks: usize },
    /// A movable sprite is larger than one tile.
    OversizedSprite { what: String, size: (i32, i32), tile: (i32, i32) },
    /// Configuration values that cannot work with this map.
    InvalidConfig(String),
    /// Sprite variant tables that cannot be built.
    Surface(RenderError),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io { path, source } => write!(f, "I/O error reading {}: {}", path.display(), source),
            MapError::Json { path, source } => write!(f, "Failed to parse JSON {}: {}", path.display(), source),
            MapError::Image { path, message } => write!(f, "Failed to decode image {}: {}", path.display(), message),
            MapError::InvalidMap(msg) => write!(f, "Invalid map: {}", msg),
            MapError::InvalidLayerSize { layer, expected, actual } => write!(
                f,
                "Invalid layer size for layer '{}': expected {} tiles, found {}",
                layer, expected, actual
            ),
            MapError::InvalidTileGid { layer, gid, max_gid } => write!(
                f,
                "Layer '{}' references tile id {} but tilesets only cover 1..={}",
                layer, gid, max_gid
            ),
            MapError::UnsupportedPropertyType { name, kind } => {
                write!(f, "Property '{}' has unsupported type '{}'", name, kind)
            }
            MapError::GeometryMismatch { path, expected, actual } => write!(
                f,
                "Geometry of {} does not match its description: declared {}x{}, image is {}x{}",
                path.display(),
                expected.0,
                expected.1,
                actual.0,
                actual.1
            ),
            MapError::GoalMismatch { floors, blocks } => write!(
                f,
                "Level has {} goal tiles but {} goal blocks",
                floors, blocks
            ),
            MapError::OversizedSprite { what, size, tile } => write!(
                f,
                "{} is {}x{} but must fit in one {}x{} tile",
                what, size.0, size.1, tile.0, tile.1
            ),
            MapError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            MapError::Surface(err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for MapError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MapError::Io { source, .. } => Some(source),
            MapError::Json { source, .. } => Some(source),
            MapError::Surface(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RenderError> for MapError {
    fn from(err: RenderError) -> Self {
        MapError::Surface(err)
    }
}

/// Lookups at render/update time that can be asked for something absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No variant registered under this id/index.
    UnknownVariant { id: String, index: usize },
    /// A variant table needs at least one entry.
    NoVariants,
    /// The font has no glyph for this character.
    MissingGlyph(char),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UnknownVariant { id, index } => {
                write!(f, "Surface has no variant '{}' at index {}", id, index)
            }
            RenderError::NoVariants => write!(f, "Sprite has no variants"),
            RenderError::MissingGlyph(c) => write!(f, "Character {:?} not found in font", c),
        }
    }
}

impl error::Error for RenderError {}
