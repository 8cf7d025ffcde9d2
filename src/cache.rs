//! Image and sprite loading with a path-keyed cache of decoded pixels.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;
use macroquad::texture::Image;
use serde::Deserialize;

use crate::error::MapError;
use crate::loader::json_loader::{base_dir, read_json};
use crate::surface::{Alt, Surface, SurfaceData};

/// Decodes `path` into an RGBA8 image.
pub trait ImageSource {
    fn load(&self, path: &Path) -> Result<Image, MapError>;
}

/// Reads image files from disk and decodes them with macroquad.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageSource;

impl ImageSource for FileImageSource {
    fn load(&self, path: &Path) -> Result<Image, MapError> {
        let bytes = std::fs::read(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Image::from_file_with_format(&bytes, None).map_err(|e| MapError::Image {
            path: path.to_path_buf(),
            message: format!("{e:?}"),
        })
    }
}

/// Serves images registered up front, for embedded assets and tests.
#[derive(Default, Clone)]
pub struct MemoryImageSource {
    images: HashMap<PathBuf, Image>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, image: Image) {
        self.images.insert(path.into(), image);
    }

    /// Registers a `w`x`h` image from tightly packed RGBA8 bytes.
    pub fn insert_rgba(&mut self, path: impl Into<PathBuf>, w: u16, h: u16, bytes: Vec<u8>) {
        assert_eq!(bytes.len(), w as usize * h as usize * 4, "RGBA buffer size mismatch");
        self.insert(
            path,
            Image {
                bytes,
                width: w,
                height: h,
            },
        );
    }
}

impl ImageSource for MemoryImageSource {
    fn load(&self, path: &Path) -> Result<Image, MapError> {
        self.images.get(path).cloned().ok_or_else(|| MapError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "image not registered"),
        })
    }
}

#[derive(Deserialize)]
struct JsonSprite {
    width: i32,
    height: i32,
    start_id: String,
    faces: Vec<JsonFace>,
}

#[derive(Deserialize)]
struct JsonFace {
    id: String,
    source: String,
}

/// Hands out surfaces that share pixel data per image path.
pub struct SurfaceCache {
    cache: HashMap<PathBuf, Rc<SurfaceData>>,
    source: Box<dyn ImageSource>,
}

impl Default for SurfaceCache {
    fn default() -> Self {
        Self::new(FileImageSource)
    }
}

impl SurfaceCache {
    pub fn new(source: impl ImageSource + 'static) -> Self {
        Self {
            cache: HashMap::new(),
            source: Box::new(source),
        }
    }

    pub fn from_image(&mut self, path: &Path) -> Result<Surface, MapError> {
        Ok(Surface::new(self.load_data(path)?))
    }

    /// Builds a multi-variant surface from a sprite description.
    pub fn from_sprite(&mut self, path: &Path) -> Result<Surface, MapError> {
        let sprite: JsonSprite = read_json(path)?;
        let dir = base_dir(path);

        let mut alts = Vec::with_capacity(sprite.faces.len());
        for face in sprite.faces {
            let img_path = dir.join(&face.source);
            let data = self.load_data(&img_path)?;
            if data.width() != sprite.width || data.height() != sprite.height {
                return Err(MapError::GeometryMismatch {
                    path: img_path,
                    expected: (sprite.width, sprite.height),
                    actual: (data.width(), data.height()),
                });
            }
            alts.push(Alt { data, tag: face.id });
        }

        debug!("Loaded sprite {} with {} faces", path.display(), alts.len());
        Ok(Surface::from_alts(alts, &sprite.start_id)?)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn load_data(&mut self, path: &Path) -> Result<Rc<SurfaceData>, MapError> {
        if let Some(data) = self.cache.get(path) {
            return Ok(Rc::clone(data));
        }

        debug!("Loading image {}", path.display());
        let img = self.source.load(path)?;
        let data = Rc::new(SurfaceData::from_rgba8(
            &img.bytes,
            img.width as i32,
            img.height as i32,
        ));
        self.cache.insert(path.to_path_buf(), Rc::clone(&data));
        Ok(data)
    }
}
