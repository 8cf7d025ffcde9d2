use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use log::{debug, warn};

use crate::cache::SurfaceCache;
use crate::cluster::{Renderable, SurfaceCluster};
use crate::error::MapError;
use crate::geom::{Pos, Rect};
use crate::ir_map::{Attributes, IrLayer, IrLayerKind, IrMap, IrTileset, GID_MASK};
use crate::loader::json_loader::decode_map_file_to_ir;
use crate::render_target::RenderTarget;
use crate::surface::Surface;

/// Layer the player and blocks stand on; carries `goal` and `slippery_*` attributes.
pub const FLOOR_LAYER: &str = "floor";
/// Layer whose occupants block movement and can be pushed.
pub const BLOCKS_LAYER: &str = "blocks";
/// Layer holding the single player sprite.
pub const PLAYER_LAYER: &str = "player";
/// Layer whose cells only feed the collision set.
pub const COLLISION_LAYER: &str = "collision";

/// One named grid of placed tiles.
#[derive(Debug)]
pub struct Layer {
    pub cluster: SurfaceCluster,
    pub attr: Attributes,
    pub name: String,
}

/// Layer addressed by draw index or by case-insensitive name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSel<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for LayerSel<'_> {
    fn from(i: usize) -> Self {
        LayerSel::Index(i)
    }
}

impl<'a> From<&'a str> for LayerSel<'a> {
    fn from(name: &'a str) -> Self {
        LayerSel::Name(name)
    }
}

#[derive(Debug)]
pub struct Tilemap {
    layers: Vec<Layer>,
    collisions: BTreeSet<Pos>,
    properties: Attributes,
    width: i32,
    height: i32,
    tile_w: i32,
    tile_h: i32,
    position: Pos,
}

impl Tilemap {
    pub fn load(path: &Path, cache: &mut SurfaceCache) -> Result<Self, MapError> {
        let (ir, base) = decode_map_file_to_ir(path)?;
        Self::from_ir(ir, &base, cache)
    }

    /// Builds the map. Image and sprite paths resolve against `base_dir`.
    pub fn from_ir(ir: IrMap, base_dir: &Path, cache: &mut SurfaceCache) -> Result<Self, MapError> {
        if ir.width == 0 || ir.height == 0 || ir.tile_w == 0 || ir.tile_h == 0 {
            return Err(MapError::InvalidMap(format!(
                "Tilemap is malformed: {}x{} tiles of {}x{} pixels",
                ir.width, ir.height, ir.tile_w, ir.tile_h
            )));
        }

        let mut tiles = HashMap::new();
        for ts in &ir.tilesets {
            add_tileset(&mut tiles, ts, base_dir, cache)?;
        }
        let max_gid = ir.tilesets.iter().map(IrTileset::last_gid).max().unwrap_or(0);

        let mut map = Tilemap {
            layers: Vec::with_capacity(ir.layers.len()),
            collisions: BTreeSet::new(),
            properties: ir.properties,
            width: ir.width as i32,
            height: ir.height as i32,
            tile_w: ir.tile_w as i32,
            tile_h: ir.tile_h as i32,
            position: Pos::default(),
        };
        for layer in ir.layers {
            map.add_layer(&tiles, layer, max_gid)?;
        }
        Ok(map)
    }

    fn add_layer(&mut self, tiles: &HashMap<u32, Surface>, layer: IrLayer, max_gid: u32) -> Result<(), MapError> {
        let (width, height, data) = match layer.kind {
            IrLayerKind::Tiles { width, height, data } => (width, height, data),
            IrLayerKind::Unsupported(kind) => {
                warn!("Skipping layer '{}' of unsupported type '{}'", layer.name, kind);
                return Ok(());
            }
        };

        if width == 0 || height == 0 {
            return Err(MapError::InvalidMap(format!("Layer '{}' is empty", layer.name)));
        }
        if data.len() != width * height {
            return Err(MapError::InvalidLayerSize {
                layer: layer.name,
                expected: width * height,
                actual: data.len(),
            });
        }

        debug!("Adding layer: Name: {} Width: {} Height: {}", layer.name, width, height);

        let is_collision = layer.name.eq_ignore_ascii_case(COLLISION_LAYER);
        // The collision layer is usually hidden in the editor and still counts.
        if !layer.visible && !is_collision {
            warn!("Skipping invisible layer '{}'", layer.name);
            return Ok(());
        }

        let mut cluster = SurfaceCluster::new();
        for (index, raw) in data.iter().enumerate() {
            let gid = raw & GID_MASK;
            if gid == 0 {
                continue;
            }

            let tile = Pos::new((index % width) as i32, (index / width) as i32);
            if is_collision {
                self.collisions.insert(tile);
                continue;
            }

            let mut surf = tiles.get(&gid).cloned().ok_or_else(|| MapError::InvalidTileGid {
                layer: layer.name.clone(),
                gid,
                max_gid,
            })?;
            surf.attr_mut().override_with(&layer.properties);
            surf.set_pos(tile.scale(self.tile_w, self.tile_h));
            if surf.attr().flag("collision") {
                self.collisions.insert(tile);
            }
            cluster.push(surf, Pos::default());
        }

        if is_collision {
            return Ok(());
        }

        self.layers.push(Layer {
            cluster,
            attr: layer.properties,
            name: layer.name,
        });
        Ok(())
    }

    /// True if `tile` is blocked by the map or occupied in the blocks layer.
    pub fn collision(&self, tile: Pos) -> bool {
        self.collisions.contains(&tile)
            || self
                .find_tile(BLOCKS_LAYER, tile.scale(self.tile_w, self.tile_h))
                .is_some()
    }

    pub fn contains_tile(&self, tile: Pos) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name.eq_ignore_ascii_case(name))
    }

    fn resolve<'a>(&self, sel: impl Into<LayerSel<'a>>) -> Option<usize> {
        match sel.into() {
            LayerSel::Index(i) if i < self.layers.len() => Some(i),
            LayerSel::Index(_) => None,
            LayerSel::Name(name) => self.layer_index(name),
        }
    }

    pub fn find_layer(&self, name: &str) -> Option<&Layer> {
        self.layer_index(name).map(|i| &self.layers[i])
    }

    pub fn find_layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layer_index(name).map(move |i| &mut self.layers[i])
    }

    /// Index of the element placed exactly at world position `pos`.
    ///
    /// Linear in the layer size; only a few probes happen per tick.
    pub fn find_elem<'a>(&self, layer: impl Into<LayerSel<'a>>, pos: Pos) -> Option<(usize, usize)> {
        let li = self.resolve(layer)?;
        self.layers[li]
            .cluster
            .elems()
            .iter()
            .position(|e| e.world_pos() == pos)
            .map(|ei| (li, ei))
    }

    pub fn find_tile<'a>(&self, layer: impl Into<LayerSel<'a>>, pos: Pos) -> Option<&Surface> {
        let (li, ei) = self.find_elem(layer, pos)?;
        Some(&self.layers[li].cluster.elems()[ei].surf)
    }

    pub fn find_tile_mut<'a>(&mut self, layer: impl Into<LayerSel<'a>>, pos: Pos) -> Option<&mut Surface> {
        let (li, ei) = self.find_elem(layer, pos)?;
        Some(&mut self.layers[li].cluster.elems_mut()[ei].surf)
    }

    /// Removes a layer from the map, e.g. to turn its tiles into free sprites.
    pub fn take_layer(&mut self, name: &str) -> Option<Layer> {
        self.layer_index(name).map(|i| self.layers.remove(i))
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn collisions(&self) -> &BTreeSet<Pos> {
        &self.collisions
    }

    pub fn properties(&self) -> &Attributes {
        &self.properties
    }

    pub fn tile_width(&self) -> i32 {
        self.tile_w
    }

    pub fn tile_height(&self) -> i32 {
        self.tile_h
    }

    pub fn tiles_width(&self) -> i32 {
        self.width
    }

    pub fn tiles_height(&self) -> i32 {
        self.height
    }

    pub fn pix_width(&self) -> i32 {
        self.width * self.tile_w
    }

    pub fn pix_height(&self) -> i32 {
        self.height * self.tile_h
    }
}

impl Renderable for Tilemap {
    fn render(&self, target: &mut RenderTarget) {
        for layer in &self.layers {
            layer.cluster.render(target);
        }
    }

    fn pos(&self) -> Pos {
        self.position
    }

    fn set_pos(&mut self, pos: Pos) {
        for layer in &mut self.layers {
            layer.cluster.set_pos(pos);
        }
        self.position = pos;
    }
}

fn add_tileset(
    tiles: &mut HashMap<u32, Surface>,
    ts: &IrTileset,
    base_dir: &Path,
    cache: &mut SurfaceCache,
) -> Result<(), MapError> {
    debug!(
        "Adding tileset: Gid: {} Tilewidth: {} Tileheight: {} Source: {} Width: {} Height: {}",
        ts.first_gid, ts.tile_w, ts.tile_h, ts.image, ts.image_w, ts.image_h
    );

    if ts.tile_w == 0 || ts.tile_h == 0 || ts.image_w == 0 || ts.image_h == 0 {
        return Err(MapError::InvalidMap(format!("Tileset '{}' is malformed", ts.image)));
    }

    let img_path = base_dir.join(&ts.image);
    let surf = cache.from_image(&img_path)?;
    let actual = (surf.rect().w, surf.rect().h);
    let expected = (ts.image_w as i32, ts.image_h as i32);
    if actual != expected {
        return Err(MapError::GeometryMismatch {
            path: img_path,
            expected,
            actual,
        });
    }

    let (tw, th) = (ts.tile_w as i32, ts.tile_h as i32);
    let (margin, spacing) = (ts.margin as i32, ts.spacing as i32);
    let columns = if ts.columns > 0 {
        ts.columns as i32
    } else {
        ((expected.0 - 2 * margin + spacing) / (tw + spacing)).max(1)
    };

    for n in 0..ts.tilecount {
        let (col, row) = (n as i32 % columns, n as i32 / columns);
        let src = Pos::new(margin + col * (tw + spacing), margin + row * (th + spacing));
        let mut tile = surf.sub(Rect::new(src, tw, th));
        *tile.attr_mut() = ts.properties.clone();
        tiles.insert(ts.first_gid + n, tile);
    }

    for meta in &ts.tiles {
        let id = ts.first_gid + meta.id;
        let mut attrs = ts.properties.clone();
        attrs.override_with(&meta.properties);

        if let Some(sprite) = attrs.get("sprite").map(|s| base_dir.join(s)) {
            tiles.insert(id, cache.from_sprite(&sprite)?);
        }
        match tiles.get_mut(&id) {
            Some(tile) => *tile.attr_mut() = attrs,
            None => {
                return Err(MapError::InvalidMap(format!(
                    "Tile {} has properties but lies outside tileset '{}'",
                    meta.id, ts.image
                )))
            }
        }
    }
    Ok(())
}
