//! Tiny levels drawn as ASCII for unit tests; see [`cells`] for the legend.

pub(crate) mod cells;

use std::path::Path;

use crate::cache::{MemoryImageSource, SurfaceCache};
use crate::ir_map::{Attributes, IrLayer, IrLayerKind, IrMap, IrTileMetadata, IrTileset};
use crate::tilemap::Tilemap;

use self::cells::{FLAGS, TILES};

pub(crate) const TILE: i32 = 4;

pub(crate) fn images() -> MemoryImageSource {
    let mut src = MemoryImageSource::new();
    src.insert_rgba(
        "lvl/tiles.png",
        (TILE as u32 * TILES) as u16,
        TILE as u16,
        cells::atlas(TILE as usize),
    );
    src
}

fn tileset() -> IrTileset {
    IrTileset {
        first_gid: 1,
        image: "tiles.png".into(),
        image_w: (TILE as u32) * TILES,
        image_h: TILE as u32,
        tile_w: TILE as u32,
        tile_h: TILE as u32,
        tilecount: TILES,
        columns: TILES,
        spacing: 0,
        margin: 0,
        properties: Attributes::new(),
        tiles: FLAGS
            .iter()
            .map(|&(gid, flags)| IrTileMetadata {
                id: gid - 1,
                properties: flags.iter().map(|&f| (f, "true")).collect(),
            })
            .collect(),
    }
}

pub(crate) fn ascii_ir(rows: &[&str]) -> IrMap {
    let (width, height, [floor, blocks, player]) = cells::layers(rows);
    let layer = |name: &str, data: Vec<u32>| IrLayer {
        name: name.into(),
        visible: true,
        properties: Attributes::new(),
        kind: IrLayerKind::Tiles { width, height, data },
    };
    IrMap {
        width: width as u32,
        height: height as u32,
        tile_w: TILE as u32,
        tile_h: TILE as u32,
        properties: Attributes::new(),
        tilesets: vec![tileset()],
        layers: vec![layer("floor", floor), layer("blocks", blocks), layer("player", player)],
    }
}

pub(crate) fn ascii_map(rows: &[&str]) -> Tilemap {
    Tilemap::from_ir(ascii_ir(rows), Path::new("lvl"), &mut SurfaceCache::new(images())).expect("test level")
}
