// tests/common/mod.rs
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use icethaw::{Input, MemoryImageSource, Pixel, SurfaceCache};

#[path = "../../src/test_support/cells.rs"]
mod cells;

pub use cells::*;

/// A temp directory holding `tiles.json` plus any number of levels drawn as ASCII:
/// `.` floor, `~` ice, `#` wall, `g` goal, `B`/`I` block on floor/ice,
/// `X`/`O` goal block on floor/goal, `P`/`Q` player on floor/ice.
pub struct LevelDir {
    pub dir: PathBuf,
    pub tile: u32,
}

impl LevelDir {
    pub fn new(tag: &str, tile: u32) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("icethaw_{tag}_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");

        let tileset = serde_json::json!({
            "tilewidth": tile, "tileheight": tile,
            "tilecount": TILES, "columns": TILES,
            "image": "tiles.png",
            "imagewidth": tile * TILES, "imageheight": tile,
            "tiles": tile_flags()
        });
        fs::write(dir.join("tiles.json"), tileset.to_string()).expect("write tileset");
        Self { dir, tile }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    pub fn level(&self, name: &str, rows: &[&str]) -> PathBuf {
        let (w, h, [floor, blocks, player]) = cells::layers(rows);
        let layer = |name: &str, data: Vec<u32>| {
            serde_json::json!({ "type": "tilelayer", "name": name, "width": w, "height": h, "data": data })
        };
        let map = serde_json::json!({
            "width": w, "height": h,
            "tilewidth": self.tile, "tileheight": self.tile,
            "tilesets": [ { "firstgid": 1, "source": "tiles.json" } ],
            "layers": [ layer("floor", floor), layer("blocks", blocks), layer("player", player) ]
        });
        self.write(name, &map.to_string())
    }

    /// Tile `n` (1-based) is filled with red `n * 30`.
    pub fn images(&self) -> MemoryImageSource {
        let mut src = MemoryImageSource::new();
        let w = (self.tile * TILES) as u16;
        src.insert_rgba(self.path("tiles.png"), w, self.tile as u16, atlas(self.tile as usize));
        src
    }

    pub fn cache(&self) -> SurfaceCache {
        SurfaceCache::new(self.images())
    }
}

fn tile_flags() -> serde_json::Value {
    FLAGS
        .iter()
        .map(|&(gid, flags)| {
            let props: Vec<_> = flags
                .iter()
                .map(|f| serde_json::json!({ "name": f, "type": "bool", "value": true }))
                .collect();
            serde_json::json!({ "id": gid - 1, "properties": props })
        })
        .collect()
}

pub fn held(inputs: &[Input]) -> impl Fn(Input) -> bool + '_ {
    move |i| inputs.contains(&i)
}

pub fn discard(_: &[Pixel], _: u32, _: u32, _: usize) {}
