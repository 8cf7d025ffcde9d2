//! Tile-puzzle engine: a small software compositor for layered tile maps and
//! sprites, plus the grid movement rules of an ice-block pushing game.
//!
//! Levels are Tiled JSON maps. [`Tilemap`] builds them into layers of
//! [`Surface`]s, [`Game`] runs one level tick by tick and [`GameManager`]
//! plays a list of levels. Frames are rendered into a [`RenderTarget`] and
//! handed to a [`FrameSink`].

pub mod cache;
pub mod cluster;
pub mod config;
mod error;
pub mod font;
pub mod game;
pub mod geom;
pub mod ir_map;
pub mod loader {
    pub mod json_loader;
}
pub mod pixel;
pub mod render_target;
pub mod surface;
pub mod tilemap;

#[cfg(test)]
mod test_support;

pub use cache::{FileImageSource, ImageSource, MemoryImageSource, SurfaceCache};
pub use cluster::{ClusterElem, Renderable, SurfaceCluster};
pub use config::GameConfig;
pub use error::{MapError, RenderError};
pub use font::{Alignment, Font, FontCluster};
pub use game::input::{EdgeLatch, Input, InputSource};
pub use game::manager::GameManager;
pub use game::sfx::{NullSfx, Sfx};
pub use game::stepper::{Advance, Direction, Stepper};
pub use game::Game;
pub use geom::{Pos, Rect};
pub use ir_map::Attributes;
pub use pixel::{Pixel, PixelBase};
pub use render_target::{FrameSink, RenderTarget};
pub use surface::{Alt, Surface, SurfaceData};
pub use tilemap::{Layer, LayerSel, Tilemap};
