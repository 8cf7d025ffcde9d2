use std::path::Path;

use serde::Deserialize;

use crate::error::MapError;
use crate::loader::json_loader::read_json;
use crate::pixel::Pixel;

/// Tunables for the simulation and frame layout. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Pixels moved per tick while stepping. Must divide the tile size.
    pub step_speed: i32,
    /// Ticks per walking animation frame.
    pub walk_anim_ticks: u32,
    /// Ticks of the win animation that ignore input.
    pub win_lock_ticks: u32,
    /// Ticks after which the win animation ends on its own.
    pub win_total_ticks: u32,
    /// Ticks spent on each thawing stage.
    pub thaw_stage_ticks: u32,
    /// Frame buffer size; defaults to the map's pixel size.
    pub fb_width: Option<i32>,
    pub fb_height: Option<i32>,
    /// Background as `[a, r, g, b]`.
    pub clear_color: [u8; 4],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            step_speed: 2,
            walk_anim_ticks: 6,
            win_lock_ticks: 60,
            win_total_ticks: 240,
            thaw_stage_ticks: 15,
            fb_width: None,
            fb_height: None,
            clear_color: [0xff, 0xa0, 0x80, 0x80],
        }
    }
}

impl GameConfig {
    pub fn from_file(path: &Path) -> Result<Self, MapError> {
        read_json(path)
    }

    pub fn clear_pixel(&self) -> Pixel {
        let [a, r, g, b] = self.clear_color;
        Pixel::argb(a, r, g, b)
    }

    /// Checks the values against a map's tile size.
    pub fn validate(&self, tile_w: i32, tile_h: i32) -> Result<(), MapError> {
        if self.step_speed <= 0 || tile_w % self.step_speed != 0 || tile_h % self.step_speed != 0 {
            return Err(MapError::InvalidConfig(format!(
                "step_speed {} must be positive and divide the {}x{} tile size",
                self.step_speed, tile_w, tile_h
            )));
        }
        if self.win_lock_ticks > self.win_total_ticks {
            return Err(MapError::InvalidConfig(format!(
                "win_lock_ticks {} exceeds win_total_ticks {}",
                self.win_lock_ticks, self.win_total_ticks
            )));
        }
        if self.walk_anim_ticks == 0 || self.thaw_stage_ticks == 0 {
            return Err(MapError::InvalidConfig("animation tick counts must be non-zero".into()));
        }
        if matches!(self.fb_width, Some(w) if w <= 0) || matches!(self.fb_height, Some(h) if h <= 0) {
            return Err(MapError::InvalidConfig("frame buffer size must be positive".into()));
        }
        Ok(())
    }
}
