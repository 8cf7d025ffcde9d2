//! Plays a list of levels in order.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::info;
use serde::Deserialize;

use crate::cache::{ImageSource, SurfaceCache};
use crate::config::GameConfig;
use crate::error::MapError;
use crate::font::FontCluster;
use crate::game::input::{EdgeLatch, Input, InputSource};
use crate::game::sfx::Sfx;
use crate::game::Game;
use crate::loader::json_loader::{base_dir, read_json};
use crate::render_target::{FrameSink, RenderTarget};
use crate::surface::Surface;

#[derive(Deserialize)]
struct JsonManifest {
    levels: Vec<String>,
    #[serde(default)]
    config: GameConfig,
}

pub struct GameManager {
    levels: Vec<PathBuf>,
    config: GameConfig,
    cache: SurfaceCache,
    sfx: Rc<dyn Sfx>,
    hud: Option<FontCluster>,
    game: Option<Game>,
    current: usize,
    total_pushes: u32,
    latch: EdgeLatch,
    menu_requested: bool,
}

impl GameManager {
    /// Reads a manifest (`{"levels": [...], "config": {...}}`) and starts its first level.
    pub fn load(path: &Path, source: impl ImageSource + 'static, sfx: Rc<dyn Sfx>) -> Result<Self, MapError> {
        let manifest: JsonManifest = read_json(path)?;
        let dir = base_dir(path);
        let levels = manifest.levels.iter().map(|l| dir.join(l)).collect::<Vec<_>>();
        for level in &levels {
            info!("Found level: {}", level.display());
        }
        Self::from_levels(levels, manifest.config, SurfaceCache::new(source), sfx)
    }

    pub fn from_levels(
        levels: Vec<PathBuf>,
        config: GameConfig,
        cache: SurfaceCache,
        sfx: Rc<dyn Sfx>,
    ) -> Result<Self, MapError> {
        if levels.is_empty() {
            return Err(MapError::InvalidMap("Game has no levels".into()));
        }
        let mut manager = Self {
            levels,
            config,
            cache,
            sfx,
            hud: None,
            game: None,
            current: 0,
            total_pushes: 0,
            latch: EdgeLatch::new(),
            menu_requested: false,
        };
        manager.change_level(0)?;
        Ok(manager)
    }

    /// Attaches a HUD font to this and every later level.
    pub fn set_hud_font(&mut self, font: FontCluster) {
        if let Some(game) = &mut self.game {
            game.set_hud_font(font.clone());
        }
        self.hud = Some(font);
    }

    pub fn change_level(&mut self, level: usize) -> Result<(), MapError> {
        let path = self.levels.get(level).ok_or_else(|| {
            MapError::InvalidMap(format!("Level {} out of range ({} levels)", level, self.levels.len()))
        })?;
        let mut game = Game::load(path, &mut self.cache, self.config.clone(), Rc::clone(&self.sfx))?;
        if let Some(hud) = &self.hud {
            game.set_hud_font(hud.clone());
        }
        game.set_held(self.latch);
        info!("Starting level {} of {}", level + 1, self.levels.len());
        self.game = Some(game);
        self.current = level;
        Ok(())
    }

    pub fn reset_level(&mut self) -> Result<(), MapError> {
        self.change_level(self.current)
    }

    /// Runs one tick of the current level. A finished level moves on to the next.
    pub fn iterate(&mut self, input: &dyn InputSource, sink: &mut dyn FrameSink) -> Result<(), MapError> {
        if self.latch.poll(input, Input::Menu) {
            self.menu_requested = true;
        }
        let reset = self.latch.poll(input, Input::Reset);
        self.latch.track(input);
        if self.done() {
            return Ok(());
        }
        if reset {
            info!("Resetting level {}", self.current + 1);
            self.reset_level()?;
        }

        let Some(game) = self.game.as_mut() else {
            return Ok(());
        };
        game.iterate(input, sink);
        if !game.finished() {
            return Ok(());
        }

        self.total_pushes += game.pushes();
        let next = self.current + 1;
        if next < self.levels.len() {
            self.change_level(next)
        } else {
            info!("All {} levels cleared with {} pushes", self.levels.len(), self.total_pushes);
            self.game = None;
            Ok(())
        }
    }

    /// Every level has been finished.
    pub fn done(&self) -> bool {
        self.game.is_none()
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn current_level(&self) -> usize {
        self.current
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Pushes used in all finished levels.
    pub fn total_pushes(&self) -> u32 {
        self.total_pushes
    }

    /// Reports, once, that Menu was pressed since the last call.
    pub fn take_menu_request(&mut self) -> bool {
        std::mem::take(&mut self.menu_requested)
    }

    /// Half-size picture of level `level` in its starting state.
    pub fn preview(&mut self, level: usize) -> Result<Surface, MapError> {
        let path = self.levels.get(level).ok_or_else(|| {
            MapError::InvalidMap(format!("Level {} out of range ({} levels)", level, self.levels.len()))
        })?;
        let game = Game::load(path, &mut self.cache, self.config.clone(), Rc::clone(&self.sfx))?;
        let mut target = RenderTarget::new(game.map().pix_width(), game.map().pix_height());
        game.draw(&mut target);
        Ok(target.into_surface().downscaled())
    }
}
