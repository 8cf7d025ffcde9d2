//! One level being played: input, movement, win detection and drawing.

pub mod input;
pub mod manager;
pub mod sfx;
pub mod stepper;

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::cache::SurfaceCache;
use crate::cluster::Renderable;
use crate::config::GameConfig;
use crate::error::MapError;
use crate::font::{Alignment, FontCluster};
use crate::geom::{Pos, Rect};
use crate::pixel::Pixel;
use crate::render_target::{FrameSink, RenderTarget};
use crate::surface::Surface;
use crate::tilemap::{Tilemap, BLOCKS_LAYER, FLOOR_LAYER, PLAYER_LAYER};

use self::input::{EdgeLatch, Input, InputSource};
use self::sfx::Sfx;
use self::stepper::{blocked, tile_at, Advance, Direction, StepContext, Stepper};

const GOAL: &str = "goal";
const FROZEN: &str = "frozen";
const THAW: &str = "thaw";
const CHEER: &str = "cheer";

/// Selects `id`/`index` on `surf` if the sprite has that image.
fn show(surf: &mut Surface, id: &str, index: usize) -> bool {
    index < surf.alt_count(id) && surf.set_active_alt(id, index).is_ok()
}

/// World positions of the `goal` elements of a layer.
fn goal_positions(map: &Tilemap, layer: &str) -> Vec<Pos> {
    map.find_layer(layer)
        .map(|l| {
            l.cluster
                .elems()
                .iter()
                .filter(|e| e.surf.attr().flag(GOAL))
                .map(|e| e.world_pos())
                .collect()
        })
        .unwrap_or_default()
}

/// Order-insensitive comparison of goal tiles and goal blocks. Both lists must
/// be the same length; a level that breaks this is rejected at load.
fn goals_match(mut floors: Vec<Pos>, mut blocks: Vec<Pos>) -> bool {
    assert_eq!(
        floors.len(),
        blocks.len(),
        "Goal tiles and goal blocks differ in number"
    );
    floors.sort_unstable();
    blocks.sort_unstable();
    floors == blocks
}

#[derive(Debug, Clone, Copy, Default)]
struct WinAnimation {
    ticks: u32,
}

pub struct Game {
    map: Tilemap,
    player: Surface,
    config: GameConfig,
    sfx: Rc<dyn Sfx>,
    target: RenderTarget,
    latch: EdgeLatch,
    hud: Option<FontCluster>,

    facing: Direction,
    stepper: Option<Stepper>,
    walking: bool,
    sliding: bool,
    walk_ticks: u32,
    walk_frame: usize,
    pushes: u32,
    goal_blocks: Vec<usize>,
    win: Option<WinAnimation>,
    finished: bool,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("player", &self.player.pos())
            .field("facing", &self.facing)
            .field("stepper", &self.stepper)
            .field("pushes", &self.pushes)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Game {
    pub fn load(
        path: &Path,
        cache: &mut SurfaceCache,
        config: GameConfig,
        sfx: Rc<dyn Sfx>,
    ) -> Result<Self, MapError> {
        info!("Loading level {}", path.display());
        Self::new(Tilemap::load(path, cache)?, config, sfx)
    }

    /// Takes the `player` layer out of `map` and checks the level can be played.
    pub fn new(mut map: Tilemap, config: GameConfig, sfx: Rc<dyn Sfx>) -> Result<Self, MapError> {
        let tile = (map.tile_width(), map.tile_height());
        config.validate(tile.0, tile.1)?;

        let layer = map
            .take_layer(PLAYER_LAYER)
            .ok_or_else(|| MapError::InvalidMap("Level has no player layer".into()))?;
        let mut player = match layer.cluster.elems() {
            [only] => only.surf.clone(),
            elems => {
                return Err(MapError::InvalidMap(format!(
                    "Player layer must hold exactly one sprite, found {}",
                    elems.len()
                )))
            }
        };

        check_footprint("Player", &player, tile)?;
        let mut goal_blocks = Vec::new();
        if let Some(blocks) = map.find_layer(BLOCKS_LAYER) {
            for (i, elem) in blocks.cluster.elems().iter().enumerate() {
                check_footprint(&format!("Block at {}", elem.world_pos()), &elem.surf, tile)?;
                if elem.surf.attr().flag(GOAL) {
                    goal_blocks.push(i);
                }
            }
        }

        let floors = goal_positions(&map, FLOOR_LAYER).len();
        if floors != goal_blocks.len() {
            return Err(MapError::GoalMismatch {
                floors,
                blocks: goal_blocks.len(),
            });
        }

        if let Some(blocks) = map.find_layer_mut(BLOCKS_LAYER) {
            for &i in &goal_blocks {
                show(&mut blocks.cluster.elems_mut()[i].surf, FROZEN, 0);
            }
        }

        let facing = Direction::from_name(player.active_alt().0).unwrap_or(Direction::Down);
        show(&mut player, facing.name(), 0);

        let fb_w = config.fb_width.unwrap_or(map.pix_width());
        let fb_h = config.fb_height.unwrap_or(map.pix_height());
        let mut target = RenderTarget::new(fb_w, fb_h);
        target.camera_set(Pos::new((map.pix_width() - fb_w) / 2, (map.pix_height() - fb_h) / 2));

        debug!(
            "Level ready: {}x{} tiles, {} goals, player at {}",
            map.tiles_width(),
            map.tiles_height(),
            floors,
            player.pos()
        );

        Ok(Self {
            map,
            player,
            config,
            sfx,
            target,
            latch: EdgeLatch::new(),
            hud: None,
            facing,
            stepper: None,
            walking: false,
            sliding: false,
            walk_ticks: 0,
            walk_frame: 0,
            pushes: 0,
            goal_blocks,
            win: None,
            finished: false,
        })
    }

    /// Draws a push counter in the top-left corner.
    pub fn set_hud_font(&mut self, font: FontCluster) {
        self.hud = Some(font);
    }

    /// Buttons held in `latch` have to be released before they act in this level.
    pub fn set_held(&mut self, latch: EdgeLatch) {
        self.latch = latch;
    }

    /// Runs one tick and presents the frame.
    pub fn iterate(&mut self, input: &dyn InputSource, sink: &mut dyn FrameSink) {
        self.update(input);

        let target = &mut self.target;
        render_level(&self.map, &self.player, self.config.clear_pixel(), target);
        render_hud(&mut self.hud, self.pushes, target);
        target.finalize();
        target.present(sink);
    }

    fn update(&mut self, input: &dyn InputSource) {
        let push = self.latch.poll(input, Input::Push);
        let cancel = self.latch.poll(input, Input::Cancel);
        if self.win.is_some() {
            self.update_win(push || cancel);
            return;
        }

        if self.stepper.is_none() {
            self.stepper = self.begin_step(input, push);
        }
        if let Some(mut stepper) = self.stepper.take() {
            let mut ctx = StepContext {
                map: &mut self.map,
                mover: &mut self.player,
                speed: self.config.step_speed,
                sliding: self.sliding,
            };
            let res = stepper.advance(&mut ctx);
            self.sliding = ctx.sliding;
            match res {
                Advance::Continue => self.stepper = Some(stepper),
                Advance::Done => self.walking = false,
            }
        }
        self.animate_player();

        if self.stepper.is_none() && self.won() {
            info!("Level solved with {} pushes", self.pushes);
            self.sfx.play("win", 1.0);
            self.win = Some(WinAnimation::default());
        }
    }

    fn begin_step(&mut self, input: &dyn InputSource, push: bool) -> Option<Stepper> {
        let tile = tile_at(&self.map, self.player.pos());

        if let Some(dir) = Direction::PRIORITY.into_iter().find(|d| input.pressed(d.input())) {
            self.face(dir);
            if !blocked(&self.map, tile + dir.delta()) {
                self.walking = true;
                return Some(Stepper::MovingSelf { dir });
            }
        }

        if !push {
            return None;
        }
        let dir = self.facing;
        let ahead = tile + dir.delta();
        let pixel = ahead.scale(self.map.tile_width(), self.map.tile_height());
        let (_, block) = self.map.find_elem(BLOCKS_LAYER, pixel)?;
        if blocked(&self.map, ahead + dir.delta()) {
            return None;
        }

        self.pushes += 1;
        self.walking = true;
        self.sfx.play("push", 1.0);
        debug!("Pushing block at {} {}", ahead, dir);
        Some(Stepper::MovingPushed {
            dir,
            block,
            carry_mover: true,
        })
    }

    fn face(&mut self, dir: Direction) {
        if dir == self.facing {
            return;
        }
        self.facing = dir;
        self.walk_ticks = 0;
        self.walk_frame = 0;
        show(&mut self.player, dir.name(), 0);
    }

    fn animate_player(&mut self) {
        let walk = format!("walk_{}", self.facing.name());
        let frames = self.player.alt_count(&walk);
        if !self.walking || frames == 0 {
            if self.player.active_alt().0 != self.facing.name() {
                show(&mut self.player, self.facing.name(), 0);
            }
            return;
        }

        self.walk_ticks += 1;
        if self.walk_ticks >= self.config.walk_anim_ticks {
            self.walk_ticks = 0;
            self.walk_frame = (self.walk_frame + 1) % frames;
        }
        show(&mut self.player, &walk, self.walk_frame % frames);
    }

    fn update_win(&mut self, skip: bool) {
        let Some(win) = self.win.as_mut() else {
            return;
        };
        win.ticks += 1;
        let ticks = win.ticks;

        let stage = (ticks / self.config.thaw_stage_ticks) as usize;
        if let Some(blocks) = self.map.find_layer_mut(BLOCKS_LAYER) {
            for &i in &self.goal_blocks {
                let surf = &mut blocks.cluster.elems_mut()[i].surf;
                let (thaws, cheers) = (surf.alt_count(THAW), surf.alt_count(CHEER));
                if stage < thaws {
                    show(surf, THAW, stage);
                } else if cheers > 0 {
                    show(surf, CHEER, (stage - thaws) % cheers);
                }
            }
        }

        let unlocked = ticks >= self.config.win_lock_ticks;
        if ticks >= self.config.win_total_ticks || (unlocked && skip) {
            debug!("Win animation over after {} ticks", ticks);
            self.finished = true;
        }
    }

    /// Clears `target` and draws the level and player, without HUD or finalization.
    pub fn draw(&self, target: &mut RenderTarget) {
        render_level(&self.map, &self.player, self.config.clear_pixel(), target);
    }

    /// True when every goal tile holds a goal block. Levels without goals never win.
    pub fn won(&self) -> bool {
        let floors = goal_positions(&self.map, FLOOR_LAYER);
        !floors.is_empty() && goals_match(floors, goal_positions(&self.map, BLOCKS_LAYER))
    }

    /// The win animation has run its course; the level is over.
    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn is_stepping(&self) -> bool {
        self.stepper.is_some()
    }

    pub fn stepper(&self) -> Option<&Stepper> {
        self.stepper.as_ref()
    }

    pub fn is_sliding(&self) -> bool {
        self.sliding
    }

    /// Tile the player stands on, or `None` while a step is under way.
    pub fn player_tile(&self) -> Option<Pos> {
        if self.stepper.is_some() {
            return None;
        }
        Some(tile_at(&self.map, self.player.pos()))
    }

    pub fn player(&self) -> &Surface {
        &self.player
    }

    pub fn pushes(&self) -> u32 {
        self.pushes
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn map(&self) -> &Tilemap {
        &self.map
    }

    pub fn width(&self) -> i32 {
        self.target.width()
    }

    pub fn height(&self) -> i32 {
        self.target.height()
    }
}

fn render_level(map: &Tilemap, player: &Surface, clear: Pixel, target: &mut RenderTarget) {
    target.clear(clear);
    map.render(target);
    target.blit(player, Rect::default());
}

fn render_hud(hud: &mut Option<FontCluster>, pushes: u32, target: &mut RenderTarget) {
    let Some(font) = hud.as_ref() else {
        return;
    };
    let msg = format!("Pushes: {}", pushes);
    if let Err(e) = font.render_msg(target, &msg, 2, 2, Alignment::Left, 0) {
        warn!("Disabling HUD: {}", e);
        *hud = None;
    }
}

fn check_footprint(what: &str, surf: &Surface, tile: (i32, i32)) -> Result<(), MapError> {
    let size = (surf.rect().w, surf.rect().h);
    if size.0 > tile.0 || size.1 > tile.1 {
        return Err(MapError::OversizedSprite {
            what: what.to_owned(),
            size,
            tile,
        });
    }
    Ok(())
}
