//! Tile-to-tile motion, one tick at a time.

use std::fmt;

use crate::game::input::Input;
use crate::geom::Pos;
use crate::surface::Surface;
use crate::tilemap::{Tilemap, BLOCKS_LAYER, FLOOR_LAYER};

const SLIPPERY_PLAYER: &str = "slippery_player";
const SLIPPERY_BLOCK: &str = "slippery_block";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Order in which held directions are considered.
    pub const PRIORITY: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// One tile in this direction.
    pub const fn delta(self) -> Pos {
        match self {
            Direction::Up => Pos::new(0, -1),
            Direction::Down => Pos::new(0, 1),
            Direction::Left => Pos::new(-1, 0),
            Direction::Right => Pos::new(1, 0),
        }
    }

    pub const fn input(self) -> Input {
        match self {
            Direction::Up => Input::Up,
            Direction::Down => Input::Down,
            Direction::Left => Input::Left,
            Direction::Right => Input::Right,
        }
    }

    /// Sprite variant id for facing this way.
    pub const fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::PRIORITY.into_iter().find(|d| d.name() == name)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A move in progress. It runs until the moving surfaces are tile aligned and nothing keeps them sliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stepper {
    /// The mover walks or slides on its own.
    MovingSelf { dir: Direction },
    /// A block from the blocks layer, addressed by element index, moves; the
    /// mover follows it while `carry_mover` is set.
    MovingPushed {
        dir: Direction,
        block: usize,
        carry_mover: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Continue,
    Done,
}

/// What a [`Stepper`] moves and collides against for one tick.
pub struct StepContext<'a> {
    pub map: &'a mut Tilemap,
    pub mover: &'a mut Surface,
    /// Pixels per tick.
    pub speed: i32,
    /// Set while the last aligned check found ice under the moving object.
    pub sliding: bool,
}

impl Stepper {
    pub fn dir(&self) -> Direction {
        match *self {
            Stepper::MovingSelf { dir } | Stepper::MovingPushed { dir, .. } => dir,
        }
    }

    pub fn advance(&mut self, ctx: &mut StepContext<'_>) -> Advance {
        let dir = self.dir();
        let step = dir.delta() * ctx.speed;

        match self {
            Stepper::MovingSelf { .. } => {
                let pos = ctx.mover.pos() + step;
                ctx.mover.set_pos(pos);
                if !is_aligned(ctx.map, pos) || keeps_sliding(ctx, pos, dir, SLIPPERY_PLAYER) {
                    Advance::Continue
                } else {
                    Advance::Done
                }
            }
            Stepper::MovingPushed { block, carry_mover, .. } => {
                if *carry_mover {
                    let p = ctx.mover.pos();
                    ctx.mover.set_pos(p + step);
                }
                let Some(surf) = block_surface_mut(ctx.map, *block) else {
                    return Advance::Done;
                };
                let pos = surf.pos() + step;
                surf.set_pos(pos);

                if !is_aligned(ctx.map, pos) {
                    return Advance::Continue;
                }
                if keeps_sliding(ctx, pos, dir, SLIPPERY_BLOCK) {
                    *carry_mover = false;
                    Advance::Continue
                } else {
                    Advance::Done
                }
            }
        }
    }
}

fn block_surface_mut(map: &mut Tilemap, index: usize) -> Option<&mut Surface> {
    map.find_layer_mut(BLOCKS_LAYER)?
        .cluster
        .elems_mut()
        .get_mut(index)
        .map(|e| &mut e.surf)
}

fn is_aligned(map: &Tilemap, pos: Pos) -> bool {
    pos.x.rem_euclid(map.tile_width()) == 0 && pos.y.rem_euclid(map.tile_height()) == 0
}

/// Tile under the aligned world position `pos`. Panics if `pos` is not on the grid.
pub fn tile_at(map: &Tilemap, pos: Pos) -> Pos {
    assert!(
        is_aligned(map, pos),
        "Collision probe at {} is not aligned to the {}x{} grid",
        pos,
        map.tile_width(),
        map.tile_height()
    );
    Pos::new(pos.x.div_euclid(map.tile_width()), pos.y.div_euclid(map.tile_height()))
}

/// True if nothing may enter `tile`: outside the map, or colliding.
pub fn blocked(map: &Tilemap, tile: Pos) -> bool {
    !map.contains_tile(tile) || map.collision(tile)
}

/// Decides at an aligned position whether the motion carries on into the next tile.
fn keeps_sliding(ctx: &mut StepContext<'_>, pos: Pos, dir: Direction, slippery: &str) -> bool {
    let next = tile_at(ctx.map, pos) + dir.delta();
    ctx.sliding = !blocked(ctx.map, next)
        && ctx
            .map
            .find_tile(FLOOR_LAYER, pos)
            .is_some_and(|floor| floor.attr().flag(slippery));
    ctx.sliding
}
