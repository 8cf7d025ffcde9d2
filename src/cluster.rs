use std::fmt;

use crate::geom::{Pos, Rect};
use crate::render_target::RenderTarget;
use crate::surface::Surface;

/// Something that can be drawn into a [`RenderTarget`] at a movable position.
pub trait Renderable {
    fn render(&self, target: &mut RenderTarget);
    fn pos(&self) -> Pos;
    fn set_pos(&mut self, pos: Pos);

    fn move_by(&mut self, delta: Pos) {
        let p = self.pos();
        self.set_pos(p + delta);
    }
}

#[derive(Debug, Clone)]
pub struct ClusterElem {
    pub surf: Surface,
    pub offset: Pos,
}

impl ClusterElem {
    /// Where this element sits in the world, ignoring the cluster position.
    #[inline]
    pub fn world_pos(&self) -> Pos {
        self.surf.pos() + self.offset
    }
}

type Transform = Box<dyn Fn(Pos) -> Pos>;

/// Ordered surfaces drawn together.
#[derive(Default)]
pub struct SurfaceCluster {
    elems: Vec<ClusterElem>,
    position: Pos,
    transform: Option<Transform>,
}

impl fmt::Debug for SurfaceCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceCluster")
            .field("elems", &self.elems.len())
            .field("position", &self.position)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl SurfaceCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, surf: Surface, offset: Pos) {
        self.elems.push(ClusterElem { surf, offset });
    }

    pub fn elems(&self) -> &[ClusterElem] {
        &self.elems
    }

    pub fn elems_mut(&mut self) -> &mut Vec<ClusterElem> {
        &mut self.elems
    }

    /// Maps each element's offset at render time (e.g. wobble or rotation effects).
    pub fn set_transform(&mut self, func: impl Fn(Pos) -> Pos + 'static) {
        self.transform = Some(Box::new(func));
    }

    pub fn clear_transform(&mut self) {
        self.transform = None;
    }
}

impl Renderable for SurfaceCluster {
    fn render(&self, target: &mut RenderTarget) {
        for elem in &self.elems {
            let offset = match &self.transform {
                Some(f) => f(elem.offset),
                None => elem.offset,
            };
            target.blit_offset(&elem.surf, Rect::default(), self.position + offset);
        }
    }

    fn pos(&self) -> Pos {
        self.position
    }

    fn set_pos(&mut self, pos: Pos) {
        self.position = pos;
    }
}
