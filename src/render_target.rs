//! Software frame buffer with a camera.

use std::rc::Rc;

use crate::geom::{Pos, Rect};
use crate::pixel::Pixel;
use crate::surface::{Surface, SurfaceData};

/// Receives each finished frame: `(pixels, width, height, row stride in bytes)`.
pub trait FrameSink {
    fn present(&mut self, buffer: &[Pixel], width: u32, height: u32, stride: usize);
}

impl<F> FrameSink for F
where
    F: FnMut(&[Pixel], u32, u32, usize),
{
    fn present(&mut self, buffer: &[Pixel], width: u32, height: u32, stride: usize) {
        self(buffer, width, height, stride)
    }
}

/// Owned pixel buffer. `rect.pos` is the camera: world position of the top-left pixel.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    buffer: Vec<Pixel>,
    rect: Rect,
}

impl RenderTarget {
    pub fn new(width: i32, height: i32) -> Self {
        let (w, h) = (width.max(0), height.max(0));
        Self {
            buffer: vec![Pixel::default(); (w * h) as usize],
            rect: Rect::sized(w, h),
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.rect.w
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.rect.h
    }

    /// Bytes per row of [`buffer`](Self::buffer).
    #[inline]
    pub fn stride(&self) -> usize {
        self.rect.w as usize * std::mem::size_of::<Pixel>()
    }

    pub fn buffer(&self) -> &[Pixel] {
        &self.buffer
    }

    pub fn clear(&mut self, pix: Pixel) {
        self.buffer.fill(pix);
    }

    pub fn camera_move(&mut self, delta: Pos) {
        self.rect.pos += delta;
    }

    pub fn camera_set(&mut self, pos: Pos) {
        self.rect.pos = pos;
    }

    pub fn camera_pos(&self) -> Pos {
        self.rect.pos
    }

    /// Buffer pixel at `pos`, ignoring the camera.
    pub fn pixel(&self, pos: Pos) -> Pixel {
        self.buffer[self.index(pos)]
    }

    fn index(&self, pos: Pos) -> usize {
        assert!(
            pos.x >= 0 && pos.y >= 0 && pos.x < self.rect.w && pos.y < self.rect.h,
            "Pixel was fetched out-of-bounds. Asked for: ({}, {}). Real dimension: ({}, {}).",
            pos.x,
            pos.y,
            self.rect.w,
            self.rect.h
        );
        (pos.y * self.rect.w + pos.x) as usize
    }

    pub fn blit(&mut self, surf: &Surface, subrect: Rect) {
        self.blit_offset(surf, subrect, Pos::default());
    }

    /// Composites `surf` moved by `offset`, restricted to the surface-local
    /// `subrect` unless it is empty. Pixels without alpha are skipped.
    pub fn blit_offset(&mut self, surf: &Surface, subrect: Rect, offset: Pos) {
        let data = surf.data();
        let surf_rect = Rect::new(surf.pos() + offset, data.width(), data.height());

        let ignore_camera = surf.ignore_camera();
        let dest_rect = if ignore_camera {
            Rect::sized(self.rect.w, self.rect.h)
        } else {
            self.rect
        };

        let mut blit_rect = surf_rect & dest_rect;
        if !subrect.is_empty() {
            blit_rect &= subrect + surf_rect.pos;
        }
        if blit_rect.is_empty() {
            return;
        }

        let src_origin = blit_rect.pos - surf_rect.pos;
        let dst_origin = if ignore_camera {
            blit_rect.pos
        } else {
            blit_rect.pos - self.rect.pos
        };

        let w = blit_rect.w as usize;
        for y in 0..blit_rect.h {
            let src = data.row(src_origin + Pos::new(0, y), blit_rect.w);
            let start = self.index(dst_origin + Pos::new(0, y));
            Pixel::set_line_if_alpha(&mut self.buffer[start..start + w], src);
        }
    }

    /// Strips alpha from every pixel. Call once per frame, right before presenting.
    pub fn finalize(&mut self) {
        Pixel::mask_rgb_line(&mut self.buffer);
    }

    pub fn present(&self, sink: &mut dyn FrameSink) {
        sink.present(&self.buffer, self.rect.w as u32, self.rect.h as u32, self.stride());
    }

    /// Freezes the buffer into an immutable surface at the origin.
    pub fn into_surface(self) -> Surface {
        Surface::new(Rc::new(SurfaceData::new(self.buffer, self.rect.w, self.rect.h)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Pixel = Pixel::from_raw(0xff10_2030);

    fn opaque(w: i32, h: i32) -> Surface {
        Surface::filled(Pixel::argb(0xff, 0xee, 0, 0), w, h)
    }

    fn count(target: &RenderTarget, pix: Pixel) -> usize {
        target.buffer().iter().filter(|p| **p == pix).count()
    }

    #[test]
    fn transparent_surface_changes_nothing() {
        let mut target = RenderTarget::new(8, 8);
        target.clear(BG);
        let mut ghost = Surface::filled(Pixel::argb(0, 0xff, 0xff, 0xff), 4, 4);
        ghost.set_pos(Pos::new(2, 2));
        target.blit(&ghost, Rect::default());
        assert_eq!(count(&target, BG), 64);
    }

    #[test]
    fn opaque_surface_overwrites_exactly_the_overlap() {
        let mut target = RenderTarget::new(8, 8);
        target.clear(BG);
        let mut s = opaque(4, 4);
        s.set_pos(Pos::new(6, -1));
        target.blit(&s, Rect::default());

        let red = Pixel::argb(0xff, 0xee, 0, 0);
        // overlap is x 6..8, y 0..3
        assert_eq!(count(&target, red), 6);
        assert_eq!(target.pixel(Pos::new(6, 0)), red);
        assert_eq!(target.pixel(Pos::new(7, 2)), red);
        assert_eq!(target.pixel(Pos::new(7, 3)), BG);
        assert_eq!(target.pixel(Pos::new(5, 0)), BG);
    }

    #[test]
    fn camera_translates_world_to_buffer() {
        let mut target = RenderTarget::new(8, 8);
        target.camera_set(Pos::new(16, 16));
        let mut s = opaque(2, 2);
        s.set_pos(Pos::new(18, 17));
        target.blit(&s, Rect::default());
        assert_eq!(target.pixel(Pos::new(2, 1)), Pixel::argb(0xff, 0xee, 0, 0));

        target.camera_move(Pos::new(-16, -16));
        assert_eq!(target.camera_pos(), Pos::new(0, 0));
    }

    #[test]
    fn ignore_camera_pins_surface_to_screen() {
        let mut target = RenderTarget::new(8, 8);
        target.camera_set(Pos::new(100, 100));
        let mut hud = opaque(1, 1);
        hud.set_ignore_camera(true);
        hud.set_pos(Pos::new(3, 4));
        target.blit(&hud, Rect::default());
        assert_eq!(target.pixel(Pos::new(3, 4)), Pixel::argb(0xff, 0xee, 0, 0));
    }

    #[test]
    fn subrect_limits_the_copy() {
        let mut target = RenderTarget::new(8, 8);
        let s = opaque(4, 4);
        target.blit_offset(&s, Rect::new(Pos::new(1, 1), 2, 1), Pos::new(2, 0));

        let red = Pixel::argb(0xff, 0xee, 0, 0);
        assert_eq!(count(&target, red), 2);
        assert_eq!(target.pixel(Pos::new(3, 1)), red);
        assert_eq!(target.pixel(Pos::new(4, 1)), red);
    }

    #[test]
    fn finalize_masks_alpha_and_presents() {
        let mut target = RenderTarget::new(2, 1);
        target.clear(BG);
        target.finalize();

        let mut seen = Vec::new();
        let mut sink = |buf: &[Pixel], w: u32, h: u32, stride: usize| {
            seen.push((buf[0].raw(), w, h, stride));
        };
        target.present(&mut sink);
        assert_eq!(seen, vec![(0x0010_2030, 2, 1, 8)]);
    }

    #[test]
    #[should_panic(expected = "out-of-bounds")]
    fn out_of_bounds_fetch_panics() {
        let target = RenderTarget::new(2, 2);
        target.pixel(Pos::new(2, 0));
    }
}
