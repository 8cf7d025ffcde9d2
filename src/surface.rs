//! Surfaces: shared immutable pixel data plus per-instance placement.
//!
//! Cloning a [`Surface`] never copies pixels. Every clone made from the same
//! load or [`Surface::sub`] call points at the same [`SurfaceData`]; only the
//! placement rect, attributes and active variant are per instance.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::RenderError;
use crate::geom::{Pos, Rect};
use crate::ir_map::Attributes;
use crate::pixel::Pixel;
use crate::render_target::RenderTarget;

/// Immutable pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct SurfaceData {
    pixels: Vec<Pixel>,
    w: i32,
    h: i32,
}

impl SurfaceData {
    /// Panics if `pixels.len() != w * h`.
    pub fn new(pixels: Vec<Pixel>, w: i32, h: i32) -> Self {
        assert!(w >= 0 && h >= 0, "negative surface size {}x{}", w, h);
        assert_eq!(pixels.len(), (w * h) as usize, "pixel count does not match {}x{}", w, h);
        Self { pixels, w, h }
    }

    pub fn filled(pix: Pixel, w: i32, h: i32) -> Self {
        Self::new(vec![pix; (w.max(0) * h.max(0)) as usize], w.max(0), h.max(0))
    }

    /// Converts tightly packed RGBA8 bytes, as produced by image decoders.
    pub fn from_rgba8(bytes: &[u8], w: i32, h: i32) -> Self {
        let pixels = bytes
            .chunks_exact(4)
            .map(|px| Pixel::argb(px[3], px[0], px[1], px[2]))
            .collect();
        Self::new(pixels, w, h)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.w
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.h
    }

    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// `len` pixels starting at local `pos`. Out-of-bounds access is a bug in the caller.
    pub fn row(&self, pos: Pos, len: i32) -> &[Pixel] {
        assert!(
            pos.x >= 0 && pos.y >= 0 && len >= 0 && pos.x + len <= self.w && pos.y < self.h,
            "Pixel was fetched out-of-bounds. Asked for: ({}, {}) x {}. Real dimension: ({}, {}).",
            pos.x,
            pos.y,
            len,
            self.w,
            self.h
        );
        let start = (pos.y * self.w + pos.x) as usize;
        &self.pixels[start..start + len as usize]
    }
}

impl fmt::Debug for SurfaceData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceData").field("w", &self.w).field("h", &self.h).finish()
    }
}

/// One named image of a multi-image sprite.
#[derive(Debug, Clone)]
pub struct Alt {
    pub data: Rc<SurfaceData>,
    pub tag: String,
}

type VariantTable = BTreeMap<String, Vec<Rc<SurfaceData>>>;

#[derive(Debug, Clone)]
pub struct Surface {
    data: Rc<SurfaceData>,
    alts: Rc<VariantTable>,
    active_alt: String,
    active_alt_index: usize,
    attribs: Attributes,
    rect: Rect,
    ignore_camera: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(Rc::new(SurfaceData::filled(Pixel::default(), 0, 0)))
    }
}

impl Surface {
    pub fn new(data: Rc<SurfaceData>) -> Self {
        let rect = Rect::sized(data.width(), data.height());
        Self {
            data,
            alts: Rc::new(VariantTable::new()),
            active_alt: String::new(),
            active_alt_index: 0,
            attribs: Attributes::new(),
            rect,
            ignore_camera: false,
        }
    }

    /// Solid colour surface.
    pub fn filled(pix: Pixel, w: i32, h: i32) -> Self {
        Self::new(Rc::new(SurfaceData::filled(pix, w, h)))
    }

    /// Multi-image surface starting on the first image tagged `start_id`.
    ///
    /// Images sharing a tag are addressed by their order in `alts`.
    pub fn from_alts(alts: Vec<Alt>, start_id: &str) -> Result<Self, RenderError> {
        let first = alts.first().ok_or(RenderError::NoVariants)?.data.clone();

        let mut table = VariantTable::new();
        for alt in alts {
            table.entry(alt.tag).or_default().push(alt.data);
        }

        let mut surf = Self::new(first);
        surf.alts = Rc::new(table);
        surf.set_active_alt(start_id, 0)?;
        Ok(surf)
    }

    /// New surface holding a copy of the pixels under `rect` (surface-local).
    ///
    /// Parts of `rect` outside this surface come out transparent.
    pub fn sub(&self, rect: Rect) -> Surface {
        let mut target = RenderTarget::new(rect.w, rect.h);
        let mut surf = self.clone();
        surf.rect.pos = -rect.pos;
        surf.ignore_camera = false;
        target.blit(&surf, rect);
        target.into_surface()
    }

    /// Recolours every visible pixel to `pix` at full alpha.
    pub fn refill_color(&mut self, pix: Pixel) {
        let solid = Pixel::from_raw((pix.raw() & Pixel::RGB_MASK) | Pixel::ALPHA_MASK);
        let pixels = self
            .data
            .pixels()
            .iter()
            .map(|p| if p.has_alpha() { solid } else { Pixel::default() })
            .collect();
        self.data = Rc::new(SurfaceData::new(pixels, self.data.width(), self.data.height()));
    }

    /// Half-size copy, each output pixel the blend of a 2x2 block.
    pub fn downscaled(&self) -> Surface {
        let (w, h) = (self.data.width() / 2, self.data.height() / 2);
        let src = &self.data;
        let at = |x: i32, y: i32| src.pixels()[(y * src.width() + x) as usize];

        let mut pixels = Vec::with_capacity((w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                let top = Pixel::blend(at(2 * x, 2 * y), at(2 * x + 1, 2 * y));
                let bottom = Pixel::blend(at(2 * x, 2 * y + 1), at(2 * x + 1, 2 * y + 1));
                pixels.push(Pixel::blend(top, bottom) | Pixel::from_raw(Pixel::ALPHA_MASK));
            }
        }
        Surface::new(Rc::new(SurfaceData::new(pixels, w, h)))
    }

    #[inline]
    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    #[inline]
    pub fn rect_mut(&mut self) -> &mut Rect {
        &mut self.rect
    }

    #[inline]
    pub fn pos(&self) -> Pos {
        self.rect.pos
    }

    #[inline]
    pub fn set_pos(&mut self, pos: Pos) {
        self.rect.pos = pos;
    }

    #[inline]
    pub fn ignore_camera(&self) -> bool {
        self.ignore_camera
    }

    pub fn set_ignore_camera(&mut self, ignore: bool) {
        self.ignore_camera = ignore;
    }

    #[inline]
    pub fn data(&self) -> &Rc<SurfaceData> {
        &self.data
    }

    /// True if both surfaces currently point at the same pixel buffer.
    pub fn shares_data(&self, other: &Surface) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Pixel at world position `pos`; transparent black outside the surface.
    pub fn pixel(&self, pos: Pos) -> Pixel {
        let local = pos - self.rect.pos;
        if local.x < 0 || local.y < 0 || local.x >= self.data.width() || local.y >= self.data.height() {
            return Pixel::default();
        }
        self.data.pixels()[(local.y * self.data.width() + local.x) as usize]
    }

    pub fn attr(&self) -> &Attributes {
        &self.attribs
    }

    pub fn attr_mut(&mut self) -> &mut Attributes {
        &mut self.attribs
    }

    /// Currently selected variant id and index.
    pub fn active_alt(&self) -> (&str, usize) {
        (&self.active_alt, self.active_alt_index)
    }

    /// Points this surface at variant `id`/`index`. Placement and attributes are kept.
    pub fn set_active_alt(&mut self, id: &str, index: usize) -> Result<(), RenderError> {
        let data = self
            .alts
            .get(id)
            .and_then(|v| v.get(index))
            .cloned()
            .ok_or_else(|| RenderError::UnknownVariant {
                id: id.to_owned(),
                index,
            })?;
        self.data = data;
        if self.active_alt != id {
            self.active_alt = id.to_owned();
        }
        self.active_alt_index = index;
        Ok(())
    }

    pub fn set_active_alt_index(&mut self, index: usize) -> Result<(), RenderError> {
        let id = self.active_alt.clone();
        self.set_active_alt(&id, index)
    }

    /// Number of images registered under `id`.
    pub fn alt_count(&self, id: &str) -> usize {
        self.alts.get(id).map_or(0, Vec::len)
    }
}
