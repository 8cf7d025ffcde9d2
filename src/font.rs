//! Bitmap fonts cut from a glyph sheet.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::cache::SurfaceCache;
use crate::error::{MapError, RenderError};
use crate::geom::{Pos, Rect};
use crate::loader::json_loader::{base_dir, read_json};
use crate::pixel::Pixel;
use crate::render_target::RenderTarget;
use crate::surface::Surface;

#[derive(Deserialize)]
struct JsonFont {
    glyphs: JsonGlyphs,
}

#[derive(Deserialize)]
struct JsonGlyphs {
    startascii: u32,
    width: i32,
    height: i32,
    glyphwidth: i32,
    glyphheight: i32,
    source: String,
}

/// Horizontal anchoring of each line relative to the `x` passed to `render_msg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Centered,
}

/// Fixed-width font. Glyphs ignore the camera.
#[derive(Debug, Clone)]
pub struct Font {
    glyphs: BTreeMap<char, Surface>,
    glyph_w: i32,
    glyph_h: i32,
}

impl Font {
    pub fn load(path: &Path, cache: &mut SurfaceCache) -> Result<Self, MapError> {
        let desc: JsonFont = read_json(path)?;
        let g = desc.glyphs;
        if g.width <= 0 || g.height <= 0 || g.glyphwidth <= 0 || g.glyphheight <= 0 {
            return Err(MapError::InvalidMap(format!(
                "Font {} has invalid glyph arguments",
                path.display()
            )));
        }

        let img_path = base_dir(path).join(&g.source);
        let sheet = cache.from_image(&img_path)?;
        let expected = (g.width * g.glyphwidth, g.height * g.glyphheight);
        let actual = (sheet.rect().w, sheet.rect().h);
        if actual != expected {
            return Err(MapError::GeometryMismatch {
                path: img_path,
                expected,
                actual,
            });
        }

        debug!("Loaded font {} ({} glyphs)", path.display(), g.width * g.height);
        Ok(Self::from_sheet(&sheet, g.startascii, g.width, g.height, g.glyphwidth, g.glyphheight))
    }

    /// Cuts `cols`x`rows` glyphs of `glyph_w`x`glyph_h` row-major from `sheet`,
    /// the first one mapping to code point `first`.
    pub fn from_sheet(sheet: &Surface, first: u32, cols: i32, rows: i32, glyph_w: i32, glyph_h: i32) -> Self {
        let mut glyphs = BTreeMap::new();
        let mut code = first;
        for y in 0..rows {
            for x in 0..cols {
                if let Some(c) = char::from_u32(code) {
                    let mut glyph = sheet.sub(Rect::new(Pos::new(x * glyph_w, y * glyph_h), glyph_w, glyph_h));
                    glyph.set_ignore_camera(true);
                    glyphs.insert(c, glyph);
                }
                code += 1;
            }
        }
        Self { glyphs, glyph_w, glyph_h }
    }

    pub fn glyph(&self, c: char) -> Result<&Surface, RenderError> {
        self.glyphs.get(&c).ok_or(RenderError::MissingGlyph(c))
    }

    pub fn glyph_size(&self) -> Pos {
        Pos::new(self.glyph_w, self.glyph_h)
    }

    pub fn set_color(&mut self, pix: Pixel) {
        for glyph in self.glyphs.values_mut() {
            glyph.refill_color(pix);
        }
    }

    /// Draws `msg` in screen space. `\n` starts a new line `glyph height + newline_offset` lower.
    ///
    /// Nothing is drawn if any glyph is missing.
    pub fn render_msg(
        &self,
        target: &mut RenderTarget,
        msg: &str,
        x: i32,
        y: i32,
        align: Alignment,
        newline_offset: i32,
    ) -> Result<(), RenderError> {
        if let Some(c) = msg.chars().find(|&c| c != '\n' && !self.glyphs.contains_key(&c)) {
            return Err(RenderError::MissingGlyph(c));
        }

        let mut line_y = y;
        for line in msg.split('\n') {
            let width = line.chars().count() as i32 * self.glyph_w;
            let mut pen = match align {
                Alignment::Left => x,
                Alignment::Right => x - width,
                Alignment::Centered => x - width / 2,
            };
            for c in line.chars() {
                target.blit_offset(self.glyph(c)?, Rect::default(), Pos::new(pen, line_y));
                pen += self.glyph_w;
            }
            line_y += self.glyph_h + newline_offset;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct OffsetFont {
    font: Font,
    offset: Pos,
}

/// Several fonts drawn on top of each other, e.g. a text with its drop shadow.
#[derive(Debug, Clone, Default)]
pub struct FontCluster {
    fonts: Vec<OffsetFont>,
}

impl FontCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `font` recoloured to `color`, drawn shifted by `offset`. Later fonts draw on top.
    pub fn add_font(&mut self, mut font: Font, offset: Pos, color: Pixel) {
        font.set_color(color);
        self.fonts.push(OffsetFont { font, offset });
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Largest glyph width and height over all fonts.
    pub fn glyph_size(&self) -> Pos {
        self.fonts.iter().fold(Pos::default(), |acc, f| {
            let size = f.font.glyph_size();
            Pos::new(acc.x.max(size.x), acc.y.max(size.y))
        })
    }

    pub fn render_msg(
        &self,
        target: &mut RenderTarget,
        msg: &str,
        x: i32,
        y: i32,
        align: Alignment,
        newline_offset: i32,
    ) -> Result<(), RenderError> {
        for f in &self.fonts {
            f.font
                .render_msg(target, msg, x + f.offset.x, y + f.offset.y, align, newline_offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryImageSource;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    // Two 2x2 glyphs side by side: 'A' fully set, 'B' only the top-left pixel.
    fn sheet() -> Surface {
        let on = Pixel::argb(0xff, 0x10, 0x10, 0x10);
        let off = Pixel::default();
        let pixels = vec![on, on, on, off, on, on, off, off];
        Surface::new(std::rc::Rc::new(crate::surface::SurfaceData::new(pixels, 4, 2)))
    }

    fn font() -> Font {
        Font::from_sheet(&sheet(), 'A' as u32, 2, 1, 2, 2)
    }

    fn lit(target: &RenderTarget) -> Vec<Pos> {
        let mut out = Vec::new();
        for y in 0..target.height() {
            for x in 0..target.width() {
                if target.pixel(Pos::new(x, y)).has_alpha() {
                    out.push(Pos::new(x, y));
                }
            }
        }
        out
    }

    #[test]
    fn glyphs_are_cut_in_order() {
        let f = font();
        assert_eq!(f.glyph_size(), Pos::new(2, 2));
        assert!(f.glyph('A').expect("A").pixel(Pos::new(1, 1)).has_alpha());
        assert!(!f.glyph('B').expect("B").pixel(Pos::new(1, 1)).has_alpha());
        assert_eq!(f.glyph('C').unwrap_err(), RenderError::MissingGlyph('C'));
    }

    #[test]
    fn messages_ignore_the_camera_and_wrap() {
        let mut target = RenderTarget::new(6, 6);
        target.camera_set(Pos::new(50, 50));
        font().render_msg(&mut target, "B\nBB", 1, 0, Alignment::Left, 1).expect("render");
        assert_eq!(lit(&target), vec![Pos::new(1, 0), Pos::new(1, 3), Pos::new(3, 3)]);
    }

    #[test]
    fn alignment_shifts_each_line() {
        let mut target = RenderTarget::new(8, 2);
        font().render_msg(&mut target, "BB", 6, 0, Alignment::Right, 0).expect("render");
        assert_eq!(lit(&target), vec![Pos::new(2, 0), Pos::new(4, 0)]);

        let mut target = RenderTarget::new(8, 2);
        font().render_msg(&mut target, "BB", 4, 0, Alignment::Centered, 0).expect("render");
        assert_eq!(lit(&target), vec![Pos::new(2, 0), Pos::new(4, 0)]);
    }

    #[test]
    fn missing_glyph_draws_nothing() {
        let mut target = RenderTarget::new(8, 2);
        let err = font().render_msg(&mut target, "AZ", 0, 0, Alignment::Left, 0).unwrap_err();
        assert_eq!(err, RenderError::MissingGlyph('Z'));
        assert!(lit(&target).is_empty());
    }

    #[test]
    fn cluster_draws_every_font_with_its_offset_and_color() {
        let mut cluster = FontCluster::new();
        cluster.add_font(font(), Pos::new(1, 1), Pixel::argb(0xff, 0, 0, 0));
        cluster.add_font(font(), Pos::new(0, 0), Pixel::argb(0xff, 0xff, 0xff, 0xff));
        assert_eq!(cluster.glyph_size(), Pos::new(2, 2));

        let mut target = RenderTarget::new(4, 4);
        cluster.render_msg(&mut target, "B", 0, 0, Alignment::Left, 0).expect("render");
        assert_eq!(target.pixel(Pos::new(0, 0)), Pixel::argb(0xff, 0xff, 0xff, 0xff));
        assert_eq!(target.pixel(Pos::new(1, 1)), Pixel::argb(0xff, 0, 0, 0));
    }

    #[test]
    fn load_checks_sheet_geometry() {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("clock").as_nanos();
        let dir = std::env::temp_dir().join(format!("icethaw_font_{nanos}"));
        fs::create_dir_all(&dir).expect("temp dir");
        let desc = dir.join("font.json");
        fs::write(
            &desc,
            r#"{"glyphs":{"startascii":65,"width":2,"height":1,"glyphwidth":2,"glyphheight":2,"source":"font.png"}}"#,
        )
        .expect("write font");

        let mut images = MemoryImageSource::new();
        images.insert_rgba(dir.join("font.png"), 4, 2, [0xff, 0xff, 0xff, 0xff].repeat(8));
        let f = Font::load(&desc, &mut SurfaceCache::new(images)).expect("font");
        assert!(f.glyph('B').is_ok());

        let mut images = MemoryImageSource::new();
        images.insert_rgba(dir.join("font.png"), 2, 2, [0xff, 0xff, 0xff, 0xff].repeat(4));
        let err = Font::load(&desc, &mut SurfaceCache::new(images)).unwrap_err();
        assert!(matches!(err, MapError::GeometryMismatch { expected: (4, 2), actual: (2, 2), .. }));
    }
}
