//! Packed pixel formats.
//!
//! A pixel is one `u32` holding four channels at fixed bit offsets. The layout is
//! part of the type, so the channel masks are compile-time constants and the
//! per-pixel loops in the blitter stay branch-light.

use std::ops::{BitAnd, BitOr};

const fn channel_mask(bits: u32, shift: u32) -> u32 {
    (((1u64 << bits) - 1) << shift) as u32
}

const fn disjoint(a: u32, b: u32) -> bool {
    a & b == 0
}

/// Pixel with `AB` alpha bits at offset `AS`, `RB` red bits at `RS`, and so on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PixelBase<
    const AB: u32,
    const AS: u32,
    const RB: u32,
    const RS: u32,
    const GB: u32,
    const GS: u32,
    const BB: u32,
    const BS: u32,
>(pub u32);

/// ARGB8888, the working format of every surface and render target.
pub type Pixel = PixelBase<8, 24, 8, 16, 8, 8, 8, 0>;

impl<
        const AB: u32,
        const AS: u32,
        const RB: u32,
        const RS: u32,
        const GB: u32,
        const GS: u32,
        const BB: u32,
        const BS: u32,
    > PixelBase<AB, AS, RB, RS, GB, GS, BB, BS>
{
    /// Bits of the alpha channel, in place.
    pub const ALPHA_MASK: u32 = channel_mask(AB, AS);
    /// Bits of the three colour channels, in place.
    pub const RGB_MASK: u32 = channel_mask(RB, RS) | channel_mask(GB, GS) | channel_mask(BB, BS);

    const LAYOUT: () = {
        assert!(AB >= 1 && AB <= 8, "alpha depth must be 1..=8 bits");
        assert!(RB >= 1 && RB <= 8, "red depth must be 1..=8 bits");
        assert!(GB >= 1 && GB <= 8, "green depth must be 1..=8 bits");
        assert!(BB >= 1 && BB <= 8, "blue depth must be 1..=8 bits");
        assert!(AS + AB <= 32 && RS + RB <= 32 && GS + GB <= 32 && BS + BB <= 32);

        let a = channel_mask(AB, AS);
        let r = channel_mask(RB, RS);
        let g = channel_mask(GB, GS);
        let b = channel_mask(BB, BS);
        assert!(
            disjoint(a, r) && disjoint(a, g) && disjoint(a, b) && disjoint(r, g) && disjoint(r, b) && disjoint(g, b),
            "channel masks overlap"
        );
    };

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Packs 8-bit channels, dropping the low bits each channel cannot hold.
    #[inline]
    pub fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        let () = Self::LAYOUT;
        let pack = |v: u8, bits: u32, shift: u32| ((v as u32) >> (8 - bits)) << shift;
        Self(pack(a, AB, AS) | pack(r, RB, RS) | pack(g, GB, GS) | pack(b, BB, BS))
    }

    #[inline]
    fn channel(self, bits: u32, shift: u32) -> u32 {
        (self.0 >> shift) & ((1u32 << bits) - 1)
    }

    #[inline]
    pub fn alpha(self) -> u32 {
        self.channel(AB, AS)
    }

    #[inline]
    pub fn red(self) -> u32 {
        self.channel(RB, RS)
    }

    #[inline]
    pub fn green(self) -> u32 {
        self.channel(GB, GS)
    }

    #[inline]
    pub fn blue(self) -> u32 {
        self.channel(BB, BS)
    }

    #[inline]
    pub fn has_alpha(self) -> bool {
        self.0 & Self::ALPHA_MASK != 0
    }

    #[inline]
    pub fn set_if_alpha(&mut self, src: Self) {
        if src.has_alpha() {
            *self = src;
        }
    }

    /// Cut-out compositing of one row: `src[i]` replaces `dst[i]` iff it has alpha.
    #[inline]
    pub fn set_line_if_alpha(dst: &mut [Self], src: &[Self]) {
        debug_assert_eq!(dst.len(), src.len());
        for (d, s) in dst.iter_mut().zip(src) {
            d.set_if_alpha(*s);
        }
    }

    #[inline]
    pub fn mask_rgb(self) -> Self {
        Self(self.0 & Self::RGB_MASK)
    }

    pub fn mask_rgb_line(buf: &mut [Self]) {
        for p in buf {
            *p = p.mask_rgb();
        }
    }

    /// Rounded average of the colour channels. Alpha of the result is zero.
    pub fn blend(a: Self, b: Self) -> Self {
        let avg = |x: u32, y: u32| (x + y + 1) >> 1;
        Self(
            (avg(a.red(), b.red()) << RS)
                | (avg(a.green(), b.green()) << GS)
                | (avg(a.blue(), b.blue()) << BS),
        )
    }
}

impl<
        const AB: u32,
        const AS: u32,
        const RB: u32,
        const RS: u32,
        const GB: u32,
        const GS: u32,
        const BB: u32,
        const BS: u32,
    > BitOr for PixelBase<AB, AS, RB, RS, GB, GS, BB, BS>
{
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl<
        const AB: u32,
        const AS: u32,
        const RB: u32,
        const RS: u32,
        const GB: u32,
        const GS: u32,
        const BB: u32,
        const BS: u32,
    > BitAnd for PixelBase<AB, AS, RB, RS, GB, GS, BB, BS>
{
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Argb1555 = PixelBase<1, 15, 5, 10, 5, 5, 5, 0>;

    #[test]
    fn argb8888_round_trips_every_channel() {
        for v in [0u8, 1, 0x7f, 0x80, 0xfe, 0xff] {
            let p = Pixel::argb(v, v ^ 0xff, v, v.wrapping_add(3));
            assert_eq!(p.alpha(), v as u32);
            assert_eq!(p.red(), (v ^ 0xff) as u32);
            assert_eq!(p.green(), v as u32);
            assert_eq!(p.blue(), v.wrapping_add(3) as u32);
        }
        assert_eq!(Pixel::argb(0x11, 0x22, 0x33, 0x44).raw(), 0x1122_3344);
    }

    #[test]
    fn narrow_channels_truncate() {
        let p = Argb1555::argb(0x80, 0xff, 0x0f, 0x88);
        assert_eq!(p.alpha(), 1);
        assert_eq!(p.red(), 0x1f);
        assert_eq!(p.green(), 0x01);
        assert_eq!(p.blue(), 0x11);
        assert!(!Argb1555::argb(0x7f, 0xff, 0xff, 0xff).has_alpha());
        assert_eq!(Argb1555::ALPHA_MASK, 0x8000);
        assert_eq!(Argb1555::RGB_MASK, 0x7fff);
    }

    #[test]
    fn line_copy_is_alpha_tested() {
        let mut dst = [Pixel::from_raw(0x00_010101); 3];
        let src = [
            Pixel::argb(0, 0xff, 0xff, 0xff),
            Pixel::argb(1, 0xaa, 0xbb, 0xcc),
            Pixel::argb(0xff, 0, 0, 0),
        ];
        Pixel::set_line_if_alpha(&mut dst, &src);
        assert_eq!(dst[0], Pixel::from_raw(0x00_010101));
        assert_eq!(dst[1], src[1]);
        assert_eq!(dst[2], src[2]);
    }

    #[test]
    fn blend_rounds_and_drops_alpha() {
        let a = Pixel::argb(0xff, 10, 0, 255);
        let b = Pixel::argb(0xff, 13, 1, 255);
        let m = Pixel::blend(a, b);
        assert_eq!(m.alpha(), 0);
        assert_eq!((m.red(), m.green(), m.blue()), (12, 1, 255));
    }

    #[test]
    fn mask_rgb_clears_alpha() {
        let mut buf = [Pixel::argb(0xff, 1, 2, 3), Pixel::argb(0x10, 4, 5, 6)];
        Pixel::mask_rgb_line(&mut buf);
        assert_eq!(buf[0].raw(), 0x0001_0203);
        assert_eq!(buf[1].raw(), 0x0004_0506);
    }
}
