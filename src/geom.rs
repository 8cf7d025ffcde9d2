//! Integer positions and rectangles in pixel or tile space.

use std::fmt;
use std::ops::{Add, AddAssign, BitAnd, BitAndAssign, Mul, Neg, Sub, SubAssign};

/// A point or offset. Ordered by `x`, then `y`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise product, used for tile → pixel conversion.
    #[inline]
    pub const fn scale(self, sx: i32, sy: i32) -> Self {
        Self::new(self.x * sx, self.y * sy)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {} ]", self.x, self.y)
    }
}

impl Add for Pos {
    type Output = Pos;
    #[inline]
    fn add(self, rhs: Pos) -> Pos {
        Pos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Pos {
    #[inline]
    fn add_assign(&mut self, rhs: Pos) {
        *self = *self + rhs;
    }
}

impl Sub for Pos {
    type Output = Pos;
    #[inline]
    fn sub(self, rhs: Pos) -> Pos {
        Pos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Pos {
    #[inline]
    fn sub_assign(&mut self, rhs: Pos) {
        *self = *self - rhs;
    }
}

impl Neg for Pos {
    type Output = Pos;
    #[inline]
    fn neg(self) -> Pos {
        Pos::new(-self.x, -self.y)
    }
}

impl Mul<i32> for Pos {
    type Output = Pos;
    #[inline]
    fn mul(self, k: i32) -> Pos {
        Pos::new(self.x * k, self.y * k)
    }
}

/// Axis-aligned rectangle. `w <= 0 || h <= 0` means empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub pos: Pos,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    #[inline]
    pub const fn new(pos: Pos, w: i32, h: i32) -> Self {
        Self { pos, w, h }
    }

    /// Rect of the given size at the origin.
    #[inline]
    pub const fn sized(w: i32, h: i32) -> Self {
        Self::new(Pos::new(0, 0), w, h)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    #[inline]
    pub fn contains(&self, p: Pos) -> bool {
        p.x >= self.pos.x && p.y >= self.pos.y && p.x < self.pos.x + self.w && p.y < self.pos.y + self.h
    }
}

impl Add<Pos> for Rect {
    type Output = Rect;
    #[inline]
    fn add(self, rhs: Pos) -> Rect {
        Rect::new(self.pos + rhs, self.w, self.h)
    }
}

impl AddAssign<Pos> for Rect {
    #[inline]
    fn add_assign(&mut self, rhs: Pos) {
        self.pos += rhs;
    }
}

impl Sub<Pos> for Rect {
    type Output = Rect;
    #[inline]
    fn sub(self, rhs: Pos) -> Rect {
        Rect::new(self.pos - rhs, self.w, self.h)
    }
}

impl SubAssign<Pos> for Rect {
    #[inline]
    fn sub_assign(&mut self, rhs: Pos) {
        self.pos -= rhs;
    }
}

/// Intersection. Disjoint or touching rects give `Rect::default()`.
impl BitAnd for Rect {
    type Output = Rect;

    fn bitand(self, rhs: Rect) -> Rect {
        let x_left = self.pos.x.max(rhs.pos.x);
        let x_right = (self.pos.x + self.w).min(rhs.pos.x + rhs.w);
        let y_top = self.pos.y.max(rhs.pos.y);
        let y_bottom = (self.pos.y + self.h).min(rhs.pos.y + rhs.h);

        let width = x_right - x_left;
        let height = y_bottom - y_top;
        if width <= 0 || height <= 0 {
            Rect::default()
        } else {
            Rect::new(Pos::new(x_left, y_top), width, height)
        }
    }
}

impl BitAndAssign for Rect {
    #[inline]
    fn bitand_assign(&mut self, rhs: Rect) {
        *self = *self & rhs;
    }
}
