//! Fixed-point colors in the gamma-corrected space.
//!
//! Each channel has 15 bits of precision, so `KC_MAX * KC_MAX` fits in an
//! `i32` and a squared 3-D distance always fits in a `u32`.

use core::fmt;

pub const KC_MAX: i32 = 0x7FFF;
pub const KC_WHOLE: i32 = 0x8000;
pub const KC_HALF: i32 = 0x4000;
pub const KC_BITS: u32 = 15;

#[inline]
const fn clampv(v: i32) -> i16 {
    if v < 0 {
        0
    } else if v < KC_MAX {
        v as i16
    } else {
        KC_MAX as i16
    }
}

/// A 3-D color vector. Every component is in `[0, KC_MAX]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KColor {
    a: [i16; 3],
}

impl KColor {
    /// Build a color, clamping each component to `[0, KC_MAX]`.
    pub const fn new(a0: i32, a1: i32, a2: i32) -> Self {
        Self {
            a: [clampv(a0), clampv(a1), clampv(a2)],
        }
    }

    /// Callers guarantee the components are already in range.
    #[inline]
    pub(crate) const fn from_raw(a: [i16; 3]) -> Self {
        Self { a }
    }

    #[inline]
    pub fn get(self, axis: usize) -> i32 {
        self.a[axis] as i32
    }

    pub fn channels(self) -> [i16; 3] {
        self.a
    }

    /// Squared Euclidean distance.
    #[inline]
    pub fn distance(self, other: Self) -> u32 {
        let d0 = (self.a[0] as i32 - other.a[0] as i32).unsigned_abs();
        let d1 = (self.a[1] as i32 - other.a[1] as i32).unsigned_abs();
        let d2 = (self.a[2] as i32 - other.a[2] as i32).unsigned_abs();
        d0 * d0 + d1 * d1 + d2 * d2
    }

    /// Luminance in `[0, KC_MAX]`, using the 0.299/0.587/0.114 weights
    /// scaled to 306/601/117 over 1024.
    #[inline]
    pub fn luminance(self) -> i32 {
        (306 * self.a[0] as i32 + 601 * self.a[1] as i32 + 117 * self.a[2] as i32) >> 10
    }

    /// Grayscale version of this color: every channel set to its luminance.
    pub fn luminance_transform(self) -> Self {
        let l = self.luminance() as i16;
        Self { a: [l, l, l] }
    }
}

impl fmt::Debug for KColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KColor({:#06x}, {:#06x}, {:#06x})", self.a[0], self.a[1], self.a[2])
    }
}

/// Like [`KColor`] but with wide components, for sums over many colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WKColor {
    pub a: [i64; 3],
}

impl WKColor {
    pub const ZERO: Self = Self { a: [0; 3] };

    pub fn clear(&mut self) {
        self.a = [0; 3];
    }

    #[inline]
    pub fn add(&mut self, k: KColor) {
        for d in 0..3 {
            self.a[d] += k.get(d) as i64;
        }
    }

    #[inline]
    pub fn add_squares(&mut self, k: KColor) {
        for d in 0..3 {
            let v = k.get(d) as i64;
            self.a[d] += v * v;
        }
    }

    /// Component-wise mean of `n` accumulated colors, rounded to nearest.
    pub fn mean(&self, n: usize) -> KColor {
        if n == 0 {
            return KColor::default();
        }
        let n = n as i64;
        let m = |v: i64| ((v + n / 2) / n) as i32;
        KColor::new(m(self.a[0]), m(self.a[1]), m(self.a[2]))
    }
}

/// Color transform applied to every inserted and queried color of an index.
#[derive(Debug, Clone, Copy, Default)]
pub enum ColorTransform {
    #[default]
    Identity,
    /// Compare colors by luminance only, for grayscale palettes.
    Luminance,
    Custom(fn(KColor) -> KColor),
}

impl ColorTransform {
    #[inline]
    pub fn apply(self, k: KColor) -> KColor {
        match self {
            Self::Identity => k,
            Self::Luminance => k.luminance_transform(),
            Self::Custom(f) => f(k),
        }
    }
}
