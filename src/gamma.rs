//! Gamma lookup tables between 8-bit channels and the 15-bit color space.
//!
//! `forward` maps each byte to its gamma-decoded (linear light) value scaled
//! to `[0, KC_MAX]`. `reverse` is indexed by `value >> 7` and yields a
//! byte-scaled lower bound (`b << 7`) that [`GammaTables::decode`] refines
//! with a short upward walk.

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

use linear_srgb::scalar::{gamma_to_linear_f64, srgb_to_linear_f64};
use rgb::RGB8;

use crate::error::KdError;
use crate::kcolor::{KC_MAX, KColor};

/// Highest byte-scaled value (`255 << 7`).
const REV_TOP: i32 = 0x7F80;
const REV_STEP: i32 = 0x80;

/// Transfer curve used to build gamma tables.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GammaCurve {
    /// IEC 61966-2-1 sRGB curve.
    #[default]
    Srgb,
    /// Pure power curve, `linear = encoded ^ gamma`.
    Power(f64),
}

static SRGB_TABLES: OnceLock<GammaTables> = OnceLock::new();

/// Forward and reverse gamma tables for one curve. Immutable once built.
#[derive(Clone, PartialEq)]
pub struct GammaTables {
    curve: GammaCurve,
    forward: [u16; 256],
    reverse: [u16; 256],
}

impl GammaTables {
    /// Build tables for `curve`.
    pub fn new(curve: GammaCurve) -> Result<Self, KdError> {
        if let GammaCurve::Power(gamma) = curve {
            if !gamma.is_finite() || gamma <= 0.0 {
                return Err(KdError::InvalidGamma(gamma));
            }
        }
        Ok(Self::build(curve))
    }

    /// Process-wide sRGB tables, computed on first use.
    pub fn srgb() -> &'static GammaTables {
        SRGB_TABLES.get_or_init(|| Self::build(GammaCurve::Srgb))
    }

    /// Shared tables for sRGB, owned tables for anything else.
    pub(crate) fn for_curve(curve: GammaCurve) -> Result<Cow<'static, GammaTables>, KdError> {
        match curve {
            GammaCurve::Srgb => Ok(Cow::Borrowed(Self::srgb())),
            other => Self::new(other).map(Cow::Owned),
        }
    }

    fn build(curve: GammaCurve) -> Self {
        let mut forward = [0u16; 256];
        for (v, entry) in forward.iter_mut().enumerate() {
            let encoded = v as f64 / 255.0;
            let linear = match curve {
                GammaCurve::Srgb => srgb_to_linear_f64(encoded),
                GammaCurve::Power(gamma) => gamma_to_linear_f64(encoded, gamma),
            };
            *entry = (linear.clamp(0.0, 1.0) * KC_MAX as f64 + 0.5) as u16;
        }
        // decode() relies on a non-decreasing table.
        for v in 1..256 {
            forward[v] = forward[v].max(forward[v - 1]);
        }

        let mut reverse = [0u16; 256];
        let mut b = 0usize;
        for (j, entry) in reverse.iter_mut().enumerate() {
            let target = (j << 7) as u16;
            while b < 255 && forward[b + 1] <= target {
                b += 1;
            }
            *entry = (b << 7) as u16;
        }

        Self {
            curve,
            forward,
            reverse,
        }
    }

    /// The curve these tables were built from.
    pub fn curve(&self) -> GammaCurve {
        self.curve
    }

    pub fn forward(&self) -> &[u16; 256] {
        &self.forward
    }

    pub fn reverse(&self) -> &[u16; 256] {
        &self.reverse
    }

    /// Gamma-transform 8-bit `r/g/b` into the 15-bit space.
    #[inline]
    pub fn encode(&self, r: u8, g: u8, b: u8) -> KColor {
        KColor::from_raw([
            self.forward[r as usize] as i16,
            self.forward[g as usize] as i16,
            self.forward[b as usize] as i16,
        ])
    }

    #[inline]
    pub fn encode_rgb(&self, px: RGB8) -> KColor {
        self.encode(px.r, px.g, px.b)
    }

    /// Reverse gamma transform. Each channel becomes the largest byte-scaled
    /// value (`b << 7`) whose forward encoding does not exceed the input.
    pub fn decode(&self, k: KColor) -> KColor {
        let mut out = [0i16; 3];
        for (d, slot) in out.iter_mut().enumerate() {
            let v = k.get(d);
            let mut c = self.reverse[(v >> 7) as usize] as i32;
            while c < REV_TOP && v >= self.forward[((c + REV_STEP) >> 7) as usize] as i32 {
                c += REV_STEP;
            }
            *slot = c as i16;
        }
        KColor::from_raw(out)
    }

    /// Nearest 8-bit color for `k`, via [`GammaTables::decode`].
    pub fn to_rgb8(&self, k: KColor) -> RGB8 {
        let c = self.decode(k);
        RGB8::new(
            (c.get(0) >> 7) as u8,
            (c.get(1) >> 7) as u8,
            (c.get(2) >> 7) as u8,
        )
    }

    /// `#RRGGBB` string for `k`, for diagnostics.
    pub fn hex(&self, k: KColor) -> String {
        let px = self.to_rgb8(k);
        format!("#{:02X}{:02X}{:02X}", px.r, px.g, px.b)
    }
}

impl fmt::Debug for GammaTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GammaTables")
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}
