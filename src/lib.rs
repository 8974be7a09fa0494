//! Exact nearest-palette-color lookup.
//!
//! Colors are gamma-transformed into a 15-bit fixed-point space
//! ([`KColor`]) and indexed by a 3-D k-d tree ([`KdTree`]). Each pixel of an
//! image maps to its palette entry with one [`KdTree::closest_8bit`] call.
//!
//! ```
//! use zenkd::{KdConfig, build_from_palette};
//!
//! let palette = [
//!     rgb::RGB8::new(0, 0, 0),
//!     rgb::RGB8::new(255, 255, 255),
//!     rgb::RGB8::new(255, 0, 0),
//! ];
//! let tree = build_from_palette(&palette, &KdConfig::default()).unwrap();
//! assert_eq!(tree.closest_8bit(10, 10, 10), Some(0));
//! assert_eq!(tree.closest_8bit(200, 30, 20), Some(2));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod gamma;
pub mod kcolor;
pub mod kdtree;

pub use error::KdError;
pub use gamma::{GammaCurve, GammaTables};
pub use kcolor::{ColorTransform, KC_BITS, KC_HALF, KC_MAX, KC_WHOLE, KColor, WKColor};
pub use kdtree::{KdTree, KdTreeBuilder};

/// Configuration for a color index.
#[derive(Debug, Clone)]
pub struct KdConfig {
    /// Transform applied to every inserted and queried color.
    pub transform: ColorTransform,
    /// Gamma curve for 8-bit conversions.
    pub gamma: GammaCurve,
    /// Nodes with at most this many colors become leaves (1..=64).
    pub leaf_size: usize,
    /// Maximum tree depth, counting the root as 1 (1..=64).
    pub max_depth: usize,
}

impl Default for KdConfig {
    fn default() -> Self {
        Self {
            transform: ColorTransform::Identity,
            gamma: GammaCurve::Srgb,
            leaf_size: 4,
            max_depth: 32,
        }
    }
}

impl KdConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(mut self, transform: ColorTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn gamma(mut self, gamma: GammaCurve) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn leaf_size(mut self, n: usize) -> Self {
        self.leaf_size = n;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), KdError> {
        if !(1..=64).contains(&self.leaf_size) {
            return Err(KdError::InvalidLeafSize(self.leaf_size));
        }
        if !(1..=64).contains(&self.max_depth) {
            return Err(KdError::InvalidMaxDepth(self.max_depth));
        }
        Ok(())
    }
}

/// Build an index over `palette`. Color `i` of the index is `palette[i]`.
pub fn build_from_palette(palette: &[rgb::RGB8], config: &KdConfig) -> Result<KdTree, KdError> {
    let mut builder = KdTreeBuilder::new(config.clone())?;
    for &px in palette {
        builder.insert_rgb(px)?;
    }
    Ok(builder.build())
}
