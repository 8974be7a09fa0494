//! 3-D k-d tree over palette colors.
//!
//! [`KdTreeBuilder`] collects colors; [`KdTreeBuilder::build`] turns it into
//! an immutable [`KdTree`] that answers nearest-color queries. Nodes live in
//! one preorder arena: a split's left child is the next node, its right child
//! is stored by offset. Leaves own a range of the permutation array.

use std::borrow::Cow;

use log::{debug, trace};
use rgb::RGB8;

use crate::KdConfig;
use crate::error::KdError;
use crate::gamma::GammaTables;
use crate::kcolor::{ColorTransform, KColor, WKColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    /// Colors with `a[axis] < pivot` are in the left subtree, the rest in
    /// the right subtree.
    Split { axis: u8, pivot: i16, right: usize },
    Leaf { start: usize, end: usize },
}

/// An index that is still accepting colors.
#[derive(Debug, Clone)]
pub struct KdTreeBuilder {
    config: KdConfig,
    gamma: Cow<'static, GammaTables>,
    ks: Vec<KColor>,
}

impl KdTreeBuilder {
    /// Create an empty index.
    pub fn new(config: KdConfig) -> Result<Self, KdError> {
        config.validate()?;
        let gamma = GammaTables::for_curve(config.gamma)?;
        Ok(Self {
            config,
            gamma,
            ks: Vec::new(),
        })
    }

    /// Add `k` as-is, without applying the index's transform.
    /// Returns the color's index, which never changes afterwards.
    pub fn insert_transformed(&mut self, k: KColor) -> Result<usize, KdError> {
        self.ks.try_reserve(1)?;
        self.ks.push(k);
        Ok(self.ks.len() - 1)
    }

    /// Gamma-transform 8-bit `r/g/b`, apply the index's transform, and add it.
    pub fn insert_8bit(&mut self, r: u8, g: u8, b: u8) -> Result<usize, KdError> {
        let k = self.config.transform.apply(self.gamma.encode(r, g, b));
        self.insert_transformed(k)
    }

    pub fn insert_rgb(&mut self, px: RGB8) -> Result<usize, KdError> {
        self.insert_8bit(px.r, px.g, px.b)
    }

    pub fn len(&self) -> usize {
        self.ks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ks.is_empty()
    }

    pub fn colors(&self) -> &[KColor] {
        &self.ks
    }

    pub fn gamma(&self) -> &GammaTables {
        &self.gamma
    }

    /// Build the tree over every color inserted so far.
    pub fn build(self) -> KdTree {
        let mut perm: Vec<usize> = (0..self.ks.len()).collect();
        let mut part = Partitioner {
            ks: &self.ks,
            leaf_size: self.config.leaf_size,
            max_depth: self.config.max_depth,
            nodes: Vec::with_capacity(2 * self.ks.len() / self.config.leaf_size + 1),
            depth: 0,
        };
        part.partition(&mut perm, 0, 1);
        let Partitioner { nodes, depth, .. } = part;

        debug!(
            "kd-tree built: {} colors, {} nodes, depth {}",
            self.ks.len(),
            nodes.len(),
            depth
        );

        KdTree {
            config: self.config,
            gamma: self.gamma,
            ks: self.ks,
            perm,
            nodes,
            max_depth: depth,
            disabled: None,
            xradius: None,
        }
    }
}

struct Partitioner<'a> {
    ks: &'a [KColor],
    leaf_size: usize,
    max_depth: usize,
    nodes: Vec<Node>,
    depth: usize,
}

impl Partitioner<'_> {
    /// Partition `perm`, which occupies `offset..offset + perm.len()` of the
    /// full permutation, into the subtree rooted at the next free node.
    fn partition(&mut self, perm: &mut [usize], offset: usize, depth: usize) {
        self.depth = self.depth.max(depth);
        let n = perm.len();
        let split = if n > self.leaf_size && depth < self.max_depth {
            self.choose_split(perm)
        } else {
            None
        };
        let Some((axis, m)) = split else {
            self.nodes.push(Node::Leaf {
                start: offset,
                end: offset + n,
            });
            return;
        };

        let at = self.nodes.len();
        self.nodes.push(Node::Split {
            axis: axis as u8,
            pivot: self.ks[perm[m]].get(axis) as i16,
            right: 0,
        });
        let (lo, hi) = perm.split_at_mut(m);
        self.partition(lo, offset, depth + 1);
        let right_at = self.nodes.len();
        if let Node::Split { right, .. } = &mut self.nodes[at] {
            *right = right_at;
        }
        self.partition(hi, offset + m, depth + 1);
    }

    /// Pick the axis with the largest variance, sort `perm` along it, and
    /// return it with a split position near the median. The split always
    /// falls between two distinct values so both sides are non-empty.
    /// `None` if all colors are identical.
    fn choose_split(&self, perm: &mut [usize]) -> Option<(usize, usize)> {
        let n = perm.len();
        let mut sum = WKColor::ZERO;
        let mut sum2 = WKColor::ZERO;
        for &i in perm.iter() {
            sum.add(self.ks[i]);
            sum2.add_squares(self.ks[i]);
        }

        // n^2 * variance, exact
        let spread = |d: usize| n as i128 * sum2.a[d] as i128 - (sum.a[d] as i128).pow(2);
        let axis = (1..3).fold(0, |best, d| if spread(d) > spread(best) { d } else { best });
        if spread(axis) == 0 {
            return None;
        }

        let ks = self.ks;
        perm.sort_unstable_by_key(|&i| ks[i].get(axis));
        let value = |m: usize| ks[perm[m]].get(axis);
        let boundary = |m: &usize| value(*m - 1) != value(*m);
        let mid = n / 2;
        let m = (1..=mid)
            .rev()
            .find(boundary)
            .or_else(|| (mid + 1..n).find(boundary))?;
        Some((axis, m))
    }
}

#[derive(Debug, Clone, Copy)]
struct Best {
    index: Option<usize>,
    dist: u32,
}

/// A built index. Colors can no longer be added; call
/// [`KdTree::into_builder`] to add more and rebuild.
#[derive(Debug, Clone)]
pub struct KdTree {
    config: KdConfig,
    gamma: Cow<'static, GammaTables>,
    ks: Vec<KColor>,
    perm: Vec<usize>,
    nodes: Vec<Node>,
    max_depth: usize,
    disabled: Option<usize>,
    xradius: Option<Vec<u32>>,
}

impl KdTree {
    /// Index of the enabled color closest to `k`, which must already be
    /// transformed. `None` only if no color is enabled.
    pub fn closest(&self, k: KColor) -> Option<usize> {
        self.nearest_excluding(k, self.disabled).map(|(i, _)| i)
    }

    /// Gamma-transform 8-bit `r/g/b`, apply the index's transform, and
    /// return the index of the closest enabled color.
    pub fn closest_8bit(&self, r: u8, g: u8, b: u8) -> Option<usize> {
        self.closest(self.transformed(r, g, b))
    }

    pub fn closest_rgb(&self, px: RGB8) -> Option<usize> {
        self.closest_8bit(px.r, px.g, px.b)
    }

    /// Like [`KdTree::closest`], but first checks whether `k` lies inside
    /// `hint`'s exclusive radius, in which case `hint` is the answer and the
    /// tree is not walked. Useful when consecutive queries are similar.
    pub fn closest_with_hint(&self, k: KColor, hint: usize) -> Option<usize> {
        if self.disabled != Some(hint) {
            if let (Some(xradius), Some(&own)) = (self.xradius.as_deref(), self.ks.get(hint)) {
                if k.distance(own) < xradius[hint] {
                    return Some(hint);
                }
            }
        }
        self.closest(k)
    }

    /// Apply the index's gamma tables and transform to an 8-bit color.
    pub fn transformed(&self, r: u8, g: u8, b: u8) -> KColor {
        self.config.transform.apply(self.gamma.encode(r, g, b))
    }

    fn nearest_excluding(&self, k: KColor, skip: Option<usize>) -> Option<(usize, u32)> {
        let mut best = Best {
            index: None,
            dist: u32::MAX,
        };
        self.search(0, k, skip, &mut best);
        best.index.map(|i| (i, best.dist))
    }

    fn search(&self, node: usize, k: KColor, skip: Option<usize>, best: &mut Best) {
        match self.nodes[node] {
            Node::Leaf { start, end } => {
                for &i in &self.perm[start..end] {
                    if Some(i) == skip {
                        continue;
                    }
                    let d = k.distance(self.ks[i]);
                    if d < best.dist {
                        *best = Best {
                            index: Some(i),
                            dist: d,
                        };
                    }
                }
            }
            Node::Split { axis, pivot, right } => {
                let delta = k.get(axis as usize) - pivot as i32;
                let (near, far) = if delta < 0 {
                    (node + 1, right)
                } else {
                    (right, node + 1)
                };
                self.search(near, k, skip, best);
                if ((delta * delta) as u32) < best.dist {
                    self.search(far, k, skip, best);
                }
            }
        }
    }

    /// Compute the exclusive radius of every color: `xradius[i]` is the
    /// squared radius of the largest ball around color `i` that is closer
    /// to `i` than to any other color. The disabled slot does not affect it.
    pub fn build_xradius(&mut self) {
        let xradius = (0..self.ks.len())
            .map(|i| match self.nearest_excluding(self.ks[i], Some(i)) {
                Some((_, dist)) => dist / 4,
                None => u32::MAX,
            })
            .collect::<Vec<_>>();
        trace!("exclusive radii computed for {} colors", xradius.len());
        self.xradius = Some(xradius);
    }

    /// Exclusive radii, if [`KdTree::build_xradius`] has run. If
    /// `k.distance(colors()[i]) < xradius()[i]`, then `closest(k) == i`.
    pub fn xradius(&self) -> Option<&[u32]> {
        self.xradius.as_deref()
    }

    /// Exclude color `i` from query results until [`KdTree::enable_all`].
    /// Only one color can be disabled at a time.
    pub fn disable(&mut self, i: usize) -> Result<(), KdError> {
        if i >= self.ks.len() {
            return Err(KdError::IndexOutOfRange {
                index: i,
                len: self.ks.len(),
            });
        }
        match self.disabled {
            Some(d) if d != i => Err(KdError::AlreadyDisabled {
                disabled: d,
                requested: i,
            }),
            _ => {
                self.disabled = Some(i);
                Ok(())
            }
        }
    }

    pub fn enable_all(&mut self) {
        self.disabled = None;
    }

    pub fn disabled(&self) -> Option<usize> {
        self.disabled
    }

    /// Reopen the index for insertion. Colors keep their indexes; the tree,
    /// exclusive radii and disabled color are dropped.
    pub fn into_builder(self) -> KdTreeBuilder {
        KdTreeBuilder {
            config: self.config,
            gamma: self.gamma,
            ks: self.ks,
        }
    }

    pub fn len(&self) -> usize {
        self.ks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ks.is_empty()
    }

    pub fn color(&self, i: usize) -> Option<KColor> {
        self.ks.get(i).copied()
    }

    pub fn colors(&self) -> &[KColor] {
        &self.ks
    }

    /// Depth of the deepest leaf; a tree with a single leaf has depth 1.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn transform(&self) -> ColorTransform {
        self.config.transform
    }

    pub fn gamma(&self) -> &GammaTables {
        &self.gamma
    }
}
