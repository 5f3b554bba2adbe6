//! Bounding Volume Hierarchy (BVH) shared by the ray and hitpoint accelerators.
//!
//! The tree is a flat node array. An interior node stores the index of its
//! left child; the right child always sits at `left + 1`. A leaf stores a
//! contiguous range of the item array, which the build reorders in place.

use lumen_math::Aabb;
use std::fmt::Write as _;
use std::ops::{ControlFlow, Range};

/// Ranges with at most this many items become leaves.
pub const MAX_LEAF_ITEMS: usize = 3;

/// Nodes at this depth become leaves regardless of their size.
pub const MAX_BUILD_DEPTH: u32 = 20;

/// Each level of descent leaves at most one sibling on the stack.
const TRAVERSAL_STACK_SIZE: usize = 64;

/// BVH node - either an interior node over two adjacent children or a leaf
/// over a range of items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    Interior {
        bbox: Aabb,
        /// Index of the left child; the right child is `left + 1`.
        left: u32,
        /// Number of items below this node.
        count: u32,
    },
    Leaf {
        bbox: Aabb,
        first: u32,
        count: u32,
    },
}

impl BvhNode {
    #[inline]
    pub fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Interior { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }

    #[inline]
    pub fn count(&self) -> u32 {
        match *self {
            BvhNode::Interior { count, .. } | BvhNode::Leaf { count, .. } => count,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }
}

/// Drives a traversal: decides which boxes to enter and consumes leaves.
pub trait TreeVisitor {
    /// Whether the subtree under `bbox` can contain anything of interest.
    fn overlaps(&self, bbox: &Aabb) -> bool;

    /// Visit the items of one leaf. `Break` ends the traversal.
    fn visit_leaf(&mut self, items: Range<usize>) -> ControlFlow<()>;
}

/// Shape of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: u32,
    pub max_leaf_items: u32,
}

/// Index-encoded binary tree over an external item array.
#[derive(Debug, Clone)]
pub struct BvhTree {
    nodes: Vec<BvhNode>,
}

impl BvhTree {
    /// Build a tree over `items`, reordering them so every leaf covers a
    /// contiguous range. `bounds` gives each item's box.
    pub fn build<T>(items: &mut [T], bounds: impl Fn(&T) -> Aabb) -> Self {
        let mut root_box = Aabb::EMPTY;
        for item in items.iter() {
            root_box.include_box(&bounds(item));
        }

        let mut builder = Builder {
            items,
            bounds,
            nodes: Vec::with_capacity(1),
        };
        builder.nodes.push(BvhNode::Leaf {
            bbox: root_box,
            first: 0,
            count: 0,
        });
        let len = builder.items.len();
        builder.split(0, 0..len, root_box, 0);

        let tree = Self {
            nodes: builder.nodes,
        };

        log::debug!("BVH built over {} items: {:?}", len, tree.stats());
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("BVH layout:\n{}", tree.describe());
        }

        tree
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Box around everything in the tree; `Aabb::EMPTY` for an empty tree.
    pub fn bounding_box(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |root| *root.bbox())
    }

    /// Depth-first traversal. Children are pushed right then left, each only
    /// if the visitor says its box overlaps.
    pub fn traverse<V: TreeVisitor + ?Sized>(&self, visitor: &mut V) -> ControlFlow<()> {
        match self.nodes.first() {
            Some(root) if visitor.overlaps(root.bbox()) => {}
            _ => return ControlFlow::Continue(()),
        }

        let mut stack = [0u32; TRAVERSAL_STACK_SIZE];
        let mut sp = 1;

        while sp > 0 {
            sp -= 1;
            match self.nodes[stack[sp] as usize] {
                BvhNode::Leaf { first, count, .. } => {
                    let first = first as usize;
                    visitor.visit_leaf(first..first + count as usize)?;
                }
                BvhNode::Interior { left, .. } => {
                    for child in [left + 1, left] {
                        if visitor.overlaps(self.nodes[child as usize].bbox()) {
                            stack[sp] = child;
                            sp += 1;
                        }
                    }
                }
            }
        }

        ControlFlow::Continue(())
    }

    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            nodes: self.nodes.len(),
            ..BvhStats::default()
        };
        self.walk(0, 0, &mut |node, depth| {
            stats.max_depth = stats.max_depth.max(depth);
            if let BvhNode::Leaf { count, .. } = *node {
                stats.leaves += 1;
                stats.max_leaf_items = stats.max_leaf_items.max(count);
            }
        });
        stats
    }

    /// One line per node, indented by depth.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.walk(0, 0, &mut |node, depth| {
            let indent = "  ".repeat(depth as usize);
            let b = node.bbox();
            let _ = match *node {
                BvhNode::Interior { left, count, .. } => writeln!(
                    out,
                    "{indent}interior [{} .. {}] children {}/{} items {}",
                    b.min,
                    b.max,
                    left,
                    left + 1,
                    count
                ),
                BvhNode::Leaf { first, count, .. } => writeln!(
                    out,
                    "{indent}leaf [{} .. {}] items {}..{}",
                    b.min,
                    b.max,
                    first,
                    first + count
                ),
            };
        });
        out
    }

    fn walk(&self, index: usize, depth: u32, f: &mut dyn FnMut(&BvhNode, u32)) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        f(node, depth);
        if let BvhNode::Interior { left, .. } = *node {
            self.walk(left as usize, depth + 1, f);
            self.walk(left as usize + 1, depth + 1, f);
        }
    }
}

struct Builder<'i, T, F> {
    items: &'i mut [T],
    bounds: F,
    nodes: Vec<BvhNode>,
}

impl<T, F: Fn(&T) -> Aabb> Builder<'_, T, F> {
    fn split(&mut self, index: usize, range: Range<usize>, bbox: Aabb, depth: u32) {
        let count = range.len() as u32;

        if range.len() <= MAX_LEAF_ITEMS || depth >= MAX_BUILD_DEPTH {
            self.nodes[index] = BvhNode::Leaf {
                bbox,
                first: range.start as u32,
                count,
            };
            return;
        }

        let axis = bbox.largest_axis();
        let midpoint = bbox.centroid()[axis];
        let bounds = &self.bounds;
        let slice = &mut self.items[range.clone()];

        slice.sort_by(|a, b| bounds(a).centroid()[axis].total_cmp(&bounds(b).centroid()[axis]));

        let mut split =
            range.start + slice.partition_point(|item| bounds(item).centroid()[axis] < midpoint);
        if split == range.start {
            split += 1;
        } else if split == range.end {
            split -= 1;
        }

        let left_box = self.union(range.start..split);
        let right_box = self.union(split..range.end);

        let left = self.nodes.len();
        let placeholder = BvhNode::Leaf {
            bbox: Aabb::EMPTY,
            first: 0,
            count: 0,
        };
        self.nodes.push(placeholder);
        self.nodes.push(placeholder);
        self.nodes[index] = BvhNode::Interior {
            bbox,
            left: left as u32,
            count,
        };

        self.split(left, range.start..split, left_box, depth + 1);
        self.split(left + 1, split..range.end, right_box, depth + 1);
    }

    fn union(&self, range: Range<usize>) -> Aabb {
        self.items[range].iter().fold(Aabb::EMPTY, |mut acc, item| {
            acc.include_box(&(self.bounds)(item));
            acc
        })
    }
}
