//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over [`GeometryId`]s. Nodes never own geometry; traversal
//! resolves ids through the scene's [`GeometryArena`].

use crate::hittable::{GeometryArena, GeometryId, HitRecord};
use crate::Ray;
use ember_math::{Aabb, Interval};
use rand::{Rng, RngCore};

/// BVH node: a branch with two subtrees, a leaf with two primitives, or
/// nothing at all.
///
/// A leaf built over a single primitive stores the same id twice.
#[derive(Debug)]
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node with one or two primitives.
    Leaf {
        left: GeometryId,
        right: GeometryId,
        bbox: Aabb,
    },
    /// Empty tree (scene without geometry).
    Empty,
}

/// Shape summary of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub branches: usize,
    pub leaves: usize,
    pub depth: usize,
}

impl BvhNode {
    /// Build a BVH over `ids`, which is reordered in place.
    ///
    /// Boxes are taken over the shutter interval `time`. Each node splits on
    /// an axis drawn from `rng`.
    pub fn new(
        arena: &GeometryArena,
        ids: &mut [GeometryId],
        time: Interval,
        rng: &mut dyn RngCore,
    ) -> Self {
        if ids.is_empty() {
            return BvhNode::Empty;
        }

        let boxes = primitive_boxes(arena, time);
        let root = Self::build(&boxes, ids, rng);

        let stats = root.stats();
        log::debug!(
            "BVH over {} primitives: {} branches, {} leaves, depth {}",
            ids.len(),
            stats.branches,
            stats.leaves,
            stats.depth
        );
        root
    }

    /// Recursive construction.
    ///
    /// Objects are ordered by the minimum of their box on a random axis and
    /// split in half.
    fn build(boxes: &[Aabb], ids: &mut [GeometryId], rng: &mut dyn RngCore) -> Self {
        let axis = rng.gen_range(0..3usize);
        let key = |id: &GeometryId| boxes[id.index()].axis_interval(axis).min;

        match ids.len() {
            0 => BvhNode::Empty,
            1 => BvhNode::Leaf {
                left: ids[0],
                right: ids[0],
                bbox: boxes[ids[0].index()],
            },
            2 => {
                let (left, right) = if key(&ids[0]) <= key(&ids[1]) {
                    (ids[0], ids[1])
                } else {
                    (ids[1], ids[0])
                };
                BvhNode::Leaf {
                    left,
                    right,
                    bbox: Aabb::surrounding(&boxes[left.index()], &boxes[right.index()]),
                }
            }
            n => {
                ids.sort_unstable_by(|a, b| key(a).total_cmp(&key(b)));

                let (left_ids, right_ids) = ids.split_at_mut(n / 2);
                let left = Self::build(boxes, left_ids, rng);
                let right = Self::build(boxes, right_ids, rng);

                let bbox = match (left.bounding_box(), right.bounding_box()) {
                    (Some(l), Some(r)) => Aabb::surrounding(&l, &r),
                    (Some(b), None) | (None, Some(b)) => b,
                    (None, None) => Aabb::EMPTY,
                };

                BvhNode::Branch {
                    left: Box::new(left),
                    right: Box::new(right),
                    bbox,
                }
            }
        }
    }

    /// Box around everything below this node, `None` for an empty tree.
    pub fn bounding_box(&self) -> Option<Aabb> {
        match self {
            BvhNode::Empty => None,
            BvhNode::Leaf { bbox, .. } | BvhNode::Branch { bbox, .. } => Some(*bbox),
        }
    }

    /// Nearest hit among the primitives below this node.
    pub fn hit<'a>(
        &'a self,
        arena: &'a GeometryArena,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        match self {
            BvhNode::Empty => None,

            BvhNode::Leaf { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = arena.get(*left).hit(ray, ray_t, rng);
                if left == right {
                    return hit_left;
                }

                // Only check right up to closest hit
                let right_t = hit_left
                    .as_ref()
                    .map_or(ray_t, |rec| ray_t.with_max(rec.t));
                arena.get(*right).hit(ray, right_t, rng).or(hit_left)
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = left.hit(arena, ray, ray_t, rng);
                let right_t = hit_left
                    .as_ref()
                    .map_or(ray_t, |rec| ray_t.with_max(rec.t));
                right.hit(arena, ray, right_t, rng).or(hit_left)
            }
        }
    }

    pub fn stats(&self) -> BvhStats {
        match self {
            BvhNode::Empty => BvhStats::default(),
            BvhNode::Leaf { .. } => BvhStats {
                branches: 0,
                leaves: 1,
                depth: 1,
            },
            BvhNode::Branch { left, right, .. } => {
                let l = left.stats();
                let r = right.stats();
                BvhStats {
                    branches: 1 + l.branches + r.branches,
                    leaves: l.leaves + r.leaves,
                    depth: 1 + l.depth.max(r.depth),
                }
            }
        }
    }
}

/// Box of every arena member, indexed by id.
///
/// Unbounded members get [`Aabb::UNIVERSE`] so they stay reachable; they
/// just defeat culling for every node above them.
fn primitive_boxes(arena: &GeometryArena, time: Interval) -> Vec<Aabb> {
    arena
        .ids()
        .map(|id| {
            arena.get(id).bounding_box(time).unwrap_or_else(|| {
                log::warn!(
                    "No bounding box for primitive {} in BVH construction; using an unbounded box",
                    id.index()
                );
                Aabb::UNIVERSE
            })
        })
        .collect()
}
