//! Hittable trait, HitRecord and the geometry arena.
//!
//! Top-level geometry lives in a [`GeometryArena`] and is referred to by
//! [`GeometryId`]. The world BVH and the light list both hold ids, so a
//! primitive that is also a light is stored exactly once.

use crate::{Material, Ray};
use ember_math::{Aabb, Interval, Vec3};
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Record of a ray-object intersection.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against the ray)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a dyn Material,
    /// Texture coordinates
    pub u: f32,
    pub v: f32,
    /// Ray parameter of the intersection
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> HitRecord<'a> {
    /// Build a record, orienting the normal against the ray.
    pub fn new(
        ray: &Ray,
        t: f32,
        outward_normal: Vec3,
        (u, v): (f32, f32),
        material: &'a dyn Material,
    ) -> Self {
        let mut rec = Self {
            p: ray.at(t),
            normal: outward_normal,
            material,
            u,
            v,
            t,
            front_face: true,
        };
        rec.set_face_normal(ray, outward_normal);
        rec
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

impl std::fmt::Debug for HitRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HitRecord")
            .field("p", &self.p)
            .field("normal", &self.normal)
            .field("t", &self.t)
            .field("u", &self.u)
            .field("v", &self.v)
            .field("front_face", &self.front_face)
            .finish_non_exhaustive()
    }
}

/// Trait for objects that can be hit by rays.
///
/// Besides intersection, geometry can act as an importance-sampling target:
/// `pdf_value` is the solid-angle density of hitting this object from
/// `origin` in `direction`, and `random` draws a direction toward it.
/// Objects that are never used as lights keep the defaults.
pub trait Hittable: Send + Sync {
    /// Nearest intersection with `ray` whose parameter lies strictly inside
    /// `ray_t`.
    ///
    /// `rng` is only consumed by stochastic geometry such as participating
    /// media.
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>>;

    /// Bounding box over the shutter interval `time`, or `None` for
    /// unbounded geometry.
    fn bounding_box(&self, time: Interval) -> Option<Aabb>;

    /// Solid-angle density of sampling `direction` from `origin` toward this
    /// object.
    fn pdf_value(&self, _origin: Vec3, _direction: Vec3) -> f32 {
        0.0
    }

    /// Random direction from `origin` toward this object.
    fn random(&self, _origin: Vec3, _rng: &mut dyn RngCore) -> Vec3 {
        Vec3::X
    }
}

/// Shared geometry, so one shape can sit in the arena and inside a wrapper
/// or medium at the same time.
impl<T: Hittable + ?Sized> Hittable for Arc<T> {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        (**self).hit(ray, ray_t, rng)
    }

    fn bounding_box(&self, time: Interval) -> Option<Aabb> {
        (**self).bounding_box(time)
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        (**self).pdf_value(origin, direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        (**self).random(origin, rng)
    }
}

/// Index of a geometry node inside a [`GeometryArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(usize);

impl GeometryId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Owner of every top-level geometry node of a scene.
#[derive(Default)]
pub struct GeometryArena {
    nodes: Vec<Box<dyn Hittable>>,
}

impl GeometryArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its id.
    pub fn push(&mut self, node: Box<dyn Hittable>) -> GeometryId {
        let id = GeometryId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Look up a node. Ids are only minted by [`GeometryArena::push`].
    #[inline]
    pub fn get(&self, id: GeometryId) -> &dyn Hittable {
        self.nodes[id.index()].as_ref()
    }

    /// All ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = GeometryId> + '_ {
        (0..self.nodes.len()).map(GeometryId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A borrowed list of arena members treated as one object.
///
/// Intersection is a linear scan keeping the nearest hit. As a sampling
/// target every member gets equal weight: `pdf_value` averages the members'
/// densities and `random` picks a member uniformly.
#[derive(Clone, Copy)]
pub struct HittableGroup<'a> {
    arena: &'a GeometryArena,
    ids: &'a [GeometryId],
}

impl<'a> HittableGroup<'a> {
    pub fn new(arena: &'a GeometryArena, ids: &'a [GeometryId]) -> Self {
        Self { arena, ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn members(&self) -> impl Iterator<Item = &'a dyn Hittable> + '_ {
        let arena = self.arena;
        self.ids.iter().map(move |&id| arena.get(id))
    }
}

impl Hittable for HittableGroup<'_> {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let mut closest: Option<HitRecord<'_>> = None;

        for object in self.members() {
            let interval = match &closest {
                Some(rec) => ray_t.with_max(rec.t),
                None => ray_t,
            };
            if let Some(rec) = object.hit(ray, interval, rng) {
                closest = Some(rec);
            }
        }

        closest
    }

    fn bounding_box(&self, time: Interval) -> Option<Aabb> {
        let mut members = self.members();
        let first = members.next()?.bounding_box(time)?;
        members.try_fold(first, |acc, object| {
            object
                .bounding_box(time)
                .map(|bbox| Aabb::surrounding(&acc, &bbox))
        })
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        if self.ids.is_empty() {
            return 0.0;
        }
        let weight = 1.0 / self.ids.len() as f32;
        self.members()
            .map(|object| weight * object.pdf_value(origin, direction))
            .sum()
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        if self.ids.is_empty() {
            return Vec3::X;
        }
        let index = rng.gen_range(0..self.ids.len());
        self.arena.get(self.ids[index]).random(origin, rng)
    }
}
