//! Instancing wrappers that move, rotate or re-orient shared geometry.
//!
//! Wrappers hold their child behind an `Arc` so one shape can be instanced
//! several times, or shared with a participating medium as its boundary.

use crate::{
    hittable::{HitRecord, Hittable},
    Ray,
};
use ember_math::{Aabb, Interval, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Geometry displaced by a fixed offset.
pub struct Translate {
    object: Arc<dyn Hittable>,
    offset: Vec3,
}

impl Translate {
    pub fn new(object: Arc<dyn Hittable>, offset: Vec3) -> Self {
        Self { object, offset }
    }
}

impl Hittable for Translate {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let moved = ray.with_origin(ray.origin() - self.offset);
        let mut rec = self.object.hit(&moved, ray_t, rng)?;
        rec.p += self.offset;
        Some(rec)
    }

    fn bounding_box(&self, time: Interval) -> Option<Aabb> {
        self.object
            .bounding_box(time)
            .map(|bbox| bbox.translate(self.offset))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        self.object.pdf_value(origin - self.offset, direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.object.random(origin - self.offset, rng)
    }
}

/// Geometry rotated about the world Y axis.
pub struct RotateY {
    object: Arc<dyn Hittable>,
    sin_theta: f32,
    cos_theta: f32,
}

impl RotateY {
    /// Rotate by `degrees`, counter-clockwise looking down -Y.
    pub fn new(object: Arc<dyn Hittable>, degrees: f32) -> Self {
        let (sin_theta, cos_theta) = degrees.to_radians().sin_cos();
        Self {
            object,
            sin_theta,
            cos_theta,
        }
    }

    #[inline]
    fn to_object(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * v.x - self.sin_theta * v.z,
            v.y,
            self.sin_theta * v.x + self.cos_theta * v.z,
        )
    }

    #[inline]
    fn to_world(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * v.x + self.sin_theta * v.z,
            v.y,
            -self.sin_theta * v.x + self.cos_theta * v.z,
        )
    }
}

impl Hittable for RotateY {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let rotated = Ray::new(
            self.to_object(ray.origin()),
            self.to_object(ray.direction()),
            ray.time(),
        );
        let mut rec = self.object.hit(&rotated, ray_t, rng)?;

        // Stored normal faces the rotated ray; undo the flip to recover the
        // outward normal before re-orienting against the world ray
        let object_outward = if rec.front_face { rec.normal } else { -rec.normal };
        rec.p = self.to_world(rec.p);
        rec.set_face_normal(ray, self.to_world(object_outward));
        Some(rec)
    }

    /// Box of the eight rotated corners of the object's box over `time`.
    fn bounding_box(&self, time: Interval) -> Option<Aabb> {
        let bbox = self.object.bounding_box(time)?;
        let corners = bbox.corners().map(|c| self.to_world(c));
        let (min, max) = corners[1..]
            .iter()
            .fold((corners[0], corners[0]), |(lo, hi), &c| (lo.min(c), hi.max(c)));
        Some(Aabb::from_points(min, max))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        self.object
            .pdf_value(self.to_object(origin), self.to_object(direction))
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.to_world(self.object.random(self.to_object(origin), rng))
    }
}

/// Geometry with its front and back faces swapped.
///
/// Mostly used on one-sided lights so their emitting side faces the scene.
pub struct FlipFace {
    object: Arc<dyn Hittable>,
}

impl FlipFace {
    pub fn new(object: Arc<dyn Hittable>) -> Self {
        Self { object }
    }
}

impl Hittable for FlipFace {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let mut rec = self.object.hit(ray, ray_t, rng)?;
        rec.front_face = !rec.front_face;
        Some(rec)
    }

    fn bounding_box(&self, time: Interval) -> Option<Aabb> {
        self.object.bounding_box(time)
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        self.object.pdf_value(origin, direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.object.random(origin, rng)
    }
}
