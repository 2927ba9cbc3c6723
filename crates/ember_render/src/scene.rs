//! Scene assembly: geometry arena, world BVH and light list.

use crate::bvh::BvhNode;
use crate::hittable::{GeometryArena, GeometryId, HitRecord, Hittable, HittableGroup};
use crate::{Color, Ray};
use ember_math::{Aabb, Interval};
use rand::RngCore;
use std::time::Instant;

/// Collects geometry and light markings before the BVH is built.
#[derive(Default)]
pub struct SceneBuilder {
    arena: GeometryArena,
    lights: Vec<GeometryId>,
    background: Color,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a piece of geometry to the world.
    pub fn add(&mut self, object: impl Hittable + 'static) -> GeometryId {
        self.arena.push(Box::new(object))
    }

    /// Add geometry that is also sampled explicitly as a light.
    pub fn add_light(&mut self, object: impl Hittable + 'static) -> GeometryId {
        let id = self.add(object);
        self.mark_light(id);
        id
    }

    /// Mark already-added geometry as a light. Marking twice is a no-op.
    pub fn mark_light(&mut self, id: GeometryId) {
        if !self.lights.contains(&id) {
            self.lights.push(id);
        }
    }

    /// Radiance returned for rays that escape the scene.
    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    /// Build the world BVH and freeze the scene.
    ///
    /// `time` is the shutter interval used for moving geometry's boxes.
    pub fn build(self, time: Interval, rng: &mut dyn RngCore) -> Scene {
        let start = Instant::now();
        let mut ids: Vec<GeometryId> = self.arena.ids().collect();
        let bvh = BvhNode::new(&self.arena, &mut ids, time, rng);

        log::info!(
            "Built scene: {} primitives, {} lights, BVH in {:.2?}",
            self.arena.len(),
            self.lights.len(),
            start.elapsed()
        );
        if self.lights.is_empty() {
            log::info!("Scene has no lights; light sampling will contribute nothing");
        }

        Scene {
            arena: self.arena,
            bvh,
            lights: self.lights,
            background: self.background,
        }
    }
}

/// Immutable, shareable scene ready for rendering.
pub struct Scene {
    arena: GeometryArena,
    bvh: BvhNode,
    lights: Vec<GeometryId>,
    background: Color,
}

impl Scene {
    /// Geometry sampled explicitly by the integrator.
    pub fn lights(&self) -> HittableGroup<'_> {
        HittableGroup::new(&self.arena, &self.lights)
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn bvh(&self) -> &BvhNode {
        &self.bvh
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

impl Hittable for Scene {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        self.bvh.hit(&self.arena, ray, ray_t, rng)
    }

    fn bounding_box(&self, _time: Interval) -> Option<Aabb> {
        self.bvh.bounding_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AxisRect, DiffuseLight, Lambertian, Plane, Sphere};
    use ember_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_build_empty_scene() {
        let mut rng = StdRng::seed_from_u64(42);
        let scene = SceneBuilder::new().build(Interval::new(0.0, 1.0), &mut rng);

        assert!(scene.is_empty());
        assert!(scene.lights().is_empty());
        assert!(matches!(scene.bvh(), BvhNode::Empty));
        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);
        assert!(scene
            .hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rng)
            .is_none());
    }

    #[test]
    fn test_light_is_stored_once_and_listed() {
        let mut builder = SceneBuilder::new();
        builder.add(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, Lambertian::new(Color::ONE)));
        let light = builder.add_light(AxisRect::new(
            Plane::XZ,
            -1.0,
            1.0,
            -1.0,
            1.0,
            5.0,
            DiffuseLight::new(Color::splat(4.0)),
        ));
        builder.mark_light(light);
        builder.set_background(Color::splat(0.1));

        let mut rng = StdRng::seed_from_u64(42);
        let scene = builder.build(Interval::new(0.0, 1.0), &mut rng);

        assert_eq!(scene.len(), 2);
        assert_eq!(scene.lights().len(), 1);
        assert_eq!(scene.background(), Color::splat(0.1));
        assert!(scene.lights().pdf_value(Vec3::ZERO, Vec3::Y) > 0.0);

        // The same light is hit through the world BVH
        let up = Ray::new_simple(Vec3::ZERO, Vec3::Y);
        let rec = scene
            .hit(&up, Interval::new(0.001, f32::INFINITY), &mut rng)
            .unwrap();
        assert!((rec.t - 5.0).abs() < 1e-5);
    }
}
