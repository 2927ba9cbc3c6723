//! Homogeneous participating media (fog, smoke).

use crate::material::Isotropic;
use crate::sampling::gen_f32;
use crate::texture::Texture;
use crate::{
    hittable::{HitRecord, Hittable},
    Color, Ray,
};
use ember_math::{Aabb, Interval, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Constant-density volume filling a closed boundary shape.
///
/// A ray inside the boundary scatters after an exponentially distributed
/// free-flight distance; if that distance exceeds the path length through
/// the volume the ray passes through untouched.
pub struct ConstantMedium {
    boundary: Arc<dyn Hittable>,
    neg_inv_density: f32,
    phase_function: Isotropic,
}

impl ConstantMedium {
    pub fn new(boundary: Arc<dyn Hittable>, density: f32, albedo: Color) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Isotropic::new(albedo),
        }
    }

    pub fn with_texture(
        boundary: Arc<dyn Hittable>,
        density: f32,
        albedo: Arc<dyn Texture>,
    ) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Isotropic::with_texture(albedo),
        }
    }
}

impl Hittable for ConstantMedium {
    fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        // Entry and exit along the whole line, then clip to the query range
        let entry = self.boundary.hit(ray, Interval::UNIVERSE, rng)?;
        let exit = self
            .boundary
            .hit(ray, Interval::new(entry.t + 0.0001, f32::INFINITY), rng)?;

        let t0 = entry.t.max(ray_t.min).max(0.0);
        let t1 = exit.t.min(ray_t.max);
        if t0 >= t1 {
            return None;
        }

        let ray_length = ray.direction().length();
        let distance_inside = (t1 - t0) * ray_length;
        // 1 - u keeps the argument of ln in (0, 1]
        let hit_distance = self.neg_inv_density * (1.0 - gen_f32(rng)).ln();
        if hit_distance > distance_inside {
            return None;
        }

        let t = t0 + hit_distance / ray_length;
        Some(HitRecord {
            p: ray.at(t),
            // Arbitrary; the isotropic phase function ignores it
            normal: Vec3::X,
            material: &self.phase_function,
            u: 0.0,
            v: 0.0,
            t,
            front_face: true,
        })
    }

    fn bounding_box(&self, time: Interval) -> Option<Aabb> {
        self.boundary.bounding_box(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fog(density: f32) -> ConstantMedium {
        let boundary: Arc<dyn Hittable> =
            Arc::new(Sphere::new(Vec3::ZERO, 1.0, Lambertian::new(Color::ONE)));
        ConstantMedium::new(boundary, density, Color::splat(0.8))
    }

    #[test]
    fn test_dense_medium_scatters_inside_boundary() {
        let medium = fog(1000.0);
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let rec = medium
                .hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rng)
                .unwrap();
            assert!(rec.t >= 4.0 && rec.t <= 6.0);
        }
    }

    #[test]
    fn test_medium_missed_boundary() {
        let medium = fog(1000.0);
        let ray = Ray::new_simple(Vec3::new(0.0, 5.0, 5.0), -Vec3::Z);
        let mut rng = StdRng::seed_from_u64(42);
        assert!(medium
            .hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rng)
            .is_none());
    }

    #[test]
    fn test_transmission_matches_beer_lambert() {
        // Path length 2 at density 0.5: P(pass) = exp(-1)
        let medium = fog(0.5);
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let mut rng = StdRng::seed_from_u64(42);

        let n = 20_000;
        let passed = (0..n)
            .filter(|_| {
                medium
                    .hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rng)
                    .is_none()
            })
            .count();
        let fraction = passed as f32 / n as f32;
        assert!((fraction - (-1.0f32).exp()).abs() < 0.02, "{fraction}");
    }

    #[test]
    fn test_ray_starting_inside_scatters_ahead() {
        let medium = fog(1000.0);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::X);
        let mut rng = StdRng::seed_from_u64(42);

        let rec = medium
            .hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rng)
            .unwrap();
        assert!(rec.t > 0.0 && rec.t <= 1.0);
    }
}
