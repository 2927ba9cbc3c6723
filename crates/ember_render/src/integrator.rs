//! Recursive Monte Carlo radiance estimator.
//!
//! Diffuse bounces draw their next direction from an equal mixture of a
//! light-directed density and the material's own density, and divide by the
//! mixture's value. Specular bounces follow their single outgoing ray. Long
//! paths are cut short by Russian roulette.

use crate::hittable::{Hittable, HittableGroup};
use crate::material::ScatterKind;
use crate::pdf::{HittablePdf, MixturePdf, Pdf};
use crate::sampling::gen_f32;
use crate::{Color, Ray};
use ember_math::Interval;
use rand::RngCore;

/// Mixture densities at or below this are treated as numerically zero.
const MIN_PDF: f32 = 1e-8;

/// First bounce at which Russian roulette may terminate a path.
const ROULETTE_START_BOUNCE: u32 = 5;

/// Upper bound on the roulette survival probability.
const MAX_SURVIVAL: f32 = 0.95;

/// Closest hits nearer than this are self-intersections.
const SHADOW_EPSILON: f32 = 0.001;

/// Rec. 709 luminance of a linear RGB color.
#[inline]
pub fn luminance(c: Color) -> f32 {
    0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z
}

/// Unidirectional path tracer with light sampling and Russian roulette.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathIntegrator;

impl PathIntegrator {
    pub fn new() -> Self {
        Self
    }

    /// Radiance arriving along `ray` after at most `depth` bounces.
    ///
    /// `lights` is sampled explicitly at every diffuse bounce. With no
    /// lights at all the material density is used alone.
    pub fn li(
        &self,
        ray: &Ray,
        background: Color,
        world: &dyn Hittable,
        lights: HittableGroup<'_>,
        depth: u32,
        rng: &mut dyn RngCore,
    ) -> Color {
        self.trace(ray, background, world, lights, depth, 0, rng)
    }

    /// One path vertex. `bounce` counts the vertices already traversed
    /// (0 for the camera ray).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn trace(
        &self,
        ray: &Ray,
        background: Color,
        world: &dyn Hittable,
        lights: HittableGroup<'_>,
        depth: u32,
        bounce: u32,
        rng: &mut dyn RngCore,
    ) -> Color {
        if depth == 0 {
            return Color::ZERO;
        }

        let Some(rec) = world.hit(ray, Interval::new(SHADOW_EPSILON, f32::INFINITY), rng) else {
            return background;
        };

        let material = rec.material;
        let emitted = material.emitted(ray, &rec, rec.u, rec.v, rec.p);

        let Some(srec) = material.scatter(ray, &rec, rng) else {
            return emitted;
        };
        let mut attenuation = srec.attenuation;

        let material_pdf = match srec.kind {
            ScatterKind::Specular(specular) => {
                let incoming =
                    self.trace(&specular, background, world, lights, depth - 1, bounce + 1, rng);
                return finite_or(emitted + attenuation * incoming, emitted);
            }
            ScatterKind::Diffuse(pdf) => pdf,
        };

        if bounce >= ROULETTE_START_BOUNCE {
            let survival = luminance(attenuation).min(MAX_SURVIVAL);
            if !(survival > 0.0) || gen_f32(rng) > survival {
                return emitted;
            }
            attenuation /= survival;
        }

        let light_pdf = HittablePdf::new(&lights, rec.p);
        let mixture = MixturePdf::new(&light_pdf, &*material_pdf);
        let sampling: &dyn Pdf = if lights.is_empty() {
            &*material_pdf
        } else {
            &mixture
        };

        let direction = sampling.generate(rng);
        if !direction.is_finite() {
            return emitted;
        }
        let scattered = Ray::new(rec.p, direction, ray.time());

        let pdf_value = sampling.value(direction);
        if !(pdf_value > MIN_PDF) {
            return emitted;
        }

        let scattering_pdf = material.scattering_pdf(ray, &rec, &scattered);
        let incoming = self.trace(
            &scattered,
            background,
            world,
            lights,
            depth - 1,
            bounce + 1,
            rng,
        );

        finite_or(
            emitted + attenuation * scattering_pdf * incoming / pdf_value,
            emitted,
        )
    }
}

#[inline]
fn finite_or(radiance: Color, fallback: Color) -> Color {
    if radiance.is_finite() {
        radiance
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hittable::{GeometryArena, HitRecord};
    use crate::material::ScatterRecord;
    use crate::pdf::CosinePdf;
    use crate::scene::SceneBuilder;
    use crate::{AxisRect, DiffuseLight, Lambertian, Material, Plane, Sphere};
    use ember_math::Vec3;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const BACKGROUND: Color = Color::new(0.5, 0.5, 0.5);

    fn ceiling_light(emit: Color) -> AxisRect<DiffuseLight> {
        AxisRect::new(Plane::XZ, -1.0, 1.0, -1.0, 1.0, 2.0, DiffuseLight::new(emit))
    }

    /// Emits a fixed color, scatters diffusely and counts scatter calls.
    struct CountingMaterial {
        emit: Color,
        albedo: Color,
        scatters: Arc<AtomicUsize>,
    }

    impl Material for CountingMaterial {
        fn emitted(&self, _ray_in: &Ray, _rec: &HitRecord, _u: f32, _v: f32, _p: Vec3) -> Color {
            self.emit
        }

        fn scatter(
            &self,
            _ray_in: &Ray,
            rec: &HitRecord,
            _rng: &mut dyn RngCore,
        ) -> Option<ScatterRecord> {
            self.scatters.fetch_add(1, Ordering::SeqCst);
            Some(ScatterRecord::diffuse(self.albedo, CosinePdf::new(rec.normal)))
        }

        fn scattering_pdf(&self, _ray_in: &Ray, _rec: &HitRecord, _scattered: &Ray) -> f32 {
            1.0
        }
    }

    /// Density with a fixed value that always proposes the same direction.
    struct FixedPdf {
        value: f32,
        direction: Vec3,
    }

    impl Pdf for FixedPdf {
        fn value(&self, _direction: Vec3) -> f32 {
            self.value
        }

        fn generate(&self, _rng: &mut dyn RngCore) -> Vec3 {
            self.direction
        }
    }

    /// Emits a fixed color and scatters through a [`FixedPdf`].
    ///
    /// A NaN `direction` is passed through as-is; any other value is
    /// replaced by the surface normal.
    struct DegenerateMaterial {
        emit: Color,
        pdf_value: f32,
        direction: Vec3,
        scattering_pdf: f32,
    }

    impl Material for DegenerateMaterial {
        fn emitted(&self, _ray_in: &Ray, _rec: &HitRecord, _u: f32, _v: f32, _p: Vec3) -> Color {
            self.emit
        }

        fn scatter(
            &self,
            _ray_in: &Ray,
            rec: &HitRecord,
            _rng: &mut dyn RngCore,
        ) -> Option<ScatterRecord> {
            let direction = if self.direction.is_nan() {
                self.direction
            } else {
                rec.normal
            };
            let pdf = FixedPdf {
                value: self.pdf_value,
                direction,
            };
            Some(ScatterRecord::diffuse(Color::splat(0.8), pdf))
        }

        fn scattering_pdf(&self, _ray_in: &Ray, _rec: &HitRecord, _scattered: &Ray) -> f32 {
            self.scattering_pdf
        }
    }

    /// Radiance from a single sphere of `material` with no lights.
    fn trace_degenerate(material: DegenerateMaterial) -> Color {
        let mut arena = GeometryArena::new();
        arena.push(Box::new(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, material)));
        let ids: Vec<_> = arena.ids().collect();
        let world = HittableGroup::new(&arena, &ids);
        let lights = HittableGroup::new(&arena, &[]);

        let mut rng = StdRng::seed_from_u64(42);
        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);
        PathIntegrator::new().li(&ray, BACKGROUND, &world, lights, 10, &mut rng)
    }

    #[test]
    fn test_vanishing_density_returns_emission() {
        let emit = Color::new(0.3, 0.2, 0.1);
        for pdf_value in [0.0, 1e-9, f32::NAN] {
            let color = trace_degenerate(DegenerateMaterial {
                emit,
                pdf_value,
                direction: Vec3::Z,
                scattering_pdf: 1.0,
            });
            assert_eq!(color, emit, "pdf value {pdf_value}");
        }
    }

    #[test]
    fn test_non_finite_direction_returns_emission() {
        let emit = Color::new(0.3, 0.2, 0.1);
        let color = trace_degenerate(DegenerateMaterial {
            emit,
            pdf_value: 1.0,
            direction: Vec3::NAN,
            scattering_pdf: 1.0,
        });
        assert_eq!(color, emit);
    }

    #[test]
    fn test_non_finite_result_returns_emission() {
        let emit = Color::new(0.3, 0.2, 0.1);
        let color = trace_degenerate(DegenerateMaterial {
            emit,
            pdf_value: 1.0,
            direction: Vec3::Z,
            scattering_pdf: f32::INFINITY,
        });
        assert_eq!(color, emit);

        // Sanity check: a finite density does reach the background
        let color = trace_degenerate(DegenerateMaterial {
            emit,
            pdf_value: 1.0,
            direction: Vec3::Z,
            scattering_pdf: 1.0,
        });
        assert_eq!(color, emit + Color::splat(0.8) * BACKGROUND);
    }

    #[test]
    fn test_empty_scene_returns_background() {
        let mut rng = StdRng::seed_from_u64(42);
        let scene = SceneBuilder::new().build(Interval::new(0.0, 1.0), &mut rng);
        let integrator = PathIntegrator::new();

        for depth in [1, 5, 50] {
            let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.3, -0.2, -1.0));
            let color = integrator.li(&ray, BACKGROUND, &scene, scene.lights(), depth, &mut rng);
            assert_eq!(color, BACKGROUND);
        }
    }

    #[test]
    fn test_zero_depth_is_black() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut builder = SceneBuilder::new();
        builder.add_light(ceiling_light(Color::splat(15.0)));
        let scene = builder.build(Interval::new(0.0, 1.0), &mut rng);

        let ray = Ray::new_simple(Vec3::ZERO, Vec3::Y);
        let color = PathIntegrator::new().li(&ray, BACKGROUND, &scene, scene.lights(), 0, &mut rng);
        assert_eq!(color, Color::ZERO);
    }

    #[test]
    fn test_ray_at_light_returns_emission() {
        let emit = Color::new(15.0, 12.0, 9.0);
        let mut rng = StdRng::seed_from_u64(42);
        let mut builder = SceneBuilder::new();
        builder.add_light(ceiling_light(emit));
        let scene = builder.build(Interval::new(0.0, 1.0), &mut rng);

        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.1, 1.0, -0.1));
        let color =
            PathIntegrator::new().li(&ray, BACKGROUND, &scene, scene.lights(), 10, &mut rng);
        assert_eq!(color, emit);
    }

    #[test]
    fn test_roulette_terminates_with_emission_only() {
        let scatters = Arc::new(AtomicUsize::new(0));
        let emit = Color::splat(0.25);
        let mut arena = GeometryArena::new();
        arena.push(Box::new(Sphere::new(
            Vec3::new(0.0, 0.0, -3.0),
            1.0,
            CountingMaterial {
                emit,
                albedo: Color::splat(0.9),
                scatters: scatters.clone(),
            },
        )));
        let ids: Vec<_> = arena.ids().collect();
        let world = HittableGroup::new(&arena, &ids);
        let lights = HittableGroup::new(&arena, &[]);

        // Survival is luminance(0.9) = 0.9; every draw is just below 0.95
        let mut rng = StepRng::new(15_938_355u64 << 8, 0);
        assert!(gen_f32(&mut rng) > 0.9);

        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);
        let color = PathIntegrator::new().trace(
            &ray,
            BACKGROUND,
            &world,
            lights,
            50,
            ROULETTE_START_BOUNCE,
            &mut rng,
        );

        assert_eq!(color, emit);
        assert_eq!(scatters.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_roulette_starts_at_fifth_bounce() {
        // Camera inside a closed sphere: every scattered ray hits it again
        let scatters = Arc::new(AtomicUsize::new(0));
        let mut arena = GeometryArena::new();
        arena.push(Box::new(Sphere::new(
            Vec3::ZERO,
            1.0,
            CountingMaterial {
                emit: Color::ZERO,
                albedo: Color::splat(0.9),
                scatters: scatters.clone(),
            },
        )));
        let ids: Vec<_> = arena.ids().collect();
        let world = HittableGroup::new(&arena, &ids);
        let lights = HittableGroup::new(&arena, &[]);

        let mut rng = StepRng::new(15_938_355u64 << 8, 0);
        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);
        let color = PathIntegrator::new().li(&ray, BACKGROUND, &world, lights, 50, &mut rng);

        // Bounces 0..=4 always continue; bounce 5 scatters, then roulette ends it
        assert_eq!(color, Color::ZERO);
        assert_eq!(scatters.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_convex_diffuse_object_under_uniform_sky() {
        // Every bounce off a convex Lambertian escapes to the sky, and cosine
        // sampling cancels the BRDF, so each sample is albedo * sky exactly
        let mut rng = StdRng::seed_from_u64(42);
        let mut builder = SceneBuilder::new();
        builder.add(Sphere::new(
            Vec3::new(0.0, 0.0, -3.0),
            1.0,
            Lambertian::new(Color::splat(0.5)),
        ));
        let scene = builder.build(Interval::new(0.0, 1.0), &mut rng);
        let integrator = PathIntegrator::new();

        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);
        for _ in 0..100 {
            let color = integrator.li(&ray, Color::ONE, &scene, scene.lights(), 50, &mut rng);
            assert!((color - Color::splat(0.5)).abs().max_element() < 1e-4, "{color}");
        }
    }

    #[test]
    fn test_light_sampling_agrees_with_material_sampling() {
        // Diffuse floor under a square light; with and without explicit
        // light sampling the estimates converge to the same radiance
        let mut rng = StdRng::seed_from_u64(42);
        let mut builder = SceneBuilder::new();
        builder.add(AxisRect::new(
            Plane::XZ,
            -50.0,
            50.0,
            -50.0,
            50.0,
            0.0,
            Lambertian::new(Color::splat(0.5)),
        ));
        builder.add_light(ceiling_light(Color::ONE));
        let scene = builder.build(Interval::new(0.0, 1.0), &mut rng);
        let integrator = PathIntegrator::new();
        let empty_arena = GeometryArena::new();
        let no_lights = HittableGroup::new(&empty_arena, &[]);

        let ray = Ray::new_simple(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);
        let n = 100_000;
        let mut mixed = 0.0f64;
        let mut material_only = 0.0f64;
        for _ in 0..n {
            mixed += integrator
                .li(&ray, Color::ZERO, &scene, scene.lights(), 2, &mut rng)
                .x as f64;
            material_only += integrator
                .li(&ray, Color::ZERO, &scene, no_lights, 2, &mut rng)
                .x as f64;
        }
        let mixed = mixed / n as f64;
        let material_only = material_only / n as f64;
        assert!(mixed > 0.0);
        assert!((mixed - material_only).abs() < 0.01, "{mixed} vs {material_only}");
    }
}
