//! Built-in scenes.

use clap::ValueEnum;
use ember_render::{
    gen_f32, gen_range_f32, AxisRect, Camera, CheckerTexture, Color, ConstantMedium, Cuboid,
    Dielectric, DiffuseLight, FlipFace, Hittable, Interval, Lambertian, Metal, MovingSphere, Plane,
    RotateY, Scene, SceneBuilder, Sphere, Translate, Vec3,
};
use rand::RngCore;
use std::sync::Arc;

/// Scenes selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    /// Cornell box with a sphere light and a smoke-filled box
    Cornell,
    /// Cornell box with a ceiling light and a glass sphere
    CornellGlass,
    /// Field of random spheres under a sky
    Spheres,
}

/// A scene together with the camera that frames it.
///
/// The camera still needs its aspect ratio set and `initialize` called.
pub struct SceneSetup {
    pub scene: Scene,
    pub camera: Camera,
}

impl SceneKind {
    pub fn build(self, rng: &mut dyn RngCore) -> SceneSetup {
        match self {
            SceneKind::Cornell => cornell_volume(rng),
            SceneKind::CornellGlass => cornell_glass(rng),
            SceneKind::Spheres => random_spheres(rng),
        }
    }

    /// Output file name used when none is given.
    pub fn default_output(self) -> &'static str {
        match self {
            SceneKind::Cornell => "cornell_volume_box2.ppm",
            SceneKind::CornellGlass => "cornell_glass.ppm",
            SceneKind::Spheres => "spheres.ppm",
        }
    }
}

const SHUTTER: (f32, f32) = (0.0, 1.0);

fn white() -> Lambertian {
    Lambertian::new(Color::new(0.73, 0.73, 0.73))
}

fn cornell_camera() -> Camera {
    Camera::new()
        .with_position(
            Vec3::new(278.0, 278.0, -800.0),
            Vec3::new(278.0, 278.0, 0.0),
            Vec3::Y,
        )
        .with_lens(40.0, 0.0, 10.0)
        .with_shutter(SHUTTER.0, SHUTTER.1)
}

/// Full 555-unit wall on `plane` at `k`, facing +k.
fn wall(plane: Plane, k: f32, material: Lambertian) -> AxisRect<Lambertian> {
    AxisRect::new(plane, 0.0, 555.0, 0.0, 555.0, k, material)
}

/// The five walls of the Cornell box, all facing inward.
fn add_cornell_walls(builder: &mut SceneBuilder) {
    let red = Lambertian::new(Color::new(0.65, 0.05, 0.05));
    let green = Lambertian::new(Color::new(0.12, 0.45, 0.15));

    builder.add(wall(Plane::YZ, 555.0, green));
    builder.add(FlipFace::new(Arc::new(wall(Plane::YZ, 0.0, red))));
    builder.add(wall(Plane::XZ, 0.0, white()));
    builder.add(FlipFace::new(Arc::new(wall(Plane::XZ, 555.0, white()))));
    builder.add(FlipFace::new(Arc::new(wall(Plane::XY, 555.0, white()))));
}

/// Box of `size`, turned about Y and moved into place.
fn placed_box(size: Vec3, degrees: f32, offset: Vec3) -> Arc<dyn Hittable> {
    let cuboid: Arc<dyn Hittable> = Arc::new(Cuboid::new(Vec3::ZERO, size, white()));
    let rotated: Arc<dyn Hittable> = Arc::new(RotateY::new(cuboid, degrees));
    Arc::new(Translate::new(rotated, offset))
}

fn cornell_volume(rng: &mut dyn RngCore) -> SceneSetup {
    let mut builder = SceneBuilder::new();
    add_cornell_walls(&mut builder);

    builder.add_light(Sphere::new(
        Vec3::new(278.0, 540.0, 278.0),
        30.0,
        DiffuseLight::new(Color::splat(20.0)),
    ));

    let tall = placed_box(
        Vec3::new(165.0, 330.0, 165.0),
        15.0,
        Vec3::new(265.0, 0.0, 295.0),
    );
    builder.add(Arc::clone(&tall));
    builder.add(ConstantMedium::new(tall, 0.08, Color::ZERO));

    builder.add(placed_box(
        Vec3::splat(165.0),
        -18.0,
        Vec3::new(130.0, 0.0, 65.0),
    ));

    builder.set_background(Color::ZERO);
    SceneSetup {
        scene: builder.build(Interval::new(SHUTTER.0, SHUTTER.1), rng),
        camera: cornell_camera(),
    }
}

fn cornell_glass(rng: &mut dyn RngCore) -> SceneSetup {
    let mut builder = SceneBuilder::new();
    add_cornell_walls(&mut builder);

    builder.add_light(FlipFace::new(Arc::new(AxisRect::new(
        Plane::XZ,
        213.0,
        343.0,
        227.0,
        332.0,
        554.0,
        DiffuseLight::new(Color::splat(15.0)),
    ))));

    builder.add(placed_box(
        Vec3::new(165.0, 330.0, 165.0),
        15.0,
        Vec3::new(265.0, 0.0, 295.0),
    ));
    builder.add(Sphere::new(
        Vec3::new(190.0, 90.0, 190.0),
        90.0,
        Dielectric::new(1.5),
    ));

    builder.set_background(Color::ZERO);
    SceneSetup {
        scene: builder.build(Interval::new(SHUTTER.0, SHUTTER.1), rng),
        camera: cornell_camera(),
    }
}

fn random_spheres(rng: &mut dyn RngCore) -> SceneSetup {
    let mut builder = SceneBuilder::new();

    let checker = CheckerTexture::from_colors(Color::new(0.2, 0.3, 0.1), Color::splat(0.9));
    builder.add(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Lambertian::with_texture(Arc::new(checker)),
    ));

    for a in -6..6 {
        for b in -6..6 {
            let center = Vec3::new(
                a as f32 + 0.9 * gen_f32(rng),
                0.2,
                b as f32 + 0.9 * gen_f32(rng),
            );
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat = gen_f32(rng);
            if choose_mat < 0.8 {
                let albedo = random_color(rng) * random_color(rng);
                let center1 = center + Vec3::new(0.0, gen_range_f32(rng, 0.0, 0.5), 0.0);
                builder.add(MovingSphere::new(
                    center,
                    center1,
                    SHUTTER.0,
                    SHUTTER.1,
                    0.2,
                    Lambertian::new(albedo),
                ));
            } else if choose_mat < 0.95 {
                let albedo = Color::new(
                    gen_range_f32(rng, 0.5, 1.0),
                    gen_range_f32(rng, 0.5, 1.0),
                    gen_range_f32(rng, 0.5, 1.0),
                );
                let fuzz = gen_range_f32(rng, 0.0, 0.5);
                builder.add(Sphere::new(center, 0.2, Metal::new(albedo, fuzz)));
            } else {
                builder.add(Sphere::new(center, 0.2, Dielectric::new(1.5)));
            }
        }
    }

    builder.add(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, Dielectric::new(1.5)));
    builder.add(Sphere::new(
        Vec3::new(-4.0, 1.0, 0.0),
        1.0,
        Lambertian::new(Color::new(0.4, 0.2, 0.1)),
    ));
    builder.add(Sphere::new(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Metal::new(Color::new(0.7, 0.6, 0.5), 0.0),
    ));

    builder.set_background(Color::new(0.7, 0.8, 1.0));

    let camera = Camera::new()
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.1, 10.0)
        .with_shutter(SHUTTER.0, SHUTTER.1);

    SceneSetup {
        scene: builder.build(Interval::new(SHUTTER.0, SHUTTER.1), rng),
        camera,
    }
}

fn random_color(rng: &mut dyn RngCore) -> Color {
    Color::new(gen_f32(rng), gen_f32(rng), gen_f32(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_render::Ray;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn center_ray(setup: &SceneSetup) -> Ray {
        let mut camera = setup.camera.clone();
        camera.initialize();
        let mut rng = StdRng::seed_from_u64(42);
        camera.get_ray(0.5, 0.5, &mut rng)
    }

    #[test]
    fn test_cornell_has_one_light() {
        let mut rng = StdRng::seed_from_u64(42);
        let setup = SceneKind::Cornell.build(&mut rng);

        // 5 walls, light, box, smoke, box
        assert_eq!(setup.scene.len(), 9);
        assert_eq!(setup.scene.lights().len(), 1);
        assert_eq!(setup.scene.background(), Color::ZERO);
    }

    #[test]
    fn test_cornell_camera_sees_inside_the_box() {
        let mut rng = StdRng::seed_from_u64(42);
        for kind in [SceneKind::Cornell, SceneKind::CornellGlass] {
            let setup = kind.build(&mut rng);
            let ray = center_ray(&setup);
            let rec = setup
                .scene
                .hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rng)
                .expect("center ray should hit the box interior");
            assert!(rec.p.z >= -1.0 && rec.p.z <= 556.0);
        }
    }

    #[test]
    fn test_spheres_scene_is_lit_by_sky() {
        let mut rng = StdRng::seed_from_u64(42);
        let setup = SceneKind::Spheres.build(&mut rng);

        assert!(setup.scene.len() > 4);
        assert!(setup.scene.lights().is_empty());
        assert_eq!(setup.scene.background(), Color::new(0.7, 0.8, 1.0));
    }

    #[test]
    fn test_default_outputs_are_ppm() {
        for kind in SceneKind::value_variants() {
            assert!(kind.default_output().ends_with(".ppm"));
        }
    }
}
