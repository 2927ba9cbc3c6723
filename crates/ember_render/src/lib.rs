//! Ember renderer - CPU Monte Carlo path tracing.
//!
//! Scenes are assembled with [`SceneBuilder`], which stores geometry in an
//! arena and builds a BVH over it. [`PathIntegrator`] estimates radiance
//! with a 50/50 mixture of light sampling and material sampling, and
//! [`render`] drives it over the image in parallel.

mod bvh;
mod camera;
mod config;
mod hittable;
mod integrator;
mod material;
mod medium;
mod output;
mod pdf;
mod rect;
mod renderer;
mod sampling;
mod scene;
mod sphere;
mod texture;
mod transform;

pub use bvh::{BvhNode, BvhStats};
pub use camera::Camera;
pub use config::{ConfigError, ConfigResult, RenderConfig};
pub use hittable::{GeometryArena, GeometryId, HitRecord, Hittable, HittableGroup};
pub use integrator::{luminance, PathIntegrator};
pub use material::{
    reflect, refract, Color, Dielectric, DiffuseLight, Isotropic, Lambertian, Material, Metal,
    ScatterKind, ScatterRecord,
};
pub use medium::ConstantMedium;
pub use output::{
    save_image, with_default_extension, write_ppm, OutputError, OutputResult, OutputSink,
};
pub use pdf::{CosinePdf, HittablePdf, MixturePdf, Pdf, SpherePdf};
pub use rect::{AxisRect, Cuboid, Plane};
pub use renderer::{color_to_rgb8, linear_to_gamma, render, ImageBuffer, RenderProgress};
pub use sampling::{gen_f32, gen_range_f32};
pub use scene::{Scene, SceneBuilder};
pub use sphere::{MovingSphere, Sphere};
pub use texture::{CheckerTexture, SolidColor, Texture};
pub use transform::{FlipFace, RotateY, Translate};

/// Re-export Vec3 and common math types from ember_math
pub use ember_math::{Aabb, Interval, Ray, Vec3};
