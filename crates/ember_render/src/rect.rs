//! Axis-aligned rectangles and boxes built from them.
//!
//! Rectangles are the usual area lights of the Cornell-box style scenes, so
//! they implement the light-sampling half of [`Hittable`].

use crate::sampling::gen_range_f32;
use crate::{
    hittable::{HitRecord, Hittable},
    Material, Ray,
};
use ember_math::{Aabb, Interval, Vec3};
use rand::RngCore;

/// Which coordinate plane a rectangle lies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    XY,
    XZ,
    YZ,
}

impl Plane {
    /// Axis indices `(a, b, k)`: the two in-plane axes and the normal axis.
    #[inline]
    fn axes(self) -> (usize, usize, usize) {
        match self {
            Plane::XY => (0, 1, 2),
            Plane::XZ => (0, 2, 1),
            Plane::YZ => (1, 2, 0),
        }
    }
}

/// Rectangle `[a0, a1] x [b0, b1]` on the plane `k` along the normal axis.
///
/// For `Plane::XZ`, `a` is X, `b` is Z and the rectangle sits at `y = k`.
/// The outward normal points toward +k unless built with
/// [`AxisRect::facing_negative`].
pub struct AxisRect<M: Material> {
    plane: Plane,
    a0: f32,
    a1: f32,
    b0: f32,
    b1: f32,
    k: f32,
    normal_sign: f32,
    material: M,
}

impl<M: Material> AxisRect<M> {
    pub fn new(plane: Plane, a0: f32, a1: f32, b0: f32, b1: f32, k: f32, material: M) -> Self {
        Self {
            plane,
            a0: a0.min(a1),
            a1: a0.max(a1),
            b0: b0.min(b1),
            b1: b0.max(b1),
            k,
            normal_sign: 1.0,
            material,
        }
    }

    /// Same rectangle with its outward normal toward -k.
    pub fn facing_negative(mut self) -> Self {
        self.normal_sign = -1.0;
        self
    }

    pub fn area(&self) -> f32 {
        (self.a1 - self.a0) * (self.b1 - self.b0)
    }

    fn outward_normal(&self) -> Vec3 {
        let (_, _, k_axis) = self.plane.axes();
        let mut n = Vec3::ZERO;
        n[k_axis] = self.normal_sign;
        n
    }

    fn point(&self, a: f32, b: f32) -> Vec3 {
        let (a_axis, b_axis, k_axis) = self.plane.axes();
        let mut p = Vec3::ZERO;
        p[a_axis] = a;
        p[b_axis] = b;
        p[k_axis] = self.k;
        p
    }

    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let (a_axis, b_axis, k_axis) = self.plane.axes();
        let origin = ray.origin();
        let direction = ray.direction();

        let t = (self.k - origin[k_axis]) / direction[k_axis];
        // Parallel rays give +-inf or NaN, both rejected here
        if !ray_t.surrounds(t) {
            return None;
        }

        let a = origin[a_axis] + t * direction[a_axis];
        let b = origin[b_axis] + t * direction[b_axis];
        if a < self.a0 || a > self.a1 || b < self.b0 || b > self.b1 {
            return None;
        }

        let uv = (
            (a - self.a0) / (self.a1 - self.a0),
            (b - self.b0) / (self.b1 - self.b0),
        );
        Some(HitRecord::new(ray, t, self.outward_normal(), uv, &self.material))
    }
}

impl<M: Material + 'static> Hittable for AxisRect<M> {
    fn hit(&self, ray: &Ray, ray_t: Interval, _rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        self.intersect(ray, ray_t)
    }

    fn bounding_box(&self, _time: Interval) -> Option<Aabb> {
        // Aabb pads the zero-thickness axis
        Some(Aabb::from_points(
            self.point(self.a0, self.b0),
            self.point(self.a1, self.b1),
        ))
    }

    /// Area density converted to solid angle: d^2 / (|cos| * area).
    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let probe = Ray::new_simple(origin, direction);
        let Some(rec) = self.intersect(&probe, Interval::new(0.001, f32::INFINITY)) else {
            return 0.0;
        };

        let distance_squared = rec.t * rec.t * direction.length_squared();
        let cosine = (direction.dot(rec.normal) / direction.length()).abs();
        if cosine <= 0.0 {
            return 0.0;
        }

        distance_squared / (cosine * self.area())
    }

    /// Direction toward a uniformly chosen point on the rectangle.
    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let a = gen_range_f32(rng, self.a0, self.a1);
        let b = gen_range_f32(rng, self.b0, self.b1);
        self.point(a, b) - origin
    }
}

/// Axis-aligned box made of six rectangles.
pub struct Cuboid<M: Material> {
    sides: [AxisRect<M>; 6],
    bbox: Aabb,
}

impl<M: Material + Clone> Cuboid<M> {
    /// Box spanning the two opposite corners.
    pub fn new(a: Vec3, b: Vec3, material: M) -> Self {
        let min = a.min(b);
        let max = a.max(b);

        // Outward normals on every face
        let sides = [
            AxisRect::new(Plane::XY, min.x, max.x, min.y, max.y, max.z, material.clone()),
            AxisRect::new(Plane::XY, min.x, max.x, min.y, max.y, min.z, material.clone())
                .facing_negative(),
            AxisRect::new(Plane::XZ, min.x, max.x, min.z, max.z, max.y, material.clone()),
            AxisRect::new(Plane::XZ, min.x, max.x, min.z, max.z, min.y, material.clone())
                .facing_negative(),
            AxisRect::new(Plane::YZ, min.y, max.y, min.z, max.z, max.x, material.clone()),
            AxisRect::new(Plane::YZ, min.y, max.y, min.z, max.z, min.x, material)
                .facing_negative(),
        ];

        Self {
            sides,
            bbox: Aabb::from_points(min, max),
        }
    }
}

impl<M: Material + 'static> Hittable for Cuboid<M> {
    fn hit(&self, ray: &Ray, ray_t: Interval, _rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let mut closest: Option<HitRecord<'_>> = None;
        for side in &self.sides {
            let interval = match &closest {
                Some(rec) => ray_t.with_max(rec.t),
                None => ray_t,
            };
            if let Some(rec) = side.intersect(ray, interval) {
                closest = Some(rec);
            }
        }
        closest
    }

    fn bounding_box(&self, _time: Interval) -> Option<Aabb> {
        Some(self.bbox)
    }
}
