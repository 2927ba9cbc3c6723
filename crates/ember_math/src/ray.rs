use crate::Vec3;

/// A ray with origin, direction and a time stamp.
///
/// The direction is not required to be normalized; intersection routines
/// work in units of the direction's length. `time` selects where moving
/// geometry sits when the ray is traced (motion blur).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    time: f32,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    /// Create a ray at time 0.
    #[inline]
    pub fn new_simple(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, 0.0)
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Point along the ray: origin + t * direction.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }

    /// Same direction and time, shifted origin.
    ///
    /// Used by instancing wrappers that move a ray into object space.
    #[inline]
    pub fn with_origin(&self, origin: Vec3) -> Self {
        Self::new(origin, self.direction, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0), 0.0);

        assert_eq!(ray.at(0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(ray.at(0.5), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(1.0, -2.0, 0.0));
    }

    #[test]
    fn test_ray_with_origin_keeps_direction_and_time() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Y, 0.75);
        let moved = ray.with_origin(Vec3::new(3.0, 0.0, 0.0));

        assert_eq!(moved.origin(), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(moved.direction(), Vec3::Y);
        assert_eq!(moved.time(), 0.75);
    }
}
