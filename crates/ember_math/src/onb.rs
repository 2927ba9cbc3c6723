use crate::Vec3;

/// Orthonormal basis built around a single direction `w`.
///
/// Sampling routines generate directions in a local frame where +Z is the
/// surface normal and use [`Onb::local`] to move them into world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Onb {
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

impl Onb {
    /// Build a basis whose `w` axis is `n` normalized.
    pub fn from_w(n: Vec3) -> Self {
        let w = n.normalize();
        // Any helper axis not parallel to w works
        let a = if w.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
        let v = w.cross(a).normalize();
        let u = w.cross(v);
        Self { u, v, w }
    }

    #[inline]
    pub fn u(&self) -> Vec3 {
        self.u
    }

    #[inline]
    pub fn v(&self) -> Vec3 {
        self.v
    }

    #[inline]
    pub fn w(&self) -> Vec3 {
        self.w
    }

    /// Transform local coordinates (a, b, c) into world space.
    #[inline]
    pub fn local(&self, a: Vec3) -> Vec3 {
        a.x * self.u + a.y * self.v + a.z * self.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(onb: &Onb) {
        assert!((onb.u().length() - 1.0).abs() < 1e-5);
        assert!((onb.v().length() - 1.0).abs() < 1e-5);
        assert!((onb.w().length() - 1.0).abs() < 1e-5);
        assert!(onb.u().dot(onb.v()).abs() < 1e-5);
        assert!(onb.u().dot(onb.w()).abs() < 1e-5);
        assert!(onb.v().dot(onb.w()).abs() < 1e-5);
    }

    #[test]
    fn test_onb_is_orthonormal_for_axis_and_oblique_normals() {
        for n in [
            Vec3::X,
            Vec3::Y,
            -Vec3::Z,
            Vec3::new(1.0, 2.0, -3.0),
            Vec3::new(0.95, 0.01, 0.0),
        ] {
            assert_orthonormal(&Onb::from_w(n));
        }
    }

    #[test]
    fn test_onb_local_z_maps_to_w() {
        let n = Vec3::new(0.0, 3.0, 4.0);
        let onb = Onb::from_w(n);
        let mapped = onb.local(Vec3::Z);
        assert!((mapped - n.normalize()).length() < 1e-5);
    }
}
