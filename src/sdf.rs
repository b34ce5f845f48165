use glam::Vec3A;

/// A scalar field sampled by the polygonizers.
///
/// Negative values are inside the surface, positive values outside. The field
/// must be pure: evaluating the same position twice yields the same value.
pub trait Sdf {
    fn evaluate(&self, p: Vec3A) -> f32;
}

impl<F> Sdf for F
where
    F: Fn(Vec3A) -> f32,
{
    #[inline]
    fn evaluate(&self, p: Vec3A) -> f32 {
        self(p)
    }
}

/// True if the segment between samples `a` and `b` touches the zero level-set.
///
/// Both ends being exactly zero counts as a crossing so that surfaces lying
/// on sample points don't open gaps.
#[inline]
pub fn is_zero_crossing(a: f32, b: f32) -> bool {
    (a <= 0.0 && b >= 0.0) || (a >= 0.0 && b <= 0.0)
}

/// Any pair of corners straddles zero. Equivalent to at least one of the 12
/// cell edges being a zero crossing, since the cube's edges connect all corners.
pub fn cell_has_crossing(samples: &[f32; 8]) -> bool {
    let mut any_inside = false;
    let mut any_outside = false;
    for &sample in samples {
        any_inside |= sample <= 0.0;
        any_outside |= sample >= 0.0;
    }
    any_inside && any_outside
}

/// Parameter along `a -> b` where the linearly interpolated field is zero.
#[inline]
pub fn crossing_factor(a: f32, b: f32) -> f32 {
    let a = a.abs();
    let sum = a + b.abs();
    if sum == 0.0 {
        return 0.5;
    }
    a / sum
}

/// Lerp the edge endpoints by the relative magnitude of their samples.
#[inline]
pub fn interpolate_crossing(p0: Vec3A, p1: Vec3A, s0: f32, s1: f32) -> Vec3A {
    p0.lerp(p1, crossing_factor(s0, s1))
}

/// `(sdf(p + delta * e_i) - sdf(p - delta * e_i)) / (2 * delta)` on each axis.
pub fn central_gradient(sdf: &impl Sdf, p: Vec3A, delta: f32) -> Vec3A {
    let dx = Vec3A::new(delta, 0.0, 0.0);
    let dy = Vec3A::new(0.0, delta, 0.0);
    let dz = Vec3A::new(0.0, 0.0, delta);
    Vec3A::new(
        sdf.evaluate(p + dx) - sdf.evaluate(p - dx),
        sdf.evaluate(p + dy) - sdf.evaluate(p - dy),
        sdf.evaluate(p + dz) - sdf.evaluate(p - dz),
    ) / (2.0 * delta)
}

/// Unit gradient, or zero where the field is flat.
pub fn surface_normal(sdf: &impl Sdf, p: Vec3A, delta: f32) -> Vec3A {
    central_gradient(sdf, p, delta).normalize_or_zero()
}

/// Hermite sample of the surface on one cell edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCrossing {
    /// Position in cell-local coordinates, `[0, 1]^3`.
    pub point: Vec3A,
    pub normal: Vec3A,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sdf_primitives::sphere;
    use approx::assert_relative_eq;

    #[test]
    fn crossing_test_is_inclusive() {
        assert!(is_zero_crossing(-1.0, 1.0));
        assert!(is_zero_crossing(1.0, -1.0));
        assert!(is_zero_crossing(0.0, 0.0));
        assert!(is_zero_crossing(0.0, 2.0));
        assert!(!is_zero_crossing(0.5, 2.0));
        assert!(!is_zero_crossing(-0.5, -2.0));
    }

    #[test]
    fn crossing_factor_follows_magnitudes() {
        assert_relative_eq!(crossing_factor(-1.0, 3.0), 0.25);
        assert_relative_eq!(crossing_factor(3.0, -1.0), 0.75);
        assert_relative_eq!(crossing_factor(0.0, 0.0), 0.5);
        assert_relative_eq!(crossing_factor(0.0, 1.0), 0.0);

        let p = interpolate_crossing(Vec3A::ZERO, Vec3A::X, -1.0, 3.0);
        assert_relative_eq!(p.x, 0.25);
    }

    #[test]
    fn cell_crossing_matches_corner_signs() {
        assert!(!cell_has_crossing(&[1.0; 8]));
        assert!(!cell_has_crossing(&[-1.0; 8]));
        assert!(cell_has_crossing(&[0.0; 8]));

        let mut samples = [1.0; 8];
        samples[6] = -0.1;
        assert!(cell_has_crossing(&samples));
    }

    #[test]
    fn sphere_normal_points_away_from_center() {
        let field = |p: Vec3A| sphere(1.0, p);
        let p = Vec3A::new(0.6, 0.0, 0.8);
        let n = surface_normal(&field, p, 0.001);
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-4);
        assert!(n.dot(p.normalize()) > 0.999);
    }

    #[test]
    fn flat_field_has_zero_normal() {
        let field = |_: Vec3A| 1.0f32;
        assert_eq!(surface_normal(&field, Vec3A::ZERO, 0.001), Vec3A::ZERO);
    }
}
