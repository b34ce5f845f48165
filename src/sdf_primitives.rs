//! Exact distance fields for a few common shapes.
//!
//! All shapes are centered on the origin; translate `p` to move them.

use glam::{Vec2, Vec3A, Vec3Swizzles};

pub fn sphere(r: f32, p: Vec3A) -> f32 {
    p.length() - r
}

pub fn plane(o: Vec3A, n: Vec3A, p: Vec3A) -> f32 {
    (p - o).dot(n)
}

pub fn torus(t: Vec2, p: Vec3A) -> f32 {
    let q = Vec2::new(p.xz().length() - t.x, p.y);
    q.length() - t.y
}

pub fn cube(b: Vec3A, p: Vec3A) -> f32 {
    let q = p.abs() - b;
    q.max(Vec3A::ZERO).length() + q.max_element().min(0.0)
}

/// Box with half extents `b` whose edges are rounded by `radius`. The rounding
/// stays inside `b`.
pub fn rounded_box(b: Vec3A, radius: f32, p: Vec3A) -> f32 {
    cube(b - Vec3A::splat(radius), p) - radius
}

/// Segment `a`-`b` swept by a ball of radius `r`.
pub fn capsule(a: Vec3A, b: Vec3A, r: f32, p: Vec3A) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let h = (pa.dot(ba) / ba.dot(ba)).clamp(0.0, 1.0);
    (pa - ba * h).length() - r
}
