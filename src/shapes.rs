//! Meshes built directly from cubic Bezier curves rather than from a field.

use crate::{mesh::MeshAssembler, Mesh, PolygonizeError, Result};
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// Cubic Bezier curves given by 4 control points.
pub mod bezier {
    use glam::Vec3;

    pub fn point(points: &[Vec3; 4], t: f32) -> Vec3 {
        let s = 1.0 - t;
        s * s * s * points[0]
            + 3.0 * s * s * t * points[1]
            + 3.0 * s * t * t * points[2]
            + t * t * t * points[3]
    }

    /// Derivative with respect to `t`, not normalized.
    pub fn tangent(points: &[Vec3; 4], t: f32) -> Vec3 {
        let s = 1.0 - t;
        -3.0 * s * s * points[0]
            + (3.0 * s * s - 6.0 * t * s) * points[1]
            + (6.0 * t * s - 3.0 * t * t) * points[2]
            + 3.0 * t * t * points[3]
    }

    /// Unit tangent, normal and binormal at `t`.
    ///
    /// The normal is taken perpendicular to both the tangent and `+Z`, so the
    /// frame doesn't twist for curves in the XY plane and is degenerate for
    /// curves running along Z.
    pub fn frame(points: &[Vec3; 4], t: f32) -> [Vec3; 3] {
        let tangent = self::tangent(points, t).normalize_or_zero();
        let normal = tangent.cross(Vec3::Z).normalize_or_zero();
        let binormal = tangent.cross(normal).normalize_or_zero();
        [tangent, normal, binormal]
    }
}

/// Flat fan between a Bezier curve and the midpoint of its end points, all
/// scaled by `size_ratio`.
///
/// Vertex 0 is the midpoint, followed by `vertex_count` evenly spaced curve
/// samples. With `back_face` every triangle is repeated with the opposite
/// winding. UVs are all zero.
pub fn bezier_shape_to_mesh(
    points: &[Vec3],
    vertex_count: usize,
    size_ratio: f32,
    back_face: bool,
) -> Result<Mesh> {
    let points = control_points(points)?;
    check_segment_count("vertex_count", vertex_count)?;

    let mut assembler = MeshAssembler::default();
    assembler.push_vertex_with_uv((points[0] + points[3]) / 2.0 * size_ratio, Vec2::ZERO);
    for i in 0..vertex_count {
        let t = i as f32 / (vertex_count - 1) as f32;
        assembler.push_vertex_with_uv(bezier::point(&points, t) * size_ratio, Vec2::ZERO);
    }

    let fan = 1..vertex_count as u32;
    for i in fan.clone() {
        assembler.push_triangle([0, i, i + 1]);
    }
    if back_face {
        for i in fan {
            assembler.push_triangle([0, i + 1, i]);
        }
    }

    Ok(assembler.finish())
}

/// Tube around a Bezier curve.
///
/// `line_count` rings of `circle_count` vertices each are spaced evenly in
/// `t`; the first and last vertex of a ring coincide so the UV seam can be
/// split. The radius goes linearly from `start_radius` to `end_radius`.
pub fn bezier_curve_to_mesh(
    points: &[Vec3],
    line_count: usize,
    circle_count: usize,
    start_radius: f32,
    end_radius: f32,
    uv_ratio: Vec2,
) -> Result<Mesh> {
    let points = control_points(points)?;
    check_segment_count("line_count", line_count)?;
    check_segment_count("circle_count", circle_count)?;

    let mut assembler = MeshAssembler::default();
    let last_line = (line_count - 1) as f32;
    let last_circle = (circle_count - 1) as f32;
    for line in 0..line_count {
        let t = line as f32 / last_line;
        let center = bezier::point(&points, t);
        let [_, normal, binormal] = bezier::frame(&points, t);
        let radius = start_radius + (end_radius - start_radius) * t;

        for circle in 0..circle_count {
            let theta = circle as f32 * TAU / last_circle;
            let p = center + (normal * theta.cos() + binormal * theta.sin()) * radius;
            let uv = Vec2::new(line as f32 / last_line, circle as f32 / last_circle) * uv_ratio;
            assembler.push_vertex_with_uv(p, uv);
        }
    }

    let ring = circle_count as u32;
    for line in 0..line_count as u32 - 1 {
        for circle in 0..ring - 1 {
            let i0 = line * ring + circle;
            let i1 = i0 + 1;
            let i2 = i0 + ring;
            let i3 = i2 + 1;
            assembler.push_triangle([i0, i1, i2]);
            assembler.push_triangle([i1, i3, i2]);
        }
    }

    Ok(assembler.finish())
}

fn control_points(points: &[Vec3]) -> Result<[Vec3; 4]> {
    points
        .try_into()
        .map_err(|_| PolygonizeError::InvalidControlPoints {
            expected: 4,
            actual: points.len(),
        })
}

fn check_segment_count(name: &'static str, count: usize) -> Result<()> {
    const MIN: usize = 2;
    if count < MIN {
        return Err(PolygonizeError::InvalidSegmentCount {
            name,
            min: MIN,
            actual: count,
        });
    }
    Ok(())
}
