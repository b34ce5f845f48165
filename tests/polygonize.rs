//! Integration tests: polygonizing reference fields end to end.
//!
//! Covers emptiness, index validity, closedness, orientation and determinism
//! for both polygonization methods.

use glam::{Vec2, Vec3, Vec3A};
use implicit_polygonizer::{
    sdf_primitives::{sphere, torus},
    Mesh, PolygonizeMethod, Polygonizer, SurfaceConfig,
};
use std::collections::HashMap;

const METHODS: [PolygonizeMethod; 2] = [
    PolygonizeMethod::MarchingCubes,
    PolygonizeMethod::DualContouring,
];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn generate(method: PolygonizeMethod, field: impl Fn(Vec3A) -> f32, half: f32, res: f32) -> Mesh {
    Polygonizer::new(method)
        .generate(&field, Vec3A::splat(-half), Vec3A::splat(half), res)
        .unwrap()
}

fn assert_valid_indices(mesh: &Mesh) {
    assert_eq!(mesh.indices.len() % 3, 0);
    assert!(
        mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()),
        "index out of range for {} vertices",
        mesh.vertex_count()
    );
    assert_eq!(mesh.uvs.len(), mesh.vertex_count());
    assert_eq!(mesh.normals.len(), mesh.vertex_count());
    assert_eq!(mesh.tangents.len(), mesh.vertex_count());
}

/// Every directed edge is matched by exactly one edge running the other way.
fn assert_closed(mesh: &Mesh) {
    let mut half_edges: HashMap<(u32, u32), usize> = HashMap::new();
    for [a, b, c] in mesh.triangles() {
        for edge in [(a, b), (b, c), (c, a)] {
            *half_edges.entry(edge).or_default() += 1;
        }
    }
    for (&(a, b), &count) in &half_edges {
        assert_eq!(count, 1, "edge ({a}, {b}) used {count} times");
        assert_eq!(
            half_edges.get(&(b, a)),
            Some(&1),
            "edge ({a}, {b}) has no twin"
        );
    }
}

fn assert_faces_point_away_from_origin(mesh: &Mesh) {
    let mut checked = 0;
    for tri in mesh.triangles() {
        let n = mesh.face_normal(tri);
        if n.length_squared() < 1e-12 {
            continue;
        }
        let centroid = tri
            .iter()
            .fold(Vec3::ZERO, |sum, &v| sum + mesh.positions[v as usize])
            / 3.0;
        assert!(n.dot(centroid) > 0.0, "triangle {tri:?} faces inward");
        checked += 1;
    }
    assert!(checked > 0);
}

// ============================================================================
// Empty and degenerate input
// ============================================================================

#[test]
fn fields_without_surface_give_empty_meshes() {
    init_logger();
    for method in METHODS {
        for value in [1.0f32, -1.0] {
            let mesh = generate(method, |_| value, 2.0, 4.0);
            assert_eq!(mesh.vertex_count(), 0, "{method:?}");
            assert_eq!(mesh.triangle_count(), 0, "{method:?}");
        }
    }
}

#[test]
fn degenerate_boxes_give_empty_meshes() {
    init_logger();
    let field = |p: Vec3A| sphere(1.0, p);
    for method in METHODS {
        let polygonizer = Polygonizer::new(method);
        let inverted = polygonizer
            .generate(&field, Vec3A::splat(2.0), Vec3A::splat(-2.0), 4.0)
            .unwrap();
        assert!(inverted.is_empty());

        let flat = polygonizer
            .generate(&field, Vec3A::new(-2.0, 0.0, -2.0), Vec3A::new(2.0, 0.0, 2.0), 4.0)
            .unwrap();
        assert!(flat.is_empty());

        let unsampled = polygonizer
            .generate(&field, Vec3A::splat(-2.0), Vec3A::splat(2.0), 0.0)
            .unwrap();
        assert!(unsampled.is_empty());
    }
}

// ============================================================================
// Sphere
// ============================================================================

#[test]
fn unit_sphere_vertices_lie_near_the_surface() {
    init_logger();
    for method in METHODS {
        let mesh = generate(method, |p| sphere(1.0, p), 2.0, 4.0);
        assert!(mesh.vertex_count() > 100, "{method:?}: {}", mesh.vertex_count());
        assert_valid_indices(&mesh);
        for p in &mesh.positions {
            let r = p.length();
            assert!((0.9..=1.1).contains(&r), "{method:?}: vertex {p} at radius {r}");
        }
    }
}

#[test]
fn marching_cubes_unit_sphere_is_closed() {
    let mesh = generate(PolygonizeMethod::MarchingCubes, |p| sphere(1.0, p), 2.0, 4.0);
    assert_closed(&mesh);
}

#[test]
fn sphere_meshes_are_closed_and_face_outward() {
    init_logger();
    for method in METHODS {
        let mesh = generate(method, |p| sphere(1.05, p), 2.0, 4.0);
        assert_valid_indices(&mesh);
        assert_closed(&mesh);
        assert_faces_point_away_from_origin(&mesh);

        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert!(n.dot(*p) > 0.0, "{method:?}: vertex normal at {p} points inward");
        }
    }
}

#[test]
fn mesh_bounds_enclose_the_sphere_vertices() {
    let mesh = generate(PolygonizeMethod::DualContouring, |p| sphere(1.05, p), 2.0, 4.0);
    let min = mesh.bounds.minimum;
    let max = mesh.bounds.minimum + mesh.bounds.shape;
    let slack = Vec3A::splat(1e-5);
    for p in &mesh.positions {
        let p = Vec3A::from(*p);
        assert!(p.cmpge(min - slack).all() && p.cmple(max + slack).all());
    }
    assert!(max.x > 0.9 && min.x < -0.9);
}

#[test]
fn generation_is_deterministic() {
    let field = |p: Vec3A| torus(Vec2::new(1.0, 0.4), p - Vec3A::new(0.05, 0.0, -0.1));
    for method in METHODS {
        let a = generate(method, field, 2.0, 5.0);
        let b = generate(method, field, 2.0, 5.0);
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.indices, b.indices);
        assert_eq!(a.normals, b.normals);
    }
}

// ============================================================================
// Plane
// ============================================================================

/// Samples at `-1.1 + k / 4` never land exactly on `y = 0`.
fn horizontal_plane(method: PolygonizeMethod) -> Mesh {
    generate(method, |p| p.y, 1.1, 4.0)
}

#[test]
fn plane_is_a_single_upward_sheet() {
    init_logger();
    for method in METHODS {
        let mesh = horizontal_plane(method);
        assert_valid_indices(&mesh);
        for p in &mesh.positions {
            assert!(p.y.abs() < 1e-5, "{method:?}: vertex {p} off the plane");
        }
        for tri in mesh.triangles() {
            let n = mesh.face_normal(tri).normalize();
            assert!(n.y > 0.999, "{method:?}: triangle {tri:?} has normal {n}");
        }
        for n in &mesh.normals {
            assert!(n.y > 0.999, "{method:?}: vertex normal {n}");
        }
    }
}

#[test]
fn plane_element_counts() {
    // 8 x 8 samples per layer, so 7 x 7 cells.
    let mc = horizontal_plane(PolygonizeMethod::MarchingCubes);
    assert_eq!(mc.vertex_count(), 8 * 8);
    assert_eq!(mc.triangle_count(), 7 * 7 * 2);

    // Quads skip the outermost sample layer.
    let dc = horizontal_plane(PolygonizeMethod::DualContouring);
    assert_eq!(dc.vertex_count(), 7 * 7);
    assert_eq!(dc.triangle_count(), 6 * 6 * 2);
}

#[test]
fn large_meshes_use_wide_indices() {
    let mesh = Polygonizer::new(PolygonizeMethod::MarchingCubes)
        .generate(
            &|p: Vec3A| p.y,
            Vec3A::new(0.0, -0.55, 0.0),
            Vec3A::new(65.1, 0.55, 65.1),
            4.0,
        )
        .unwrap();
    assert_eq!(mesh.vertex_count(), 260 * 260);
    assert!(mesh.indices.iter().any(|&i| i > u16::MAX as u32));
    assert_valid_indices(&mesh);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn toml_config_drives_polygonization() {
    init_logger();
    let config = SurfaceConfig::from_toml_str(
        r#"
        method = "dual_contouring"
        bound = [2.0, 2.0, 2.0]
        resolution = 4.0

        [dual_contouring]
        relaxation_iterations = 8
        "#,
    )
    .unwrap();

    let mesh = config.polygonize(&|p: Vec3A| sphere(1.05, p)).unwrap();
    let expected = Polygonizer {
        method: PolygonizeMethod::DualContouring,
        dual_contouring: config.dual_contouring,
    }
    .generate(&|p: Vec3A| sphere(1.05, p), Vec3A::splat(-2.0), Vec3A::splat(2.0), 4.0)
    .unwrap();
    assert_eq!(mesh.positions, expected.positions);
    assert_eq!(mesh.indices, expected.indices);
}
