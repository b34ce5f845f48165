use crate::{
    cell_has_crossing, interpolate_crossing, is_zero_crossing,
    mesh::{MeshAssembler, MeshVertexId, NULL_MESH_VERTEX_ID},
    qef::Qef,
    surface_normal,
    tables::*,
    EdgeCrossing, Mesh, PolygonizeError, Result, SampleGrid, Sdf,
};
use glam::Vec3A;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualContouringConfig {
    /// Offset used for central differences when estimating crossing normals.
    pub normal_delta: f32,
    pub relaxation_iterations: usize,
    pub relaxation_step: f32,
}

impl Default for DualContouringConfig {
    fn default() -> Self {
        Self {
            normal_delta: 0.001,
            relaxation_iterations: 4,
            relaxation_step: 0.1,
        }
    }
}

/// Polygonizes `grid` with one vertex per cell, connected into quads across
/// every crossed lattice edge.
///
/// `sdf` must be the field that produced `grid`; it is sampled again around
/// edge crossings to estimate surface normals.
pub fn dual_contour(
    sdf: &impl Sdf,
    grid: &SampleGrid,
    config: &DualContouringConfig,
) -> Result<Mesh> {
    let mut assembler = MeshAssembler::default();
    let cell_vertices = place_cell_vertices(sdf, grid, config, &mut assembler);
    emit_quads(grid, &cell_vertices, |q| {
        assembler.push_triangle([q[0], q[1], q[2]]);
        assembler.push_triangle([q[1], q[3], q[2]]);
    })?;
    Ok(assembler.finish())
}

/// Vertex of each cell, or nothing if the surface misses the cell.
#[derive(Clone, Debug)]
pub struct CellVertexTable {
    dims: [usize; 3],
    vertices: Vec<MeshVertexId>,
}

impl CellVertexTable {
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            vertices: vec![NULL_MESH_VERTEX_ID; dims.iter().product()],
        }
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn get(&self, cell: [usize; 3]) -> Option<MeshVertexId> {
        let id = self.vertices[self.slot(cell)];
        (id != NULL_MESH_VERTEX_ID).then_some(id)
    }

    pub fn set(&mut self, cell: [usize; 3], id: MeshVertexId) {
        let slot = self.slot(cell);
        self.vertices[slot] = id;
    }

    #[inline]
    fn slot(&self, [x, y, z]: [usize; 3]) -> usize {
        (x * self.dims[1] + y) * self.dims[2] + z
    }
}

/// Places a relaxed vertex in every cell with at least one crossed edge.
pub fn place_cell_vertices(
    sdf: &impl Sdf,
    grid: &SampleGrid,
    config: &DualContouringConfig,
    assembler: &mut MeshAssembler,
) -> CellVertexTable {
    let num_cells = grid.num_cells();
    let mut table = CellVertexTable::new(num_cells);
    let track_residual = log::log_enabled!(log::Level::Debug);
    let mut total_residual = 0.0;

    let mut crossings = Vec::with_capacity(12);
    for x in 0..num_cells[0] {
        for y in 0..num_cells[1] {
            for z in 0..num_cells[2] {
                let base = [x, y, z];
                let corners = grid.corner_values(base);
                if !cell_has_crossing(&corners) {
                    continue;
                }

                crossings.clear();
                let delta = config.normal_delta;
                collect_crossings(sdf, grid, base, &corners, delta, &mut crossings);
                let Some(local) = relax_vertex(
                    &crossings,
                    config.relaxation_iterations,
                    config.relaxation_step,
                ) else {
                    continue;
                };
                if track_residual {
                    total_residual += Qef::from_crossings(&crossings).error(local);
                }

                let id = assembler.push_vertex(grid.position(lattice_point(base) + local));
                table.set(base, id);
            }
        }
    }

    if track_residual && assembler.num_vertices() > 0 {
        log::debug!(
            "placed {} cell vertices, mean QEF residual {}",
            assembler.num_vertices(),
            total_residual / assembler.num_vertices() as f32
        );
    }

    table
}

/// Hermite data for all crossed edges of the cell based at `base`, with points
/// in cell-local coordinates.
pub fn collect_crossings(
    sdf: &impl Sdf,
    grid: &SampleGrid,
    base: [usize; 3],
    corners: &[f32; 8],
    normal_delta: f32,
    crossings: &mut Vec<EdgeCrossing>,
) {
    let base_point = lattice_point(base);
    for [c0, c1] in EDGE_CORNERS {
        let (s0, s1) = (corners[c0], corners[c1]);
        if !is_zero_crossing(s0, s1) {
            continue;
        }
        let point = interpolate_crossing(corner_point(c0), corner_point(c1), s0, s1);
        let normal = surface_normal(sdf, grid.position(base_point + point), normal_delta);
        crossings.push(EdgeCrossing { point, normal });
    }
}

/// Moves the mass point of `crossings` toward the minimizer of their QEF.
///
/// Each iteration evaluates, at every cell corner, the displacement that
/// would project the corner onto all tangent planes, interpolates those
/// displacements trilinearly at the current estimate and takes a `step`-sized
/// move along the result. The estimate is not clamped to the cell, so the
/// interpolation weights may leave `[0, 1]`.
///
/// Returns `None` when there are no crossings to relax toward.
pub fn relax_vertex(crossings: &[EdgeCrossing], iterations: usize, step: f32) -> Option<Vec3A> {
    if crossings.is_empty() {
        return None;
    }

    let sum = crossings.iter().fold(Vec3A::ZERO, |sum, c| sum + c.point);
    let mut estimate = sum / crossings.len() as f32;

    for _ in 0..iterations {
        let forces = [0, 1, 2, 3, 4, 5, 6, 7].map(|corner| {
            let p = corner_point(corner);
            crossings.iter().fold(Vec3A::ZERO, |force, c| {
                force - c.normal * c.normal.dot(p - c.point)
            })
        });
        estimate += trilinear(&forces, estimate) * step;
    }

    Some(estimate)
}

/// Interpolates per-corner values at local position `t`, x first, then y,
/// then z.
fn trilinear(values: &[Vec3A; 8], t: Vec3A) -> Vec3A {
    // Corners pair up along x as (0, 1), (3, 2), (4, 5), (7, 6).
    let bottom_near = values[0].lerp(values[1], t.x);
    let bottom_far = values[3].lerp(values[2], t.x);
    let top_near = values[4].lerp(values[5], t.x);
    let top_far = values[7].lerp(values[6], t.x);

    let near = bottom_near.lerp(top_near, t.y);
    let far = bottom_far.lerp(top_far, t.y);

    near.lerp(far, t.z)
}

/// Visits a quad for every crossed lattice edge that is fully surrounded by
/// cells, i.e. excluding the outermost layer of samples.
///
/// Quads are ordered so that triangles `[0, 1, 2]` and `[1, 3, 2]` face the
/// positive side of the field.
pub fn emit_quads(
    grid: &SampleGrid,
    cell_vertices: &CellVertexTable,
    mut visit_quad: impl FnMut([MeshVertexId; 4]),
) -> Result<()> {
    let [dims_x, dims_y, dims_z] = grid.dims();
    for x in 1..dims_x.saturating_sub(1) {
        for y in 1..dims_y.saturating_sub(1) {
            for z in 1..dims_z.saturating_sub(1) {
                let near = [x, y, z];
                let near_value = grid.value(near);
                for axis in 0..3 {
                    let mut far = near;
                    far[axis] += 1;
                    let far_value = grid.value(far);
                    if !is_zero_crossing(near_value, far_value) {
                        continue;
                    }

                    let mut quad = [NULL_MESH_VERTEX_ID; 4];
                    for (vertex, offset) in quad.iter_mut().zip(EDGE_ADJACENT_CELLS[axis]) {
                        let cell = [x - offset[0], y - offset[1], z - offset[2]];
                        *vertex = cell_vertices.get(cell).ok_or_else(|| {
                            log::error!("no vertex in cell {cell:?} around crossed edge {near:?}");
                            PolygonizeError::MissingCellVertex { cell, axis }
                        })?;
                    }

                    // Near sample outside, far inside.
                    if near_value >= 0.0 && far_value <= 0.0 {
                        quad.swap(1, 2);
                    }
                    visit_quad(quad);
                }
            }
        }
    }
    Ok(())
}

#[inline]
fn corner_point(corner: usize) -> Vec3A {
    let [x, y, z] = CORNER_OFFSETS[corner];
    Vec3A::new(x as f32, y as f32, z as f32)
}

#[inline]
fn lattice_point([x, y, z]: [usize; 3]) -> Vec3A {
    Vec3A::new(x as f32, y as f32, z as f32)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sdf_primitives::sphere;
    use approx::assert_relative_eq;

    fn unit_sphere_grid() -> (impl Fn(Vec3A) -> f32, SampleGrid) {
        let field = |p: Vec3A| sphere(1.0, p);
        let grid = SampleGrid::sample_between(&field, Vec3A::splat(-2.0), Vec3A::splat(2.0), 4.0);
        (field, grid)
    }

    #[test]
    fn no_crossings_means_no_vertex() {
        assert_eq!(relax_vertex(&[], 4, 0.1), None);
    }

    #[test]
    fn vertex_on_tangent_plane_stays_put() {
        let crossings = [
            EdgeCrossing {
                point: Vec3A::new(0.0, 0.3, 0.0),
                normal: Vec3A::Y,
            },
            EdgeCrossing {
                point: Vec3A::new(1.0, 0.3, 1.0),
                normal: Vec3A::Y,
            },
        ];
        let v = relax_vertex(&crossings, 4, 0.1).unwrap();
        assert_relative_eq!(v.x, 0.5);
        assert_relative_eq!(v.y, 0.3, epsilon = 1e-6);
        assert_relative_eq!(v.z, 0.5);
    }

    #[test]
    fn relaxation_moves_toward_sharp_corner() {
        // Two perpendicular planes x = 0.8 and y = 0.8 meeting in a crease.
        let crossings = [
            EdgeCrossing {
                point: Vec3A::new(0.8, 0.0, 0.0),
                normal: Vec3A::X,
            },
            EdgeCrossing {
                point: Vec3A::new(0.0, 0.8, 0.0),
                normal: Vec3A::Y,
            },
        ];
        let qef = Qef::from_crossings(&crossings);
        let mass_point = Vec3A::new(0.4, 0.4, 0.0);
        let relaxed = relax_vertex(&crossings, 4, 0.1).unwrap();
        assert!(relaxed.x > mass_point.x && relaxed.y > mass_point.y);
        assert!(qef.error(relaxed) < qef.error(mass_point));

        let more = relax_vertex(&crossings, 100, 0.1).unwrap();
        assert_relative_eq!(more.x, 0.8, epsilon = 1e-4);
        assert_relative_eq!(more.y, 0.8, epsilon = 1e-4);
    }

    #[test]
    fn trilinear_reproduces_corner_values() {
        let values = [0, 1, 2, 3, 4, 5, 6, 7].map(|c| corner_point(c) * 2.0 + Vec3A::ONE);
        for c in 0..8 {
            assert_eq!(trilinear(&values, corner_point(c)), values[c]);
        }
        let center = trilinear(&values, Vec3A::splat(0.5));
        assert_relative_eq!(center.x, 2.0);
        assert_relative_eq!(center.y, 2.0);
        assert_relative_eq!(center.z, 2.0);
    }

    #[test]
    fn sphere_relaxation_stays_near_cell_and_lowers_residual() {
        let (field, grid) = unit_sphere_grid();
        let config = DualContouringConfig::default();
        let diagonal = 3.0f32.sqrt();

        let mut active_cells = 0;
        let mut crossings = Vec::new();
        let [cx, cy, cz] = grid.num_cells();
        for x in 0..cx {
            for y in 0..cy {
                for z in 0..cz {
                    let base = [x, y, z];
                    let corners = grid.corner_values(base);
                    crossings.clear();
                    let delta = config.normal_delta;
                    collect_crossings(&field, &grid, base, &corners, delta, &mut crossings);
                    let Some(v) = relax_vertex(&crossings, 4, 0.1) else {
                        continue;
                    };
                    active_cells += 1;

                    assert!(v.cmpge(Vec3A::splat(-diagonal)).all(), "{base:?} -> {v}");
                    assert!(v.cmple(Vec3A::splat(1.0 + diagonal)).all(), "{base:?} -> {v}");

                    let mass_point = relax_vertex(&crossings, 0, 0.1).unwrap();
                    let qef = Qef::from_crossings(&crossings);
                    assert!(qef.error(v) <= qef.error(mass_point) + 1e-5);
                }
            }
        }
        assert!(active_cells > 0);
    }

    #[test]
    fn missing_cell_vertex_is_an_error() {
        let field = |p: Vec3A| p.y - 1.5;
        let grid = SampleGrid::sample_between(&field, Vec3A::ZERO, Vec3A::splat(4.0), 1.0);
        let empty = CellVertexTable::new(grid.num_cells());

        let err = emit_quads(&grid, &empty, |_| {}).unwrap_err();
        assert!(
            matches!(
                err,
                PolygonizeError::MissingCellVertex {
                    cell: [0, 1, 0],
                    axis: 1
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn cell_vertex_table_lookup() {
        let mut table = CellVertexTable::new([2, 3, 4]);
        assert_eq!(table.get([1, 2, 3]), None);
        table.set([1, 2, 3], 5);
        assert_eq!(table.get([1, 2, 3]), Some(5));
        assert_eq!(table.get([1, 2, 2]), None);
    }

    #[test]
    fn every_active_cell_gets_a_vertex() {
        let (field, grid) = unit_sphere_grid();
        let mut assembler = MeshAssembler::default();
        let table = place_cell_vertices(&field, &grid, &Default::default(), &mut assembler);

        let [cx, cy, cz] = grid.num_cells();
        let mut expected = 0;
        for x in 0..cx {
            for y in 0..cy {
                for z in 0..cz {
                    let active = cell_has_crossing(&grid.corner_values([x, y, z]));
                    assert_eq!(table.get([x, y, z]).is_some(), active);
                    expected += active as usize;
                }
            }
        }
        assert_eq!(assembler.num_vertices(), expected);
    }
}
