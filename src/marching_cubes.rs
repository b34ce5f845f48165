use crate::{
    interpolate_crossing,
    mesh::{MeshAssembler, MeshVertexId, NULL_MESH_VERTEX_ID},
    tables::*,
    Mesh, SampleGrid,
};
use glam::Vec3A;

/// Polygonizes `grid` with the classic 256-case Marching Cubes tables.
///
/// Every lattice edge crossed by the surface yields exactly one vertex, shared
/// by all cells around that edge. Ambiguous faces are not disambiguated, so
/// saddle configurations may leave small holes or extra tunnels.
pub fn marching_cubes(grid: &SampleGrid) -> Mesh {
    let mut assembler = MeshAssembler::default();
    let mut edge_vertices = EdgeVertexCache::new(grid.dims());

    let [cells_x, cells_y, cells_z] = grid.num_cells();
    for x in 0..cells_x {
        for y in 0..cells_y {
            for z in 0..cells_z {
                let base = [x, y, z];
                let corners = grid.corner_values(base);
                let cube = cube_index(&corners);
                let crossed_edges = EDGE_TABLE[cube];
                if crossed_edges == 0 {
                    continue;
                }

                let mut cell_vertices = [NULL_MESH_VERTEX_ID; 12];
                for (edge, cell_vertex) in cell_vertices.iter_mut().enumerate() {
                    if crossed_edges & (1 << edge) == 0 {
                        continue;
                    }
                    let origin = add(base, EDGE_ORIGINS[edge]);
                    let make_vertex = || {
                        let [c0, c1] = EDGE_CORNERS[edge];
                        let p0 = grid.position(lattice_point(add(base, CORNER_OFFSETS[c0])));
                        let p1 = grid.position(lattice_point(add(base, CORNER_OFFSETS[c1])));
                        let p = interpolate_crossing(p0, p1, corners[c0], corners[c1]);
                        assembler.push_vertex(p)
                    };
                    *cell_vertex =
                        edge_vertices.get_or_insert_with(origin, EDGE_AXES[edge], make_vertex);
                }

                for tri in TRIANGLE_TABLE[cube]
                    .chunks_exact(3)
                    .take_while(|tri| tri[0] != TRIANGLE_END)
                {
                    let tri = [tri[0], tri[1], tri[2]].map(|e| cell_vertices[e as usize]);
                    assembler.push_triangle(tri);
                }
            }
        }
    }

    assembler.finish()
}

/// Bit `i` is set when corner `i` is inside the surface (`<= 0`).
pub fn cube_index(corners: &[f32; 8]) -> usize {
    corners
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s <= 0.0)
        .fold(0, |index, (i, _)| index | (1 << i))
}

/// Vertex emitted for each lattice edge, keyed by the edge's lesser endpoint and
/// its axis.
#[derive(Clone, Debug)]
pub struct EdgeVertexCache {
    dims: [usize; 3],
    vertices: Vec<MeshVertexId>,
}

impl EdgeVertexCache {
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            vertices: vec![NULL_MESH_VERTEX_ID; dims.iter().product::<usize>() * 3],
        }
    }

    pub fn get(&self, origin: [usize; 3], axis: usize) -> Option<MeshVertexId> {
        let id = self.vertices[self.slot(origin, axis)];
        (id != NULL_MESH_VERTEX_ID).then_some(id)
    }

    pub fn get_or_insert_with(
        &mut self,
        origin: [usize; 3],
        axis: usize,
        make_vertex: impl FnOnce() -> MeshVertexId,
    ) -> MeshVertexId {
        let slot = self.slot(origin, axis);
        if self.vertices[slot] == NULL_MESH_VERTEX_ID {
            self.vertices[slot] = make_vertex();
        }
        self.vertices[slot]
    }

    #[inline]
    fn slot(&self, [x, y, z]: [usize; 3], axis: usize) -> usize {
        ((x * self.dims[1] + y) * self.dims[2] + z) * 3 + axis
    }
}

#[inline]
fn add(a: [usize; 3], b: [usize; 3]) -> [usize; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
fn lattice_point([x, y, z]: [usize; 3]) -> Vec3A {
    Vec3A::new(x as f32, y as f32, z as f32)
}
