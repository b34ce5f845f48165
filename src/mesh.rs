use glam::{Vec2, Vec3, Vec3A, Vec4};
use ilattice::extent::Extent;

pub type MeshVertexId = u32;
pub const NULL_MESH_VERTEX_ID: MeshVertexId = MeshVertexId::MAX;

/// UV pairs smaller than this in determinant don't define a tangent frame.
const MIN_UV_AREA: f32 = 1e-12;

/// Indexed triangle mesh with derived per-vertex attributes.
///
/// Indices are 32-bit so meshes can exceed 65535 vertices. Triangles wind
/// counter-clockwise when seen from outside, i.e. `(b - a) x (c - a)` points
/// away from the surface interior.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// We don't use `Vec3A` because it's 16-byte-aligned.
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,

    pub normals: Vec<Vec3>,
    /// `xyz` is the tangent, `w` the handedness of the bitangent.
    pub tangents: Vec<Vec4>,
    pub bounds: Extent<Vec3A>,
}

impl Mesh {
    pub fn empty() -> Self {
        MeshAssembler::default().finish()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Unnormalized geometric normal; its length is twice the triangle area.
    pub fn face_normal(&self, [a, b, c]: [u32; 3]) -> Vec3 {
        let [pa, pb, pc] = [a, b, c].map(|v| self.positions[v as usize]);
        (pb - pa).cross(pc - pa)
    }
}

/// Collects vertex and index buffers, then derives normals, bounds and
/// tangents for the finished [`Mesh`].
#[derive(Clone, Debug, Default)]
pub struct MeshAssembler {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
}

impl MeshAssembler {
    pub fn assemble(positions: Vec<Vec3>, uvs: Vec<Vec2>, indices: Vec<u32>) -> Mesh {
        Self {
            positions,
            uvs,
            indices,
        }
        .finish()
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Adds a polygonizer vertex. Its UV is a copy of the position's `xy`,
    /// a stand-in kept for consumers that expect one UV per vertex.
    pub fn push_vertex(&mut self, p: Vec3A) -> MeshVertexId {
        self.push_vertex_with_uv(p.into(), Vec2::new(p.x, p.y))
    }

    pub fn push_vertex_with_uv(&mut self, p: Vec3, uv: Vec2) -> MeshVertexId {
        let id = self.positions.len() as MeshVertexId;
        self.positions.push(p);
        self.uvs.push(uv);
        id
    }

    pub fn push_triangle(&mut self, tri: [MeshVertexId; 3]) {
        self.indices.extend_from_slice(&tri);
    }

    pub fn finish(self) -> Mesh {
        let Self {
            positions,
            uvs,
            indices,
        } = self;
        debug_assert_eq!(positions.len(), uvs.len());
        debug_assert_eq!(indices.len() % 3, 0);
        debug_assert!(indices.iter().all(|&i| (i as usize) < positions.len()));

        let normals = vertex_normals(&positions, &indices);
        let tangents = vertex_tangents(&positions, &uvs, &normals, &indices);
        let bounds = bounding_extent(&positions);

        Mesh {
            positions,
            uvs,
            indices,
            normals,
            tangents,
            bounds,
        }
    }
}

/// Area-weighted average of the incident face normals.
fn vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for t in indices.chunks_exact(3) {
        let [a, b, c] = [t[0], t[1], t[2]].map(|v| v as usize);
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    for n in &mut normals {
        *n = n.normalize_or_zero();
    }
    normals
}

fn vertex_tangents(
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
    indices: &[u32],
) -> Vec<Vec4> {
    let mut sdirs = vec![Vec3::ZERO; positions.len()];
    let mut tdirs = vec![Vec3::ZERO; positions.len()];
    for t in indices.chunks_exact(3) {
        let [a, b, c] = [t[0], t[1], t[2]].map(|v| v as usize);
        let e1 = positions[b] - positions[a];
        let e2 = positions[c] - positions[a];
        let duv1 = uvs[b] - uvs[a];
        let duv2 = uvs[c] - uvs[a];

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() < MIN_UV_AREA {
            continue;
        }
        let sdir = (e1 * duv2.y - e2 * duv1.y) / det;
        let tdir = (e2 * duv1.x - e1 * duv2.x) / det;
        for v in [a, b, c] {
            sdirs[v] += sdir;
            tdirs[v] += tdir;
        }
    }

    normals
        .iter()
        .zip(sdirs.iter().zip(&tdirs))
        .map(|(&n, (&sdir, &tdir))| {
            // Gram-Schmidt against the normal.
            let mut t = (sdir - n * n.dot(sdir)).normalize_or_zero();
            if t == Vec3::ZERO {
                t = orthogonal_unit(n);
            }
            let w = if n.cross(t).dot(tdir) < 0.0 { -1.0 } else { 1.0 };
            t.extend(w)
        })
        .collect()
}

/// Some unit vector perpendicular to `n`, stable for equal inputs.
fn orthogonal_unit(n: Vec3) -> Vec3 {
    if n == Vec3::ZERO {
        return Vec3::X;
    }
    let a = n.abs();
    let axis = if a.x <= a.y && a.x <= a.z {
        Vec3::X
    } else if a.y <= a.z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    n.cross(axis).normalize()
}

fn bounding_extent(positions: &[Vec3]) -> Extent<Vec3A> {
    let Some(&first) = positions.first() else {
        return Extent::from_min_and_shape(Vec3A::ZERO, Vec3A::ZERO);
    };
    let (min, max) = positions
        .iter()
        .fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
    Extent::from_min_and_lub(min.into(), max.into())
}
