use crate::{dual_contour, marching_cubes, DualContouringConfig, Mesh, Result, SampleGrid, Sdf};
use glam::Vec3A;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolygonizeMethod {
    #[default]
    MarchingCubes,
    DualContouring,
}

/// Samples a field on a regular grid and turns it into a [`Mesh`] with the
/// selected method.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Polygonizer {
    pub method: PolygonizeMethod,
    /// Ignored by Marching Cubes.
    pub dual_contouring: DualContouringConfig,
}

impl Polygonizer {
    pub fn new(method: PolygonizeMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Polygonizes the zero level-set of `sdf` inside `[min, max]` with
    /// `resolution` samples per unit length.
    ///
    /// An inverted or flat box, or a non-positive resolution, gives an empty
    /// mesh.
    pub fn generate(
        &self,
        sdf: &impl Sdf,
        min: Vec3A,
        max: Vec3A,
        resolution: f32,
    ) -> Result<Mesh> {
        let start = Instant::now();
        let grid = SampleGrid::sample_between(sdf, min, max, resolution);
        let mesh = self.polygonize_grid(sdf, &grid)?;
        log::debug!(
            "{:?} polygonized {:?} grid into {} vertices, {} triangles ({} ms)",
            self.method,
            grid.dims(),
            mesh.vertex_count(),
            mesh.triangle_count(),
            start.elapsed().as_millis()
        );
        Ok(mesh)
    }

    /// `sdf` must be the field `grid` was sampled from.
    pub fn polygonize_grid(&self, sdf: &impl Sdf, grid: &SampleGrid) -> Result<Mesh> {
        match self.method {
            PolygonizeMethod::MarchingCubes => Ok(marching_cubes(grid)),
            PolygonizeMethod::DualContouring => dual_contour(sdf, grid, &self.dual_contouring),
        }
    }
}

/// Serializable polygonizer settings for a box centered on the origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub method: PolygonizeMethod,
    /// Half extent of the sampling box on each axis.
    pub bound: [f32; 3],
    pub resolution: f32,
    pub dual_contouring: DualContouringConfig,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            method: PolygonizeMethod::MarchingCubes,
            bound: [5.0; 3],
            resolution: 4.0,
            dual_contouring: DualContouringConfig::default(),
        }
    }
}

impl SurfaceConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn polygonizer(&self) -> Polygonizer {
        Polygonizer {
            method: self.method,
            dual_contouring: self.dual_contouring,
        }
    }

    pub fn polygonize(&self, sdf: &impl Sdf) -> Result<Mesh> {
        let bound = Vec3A::from(self.bound);
        self.polygonizer().generate(sdf, -bound, bound, self.resolution)
    }
}
