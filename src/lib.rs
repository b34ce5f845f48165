//! Implicit Surface Polygonization
//!
//! Turns the zero level-set of a signed distance field into a triangle mesh,
//! either with Marching Cubes (one vertex per crossed grid edge) or with Dual
//! Contouring (one vertex per crossed grid cell). Both methods sample the field
//! on a uniform grid; negative values are inside.
//!
//! ```
//! use glam::Vec3A;
//! use implicit_polygonizer::{sdf_primitives::sphere, PolygonizeMethod, Polygonizer};
//!
//! let mesh = Polygonizer::new(PolygonizeMethod::DualContouring)
//!     .generate(&|p: Vec3A| sphere(1.0, p), Vec3A::splat(-2.0), Vec3A::splat(2.0), 4.0)
//!     .unwrap();
//! assert!(mesh.triangle_count() > 0);
//! ```
//!
//! # References
//!
//! - William E. Lorensen, Harvey E. Cline ["Marching Cubes: A High Resolution
//!   3D Surface Construction
//!   Algorithm"](https://dl.acm.org/doi/10.1145/37402.37422)
//! - Paul Bourke ["Polygonising a scalar
//!   field"](http://paulbourke.net/geometry/polygonise/)
//! - Tao Ju, Frank Losasso, Scott Schaefer, Joe Warren ["Dual Contouring of
//!   Hermite Data"](https://www.cs.rice.edu/~jwarren/papers/dualcontour.pdf)
//!
//! # Limitations
//!
//! - Dual Contouring vertices are placed by a few steps of relaxation toward
//!   the tangent planes instead of an exact QEF solve, so sharp features are
//!   only approximated.
//! - Marching Cubes doesn't resolve ambiguous faces.

mod dual_contour;
mod error;
mod grid;
mod marching_cubes;
mod mesh;
mod qef;
mod sdf;
mod surface;

pub mod sdf_primitives;
pub mod shapes;
pub mod tables;

pub use dual_contour::*;
pub use error::*;
pub use grid::*;
pub use marching_cubes::*;
pub use mesh::*;
pub use qef::*;
pub use sdf::*;
pub use surface::*;
