use crate::{tables::CORNER_OFFSETS, Sdf};
use glam::Vec3A;
use ilattice::extent::Extent;

/// Dense samples of a field on a regular lattice.
///
/// Sample `[x, y, z]` sits at `bounds.minimum + [x, y, z] / resolution`. The
/// lattice has `floor(extent * resolution)` samples per axis, so it starts on
/// the minimum corner and may stop short of the maximum one.
#[derive(Clone, Debug)]
pub struct SampleGrid {
    bounds: Extent<Vec3A>,
    resolution: f32,
    dims: [usize; 3],
    samples: Vec<f32>,
}

impl SampleGrid {
    /// Evaluates `sdf` at every lattice point inside `bounds`.
    ///
    /// A non-positive resolution or extent yields an empty grid rather than an
    /// error.
    pub fn sample(sdf: &impl Sdf, bounds: Extent<Vec3A>, resolution: f32) -> Self {
        let scaled = bounds.shape * resolution;
        let dims = [scaled.x, scaled.y, scaled.z].map(lattice_len);

        let num_samples = dims.iter().product();
        let mut samples = Vec::with_capacity(num_samples);
        for x in 0..dims[0] {
            for y in 0..dims[1] {
                for z in 0..dims[2] {
                    samples.push(sdf.evaluate(lattice_position(
                        bounds.minimum,
                        resolution,
                        [x, y, z],
                    )));
                }
            }
        }
        log::trace!("sampled {dims:?} grid ({num_samples} samples)");

        Self {
            bounds,
            resolution,
            dims,
            samples,
        }
    }

    pub fn sample_between(sdf: &impl Sdf, min: Vec3A, max: Vec3A, resolution: f32) -> Self {
        Self::sample(sdf, Extent::from_min_and_lub(min, max), resolution)
    }

    /// The box that was requested, not the (possibly smaller) sampled region.
    pub fn bounds(&self) -> &Extent<Vec3A> {
        &self.bounds
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Number of unit cells per axis (one less than the samples).
    pub fn num_cells(&self) -> [usize; 3] {
        self.dims.map(|d| d.saturating_sub(1))
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn value(&self, [x, y, z]: [usize; 3]) -> f32 {
        self.samples[(x * self.dims[1] + y) * self.dims[2] + z]
    }

    /// World position of a lattice point. Fractional lattice coordinates are
    /// allowed.
    #[inline]
    pub fn position(&self, p: Vec3A) -> Vec3A {
        p / self.resolution + self.bounds.minimum
    }

    /// Samples at the 8 corners of the cell based at `cell`, in
    /// [`CORNER_OFFSETS`] order.
    pub fn corner_values(&self, [x, y, z]: [usize; 3]) -> [f32; 8] {
        CORNER_OFFSETS.map(|[ox, oy, oz]| self.value([x + ox, y + oy, z + oz]))
    }
}

fn lattice_len(scaled_extent: f32) -> usize {
    // Also rejects NaN.
    if scaled_extent > 0.0 {
        scaled_extent.floor() as usize
    } else {
        0
    }
}

#[inline]
fn lattice_position(minimum: Vec3A, resolution: f32, [x, y, z]: [usize; 3]) -> Vec3A {
    Vec3A::new(x as f32, y as f32, z as f32) / resolution + minimum
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    #[test]
    fn dims_are_floored_extent_times_resolution() {
        let grid = SampleGrid::sample_between(
            &|_: Vec3A| 1.0f32,
            Vec3A::new(-1.0, 0.0, 0.0),
            Vec3A::new(1.0, 1.1, 0.6),
            4.0,
        );
        assert_eq!(grid.dims(), [8, 4, 2]);
        assert_eq!(grid.num_cells(), [7, 3, 1]);
    }

    #[test]
    fn samples_match_field_at_lattice_points() {
        let field = |p: Vec3A| p.x + 10.0 * p.y + 100.0 * p.z;
        let min = Vec3A::new(-1.0, -2.0, 0.5);
        let grid = SampleGrid::sample_between(&field, min, Vec3A::new(1.0, 2.0, 2.5), 2.0);

        let p = grid.position(Vec3A::new(3.0, 1.0, 2.0));
        assert_relative_eq!(p.x, 0.5);
        assert_relative_eq!(p.y, -1.5);
        assert_relative_eq!(p.z, 1.5);
        assert_relative_eq!(grid.value([3, 1, 2]), field(p));
        assert_relative_eq!(grid.value([0, 0, 0]), field(min));
    }

    #[test]
    fn corner_values_follow_corner_offsets() {
        let field = |p: Vec3A| p.x + 2.0 * p.y + 4.0 * p.z;
        let grid = SampleGrid::sample_between(&field, Vec3A::ZERO, Vec3A::splat(3.0), 1.0);
        let corners = grid.corner_values([1, 1, 1]);
        for (value, [ox, oy, oz]) in corners.into_iter().zip(CORNER_OFFSETS) {
            let expected = (1 + ox) as f32 + 2.0 * (1 + oy) as f32 + 4.0 * (1 + oz) as f32;
            assert_relative_eq!(value, expected);
        }
    }

    #[test]
    fn degenerate_bounds_give_empty_grid() {
        let calls = Cell::new(0);
        let field = |_: Vec3A| {
            calls.set(calls.get() + 1);
            1.0f32
        };

        let inverted = SampleGrid::sample_between(&field, Vec3A::ONE, Vec3A::ZERO, 4.0);
        assert!(inverted.is_empty());
        assert_eq!(inverted.dims(), [0, 0, 0]);

        let flat = SampleGrid::sample_between(&field, Vec3A::ZERO, Vec3A::new(1.0, 0.0, 1.0), 4.0);
        assert!(flat.is_empty());
        assert_eq!(flat.num_cells(), [3, 0, 3]);

        for resolution in [0.0, -2.0, f32::NAN] {
            let grid = SampleGrid::sample_between(&field, Vec3A::ZERO, Vec3A::ONE, resolution);
            assert!(grid.is_empty());
        }

        assert_eq!(calls.get(), 0);
    }
}
