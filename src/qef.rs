use crate::sdf::EdgeCrossing;
use glam::{Mat3, Vec3, Vec3A};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Quadric Error Function
///
/// `x^T A x - 2 b^T x + c`
///
/// Sum of squared distances from `x` to a set of planes. Dual contouring
/// relaxes each cell vertex toward the minimum of this function over the
/// planes tangent to the surface at the cell's edge crossings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Qef {
    /// Sum of `n n^T`.
    ata: Mat3,
    /// Sum of `n (n . p)`.
    atb: Vec3A,
    /// Sum of `(n . p)^2`.
    btb: f32,
}

impl Qef {
    pub const ZERO: Self = Self {
        ata: Mat3::ZERO,
        atb: Vec3A::ZERO,
        btb: 0.0,
    };

    /// Squared distance to the plane through `p` with unit normal `n`.
    pub fn plane(p: Vec3A, n: Vec3A) -> Self {
        let d = n.dot(p);
        let n3 = Vec3::from(n);
        Self {
            ata: Mat3::from_cols(n3 * n3.x, n3 * n3.y, n3 * n3.z),
            atb: n * d,
            btb: d * d,
        }
    }

    /// Tangent planes of all crossings, in the crossings' coordinate frame.
    pub fn from_crossings(crossings: &[EdgeCrossing]) -> Self {
        crossings.iter().map(|c| Self::plane(c.point, c.normal)).sum()
    }

    pub fn error(&self, x: Vec3A) -> f32 {
        let x3 = Vec3::from(x);
        x3.dot(self.ata * x3) - 2.0 * x.dot(self.atb) + self.btb
    }
}

impl Default for Qef {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Qef {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for Qef {
    fn add_assign(&mut self, rhs: Self) {
        self.ata += rhs.ata;
        self.atb += rhs.atb;
        self.btb += rhs.btb;
    }
}

impl Sum for Qef {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
