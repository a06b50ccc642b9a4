/* ************************************************************************ **
** This file is part of atomkit, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of atomkit is provided under this permissive       **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

use std::ops::{Mul, Div};
use std::sync::Arc;

use atomkit_array_types::{V3, M33, M3};
use atomkit_assert_close::{CheckClose, Tolerances, CheckCloseError};

use crate::FailResult;

/// Defines a vector basis for periodic boundary conditions in three dimensions.
///
/// The matrix is stored with lattice vectors as rows, and is paired with a
/// precomputed inverse.  Multiplying a row vector of fractional data on the
/// right by the lattice produces cartesian data.
#[derive(Debug, Clone)]
pub struct Lattice {
    matrix: Arc<M33>,
    inverse: Arc<M33>,
}

// Manual impl that doesn't compare the inverse.
impl PartialEq<Lattice> for Lattice {
    fn eq(&self, other: &Lattice) -> bool {
        // deconstruct to get errors when new fields are added
        let Lattice { ref matrix, inverse: _ } = *self;
        matrix == &other.matrix
    }
}

impl Lattice {
    /// Create a lattice from a matrix where the rows are lattice vectors.
    ///
    /// A singular matrix produces a lattice with a non-finite inverse.
    /// Use [`Lattice::checked_new`] for matrices that come from user input.
    #[inline]
    pub fn new(matrix: &M33) -> Self {
        let inverse = Arc::new(matrix.inv());
        let matrix = Arc::new(*matrix);
        Self { matrix, inverse }
    }

    /// Create a lattice, failing if the vectors are (nearly) coplanar.
    pub fn checked_new(matrix: &M33) -> FailResult<Self> {
        let lattice = Self::new(matrix);
        let scale = lattice.norms().iter().product::<f64>();
        ensure!(
            scale > 0.0 && lattice.volume() > 1e-10 * scale,
            "lattice vectors are degenerate: {:?}", matrix,
        );
        Ok(lattice)
    }

    #[inline(always)]
    pub fn from_vectors(vectors: &[V3; 3]) -> Self
    { Self::new(&M3(*vectors)) }

    /// Get the reciprocal lattice.
    ///
    /// This is defined as the inverse transpose. **There is no 2 PI factor.**
    /// Its rows are the vectors normal to the planes spanned by pairs of
    /// real-space lattice vectors, which is what makes Miller plane indices work.
    #[inline]
    pub fn reciprocal(&self) -> Self {
        Self {
            matrix: Arc::new(self.inverse.t()),
            inverse: Arc::new(self.matrix.t()),
        }
    }

    /// Matrix where lattice vectors are rows.
    #[inline]
    pub fn matrix(&self) -> &M33
    { &self.matrix }

    /// Get the (precomputed) inverse of the matrix where lattice vectors are rows.
    #[inline]
    pub fn inverse_matrix(&self) -> &M33
    { &self.inverse }

    #[inline]
    pub fn vectors(&self) -> &[V3; 3]
    { &self.matrix().0 }

    pub fn norms(&self) -> [f64; 3]
    { self.vectors().map(|v| v.norm()) }

    /// Get the (positive) volume of the lattice cell.
    pub fn volume(&self) -> f64
    { self.matrix().det().abs() }

    /// Distance between adjacent lattice planes spanned by the other two vectors.
    ///
    /// e.g. `plane_spacings()[2]` is the height of the cell along the normal of the `ab` plane.
    pub fn plane_spacings(&self) -> [f64; 3] {
        let v = self.vectors();
        let volume = self.volume();
        [
            volume / v[1].cross(&v[2]).norm(),
            volume / v[2].cross(&v[0]).norm(),
            volume / v[0].cross(&v[1]).norm(),
        ]
    }

    /// Apply a cartesian transformation to the lattice.
    pub fn transformed_by(&self, m: &M33) -> Lattice
    { self * &m.t() }

    /// Take an integer linear combination of the lattice vectors.
    pub fn linear_combination(&self, coeffs: &M33<i32>) -> Lattice
    { &coeffs.to_f64() * self }
}

/// Crystallographic cell parameters.
impl Lattice {
    /// Lengths `(a, b, c)` and angles `(alpha, beta, gamma)` in degrees.
    ///
    /// `alpha` is the angle between `b` and `c`, `beta` between `a` and `c`,
    /// and `gamma` between `a` and `b`.
    pub fn parameters(&self) -> ([f64; 3], [f64; 3]) {
        let [a, b, c] = *self.vectors();
        let lengths = [a.norm(), b.norm(), c.norm()];
        let angles = [
            b.angle_to(&c).to_degrees(),
            a.angle_to(&c).to_degrees(),
            a.angle_to(&b).to_degrees(),
        ];
        (lengths, angles)
    }

    /// Build a lattice from cell parameters, in the orientation used by LAMMPS.
    ///
    /// `a` points along `x`, `b` lies in the `xy` plane with a positive `y` component,
    /// and `c` has a positive `z` component.  Angles are in degrees.
    pub fn from_parameters([a, b, c]: [f64; 3], [alpha, beta, gamma]: [f64; 3]) -> FailResult<Self> {
        ensure!(a > 0.0 && b > 0.0 && c > 0.0, "cell lengths must be positive: {:?}", [a, b, c]);
        let (alpha, beta, gamma) = (alpha.to_radians(), beta.to_radians(), gamma.to_radians());

        let xy = b * gamma.cos();
        let xz = c * beta.cos();
        let ly = b * gamma.sin();
        let yz = (b * c * alpha.cos() - xy * xz) / ly;
        let lz_sq = c * c - xz * xz - yz * yz;
        ensure!(lz_sq > 0.0, "cell angles do not describe a valid cell: {:?}", [alpha, beta, gamma]);

        Lattice::checked_new(&M33::from([
            [ a, 0.0, 0.0],
            [xy,  ly, 0.0],
            [xz,  yz, lz_sq.sqrt()],
        ]))
    }

    /// Check whether the lattice is in the lower-triangular orientation used by LAMMPS.
    pub fn is_lammps_oriented(&self, tol: f64) -> bool {
        let m = self.matrix();
        m[0][1].abs() <= tol && m[0][2].abs() <= tol && m[1][2].abs() <= tol
            && m[0][0] > 0.0 && m[1][1] > 0.0 && m[2][2] > 0.0
    }
}

/// Helper constructors
impl Lattice {
    /// The identity lattice.
    #[inline]
    pub fn eye() -> Self { Self::cubic(1.0) }

    #[inline]
    pub fn diagonal(&[x, y, z]: &[f64; 3]) -> Self { Self::orthorhombic(x, y, z) }

    /// A cubic lattice ((a, a, a), (90, 90, 90))
    #[inline]
    pub fn cubic(a: f64) -> Self { Self::orthorhombic(a, a, a) }

    /// An orthorhombic lattice ((a, b, c), (90, 90, 90))
    #[inline]
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self
    { Self::from(&[[a, 0., 0.], [0., b, 0.], [0., 0., c]]) }

    /// A hexagonal lattice ((a, a, c), (90, 90, 120)), in the LAMMPS orientation.
    pub fn hexagonal(a: f64, c: f64) -> Self {
        let half_sqrt3 = 0.5 * f64::sqrt(3.0);
        Self::from(&[
            [a, 0.0, 0.0],
            [-0.5 * a, half_sqrt3 * a, 0.0],
            [0.0, 0.0, c],
        ])
    }
}

/// Defaults to the identity matrix.
impl Default for Lattice {
    #[inline]
    fn default() -> Lattice { Lattice::eye() }
}

impl<'a> From<&'a [[f64; 3]; 3]> for Lattice {
    #[inline(always)]
    fn from(m: &'a [[f64; 3]; 3]) -> Self
    { Lattice::new(&M33::from(*m)) }
}

impl<'a, 'b> Mul<&'b M33> for &'a Lattice {
    type Output = Lattice;

    fn mul(self, other: &'b M33) -> Lattice {
        Lattice::new(&(self.matrix() * other))
    }
}

impl<'a, 'b> Mul<&'b Lattice> for &'a M33 {
    type Output = Lattice;

    fn mul(self, other: &'b Lattice) -> Lattice {
        Lattice::new(&(self * other.matrix()))
    }
}

impl<'a, 'b> Mul<&'b Lattice> for &'a V3 {
    type Output = V3;

    fn mul(self, other: &'b Lattice) -> V3 {
        self * other.matrix()
    }
}

impl<'b> Mul<&'b Lattice> for V3 {
    type Output = V3;

    fn mul(self, other: &'b Lattice) -> V3 {
        self * other.matrix()
    }
}

impl<'a, 'b> Div<&'b Lattice> for &'a V3 {
    type Output = V3;

    fn div(self, other: &'b Lattice) -> V3 {
        self * other.inverse_matrix()
    }
}

impl<'b> Div<&'b Lattice> for V3 {
    type Output = V3;

    fn div(self, other: &'b Lattice) -> V3 {
        self * other.inverse_matrix()
    }
}

impl CheckClose for Lattice {
    type Scalar = f64;

    fn check_close(&self, other: &Lattice, tol: Tolerances) -> Result<(), CheckCloseError> {
        self.matrix().check_close(other.matrix(), tol)
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn get_inverse() {
        let lattice = Lattice::from(&[
            [2.0, 2.0, 0.0],
            [0.0, 4.0, 0.0],
            [0.0, 0.0, 2.0],
        ]);
        let exact_inverse = M33::from([
            [0.5, -0.25, 0.0],
            [0.0,  0.25, 0.0],
            [0.0,   0.0, 0.5],
        ]);
        assert_eq!(&exact_inverse, lattice.inverse_matrix());
        assert_eq!(&exact_inverse.t(), lattice.reciprocal().matrix());
        assert_eq!(lattice.volume(), 16.0);
    }

    #[test]
    fn frac_cart_roundtrip() {
        let lattice = Lattice::hexagonal(3.0, 5.0);
        let frac = V3([0.25, 0.5, 0.75]);
        let cart = frac * &lattice;
        assert_close!(abs=1e-12, cart / &lattice, frac);
    }

    #[test]
    fn parameters_roundtrip() {
        let lattice = Lattice::hexagonal(3.0, 5.0);
        let (lengths, angles) = lattice.parameters();
        assert_close!(lengths, [3.0, 3.0, 5.0]);
        assert_close!(angles, [90.0, 90.0, 120.0]);

        let rebuilt = Lattice::from_parameters(lengths, angles).unwrap();
        assert!(rebuilt.is_lammps_oriented(1e-12));
        assert_close!(abs=1e-12, rebuilt, lattice);

        let triclinic = Lattice::from_parameters([3.0, 4.0, 5.0], [80.0, 85.0, 95.0]).unwrap();
        let (lengths, angles) = triclinic.parameters();
        assert_close!(lengths, [3.0, 4.0, 5.0]);
        assert_close!(rel=1e-9, angles, [80.0, 85.0, 95.0]);
    }

    #[test]
    fn bad_parameters() {
        assert!(Lattice::from_parameters([1.0, 1.0, 0.0], [90.0; 3]).is_err());
        // one angle exceeds the sum of the other two
        assert!(Lattice::from_parameters([1.0; 3], [10.0, 100.0, 150.0]).is_err());
        // narrow, but still a cell
        assert!(Lattice::from_parameters([1.0; 3], [10.0, 100.0, 100.0]).is_ok());
        assert!(Lattice::checked_new(&M33::from([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]])).is_err());
    }

    #[test]
    fn plane_spacings() {
        let lattice = Lattice::hexagonal(2.0, 7.0);
        let spacings = lattice.plane_spacings();
        assert_close!(spacings[0], f64::sqrt(3.0));
        assert_close!(spacings[2], 7.0);
    }
}
