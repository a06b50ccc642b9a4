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

use atomkit_array_types::{V3, M33};

use crate::{FailResult, Lattice};

/// A simulation box: a lattice, an origin, and periodicity flags.
///
/// Fractional coordinates are always measured from the origin, so that
/// `cart = origin + frac * lattice`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    lattice: Lattice,
    origin: V3,
    pbc: [bool; 3],
}

impl Cell {
    /// A fully periodic cell with its origin at zero.
    pub fn new(lattice: Lattice) -> Self
    { Cell { lattice, origin: V3::zero(), pbc: [true; 3] } }

    pub fn with_origin(mut self, origin: V3) -> Self
    { self.origin = origin; self }

    pub fn with_pbc(mut self, pbc: [bool; 3]) -> Self
    { self.pbc = pbc; self }

    #[inline]
    pub fn lattice(&self) -> &Lattice
    { &self.lattice }

    #[inline]
    pub fn origin(&self) -> V3
    { self.origin }

    #[inline]
    pub fn pbc(&self) -> [bool; 3]
    { self.pbc }

    pub fn set_lattice(&mut self, lattice: Lattice)
    { self.lattice = lattice; }

    pub fn set_origin(&mut self, origin: V3)
    { self.origin = origin; }

    pub fn set_pbc(&mut self, pbc: [bool; 3])
    { self.pbc = pbc; }

    /// Lattice vectors as rows.
    pub fn vectors(&self) -> &[V3; 3]
    { self.lattice.vectors() }

    pub fn volume(&self) -> f64
    { self.lattice.volume() }

    pub fn cart_to_frac(&self, cart: &V3) -> V3
    { (cart - self.origin) / &self.lattice }

    pub fn frac_to_cart(&self, frac: &V3) -> V3
    { self.origin + frac * &self.lattice }

    /// The corner of the cell opposite to the origin.
    pub fn far_corner(&self) -> V3
    { self.frac_to_cart(&V3([1.0; 3])) }
}

/// Orientation.
impl Cell {
    /// Re-express the cell using a new set of lattice vectors, then rotate
    /// it into the standard LAMMPS orientation.
    ///
    /// Each row of `uvws` gives the integer coefficients of one new lattice
    /// vector in terms of the current ones.  The basis must be right-handed.
    ///
    /// Returns the new cell and the cartesian rotation `R` that was applied,
    /// such that `new_cart = &R * old_cart` (column convention).  The origin
    /// is rotated along with everything else.
    pub fn rotate(&self, uvws: &M33<i32>) -> FailResult<(Cell, M33)> {
        let det = uvws.det();
        ensure!(det != 0, "rotation basis is singular: {:?}", uvws);
        ensure!(det > 0, "rotation basis is left-handed (det = {}): {:?}", det, uvws);

        let combined = self.lattice.linear_combination(uvws);
        let (lengths, angles) = combined.parameters();
        let oriented = Lattice::from_parameters(lengths, angles)?;

        // oriented = combined * R^T
        let rotation = (combined.inverse_matrix() * oriented.matrix()).t();
        let cell = Cell {
            lattice: oriented,
            origin: &rotation * self.origin,
            pbc: self.pbc,
        };
        Ok((cell, rotation))
    }
}

impl Default for Cell {
    fn default() -> Self
    { Cell::new(Lattice::default()) }
}
