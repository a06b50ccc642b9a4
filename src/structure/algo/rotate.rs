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

use crate::{FailResult, Structure, Coords};

/// Tolerance (in fractional units of the new cell) for deciding whether an
/// image lies inside the new cell.
const INSIDE_TOL: f64 = 1e-8;

impl<M: Clone> Structure<M> {
    /// Rebuild the structure in a new cell spanned by integer combinations
    /// of the current lattice vectors, oriented the way LAMMPS expects.
    ///
    /// See [`Cell::rotate`](crate::Cell::rotate) for the meaning of `uvws` and the
    /// returned rotation.  The new cell holds `|det(uvws)|` copies of the
    /// original atoms.  Atoms keep the metadata of the atom they are an image of.
    ///
    /// The cell must be periodic in all three directions.
    pub fn rotate(&self, uvws: &M33<i32>) -> FailResult<(Structure<M>, M33)> {
        ensure!(self.cell.pbc() == [true; 3], "rotation requires a fully periodic cell");
        let (cell, rotation) = self.cell.rotate(uvws)?;

        // fracs in the new cell are obtained by g = (f + n) U^-1
        let uvws_inv = uvws.to_f64().inv();
        let (lo, hi) = image_bounds(uvws);
        let fracs = self.to_fracs();

        let mut new_fracs = vec![];
        let mut new_meta = vec![];
        for (frac, meta) in fracs.iter().zip(&self.meta) {
            for (a, b, c) in iproduct!(lo[0]..=hi[0], lo[1]..=hi[1], lo[2]..=hi[2]) {
                let image = frac + V3([a, b, c]).to_f64();
                let new_frac = image * &uvws_inv;
                if new_frac.iter().all(|&x| -INSIDE_TOL <= x && x < 1.0 - INSIDE_TOL) {
                    new_fracs.push(new_frac);
                    new_meta.push(meta.clone());
                }
            }
        }

        let expected = self.num_atoms() * uvws.det().abs() as usize;
        ensure!(
            new_fracs.len() == expected,
            "rotation produced {} atoms, expected {} (are the atoms inside the cell?)",
            new_fracs.len(), expected,
        );
        trace!("rotated structure now has {} atoms", expected);

        Ok((Structure::new(cell, Coords::Fracs(new_fracs), new_meta), rotation))
    }
}

// Range of old-cell images that can overlap the new cell, with a margin
// of one cell for atoms that lie slightly outside of the old cell.
fn image_bounds(uvws: &M33<i32>) -> (V3<i32>, V3<i32>) {
    let mut lo = V3([0; 3]);
    let mut hi = V3([0; 3]);
    for (i, j, k) in iproduct!(0..2, 0..2, 0..2) {
        let corner = &uvws[0] * i + &uvws[1] * j + &uvws[2] * k;
        for axis in 0..3 {
            lo[axis] = lo[axis].min(corner[axis]);
            hi[axis] = hi[axis].max(corner[axis]);
        }
    }
    (lo - V3([1; 3]), hi + V3([1; 3]))
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::{Cell, Lattice};

    fn fcc_conventional() -> Structure<u32> {
        let cell = Cell::new(Lattice::cubic(4.0));
        let fracs = vec![
            V3([0.0, 0.0, 0.0]),
            V3([0.0, 0.5, 0.5]),
            V3([0.5, 0.0, 0.5]),
            V3([0.5, 0.5, 0.0]),
        ];
        Structure::new(cell, Coords::Fracs(fracs), vec![1, 2, 3, 4])
    }

    #[test]
    fn identity_rotation() {
        let original = fcc_conventional();
        let (rotated, rotation) = original.rotate(&M33::eye()).unwrap();
        assert_close!(abs=1e-12, rotation, M33::eye());
        assert_eq!(rotated.metadata(), original.metadata());
        assert_close!(abs=1e-12, rotated.to_carts(), original.to_carts());
    }

    #[test]
    fn atom_count_scales_with_det() {
        let original = fcc_conventional();
        let uvws = M33::from([[1, -1, 0], [1, 1, -2], [1, 1, 1]]);
        assert_eq!(uvws.det(), 6);

        let (rotated, rotation) = original.rotate(&uvws).unwrap();
        assert_eq!(rotated.num_atoms(), 24);
        assert_close!(rotated.lattice().volume(), 6.0 * 64.0);

        // every atom of each type is replicated equally
        for ty in 1..=4 {
            assert_eq!(rotated.metadata().iter().filter(|&&m| m == ty).count(), 6);
        }
        // the rotation is orthogonal and maps [1 -1 0] onto x
        assert_close!(abs=1e-12, &rotation * &rotation.t(), M33::eye());
        let mapped = &rotation * V3([4.0, -4.0, 0.0]);
        assert_close!(abs=1e-12, mapped, V3([4.0 * f64::sqrt(2.0), 0.0, 0.0]));
    }

    #[test]
    fn rejects_partial_periodicity() {
        let mut original = fcc_conventional();
        original.set_pbc([true, true, false]);
        assert!(original.rotate(&M33::eye()).is_err());
    }
}
