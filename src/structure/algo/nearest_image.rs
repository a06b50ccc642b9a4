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

use atomkit_array_types::V3;

use crate::{Cell, Structure};

/// A helper type for locating nearest images under (partially) periodic
/// boundary conditions.
#[derive(Debug, Clone)]
pub(crate) struct NearestImageFinder {
    cell: Cell,
    // lattice vectors to the 27 cells around the origin,
    // restricted to the periodic directions
    lattice_vector_carts_around_origin: Vec<V3>,
}

impl NearestImageFinder {
    pub(crate) fn new(cell: &Cell) -> Self {
        let pbc = cell.pbc();
        let offsets = |k: usize| if pbc[k] { vec![-1.0, 0.0, 1.0] } else { vec![0.0] };

        let mut vecs = Vec::with_capacity(27);
        for fa in offsets(0) {
            for fb in offsets(1) {
                for fc in offsets(2) {
                    vecs.push(V3([fa, fb, fc]) * cell.lattice());
                }
            }
        }

        NearestImageFinder {
            cell: cell.clone(),
            lattice_vector_carts_around_origin: vecs,
        }
    }

    /// Find the shortest image of a displacement vector.
    ///
    /// Ties are broken in favor of whichever image is encountered first.
    pub(crate) fn shortest_image_cart(&self, cart: V3) -> V3 {
        let pbc = self.cell.pbc();
        let lattice = self.cell.lattice();

        let mut frac = cart / lattice;
        for k in (0..3).filter(|&k| pbc[k]) {
            frac[k] -= frac[k].round();
        }
        let cart = frac * lattice;

        let mut best = cart;
        let mut best_sqnorm = std::f64::INFINITY;
        for offset in &self.lattice_vector_carts_around_origin {
            let candidate = cart + offset;
            let sqnorm = candidate.sqnorm();
            if sqnorm < best_sqnorm {
                best = candidate;
                best_sqnorm = sqnorm;
            }
        }
        best
    }
}

impl<M> Structure<M> {
    /// Minimum image displacement vectors from atom `i` to each of the atoms in `js`.
    ///
    /// # Panics
    /// Panics on out-of-bounds indices.
    pub fn dvect(&self, i: usize, js: &[usize]) -> Vec<V3> {
        let carts = self.to_carts();
        let finder = NearestImageFinder::new(&self.cell);
        js.iter().map(|&j| finder.shortest_image_cart(carts[j] - carts[i])).collect()
    }

    /// Minimum image displacement vectors for every atom, given each atom's neighbors.
    ///
    /// Equivalent to calling [`Structure::dvect`] on each row of `neighbors`,
    /// without recomputing positions each time.
    pub fn dvects(&self, neighbors: &[Vec<usize>]) -> Vec<Vec<V3>> {
        assert_eq!(neighbors.len(), self.num_atoms());
        let carts = self.to_carts();
        let finder = NearestImageFinder::new(&self.cell);
        neighbors.iter().enumerate().map(|(i, js)| {
            js.iter().map(|&j| finder.shortest_image_cart(carts[j] - carts[i])).collect()
        }).collect()
    }
}
