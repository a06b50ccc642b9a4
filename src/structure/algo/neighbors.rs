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

use crate::{FailResult, Structure};

/// For each atom, the indices of its neighbors, in a fixed order.
///
/// Atom `j` appears at most once in the list of atom `i`, even when several
/// periodic images of `j` are within range.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeighborList {
    lists: Vec<Vec<usize>>,
}

impl NeighborList {
    /// Use a precomputed topology.
    pub fn from_lists(lists: Vec<Vec<usize>>) -> FailResult<Self> {
        let n = lists.len();
        for (i, list) in lists.iter().enumerate() {
            if let Some(&j) = list.iter().find(|&&j| j >= n) {
                bail!("neighbor {} of atom {} is out of bounds for {} atoms", j, i, n);
            }
        }
        Ok(NeighborList { lists })
    }

    /// Find all pairs of atoms within `cutoff` of each other, under the
    /// structure's own periodicity.
    ///
    /// Neighbors of each atom are listed in increasing index order.  An atom
    /// only counts as its own neighbor when one of its periodic images is in range.
    pub fn from_cutoff<M>(structure: &Structure<M>, cutoff: f64) -> FailResult<Self> {
        ensure!(cutoff > 0.0, "neighbor cutoff must be positive (got {})", cutoff);

        let cell = structure.cell();
        let lattice = cell.lattice();
        let pbc = cell.pbc();
        let spacings = lattice.plane_spacings();

        // how many images to check in each direction
        let mut reach = [0i32; 3];
        for k in 0..3 {
            if pbc[k] {
                reach[k] = (cutoff / spacings[k]).ceil() as i32;
            }
        }
        let image_carts: Vec<(bool, V3)> = iproduct!(
            -reach[0]..=reach[0],
            -reach[1]..=reach[1],
            -reach[2]..=reach[2]
        ).map(|(a, b, c)| {
            let is_zero = (a, b, c) == (0, 0, 0);
            (is_zero, V3([a, b, c]).to_f64() * lattice)
        }).collect();

        let carts = structure.to_carts();
        let cutoff_sq = cutoff * cutoff;
        let lists = carts.iter().enumerate().map(|(i, cart_i)| {
            carts.iter().enumerate().filter(|&(j, cart_j)| {
                let diff = cart_j - cart_i;
                image_carts.iter().any(|&(is_zero, ref image)| {
                    !(is_zero && i == j) && (diff + image).sqnorm() <= cutoff_sq
                })
            }).map(|(j, _)| j).collect()
        }).collect();

        Ok(NeighborList { lists })
    }

    pub fn num_atoms(&self) -> usize
    { self.lists.len() }

    /// Neighbors of atom `i`.
    pub fn neighbors(&self, i: usize) -> &[usize]
    { &self.lists[i] }

    pub fn lists(&self) -> &[Vec<usize>]
    { &self.lists }

    pub fn num_pairs(&self) -> usize
    { self.lists.iter().map(|list| list.len()).sum() }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::{Cell, Lattice, Coords};

    #[test]
    fn simple_cubic() {
        let cell = Cell::new(Lattice::cubic(1.0));
        let structure = Structure::new_coords(cell, Coords::Fracs(vec![V3::zero()]));

        // the only neighbors are images of the atom itself
        let list = NeighborList::from_cutoff(&structure, 1.1).unwrap();
        assert_eq!(list.neighbors(0), &[0][..]);

        let supercell = structure.supersize(&[crate::SizeMult::count(3).unwrap(); 3]);
        let list = NeighborList::from_cutoff(&supercell, 1.1).unwrap();
        assert_eq!(list.num_atoms(), 27);
        assert!(list.lists().iter().all(|l| l.len() == 6));
        assert_eq!(list.num_pairs(), 27 * 6);
    }

    #[test]
    fn open_boundaries() {
        let cell = Cell::new(Lattice::cubic(10.0)).with_pbc([false; 3]);
        let structure = Structure::new_coords(cell, Coords::Carts(vec![
            V3([0.0, 0.0, 0.0]),
            V3([1.0, 0.0, 0.0]),
            V3([9.5, 0.0, 0.0]),
            V3([0.0, 1.0, 0.0]),
        ]));
        let list = NeighborList::from_cutoff(&structure, 1.2).unwrap();
        assert_eq!(list.lists(), &[vec![1, 3], vec![0], vec![], vec![0]][..]);

        let mut periodic = structure.clone();
        periodic.set_pbc([true; 3]);
        let list = NeighborList::from_cutoff(&periodic, 1.2).unwrap();
        assert_eq!(list.neighbors(0), &[1, 2, 3][..]);
    }

    #[test]
    fn bad_input() {
        assert!(NeighborList::from_lists(vec![vec![1], vec![2]]).is_err());
        assert!(NeighborList::from_lists(vec![vec![1], vec![0]]).is_ok());
    }
}
