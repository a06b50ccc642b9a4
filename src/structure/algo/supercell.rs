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

use crate::{FailResult, Structure, Coords, Cell, Lattice};

/// Number of images along one lattice vector in a supercell, as the
/// half-open range of cell offsets `lo..hi`.
///
/// A plain integer `n > 0` means `0..n`, and `n < 0` means `n..0`, so that
/// negative multipliers grow the cell in the negative direction.  Ranges
/// must contain the original cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizeMult {
    lo: i32,
    hi: i32,
}

impl SizeMult {
    pub fn range(lo: i32, hi: i32) -> FailResult<Self> {
        ensure!(lo <= 0 && 0 <= hi, "size range {}..{} must contain zero", lo, hi);
        ensure!(lo < hi, "size range {}..{} is empty", lo, hi);
        Ok(SizeMult { lo, hi })
    }

    pub fn count(n: i32) -> FailResult<Self> {
        match n {
            0 => bail!("size multiplier cannot be zero"),
            n if n > 0 => Ok(SizeMult { lo: 0, hi: n }),
            n => Ok(SizeMult { lo: n, hi: 0 }),
        }
    }

    pub fn lo(&self) -> i32 { self.lo }
    pub fn hi(&self) -> i32 { self.hi }

    /// Number of images.
    pub fn len(&self) -> i32 { self.hi - self.lo }

    /// Whether this is a plain count rather than an explicit range.
    ///
    /// Only `(0, n)` and `(n, 0)` qualify.
    pub fn is_count(&self) -> bool { self.lo == 0 || self.hi == 0 }
}

impl Default for SizeMult {
    fn default() -> Self { SizeMult { lo: 0, hi: 1 } }
}

impl<M: Clone> Structure<M> {
    /// Replicate the structure into a supercell.
    ///
    /// Atoms are ordered with the image offset varying fastest.  The origin
    /// moves by `lo` along each lattice vector, and each vector is scaled by
    /// the number of images.
    pub fn supersize(&self, mults: &[SizeMult; 3]) -> Structure<M> {
        let cell = &self.cell;
        let vectors = cell.vectors();
        let origin = cell.origin() + (0..3)
            .map(|k| vectors[k] * f64::from(mults[k].lo))
            .fold(V3::zero(), |acc, v| acc + v);

        let scale = M33::from_fn(|r, c| match r == c {
            true => f64::from(mults[r].len()),
            false => 0.0,
        });
        let new_cell = Cell::new(Lattice::new(&(&scale * cell.lattice().matrix())))
            .with_origin(origin)
            .with_pbc(cell.pbc());

        let offsets: Vec<V3> = iproduct!(
            mults[0].lo..mults[0].hi,
            mults[1].lo..mults[1].hi,
            mults[2].lo..mults[2].hi
        ).map(|(a, b, c)| V3([a, b, c]).to_f64() * cell.lattice()).collect();

        let carts = self.to_carts();
        let mut new_carts = Vec::with_capacity(carts.len() * offsets.len());
        let mut new_meta = Vec::with_capacity(carts.len() * offsets.len());
        for (cart, meta) in carts.iter().zip(&self.meta) {
            for offset in &offsets {
                new_carts.push(cart + offset);
                new_meta.push(meta.clone());
            }
        }
        Structure::new(new_cell, Coords::Carts(new_carts), new_meta)
    }
}

impl std::convert::TryFrom<i32> for SizeMult {
    type Error = failure::Error;

    fn try_from(n: i32) -> FailResult<Self> { SizeMult::count(n) }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn size_mult_validation() {
        assert_eq!(SizeMult::count(3).unwrap(), SizeMult::range(0, 3).unwrap());
        assert_eq!(SizeMult::count(-2).unwrap(), SizeMult::range(-2, 0).unwrap());
        assert!(SizeMult::count(0).is_err());
        assert!(SizeMult::range(1, 3).is_err());
        assert!(SizeMult::range(-3, -1).is_err());
        assert!(SizeMult::range(0, 0).is_err());
        assert!(SizeMult::range(-1, 2).unwrap().len() == 3);
        assert!(!SizeMult::range(-1, 2).unwrap().is_count());
    }

    #[test]
    fn supersize_negative() {
        let cell = Cell::new(Lattice::cubic(2.0));
        let structure = Structure::new(cell, Coords::Carts(vec![V3([0.5, 0.5, 0.5])]), vec!['a']);
        let mults = [
            SizeMult::count(-2).unwrap(),
            SizeMult::range(-1, 1).unwrap(),
            SizeMult::default(),
        ];
        let big = structure.supersize(&mults);

        assert_eq!(big.num_atoms(), 4);
        assert_eq!(big.cell().origin(), V3([-4.0, -2.0, 0.0]));
        assert_close!(big.lattice().clone(), Lattice::orthorhombic(4.0, 4.0, 2.0));
        assert_eq!(big.to_carts(), vec![
            V3([-3.5, -1.5, 0.5]),
            V3([-3.5, 0.5, 0.5]),
            V3([-1.5, -1.5, 0.5]),
            V3([-1.5, 0.5, 0.5]),
        ]);
        assert!(big.metadata().iter().all(|&c| c == 'a'));
    }
}
