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

use crate::{Cell, Coords, Lattice};

/// Atoms in a (partially) periodic cell.
///
/// Every atom carries a piece of metadata of type `M`, which is
/// typically an atom type or a record of per-atom properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure<M = ()> {
    pub(crate) cell: Cell,
    pub(crate) coords: Coords,
    pub(crate) meta: Vec<M>,
}

impl Structure<()> {
    /// Create a structure with no metadata.
    pub fn new_coords(cell: Cell, coords: Coords) -> Self {
        let meta = vec![(); coords.len()];
        Self::new(cell, coords, meta)
    }
}

impl<M> Structure<M> {
    /// # Panics
    /// Panics if the number of metadata entries does not match the number of positions.
    pub fn new<Ms>(cell: Cell, coords: Coords, meta: Ms) -> Self
    where Ms: IntoIterator<Item=M>,
    {
        let meta: Vec<_> = meta.into_iter().collect();
        assert_eq!(coords.len(), meta.len());
        Self { cell, coords, meta }
    }

    pub fn num_atoms(&self) -> usize
    { self.coords.len() }

    pub fn cell(&self) -> &Cell
    { &self.cell }

    pub fn lattice(&self) -> &Lattice
    { self.cell.lattice() }

    pub fn metadata(&self) -> &[M]
    { &self.meta }

    pub fn into_parts(self) -> (Cell, Coords, Vec<M>)
    { (self.cell, self.coords, self.meta) }

    /// Replace the cell, holding cartesian positions fixed.
    pub fn set_cell(&mut self, cell: Cell) {
        self.ensure_carts();
        self.cell = cell;
    }

    pub fn set_pbc(&mut self, pbc: [bool; 3])
    { self.cell.set_pbc(pbc); }
}

//---------------------------
// metadata
impl<M> Structure<M> {
    pub fn map_metadata_into<M2, F>(self, f: F) -> Structure<M2>
    where F: FnMut(M) -> M2,
    {
        let Structure { cell, coords, meta } = self;
        let meta = meta.into_iter().map(f).collect();
        Structure { cell, coords, meta }
    }

    pub fn map_metadata_to<M2, F>(&self, f: F) -> Structure<M2>
    where F: FnMut(&M) -> M2,
    {
        let cell = self.cell.clone();
        let coords = self.coords.clone();
        let meta = self.meta.iter().map(f).collect();
        Structure { cell, coords, meta }
    }

    pub fn without_metadata(self) -> Structure<()>
    { self.map_metadata_into(|_| ()) }
}

//---------------------------
// coordinates
impl<M> Structure<M> {
    pub fn to_carts(&self) -> Vec<V3>
    { self.coords.to_carts(&self.cell) }

    pub fn to_fracs(&self) -> Vec<V3>
    { self.coords.to_fracs(&self.cell) }

    /// # Panics
    /// Panics if the length does not match.
    pub fn set_coords(&mut self, coords: Coords) {
        assert_eq!(self.coords.len(), coords.len());
        self.coords = coords;
    }

    pub fn set_carts(&mut self, carts: Vec<V3>)
    { self.set_coords(Coords::Carts(carts)); }

    pub fn set_fracs(&mut self, fracs: Vec<V3>)
    { self.set_coords(Coords::Fracs(fracs)); }

    pub fn with_carts(mut self, carts: Vec<V3>) -> Self { self.set_carts(carts); self }
    pub fn with_fracs(mut self, fracs: Vec<V3>) -> Self { self.set_fracs(fracs); self }

    fn ensure_carts(&mut self) {
        let dummy = Coords::Carts(vec![]);
        let coords = std::mem::replace(&mut self.coords, dummy);
        self.coords = Coords::Carts(coords.into_carts(&self.cell));
    }

    fn ensure_fracs(&mut self) {
        let dummy = Coords::Carts(vec![]);
        let coords = std::mem::replace(&mut self.coords, dummy);
        self.coords = Coords::Fracs(coords.into_fracs(&self.cell));
    }

    fn carts_mut(&mut self) -> &mut [V3] {
        self.ensure_carts();
        match self.coords {
            Coords::Carts(ref mut c) => c,
            Coords::Fracs(_) => unreachable!(),
        }
    }

    fn fracs_mut(&mut self) -> &mut [V3] {
        self.ensure_fracs();
        match self.coords {
            Coords::Fracs(ref mut c) => c,
            Coords::Carts(_) => unreachable!(),
        }
    }

    /// Move every atom (but not the cell).
    pub fn translate_cart(&mut self, v: &V3) {
        for x in self.carts_mut() {
            *x += v;
        }
    }

    /// Move every atom by a fractional offset (but not the cell).
    pub fn translate_frac(&mut self, v: &V3) {
        for x in self.fracs_mut() {
            *x += v;
        }
    }

    /// Move the cell and every atom together.
    pub fn translate_all(&mut self, v: &V3) {
        self.ensure_fracs();
        let origin = self.cell.origin() + v;
        self.cell.set_origin(origin);
    }

    /// Bring atoms back inside the cell along its periodic directions.
    ///
    /// Returns the image flags of every atom: the integer number of cell
    /// vectors that the original position lay away from the wrapped one.
    /// Along non-periodic directions, positions are left alone and the flag is zero.
    pub fn wrap(&mut self) -> Vec<V3<i32>> {
        let pbc = self.cell.pbc();
        self.fracs_mut().iter_mut().map(|frac| {
            let mut image = V3([0; 3]);
            for k in (0..3).filter(|&k| pbc[k]) {
                let floor = frac[k].floor();
                frac[k] -= floor;
                image[k] = floor as i32;
                // tiny negative values round up to exactly 1.0
                if frac[k] >= 1.0 {
                    frac[k] = 0.0;
                    image[k] += 1;
                }
            }
            image
        }).collect()
    }
}
