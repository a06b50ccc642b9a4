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

use crate::Cell;

/// Wrapper type for coordinates used as input to some APIs.
///
/// This allows a function to support either cartesian coordinates,
/// or fractional coordinates with respect to some cell.
///
/// Cartesian coordinates are absolute; fractional coordinates are measured
/// from the cell origin.
#[derive(Debug, Clone, PartialEq)]
pub enum Coords {
    Carts(Vec<V3>),
    Fracs(Vec<V3>),
}

impl Coords {
    pub fn len(&self) -> usize
    { self.as_slice().len() }

    pub fn is_empty(&self) -> bool
    { self.len() == 0 }

    fn as_slice(&self) -> &[V3]
    { match *self {
        Coords::Carts(ref c) => c,
        Coords::Fracs(ref c) => c,
    }}
}

// conversions
impl Coords {
    pub fn into_carts(self, cell: &Cell) -> Vec<V3>
    { match self {
        Coords::Carts(c) => c,
        Coords::Fracs(c) => c.iter().map(|f| cell.frac_to_cart(f)).collect(),
    }}

    pub fn into_fracs(self, cell: &Cell) -> Vec<V3>
    { match self {
        Coords::Carts(c) => c.iter().map(|x| cell.cart_to_frac(x)).collect(),
        Coords::Fracs(c) => c,
    }}

    pub fn to_carts(&self, cell: &Cell) -> Vec<V3>
    { match *self {
        Coords::Carts(ref c) => c.clone(),
        Coords::Fracs(ref c) => c.iter().map(|f| cell.frac_to_cart(f)).collect(),
    }}

    pub fn to_fracs(&self, cell: &Cell) -> Vec<V3>
    { match *self {
        Coords::Carts(ref c) => c.iter().map(|x| cell.cart_to_frac(x)).collect(),
        Coords::Fracs(ref c) => c.clone(),
    }}
}
