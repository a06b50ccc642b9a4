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

//! Periodic cells and the atomic structures that live in them.
//!
//! Positions are stored as absolute cartesian coordinates or as fractional
//! coordinates measured from the cell origin.  A cell may be non-periodic
//! along any of its three lattice vectors.

#[cfg(test)] #[macro_use] extern crate atomkit_assert_close;
#[macro_use] extern crate log;
#[macro_use] extern crate failure;
#[macro_use] extern crate itertools;
#[cfg(test)] extern crate rand;

pub type FailResult<T> = Result<T, failure::Error>;

#[derive(Debug, Fail)]
#[fail(display = "Not nearly an integer: {}", value)]
pub struct IntPrecisionError {
    backtrace: failure::Backtrace,
    value: f64,
}

mod core;
mod algo;
mod util;

pub mod miller;
pub mod region;

//---------------------------
// public reexports; API

pub use crate::core::lattice::Lattice;
pub use crate::core::cell::Cell;
pub use crate::core::coords::Coords;
pub use crate::core::structure::Structure;

pub use crate::algo::supercell::SizeMult;
pub use crate::algo::neighbors::NeighborList;

pub use crate::util::{Tol, gcd3, reduce_by_gcd};
