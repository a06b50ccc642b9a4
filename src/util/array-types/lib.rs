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

//! Small, `Copy` linear algebra types.
//!
//! Conventions that the rest of atomkit relies on:
//!
//! * A matrix is stored as an array of **rows**.
//! * `&m * v` treats `v` as a column vector.
//! * `v * &m` treats `v` as a row vector.  Since lattices store their vectors
//!   as rows, this is the product that turns fractional data into cartesian data.

#[cfg(test)]
#[macro_use]
extern crate atomkit_assert_close;

mod types;
mod ops;
mod methods_v;
mod methods_m;
mod conv;

pub use crate::types::{V3, M3, M33};
pub use crate::methods_v::{dot, cross};
pub use crate::methods_m::{eye, inv};
pub use crate::conv::{Envee, Unvee};

#[cfg(test)]
mod tests;
