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

//! Building blocks for relaxing a path of coordinates: energy gradients
//! by finite differences, and fixed-step integration.
//!
//! Coordinates are flat slices of floats.  A path of `n` points in `d`
//! dimensions is simply `n` such slices.

#[macro_use] extern crate itertools;
#[macro_use] extern crate failure;
#[cfg(test)] #[macro_use] extern crate atomkit_assert_close;

pub type FailResult<T> = Result<T, failure::Error>;

mod gradient;
mod integrator;

pub use crate::gradient::{central_difference, try_central_difference, DEFAULT_SHIFT};
pub use crate::integrator::{Integrator, rungekutta, try_rungekutta};

pub(crate) enum Never {}
