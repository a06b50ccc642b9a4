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

//! Orienting crystals for defect simulations, and analyzing the result.
//!
//! * [`resolve_dislocation`] and [`resolve_surface`] find integer lattice
//!   vectors for a simulation cell whose axes line up with a dislocation's
//!   line direction and slip plane, or with a free surface.
//! * [`DifferentialDisplacement`] compares a defect-free and a defect-containing
//!   structure pair by pair, producing the arrows of a differential displacement map.

#[macro_use] extern crate atomkit_assert_close;
#[macro_use] extern crate log;
#[macro_use] extern crate failure;
#[macro_use] extern crate itertools;

pub type FailResult<T> = Result<T, failure::Error>;

mod axes;
mod search;
mod dislocation;
mod free_surface;
mod ddisp;

pub use crate::axes::{CellAxis, axis_alignment, axes_check};
pub use crate::search::lattice_vectors;
pub use crate::dislocation::{
    DislocationBasis, DislocationOptions, ResolveError,
    dislocation_system_transform, resolve_dislocation,
};
pub use crate::free_surface::{
    FreeSurface, SurfaceBasis, SurfaceOptions, SurfaceSettings, SurfaceSystem, resolve_surface,
};
pub use crate::ddisp::{
    DifferentialDisplacement, DisplacementField, Reference, SolveOptions, DdError,
    ArrowSettings, Arrows, AtomMarkers, Component, PlotFrame,
    CoreStats, core_position,
};
