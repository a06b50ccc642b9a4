//! Crystal orientation, defect construction, and LAMMPS interop for atomistic simulations.
//!
//! This crate only gathers the workspace members under one roof.

pub use atomkit_array_types as array_types;
pub use atomkit_structure as structure;
pub use atomkit_defect as defect;
pub use atomkit_lammps_io as lammps;
pub use atomkit_mep as mep;
pub use atomkit_tasks as tasks;
