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

// NOTE: Please make sure to use the YamlRead trait when deserializing these types!

use crate::{YamlRead, FailResult, from_empty_mapping};

pub use atomkit_structure::miller::{Miller, Centering};
pub use atomkit_defect::{CellAxis, Component, Reference};
pub use atomkit_lammps_io::{AtomStyle, FlattenStyle};

/// A periodic unit cell with atoms, written out in full.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct UnitCell {
    /// Rows are the lattice vectors.
    pub lattice: [[f64; 3]; 3],

    /// Multiplies the lattice, the origin, and any cartesian positions.
    #[serde(default = "_unit_cell__scale")]
    pub scale: f64,

    #[serde(default)]
    pub origin: [f64; 3],

    #[serde(default = "_unit_cell__pbc")]
    pub pbc: [bool; 3],

    /// Exactly one of `fracs` and `carts` must be given.
    #[serde(default)]
    pub fracs: Option<Vec<[f64; 3]>>,
    #[serde(default)]
    pub carts: Option<Vec<[f64; 3]>>,

    /// LAMMPS atom types (starting from 1).  All atoms are type 1 if omitted.
    #[serde(default)]
    pub types: Option<Vec<i64>>,
}
fn _unit_cell__scale() -> f64 { 1.0 }
fn _unit_cell__pbc() -> [bool; 3] { [true; 3] }
derive_yaml_read!{UnitCell}

/// Borrowed atom positions of a [`UnitCell`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Positions<'a> {
    Fracs(&'a [[f64; 3]]),
    Carts(&'a [[f64; 3]]),
}

impl<'a> Positions<'a> {
    pub fn len(&self) -> usize {
        match *self {
            Positions::Fracs(x) | Positions::Carts(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl UnitCell {
    pub fn positions(&self) -> FailResult<Positions<'_>> {
        match (&self.fracs, &self.carts) {
            (Some(fracs), None) => Ok(Positions::Fracs(fracs)),
            (None, Some(carts)) => Ok(Positions::Carts(carts)),
            (None, None) => bail!("a unit cell needs one of 'fracs' or 'carts'"),
            (Some(_), Some(_)) => bail!("a unit cell cannot have both 'fracs' and 'carts'"),
        }
    }

    /// Atom types for every atom, filling in the default.
    pub fn atom_types(&self) -> FailResult<Vec<i64>> {
        let num_atoms = self.positions()?.len();
        match &self.types {
            None => Ok(vec![1; num_atoms]),
            Some(types) => {
                ensure!(
                    types.len() == num_atoms,
                    "got {} atom types for {} atoms", types.len(), num_atoms,
                );
                if let Some(bad) = types.iter().find(|&&t| t < 1) {
                    bail!("atom types start at 1 (got {})", bad);
                }
                Ok(types.clone())
            },
        }
    }
}

/// A supercell multiplier: a count like `3` (or `-3`), or an explicit range like `[-1, 2]`.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum SizeMult {
    Count(i32),
    Range(i32, i32),
}

impl Default for SizeMult {
    fn default() -> Self { SizeMult::Count(1) }
}

impl SizeMult {
    pub fn to_structure_mult(self) -> FailResult<atomkit_structure::SizeMult> {
        match self {
            SizeMult::Count(n) => atomkit_structure::SizeMult::count(n),
            SizeMult::Range(lo, hi) => atomkit_structure::SizeMult::range(lo, hi),
        }
    }
}

/// Settings for writing a built structure.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Output {
    /// Path of a LAMMPS data file to write.
    #[serde(default)]
    pub lammps_data: Option<String>,

    /// Path of a LAMMPS input script that reads the data file.
    ///
    /// Requires `lammps-data`.
    #[serde(default)]
    pub lammps_script: Option<String>,

    #[serde(default = "_output__units")]
    pub units: String,

    #[serde(default)]
    pub atom_style: AtomStyle,
}
fn _output__units() -> String { "metal".to_string() }

/// Settings for `atomkit-surface`.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Surface {
    pub unit_cell: UnitCell,

    /// The surface plane, as 3 or 4 Miller indices.
    pub plane: Miller,

    #[serde(default = "_surface__cut_axis")]
    pub cut_axis: CellAxis,

    /// Bound on the lattice vector search.  Unbounded if omitted.
    #[serde(default)]
    pub max_index: Option<i32>,

    #[serde(default = "_surface__centering")]
    pub centering: Centering,

    #[serde(default = "_surface__tol")]
    pub tol: f64,

    /// Index into the sorted list of shifts that put the cut between two atomic layers.
    #[serde(default)]
    pub shift_index: usize,

    /// Empty space added on both sides of the slab.
    #[serde(default)]
    pub vacuum_width: Option<f64>,

    /// Stack unit slabs along the cut axis until the slab is at least this thick.
    #[serde(default)]
    pub min_width: Option<f64>,

    #[serde(default)]
    pub size_mults: [SizeMult; 3],

    /// Round the number of unit slabs up to an even number.
    #[serde(default)]
    pub even: bool,

    #[serde(default)]
    pub output: Output,
}
fn _surface__cut_axis() -> CellAxis { CellAxis::C }
fn _surface__centering() -> Centering { Centering::P }
fn _surface__tol() -> f64 { 1e-7 }
derive_yaml_read!{Surface}

/// Settings for `atomkit-dislocation`.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Dislocation {
    pub unit_cell: UnitCell,

    /// Line direction, as 3 or 4 Miller indices.
    pub line: Miller,

    /// Slip plane, as 3 or 4 Miller indices.
    pub slip_plane: Miller,

    /// Cartesian axis for the in-plane direction perpendicular to the line.
    #[serde(default = "_dislocation__m")]
    pub m: [f64; 3],

    /// Cartesian axis for the slip plane normal.
    #[serde(default = "_dislocation__n")]
    pub n: [f64; 3],

    #[serde(default = "_dislocation__max_index")]
    pub max_index: i32,

    #[serde(default = "_dislocation__tol")]
    pub tol: f64,

    #[serde(default)]
    pub size_mults: [SizeMult; 3],

    #[serde(default)]
    pub output: Output,
}
fn _dislocation__m() -> [f64; 3] { [1.0, 0.0, 0.0] }
fn _dislocation__n() -> [f64; 3] { [0.0, 1.0, 0.0] }
fn _dislocation__max_index() -> i32 { 10 }
fn _dislocation__tol() -> f64 { 1e-8 }
derive_yaml_read!{Dislocation}

/// Settings for `atomkit-ddisp`.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Ddisp {
    pub base: UnitCell,
    pub defect: UnitCell,

    /// Neighbors are all atoms within this distance in the reference structure.
    pub cutoff: f64,

    #[serde(default)]
    pub reference: Reference,

    #[serde(default)]
    pub arrows: Arrows,

    /// A per-atom scalar (e.g. a Nye tensor component) used to locate the core.
    #[serde(default)]
    pub core_property: Option<Vec<f64>>,
}
derive_yaml_read!{Ddisp}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Arrows {
    #[serde(default = "_arrows__component")]
    pub component: Component,

    /// Wrap components into `[-ddmax, ddmax]`.
    #[serde(default)]
    pub ddmax: Option<f64>,

    #[serde(default = "_arrows__plot_x")]
    pub plot_x: [f64; 3],

    #[serde(default = "_arrows__plot_y")]
    pub plot_y: [f64; 3],

    #[serde(default)]
    pub xlim: Option<(f64, f64)>,
    #[serde(default)]
    pub ylim: Option<(f64, f64)>,
    #[serde(default)]
    pub zlim: Option<(f64, f64)>,

    #[serde(default)]
    pub use_base_depth: bool,

    /// Components smaller than a tenth of this are zeroed.
    #[serde(default)]
    pub lattice_constant: f64,

    #[serde(default = "_arrows__arrow_scale")]
    pub arrow_scale: f64,
}
fn _arrows__component() -> Component { Component::Projection }
fn _arrows__plot_x() -> [f64; 3] { [1.0, 0.0, 0.0] }
fn _arrows__plot_y() -> [f64; 3] { [0.0, 1.0, 0.0] }
fn _arrows__arrow_scale() -> f64 { 1.0 }

/// Settings for `atomkit-lammps-run`.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct LammpsRun {
    /// The LAMMPS executable and any leading arguments.
    #[serde(default = "_lammps_run__lammps")]
    pub lammps: String,

    /// Launcher prefix, e.g. `mpiexec -n 4`.
    #[serde(default)]
    pub mpi: Option<String>,

    pub script: String,

    /// Used instead of `script` when a log from an earlier attempt exists.
    #[serde(default)]
    pub restart_script: Option<String>,

    #[serde(default)]
    pub logfile: Option<String>,

    #[serde(default)]
    pub working_dir: Option<String>,

    /// How to combine thermo output from several runs in the log.
    #[serde(default)]
    pub flatten: FlattenStyle,
}
fn _lammps_run__lammps() -> String { "lmp".to_string() }
derive_yaml_read!{LammpsRun}

// --------------------------------------------------------

impl Default for Output {
    fn default() -> Self { from_empty_mapping().unwrap() }
}

impl Default for Arrows {
    fn default() -> Self { from_empty_mapping().unwrap() }
}
