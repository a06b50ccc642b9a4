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

//! Differential displacement analysis.
//!
//! A differential displacement is the change, between a defect-free and a
//! defect-containing structure, of the vector between two neighboring atoms.
//! Plotted as arrows between atom pairs, the field shows the core of a dislocation.

use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;

use atomkit_array_types::V3;
use atomkit_structure::{NeighborList, Structure};

use crate::FailResult;

mod arrows;
mod core_fit;

pub use self::arrows::{ArrowSettings, Arrows, AtomMarkers, Component, PlotFrame};
pub use self::core_fit::{CoreStats, core_position};

/// Which structure's geometry is used for the neighbor topology and the arrows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Reference {
    Base = 0,
    Defect = 1,
}

impl Default for Reference {
    fn default() -> Self { Reference::Defect }
}

impl TryFrom<i32> for Reference {
    type Error = DdError;

    fn try_from(value: i32) -> Result<Self, DdError> {
        match value {
            0 => Ok(Reference::Base),
            1 => Ok(Reference::Defect),
            _ => Err(DdError::BadReference(value)),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Reference::Base => write!(f, "base"),
            Reference::Defect => write!(f, "defect"),
        }
    }
}

#[derive(Debug, Fail)]
pub enum DdError {
    #[fail(display = "differential displacements have not been solved yet")]
    NotSolved,

    #[fail(display = "no structures have been given")]
    MissingStructures,

    #[fail(display = "either neighbors or cutoff must be given")]
    MissingTopology,

    #[fail(display = "base structure has {} atoms, but defect structure has {}", base, defect)]
    AtomCountMismatch { base: usize, defect: usize },

    #[fail(display = "neighbor list is for {} atoms, but the structures have {}", neighbors, atoms)]
    TopologyMismatch { neighbors: usize, atoms: usize },

    #[fail(display = "reference must be 0 or 1 (got {})", _0)]
    BadReference(i32),
}

/// Per-pair results of a solve, in order of reference atom, then neighbor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplacementField {
    /// `(atom, neighbor)` for each entry.
    pub pairs: Vec<(usize, usize)>,
    /// Neighbor displacement in the defect structure minus the one in the base structure.
    pub ddvectors: Vec<V3>,
    /// Midpoints of the pairs in the reference structure.
    pub centers: Vec<V3>,
    /// Unit vectors from atom to neighbor in the reference structure.
    pub units: Vec<V3>,
}

impl DisplacementField {
    pub fn len(&self) -> usize { self.pairs.len() }
    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
}

/// Inputs for [`DifferentialDisplacement::configure`] and [`DifferentialDisplacement::solve`].
///
/// Anything left as `None` is taken from the previous configuration.  A
/// neighbor list takes priority over a cutoff; a cutoff is applied to the
/// reference structure.
pub struct SolveOptions<M = ()> {
    pub base: Option<Arc<Structure<M>>>,
    pub defect: Option<Arc<Structure<M>>>,
    pub neighbors: Option<NeighborList>,
    pub cutoff: Option<f64>,
    pub reference: Option<Reference>,
}

impl<M> Default for SolveOptions<M> {
    fn default() -> Self {
        SolveOptions { base: None, defect: None, neighbors: None, cutoff: None, reference: None }
    }
}

impl<M> SolveOptions<M> {
    pub fn structures(base: Structure<M>, defect: Structure<M>) -> Self {
        SolveOptions {
            base: Some(Arc::new(base)),
            defect: Some(Arc::new(defect)),
            ..Default::default()
        }
    }

    pub fn cutoff(mut self, cutoff: f64) -> Self { self.cutoff = Some(cutoff); self }
    pub fn neighbors(mut self, neighbors: NeighborList) -> Self { self.neighbors = Some(neighbors); self }
    pub fn reference(mut self, reference: Reference) -> Self { self.reference = Some(reference); self }
}

#[derive(Debug)]
struct Config<M> {
    base: Arc<Structure<M>>,
    defect: Arc<Structure<M>>,
    neighbors: Arc<NeighborList>,
    reference: Reference,
}

// Manual impl that doesn't require M: Clone.
impl<M> Clone for Config<M> {
    fn clone(&self) -> Self {
        Config {
            base: self.base.clone(),
            defect: self.defect.clone(),
            neighbors: self.neighbors.clone(),
            reference: self.reference,
        }
    }
}

#[derive(Debug)]
enum State<M> {
    Unconfigured {
        structures: Option<(Arc<Structure<M>>, Arc<Structure<M>>)>,
        reference: Reference,
    },
    Configured(Config<M>),
    Solved(Config<M>, Arc<DisplacementField>),
}

/// Computes differential displacements between a base and a defect structure.
///
/// Every call that changes the inputs builds a complete new state before
/// replacing the old one, so a failed call leaves the object as it was.
#[derive(Debug)]
pub struct DifferentialDisplacement<M = ()> {
    state: State<M>,
}

impl<M> Default for DifferentialDisplacement<M> {
    fn default() -> Self { Self::new() }
}

impl<M> DifferentialDisplacement<M> {
    pub fn new() -> Self {
        let state = State::Unconfigured { structures: None, reference: Reference::default() };
        DifferentialDisplacement { state }
    }

    /// Store a pair of structures without solving.
    pub fn with_structures(base: Structure<M>, defect: Structure<M>, reference: Reference) -> FailResult<Self> {
        check_counts(&base, &defect)?;
        let structures = Some((Arc::new(base), Arc::new(defect)));
        Ok(DifferentialDisplacement { state: State::Unconfigured { structures, reference } })
    }

    /// Construct and immediately solve.
    pub fn solved(options: SolveOptions<M>) -> FailResult<Self> {
        let mut dd = Self::new();
        dd.solve(options)?;
        Ok(dd)
    }

    /// Replace the inputs without solving.
    ///
    /// Any previous solution is discarded.
    pub fn configure(&mut self, options: SolveOptions<M>) -> FailResult<()> {
        let config = self.resolve_config(options)?;
        self.state = State::Configured(config);
        Ok(())
    }

    /// Replace the inputs, then compute the displacement field.
    pub fn solve(&mut self, options: SolveOptions<M>) -> FailResult<&DisplacementField> {
        let config = self.resolve_config(options)?;
        let field = Arc::new(compute_field(&config));
        info!(
            "solved differential displacements for {} pairs of {} atoms (reference: {})",
            field.len(), config.base.num_atoms(), config.reference,
        );
        self.state = State::Solved(config, field);
        self.field()
    }

    pub fn is_configured(&self) -> bool {
        match self.state {
            State::Unconfigured { .. } => false,
            State::Configured(_) | State::Solved(..) => true,
        }
    }

    pub fn is_solved(&self) -> bool {
        match self.state {
            State::Solved(..) => true,
            _ => false,
        }
    }

    pub fn field(&self) -> FailResult<&DisplacementField> {
        match self.state {
            State::Solved(_, ref field) => Ok(field),
            _ => Err(DdError::NotSolved.into()),
        }
    }

    pub fn base(&self) -> Option<&Structure<M>> { self.structures().map(|(base, _)| &**base) }
    pub fn defect(&self) -> Option<&Structure<M>> { self.structures().map(|(_, defect)| &**defect) }

    pub fn reference(&self) -> Reference {
        match self.state {
            State::Unconfigured { reference, .. } => reference,
            State::Configured(ref config) |
            State::Solved(ref config, _) => config.reference,
        }
    }

    pub fn neighbors(&self) -> Option<&NeighborList> {
        self.config().map(|config| &*config.neighbors)
    }

    fn config(&self) -> Option<&Config<M>> {
        match self.state {
            State::Unconfigured { .. } => None,
            State::Configured(ref config) |
            State::Solved(ref config, _) => Some(config),
        }
    }

    fn structures(&self) -> Option<(&Arc<Structure<M>>, &Arc<Structure<M>>)> {
        match self.state {
            State::Unconfigured { ref structures, .. } => structures.as_ref().map(|(b, d)| (b, d)),
            State::Configured(ref config) |
            State::Solved(ref config, _) => Some((&config.base, &config.defect)),
        }
    }

    fn resolve_config(&self, options: SolveOptions<M>) -> FailResult<Config<M>> {
        let SolveOptions { base, defect, neighbors, cutoff, reference } = options;
        let stored = self.structures();

        let base = match base {
            Some(base) => base,
            None => stored.map(|(b, _)| b.clone()).ok_or(DdError::MissingStructures)?,
        };
        let defect = match defect {
            Some(defect) => defect,
            None => stored.map(|(_, d)| d.clone()).ok_or(DdError::MissingStructures)?,
        };
        check_counts(&base, &defect)?;

        let reference = reference.unwrap_or_else(|| self.reference());
        let neighbors = match (neighbors, cutoff) {
            (Some(neighbors), _) => Arc::new(neighbors),
            (None, Some(cutoff)) => {
                let structure = match reference {
                    Reference::Base => &base,
                    Reference::Defect => &defect,
                };
                Arc::new(NeighborList::from_cutoff(structure, cutoff)?)
            },
            (None, None) => match self.config() {
                Some(config) => config.neighbors.clone(),
                None => throw_dd(DdError::MissingTopology)?,
            },
        };
        if neighbors.num_atoms() != base.num_atoms() {
            throw_dd(DdError::TopologyMismatch { neighbors: neighbors.num_atoms(), atoms: base.num_atoms() })?;
        }
        debug!("differential displacement topology has {} pairs", neighbors.num_pairs());

        Ok(Config { base, defect, neighbors, reference })
    }
}

/// Plotting.
impl<M> DifferentialDisplacement<M> {
    /// The plot axes and limits that `settings` describe for the current structures.
    pub fn plot_frame(&self, settings: &ArrowSettings) -> FailResult<PlotFrame> {
        let config = self.config().ok_or(DdError::NotSolved)?;
        let (reference, base) = match config.reference {
            Reference::Base => (&config.base, &config.base),
            Reference::Defect => (&config.defect, &config.base),
        };
        let depth_source = match settings.use_base_depth {
            true => base.to_carts(),
            false => reference.to_carts(),
        };
        PlotFrame::from_positions(settings, &reference.to_carts(), &depth_source)
    }

    /// Arrows for the solved field, in the plot frame.
    pub fn arrows(&self, settings: &ArrowSettings) -> FailResult<Arrows> {
        let field = self.field()?;
        let frame = self.plot_frame(settings)?;
        arrows::build_arrows(field, frame, settings)
    }

    /// Reference atoms within the plot box, with their depth for coloring.
    pub fn atom_markers(&self, settings: &ArrowSettings) -> FailResult<AtomMarkers> {
        self.field()?;
        let frame = self.plot_frame(settings)?;
        let config = self.config().ok_or(DdError::NotSolved)?;
        let reference = match config.reference {
            Reference::Base => &config.base,
            Reference::Defect => &config.defect,
        };
        let base = match settings.use_base_depth {
            true => Some(config.base.to_carts()),
            false => None,
        };
        AtomMarkers::new(&frame, &reference.to_carts(), base.as_ref().map(|v| &v[..]))
    }
}

fn throw_dd<T>(e: DdError) -> FailResult<T> { Err(e.into()) }

fn check_counts<M>(base: &Structure<M>, defect: &Structure<M>) -> FailResult<()> {
    if base.num_atoms() != defect.num_atoms() {
        throw_dd(DdError::AtomCountMismatch { base: base.num_atoms(), defect: defect.num_atoms() })?;
    }
    Ok(())
}

fn compute_field<M>(config: &Config<M>) -> DisplacementField {
    let lists = config.neighbors.lists();
    let base_dvects = config.base.dvects(lists);
    let defect_dvects = config.defect.dvects(lists);
    let (ref_carts, ref_dvects) = match config.reference {
        Reference::Base => (config.base.to_carts(), &base_dvects),
        Reference::Defect => (config.defect.to_carts(), &defect_dvects),
    };

    let mut field = DisplacementField {
        pairs: vec![],
        ddvectors: vec![],
        centers: vec![],
        units: vec![],
    };
    for (i, js) in lists.iter().enumerate() {
        for (k, &j) in js.iter().enumerate() {
            let d_base = base_dvects[i][k];
            let d_defect = defect_dvects[i][k];
            let d_ref = ref_dvects[i][k];

            let norm = d_ref.norm();
            let unit = match norm {
                norm if norm > 0.0 => d_ref / norm,
                _ => V3::zero(),
            };
            field.pairs.push((i, j));
            field.ddvectors.push(d_defect - d_base);
            field.centers.push(ref_carts[i] + d_ref / 2.0);
            field.units.push(unit);
        }
    }
    field
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use atomkit_structure::{Cell, Coords, Lattice};

    fn plus_cluster(shift: V3) -> Structure {
        let cell = Cell::new(Lattice::cubic(20.0)).with_pbc([false; 3]);
        Structure::new_coords(cell, Coords::Carts(vec![
            V3([0.0, 0.0, 0.0]),
            V3([1.0, 0.0, 0.0]) + shift,
            V3([-1.0, 0.0, 0.0]),
            V3([0.0, 1.0, 0.0]),
            V3([0.0, -1.0, 0.0]),
        ]))
    }

    #[test]
    fn zero_defect() {
        let options = SolveOptions::structures(plus_cluster(V3::zero()), plus_cluster(V3::zero())).cutoff(1.1);
        let dd = DifferentialDisplacement::solved(options).unwrap();
        let field = dd.field().unwrap();

        assert_eq!(field.pairs, vec![(0, 1), (0, 2), (0, 3), (0, 4), (1, 0), (2, 0), (3, 0), (4, 0)]);
        for dd in &field.ddvectors {
            assert_eq!(dd, &V3([0.0; 3]));
        }
        assert_close!(abs=1e-12, field.centers[0], V3([0.5, 0.0, 0.0]));
        assert_close!(abs=1e-12, field.units[5], V3([1.0, 0.0, 0.0]));
    }

    #[test]
    fn shifted_neighbor() {
        let base = plus_cluster(V3::zero());
        let defect = plus_cluster(V3([0.0, 0.1, 0.0]));
        let options = SolveOptions::structures(base, defect).cutoff(1.1).reference(Reference::Defect);
        let dd = DifferentialDisplacement::solved(options).unwrap();
        let field = dd.field().unwrap();

        assert_eq!(field.pairs[0], (0, 1));
        assert_close!(abs=1e-12, field.ddvectors[0], V3([0.0, 0.1, 0.0]));
        assert_close!(abs=1e-12, field.centers[0], V3([0.5, 0.05, 0.0]));
        assert_close!(abs=1e-12, field.units[0], V3([1.0, 0.1, 0.0]).unit());

        // the reverse pair sees the opposite displacement
        let reverse = field.pairs.iter().position(|&p| p == (1, 0)).unwrap();
        assert_close!(abs=1e-12, field.ddvectors[reverse], V3([0.0, -0.1, 0.0]));
        assert_close!(abs=1e-12, field.centers[reverse], V3([0.5, 0.05, 0.0]));

        // with the base as reference, centers come from the base
        let mut dd = dd;
        dd.solve(SolveOptions::default().reference(Reference::Base).cutoff(1.1)).unwrap();
        let field = dd.field().unwrap();
        assert_close!(abs=1e-12, field.centers[0], V3([0.5, 0.0, 0.0]));
        assert_close!(abs=1e-12, field.ddvectors[0], V3([0.0, 0.1, 0.0]));
    }

    #[test]
    fn periodic_minimum_image() {
        let lattice = Lattice::cubic(4.0);
        let make = |x: f64| Structure::new_coords(
            Cell::new(lattice.clone()),
            Coords::Carts(vec![V3([0.5, 0.0, 0.0]), V3([x, 0.0, 0.0])]),
        );
        let neighbors = NeighborList::from_lists(vec![vec![1], vec![0]]).unwrap();
        let options = SolveOptions::structures(make(3.5), make(3.25)).neighbors(neighbors);
        let dd = DifferentialDisplacement::solved(options).unwrap();
        let field = dd.field().unwrap();

        // atom 1 is one unit behind atom 0 through the boundary
        assert_close!(abs=1e-12, field.ddvectors[0], V3([-0.25, 0.0, 0.0]));
        assert_close!(abs=1e-12, field.centers[0], V3([0.5 - 1.25 / 2.0, 0.0, 0.0]));
    }

    #[test]
    fn solve_is_idempotent() {
        let options = || SolveOptions::structures(
            plus_cluster(V3::zero()),
            plus_cluster(V3([0.02, 0.1, -0.03])),
        ).cutoff(1.1);
        let mut dd = DifferentialDisplacement::solved(options()).unwrap();
        let first = dd.field().unwrap().clone();
        dd.solve(options()).unwrap();
        assert_eq!(dd.field().unwrap(), &first);

        // reuses everything that is stored
        dd.solve(SolveOptions::default()).unwrap();
        assert_eq!(dd.field().unwrap(), &first);
    }

    #[test]
    fn state_transitions() {
        let mut dd = DifferentialDisplacement::with_structures(
            plus_cluster(V3::zero()), plus_cluster(V3::zero()), Reference::Base,
        ).unwrap();
        assert!(!dd.is_configured());
        assert!(dd.field().is_err());
        assert!(dd.arrows(&Default::default()).is_err());

        // no topology yet
        let err = dd.solve(SolveOptions::default()).unwrap_err();
        match err.downcast_ref::<DdError>() {
            Some(DdError::MissingTopology) => {},
            _ => panic!("unexpected error: {}", err),
        }
        assert!(!dd.is_configured());

        dd.configure(SolveOptions::default().cutoff(1.1)).unwrap();
        assert!(dd.is_configured());
        assert!(!dd.is_solved());
        assert_eq!(dd.reference(), Reference::Base);
        assert_eq!(dd.neighbors().unwrap().num_pairs(), 8);

        dd.solve(SolveOptions::default()).unwrap();
        assert!(dd.is_solved());

        // a failed call keeps the solution
        let short = Structure::new_coords(Cell::new(Lattice::cubic(20.0)), Coords::Carts(vec![V3::zero()]));
        let bad = SolveOptions { base: Some(Arc::new(short)), ..Default::default() };
        let err = dd.solve(bad).unwrap_err();
        match err.downcast_ref::<DdError>() {
            Some(DdError::AtomCountMismatch { base: 1, defect: 5 }) => {},
            _ => panic!("unexpected error: {}", err),
        }
        assert!(dd.is_solved());
        assert_eq!(dd.field().unwrap().len(), 8);
    }

    #[test]
    fn isolated_atoms_are_skipped() {
        let neighbors = NeighborList::from_lists(vec![vec![], vec![2], vec![], vec![], vec![]]).unwrap();
        let options = SolveOptions::structures(plus_cluster(V3::zero()), plus_cluster(V3::zero()))
            .neighbors(neighbors);
        let dd = DifferentialDisplacement::solved(options).unwrap();
        assert_eq!(dd.field().unwrap().pairs, vec![(1, 2)]);
    }

    #[test]
    fn reference_from_int() {
        assert_eq!(Reference::try_from(0).unwrap(), Reference::Base);
        assert_eq!(Reference::try_from(1).unwrap(), Reference::Defect);
        assert!(Reference::try_from(2).is_err());
        assert_eq!(Reference::default(), Reference::Defect);
    }
}
