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

//! The work behind each binary, separated from argument parsing.

use crate::FailResult;
use crate::config as cfg;

use atomkit_array_types::{V3, Envee, Unvee};
use atomkit_structure::{Lattice, Cell, Coords, Structure, SizeMult};
use atomkit_defect::{
    FreeSurface, SurfaceOptions, SurfaceSettings, SurfaceBasis,
    DislocationOptions, DislocationBasis, resolve_dislocation,
    DifferentialDisplacement, SolveOptions, ArrowSettings, Arrows, AtomMarkers,
    Component, CoreStats, Reference, core_position,
};
use atomkit_lammps_io::{AtomType, DataFile, Run, Simulation};

use std::convert::TryFrom;
use std::path::Path;

/// Build the structure described in a config file.
pub fn unit_cell_structure(cell: &cfg::UnitCell) -> FailResult<Structure<AtomType>> {
    let scale = cell.scale;
    ensure!(scale > 0.0, "scale must be positive (got {})", scale);

    let lattice = Lattice::checked_new(&(cell.lattice.envee() * scale))?;
    let types = cell.atom_types()?
        .into_iter()
        .map(AtomType::try_from)
        .collect::<FailResult<Vec<_>>>()?;
    let coords = match cell.positions()? {
        cfg::Positions::Fracs(fracs) => Coords::Fracs(fracs.envee()),
        cfg::Positions::Carts(carts) => Coords::Carts(carts.iter().map(|&v| V3(v) * scale).collect()),
    };
    let cell = Cell::new(lattice)
        .with_origin(V3(cell.origin) * scale)
        .with_pbc(cell.pbc);

    Ok(Structure::new(cell, coords, types))
}

/// Re-express a structure in the lower-triangular lattice orientation that LAMMPS requires.
///
/// This is a rigid rotation.  Structures that are already oriented are returned as is.
pub fn lammps_oriented<M>(structure: Structure<M>) -> FailResult<Structure<M>> {
    if structure.lattice().is_lammps_oriented(1e-8) {
        return Ok(structure);
    }
    ensure!(
        structure.lattice().matrix().det() > 0.0,
        "a left-handed cell cannot be rotated into the LAMMPS orientation",
    );
    debug!("Rotating the cell into the LAMMPS orientation");

    let (lengths, angles) = structure.lattice().parameters();
    let lattice = Lattice::from_parameters(lengths, angles)?;
    let origin = structure.cell().origin() / structure.lattice() * &lattice;
    let pbc = structure.cell().pbc();
    let fracs = structure.to_fracs();

    let (_, _, meta) = structure.into_parts();
    let cell = Cell::new(lattice).with_origin(origin).with_pbc(pbc);
    Ok(Structure::new(cell, Coords::Fracs(fracs), meta))
}

/// Write the LAMMPS files requested by `output`, if any.
pub fn write_output(output: &cfg::Output, structure: &Structure<AtomType>) -> FailResult<()> {
    let data_path = match &output.lammps_data {
        Some(path) => path,
        None => {
            ensure!(output.lammps_script.is_none(), "'lammps-script' requires 'lammps-data'");
            return Ok(());
        },
    };

    let structure = lammps_oriented(structure.clone())?;
    let data = DataFile::new(&structure)
        .atom_style(output.atom_style)
        .units(&output.units[..]);

    data.save(data_path)?;
    info!("Wrote {} atoms to '{}'", structure.num_atoms(), data_path);

    if let Some(script_path) = &output.lammps_script {
        let script = data.read_script(Some(Path::new(data_path)));
        std::fs::write(script_path, script)?;
        info!("Wrote LAMMPS input to '{}'", script_path);
    }
    Ok(())
}

fn size_mults(mults: &[cfg::SizeMult; 3]) -> FailResult<[SizeMult; 3]> {
    Ok([
        mults[0].to_structure_mult()?,
        mults[1].to_structure_mult()?,
        mults[2].to_structure_mult()?,
    ])
}

//--------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SurfaceReport {
    pub basis: SurfaceBasis,
    /// The new cell vectors in units of the conventional cell.
    pub conventional_uvws: [[f64; 3]; 3],
    pub layers: Vec<f64>,
    pub shifts: Vec<[f64; 3]>,
    pub shift: [f64; 3],
    pub width: f64,
    pub surface_area: f64,
    pub num_atoms: usize,
}

pub fn run_surface(settings: &cfg::Surface) -> FailResult<SurfaceReport> {
    let ucell = unit_cell_structure(&settings.unit_cell)?;
    let options = SurfaceOptions {
        cut_axis: settings.cut_axis,
        max_index: settings.max_index,
        centering: settings.centering,
        tol: settings.tol,
    };
    let surface = FreeSurface::new(settings.plane, ucell, &options)?;

    let shift = match surface.shifts().get(settings.shift_index) {
        Some(&shift) => shift,
        None => bail!(
            "shift-index {} is out of range; this surface has {} shifts",
            settings.shift_index, surface.shifts().len(),
        ),
    };
    let surface_settings = SurfaceSettings {
        shift,
        vacuum_width: settings.vacuum_width,
        min_width: settings.min_width,
        size_mults: size_mults(&settings.size_mults)?,
        even: settings.even,
    };
    let system = surface.surface(&surface_settings)?;
    info!(
        "Built a ({}) surface with {} atoms and area {:.4}",
        settings.plane, system.structure.num_atoms(), system.surface_area,
    );
    write_output(&settings.output, &system.structure)?;

    Ok(SurfaceReport {
        basis: surface.basis().clone(),
        conventional_uvws: surface.conventional_uvws().unvee(),
        layers: surface.layers().to_vec(),
        shifts: surface.shifts().unvee(),
        shift: shift.0,
        width: surface.width(),
        surface_area: system.surface_area,
        num_atoms: system.structure.num_atoms(),
    })
}

//--------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DislocationReport {
    pub basis: DislocationBasis,
    /// Cell vectors as Miller-Bravais indices; only for four-index input.
    pub hexagonal_uvws: Option<[[f64; 4]; 3]>,
    pub lattice: [[f64; 3]; 3],
    pub num_atoms: usize,
}

pub fn run_dislocation(settings: &cfg::Dislocation) -> FailResult<DislocationReport> {
    let ucell = unit_cell_structure(&settings.unit_cell)?;
    let options = DislocationOptions {
        m: V3(settings.m),
        n: V3(settings.n),
        max_index: settings.max_index,
        tol: settings.tol,
    };
    let basis = resolve_dislocation(settings.line, settings.slip_plane, ucell.lattice(), &options)?;
    info!(
        "Dislocation line is along {:?}, slip plane normal along {:?}",
        basis.line_axis, basis.cut_axis,
    );

    let (rotated, _) = ucell.rotate(&basis.uvws)?;
    let supercell = rotated.supersize(&size_mults(&settings.size_mults)?);
    write_output(&settings.output, &supercell)?;

    let hexagonal_uvws = match settings.line.is_four_index() || settings.slip_plane.is_four_index() {
        true => Some(basis.hexagonal_uvws()),
        false => None,
    };
    Ok(DislocationReport {
        hexagonal_uvws,
        lattice: supercell.lattice().matrix().unvee(),
        num_atoms: supercell.num_atoms(),
        basis,
    })
}

//--------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DdispReport {
    pub reference: Reference,
    pub num_pairs: usize,
    pub arrows: Arrows,
    pub markers: AtomMarkers,
    pub core: Option<CoreStats>,
}

pub fn arrow_settings(arrows: &cfg::Arrows) -> FailResult<ArrowSettings> {
    let component = match arrows.component {
        // normalizes, and rejects zero vectors
        Component::Axis(direction) => Component::axis(direction)?,
        other => other,
    };
    Ok(ArrowSettings {
        component,
        ddmax: arrows.ddmax,
        plot_x: V3(arrows.plot_x),
        plot_y: V3(arrows.plot_y),
        xlim: arrows.xlim,
        ylim: arrows.ylim,
        zlim: arrows.zlim,
        use_base_depth: arrows.use_base_depth,
        lattice_constant: arrows.lattice_constant,
        arrow_scale: arrows.arrow_scale,
    })
}

pub fn run_ddisp(settings: &cfg::Ddisp) -> FailResult<DdispReport> {
    let base = unit_cell_structure(&settings.base)?;
    let defect = unit_cell_structure(&settings.defect)?;

    let options = SolveOptions::structures(base, defect)
        .cutoff(settings.cutoff)
        .reference(settings.reference);
    let dd = DifferentialDisplacement::solved(options)?;

    let arrow_settings = arrow_settings(&settings.arrows)?;
    let arrows = dd.arrows(&arrow_settings)?;
    let markers = dd.atom_markers(&arrow_settings)?;

    let core = match &settings.core_property {
        None => None,
        Some(property) => {
            let reference = match settings.reference {
                Reference::Base => dd.base(),
                Reference::Defect => dd.defect(),
            };
            let carts = reference.map(|s| s.to_carts()).unwrap_or_default();
            let stats = core_position(&arrows.frame, &carts, property)?;
            info!("Core position: ({:.4}, {:.4})", stats.x0, stats.y0);
            Some(stats)
        },
    };

    Ok(DdispReport {
        reference: dd.reference(),
        num_pairs: dd.field()?.len(),
        arrows,
        markers,
        core,
    })
}

//--------------------------------------------------------

pub fn run_lammps(settings: &cfg::LammpsRun) -> FailResult<Simulation> {
    let mut run = Run::new(&settings.lammps, &settings.script);
    if let Some(mpi) = &settings.mpi {
        run = run.mpi(mpi);
    }
    if let Some(path) = &settings.restart_script {
        run = run.restart_script(path);
    }
    if let Some(path) = &settings.logfile {
        run = run.logfile(path);
    }
    if let Some(dir) = &settings.working_dir {
        run = run.working_dir(dir);
    }

    let log = run.run()?;
    info!("LAMMPS finished; the log has {} simulations", log.simulations().len());
    log.flatten(settings.flatten)
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::config::YamlRead;
    use atomkit_array_types::M33;
    use atomkit_defect::CellAxis;

    const FCC: &str = "
lattice: [[1, 0, 0], [0, 1, 0], [0, 0, 1]]
scale: 4.0
fracs:
- [0.0, 0.0, 0.0]
- [0.5, 0.5, 0.0]
- [0.5, 0.0, 0.5]
- [0.0, 0.5, 0.5]
";

    fn indent(s: &str) -> String {
        s.lines().map(|line| format!("  {}\n", line)).collect()
    }

    fn fcc() -> cfg::UnitCell {
        cfg::UnitCell::from_reader(FCC.as_bytes()).unwrap()
    }

    #[test]
    fn scaled_unit_cell() {
        let structure = unit_cell_structure(&fcc()).unwrap();
        assert_eq!(structure.num_atoms(), 4);
        assert_close!(structure.lattice().volume(), 64.0);
        assert_close!(abs=1e-12, structure.to_carts()[1], V3([2.0, 2.0, 0.0]));
        assert_eq!(structure.metadata()[3], AtomType::new(1));

        let mut carts = fcc();
        carts.fracs = None;
        carts.carts = Some(vec![[0.5, 0.5, 0.0]]);
        carts.types = Some(vec![2]);
        let structure = unit_cell_structure(&carts).unwrap();
        assert_close!(abs=1e-12, structure.to_carts()[0], V3([2.0, 2.0, 0.0]));
        assert_eq!(structure.metadata(), &[AtomType::new(2)]);
    }

    #[test]
    fn orient_for_lammps() {
        let lattice = Lattice::from(&[[0.0, 3.0, 0.0], [-3.0, 0.0, 0.0], [0.0, 0.0, 5.0]]);
        let structure = Structure::new_coords(
            Cell::new(lattice),
            Coords::Fracs(vec![V3([0.25, 0.5, 0.75])]),
        );
        let oriented = lammps_oriented(structure).unwrap();
        assert!(oriented.lattice().is_lammps_oriented(1e-12));
        assert_close!(abs=1e-12, oriented.lattice().matrix().clone(), M33::from([
            [3.0, 0.0, 0.0],
            [0.0, 3.0, 0.0],
            [0.0, 0.0, 5.0],
        ]));
        assert_close!(abs=1e-12, oriented.to_fracs()[0], V3([0.25, 0.5, 0.75]));

        let mirrored = Structure::new_coords(
            Cell::new(Lattice::from(&[[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]])),
            Coords::Fracs(vec![]),
        );
        assert!(lammps_oriented(mirrored).is_err());
    }

    #[test]
    fn surface_writes_lammps_files() {
        let tmp = tempdir::TempDir::new("atomkit-tasks").unwrap();
        let data = tmp.path().join("slab.data");
        let script = tmp.path().join("in.slab");
        let yaml = format!("
unit-cell:
{}
plane: [0, 0, 1]
vacuum-width: 10.0
min-width: 10.0
size-mults: [2, 2, 1]
even: true
output:
  lammps-data: {}
  lammps-script: {}
", indent(FCC), data.display(), script.display());
        let settings = cfg::Surface::from_reader(yaml.as_bytes()).unwrap();

        let report = run_surface(&settings).unwrap();
        assert_eq!(report.basis.uvws, M33::eye());
        assert_eq!(report.basis.cut_axis, CellAxis::C);
        assert_eq!(report.shifts.len(), 2);
        assert_eq!(report.num_atoms, 64);
        assert_close!(report.surface_area, 64.0);

        let text = std::fs::read_to_string(&data).unwrap();
        assert!(text.starts_with("\n64 atoms\n1 atom types\n"));
        let text = std::fs::read_to_string(&script).unwrap();
        assert!(text.contains("boundary p p m\n"));
        assert!(text.contains(&format!("read_data {}\n", data.display())));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["num-atoms"], 64);
    }

    #[test]
    fn surface_bad_shift() {
        let yaml = format!("unit-cell:\n{}plane: [0, 0, 1]\nshift-index: 2\n", indent(FCC));
        let settings = cfg::Surface::from_reader(yaml.as_bytes()).unwrap();
        assert!(run_surface(&settings).is_err());
    }

    #[test]
    fn script_needs_data() {
        let output = cfg::Output { lammps_script: Some("in.lmp".into()), ..Default::default() };
        let structure = unit_cell_structure(&fcc()).unwrap();
        assert!(write_output(&output, &structure).is_err());
    }

    #[test]
    fn zero_defect_ddisp() {
        let yaml = format!("
base:
{0}
defect:
{0}
cutoff: 3.0
arrows:
  component: x
  lattice-constant: 4.0
", indent(FCC));
        let settings = cfg::Ddisp::from_reader(yaml.as_bytes()).unwrap();
        let report = run_ddisp(&settings).unwrap();

        // each atom sees the other three (images are not counted twice)
        assert_eq!(report.num_pairs, 12);
        assert_eq!(report.reference, Reference::Defect);
        assert!(report.arrows.components.iter().all(|&c| c == 0.0));
        assert!(report.core.is_none());
    }

    #[test]
    fn axis_component_is_normalized() {
        let arrows = cfg::Arrows { component: Component::Axis(V3([0.0, 0.0, 2.0])), ..Default::default() };
        let settings = arrow_settings(&arrows).unwrap();
        assert_eq!(settings.component, Component::Axis(V3([0.0, 0.0, 1.0])));

        let zero = cfg::Arrows { component: Component::Axis(V3::zero()), ..Default::default() };
        assert!(arrow_settings(&zero).is_err());
    }
}
