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

use crate::{FailResult, AtomType, JoinDisplay};

use std::fmt;
use std::io::prelude::*;
use std::path::Path;
use std::str::FromStr;

use atomkit_array_types::V3;
use atomkit_structure::Structure;

/// Off-diagonal elements above this are taken to mean the lattice is not
/// in the lower-triangular form that LAMMPS boxes require.
const ORIENTATION_TOL: f64 = 1e-8;

/// The `atom_style`s whose `Atoms` section we know how to write.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AtomStyle {
    /// `atom-ID atom-type x y z`
    Atomic,
    /// `atom-ID atom-type q x y z`
    Charge,
}

impl Default for AtomStyle {
    fn default() -> Self { AtomStyle::Atomic }
}

impl fmt::Display for AtomStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AtomStyle::Atomic => write!(f, "atomic"),
            AtomStyle::Charge => write!(f, "charge"),
        }
    }
}

impl FromStr for AtomStyle {
    type Err = failure::Error;

    fn from_str(s: &str) -> FailResult<Self> {
        match s {
            "atomic" => Ok(AtomStyle::Atomic),
            "charge" => Ok(AtomStyle::Charge),
            _ => bail!("unsupported atom_style: {:?}", s),
        }
    }
}

/// Per-atom data that can appear in a data file.
pub trait DataAtom {
    fn atom_type(&self) -> AtomType;

    /// Only written for `atom_style charge`.
    fn charge(&self) -> f64 { 0.0 }

    /// If any atom has a velocity, a `Velocities` section is written
    /// (with zero for the atoms that don't).
    fn velocity(&self) -> Option<V3> { None }
}

impl DataAtom for AtomType {
    fn atom_type(&self) -> AtomType { *self }
}

impl DataAtom for (AtomType, f64) {
    fn atom_type(&self) -> AtomType { self.0 }
    fn charge(&self) -> f64 { self.1 }
}

/// `p` along periodic directions, `m` (shrink-wrapped with a minimum) along the rest.
pub fn boundary_flags(pbc: [bool; 3]) -> [&'static str; 3] {
    let flag = |p| if p { "p" } else { "m" };
    [flag(pbc[0]), flag(pbc[1]), flag(pbc[2])]
}

/// A LAMMPS `read_data` file for a structure.
///
/// Atoms are wrapped into the box along its periodic directions before writing;
/// image flags are written only when some atom actually needed wrapping.
#[derive(Debug, Clone)]
pub struct DataFile<'a, M> {
    structure: &'a Structure<M>,
    atom_style: AtomStyle,
    units: String,
    num_atom_types: Option<usize>,
    precision: usize,
}

impl<'a, M: DataAtom> DataFile<'a, M> {
    pub fn new(structure: &'a Structure<M>) -> Self {
        DataFile {
            structure,
            atom_style: AtomStyle::Atomic,
            units: "metal".to_string(),
            num_atom_types: None,
            precision: 13,
        }
    }

    pub fn atom_style(mut self, style: AtomStyle) -> Self
    { self.atom_style = style; self }

    /// Only used by the input script; data files are written in whatever
    /// units the structure is already in.
    pub fn units(mut self, units: impl Into<String>) -> Self
    { self.units = units.into(); self }

    /// Declare more atom types than the structure uses.
    ///
    /// By default this is the largest type present.
    pub fn num_atom_types(mut self, n: usize) -> Self
    { self.num_atom_types = Some(n); self }

    /// Digits after the decimal point for all floats.
    pub fn precision(mut self, digits: usize) -> Self
    { self.precision = digits; self }

    pub fn to_writer(&self, mut w: impl Write) -> FailResult<()>
    { w.write_all(self.render()?.as_bytes())?; Ok(()) }

    pub fn save(&self, path: impl AsRef<Path>) -> FailResult<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        self.to_writer(std::io::BufWriter::new(file))?;
        debug!("Wrote LAMMPS data file '{}'", path.display());
        Ok(())
    }

    /// Produce the full file contents.
    pub fn render(&self) -> FailResult<String> {
        let meta = self.structure.metadata();
        let num_types = self.resolve_num_atom_types()?;

        // work on a copy, so the caller's positions stay unwrapped
        let mut wrapped = self.structure.map_metadata_to(|_| ());
        let images = wrapped.wrap();
        let carts = wrapped.to_carts();

        let mut out = String::new();
        out += &format!("\n{} atoms\n", meta.len());
        out += &format!("{} atom types\n", num_types);
        out += &self.box_content()?;

        out += &format!("\nAtoms # {}\n\n", self.atom_style);
        let write_images = images.iter().any(|im| im != &V3([0; 3]));
        for (index, (atom, cart, image)) in izip!(meta, &carts, &images).enumerate() {
            let mut cols = vec![
                (index + 1).to_string(),
                atom.atom_type().value().to_string(),
            ];
            if self.atom_style == AtomStyle::Charge {
                cols.push(self.float(atom.charge()));
            }
            cols.extend(cart.iter().map(|&x| self.float(x)));
            if write_images {
                cols.extend(image.iter().map(|i| i.to_string()));
            }
            out += &format!("{}\n", JoinDisplay { items: &cols, sep: " " });
        }

        if meta.iter().any(|atom| atom.velocity().is_some()) {
            out += "\nVelocities\n\n";
            for (index, atom) in meta.iter().enumerate() {
                let v = atom.velocity().unwrap_or(V3::zero());
                out += &format!(
                    "{} {} {} {}\n",
                    index + 1, self.float(v[0]), self.float(v[1]), self.float(v[2]),
                );
            }
        }
        Ok(out)
    }

    /// LAMMPS input lines that declare the units and style and read the file.
    ///
    /// The `read_data` line is only included when a path is given.
    pub fn read_script(&self, data_path: Option<&Path>) -> String {
        let [bx, by, bz] = boundary_flags(self.structure.cell().pbc());

        let mut out = String::new();
        out += "# Script and atom data file prepared by atomkit\n\n";
        out += &format!("units {}\n", self.units);
        out += &format!("atom_style {}\n\n", self.atom_style);
        out += &format!("boundary {} {} {}\n", bx, by, bz);
        if let Some(path) = data_path {
            out += &format!("read_data {}\n", path.display());
        }
        out
    }

    fn resolve_num_atom_types(&self) -> FailResult<usize> {
        let max_type = {
            self.structure.metadata().iter()
                .map(|atom| atom.atom_type().value() as usize)
                .max()
                .unwrap_or(1)
        };
        match self.num_atom_types {
            None => Ok(max_type),
            Some(n) => {
                ensure!(
                    n >= max_type,
                    "{} atom types were declared, but atom type {} is used", n, max_type,
                );
                Ok(n)
            },
        }
    }

    fn box_content(&self) -> FailResult<String> {
        let cell = self.structure.cell();
        ensure!(
            cell.lattice().is_lammps_oriented(ORIENTATION_TOL),
            "LAMMPS requires a lower-triangular lattice with a positive diagonal; \
             rotate the cell first. (lattice: {:?})",
            cell.lattice().matrix(),
        );
        let m = cell.lattice().matrix();
        let lo = cell.origin();
        let (xy, xz, yz) = (m[1][0], m[2][0], m[2][1]);

        let mut out = String::new();
        for (k, name) in ["x", "y", "z"].iter().enumerate() {
            out += &format!(
                "{} {} {n}lo {n}hi\n",
                self.float(lo[k]), self.float(lo[k] + m[k][k]), n = name,
            );
        }
        if xy != 0.0 || xz != 0.0 || yz != 0.0 {
            out += &format!("{} {} {} xy xz yz\n", self.float(xy), self.float(xz), self.float(yz));
        }
        Ok(out)
    }

    fn float(&self, x: f64) -> String {
        // adding zero turns -0.0 into 0.0
        format!("{:.*}", self.precision, x + 0.0)
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use atomkit_structure::{Cell, Coords, Lattice};

    fn types(ts: &[i64]) -> Vec<AtomType> {
        ts.iter().map(|&t| AtomType::new(t)).collect()
    }

    #[test]
    fn simple_cubic() {
        let structure = Structure::new(
            Cell::new(Lattice::cubic(2.0)).with_pbc([true, true, false]),
            Coords::Carts(vec![V3([0.0, 0.0, 0.0]), V3([1.0, 1.0, 1.0])]),
            types(&[1, 2]),
        );
        let data = DataFile::new(&structure).precision(3);
        assert_eq!(data.render().unwrap(), "\
\n2 atoms
2 atom types
0.000 2.000 xlo xhi
0.000 2.000 ylo yhi
0.000 2.000 zlo zhi

Atoms # atomic

1 1 0.000 0.000 0.000
2 2 1.000 1.000 1.000
");
        assert_eq!(data.read_script(Some(Path::new("system.dat"))), "\
# Script and atom data file prepared by atomkit

units metal
atom_style atomic

boundary p p m
read_data system.dat
");
        assert!(!data.read_script(None).contains("read_data"));
    }

    #[test]
    fn tilt_and_images() {
        let lattice = Lattice::from(&[
            [2.0, 0.0, 0.0],
            [1.0, 2.0, 0.0],
            [0.0, 0.0, 2.0],
        ]);
        let structure = Structure::new(
            Cell::new(lattice),
            Coords::Fracs(vec![V3([1.25, 0.5, 0.0])]),
            vec![(AtomType::new(1), -0.5)],
        );
        let text = {
            DataFile::new(&structure)
                .atom_style(AtomStyle::Charge)
                .num_atom_types(3)
                .precision(2)
                .render().unwrap()
        };
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[2], "3 atom types");
        assert_eq!(lines[6], "1.00 0.00 0.00 xy xz yz");
        assert_eq!(lines[8], "Atoms # charge");
        // frac (0.25, 0.5, 0) with one image along a
        assert_eq!(lines[10], "1 1 -0.50 1.00 1.00 0.00 1 0 0");
        // the input is left alone
        assert_close!(structure.to_fracs()[0].0, [1.25, 0.5, 0.0]);
    }

    #[test]
    fn velocities() {
        struct Moving(Option<V3>);
        impl DataAtom for Moving {
            fn atom_type(&self) -> AtomType { AtomType::new(1) }
            fn velocity(&self) -> Option<V3> { self.0 }
        }

        let structure = Structure::new(
            Cell::new(Lattice::cubic(1.0)),
            Coords::Fracs(vec![V3::zero(), V3([0.5; 3])]),
            vec![Moving(None), Moving(Some(V3([1.0, -2.0, 0.5])))],
        );
        let text = DataFile::new(&structure).precision(1).render().unwrap();
        assert!(text.ends_with("\nVelocities\n\n1 0.0 0.0 0.0\n2 1.0 -2.0 0.5\n"));
    }

    #[test]
    fn bad_inputs() {
        let structure = Structure::new(
            Cell::new(Lattice::cubic(1.0)),
            Coords::Fracs(vec![V3::zero()]),
            types(&[4]),
        );
        assert!(DataFile::new(&structure).num_atom_types(2).render().is_err());

        let upper = Lattice::from(&[
            [1.0, 0.5, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        let structure = Structure::new(Cell::new(upper), Coords::Fracs(vec![V3::zero()]), types(&[1]));
        assert!(DataFile::new(&structure).render().is_err());
    }

    #[test]
    fn style_names() {
        assert_eq!("charge".parse::<AtomStyle>().unwrap(), AtomStyle::Charge);
        assert_eq!(AtomStyle::Atomic.to_string(), "atomic");
        assert!("full".parse::<AtomStyle>().is_err());
        assert_eq!(boundary_flags([true, false, true]), ["p", "m", "p"]);
    }
}
