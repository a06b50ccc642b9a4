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
#![deny(unused_must_use)]

//! Plain-text interop with LAMMPS.
//!
//! Nothing here links against LAMMPS.  Structures go out as `read_data` files,
//! the executable is run as a subprocess, and results come back by parsing
//! its log output.

#[macro_use] extern crate log;
#[macro_use] extern crate failure;
#[macro_use] extern crate itertools;
#[cfg(test)] #[macro_use] extern crate atomkit_assert_close;

use failure::Backtrace;

use std::fmt;

pub type FailResult<T> = Result<T, failure::Error>;

mod data;
mod log_file;
mod run;

pub use crate::data::{AtomStyle, DataAtom, DataFile, boundary_flags};
pub use crate::log_file::{Log, Simulation, Thermo, Performance, FlattenStyle};
pub use crate::run::{Run, DEFAULT_LOGFILE};

/// LAMMPS exited unsuccessfully.
#[derive(Debug, Fail)]
pub struct LammpsError {
    backtrace: Backtrace,
    status: Option<i32>,
    output: String,
}

impl LammpsError {
    /// Everything LAMMPS wrote to stdout before it died.
    pub fn output(&self) -> &str
    { &self.output }

    pub fn status(&self) -> Option<i32>
    { self.status }
}

impl fmt::Display for LammpsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "LAMMPS exited with status {}", code)?,
            None => write!(f, "LAMMPS was killed by a signal")?,
        }
        // LAMMPS reports errors as a line starting with 'ERROR'
        match self.output.lines().find(|line| line.starts_with("ERROR")) {
            Some(line) => write!(f, ": {}", line),
            None => Ok(()),
        }
    }
}

pub use atom_type::AtomType;
// mod to encapsulate type invariant
mod atom_type {
    /// A LAMMPS atom type.  These are numbered from 1.
    #[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(try_from = "i64", into = "i64"))]
    pub struct AtomType(
        // INVARIANT: value is >= 1.
        i64,
    );

    impl AtomType {
        /// # Panics
        ///
        /// Panics on values less than 1.
        pub fn new(x: i64) -> Self {
            assert!(x > 0, "atom types start at 1 (got {})", x);
            AtomType(x)
        }
        pub fn value(self) -> i64 { self.0 }

        /// Construct from a 0-based index.
        pub fn from_index(x: usize) -> Self { AtomType((x + 1) as _) }
        /// Recover the 0-based index.
        pub fn to_index(self) -> usize { self.0 as usize - 1 }
    }

    impl std::convert::TryFrom<i64> for AtomType {
        type Error = failure::Error;

        fn try_from(x: i64) -> Result<Self, Self::Error> {
            ensure!(x > 0, "atom types start at 1 (got {})", x);
            Ok(AtomType(x))
        }
    }

    impl From<AtomType> for i64 {
        fn from(t: AtomType) -> i64 { t.0 }
    }
}

// Utility Display adapter for writing a separator between items.
pub(crate) struct JoinDisplay<'a, D: 'a> {
    pub(crate) items: &'a [D],
    pub(crate) sep: &'a str,
}

impl<'a, D: fmt::Display> fmt::Display for JoinDisplay<'a, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {Ok({
        let mut items = self.items.iter();

        if let Some(item) = items.next() {
            write!(f, "{}", item)?;
        }
        for item in items {
            write!(f, "{}{}", self.sep, item)?;
        }
    })}
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn atom_type_indices() {
        assert_eq!(AtomType::from_index(0), AtomType::new(1));
        assert_eq!(AtomType::new(3).to_index(), 2);
    }

    #[test]
    #[should_panic]
    fn atom_type_zero() {
        let _ = AtomType::new(0);
    }

    #[test]
    fn error_display() {
        let e = LammpsError {
            backtrace: Backtrace::new(),
            status: Some(1),
            output: "LAMMPS (3 Mar 2020)\nERROR: Unknown command: foo (src/input.cpp:234)\n".into(),
        };
        assert_eq!(
            e.to_string(),
            "LAMMPS exited with status 1: ERROR: Unknown command: foo (src/input.cpp:234)",
        );
        assert!(e.output().starts_with("LAMMPS"));
    }
}
