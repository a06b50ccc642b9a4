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

use std::fmt;
use std::str::FromStr;

use atomkit_array_types::{V3, M33, M3};

use crate::FailResult;

/// One of the three cell vectors `a`, `b`, `c`, or the matching cartesian axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CellAxis { A, B, C }

impl CellAxis {
    pub const ALL: [CellAxis; 3] = [CellAxis::A, CellAxis::B, CellAxis::C];

    pub fn index(self) -> usize {
        match self {
            CellAxis::A => 0,
            CellAxis::B => 1,
            CellAxis::C => 2,
        }
    }

    /// # Panics
    /// Panics if `index >= 3`.
    pub fn from_index(index: usize) -> Self { CellAxis::ALL[index] }

    pub fn unit(self) -> V3 { V3::axis_unit(self.index()) }
}

impl Default for CellAxis {
    fn default() -> Self { CellAxis::C }
}

impl fmt::Display for CellAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(["a", "b", "c"][self.index()], f)
    }
}

impl FromStr for CellAxis {
    type Err = failure::Error;

    fn from_str(s: &str) -> FailResult<Self> {
        Ok(match s {
            "a" => CellAxis::A,
            "b" => CellAxis::B,
            "c" => CellAxis::C,
            _ => bail!("expected one of 'a', 'b', 'c', got {:?}", s),
        })
    }
}

/// If `v` is a (signed) cartesian unit vector, get its axis and sign.
pub fn axis_alignment(v: &V3, tol: f64) -> Option<(CellAxis, f64)> {
    let mut found = None;
    for k in 0..3 {
        if (v[k].abs() - 1.0).abs() <= tol {
            if found.is_some() {
                return None;
            }
            found = Some((CellAxis::from_index(k), v[k].signum()));
        } else if v[k].abs() > tol {
            return None;
        }
    }
    found
}

/// Normalize a set of axes given as rows, checking that they are orthogonal
/// and right-handed.
pub fn axes_check(axes: &M33, tol: f64) -> FailResult<M33> {
    let mut units = [V3::zero(); 3];
    for (unit, axis) in units.iter_mut().zip(axes) {
        let norm = axis.norm();
        ensure!(norm > 0.0 && norm.is_finite(), "axis vectors must be nonzero: {:?}", axes);
        *unit = axis / norm;
    }
    for (i, j) in vec![(0, 1), (0, 2), (1, 2)] {
        ensure!(units[i].dot(&units[j]).abs() <= tol, "axes are not orthogonal: {:?}", axes);
    }
    let units = M3(units);
    ensure!(units.det() > 0.0, "axes are not right-handed: {:?}", axes);
    Ok(units)
}
