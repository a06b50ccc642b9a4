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

use atomkit_array_types::{V3, M33, M3};
use atomkit_assert_close::{all_close, Tolerances};
use atomkit_structure::{Cell, Lattice, reduce_by_gcd};
use atomkit_structure::miller::{Miller, vector3to4};

use crate::FailResult;
use crate::axes::{CellAxis, axis_alignment};
use crate::search::lattice_vectors;

/// Geometric reasons for which no basis could be found.
#[derive(Debug, Fail)]
pub enum ResolveError {
    #[fail(display = "the {} axis must be parallel to a cartesian axis (got {:?})", which, vector)]
    NotAxisAligned { which: &'static str, vector: V3 },

    #[fail(display = "found no lattice vector near the {} with indices up to {}; try a larger max index", target, max_index)]
    SearchExhausted { target: &'static str, max_index: i32 },

    #[fail(
        display = "the crystal does not support this orientation: basis {:?} has transform {:?}, expected {:?}",
        uvws, actual, expected,
    )]
    InconsistentOrientation { uvws: M33<i32>, expected: M33, actual: M33 },
}

/// Orientation of the simulation cell for a dislocation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DislocationOptions {
    /// Cartesian axis that the in-plane direction perpendicular to the line is mapped onto.
    pub m: V3,
    /// Cartesian axis that the slip plane normal is mapped onto.
    pub n: V3,
    /// Largest lattice vector index considered by the search.
    pub max_index: i32,
    /// Tolerance for the "lies in a plane" and "is a cartesian axis" tests.
    pub tol: f64,
}

impl Default for DislocationOptions {
    fn default() -> Self {
        DislocationOptions {
            m: V3([1.0, 0.0, 0.0]),
            n: V3([0.0, 1.0, 0.0]),
            max_index: 10,
            tol: 1e-8,
        }
    }
}

/// A resolved simulation cell orientation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DislocationBasis {
    /// Rows are the new cell vectors, in units of the reference cell vectors.
    pub uvws: M33<i32>,
    /// Cartesian rotation from the reference cell frame to the new one.
    pub transform: M33,
    /// Cell vector along the slip plane normal.
    pub cut_axis: CellAxis,
    /// Cell vector along the dislocation line.
    pub line_axis: CellAxis,
}

impl DislocationBasis {
    /// The new cell vectors in Miller-Bravais `[uvtw]` form, for hexagonal
    /// reference cells.  These are generally fractional.
    pub fn hexagonal_uvws(&self) -> [[f64; 4]; 3] {
        [
            vector3to4(self.uvws[0]),
            vector3to4(self.uvws[1]),
            vector3to4(self.uvws[2]),
        ]
    }
}

/// The cartesian rotation that takes a dislocation's crystal frame onto the
/// requested axes.
///
/// The slip plane normal is mapped onto `n`, the in-plane direction `n x line`
/// onto `m`, and the line direction onto `m x n`.  Rows of `lattice` are the
/// reference cell vectors.  The result maps column vectors.
pub fn dislocation_system_transform(
    line_uvw: V3<i32>,
    slip_hkl: V3<i32>,
    m: &V3,
    n: &V3,
    lattice: &Lattice,
    tol: f64,
) -> FailResult<M33> {
    ensure!(line_uvw != V3([0; 3]), "line direction cannot be zero");
    ensure!(slip_hkl != V3([0; 3]), "slip plane indices cannot be zero");
    ensure!(
        (m.norm() - 1.0).abs() <= tol && (n.norm() - 1.0).abs() <= tol && m.dot(n).abs() <= tol,
        "m and n must be orthogonal unit vectors (got m = {:?}, n = {:?})", m, n,
    );

    let line_cart = (line_uvw.to_f64() * lattice).unit();
    // plane normals live in reciprocal space
    let normal_cart = (lattice.inverse_matrix() * slip_hkl.to_f64()).unit();
    ensure!(
        line_cart.dot(&normal_cart).abs() <= tol,
        "line direction {:?} does not lie in slip plane {:?}", line_uvw, slip_hkl,
    );
    let in_plane_cart = normal_cart.cross(&line_cart);

    let targets = M3([*m, *n, m.cross(n)]).t();
    let sources = M3([in_plane_cart, normal_cart, line_cart]);
    Ok(&targets * &sources)
}

/// Find a simulation cell for a dislocation whose cell vectors are lattice
/// vectors, with the dislocation line and slip plane normal along cartesian axes.
///
/// The returned basis is validated by rotating the reference cell with it;
/// the resulting rotation must agree with [`dislocation_system_transform`].
pub fn resolve_dislocation(
    line: Miller,
    slip_plane: Miller,
    lattice: &Lattice,
    options: &DislocationOptions,
) -> FailResult<DislocationBasis> {
    let DislocationOptions { ref m, ref n, max_index, tol } = *options;

    let line_uvw = reduce_by_gcd(&line.direction()?);
    let slip_hkl = slip_plane.plane()?;
    let transform = dislocation_system_transform(line_uvw, slip_hkl, m, n, lattice, tol)?;

    let not_aligned = |which, vector: &V3| ResolveError::NotAxisAligned { which, vector: *vector };
    axis_alignment(m, tol).ok_or_else(|| not_aligned("m", m))?;
    let (cut_axis, _) = axis_alignment(n, tol).ok_or_else(|| not_aligned("n", n))?;
    let line_dir = m.cross(n);
    let (line_axis, line_sign) = axis_alignment(&line_dir, tol).ok_or_else(|| not_aligned("line", &line_dir))?;

    // Orient every vector so that it lands on the positive end of its axis.
    // The in-plane vector is looked for along (cut x line), which the row
    // table below corrects for with a sign where needed.
    let line_uvw = line_uvw * (line_sign as i32);
    let n_target = cut_axis.unit() * &transform;
    let m_target = cut_axis.unit().cross(&line_axis.unit()) * &transform;

    let (m_uvw, n_uvw) = search_basis_vectors(lattice, &m_target, &n_target, max_index)?;
    let m_uvw = reduce_by_gcd(&m_uvw);
    let n_uvw = reduce_by_gcd(&n_uvw);
    debug!("dislocation search found m = {:?}, n = {:?}", m_uvw, n_uvw);

    use self::CellAxis::{A, B, C};
    let rows = match (cut_axis, line_axis) {
        (C, A) => [line_uvw, m_uvw, n_uvw],
        (C, B) => [-m_uvw, line_uvw, n_uvw],
        (B, C) => [m_uvw, n_uvw, line_uvw],
        (B, A) => [line_uvw, n_uvw, -m_uvw],
        (A, B) => [n_uvw, line_uvw, m_uvw],
        (A, C) => [n_uvw, -m_uvw, line_uvw],
        (cut, line) => unreachable!("cut axis {} coincides with line axis {}", cut, line),
    };
    let uvws = M3(rows);

    let (_, actual) = Cell::new(lattice.clone()).rotate(&uvws)?;
    let flat = |m: &M33| m.into_array();
    if !all_close(flat(&transform).iter().flatten(), flat(&actual).iter().flatten(), Tolerances::default()) {
        return Err(ResolveError::InconsistentOrientation { uvws, expected: transform, actual }.into());
    }

    Ok(DislocationBasis { uvws, transform, cut_axis, line_axis })
}

// Two searches over the same sequence of lattice vectors:
//
// * "m": the in-plane vector closest in angle to `m_target`.
// * "n": the out-of-plane vector closest in angle to `n_target`.
//
// A vector only replaces the current best when its angle is strictly smaller.
fn search_basis_vectors(
    lattice: &Lattice,
    m_target: &V3,
    n_target: &V3,
    max_index: i32,
) -> FailResult<(V3<i32>, V3<i32>)> {
    const IN_PLANE_TOL: f64 = 1e-8;

    let mut m_best = None;
    let mut n_best = None;
    let mut m_angle_min = 180.0;
    let mut n_angle_min = 180.0;
    for uvw in lattice_vectors(max_index) {
        let cart = uvw.to_f64() * lattice;
        if cart.dot(n_target).abs() <= IN_PLANE_TOL {
            let angle = cart.angle_to(m_target).to_degrees();
            if angle < m_angle_min {
                m_best = Some(uvw);
                m_angle_min = angle;
            }
        } else {
            let angle = cart.angle_to(n_target).to_degrees();
            if angle < n_angle_min {
                n_best = Some(uvw);
                n_angle_min = angle;
            }
        }
    }

    let exhausted = |target| ResolveError::SearchExhausted { target, max_index };
    let m_uvw = m_best.ok_or_else(|| exhausted("in-plane direction"))?;
    let n_uvw = n_best.ok_or_else(|| exhausted("slip plane normal"))?;
    trace!("search angles: m {:e} deg, n {:e} deg", m_angle_min, n_angle_min);
    Ok((m_uvw, n_uvw))
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    fn row_carts(basis: &DislocationBasis, lattice: &Lattice) -> [V3; 3] {
        let carts = basis.uvws.to_f64() * lattice.matrix();
        carts.0
    }

    fn check_basis(basis: &DislocationBasis, lattice: &Lattice) {
        assert_ne!(basis.uvws.det(), 0);
        let [a, b, c] = row_carts(basis, lattice);
        assert_close!(abs=1e-7, a.cross(&b).angle_to(&c), 0.0);

        let (_, rotation) = Cell::new(lattice.clone()).rotate(&basis.uvws).unwrap();
        assert_close!(abs=1e-8, rotation, basis.transform);
    }

    #[test]
    fn bcc_screw() {
        let lattice = Lattice::cubic(3.3);
        let basis = resolve_dislocation(
            Miller::Three([1, 1, 1]),
            Miller::Three([1, -1, 0]),
            &lattice,
            &DislocationOptions::default(),
        ).unwrap();

        assert_eq!(basis.cut_axis, CellAxis::B);
        assert_eq!(basis.line_axis, CellAxis::C);
        assert_eq!(basis.uvws, M33::from([[-1, -1, 2], [1, -1, 0], [1, 1, 1]]));
        check_basis(&basis, &lattice);
    }

    #[test]
    fn cubic_systems() {
        let lattice = Lattice::cubic(1.0);
        let systems = vec![
            ([1, 0, 0], [0, 1, 0]),
            ([0, 0, 1], [1, 0, 0]),
            ([1, 1, 0], [1, -1, 1]),
            ([1, -1, 0], [1, 1, 1]),
            ([1, 1, 2], [1, 1, -1]),
        ];
        let orientations = vec![
            (V3([1.0, 0.0, 0.0]), V3([0.0, 1.0, 0.0])),
            (V3([1.0, 0.0, 0.0]), V3([0.0, 0.0, 1.0])),
            (V3([0.0, 1.0, 0.0]), V3([0.0, 0.0, 1.0])),
            (V3([0.0, 0.0, 1.0]), V3([1.0, 0.0, 0.0])),
            (V3([0.0, -1.0, 0.0]), V3([1.0, 0.0, 0.0])),
        ];
        for &(line, plane) in &systems {
            for &(m, n) in &orientations {
                let options = DislocationOptions { m, n, ..Default::default() };
                let basis = resolve_dislocation(line.into(), plane.into(), &lattice, &options)
                    .unwrap_or_else(|e| panic!("{:?} {:?} {:?} {:?}: {}", line, plane, m, n, e));
                check_basis(&basis, &lattice);
            }
        }
    }

    #[test]
    fn sign_corrected_table_entry() {
        // line along -y, so the (c, b) row ordering is used
        let lattice = Lattice::cubic(1.0);
        let options = DislocationOptions {
            m: V3([1.0, 0.0, 0.0]),
            n: V3([0.0, 0.0, 1.0]),
            ..Default::default()
        };
        let basis = resolve_dislocation([1, 0, 0].into(), [0, 0, 1].into(), &lattice, &options).unwrap();
        assert_eq!((basis.cut_axis, basis.line_axis), (CellAxis::C, CellAxis::B));
        assert_eq!(basis.uvws, M33::from([[0, 1, 0], [-1, 0, 0], [0, 0, 1]]));
        assert_close!(abs=1e-12, basis.transform, M33::from([
            [0.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
        ]));
    }

    #[test]
    fn hexagonal_basal() {
        let lattice = Lattice::hexagonal(2.95, 4.68);
        let basis = resolve_dislocation(
            Miller::Four([2, -1, -1, 0]),
            Miller::Four([0, 0, 0, 1]),
            &lattice,
            &DislocationOptions::default(),
        ).unwrap();
        assert_eq!(basis.uvws, M33::from([[1, 2, 0], [0, 0, 1], [1, 0, 0]]));
        check_basis(&basis, &lattice);

        let hex = basis.hexagonal_uvws();
        assert_close!(abs=1e-12, hex[0].to_vec(), vec![0.0, 1.0, -1.0, 0.0]);
        assert_close!(abs=1e-12, hex[1].to_vec(), vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn failures() {
        let lattice = Lattice::cubic(1.0);
        let resolve = |line: [i32; 3], plane: [i32; 3], options: &DislocationOptions| {
            resolve_dislocation(line.into(), plane.into(), &lattice, options)
        };

        // line not in the slip plane
        assert!(resolve([1, 0, 0], [1, 0, 0], &Default::default()).is_err());

        let s = f64::sqrt(0.5);
        let tilted = DislocationOptions {
            m: V3([s, s, 0.0]),
            n: V3([-s, s, 0.0]),
            ..Default::default()
        };
        let err = resolve([1, 0, 0], [0, 1, 0], &tilted).unwrap_err();
        match err.downcast_ref::<ResolveError>() {
            Some(ResolveError::NotAxisAligned { which: "m", .. }) => {},
            _ => panic!("unexpected error: {}", err),
        }

        let tiny = DislocationOptions { max_index: 0, ..Default::default() };
        let err = resolve([1, 0, 0], [0, 1, 0], &tiny).unwrap_err();
        match err.downcast_ref::<ResolveError>() {
            Some(ResolveError::SearchExhausted { .. }) => {},
            _ => panic!("unexpected error: {}", err),
        }
    }

    #[test]
    fn unsupported_orientation() {
        // no lattice vector is close enough to the (001) normal of this cell
        let lattice = Lattice::from(&[
            [1.0, 0.0, 0.0],
            [0.3, 1.0, 0.0],
            [0.2, 0.1, 1.0],
        ]);
        let err = resolve_dislocation(
            [1, 0, 0].into(), [0, 0, 1].into(), &lattice, &Default::default(),
        ).unwrap_err();
        match err.downcast_ref::<ResolveError>() {
            Some(ResolveError::InconsistentOrientation { .. }) => {},
            _ => panic!("unexpected error: {}", err),
        }
    }
}
