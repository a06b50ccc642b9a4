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

use ordered_float::OrderedFloat;

use atomkit_array_types::{V3, M33, M3};
use atomkit_assert_close::{is_close, Tolerances};
use atomkit_structure::{Cell, Lattice, SizeMult, Structure};
use atomkit_structure::miller::{Centering, Miller};

use crate::FailResult;
use crate::axes::CellAxis;
use crate::dislocation::{DislocationOptions, ResolveError, resolve_dislocation};
use crate::search::lattice_vectors;

/// How to orient a cell for a free surface.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceOptions {
    /// The cell vector that will be normal to the surface.
    pub cut_axis: CellAxis,
    /// Largest lattice vector index to search.  Defaults to the larger of
    /// 10 and the largest plane index.
    pub max_index: Option<i32>,
    /// Centering of the conventional cell that the plane indices refer to,
    /// when the reference cell is primitive.
    pub centering: Centering,
    /// Tolerance for the atomic layer positions and the shape of the rotated cell.
    pub tol: f64,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        SurfaceOptions {
            cut_axis: CellAxis::C,
            max_index: None,
            centering: Centering::P,
            tol: 1e-7,
        }
    }
}

/// Integer cell vectors for a free surface.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceBasis {
    /// Rows are the new cell vectors, in units of the reference cell vectors.
    pub uvws: M33<i32>,
    /// Cartesian rotation from the reference cell frame to the new one.
    pub transform: M33,
    pub cut_axis: CellAxis,
}

/// Find integer cell vectors for which the plane `plane` is spanned by the
/// two cell vectors other than `options.cut_axis`.
///
/// The plane indices are converted to the primitive setting first.  The
/// shortest lattice vector lying in the plane is used as one of the in-plane
/// vectors, and the remaining two are found by the same search used for
/// dislocations.
pub fn resolve_surface(
    plane: Miller,
    lattice: &Lattice,
    options: &SurfaceOptions,
) -> FailResult<SurfaceBasis> {
    let hkl = options.centering.plane_to_primitive(plane.plane()?)?;
    ensure!(hkl != V3([0; 3]), "plane indices cannot be zero");

    let max_index = match options.max_index {
        Some(max_index) => max_index,
        None => hkl.iter().map(|x| x.abs()).fold(10, i32::max),
    };

    let mut line = None;
    let mut shortest = std::f64::INFINITY;
    for uvw in lattice_vectors(max_index).filter(|uvw| uvw.dot(&hkl) == 0) {
        // equal lengths keep the earlier vector
        let length = (uvw.to_f64() * lattice).norm();
        if length < shortest - options.tol {
            line = Some(uvw);
            shortest = length;
        }
    }
    let line = line.ok_or_else(|| ResolveError::SearchExhausted { target: "surface plane", max_index })?;
    trace!("surface in-plane direction {:?} for plane {:?}", line, hkl);

    let [z, y, x] = [V3::axis_unit(2), V3::axis_unit(1), V3::axis_unit(0)];
    let (m, n) = match options.cut_axis {
        CellAxis::A => (z, x),
        CellAxis::B => (-z, y),
        CellAxis::C => (y, z),
    };
    let dislocation_options = DislocationOptions { m, n, max_index, ..Default::default() };
    let basis = resolve_dislocation(Miller::Three(line.0), Miller::Three(hkl.0), lattice, &dislocation_options)?;
    assert_eq!(basis.cut_axis, options.cut_axis);

    Ok(SurfaceBasis {
        uvws: basis.uvws,
        transform: basis.transform,
        cut_axis: options.cut_axis,
    })
}

/// A rotated unit cell ready to be cut along a plane, plus the locations
/// at which it can be cut cleanly.
#[derive(Debug, Clone)]
pub struct FreeSurface<M = ()> {
    plane: Miller,
    basis: SurfaceBasis,
    centering: Centering,
    ucell: Structure<M>,
    rcell: Structure<M>,
    width: f64,
    layers: Vec<f64>,
    shifts: Vec<V3>,
}

/// Arguments to [`FreeSurface::surface`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceSettings {
    /// Cartesian translation applied to every atom before wrapping.
    /// Values from [`FreeSurface::shifts`] choose the termination plane.
    pub shift: V3,
    /// Enlarge the cell along the cut axis by this much, keeping the atoms
    /// centered.
    pub vacuum_width: Option<f64>,
    /// Minimum width along the cut axis.  The multiplier along that axis is
    /// increased to reach it, keeping its sign.
    pub min_width: Option<f64>,
    /// Supercell multipliers.  The one along the cut axis must be a plain count.
    pub size_mults: [SizeMult; 3],
    /// Make the multiplier along the cut axis even, moving it away from zero.
    pub even: bool,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        SurfaceSettings {
            shift: V3::zero(),
            vacuum_width: None,
            min_width: None,
            size_mults: Default::default(),
            even: false,
        }
    }
}

/// A built free surface.
#[derive(Debug, Clone)]
pub struct SurfaceSystem<M = ()> {
    /// Non-periodic along the cut axis.
    pub structure: Structure<M>,
    /// Area of one of the two free surfaces.
    pub surface_area: f64,
}

impl<M: Clone> FreeSurface<M> {
    pub fn new(plane: Miller, ucell: Structure<M>, options: &SurfaceOptions) -> FailResult<Self> {
        let basis = resolve_surface(plane, ucell.lattice(), options)?;
        let (rcell, _) = ucell.rotate(&basis.uvws)?;

        let cut = options.cut_axis.index();
        let vectors = rcell.lattice().vectors();
        for k in (0..3).filter(|&k| k != cut) {
            ensure!(
                vectors[k][cut].abs() <= options.tol,
                "cell vector {} of the rotated cell has a component along the cut axis {}: {:?}",
                CellAxis::from_index(k), options.cut_axis, vectors[k],
            );
        }
        let width = vectors[cut][cut];

        let layers = layer_positions(&rcell, cut, options.tol)?;
        let shifts = cut_shifts(&layers, width)
            .into_iter()
            .map(|s| options.cut_axis.unit() * s)
            .collect();

        Ok(FreeSurface {
            plane,
            basis,
            centering: options.centering,
            ucell,
            rcell,
            width,
            layers,
            shifts,
        })
    }
}

impl<M> FreeSurface<M> {
    pub fn plane(&self) -> &Miller { &self.plane }
    pub fn basis(&self) -> &SurfaceBasis { &self.basis }
    pub fn cut_axis(&self) -> CellAxis { self.basis.cut_axis }
    pub fn transform(&self) -> &M33 { &self.basis.transform }
    pub fn centering(&self) -> Centering { self.centering }
    pub fn unit_cell(&self) -> &Structure<M> { &self.ucell }

    /// The unit cell, re-expressed and rotated so that the plane is normal to the cut axis.
    pub fn rotated_cell(&self) -> &Structure<M> { &self.rcell }

    /// Width of the rotated cell along the cut axis.
    pub fn width(&self) -> f64 { self.width }

    /// Distinct atomic layer heights along the cut axis (rounded).
    pub fn layers(&self) -> &[f64] { &self.layers }

    /// Translations that put a cut exactly halfway between two atomic layers, sorted.
    pub fn shifts(&self) -> &[V3] { &self.shifts }

    /// The rotated cell vectors in units of the conventional cell vectors.
    pub fn conventional_uvws(&self) -> M33 {
        let uvws = &self.basis.uvws;
        M3([
            self.centering.direction_to_conventional(uvws[0]),
            self.centering.direction_to_conventional(uvws[1]),
            self.centering.direction_to_conventional(uvws[2]),
        ])
    }
}

impl<M: Clone> FreeSurface<M> {
    /// Build a slab with two free surfaces normal to the cut axis.
    pub fn surface(&self, settings: &SurfaceSettings) -> FailResult<SurfaceSystem<M>> {
        let cut_axis = self.cut_axis();
        let cut = cut_axis.index();

        let mut size_mults = settings.size_mults;
        let cut_mult = size_mults[cut];
        ensure!(
            cut_mult.is_count(),
            "the size multiplier along the cut axis must be a count, not a range ({}..{})",
            cut_mult.lo(), cut_mult.hi(),
        );
        let mut count = if cut_mult.lo() == 0 { cut_mult.hi() } else { cut_mult.lo() };

        if let Some(min_width) = settings.min_width {
            let needed = (min_width / self.width).ceil() as i32;
            if needed > count.abs() {
                count = count.signum() * needed;
            }
        }
        if settings.even && count % 2 != 0 {
            count += count.signum();
        }
        size_mults[cut] = SizeMult::count(count)?;

        let mut structure = self.rcell.supersize(&size_mults);
        structure.translate_cart(&settings.shift);
        structure.wrap();

        let mut pbc = [true; 3];
        pbc[cut] = false;
        structure.set_pbc(pbc);

        if let Some(vacuum_width) = settings.vacuum_width {
            ensure!(vacuum_width >= 0.0, "vacuum width must not be negative (got {})", vacuum_width);
            let mut vectors = *structure.lattice().vectors();
            vectors[cut][cut] += vacuum_width;
            let origin = structure.cell().origin() - cut_axis.unit() * (vacuum_width / 2.0);
            let cell = Cell::new(Lattice::from_vectors(&vectors))
                .with_origin(origin)
                .with_pbc(pbc);
            structure.set_cell(cell);
        }

        let vectors = structure.lattice().vectors();
        let others: Vec<_> = (0..3).filter(|&k| k != cut).collect();
        let surface_area = vectors[others[0]].cross(&vectors[others[1]]).norm();
        debug!(
            "built surface with {} atoms, multipliers {:?}, area {}",
            structure.num_atoms(), size_mults.iter().map(|m| m.len()).collect::<Vec<_>>(), surface_area,
        );

        Ok(SurfaceSystem { structure, surface_area })
    }
}

// Unique atom heights along the cut axis, rounded to the number of decimals
// implied by `tol`.  The periodic image of the lowest layer is appended
// unless it is already present.
fn layer_positions<M>(rcell: &Structure<M>, cut: usize, tol: f64) -> FailResult<Vec<f64>> {
    ensure!(rcell.num_atoms() > 0, "the unit cell has no atoms");
    let width = rcell.lattice().vectors()[cut][cut];

    let decimals = -tol.log10().floor() as i32;
    let scale = 10f64.powi(decimals);
    let mut coords: Vec<_> = rcell.to_carts().iter()
        .map(|v| OrderedFloat((v[cut] * scale).round() / scale))
        .collect();
    coords.sort();
    coords.dedup();
    let mut coords: Vec<f64> = coords.into_iter().map(|x| x.0).collect();

    let first = coords[0];
    let last = coords[coords.len() - 1];
    if !is_close(last - first, width, Tolerances::abs(tol)) {
        coords.push(first + width);
    }
    Ok(coords)
}

// Shifts along the cut axis that move each gap between layers onto the cell boundary.
fn cut_shifts(layers: &[f64], width: f64) -> Vec<f64> {
    let mut shifts: Vec<_> = layers.windows(2)
        .map(|w| width - (w[0] + w[1]) / 2.0)
        .map(|s| match s {
            s if s > width => s - width,
            s if s < 0.0 => s + width,
            s => s,
        })
        .map(OrderedFloat)
        .collect();
    shifts.sort();
    shifts.into_iter().map(|x| x.0).collect()
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use atomkit_structure::Coords;

    fn fcc(a: f64) -> Structure {
        Structure::new_coords(
            Cell::new(Lattice::cubic(a)),
            Coords::Fracs(vec![
                V3([0.0, 0.0, 0.0]),
                V3([0.5, 0.5, 0.0]),
                V3([0.5, 0.0, 0.5]),
                V3([0.0, 0.5, 0.5]),
            ]),
        )
    }

    fn hcp(a: f64, c: f64) -> Structure {
        Structure::new_coords(
            Cell::new(Lattice::hexagonal(a, c)),
            Coords::Fracs(vec![
                V3([1.0 / 3.0, 2.0 / 3.0, 0.25]),
                V3([2.0 / 3.0, 1.0 / 3.0, 0.75]),
            ]),
        )
    }

    #[test]
    fn coordinate_planes_give_identity() {
        let lattice = Lattice::cubic(1.0);
        for &(hkl, cut_axis) in &[
            ([0, 0, 1], CellAxis::C),
            ([1, 0, 0], CellAxis::A),
            ([0, 1, 0], CellAxis::B),
        ] {
            let options = SurfaceOptions { cut_axis, ..Default::default() };
            let basis = resolve_surface(hkl.into(), &lattice, &options).unwrap();
            assert_eq!(basis.uvws, M33::eye(), "{:?}", hkl);
            assert_close!(abs=1e-12, basis.transform, M33::eye());
            assert_eq!(basis.cut_axis, cut_axis);
        }
    }

    #[test]
    fn equal_lengths_keep_first_line() {
        // |a1| and |a2| of a hexagonal cell differ by rounding only
        for &a in &[2.0, 2.95, 3.21] {
            let lattice = Lattice::hexagonal(a, 1.6 * a);
            let basis = resolve_surface([0, 0, 1].into(), &lattice, &Default::default()).unwrap();
            assert_eq!(basis.uvws[0], V3([1, 0, 0]), "a = {}", a);
        }
    }

    #[test]
    fn centered_plane_indices() {
        // (001) of the conventional fcc cell is (110) of the primitive cell
        let primitive = Lattice::new(&(&Centering::F.primitive_matrix() * Lattice::cubic(4.0).matrix()));
        let options = SurfaceOptions { centering: Centering::F, ..Default::default() };
        let basis = resolve_surface([0, 0, 1].into(), &primitive, &options).unwrap();

        let normal = basis.uvws[0].to_f64() * &primitive;
        let normal = normal.cross(&(basis.uvws[1].to_f64() * &primitive));
        assert_close!(abs=1e-8, normal.unit().cross(&V3([0.0, 0.0, 1.0])), V3::zero());
    }

    #[test]
    fn fcc_001() {
        let surface = FreeSurface::new([0, 0, 1].into(), fcc(4.0), &Default::default()).unwrap();
        assert_eq!(surface.basis().uvws, M33::eye());
        assert_eq!(surface.rotated_cell().num_atoms(), 4);
        assert_close!(surface.width(), 4.0);
        assert_eq!(surface.layers(), &[0.0, 2.0, 4.0][..]);
        assert_eq!(surface.shifts(), &[V3([0.0, 0.0, 1.0]), V3([0.0, 0.0, 3.0])][..]);
        assert_eq!(surface.conventional_uvws(), M33::eye());
    }

    #[test]
    fn hcp_basal() {
        let surface = FreeSurface::new(
            Miller::Four([0, 0, 0, 1]), hcp(2.0, 4.0), &Default::default(),
        ).unwrap();
        assert_eq!(surface.basis().uvws, M33::from([[1, 0, 0], [1, 2, 0], [0, 0, 1]]));
        assert_eq!(surface.rotated_cell().num_atoms(), 4);
        assert_close!(abs=1e-12, surface.width(), 4.0);
        assert_eq!(surface.layers(), &[1.0, 3.0, 5.0][..]);
        assert_eq!(surface.shifts(), &[V3([0.0, 0.0, 0.0]), V3([0.0, 0.0, 2.0])][..]);
    }

    #[test]
    fn build_slab() {
        let surface = FreeSurface::new([0, 0, 1].into(), fcc(4.0), &Default::default()).unwrap();
        let settings = SurfaceSettings {
            shift: surface.shifts()[0],
            vacuum_width: Some(10.0),
            min_width: Some(10.0),
            size_mults: [SizeMult::count(2).unwrap(), SizeMult::count(2).unwrap(), SizeMult::default()],
            even: true,
        };
        let SurfaceSystem { structure, surface_area } = surface.surface(&settings).unwrap();

        // ceil(10 / 4) = 3, made even
        assert_eq!(structure.num_atoms(), 4 * 2 * 2 * 4);
        assert_eq!(structure.cell().pbc(), [true, true, false]);
        assert_close!(structure.lattice().vectors()[2][2], 26.0);
        assert_close!(structure.cell().origin()[2], -5.0);
        assert_close!(surface_area, 64.0);

        // every atom lies within the original extent of the slab
        for cart in structure.to_carts() {
            assert!(-1e-9 <= cart[2] && cart[2] < 16.0);
        }
    }

    #[test]
    fn negative_multiplier_keeps_sign() {
        let surface = FreeSurface::new([0, 0, 1].into(), fcc(4.0), &Default::default()).unwrap();
        let settings = SurfaceSettings {
            min_width: Some(9.0),
            size_mults: [SizeMult::default(), SizeMult::default(), SizeMult::count(-1).unwrap()],
            ..Default::default()
        };
        let system = surface.surface(&settings).unwrap();
        assert_eq!(system.structure.num_atoms(), 12);
        assert_close!(system.structure.cell().origin()[2], -12.0);
    }

    #[test]
    fn bad_settings() {
        let surface = FreeSurface::new([0, 0, 1].into(), fcc(4.0), &Default::default()).unwrap();

        let negative_vacuum = SurfaceSettings { vacuum_width: Some(-1.0), ..Default::default() };
        assert!(surface.surface(&negative_vacuum).is_err());

        let range = SurfaceSettings {
            size_mults: [SizeMult::default(), SizeMult::default(), SizeMult::range(-1, 1).unwrap()],
            ..Default::default()
        };
        assert!(surface.surface(&range).is_err());
    }
}
