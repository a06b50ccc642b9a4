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

//! Geometric regions, for selecting atoms by position.

use atomkit_array_types::V3;

use crate::{FailResult, Cell};

/// A region of space.
pub trait Shape {
    /// Test which points are inside.  `inclusive` decides the fate of points
    /// that lie exactly on the boundary.
    fn inside(&self, points: &[V3], inclusive: bool) -> Vec<bool>;

    /// Test which points are outside.
    ///
    /// A point on the boundary is outside only if `inclusive` is true.
    fn outside(&self, points: &[V3], inclusive: bool) -> Vec<bool> {
        self.inside(points, !inclusive).into_iter().map(|b| !b).collect()
    }
}

/// A plane through a point, with a unit normal pointing "above" it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane {
    normal: V3,
    point: V3,
}

impl Plane {
    /// The normal is normalized.
    pub fn new(normal: V3, point: V3) -> FailResult<Self> {
        let norm = normal.norm();
        ensure!(norm > 0.0 && norm.is_finite(), "plane normal must be a nonzero vector");
        Ok(Plane { normal: normal / norm, point })
    }

    pub fn normal(&self) -> V3 { self.normal }
    pub fn point(&self) -> V3 { self.point }

    /// Signed distance of a point above the plane.
    pub fn height(&self, point: &V3) -> f64
    { (point - self.point).dot(&self.normal) }

    pub fn below(&self, points: &[V3], inclusive: bool) -> Vec<bool> {
        points.iter().map(|p| {
            let h = self.height(p);
            if inclusive { h <= 0.0 } else { h < 0.0 }
        }).collect()
    }

    pub fn above(&self, points: &[V3], inclusive: bool) -> Vec<bool> {
        points.iter().map(|p| {
            let h = self.height(p);
            if inclusive { h >= 0.0 } else { h > 0.0 }
        }).collect()
    }
}

/// The points that lie below every one of a set of planes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaneSet {
    planes: Vec<Plane>,
}

impl PlaneSet {
    pub fn new(planes: Vec<Plane>) -> Self
    { PlaneSet { planes } }

    pub fn planes(&self) -> &[Plane]
    { &self.planes }
}

impl Shape for PlaneSet {
    fn inside(&self, points: &[V3], inclusive: bool) -> Vec<bool> {
        let mut out = vec![true; points.len()];
        for plane in &self.planes {
            for (flag, below) in out.iter_mut().zip(plane.below(points, inclusive)) {
                *flag &= below;
            }
        }
        out
    }
}

/// An axis-aligned box, which may have zero thickness.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisBox {
    pub lo: V3,
    pub hi: V3,
}

impl AxisBox {
    pub fn new(lo: V3, hi: V3) -> FailResult<Self> {
        ensure!((0..3).all(|k| lo[k] <= hi[k]), "box bounds are inverted: {:?} > {:?}", lo, hi);
        Ok(AxisBox { lo, hi })
    }

    pub fn contains(&self, point: &V3, inclusive: bool) -> bool {
        (0..3).all(|k| match inclusive {
            true => self.lo[k] <= point[k] && point[k] <= self.hi[k],
            false => self.lo[k] < point[k] && point[k] < self.hi[k],
        })
    }
}

impl Shape for AxisBox {
    fn inside(&self, points: &[V3], inclusive: bool) -> Vec<bool>
    { points.iter().map(|p| self.contains(p, inclusive)).collect() }
}

/// The parallelepiped spanned by the lattice vectors at the origin.
///
/// Periodicity is ignored.
impl Shape for Cell {
    fn inside(&self, points: &[V3], inclusive: bool) -> Vec<bool> {
        points.iter().map(|p| {
            let frac = self.cart_to_frac(p);
            frac.iter().all(|&x| match inclusive {
                true => 0.0 <= x && x <= 1.0,
                false => 0.0 < x && x < 1.0,
            })
        }).collect()
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::Lattice;

    #[test]
    fn plane_sides() {
        let plane = Plane::new(V3([0.0, 0.0, 2.0]), V3([0.0, 0.0, 1.0])).unwrap();
        let points = [V3([5.0, 5.0, 0.0]), V3([0.0, 0.0, 1.0]), V3([0.0, 0.0, 3.0])];
        assert_eq!(plane.below(&points, true), vec![true, true, false]);
        assert_eq!(plane.below(&points, false), vec![true, false, false]);
        assert_eq!(plane.above(&points, true), vec![false, true, true]);
        assert_eq!(plane.height(&points[2]), 2.0);
        assert!(Plane::new(V3::zero(), V3::zero()).is_err());
    }

    #[test]
    fn plane_set_is_an_intersection() {
        // the slab 0 <= z <= 1
        let set = PlaneSet::new(vec![
            Plane::new(V3([0.0, 0.0, 1.0]), V3([0.0, 0.0, 1.0])).unwrap(),
            Plane::new(V3([0.0, 0.0, -1.0]), V3([0.0, 0.0, 0.0])).unwrap(),
        ]);
        let points = [V3([0.0, 0.0, -0.5]), V3([0.0, 0.0, 0.0]), V3([9.0, 9.0, 0.5])];
        assert_eq!(set.inside(&points, true), vec![false, true, true]);
        assert_eq!(set.inside(&points, false), vec![false, false, true]);
        // boundary points are outside only when the boundary is included
        assert_eq!(set.outside(&points, false), vec![true, false, false]);
        assert_eq!(set.outside(&points, true), vec![true, true, false]);
    }

    #[test]
    fn boxes() {
        let cell = Cell::new(Lattice::cubic(2.0)).with_origin(V3([1.0, 1.0, 1.0]));
        let points = [V3([1.0, 1.0, 1.0]), V3([2.0, 2.0, 2.0]), V3([0.0, 2.0, 2.0])];
        assert_eq!(cell.inside(&points, true), vec![true, true, false]);
        assert_eq!(cell.inside(&points, false), vec![false, true, false]);

        // a flat box still contains points in its plane
        let flat = AxisBox::new(V3([0.0, 0.0, 1.0]), V3([2.0, 2.0, 1.0])).unwrap();
        assert_eq!(flat.inside(&points, true), vec![true, false, false]);
        assert!(AxisBox::new(V3([1.0, 0.0, 0.0]), V3([0.0, 1.0, 1.0])).is_err());
    }
}
