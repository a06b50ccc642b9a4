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

use std::collections::HashSet;

use ordered_float::OrderedFloat;

use atomkit_array_types::V3;

use crate::FailResult;
use super::PlotFrame;

/// Weighted position and spread of a dislocation core, in the plot plane.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreStats {
    pub x0: f64,
    pub y0: f64,
    /// Weighted variance along x.
    pub x_sq: f64,
    /// Weighted variance along y.
    pub y_sq: f64,
    /// Weighted covariance.
    pub xy: f64,
}

/// Locate a dislocation core from a per-atom scalar, such as a component of the Nye tensor.
///
/// Atoms are weighted by the negated property.  Only atoms strictly inside
/// the (padded) plot box are used, and of several atoms at the same plot
/// x and y, only the first.
pub fn core_position(frame: &PlotFrame, carts: &[V3], property: &[f64]) -> FailResult<CoreStats> {
    ensure!(
        carts.len() == property.len(),
        "got {} positions but {} property values", carts.len(), property.len(),
    );
    let plot_box = frame.plot_box();

    let mut seen = HashSet::new();
    let mut points = vec![];
    for (cart, &value) in carts.iter().zip(property) {
        let pos = frame.to_plot(cart);
        if !plot_box.contains(&pos, false) {
            continue;
        }
        if seen.insert((OrderedFloat(pos[0]), OrderedFloat(pos[1]))) {
            points.push((pos[0], pos[1], -value));
        }
    }

    let total: f64 = points.iter().map(|&(_, _, v)| v).sum();
    ensure!(total != 0.0, "total weight of the {} atoms near the core is zero", points.len());

    let mean = |f: &dyn Fn(f64, f64) -> f64| {
        points.iter().map(|&(x, y, v)| f(x, y) * v).sum::<f64>() / total
    };
    let x0 = mean(&|x, _| x);
    let y0 = mean(&|_, y| y);
    let stats = CoreStats {
        x0,
        y0,
        x_sq: mean(&|x, _| x * x) - x0 * x0,
        y_sq: mean(&|_, y| y * y) - y0 * y0,
        xy: mean(&|x, y| x * y) - x0 * y0,
    };
    trace!("core position from {} atoms: {:?}", points.len(), stats);
    Ok(stats)
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use atomkit_array_types::M33;

    fn frame() -> PlotFrame {
        PlotFrame {
            transform: M33::eye(),
            xlim: (-1.0, 1.0),
            ylim: (-1.0, 1.0),
            zlim: (-1.0, 1.0),
        }
    }

    #[test]
    fn symmetric_core() {
        let carts = vec![
            V3([1.0, 0.0, 0.0]),
            V3([-1.0, 0.0, 0.0]),
            V3([0.0, 1.0, 0.0]),
            V3([0.0, -1.0, 0.0]),
            // same xy as the first atom
            V3([1.0, 0.0, 0.5]),
            // outside of the z limits
            V3([0.0, 0.0, 1.0]),
        ];
        let property = vec![-1.0, -1.0, -1.0, -1.0, -100.0, -100.0];
        let stats = core_position(&frame(), &carts, &property).unwrap();
        assert_close!(abs=1e-12, stats.x0, 0.0);
        assert_close!(abs=1e-12, stats.y0, 0.0);
        assert_close!(stats.x_sq, 0.5);
        assert_close!(stats.y_sq, 0.5);
        assert_close!(abs=1e-12, stats.xy, 0.0);
    }

    #[test]
    fn weighted_toward_strong_atoms() {
        let carts = vec![V3([0.0, 0.0, 0.0]), V3([2.0, 1.0, 0.0])];
        let stats = core_position(&frame(), &carts, &[-1.0, -3.0]).unwrap();
        assert_close!(stats.x0, 1.5);
        assert_close!(stats.y0, 0.75);
        assert_close!(stats.xy, 1.5 - 1.5 * 0.75);
    }

    #[test]
    fn zero_weight() {
        let carts = vec![V3([0.0, 0.0, 0.0]), V3([1.0, 0.0, 0.0])];
        assert!(core_position(&frame(), &carts, &[1.0, -1.0]).is_err());
        assert!(core_position(&frame(), &carts, &[1.0]).is_err());
    }
}
