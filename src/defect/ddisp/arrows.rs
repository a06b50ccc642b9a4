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

use std::str::FromStr;

use atomkit_array_types::{V3, M33, M3};
use atomkit_structure::region::AxisBox;

use crate::FailResult;
use crate::axes::axes_check;
use super::DisplacementField;

/// Extra room around the x and y limits when selecting arrows and atoms.
pub const PLOT_PADDING: f64 = 5.0;

/// Components smaller than this fraction of the lattice constant are shown as zero.
pub const NOISE_FRACTION: f64 = 0.1;

const AXES_TOL: f64 = 1e-8;

/// Which part of each differential displacement vector to draw.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Component {
    X,
    Y,
    Z,
    /// Component along an arbitrary direction.  Use [`Component::axis`] to normalize.
    Axis(V3),
    /// The part lying in the plot plane.
    Projection,
}

impl Component {
    pub fn axis(direction: V3) -> FailResult<Self> {
        let norm = direction.norm();
        ensure!(norm > 0.0 && norm.is_finite(), "component direction must be nonzero: {:?}", direction);
        Ok(Component::Axis(direction / norm))
    }

    /// The cartesian direction, or `None` for a projection.
    pub fn direction(&self) -> Option<V3> {
        match *self {
            Component::X => Some(V3::axis_unit(0)),
            Component::Y => Some(V3::axis_unit(1)),
            Component::Z => Some(V3::axis_unit(2)),
            Component::Axis(v) => Some(v.unit()),
            Component::Projection => None,
        }
    }
}

impl FromStr for Component {
    type Err = failure::Error;

    /// `x`, `y`, `z`, `projection`, or three numbers separated by commas or spaces.
    fn from_str(s: &str) -> FailResult<Self> {
        Ok(match s.trim() {
            "x" => Component::X,
            "y" => Component::Y,
            "z" => Component::Z,
            "projection" => Component::Projection,
            other => {
                let words: Vec<_> = other.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|w| !w.is_empty())
                    .collect();
                ensure!(
                    words.len() == 3,
                    "invalid component {:?}: expected x, y, z, projection, or a vector", s,
                );
                let mut v = V3::zero();
                for (x, word) in v.iter_mut().zip(words) {
                    *x = word.parse()?;
                }
                Component::axis(v)?
            },
        })
    }
}

/// How to turn a solved field into arrows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrowSettings {
    pub component: Component,
    /// Components are wrapped into `[-ddmax, ddmax]`.  Typically half the
    /// Burgers vector length.  `None` disables wrapping.
    pub ddmax: Option<f64>,
    /// Cartesian direction shown along the horizontal plot axis.
    pub plot_x: V3,
    /// Cartesian direction shown along the vertical plot axis.  Must be orthogonal to `plot_x`.
    pub plot_y: V3,
    /// Limits along the plot axes.  Each defaults to the range of the atoms.
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    pub zlim: Option<(f64, f64)>,
    /// Take depths from the base structure even when the defect is the reference.
    pub use_base_depth: bool,
    /// Sets the noise threshold.  Zero disables it.
    pub lattice_constant: f64,
    /// Multiplies the drawn vectors (but not the reported components).
    pub arrow_scale: f64,
}

impl Default for ArrowSettings {
    fn default() -> Self {
        ArrowSettings {
            component: Component::Projection,
            ddmax: None,
            plot_x: V3([1.0, 0.0, 0.0]),
            plot_y: V3([0.0, 1.0, 0.0]),
            xlim: None,
            ylim: None,
            zlim: None,
            use_base_depth: false,
            lattice_constant: 0.0,
            arrow_scale: 1.0,
        }
    }
}

impl ArrowSettings {
    /// Rotation from cartesian coordinates to the plot frame.
    ///
    /// Rows are the plot x axis, plot y axis, and their cross product.
    pub fn transform(&self) -> FailResult<M33> {
        let axes = M3([self.plot_x, self.plot_y, self.plot_x.cross(&self.plot_y)]);
        axes_check(&axes, AXES_TOL)
    }
}

/// Plot axes and limits, resolved against a particular structure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlotFrame {
    pub transform: M33,
    pub xlim: (f64, f64),
    pub ylim: (f64, f64),
    pub zlim: (f64, f64),
}

impl PlotFrame {
    /// Limits that are not given in `settings` span the positions.
    /// `depth_positions` supplies the z limits.
    pub fn from_positions(settings: &ArrowSettings, positions: &[V3], depth_positions: &[V3]) -> FailResult<Self> {
        let transform = settings.transform()?;
        let to_plot = |v: &V3| &transform * v;
        let span = |values: Vec<f64>| -> FailResult<(f64, f64)> {
            ensure!(!values.is_empty(), "no atoms to set plot limits from");
            let lo = values.iter().cloned().fold(std::f64::INFINITY, f64::min);
            let hi = values.iter().cloned().fold(std::f64::NEG_INFINITY, f64::max);
            Ok((lo, hi))
        };
        let coords = |source: &[V3], k: usize| source.iter().map(|v| to_plot(v)[k]).collect::<Vec<_>>();

        let xlim = match settings.xlim {
            Some(lim) => lim,
            None => span(coords(positions, 0))?,
        };
        let ylim = match settings.ylim {
            Some(lim) => lim,
            None => span(coords(positions, 1))?,
        };
        let zlim = match settings.zlim {
            Some(lim) => lim,
            None => span(coords(depth_positions, 2))?,
        };
        trace!("plot limits: x {:?}, y {:?}, z {:?}", xlim, ylim, zlim);
        Ok(PlotFrame { transform, xlim, ylim, zlim })
    }

    pub fn to_plot(&self, cart: &V3) -> V3 { &self.transform * cart }

    /// The region in the plot frame within which arrows and atoms are kept.
    ///
    /// The x and y limits are padded by [`PLOT_PADDING`]; the z limits are not.
    pub fn plot_box(&self) -> AxisBox {
        AxisBox {
            lo: V3([self.xlim.0 - PLOT_PADDING, self.ylim.0 - PLOT_PADDING, self.zlim.0]),
            hi: V3([self.xlim.1 + PLOT_PADDING, self.ylim.1 + PLOT_PADDING, self.zlim.1]),
        }
    }

    /// Position of a plot-frame z coordinate within the z limits, from 0 to 1.
    pub fn depth_fraction(&self, z: f64) -> f64 {
        let (lo, hi) = self.zlim;
        match hi - lo {
            width if width > 0.0 => (z - lo) / width,
            _ => 0.0,
        }
    }
}

/// Arrows of a differential displacement map, in the plot frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arrows {
    /// The `(atom, neighbor)` pair behind each arrow.
    pub pairs: Vec<(usize, usize)>,
    pub centers: Vec<V3>,
    pub vectors: Vec<V3>,
    /// Signed component after the noise threshold and wrapping.
    pub components: Vec<f64>,
    pub frame: PlotFrame,
}

/// Reference atoms to draw under the arrows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtomMarkers {
    pub indices: Vec<usize>,
    /// Positions in the plot frame.
    pub positions: Vec<V3>,
    /// Depth within the z limits, from 0 to 1, for coloring.
    pub depths: Vec<f64>,
}

impl AtomMarkers {
    pub fn new(frame: &PlotFrame, carts: &[V3], depth_carts: Option<&[V3]>) -> FailResult<Self> {
        if let Some(depth_carts) = depth_carts {
            ensure!(depth_carts.len() == carts.len(), "depth positions do not match the atoms");
        }
        let plot_box = frame.plot_box();
        let mut markers = AtomMarkers { indices: vec![], positions: vec![], depths: vec![] };
        for (i, cart) in carts.iter().enumerate() {
            let mut pos = frame.to_plot(cart);
            if let Some(depth_carts) = depth_carts {
                pos[2] = frame.to_plot(&depth_carts[i])[2];
            }
            if plot_box.contains(&pos, true) {
                markers.indices.push(i);
                markers.positions.push(pos);
                markers.depths.push(frame.depth_fraction(pos[2]));
            }
        }
        Ok(markers)
    }
}

/// Bring a component into `[-ddmax, ddmax]` by adding or subtracting `2 * ddmax`.
///
/// Nothing happens without a positive bound.
pub fn wrap_component(mut value: f64, ddmax: Option<f64>) -> f64 {
    if let Some(bound) = ddmax {
        if bound > 0.0 && value.is_finite() {
            while value > bound {
                value -= 2.0 * bound;
            }
            while value < -bound {
                value += 2.0 * bound;
            }
        }
    }
    value
}

/// Whether a projected arrow is drawn reversed.
///
/// Arrows whose displacement points out of the plot plane (positive plot z)
/// are flipped, so that the two sides of a glide plane are drawn consistently.
/// This is a plotting convention.
pub fn glide_sign_flip(dd_plot: &V3) -> bool { dd_plot[2] > 0.0 }

pub(crate) fn build_arrows(field: &DisplacementField, frame: PlotFrame, settings: &ArrowSettings) -> FailResult<Arrows> {
    ensure!(
        settings.lattice_constant >= 0.0,
        "lattice constant cannot be negative (got {})", settings.lattice_constant,
    );
    let threshold = NOISE_FRACTION * settings.lattice_constant;
    let denoise = |x: f64| if x.abs() < threshold { 0.0 } else { x };

    // axis mode works in the plot frame too
    let direction = settings.component.direction().map(|d| frame.to_plot(&d));
    let plot_box = frame.plot_box();

    let mut arrows = Arrows {
        pairs: vec![],
        centers: vec![],
        vectors: vec![],
        components: vec![],
        frame: frame.clone(),
    };
    for k in 0..field.len() {
        let center = frame.to_plot(&field.centers[k]);
        if !plot_box.contains(&center, true) {
            continue;
        }
        let dd = frame.to_plot(&field.ddvectors[k]);

        let (component, unit) = match direction {
            Some(direction) => {
                let component = denoise(dd.dot(&direction));
                (component, frame.to_plot(&field.units[k]))
            },
            None => {
                let in_plane = V3([dd[0], dd[1], 0.0]);
                let magnitude = in_plane.norm();
                let mut unit = match magnitude {
                    m if m > 0.0 => in_plane / m,
                    _ => V3::zero(),
                };
                if glide_sign_flip(&dd) {
                    unit = -unit;
                }
                (denoise(magnitude), unit)
            },
        };
        let component = wrap_component(component, settings.ddmax);

        arrows.pairs.push(field.pairs[k]);
        arrows.centers.push(center);
        arrows.vectors.push(unit * (component * settings.arrow_scale));
        arrows.components.push(component);
    }
    debug!("{} of {} arrows are within the plot", arrows.centers.len(), field.len());
    Ok(arrows)
}
