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

//! Numerical gradients.

use crate::Never;

/// Default total width of the central difference interval.
pub const DEFAULT_SHIFT: f64 = 1e-7;

/// Gradient of `energy_fn` at `coord` by central differences.
///
/// Each component is `(E(x + h/2) - E(x - h/2)) / h` where `h` is `shift`.
pub fn central_difference(
    mut energy_fn: impl FnMut(&[f64]) -> f64,
    coord: &[f64],
    shift: f64,
) -> Vec<f64> {
    try_central_difference::<Never, _>(|x| Ok(energy_fn(x)), coord, shift)
        .unwrap_or_else(|e| match e {})
}

/// `central_difference` for energy functions that can fail.
pub fn try_central_difference<E, F>(
    mut energy_fn: F,
    coord: &[f64],
    shift: f64,
) -> Result<Vec<f64>, E>
where
    F: FnMut(&[f64]) -> Result<f64, E>,
{
    assert!(shift > 0.0, "central difference shift must be positive");

    let mut point = coord.to_vec();
    let mut out = Vec::with_capacity(coord.len());
    for i in 0..coord.len() {
        point[i] = coord[i] + 0.5 * shift;
        let above = energy_fn(&point)?;
        point[i] = coord[i] - 0.5 * shift;
        let below = energy_fn(&point)?;
        point[i] = coord[i];

        out.push((above - below) / shift);
    }
    Ok(out)
}
