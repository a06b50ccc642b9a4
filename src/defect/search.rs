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

use atomkit_array_types::V3;

/// Every nonzero integer vector with components in `-max_index..=max_index`,
/// in a fixed order.
///
/// The third component varies slowest and the first fastest.  Along each
/// axis the values are visited by increasing magnitude, positive before
/// negative: `0, 1, -1, 2, -2, ...`.  Callers that keep the first of several
/// equally good vectors therefore prefer short vectors with positive components.
pub fn lattice_vectors(max_index: i32) -> impl Iterator<Item=V3<i32>> {
    let values: Vec<i32> = (0..=max_index.max(0))
        .flat_map(|mag| match mag {
            0 => vec![0],
            _ => vec![mag, -mag],
        })
        .collect();

    iproduct!(values.clone(), values.clone(), values)
        .map(|(k, j, i)| V3([i, j, k]))
        .filter(|v| v != &V3([0, 0, 0]))
}
