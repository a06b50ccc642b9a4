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

use crate::types::{V3, M3, M33};

/// Conversions from sequences of arrays into sequences of `V3`.
///
/// Config files and text formats naturally produce `[f64; 3]`s; this is
/// how they get into the math.
pub trait Envee {
    type Output;

    /// Wrap arrays into `V3`s.
    fn envee(self) -> Self::Output;
}

/// Conversions from sequences of `V3` into sequences of arrays.
pub trait Unvee {
    type Output;

    /// Unwrap `V3`s into arrays.
    fn unvee(self) -> Self::Output;
}

impl<X> Envee for Vec<[X; 3]> {
    type Output = Vec<V3<X>>;

    fn envee(self) -> Vec<V3<X>>
    { self.into_iter().map(V3).collect() }
}

impl<'a, X: Copy> Envee for &'a [[X; 3]] {
    type Output = Vec<V3<X>>;

    fn envee(self) -> Vec<V3<X>>
    { self.iter().map(|&v| V3(v)).collect() }
}

impl<X: Copy> Envee for [[X; 3]; 3] {
    type Output = M33<X>;

    fn envee(self) -> M33<X>
    { M3([V3(self[0]), V3(self[1]), V3(self[2])]) }
}

impl<X> Unvee for Vec<V3<X>> {
    type Output = Vec<[X; 3]>;

    fn unvee(self) -> Vec<[X; 3]>
    { self.into_iter().map(|v| v.0).collect() }
}

impl<'a, X: Copy> Unvee for &'a [V3<X>] {
    type Output = Vec<[X; 3]>;

    fn unvee(self) -> Vec<[X; 3]>
    { self.iter().map(|v| v.0).collect() }
}

impl<X> Unvee for M33<X> {
    type Output = [[X; 3]; 3];

    fn unvee(self) -> [[X; 3]; 3]
    { self.into_array() }
}
