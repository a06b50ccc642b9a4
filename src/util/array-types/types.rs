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

use std::ops::{Deref, DerefMut};
use std::fmt;

use atomkit_assert_close::{CheckClose, CheckCloseError, Tolerances};

/// A 3-dimensional vector with operations for linear algebra.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct V3<X=f64>(pub [X; 3]);

/// A linear algebra dense matrix with 3 rows.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct M3<V>(pub [V; 3]);

/// A square dense 3x3 matrix.
pub type M33<X=f64> = M3<V3<X>>;

// Both types behave generally like their backing array type.
macro_rules! impl_array_like {
    ($Cn:ident, $T:ident) => {
        impl<$T> Deref for $Cn<$T> {
            type Target = [$T; 3];

            #[inline(always)]
            fn deref(&self) -> &Self::Target
            { &self.0 }
        }

        impl<$T> DerefMut for $Cn<$T> {
            #[inline(always)]
            fn deref_mut(&mut self) -> &mut Self::Target
            { &mut self.0 }
        }

        impl<'a, $T> IntoIterator for &'a $Cn<$T> {
            type Item = &'a $T;
            type IntoIter = std::slice::Iter<'a, $T>;

            #[inline(always)]
            fn into_iter(self) -> Self::IntoIter
            { self.0.iter() }
        }

        impl<'a, $T> IntoIterator for &'a mut $Cn<$T> {
            type Item = &'a mut $T;
            type IntoIter = std::slice::IterMut<'a, $T>;

            #[inline(always)]
            fn into_iter(self) -> Self::IntoIter
            { self.0.iter_mut() }
        }

        // Debug output without the surrounding "V3(...)" reads as valid JSON,
        // which makes pasting values out of a log into a script painless.
        impl<$T: fmt::Debug> fmt::Debug for $Cn<$T> {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
            { fmt::Debug::fmt(&self.0, f) }
        }

        impl<$T> From<[$T; 3]> for $Cn<$T> {
            #[inline(always)]
            fn from(arr: [$T; 3]) -> Self
            { $Cn(arr) }
        }
    };
}

impl_array_like!(V3, X);
impl_array_like!(M3, V);

impl<X: Copy> From<[[X; 3]; 3]> for M33<X> {
    #[inline]
    fn from(arr: [[X; 3]; 3]) -> Self
    { M3([V3(arr[0]), V3(arr[1]), V3(arr[2])]) }
}

impl CheckClose for V3 {
    type Scalar = f64;

    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError<f64>>
    { self.0.check_close(&other.0, tol) }
}

impl CheckClose for M33 {
    type Scalar = f64;

    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError<f64>>
    { self.0.check_close(&other.0, tol) }
}
