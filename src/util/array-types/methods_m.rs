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

use num_traits::{Zero, One};

use crate::types::{V3, M3, M33};

/// Construct an identity matrix (using type inference).
///
/// This is also available as a static method on the matrix type.
#[inline(always)]
pub fn eye<X>() -> M33<X>
where X: Copy + Zero + One + std::ops::Sub<Output=X>,
{ M33::eye() }

/// Matrix inverse.
#[inline(always)]
pub fn inv(m: &M33) -> M33
{ m.inv() }

impl<X> M33<X> {
    /// Construct a matrix from a function on (row, col) indices.
    #[inline]
    pub fn from_fn<F>(mut f: F) -> Self
    where F: FnMut(usize, usize) -> X,
    { M3([
        V3::from_fn(|c| f(0, c)),
        V3::from_fn(|c| f(1, c)),
        V3::from_fn(|c| f(2, c)),
    ])}

    /// Apply a function to each element.
    #[inline]
    pub fn map<B, F>(self, mut f: F) -> M33<B>
    where F: FnMut(X) -> B,
    {
        let M3([a, b, c]) = self;
        M3([a.map(&mut f), b.map(&mut f), c.map(&mut f)])
    }

    /// Apply a fallible function to each element.
    #[inline]
    pub fn try_map<E, B, F>(self, mut f: F) -> Result<M33<B>, E>
    where F: FnMut(X) -> Result<B, E>,
    {
        let M3([a, b, c]) = self;
        Ok(M3([a.try_map(&mut f)?, b.try_map(&mut f)?, c.try_map(&mut f)?]))
    }

    /// Unwrap into nested arrays (of rows).
    #[inline(always)]
    pub fn into_array(self) -> [[X; 3]; 3] {
        let M3([V3(a), V3(b), V3(c)]) = self;
        [a, b, c]
    }
}

impl<X: Copy> M33<X> {
    /// Matrix transpose.
    #[inline]
    pub fn t(&self) -> Self
    { M33::from_fn(|r, c| self[c][r]) }

    /// Get a column of the matrix.
    #[inline]
    pub fn col(&self, c: usize) -> V3<X>
    { V3::from_fn(|r| self[r][c]) }
}

impl<X> M33<X>
where X: Copy + Zero + One + std::ops::Sub<Output=X>,
{
    /// Get a zero matrix.
    #[inline(always)]
    pub fn zero() -> Self
    { M3([V3::zero(); 3]) }

    /// Get an identity matrix.
    #[inline(always)]
    pub fn eye() -> Self
    { M3([V3::axis_unit(0), V3::axis_unit(1), V3::axis_unit(2)]) }

    /// Matrix determinant.
    #[inline]
    pub fn det(&self) -> X
    { self[0].dot(&self[1].cross(&self[2])) }
}

impl M33<f64> {
    /// Matrix inverse.
    ///
    /// A singular matrix produces non-finite elements rather than an error;
    /// callers that can receive user input should check `det()` first.
    pub fn inv(&self) -> Self {
        let det = self.det();
        // the columns of the inverse are the cross products of rows, scaled
        let cofactor_rows = M3([
            self[1].cross(&self[2]),
            self[2].cross(&self[0]),
            self[0].cross(&self[1]),
        ]);
        cofactor_rows.t() / det
    }
}

impl M33<i32> {
    /// Lossless conversion to floats.
    #[inline]
    pub fn to_f64(&self) -> M33<f64>
    { self.map(f64::from) }
}
