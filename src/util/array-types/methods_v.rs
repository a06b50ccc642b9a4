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

use crate::types::V3;

impl<X> V3<X> {
    /// Construct a vector from a function on indices.
    #[inline(always)]
    pub fn from_fn<F>(mut f: F) -> Self
    where F: FnMut(usize) -> X,
    { V3([f(0), f(1), f(2)]) }

    /// Construct a vector from a fallible function on indices.
    #[inline(always)]
    pub fn try_from_fn<E, F>(mut f: F) -> Result<Self, E>
    where F: FnMut(usize) -> Result<X, E>,
    { Ok(V3([f(0)?, f(1)?, f(2)?])) }

    /// Apply a function to each element.
    #[inline(always)]
    pub fn map<B, F>(self, mut f: F) -> V3<B>
    where F: FnMut(X) -> B,
    {
        let V3([a, b, c]) = self;
        V3([f(a), f(b), f(c)])
    }

    /// Apply a fallible function to each element.
    #[inline(always)]
    pub fn try_map<E, B, F>(self, mut f: F) -> Result<V3<B>, E>
    where F: FnMut(X) -> Result<B, E>,
    {
        let V3([a, b, c]) = self;
        Ok(V3([f(a)?, f(b)?, f(c)?]))
    }
}

impl<X> V3<X>
where X: Copy + Zero + One + std::ops::Sub<Output=X>,
{
    /// Get a zero vector.
    #[inline(always)]
    pub fn zero() -> Self
    { V3([X::zero(); 3]) }

    /// Get a basis vector.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[inline]
    pub fn axis_unit(i: usize) -> Self {
        assert!(i < 3, "Invalid axis for 3d vector: {}", i);
        let mut v = Self::zero();
        v[i] = X::one();
        v
    }

    /// Get the inner product of two vectors.
    ///
    /// It is recommended you write this as `V3::dot(a, b)`, rather than `a.dot(b)`.
    #[inline(always)]
    pub fn dot(&self, other: &Self) -> X
    { self[0] * other[0] + self[1] * other[1] + self[2] * other[2] }

    /// Get the vector's squared magnitude.
    #[inline(always)]
    pub fn sqnorm(&self) -> X
    { self.dot(self) }

    /// Cross-product.
    #[inline]
    pub fn cross(&self, other: &Self) -> Self {
        V3([
            self[1] * other[2] - self[2] * other[1],
            self[2] * other[0] - self[0] * other[2],
            self[0] * other[1] - self[1] * other[0],
        ])
    }
}

impl V3<f64> {
    /// Get the vector's magnitude.
    #[inline(always)]
    pub fn norm(&self) -> f64
    { self.sqnorm().sqrt() }

    /// Normalize the vector.
    #[inline(always)]
    pub fn unit(&self) -> Self
    { self / self.norm() }

    /// Get the shortest angle (as a value in `[0, pi]`) between this vector and another.
    #[inline]
    pub fn angle_to(&self, other: &Self) -> f64 {
        let arg = self.dot(other) / f64::sqrt(self.sqnorm() * other.sqnorm());
        f64::acos(arg.min(1.0).max(-1.0))
    }
}

impl V3<i32> {
    /// Lossless conversion to floats.
    #[inline(always)]
    pub fn to_f64(&self) -> V3<f64>
    { self.map(f64::from) }
}

/// Inner product of vectors.
///
/// This is basically just `V3::dot` as a free function,
/// because everyone loves symmetry.
#[inline(always)]
pub fn dot<X>(a: &V3<X>, b: &V3<X>) -> X
where X: Copy + Zero + One + std::ops::Sub<Output=X>,
{ a.dot(b) }

/// Cross product of vectors, as a free function.
#[inline(always)]
pub fn cross<X>(a: &V3<X>, b: &V3<X>) -> V3<X>
where X: Copy + Zero + One + std::ops::Sub<Output=X>,
{ a.cross(b) }
