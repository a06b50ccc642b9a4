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

//! Tolerant float comparisons.
//!
//! Two flavors live here:
//!
//! * [`CheckClose`] and the `assert_close!` macro, for tests and debug assertions.
//!   These use a symmetric relative tolerance.
//! * [`all_close`] and [`is_close`], which use the asymmetric
//!   `|a - b| <= abs + rel * |b|` rule.  The crystallography code validates
//!   derived rotations with this rule, so it is part of the library API.

#[macro_use]
extern crate failure;

use std::fmt;

pub const DEFAULT_NONZERO_TOL: f64 = 1e-9;

/// Relative tolerance used by [`all_close`] when none is specified.
pub const DEFAULT_ALLCLOSE_REL: f64 = 1e-5;
/// Absolute tolerance used by [`all_close`] when none is specified.
pub const DEFAULT_ALLCLOSE_ABS: f64 = 1e-8;

/// Panics if two values are not approximately equal.
///
/// ```text
/// assert_close!(a, b);
/// assert_close!(abs=1e-8, a, b);
/// assert_close!(rel=1e-5, abs=1e-8, a, b, "format {}", args);
/// ```
///
/// The default is a relative tolerance of `DEFAULT_NONZERO_TOL` with no absolute tolerance,
/// so comparisons against exactly zero need an explicit `abs`.
#[macro_export]
macro_rules! assert_close {
    ($($t:tt)*) => {
        $crate::__assert_close_impl!{
            @parse [$($t)*] [$crate::DEFAULT_NONZERO_TOL] [0.0]
        }
    };
}

#[macro_export]
macro_rules! debug_assert_close {
    ($($t:tt)*) => {{
        #[cfg(debug_assertions)] {
            $crate::assert_close!{$($t)*}
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __assert_close_impl {
    (@parse [rel=$tol:expr, $($rest:tt)*] [$rel:expr] [$abs:expr]) => {
        $crate::__assert_close_impl!{@parse [$($rest)*] [$tol] [$abs]}
    };
    (@parse [abs=$tol:expr, $($rest:tt)*] [$rel:expr] [$abs:expr]) => {
        $crate::__assert_close_impl!{@parse [$($rest)*] [$rel] [$tol]}
    };
    (@parse [$a:expr, $b:expr $(,)*] [$rel:expr] [$abs:expr]) => {
        $crate::__assert_close_impl!{@check [$a, $b] [$rel] [$abs] ["not nearly equal!"]}
    };
    (@parse [$a:expr, $b:expr, $($fmt:tt)+] [$rel:expr] [$abs:expr]) => {
        $crate::__assert_close_impl!{@check [$a, $b] [$rel] [$abs] [$($fmt)+]}
    };
    (@check [$a:expr, $b:expr] [$rel:expr] [$abs:expr] [$($fmt:tt)+]) => {{
        let a = $a;
        let b = $b;
        let tol = $crate::Tolerances { rel: $rel, abs: $abs };
        if let Err(e) = $crate::CheckClose::check_close(&a, &b, tol) {
            panic!(
                "{} (tolerances: rel={}, abs={})\n left: {:?}\nright: {:?}\n{}",
                format!($($fmt)+), tol.rel, tol.abs, a, b, e,
            );
        }
    }};
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tolerances<T = f64> {
    pub abs: T,
    pub rel: T,
}

impl Tolerances {
    /// A purely absolute tolerance.
    pub fn abs(abs: f64) -> Self
    { Tolerances { abs, rel: 0.0 } }

    /// A purely relative tolerance.
    pub fn rel(rel: f64) -> Self
    { Tolerances { abs: 0.0, rel } }
}

/// Symmetric closeness test (the rule used by Python's `math.isclose`).
#[doc(hidden)]
#[inline]
pub fn __is_close_symmetric(a: f64, b: f64, Tolerances { abs, rel }: Tolerances) -> bool {
    assert!(rel >= 0.0);
    assert!(abs >= 0.0);

    // catch infinities of same sign
    if a == b { return true; }

    // catch infinities of opposite sign, avoiding infinite relative tolerance
    if a.is_infinite() || b.is_infinite() { return false; }

    (a - b).abs() <= abs.max(rel * a.abs()).max(rel * b.abs())
}

/// Asymmetric closeness test: `|a - b| <= abs + rel * |b|`.
///
/// `b` is the reference value.  NaN is never close to anything.
#[inline]
pub fn is_close(a: f64, b: f64, Tolerances { abs, rel }: Tolerances) -> bool {
    if a == b { return true; }
    if !a.is_finite() || !b.is_finite() { return false; }
    (a - b).abs() <= abs + rel * b.abs()
}

/// `is_close` applied elementwise to two equal-length sequences.
pub fn all_close<'a>(
    a: impl IntoIterator<Item=&'a f64>,
    b: impl IntoIterator<Item=&'a f64>,
    tol: Tolerances,
) -> bool {
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next(), b.next()) {
            (Some(&x), Some(&y)) => if !is_close(x, y, tol) { return false },
            (None, None) => return true,
            _ => return false,
        }
    }
}

impl Default for Tolerances {
    /// The tolerances used by `all_close` when none are specified.
    fn default() -> Self
    { Tolerances { abs: DEFAULT_ALLCLOSE_ABS, rel: DEFAULT_ALLCLOSE_REL } }
}

#[derive(Debug, Fail)]
pub struct CheckCloseError<T: fmt::Debug + Send + Sync + 'static = f64> {
    pub values: (T, T),
    pub tol: Tolerances<T>,
}

impl<T: fmt::Debug + Send + Sync + 'static> fmt::Display for CheckCloseError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (ref left, ref right) = self.values;
        write!(f, "failed at:\n  left: {:?}\n right: {:?}\n   tol: {:?}", left, right, self.tol)
    }
}

pub trait CheckClose<Rhs: ?Sized = Self> {
    type Scalar: fmt::Debug + Send + Sync + 'static;

    /// Test that all values of self and other are close.
    fn check_close(&self, other: &Rhs, tol: Tolerances) -> Result<(), CheckCloseError<Self::Scalar>>;
}

impl CheckClose for f64 {
    type Scalar = f64;

    #[inline]
    fn check_close(&self, other: &f64, tol: Tolerances) -> Result<(), CheckCloseError<f64>> {
        match __is_close_symmetric(*self, *other, tol) {
            true => Ok(()),
            false => Err(CheckCloseError { values: (*self, *other), tol }),
        }
    }
}

impl<'a, T: ?Sized + CheckClose> CheckClose for &'a T {
    type Scalar = T::Scalar;

    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError<Self::Scalar>>
    { CheckClose::check_close(*self, *other, tol) }
}

impl<T: CheckClose> CheckClose for [T] {
    type Scalar = T::Scalar;

    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError<Self::Scalar>> {
        assert_eq!(self.len(), other.len(), "length mismatch in check_close");
        self.iter().zip(other).map(|(a, b)| a.check_close(b, tol)).collect()
    }
}

impl<T: CheckClose> CheckClose for Vec<T> {
    type Scalar = T::Scalar;

    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError<Self::Scalar>>
    { self[..].check_close(&other[..], tol) }
}

impl<T: CheckClose, const N: usize> CheckClose for [T; N] {
    type Scalar = T::Scalar;

    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError<Self::Scalar>>
    { self[..].check_close(&other[..], tol) }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn macro_output_can_compile() {
        assert_close!(1.0, 1.0);
        assert_close!(abs=1e-8, 1.0, 1.0);
        assert_close!(rel=1e-8, abs=1e-8, 1.0, 1.0);
        assert_close!(1.0, 1.0,);
        assert_close!(abs=1e-8, 1.0, 1.0, "{}", "hello");
        assert_close!(vec![1.0, 2.0], vec![1.0, 2.0 + 1e-12]);
        assert_close!([[0.0; 3]; 3], [[0.0; 3]; 3]);
    }

    #[test]
    #[should_panic]
    fn not_close() {
        assert_close!(abs=0.0, rel=0.0, 1.0, 1.1);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic)]
    fn debug_not_close() {
        debug_assert_close!(abs=0.0, rel=0.0, 1.0, 1.1);
    }

    #[test]
    fn asymmetric_rule() {
        let tol = Tolerances::default();
        assert!(is_close(0.0, 1e-9, tol));
        assert!(!is_close(0.0, 1e-7, tol));
        assert!(is_close(1e5 + 0.5, 1e5, tol));
        assert!(!is_close(std::f64::NAN, std::f64::NAN, tol));

        assert!(all_close(&[1.0, 2.0], &[1.0, 2.0 + 1e-9], tol));
        assert!(!all_close(&[1.0, 2.0], &[1.0], tol));
    }
}
