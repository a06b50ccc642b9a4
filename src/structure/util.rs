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

use num_integer::Integer;

use atomkit_array_types::{V3, M33};

use crate::IntPrecisionError;

// these f64 -> i32 conversions are written on a silly little type
// simply to avoid having a function with a signature like 'fn f(x: f64, tol: f64)'
// where the arguments could be swapped
#[derive(Debug, Copy, Clone)]
pub struct Tol(pub f64);

impl Tol {
    pub fn unfloat(&self, x: f64) -> Result<i32, IntPrecisionError>
    {Ok({
        let r = x.round();
        if !((r - x).abs() <= self.0) {
            return Err(IntPrecisionError {
                backtrace: failure::Backtrace::new(),
                value: x,
            });
        }
        r as i32
    })}

    pub fn unfloat_v3(&self, v: &V3) -> Result<V3<i32>, IntPrecisionError>
    { v.try_map(|x| self.unfloat(x)) }

    pub fn unfloat_m33(&self, m: &M33) -> Result<M33<i32>, IntPrecisionError>
    { m.try_map(|x| self.unfloat(x)) }
}

/// Greatest common divisor of all three components (always non-negative).
///
/// This is zero only for the zero vector.
pub fn gcd3(v: &V3<i32>) -> i32
{ v[0].gcd(&v[1]).gcd(&v[2]) }

/// Divide out the common factor of all three components.
///
/// The zero vector is returned unchanged.
pub fn reduce_by_gcd(v: &V3<i32>) -> V3<i32> {
    match gcd3(v) {
        0 => *v,
        g => v.map(|x| x / g),
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn unfloat() {
        assert_eq!(Tol(1e-8).unfloat(3.0 + 1e-10).unwrap(), 3);
        assert_eq!(Tol(1e-8).unfloat(-2.0 - 1e-10).unwrap(), -2);
        assert!(Tol(1e-8).unfloat(2.5).is_err());
        assert!(Tol(1e-8).unfloat(std::f64::NAN).is_err());
        assert_eq!(
            Tol(1e-8).unfloat_v3(&V3([1.0, -0.0, 2.0 - 1e-12])).unwrap(),
            V3([1, 0, 2]),
        );
    }

    #[test]
    fn gcd_reduction() {
        assert_eq!(gcd3(&V3([2, -4, 6])), 2);
        assert_eq!(gcd3(&V3([0, 0, -3])), 3);
        assert_eq!(reduce_by_gcd(&V3([2, -4, 6])), V3([1, -2, 3]));
        assert_eq!(reduce_by_gcd(&V3([-3, 0, 0])), V3([-1, 0, 0]));
        assert_eq!(reduce_by_gcd(&V3([0, 0, 0])), V3([0, 0, 0]));
        // not pairwise: 6, 10, 15 share no common factor even though every pair does
        assert_eq!(reduce_by_gcd(&V3([6, 10, 15])), V3([6, 10, 15]));
    }
}
