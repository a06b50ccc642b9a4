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

use std::ops::{Add, Sub, Neg, Mul, Div};
use std::ops::{AddAssign, SubAssign, MulAssign, DivAssign};

use crate::types::{V3, M3, M33};

// NOTE: Operator impls are only provided between same-typed operands
//       for the two scalar types we actually use (f64 and i32).
//       Everything here is Copy, so the by-reference forms just copy
//       and defer to the by-value form.
macro_rules! impl_binop {
    ($Trait:ident, $method:ident, $Lhs:ty, $Rhs:ty, $Out:ty, |$a:ident, $b:ident| $body:expr) => {
        impl $Trait<$Rhs> for $Lhs {
            type Output = $Out;

            #[inline]
            fn $method(self, $b: $Rhs) -> $Out
            { let $a = self; $body }
        }

        impl<'b> $Trait<&'b $Rhs> for $Lhs {
            type Output = $Out;

            #[inline]
            fn $method(self, b: &'b $Rhs) -> $Out
            { $Trait::$method(self, *b) }
        }

        impl<'a> $Trait<$Rhs> for &'a $Lhs {
            type Output = $Out;

            #[inline]
            fn $method(self, b: $Rhs) -> $Out
            { $Trait::$method(*self, b) }
        }

        impl<'a, 'b> $Trait<&'b $Rhs> for &'a $Lhs {
            type Output = $Out;

            #[inline]
            fn $method(self, b: &'b $Rhs) -> $Out
            { $Trait::$method(*self, *b) }
        }
    };
}

macro_rules! impl_assign {
    ($Trait:ident, $method:ident, $Lhs:ty, $Rhs:ty, $op:tt) => {
        impl $Trait<$Rhs> for $Lhs {
            #[inline]
            fn $method(&mut self, b: $Rhs)
            { *self = *self $op b; }
        }

        impl<'b> $Trait<&'b $Rhs> for $Lhs {
            #[inline]
            fn $method(&mut self, b: &'b $Rhs)
            { *self = *self $op *b; }
        }
    };
}

macro_rules! impl_ring_ops {
    ($X:ty) => {
        // vector-vector
        impl_binop!(Add, add, V3<$X>, V3<$X>, V3<$X>, |a, b| V3::from_fn(|k| a[k] + b[k]));
        impl_binop!(Sub, sub, V3<$X>, V3<$X>, V3<$X>, |a, b| V3::from_fn(|k| a[k] - b[k]));

        // vector-scalar
        impl_binop!(Mul, mul, V3<$X>, $X, V3<$X>, |a, b| a.map(|x| x * b));
        impl_binop!(Mul, mul, $X, V3<$X>, V3<$X>, |a, b| b.map(|x| a * x));

        // matrix * column
        impl_binop!(Mul, mul, M33<$X>, V3<$X>, V3<$X>, |m, v| V3::from_fn(|r| m[r].dot(&v)));
        // row * matrix
        impl_binop!(Mul, mul, V3<$X>, M33<$X>, V3<$X>, |v, m| {
            V3::from_fn(|c| v[0] * m[0][c] + v[1] * m[1][c] + v[2] * m[2][c])
        });
        // matrix * matrix
        impl_binop!(Mul, mul, M33<$X>, M33<$X>, M33<$X>, |a, b| M3(a.0.map(|row| row * b)));

        // matrix-matrix, matrix-scalar
        impl_binop!(Add, add, M33<$X>, M33<$X>, M33<$X>, |a, b| M3([a[0] + b[0], a[1] + b[1], a[2] + b[2]]));
        impl_binop!(Sub, sub, M33<$X>, M33<$X>, M33<$X>, |a, b| M3([a[0] - b[0], a[1] - b[1], a[2] - b[2]]));
        impl_binop!(Mul, mul, M33<$X>, $X, M33<$X>, |a, b| a.map(|x| x * b));

        impl Neg for V3<$X> {
            type Output = V3<$X>;

            #[inline]
            fn neg(self) -> V3<$X>
            { self.map(|x| -x) }
        }

        impl<'a> Neg for &'a V3<$X> {
            type Output = V3<$X>;

            #[inline]
            fn neg(self) -> V3<$X>
            { -*self }
        }

        impl Neg for M33<$X> {
            type Output = M33<$X>;

            #[inline]
            fn neg(self) -> M33<$X>
            { self.map(|x| -x) }
        }

        impl_assign!(AddAssign, add_assign, V3<$X>, V3<$X>, +);
        impl_assign!(SubAssign, sub_assign, V3<$X>, V3<$X>, -);
        impl_assign!(MulAssign, mul_assign, V3<$X>, $X, *);
    };
}

impl_ring_ops!(f64);
impl_ring_ops!(i32);

// division only makes sense for floats
impl_binop!(Div, div, V3<f64>, f64, V3<f64>, |a, b| a.map(|x| x / b));
impl_binop!(Div, div, M33<f64>, f64, M33<f64>, |a, b| a.map(|x| x / b));
impl_assign!(DivAssign, div_assign, V3<f64>, f64, /);
