use crate::{V3, M33, Envee, Unvee};

#[test]
fn multiplication_order() {
    // matrices that don't commute
    let a = M33::from([
        [2.0, 2.0, 0.0],
        [0.0, 4.0, 0.0],
        [0.0, 0.0, 2.0],
    ]);
    let b = M33::from([
        [0.0, 1.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0],
    ]);

    assert_eq!(&a * &b, M33::from([
        [2.0, 2.0, 0.0],
        [4.0, 0.0, 0.0],
        [0.0, 0.0, 2.0],
    ]));
    assert_eq!(&b * &a, M33::from([
        [0.0, 4.0, 0.0],
        [2.0, 2.0, 0.0],
        [0.0, 0.0, 2.0],
    ]));

    // row vector vs column vector
    let v = V3([1.0, 2.0, 3.0]);
    assert_eq!(v * &a, V3([2.0, 10.0, 6.0]));
    assert_eq!(&a * v, V3([6.0, 8.0, 6.0]));
}

#[test]
fn get_inverse() {
    // matrix whose inverse should be able to be computed exactly
    // by any reasonable matrix inversion algorithm working on f64s
    let matrix = M33::from([
        [2.0, 2.0, 0.0],
        [0.0, 4.0, 0.0],
        [0.0, 0.0, 2.0],
    ]);
    let exact_inverse = M33::from([
        [0.5, -0.25, 0.0],
        [0.0,  0.25, 0.0],
        [0.0,   0.0, 0.5],
    ]);
    assert_eq!(matrix.inv(), exact_inverse);
    assert_eq!(&matrix * &exact_inverse, M33::eye());
}

#[test]
fn inverse_of_skewed_matrix() {
    let matrix = M33::from([
        [3.0, 0.0, 0.0],
        [1.5, 2.598076211353316, 0.0],
        [0.3, -0.7, 5.0],
    ]);
    assert_close!(abs=1e-12, &matrix * &matrix.inv(), M33::eye());
    assert_close!(abs=1e-12, &matrix.inv() * &matrix, M33::eye());
}

#[test]
fn integer_algebra() {
    let m = M33::from([
        [1, 1, 0],
        [-1, 1, 0],
        [0, 0, 1],
    ]);
    assert_eq!(m.det(), 2);
    assert_eq!(V3([1, 0, 0]).cross(&V3([0, 1, 0])), V3([0, 0, 1]));
    assert_eq!(V3([1, 2, 3]) * &m, V3([-1, 3, 3]));
    assert_eq!(m.to_f64().det(), 2.0);
}

#[test]
fn angles_and_norms() {
    let x = V3([2.0, 0.0, 0.0]);
    let y = V3([0.0, 3.0, 0.0]);
    assert_eq!(x.norm(), 2.0);
    assert_eq!(x.unit(), V3([1.0, 0.0, 0.0]));
    assert_close!(x.angle_to(&y), std::f64::consts::FRAC_PI_2);
    assert_close!(x.angle_to(&-x), std::f64::consts::PI);
    // rounding error in the argument of acos must not produce NaN
    let v = V3([0.1, 0.2, 0.3]);
    let angle = v.angle_to(&(v * 3.0));
    assert!(!angle.is_nan());
    assert_close!(abs=1e-7, angle, 0.0);
}

#[test]
fn conversions() {
    let arrs = vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
    let vs = arrs.clone().envee();
    assert_eq!(vs[1], V3([4.0, 5.0, 6.0]));
    assert_eq!(vs.unvee(), arrs);

    let m = [[1, 2, 3], [4, 5, 6], [7, 8, 10]].envee();
    assert_eq!(m.t().col(0), V3([1, 2, 3]));
    assert_eq!(m.unvee()[2], [7, 8, 10]);
}
