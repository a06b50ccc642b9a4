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

//! Miller and Miller-Bravais indices.
//!
//! Directions `[uvw]` and plane normals `(hkl)` are both integer triples, but
//! they transform differently under a change of basis: directions transform
//! like positions, while plane indices transform like reciprocal vectors.

use std::fmt;
use std::str::FromStr;

use num_integer::Integer;

use atomkit_array_types::{V3, M33};

use crate::{FailResult, Tol, reduce_by_gcd};

/// Crystallographic indices in either three- or four-index notation.
///
/// Whether they denote a direction or a plane is up to the consumer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Miller {
    Three([i32; 3]),
    Four([i32; 4]),
}

impl Miller {
    /// Interpret as a direction `[uvw]` or `[uvtw]`.
    pub fn direction(&self) -> FailResult<V3<i32>> {
        match *self {
            Miller::Three(uvw) => Ok(V3(uvw)),
            Miller::Four(uvtw) => vector4to3(uvtw),
        }
    }

    /// Interpret as a plane `(hkl)` or `(hkil)`.
    pub fn plane(&self) -> FailResult<V3<i32>> {
        match *self {
            Miller::Three(hkl) => Ok(V3(hkl)),
            Miller::Four(hkil) => plane4to3(hkil),
        }
    }

    pub fn is_four_index(&self) -> bool
    { match *self { Miller::Four(_) => true, Miller::Three(_) => false } }
}

impl From<[i32; 3]> for Miller {
    fn from(x: [i32; 3]) -> Self { Miller::Three(x) }
}

impl From<[i32; 4]> for Miller {
    fn from(x: [i32; 4]) -> Self { Miller::Four(x) }
}

impl fmt::Display for Miller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Miller::Three([a, b, c]) => write!(f, "{} {} {}", a, b, c),
            Miller::Four([a, b, c, d]) => write!(f, "{} {} {} {}", a, b, c, d),
        }
    }
}

/// Parses whitespace- or comma-separated integers, e.g. `"1 1 -2 0"`.
impl FromStr for Miller {
    type Err = failure::Error;

    fn from_str(s: &str) -> FailResult<Self> {
        let words = s.split(|c: char| c.is_whitespace() || c == ',').filter(|w| !w.is_empty());
        let values = words.map(|w| Ok(w.parse::<i32>()?)).collect::<FailResult<Vec<_>>>()?;
        match values[..] {
            [a, b, c] => Ok(Miller::Three([a, b, c])),
            [a, b, c, d] => Ok(Miller::Four([a, b, c, d])),
            _ => bail!("expected 3 or 4 indices, got {:?}", s),
        }
    }
}

/// Miller-Bravais direction `[uvtw]` to Miller `[UVW]` for a hexagonal cell.
///
/// This is `[u - t, v - t, w]`, which need not be in lowest terms.
/// Use [`reduce_by_gcd`] for that.
pub fn vector4to3([u, v, t, w]: [i32; 4]) -> FailResult<V3<i32>> {
    ensure!(t == -(u + v), "invalid Miller-Bravais direction [{} {} {} {}]: t != -(u + v)", u, v, t, w);
    Ok(V3([2 * u + v, 2 * v + u, w]))
}

/// Miller direction `[UVW]` to Miller-Bravais `[uvtw]` for a hexagonal cell.
///
/// The result is generally fractional; see [`reduce_indices`].
pub fn vector3to4(uvw: V3<i32>) -> [f64; 4] {
    let [u, v, w] = uvw.to_f64().0;
    [(2.0 * u - v) / 3.0, (2.0 * v - u) / 3.0, -(u + v) / 3.0, w]
}

/// Miller-Bravais plane `(hkil)` to Miller `(hkl)` for a hexagonal cell.
pub fn plane4to3([h, k, i, l]: [i32; 4]) -> FailResult<V3<i32>> {
    ensure!(i == -(h + k), "invalid Miller-Bravais plane ({} {} {} {}): i != -(h + k)", h, k, i, l);
    Ok(V3([h, k, l]))
}

/// Miller plane `(hkl)` to Miller-Bravais `(hkil)` for a hexagonal cell.
pub fn plane3to4(hkl: V3<i32>) -> [i32; 4] {
    let [h, k, l] = hkl.0;
    [h, k, -(h + k), l]
}

/// Scale fractional indices up to the smallest equivalent integer indices.
///
/// Handles denominators up to 12, which covers every conversion in this module.
pub fn reduce_indices(indices: &[f64]) -> FailResult<Vec<i32>> {
    for mult in 1..=12 {
        let attempt = indices.iter()
            .map(|&x| Tol(1e-6).unfloat(x * f64::from(mult)))
            .collect::<Result<Vec<_>, _>>();
        if let Ok(ints) = attempt {
            let gcd = ints.iter().fold(0, |acc, x| acc.gcd(x));
            return Ok(match gcd {
                0 => ints,
                gcd => ints.into_iter().map(|x| x / gcd).collect(),
            });
        }
    }
    bail!("could not reduce indices {:?} to integers", indices)
}

/// Lattice centering of a conventional cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Centering {
    /// Primitive.
    P,
    /// Face-centered.
    F,
    /// Body-centered.
    I,
    /// Side-centered on the `bc` face.
    A,
    /// Side-centered on the `ac` face.
    B,
    /// Side-centered on the `ab` face.
    C,
}

impl Default for Centering {
    fn default() -> Self { Centering::P }
}

impl FromStr for Centering {
    type Err = failure::Error;

    fn from_str(s: &str) -> FailResult<Self> {
        Ok(match &s.to_lowercase()[..] {
            "p" => Centering::P,
            "f" => Centering::F,
            "i" => Centering::I,
            "a" => Centering::A,
            "b" => Centering::B,
            "c" => Centering::C,
            _ => bail!("unknown lattice centering: {:?}", s),
        })
    }
}

impl Centering {
    /// Primitive lattice vectors (as rows) in units of the conventional ones.
    pub fn primitive_matrix(&self) -> M33 {
        M33::from(match *self {
            Centering::P => [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            Centering::F => [[0.0, 0.5, 0.5], [0.5, 0.0, 0.5], [0.5, 0.5, 0.0]],
            Centering::I => [[-0.5, 0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, -0.5]],
            Centering::A => [[1.0, 0.0, 0.0], [0.0, 0.5, 0.5], [0.0, -0.5, 0.5]],
            Centering::B => [[0.5, 0.0, 0.5], [0.0, 1.0, 0.0], [-0.5, 0.0, 0.5]],
            Centering::C => [[0.5, 0.5, 0.0], [-0.5, 0.5, 0.0], [0.0, 0.0, 1.0]],
        })
    }

    /// Plane indices in the conventional cell to plane indices in the primitive cell.
    pub fn plane_to_primitive(&self, hkl: V3<i32>) -> FailResult<V3<i32>> {
        let hkl = self.primitive_matrix() * hkl.to_f64();
        let ints = reduce_indices(&hkl.0)?;
        Ok(V3([ints[0], ints[1], ints[2]]))
    }

    /// Direction indices in the primitive cell to (possibly fractional)
    /// direction indices in the conventional cell.
    pub fn direction_to_conventional(&self, uvw: V3<i32>) -> V3 {
        uvw.to_f64() * self.primitive_matrix()
    }

    /// Direction indices in the conventional cell to direction indices in the
    /// primitive cell, in lowest terms.
    pub fn direction_to_primitive(&self, uvw: V3<i32>) -> FailResult<V3<i32>> {
        let uvw = uvw.to_f64() * self.primitive_matrix().inv();
        let ints = reduce_indices(&uvw.0)?;
        Ok(reduce_by_gcd(&V3([ints[0], ints[1], ints[2]])))
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn hexagonal_directions() {
        // <2 -1 -1 0> is the a1 axis
        let uvw = vector4to3([2, -1, -1, 0]).unwrap();
        assert_eq!(reduce_by_gcd(&uvw), V3([1, 0, 0]));
        assert_eq!(vector4to3([-1, 2, -1, 0]).unwrap(), V3([0, 3, 0]));
        // [u - t, v - t, w] exactly, with no extra factor
        assert_eq!(vector4to3([1, 1, -2, 1]).unwrap(), V3([3, 3, 1]));
        assert_eq!(vector4to3([2, -1, -1, 3]).unwrap(), V3([3, 0, 3]));
        assert!(vector4to3([1, 0, 0, 0]).is_err());

        let back = vector3to4(V3([1, 0, 0]));
        assert_eq!(reduce_indices(&back).unwrap(), vec![2, -1, -1, 0]);
        let back = vector3to4(V3([1, 1, 1]));
        assert_eq!(reduce_indices(&back).unwrap(), vec![1, 1, -2, 3]);
    }

    #[test]
    fn hexagonal_planes() {
        assert_eq!(plane4to3([1, 0, -1, 0]).unwrap(), V3([1, 0, 0]));
        assert!(plane4to3([1, 0, 0, 0]).is_err());
        assert_eq!(plane3to4(V3([1, 1, 2])), [1, 1, -2, 2]);
    }

    #[test]
    fn parse_and_untagged() {
        assert_eq!("1 1 -2 0".parse::<Miller>().unwrap(), Miller::Four([1, 1, -2, 0]));
        assert_eq!("1,1,1".parse::<Miller>().unwrap(), Miller::Three([1, 1, 1]));
        assert!("1 1".parse::<Miller>().is_err());
        assert!("1 x 1".parse::<Miller>().is_err());
        assert_eq!(Miller::Four([1, 0, -1, 0]).plane().unwrap(), V3([1, 0, 0]));
        assert_eq!(Miller::Three([1, 0, -1]).plane().unwrap(), V3([1, 0, -1]));
    }

    #[test]
    fn fcc_centering() {
        // (111) keeps its indices in both settings
        assert_eq!(Centering::F.plane_to_primitive(V3([1, 1, 1])).unwrap(), V3([1, 1, 1]));
        // the fcc (100) plane is the primitive (011)
        assert_eq!(Centering::F.plane_to_primitive(V3([1, 0, 0])).unwrap(), V3([0, 1, 1]));
        // primitive vector [100] is conventional [0 1/2 1/2]
        assert_eq!(Centering::F.direction_to_conventional(V3([1, 0, 0])), V3([0.0, 0.5, 0.5]));
        assert_eq!(Centering::F.direction_to_primitive(V3([0, 1, 1])).unwrap(), V3([1, 0, 0]));
        assert_eq!(Centering::I.direction_to_primitive(V3([0, 0, 1])).unwrap(), V3([1, 1, 0]));
        assert_eq!("c".parse::<Centering>().unwrap(), Centering::C);
    }
}
