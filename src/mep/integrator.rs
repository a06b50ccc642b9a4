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

use crate::{FailResult, Never};

use std::str::FromStr;

/// A fixed-step integration scheme.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Integrator {
    RungeKutta,
}

impl Default for Integrator {
    fn default() -> Self { Integrator::RungeKutta }
}

impl FromStr for Integrator {
    type Err = failure::Error;

    fn from_str(s: &str) -> FailResult<Self> {
        match s {
            "rk" | "rungekutta" | "runge-kutta" => Ok(Integrator::RungeKutta),
            _ => bail!("unknown integrator: {:?}", s),
        }
    }
}

impl Integrator {
    /// Advance `coord` by one timestep.
    pub fn step(
        self,
        rate_fn: impl FnMut(&[f64]) -> Vec<f64>,
        coord: &[f64],
        timestep: f64,
    ) -> Vec<f64> {
        match self {
            Integrator::RungeKutta => rungekutta(rate_fn, coord, timestep),
        }
    }
}

/// One fourth-order Runge-Kutta step.
///
/// ```text
/// k1 = dt * f(x)
/// k2 = dt * f(x - k1 / 2)
/// k3 = dt * f(x - k2 / 2)
/// k4 = dt * f(x - k3)
/// x' = x + k1 / 6 + k2 / 3 + k3 / 3 + k4 / 6
/// ```
///
/// The intermediate stages are taken *against* the rate.  For relaxation,
/// `f` is typically the energy gradient, so the stages probe uphill of `x`.
///
/// # Panics
/// Panics if `rate_fn` returns a vector of the wrong length.
pub fn rungekutta(
    mut rate_fn: impl FnMut(&[f64]) -> Vec<f64>,
    coord: &[f64],
    timestep: f64,
) -> Vec<f64> {
    try_rungekutta::<Never, _>(|x| Ok(rate_fn(x)), coord, timestep)
        .unwrap_or_else(|e| match e {})
}

/// `rungekutta` for rate functions that can fail.
pub fn try_rungekutta<E, F>(
    mut rate_fn: F,
    coord: &[f64],
    timestep: f64,
) -> Result<Vec<f64>, E>
where
    F: FnMut(&[f64]) -> Result<Vec<f64>, E>,
{
    let mut stage = |x: &[f64]| -> Result<Vec<f64>, E> {
        let rate = rate_fn(x)?;
        assert_eq!(rate.len(), x.len(), "rate function returned the wrong length");
        Ok(rate.into_iter().map(|r| timestep * r).collect())
    };
    let offset = |k: &[f64], scale: f64| -> Vec<f64> {
        izip!(coord, k).map(|(&x, &k)| x - scale * k).collect()
    };

    let k1 = stage(coord)?;
    let k2 = stage(&offset(&k1, 0.5))?;
    let k3 = stage(&offset(&k2, 0.5))?;
    let k4 = stage(&offset(&k3, 1.0))?;

    Ok({
        izip!(coord, &k1, &k2, &k3, &k4)
            .map(|(&x, &k1, &k2, &k3, &k4)| x + k1 / 6.0 + k2 / 3.0 + k3 / 3.0 + k4 / 6.0)
            .collect()
    })
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn constant_rate() {
        let out = rungekutta(|_| vec![1.0, -2.0], &[0.5, 0.5], 0.25);
        assert_close!(abs=1e-12, out, vec![0.75, 0.0]);
    }

    #[test]
    fn linear_rate() {
        // k = [0.1, 0.095, 0.09525, 0.090475]
        let out = rungekutta(|x| x.to_vec(), &[1.0], 0.1);
        assert_close!(rel=1e-12, out[0], 1.0951625);

        let out = Integrator::RungeKutta.step(|x| x.to_vec(), &[2.0], 0.1);
        assert_close!(rel=1e-12, out[0], 2.0 * 1.0951625);
    }

    #[test]
    fn stages_are_evaluated_in_order() {
        let mut seen = vec![];
        let _ = rungekutta(|x| { seen.push(x[0]); vec![1.0] }, &[0.0], 1.0);
        assert_eq!(seen, vec![0.0, -0.5, -0.5, -1.0]);
    }

    #[test]
    fn failing_rate() {
        let mut calls = 0;
        let result = try_rungekutta(|x| {
            calls += 1;
            match calls {
                3 => Err("boom"),
                _ => Ok(x.to_vec()),
            }
        }, &[1.0], 0.1);
        assert_eq!(result, Err("boom"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn names() {
        assert_eq!("rk".parse::<Integrator>().unwrap(), Integrator::RungeKutta);
        assert!("verlet".parse::<Integrator>().is_err());
    }
}
