use crate::constants::Radian;

/// Convergence threshold on the eccentric longitude correction.
const KEPLER_EPS: f64 = 1e-12;

/// Iteration cap of the Newton solve; past it the propagation is reported as diverged.
pub(crate) const KEPLER_MAX_ITER: usize = 20;

/// Largest Newton step allowed in one iteration, in radians.
const MAX_STEP: f64 = 0.95;

/// Solution of the equinoctial Kepler equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct KeplerSolution {
    pub eccentric_longitude: Radian,
    /// sin/cos of the last iterate used to compute the converged correction
    pub sin_e: f64,
    pub cos_e: f64,
    pub iterations: usize,
}

/// Solve `u = E − axn·sin E + ayn·cos E` for the eccentric longitude `E`.
///
/// Arguments
/// ---------
/// * `u`: mean longitude minus node, radians.
/// * `axn`, `ayn`: equinoctial eccentricity components (`e·cos ω`, `e·sin ω` plus the long-period
///   correction).
///
/// Return
/// ------
/// * `Some(KeplerSolution)` when the Newton correction falls below `1e-12`,
///   `None` when [`KEPLER_MAX_ITER`] iterations were not enough.
pub(crate) fn solve_kepler_equinoctial(u: Radian, axn: f64, ayn: f64) -> Option<KeplerSolution> {
    let mut e = u;

    for iteration in 1..=KEPLER_MAX_ITER {
        let (sin_e, cos_e) = e.sin_cos();
        let mut step = (u - ayn * cos_e + axn * sin_e - e) / (1.0 - cos_e * axn - sin_e * ayn);
        if step.abs() >= MAX_STEP {
            step = MAX_STEP.copysign(step);
        }
        e += step;

        if step.abs() < KEPLER_EPS {
            return Some(KeplerSolution {
                eccentric_longitude: e,
                sin_e,
                cos_e,
                iterations: iteration,
            });
        }
    }
    None
}
