//! # SGP4/SDP4 propagation
//!
//! Analytic propagation of mean element sets to a TEME inertial position and velocity.
//!
//! The propagator is split in three layers:
//!
//! - [`near_earth`] – Kozai/Brouwer conversion, J2–J4 secular rates and the drag polynomial,
//!   shared by every orbit,
//! - [`deep_space`] – lunar-solar secular rates and periodics, plus the 12 h and 24 h
//!   geopotential resonances, switched on for periods of 225 minutes or more,
//! - [`kepler`] – the equinoctial Kepler solve and the short-period J2 corrections, done here.
//!
//! Coefficients are computed once per element set by [`Sgp4Coefficients::new`] and never
//! mutated afterwards: [`propagate`] is a pure function of the elements and the target time,
//! so a catalog can be propagated from several threads with bit-identical results.
//!
//! ## Failures
//!
//! An evaluation fails with [`PropagationError::Decayed`] when the model leaves its physical
//! domain (non-positive mean motion, eccentricity out of range, negative semi-latus rectum,
//! radius below the Earth surface) and with [`PropagationError::Diverged`] when the Kepler
//! solve does not converge or the state is not finite.
//!
//! ## See also
//! ------------
//! * [`OrbitalElements::propagate`](crate::elements::OrbitalElements::propagate) – convenience entry point.
//! * [`ref_system`](crate::ref_system) – from the inertial state to look angles.

pub(crate) mod deep_space;
pub(crate) mod kepler;
pub(crate) mod near_earth;

use hifitime::Epoch;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::constants::{GravConst, GravityModel, Kilometer, Minute, OpsMode, Radian, DPI};
use crate::elements::{MeanElements, OrbitalElements};
use crate::propagator::deep_space::{DeepSpaceCoefficients, Perturbed, Resonance};
use crate::propagator::kepler::{solve_kepler_equinoctial, KEPLER_MAX_ITER};
use crate::propagator::near_earth::{long_period_xlcof, NearEarthCoefficients};
use crate::skypass_errors::{DecayCause, PropagationError};
use crate::time::{gstime, julian_date, minutes_between};

/// Gravity model and operation mode of the propagator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PropagationModel {
    pub gravity: GravityModel,
    pub ops_mode: OpsMode,
}

/// Geopotential resonance class of a deep-space orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResonanceClass {
    None,
    /// Geosynchronous, about one revolution per day
    Synchronous,
    /// Twelve-hour eccentric orbit
    HalfDay,
}

/// Precomputed, immutable propagation coefficients of one element set.
#[derive(Debug, Clone, PartialEq)]
pub struct Sgp4Coefficients {
    near: NearEarthCoefficients,
    deep: Option<DeepSpaceCoefficients>,
    grav: GravConst,
    model: PropagationModel,
}

/// Inertial (TEME) state of an object at a given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertialState {
    /// Position, km
    pub position: Vector3<f64>,
    /// Velocity, km/s
    pub velocity: Vector3<f64>,
    pub epoch: Epoch,
    pub minutes_since_epoch: Minute,
    /// Greenwich mean sidereal time at `epoch`
    pub gmst: Radian,
}

impl Sgp4Coefficients {
    /// Initialize the propagator for a set of mean elements.
    pub fn new(mean: &MeanElements, model: PropagationModel) -> Self {
        let grav = model.gravity.constants();
        let (near, ctx) = near_earth::initialize(mean, &grav, model.ops_mode);
        let deep = ctx
            .deep_space
            .then(|| deep_space::initialize(mean, &near, &ctx, grav.xke));

        Sgp4Coefficients {
            near,
            deep,
            grav,
            model,
        }
    }

    pub fn model(&self) -> PropagationModel {
        self.model
    }

    /// True when the lunar-solar terms are active (period ≥ 225 min).
    pub fn is_deep_space(&self) -> bool {
        self.deep.is_some()
    }

    pub fn resonance(&self) -> ResonanceClass {
        match self.deep.map(|d| d.resonance) {
            Some(Resonance::Synchronous { .. }) => ResonanceClass::Synchronous,
            Some(Resonance::HalfDay { .. }) => ResonanceClass::HalfDay,
            _ => ResonanceClass::None,
        }
    }

    /// Greenwich sidereal time at the element epoch.
    pub fn gsto(&self) -> Radian {
        self.near.gsto
    }

    /// Brouwer mean semi-major axis, km.
    pub fn semi_major_axis(&self) -> Kilometer {
        self.near.a * self.grav.radius
    }

    /// Anomalistic period from the Brouwer mean motion, minutes.
    pub fn period(&self) -> Minute {
        DPI / self.near.no_unkozai
    }

    /// Evaluate the model `t` minutes from epoch.
    ///
    /// Return
    /// ------
    /// * TEME position (km) and velocity (km/s).
    pub(crate) fn sgp4(
        &self,
        mean: &MeanElements,
        t: Minute,
    ) -> Result<(Vector3<f64>, Vector3<f64>), PropagationError> {
        let decayed = |cause| PropagationError::Decayed { minutes: t, cause };
        let diverged = |iterations| PropagationError::Diverged {
            minutes: t,
            iterations,
        };
        if !t.is_finite() {
            return Err(diverged(0));
        }

        let grav = &self.grav;
        let near = &self.near;
        let sec = near.secular(mean, t);

        let (mut em, inclm, mut argpm, mut nodem, mut mm, mut nm) = match &self.deep {
            Some(deep) => {
                let d = deep.secular(mean, near, sec.arg_perigee, sec.raan, sec.mean_anomaly, t);
                (
                    d.eccentricity,
                    d.inclination,
                    d.arg_perigee,
                    d.raan,
                    d.mean_anomaly,
                    d.mean_motion,
                )
            }
            None => (
                mean.eccentricity,
                mean.inclination,
                sec.arg_perigee,
                sec.raan,
                sec.mean_anomaly,
                near.no_unkozai,
            ),
        };

        if nm <= 0.0 {
            return Err(decayed(DecayCause::MeanMotion(nm)));
        }
        let am = (grav.xke / nm).powf(crate::constants::X2O3) * sec.tempa * sec.tempa;
        nm = grav.xke / am.powf(1.5);
        em -= sec.tempe;

        if !(-0.001..1.0).contains(&em) {
            return Err(decayed(DecayCause::MeanEccentricity(em)));
        }
        if em < 1.0e-6 {
            em = 1.0e-6;
        }
        mm += near.no_unkozai * sec.templ;
        let xlm = mm + argpm + nodem;

        nodem %= DPI;
        argpm %= DPI;
        let xlm = xlm % DPI;
        mm = (xlm - argpm - nodem) % DPI;

        let mut ep = em;
        let mut xincp = inclm;
        let mut argpp = argpm;
        let mut nodep = nodem;
        let mut mp = mm;
        let (mut aycof, mut xlcof) = (near.aycof, near.xlcof);
        let (mut con41, mut x1mth2, mut x7thm1) = (near.con41, near.x1mth2, near.x7thm1);

        if let Some(deep) = &self.deep {
            let p = deep.periodics(
                t,
                Perturbed {
                    eccentricity: ep,
                    inclination: xincp,
                    raan: nodep,
                    arg_perigee: argpp,
                    mean_anomaly: mp,
                },
                self.model.ops_mode,
            );
            ep = p.eccentricity;
            xincp = p.inclination;
            nodep = p.raan;
            argpp = p.arg_perigee;
            mp = p.mean_anomaly;

            if xincp < 0.0 {
                xincp = -xincp;
                nodep += PI;
                argpp -= PI;
            }
            if !(0.0..=1.0).contains(&ep) {
                return Err(decayed(DecayCause::PerturbedEccentricity(ep)));
            }

            let (sinip, cosip) = xincp.sin_cos();
            aycof = -0.5 * grav.j3oj2 * sinip;
            xlcof = long_period_xlcof(grav.j3oj2, sinip, cosip);
            let cosisq = cosip * cosip;
            con41 = 3.0 * cosisq - 1.0;
            x1mth2 = 1.0 - cosisq;
            x7thm1 = 7.0 * cosisq - 1.0;
        }
        let (sinip, cosip) = xincp.sin_cos();

        // Long-period periodics
        let axnl = ep * argpp.cos();
        let temp = 1.0 / (am * (1.0 - ep * ep));
        let aynl = ep * argpp.sin() + temp * aycof;
        let xl = mp + argpp + nodep + temp * xlcof * axnl;

        let u = (xl - nodep) % DPI;
        let kepler =
            solve_kepler_equinoctial(u, axnl, aynl).ok_or_else(|| diverged(KEPLER_MAX_ITER))?;
        let (sineo1, coseo1) = (kepler.sin_e, kepler.cos_e);

        // Short-period preliminary quantities
        let ecose = axnl * coseo1 + aynl * sineo1;
        let esine = axnl * sineo1 - aynl * coseo1;
        let el2 = axnl * axnl + aynl * aynl;
        let pl = am * (1.0 - el2);
        if pl < 0.0 {
            return Err(decayed(DecayCause::SemiLatusRectum(pl)));
        }

        let rl = am * (1.0 - ecose);
        let rdotl = am.sqrt() * esine / rl;
        let rvdotl = pl.sqrt() / rl;
        let betal = (1.0 - el2).sqrt();
        let temp = esine / (1.0 + betal);
        let sinu = am / rl * (sineo1 - aynl - axnl * temp);
        let cosu = am / rl * (coseo1 - axnl + aynl * temp);
        let su = sinu.atan2(cosu);
        let sin2u = (cosu + cosu) * sinu;
        let cos2u = 1.0 - 2.0 * sinu * sinu;
        let temp = 1.0 / pl;
        let temp1 = 0.5 * grav.j2 * temp;
        let temp2 = temp1 * temp;

        // Short-period J2 update
        let mrt = rl * (1.0 - 1.5 * temp2 * betal * con41) + 0.5 * temp1 * x1mth2 * cos2u;
        let su = su - 0.25 * temp2 * x7thm1 * sin2u;
        let xnode = nodep + 1.5 * temp2 * cosip * sin2u;
        let xinc = xincp + 1.5 * temp2 * cosip * sinip * cos2u;
        let mvt = rdotl - nm * temp1 * x1mth2 * sin2u / grav.xke;
        let rvdot = rvdotl + nm * temp1 * (x1mth2 * cos2u + 1.5 * con41) / grav.xke;

        let (sinsu, cossu) = su.sin_cos();
        let (snod, cnod) = xnode.sin_cos();
        let (sini, cosi) = xinc.sin_cos();
        let xmx = -snod * cosi;
        let xmy = cnod * cosi;
        let ux = Vector3::new(xmx * sinsu + cnod * cossu, xmy * sinsu + snod * cossu, sini * sinsu);
        let vx = Vector3::new(xmx * cossu - cnod * sinsu, xmy * cossu - snod * sinsu, sini * cossu);

        if mrt < 1.0 {
            return Err(decayed(DecayCause::SubSurface(mrt)));
        }

        let vkmpersec = grav.radius * grav.xke / 60.0;
        let position = ux * (mrt * grav.radius);
        let velocity = (ux * mvt + vx * rvdot) * vkmpersec;

        if !position.iter().chain(velocity.iter()).all(|c| c.is_finite()) {
            return Err(diverged(kepler.iterations));
        }
        Ok((position, velocity))
    }
}

/// Propagate an element set to a UTC instant.
///
/// Arguments
/// ---------
/// * `elements`: decoded element set with its precomputed coefficients.
/// * `at`: target instant; may be before the element epoch.
///
/// Return
/// ------
/// * The TEME [`InertialState`], or the [`PropagationError`] raised by the model.
pub fn propagate(elements: &OrbitalElements, at: &Epoch) -> Result<InertialState, PropagationError> {
    let t = minutes_between(&elements.mean.epoch, at);
    let (position, velocity) = elements.coefficients.sgp4(&elements.mean, t)?;

    Ok(InertialState {
        position,
        velocity,
        epoch: *at,
        minutes_since_epoch: t,
        gmst: gstime(julian_date(at)),
    })
}

/// Propagate an element set `t` minutes from its epoch.
pub fn propagate_minutes(
    elements: &OrbitalElements,
    t: Minute,
) -> Result<(Vector3<f64>, Vector3<f64>), PropagationError> {
    elements.coefficients.sgp4(&elements.mean, t)
}
