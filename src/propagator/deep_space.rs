//! # Deep-space (SDP4) terms
//!
//! Orbits with a period of 225 minutes or more feel the Sun and the Moon, and the 12 h and
//! 24 h orbits additionally resonate with the tesseral harmonics of the geopotential. This
//! module derives, once per element set, the lunar-solar secular rates, the coefficients of
//! the lunar-solar long-period periodics and the resonance terms, and evaluates them at a
//! time since epoch.
//!
//! ## Purity
//!
//! The resonance terms are integrated numerically with a fixed 720-minute step. Each call
//! restarts the integration at epoch instead of caching the last integrator state, so
//! propagation stays a pure function of `(elements, t)` and can be shared across threads.
//!
//! ## See also
//! ------------
//! * [`near_earth`](super::near_earth) – secular and drag coefficients shared by all orbits.

use std::f64::consts::PI;

use crate::constants::{Minute, OpsMode, Radian, DPI, X2O3};
use crate::elements::MeanElements;
use crate::propagator::near_earth::{InitContext, NearEarthCoefficients};

// Solar and lunar mean motions (rad/min) and eccentricities
const ZNS: f64 = 1.19459e-5;
const ZES: f64 = 0.01675;
const ZNL: f64 = 1.583_521_8e-4;
const ZEL: f64 = 0.05490;

// Earth rotation rate, rad/min
const RPTIM: f64 = 4.375_269_088_011_299_66e-3;

// Resonance integrator
const STEP: Minute = 720.0;
const STEP2: f64 = 259_200.0;

/// Inclination (rad) under which the node terms are dropped.
const NEAR_EQUATORIAL: Radian = 5.235_987_7e-2;

/// Lyddane switch: below this perturbed inclination the periodics use the equinoctial form.
const LYDDANE_INCLINATION: Radian = 0.2;

/// Secular rates and short-period sensitivity of one perturbing body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct BodyTerms {
    s1: f64,
    s2: f64,
    s3: f64,
    s4: f64,
    s5: f64,
    s6: f64,
    s7: f64,
    z1: f64,
    z2: f64,
    z3: f64,
    z11: f64,
    z12: f64,
    z13: f64,
    z21: f64,
    z22: f64,
    z23: f64,
    z31: f64,
    z32: f64,
    z33: f64,
}

/// Orientation of the perturbing body's orbit relative to the equator.
#[derive(Debug, Clone, Copy)]
struct BodyOrientation {
    cos_g: f64,
    sin_g: f64,
    cos_i: f64,
    sin_i: f64,
    cos_h: f64,
    sin_h: f64,
    /// Body constant (C1 of the Sun or of the Moon)
    cc: f64,
}

/// Quantities of the satellite orbit at epoch used by both bodies.
#[derive(Debug, Clone, Copy)]
struct OrbitTrig {
    sinim: f64,
    cosim: f64,
    sinomm: f64,
    cosomm: f64,
    em: f64,
    emsq: f64,
    betasq: f64,
    rtemsq: f64,
    xnoi: f64,
}

fn body_terms(body: &BodyOrientation, orbit: &OrbitTrig) -> BodyTerms {
    let (zcosg, zsing) = (body.cos_g, body.sin_g);
    let (zcosi, zsini) = (body.cos_i, body.sin_i);
    let (zcosh, zsinh) = (body.cos_h, body.sin_h);
    let (sinim, cosim) = (orbit.sinim, orbit.cosim);
    let (sinomm, cosomm) = (orbit.sinomm, orbit.cosomm);
    let emsq = orbit.emsq;

    let a1 = zcosg * zcosh + zsing * zcosi * zsinh;
    let a3 = -zsing * zcosh + zcosg * zcosi * zsinh;
    let a7 = -zcosg * zsinh + zsing * zcosi * zcosh;
    let a8 = zsing * zsini;
    let a9 = zsing * zsinh + zcosg * zcosi * zcosh;
    let a10 = zcosg * zsini;
    let a2 = cosim * a7 + sinim * a8;
    let a4 = cosim * a9 + sinim * a10;
    let a5 = -sinim * a7 + cosim * a8;
    let a6 = -sinim * a9 + cosim * a10;

    let x1 = a1 * cosomm + a2 * sinomm;
    let x2 = a3 * cosomm + a4 * sinomm;
    let x3 = -a1 * sinomm + a2 * cosomm;
    let x4 = -a3 * sinomm + a4 * cosomm;
    let x5 = a5 * sinomm;
    let x6 = a6 * sinomm;
    let x7 = a5 * cosomm;
    let x8 = a6 * cosomm;

    let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
    let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
    let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
    let z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * emsq;
    let z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * emsq;
    let z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * emsq;
    let z11 = -6.0 * a1 * a5 + emsq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
    let z12 = -6.0 * (a1 * a6 + a3 * a5)
        + emsq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
    let z13 = -6.0 * a3 * a6 + emsq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
    let z21 = 6.0 * a2 * a5 + emsq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
    let z22 = 6.0 * (a4 * a5 + a2 * a6)
        + emsq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
    let z23 = 6.0 * a4 * a6 + emsq * (24.0 * x2 * x6 - 6.0 * x4 * x8);

    let s3 = body.cc * orbit.xnoi;
    let s2 = -0.5 * s3 / orbit.rtemsq;
    let s4 = s3 * orbit.rtemsq;

    BodyTerms {
        s1: -15.0 * orbit.em * s4,
        s2,
        s3,
        s4,
        s5: x1 * x3 + x2 * x4,
        s6: x2 * x3 + x1 * x4,
        s7: x2 * x4 - x1 * x3,
        z1: z1 + z1 + orbit.betasq * z31,
        z2: z2 + z2 + orbit.betasq * z32,
        z3: z3 + z3 + orbit.betasq * z33,
        z11,
        z12,
        z13,
        z21,
        z22,
        z23,
        z31,
        z32,
        z33,
    }
}

/// Long-period periodic coefficients of one body.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BodyPeriodics {
    /// Mean anomaly of the body at epoch
    zm0: Radian,
    /// Mean motion of the body, rad/min
    zn: f64,
    /// Eccentricity of the body's orbit
    ze: f64,
    e2: f64,
    e3: f64,
    i2: f64,
    i3: f64,
    l2: f64,
    l3: f64,
    l4: f64,
    gh2: f64,
    gh3: f64,
    gh4: f64,
    h2: f64,
    h3: f64,
}

/// Periodic offsets (Δe, Δi, ΔM, Δω, ΔΩ-like) of one body at a given time.
#[derive(Debug, Clone, Copy, Default)]
struct PeriodicOffsets {
    pe: f64,
    pinc: f64,
    pl: f64,
    pgh: f64,
    ph: f64,
}

impl BodyPeriodics {
    fn new(terms: &BodyTerms, emsq: f64, zm0: Radian, zn: f64, ze: f64) -> Self {
        let t = terms;
        BodyPeriodics {
            zm0,
            zn,
            ze,
            e2: 2.0 * t.s1 * t.s6,
            e3: 2.0 * t.s1 * t.s7,
            i2: 2.0 * t.s2 * t.z12,
            i3: 2.0 * t.s2 * (t.z13 - t.z11),
            l2: -2.0 * t.s3 * t.z2,
            l3: -2.0 * t.s3 * (t.z3 - t.z1),
            l4: -2.0 * t.s3 * (-21.0 - 9.0 * emsq) * ze,
            gh2: 2.0 * t.s4 * t.z32,
            gh3: 2.0 * t.s4 * (t.z33 - t.z31),
            gh4: -18.0 * t.s4 * ze,
            h2: -2.0 * t.s2 * t.z22,
            h3: -2.0 * t.s2 * (t.z23 - t.z21),
        }
    }

    fn evaluate(&self, t: Minute) -> PeriodicOffsets {
        let zm = self.zm0 + self.zn * t;
        let zf = zm + 2.0 * self.ze * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        PeriodicOffsets {
            pe: self.e2 * f2 + self.e3 * f3,
            pinc: self.i2 * f2 + self.i3 * f3,
            pl: self.l2 * f2 + self.l3 * f3 + self.l4 * sinzf,
            pgh: self.gh2 * f2 + self.gh3 * f3 + self.gh4 * sinzf,
            ph: self.h2 * f2 + self.h3 * f3,
        }
    }
}

/// Geopotential resonance of the orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Resonance {
    None,
    /// One revolution per sidereal day
    Synchronous {
        del1: f64,
        del2: f64,
        del3: f64,
        xfact: f64,
        xlamo: f64,
    },
    /// Two revolutions per sidereal day with e ≥ 0.5 (Molniya-like)
    HalfDay {
        d2201: f64,
        d2211: f64,
        d3210: f64,
        d3222: f64,
        d4410: f64,
        d4422: f64,
        d5220: f64,
        d5232: f64,
        d5421: f64,
        d5433: f64,
        xfact: f64,
        xlamo: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DeepSpaceCoefficients {
    sun: BodyPeriodics,
    moon: BodyPeriodics,
    dedt: f64,
    didt: f64,
    dmdt: f64,
    dnodt: f64,
    domdt: f64,
    pub resonance: Resonance,
}

/// Elements after the deep-space secular and resonance update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DeepSecular {
    pub eccentricity: f64,
    pub inclination: Radian,
    pub arg_perigee: Radian,
    pub raan: Radian,
    pub mean_anomaly: Radian,
    pub mean_motion: f64,
}

/// Elements after the lunar-solar periodics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Perturbed {
    pub eccentricity: f64,
    pub inclination: Radian,
    pub raan: Radian,
    pub arg_perigee: Radian,
    pub mean_anomaly: Radian,
}

/// Derive the deep-space coefficients.
///
/// Arguments
/// ---------
/// * `mean`: decoded mean elements.
/// * `near`: near-Earth coefficients (Brouwer mean motion, secular rates, sidereal time at epoch).
/// * `ctx`: initialization leftovers of the near-Earth setup.
/// * `xke`: gravity constant of the selected model.
pub(crate) fn initialize(
    mean: &MeanElements,
    near: &NearEarthCoefficients,
    ctx: &InitContext,
    xke: f64,
) -> DeepSpaceCoefficients {
    const C1SS: f64 = 2.986_479_7e-6;
    const C1L: f64 = 4.796_806_5e-7;
    const ZSINIS: f64 = 0.397_854_16;
    const ZCOSIS: f64 = 0.917_448_67;
    const ZCOSGS: f64 = 0.194_590_5;
    const ZSINGS: f64 = -0.980_884_58;

    let epoch_days = crate::time::sgp4_epoch_days(&mean.epoch);
    let ecco = mean.eccentricity;
    let inclo = mean.inclination;
    let no = near.no_unkozai;

    let (snodm, cnodm) = mean.raan.sin_cos();
    let (sinomm, cosomm) = mean.arg_perigee.sin_cos();
    let (sinim, cosim) = inclo.sin_cos();
    let emsq = ecco * ecco;
    let betasq = 1.0 - emsq;
    let orbit = OrbitTrig {
        sinim,
        cosim,
        sinomm,
        cosomm,
        em: ecco,
        emsq,
        betasq,
        rtemsq: betasq.sqrt(),
        xnoi: 1.0 / no,
    };

    // Lunar orbit orientation at epoch
    let day = epoch_days + 18_261.5;
    let xnodce = (4.523_602_0 - 9.242_202_9e-4 * day) % DPI;
    let (stem, ctem) = xnodce.sin_cos();
    let zcosil = 0.913_751_64 - 0.035_680_96 * ctem;
    let zsinil = (1.0 - zcosil * zcosil).sqrt();
    let zsinhl = 0.089_683_511 * stem / zsinil;
    let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
    let gam = 5.835_151_4 + 0.001_944_368_0 * day;
    let zx = 0.397_854_16 * stem / zsinil;
    let zy = zcoshl * ctem + 0.917_448_67 * zsinhl * stem;
    let zx = gam + zx.atan2(zy) - xnodce;

    let sun_orientation = BodyOrientation {
        cos_g: ZCOSGS,
        sin_g: ZSINGS,
        cos_i: ZCOSIS,
        sin_i: ZSINIS,
        cos_h: cnodm,
        sin_h: snodm,
        cc: C1SS,
    };
    let moon_orientation = BodyOrientation {
        cos_g: zx.cos(),
        sin_g: zx.sin(),
        cos_i: zcosil,
        sin_i: zsinil,
        cos_h: zcoshl * cnodm + zsinhl * snodm,
        sin_h: snodm * zcoshl - cnodm * zsinhl,
        cc: C1L,
    };
    let ss = body_terms(&sun_orientation, &orbit);
    let s = body_terms(&moon_orientation, &orbit);

    let zmol = (4.719_967_2 + 0.229_971_50 * day - gam) % DPI;
    let zmos = (6.256_583_7 + 0.017_201_977 * day) % DPI;
    let sun = BodyPeriodics::new(&ss, emsq, zmos, ZNS, ZES);
    let moon = BodyPeriodics::new(&s, emsq, zmol, ZNL, ZEL);

    // Lunar-solar secular rates
    let near_equatorial = inclo < NEAR_EQUATORIAL || inclo > PI - NEAR_EQUATORIAL;

    let ses = ss.s1 * ZNS * ss.s5;
    let sis = ss.s2 * ZNS * (ss.z11 + ss.z13);
    let sls = -ZNS * ss.s3 * (ss.z1 + ss.z3 - 14.0 - 6.0 * emsq);
    let sghs = ss.s4 * ZNS * (ss.z31 + ss.z33 - 6.0);
    let mut shs = -ZNS * ss.s2 * (ss.z21 + ss.z23);
    if near_equatorial {
        shs = 0.0;
    }
    if sinim != 0.0 {
        shs /= sinim;
    }
    let sgs = sghs - cosim * shs;

    let dedt = ses + s.s1 * ZNL * s.s5;
    let didt = sis + s.s2 * ZNL * (s.z11 + s.z13);
    let dmdt = sls - ZNL * s.s3 * (s.z1 + s.z3 - 14.0 - 6.0 * emsq);
    let sghl = s.s4 * ZNL * (s.z31 + s.z33 - 6.0);
    let mut shll = -ZNL * s.s2 * (s.z21 + s.z23);
    if near_equatorial {
        shll = 0.0;
    }
    let mut domdt = sgs + sghl;
    let mut dnodt = shs;
    if sinim != 0.0 {
        domdt -= cosim / sinim * shll;
        dnodt += shll / sinim;
    }

    let resonance = resonance_terms(
        mean,
        near,
        ctx,
        xke,
        &orbit,
        ResonanceRates { dmdt, domdt, dnodt },
    );
    tracing::trace!(?resonance, "deep-space coefficients initialized");

    DeepSpaceCoefficients {
        sun,
        moon,
        dedt,
        didt,
        dmdt,
        dnodt,
        domdt,
        resonance,
    }
}

#[derive(Debug, Clone, Copy)]
struct ResonanceRates {
    dmdt: f64,
    domdt: f64,
    dnodt: f64,
}

fn resonance_terms(
    mean: &MeanElements,
    near: &NearEarthCoefficients,
    ctx: &InitContext,
    xke: f64,
    orbit: &OrbitTrig,
    rates: ResonanceRates,
) -> Resonance {
    const Q22: f64 = 1.789_167_9e-6;
    const Q31: f64 = 2.146_074_8e-6;
    const Q33: f64 = 2.212_301_5e-7;
    const ROOT22: f64 = 1.789_167_9e-6;
    const ROOT44: f64 = 7.363_695_3e-9;
    const ROOT54: f64 = 2.176_580_3e-9;
    const ROOT32: f64 = 3.739_379_2e-7;
    const ROOT52: f64 = 1.142_863_9e-7;

    let nm = near.no_unkozai;
    let em = mean.eccentricity;
    let (sinim, cosim) = (orbit.sinim, orbit.cosim);
    let theta = near.gsto % DPI;

    let synchronous = nm > 0.003_490_658_5 && nm < 0.005_235_987_7;
    let half_day = (8.26e-3..=9.24e-3).contains(&nm) && em >= 0.5;

    if half_day {
        let cosisq = cosim * cosim;
        let emsq = ctx.eccsq;
        let eoc = em * emsq;
        let g201 = -0.306 - (em - 0.64) * 0.440;

        let (g211, g310, g322, g410, g422, g520);
        if em <= 0.65 {
            g211 = 3.616 - 13.2470 * em + 16.2900 * emsq;
            g310 = -19.302 + 117.3900 * em - 228.4190 * emsq + 156.5910 * eoc;
            g322 = -18.9068 + 109.7927 * em - 214.6334 * emsq + 146.5816 * eoc;
            g410 = -41.122 + 242.6940 * em - 471.0940 * emsq + 313.9530 * eoc;
            g422 = -146.407 + 841.8800 * em - 1629.014 * emsq + 1083.4350 * eoc;
            g520 = -532.114 + 3017.977 * em - 5740.032 * emsq + 3708.2760 * eoc;
        } else {
            g211 = -72.099 + 331.819 * em - 508.738 * emsq + 266.724 * eoc;
            g310 = -346.844 + 1582.851 * em - 2415.925 * emsq + 1246.113 * eoc;
            g322 = -342.585 + 1554.908 * em - 2366.899 * emsq + 1215.972 * eoc;
            g410 = -1052.797 + 4758.686 * em - 7193.992 * emsq + 3651.957 * eoc;
            g422 = -3581.690 + 16178.110 * em - 24462.770 * emsq + 12422.520 * eoc;
            g520 = if em > 0.715 {
                -5149.66 + 29936.92 * em - 54087.36 * emsq + 31324.56 * eoc
            } else {
                1464.74 - 4664.75 * em + 3763.64 * emsq
            };
        }

        let (g533, g521, g532);
        if em < 0.7 {
            g533 = -919.22770 + 4988.61 * em - 9064.77 * emsq + 5542.21 * eoc;
            g521 = -822.71072 + 4568.6173 * em - 8491.4146 * emsq + 5337.524 * eoc;
            g532 = -853.66600 + 4690.25 * em - 8624.77 * emsq + 5341.4 * eoc;
        } else {
            g533 = -37995.780 + 161616.52 * em - 229838.20 * emsq + 109377.94 * eoc;
            g521 = -51752.104 + 218913.95 * em - 309468.16 * emsq + 146349.42 * eoc;
            g532 = -40023.880 + 170470.89 * em - 242699.48 * emsq + 115605.82 * eoc;
        }

        let sini2 = sinim * sinim;
        let f220 = 0.75 * (1.0 + 2.0 * cosim + cosisq);
        let f221 = 1.5 * sini2;
        let f321 = 1.875 * sinim * (1.0 - 2.0 * cosim - 3.0 * cosisq);
        let f322 = -1.875 * sinim * (1.0 + 2.0 * cosim - 3.0 * cosisq);
        let f441 = 35.0 * sini2 * f220;
        let f442 = 39.3750 * sini2 * sini2;
        let f522 = 9.84375
            * sinim
            * (sini2 * (1.0 - 2.0 * cosim - 5.0 * cosisq)
                + 0.33333333 * (-2.0 + 4.0 * cosim + 6.0 * cosisq));
        let f523 = sinim
            * (4.92187512 * sini2 * (-2.0 - 4.0 * cosim + 10.0 * cosisq)
                + 6.56250012 * (1.0 + 2.0 * cosim - 3.0 * cosisq));
        let f542 = 29.53125
            * sinim
            * (2.0 - 8.0 * cosim + cosisq * (-12.0 + 8.0 * cosim + 10.0 * cosisq));
        let f543 = 29.53125
            * sinim
            * (-2.0 - 8.0 * cosim + cosisq * (12.0 + 8.0 * cosim - 10.0 * cosisq));

        let aonv = (nm / xke).powf(X2O3);
        let xno2 = nm * nm;
        let ainv2 = aonv * aonv;
        let mut temp1 = 3.0 * xno2 * ainv2;
        let mut temp = temp1 * ROOT22;
        let d2201 = temp * f220 * g201;
        let d2211 = temp * f221 * g211;
        temp1 *= aonv;
        temp = temp1 * ROOT32;
        let d3210 = temp * f321 * g310;
        let d3222 = temp * f322 * g322;
        temp1 *= aonv;
        temp = 2.0 * temp1 * ROOT44;
        let d4410 = temp * f441 * g410;
        let d4422 = temp * f442 * g422;
        temp1 *= aonv;
        temp = temp1 * ROOT52;
        let d5220 = temp * f522 * g520;
        let d5232 = temp * f523 * g532;
        temp = 2.0 * temp1 * ROOT54;
        let d5421 = temp * f542 * g521;
        let d5433 = temp * f543 * g533;

        let xlamo = (mean.mean_anomaly + mean.raan + mean.raan - theta - theta) % DPI;
        let xfact = near.mdot + rates.dmdt + 2.0 * (near.nodedot + rates.dnodt - RPTIM) - nm;

        return Resonance::HalfDay {
            d2201,
            d2211,
            d3210,
            d3222,
            d4410,
            d4422,
            d5220,
            d5232,
            d5421,
            d5433,
            xfact,
            xlamo,
        };
    }

    if synchronous {
        let emsq = orbit.emsq;
        let aonv = (nm / xke).powf(X2O3);
        let g200 = 1.0 + emsq * (-2.5 + 0.8125 * emsq);
        let g310 = 1.0 + 2.0 * emsq;
        let g300 = 1.0 + emsq * (-6.0 + 6.60937 * emsq);
        let f220 = 0.75 * (1.0 + cosim) * (1.0 + cosim);
        let f311 = 0.9375 * sinim * sinim * (1.0 + 3.0 * cosim) - 0.75 * (1.0 + cosim);
        let f330 = 1.0 + cosim;
        let f330 = 1.875 * f330 * f330 * f330;

        let del1 = 3.0 * nm * nm * aonv * aonv;
        let del2 = 2.0 * del1 * f220 * g200 * Q22;
        let del3 = 3.0 * del1 * f330 * g300 * Q33 * aonv;
        let del1 = del1 * f311 * g310 * Q31 * aonv;

        let xlamo = (mean.mean_anomaly + mean.raan + mean.arg_perigee - theta) % DPI;
        let xfact =
            near.mdot + ctx.xpidot - RPTIM + rates.dmdt + rates.domdt + rates.dnodt - nm;

        return Resonance::Synchronous {
            del1,
            del2,
            del3,
            xfact,
            xlamo,
        };
    }

    Resonance::None
}

impl DeepSpaceCoefficients {
    /// Lunar-solar secular update and resonance integration at `t` minutes from epoch.
    ///
    /// Arguments
    /// ---------
    /// * `mean`, `near`: the element set and its near-Earth coefficients.
    /// * `secular`: output of the near-Earth secular update at `t`.
    /// * `t`: minutes since epoch.
    pub(crate) fn secular(
        &self,
        mean: &MeanElements,
        near: &NearEarthCoefficients,
        arg_perigee: Radian,
        raan: Radian,
        mean_anomaly: Radian,
        t: Minute,
    ) -> DeepSecular {
        const FASX2: f64 = 0.131_309_08;
        const FASX4: f64 = 2.884_319_8;
        const FASX6: f64 = 0.374_480_87;
        const G22: f64 = 5.768_639_6;
        const G32: f64 = 0.952_408_98;
        const G44: f64 = 1.801_499_8;
        const G52: f64 = 1.050_833_0;
        const G54: f64 = 4.410_889_8;

        let no = near.no_unkozai;
        let theta = (near.gsto + t * RPTIM) % DPI;

        let mut out = DeepSecular {
            eccentricity: mean.eccentricity + self.dedt * t,
            inclination: mean.inclination + self.didt * t,
            arg_perigee: arg_perigee + self.domdt * t,
            raan: raan + self.dnodt * t,
            mean_anomaly: mean_anomaly + self.dmdt * t,
            mean_motion: no,
        };

        let (xfact, xlamo) = match self.resonance {
            Resonance::None => return out,
            Resonance::Synchronous { xfact, xlamo, .. } => (xfact, xlamo),
            Resonance::HalfDay { xfact, xlamo, .. } => (xfact, xlamo),
        };

        // (xndt, xldot, xnddt) at the integrator state
        let derivatives = |xli: f64, xni: f64, atime: f64| -> (f64, f64, f64) {
            let xldot = xni + xfact;
            match self.resonance {
                Resonance::Synchronous {
                    del1, del2, del3, ..
                } => {
                    let xndt = del1 * (xli - FASX2).sin()
                        + del2 * (2.0 * (xli - FASX4)).sin()
                        + del3 * (3.0 * (xli - FASX6)).sin();
                    let xnddt = del1 * (xli - FASX2).cos()
                        + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                        + 3.0 * del3 * (3.0 * (xli - FASX6)).cos();
                    (xndt, xldot, xnddt * xldot)
                }
                Resonance::HalfDay {
                    d2201,
                    d2211,
                    d3210,
                    d3222,
                    d4410,
                    d4422,
                    d5220,
                    d5232,
                    d5421,
                    d5433,
                    ..
                } => {
                    let xomi = mean.arg_perigee + near.argpdot * atime;
                    let x2omi = xomi + xomi;
                    let x2li = xli + xli;
                    let xndt = d2201 * (x2omi + xli - G22).sin()
                        + d2211 * (xli - G22).sin()
                        + d3210 * (xomi + xli - G32).sin()
                        + d3222 * (-xomi + xli - G32).sin()
                        + d4410 * (x2omi + x2li - G44).sin()
                        + d4422 * (x2li - G44).sin()
                        + d5220 * (xomi + xli - G52).sin()
                        + d5232 * (-xomi + xli - G52).sin()
                        + d5421 * (xomi + x2li - G54).sin()
                        + d5433 * (-xomi + x2li - G54).sin();
                    let xnddt = d2201 * (x2omi + xli - G22).cos()
                        + d2211 * (xli - G22).cos()
                        + d3210 * (xomi + xli - G32).cos()
                        + d3222 * (-xomi + xli - G32).cos()
                        + d5220 * (xomi + xli - G52).cos()
                        + d5232 * (-xomi + xli - G52).cos()
                        + 2.0
                            * (d4410 * (x2omi + x2li - G44).cos()
                                + d4422 * (x2li - G44).cos()
                                + d5421 * (xomi + x2li - G54).cos()
                                + d5433 * (-xomi + x2li - G54).cos());
                    (xndt, xldot, xnddt * xldot)
                }
                Resonance::None => (0.0, xldot, 0.0),
            }
        };

        // Fixed-step integration from epoch
        let delt = if t > 0.0 { STEP } else { -STEP };
        let mut atime = 0.0;
        let mut xli = xlamo;
        let mut xni = no;
        let (xndt, xldot, xnddt, ft) = loop {
            let (xndt, xldot, xnddt) = derivatives(xli, xni, atime);
            if (t - atime).abs() < STEP {
                break (xndt, xldot, xnddt, t - atime);
            }
            xli += xldot * delt + xndt * STEP2;
            xni += xndt * delt + xnddt * STEP2;
            atime += delt;
        };

        let nm = xni + xndt * ft + xnddt * ft * ft * 0.5;
        let xl = xli + xldot * ft + xndt * ft * ft * 0.5;
        out.mean_anomaly = match self.resonance {
            Resonance::Synchronous { .. } => xl - out.raan - out.arg_perigee + theta,
            _ => xl - 2.0 * out.raan + 2.0 * theta,
        };
        let dndt = nm - no;
        out.mean_motion = no + dndt;
        out
    }

    /// Lunar-solar long-period periodics applied to the secular elements.
    pub(crate) fn periodics(
        &self,
        t: Minute,
        elements: Perturbed,
        ops_mode: OpsMode,
    ) -> Perturbed {
        let sun = self.sun.evaluate(t);
        let moon = self.moon.evaluate(t);
        let pe = sun.pe + moon.pe;
        let pinc = sun.pinc + moon.pinc;
        let pl = sun.pl + moon.pl;
        let pgh = sun.pgh + moon.pgh;
        let ph = sun.ph + moon.ph;

        let inclp = elements.inclination + pinc;
        let ep = elements.eccentricity + pe;
        let mut nodep = elements.raan;
        let mut argpp = elements.arg_perigee;
        let mut mp = elements.mean_anomaly;
        let (sinip, cosip) = inclp.sin_cos();

        if inclp >= LYDDANE_INCLINATION {
            let ph = ph / sinip;
            let pgh = pgh - cosip * ph;
            argpp += pgh;
            nodep += ph;
            mp += pl;
        } else {
            // Lyddane modification for low inclinations
            let (sinop, cosop) = nodep.sin_cos();
            let alfdp = sinip * sinop + (ph * cosop + pinc * cosip * sinop);
            let betdp = sinip * cosop + (-ph * sinop + pinc * cosip * cosop);
            nodep %= DPI;
            if nodep < 0.0 && ops_mode == OpsMode::Afspc {
                nodep += DPI;
            }
            let xls = mp + argpp + pl + pgh + (cosip - pinc * sinip) * nodep;
            let xnoh = nodep;
            nodep = alfdp.atan2(betdp);
            if nodep < 0.0 && ops_mode == OpsMode::Afspc {
                nodep += DPI;
            }
            if (xnoh - nodep).abs() > PI {
                if nodep < xnoh {
                    nodep += DPI;
                } else {
                    nodep -= DPI;
                }
            }
            mp += pl;
            argpp = xls - mp - cosip * nodep;
        }

        Perturbed {
            eccentricity: ep,
            inclination: inclp,
            raan: nodep,
            arg_perigee: argpp,
            mean_anomaly: mp,
        }
    }
}

#[cfg(test)]
mod deep_space_test {
    use super::*;
    use crate::constants::GravityModel;
    use crate::elements::tle::parse_tle;
    use crate::propagator::near_earth;

    fn coefficients(l1: &str, l2: &str) -> (MeanElements, NearEarthCoefficients, DeepSpaceCoefficients) {
        let (mean, _) = parse_tle(l1, l2).unwrap();
        let grav = GravityModel::Wgs72.constants();
        let (near, ctx) = near_earth::initialize(&mean, &grav, OpsMode::Improved);
        assert!(ctx.deep_space);
        let deep = initialize(&mean, &near, &ctx, grav.xke);
        (mean, near, deep)
    }

    #[test]
    fn test_geostationary_is_synchronous() {
        let (_, _, deep) = coefficients(
            "1 26038U 00007A   24061.50000000 -.00000278  00000-0  00000+0 0  9991",
            "2 26038   0.0154 129.5265 0002412 234.5236 311.7238  1.00271759 88277",
        );
        assert!(matches!(deep.resonance, Resonance::Synchronous { .. }));
    }

    #[test]
    fn test_molniya_is_half_day() {
        let (_, _, deep) = coefficients(
            "1 21897U 92011A   24061.50000000  .00000080  00000-0  00000+0 0  9995",
            "2 21897  62.8523 254.3866 7126345 281.6712  14.6732  2.00611126235219",
        );
        assert!(matches!(deep.resonance, Resonance::HalfDay { .. }));
    }

    #[test]
    fn test_gps_has_no_resonance() {
        let (mean, near, deep) = coefficients(
            "1 24876U 97035A   24061.50000000  .00000015  00000-0  00000+0 0  9994",
            "2 24876  55.4967 140.1157 0051361  52.2141 308.2702  2.00562904195583",
        );
        assert_eq!(deep.resonance, Resonance::None);
        let s = deep.secular(&mean, &near, mean.arg_perigee, mean.raan, mean.mean_anomaly, 0.0);
        assert_eq!(s.eccentricity, mean.eccentricity);
        assert_eq!(s.mean_motion, near.no_unkozai);
    }

    #[test]
    fn test_resonance_integration_is_repeatable() {
        let (mean, near, deep) = coefficients(
            "1 26038U 00007A   24061.50000000 -.00000278  00000-0  00000+0 0  9991",
            "2 26038   0.0154 129.5265 0002412 234.5236 311.7238  1.00271759 88277",
        );
        let forward = |t: f64| deep.secular(&mean, &near, mean.arg_perigee, mean.raan, mean.mean_anomaly, t);
        let a = forward(5000.0);
        let _ = forward(-3000.0);
        let b = forward(5000.0);
        assert_eq!(a, b);
        assert!(a.mean_motion.is_finite() && a.mean_anomaly.is_finite());
    }
}
