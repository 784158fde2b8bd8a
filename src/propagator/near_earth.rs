//! # Near-Earth SGP4 terms
//!
//! Initialization of the secular, drag and long-period coefficients shared by every orbit,
//! and their evaluation at a given time since epoch. Deep-space orbits reuse these terms and
//! add the lunar-solar contributions of [`deep_space`](super::deep_space).
//!
//! ## Units
//!
//! Lengths in **earth radii**, time in **minutes**, angles in **radians**.

use crate::constants::{GravConst, Minute, OpsMode, Radian, DPI, X2O3};
use crate::elements::MeanElements;
use crate::time::{gstime, gstime_afspc, julian_date, sgp4_epoch_days};

/// Guard used where `1 + cos i` would vanish for retrograde equatorial orbits.
pub(crate) const TEMP4: f64 = 1.5e-12;

/// Perigee height (km) below which the drag polynomial is truncated.
const SIMPLIFIED_PERIGEE_KM: f64 = 220.0;

/// Period (minutes) from which the deep-space terms are switched on.
pub(crate) const DEEP_SPACE_PERIOD: Minute = 225.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct NearEarthCoefficients {
    /// Brouwer (un-Kozai'd) mean motion, rad/min
    pub no_unkozai: f64,
    /// Semi-major axis, earth radii
    pub a: f64,
    /// Greenwich sidereal time at epoch
    pub gsto: Radian,
    /// Truncated drag model (low perigee or deep space)
    pub simplified: bool,

    pub eta: f64,
    pub cc1: f64,
    pub cc4: f64,
    pub cc5: f64,
    pub d2: f64,
    pub d3: f64,
    pub d4: f64,
    pub delmo: f64,
    pub sinmao: f64,
    pub t2cof: f64,
    pub t3cof: f64,
    pub t4cof: f64,
    pub t5cof: f64,

    pub mdot: f64,
    pub argpdot: f64,
    pub nodedot: f64,
    pub omgcof: f64,
    pub xmcof: f64,
    pub nodecf: f64,

    pub xlcof: f64,
    pub aycof: f64,
    pub con41: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
}

/// Intermediate quantities of the initialization reused by the deep-space setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct InitContext {
    pub eccsq: f64,
    pub xpidot: f64,
    pub deep_space: bool,
}

/// Mean elements after the secular and drag updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SecularElements {
    pub mean_anomaly: Radian,
    pub arg_perigee: Radian,
    pub raan: Radian,
    pub tempa: f64,
    pub tempe: f64,
    pub templ: f64,
}

/// sin(i)·(3 + 5 cos i)/(1 + cos i), guarded near i = 180°.
pub(crate) fn long_period_xlcof(j3oj2: f64, sinio: f64, cosio: f64) -> f64 {
    let denom = if (cosio + 1.0).abs() > TEMP4 {
        1.0 + cosio
    } else {
        TEMP4
    };
    -0.25 * j3oj2 * sinio * (3.0 + 5.0 * cosio) / denom
}

/// Derive the near-Earth coefficients of an element set.
///
/// Arguments
/// ---------
/// * `mean`: decoded mean elements (Kozai mean motion in rad/min).
/// * `grav`: gravity constants of the selected model.
/// * `ops_mode`: selects the sidereal time formula at epoch.
///
/// Return
/// ------
/// * The coefficients and the [`InitContext`] the deep-space initialization needs.
pub(crate) fn initialize(
    mean: &MeanElements,
    grav: &GravConst,
    ops_mode: OpsMode,
) -> (NearEarthCoefficients, InitContext) {
    let ecco = mean.eccentricity;
    let inclo = mean.inclination;
    let bstar = mean.bstar;

    let ss = 78.0 / grav.radius + 1.0;
    let qzms2t = ((120.0 - 78.0) / grav.radius).powi(4);

    // Kozai → Brouwer mean motion
    let eccsq = ecco * ecco;
    let omeosq = 1.0 - eccsq;
    let rteosq = omeosq.sqrt();
    let (sinio, cosio) = inclo.sin_cos();
    let cosio2 = cosio * cosio;

    let ak = (grav.xke / mean.mean_motion).powf(X2O3);
    let d1 = 0.75 * grav.j2 * (3.0 * cosio2 - 1.0) / (rteosq * omeosq);
    let mut del = d1 / (ak * ak);
    let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
    del = d1 / (adel * adel);
    let no_unkozai = mean.mean_motion / (1.0 + del);

    let ao = (grav.xke / no_unkozai).powf(X2O3);
    let po = ao * omeosq;
    let con42 = 1.0 - 5.0 * cosio2;
    let con41 = -con42 - cosio2 - cosio2;
    let posq = po * po;
    let rp = ao * (1.0 - ecco);

    let gsto = match ops_mode {
        OpsMode::Afspc => gstime_afspc(sgp4_epoch_days(&mean.epoch)),
        OpsMode::Improved => gstime(julian_date(&mean.epoch)),
    };

    let a = (no_unkozai * grav.tumin).powf(-X2O3);
    let deep_space = DPI / no_unkozai >= DEEP_SPACE_PERIOD;
    let simplified = rp < SIMPLIFIED_PERIGEE_KM / grav.radius + 1.0 || deep_space;

    // Atmospheric density altitude parameters
    let mut sfour = ss;
    let mut qzms24 = qzms2t;
    let perige = (rp - 1.0) * grav.radius;
    if perige < 156.0 {
        sfour = perige - 78.0;
        if perige < 98.0 {
            sfour = 20.0;
        }
        qzms24 = ((120.0 - sfour) / grav.radius).powi(4);
        sfour = sfour / grav.radius + 1.0;
    }

    let pinvsq = 1.0 / posq;
    let tsi = 1.0 / (ao - sfour);
    let eta = ao * ecco * tsi;
    let etasq = eta * eta;
    let eeta = ecco * eta;
    let psisq = (1.0 - etasq).abs();
    let coef = qzms24 * tsi.powi(4);
    let coef1 = coef / psisq.powf(3.5);

    let cc2 = coef1
        * no_unkozai
        * (ao * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
            + 0.375 * grav.j2 * tsi / psisq * con41 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
    let cc1 = bstar * cc2;
    let cc3 = if ecco > 1.0e-4 {
        -2.0 * coef * tsi * grav.j3oj2 * no_unkozai * sinio / ecco
    } else {
        0.0
    };
    let x1mth2 = 1.0 - cosio2;
    let cc4 = 2.0
        * no_unkozai
        * coef1
        * ao
        * omeosq
        * (eta * (2.0 + 0.5 * etasq) + ecco * (0.5 + 2.0 * etasq)
            - grav.j2 * tsi / (ao * psisq)
                * (-3.0 * con41 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                    + 0.75
                        * x1mth2
                        * (2.0 * etasq - eeta * (1.0 + etasq))
                        * (2.0 * mean.arg_perigee).cos()));
    let cc5 = 2.0 * coef1 * ao * omeosq * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

    // Secular rates from J2 and J4
    let cosio4 = cosio2 * cosio2;
    let temp1 = 1.5 * grav.j2 * pinvsq * no_unkozai;
    let temp2 = 0.5 * temp1 * grav.j2 * pinvsq;
    let temp3 = -0.46875 * grav.j4 * pinvsq * pinvsq * no_unkozai;
    let mdot = no_unkozai
        + 0.5 * temp1 * rteosq * con41
        + 0.0625 * temp2 * rteosq * (13.0 - 78.0 * cosio2 + 137.0 * cosio4);
    let argpdot = -0.5 * temp1 * con42
        + 0.0625 * temp2 * (7.0 - 114.0 * cosio2 + 395.0 * cosio4)
        + temp3 * (3.0 - 36.0 * cosio2 + 49.0 * cosio4);
    let xhdot1 = -temp1 * cosio;
    let nodedot =
        xhdot1 + (0.5 * temp2 * (4.0 - 19.0 * cosio2) + 2.0 * temp3 * (3.0 - 7.0 * cosio2)) * cosio;
    let xpidot = argpdot + nodedot;

    let omgcof = bstar * cc3 * mean.arg_perigee.cos();
    let xmcof = if ecco > 1.0e-4 {
        -X2O3 * coef * bstar / eeta
    } else {
        0.0
    };
    let nodecf = 3.5 * omeosq * xhdot1 * cc1;
    let t2cof = 1.5 * cc1;

    let xlcof = long_period_xlcof(grav.j3oj2, sinio, cosio);
    let aycof = -0.5 * grav.j3oj2 * sinio;
    let delmo = (1.0 + eta * mean.mean_anomaly.cos()).powi(3);
    let sinmao = mean.mean_anomaly.sin();
    let x7thm1 = 7.0 * cosio2 - 1.0;

    let mut coeffs = NearEarthCoefficients {
        no_unkozai,
        a,
        gsto,
        simplified,
        eta,
        cc1,
        cc4,
        cc5,
        delmo,
        sinmao,
        t2cof,
        mdot,
        argpdot,
        nodedot,
        omgcof,
        xmcof,
        nodecf,
        xlcof,
        aycof,
        con41,
        x1mth2,
        x7thm1,
        ..Default::default()
    };

    if !simplified {
        let cc1sq = cc1 * cc1;
        let d2 = 4.0 * ao * tsi * cc1sq;
        let temp = d2 * tsi * cc1 / 3.0;
        let d3 = (17.0 * ao + sfour) * temp;
        let d4 = 0.5 * temp * ao * tsi * (221.0 * ao + 31.0 * sfour) * cc1;
        coeffs.d2 = d2;
        coeffs.d3 = d3;
        coeffs.d4 = d4;
        coeffs.t3cof = d2 + 2.0 * cc1sq;
        coeffs.t4cof = 0.25 * (3.0 * d3 + cc1 * (12.0 * d2 + 10.0 * cc1sq));
        coeffs.t5cof = 0.2
            * (3.0 * d4 + 12.0 * cc1 * d3 + 6.0 * d2 * d2 + 15.0 * cc1sq * (2.0 * d2 + cc1sq));
    }

    (
        coeffs,
        InitContext {
            eccsq,
            xpidot,
            deep_space,
        },
    )
}

impl NearEarthCoefficients {
    /// Secular gravity and atmospheric drag update at `t` minutes from epoch.
    pub(crate) fn secular(&self, mean: &MeanElements, t: Minute) -> SecularElements {
        let xmdf = mean.mean_anomaly + self.mdot * t;
        let argpdf = mean.arg_perigee + self.argpdot * t;
        let nodedf = mean.raan + self.nodedot * t;

        let t2 = t * t;
        let mut mean_anomaly = xmdf;
        let mut arg_perigee = argpdf;
        let raan = nodedf + self.nodecf * t2;
        let mut tempa = 1.0 - self.cc1 * t;
        let mut tempe = mean.bstar * self.cc4 * t;
        let mut templ = self.t2cof * t2;

        if !self.simplified {
            let delomg = self.omgcof * t;
            let delmtemp = 1.0 + self.eta * xmdf.cos();
            let delm = self.xmcof * (delmtemp * delmtemp * delmtemp - self.delmo);
            let temp = delomg + delm;
            mean_anomaly = xmdf + temp;
            arg_perigee = argpdf - temp;

            let t3 = t2 * t;
            let t4 = t3 * t;
            tempa = tempa - self.d2 * t2 - self.d3 * t3 - self.d4 * t4;
            tempe += mean.bstar * self.cc5 * (mean_anomaly.sin() - self.sinmao);
            templ = templ + self.t3cof * t3 + t4 * (self.t4cof + t * self.t5cof);
        }

        SecularElements {
            mean_anomaly,
            arg_perigee,
            raan,
            tempa,
            tempe,
            templ,
        }
    }
}

#[cfg(test)]
mod near_earth_test {
    use super::*;
    use crate::constants::GravityModel;
    use crate::elements::tle::parse_tle;

    const L1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const L2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

    #[test]
    fn test_vanguard_is_near_earth_full_drag() {
        let (mean, _) = parse_tle(L1, L2).unwrap();
        let grav = GravityModel::Wgs72.constants();
        let (c, ctx) = initialize(&mean, &grav, OpsMode::Improved);
        assert!(!ctx.deep_space);
        assert!(!c.simplified);
        assert!(c.no_unkozai < mean.mean_motion);
        assert!(c.d2 != 0.0 && c.t5cof != 0.0);
    }

    #[test]
    fn test_secular_is_identity_at_epoch() {
        let (mean, _) = parse_tle(L1, L2).unwrap();
        let grav = GravityModel::Wgs72.constants();
        let (c, _) = initialize(&mean, &grav, OpsMode::Improved);
        let s = c.secular(&mean, 0.0);
        assert_eq!(s.raan, mean.raan);
        assert_eq!(s.tempa, 1.0);
        assert_eq!(s.templ, 0.0);
    }

    #[test]
    fn test_xlcof_retrograde_guard_is_finite() {
        let v = long_period_xlcof(-0.0023, 1e-13, -1.0);
        assert!(v.is_finite());
    }
}
