//! # Constants and type definitions for skypass
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! aliases** used throughout the crate, together with the two switches that parameterize the
//! analytic propagator: the [`GravityModel`] and the [`OpsMode`].
//!
//! ## Overview
//!
//! - Unit conversions (degrees ↔ radians, days ↔ minutes, Julian date offsets)
//! - The WGS84 reference ellipsoid used by the frame transform chain
//! - Gravity field constants (μ, Earth radius, J2/J3/J4) of the historical SGP4 models
//! - Core type aliases used across the crate
//!
//! ## Units
//!
//! Internally every angle is in **radians**, every length in **kilometers** and every
//! propagation time in **minutes**. Degrees and meters only appear at the public boundary
//! ([`Observer::new`](crate::observers::Observer::new) and
//! [`VisibilityRecord`](crate::visibility::VisibilityRecord)).

use serde::{Deserialize, Serialize};
use std::fmt;

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Number of minutes in a day
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian date of J2000.0 (2000-01-01 12:00:00)
pub const JD_J2000: f64 = 2_451_545.0;

/// Julian date of 1949-12-31 00:00 UT, origin of the SGP4 "epoch days"
pub const JD_SGP4_ORIGIN: f64 = 2_433_281.5;

/// Days in a Julian century
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// 2/3, used by the Kozai/Brouwer mean motion conversions
pub const X2O3: f64 = 2.0 / 3.0;

/// Earth equatorial radius in kilometers (WGS84)
pub const WGS84_MAJOR_AXIS: f64 = 6378.137;

/// Earth polar radius in kilometers (WGS84)
pub const WGS84_MINOR_AXIS: f64 = 6356.7523142;

/// Flattening of the WGS84 ellipsoid
pub const WGS84_FLATTENING: f64 = (WGS84_MAJOR_AXIS - WGS84_MINOR_AXIS) / WGS84_MAJOR_AXIS;

/// First eccentricity squared of the WGS84 ellipsoid
pub const WGS84_E2: f64 = 2.0 * WGS84_FLATTENING - WGS84_FLATTENING * WGS84_FLATTENING;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;

/// Angle in radians
pub type Radian = f64;

/// Distance in kilometers
pub type Kilometer = f64;

/// Distance in meters
pub type Meter = f64;

/// Elapsed time in minutes
pub type Minute = f64;

// -------------------------------------------------------------------------------------------------
// Gravity models
// -------------------------------------------------------------------------------------------------

/// Earth gravity field used to initialize and run the propagator.
///
/// Two-line elements are fitted with WGS72, which is therefore the default. WGS84 is offered
/// for compatibility with tools that ship WGS84 constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GravityModel {
    Wgs72Old,
    #[default]
    Wgs72,
    Wgs84,
}

/// Numerical constants of a [`GravityModel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravConst {
    /// Gravitational parameter μ, km³/s²
    pub mu: f64,
    /// Equatorial Earth radius, km
    pub radius: Kilometer,
    /// sqrt(μ) in earth radii^1.5 / minute
    pub xke: f64,
    /// Minutes per time unit, 1/xke
    pub tumin: f64,
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    pub j3oj2: f64,
}

impl GravityModel {
    /// Return the constants of the gravity model.
    ///
    /// Return
    /// ------
    /// * The [`GravConst`] set, with `xke` derived from μ and the radius except for
    ///   `Wgs72Old` which uses its historical rounded value.
    pub fn constants(self) -> GravConst {
        let (mu, radius, xke, j2, j3, j4) = match self {
            GravityModel::Wgs72Old => (
                398_600.799_64,
                6378.135,
                0.074_366_916_1,
                0.001_082_616,
                -0.000_002_538_81,
                -0.000_001_655_97,
            ),
            GravityModel::Wgs72 => {
                let (mu, radius): (f64, f64) = (398_600.8, 6378.135);
                (
                    mu,
                    radius,
                    60.0 / (radius * radius * radius / mu).sqrt(),
                    0.001_082_616,
                    -0.000_002_538_81,
                    -0.000_001_655_97,
                )
            }
            GravityModel::Wgs84 => {
                let (mu, radius): (f64, f64) = (398_600.5, 6378.137);
                (
                    mu,
                    radius,
                    60.0 / (radius * radius * radius / mu).sqrt(),
                    0.001_082_629_989_05,
                    -0.000_002_532_153_06,
                    -0.000_001_610_987_61,
                )
            }
        };
        GravConst {
            mu,
            radius,
            xke,
            tumin: 1.0 / xke,
            j2,
            j3,
            j4,
            j3oj2: j3 / j2,
        }
    }
}

impl fmt::Display for GravityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GravityModel::Wgs72Old => "wgs72old",
            GravityModel::Wgs72 => "wgs72",
            GravityModel::Wgs84 => "wgs84",
        };
        write!(f, "{s}")
    }
}

/// Operation mode of the propagator.
///
/// `Improved` computes the sidereal time at epoch with the IAU-82 polynomial and keeps the
/// node unwrapped in the deep-space periodics. `Afspc` reproduces the historical AFSPC code
/// path (1970-based sidereal time, node wrapped into [0, 2π)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpsMode {
    #[default]
    Improved,
    Afspc,
}

impl fmt::Display for OpsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpsMode::Improved => write!(f, "improved"),
            OpsMode::Afspc => write!(f, "afspc"),
        }
    }
}

#[cfg(test)]
mod constants_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wgs72_xke_matches_historical_value() {
        let c = GravityModel::Wgs72.constants();
        assert_relative_eq!(c.xke, 0.074_366_916_1, epsilon = 1e-9);
        assert_relative_eq!(c.tumin * c.xke, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn wgs84_xke_derived_from_mu_and_radius() {
        let c = GravityModel::Wgs84.constants();
        assert_relative_eq!(c.xke, 0.074_366_853_168_713_85, epsilon = 1e-12);
        assert_relative_eq!(c.radius, 6378.137, epsilon = 1e-12);
        assert_relative_eq!(c.j3oj2, c.j3 / c.j2, epsilon = 1e-15);
    }

    #[test]
    fn wgs84_ellipsoid_eccentricity() {
        assert_relative_eq!(WGS84_E2, 0.006_694_380_004_26, epsilon = 1e-12);
    }
}
