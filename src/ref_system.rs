//! # Frame transform chain
//!
//! Pure transforms from the TEME inertial frame of the propagator to the local horizon of a
//! ground observer:
//!
//! ```text
//! TEME position --(GMST, WGS84)--> Geodetic --(WGS84)--> Earth-fixed --(observer ENU)--> LookAngles
//! ```
//!
//! Polar motion and the equation of the equinoxes are neglected, so the inertial →
//! Earth-fixed step is a single z-axis rotation by the Greenwich mean sidereal time.
//!
//! ## Units
//!
//! - Angles: **radians**; longitudes in `[-π, π]`, azimuth in `[0, 2π)`.
//! - Lengths: **kilometers**.

use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

use crate::constants::{Kilometer, Radian, DPI, WGS84_E2, WGS84_MAJOR_AXIS};

/// Convergence threshold of the geodetic latitude iteration, radians.
const LATITUDE_EPS: f64 = 1e-12;
const LATITUDE_MAX_ITER: usize = 20;

/// Geodetic coordinates on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    pub latitude: Radian,
    /// East positive, in `[-π, π]`
    pub longitude: Radian,
    /// Height above the ellipsoid, km
    pub height: Kilometer,
}

/// Topocentric direction of a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookAngles {
    /// Clockwise from north, in `[0, 2π)`
    pub azimuth: Radian,
    /// Above the local horizontal plane, in `[-π/2, π/2]`
    pub elevation: Radian,
    /// Slant range, km
    pub range: Kilometer,
}

/// Principal axis of an elementary rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Elementary active rotation by `alpha` around a principal axis.
///
/// The rotated vector is `x' = R · x`; a positive angle turns counter-clockwise when looking
/// from the positive end of the axis toward the origin. A change of basis by `alpha` is
/// therefore `rotmt(-alpha, axis)`.
pub fn rotmt(alpha: Radian, axis: Axis) -> Matrix3<f64> {
    let axis = match axis {
        Axis::X => Vector3::x_axis(),
        Axis::Y => Vector3::y_axis(),
        Axis::Z => Vector3::z_axis(),
    };
    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Wrap an angle into `[-π, π)`.
pub fn wrap_pi(angle: Radian) -> Radian {
    (angle + PI).rem_euclid(DPI) - PI
}

/// Rotate a TEME vector into the Earth-fixed frame.
pub fn inertial_to_earth_fixed(v: &Vector3<f64>, gmst: Radian) -> Vector3<f64> {
    rotmt(-gmst, Axis::Z) * v
}

/// Geodetic coordinates of an inertial position.
///
/// Arguments
/// ---------
/// * `position`: TEME position, km.
/// * `gmst`: Greenwich mean sidereal time of the instant, radians.
///
/// Return
/// ------
/// * The sub-satellite [`Geodetic`] point and the height above the ellipsoid.
pub fn inertial_to_geodetic(position: &Vector3<f64>, gmst: Radian) -> Geodetic {
    let a = WGS84_MAJOR_AXIS;
    let e2 = WGS84_E2;

    let longitude = wrap_pi(position.y.atan2(position.x) - gmst);
    let r = position.x.hypot(position.y);
    let z = position.z;

    let mut latitude = z.atan2(r);
    for _ in 0..LATITUDE_MAX_ITER {
        let sin_lat = latitude.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (z + n * e2 * sin_lat).atan2(r);
        let done = (next - latitude).abs() < LATITUDE_EPS;
        latitude = next;
        if done {
            break;
        }
    }

    // Height projected on the local normal; stays well conditioned at the poles
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let height = r * cos_lat + z * sin_lat - a * (1.0 - e2 * sin_lat * sin_lat).sqrt();

    Geodetic {
        latitude,
        longitude,
        height,
    }
}

/// Earth-fixed Cartesian position of a geodetic point, km.
pub fn geodetic_to_earth_fixed(geodetic: &Geodetic) -> Vector3<f64> {
    let (sin_lat, cos_lat) = geodetic.latitude.sin_cos();
    let (sin_lon, cos_lon) = geodetic.longitude.sin_cos();
    let n = WGS84_MAJOR_AXIS / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n + geodetic.height) * cos_lat * cos_lon,
        (n + geodetic.height) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + geodetic.height) * sin_lat,
    )
}

/// Rotation from Earth-fixed axes to the local East-North-Up axes of a site.
pub fn enu_rotation(site: &Geodetic) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = site.latitude.sin_cos();
    let (sin_lon, cos_lon) = site.longitude.sin_cos();

    Matrix3::new(
        -sin_lon,
        cos_lon,
        0.0,
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        cos_lat * cos_lon,
        cos_lat * sin_lon,
        sin_lat,
    )
}

/// Look angles of an Earth-fixed target seen from an observer.
///
/// Arguments
/// ---------
/// * `observer`: geodetic coordinates of the site, defining the local ENU axes.
/// * `observer_ecf`: Earth-fixed position of the site, km.
/// * `target_ecf`: Earth-fixed position of the target, km.
///
/// Return
/// ------
/// * [`LookAngles`]; a target at the site itself is reported at the zenith with azimuth 0.
pub fn earth_fixed_to_look_angles(
    observer: &Geodetic,
    observer_ecf: &Vector3<f64>,
    target_ecf: &Vector3<f64>,
) -> LookAngles {
    let enu = enu_rotation(observer) * (target_ecf - observer_ecf);
    let range = enu.norm();
    if range == 0.0 {
        return LookAngles {
            azimuth: 0.0,
            elevation: FRAC_PI_2,
            range: 0.0,
        };
    }

    let azimuth = enu.x.atan2(enu.y).rem_euclid(DPI);
    // rem_euclid can round up to exactly 2π for tiny negative inputs
    let azimuth = if azimuth >= DPI { 0.0 } else { azimuth };
    let elevation = (enu.z / range).clamp(-1.0, 1.0).asin();

    LookAngles {
        azimuth,
        elevation,
        range,
    }
}

#[cfg(test)]
mod ref_system_test {
    use super::*;
    use crate::constants::{RADEG, WGS84_MINOR_AXIS};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rotmt_z_quarter_turn() {
        let r = rotmt(FRAC_PI_2, Axis::Z);
        let v = r * Vector3::x();
        assert_abs_diff_eq!(v, Vector3::y(), epsilon = 1e-15);
        assert_abs_diff_eq!(r.transpose() * r, Matrix3::identity(), epsilon = 1e-15);
    }

    #[test]
    fn test_geodetic_round_trip() {
        for &(lat, lon, h) in &[
            (0.0, 0.0, 0.0),
            (45.0, 5.0, 0.3),
            (-33.9, 151.2, 0.05),
            (89.999, -120.0, 2.0),
            (-90.0, 0.0, 0.0),
            (10.0, 179.9, 35_786.0),
        ] {
            let g = Geodetic {
                latitude: lat * RADEG,
                longitude: lon * RADEG,
                height: h,
            };
            let back = inertial_to_geodetic(&geodetic_to_earth_fixed(&g), 0.0);
            assert_abs_diff_eq!(back.latitude / RADEG, lat, epsilon = 1e-6);
            assert_abs_diff_eq!(back.height, h, epsilon = 1e-3);
            if lat.abs() < 90.0 {
                assert_abs_diff_eq!(back.longitude / RADEG, lon, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_pole_is_on_minor_axis() {
        let pole = geodetic_to_earth_fixed(&Geodetic {
            latitude: FRAC_PI_2,
            longitude: 0.0,
            height: 0.0,
        });
        assert_abs_diff_eq!(pole.z, WGS84_MINOR_AXIS, epsilon = 1e-6);
    }

    #[test]
    fn test_gmst_shifts_longitude() {
        let p = Vector3::new(7000.0, 0.0, 0.0);
        let g = inertial_to_geodetic(&p, 0.5);
        assert_abs_diff_eq!(g.longitude, -0.5, epsilon = 1e-15);
        let ecf = inertial_to_earth_fixed(&p, 0.5);
        assert_abs_diff_eq!(ecf.y.atan2(ecf.x), g.longitude, epsilon = 1e-15);
    }

    #[test]
    fn test_longitude_wraps() {
        let p = Vector3::new(-7000.0, 1.0, 0.0);
        let g = inertial_to_geodetic(&p, -1.0);
        assert!((-PI..=PI).contains(&g.longitude));
    }

    #[test]
    fn test_look_angles_cardinal_directions() {
        let site = Geodetic {
            latitude: 45.0 * RADEG,
            longitude: 5.0 * RADEG,
            height: 0.3,
        };
        let o = geodetic_to_earth_fixed(&site);
        let rot = enu_rotation(&site).transpose();

        let zenith = earth_fixed_to_look_angles(&site, &o, &(o + rot * Vector3::new(0.0, 0.0, 500.0)));
        assert_abs_diff_eq!(zenith.elevation, FRAC_PI_2, epsilon = 1e-9);
        assert_abs_diff_eq!(zenith.range, 500.0, epsilon = 1e-9);

        let east = earth_fixed_to_look_angles(&site, &o, &(o + rot * Vector3::new(100.0, 0.0, 0.0)));
        assert_abs_diff_eq!(east.azimuth, FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(east.elevation, 0.0, epsilon = 1e-12);

        let west_low = earth_fixed_to_look_angles(&site, &o, &(o + rot * Vector3::new(-100.0, 0.0, -10.0)));
        assert_abs_diff_eq!(west_low.azimuth, 3.0 * FRAC_PI_2, epsilon = 1e-12);
        assert!(west_low.elevation < 0.0);
    }

    #[test]
    fn test_zero_range_is_zenith() {
        let site = Geodetic {
            latitude: 0.1,
            longitude: 0.2,
            height: 0.0,
        };
        let o = geodetic_to_earth_fixed(&site);
        let la = earth_fixed_to_look_angles(&site, &o, &o);
        assert_eq!(la.elevation, FRAC_PI_2);
        assert_eq!(la.azimuth, 0.0);
        assert_eq!(la.range, 0.0);
    }
}
