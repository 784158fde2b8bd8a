//! # Observer site
//!
//! A ground observer on the WGS84 ellipsoid, validated at construction and carrying its
//! precomputed Earth-fixed position so that a batch of look-angle computations only pays for
//! the target side of the transform chain.
//!
//! ## Units
//!
//! - Constructor inputs: latitude and longitude in **degrees**, height in **meters**.
//! - Stored values: **radians** and **kilometers**.
//!
//! ## See also
//! ------------
//! * [`ref_system`](crate::ref_system) – the geodetic and look-angle transforms.

use nalgebra::Vector3;
use ordered_float::NotNan;
use std::fmt;

use crate::constants::{Degree, Kilometer, Meter, Radian, RADEG};
use crate::ref_system::{geodetic_to_earth_fixed, inertial_to_geodetic, Geodetic};
use crate::skypass_errors::SkypassError;

/// Ground observer with precomputed Earth-fixed coordinates.
///
/// Units
/// -----
/// * `latitude`, `longitude`: radians, longitude in `(-π, π]`.
/// * `height`: kilometers above the ellipsoid.
/// * `earth_fixed`: kilometers.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Observer {
    latitude: NotNan<Radian>,
    longitude: NotNan<Radian>,
    height: NotNan<Kilometer>,

    /// Optional human-readable site name.
    pub name: Option<String>,

    earth_fixed: Vector3<NotNan<f64>>,
}

fn not_nan(value: f64, what: &str) -> Result<NotNan<f64>, SkypassError> {
    if !value.is_finite() {
        return Err(SkypassError::InvalidObserver(format!(
            "{what} must be finite, got {value}"
        )));
    }
    NotNan::new(value).map_err(|_| SkypassError::InvalidObserver(format!("{what} is NaN")))
}

/// Bring a longitude in `[-180, 360)` degrees to `(-180, 180]`.
fn normalize_longitude(longitude: Degree) -> Degree {
    if longitude > 180.0 {
        longitude - 360.0
    } else if longitude == -180.0 {
        180.0
    } else {
        longitude
    }
}

impl Observer {
    /// Create an observer from geodetic coordinates.
    ///
    /// Arguments
    /// -----------------
    /// * `latitude`: geodetic latitude in **degrees**, `[-90, 90]`.
    /// * `longitude`: longitude in **degrees** east, `[-180, 360)`.
    /// * `height`: height above the ellipsoid in **meters** (not range-checked).
    ///
    /// Return
    /// ----------
    /// * The [`Observer`], or [`SkypassError::InvalidObserver`] for non-finite or out-of-range input.
    pub fn new(latitude: Degree, longitude: Degree, height: Meter) -> Result<Observer, SkypassError> {
        let lat = not_nan(latitude, "latitude")?;
        let lon = not_nan(longitude, "longitude")?;
        let h = not_nan(height, "height")?;

        if !(-90.0..=90.0).contains(&lat.into_inner()) {
            return Err(SkypassError::InvalidObserver(format!(
                "latitude {latitude}° outside [-90, 90]"
            )));
        }
        if !(-180.0..360.0).contains(&lon.into_inner()) {
            return Err(SkypassError::InvalidObserver(format!(
                "longitude {longitude}° outside [-180, 360)"
            )));
        }

        Observer::from_geodetic(Geodetic {
            latitude: lat.into_inner() * RADEG,
            longitude: normalize_longitude(lon.into_inner()) * RADEG,
            height: h.into_inner() / 1000.0,
        })
    }

    /// Create an observer from geodetic coordinates already in radians and kilometers.
    pub fn from_geodetic(geodetic: Geodetic) -> Result<Observer, SkypassError> {
        let ecf = geodetic_to_earth_fixed(&geodetic);
        Ok(Observer {
            latitude: not_nan(geodetic.latitude, "latitude")?,
            longitude: not_nan(geodetic.longitude, "longitude")?,
            height: not_nan(geodetic.height, "height")?,
            name: None,
            earth_fixed: Vector3::new(
                not_nan(ecf.x, "x")?,
                not_nan(ecf.y, "y")?,
                not_nan(ecf.z, "z")?,
            ),
        })
    }

    /// Create an observer from an Earth-fixed Cartesian position in kilometers.
    pub fn from_earth_fixed(position: Vector3<f64>) -> Result<Observer, SkypassError> {
        if !position.iter().all(|c| c.is_finite()) {
            return Err(SkypassError::InvalidObserver(format!(
                "non-finite Earth-fixed position {position:?}"
            )));
        }
        let geodetic = inertial_to_geodetic(&position, 0.0);
        Observer::from_geodetic(geodetic)
    }

    /// Attach a site name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn latitude(&self) -> Radian {
        self.latitude.into_inner()
    }

    pub fn longitude(&self) -> Radian {
        self.longitude.into_inner()
    }

    pub fn height(&self) -> Kilometer {
        self.height.into_inner()
    }

    pub fn geodetic(&self) -> Geodetic {
        Geodetic {
            latitude: self.latitude(),
            longitude: self.longitude(),
            height: self.height(),
        }
    }

    /// Earth-fixed position of the site, km.
    pub fn earth_fixed(&self) -> Vector3<f64> {
        self.earth_fixed.map(NotNan::into_inner)
    }
}

impl fmt::Display for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name} ")?;
        }
        write!(
            f,
            "(lat {:.6}°, lon {:.6}°, h {:.1} m)",
            self.latitude() / RADEG,
            self.longitude() / RADEG,
            self.height() * 1000.0
        )
    }
}

#[cfg(test)]
mod observer_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_observer_constructor() {
        let obs = Observer::new(45.0, 5.0, 300.0).unwrap();
        assert_abs_diff_eq!(obs.latitude(), 45.0 * RADEG, epsilon = 1e-15);
        assert_abs_diff_eq!(obs.height(), 0.3, epsilon = 1e-15);
        assert_eq!(obs.earth_fixed(), geodetic_to_earth_fixed(&obs.geodetic()));
    }

    #[test]
    fn test_longitude_normalization() {
        let east = Observer::new(0.0, 289.25058, 0.0).unwrap();
        assert_abs_diff_eq!(east.longitude() / RADEG, 289.25058 - 360.0, epsilon = 1e-9);
        let anti = Observer::new(0.0, -180.0, 0.0).unwrap();
        assert_abs_diff_eq!(anti.longitude() / RADEG, 180.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            Observer::new(90.5, 0.0, 0.0),
            Err(SkypassError::InvalidObserver(_))
        ));
        assert!(Observer::new(0.0, 360.0, 0.0).is_err());
        assert!(Observer::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(Observer::new(0.0, 0.0, f64::INFINITY).is_err());
        assert!(Observer::new(0.0, 0.0, -500.0).is_ok());
    }

    #[test]
    fn test_from_earth_fixed_round_trip() {
        // Rubin Observatory
        let obs = Observer::new(-30.2446, -70.74942, 2647.0).unwrap();
        let back = Observer::from_earth_fixed(obs.earth_fixed()).unwrap();
        assert_abs_diff_eq!(back.latitude(), obs.latitude(), epsilon = 1e-10);
        assert_abs_diff_eq!(back.longitude(), obs.longitude(), epsilon = 1e-12);
        assert_abs_diff_eq!(back.height(), obs.height(), epsilon = 1e-6);
    }

    #[test]
    fn test_display() {
        let obs = Observer::new(45.0, 5.0, 300.0).unwrap().with_name("Grenoble");
        assert_eq!(
            obs.to_string(),
            "Grenoble (lat 45.000000°, lon 5.000000°, h 300.0 m)"
        );
    }
}
