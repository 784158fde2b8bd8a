//! # Visibility filter
//!
//! Horizon test on the look angles of a propagated object and assembly of the
//! [`VisibilityRecord`] returned to callers. Records are built in boundary units (degrees,
//! meters); everything upstream stays in radians and kilometers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{Degree, Kilometer, Meter, Radian, RADEG};
use crate::constellation::Constellation;
use crate::observers::Observer;
use crate::propagator::InertialState;
use crate::ref_system::{
    earth_fixed_to_look_angles, geodetic_to_earth_fixed, inertial_to_geodetic, Geodetic,
    LookAngles,
};
use crate::skypass_errors::{DecodeError, PropagationError};

/// One object above the observer's horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityRecord {
    pub name: String,
    pub constellation: Constellation,
    pub id: String,
    /// `[0, 360)`
    pub azimuth_deg: Degree,
    /// `(mask, 90]`
    pub elevation_deg: Degree,
    pub range_km: Kilometer,
    /// Sub-satellite point, `[-180, 180]`
    pub longitude_deg: Degree,
    pub latitude_deg: Degree,
    /// Height above the WGS84 ellipsoid
    pub height_m: Meter,
}

/// Sub-satellite point and look angles of a propagated state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub geodetic: Geodetic,
    pub look: LookAngles,
}

/// Run the frame transform chain for one inertial state.
///
/// The target goes TEME → geodetic (with the GMST of the state) → Earth-fixed, and is then
/// seen from the observer's precomputed Earth-fixed position.
pub fn sight(observer: &Observer, state: &InertialState) -> Sighting {
    let geodetic = inertial_to_geodetic(&state.position, state.gmst);
    let target_ecf = geodetic_to_earth_fixed(&geodetic);
    let look = earth_fixed_to_look_angles(&observer.geodetic(), &observer.earth_fixed(), &target_ecf);
    Sighting { geodetic, look }
}

/// Strict horizon test against an elevation mask in radians.
pub fn is_visible(look: &LookAngles, mask: Radian) -> bool {
    look.elevation > mask
}

impl VisibilityRecord {
    /// Convert a sighting to boundary units.
    pub fn new(name: &str, constellation: Constellation, id: &str, sighting: &Sighting) -> Self {
        let az = sighting.look.azimuth / RADEG;
        VisibilityRecord {
            name: name.to_string(),
            constellation,
            id: id.to_string(),
            // degrees conversion can round 2π - ε up to 360
            azimuth_deg: if az >= 360.0 { 0.0 } else { az },
            elevation_deg: sighting.look.elevation / RADEG,
            range_km: sighting.look.range,
            longitude_deg: sighting.geodetic.longitude / RADEG,
            latitude_deg: sighting.geodetic.latitude / RADEG,
            height_m: sighting.geodetic.height * 1000.0,
        }
    }
}

/// Horizon filter: the record when the object is strictly above the mask, otherwise its
/// elevation in degrees.
pub fn filter_visible(
    name: &str,
    constellation: Constellation,
    id: &str,
    sighting: &Sighting,
    mask: Radian,
) -> Result<VisibilityRecord, Degree> {
    if is_visible(&sighting.look, mask) {
        Ok(VisibilityRecord::new(name, constellation, id, sighting))
    } else {
        Err(sighting.look.elevation / RADEG)
    }
}

/// Why an input record is missing from the visible set.
#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionReason {
    Unclassified,
    Decode(DecodeError),
    Propagation(PropagationError),
    BelowHorizon { elevation_deg: Degree },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::Unclassified => write!(f, "no constellation matches the name"),
            ExclusionReason::Decode(e) => write!(f, "decode: {e}"),
            ExclusionReason::Propagation(e) => write!(f, "propagation: {e}"),
            ExclusionReason::BelowHorizon { elevation_deg } => {
                write!(f, "below horizon (elevation {elevation_deg:.3}°)")
            }
        }
    }
}

/// An excluded input record.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    /// Position of the record in the input batch
    pub index: usize,
    pub name: String,
    pub id: String,
    pub reason: ExclusionReason,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({}): {}", self.index, self.name, self.id, self.reason)
    }
}

#[cfg(test)]
mod visibility_test {
    use super::*;
    use std::f64::consts::PI;

    fn sighting(azimuth: f64, elevation: f64) -> Sighting {
        Sighting {
            geodetic: Geodetic {
                latitude: 0.5,
                longitude: -2.0,
                height: 550.0,
            },
            look: LookAngles {
                azimuth,
                elevation,
                range: 1000.0,
            },
        }
    }

    #[test]
    fn test_horizon_is_strict() {
        assert!(!is_visible(&sighting(0.0, 0.0).look, 0.0));
        assert!(is_visible(&sighting(0.0, 1e-9).look, 0.0));
        assert!(!is_visible(&sighting(0.0, 0.1).look, 10.0 * RADEG));
    }

    #[test]
    fn test_record_units() {
        let r = VisibilityRecord::new("STARLINK-1", Constellation::Starlink, "44713", &sighting(PI, PI / 4.0));
        assert!((r.azimuth_deg - 180.0).abs() < 1e-12);
        assert!((r.elevation_deg - 45.0).abs() < 1e-12);
        assert!((r.height_m - 550_000.0).abs() < 1e-6);
        assert!((r.longitude_deg + 2.0 / RADEG).abs() < 1e-12);
        assert_eq!(r.range_km, 1000.0);
    }

    #[test]
    fn test_filter_below_horizon_reports_elevation() {
        let below = filter_visible("X", Constellation::Gps, "1", &sighting(1.0, -0.5), 0.0);
        assert_eq!(below, Err(-0.5 / RADEG));
    }

    #[test]
    fn test_record_json_fields() {
        let r = VisibilityRecord::new("IRIDIUM 106", Constellation::Iridium, "41917", &sighting(0.1, 0.2));
        let json = serde_json::to_value(&r).unwrap();
        for key in [
            "name",
            "constellation",
            "id",
            "azimuth_deg",
            "elevation_deg",
            "range_km",
            "longitude_deg",
            "latitude_deg",
            "height_m",
        ] {
            assert!(json.get(key).is_some(), "{key}");
        }
        assert_eq!(json["constellation"], "IRIDIUM");
    }
}
