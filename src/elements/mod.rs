//! # Orbital element sets
//!
//! Decoding of raw element records into the canonical [`OrbitalElements`] used by the
//! propagator. Two record formats are supported:
//!
//! - [`tle`] – the fixed-column NORAD two-line format, optionally preceded by a name line,
//! - [`omm`] – the CCSDS OMM / CelesTrak "GP" JSON record.
//!
//! Both end in the same place: a validated [`MeanElements`] (radians, rad/min) together with an
//! [`ElementIdentity`], from which the SGP4/SDP4 coefficients are derived once.
//!
//! ## Example
//! ```rust,no_run
//! use skypass::elements::OrbitalElements;
//! use skypass::propagator::PropagationModel;
//!
//! let iss = OrbitalElements::from_tle(
//!     "1 25544U 98067A   24061.52543534  .00018023  00000-0  32313-3 0  9993",
//!     "2 25544  51.6410 118.9424 0005630 321.6407 183.4990 15.49942322441784",
//!     PropagationModel::default(),
//! )?;
//! println!("period: {:.1} min", iss.coefficients().period());
//! # Ok::<(), skypass::skypass_errors::DecodeError>(())
//! ```

pub mod omm;
pub mod tle;

use hifitime::Epoch;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::Radian;
use crate::elements::omm::Omm;
use crate::propagator::{InertialState, PropagationModel, Sgp4Coefficients};
use crate::skypass_errors::{DecodeError, PropagationError};

/// Mean orbital elements at epoch, in propagator units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanElements {
    /// Element epoch, UTC
    pub epoch: Epoch,
    /// Kozai mean motion, rad/min
    pub mean_motion: f64,
    pub eccentricity: f64,
    pub inclination: Radian,
    /// Right ascension of the ascending node
    pub raan: Radian,
    pub arg_perigee: Radian,
    pub mean_anomaly: Radian,
    /// B* drag term, 1/earth radii
    pub bstar: f64,
    /// First derivative of the mean motion, rad/min² (not used by SGP4)
    pub mean_motion_dot: f64,
    /// Second derivative of the mean motion, rad/min³ (not used by SGP4)
    pub mean_motion_ddot: f64,
}

impl MeanElements {
    /// Check the physical domain of the elements.
    ///
    /// Return
    /// ------
    /// * The elements unchanged, or the first violated constraint.
    pub fn validated(self) -> Result<Self, DecodeError> {
        let fields = [
            ("mean_motion", self.mean_motion),
            ("eccentricity", self.eccentricity),
            ("inclination", self.inclination),
            ("raan", self.raan),
            ("arg_perigee", self.arg_perigee),
            ("mean_anomaly", self.mean_anomaly),
            ("bstar", self.bstar),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DecodeError::NonFinite(name));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(DecodeError::EccentricityOutOfRange(self.eccentricity));
        }
        if self.mean_motion <= 0.0 {
            return Err(DecodeError::NonPositiveMeanMotion(
                self.mean_motion * crate::constants::MINUTES_PER_DAY / crate::constants::DPI,
            ));
        }
        Ok(self)
    }
}

/// Catalog identity carried by an element set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementIdentity {
    pub catalog_number: u32,
    /// COSPAR designator, e.g. `98067A`
    pub international_designator: String,
    /// `U`, `C` or `S`
    pub classification: char,
    pub element_set: u32,
    pub revolution: u32,
    pub ephemeris_type: u8,
    /// Name line of a three-line record, or `OBJECT_NAME`
    pub name: Option<String>,
}

/// Decoded element set with its propagation coefficients.
///
/// Immutable once built; propagation borrows it and never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalElements {
    pub(crate) mean: MeanElements,
    pub(crate) identity: ElementIdentity,
    pub(crate) coefficients: Sgp4Coefficients,
}

impl OrbitalElements {
    /// Validate mean elements and derive the propagation coefficients.
    pub fn new(
        mean: MeanElements,
        identity: ElementIdentity,
        model: PropagationModel,
    ) -> Result<Self, DecodeError> {
        let mean = mean.validated()?;
        let coefficients = Sgp4Coefficients::new(&mean, model);
        Ok(OrbitalElements {
            mean,
            identity,
            coefficients,
        })
    }

    /// Decode a two-line element set.
    pub fn from_tle(line1: &str, line2: &str, model: PropagationModel) -> Result<Self, DecodeError> {
        let (mean, identity) = tle::parse_tle(line1, line2)?;
        OrbitalElements::new(mean, identity, model)
    }

    /// Decode a two- or three-line text record.
    pub fn from_tle_text(text: &str, model: PropagationModel) -> Result<Self, DecodeError> {
        let (mean, identity) = tle::parse_tle_text(text)?;
        OrbitalElements::new(mean, identity, model)
    }

    /// Decode a structured OMM record.
    pub fn from_omm(omm: &Omm, model: PropagationModel) -> Result<Self, DecodeError> {
        let (mean, identity) = omm.to_mean_elements()?;
        OrbitalElements::new(mean, identity, model)
    }

    pub fn mean(&self) -> &MeanElements {
        &self.mean
    }

    pub fn identity(&self) -> &ElementIdentity {
        &self.identity
    }

    pub fn coefficients(&self) -> &Sgp4Coefficients {
        &self.coefficients
    }

    pub fn epoch(&self) -> Epoch {
        self.mean.epoch
    }

    /// Propagate to a UTC instant, see [`propagate`](crate::propagator::propagate).
    pub fn propagate(&self, at: &Epoch) -> Result<InertialState, PropagationError> {
        crate::propagator::propagate(self, at)
    }

    /// Propagate `t` minutes from epoch; TEME position (km) and velocity (km/s).
    pub fn propagate_minutes(
        &self,
        t: f64,
    ) -> Result<(Vector3<f64>, Vector3<f64>), PropagationError> {
        crate::propagator::propagate_minutes(self, t)
    }
}

/// A raw element record as delivered by a catalog feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawElements {
    /// Two- or three-line text
    Tle(String),
    /// Structured OMM/GP fields
    Omm(Omm),
}

impl RawElements {
    /// Decode the record with the given propagation model.
    pub fn decode(&self, model: PropagationModel) -> Result<OrbitalElements, DecodeError> {
        decode(self, model)
    }
}

impl From<Omm> for RawElements {
    fn from(omm: Omm) -> Self {
        RawElements::Omm(omm)
    }
}

/// Decode any raw element record into [`OrbitalElements`].
pub fn decode(record: &RawElements, model: PropagationModel) -> Result<OrbitalElements, DecodeError> {
    match record {
        RawElements::Tle(text) => OrbitalElements::from_tle_text(text, model),
        RawElements::Omm(omm) => OrbitalElements::from_omm(omm, model),
    }
}
