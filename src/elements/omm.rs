//! # OMM / GP records
//!
//! Structured element records in the CCSDS Orbit Mean-Elements Message keyword set, as
//! served in JSON by CelesTrak's GP queries. Values are in the same units as the two-line
//! format (degrees, revolutions per day) and go straight to [`MeanElements`] without an
//! intermediate text form.

use serde::{Deserialize, Serialize};

use crate::constants::{DPI, MINUTES_PER_DAY, RADEG};
use crate::elements::{ElementIdentity, MeanElements};
use crate::skypass_errors::{DecodeError, SkypassError};
use crate::time::parse_iso_utc;

fn default_classification() -> String {
    "U".to_string()
}

/// One GP record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Omm {
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub object_id: Option<String>,
    /// ISO-8601 UTC, e.g. `2024-03-01T12:36:37.613472`
    pub epoch: String,
    /// rev/day
    pub mean_motion: f64,
    pub eccentricity: f64,
    /// degrees
    pub inclination: f64,
    pub ra_of_asc_node: f64,
    pub arg_of_pericenter: f64,
    pub mean_anomaly: f64,
    #[serde(default)]
    pub ephemeris_type: u8,
    #[serde(default = "default_classification")]
    pub classification_type: String,
    pub norad_cat_id: u32,
    #[serde(default)]
    pub element_set_no: u32,
    #[serde(default)]
    pub rev_at_epoch: u32,
    pub bstar: f64,
    /// rev/day², already halved as in the two-line format
    #[serde(default)]
    pub mean_motion_dot: f64,
    /// rev/day³, already divided by six
    #[serde(default)]
    pub mean_motion_ddot: f64,
}

impl Omm {
    /// Convert the record to propagator units.
    pub fn to_mean_elements(&self) -> Result<(MeanElements, ElementIdentity), DecodeError> {
        let epoch = parse_iso_utc(&self.epoch)?;
        let xpdotp = MINUTES_PER_DAY / DPI;

        let mean = MeanElements {
            epoch,
            mean_motion: self.mean_motion / xpdotp,
            eccentricity: self.eccentricity,
            inclination: self.inclination * RADEG,
            raan: self.ra_of_asc_node * RADEG,
            arg_perigee: self.arg_of_pericenter * RADEG,
            mean_anomaly: self.mean_anomaly * RADEG,
            bstar: self.bstar,
            mean_motion_dot: self.mean_motion_dot / (xpdotp * MINUTES_PER_DAY),
            mean_motion_ddot: self.mean_motion_ddot / (xpdotp * MINUTES_PER_DAY * MINUTES_PER_DAY),
        }
        .validated()?;

        let identity = ElementIdentity {
            catalog_number: self.norad_cat_id,
            international_designator: self
                .object_id
                .as_deref()
                .map(designator_from_object_id)
                .unwrap_or_default(),
            classification: self.classification_type.chars().next().unwrap_or('U'),
            element_set: self.element_set_no,
            revolution: self.rev_at_epoch,
            ephemeris_type: self.ephemeris_type,
            name: self.object_name.clone(),
        };
        Ok((mean, identity))
    }
}

/// `1998-067A` → `98067A`
fn designator_from_object_id(object_id: &str) -> String {
    match object_id.split_once('-') {
        Some((year, rest)) if year.len() == 4 => format!("{}{rest}", &year[2..]),
        _ => object_id.to_string(),
    }
}

/// Parse a JSON array of GP records.
pub fn parse_omm_array(json: &str) -> Result<Vec<Omm>, SkypassError> {
    Ok(serde_json::from_str(json)?)
}
