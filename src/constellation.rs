//! # Constellation lookup
//!
//! Maps an object name, as found on the name line of a catalog record, to the constellation
//! it belongs to. Matching is a case-insensitive regex table evaluated in order; the first
//! hit wins. Objects whose name matches no entry are left out of the sky view.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::skypass_errors::SkypassError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Constellation {
    Gps,
    Glonass,
    Galileo,
    Beidou,
    Qzss,
    Navic,
    Starlink,
    Oneweb,
    Iridium,
    Globalstar,
    Orbcomm,
}

impl Constellation {
    pub const ALL: [Constellation; 11] = [
        Constellation::Gps,
        Constellation::Glonass,
        Constellation::Galileo,
        Constellation::Beidou,
        Constellation::Qzss,
        Constellation::Navic,
        Constellation::Starlink,
        Constellation::Oneweb,
        Constellation::Iridium,
        Constellation::Globalstar,
        Constellation::Orbcomm,
    ];

    /// Upper-case tag used in the output records.
    pub fn tag(self) -> &'static str {
        match self {
            Constellation::Gps => "GPS",
            Constellation::Glonass => "GLONASS",
            Constellation::Galileo => "GALILEO",
            Constellation::Beidou => "BEIDOU",
            Constellation::Qzss => "QZSS",
            Constellation::Navic => "NAVIC",
            Constellation::Starlink => "STARLINK",
            Constellation::Oneweb => "ONEWEB",
            Constellation::Iridium => "IRIDIUM",
            Constellation::Globalstar => "GLOBALSTAR",
            Constellation::Orbcomm => "ORBCOMM",
        }
    }

    /// True for the navigation constellations.
    pub fn is_gnss(self) -> bool {
        matches!(
            self,
            Constellation::Gps
                | Constellation::Glonass
                | Constellation::Galileo
                | Constellation::Beidou
                | Constellation::Qzss
                | Constellation::Navic
        )
    }
}

impl fmt::Display for Constellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Constellation {
    type Err = SkypassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Constellation::ALL
            .into_iter()
            .find(|c| c.tag() == upper)
            .ok_or_else(|| SkypassError::InvalidParameter(format!("unknown constellation {s:?}")))
    }
}

static CONSTELLATION_TABLE: Lazy<Vec<(Regex, Constellation)>> = Lazy::new(|| {
    [
        (r"\b(GPS|NAVSTAR)\b", Constellation::Gps),
        // Kosmos navigation satellites carry their GLONASS number in parentheses
        (r"\b(GLONASS\b|COSMOS \d+ \(\d{3}[A-Z]?\))", Constellation::Glonass),
        (r"\b(GSAT0\d{3}|GALILEO)\b", Constellation::Galileo),
        (r"\b(BEIDOU|COMPASS)", Constellation::Beidou),
        (r"\b(QZS|MICHIBIKI)", Constellation::Qzss),
        (r"\b(IRNSS|NVS)", Constellation::Navic),
        (r"\bSTARLINK\b", Constellation::Starlink),
        (r"\bONEWEB\b", Constellation::Oneweb),
        (r"\bIRIDIUM\b", Constellation::Iridium),
        (r"\bGLOBALSTAR\b", Constellation::Globalstar),
        (r"\bORBCOMM\b", Constellation::Orbcomm),
    ]
    .into_iter()
    .map(|(pattern, c)| {
        let re = Regex::new(&format!("(?i){pattern}")).expect("constellation pattern is valid");
        (re, c)
    })
    .collect()
});

/// Constellation of an object from its name, or `None` when no pattern matches.
///
/// ```
/// use skypass::constellation::{classify_constellation, Constellation};
///
/// assert_eq!(classify_constellation("GPS BIIR-2  (PRN 13)"), Some(Constellation::Gps));
/// assert_eq!(classify_constellation("STARLINK-1007"), Some(Constellation::Starlink));
/// assert_eq!(classify_constellation("ISS (ZARYA)"), None);
/// ```
pub fn classify_constellation(name: &str) -> Option<Constellation> {
    CONSTELLATION_TABLE
        .iter()
        .find(|(re, _)| re.is_match(name))
        .map(|(_, c)| *c)
}
