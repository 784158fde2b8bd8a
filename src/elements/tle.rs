//! # Two-line element decoding
//!
//! Reader for the fixed-column NORAD two-line element format.
//!
//! ```text
//! 1 NNNNNC NNNNNAAA NNNNN.NNNNNNNN +.NNNNNNNN +NNNNN-N +NNNNN-N N NNNNN
//! 2 NNNNN NNN.NNNN NNN.NNNN NNNNNNN NNN.NNNN NNN.NNNN NN.NNNNNNNNNNNNNN
//! ```
//!
//! Columns are 1-based in the format description and 0-based in the code below. Fields with an
//! implied decimal point and exponent (`n̈/6`, `B*`) are decoded as `±0.ddddd × 10^±e`.
//!
//! A record may be preceded by a name line (optionally prefixed with `0 `), may contain blank
//! lines, and may be surrounded by whitespace. Checksum and catalog-number mismatches are
//! logged and otherwise ignored, as many archived element sets carry stale checksums.

use tracing::warn;

use crate::constants::{MINUTES_PER_DAY, RADEG};
use crate::elements::{ElementIdentity, MeanElements};
use crate::skypass_errors::DecodeError;
use crate::time::tle_epoch;

const LINE1_MIN_LEN: usize = 61;
const LINE2_MIN_LEN: usize = 63;

/// Revolutions per day → rad/min
const XPDOTP: f64 = MINUTES_PER_DAY / crate::constants::DPI;

/// One record of a multi-record text catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TleEntry {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

impl TleEntry {
    /// Record text in its three-line (or two-line) form.
    pub fn to_text(&self) -> String {
        match &self.name {
            Some(name) => format!("{name}\n{}\n{}", self.line1, self.line2),
            None => format!("{}\n{}", self.line1, self.line2),
        }
    }
}

fn field<'a>(line: &'a str, range: std::ops::Range<usize>) -> &'a str {
    let end = range.end.min(line.len());
    let start = range.start.min(end);
    line[start..end].trim()
}

fn parse_f64(line: &str, range: std::ops::Range<usize>, name: &'static str) -> Result<f64, DecodeError> {
    let raw = field(line, range);
    // Some producers write "+.00001234"
    let cleaned = raw.strip_prefix('+').unwrap_or(raw);
    cleaned.parse::<f64>().map_err(|_| DecodeError::InvalidField {
        field: name,
        value: raw.to_string(),
    })
}

fn parse_u32_or_zero(line: &str, range: std::ops::Range<usize>, name: &'static str) -> Result<u32, DecodeError> {
    let raw = field(line, range);
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u32>().map_err(|_| DecodeError::InvalidField {
        field: name,
        value: raw.to_string(),
    })
}

/// Decode an implied-decimal field such as ` 28098-4` or `-11606-4`.
///
/// Return
/// ------
/// * `±0.ddddd × 10^e`, or [`DecodeError::InvalidField`] for a malformed field.
pub fn parse_implied_decimal(raw: &str, name: &'static str) -> Result<f64, DecodeError> {
    let invalid = || DecodeError::InvalidField {
        field: name,
        value: raw.to_string(),
    };
    let s = raw.trim();
    if s.len() < 3 {
        return Err(invalid());
    }
    let (mantissa, exponent) = s.split_at(s.len() - 2);
    let (sign, digits) = match mantissa.as_bytes().first() {
        Some(b'-') => (-1.0, &mantissa[1..]),
        Some(b'+') => (1.0, &mantissa[1..]),
        _ => (1.0, mantissa),
    };
    let digits = digits.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let exponent = exponent.trim().parse::<i32>().map_err(|_| invalid())?;
    let value = format!("0.{digits}").parse::<f64>().map_err(|_| invalid())?;
    Ok(sign * value * 10f64.powi(exponent))
}

/// Modulo-10 checksum of the first 68 columns: digits count their value, '-' counts one.
pub fn checksum(line: &str) -> u32 {
    line.bytes()
        .take(68)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

fn verify_checksum(line: &str, number: u8) {
    let Some(expected) = line.as_bytes().get(68).filter(|b| b.is_ascii_digit()) else {
        return;
    };
    let expected = (expected - b'0') as u32;
    let computed = checksum(line);
    if expected != computed {
        warn!(line = number, expected, computed, "TLE checksum mismatch");
    }
}

/// Catalog number, with Alpha-5 support (`A0001` = 100001).
fn parse_catalog(raw: &str) -> Result<u32, DecodeError> {
    let invalid = || DecodeError::InvalidField {
        field: "catalog_number",
        value: raw.to_string(),
    };
    let s = raw.trim();
    let first = s.chars().next().ok_or_else(invalid)?;
    if first.is_ascii_alphabetic() {
        // I and O are skipped to avoid confusion with 1 and 0
        let letter = first.to_ascii_uppercase();
        if letter == 'I' || letter == 'O' {
            return Err(invalid());
        }
        let mut offset = (letter as u32) - ('A' as u32) + 10;
        if letter > 'I' {
            offset -= 1;
        }
        if letter > 'O' {
            offset -= 1;
        }
        let rest = s[1..].parse::<u32>().map_err(|_| invalid())?;
        return Ok(offset * 10_000 + rest);
    }
    s.parse::<u32>().map_err(|_| invalid())
}

fn check_line(line: &str, number: u8, min: usize) -> Result<(), DecodeError> {
    let prefix = format!("{number} ");
    if !line.starts_with(&prefix) {
        return Err(DecodeError::LinePrefix {
            line: number,
            found: line.chars().take(2).collect(),
        });
    }
    if line.len() < min {
        return Err(DecodeError::LineTooShort {
            line: number,
            len: line.len(),
            min,
        });
    }
    Ok(())
}

/// Decode the two lines of an element set.
///
/// Arguments
/// ---------
/// * `line1`, `line2`: the element lines; surrounding whitespace is ignored.
///
/// Return
/// ------
/// * The [`MeanElements`] in radians and rad/min, and the record [`ElementIdentity`]
///   (without a name).
pub fn parse_tle(line1: &str, line2: &str) -> Result<(MeanElements, ElementIdentity), DecodeError> {
    if !line1.is_ascii() || !line2.is_ascii() {
        return Err(DecodeError::NonAscii);
    }
    let l1 = line1.trim();
    let l2 = line2.trim();
    check_line(l1, 1, LINE1_MIN_LEN)?;
    check_line(l2, 2, LINE2_MIN_LEN)?;
    verify_checksum(l1, 1);
    verify_checksum(l2, 2);

    let catalog_number = parse_catalog(field(l1, 2..7))?;
    let catalog_line2 = parse_catalog(field(l2, 2..7))?;
    if catalog_number != catalog_line2 {
        warn!(
            line1 = catalog_number,
            line2 = catalog_line2,
            "TLE catalog numbers differ between lines"
        );
    }

    let classification = l1.as_bytes()[7] as char;
    let classification = if classification == ' ' { 'U' } else { classification };
    let international_designator = field(l1, 9..17).to_string();

    let year = field(l1, 18..20);
    let year = year.parse::<u32>().map_err(|_| DecodeError::InvalidField {
        field: "epoch_year",
        value: year.to_string(),
    })?;
    let day_of_year = parse_f64(l1, 20..32, "epoch_day")?;
    let epoch = tle_epoch(year, day_of_year)?;

    let ndot = parse_f64(l1, 33..43, "mean_motion_dot")?;
    let nddot = parse_implied_decimal(field(l1, 44..52), "mean_motion_ddot")?;
    let bstar = parse_implied_decimal(field(l1, 53..61), "bstar")?;
    let ephemeris_type = field(l1, 62..63).parse::<u8>().unwrap_or(0);
    let element_set = parse_u32_or_zero(l1, 64..68, "element_set")?;

    let inclination = parse_f64(l2, 8..16, "inclination")?;
    let raan = parse_f64(l2, 17..25, "raan")?;
    let ecc_digits = field(l2, 26..33);
    if ecc_digits.is_empty() || !ecc_digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidField {
            field: "eccentricity",
            value: ecc_digits.to_string(),
        });
    }
    let eccentricity = format!("0.{ecc_digits}")
        .parse::<f64>()
        .map_err(|_| DecodeError::InvalidField {
            field: "eccentricity",
            value: ecc_digits.to_string(),
        })?;
    let arg_perigee = parse_f64(l2, 34..42, "arg_perigee")?;
    let mean_anomaly = parse_f64(l2, 43..51, "mean_anomaly")?;
    let mean_motion = parse_f64(l2, 52..63, "mean_motion")?;
    let revolution = parse_u32_or_zero(l2, 63..68, "revolution")?;

    let mean = MeanElements {
        epoch,
        mean_motion: mean_motion / XPDOTP,
        eccentricity,
        inclination: inclination * RADEG,
        raan: raan * RADEG,
        arg_perigee: arg_perigee * RADEG,
        mean_anomaly: mean_anomaly * RADEG,
        bstar,
        mean_motion_dot: ndot / (XPDOTP * MINUTES_PER_DAY),
        mean_motion_ddot: nddot / (XPDOTP * MINUTES_PER_DAY * MINUTES_PER_DAY),
    };
    let identity = ElementIdentity {
        catalog_number,
        international_designator,
        classification,
        element_set,
        revolution,
        ephemeris_type,
        name: None,
    };
    Ok((mean, identity))
}

fn strip_name(line: &str) -> String {
    line.strip_prefix("0 ").unwrap_or(line).trim().to_string()
}

/// Decode a two- or three-line text record.
///
/// Blank lines are skipped. With three lines the first one is the object name.
pub fn parse_tle_text(text: &str) -> Result<(MeanElements, ElementIdentity), DecodeError> {
    if !text.is_ascii() {
        return Err(DecodeError::NonAscii);
    }
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let (name, l1, l2) = match lines.as_slice() {
        [] => return Err(DecodeError::MissingLine(1)),
        [only] if only.starts_with("2 ") => return Err(DecodeError::MissingLine(1)),
        [_] => return Err(DecodeError::MissingLine(2)),
        [l1, l2] => (None, *l1, *l2),
        [name, l1, l2] => (Some(strip_name(name)), *l1, *l2),
        [_, _, _, extra, ..] => {
            return Err(DecodeError::InvalidField {
                field: "record",
                value: (*extra).to_string(),
            })
        }
    };

    let (mean, mut identity) = parse_tle(l1, l2)?;
    identity.name = name;
    Ok((mean, identity))
}

/// Split a text catalog into records.
///
/// A record is a `1 ` line immediately followed by a `2 ` line; a preceding line that is
/// neither becomes its name. Unpaired lines are skipped with a warning.
pub fn split_catalog(text: &str) -> Vec<TleEntry> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut entries = Vec::new();
    let mut pending_name: Option<&str> = None;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if line.starts_with("1 ") {
            match lines.get(i + 1) {
                Some(next) if next.starts_with("2 ") => {
                    entries.push(TleEntry {
                        name: pending_name.take().map(strip_name),
                        line1: line.to_string(),
                        line2: next.to_string(),
                    });
                    i += 2;
                    continue;
                }
                _ => {
                    warn!(line = i + 1, "line 1 without a matching line 2");
                    pending_name = None;
                }
            }
        } else if line.starts_with("2 ") {
            warn!(line = i + 1, "line 2 without a preceding line 1");
            pending_name = None;
        } else {
            pending_name = Some(line);
        }
        i += 1;
    }
    entries
}

#[cfg(test)]
mod tle_test {
    use super::*;
    use crate::constants::DPI;
    use approx::assert_relative_eq;
    use hifitime::Epoch;

    const L1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const L2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

    #[test]
    fn test_parse_vanguard() {
        let (mean, id) = parse_tle(L1, L2).unwrap();
        assert_eq!(id.catalog_number, 5);
        assert_eq!(id.classification, 'U');
        assert_eq!(id.international_designator, "58002B");
        assert_eq!(id.element_set, 475);
        assert_eq!(id.revolution, 41366);
        assert_relative_eq!(mean.eccentricity, 0.1859667);
        assert_relative_eq!(mean.inclination, 34.2682 * RADEG);
        assert_relative_eq!(mean.bstar, 0.28098e-4, epsilon = 1e-18);
        assert_relative_eq!(mean.mean_motion, 10.82419157 * DPI / 1440.0, epsilon = 1e-12);
        let expected = Epoch::from_gregorian_utc(2000, 6, 27, 18, 50, 19, 733_568_000);
        assert!((mean.epoch - expected).abs().to_seconds() < 1e-6);
    }

    #[test]
    fn test_implied_decimal() {
        assert_relative_eq!(parse_implied_decimal(" 28098-4", "b").unwrap(), 0.28098e-4);
        assert_relative_eq!(parse_implied_decimal("-11606-4", "b").unwrap(), -0.11606e-4);
        assert_relative_eq!(parse_implied_decimal("+12345+1", "b").unwrap(), 1.2345);
        assert_eq!(parse_implied_decimal(" 00000-0", "b").unwrap(), 0.0);
        assert!(parse_implied_decimal("abcde-1", "b").is_err());
        assert!(parse_implied_decimal("-4", "b").is_err());
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(L1), 3);
        assert_eq!(checksum(L2), 7);
    }

    #[test]
    fn test_bad_checksum_is_not_fatal() {
        let l1 = format!("{}0", &L1[..68]);
        assert!(parse_tle(&l1, L2).is_ok());
    }

    #[test]
    fn test_prefix_and_length_errors() {
        assert!(matches!(
            parse_tle(L2, L1),
            Err(DecodeError::LinePrefix { line: 1, .. })
        ));
        assert!(matches!(
            parse_tle(&L1[..40], L2),
            Err(DecodeError::LineTooShort { line: 1, .. })
        ));
        assert_eq!(parse_tle("1 0000é", L2), Err(DecodeError::NonAscii));
    }

    #[test]
    fn test_invalid_numeric_field() {
        let l2 = L2.replace("34.2682", "34.2x82");
        assert_eq!(
            parse_tle(L1, &l2),
            Err(DecodeError::InvalidField {
                field: "inclination",
                value: "34.2x82".into()
            })
        );
    }

    #[test]
    fn test_three_line_text() {
        let text = format!("\n  0 VANGUARD 1  \n\n{L1}\n{L2}\n\n");
        let (_, id) = parse_tle_text(&text).unwrap();
        assert_eq!(id.name.as_deref(), Some("VANGUARD 1"));
        assert_eq!(parse_tle_text(L1), Err(DecodeError::MissingLine(2)));
        assert_eq!(parse_tle_text("   "), Err(DecodeError::MissingLine(1)));
    }

    #[test]
    fn test_alpha5_catalog() {
        assert_eq!(parse_catalog("A0001").unwrap(), 100_001);
        assert_eq!(parse_catalog("J0000").unwrap(), 180_000);
        assert_eq!(parse_catalog("Z9999").unwrap(), 339_999);
        assert!(parse_catalog("I0001").is_err());
    }

    #[test]
    fn test_split_catalog() {
        let text = format!("VANGUARD 1\n{L1}\n{L2}\n{L1}\n{L2}\nORPHAN\n{L2}\n");
        let entries = split_catalog(&text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name.as_deref(), Some("VANGUARD 1"));
        assert_eq!(entries[1].name, None);
        assert!(parse_tle_text(&entries[0].to_text()).is_ok());
    }
}
