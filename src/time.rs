//! # Time scales and sidereal time
//!
//! Conversions between [`hifitime::Epoch`] and the scalar time arguments used by the
//! propagator, plus the Greenwich mean sidereal time that links the inertial and
//! Earth-fixed frames.
//!
//! ## Units
//!
//! - Julian dates are **UTC days**; UT1 − UTC is neglected, as in the two-line element practice.
//! - Elapsed propagation time is in **minutes**.
//! - Sidereal angles are in **radians**, normalized to `[0, 2π)`.

use hifitime::{Epoch, Unit};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{
    Minute, Radian, DAYS_PER_CENTURY, DPI, JD_J2000, JD_SGP4_ORIGIN, RADEG, SECONDS_PER_DAY,
};
use crate::skypass_errors::DecodeError;

static ISO_UTC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(\d{4})-(\d{2})-(\d{2})[T ](\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,9}))?\s*(?:Z|UTC|\+00:00)?\s*$",
    )
    .expect("ISO-8601 pattern is valid")
});

/// Julian date (UTC) of an epoch.
pub fn julian_date(epoch: &Epoch) -> f64 {
    epoch.to_jde_utc_days()
}

/// Days elapsed since 1949-12-31 00:00 UTC, the SGP4 epoch origin.
pub fn sgp4_epoch_days(epoch: &Epoch) -> f64 {
    julian_date(epoch) - JD_SGP4_ORIGIN
}

/// Signed minutes from `from` to `to`.
pub fn minutes_between(from: &Epoch, to: &Epoch) -> Minute {
    (*to - *from).to_unit(Unit::Minute)
}

/// Greenwich mean sidereal time (IAU-82) of a Julian date.
///
/// Arguments
/// ---------
/// * `jd_ut1`: Julian date, UT1 (UTC is used in practice).
///
/// Return
/// ------
/// * GMST in radians, in `[0, 2π)`.
pub fn gstime(jd_ut1: f64) -> Radian {
    let tut1 = (jd_ut1 - JD_J2000) / DAYS_PER_CENTURY;
    let seconds = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093104 * tut1 * tut1
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * tut1
        + 67_310.548_41;

    // 1 second of sidereal time is 1/240 degree
    let mut temp = (seconds * RADEG / 240.0) % DPI;
    if temp < 0.0 {
        temp += DPI;
    }
    temp
}

/// Greenwich sidereal time used by the historical AFSPC code, from SGP4 epoch days.
pub fn gstime_afspc(epoch_days: f64) -> Radian {
    const C1: f64 = 1.720_279_169_407_036_39e-2;
    const THGR70: f64 = 1.732_134_385_650_937_4;
    const FK5R: f64 = 5.075_514_194_322_694_42e-15;

    let ts70 = epoch_days - 7305.0;
    let ds70 = (ts70 + 1.0e-8).floor();
    let tfrac = ts70 - ds70;
    let c1p2p = C1 + DPI;
    let mut gsto = (THGR70 + C1 * ds70 + c1p2p * tfrac + ts70 * ts70 * FK5R) % DPI;
    if gsto < 0.0 {
        gsto += DPI;
    }
    gsto
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Split a 1-based day of year into (month, day of month).
fn month_day(year: i32, day_of_year: u32) -> Option<(u8, u8)> {
    let feb = if is_leap_year(year) { 29 } else { 28 };
    let lengths = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

    let mut remaining = day_of_year;
    for (month, len) in lengths.iter().enumerate() {
        if remaining >= 1 && remaining <= *len {
            return Some((month as u8 + 1, remaining as u8));
        }
        remaining = remaining.checked_sub(*len)?;
    }
    None
}

/// Epoch of a two-line element set.
///
/// Arguments
/// ---------
/// * `two_digit_year`: columns 19-20 of line 1; 57-99 map to 19xx, 00-56 to 20xx.
/// * `day_of_year`: fractional day of year, 1.0 being January 1st at 00:00 UTC.
///
/// Return
/// ------
/// * The UTC [`Epoch`], or [`DecodeError::InvalidEpoch`] for an impossible day number.
pub fn tle_epoch(two_digit_year: u32, day_of_year: f64) -> Result<Epoch, DecodeError> {
    if two_digit_year > 99 || !day_of_year.is_finite() || day_of_year < 1.0 {
        return Err(DecodeError::InvalidEpoch(format!(
            "year {two_digit_year:02}, day {day_of_year}"
        )));
    }
    let year = if two_digit_year < 57 {
        2000 + two_digit_year as i32
    } else {
        1900 + two_digit_year as i32
    };

    let whole = day_of_year.floor();
    let mut ns_of_day = ((day_of_year - whole) * SECONDS_PER_DAY * 1e9).round() as u64;
    let mut day = whole as u32;
    const NS_PER_DAY: u64 = 86_400_000_000_000;
    if ns_of_day >= NS_PER_DAY {
        ns_of_day -= NS_PER_DAY;
        day += 1;
    }

    let (month, dom) = month_day(year, day).ok_or_else(|| {
        DecodeError::InvalidEpoch(format!("day {day_of_year} does not exist in {year}"))
    })?;

    let hour = ns_of_day / 3_600_000_000_000;
    let minute = (ns_of_day / 60_000_000_000) % 60;
    let second = (ns_of_day / 1_000_000_000) % 60;
    let nanos = ns_of_day % 1_000_000_000;

    Epoch::maybe_from_gregorian_utc(
        year,
        month,
        dom,
        hour as u8,
        minute as u8,
        second as u8,
        nanos as u32,
    )
    .map_err(|e| DecodeError::InvalidEpoch(e.to_string()))
}

/// Parse an ISO-8601 UTC timestamp such as `2024-03-01T12:34:56.789012`.
///
/// A trailing `Z`, `UTC` or `+00:00` is accepted; other offsets are rejected.
pub fn parse_iso_utc(text: &str) -> Result<Epoch, DecodeError> {
    let invalid = || DecodeError::InvalidEpoch(text.to_string());
    let caps = ISO_UTC.captures(text).ok_or_else(invalid)?;

    let field = |i: usize| -> Result<u32, DecodeError> {
        caps.get(i)
            .ok_or_else(invalid)?
            .as_str()
            .parse::<u32>()
            .map_err(|_| invalid())
    };

    let year = field(1)? as i32;
    let (month, day) = (field(2)? as u8, field(3)? as u8);
    let (hour, minute, second) = (field(4)? as u8, field(5)? as u8, field(6)? as u8);
    let nanos = match caps.get(7) {
        Some(m) => {
            let digits = m.as_str();
            let padded = format!("{digits:0<9}");
            padded.parse::<u32>().map_err(|_| invalid())?
        }
        None => 0,
    };

    Epoch::maybe_from_gregorian_utc(year, month, day, hour, minute, second, nanos)
        .map_err(|e| DecodeError::InvalidEpoch(format!("{text}: {e}")))
}

#[cfg(test)]
mod time_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gstime_reference() {
        // 1992-08-20 12:14 UT1
        let gmst = gstime(2_448_855.009_722);
        assert_relative_eq!(gmst, 2.663_000_816_552_504, epsilon = 1e-9);
    }

    #[test]
    fn test_gstime_range() {
        for k in 0..100 {
            let g = gstime(2_451_545.0 + k as f64 * 13.37);
            assert!((0.0..DPI).contains(&g));
        }
    }

    #[test]
    fn test_gstime_afspc_close_to_iau82() {
        let jd = 2_460_000.5 + 0.25;
        let a = gstime(jd);
        let b = gstime_afspc(jd - JD_SGP4_ORIGIN);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_tle_epoch_00005() {
        let epoch = tle_epoch(0, 179.784_950_62).unwrap();
        let expected = Epoch::from_gregorian_utc(2000, 6, 27, 18, 50, 19, 733_568_000);
        assert!((epoch - expected).to_unit(Unit::Second).abs() < 1e-6);
        assert_relative_eq!(
            sgp4_epoch_days(&epoch),
            18_441.784_950_62,
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_tle_epoch_century_pivot() {
        let e57 = tle_epoch(57, 1.0).unwrap();
        assert_eq!(e57, Epoch::from_gregorian_utc_at_midnight(1957, 1, 1));
        let e56 = tle_epoch(56, 1.5).unwrap();
        assert_eq!(e56, Epoch::from_gregorian_utc_at_noon(2056, 1, 1));
    }

    #[test]
    fn test_tle_epoch_leap_day() {
        let e = tle_epoch(24, 60.0).unwrap();
        assert_eq!(e, Epoch::from_gregorian_utc_at_midnight(2024, 2, 29));
        assert!(tle_epoch(23, 366.0).is_err());
        assert!(tle_epoch(23, 0.5).is_err());
    }

    #[test]
    fn test_parse_iso_utc() {
        let e = parse_iso_utc("2024-03-01T12:34:56.789").unwrap();
        assert_eq!(
            e,
            Epoch::from_gregorian_utc(2024, 3, 1, 12, 34, 56, 789_000_000)
        );
        let z = parse_iso_utc(" 2024-03-01T00:00:00Z ").unwrap();
        assert_eq!(z, Epoch::from_gregorian_utc_at_midnight(2024, 3, 1));
        assert!(parse_iso_utc("2024-13-01T00:00:00").is_err());
        assert!(parse_iso_utc("yesterday").is_err());
        assert!(parse_iso_utc("2024-03-01T00:00:00+02:00").is_err());
    }

    #[test]
    fn test_minutes_between_sign() {
        let a = Epoch::from_gregorian_utc_at_midnight(2024, 3, 1);
        let b = Epoch::from_gregorian_utc_at_noon(2024, 3, 1);
        assert_relative_eq!(minutes_between(&a, &b), 720.0);
        assert_relative_eq!(minutes_between(&b, &a), -720.0);
    }
}
