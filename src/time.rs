//! # Time handling
//!
//! Every instant used by the engine is a [`hifitime::Epoch`] normalized to UTC at construction.
//! This module converts user supplied dates into that canonical form and provides the sidereal
//! time needed by the horizontal-coordinate transform.
//!
//! ## Accepted inputs ([`parse_instant`])
//!
//! | Input                          | Meaning                         |
//! |--------------------------------|---------------------------------|
//! | `2025-06-09`                   | 00:00:00 UTC that day           |
//! | `2025-06-09 21:30` / `T21:30:15.5` | naive datetime, read as UTC |
//! | `2025-06-09T21:30:00Z`         | UTC                             |
//! | `2025-06-09T23:30:00+02:00`    | converted to UTC                |
//!
//! UT1 − UTC is neglected (< 0.9 s), which is far below the precision of the sampling grid.
use hifitime::{Duration, Epoch};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::astromosaic_errors::AstroMosaicError;
use crate::constants::{Degree, Radian, DPI, SECONDS_PER_DAY, T2000};

static INSTANT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ](\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?)?\s*(Z|[+-]\d{2}(?::?\d{2})?)?$",
    )
    .expect("static regex")
});

fn capture<T: std::str::FromStr>(
    caps: &regex::Captures,
    idx: usize,
    input: &str,
) -> Result<Option<T>, AstroMosaicError> {
    caps.get(idx)
        .map(|m| {
            m.as_str()
                .parse::<T>()
                .map_err(|_| AstroMosaicError::InvalidDate(input.to_string()))
        })
        .transpose()
}

/// Parse a UTC offset such as `Z`, `+02`, `-0530` or `+02:00` into seconds east of UTC.
fn parse_offset_seconds(offset: &str) -> Result<i64, AstroMosaicError> {
    if offset == "Z" {
        return Ok(0);
    }
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let digits: String = offset[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    let hours: i64 = digits[..2]
        .parse()
        .map_err(|_| AstroMosaicError::InvalidDate(offset.to_string()))?;
    let minutes: i64 = if digits.len() >= 4 {
        digits[2..4]
            .parse()
            .map_err(|_| AstroMosaicError::InvalidDate(offset.to_string()))?
    } else {
        0
    };
    if hours > 14 || minutes >= 60 {
        return Err(AstroMosaicError::InvalidDate(offset.to_string()));
    }
    Ok(sign * (hours * 3600 + minutes * 60))
}

/// Normalize a date or datetime string to a UTC [`Epoch`].
///
/// Arguments
/// -----------------
/// * `input`: a date (`YYYY-MM-DD`), a naive datetime (treated as UTC) or a datetime with a
///   `Z` / `±HH:MM` suffix.
///
/// Return
/// ----------
/// * The instant in UTC.
///
/// Errors
/// ----------
/// * [`AstroMosaicError::InvalidDate`] if the text does not match one of the accepted forms or
///   names a non-existent calendar date.
pub fn parse_instant(input: &str) -> Result<Epoch, AstroMosaicError> {
    let input = input.trim();
    let caps = INSTANT_RE
        .captures(input)
        .ok_or_else(|| AstroMosaicError::InvalidDate(input.to_string()))?;

    let year: i32 = capture(&caps, 1, input)?.unwrap_or_default();
    let month: u8 = capture(&caps, 2, input)?.unwrap_or_default();
    let day: u8 = capture(&caps, 3, input)?.unwrap_or_default();
    let hour: u8 = capture(&caps, 4, input)?.unwrap_or(0);
    let minute: u8 = capture(&caps, 5, input)?.unwrap_or(0);
    let second: u8 = capture(&caps, 6, input)?.unwrap_or(0);

    // Fractional seconds, right padded to nanoseconds.
    let nanos: u32 = match caps.get(7) {
        Some(m) => format!("{:0<9}", m.as_str())
            .parse()
            .map_err(|_| AstroMosaicError::InvalidDate(input.to_string()))?,
        None => 0,
    };

    if hour > 23 || minute > 59 || second > 59 {
        return Err(AstroMosaicError::InvalidDate(input.to_string()));
    }

    let local = Epoch::maybe_from_gregorian_utc(year, month, day, hour, minute, second, nanos)
        .map_err(|e| AstroMosaicError::InvalidDate(format!("{input}: {e}")))?;

    let offset = match caps.get(8) {
        Some(m) => parse_offset_seconds(m.as_str())?,
        None => 0,
    };

    Ok(local - Duration::from_seconds(offset as f64))
}

/// Midnight (00:00:00 UTC) of the calendar day containing `epoch`.
pub fn utc_midnight(epoch: Epoch) -> Epoch {
    let (y, m, d, _, _, _, _) = epoch.to_gregorian_utc();
    Epoch::from_gregorian_utc_at_midnight(y, m, d)
}

/// Shift an instant by a (possibly fractional, possibly negative) number of hours.
pub fn add_hours(epoch: Epoch, hours: f64) -> Epoch {
    epoch + Duration::from_seconds(hours * 3600.0)
}

/// Shift an instant by a number of minutes.
pub fn add_minutes(epoch: Epoch, minutes: f64) -> Epoch {
    epoch + Duration::from_seconds(minutes * 60.0)
}

/// Shift an instant by a number of days.
pub fn add_days(epoch: Epoch, days: f64) -> Epoch {
    epoch + Duration::from_seconds(days * SECONDS_PER_DAY)
}

/// Signed difference `a - b` in seconds.
pub fn seconds_between(a: Epoch, b: Epoch) -> f64 {
    (a - b).to_seconds()
}

/// `YYYY-MM-DD HH:MM:SS` rendering in UTC, rounded to the nearest second.
pub fn format_utc_timestamp(epoch: Epoch) -> String {
    let rounded = epoch.round(Duration::from_seconds(1.0));
    let (y, mo, d, h, mi, s, _) = rounded.to_gregorian_utc();
    format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}")
}

/// `YYYY-MM-DD` rendering in UTC.
pub fn format_utc_date(epoch: Epoch) -> String {
    let (y, mo, d, _, _, _, _) = epoch.to_gregorian_utc();
    format!("{y:04}-{mo:02}-{d:02}")
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
///
/// # References
/// * IAU 1982, IERS Conventions 1996/2000.
/// * Explanatory Supplement to the Astronomical Almanac (1992).
pub fn gmst(tjm: f64) -> Radian {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Ratio of sidereal day to solar day
    const RAP: f64 = 1.00273790934;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / SECONDS_PER_DAY;

    // Rotation accumulated since 0h UT1, in sidereal radians
    let h = (tjm - itjm) * DPI;

    (gmst0 + h * RAP).rem_euclid(DPI)
}

/// Local mean sidereal time at an east longitude, in radians `[0, 2π)`.
pub fn local_sidereal_time(epoch: Epoch, longitude: Degree) -> Radian {
    (gmst(epoch.to_mjd_utc_days()) + longitude.to_radians()).rem_euclid(DPI)
}

/// Modified Julian Date in the TT scale, the argument of the precession and ephemeris models.
pub fn mjd_tt(epoch: Epoch) -> f64 {
    epoch.to_mjd_tt_days()
}

#[cfg(test)]
mod time_test {
    use super::*;

    #[test]
    fn test_parse_date_only() {
        let e = parse_instant("2025-06-09").unwrap();
        assert_eq!(e, Epoch::from_gregorian_utc_at_midnight(2025, 6, 9));
        assert_eq!(format_utc_timestamp(e), "2025-06-09 00:00:00");
    }

    #[test]
    fn test_parse_naive_and_aware() {
        let naive = parse_instant("2025-06-09T21:30:15").unwrap();
        assert_eq!(format_utc_timestamp(naive), "2025-06-09 21:30:15");

        let spaced = parse_instant("2025-06-09 21:30").unwrap();
        assert_eq!(format_utc_timestamp(spaced), "2025-06-09 21:30:00");

        let zulu = parse_instant("2025-06-09T21:30:15Z").unwrap();
        assert_eq!(zulu, naive);

        let aware = parse_instant("2025-06-09T23:30:15+02:00").unwrap();
        assert_eq!(aware, naive);

        let west = parse_instant("2025-06-09T16:00:15-0530").unwrap();
        assert_eq!(west, naive);

        let frac = parse_instant("2025-06-09T21:30:15.5").unwrap();
        assert_eq!(seconds_between(frac, naive), 0.5);
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "yesterday", "2025-13-01", "2025-02-30", "2025-06-09T25:00"] {
            assert!(
                matches!(parse_instant(bad), Err(AstroMosaicError::InvalidDate(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_midnight_and_shifts() {
        let e = parse_instant("2025-06-09T21:30:00").unwrap();
        assert_eq!(format_utc_timestamp(utc_midnight(e)), "2025-06-09 00:00:00");
        assert_eq!(format_utc_timestamp(add_hours(e, -2.5)), "2025-06-09 19:00:00");
        assert_eq!(format_utc_timestamp(add_minutes(e, 45.0)), "2025-06-09 22:15:00");
        assert_eq!(format_utc_date(add_days(e, 30.0)), "2025-07-09");
    }

    #[test]
    fn test_gmst() {
        let tut = 57028.478514610404;
        let res_gmst = gmst(tut);
        approx::assert_abs_diff_eq!(res_gmst, 4.851925725092499, epsilon = 1e-12);

        let res_gmst = gmst(T2000);
        approx::assert_abs_diff_eq!(res_gmst, 4.894961212789145, epsilon = 1e-12);
    }

    #[test]
    fn test_local_sidereal_time_wraps() {
        let e = Epoch::from_mjd_utc(T2000);
        let lst = local_sidereal_time(e, 180.0);
        assert!((0.0..DPI).contains(&lst));
        approx::assert_abs_diff_eq!(
            lst,
            (4.894961212789145 + std::f64::consts::PI).rem_euclid(DPI),
            epsilon = 1e-9
        );
    }
}
