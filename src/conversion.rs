//! # Coordinate codec
//!
//! Parsing and formatting of equatorial coordinates between their textual encodings and
//! [`SkyPoint`]:
//!
//! - `HH:MM:SS.ss` / `±DD:MM:SS.ss` sexagesimal pairs ([`parse_sexagesimal`], [`format_sexagesimal`]),
//! - decimal pairs with RA in hours or degrees ([`parse_decimal_pair`]),
//! - free-form user input classified by [`classify_coordinate_text`] (slash or comma separators,
//!   space separated fields, compact `HHMMSS DDMMSS`, `d`-prefixed degree pairs).
//!
//! All functions are pure.
//!
//! ## Sign convention
//!
//! The sign of a sexagesimal value is carried by its first field only and applies to the whole
//! value: `-00:30:00` is `-0.5°`, the minutes and seconds fields are magnitudes.
//!
//! ## Precision
//!
//! Formatting rounds to hundredths of a second, so formatting a parsed two-decimal string gives
//! the same string back (modulo a leading `+` and field zero padding).
use crate::astromosaic_errors::AstroMosaicError;
use crate::constants::{Degree, HOUR_TO_DEG};
use crate::coordinates::{AngleUnit, SkyPoint};

/// Hundredths of a second in one hour (or one degree).
const CENTI_SECONDS_PER_UNIT: i64 = 360_000;

/// Textual coordinate encodings recognised in free-form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateText {
    /// `d <ra_deg> <dec_deg>`
    DecimalDegrees(String, String),
    /// `<ra_hours> <dec_deg>`
    DecimalHours(String, String),
    /// `HH:MM:SS ±DD:MM:SS`, already normalized to colon separated fields.
    Sexagesimal(String, String),
    /// Anything else: an object name.
    Name,
}

fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

/// Split `"095533"` / `"+690355"` into colon separated fields.
fn split_compact(token: &str) -> Option<String> {
    let (sign, digits) = match token.strip_prefix(['+', '-']) {
        Some(rest) => (&token[..1], rest),
        None => ("", token),
    };
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!(
        "{sign}{}:{}:{}",
        &digits[0..2],
        &digits[2..4],
        &digits[4..6]
    ))
}

/// Classify a free-form coordinate text.
///
/// Accepted forms
/// -----------------
/// * `d 299.868 40.734` – decimal degrees.
/// * `19:59:28.36 +40:44:03.99`, also with `/` or `,` between RA and Dec.
/// * `19 59 28.36 +40 44 03.99` (six fields), or five fields with missing Dec seconds.
/// * `195928 +404403` – compact sexagesimal.
/// * `19.991 40.734` – RA hours and Dec degrees.
///
/// Return
/// ----------
/// * The recognised encoding. Texts that match none of the forms are [`CoordinateText::Name`].
pub fn classify_coordinate_text(text: &str) -> CoordinateText {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix('d') {
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        if tokens.len() == 2 && tokens.iter().all(|t| is_number(t)) {
            return CoordinateText::DecimalDegrees(tokens[0].into(), tokens[1].into());
        }
    }

    let cleaned = text.replace([',', '/'], " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    if text.contains(':') {
        return match tokens.as_slice() {
            [ra, dec] => CoordinateText::Sexagesimal(ra.to_string(), dec.to_string()),
            _ => CoordinateText::Name,
        };
    }

    if !tokens.iter().all(|t| is_number(t)) {
        return CoordinateText::Name;
    }

    match tokens.as_slice() {
        [h, m, s, d, dm, ds] => {
            CoordinateText::Sexagesimal(format!("{h}:{m}:{s}"), format!("{d}:{dm}:{ds}"))
        }
        [h, m, s, d, dm] => {
            CoordinateText::Sexagesimal(format!("{h}:{m}:{s}"), format!("{d}:{dm}:0"))
        }
        [ra, dec] => match (split_compact(ra), split_compact(dec)) {
            (Some(ra), Some(dec)) => CoordinateText::Sexagesimal(ra, dec),
            _ => CoordinateText::DecimalHours(ra.to_string(), dec.to_string()),
        },
        _ => CoordinateText::Name,
    }
}

/// Parse one `±A:B:C` value into `±(A + B/60 + C/3600)`.
fn parse_sexagesimal_value(value: &str) -> Result<f64, AstroMosaicError> {
    let fields: Vec<&str> = value.split(':').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(AstroMosaicError::FormatError(format!(
            "expected 3 colon separated fields in '{value}', got {}",
            fields.len()
        )));
    }

    let bad_field = || AstroMosaicError::FormatError(format!("invalid numeric field in '{value}'"));

    let sign = if fields[0].starts_with('-') { -1.0 } else { 1.0 };
    let whole: f64 = fields[0]
        .trim_start_matches(['-', '+'])
        .parse()
        .map_err(|_| bad_field())?;
    let minutes: f64 = fields[1].parse().map_err(|_| bad_field())?;
    let seconds: f64 = fields[2].parse().map_err(|_| bad_field())?;

    if !(0.0..60.0).contains(&minutes) || !(0.0..60.0).contains(&seconds) || whole < 0.0 {
        return Err(bad_field());
    }

    Ok(sign * (whole + minutes / 60.0 + seconds / 3600.0))
}

/// Parse a sexagesimal RA/Dec pair.
///
/// Arguments
/// -----------------
/// * `ra_str`: right ascension as `HH:MM:SS.ss`.
/// * `dec_str`: declination as `±DD:MM:SS.ss`.
///
/// Return
/// ----------
/// * The [`SkyPoint`] with RA converted from hours to degrees.
///
/// Errors
/// ----------
/// * [`AstroMosaicError::FormatError`] if either string does not hold exactly three numeric fields.
/// * [`AstroMosaicError::RangeError`] if the declination magnitude exceeds 90°.
pub fn parse_sexagesimal(ra_str: &str, dec_str: &str) -> Result<SkyPoint, AstroMosaicError> {
    let ra_hours = parse_sexagesimal_value(ra_str)?;
    let dec_deg = parse_sexagesimal_value(dec_str)?;
    SkyPoint::new(ra_hours * HOUR_TO_DEG, dec_deg)
}

/// Build a [`SkyPoint`] from a decimal RA/Dec pair.
///
/// `unit` selects whether `ra_val` is in hours (×15) or already in degrees.
/// Fails with [`AstroMosaicError::RangeError`] when `|dec_val| > 90`.
pub fn parse_decimal_pair(
    ra_val: f64,
    dec_val: f64,
    unit: AngleUnit,
) -> Result<SkyPoint, AstroMosaicError> {
    let ra_deg = match unit {
        AngleUnit::Hours => ra_val * HOUR_TO_DEG,
        AngleUnit::Degrees => ra_val,
    };
    SkyPoint::new(ra_deg, dec_val)
}

/// Textual variant of [`parse_decimal_pair`].
pub fn parse_decimal_text(
    ra_txt: &str,
    dec_txt: &str,
    unit: AngleUnit,
) -> Result<SkyPoint, AstroMosaicError> {
    let parse = |t: &str| {
        t.trim()
            .parse::<f64>()
            .map_err(|_| AstroMosaicError::FormatError(format!("'{t}' is not a decimal number")))
    };
    parse_decimal_pair(parse(ra_txt)?, parse(dec_txt)?, unit)
}

/// Split a non-negative value (hours or degrees) into whole units, minutes and
/// hundredths of a second, after rounding to the nearest hundredth of a second.
fn split_centi_seconds(value: f64) -> (i64, i64, i64) {
    let total = (value * CENTI_SECONDS_PER_UNIT as f64).round() as i64;
    let whole = total / CENTI_SECONDS_PER_UNIT;
    let minutes = (total / 6000) % 60;
    let centi = total % 6000;
    (whole, minutes, centi)
}

/// Right ascension (degrees, `[0, 360]`) as `HH:MM:SS.ss`.
fn format_ra(ra_deg: Degree) -> String {
    let (mut h, m, cs) = split_centi_seconds(ra_deg / HOUR_TO_DEG);
    if h >= 24 {
        h -= 24;
    }
    format!("{h:02}:{m:02}:{:02}.{:02}", cs / 100, cs % 100)
}

/// Declination (degrees) as `DD:MM:SS.ss`, prefixed by `-` when negative.
fn format_dec(dec_deg: Degree) -> String {
    let (d, m, cs) = split_centi_seconds(dec_deg.abs());
    let sign = if dec_deg < 0.0 && (d, m, cs) != (0, 0, 0) {
        "-"
    } else {
        ""
    };
    format!("{sign}{d:02}:{m:02}:{:02}.{:02}", cs / 100, cs % 100)
}

/// Format a [`SkyPoint`] as a sexagesimal `(ra_str, dec_str)` pair.
///
/// Negative right ascensions (down to -180°, as produced by the mosaic normalization) are
/// rendered as the equivalent hour angle in `[0h, 24h)`.
///
/// Errors
/// ----------
/// * [`AstroMosaicError::RangeError`] if `ra_deg` lies outside `[-180, 360]` or `dec_deg` outside
///   `[-90, 90]`.
///
/// See also
/// ------------
/// * [`crate::mosaic::tile`] – formats every panel centre through this function.
pub fn format_sexagesimal(point: &SkyPoint) -> Result<(String, String), AstroMosaicError> {
    format_ra_dec(point.ra_deg, point.dec_deg)
}

/// Same as [`format_sexagesimal`] on raw degrees, for values that never became a [`SkyPoint`].
///
/// The accepted RA range is `[-180, 360]`: signed mosaic values and catalog values in
/// `[0, 360)` both format without prior normalization. Anything else is a
/// [`AstroMosaicError::RangeError`].
pub fn format_ra_dec(ra_deg: Degree, dec_deg: Degree) -> Result<(String, String), AstroMosaicError> {
    if !(-180.0..=360.0).contains(&ra_deg) {
        return Err(AstroMosaicError::RangeError(format!(
            "right ascension {ra_deg} outside [-180, 360]"
        )));
    }
    if !(-90.0..=90.0).contains(&dec_deg) {
        return Err(AstroMosaicError::RangeError(format!(
            "declination {dec_deg} outside [-90, 90]"
        )));
    }
    let ra = if ra_deg < 0.0 { ra_deg + 360.0 } else { ra_deg };
    Ok((format_ra(ra), format_dec(dec_deg)))
}
