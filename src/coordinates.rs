//! # Sky coordinates
//!
//! Plain value types shared by every component of the engine:
//!
//! - [`SkyPoint`] – a fixed equatorial direction (RA/Dec, degrees), validated on construction.
//! - [`AngleUnit`] – unit of a right ascension value (hours or degrees).
//! - [`HorizontalCoord`] – topocentric altitude/azimuth of a body.
//!
//! ## Normalization policy
//!
//! A [`SkyPoint`] never holds a declination outside `[-90, 90]`. Right ascension is kept as
//! given (any finite value); consumers pick their own range explicitly:
//!
//! - [`SkyPoint::ra_0_360`] for catalog-style output,
//! - [`wrap_ra_signed`] for the mosaic boundary (`[-180, 180]`).
//!
//! ## See also
//! ------------
//! * [`crate::conversion`] – textual encodings of [`SkyPoint`].
//! * [`crate::observers::geometry`] – produces [`HorizontalCoord`] values.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::astromosaic_errors::AstroMosaicError;
use crate::constants::{Degree, Hour, HOUR_TO_DEG};

/// Unit of a right ascension value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleUnit {
    /// RA expressed in hours, converted with ×15.
    Hours,
    /// RA already expressed in degrees.
    Degrees,
}

/// Fixed equatorial direction, J2000 unless stated otherwise.
///
/// Invariant
/// -----------------
/// * `dec_deg` ∈ `[-90, 90]`, both fields finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPoint {
    pub ra_deg: Degree,
    pub dec_deg: Degree,
}

impl SkyPoint {
    /// Build a validated sky point.
    ///
    /// Arguments
    /// -----------------
    /// * `ra_deg`: right ascension in degrees (kept as given).
    /// * `dec_deg`: declination in degrees.
    ///
    /// Return
    /// ----------
    /// * The point, or [`AstroMosaicError::RangeError`] when `|dec_deg| > 90` or a value is not finite.
    pub fn new(ra_deg: Degree, dec_deg: Degree) -> Result<Self, AstroMosaicError> {
        if !ra_deg.is_finite() || !dec_deg.is_finite() {
            return Err(AstroMosaicError::RangeError(format!(
                "non finite coordinate ({ra_deg}, {dec_deg})"
            )));
        }
        if dec_deg.abs() > 90.0 {
            return Err(AstroMosaicError::RangeError(format!(
                "declination {dec_deg} outside [-90, 90]"
            )));
        }
        Ok(SkyPoint { ra_deg, dec_deg })
    }

    /// Right ascension in hours.
    pub fn ra_hours(&self) -> Hour {
        self.ra_deg / HOUR_TO_DEG
    }

    /// Right ascension folded into `[0, 360)`.
    pub fn ra_0_360(&self) -> Degree {
        self.ra_deg.rem_euclid(360.0)
    }

    /// Unit direction vector in the equatorial frame.
    pub fn to_unit_vector(&self) -> Vector3<f64> {
        let (ra, dec) = (self.ra_deg.to_radians(), self.dec_deg.to_radians());
        Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin())
    }

    /// Inverse of [`SkyPoint::to_unit_vector`]. The vector need not be normalized.
    ///
    /// RA is returned in `[0, 360)`, declination is clamped against rounding overshoot.
    pub fn from_vector(v: &Vector3<f64>) -> Self {
        let r = v.norm();
        let dec = (v.z / r).clamp(-1.0, 1.0).asin().to_degrees();
        let ra = v.y.atan2(v.x).to_degrees().rem_euclid(360.0);
        SkyPoint {
            ra_deg: ra,
            dec_deg: dec,
        }
    }
}

/// Topocentric horizontal coordinates.
///
/// Azimuth is measured from north through east, in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizontalCoord {
    pub altitude_deg: Degree,
    pub azimuth_deg: Degree,
}

/// Angular distance between two equatorial directions, in degrees (`[0, 180]`).
///
/// Uses the haversine form, stable for small separations.
pub fn angular_separation(a: &SkyPoint, b: &SkyPoint) -> Degree {
    let (ra1, dec1) = (a.ra_deg.to_radians(), a.dec_deg.to_radians());
    let (ra2, dec2) = (b.ra_deg.to_radians(), b.dec_deg.to_radians());

    let sin_ddec = ((dec2 - dec1) / 2.0).sin();
    let sin_dra = ((ra2 - ra1) / 2.0).sin();
    let h = sin_ddec * sin_ddec + dec1.cos() * dec2.cos() * sin_dra * sin_dra;

    (2.0 * h.sqrt().clamp(0.0, 1.0).asin()).to_degrees()
}

/// Wrap an angle into `[-180, 180]`. Values already inside the interval are returned unchanged.
pub fn wrap_ra_signed(ra_deg: Degree) -> Degree {
    if (-180.0..=180.0).contains(&ra_deg) {
        return ra_deg;
    }
    let wrapped = (ra_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && ra_deg > 0.0 {
        180.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod coordinates_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_skypoint_rejects_bad_declination() {
        assert!(matches!(
            SkyPoint::new(10.0, 95.0),
            Err(AstroMosaicError::RangeError(_))
        ));
        assert!(matches!(
            SkyPoint::new(10.0, -91.0),
            Err(AstroMosaicError::RangeError(_))
        ));
        assert!(SkyPoint::new(10.0, f64::NAN).is_err());
        assert!(SkyPoint::new(-10.0, 90.0).is_ok());
    }

    #[test]
    fn test_ra_helpers() {
        let p = SkyPoint::new(-30.0, 10.0).unwrap();
        assert_eq!(p.ra_0_360(), 330.0);
        assert_eq!(p.ra_hours(), -2.0);
    }

    #[test]
    fn test_vector_round_trip() {
        let p = SkyPoint::new(148.88821, 69.06528).unwrap();
        let back = SkyPoint::from_vector(&(p.to_unit_vector() * 3.0));
        assert_abs_diff_eq!(back.ra_deg, p.ra_deg, epsilon = 1e-10);
        assert_abs_diff_eq!(back.dec_deg, p.dec_deg, epsilon = 1e-10);
    }

    #[test]
    fn test_angular_separation() {
        let a = SkyPoint::new(0.0, 0.0).unwrap();
        let b = SkyPoint::new(90.0, 0.0).unwrap();
        let pole = SkyPoint::new(123.0, 90.0).unwrap();
        assert_abs_diff_eq!(angular_separation(&a, &b), 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angular_separation(&a, &pole), 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angular_separation(&a, &a), 0.0, epsilon = 1e-12);

        let c = SkyPoint::new(180.0, 0.0).unwrap();
        assert_abs_diff_eq!(angular_separation(&a, &c), 180.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_ra_signed() {
        assert_eq!(wrap_ra_signed(120.0), 120.0);
        assert_eq!(wrap_ra_signed(-180.0), -180.0);
        assert_abs_diff_eq!(wrap_ra_signed(200.0), -160.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_ra_signed(-190.0), 170.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_ra_signed(540.0), 180.0, epsilon = 1e-12);
    }
}
