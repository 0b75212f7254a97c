//! # Observer location & site geometry
//!
//! This module holds the observing site of an engine session and the geometry computed
//! from it:
//!
//! - [`ObserverLocation`](crate::observers::ObserverLocation) – validated geodetic latitude,
//!   longitude and elevation, with the **geocentric parallax constants** (ρ·cosφ′, ρ·sinφ′)
//!   precomputed for the lunar topocentric correction.
//! - [`geodetic_to_parallax`](crate::observers::geodetic_to_parallax) – geodetic latitude/elevation
//!   → normalized parallax coordinates, accounting for the Earth oblateness.
//! - [`geometry`] – altitude/azimuth of fixed points, Sun and Moon, and the bounded
//!   horizon-crossing search.
//!
//! ## Units
//!
//! - Latitude, longitude: **degrees** (north and east positive).
//! - Elevation: **meters** above the reference ellipsoid.
//! - Parallax constants: **Earth equatorial radii**.
//!
//! ## Design & invariants
//!
//! - `NotNan<f64>` is used for every stored coordinate, so a location can be hashed and compared.
//! - A location is immutable once built; sessions share it by value.
//!
//! ## See also
//! ------------
//! * [`geometry::ObserverGeometry`] – calculation context built on a location.
//! * [`crate::astromosaic::AstroMosaic`] – the session owning the location.
pub mod geometry;

use ordered_float::NotNan;

use crate::astromosaic_errors::AstroMosaicError;
use crate::constants::{Degree, Meter, EARTH_MAJOR_AXIS, EARTH_MINOR_AXIS};

/// Geodetic observing site.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct ObserverLocation {
    latitude: NotNan<f64>,
    longitude: NotNan<f64>,
    elevation: NotNan<f64>,
    rho_cos_phi: NotNan<f64>,
    rho_sin_phi: NotNan<f64>,
}

impl ObserverLocation {
    /// Create a new observing site from geodetic coordinates.
    ///
    /// Arguments
    /// -----------------
    /// * `latitude`: geodetic latitude in **degrees**, `[-90, 90]`.
    /// * `longitude`: longitude in **degrees** east of Greenwich, `[-180, 360)`.
    /// * `elevation`: height above the reference ellipsoid in **meters**.
    ///
    /// Return
    /// ----------
    /// * The validated location with its parallax constants.
    ///
    /// Errors
    /// ----------
    /// * [`AstroMosaicError::InvalidObserver`] for NaN, infinite or out-of-range values.
    ///
    /// See also
    /// ------------
    /// * [`geodetic_to_parallax`] – geodetic → geocentric parallax conversion.
    pub fn new(
        latitude: Degree,
        longitude: Degree,
        elevation: Meter,
    ) -> Result<ObserverLocation, AstroMosaicError> {
        if !latitude.is_finite() || !longitude.is_finite() || !elevation.is_finite() {
            return Err(AstroMosaicError::InvalidObserver(format!(
                "non finite site ({latitude}, {longitude}, {elevation})"
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AstroMosaicError::InvalidObserver(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }
        if !(-180.0..360.0).contains(&longitude) {
            return Err(AstroMosaicError::InvalidObserver(format!(
                "longitude {longitude} outside [-180, 360)"
            )));
        }

        let (rho_cos_phi, rho_sin_phi) = geodetic_to_parallax(latitude, elevation);

        Ok(ObserverLocation {
            latitude: NotNan::new(latitude)?,
            longitude: NotNan::new(longitude)?,
            elevation: NotNan::new(elevation)?,
            rho_cos_phi: NotNan::new(rho_cos_phi)?,
            rho_sin_phi: NotNan::new(rho_sin_phi)?,
        })
    }

    pub fn latitude_deg(&self) -> Degree {
        self.latitude.into_inner()
    }

    pub fn longitude_deg(&self) -> Degree {
        self.longitude.into_inner()
    }

    pub fn elevation_m(&self) -> Meter {
        self.elevation.into_inner()
    }

    /// Geocentric parallax constants `(ρ·cosφ′, ρ·sinφ′)` in Earth radii.
    pub fn parallax_constants(&self) -> (f64, f64) {
        (self.rho_cos_phi.into_inner(), self.rho_sin_phi.into_inner())
    }
}

/// Convert geodetic latitude and height into normalized parallax coordinates
/// on the Earth.
///
/// The resulting values are dimensionless and expressed in units of the Earth's
/// equatorial radius (`EARTH_MAJOR_AXIS`).
///
/// Arguments
/// ---------
/// * `lat` - Geodetic latitude of the observer in **radians**.
/// * `height` - Observer's altitude above the reference ellipsoid in **meters**.
///
/// Returns
/// -------
/// A tuple `(rho_cos_phi, rho_sin_phi)`:
/// * `rho_cos_phi`: distance of the observer projected on the equatorial plane.
/// * `rho_sin_phi`: distance of the observer projected on the rotation axis.
///
/// Details
/// -------
/// ```text
/// u = atan( (sin φ * (b/a)) / cos φ )
/// ρ_sinφ = (b/a) * sin u + (h/a) * sin φ
/// ρ_cosφ = cos u + (h/a) * cos φ
/// ```
pub fn lat_alt_to_parallax(lat: f64, height: f64) -> (f64, f64) {
    // Ratio of the Earth's minor to major axis
    let axis_ratio = EARTH_MINOR_AXIS / EARTH_MAJOR_AXIS;

    // Parametric latitude
    let u = (lat.sin() * axis_ratio).atan2(lat.cos());

    let rho_sin_phi = axis_ratio * u.sin() + (height / EARTH_MAJOR_AXIS) * lat.sin();
    let rho_cos_phi = u.cos() + (height / EARTH_MAJOR_AXIS) * lat.cos();

    (rho_cos_phi, rho_sin_phi)
}

/// Degree front-end of [`lat_alt_to_parallax`].
///
/// Arguments
/// ---------
/// * `lat` - Geodetic latitude of the observer in **degrees**.
/// * `height` - Observer's altitude above the reference ellipsoid in **meters**.
pub fn geodetic_to_parallax(lat: Degree, height: Meter) -> (f64, f64) {
    lat_alt_to_parallax(lat.to_radians(), height)
}
