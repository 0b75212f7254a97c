//! # Constants and type definitions for AstroMosaic
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! definitions** used throughout the `astromosaic` library.
//!
//! ## Overview
//!
//! - Astronomical and geophysical constants
//! - Unit conversions (degrees ↔ radians, hours ↔ degrees, days ↔ seconds)
//! - Core type aliases used across the crate
//! - Mosaic labelling and default planning parameters

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Right ascension hours → degrees
pub const HOUR_TO_DEG: f64 = 15.0;

/// Earth equatorial radius in meters (GRS1980/WGS84)
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// Earth polar radius in meters (GRS1980/WGS84)
pub const EARTH_MINOR_AXIS: f64 = 6_356_752.3;

/// Earth equatorial radius in kilometers
pub const EARTH_RADIUS_KM: f64 = EARTH_MAJOR_AXIS / 1000.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Right ascension in hours
pub type Hour = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Distance in meters
pub type Meter = f64;
/// Modified Julian Date (days)
pub type MJD = f64;

// -------------------------------------------------------------------------------------------------
// Planning defaults
// -------------------------------------------------------------------------------------------------

/// Row labels of a mosaic grid. Their count bounds both grid dimensions.
pub const MOSAIC_ROW_LABELS: [char; 9] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I'];

/// Largest accepted mosaic grid dimension.
pub const MAX_GRID_DIMENSION: i32 = MOSAIC_ROW_LABELS.len() as i32;

/// Default overlap between neighbouring mosaic panels, in percent.
pub const DEFAULT_OVERLAP_PERCENT: f64 = 20.0;

/// Default sampling interval of a night trace, in minutes.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;

/// Default Sun altitude bounding the night, in degrees.
pub const DEFAULT_TWILIGHT_DEG: Degree = -12.0;

/// Number of daily samples in a yearly trend.
pub const YEAR_TREND_DAYS: usize = 365;

/// CDS Sesame name resolver (plain text output, all services).
pub const SESAME_URL: &str = "https://cdsweb.u-strasbg.fr/cgi-bin/nph-sesame/-oI/A";

/// Marker that starts a usable Sesame position line.
pub const SESAME_EPOCH_MARKER: &str = "#J2000";
