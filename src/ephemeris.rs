//! # Low-precision Sun and Moon ephemerides
//!
//! Analytical series good to a few arcminutes (Sun) and ~0.3° (Moon), which is all that
//! twilight detection, Moon altitude curves and Moon phase require.
//!
//! - Sun: mean anomaly + equation of the centre, apparent longitude (Meeus, *Astronomical
//!   Algorithms*, ch. 25).
//! - Moon: the leading periodic terms of ELP-2000/82 as tabulated by Meeus (ch. 47, tables
//!   47.A / 47.B) with the additive A1..A3 corrections.
//!
//! Both return **geocentric** directions referred to the mean equator and equinox of date.
//! The topocentric correction of the Moon lives in [`crate::observers::geometry`].
//!
//! All arguments are Modified Julian Dates in the TT scale.
use nalgebra::Vector3;

use crate::constants::{Degree, Kilometer, MJD, RADEG, T2000};
use crate::coordinates::SkyPoint;
use crate::earth_orientation::{obleq, rotmt};

/// Periodic terms for the Moon's longitude and distance (Table 47.A).
///
/// Each entry: `(D, M, M', F, Σl [1e-6 deg], Σr [1e-3 km])`.
const MOON_TERMS_LR: [(f64, f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 1.0, 0.0, 6288774.0, -20905355.0),
    (2.0, 0.0, -1.0, 0.0, 1274027.0, -3699111.0),
    (2.0, 0.0, 0.0, 0.0, 658314.0, -2955968.0),
    (0.0, 0.0, 2.0, 0.0, 213618.0, -569925.0),
    (0.0, 1.0, 0.0, 0.0, -185116.0, 48888.0),
    (0.0, 0.0, 0.0, 2.0, -114332.0, -3149.0),
    (2.0, 0.0, -2.0, 0.0, 58793.0, 246158.0),
    (2.0, -1.0, -1.0, 0.0, 57066.0, -152138.0),
    (2.0, 0.0, 1.0, 0.0, 53322.0, -170733.0),
    (2.0, -1.0, 0.0, 0.0, 45758.0, -204586.0),
    (0.0, 1.0, -1.0, 0.0, -40923.0, -129620.0),
    (1.0, 0.0, 0.0, 0.0, -34720.0, 108743.0),
    (0.0, 1.0, 1.0, 0.0, -30383.0, 104755.0),
    (2.0, 0.0, 0.0, -2.0, 15327.0, 10321.0),
    (0.0, 0.0, 1.0, 2.0, -12528.0, 0.0),
    (0.0, 0.0, 1.0, -2.0, 10980.0, 79661.0),
    (4.0, 0.0, -1.0, 0.0, 10675.0, -34782.0),
    (0.0, 0.0, 3.0, 0.0, 10034.0, -23210.0),
    (4.0, 0.0, -2.0, 0.0, 8548.0, -21636.0),
    (2.0, 1.0, -1.0, 0.0, -7888.0, 24208.0),
];

/// Periodic terms for the Moon's latitude (Table 47.B).
///
/// Each entry: `(D, M, M', F, Σb [1e-6 deg])`.
const MOON_TERMS_B: [(f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 0.0, 1.0, 5128122.0),
    (0.0, 0.0, 1.0, 1.0, 280602.0),
    (0.0, 0.0, 1.0, -1.0, 277693.0),
    (2.0, 0.0, 0.0, -1.0, 173237.0),
    (2.0, 0.0, -1.0, 1.0, 55413.0),
    (2.0, 0.0, -1.0, -1.0, 46271.0),
    (2.0, 0.0, 0.0, 1.0, 32573.0),
    (0.0, 0.0, 2.0, 1.0, 17198.0),
    (2.0, 0.0, 1.0, -1.0, 9266.0),
    (0.0, 0.0, 2.0, -1.0, 8822.0),
    (2.0, -1.0, 0.0, -1.0, 8216.0),
    (2.0, 0.0, -2.0, -1.0, 4324.0),
    (2.0, 0.0, 1.0, 1.0, 4200.0),
    (2.0, 1.0, 0.0, -1.0, -3359.0),
    (2.0, -1.0, -1.0, 1.0, 2463.0),
    (2.0, -1.0, 0.0, 1.0, 2211.0),
    (2.0, -1.0, -1.0, -1.0, 2065.0),
    (0.0, 1.0, -1.0, -1.0, -1870.0),
    (4.0, 0.0, -1.0, -1.0, 1828.0),
    (0.0, 1.0, 0.0, 1.0, -1794.0),
];

/// Julian centuries of TT since J2000.0.
fn centuries(tjm: MJD) -> f64 {
    (tjm - T2000) / 36525.0
}

fn deg_mod(x: Degree) -> Degree {
    x.rem_euclid(360.0)
}

/// Rotate ecliptic-of-date spherical coordinates to an equatorial-of-date vector.
fn ecliptic_to_equatorial(lon: Degree, lat: Degree, radius: f64, obliquity: f64) -> Vector3<f64> {
    let (l, b) = (lon * RADEG, lat * RADEG);
    let ecl = Vector3::new(b.cos() * l.cos(), b.cos() * l.sin(), b.sin()) * radius;
    rotmt(obliquity, 0) * ecl
}

/// Apparent geocentric ecliptic longitude of the Sun, in degrees.
pub fn sun_ecliptic_longitude(tjm: MJD) -> Degree {
    let t = centuries(tjm);

    let l0 = 280.46646 + 36000.76983 * t + 0.0003032 * t * t;
    let m = (357.52911 + 35999.05029 * t - 0.0001537 * t * t) * RADEG;

    // Equation of the centre
    let c = (1.914602 - 0.004817 * t - 0.000014 * t * t) * m.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * m).sin()
        + 0.000289 * (3.0 * m).sin();

    let omega = (125.04 - 1934.136 * t) * RADEG;
    deg_mod(l0 + c - 0.00569 - 0.00478 * omega.sin())
}

/// Geocentric equatorial direction of the Sun (mean equator of date).
pub fn sun_position(tjm: MJD) -> SkyPoint {
    let v = ecliptic_to_equatorial(sun_ecliptic_longitude(tjm), 0.0, 1.0, obleq(tjm));
    SkyPoint::from_vector(&v)
}

/// Geocentric position of the Moon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunarPosition {
    /// Ecliptic longitude of date, degrees `[0, 360)`.
    pub longitude: Degree,
    /// Ecliptic latitude, degrees.
    pub latitude: Degree,
    /// Earth–Moon centre distance.
    pub distance_km: Kilometer,
    /// Equatorial direction of date.
    pub equatorial: SkyPoint,
}

impl LunarPosition {
    /// Geocentric equatorial vector of date, in kilometres.
    pub fn to_vector(&self) -> Vector3<f64> {
        self.equatorial.to_unit_vector() * self.distance_km
    }
}

/// Geocentric position of the Moon from the truncated ELP-2000/82 series.
///
/// Arguments
/// -----------------
/// * `tjm`: Modified Julian Date, TT scale.
///
/// Return
/// ----------
/// * Ecliptic longitude/latitude, distance and the matching equatorial direction of date.
pub fn moon_position(tjm: MJD) -> LunarPosition {
    let t = centuries(tjm);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    // Mean longitude, elongation, anomalies and argument of latitude
    let lp = deg_mod(218.3164477 + 481267.88123421 * t - 0.0015786 * t2 + t3 / 538841.0
        - t4 / 65194000.0);
    let d = deg_mod(297.8501921 + 445267.1114034 * t - 0.0018819 * t2 + t3 / 545868.0
        - t4 / 113065000.0);
    let m = deg_mod(357.5291092 + 35999.0502909 * t - 0.0001536 * t2 + t3 / 24490000.0);
    let mp = deg_mod(134.9633964 + 477198.8675055 * t + 0.0087414 * t2 + t3 / 69699.0
        - t4 / 14712000.0);
    let f = deg_mod(93.2720950 + 483202.0175233 * t - 0.0036539 * t2 - t3 / 3526000.0
        + t4 / 863310000.0);

    // Decreasing eccentricity of the Earth orbit
    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;
    let e_factor = |tm: f64| match tm.abs() as i32 {
        1 => e,
        2 => e * e,
        _ => 1.0,
    };

    let (mut sum_l, sum_r) = MOON_TERMS_LR.iter().fold(
        (0.0, 0.0),
        |(sl, sr), &(td, tm, tmp, tf, cl, cr)| {
            let arg = (td * d + tm * m + tmp * mp + tf * f) * RADEG;
            (
                sl + cl * e_factor(tm) * arg.sin(),
                sr + cr * e_factor(tm) * arg.cos(),
            )
        },
    );
    let mut sum_b: f64 = MOON_TERMS_B
        .iter()
        .map(|&(td, tm, tmp, tf, cb)| {
            let arg = (td * d + tm * m + tmp * mp + tf * f) * RADEG;
            cb * e_factor(tm) * arg.sin()
        })
        .sum();

    // Venus, Jupiter and Earth flattening terms
    let a1 = deg_mod(119.75 + 131.849 * t) * RADEG;
    let a2 = deg_mod(53.09 + 479264.290 * t) * RADEG;
    let a3 = deg_mod(313.45 + 481266.484 * t) * RADEG;
    let (lp_r, mp_r, f_r) = (lp * RADEG, mp * RADEG, f * RADEG);

    sum_l += 3958.0 * a1.sin() + 1962.0 * (lp_r - f_r).sin() + 318.0 * a2.sin();
    sum_b += -2235.0 * lp_r.sin()
        + 382.0 * a3.sin()
        + 175.0 * (a1 - f_r).sin()
        + 175.0 * (a1 + f_r).sin()
        + 127.0 * (lp_r - mp_r).sin()
        - 115.0 * (lp_r + mp_r).sin();

    let longitude = deg_mod(lp + sum_l / 1_000_000.0);
    let latitude = sum_b / 1_000_000.0;
    let distance_km = 385000.56 + sum_r / 1000.0;

    let v = ecliptic_to_equatorial(longitude, latitude, 1.0, obleq(tjm));

    LunarPosition {
        longitude,
        latitude,
        distance_km,
        equatorial: SkyPoint::from_vector(&v),
    }
}
