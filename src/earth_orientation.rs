//! # Earth orientation
//!
//! Mean obliquity of the ecliptic and IAU 1976 precession, the two frame effects that matter at
//! the precision of visibility planning. Nutation and aberration (< 20″) are neglected.
//!
//! ## See also
//! ------------
//! * [`crate::observers::geometry`] – precesses J2000 targets to the equator of date.
//! * [`crate::ephemeris`] – uses [`obleq`] for the ecliptic → equatorial rotation.
use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{Radian, RADEG, RADSEC, T2000};
use crate::coordinates::SkyPoint;

/// Elementary rotation matrix around one coordinate axis.
///
/// Arguments
/// ---------
/// * `alpha`: rotation angle in radians (counter-clockwise, active rotation of vectors).
/// * `k`: axis index, `0 = x`, `1 = y`, anything else `z`.
pub fn rotmt(alpha: Radian, k: usize) -> Matrix3<f64> {
    let axis = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        _ => Vector3::z_axis(),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Compute the mean obliquity of the ecliptic at a given epoch (IAU 1976 model).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * Mean obliquity of the ecliptic in radians.
///
/// Formula
/// -------
/// ```text
/// ε(t) = ε₀ + ε₁·T + ε₂·T² + ε₃·T³,   T = (tjm - T2000) / 36525
/// ```
pub fn obleq(tjm: f64) -> Radian {
    // Obliquity coefficients
    let ob0 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.0006 * RADSEC;
    let ob3 = 0.00181 * RADSEC;

    let t = (tjm - T2000) / 36525.0;

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// Precession matrix from the mean equator and equinox of J2000 to those of date (IAU 1976).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale) of the target equator.
///
/// Returns
/// --------
/// * `P` such that `v_date = P · v_J2000` for equatorial unit vectors.
///
/// Details
/// -------
/// The frame rotation `R3(-z) · R2(θ) · R3(-ζ)` is written with active rotations, which
/// flips the sign of each angle:
/// ```text
/// ζ(T) = (0.6406161 + 0.0000839·T + 0.0000050·T²) · T  [deg]
/// θ(T) = (0.5567530 − 0.0001185·T − 0.0000116·T²) · T  [deg]
/// z(T) = (0.6406161 + 0.0003041·T + 0.0000051·T²) · T  [deg]
/// ```
pub fn precession_matrix(tjm: f64) -> Matrix3<f64> {
    let zed = 0.6406161 * RADEG;
    let zd = 0.6406161 * RADEG;
    let thd = 0.5567530 * RADEG;

    let zedd = 0.0000839 * RADEG;
    let zdd = 0.0003041 * RADEG;
    let thdd = -0.0001185 * RADEG;

    let zeddd = 0.0000050 * RADEG;
    let zddd = 0.0000051 * RADEG;
    let thddd = -0.0000116 * RADEG;

    let t = (tjm - T2000) / 36525.0;

    let zeta = ((zeddd * t + zedd) * t + zed) * t;
    let z = ((zddd * t + zdd) * t + zd) * t;
    let theta = ((thddd * t + thdd) * t + thd) * t;

    rotmt(z, 2) * rotmt(-theta, 1) * rotmt(zeta, 2)
}

/// Precess a J2000 direction to the mean equator of date.
pub fn precess_from_j2000(point: &SkyPoint, tjm: f64) -> SkyPoint {
    let v = precession_matrix(tjm) * point.to_unit_vector();
    SkyPoint::from_vector(&v)
}

#[cfg(test)]
mod earth_orientation_test {
    use super::*;
    use crate::constants::JDTOMJD;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_obliquity() {
        let obl = obleq(T2000);
        assert_eq!(obl, 0.40909280422232897)
    }

    #[test]
    fn test_rotmt_is_active_rotation() {
        let r = rotmt(std::f64::consts::FRAC_PI_2, 2);
        let v = r * Vector3::new(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(v.y, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(v.x, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_precession_identity_at_j2000() {
        let p = precession_matrix(T2000);
        assert_abs_diff_eq!(p, Matrix3::identity(), epsilon = 1e-15);
    }

    #[test]
    fn test_precession_theta_persei() {
        // Mean place of θ Persei on 2028 Nov 13.19 TD (Meeus, Astronomical Algorithms, ex. 21.b).
        let j2000 = SkyPoint::new(41.054063, 49.227750).unwrap();
        let tjm = 2462088.69 - JDTOMJD;
        let date = precess_from_j2000(&j2000, tjm);
        assert_abs_diff_eq!(date.ra_deg, 41.547214, epsilon = 1e-4);
        assert_abs_diff_eq!(date.dec_deg, 49.348483, epsilon = 1e-4);
    }

    #[test]
    fn test_precession_is_orthonormal() {
        let p = precession_matrix(T2000 + 9000.0);
        assert_abs_diff_eq!(p * p.transpose(), Matrix3::identity(), epsilon = 1e-14);
    }
}
