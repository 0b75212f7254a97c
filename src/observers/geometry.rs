//! # Observer geometry
//!
//! Topocentric altitude/azimuth of a fixed sky point, the Sun and the Moon for a given site and
//! UTC instant, and the bounded search for horizon-crossing instants.
//!
//! ## Frames
//!
//! ```text
//! J2000 target --(IAU 1976 precession)--> mean equator of date --(LST, latitude)--> alt/az
//! Sun, Moon ephemeris ---------------------^   (Moon: minus observer geocentric vector)
//! ```
//!
//! Altitudes are geometric (no refraction) and refer to the body centre.
//!
//! ## Crossing search
//!
//! [`ObserverGeometry::find_crossing`] samples the altitude every
//! [`CrossingSearch::step_minutes`] over at most [`CrossingSearch::window_hours`] in the requested
//! time direction, then refines the first bracketing interval with Brent's method. Both the scan
//! and the refinement have hard evaluation caps, so the search always terminates:
//!
//! - a bracket is found and refined → [`HorizonEvent::Crossing`],
//! - no bracket in the window → [`HorizonEvent::AlwaysAbove`] / [`HorizonEvent::NeverAbove`],
//! - the refinement exhausts its iterations → [`AstroMosaicError::SearchNonconvergence`].
//!
//! The instant is always an explicit argument; an [`ObserverGeometry`] holds no mutable state and
//! can be shared across threads.
use hifitime::{Duration, Epoch};
use log::debug;
use nalgebra::Vector3;
use roots::{find_root_brent, SimpleConvergency};

use crate::astromosaic_errors::AstroMosaicError;
use crate::constants::{Degree, EARTH_RADIUS_KM};
use crate::coordinates::{HorizontalCoord, SkyPoint};
use crate::earth_orientation::precess_from_j2000;
use crate::ephemeris::{moon_position, sun_position};
use crate::observers::ObserverLocation;
use crate::time::{local_sidereal_time, mjd_tt};

/// Body whose position is evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Body {
    /// Fixed J2000 sky point (no proper motion).
    Fixed(SkyPoint),
    Sun,
    Moon,
}

/// Time direction and crossing kind of a horizon search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingDirection {
    /// Last instant before the origin where the body went below the horizon.
    PreviousSet,
    /// First instant after the origin where the body comes above the horizon.
    NextRise,
    PreviousRise,
    NextSet,
}

impl CrossingDirection {
    fn is_forward(self) -> bool {
        matches!(self, CrossingDirection::NextRise | CrossingDirection::NextSet)
    }

    fn is_rise(self) -> bool {
        matches!(
            self,
            CrossingDirection::NextRise | CrossingDirection::PreviousRise
        )
    }
}

/// Outcome of a horizon-crossing search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizonEvent {
    /// The body crosses the horizon at this instant.
    Crossing(Epoch),
    /// No crossing of the requested kind: the body stays above the horizon.
    AlwaysAbove,
    /// No crossing of the requested kind: the body stays below the horizon.
    NeverAbove,
}

impl HorizonEvent {
    pub fn instant(&self) -> Option<Epoch> {
        match self {
            HorizonEvent::Crossing(t) => Some(*t),
            _ => None,
        }
    }
}

/// Budget of the horizon-crossing search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossingSearch {
    /// Coarse sampling step, minutes.
    pub step_minutes: f64,
    /// Length of the scanned window, hours.
    pub window_hours: f64,
    /// Convergence tolerance of the refinement, seconds (and arcseconds of altitude).
    pub tolerance_seconds: f64,
    /// Maximum number of refinement iterations.
    pub max_iterations: usize,
}

impl Default for CrossingSearch {
    fn default() -> Self {
        CrossingSearch {
            step_minutes: 10.0,
            window_hours: 25.0,
            tolerance_seconds: 0.5,
            max_iterations: 100,
        }
    }
}

/// Convert an equatorial direction of date into horizontal coordinates.
///
/// Arguments
/// -----------------
/// * `point`: RA/Dec referred to the equator of date, degrees.
/// * `lst`: local sidereal time, radians.
/// * `latitude`: observer latitude, degrees.
///
/// Return
/// ----------
/// * Altitude in `[-90, 90]` and azimuth (north through east) in `[0, 360)`.
pub fn equatorial_to_horizontal(point: &SkyPoint, lst: f64, latitude: Degree) -> HorizontalCoord {
    let h = lst - point.ra_deg.to_radians();
    let dec = point.dec_deg.to_radians();
    let phi = latitude.to_radians();

    let sin_alt = phi.sin() * dec.sin() + phi.cos() * dec.cos() * h.cos();
    let altitude = sin_alt.clamp(-1.0, 1.0).asin();

    let azimuth = (-dec.cos() * h.sin()).atan2(dec.sin() * phi.cos() - dec.cos() * phi.sin() * h.cos());

    HorizontalCoord {
        altitude_deg: altitude.to_degrees(),
        azimuth_deg: azimuth.to_degrees().rem_euclid(360.0),
    }
}

/// Calculation context binding an observing site to the ephemerides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverGeometry {
    location: ObserverLocation,
    search: CrossingSearch,
}

impl ObserverGeometry {
    pub fn new(location: ObserverLocation) -> Self {
        ObserverGeometry {
            location,
            search: CrossingSearch::default(),
        }
    }

    /// Replace the crossing-search budget.
    pub fn with_search(mut self, search: CrossingSearch) -> Self {
        self.search = search;
        self
    }

    pub fn location(&self) -> &ObserverLocation {
        &self.location
    }

    /// Observer geocentric position in the equatorial frame of date, kilometres.
    fn observer_vector(&self, lst: f64) -> Vector3<f64> {
        let (rho_cos_phi, rho_sin_phi) = self.location.parallax_constants();
        Vector3::new(
            rho_cos_phi * lst.cos(),
            rho_cos_phi * lst.sin(),
            rho_sin_phi,
        ) * EARTH_RADIUS_KM
    }

    /// Apparent direction of `body` seen from the site, referred to the equator of date.
    ///
    /// Fixed points are precessed from J2000; the Moon is corrected for topocentric parallax.
    pub fn equatorial(&self, body: &Body, instant: Epoch) -> SkyPoint {
        let tjm = mjd_tt(instant);
        match body {
            Body::Fixed(point) => precess_from_j2000(point, tjm),
            Body::Sun => sun_position(tjm),
            Body::Moon => {
                let lst = local_sidereal_time(instant, self.location.longitude_deg());
                let topo = moon_position(tjm).to_vector() - self.observer_vector(lst);
                SkyPoint::from_vector(&topo)
            }
        }
    }

    /// Topocentric altitude/azimuth of `body` at `instant`.
    pub fn altaz(&self, body: &Body, instant: Epoch) -> HorizontalCoord {
        let lst = local_sidereal_time(instant, self.location.longitude_deg());
        equatorial_to_horizontal(
            &self.equatorial(body, instant),
            lst,
            self.location.latitude_deg(),
        )
    }

    pub fn altitude(&self, body: &Body, instant: Epoch) -> Degree {
        self.altaz(body, instant).altitude_deg
    }

    /// Local hour angle of `body`, degrees in `[-180, 180)`; zero at upper culmination.
    pub fn hour_angle(&self, body: &Body, instant: Epoch) -> Degree {
        let lst = local_sidereal_time(instant, self.location.longitude_deg()).to_degrees();
        (lst - self.equatorial(body, instant).ra_deg + 180.0).rem_euclid(360.0) - 180.0
    }

    /// Locate the instant where the altitude of `body` crosses `horizon_deg`.
    ///
    /// Arguments
    /// -----------------
    /// * `body`: the body to follow (centre position).
    /// * `instant`: search origin.
    /// * `horizon_deg`: altitude threshold, e.g. `-12` for nautical-astronomical twilight.
    /// * `direction`: which crossing to look for, and in which time direction.
    ///
    /// Return
    /// ----------
    /// * [`HorizonEvent::Crossing`] refined to the configured tolerance, or the distinguished
    ///   [`HorizonEvent::AlwaysAbove`] / [`HorizonEvent::NeverAbove`] when the scanned window
    ///   holds no crossing of the requested kind.
    ///
    /// Errors
    /// ----------
    /// * [`AstroMosaicError::SearchNonconvergence`] if the refinement exceeds its iteration cap.
    ///
    /// See also
    /// ------------
    /// * [`CrossingSearch`] – scan step, window length and refinement budget.
    pub fn find_crossing(
        &self,
        body: &Body,
        instant: Epoch,
        horizon_deg: Degree,
        direction: CrossingDirection,
    ) -> Result<HorizonEvent, AstroMosaicError> {
        // Altitude above the threshold, in arcseconds, `t` seconds from the origin
        let f = |t: f64| {
            (self.altitude(body, instant + Duration::from_seconds(t)) - horizon_deg) * 3600.0
        };

        let step = self.search.step_minutes * 60.0;
        let n_steps = (self.search.window_hours * 60.0 / self.search.step_minutes).ceil() as usize;
        let sign = if direction.is_forward() { 1.0 } else { -1.0 };

        let f0 = f(0.0);
        let (mut prev_t, mut prev_f) = (0.0, f0);
        let (mut any_above, mut any_below) = (f0 >= 0.0, f0 < 0.0);

        for k in 1..=n_steps {
            let t = sign * k as f64 * step;
            let ft = f(t);
            any_above |= ft >= 0.0;
            any_below |= ft < 0.0;

            // Chronological order of the bracket
            let ((a, fa), (b, fb)) = if sign > 0.0 {
                ((prev_t, prev_f), (t, ft))
            } else {
                ((t, ft), (prev_t, prev_f))
            };

            let bracketed = if direction.is_rise() {
                fa < 0.0 && fb >= 0.0
            } else {
                fa >= 0.0 && fb < 0.0
            };

            if bracketed {
                let root = if fb == 0.0 {
                    b
                } else if fa == 0.0 {
                    a
                } else {
                    let mut convergency = SimpleConvergency {
                        eps: self.search.tolerance_seconds,
                        max_iter: self.search.max_iterations,
                    };
                    find_root_brent(a, b, &f, &mut convergency)?
                };
                let crossing = instant + Duration::from_seconds(root);
                debug!("{direction:?} of {body:?} crosses {horizon_deg}° at {crossing}");
                return Ok(HorizonEvent::Crossing(crossing));
            }

            prev_t = t;
            prev_f = ft;
        }

        let event = match (any_above, any_below) {
            (true, false) => HorizonEvent::AlwaysAbove,
            (false, true) => HorizonEvent::NeverAbove,
            _ if f0 >= 0.0 => HorizonEvent::AlwaysAbove,
            _ => HorizonEvent::NeverAbove,
        };
        debug!("{direction:?} of {body:?} at {horizon_deg}°: no crossing, {event:?}");
        Ok(event)
    }
}

#[cfg(test)]
mod geometry_test {
    use super::*;
    use crate::coordinates::angular_separation;
    use crate::time::{parse_instant, seconds_between};
    use approx::assert_abs_diff_eq;

    fn almeria() -> ObserverGeometry {
        ObserverGeometry::new(ObserverLocation::new(37.4988, -2.42178, 0.0).unwrap())
    }

    #[test]
    fn test_equatorial_to_horizontal_cardinal_points() {
        // On the meridian, south of the zenith
        let p = SkyPoint::new(0.0, 0.0).unwrap();
        let hz = equatorial_to_horizontal(&p, 0.0, 40.0);
        assert_abs_diff_eq!(hz.altitude_deg, 50.0, epsilon = 1e-10);
        assert_abs_diff_eq!(hz.azimuth_deg, 180.0, epsilon = 1e-10);

        // Celestial pole: altitude equals latitude, due north
        let pole = SkyPoint::new(0.0, 90.0).unwrap();
        let hz = equatorial_to_horizontal(&pole, 1.234, 40.0);
        assert_abs_diff_eq!(hz.altitude_deg, 40.0, epsilon = 1e-10);

        // Six hours east of the meridian on the equator: rising due east
        let east = SkyPoint::new(90.0, 0.0).unwrap();
        let hz = equatorial_to_horizontal(&east, 0.0, 40.0);
        assert_abs_diff_eq!(hz.altitude_deg, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(hz.azimuth_deg, 90.0, epsilon = 1e-10);
    }

    #[test]
    fn test_sun_noon_altitude() {
        // Local noon at 2.42° W is ~12:10 UTC (+ equation of time ≈ -1 min on June 9).
        let geo = almeria();
        let noon = parse_instant("2025-06-09T12:09:00").unwrap();
        let hz = geo.altaz(&Body::Sun, noon);
        // 90 - 37.4988 + 22.95
        assert_abs_diff_eq!(hz.altitude_deg, 75.45, epsilon = 0.3);
        assert!(hz.azimuth_deg > 170.0 && hz.azimuth_deg < 190.0);
    }

    #[test]
    fn test_moon_topocentric_parallax() {
        let geo = almeria();
        let t = parse_instant("2025-06-09T22:00:00").unwrap();
        let geocentric = moon_position(mjd_tt(t)).equatorial;
        let topocentric = geo.equatorial(&Body::Moon, t);
        let shift = angular_separation(&geocentric, &topocentric);
        // Horizontal parallax is ~0.9-1.0°
        assert!(shift > 0.0 && shift < 1.05);
    }

    #[test]
    fn test_sun_crossings_bracket_night() {
        let geo = almeria();
        let origin = parse_instant("2025-06-09").unwrap();

        let set = geo
            .find_crossing(&Body::Sun, origin, -12.0, CrossingDirection::PreviousSet)
            .unwrap()
            .instant()
            .unwrap();
        let rise = geo
            .find_crossing(&Body::Sun, origin, -12.0, CrossingDirection::NextRise)
            .unwrap()
            .instant()
            .unwrap();

        assert!(set < origin && origin < rise);
        assert_abs_diff_eq!(geo.altitude(&Body::Sun, set), -12.0, epsilon = 0.01);
        assert_abs_diff_eq!(geo.altitude(&Body::Sun, rise), -12.0, epsilon = 0.01);
        // Night below -12° in early June at 37.5° N lasts about 7 hours
        let hours = seconds_between(rise, set) / 3600.0;
        assert!(hours > 5.5 && hours < 7.5, "night of {hours} h");
    }

    #[test]
    fn test_forward_set_and_backward_rise() {
        let geo = almeria();
        let origin = parse_instant("2025-06-09T12:00:00").unwrap();
        let set = geo
            .find_crossing(&Body::Sun, origin, 0.0, CrossingDirection::NextSet)
            .unwrap()
            .instant()
            .unwrap();
        let rise = geo
            .find_crossing(&Body::Sun, origin, 0.0, CrossingDirection::PreviousRise)
            .unwrap()
            .instant()
            .unwrap();
        assert!(rise < origin && origin < set);
        assert_abs_diff_eq!(geo.altitude(&Body::Sun, set), 0.0, epsilon = 0.01);
    }

    #[test]
    fn test_polar_conditions() {
        let arctic = ObserverGeometry::new(ObserverLocation::new(78.0, 15.0, 0.0).unwrap());

        let june = parse_instant("2025-06-21").unwrap();
        assert_eq!(
            arctic
                .find_crossing(&Body::Sun, june, -12.0, CrossingDirection::PreviousSet)
                .unwrap(),
            HorizonEvent::AlwaysAbove
        );

        let december = parse_instant("2025-12-21").unwrap();
        assert_eq!(
            arctic
                .find_crossing(&Body::Sun, december, 0.0, CrossingDirection::NextRise)
                .unwrap(),
            HorizonEvent::NeverAbove
        );
    }

    #[test]
    fn test_circumpolar_fixed_target() {
        let geo = almeria();
        let near_pole = Body::Fixed(SkyPoint::new(37.95, 89.26).unwrap());
        let origin = parse_instant("2025-06-09").unwrap();
        assert_eq!(
            geo.find_crossing(&near_pole, origin, 0.0, CrossingDirection::NextRise)
                .unwrap(),
            HorizonEvent::AlwaysAbove
        );
    }

    #[test]
    fn test_exhausted_refinement_is_reported() {
        let geo = almeria().with_search(CrossingSearch {
            max_iterations: 1,
            tolerance_seconds: 1e-9,
            ..CrossingSearch::default()
        });
        let origin = parse_instant("2025-06-09").unwrap();
        let res = geo.find_crossing(&Body::Sun, origin, -12.0, CrossingDirection::NextRise);
        assert!(matches!(
            res,
            Err(AstroMosaicError::SearchNonconvergence(_))
        ));
    }

    #[test]
    fn test_hour_angle_zero_at_transit() {
        let geo = almeria();
        let noon = parse_instant("2025-06-09T12:09:00").unwrap();
        assert!(geo.hour_angle(&Body::Sun, noon).abs() < 1.0);
    }
}
