//! # Visibility scheduling
//!
//! Drives [`ObserverGeometry`](crate::observers::geometry::ObserverGeometry) over a time range
//! to produce:
//!
//! - the **night trace**: target and Moon positions sampled at a fixed interval between evening
//!   and morning twilight ([`VisibilityScheduler::night_trace`]),
//! - the **year trend**: target/Moon altitude and Moon phase at local midnight for 365 days
//!   ([`VisibilityScheduler::year_trend`]),
//! - a **night summary** evaluated at the middle of the dark window
//!   ([`VisibilityScheduler::night_summary`]).
//!
//! ## Night window
//!
//! ```text
//! start = previous crossing of the Sun below `twilight_deg`, searched back from the anchor
//! end   = next crossing of the Sun above `twilight_deg`, searched forward from the anchor
//! ```
//!
//! * If either search reports the Sun always above the threshold, there is no dark period and
//!   the trace is empty.
//! * If a search reports the Sun never above the threshold (polar night), the corresponding bound
//!   falls back to `00:00:00` / `23:59:59` UTC of the anchor date.
//!
//! Every sample is a pure function of its instant: the scheduler holds no "current time", so a
//! scheduler can be queried from several threads at once. Long loops poll a [`CancelFlag`]
//! once per sample.
//!
//! ## See also
//! ------------
//! * [`horizon::HorizonProfile`] – local horizon limits used to classify samples.
//! * [`crate::astromosaic::AstroMosaic`] – session façade calling this module.
pub mod horizon;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hifitime::Epoch;
use log::{debug, info};
use serde::{Serialize, Serializer};

use crate::astromosaic_errors::AstroMosaicError;
use crate::constants::{Degree, YEAR_TREND_DAYS};
use crate::coordinates::{angular_separation, SkyPoint};
use crate::observers::geometry::{Body, CrossingDirection, HorizonEvent, ObserverGeometry};
use crate::observers::ObserverLocation;
use crate::time::{
    add_days, add_hours, add_minutes, format_utc_date, format_utc_timestamp, seconds_between,
    utc_midnight,
};

pub use horizon::{HorizonProfile, VisibilityClass};

fn serialize_timestamp<S: Serializer>(epoch: &Epoch, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_utc_timestamp(*epoch))
}

fn serialize_date<S: Serializer>(epoch: &Epoch, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_utc_date(*epoch))
}

/// Cooperative cancellation token shared between a caller and a running loop.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination; loops observe it before their next sample.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), AstroMosaicError> {
        if self.is_cancelled() {
            info!("visibility loop cancelled");
            return Err(AstroMosaicError::Cancelled);
        }
        Ok(())
    }
}

/// How a night-window bound was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NightBound {
    /// Refined twilight crossing of the Sun.
    Crossing,
    /// Sun never reaches the twilight angle; midnight-to-midnight default.
    PolarNightDefault,
}

/// Dark period of one night.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NightWindow {
    #[serde(serialize_with = "serialize_timestamp")]
    pub start: Epoch,
    #[serde(serialize_with = "serialize_timestamp")]
    pub end: Epoch,
    pub start_kind: NightBound,
    pub end_kind: NightBound,
}

impl NightWindow {
    pub fn duration_hours(&self) -> f64 {
        seconds_between(self.end, self.start) / 3600.0
    }

    /// Middle of the dark period.
    pub fn midpoint(&self) -> Epoch {
        add_hours(self.start, self.duration_hours() / 2.0)
    }
}

/// One sample of the night trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibilitySample {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp_utc: Epoch,
    pub target_alt_deg: Degree,
    pub target_az_deg: Degree,
    pub moon_alt_deg: Degree,
    pub moon_az_deg: Degree,
    pub moon_target_separation_deg: Degree,
    /// Target above the geometric horizon.
    pub is_visible: bool,
    pub class: VisibilityClass,
}

/// One day of the year trend, evaluated at local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyTrendSample {
    #[serde(serialize_with = "serialize_date")]
    pub date: Epoch,
    pub target_alt_at_midnight_deg: Degree,
    pub moon_alt_at_midnight_deg: Degree,
    pub moon_phase_percent: f64,
    pub moon_target_separation_deg: Degree,
}

/// Moon conditions in the middle of a night.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NightSummary {
    pub window: NightWindow,
    /// Middle of the dark window.
    #[serde(serialize_with = "serialize_timestamp")]
    pub midnight: Epoch,
    pub moon_phase_percent: f64,
    pub moon_target_separation_deg: Degree,
}

/// Moon phase indicator from the Moon–Sun elongation: `(180 − elongation) / 180 × 100`.
pub fn moon_phase_from_elongation(elongation: Degree) -> f64 {
    ((180.0 - elongation) / 180.0 * 100.0).clamp(0.0, 100.0)
}

/// Night trace and year trend generator for one observing site.
#[derive(Debug, Clone)]
pub struct VisibilityScheduler {
    geometry: ObserverGeometry,
    horizon: HorizonProfile,
    meridian_window_minutes: f64,
    cancel: CancelFlag,
}

impl VisibilityScheduler {
    pub fn new(geometry: ObserverGeometry) -> Self {
        VisibilityScheduler {
            geometry,
            horizon: HorizonProfile::flat(),
            meridian_window_minutes: 0.0,
            cancel: CancelFlag::new(),
        }
    }

    pub fn from_location(location: ObserverLocation) -> Self {
        Self::new(ObserverGeometry::new(location))
    }

    pub fn with_horizon(mut self, horizon: HorizonProfile) -> Self {
        self.horizon = horizon;
        self
    }

    /// Width of the meridian-flip window centred on the upper transit, minutes (0 disables it).
    pub fn with_meridian_window(mut self, minutes: f64) -> Self {
        self.meridian_window_minutes = minutes.max(0.0);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub fn geometry(&self) -> &ObserverGeometry {
        &self.geometry
    }

    /// Dark period around `anchor` with the Sun below `twilight_deg`.
    ///
    /// Arguments
    /// -----------------
    /// * `anchor`: instant the twilight crossings are searched from (usually 00:00 UTC of the date).
    /// * `twilight_deg`: Sun altitude threshold, e.g. `-12`.
    ///
    /// Return
    /// ----------
    /// * `Ok(None)` when the Sun stays above the threshold (no night).
    /// * `Ok(Some(window))` otherwise; polar-night bounds fall back to the anchor's UTC day.
    ///
    /// Errors
    /// ----------
    /// * [`AstroMosaicError::SearchNonconvergence`] from the crossing search.
    pub fn night_window(
        &self,
        anchor: Epoch,
        twilight_deg: Degree,
    ) -> Result<Option<NightWindow>, AstroMosaicError> {
        let geometry = &self.geometry;
        let dusk =
            geometry.find_crossing(&Body::Sun, anchor, twilight_deg, CrossingDirection::PreviousSet)?;
        let dawn =
            geometry.find_crossing(&Body::Sun, anchor, twilight_deg, CrossingDirection::NextRise)?;

        if dusk == HorizonEvent::AlwaysAbove || dawn == HorizonEvent::AlwaysAbove {
            info!("Sun never below {twilight_deg}° around {anchor}: no dark period");
            return Ok(None);
        }

        let day_start = utc_midnight(anchor);
        let (start, start_kind) = match dusk.instant() {
            Some(t) => (t, NightBound::Crossing),
            None => (day_start, NightBound::PolarNightDefault),
        };
        let (end, end_kind) = match dawn.instant() {
            Some(t) => (t, NightBound::Crossing),
            None => (add_hours(day_start, 86_399.0 / 3600.0), NightBound::PolarNightDefault),
        };

        let window = NightWindow {
            start,
            end,
            start_kind,
            end_kind,
        };
        debug!(
            "night window {} → {} ({:.2} h)",
            format_utc_timestamp(start),
            format_utc_timestamp(end),
            window.duration_hours()
        );
        Ok(Some(window))
    }

    fn sample(&self, target: &Body, instant: Epoch) -> Result<VisibilitySample, AstroMosaicError> {
        let geometry = &self.geometry;
        let target_hz = geometry.altaz(target, instant);
        let moon_hz = geometry.altaz(&Body::Moon, instant);
        let separation = angular_separation(
            &geometry.equatorial(target, instant),
            &geometry.equatorial(&Body::Moon, instant),
        );

        Ok(VisibilitySample {
            timestamp_utc: instant,
            target_alt_deg: target_hz.altitude_deg,
            target_az_deg: target_hz.azimuth_deg,
            moon_alt_deg: moon_hz.altitude_deg,
            moon_az_deg: moon_hz.azimuth_deg,
            moon_target_separation_deg: separation,
            is_visible: target_hz.altitude_deg > 0.0,
            class: self
                .horizon
                .classify(target_hz.altitude_deg, target_hz.azimuth_deg),
        })
    }

    /// Mark the samples around the upper transit as [`VisibilityClass::MeridianFlip`].
    fn mark_meridian_window(
        &self,
        target: &Body,
        samples: &mut [VisibilitySample],
        interval_minutes: u32,
    ) -> Result<(), AstroMosaicError> {
        if self.meridian_window_minutes <= 0.0 || samples.len() < 2 {
            return Ok(());
        }
        let geometry = &self.geometry;
        let hour_angles: Vec<f64> = samples
            .iter()
            .map(|s| geometry.hour_angle(target, s.timestamp_utc))
            .collect();

        let Some(transit) = hour_angles
            .windows(2)
            .position(|w| w[0] < 0.0 && w[1] >= 0.0 && w[1] - w[0] < 180.0)
            .map(|i| i + 1)
        else {
            return Ok(());
        };

        let half = (self.meridian_window_minutes / 2.0 / interval_minutes as f64).round() as usize;
        let lo = transit.saturating_sub(half);
        let hi = (transit + half).min(samples.len());
        debug!(
            "meridian transit at {}, flipping samples {lo}..{hi}",
            format_utc_timestamp(samples[transit].timestamp_utc)
        );
        for s in &mut samples[lo..hi] {
            if matches!(
                s.class,
                VisibilityClass::Visible | VisibilityClass::BelowSoftHorizon
            ) {
                s.class = VisibilityClass::MeridianFlip;
            }
        }
        Ok(())
    }

    /// Sample the target and the Moon across the night around `anchor`.
    ///
    /// Arguments
    /// -----------------
    /// * `target`: J2000 position of the target.
    /// * `anchor`: night anchor instant (usually the date at 00:00 UTC).
    /// * `interval_minutes`: sampling step, must be positive.
    /// * `twilight_deg`: Sun altitude defining the dark window.
    ///
    /// Return
    /// ----------
    /// * Samples from night start (included) to night end (excluded), strictly increasing in
    ///   time. Empty when the Sun never goes below `twilight_deg`.
    ///
    /// Errors
    /// ----------
    /// * [`AstroMosaicError::ConfigError`] for a zero interval.
    /// * [`AstroMosaicError::Cancelled`] if the cancel flag is raised during the loop.
    /// * [`AstroMosaicError::SearchNonconvergence`] from the twilight search.
    pub fn night_trace(
        &self,
        target: &SkyPoint,
        anchor: Epoch,
        interval_minutes: u32,
        twilight_deg: Degree,
    ) -> Result<Vec<VisibilitySample>, AstroMosaicError> {
        if interval_minutes == 0 {
            return Err(AstroMosaicError::ConfigError(
                "night trace interval must be at least one minute".into(),
            ));
        }
        let Some(window) = self.night_window(anchor, twilight_deg)? else {
            return Ok(Vec::new());
        };

        let body = Body::Fixed(*target);
        let mut samples = Vec::new();
        for k in 0.. {
            let t = add_minutes(window.start, (k * interval_minutes) as f64);
            if t >= window.end {
                break;
            }
            self.cancel.check()?;
            samples.push(self.sample(&body, t)?);
        }

        self.mark_meridian_window(&body, &mut samples, interval_minutes)?;
        info!(
            "night trace: {} samples every {interval_minutes} min",
            samples.len()
        );
        Ok(samples)
    }

    /// Target/Moon altitude and Moon phase at local midnight for [`YEAR_TREND_DAYS`] days.
    ///
    /// Arguments
    /// -----------------
    /// * `target`: J2000 position of the target.
    /// * `anchor`: first day; only its UTC calendar date is used.
    /// * `timezone_offset_hours`: local time minus UTC; local midnight is taken as
    ///   `00:00 − offset` UTC (not solar midnight).
    ///
    /// Return
    /// ----------
    /// * Exactly one sample per day, in date order. The phase is
    ///   [`moon_phase_from_elongation`] of the topocentric Moon–Sun separation.
    pub fn year_trend(
        &self,
        target: &SkyPoint,
        anchor: Epoch,
        timezone_offset_hours: f64,
    ) -> Result<Vec<DailyTrendSample>, AstroMosaicError> {
        let geometry = &self.geometry;
        let body = Body::Fixed(*target);
        let first_day = utc_midnight(anchor);

        let mut trend = Vec::with_capacity(YEAR_TREND_DAYS);
        for day in 0..YEAR_TREND_DAYS {
            self.cancel.check()?;
            let date = add_days(first_day, day as f64);
            let instant = add_hours(date, -timezone_offset_hours);

            let moon = geometry.equatorial(&Body::Moon, instant);
            let sun = geometry.equatorial(&Body::Sun, instant);

            trend.push(DailyTrendSample {
                date,
                target_alt_at_midnight_deg: geometry.altitude(&body, instant),
                moon_alt_at_midnight_deg: geometry.altitude(&Body::Moon, instant),
                moon_phase_percent: moon_phase_from_elongation(angular_separation(&moon, &sun)),
                moon_target_separation_deg: angular_separation(
                    &moon,
                    &geometry.equatorial(&body, instant),
                ),
            });
        }
        info!(
            "year trend from {}: {} days",
            format_utc_date(first_day),
            trend.len()
        );
        Ok(trend)
    }

    /// Moon phase and Moon–target distance in the middle of the night around `anchor`.
    ///
    /// Returns `Ok(None)` when there is no dark period.
    pub fn night_summary(
        &self,
        target: &SkyPoint,
        anchor: Epoch,
        twilight_deg: Degree,
    ) -> Result<Option<NightSummary>, AstroMosaicError> {
        let Some(window) = self.night_window(anchor, twilight_deg)? else {
            return Ok(None);
        };
        let geometry = &self.geometry;
        let midnight = window.midpoint();
        let moon = geometry.equatorial(&Body::Moon, midnight);
        let sun = geometry.equatorial(&Body::Sun, midnight);
        let target_now = geometry.equatorial(&Body::Fixed(*target), midnight);

        Ok(Some(NightSummary {
            window,
            midnight,
            moon_phase_percent: moon_phase_from_elongation(angular_separation(&moon, &sun)),
            moon_target_separation_deg: angular_separation(&moon, &target_now),
        }))
    }
}

/// Night trace for `target` seen from `observer`, with a flat horizon.
///
/// See [`VisibilityScheduler::night_trace`].
pub fn night_trace(
    target: &SkyPoint,
    observer: &ObserverLocation,
    anchor: Epoch,
    interval_minutes: u32,
    twilight_deg: Degree,
) -> Result<Vec<VisibilitySample>, AstroMosaicError> {
    VisibilityScheduler::from_location(*observer).night_trace(
        target,
        anchor,
        interval_minutes,
        twilight_deg,
    )
}

/// Year trend for `target` seen from `observer`.
///
/// See [`VisibilityScheduler::year_trend`].
pub fn year_trend(
    target: &SkyPoint,
    observer: &ObserverLocation,
    anchor: Epoch,
    timezone_offset_hours: f64,
) -> Result<Vec<DailyTrendSample>, AstroMosaicError> {
    VisibilityScheduler::from_location(*observer).year_trend(target, anchor, timezone_offset_hours)
}
