//! # AstroMosaic: planning session façade
//!
//! This module defines [`AstroMosaic`](crate::astromosaic::AstroMosaic), one planning session for
//! a target seen from a site. It wires together:
//!
//! 1. **Target resolution** – the identifier is resolved **once**, at construction, through
//!    [`resolve_target`](crate::resolver::resolve_target). A failed resolution fails the
//!    construction; no partial session exists.
//! 2. **Visibility scheduling** – a [`VisibilityScheduler`] built from the site, the horizon profile
//!    and the meridian window of the configuration.
//! 3. **Mosaic tiling** – [`tile`](crate::mosaic::tile) with the session field of view.
//!
//! Every query is a pure function of the immutable session state plus its own arguments, so a
//! session can be shared between threads. The night window of the configured twilight angle is
//! computed lazily and cached in a [`OnceCell`].
//!
//! ## Typical usage
//!
//! ```rust, no_run
//! use astromosaic::astromosaic::AstroMosaic;
//! use astromosaic::config::EngineConfig;
//!
//! let config = EngineConfig::for_site(37.4988, -2.42178, 0.0);
//! let session = AstroMosaic::from_config("M81", Some("2025-06-09"), &config)?;
//!
//! let night = session.night_trace()?;
//! let grid = session.mosaic(3, 3)?;
//! # Ok::<(), astromosaic::astromosaic_errors::AstroMosaicError>(())
//! ```
//!
//! ## See also
//! ------------
//! * [`EngineConfig`] – defaults for every query parameter.
//! * [`crate::resolver::NameResolver`] – pluggable name lookup (Sesame, catalog, closures).
use hifitime::Epoch;
use log::info;
use once_cell::sync::OnceCell;

use crate::astromosaic_errors::AstroMosaicError;
use crate::config::EngineConfig;
use crate::constants::Degree;
use crate::coordinates::SkyPoint;
use crate::mosaic::{offaxis_guider_center, tile, GuiderField, MosaicGrid, MosaicParams};
use crate::observers::ObserverLocation;
use crate::resolver::{resolve_target, NameResolver};
use crate::time::parse_instant;
use crate::visibility::{
    CancelFlag, DailyTrendSample, NightSummary, NightWindow, VisibilitySample,
    VisibilityScheduler,
};

#[derive(Debug)]
pub struct AstroMosaic {
    identifier: String,
    target: SkyPoint,
    anchor: Epoch,
    config: EngineConfig,
    fov: (Degree, Degree),
    scheduler: VisibilityScheduler,
    night_window: OnceCell<Option<NightWindow>>,
}

impl AstroMosaic {
    /// Construct a session, resolving `target` with `resolver`.
    ///
    /// Arguments
    /// -----------------
    /// * `target`: coordinate text or object name.
    /// * `anchor`: session instant; nights are searched around it.
    /// * `config`: site, camera and query defaults.
    /// * `resolver`: name lookup used when `target` is not a coordinate text.
    ///
    /// Return
    /// ----------
    /// * A session, or the first error among site validation, field of view and resolution.
    ///
    /// See also
    /// ------------
    /// * [`AstroMosaic::from_config`] – same, with the resolver chain of the configuration.
    pub fn new(
        target: &str,
        anchor: Epoch,
        config: &EngineConfig,
        resolver: &dyn NameResolver,
    ) -> Result<Self, AstroMosaicError> {
        let location = config.observer_location()?;
        let fov = config.field_of_view()?;
        let point = resolve_target(target, resolver)?;

        info!(
            "session for '{target}' at ({:.5}, {:.5}) from ({}, {})",
            point.ra_deg,
            point.dec_deg,
            location.latitude_deg(),
            location.longitude_deg()
        );

        let scheduler = VisibilityScheduler::from_location(location)
            .with_horizon(config.horizon_profile())
            .with_meridian_window(config.schedule.meridian_window_minutes);

        Ok(AstroMosaic {
            identifier: target.trim().to_string(),
            target: point,
            anchor,
            config: config.clone(),
            fov,
            scheduler,
            night_window: OnceCell::new(),
        })
    }

    /// Construct a session from a configuration and an optional anchor text.
    ///
    /// `anchor` accepts the forms of [`parse_instant`]; `None` means the current time.
    pub fn from_config(
        target: &str,
        anchor: Option<&str>,
        config: &EngineConfig,
    ) -> Result<Self, AstroMosaicError> {
        let anchor = match anchor {
            Some(text) => parse_instant(text)?,
            None => Epoch::now().map_err(|e| AstroMosaicError::InvalidDate(e.to_string()))?,
        };
        let resolver = config.name_resolver()?;
        Self::new(target, anchor, config, &resolver)
    }

    /// Replace the cancellation flag polled by the long queries.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.scheduler = self.scheduler.with_cancel_flag(cancel);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn target(&self) -> &SkyPoint {
        &self.target
    }

    pub fn observer(&self) -> &ObserverLocation {
        self.scheduler.geometry().location()
    }

    pub fn anchor(&self) -> Epoch {
        self.anchor
    }

    pub fn fov(&self) -> (Degree, Degree) {
        self.fov
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &VisibilityScheduler {
        &self.scheduler
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        self.scheduler.cancel_flag()
    }

    /// Dark window at the configured twilight angle, computed on first use.
    pub fn night_window(&self) -> Result<Option<NightWindow>, AstroMosaicError> {
        self.night_window
            .get_or_try_init(|| {
                self.scheduler
                    .night_window(self.anchor, self.config.schedule.twilight_deg)
            })
            .copied()
    }

    /// Night trace with the configured interval and twilight angle.
    pub fn night_trace(&self) -> Result<Vec<VisibilitySample>, AstroMosaicError> {
        self.night_trace_with(
            self.config.schedule.interval_minutes,
            self.config.schedule.twilight_deg,
        )
    }

    pub fn night_trace_with(
        &self,
        interval_minutes: u32,
        twilight_deg: Degree,
    ) -> Result<Vec<VisibilitySample>, AstroMosaicError> {
        self.scheduler
            .night_trace(&self.target, self.anchor, interval_minutes, twilight_deg)
    }

    /// Midnight trend over 365 days with the configured timezone offset.
    pub fn year_trend(&self) -> Result<Vec<DailyTrendSample>, AstroMosaicError> {
        self.scheduler.year_trend(
            &self.target,
            self.anchor,
            self.config.schedule.timezone_offset_hours,
        )
    }

    pub fn night_summary(&self) -> Result<Option<NightSummary>, AstroMosaicError> {
        self.scheduler
            .night_summary(&self.target, self.anchor, self.config.schedule.twilight_deg)
    }

    /// Mosaic grid of the session field of view with the configured overlap.
    pub fn mosaic(&self, grid_x: i32, grid_y: i32) -> Result<MosaicGrid, AstroMosaicError> {
        let params = MosaicParams::new(self.fov.0, self.fov.1, grid_x, grid_y)
            .with_overlap(self.config.camera.overlap_percent);
        self.mosaic_with(&params)
    }

    pub fn mosaic_with(&self, params: &MosaicParams) -> Result<MosaicGrid, AstroMosaicError> {
        tile(&self.target, params)
    }

    /// Centre of an off-axis guider field next to the main field on the target.
    pub fn guider_center(&self, guider: &GuiderField) -> Result<SkyPoint, AstroMosaicError> {
        offaxis_guider_center(&self.target, self.fov, guider)
    }
}

#[cfg(test)]
mod astromosaic_test {
    use super::*;
    use crate::resolver::CatalogResolver;

    fn offline_config() -> EngineConfig {
        let mut config = EngineConfig::for_site(37.4988, -2.42178, 0.0);
        config.resolver.offline = true;
        config
    }

    #[test]
    fn test_session_from_coordinates() {
        let session =
            AstroMosaic::from_config("09:55:33.17 69:03:55.00", Some("2025-06-09"), &offline_config())
                .unwrap();
        assert_eq!(session.identifier(), "09:55:33.17 69:03:55.00");
        assert!((session.target().dec_deg - 69.0653).abs() < 1e-3);
        assert_eq!(session.observer().latitude_deg(), 37.4988);
    }

    #[test]
    fn test_unresolvable_target_fails_construction() {
        let res = AstroMosaic::from_config("NoSuchThing", Some("2025-06-09"), &offline_config());
        assert!(matches!(res, Err(AstroMosaicError::ResolutionError { .. })));
    }

    #[test]
    fn test_session_queries() {
        let catalog =
            CatalogResolver::default().with_entry("M81", SkyPoint::new(148.888, 69.065).unwrap());
        let anchor = parse_instant("2025-06-09").unwrap();
        let session = AstroMosaic::new("m 81", anchor, &offline_config(), &catalog).unwrap();

        let window = session.night_window().unwrap().unwrap();
        assert_eq!(session.night_window().unwrap(), Some(window));

        let trace = session.night_trace().unwrap();
        assert_eq!(trace[0].timestamp_utc, window.start);

        let grid = session.mosaic(3, 3).unwrap();
        assert_eq!(grid[1][1].ra_deg, 148.888);
        assert_eq!(session.fov(), (0.55, 0.55));
    }
}
