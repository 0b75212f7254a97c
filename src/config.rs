//! Engine configuration file support.
//!
//! An [`EngineConfig`] is read from TOML. Every section is optional except the observing site:
//!
//! ```toml
//! [observer]
//! latitude = 37.4988
//! longitude = -2.42178
//! elevation = 0.0
//!
//! [camera]
//! preset = "T3"          # or fov_x / fov_y in degrees
//! overlap_percent = 20.0
//!
//! [schedule]
//! interval_minutes = 5
//! twilight_deg = -12.0
//! timezone_offset_hours = 2.0
//! meridian_window_minutes = 30.0
//! horizon_hard = [10.0, 10.0, 15.0]
//!
//! [resolver]
//! timeout_secs = 10
//!
//! [resolver.catalog]
//! "My field" = [150.1, 2.2]
//! ```
use std::fs;
use std::str::FromStr;

use camino::Utf8Path;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::astromosaic_errors::AstroMosaicError;
use crate::constants::{
    Degree, DEFAULT_INTERVAL_MINUTES, DEFAULT_OVERLAP_PERCENT, DEFAULT_TWILIGHT_DEG,
};
use crate::coordinates::SkyPoint;
use crate::env_state::AstroMosaicEnv;
use crate::observers::ObserverLocation;
use crate::resolver::{CatalogResolver, ChainResolver, SesameResolver};
use crate::visibility::HorizonProfile;

/// Built-in camera fields of view (Slooh telescopes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelescopePreset {
    T1,
    T2,
    T3,
    T4,
    C1,
}

impl TelescopePreset {
    /// Field of view `(x, y)` in degrees.
    pub fn fov(self) -> (Degree, Degree) {
        let arcmin = |m: f64, s: f64| (m * 60.0 + s) / 3600.0;
        match self {
            TelescopePreset::T1 => (arcmin(33.0, 0.0), arcmin(33.0, 0.0)),
            TelescopePreset::T2 => (arcmin(43.0, 0.0), arcmin(43.0, 0.0)),
            TelescopePreset::T3 => (1.654, 1.249),
            TelescopePreset::T4 => (arcmin(15.0, 57.0), arcmin(12.0, 3.0)),
            TelescopePreset::C1 => (arcmin(31.0, 18.0), arcmin(20.0, 51.0)),
        }
    }
}

impl FromStr for TelescopePreset {
    type Err = AstroMosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "T1" => Ok(TelescopePreset::T1),
            "T2" => Ok(TelescopePreset::T2),
            "T3" => Ok(TelescopePreset::T3),
            "T4" => Ok(TelescopePreset::T4),
            "C1" => Ok(TelescopePreset::C1),
            other => Err(AstroMosaicError::ConfigError(format!(
                "unknown telescope preset '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverSettings {
    pub latitude: Degree,
    pub longitude: Degree,
    #[serde(default)]
    pub elevation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "default_preset")]
    pub preset: Option<TelescopePreset>,
    #[serde(default)]
    pub fov_x: Option<Degree>,
    #[serde(default)]
    pub fov_y: Option<Degree>,
    #[serde(default = "default_overlap")]
    pub overlap_percent: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        CameraSettings {
            preset: default_preset(),
            fov_x: None,
            fov_y: None,
            overlap_percent: default_overlap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default = "default_interval")]
    pub interval_minutes: u32,
    #[serde(default = "default_twilight")]
    pub twilight_deg: Degree,
    #[serde(default)]
    pub timezone_offset_hours: f64,
    #[serde(default)]
    pub meridian_window_minutes: f64,
    #[serde(default)]
    pub horizon_hard: Option<Vec<Degree>>,
    #[serde(default)]
    pub horizon_soft: Option<Vec<Degree>>,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            interval_minutes: default_interval(),
            twilight_deg: default_twilight(),
            timezone_offset_hours: 0.0,
            meridian_window_minutes: 0.0,
            horizon_hard: None,
            horizon_soft: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverSettings {
    #[serde(default)]
    pub sesame_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Local names resolved before Sesame, `name = [ra_deg, dec_deg]`.
    #[serde(default)]
    pub catalog: std::collections::BTreeMap<String, [Degree; 2]>,
    /// Disable the network lookup entirely.
    #[serde(default)]
    pub offline: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        ResolverSettings {
            sesame_url: None,
            timeout_secs: default_timeout(),
            catalog: Default::default(),
            offline: false,
        }
    }
}

fn default_preset() -> Option<TelescopePreset> {
    Some(TelescopePreset::T1)
}

fn default_overlap() -> f64 {
    DEFAULT_OVERLAP_PERCENT
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL_MINUTES
}

fn default_twilight() -> Degree {
    DEFAULT_TWILIGHT_DEG
}

fn default_timeout() -> u64 {
    10
}

/// Whole engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub observer: ObserverSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub resolver: ResolverSettings,
}

impl FromStr for EngineConfig {
    type Err = AstroMosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: EngineConfig = toml::from_str(s)?;
        config.observer_location()?;
        config.field_of_view()?;
        Ok(config)
    }
}

impl EngineConfig {
    /// Configuration for a site with every other setting at its default.
    pub fn for_site(latitude: Degree, longitude: Degree, elevation: f64) -> Self {
        EngineConfig {
            observer: ObserverSettings {
                latitude,
                longitude,
                elevation,
            },
            camera: CameraSettings::default(),
            schedule: ScheduleSettings::default(),
            resolver: ResolverSettings::default(),
        }
    }

    /// Load and validate a TOML configuration file.
    ///
    /// Errors
    /// ----------
    /// * [`AstroMosaicError::IoError`] if the file cannot be read.
    /// * [`AstroMosaicError::ConfigError`] on malformed TOML or unusable values.
    pub fn from_file(path: &Utf8Path) -> Result<Self, AstroMosaicError> {
        debug!("loading configuration from {path}");
        fs::read_to_string(path)?.parse()
    }

    pub fn observer_location(&self) -> Result<ObserverLocation, AstroMosaicError> {
        ObserverLocation::new(
            self.observer.latitude,
            self.observer.longitude,
            self.observer.elevation,
        )
    }

    /// Camera field of view in degrees: explicit `fov_x`/`fov_y` win over the preset.
    pub fn field_of_view(&self) -> Result<(Degree, Degree), AstroMosaicError> {
        let preset = self.camera.preset.map(TelescopePreset::fov);
        let fov = match (self.camera.fov_x, self.camera.fov_y, preset) {
            (Some(x), Some(y), _) => (x, y),
            (Some(x), None, _) => (x, x),
            (None, Some(y), _) => (y, y),
            (None, None, Some(p)) => p,
            (None, None, None) => {
                return Err(AstroMosaicError::ConfigError(
                    "camera needs either a preset or fov_x/fov_y".into(),
                ))
            }
        };
        if !(fov.0 > 0.0 && fov.1 > 0.0) {
            return Err(AstroMosaicError::ConfigError(format!(
                "field of view must be positive, got {fov:?}"
            )));
        }
        Ok(fov)
    }

    pub fn horizon_profile(&self) -> HorizonProfile {
        HorizonProfile::new(
            self.schedule.horizon_hard.clone(),
            self.schedule.horizon_soft.clone(),
        )
    }

    pub fn env(&self) -> AstroMosaicEnv {
        AstroMosaicEnv::new(self.resolver.timeout_secs)
    }

    /// Name resolution chain: the local catalog, then Sesame unless `offline`.
    pub fn name_resolver(&self) -> Result<ChainResolver, AstroMosaicError> {
        let mut catalog = CatalogResolver::default();
        for (name, [ra, dec]) in &self.resolver.catalog {
            catalog.insert(name, SkyPoint::new(*ra, *dec)?);
        }
        let mut chain = ChainResolver::default().push(catalog);
        if !self.resolver.offline {
            chain = chain.push(SesameResolver::new(
                self.env(),
                self.resolver.sesame_url.clone(),
            ));
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod config_test {
    use super::*;
    use crate::resolver::NameResolver;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: EngineConfig = r#"
[observer]
latitude = 37.4988
longitude = -2.42178
"#
        .parse()
        .unwrap();
        assert_eq!(config.schedule.interval_minutes, 5);
        assert_eq!(config.schedule.twilight_deg, -12.0);
        assert_eq!(config.camera.overlap_percent, 20.0);
        assert_eq!(config.resolver.timeout_secs, 10);
        let (x, y) = config.field_of_view().unwrap();
        assert_abs_diff_eq!(x, 0.55, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 0.55, epsilon = 1e-12);
    }

    #[test]
    fn test_full_config() {
        let config: EngineConfig = r#"
[observer]
latitude = 60.04298
longitude = 24.24452
elevation = 40.0

[camera]
fov_x = 1.2
fov_y = 0.8
overlap_percent = 10.0

[schedule]
interval_minutes = 10
timezone_offset_hours = 2.0
horizon_soft = [20.0]

[resolver]
offline = true

[resolver.catalog]
"My Field" = [150.1, 2.2]
"#
        .parse()
        .unwrap();

        assert_eq!(config.field_of_view().unwrap(), (1.2, 0.8));
        assert_eq!(config.observer_location().unwrap().elevation_m(), 40.0);
        assert_eq!(config.horizon_profile().hard_limit(100.0), 20.0);

        let resolver = config.name_resolver().unwrap();
        let p = resolver.resolve_name("my field").unwrap();
        assert_eq!((p.ra_deg, p.dec_deg), (150.1, 2.2));
        assert!(resolver.resolve_name("M81").is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!("t3".parse::<TelescopePreset>().unwrap().fov(), (1.654, 1.249));
        let (x, y) = TelescopePreset::C1.fov();
        assert_abs_diff_eq!(x, 1878.0 / 3600.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 1251.0 / 3600.0, epsilon = 1e-12);
        assert!("X9".parse::<TelescopePreset>().is_err());
    }

    #[test]
    fn test_invalid_configs() {
        let bad_site = "[observer]\nlatitude = 95.0\nlongitude = 0.0\n";
        assert!(matches!(
            bad_site.parse::<EngineConfig>(),
            Err(AstroMosaicError::InvalidObserver(_))
        ));

        let bad_toml = "[observer\nlatitude = 1";
        assert!(matches!(
            bad_toml.parse::<EngineConfig>(),
            Err(AstroMosaicError::ConfigError(_))
        ));

        let bad_fov = "[observer]\nlatitude = 1.0\nlongitude = 0.0\n[camera]\nfov_x = -1.0\n";
        assert!(matches!(
            bad_fov.parse::<EngineConfig>(),
            Err(AstroMosaicError::ConfigError(_))
        ));
    }
}
