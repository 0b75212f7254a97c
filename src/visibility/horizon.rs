//! Local horizon limits and the per-sample visibility classification.
//!
//! A [`HorizonProfile`] lists the minimum usable altitude every 5° of azimuth, starting at
//! north. Short lists are padded with their last value, so `[0]` is a flat horizon and
//! `[10, 10, 25]` raises everything east of 10° azimuth to 25°.
//!
//! Two profiles may be given: a **hard** one (trees, buildings) and an optional **soft** one
//! (poor seeing, light dome). A soft-only profile is used as the hard one.
use serde::{Deserialize, Serialize};

use crate::constants::Degree;

/// Visibility state of a target sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityClass {
    /// Above every horizon limit.
    Visible,
    /// Above the hard limit, below the soft one.
    BelowSoftHorizon,
    /// Above the geometric horizon, below the hard limit.
    BelowHardHorizon,
    /// Below the geometric horizon.
    BelowHorizon,
    /// Otherwise usable, but inside the meridian-flip window.
    MeridianFlip,
}

impl VisibilityClass {
    /// Whether the sample can be used for imaging.
    pub fn is_usable(self) -> bool {
        self == VisibilityClass::Visible
    }
}

/// Azimuth-indexed altitude limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonProfile {
    hard: Vec<Degree>,
    soft: Option<Vec<Degree>>,
}

impl Default for HorizonProfile {
    fn default() -> Self {
        HorizonProfile::flat()
    }
}

impl HorizonProfile {
    /// Azimuth spacing of the limits.
    pub const STEP_DEG: f64 = 5.0;
    /// Number of limits covering `[0°, 360°]`.
    pub const ENTRIES: usize = 73;

    /// Geometric horizon, no soft limit.
    pub fn flat() -> Self {
        HorizonProfile {
            hard: vec![0.0; Self::ENTRIES],
            soft: None,
        }
    }

    /// Build a profile from optional hard and soft limit lists.
    ///
    /// Arguments
    /// -----------------
    /// * `hard`: hard limits every 5° from north, degrees.
    /// * `soft`: soft limits, same layout.
    ///
    /// Return
    /// ----------
    /// * The padded profile. With only `soft` given, it becomes the hard profile.
    pub fn new(hard: Option<Vec<Degree>>, soft: Option<Vec<Degree>>) -> Self {
        let (hard, soft) = match (hard, soft) {
            (None, Some(soft)) => {
                log::info!("only a soft horizon given, using it as hard horizon");
                (Some(soft), None)
            }
            pair => pair,
        };
        HorizonProfile {
            hard: Self::fill(hard.unwrap_or_default()),
            soft: soft.map(Self::fill),
        }
    }

    fn fill(mut limits: Vec<Degree>) -> Vec<Degree> {
        if limits.is_empty() {
            limits.push(0.0);
        }
        let last = limits[limits.len() - 1];
        limits.resize(Self::ENTRIES, last);
        limits
    }

    fn index(azimuth: Degree) -> usize {
        let idx = (azimuth.rem_euclid(360.0) / Self::STEP_DEG).round() as usize;
        idx.min(Self::ENTRIES - 1)
    }

    pub fn hard_limit(&self, azimuth: Degree) -> Degree {
        self.hard[Self::index(azimuth)]
    }

    pub fn soft_limit(&self, azimuth: Degree) -> Option<Degree> {
        self.soft.as_ref().map(|s| s[Self::index(azimuth)])
    }

    pub fn has_soft_limits(&self) -> bool {
        self.soft.is_some()
    }

    /// Classify a target position against the profile (meridian window not included).
    pub fn classify(&self, altitude: Degree, azimuth: Degree) -> VisibilityClass {
        if altitude <= 0.0 {
            return VisibilityClass::BelowHorizon;
        }
        let hard = self.hard_limit(azimuth);
        match self.soft_limit(azimuth) {
            Some(soft) if altitude > soft => VisibilityClass::Visible,
            Some(_) if altitude > hard => VisibilityClass::BelowSoftHorizon,
            None if altitude > hard => VisibilityClass::Visible,
            _ => VisibilityClass::BelowHardHorizon,
        }
    }
}
