//! # AstroMosaic environment state
//!
//! This module defines [`crate::env_state::AstroMosaicEnv`], the **shared environment object**
//! holding the persistent HTTP client used by network name resolution.
//!
//! The object is cheaply cloneable; the engine core never performs I/O through it except in
//! [`crate::resolver::SesameResolver`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use astromosaic::env_state::AstroMosaicEnv;
//!
//! let env = AstroMosaicEnv::new(10);
//! let body = env.get_from_url("https://cdsweb.u-strasbg.fr/cgi-bin/nph-sesame/-oI/A?M81")?;
//! # Ok::<(), astromosaic::astromosaic_errors::AstroMosaicError>(())
//! ```
//!
//! ## See also
//!
//! - [`ureq::Agent`] – Minimal blocking HTTP client used internally.
use std::time::Duration;

use log::debug;
use ureq::Agent;

use crate::astromosaic_errors::AstroMosaicError;

/// Shared HTTP state.
///
/// # Fields
///
/// * `http_client` - ureq agent with a global request timeout
#[derive(Debug, Clone)]
pub struct AstroMosaicEnv {
    pub http_client: Agent,
}

impl Default for AstroMosaicEnv {
    fn default() -> Self {
        Self::new(10)
    }
}

impl AstroMosaicEnv {
    /// Create a new environment
    ///
    /// Arguments
    /// ---------
    /// * `timeout_secs`: global timeout applied to every request
    pub fn new(timeout_secs: u64) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .build();
        let agent: Agent = config.into();

        AstroMosaicEnv { http_client: agent }
    }

    /// Perform a GET request and return the body as text.
    ///
    /// Non-2xx statuses, transport failures and undecodable bodies are returned as
    /// [`AstroMosaicError::HttpError`].
    pub fn get_from_url(&self, url: &str) -> Result<String, AstroMosaicError> {
        debug!("GET {url}");
        let body = self
            .http_client
            .get(url)
            .call()?
            .body_mut()
            .read_to_string()?;
        Ok(body)
    }
}
