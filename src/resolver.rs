//! # Target resolution
//!
//! Turns a free-form target identifier into a fixed J2000 [`SkyPoint`].
//!
//! ## Dispatch ([`resolve_target`])
//!
//! 1. `d <ra> <dec>` – decimal degrees.
//! 2. text containing `:` (or another sexagesimal layout recognised by
//!    [`classify_coordinate_text`]) – sexagesimal pair.
//! 3. two bare decimal numbers – RA in hours, Dec in degrees.
//! 4. anything else, or any text whose direct parse fails – a single lookup through a
//!    [`NameResolver`].
//!
//! Network access is isolated behind the [`NameResolver`] capability so sessions can be built
//! deterministically in tests with a [`CatalogResolver`] or a closure.
//!
//! ## Sesame
//!
//! [`SesameResolver`] queries the CDS Sesame service in plain-text mode. The first line of the
//! answer is authoritative and must look like
//!
//! ```text
//! #J2000 299.8681521 +40.7344421 = 19:59:28.356 +40:44:03.99 M39
//! ```
//!
//! Non-2xx answers, empty bodies and lines without the `#J2000` marker are resolution failures.
//! Lookups are never retried.
use std::collections::HashMap;

use log::{debug, warn};

use crate::astromosaic_errors::AstroMosaicError;
use crate::constants::{SESAME_EPOCH_MARKER, SESAME_URL};
use crate::conversion::{
    classify_coordinate_text, parse_decimal_text, parse_sexagesimal, CoordinateText,
};
use crate::coordinates::{AngleUnit, SkyPoint};
use crate::env_state::AstroMosaicEnv;

/// Capability: identifier → coordinates or failure.
pub trait NameResolver {
    fn resolve_name(&self, name: &str) -> Result<SkyPoint, AstroMosaicError>;
}

impl<F> NameResolver for F
where
    F: Fn(&str) -> Result<SkyPoint, AstroMosaicError>,
{
    fn resolve_name(&self, name: &str) -> Result<SkyPoint, AstroMosaicError> {
        self(name)
    }
}

fn resolution_error(identifier: &str, reason: impl Into<String>) -> AstroMosaicError {
    AstroMosaicError::ResolutionError {
        identifier: identifier.to_string(),
        reason: reason.into(),
    }
}

/// Parse the direct coordinate encodings of an identifier.
///
/// Return
/// ----------
/// * `Ok(point)` for a well-formed coordinate text, otherwise the codec error
///   (a [`AstroMosaicError::FormatError`] for plain names).
pub fn parse_coordinate_text(identifier: &str) -> Result<SkyPoint, AstroMosaicError> {
    match classify_coordinate_text(identifier) {
        CoordinateText::DecimalDegrees(ra, dec) => parse_decimal_text(&ra, &dec, AngleUnit::Degrees),
        CoordinateText::DecimalHours(ra, dec) => parse_decimal_text(&ra, &dec, AngleUnit::Hours),
        CoordinateText::Sexagesimal(ra, dec) => parse_sexagesimal(&ra, &dec),
        CoordinateText::Name => Err(AstroMosaicError::FormatError(format!(
            "'{identifier}' is not a coordinate text"
        ))),
    }
}

/// Resolve a target identifier into a J2000 point.
///
/// Arguments
/// -----------------
/// * `identifier`: coordinate text or object name.
/// * `resolver`: name lookup used when no direct parse succeeds.
///
/// Return
/// ----------
/// * The resolved point.
///
/// Errors
/// ----------
/// * [`AstroMosaicError::ResolutionError`] when the direct parse fails and the lookup fails too.
///   The reason carries both causes.
pub fn resolve_target(
    identifier: &str,
    resolver: &dyn NameResolver,
) -> Result<SkyPoint, AstroMosaicError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(resolution_error(identifier, "empty identifier"));
    }

    let parse_err = match parse_coordinate_text(identifier) {
        Ok(point) => {
            debug!("'{identifier}' parsed as coordinates {point:?}");
            return Ok(point);
        }
        Err(e) => e,
    };

    debug!("'{identifier}' is not a coordinate ({parse_err}), trying name lookup");
    resolver.resolve_name(identifier).map_err(|lookup_err| {
        let lookup_reason = match lookup_err {
            AstroMosaicError::ResolutionError { reason, .. } => reason,
            other => other.to_string(),
        };
        warn!("unable to resolve '{identifier}': {lookup_reason}");
        resolution_error(
            identifier,
            format!("{parse_err}; name lookup failed: {lookup_reason}"),
        )
    })
}

/// Parse the plain-text answer of Sesame (`-oI` output).
///
/// Return
/// ----------
/// * The J2000 point of the first line, or a human readable failure reason. Only the first line
///   is read: a blank first line is a failure even if a position follows.
pub fn parse_sesame_response(body: &str) -> Result<SkyPoint, String> {
    let line = body
        .lines()
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| "empty first response line".to_string())?;

    let mut parts = line.split_whitespace();
    if parts.next() != Some(SESAME_EPOCH_MARKER) {
        return Err(format!("unexpected response line '{line}'"));
    }

    let mut number = |what: &str| {
        parts
            .next()
            .and_then(|p| p.parse::<f64>().ok())
            .ok_or_else(|| format!("missing {what} in '{line}'"))
    };
    let ra = number("right ascension")?;
    let dec = number("declination")?;

    SkyPoint::new(ra, dec).map_err(|e| e.to_string())
}

/// Percent-encode a query component (RFC 3986 unreserved characters kept).
fn encode_query_component(text: &str) -> String {
    text.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// Name lookup through the CDS Sesame web service.
#[derive(Debug, Clone)]
pub struct SesameResolver {
    env: AstroMosaicEnv,
    endpoint: String,
}

impl Default for SesameResolver {
    fn default() -> Self {
        SesameResolver::new(AstroMosaicEnv::default(), None)
    }
}

impl SesameResolver {
    /// Arguments
    /// -----------------
    /// * `env`: shared HTTP state.
    /// * `endpoint`: service URL without query, [`SESAME_URL`] when `None`.
    pub fn new(env: AstroMosaicEnv, endpoint: Option<String>) -> Self {
        SesameResolver {
            env,
            endpoint: endpoint.unwrap_or_else(|| SESAME_URL.to_string()),
        }
    }

    pub fn query_url(&self, name: &str) -> String {
        format!("{}?{}", self.endpoint, encode_query_component(name))
    }
}

impl NameResolver for SesameResolver {
    fn resolve_name(&self, name: &str) -> Result<SkyPoint, AstroMosaicError> {
        let body = self
            .env
            .get_from_url(&self.query_url(name))
            .map_err(|e| resolution_error(name, e.to_string()))?;
        let point = parse_sesame_response(&body).map_err(|reason| resolution_error(name, reason))?;
        debug!("Sesame resolved '{name}' to {point:?}");
        Ok(point)
    }
}

/// In-memory name table. Lookups ignore case and whitespace (`"ngc3031"` matches `"NGC 3031"`).
#[derive(Debug, Clone, Default)]
pub struct CatalogResolver {
    entries: HashMap<String, SkyPoint>,
}

impl CatalogResolver {
    fn key(name: &str) -> String {
        name.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    }

    pub fn insert(&mut self, name: &str, point: SkyPoint) {
        self.entries.insert(Self::key(name), point);
    }

    pub fn with_entry(mut self, name: &str, point: SkyPoint) -> Self {
        self.insert(name, point);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NameResolver for CatalogResolver {
    fn resolve_name(&self, name: &str) -> Result<SkyPoint, AstroMosaicError> {
        self.entries
            .get(&Self::key(name))
            .copied()
            .ok_or_else(|| resolution_error(name, "not in catalog"))
    }
}

/// Tries each resolver in turn; the first success wins.
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn NameResolver + Send + Sync>>,
}

impl ChainResolver {
    pub fn push(mut self, resolver: impl NameResolver + Send + Sync + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl NameResolver for ChainResolver {
    fn resolve_name(&self, name: &str) -> Result<SkyPoint, AstroMosaicError> {
        let mut reasons = Vec::with_capacity(self.resolvers.len());
        for resolver in &self.resolvers {
            match resolver.resolve_name(name) {
                Ok(point) => return Ok(point),
                Err(AstroMosaicError::ResolutionError { reason, .. }) => reasons.push(reason),
                Err(e) => reasons.push(e.to_string()),
            }
        }
        if reasons.is_empty() {
            reasons.push("no resolver configured".into());
        }
        Err(resolution_error(name, reasons.join(", ")))
    }
}

#[cfg(test)]
mod resolver_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn m81() -> SkyPoint {
        SkyPoint::new(148.88822, 69.06529).unwrap()
    }

    fn catalog() -> CatalogResolver {
        CatalogResolver::default().with_entry("M81", m81())
    }

    #[test]
    fn test_direct_encodings() {
        let cat = catalog();

        let p = resolve_target("09:55:33.17 69:03:55.00", &cat).unwrap();
        assert_abs_diff_eq!(p.ra_deg, 148.88820833333333, epsilon = 1e-10);

        let p = resolve_target("d 148.888 69.065", &cat).unwrap();
        assert_eq!((p.ra_deg, p.dec_deg), (148.888, 69.065));

        let p = resolve_target("9.9 69.065", &cat).unwrap();
        assert_abs_diff_eq!(p.ra_deg, 148.5, epsilon = 1e-10);
    }

    #[test]
    fn test_name_lookup() {
        let cat = catalog();
        assert_eq!(resolve_target("m 81", &cat).unwrap(), m81());
    }

    #[test]
    fn test_resolution_failure_is_surfaced() {
        let cat = catalog();
        match resolve_target("Andromeda", &cat) {
            Err(AstroMosaicError::ResolutionError { identifier, reason }) => {
                assert_eq!(identifier, "Andromeda");
                assert!(reason.contains("not in catalog"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            resolve_target("   ", &cat),
            Err(AstroMosaicError::ResolutionError { .. })
        ));
    }

    #[test]
    fn test_bad_coordinates_fall_back_to_lookup() {
        let cat = CatalogResolver::default().with_entry("10:00:00 95:00:00", m81());
        assert_eq!(resolve_target("10:00:00 95:00:00", &cat).unwrap(), m81());

        match resolve_target("10:00:00 -91:00:00", &catalog()) {
            Err(AstroMosaicError::ResolutionError { reason, .. }) => {
                assert!(reason.contains("out of range"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_closure_and_chain() {
        let network_down = |name: &str| -> Result<SkyPoint, AstroMosaicError> {
            Err(resolution_error(name, "network unreachable"))
        };
        let chain = ChainResolver::default().push(network_down).push(catalog());
        assert_eq!(chain.resolve_name("M81").unwrap(), m81());

        match ChainResolver::default().push(network_down).resolve_name("M1") {
            Err(AstroMosaicError::ResolutionError { reason, .. }) => {
                assert_eq!(reason, "network unreachable")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_sesame_response() {
        let body = "#J2000 299.8681521 +40.7344421 = 19:59:28.356 +40:44:03.99 M39\n";
        let p = parse_sesame_response(body).unwrap();
        assert_abs_diff_eq!(p.ra_deg, 299.8681521, epsilon = 1e-12);
        assert_abs_diff_eq!(p.dec_deg, 40.7344421, epsilon = 1e-12);

        assert!(parse_sesame_response("").is_err());
        assert!(parse_sesame_response("\n#J2000 299.8681521 +40.7344421").is_err());
        assert!(parse_sesame_response("#J2000 299.8 40.7 = M39\n#J2000 10.0 20.0").is_ok());
        assert!(parse_sesame_response("#! *** Nothing found ***").is_err());
        assert!(parse_sesame_response("#J2000 abc").is_err());
        assert!(parse_sesame_response("#J2000 10.0 95.0 = x").is_err());
    }

    #[test]
    fn test_query_url_is_encoded() {
        let sesame = SesameResolver::default();
        assert_eq!(
            sesame.query_url("NGC 3031"),
            "https://cdsweb.u-strasbg.fr/cgi-bin/nph-sesame/-oI/A?NGC%203031"
        );
        assert!(sesame.query_url("BD+40 4124").ends_with("BD%2B40%204124"));
    }

    #[test]
    #[ignore = "requires network access to CDS Sesame"]
    fn test_sesame_lookup() {
        let p = SesameResolver::default().resolve_name("M81").unwrap();
        assert_abs_diff_eq!(p.ra_deg, 148.888, epsilon = 0.01);
    }
}
