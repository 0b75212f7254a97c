#![allow(dead_code)]

use astromosaic::config::EngineConfig;
use astromosaic::coordinates::SkyPoint;
use astromosaic::observers::ObserverLocation;
use astromosaic::resolver::CatalogResolver;

/// Observatory in southern Spain used across the tests.
pub fn spain_site() -> ObserverLocation {
    ObserverLocation::new(37.4988, -2.42178, 0.0).unwrap()
}

pub fn spain_config() -> EngineConfig {
    let mut config = EngineConfig::for_site(37.4988, -2.42178, 0.0);
    config.resolver.offline = true;
    config
}

pub fn m81() -> SkyPoint {
    SkyPoint::new(148.888, 69.065).unwrap()
}

/// Offline stand-in for the Sesame service.
pub fn stub_resolver() -> CatalogResolver {
    CatalogResolver::default()
        .with_entry("M81", m81())
        .with_entry("M31", SkyPoint::new(10.6847, 41.2690).unwrap())
}

/// Header-only FITS stream from `(keyword, value field)` cards, padded to whole blocks.
pub fn fits_bytes(cards: &[(&str, &str)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (key, value) in cards.iter().chain(std::iter::once(&("END", ""))) {
        let card = if value.is_empty() {
            format!("{key:<80}")
        } else {
            format!("{key:<8}= {value:<70}")
        };
        bytes.extend_from_slice(&card.as_bytes()[..80]);
    }
    let padded = bytes.len().div_ceil(2880) * 2880;
    bytes.resize(padded, b' ');
    bytes
}
