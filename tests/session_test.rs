mod common;

use astromosaic::astromosaic::AstroMosaic;
use astromosaic::astromosaic_errors::AstroMosaicError;
use astromosaic::config::EngineConfig;
use astromosaic::coordinates::SkyPoint;
use astromosaic::display::{to_csv_string, NightTraceTable};
use astromosaic::time::parse_instant;

use common::{spain_config, stub_resolver};

#[test]
fn test_session_with_stub_resolver() {
    let anchor = parse_instant("2025-06-09").unwrap();
    let session = AstroMosaic::new("M31", anchor, &spain_config(), &stub_resolver()).unwrap();

    assert_eq!(session.identifier(), "M31");
    assert!((session.target().ra_deg - 10.6847).abs() < 1e-9);

    let trace = session.night_trace().unwrap();
    assert!(!trace.is_empty());
    assert!(NightTraceTable::new(&trace).to_string().contains("2025-06-0"));

    let csv = to_csv_string(&trace).unwrap();
    assert_eq!(csv.lines().count(), trace.len() + 1);

    let grid = session.mosaic(2, 2).unwrap();
    assert_eq!(grid.len(), 2);
}

#[test]
fn test_closure_resolver() {
    let anchor = parse_instant("2025-06-09").unwrap();
    let lookup = |name: &str| -> Result<SkyPoint, AstroMosaicError> {
        if name == "Home" {
            SkyPoint::new(150.0, 2.0)
        } else {
            Err(AstroMosaicError::FormatError(name.to_string()))
        }
    };
    let session = AstroMosaic::new("Home", anchor, &spain_config(), &lookup).unwrap();
    assert_eq!(session.target().dec_deg, 2.0);

    assert!(matches!(
        AstroMosaic::new("Away", anchor, &spain_config(), &lookup),
        Err(AstroMosaicError::ResolutionError { .. })
    ));
}

#[test]
fn test_session_from_toml() {
    let config: EngineConfig = r#"
        [observer]
        latitude = 37.4988
        longitude = -2.42178

        [camera]
        preset = "T3"

        [schedule]
        interval_minutes = 15

        [resolver]
        offline = true

        [resolver.catalog]
        "Leo triplet" = [170.0, 13.3]
    "#
    .parse()
    .unwrap();

    let session = AstroMosaic::from_config("Leo triplet", Some("2025-03-15"), &config).unwrap();
    assert_eq!(session.target().ra_deg, 170.0);
    assert!((session.fov().0 - 1.654).abs() < 1e-9);

    let trace = session.night_trace().unwrap();
    let step = trace[1].timestamp_utc - trace[0].timestamp_utc;
    assert!((step.to_seconds() - 900.0).abs() < 1e-6);
}
