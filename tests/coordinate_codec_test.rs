use approx::assert_abs_diff_eq;
use astromosaic::astromosaic_errors::AstroMosaicError;
use astromosaic::conversion::{
    format_ra_dec, format_sexagesimal, parse_decimal_pair, parse_sexagesimal,
};
use astromosaic::coordinates::{AngleUnit, SkyPoint};
use astromosaic::resolver::resolve_target;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_format_then_parse_recovers_point() {
    for (ra, dec) in [(148.888, 69.065), (10.6847, 41.269), (283.396, -30.478), (0.0, 0.0)] {
        let point = SkyPoint::new(ra, dec).unwrap();
        let (ra_str, dec_str) = format_sexagesimal(&point).unwrap();
        let back = parse_sexagesimal(&ra_str, &dec_str).unwrap();
        assert_abs_diff_eq!(back.ra_deg, ra, epsilon = 1e-4);
        assert_abs_diff_eq!(back.dec_deg, dec, epsilon = 1e-4);
    }
}

#[test]
fn test_negative_ra_formats_as_wrapped_hours() {
    let (ra_str, _) = format_ra_dec(-0.9, 10.0).unwrap();
    assert_eq!(ra_str, "23:56:24.00");

    // Catalog values past 180 format as they are; the range stops at 360
    let (ra_str, _) = format_ra_dec(359.0, 10.0).unwrap();
    assert_eq!(ra_str, "23:56:00.00");
    assert!(matches!(
        format_ra_dec(361.0, 10.0),
        Err(AstroMosaicError::RangeError(_))
    ));
    assert!(matches!(
        format_ra_dec(-181.0, 10.0),
        Err(AstroMosaicError::RangeError(_))
    ));
}

#[test]
fn test_out_of_range_declination() {
    assert!(matches!(
        format_ra_dec(10.0, 95.0),
        Err(AstroMosaicError::RangeError(_))
    ));
    assert!(matches!(
        format_ra_dec(10.0, -91.0),
        Err(AstroMosaicError::RangeError(_))
    ));
    assert!(SkyPoint::new(10.0, 90.5).is_err());
}

#[test]
fn test_malformed_sexagesimal() {
    assert!(matches!(
        parse_sexagesimal("09:55", "69:03:55"),
        Err(AstroMosaicError::FormatError(_))
    ));
}

fn to_hours(h: f64, m: f64, s: f64) -> f64 {
    h + m / 60.0 + s / 3600.0
}

#[test]
fn test_sexagesimal_and_decimal_hours_agree() {
    let cases = [
        ("09:55:33.17", "+69:03:55.1", to_hours(9.0, 55.0, 33.17), to_hours(69.0, 3.0, 55.1)),
        ("00:00:00.01", "-00:30:00", to_hours(0.0, 0.0, 0.01), -0.5),
        ("23:59:59.99", "-89:59:59.9", to_hours(23.0, 59.0, 59.99), -to_hours(89.0, 59.0, 59.9)),
        ("12:30:00", "-45:15:30.5", 12.5, -to_hours(45.0, 15.0, 30.5)),
    ];

    for (ra_str, dec_str, ra_h, dec_d) in cases {
        let sexa = parse_sexagesimal(ra_str, dec_str).unwrap();
        let decimal = parse_decimal_pair(ra_h, dec_d, AngleUnit::Hours).unwrap();
        assert_abs_diff_eq!(sexa.ra_deg, decimal.ra_deg, epsilon = 1e-6);
        assert_abs_diff_eq!(sexa.dec_deg, decimal.dec_deg, epsilon = 1e-6);
    }

    // Degrees input is the same point once RA is given in degrees
    let deg = parse_decimal_pair(to_hours(9.0, 55.0, 33.17) * 15.0, 69.0, AngleUnit::Degrees).unwrap();
    let sexa = parse_sexagesimal("09:55:33.17", "69:00:00").unwrap();
    assert_abs_diff_eq!(deg.ra_deg, sexa.ra_deg, epsilon = 1e-9);
}

#[test]
fn test_sexagesimal_and_decimal_hours_agree_random() {
    let mut rng = StdRng::seed_from_u64(0x5E7A);

    for _ in 0..500 {
        let (h, m): (u32, u32) = (rng.random_range(0..24), rng.random_range(0..60));
        let s = rng.random_range(0..6000) as f64 / 100.0;
        let (d, dm): (u32, u32) = (rng.random_range(0..90), rng.random_range(0..60));
        let ds = rng.random_range(0..600) as f64 / 10.0;
        let negative = rng.random_bool(0.5);

        let ra_str = format!("{h:02}:{m:02}:{s:05.2}");
        let dec_str = format!("{}{d:02}:{dm:02}:{ds:04.1}", if negative { "-" } else { "+" });
        let dec = to_hours(d as f64, dm as f64, ds) * if negative { -1.0 } else { 1.0 };

        let sexa = parse_sexagesimal(&ra_str, &dec_str).unwrap();
        let decimal =
            parse_decimal_pair(to_hours(h as f64, m as f64, s), dec, AngleUnit::Hours).unwrap();
        assert_abs_diff_eq!(sexa.ra_deg, decimal.ra_deg, epsilon = 1e-6);
        assert_abs_diff_eq!(sexa.dec_deg, decimal.dec_deg, epsilon = 1e-6);
    }
}

#[test]
fn test_command_line_target_forms() {
    let no_lookup = |name: &str| -> Result<SkyPoint, AstroMosaicError> {
        Err(AstroMosaicError::FormatError(format!("lookup of '{name}'")))
    };

    for text in ["09:55:33 69:03:55", "9.9259 69.065", "095533 +690355"] {
        let point = resolve_target(text, &no_lookup).unwrap();
        assert_abs_diff_eq!(point.ra_deg, 148.888, epsilon = 1e-2);
        assert_abs_diff_eq!(point.dec_deg, 69.065, epsilon = 1e-2);
    }

    // Without the separator the compact form is a name
    assert!(matches!(
        resolve_target("095533+690355", &no_lookup),
        Err(AstroMosaicError::ResolutionError { .. })
    ));
}
