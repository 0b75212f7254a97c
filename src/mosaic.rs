//! # Mosaic tiling
//!
//! Rectangular grids of imaging panels centred on a target, given the camera field of view and
//! the desired overlap between neighbouring panels.
//!
//! ## Layout
//!
//! ```text
//! step   = fov · (1 − overlap / 100)             (per axis)
//! dec_i  = dec + (−step_y·(ny − 1)/2 + i·step_y)  (row i, label letter A, B, …)
//! ra_ij  = ra + (−step_x·(nx − 1)/2 + j·step_x) / cos(dec_i)   (column j, label number 1, 2, …)
//! ```
//!
//! The `1 / cos(dec)` term keeps the angular width of a column constant on the sky; it grows
//! without bound towards the poles and is not special-cased.
//!
//! Panel right ascensions outside `[-180, 180]` are wrapped into it; declinations past a pole are
//! handled by the selected [`DeclinationWrap`] policy. Every panel centre is formatted through
//! [`format_ra_dec`], and a formatting failure aborts the whole grid.
//!
//! ## See also
//! ------------
//! * [`crate::report`] – HTML rendering of a grid.
//! * [`crate::display`] – table rendering of a grid.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::astromosaic_errors::AstroMosaicError;
use crate::constants::{
    Degree, Hour, DEFAULT_OVERLAP_PERCENT, HOUR_TO_DEG, MAX_GRID_DIMENSION, MOSAIC_ROW_LABELS,
};
use crate::conversion::format_ra_dec;
use crate::coordinates::{wrap_ra_signed, SkyPoint};

/// Treatment of panel declinations beyond ±90°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeclinationWrap {
    /// `dec mod 360`; the value stays out of range and the formatter rejects it.
    #[default]
    Modulo360,
    /// Reflect over the pole and move the panel by 12h in right ascension.
    ReflectAtPole,
}

impl DeclinationWrap {
    fn apply(self, ra: Degree, dec: Degree) -> (Degree, Degree) {
        if (-90.0..=90.0).contains(&dec) {
            return (ra, dec);
        }
        match self {
            DeclinationWrap::Modulo360 => (ra, dec.rem_euclid(360.0)),
            DeclinationWrap::ReflectAtPole if dec > 90.0 => (ra + 180.0, 180.0 - dec),
            DeclinationWrap::ReflectAtPole => (ra + 180.0, -180.0 - dec),
        }
    }
}

/// Tiling request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MosaicParams {
    pub fov_x_deg: Degree,
    pub fov_y_deg: Degree,
    pub grid_x: i32,
    pub grid_y: i32,
    pub overlap_percent: f64,
    #[serde(default)]
    pub dec_wrap: DeclinationWrap,
}

impl MosaicParams {
    /// `grid_x` × `grid_y` panels of the given field with the default overlap.
    pub fn new(fov_x_deg: Degree, fov_y_deg: Degree, grid_x: i32, grid_y: i32) -> Self {
        MosaicParams {
            fov_x_deg,
            fov_y_deg,
            grid_x,
            grid_y,
            overlap_percent: DEFAULT_OVERLAP_PERCENT,
            dec_wrap: DeclinationWrap::default(),
        }
    }

    pub fn with_overlap(mut self, overlap_percent: f64) -> Self {
        self.overlap_percent = overlap_percent;
        self
    }

    pub fn with_dec_wrap(mut self, dec_wrap: DeclinationWrap) -> Self {
        self.dec_wrap = dec_wrap;
        self
    }

    pub fn panel_count(&self) -> usize {
        if self.grid_x <= 0 || self.grid_y <= 0 {
            return 0;
        }
        (self.grid_x * self.grid_y) as usize
    }
}

/// One pointing of a mosaic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MosaicPanel {
    /// Row letter followed by the 1-based column number, e.g. `B3`.
    pub label: String,
    /// Right ascension, degrees in `[-180, 180]`.
    pub ra_deg: Degree,
    pub ra_hours: Hour,
    pub dec_deg: Degree,
    pub ra_str: String,
    pub dec_str: String,
    /// Field of view the panel was computed for.
    #[serde(skip)]
    pub fov: (Degree, Degree),
}

/// Row-major grid of panels.
pub type MosaicGrid = Vec<Vec<MosaicPanel>>;

impl MosaicPanel {
    fn at(
        label: String,
        ra_deg: Degree,
        dec_deg: Degree,
        fov: (Degree, Degree),
    ) -> Result<Self, AstroMosaicError> {
        let (ra_str, dec_str) = format_ra_dec(ra_deg, dec_deg)?;
        Ok(MosaicPanel {
            label,
            ra_deg,
            ra_hours: ra_deg / HOUR_TO_DEG,
            dec_deg,
            ra_str,
            dec_str,
            fov,
        })
    }

    /// Panel centre as a sky point with RA in `[0, 360)`.
    pub fn center(&self) -> Result<SkyPoint, AstroMosaicError> {
        SkyPoint::new(self.ra_deg.rem_euclid(360.0), self.dec_deg)
    }

    /// Closed outline of the panel as `(ra, dec)` vertices, degrees.
    ///
    /// The top and bottom edges get their own `1 / cos(dec)` half-width, so the outline is a
    /// trapezoid in RA/Dec. The first vertex is repeated at the end.
    pub fn footprint(&self) -> [(Degree, Degree); 5] {
        footprint(self.ra_deg, self.dec_deg, self.fov.0, self.fov.1)
    }
}

fn footprint(ra: Degree, dec: Degree, fov_x: Degree, fov_y: Degree) -> [(Degree, Degree); 5] {
    let top = dec + fov_y / 2.0;
    let bottom = dec - fov_y / 2.0;
    let half_top = fov_x / 2.0 / top.abs().to_radians().cos();
    let half_bottom = fov_x / 2.0 / bottom.abs().to_radians().cos();
    [
        (ra - half_top, top),
        (ra + half_top, top),
        (ra + half_bottom, bottom),
        (ra - half_bottom, bottom),
        (ra - half_top, top),
    ]
}

fn check_dimension(axis: &'static str, requested: i32) -> Result<(), AstroMosaicError> {
    if requested > MAX_GRID_DIMENSION {
        return Err(AstroMosaicError::GridSizeError {
            axis,
            requested,
            max: MAX_GRID_DIMENSION,
        });
    }
    Ok(())
}

/// Compute the panel grid of a mosaic centred on `target`.
///
/// Arguments
/// -----------------
/// * `target`: mosaic centre.
/// * `params`: field of view, grid size, overlap and declination policy.
///
/// Return
/// ----------
/// * `grid_y` rows of `grid_x` panels, row-major. Empty when either dimension is `<= 0`.
///   For odd dimensions the middle panel sits exactly on `target`.
///
/// Errors
/// ----------
/// * [`AstroMosaicError::GridSizeError`] if a dimension exceeds [`MAX_GRID_DIMENSION`].
/// * [`AstroMosaicError::RangeError`] if a panel centre cannot be formatted (e.g. a declination
///   left beyond a pole by [`DeclinationWrap::Modulo360`]).
///
/// See also
/// ------------
/// * [`offaxis_guider_center`] – guider field placement next to a single panel.
pub fn tile(target: &SkyPoint, params: &MosaicParams) -> Result<MosaicGrid, AstroMosaicError> {
    if params.grid_x <= 0 || params.grid_y <= 0 {
        return Ok(Vec::new());
    }
    check_dimension("x", params.grid_x)?;
    check_dimension("y", params.grid_y)?;

    let fov_factor = 1.0 - params.overlap_percent / 100.0;
    let step_x = params.fov_x_deg * fov_factor;
    let step_y = params.fov_y_deg * fov_factor;
    let start_x = -step_x * (params.grid_x - 1) as f64 / 2.0;
    let start_y = -step_y * (params.grid_y - 1) as f64 / 2.0;

    let mut grid = Vec::with_capacity(params.grid_y as usize);
    for (i, row_label) in MOSAIC_ROW_LABELS
        .iter()
        .take(params.grid_y as usize)
        .enumerate()
    {
        let row_dec = target.dec_deg + (start_y + i as f64 * step_y);
        let ra_correction = 1.0 / row_dec.to_radians().cos();

        let row = (0..params.grid_x)
            .map(|j| {
                let ra_offset = start_x + j as f64 * step_x;
                let raw_ra = target.ra_deg + ra_offset * ra_correction;
                let (ra, dec) = params.dec_wrap.apply(raw_ra, row_dec);
                MosaicPanel::at(
                    format!("{row_label}{}", j + 1),
                    wrap_ra_signed(ra),
                    dec,
                    (params.fov_x_deg, params.fov_y_deg),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        grid.push(row);
    }

    debug!(
        "mosaic {}x{} around ({}, {}), step {step_x:.4}° x {step_y:.4}°",
        params.grid_x, params.grid_y, target.ra_deg, target.dec_deg
    );
    Ok(grid)
}

/// Labeled panels for an explicit list of centres, numbered from 1.
pub fn panels_from_points(
    points: &[SkyPoint],
    fov_x_deg: Degree,
    fov_y_deg: Degree,
) -> Result<Vec<MosaicPanel>, AstroMosaicError> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            MosaicPanel::at(
                (i + 1).to_string(),
                wrap_ra_signed(p.ra_deg),
                p.dec_deg,
                (fov_x_deg, fov_y_deg),
            )
        })
        .collect()
}

/// Side of the main field where an off-axis guider sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuiderSide {
    Top,
    Bottom,
    /// East, towards increasing right ascension.
    Left,
    Right,
}

impl std::str::FromStr for GuiderSide {
    type Err = AstroMosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "T" | "TOP" => Ok(GuiderSide::Top),
            "B" | "BOTTOM" => Ok(GuiderSide::Bottom),
            "L" | "LEFT" => Ok(GuiderSide::Left),
            "R" | "RIGHT" => Ok(GuiderSide::Right),
            other => Err(AstroMosaicError::FormatError(format!(
                "unknown guider side '{other}', expected T, B, L or R"
            ))),
        }
    }
}

/// Off-axis guider field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuiderField {
    pub fov_x_deg: Degree,
    pub fov_y_deg: Degree,
    /// Gap between the edges of the main and guider fields.
    pub offset_deg: Degree,
    pub side: GuiderSide,
}

/// Centre of the off-axis guider field attached to a main field centred on `target`.
///
/// Arguments
/// -----------------
/// * `target`: centre of the main field.
/// * `main_fov`: main field `(x, y)` size, degrees.
/// * `guider`: guider field size, gap and side.
///
/// Return
/// ----------
/// * The guider centre, RA in `[0, 360)`.
///
/// Errors
/// ----------
/// * [`AstroMosaicError::RangeError`] if a top/bottom guider would sit beyond a pole.
pub fn offaxis_guider_center(
    target: &SkyPoint,
    main_fov: (Degree, Degree),
    guider: &GuiderField,
) -> Result<SkyPoint, AstroMosaicError> {
    let dy = main_fov.1 / 2.0 + guider.offset_deg + guider.fov_y_deg / 2.0;
    let dx = (main_fov.0 / 2.0 + guider.offset_deg + guider.fov_x_deg / 2.0)
        / target.dec_deg.abs().to_radians().cos();

    let (ra, dec) = match guider.side {
        GuiderSide::Top => (target.ra_deg, target.dec_deg + dy),
        GuiderSide::Bottom => (target.ra_deg, target.dec_deg - dy),
        GuiderSide::Left => (target.ra_deg + dx, target.dec_deg),
        GuiderSide::Right => (target.ra_deg - dx, target.dec_deg),
    };
    SkyPoint::new(ra.rem_euclid(360.0), dec)
}

/// Outline of a guider field, same vertex layout as [`MosaicPanel::footprint`].
pub fn guider_footprint(center: &SkyPoint, guider: &GuiderField) -> [(Degree, Degree); 5] {
    footprint(center.ra_deg, center.dec_deg, guider.fov_x_deg, guider.fov_y_deg)
}
