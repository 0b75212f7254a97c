//! # Tabular rendering and CSV export
//!
//! Display adaptors turning query results into terminal tables (**comfy-table**, `UTF8_FULL`
//! preset) and CSV documents (**csv** + serde `Serialize` on the record types).
//!
//! | Adaptor            | Rows                     | Columns                                          |
//! |--------------------|--------------------------|--------------------------------------------------|
//! | [`NightTraceTable`]| [`VisibilitySample`]     | UTC, target alt/az, Moon alt/az, Moon sep, state |
//! | [`YearTrendTable`] | [`DailyTrendSample`]     | date, target alt, Moon alt, phase %, Moon sep    |
//! | [`MosaicTable`]    | [`MosaicPanel`]          | panel, RA/Dec text, RA h, RA/Dec degrees         |
//!
//! Adaptors borrow the records; nothing is copied until rendering.
//!
//! ## Example
//!
//! ```rust,ignore
//! let trace = session.night_trace()?;
//! println!("{}", NightTraceTable::new(&trace).decimals(1).only_visible(true));
//! ```
use std::fmt;
use std::io::Write;

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};
use serde::Serialize;

use crate::astromosaic_errors::AstroMosaicError;
use crate::mosaic::MosaicPanel;
use crate::time::{format_utc_date, format_utc_timestamp};
use crate::visibility::{DailyTrendSample, VisibilityClass, VisibilitySample};

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.iter().map(|h| Cell::new(*h)).collect::<Vec<_>>());
    table
}

fn number(value: f64, decimals: usize) -> Cell {
    Cell::new(format!("{value:.decimals$}")).set_alignment(CellAlignment::Right)
}

fn class_label(class: VisibilityClass) -> &'static str {
    match class {
        VisibilityClass::Visible => "visible",
        VisibilityClass::BelowSoftHorizon => "soft limit",
        VisibilityClass::BelowHardHorizon => "hard limit",
        VisibilityClass::BelowHorizon => "below horizon",
        VisibilityClass::MeridianFlip => "meridian flip",
    }
}

/// Table adaptor for a night trace.
pub struct NightTraceTable<'a> {
    samples: &'a [VisibilitySample],
    decimals: usize,
    only_visible: bool,
}

impl<'a> NightTraceTable<'a> {
    pub fn new(samples: &'a [VisibilitySample]) -> Self {
        NightTraceTable {
            samples,
            decimals: 2,
            only_visible: false,
        }
    }

    /// Fractional digits of the angle columns (default 2).
    pub fn decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    /// Skip samples with the target below the geometric horizon.
    pub fn only_visible(mut self, yes: bool) -> Self {
        self.only_visible = yes;
        self
    }

    pub fn to_table(&self) -> Table {
        let mut table = new_table(&[
            "UTC",
            "Target alt [°]",
            "Target az [°]",
            "Moon alt [°]",
            "Moon az [°]",
            "Moon sep [°]",
            "State",
        ]);
        let d = self.decimals;
        for s in self
            .samples
            .iter()
            .filter(|s| !self.only_visible || s.is_visible)
        {
            table.add_row(Row::from(vec![
                Cell::new(format_utc_timestamp(s.timestamp_utc)),
                number(s.target_alt_deg, d),
                number(s.target_az_deg, d),
                number(s.moon_alt_deg, d),
                number(s.moon_az_deg, d),
                number(s.moon_target_separation_deg, d),
                Cell::new(class_label(s.class)),
            ]));
        }
        table
    }
}

impl fmt::Display for NightTraceTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_table())
    }
}

/// Table adaptor for a year trend.
pub struct YearTrendTable<'a> {
    days: &'a [DailyTrendSample],
    every: usize,
}

impl<'a> YearTrendTable<'a> {
    pub fn new(days: &'a [DailyTrendSample]) -> Self {
        YearTrendTable { days, every: 1 }
    }

    /// Print one day out of `every` (e.g. 7 for a weekly table).
    pub fn every(mut self, every: usize) -> Self {
        self.every = every.max(1);
        self
    }

    pub fn to_table(&self) -> Table {
        let mut table = new_table(&[
            "Date",
            "Target alt [°]",
            "Moon alt [°]",
            "Moon phase [%]",
            "Moon sep [°]",
        ]);
        for d in self.days.iter().step_by(self.every) {
            table.add_row(Row::from(vec![
                Cell::new(format_utc_date(d.date)),
                number(d.target_alt_at_midnight_deg, 2),
                number(d.moon_alt_at_midnight_deg, 2),
                number(d.moon_phase_percent, 1),
                number(d.moon_target_separation_deg, 1),
            ]));
        }
        table
    }
}

impl fmt::Display for YearTrendTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_table())
    }
}

/// Table adaptor for mosaic panels, in row-major order.
pub struct MosaicTable<'a> {
    rows: Vec<&'a [MosaicPanel]>,
}

impl<'a> MosaicTable<'a> {
    pub fn new(grid: &'a [Vec<MosaicPanel>]) -> Self {
        MosaicTable {
            rows: grid.iter().map(Vec::as_slice).collect(),
        }
    }

    /// Adaptor for a flat panel list (see [`crate::mosaic::panels_from_points`]).
    pub fn from_panels(panels: &'a [MosaicPanel]) -> Self {
        MosaicTable { rows: vec![panels] }
    }

    pub fn to_table(&self) -> Table {
        let mut table = new_table(&["Panel", "RA", "Dec", "RA [h]", "RA [°]", "Dec [°]"]);
        for p in self.rows.iter().flat_map(|r| r.iter()) {
            table.add_row(Row::from(vec![
                Cell::new(&p.label),
                Cell::new(&p.ra_str).set_alignment(CellAlignment::Right),
                Cell::new(&p.dec_str).set_alignment(CellAlignment::Right),
                number(p.ra_hours, 6),
                number(p.ra_deg, 6),
                number(p.dec_deg, 6),
            ]));
        }
        table
    }
}

impl fmt::Display for MosaicTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_table())
    }
}

/// Write serializable records as CSV, with a header row.
///
/// Arguments
/// -----------------
/// * `records`: night samples, trend days, panels or any other `Serialize` rows.
/// * `writer`: destination, e.g. a file or `std::io::stdout()`.
pub fn write_csv<T, W>(records: &[T], writer: W) -> Result<(), AstroMosaicError>
where
    T: Serialize,
    W: Write,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// CSV rendering of `records` into a string.
pub fn to_csv_string<T: Serialize>(records: &[T]) -> Result<String, AstroMosaicError> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| AstroMosaicError::FormatError(e.to_string()))
}

#[cfg(test)]
mod display_test {
    use super::*;
    use crate::coordinates::SkyPoint;
    use crate::mosaic::{tile, MosaicParams};
    use crate::time::parse_instant;

    fn sample(t: &str, alt: f64) -> VisibilitySample {
        VisibilitySample {
            timestamp_utc: parse_instant(t).unwrap(),
            target_alt_deg: alt,
            target_az_deg: 180.0,
            moon_alt_deg: -10.0,
            moon_az_deg: 90.0,
            moon_target_separation_deg: 45.0,
            is_visible: alt > 0.0,
            class: if alt > 0.0 {
                VisibilityClass::Visible
            } else {
                VisibilityClass::BelowHorizon
            },
        }
    }

    #[test]
    fn test_night_trace_table() {
        let samples = [
            sample("2025-06-09T21:00:00", 12.346),
            sample("2025-06-09T21:05:00", -1.0),
        ];
        let all = NightTraceTable::new(&samples).to_string();
        assert!(all.contains("2025-06-09 21:00:00"));
        assert!(all.contains("12.35"));
        assert!(all.contains("below horizon"));

        let visible = NightTraceTable::new(&samples)
            .only_visible(true)
            .decimals(1)
            .to_string();
        assert!(visible.contains("12.3"));
        assert!(!visible.contains("21:05:00"));
    }

    #[test]
    fn test_csv_export() {
        let samples = [sample("2025-06-09T21:00:00", 12.5)];
        let csv = to_csv_string(&samples).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp_utc,target_alt_deg,target_az_deg,moon_alt_deg,moon_az_deg,\
             moon_target_separation_deg,is_visible,class"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2025-06-09 21:00:00,12.5,180.0,-10.0,90.0,45.0,true,Visible"
        );
    }

    #[test]
    fn test_mosaic_table_and_csv() {
        let grid = tile(
            &SkyPoint::new(148.888, 69.065).unwrap(),
            &MosaicParams::new(1.0, 1.0, 2, 1),
        )
        .unwrap();
        let table = MosaicTable::new(&grid).to_string();
        assert!(table.contains("A1") && table.contains("A2"));

        let csv = to_csv_string(&grid[0]).unwrap();
        assert!(csv.starts_with("label,ra_deg,ra_hours,dec_deg,ra_str,dec_str\n"));
        assert_eq!(csv.lines().count(), 3);
    }
}
