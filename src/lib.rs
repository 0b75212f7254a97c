pub mod astromosaic;
pub mod astromosaic_errors;
pub mod config;
pub mod constants;
pub mod conversion;
pub mod coordinates;
pub mod display;
pub mod earth_orientation;
pub mod env_state;
pub mod ephemeris;
pub mod fits_header;
pub mod mosaic;
pub mod observers;
pub mod report;
pub mod resolver;
pub mod time;
pub mod visibility;
