//! Command line front end: night traces, year trends, mosaic grids and FITS file chores.
use std::io;
use std::process::ExitCode;

use astromosaic::astromosaic::AstroMosaic;
use astromosaic::astromosaic_errors::AstroMosaicError;
use astromosaic::config::{EngineConfig, TelescopePreset};
use astromosaic::conversion::format_sexagesimal;
use astromosaic::display::{write_csv, MosaicTable, NightTraceTable, YearTrendTable};
use astromosaic::fits_header::{fits_files_in, move_by_resolution, read_header_file, summarize};
use astromosaic::mosaic::{GuiderField, GuiderSide, MosaicParams};
use astromosaic::report::MosaicReport;
use astromosaic::time::format_utc_timestamp;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};

#[derive(Parser)]
#[command(name = "astromosaic")]
#[command(about = "Target visibility and mosaic planning for astrophotography")]
#[command(version)]
struct Cli {
    /// TOML configuration file (site, camera, schedule, resolver)
    #[arg(short, long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Site latitude in degrees, overrides the configuration
    #[arg(long, global = true, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Site longitude in degrees, east positive
    #[arg(long, global = true, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Site elevation in metres
    #[arg(long, global = true)]
    elevation: Option<f64>,

    /// Print CSV instead of a table
    #[arg(long, global = true)]
    csv: bool,

    /// Do not query the Sesame name resolver
    #[arg(long, global = true)]
    offline: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Target and Moon positions through the night
    Night(NightArgs),

    /// Target and Moon at local midnight for a year
    Year(YearArgs),

    /// Panel centres of a mosaic around the target
    Mosaic(MosaicArgs),

    /// Off-axis guider field next to the target field
    Guider(GuiderArgs),

    /// Resolve a target and print its coordinates
    Resolve(TargetArgs),

    /// FITS file utilities
    #[command(subcommand)]
    Fits(FitsCommands),
}

#[derive(Args)]
struct TargetArgs {
    /// Object name or coordinates ("09:55:33 69:03:55", "9.9259 69.065", "095533 +690355")
    target: String,

    /// Anchor date or instant (UTC), defaults to now
    #[arg(short, long)]
    date: Option<String>,
}

#[derive(Args)]
struct NightArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Sampling interval in minutes
    #[arg(long)]
    interval: Option<u32>,

    /// Sun altitude bounding the night, degrees
    #[arg(long, allow_hyphen_values = true)]
    twilight: Option<f64>,

    /// Only print samples with the target above the horizon
    #[arg(long)]
    visible_only: bool,
}

#[derive(Args)]
struct YearArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Local timezone offset from UTC in hours
    #[arg(long, allow_hyphen_values = true)]
    tz: Option<f64>,

    /// Print one day out of N
    #[arg(long, default_value = "1")]
    every: usize,
}

#[derive(Args)]
struct CameraArgs {
    /// Telescope preset (T1, T2, T3, T4, C1)
    #[arg(long)]
    preset: Option<String>,

    /// Horizontal field of view in degrees
    #[arg(long)]
    fov_x: Option<f64>,

    /// Vertical field of view in degrees
    #[arg(long)]
    fov_y: Option<f64>,
}

#[derive(Args)]
struct MosaicArgs {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    camera: CameraArgs,

    /// Panels per row
    #[arg(long, default_value = "3")]
    grid_x: i32,

    /// Number of rows
    #[arg(long, default_value = "3")]
    grid_y: i32,

    /// Overlap between neighbouring panels, percent
    #[arg(long)]
    overlap: Option<f64>,

    /// Write an Aladin Lite preview page to this file
    #[arg(long)]
    html: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct GuiderArgs {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    camera: CameraArgs,

    /// Side of the main field (T, B, L, R)
    #[arg(long, default_value = "T")]
    side: String,

    /// Guider field width in degrees
    #[arg(long)]
    guider_x: f64,

    /// Guider field height in degrees
    #[arg(long)]
    guider_y: f64,

    /// Gap between the two fields in degrees
    #[arg(long, default_value = "0")]
    offset: f64,
}

#[derive(Subcommand)]
enum FitsCommands {
    /// Print file, NAXIS1, NAXIS2, telescope and filter
    List(FitsFiles),
    /// Move files into NAXIS1xNAXIS2 directories
    Move(FitsFiles),
    /// Print every header card as KEY=value
    Header(FitsFiles),
}

#[derive(Args)]
struct FitsFiles {
    /// Files to process, defaults to the *.fit files of the current directory
    files: Vec<Utf8PathBuf>,
}

fn load_config(cli: &Cli) -> Result<EngineConfig, AstroMosaicError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => match (cli.lat, cli.lon) {
            (Some(lat), Some(lon)) => EngineConfig::for_site(lat, lon, 0.0),
            _ => {
                return Err(AstroMosaicError::ConfigError(
                    "give a site with --config or --lat/--lon".into(),
                ))
            }
        },
    };
    if let Some(lat) = cli.lat {
        config.observer.latitude = lat;
    }
    if let Some(lon) = cli.lon {
        config.observer.longitude = lon;
    }
    if let Some(elevation) = cli.elevation {
        config.observer.elevation = elevation;
    }
    config.resolver.offline |= cli.offline;
    Ok(config)
}

fn apply_camera(config: &mut EngineConfig, camera: &CameraArgs) -> Result<(), AstroMosaicError> {
    if let Some(preset) = &camera.preset {
        config.camera.preset = Some(preset.parse::<TelescopePreset>()?);
        config.camera.fov_x = None;
        config.camera.fov_y = None;
    }
    if camera.fov_x.is_some() || camera.fov_y.is_some() {
        config.camera.fov_x = camera.fov_x;
        config.camera.fov_y = camera.fov_y;
    }
    Ok(())
}

fn session(target: &TargetArgs, config: &EngineConfig) -> Result<AstroMosaic, AstroMosaicError> {
    AstroMosaic::from_config(&target.target, target.date.as_deref(), config)
}

fn fits_files(args: &FitsFiles) -> Result<Vec<Utf8PathBuf>, AstroMosaicError> {
    if args.files.is_empty() {
        fits_files_in(Utf8Path::new("."))
    } else {
        Ok(args.files.clone())
    }
}

fn run(cli: &Cli) -> Result<(), AstroMosaicError> {
    match &cli.command {
        Commands::Night(args) => {
            let mut config = load_config(cli)?;
            if let Some(interval) = args.interval {
                config.schedule.interval_minutes = interval;
            }
            if let Some(twilight) = args.twilight {
                config.schedule.twilight_deg = twilight;
            }
            let session = session(&args.target, &config)?;
            let trace = session.night_trace()?;
            if trace.is_empty() {
                info!("no dark period around the anchor date");
            }
            if cli.csv {
                write_csv(&trace, io::stdout())?;
            } else {
                if let Some(summary) = session.night_summary()? {
                    println!(
                        "Night {} to {} UTC, Moon phase {:.0}%, Moon distance {:.1}°",
                        format_utc_timestamp(summary.window.start),
                        format_utc_timestamp(summary.window.end),
                        summary.moon_phase_percent,
                        summary.moon_target_separation_deg
                    );
                }
                println!(
                    "{}",
                    NightTraceTable::new(&trace).only_visible(args.visible_only)
                );
            }
        }
        Commands::Year(args) => {
            let mut config = load_config(cli)?;
            if let Some(tz) = args.tz {
                config.schedule.timezone_offset_hours = tz;
            }
            let trend = session(&args.target, &config)?.year_trend()?;
            if cli.csv {
                write_csv(&trend, io::stdout())?;
            } else {
                println!("{}", YearTrendTable::new(&trend).every(args.every));
            }
        }
        Commands::Mosaic(args) => {
            let mut config = load_config(cli)?;
            apply_camera(&mut config, &args.camera)?;
            if let Some(overlap) = args.overlap {
                config.camera.overlap_percent = overlap;
            }
            let session = session(&args.target, &config)?;
            let (fov_x, fov_y) = session.fov();
            let params = MosaicParams::new(fov_x, fov_y, args.grid_x, args.grid_y)
                .with_overlap(config.camera.overlap_percent);
            let grid = session.mosaic_with(&params)?;

            if cli.csv {
                let panels: Vec<_> = grid.iter().flatten().cloned().collect();
                write_csv(&panels, io::stdout())?;
            } else {
                println!("{}", MosaicTable::new(&grid));
            }

            if let Some(path) = &args.html {
                let telescope = match config.camera.preset {
                    Some(preset) if config.camera.fov_x.is_none() => format!("{preset:?}"),
                    _ => format!("{fov_x:.3}x{fov_y:.3}"),
                };
                MosaicReport::new(session.identifier(), &telescope)
                    .command_line(std::env::args().skip(1))
                    .write(&grid, path)?;
                println!("Mosaic images in file {path}");
            }
        }
        Commands::Guider(args) => {
            let mut config = load_config(cli)?;
            apply_camera(&mut config, &args.camera)?;
            let session = session(&args.target, &config)?;
            let guider = GuiderField {
                fov_x_deg: args.guider_x,
                fov_y_deg: args.guider_y,
                offset_deg: args.offset,
                side: args.side.parse::<GuiderSide>()?,
            };
            let center = session.guider_center(&guider)?;
            let (ra, dec) = format_sexagesimal(&center)?;
            println!("Guider centre {ra} {dec} ({:.5}, {:.5})", center.ra_deg, center.dec_deg);
        }
        Commands::Resolve(args) => {
            let config = load_config(cli)?;
            let session = session(args, &config)?;
            let (ra, dec) = format_sexagesimal(session.target())?;
            println!(
                "{}: {ra} {dec} ({:.6}, {:.6})",
                session.identifier(),
                session.target().ra_deg,
                session.target().dec_deg
            );
        }
        Commands::Fits(FitsCommands::List(args)) => {
            for path in fits_files(args)? {
                println!("{}", summarize(&path)?);
            }
        }
        Commands::Fits(FitsCommands::Move(args)) => {
            for path in fits_files(args)? {
                let target = move_by_resolution(&path)?;
                println!("move {path} to {target}");
            }
        }
        Commands::Fits(FitsCommands::Header(args)) => {
            for path in fits_files(args)? {
                println!("{path}");
                for line in read_header_file(&path)?.lines() {
                    println!("{line}");
                }
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
