use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hifitime::Epoch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skypass::constants::{GravityModel, OpsMode};
use skypass::elements::omm::parse_omm_array;
use skypass::elements::tle::split_catalog;
use skypass::time::parse_iso_utc;
use skypass::{ElementRecord, Observer, SkyParams, SkyPass, SkypassError};

fn parse_gravity(s: &str) -> Result<GravityModel, String> {
    match s.to_ascii_lowercase().as_str() {
        "wgs72old" => Ok(GravityModel::Wgs72Old),
        "wgs72" => Ok(GravityModel::Wgs72),
        "wgs84" => Ok(GravityModel::Wgs84),
        other => Err(format!("unknown gravity model {other:?} (wgs72old, wgs72, wgs84)")),
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "List the satellites above an observer's horizon")]
struct Args {
    /// Observer geodetic latitude, degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Observer longitude, degrees east
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Observer height above the WGS84 ellipsoid, meters
    #[arg(long, allow_hyphen_values = true)]
    height: f64,

    /// ISO-8601 UTC instant (default: now)
    #[arg(long)]
    time: Option<String>,

    /// JSON array of GP/OMM records
    #[arg(long)]
    omm: Vec<PathBuf>,

    /// Two- or three-line element file
    #[arg(long)]
    tle: Vec<PathBuf>,

    /// Elevation mask, degrees
    #[arg(long, allow_hyphen_values = true)]
    min_elevation: Option<f64>,

    /// wgs72old, wgs72 or wgs84
    #[arg(long, value_parser = parse_gravity)]
    gravity: Option<GravityModel>,

    /// Use the AFSPC operation mode
    #[arg(long)]
    afspc: bool,

    /// Disable the parallel fan-out
    #[arg(long)]
    sequential: bool,

    /// Print excluded objects and their reason on stderr
    #[arg(long)]
    diagnostics: bool,

    /// JSON file holding serialized SkyParams
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_params(args: &Args) -> Result<SkyParams, SkypassError> {
    let base = match &args.config {
        Some(path) => serde_json::from_str::<SkyParams>(&std::fs::read_to_string(path)?)?,
        None => SkyParams::default(),
    };

    let mut builder = SkyParams::builder()
        .gravity(args.gravity.unwrap_or(base.gravity))
        .ops_mode(if args.afspc { OpsMode::Afspc } else { base.ops_mode })
        .min_elevation_deg(args.min_elevation.unwrap_or(base.min_elevation_deg))
        .parallel(base.parallel);
    if args.sequential {
        builder = builder.parallel(false);
    }
    builder.build()
}

fn load_records(args: &Args) -> Result<Vec<ElementRecord>, SkypassError> {
    let mut records = Vec::new();
    for path in &args.omm {
        let omms = parse_omm_array(&std::fs::read_to_string(path)?)?;
        info!(file = %path.display(), count = omms.len(), "loaded GP records");
        records.extend(omms.into_iter().map(ElementRecord::from_omm));
    }
    for path in &args.tle {
        let entries = split_catalog(&std::fs::read_to_string(path)?);
        info!(file = %path.display(), count = entries.len(), "loaded element sets");
        records.extend(entries.iter().map(ElementRecord::from_tle_entry));
    }
    Ok(records)
}

fn run(args: Args) -> Result<(), SkypassError> {
    let params = load_params(&args)?;
    info!("{params}");

    let observer = Observer::new(args.lat, args.lon, args.height)?;
    let time = match &args.time {
        Some(text) => parse_iso_utc(text)?,
        None => Epoch::now().map_err(|e| SkypassError::InvalidParameter(e.to_string()))?,
    };
    let records = load_records(&args)?;

    let sky = SkyPass::new(params);
    let report = sky.compute_with_diagnostics(&observer, time, &records);
    if args.diagnostics {
        for exclusion in &report.excluded {
            eprintln!("{exclusion}");
        }
    }
    println!("{}", serde_json::to_string_pretty(&report.visible)?);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("skypass: {e}");
            ExitCode::FAILURE
        }
    }
}
