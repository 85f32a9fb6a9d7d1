//! burnscar CLI - burn-severity metrics and fire boundaries

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use burnscar_algorithms::imagery::{classify_severity, SeverityBreak};
use burnscar_core::io::{read_geotiff, write_geotiff};
use burnscar_core::Raster;
use burnscar_pipeline::imagery::parse_date;
use burnscar_pipeline::{
    compute_metrics, derive_boundary, Boundary, DateWindow, FailureKind, FireEventWindows,
    LocalCatalog, LocalObjectStore, MetricStackStore, PipelineConfig, PipelineError,
    SeedPointSet, ThresholdMethod,
};

/// Exit status when the analysis ran but found no burn
const EXIT_NO_BOUNDARY: u8 = 2;

/// dNBR classes of Key & Benson: unburned, low, moderate-low, moderate-high, high
const DEFAULT_BREAKS: &str = "0.1:0,0.27:1,0.44:2,0.66:3,inf:4";

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "burnscar")]
#[command(author, version, about = "Burn-severity metrics and fire boundaries", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pipeline configuration (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Compute the metric stack of a fire event
    Metrics {
        /// Granule manifest (JSON)
        #[arg(long)]
        catalog: PathBuf,
        /// Area of interest (GeoJSON polygon)
        #[arg(long)]
        boundary: PathBuf,
        /// Prefire window START/END
        #[arg(long, requires = "postfire", conflicts_with = "ignition")]
        prefire: Option<String>,
        /// Postfire window START/END
        #[arg(long)]
        postfire: Option<String>,
        /// Ignition date, with --containment instead of explicit windows
        #[arg(long, requires = "containment")]
        ignition: Option<String>,
        /// Containment date
        #[arg(long)]
        containment: Option<String>,
        /// Days before ignition and after containment
        #[arg(long, default_value = "30")]
        buffer_days: u64,
        /// Also derive the fire boundary from the stack
        #[arg(long)]
        derive: bool,
        #[command(flatten)]
        target: EventTarget,
        /// Override the working EPSG code
        #[arg(long)]
        working_epsg: Option<u32>,
    },
    /// Refine a stored event's boundary from seed points
    Derive {
        /// Seed points (GeoJSON Point, MultiPoint or collection)
        #[arg(long)]
        seeds: PathBuf,
        #[command(flatten)]
        target: EventTarget,
        /// Fixed threshold on the derivation metric
        #[arg(short, long, conflicts_with = "otsu")]
        threshold: Option<f64>,
        /// Use Otsu's threshold instead of a fixed one
        #[arg(long)]
        otsu: bool,
    },
    /// Classify a metric layer into severity classes
    Classify {
        /// Input metric raster
        input: PathBuf,
        /// Output class raster
        output: PathBuf,
        /// Comma-separated UPPER:CLASS pairs, ascending
        #[arg(short, long, default_value = DEFAULT_BREAKS)]
        breaks: String,
    },
}

#[derive(clap::Args)]
struct EventTarget {
    /// Object store directory
    #[arg(long)]
    store: PathBuf,
    /// Requesting organisation
    #[arg(long, default_value = "public")]
    affiliation: String,
    /// Fire event name
    #[arg(long)]
    event: String,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_json_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster = read_geotiff(path).with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    Ok(raster)
}

fn done(name: &str, target: &str, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, target);
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_breaks(s: &str) -> Result<Vec<SeverityBreak>> {
    s.split(',')
        .map(|pair| {
            let (upper, class) = pair
                .split_once(':')
                .ok_or_else(|| anyhow!("Break '{}' is not UPPER:CLASS", pair))?;
            let upper: f64 = upper.trim().parse().context("Invalid break upper bound")?;
            let class: f64 = class.trim().parse().context("Invalid break class")?;
            Ok(SeverityBreak::new(upper, class))
        })
        .collect()
}

fn event_windows(
    prefire: Option<String>,
    postfire: Option<String>,
    ignition: Option<String>,
    containment: Option<String>,
    buffer_days: u64,
) -> Result<FireEventWindows> {
    match (prefire, postfire, ignition, containment) {
        (Some(pre), Some(post), None, None) => Ok(FireEventWindows::new(
            pre.parse::<DateWindow>().context("Invalid --prefire")?,
            post.parse::<DateWindow>().context("Invalid --postfire")?,
        )),
        (None, None, Some(ig), Some(co)) => Ok(FireEventWindows::from_event(
            parse_date(&ig).context("Invalid --ignition")?,
            parse_date(&co).context("Invalid --containment")?,
            buffer_days,
        )?),
        _ => bail!("Give either --prefire/--postfire or --ignition/--containment"),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("{e:#}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<PipelineError>().map(PipelineError::kind) {
            Some(FailureKind::NoBoundary) => {
                eprintln!("No fire boundary detected");
                ExitCode::from(EXIT_NO_BOUNDARY)
            }
            _ => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }

        // ── Metrics ──────────────────────────────────────────────────
        Commands::Metrics {
            catalog,
            boundary,
            prefire,
            postfire,
            ignition,
            containment,
            buffer_days,
            derive,
            target,
            working_epsg,
        } => {
            if let Some(epsg) = working_epsg {
                config.working_epsg = epsg;
                config.validate()?;
            }
            let windows = event_windows(prefire, postfire, ignition, containment, buffer_days)?;
            let text = fs::read_to_string(&boundary)
                .with_context(|| format!("Failed to read {}", boundary.display()))?;
            let aoi = Boundary::from_geojson_str(&text, &config.working_crs())
                .context("Invalid boundary")?;
            let source = LocalCatalog::open(&catalog)
                .with_context(|| format!("Failed to open catalog {}", catalog.display()))?;

            let start = Instant::now();
            let pb = spinner("Computing burn metrics...");
            let outcome = compute_metrics(&config, &source, aoi, &windows, derive);
            pb.finish_and_clear();
            let outcome = outcome?;

            let store = LocalObjectStore::new(&target.store);
            let stacks = MetricStackStore::for_event(&store, &target.affiliation, &target.event);
            stacks.save_stack(&outcome.stack)?;
            stacks.save_boundary(&outcome.boundary)?;
            info!(
                "Boundary area {:.1}, perimeter {:.1} (derived: {})",
                outcome.boundary.area(),
                outcome.boundary.perimeter(),
                outcome.derived
            );
            done("Metric stack", stacks.prefix(), start.elapsed());
        }

        // ── Derive ───────────────────────────────────────────────────
        Commands::Derive {
            seeds,
            target,
            threshold,
            otsu,
        } => {
            if otsu {
                config.derivation.refine_threshold = ThresholdMethod::Otsu;
            } else if let Some(t) = threshold {
                config.derivation.refine_threshold = ThresholdMethod::Simple { threshold: t };
            }
            config.validate()?;

            let store = LocalObjectStore::new(&target.store);
            let stacks = MetricStackStore::for_event(&store, &target.affiliation, &target.event);
            let stack = stacks
                .load_stack()
                .with_context(|| format!("Failed to load stack {}", stacks.prefix()))?;
            let text = fs::read_to_string(&seeds)
                .with_context(|| format!("Failed to read {}", seeds.display()))?;
            let seeds = SeedPointSet::from_geojson_str(&text, &config.working_crs())
                .context("Invalid seed points")?;

            let start = Instant::now();
            let pb = spinner("Deriving boundary...");
            let derived = derive_boundary(&config, stack, &seeds);
            pb.finish_and_clear();
            let (boundary, stack) = derived?;

            stacks.save_stack(&stack)?;
            stacks.save_boundary(&boundary)?;
            done("Boundary", stacks.prefix(), start.elapsed());
        }

        // ── Classify ─────────────────────────────────────────────────
        Commands::Classify {
            input,
            output,
            breaks,
        } => {
            let breaks = parse_breaks(&breaks)?;
            let layer = read_raster(&input)?;
            let start = Instant::now();
            let classes = classify_severity(&layer, &breaks)?;
            let elapsed = start.elapsed();
            write_geotiff(&classes, &output).context("Failed to write output")?;
            done("Severity classes", &output.display().to_string(), elapsed);
        }
    }

    Ok(())
}
