//! hydromorph CLI - watershed morphometry, hydrology and erosion analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hydromorph_algorithms::config::AnalysisConfig;
use hydromorph_algorithms::hydrology::{design_rainfall, GumbelFit};
use hydromorph_algorithms::pipeline::{analyze, BasinInputs, BasinReport};
use hydromorph_algorithms::report::write_outputs;
use hydromorph_algorithms::unit_hydrograph::snyder;
use hydromorph_core::io::{read_geojson, read_geotiff, Cell, Table};
use hydromorph_core::vector::FeatureCollection;
use hydromorph_core::{PourPoint, Raster, StreamSegment, Subbasin};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "hydromorph")]
#[command(author, version, about = "Watershed morphometry, hydrology and erosion analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file; omitted sections keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster (.tif) or vector layer (.geojson)
    Info {
        /// Input file
        input: PathBuf,
    },
    /// Run the full analysis and write tables and rasters
    Analyze {
        /// Hydrologically conditioned DEM
        #[arg(long)]
        dem: PathBuf,
        /// Flow accumulation raster (cell counts)
        #[arg(long)]
        flow_acc: PathBuf,
        /// Flow direction raster, checked for alignment only
        #[arg(long)]
        flow_dir: Option<PathBuf>,
        /// Stream segment lines with a Strahler order field
        #[arg(long)]
        streams: PathBuf,
        /// Subbasin polygons
        #[arg(long)]
        subbasins: PathBuf,
        /// Pour points
        #[arg(long)]
        pour_points: Option<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = "hydromorph_out")]
        output: PathBuf,
    },
    /// Print Gumbel design rainfall for the configured return periods
    Rainfall {
        /// Mean annual rainfall (mm), overrides the configuration
        #[arg(long)]
        mean: Option<f64>,
        /// Standard deviation of annual rainfall (mm), overrides the configuration
        #[arg(long)]
        std_dev: Option<f64>,
    },
    /// Snyder unit hydrograph for a main-stream length and basin area
    UnitHydrograph {
        /// Main stream length (km)
        #[arg(long)]
        length_km: f64,
        /// Basin area (km²)
        #[arg(long)]
        area_km2: f64,
        /// Direct runoff depth to scale the hydrograph (mm)
        #[arg(long, default_value = "1.0")]
        runoff_mm: f64,
        /// Write the (t, Q) series to this CSV file
        #[arg(long)]
        series: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON
    Config,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
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

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(p) => {
            let text = fs::read_to_string(p).with_context(|| format!("Failed to read config {}", p.display()))?;
            AnalysisConfig::from_json(&text).with_context(|| format!("Invalid config {}", p.display()))
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn read_raster(path: &Path, what: &str) -> Result<Raster<f64>> {
    let pb = spinner(&format!("Reading {}...", what));
    let raster: Raster<f64> =
        read_geotiff(path).with_context(|| format!("Failed to read {} raster {}", what, path.display()))?;
    pb.finish_and_clear();
    info!("{}: {} x {}", what, raster.cols(), raster.rows());
    Ok(raster)
}

fn read_layer(path: &Path, what: &str) -> Result<FeatureCollection> {
    let layer = read_geojson(path).with_context(|| format!("Failed to read {} layer {}", what, path.display()))?;
    info!("{}: {} features", what, layer.len());
    Ok(layer)
}

fn is_vector(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref(),
        Some("geojson" | "json")
    )
}

fn print_raster_info(input: &Path) -> Result<()> {
    let raster = read_raster(input, "input")?;
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
    if let Some(nodata) = raster.nodata() {
        println!("NoData: {}", nodata);
    }
    println!("\nStatistics:");
    if let (Some(min), Some(max), Some(mean)) = (stats.min, stats.max, stats.mean) {
        println!("  Min: {:.4}", min);
        println!("  Max: {:.4}", max);
        println!("  Mean: {:.4}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
    );
    Ok(())
}

fn print_layer_info(input: &Path) -> Result<()> {
    let layer = read_layer(input, "input")?;
    let fields: BTreeSet<&str> = layer
        .iter()
        .flat_map(|f| f.properties.keys().map(String::as_str))
        .collect();
    println!("File: {}", input.display());
    println!("Features: {}", layer.len());
    println!("Fields: {}", fields.into_iter().collect::<Vec<_>>().join(", "));
    Ok(())
}

fn print_summary(report: &BasinReport) {
    println!("\n{:<10} {:>10} {:>8} {:>8} {:>10} {:>10}  {}", "basin", "A (km²)", "Dd", "CN", "A (t/ha)", "Qbf", "priority");
    for (i, sb) in report.subbasins.iter().enumerate() {
        let priority = report
            .prioritization
            .as_ref()
            .map_or("-", |p| p.compound_class[i].label());
        println!(
            "{:<10} {:>10.2} {:>8.2} {:>8.1} {:>10.2} {:>10.2}  {}",
            sb.id,
            sb.area_km2(),
            sb.areal.drainage_density.unwrap_or(f64::NAN),
            sb.runoff.cn_mean,
            sb.sediment.as_ref().map_or(f64::NAN, |s| s.loss_mean),
            sb.bankfull_discharge_m3s,
            priority
        );
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { input } => {
            if is_vector(&input) {
                print_layer_info(&input)?;
            } else {
                print_raster_info(&input)?;
            }
        }

        Commands::Analyze {
            dem,
            flow_acc,
            flow_dir,
            streams,
            subbasins,
            pour_points,
            output,
        } => {
            let start = Instant::now();
            let fields = config.layers.clone();
            let inputs = BasinInputs {
                dem: read_raster(&dem, "DEM")?,
                flow_acc: read_raster(&flow_acc, "flow accumulation")?,
                flow_dir: flow_dir.map(|p| read_raster(&p, "flow direction")).transpose()?,
                subbasins: Subbasin::from_layer(
                    &read_layer(&subbasins, "subbasins")?,
                    fields.subbasin_id_field.as_deref(),
                )?,
                streams: StreamSegment::from_layer(&read_layer(&streams, "streams")?, &fields.order_field)?,
                pour_points: match pour_points {
                    Some(p) => PourPoint::from_layer(&read_layer(&p, "pour points")?, fields.pour_point_id_field.as_deref())?,
                    None => Vec::new(),
                },
            };

            let pb = spinner("Analysing subbasins...");
            let report = analyze(&inputs, &config).context("Analysis failed")?;
            pb.finish_and_clear();

            let pb = spinner("Writing outputs...");
            let written = write_outputs(&report, &config, &output).context("Failed to write outputs")?;
            pb.finish_and_clear();

            print_summary(&report);
            println!("\n{} files saved to: {}", written.len(), output.display());
            println!("  Processing time: {:.2?}", start.elapsed());
        }

        Commands::Rainfall { mean, std_dev } => {
            if let Some(m) = mean {
                config.rainfall.annual_mean_mm = m;
            }
            if let Some(s) = std_dev {
                config.rainfall.annual_std_mm = s;
            }
            config.validate()?;
            let fit = GumbelFit::from_moments(config.rainfall.annual_mean_mm, config.rainfall.annual_std_mm);
            println!("Gumbel alpha = {:.4}, u = {:.2} mm", fit.alpha, fit.location);
            println!("{:>8} {:>10} {:>12} {:>10}", "T (yr)", "y_T", "annual (mm)", "P24 (mm)");
            for s in design_rainfall(&config.rainfall) {
                println!(
                    "{:>8} {:>10.4} {:>12.1} {:>10.1}",
                    s.return_period, s.reduced_variate, s.annual_mm, s.daily_mm
                );
            }
        }

        Commands::UnitHydrograph {
            length_km,
            area_km2,
            runoff_mm,
            series,
        } => {
            let uh = snyder(length_km, area_km2, &config.snyder)
                .with_context(|| format!("length {} km and area {} km² must both be positive", length_km, area_km2))?;
            println!("L   = {:.3} km, Lca = {:.3} km, A = {:.3} km²", uh.length_km, uh.lca_km, uh.area_km2);
            println!("tL  = {:.3} h", uh.lag_h);
            println!("tr  = {:.3} h", uh.duration_h);
            println!("tp  = {:.3} h", uh.peak_time_h);
            println!("Qp  = {:.3} m³/s per mm ({:.4} m³/s/km²)", uh.peak_m3s, uh.unit_peak);
            println!("W50 = {:.3} h, W75 = {:.3} h, tb = {:.3} h", uh.w50_h, uh.w75_h, uh.base_time_h);
            println!("Peak for {} mm runoff: {:.3} m³/s", runoff_mm, uh.peak_m3s * runoff_mm);

            if let Some(path) = series {
                let mut table = Table::new("hydrograph_series", &["t_hr", "Q_m3s"]);
                for (t, q) in uh.series(runoff_mm, &config.snyder) {
                    table.push_row(vec![Cell::from(t), Cell::from(q)])?;
                }
                table.save_csv(&path).with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Series saved to: {}", path.display());
            }
        }

        Commands::Config => {
            println!("{}", config.to_json_pretty()?);
        }
    }

    Ok(())
}
