//! bandclip CLI - clip a Landsat band set to a boundary and derive a spectral index

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use bandclip_algorithms::imagery::{SpectralIndex, ZeroDenominator};
use bandclip_algorithms::pipeline::{run_pipeline, GeorefMode, PipelineConfig, PipelineReport};
use bandclip_core::Georeference;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "bandclip")]
#[command(author, version, about = "Clip Landsat bands to an area of interest and compute a spectral index", long_about = None)]
struct Cli {
    /// Folder holding the per-band GeoTIFFs (LC*band<N>.tif)
    input_dir: PathBuf,

    /// Vector boundary (GeoJSON, or any OGR format with the gdal feature)
    vector: PathBuf,

    /// Index to compute: ndvi, ndbi, ndwi
    #[arg(short, long, default_value = "ndvi")]
    index: String,

    /// Output index raster
    #[arg(short, long, default_value = "ndvi.tif")]
    output: PathBuf,

    /// Folder for the clipped bands
    #[arg(long, default_value = "clipped")]
    clipped_dir: PathBuf,

    /// Number of bands the scene must provide
    #[arg(long, default_value = "7")]
    expected_bands: u8,

    /// Keep every pixel the boundary touches
    #[arg(long)]
    all_touched: bool,

    /// Crop to the boundary without masking pixels outside it
    #[arg(long)]
    no_mask: bool,

    /// Value where both bands sum to zero: nan, zero
    #[arg(long, default_value = "nan")]
    zero_denominator: String,

    /// Georeference of the output
    #[arg(long, value_enum, default_value_t = GeorefArg::Source)]
    georef: GeorefArg,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GeorefArg {
    /// CRS and transform of the clipped bands
    Source,
    /// EPSG:32634, 30 m grid with origin (394365, 5574015)
    Landsat,
}

impl Cli {
    fn config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig {
            index: self.index.parse::<SpectralIndex>()?,
            clipped_dir: self.clipped_dir.clone(),
            output: self.output.clone(),
            georef: match self.georef {
                GeorefArg::Source => GeorefMode::Source,
                GeorefArg::Landsat => GeorefMode::Fixed(Georeference::landsat_utm34n()),
            },
            ..Default::default()
        };
        config.catalog.expected_bands = self.expected_bands;
        config.clip.all_touched = self.all_touched;
        config.clip.filled = !self.no_mask;
        config.index_params.zero_denominator = self.zero_denominator.parse::<ZeroDenominator>()?;
        Ok(config)
    }
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

fn done(report: &PipelineReport) {
    let stats = &report.statistics;
    println!(
        "{} saved to: {}",
        report.index.name().to_uppercase(),
        report.output.display()
    );
    let (rows, cols) = report.shape;
    let (min_x, min_y, max_x, max_y) = report.georef.transform.bounds(cols, rows);
    println!("  Scene: {}", report.catalog.dir().display());
    println!("  Bands clipped: {}", report.clipped.len());
    println!("  Dimensions: {} x {}", cols, rows);
    println!(
        "  Bounds: ({:.3}, {:.3}) - ({:.3}, {:.3})",
        min_x, min_y, max_x, max_y
    );
    println!("  Georeference: {}", report.georef);
    if let (Some(min), Some(max), Some(mean)) = (stats.min, stats.max, stats.mean) {
        println!("  Range: [{:.4}, {:.4}], mean {:.4}", min, max, mean);
    }
    println!(
        "  Valid pixels: {} ({} nodata)",
        stats.valid_count, stats.nodata_count
    );
    println!("  Processing time: {:.2?}", report.elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let config = cli.config()?;
    info!(
        "{} from {} clipped to {}",
        config.index,
        cli.input_dir.display(),
        cli.vector.display()
    );

    let pb = spinner("Clipping bands and computing index...");
    let result = run_pipeline(&cli.input_dir, &cli.vector, &config);
    pb.finish_and_clear();

    let report = result.with_context(|| {
        format!(
            "Failed to compute {} for {}",
            config.index,
            cli.input_dir.display()
        )
    })?;
    done(&report);

    Ok(())
}
