//! Catalog → clip → index → export
//!
//! One run resolves the band files of a scene, clips every band to a
//! boundary, resolves the clipped bands again, computes one index and
//! writes it. Any failure aborts the run and removes the clipped files it
//! wrote.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::clip::{clip_file, ClipParams, ClipSummary};
use crate::imagery::{
    calculate_index, export_index, resolve_catalog, BandCatalog, CatalogParams, IndexParams,
    SpectralIndex,
};
use bandclip_core::io::read_clip_geometry;
use bandclip_core::raster::{Georeference, RasterStatistics};
use bandclip_core::{Error, Result};
use tracing::{debug, info, warn};

/// Georeference written to the exported index
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GeorefMode {
    /// CRS and transform of the clipped bands
    #[default]
    Source,
    /// A fixed georeference regardless of the inputs
    Fixed(Georeference),
}

/// Settings for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Index to compute (default: NDVI)
    pub index: SpectralIndex,
    pub catalog: CatalogParams,
    pub clip: ClipParams,
    pub index_params: IndexParams,
    /// Directory for clipped bands (default: `clipped`)
    pub clipped_dir: PathBuf,
    /// File name prefix of clipped bands (default: `LC_clipped_`)
    pub clipped_prefix: String,
    /// Index raster path (default: `ndvi.tif`)
    pub output: PathBuf,
    pub georef: GeorefMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index: SpectralIndex::Ndvi,
            catalog: CatalogParams::default(),
            clip: ClipParams::default(),
            index_params: IndexParams::default(),
            clipped_dir: PathBuf::from("clipped"),
            clipped_prefix: "LC_clipped_".to_string(),
            output: PathBuf::from("ndvi.tif"),
            georef: GeorefMode::Source,
        }
    }
}

impl PipelineConfig {
    /// Naming convention of the clipped bands
    pub fn clipped_catalog_params(&self) -> CatalogParams {
        CatalogParams {
            prefixes: vec![self.clipped_prefix.clone()],
            ..self.catalog.clone()
        }
    }

    /// Path a band is clipped to
    pub fn clipped_path(&self, band: u8) -> PathBuf {
        self.clipped_dir
            .join(self.catalog.file_name(&self.clipped_prefix, band))
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub index: SpectralIndex,
    /// Source bands
    pub catalog: BandCatalog,
    pub clipped: Vec<ClipSummary>,
    /// Bands the index was computed from
    pub clipped_catalog: BandCatalog,
    pub output: PathBuf,
    /// Rows and columns of the index raster
    pub shape: (usize, usize),
    pub georef: Georeference,
    pub statistics: RasterStatistics<f64>,
    pub elapsed: std::time::Duration,
}

/// Removes the files of an unfinished run when dropped
struct Intermediates {
    paths: Vec<PathBuf>,
    armed: bool,
}

impl Intermediates {
    fn new() -> Self {
        Self {
            paths: Vec::new(),
            armed: true,
        }
    }

    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for Intermediates {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for path in &self.paths {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }
    }
}

/// Run the whole pipeline over a scene directory and a boundary file.
///
/// # Errors
/// The first error of any stage. Clipped bands written before the failure
/// are removed and the output file is left untouched.
pub fn run_pipeline<I, V>(input_dir: I, vector: V, config: &PipelineConfig) -> Result<PipelineReport>
where
    I: AsRef<Path>,
    V: AsRef<Path>,
{
    let start = Instant::now();
    let input_dir = input_dir.as_ref();
    let vector = vector.as_ref();

    let catalog = resolve_catalog(input_dir, &config.catalog)?;
    info!("Found {} bands in {}", catalog.len(), input_dir.display());

    let geometry = read_clip_geometry(vector)?;
    if geometry.is_empty() {
        return Err(Error::EmptyGeometry);
    }
    info!("Boundary {}: {} polygon(s)", vector.display(), geometry.len());

    std::fs::create_dir_all(&config.clipped_dir)?;

    let mut intermediates = Intermediates::new();
    let mut clipped = Vec::with_capacity(catalog.len());
    for (band, source) in catalog.iter() {
        let dest = config.clipped_path(band);
        intermediates.track(dest.clone());
        let summary = clip_file(&geometry, source, &dest, &config.clip)?;
        debug!(
            "Band {}: {} pixels inside boundary, window {:?}",
            band, summary.inside, summary.window
        );
        clipped.push(summary);
    }
    info!(
        "Clipped {} bands into {}",
        clipped.len(),
        config.clipped_dir.display()
    );

    let clipped_catalog = resolve_catalog(&config.clipped_dir, &config.clipped_catalog_params())?;

    let (a, b) = config.index.bands();
    info!("Computing {} from bands {} and {}", config.index, a, b);
    let index = calculate_index(config.index, &clipped_catalog, &config.index_params)?;

    let georef = match &config.georef {
        GeorefMode::Source => Georeference::from_raster(&index),
        GeorefMode::Fixed(fixed) => {
            if let (Some(source), Some(target)) = (index.crs(), fixed.crs.as_ref()) {
                if !source.is_equivalent(target) {
                    warn!(
                        "Clipped bands are in {} but the index is written as {}",
                        source, target
                    );
                }
            }
            fixed.clone()
        }
    };

    export_index(&index, &config.output, &georef)?;
    intermediates.keep();
    info!("Wrote {} to {}", config.index, config.output.display());

    Ok(PipelineReport {
        index: config.index,
        catalog,
        clipped,
        clipped_catalog,
        output: config.output.clone(),
        shape: index.shape(),
        georef,
        statistics: index.statistics(),
        elapsed: start.elapsed(),
    })
}
