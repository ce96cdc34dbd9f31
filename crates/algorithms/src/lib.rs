//! # bandclip algorithms
//!
//! The processing stages of the bandclip pipeline.
//!
//! ## Modules
//!
//! - **imagery**: Band catalog resolution, spectral indices, index export
//! - **clip**: Cropping and masking rasters with vector boundaries
//! - **pipeline**: Catalog → clip → index → export orchestration

pub mod clip;
pub mod imagery;
mod maybe_rayon;
pub mod pipeline;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::clip::{clip_area, clip_file, clip_raster, ClipParams, PolygonClip};
    pub use crate::imagery::{
        calculate_index, export_index, normalized_difference, resolve_catalog, BandCatalog,
        CatalogParams, IndexParams, NormalizedDifference, SpectralIndex, ZeroDenominator,
    };
    pub use crate::pipeline::{run_pipeline, GeorefMode, PipelineConfig, PipelineReport};
    pub use bandclip_core::prelude::*;
}
