//! Landsat imagery stages
//!
//! - Catalog: locate the per-band GeoTIFFs of a scene
//! - Indices: normalized-difference indices (NDVI, NDBI, NDWI)
//! - Export: write index rasters as GeoTIFF

mod catalog;
mod export;
mod indices;

pub use catalog::{resolve_catalog, BandCatalog, CatalogParams};
pub use export::export_index;
pub use indices::{
    calculate_index, normalized_difference, to_reflectance, IndexParams, NormalizedDifference,
    SpectralIndex, ZeroDenominator,
};
