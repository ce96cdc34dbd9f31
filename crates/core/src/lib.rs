//! # bandclip core
//!
//! Core types, traits and I/O for the bandclip spectral index pipeline.
//!
//! This crate provides:
//! - `Raster<T>`: Generic raster grid type
//! - `AnyRaster`: A raster whose sample type is only known at runtime
//! - `GeoTransform` / `Window`: Affine georeferencing and pixel windows
//! - `CRS` / `Georeference`: Coordinate reference systems
//! - `ClipGeometry`: Polygon masks read from vector boundary files
//! - I/O for GeoTIFF rasters and vector boundaries

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{AnyRaster, DataType, GeoTransform, Georeference, Raster, RasterElement, Window};
pub use vector::ClipGeometry;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{
        AnyRaster, DataType, GeoTransform, Georeference, Raster, RasterElement, Window,
    };
    pub use crate::vector::ClipGeometry;
    pub use crate::Algorithm;
}

/// A processing stage with typed input, output and parameters.
///
/// Stages are stateless: everything a run needs arrives through `input`
/// and `params`, and `Params::default()` reproduces the standard Landsat
/// processing.
pub trait Algorithm {
    type Input;
    type Output;
    type Params: Default;
    type Error: std::error::Error;

    /// Short identifier, e.g. for log lines
    fn name(&self) -> &'static str;

    /// One-line summary of what the stage does
    fn description(&self) -> &'static str;

    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// [`Algorithm::execute`] with `Params::default()`
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
