//! Error types for bandclip

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bandclip operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("GDAL error: {0}")]
    #[cfg(feature = "gdal")]
    Gdal(String),

    #[error("Cannot read vector boundary {}: {reason}", path.display())]
    VectorDriver { path: PathBuf, reason: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error(
        "Incomplete band catalog in {}: expected bands 1..={expected}, missing {missing:?}",
        dir.display()
    )]
    IncompleteCatalog {
        dir: PathBuf,
        expected: u8,
        missing: Vec<u8>,
    },

    #[error("Band {band} matched by both {} and {}", first.display(), second.display())]
    DuplicateBand {
        band: u8,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Input shapes do not overlap raster")]
    NoOverlap,

    #[error("Boundary contains no polygon geometries")]
    EmptyGeometry,

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::Tiff(e.to_string())
    }
}

/// Result type alias for bandclip operations
pub type Result<T> = std::result::Result<T, Error>;
