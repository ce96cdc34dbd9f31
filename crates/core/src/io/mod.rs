//! I/O operations for reading and writing geospatial data

#[cfg(feature = "gdal")]
mod gdal_io;
#[cfg(not(feature = "gdal"))]
mod native;
mod options;
mod vector;

#[cfg(feature = "gdal")]
pub use gdal_io::{read_geotiff, read_geotiff_any, write_geotiff, TiffSample};

#[cfg(not(feature = "gdal"))]
pub use native::{read_geotiff, read_geotiff_any, write_geotiff, TiffSample};

pub use options::{Compression, GeoTiffOptions};
pub use vector::{read_clip_geometry, read_features};
