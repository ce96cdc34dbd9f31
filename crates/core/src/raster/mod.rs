//! Raster data structures and operations

mod any;
mod element;
mod geotransform;
mod georef;
mod grid;
mod window;

pub use any::AnyRaster;
pub use element::{DataType, RasterElement};
pub use geotransform::GeoTransform;
pub use georef::Georeference;
pub use grid::{Raster, RasterStatistics};
pub use window::Window;
