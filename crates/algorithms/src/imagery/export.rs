//! Writing index rasters to disk

use std::path::Path;

use bandclip_core::io::write_geotiff;
use bandclip_core::raster::{Georeference, Raster};
use bandclip_core::{Error, Result};
use tempfile::Builder;
use tracing::debug;

/// Write an index raster as a single-band float64 GeoTIFF.
///
/// The raster is stamped with `georef` and NaN no-data before writing.
/// The file is written next to `path` under a temporary name and renamed
/// into place, so `path` is never left half-written.
pub fn export_index<P: AsRef<Path>>(
    index: &Raster<f64>,
    path: P,
    georef: &Georeference,
) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut output = index.clone();
    georef.apply(&mut output);
    output.set_nodata(Some(f64::NAN));

    let tmp = Builder::new()
        .prefix(".bandclip-")
        .suffix(".tif")
        .tempfile_in(dir)?;
    write_geotiff(&output, tmp.path(), None)?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    debug!(
        "Wrote {}x{} index to {} ({})",
        output.cols(),
        output.rows(),
        path.display(),
        georef
    );
    Ok(())
}
