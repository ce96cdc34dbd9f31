//! Clipping rasters with polygon boundaries
//!
//! A raster is cropped to the pixel window enclosing the boundary and
//! pixels outside the polygons are set to a fill value. The sample type of
//! the source is preserved.

mod mask;

pub use mask::{geometry_window, polygon_mask};

use std::path::{Path, PathBuf};

use bandclip_core::io::{read_clip_geometry, read_geotiff_any, write_geotiff};
use bandclip_core::raster::{AnyRaster, DataType, Raster, RasterElement, Window};
use bandclip_core::{dispatch_any_raster, Algorithm, ClipGeometry, Error, Result};
use tracing::{debug, warn};

/// Parameters for polygon clipping
#[derive(Debug, Clone)]
pub struct ClipParams {
    /// Shrink the output to the window enclosing the boundary (default: true)
    pub crop: bool,
    /// Set pixels outside the polygons to the fill value (default: true)
    pub filled: bool,
    /// Keep every pixel the boundary touches instead of only those whose
    /// center is inside (default: false)
    pub all_touched: bool,
    /// Fill value override. Without it the source no-data value is used,
    /// or zero if the source has none.
    pub nodata: Option<f64>,
}

impl Default for ClipParams {
    fn default() -> Self {
        Self {
            crop: true,
            filled: true,
            all_touched: false,
            nodata: None,
        }
    }
}

/// Outcome of clipping one file
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSummary {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Window of the source grid covered by the output
    pub window: Window,
    pub data_type: DataType,
    /// Pixels inside the boundary
    pub inside: usize,
}

/// Clip a raster to a polygon boundary.
///
/// The output keeps the source CRS and sample type. With `crop` its
/// transform is shifted to the upper-left corner of the enclosing window.
/// With `filled` its no-data value is the fill value.
///
/// # Errors
/// - [`Error::EmptyGeometry`] if the boundary has no polygons
/// - [`Error::NoOverlap`] if the boundary misses the raster
/// - [`Error::InvalidParameter`] if the fill value does not fit the sample type
pub fn clip_raster<T: RasterElement>(
    raster: &Raster<T>,
    geometry: &ClipGeometry,
    params: &ClipParams,
) -> Result<Raster<T>> {
    clip_with_window(raster, geometry, params).map(|(r, _, _)| r)
}

fn clip_with_window<T: RasterElement>(
    raster: &Raster<T>,
    geometry: &ClipGeometry,
    params: &ClipParams,
) -> Result<(Raster<T>, Window, usize)> {
    if geometry.is_empty() {
        return Err(Error::EmptyGeometry);
    }

    let (rows, cols) = raster.shape();
    let window = geometry_window(geometry, raster.transform(), rows, cols)
        .ok_or(Error::NoOverlap)?;
    let fill = fill_value(raster, params)?;

    let out_window = if params.crop {
        window
    } else {
        Window::full(rows, cols)
    };
    let mut output = raster.window(&out_window)?;

    let inside_mask = polygon_mask(geometry, raster.transform(), &window, params.all_touched);
    let inside = inside_mask.iter().filter(|v| **v).count();
    if inside == 0 {
        warn!("Boundary overlaps the raster extent but contains no pixel");
    }

    if params.filled {
        // Offset of the boundary window inside the output grid
        let dr = window.row_off - out_window.row_off;
        let dc = window.col_off - out_window.col_off;
        for ((r, c), value) in output.data_mut().indexed_iter_mut() {
            let keep = r >= dr
                && c >= dc
                && r - dr < window.height
                && c - dc < window.width
                && inside_mask[[r - dr, c - dc]];
            if !keep {
                *value = fill;
            }
        }
        output.set_nodata(Some(fill));
    }

    debug!(
        "Clipped {}x{} to window {:?}, {} pixels inside",
        cols, rows, out_window, inside
    );
    Ok((output, out_window, inside))
}

fn fill_value<T: RasterElement>(raster: &Raster<T>, params: &ClipParams) -> Result<T> {
    match params.nodata {
        Some(v) => num_traits::cast::<f64, T>(v)
            .filter(|_| T::data_type().is_float() || v.fract() == 0.0)
            .ok_or_else(|| Error::InvalidParameter {
                name: "nodata",
                value: v.to_string(),
                reason: format!("not representable as {}", T::data_type()),
            }),
        None => Ok(raster.nodata().unwrap_or_else(T::zero)),
    }
}

/// Clip a raster of any sample type
pub fn clip_any(raster: &AnyRaster, geometry: &ClipGeometry, params: &ClipParams) -> Result<AnyRaster> {
    dispatch_any_raster!(raster, r => clip_raster(r, geometry, params).map(AnyRaster::from))
}

/// Clip a GeoTIFF on disk and write the result to `dest` with the same
/// sample type.
pub fn clip_file<S, D>(
    geometry: &ClipGeometry,
    source: S,
    dest: D,
    params: &ClipParams,
) -> Result<ClipSummary>
where
    S: AsRef<Path>,
    D: AsRef<Path>,
{
    let source = source.as_ref();
    let dest = dest.as_ref();

    let raster = read_geotiff_any(source, None)?;
    let data_type = raster.data_type();

    let (window, inside) = dispatch_any_raster!(&raster, r => {
        let (clipped, window, inside) = clip_with_window(r, geometry, params)?;
        write_geotiff(&clipped, dest, None)?;
        (window, inside)
    });

    debug!("{} -> {} ({})", source.display(), dest.display(), data_type);
    Ok(ClipSummary {
        source: source.to_path_buf(),
        destination: dest.to_path_buf(),
        window,
        data_type,
        inside,
    })
}

/// Clip a raster file with the polygons of a vector boundary file
pub fn clip_area<V, S, D>(vector: V, source: S, dest: D, params: &ClipParams) -> Result<ClipSummary>
where
    V: AsRef<Path>,
    S: AsRef<Path>,
    D: AsRef<Path>,
{
    let geometry = read_clip_geometry(vector)?;
    clip_file(&geometry, source, dest, params)
}

/// Polygon clipping as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct PolygonClip;

impl Algorithm for PolygonClip {
    type Input = (AnyRaster, ClipGeometry);
    type Output = AnyRaster;
    type Params = ClipParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "PolygonClip"
    }

    fn description(&self) -> &'static str {
        "Crop a raster to a polygon boundary and mask pixels outside it"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (raster, geometry) = input;
        clip_any(&raster, &geometry, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandclip_core::io::read_geotiff;
    use bandclip_core::{GeoTransform, CRS};
    use geo::polygon;
    use tempfile::tempdir;

    // 10 x 10 grid of 30 m pixels with values row * 10 + col
    fn scene() -> Raster<u16> {
        let data: Vec<u16> = (0..100).collect();
        let mut r = Raster::from_vec(data, 10, 10).unwrap();
        r.set_transform(GeoTransform::new(1000.0, 2000.0, 30.0, -30.0));
        r.set_crs(Some(CRS::from_epsg(32634)));
        r
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> ClipGeometry {
        ClipGeometry::from_polygons(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]])
    }

    #[test]
    fn test_boundary_covering_raster_keeps_extent() {
        let raster = scene();
        let geometry = rect(900.0, 1600.0, 1400.0, 2100.0);

        let clipped = clip_raster(&raster, &geometry, &ClipParams::default()).unwrap();

        assert_eq!(clipped.shape(), (10, 10));
        assert_eq!(clipped.transform(), raster.transform());
        assert_eq!(clipped.data(), raster.data());
    }

    #[test]
    fn test_smaller_boundary_shrinks_extent() {
        let raster = scene();
        // Columns 2..5, rows 3..7
        let geometry = rect(1060.0, 1790.0, 1150.0, 1910.0);

        let clipped = clip_raster(&raster, &geometry, &ClipParams::default()).unwrap();

        assert_eq!(clipped.shape(), (4, 3));
        assert_eq!(clipped.transform().origin_x, 1060.0);
        assert_eq!(clipped.transform().origin_y, 1910.0);
        assert_eq!(clipped.get(0, 0).unwrap(), 32);
        assert_eq!(clipped.get(3, 2).unwrap(), 64);
        assert_eq!(clipped.crs(), raster.crs());
    }

    #[test]
    fn test_pixels_outside_polygon_are_filled() {
        let mut raster = scene();
        raster.set_nodata(Some(65535));
        let triangle = ClipGeometry::from_polygons(vec![polygon![
            (x: 1000.0, y: 1700.0),
            (x: 1090.0, y: 1700.0),
            (x: 1000.0, y: 1790.0),
            (x: 1000.0, y: 1700.0),
        ]]);

        let clipped = clip_raster(&raster, &triangle, &ClipParams::default()).unwrap();

        assert_eq!(clipped.shape(), (3, 3));
        assert_eq!(clipped.nodata(), Some(65535));
        // Lower-left corner is inside, upper-right is not
        assert_eq!(clipped.get(2, 0).unwrap(), 90);
        assert_eq!(clipped.get(0, 2).unwrap(), 65535);
    }

    #[test]
    fn test_fill_defaults_to_zero_without_nodata() {
        let raster = scene();
        let triangle = ClipGeometry::from_polygons(vec![polygon![
            (x: 1000.0, y: 1700.0),
            (x: 1090.0, y: 1700.0),
            (x: 1000.0, y: 1790.0),
            (x: 1000.0, y: 1700.0),
        ]]);

        let clipped = clip_raster(&raster, &triangle, &ClipParams::default()).unwrap();
        assert_eq!(clipped.get(0, 2).unwrap(), 0);
        assert_eq!(clipped.nodata(), Some(0));
    }

    #[test]
    fn test_unmasked_crop_keeps_values() {
        let raster = scene();
        let triangle = ClipGeometry::from_polygons(vec![polygon![
            (x: 1000.0, y: 1700.0),
            (x: 1090.0, y: 1700.0),
            (x: 1000.0, y: 1790.0),
            (x: 1000.0, y: 1700.0),
        ]]);
        let params = ClipParams {
            filled: false,
            ..Default::default()
        };

        let clipped = clip_raster(&raster, &triangle, &params).unwrap();
        assert_eq!(clipped.get(0, 2).unwrap(), 72);
        assert_eq!(clipped.nodata(), None);
    }

    #[test]
    fn test_no_crop_masks_full_extent() {
        let raster = scene();
        let geometry = rect(1060.0, 1790.0, 1150.0, 1910.0);
        let params = ClipParams {
            crop: false,
            ..Default::default()
        };

        let clipped = clip_raster(&raster, &geometry, &params).unwrap();

        assert_eq!(clipped.shape(), (10, 10));
        assert_eq!(clipped.get(0, 0).unwrap(), 0);
        assert_eq!(clipped.get(9, 9).unwrap(), 0);
        assert_eq!(clipped.get(3, 2).unwrap(), 32);
    }

    #[test]
    fn test_disjoint_boundary_fails() {
        let err = clip_raster(&scene(), &rect(5000.0, 5000.0, 6000.0, 6000.0), &ClipParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoOverlap));
        assert_eq!(err.to_string(), "Input shapes do not overlap raster");
    }

    #[test]
    fn test_empty_boundary_fails() {
        let err = clip_raster(&scene(), &ClipGeometry::default(), &ClipParams::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyGeometry));
    }

    #[test]
    fn test_unrepresentable_fill_rejected() {
        let params = ClipParams {
            nodata: Some(-1.0),
            ..Default::default()
        };
        let err = clip_raster(&scene(), &rect(1000.0, 1700.0, 1090.0, 1790.0), &params).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "nodata", .. }));
    }

    #[test]
    fn test_clip_file_preserves_sample_type() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("LC08_sr_band4.tif");
        let dst = dir.path().join("LC_clipped_band4.tif");
        write_geotiff(&scene(), &src, None).unwrap();

        let summary = clip_file(&rect(1060.0, 1790.0, 1150.0, 1910.0), &src, &dst, &ClipParams::default())
            .unwrap();

        assert_eq!(summary.data_type, DataType::UInt16);
        assert_eq!(summary.window, Window::new(2, 3, 3, 4));
        assert_eq!(summary.inside, 12);

        let back = read_geotiff_any(&dst, None).unwrap();
        assert_eq!(back.data_type(), DataType::UInt16);
        let back = read_geotiff::<u16, _>(&dst, None).unwrap();
        assert_eq!(back.get(0, 0).unwrap(), 32);
        assert_eq!(back.crs().and_then(|c| c.epsg()), Some(32634));
    }

    #[test]
    fn test_algorithm_trait() {
        let out = PolygonClip
            .execute_default((AnyRaster::from(scene()), rect(1060.0, 1790.0, 1150.0, 1910.0)))
            .unwrap();
        assert_eq!(out.data_type(), DataType::UInt16);
        assert_eq!(out.shape(), (4, 3));
    }
}
