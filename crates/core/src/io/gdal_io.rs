//! GeoTIFF reading and writing using GDAL

use crate::crs::CRS;
use crate::dispatch_any_raster;
use crate::error::{Error, Result};
use crate::io::options::GeoTiffOptions;
use crate::raster::{AnyRaster, GeoTransform, Raster, RasterElement};
use gdal::cpl::CslStringList;
use gdal::raster::{Buffer, GdalDataType, GdalType, RasterBand};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use std::path::Path;

/// Element types GDAL can read and write directly.
pub trait TiffSample: RasterElement + GdalType {}

impl<T: RasterElement + GdalType> TiffSample for T {}

/// Read a GeoTIFF band into a raster of its stored sample type
///
/// # Arguments
/// * `path` - Path to the raster file (any GDAL-readable format)
/// * `band` - Band number (1-indexed), defaults to 1
pub fn read_geotiff_any<P: AsRef<Path>>(path: P, band: Option<usize>) -> Result<AnyRaster> {
    let dataset = Dataset::open(path.as_ref())?;
    let rasterband = dataset.rasterband(band.unwrap_or(1))?;

    let mut raster: AnyRaster = match rasterband.band_type() {
        GdalDataType::UInt8 => read_band::<u8>(&dataset, &rasterband)?.into(),
        GdalDataType::Int8 => read_band::<i8>(&dataset, &rasterband)?.into(),
        GdalDataType::UInt16 => read_band::<u16>(&dataset, &rasterband)?.into(),
        GdalDataType::Int16 => read_band::<i16>(&dataset, &rasterband)?.into(),
        GdalDataType::UInt32 => read_band::<u32>(&dataset, &rasterband)?.into(),
        GdalDataType::Int32 => read_band::<i32>(&dataset, &rasterband)?.into(),
        GdalDataType::UInt64 => read_band::<u64>(&dataset, &rasterband)?.into(),
        GdalDataType::Int64 => read_band::<i64>(&dataset, &rasterband)?.into(),
        GdalDataType::Float32 => read_band::<f32>(&dataset, &rasterband)?.into(),
        GdalDataType::Float64 => read_band::<f64>(&dataset, &rasterband)?.into(),
        other => return Err(Error::UnsupportedDataType(format!("{:?}", other))),
    };

    let transform = dataset.geo_transform().ok().map(GeoTransform::from_gdal);
    let crs = dataset.spatial_ref().ok().and_then(|srs| {
        // Prefer the EPSG code when GDAL can identify one
        match srs.auth_code() {
            Ok(code) => Some(CRS::from_epsg(code as u32)),
            Err(_) => srs.to_wkt().ok().map(CRS::from_wkt),
        }
    });
    let nodata = rasterband.no_data_value();

    dispatch_any_raster!(&mut raster, r => {
        if let Some(transform) = transform {
            r.set_transform(transform);
        }
        r.set_crs(crs);
        r.set_nodata(nodata.and_then(num_traits::cast));
    });

    Ok(raster)
}

fn read_band<T: RasterElement + GdalType + Copy>(
    dataset: &Dataset,
    rasterband: &RasterBand,
) -> Result<Raster<T>> {
    let (cols, rows) = dataset.raster_size();
    let buffer = rasterband.read_as::<T>((0, 0), (cols, rows), (cols, rows), None)?;
    Raster::from_vec(buffer.data().to_vec(), rows, cols)
}

/// Read a GeoTIFF band into a Raster, converting samples to `T`
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    Ok(read_geotiff_any(path, band)?.cast::<T>())
}

/// Write a Raster to a GeoTIFF file
///
/// # Arguments
/// * `raster` - The raster to write
/// * `path` - Output file path
/// * `options` - Optional GeoTIFF options
pub fn write_geotiff<T, P>(
    raster: &Raster<T>,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()>
where
    T: TiffSample,
    P: AsRef<Path>,
{
    let opts = options.unwrap_or_default();
    let driver = DriverManager::get_driver_by_name("GTiff")?;

    let (rows, cols) = raster.shape();

    let mut create_options = CslStringList::new();
    create_options.set_name_value("COMPRESS", opts.compression.as_gdal_str())?;

    if opts.tile_size > 0 {
        create_options.set_name_value("TILED", "YES")?;
        create_options.set_name_value("BLOCKXSIZE", &opts.tile_size.to_string())?;
        create_options.set_name_value("BLOCKYSIZE", &opts.tile_size.to_string())?;
    }

    if opts.bigtiff {
        create_options.set_name_value("BIGTIFF", "YES")?;
    }

    let mut dataset = driver.create_with_band_type_with_options::<T, _>(
        path.as_ref(),
        cols,
        rows,
        1,
        &create_options,
    )?;

    dataset.set_geo_transform(&raster.transform().to_gdal())?;

    if let Some(crs) = raster.crs() {
        if let Some(epsg) = crs.epsg() {
            let srs = SpatialRef::from_epsg(epsg)?;
            dataset.set_spatial_ref(&srs)?;
        } else if let Some(wkt) = crs.wkt() {
            let srs = SpatialRef::from_wkt(wkt)?;
            dataset.set_spatial_ref(&srs)?;
        }
    }

    let mut band = dataset.rasterband(1)?;

    if let Some(nodata) = raster.nodata().and_then(|v| v.to_f64()) {
        band.set_no_data_value(Some(nodata))?;
    }

    let data: Vec<T> = raster.data().iter().copied().collect();
    let mut buffer = Buffer::new((cols, rows), data);
    band.write((0, 0), (cols, rows), &mut buffer)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_read_roundtrip() {
        let mut raster: Raster<i16> = Raster::new(100, 100);
        raster.set_transform(GeoTransform::new(0.0, 100.0, 1.0, -1.0));
        raster.set_crs(Some(CRS::from_epsg(32634)));
        raster.set_nodata(Some(-9999));

        for i in 0..100 {
            for j in 0..100 {
                raster.set(i, j, (i * 100 + j) as i16).unwrap();
            }
        }

        let tmp = NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&raster, tmp.path(), None).unwrap();

        let loaded = read_geotiff_any(tmp.path(), None).unwrap();
        assert_eq!(loaded.data_type(), crate::raster::DataType::Int16);
        assert_eq!(loaded.shape(), raster.shape());
        assert_eq!(loaded.nodata(), Some(-9999.0));

        let loaded: Raster<i16> = loaded.cast();
        assert_eq!(loaded.get(50, 50).unwrap(), raster.get(50, 50).unwrap());
    }
}
