//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate for TIFF I/O and stores georeferencing in the
//! standard GeoTIFF tags: ModelPixelScale + ModelTiepoint (or
//! ModelTransformation for rotated grids), a GeoKeyDirectory carrying the
//! EPSG code, and GDAL_NODATA.

use crate::crs::CRS;
use crate::dispatch_any_raster;
use crate::error::{Error, Result};
use crate::io::options::{Compression, GeoTiffOptions};
use crate::raster::{AnyRaster, GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{
    ColorType, Gray16, Gray32, Gray32Float, Gray64, Gray64Float, Gray8, GrayI16, GrayI32,
    GrayI64, GrayI8,
};
use tiff::encoder::compression::{Compression as TiffCompression, Deflate, Lzw, Uncompressed};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::Tag;
use tracing::{debug, warn};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;

fn geo_tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Element types the native writer can store without conversion.
pub trait TiffSample: RasterElement {
    #[doc(hidden)]
    fn encode<W: Write + Seek>(
        encoder: &mut TiffEncoder<W>,
        raster: &Raster<Self>,
        compression: Compression,
    ) -> Result<()>;
}

macro_rules! impl_tiff_sample {
    ($t:ty, $color:ty) => {
        impl TiffSample for $t {
            fn encode<W: Write + Seek>(
                encoder: &mut TiffEncoder<W>,
                raster: &Raster<Self>,
                compression: Compression,
            ) -> Result<()> {
                let data: Vec<$t> = raster.data().iter().copied().collect();
                match compression {
                    Compression::None => {
                        write_image::<_, $color, _, _>(encoder, raster, &data, Uncompressed)
                    }
                    Compression::Deflate => {
                        write_image::<_, $color, _, _>(encoder, raster, &data, Deflate::default())
                    }
                    Compression::Lzw => {
                        write_image::<_, $color, _, _>(encoder, raster, &data, Lzw::default())
                    }
                }
            }
        }
    };
}

impl_tiff_sample!(u8, Gray8);
impl_tiff_sample!(i8, GrayI8);
impl_tiff_sample!(u16, Gray16);
impl_tiff_sample!(i16, GrayI16);
impl_tiff_sample!(u32, Gray32);
impl_tiff_sample!(i32, GrayI32);
impl_tiff_sample!(u64, Gray64);
impl_tiff_sample!(i64, GrayI64);
impl_tiff_sample!(f32, Gray32Float);
impl_tiff_sample!(f64, Gray64Float);

/// Read a GeoTIFF band into a raster of its stored sample type
///
/// Only single-sample (grayscale) images are supported, so `band` must be
/// `None` or `Some(1)`.
pub fn read_geotiff_any<P: AsRef<Path>>(path: P, band: Option<usize>) -> Result<AnyRaster> {
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file), band)
}

/// Read a GeoTIFF band into a Raster, converting samples to `T`
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    Ok(read_geotiff_any(path, band)?.cast::<T>())
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<R: Read + Seek>(reader: R, band: Option<usize>) -> Result<AnyRaster> {
    let band = band.unwrap_or(1);
    if band != 1 {
        return Err(Error::InvalidParameter {
            name: "band",
            value: band.to_string(),
            reason: "native reader supports single-band images only".to_string(),
        });
    }

    let mut decoder = Decoder::new(reader)?;

    match decoder.colortype()? {
        tiff::ColorType::Gray(_) => {}
        other => {
            return Err(Error::UnsupportedDataType(format!(
                "{:?} (expected single-band grayscale)",
                other
            )))
        }
    }

    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;

    let mut raster: AnyRaster = match decoder.read_image()? {
        DecodingResult::U8(buf) => Raster::from_vec(buf, rows, cols)?.into(),
        DecodingResult::U16(buf) => Raster::from_vec(buf, rows, cols)?.into(),
        DecodingResult::U32(buf) => Raster::from_vec(buf, rows, cols)?.into(),
        DecodingResult::U64(buf) => Raster::from_vec(buf, rows, cols)?.into(),
        DecodingResult::I8(buf) => Raster::from_vec(buf, rows, cols)?.into(),
        DecodingResult::I16(buf) => Raster::from_vec(buf, rows, cols)?.into(),
        DecodingResult::I32(buf) => Raster::from_vec(buf, rows, cols)?.into(),
        DecodingResult::I64(buf) => Raster::from_vec(buf, rows, cols)?.into(),
        DecodingResult::F32(buf) => Raster::from_vec(buf, rows, cols)?.into(),
        DecodingResult::F64(buf) => Raster::from_vec(buf, rows, cols)?.into(),
        #[allow(unreachable_patterns)]
        _ => return Err(Error::UnsupportedDataType("Unsupported TIFF pixel format".to_string())),
    };

    let keys = read_geo_keys(&mut decoder);
    let transform = read_geotransform(&mut decoder).map(|gt| {
        if keys.pixel_is_point {
            gt.pixel_is_point_to_area()
        } else {
            gt
        }
    });
    let nodata = read_nodata(&mut decoder);
    let crs = keys.crs;

    dispatch_any_raster!(&mut raster, r => {
        if let Some(transform) = transform {
            r.set_transform(transform);
        }
        r.set_crs(crs);
        r.set_nodata(nodata.and_then(num_traits::cast));
    });

    Ok(raster)
}

/// Attempt to read GeoTransform from TIFF tags
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(geo_tag(MODEL_PIXEL_SCALE)).ok();
    let tiepoint = decoder.get_tag_f64_vec(geo_tag(MODEL_TIEPOINT)).ok();

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            return Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
        }
    }

    // Row-major 4x4 matrix
    let t = decoder.get_tag_f64_vec(geo_tag(MODEL_TRANSFORMATION)).ok()?;
    if t.len() >= 16 {
        return Some(GeoTransform {
            origin_x: t[3],
            origin_y: t[7],
            pixel_width: t[0],
            pixel_height: t[5],
            row_rotation: t[1],
            col_rotation: t[4],
        });
    }

    None
}

/// The GeoKeys the reader interprets
#[derive(Debug, Default)]
struct GeoKeys {
    crs: Option<CRS>,
    /// GTRasterTypeGeoKey is RasterPixelIsPoint: the tiepoint names a pixel
    /// center rather than its upper-left corner.
    pixel_is_point: bool,
}

fn read_geo_keys<R: Read + Seek>(decoder: &mut Decoder<R>) -> GeoKeys {
    let mut parsed = GeoKeys::default();
    let Ok(keys) = decoder.get_tag_u16_vec(geo_tag(GEO_KEY_DIRECTORY)) else {
        return parsed;
    };
    if keys.len() < 4 {
        return parsed;
    }

    let num_keys = keys[3] as usize;
    for entry in keys[4..].chunks_exact(4).take(num_keys) {
        let (key_id, location, value) = (entry[0], entry[1], entry[3]);
        // location 0 means the value is stored inline
        if location != 0 {
            continue;
        }
        match key_id {
            GT_RASTER_TYPE_KEY => parsed.pixel_is_point = value == RASTER_PIXEL_IS_POINT,
            PROJECTED_CS_TYPE_KEY | GEOGRAPHIC_TYPE_KEY if value != 0 && parsed.crs.is_none() => {
                parsed.crs = Some(CRS::from_epsg(value as u32));
            }
            _ => {}
        }
    }

    parsed
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder.get_tag_ascii_string(geo_tag(GDAL_NODATA)).ok()?;
    text.trim_end_matches('\0').trim().parse::<f64>().ok()
}

/// Write a Raster to a GeoTIFF file, keeping its sample type
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
    if opts.tile_size > 0 {
        debug!(tile_size = opts.tile_size, "native writer stores strips, tile size ignored");
    }
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &mut writer, opts.compression)?;
    writer.flush()?;
    Ok(())
}

/// Internal: encode a Raster as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, compression: Compression) -> Result<()>
where
    T: TiffSample,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    T::encode(&mut encoder, raster, compression)
}

fn write_image<W, C, D, T>(
    encoder: &mut TiffEncoder<W>,
    raster: &Raster<T>,
    data: &[C::Inner],
    compression: D,
) -> Result<()>
where
    W: Write + Seek,
    C: ColorType,
    D: TiffCompression,
    [C::Inner]: TiffValue,
    T: RasterElement,
{
    let (rows, cols) = raster.shape();
    let mut image =
        encoder.new_image_with_compression::<C, D>(cols as u32, rows as u32, compression)?;
    write_geo_tags(image.encoder(), raster)?;
    image.write_data(data)?;
    Ok(())
}

fn write_geo_tags<W, K, T>(dir: &mut DirectoryEncoder<'_, W, K>, raster: &Raster<T>) -> Result<()>
where
    W: Write + Seek,
    K: TiffKind,
    T: RasterElement,
{
    let gt = raster.transform();

    if gt.row_rotation == 0.0 && gt.col_rotation == 0.0 {
        let scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        dir.write_tag(geo_tag(MODEL_PIXEL_SCALE), &scale[..])?;

        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        dir.write_tag(geo_tag(MODEL_TIEPOINT), &tiepoint[..])?;
    } else {
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(geo_tag(MODEL_TRANSFORMATION), &matrix[..])?;
    }

    let geokeys = geo_key_directory(raster.crs());
    dir.write_tag(geo_tag(GEO_KEY_DIRECTORY), &geokeys[..])?;

    if let Some(nodata) = raster.nodata().and_then(|v| v.to_f64()) {
        let text = if nodata.is_nan() {
            "nan".to_string()
        } else {
            nodata.to_string()
        };
        dir.write_tag(geo_tag(GDAL_NODATA), text.as_str())?;
    }

    Ok(())
}

/// GeoKeyDirectory entries: model type, raster-is-area, and the EPSG code
/// when it fits a SHORT.
fn geo_key_directory(crs: Option<&CRS>) -> Vec<u16> {
    let geographic = crs.is_some_and(|c| c.is_geographic());
    let model_type = if geographic { 2 } else { 1 };

    let mut keys: Vec<[u16; 4]> = vec![
        [GT_MODEL_TYPE_KEY, 0, 1, model_type],
        [GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA],
    ];

    match crs.map(|c| (c.epsg(), c)) {
        Some((Some(epsg), _)) => match u16::try_from(epsg) {
            Ok(code) => {
                let key = if geographic {
                    GEOGRAPHIC_TYPE_KEY
                } else {
                    PROJECTED_CS_TYPE_KEY
                };
                keys.push([key, 0, 1, code]);
            }
            Err(_) => warn!(epsg, "EPSG code does not fit a GeoKey, writing without a CRS"),
        },
        Some((None, crs)) => {
            warn!(crs = %crs, "CRS has no EPSG code, writing without a CRS");
        }
        None => {}
    }

    // Version 1.1.0 header
    let mut directory = vec![1, 1, 0, keys.len() as u16];
    directory.extend(keys.into_iter().flatten());
    directory
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_u16_roundtrip_keeps_type_and_georeference() {
        let mut raster: Raster<u16> = Raster::new(20, 30);
        raster.set_transform(GeoTransform::new(394365.0, 5574015.0, 30.0, -30.0));
        raster.set_crs(Some(CRS::from_epsg(32634)));
        raster.set_nodata(Some(0));
        for row in 0..20 {
            for col in 0..30 {
                raster.set(row, col, (row * 100 + col) as u16).unwrap();
            }
        }

        let tmp = NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&raster, tmp.path(), None).unwrap();

        let loaded = read_geotiff_any(tmp.path(), None).unwrap();
        let AnyRaster::UInt16(loaded) = loaded else {
            panic!("expected uint16 raster, got {:?}", loaded.data_type());
        };

        assert_eq!(loaded.shape(), (20, 30));
        assert_eq!(loaded.get(7, 11).unwrap(), 711);
        assert_eq!(loaded.transform(), raster.transform());
        assert_eq!(loaded.crs().and_then(|c| c.epsg()), Some(32634));
        assert_eq!(loaded.nodata(), Some(0));
    }

    #[test]
    fn test_f64_roundtrip_with_nan_nodata() {
        let mut raster: Raster<f64> = Raster::filled(4, 5, 0.25);
        raster.set_crs(Some(CRS::wgs84()));
        raster.set_nodata(Some(f64::NAN));
        raster.set(1, 1, f64::NAN).unwrap();

        let tmp = NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(
            &raster,
            tmp.path(),
            Some(GeoTiffOptions {
                compression: Compression::Lzw,
                ..Default::default()
            }),
        )
        .unwrap();

        let loaded: Raster<f64> = read_geotiff(tmp.path(), None).unwrap();
        assert_eq!(loaded.get(0, 0).unwrap(), 0.25);
        assert!(loaded.get(1, 1).unwrap().is_nan());
        assert!(loaded.nodata().is_some_and(|v| v.is_nan()));
        assert_eq!(loaded.crs().and_then(|c| c.epsg()), Some(4326));
    }

    #[test]
    fn test_pixel_is_point_tiepoint_read_as_corner() {
        let tmp = NamedTempFile::with_suffix(".tif").unwrap();
        {
            let file = File::create(tmp.path()).unwrap();
            let mut encoder = TiffEncoder::new(BufWriter::new(file)).unwrap();
            let mut image = encoder.new_image::<Gray16>(4, 4).unwrap();
            let dir = image.encoder();
            dir.write_tag(geo_tag(MODEL_PIXEL_SCALE), &[30.0f64, 30.0, 0.0][..])
                .unwrap();
            dir.write_tag(
                geo_tag(MODEL_TIEPOINT),
                &[0.0f64, 0.0, 0.0, 1000.0, 2000.0, 0.0][..],
            )
            .unwrap();
            let keys: [u16; 16] = [
                1, 1, 0, 3,
                GT_MODEL_TYPE_KEY, 0, 1, 1,
                GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_POINT,
                PROJECTED_CS_TYPE_KEY, 0, 1, 32634,
            ];
            dir.write_tag(geo_tag(GEO_KEY_DIRECTORY), &keys[..]).unwrap();
            image.write_data(&[7u16; 16][..]).unwrap();
        }

        let loaded: Raster<u16> = read_geotiff(tmp.path(), None).unwrap();
        let gt = loaded.transform();
        assert_eq!((gt.origin_x, gt.origin_y), (985.0, 2015.0));
        assert_eq!(loaded.crs().and_then(|c| c.epsg()), Some(32634));

        // Rewritten as pixel-is-area, the corner origin survives a round trip
        let out = NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&loaded, out.path(), None).unwrap();
        let again: Raster<u16> = read_geotiff(out.path(), None).unwrap();
        assert_eq!(again.transform(), loaded.transform());
    }

    #[test]
    fn test_crs_without_short_epsg_is_omitted() {
        let keys = geo_key_directory(Some(&CRS::from_epsg(100_000)));
        assert_eq!(keys, vec![1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1]);

        let keys = geo_key_directory(Some(&CRS::from_wkt("LOCAL_CS[\"grid\"]")));
        assert_eq!(keys[3], 2);
    }

    #[test]
    fn test_geo_key_directory_layout() {
        let keys = geo_key_directory(Some(&CRS::from_epsg(32634)));
        assert_eq!(
            keys,
            vec![1, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, 32634]
        );

        let keys = geo_key_directory(None);
        assert_eq!(keys, vec![1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1]);
    }

    #[test]
    fn test_multiband_request_rejected() {
        let raster: Raster<u8> = Raster::new(2, 2);
        let tmp = NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&raster, tmp.path(), None).unwrap();

        let err = read_geotiff_any(tmp.path(), Some(2)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "band", .. }));
    }
}
