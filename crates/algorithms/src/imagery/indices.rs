//! Normalized-difference spectral indices
//!
//! Landsat 8 surface reflectance products store reflectance scaled by
//! 10000. Indices are computed on rescaled values as
//! `(a - b) / (a + b)` and clamped to [-1, 1].

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use crate::imagery::BandCatalog;
use crate::maybe_rayon::*;
use bandclip_core::io::read_geotiff;
use bandclip_core::raster::Raster;
use bandclip_core::{Algorithm, Error, Result};
use tracing::debug;

/// Supported normalized-difference indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectralIndex {
    /// Normalized Difference Vegetation Index: (NIR - Red) / (NIR + Red)
    Ndvi,
    /// Normalized Difference Built-up Index: (SWIR1 - NIR) / (SWIR1 + NIR)
    Ndbi,
    /// Normalized Difference Water Index (Xu): (Green - SWIR1) / (Green + SWIR1)
    Ndwi,
}

impl SpectralIndex {
    pub const ALL: [SpectralIndex; 3] = [Self::Ndvi, Self::Ndbi, Self::Ndwi];

    /// Landsat 8 band numbers `(a, b)` for `(a - b) / (a + b)`
    pub fn bands(self) -> (u8, u8) {
        match self {
            Self::Ndvi => (5, 4),
            Self::Ndbi => (6, 5),
            Self::Ndwi => (3, 6),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ndvi => "ndvi",
            Self::Ndbi => "ndbi",
            Self::Ndwi => "ndwi",
        }
    }
}

impl fmt::Display for SpectralIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpectralIndex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|index| index.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidParameter {
                name: "index",
                value: s.to_string(),
                reason: format!(
                    "expected one of {}",
                    Self::ALL.map(|i| i.name()).join(", ")
                ),
            })
    }
}

/// Value written where `a + b` is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDenominator {
    /// Undefined pixel (NaN)
    #[default]
    Nan,
    /// Zero
    Zero,
}

impl ZeroDenominator {
    fn value(self) -> f64 {
        match self {
            Self::Nan => f64::NAN,
            Self::Zero => 0.0,
        }
    }
}

impl FromStr for ZeroDenominator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nan" => Ok(Self::Nan),
            "zero" | "0" => Ok(Self::Zero),
            _ => Err(Error::InvalidParameter {
                name: "zero_denominator",
                value: s.to_string(),
                reason: "expected nan or zero".to_string(),
            }),
        }
    }
}

/// Parameters for index computation
#[derive(Debug, Clone)]
pub struct IndexParams {
    /// Raw digital numbers are divided by this (default: 10000)
    pub reflectance_scale: f64,
    /// Handling of `a + b == 0` (default: NaN)
    pub zero_denominator: ZeroDenominator,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            reflectance_scale: 10000.0,
            zero_denominator: ZeroDenominator::Nan,
        }
    }
}

/// Rescale raw digital numbers to reflectance. No-data cells become NaN.
pub fn to_reflectance(band: &Raster<f64>, scale: f64) -> Result<Raster<f64>> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::InvalidParameter {
            name: "reflectance_scale",
            value: scale.to_string(),
            reason: "must be a positive finite number".to_string(),
        });
    }

    let nodata = band.nodata();
    let mut output = band.with_same_meta::<f64>(band.rows(), band.cols());
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = band.data().mapv(|v| {
        if is_nodata_f64(v, nodata) {
            f64::NAN
        } else {
            v / scale
        }
    });
    Ok(output)
}

/// Compute `(a - b) / (a + b)` per pixel, clamped to [-1, 1].
///
/// Both inputs are rescaled by `params.reflectance_scale` first. Pixels
/// that are no-data in either band are NaN in the output. The output
/// takes its transform and CRS from `band_a` and has NaN as no-data.
///
/// # Errors
/// [`Error::SizeMismatch`] if the bands differ in shape.
pub fn normalized_difference(
    band_a: &Raster<f64>,
    band_b: &Raster<f64>,
    params: &IndexParams,
) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let a = to_reflectance(band_a, params.reflectance_scale)?;
    let b = to_reflectance(band_b, params.reflectance_scale)?;
    let zero = params.zero_denominator.value();

    let (rows, cols) = a.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                // SAFETY: row < rows and col < cols of both rasters
                let va = unsafe { a.get_unchecked(row, col) };
                let vb = unsafe { b.get_unchecked(row, col) };

                if va.is_nan() || vb.is_nan() {
                    continue;
                }

                let sum = va + vb;
                *out = if sum.abs() < 1e-10 {
                    zero
                } else {
                    ((va - vb) / sum).clamp(-1.0, 1.0)
                };
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// Read the two bands an index needs from a catalog and compute it
pub fn calculate_index(
    index: SpectralIndex,
    catalog: &BandCatalog,
    params: &IndexParams,
) -> Result<Raster<f64>> {
    let (a, b) = index.bands();
    let path_a = catalog.get(a)?;
    let path_b = catalog.get(b)?;
    debug!(
        "{}: band {} = {}, band {} = {}",
        index,
        a,
        path_a.display(),
        b,
        path_b.display()
    );

    let band_a = read_geotiff::<f64, _>(path_a, None)?;
    let band_b = read_geotiff::<f64, _>(path_b, None)?;
    normalized_difference(&band_a, &band_b, params)
}

/// Normalized difference of two bands as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct NormalizedDifference;

impl Algorithm for NormalizedDifference {
    type Input = (Raster<f64>, Raster<f64>);
    type Output = Raster<f64>;
    type Params = IndexParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "NormalizedDifference"
    }

    fn description(&self) -> &'static str {
        "Normalized difference (a - b) / (a + b) of two reflectance bands"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (a, b) = input;
        normalized_difference(&a, &b, &params)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_nodata_f64(value: f64, nodata: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match nodata {
        Some(nd) if nd.is_nan() => false,
        Some(nd) => (value - nd).abs() < f64::EPSILON,
        None => false,
    }
}

fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}

fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bandclip_core::{GeoTransform, CRS};

    fn make_band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(500000.0, 4000000.0, 30.0, -30.0));
        r.set_crs(Some(CRS::from_epsg(32634)));
        r
    }

    #[test]
    fn test_band_table() {
        assert_eq!(SpectralIndex::Ndvi.bands(), (5, 4));
        assert_eq!(SpectralIndex::Ndbi.bands(), (6, 5));
        assert_eq!(SpectralIndex::Ndwi.bands(), (3, 6));
    }

    #[test]
    fn test_parse_index_name() {
        assert_eq!("ndvi".parse::<SpectralIndex>().unwrap(), SpectralIndex::Ndvi);
        assert_eq!("NDBI".parse::<SpectralIndex>().unwrap(), SpectralIndex::Ndbi);
        assert_eq!(" ndwi ".parse::<SpectralIndex>().unwrap(), SpectralIndex::Ndwi);

        let err = "evi".parse::<SpectralIndex>().unwrap_err();
        match err {
            Error::InvalidParameter { name, value, reason } => {
                assert_eq!(name, "index");
                assert_eq!(value, "evi");
                assert!(reason.contains("ndvi, ndbi, ndwi"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ndvi_from_digital_numbers() {
        let nir = make_band(4, 4, 8000.0);
        let red = make_band(4, 4, 5000.0);

        let result = normalized_difference(&nir, &red, &IndexParams::default()).unwrap();

        // (0.8 - 0.5) / (0.8 + 0.5)
        assert_relative_eq!(result.get(1, 2).unwrap(), 0.3 / 1.3, epsilon = 1e-12);
        assert_relative_eq!(result.get(0, 0).unwrap(), 0.230769, epsilon = 1e-6);
    }

    #[test]
    fn test_output_keeps_georeference_of_first_band() {
        let a = make_band(3, 5, 100.0);
        let b = make_band(3, 5, 300.0);

        let result = normalized_difference(&a, &b, &IndexParams::default()).unwrap();

        assert_eq!(result.shape(), (3, 5));
        assert_eq!(result.transform(), a.transform());
        assert_eq!(result.crs(), a.crs());
        assert!(result.nodata().unwrap().is_nan());
        assert_relative_eq!(result.get(2, 4).unwrap(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_result_is_clamped() {
        // Negative reflectance from atmospheric over-correction pushes the
        // raw ratio outside [-1, 1]
        let a = Raster::from_vec(vec![3.0, -1.0, 1.0, -3.0], 1, 4).unwrap();
        let b = Raster::from_vec(vec![-1.0, 3.0, -3.0, 1.0], 1, 4).unwrap();

        let result = normalized_difference(&a, &b, &IndexParams::default()).unwrap();

        assert_eq!(result.get(0, 0).unwrap(), 1.0);
        assert_eq!(result.get(0, 1).unwrap(), -1.0);
        assert_eq!(result.get(0, 2).unwrap(), -1.0);
        assert_eq!(result.get(0, 3).unwrap(), 1.0);
    }

    #[test]
    fn test_zero_denominator_policies() {
        let a = Raster::from_vec(vec![0.0, 200.0], 1, 2).unwrap();
        let b = Raster::from_vec(vec![0.0, -200.0], 1, 2).unwrap();

        let nan = normalized_difference(&a, &b, &IndexParams::default()).unwrap();
        assert!(nan.get(0, 0).unwrap().is_nan());
        assert!(nan.get(0, 1).unwrap().is_nan());

        let params = IndexParams {
            zero_denominator: ZeroDenominator::Zero,
            ..Default::default()
        };
        let zero = normalized_difference(&a, &b, &params).unwrap();
        assert_eq!(zero.get(0, 0).unwrap(), 0.0);
        assert_eq!(zero.get(0, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_nodata_propagates_as_nan() {
        let mut a = Raster::from_vec(vec![8000.0, -9999.0, 8000.0], 1, 3).unwrap();
        a.set_nodata(Some(-9999.0));
        let b = Raster::from_vec(vec![5000.0, 5000.0, f64::NAN], 1, 3).unwrap();

        let result = normalized_difference(&a, &b, &IndexParams::default()).unwrap();

        assert!(!result.get(0, 0).unwrap().is_nan());
        assert!(result.get(0, 1).unwrap().is_nan());
        assert!(result.get(0, 2).unwrap().is_nan());
    }

    #[test]
    fn test_shape_mismatch() {
        let a = make_band(4, 4, 1.0);
        let b = make_band(4, 5, 1.0);
        let err = normalized_difference(&a, &b, &IndexParams::default()).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let a = make_band(2, 2, 1.0);
        let params = IndexParams {
            reflectance_scale: 0.0,
            ..Default::default()
        };
        assert!(normalized_difference(&a, &a, &params).is_err());
    }

    #[test]
    fn test_zero_denominator_parse() {
        assert_eq!("NaN".parse::<ZeroDenominator>().unwrap(), ZeroDenominator::Nan);
        assert_eq!("zero".parse::<ZeroDenominator>().unwrap(), ZeroDenominator::Zero);
        assert!("skip".parse::<ZeroDenominator>().is_err());
    }

    #[test]
    fn test_algorithm_trait() {
        let algo = NormalizedDifference;
        let out = algo
            .execute_default((make_band(2, 2, 6000.0), make_band(2, 2, 2000.0)))
            .unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(algo.name(), "NormalizedDifference");
    }
}
