//! The georeferenced grid type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement, Window};
use ndarray::{s, Array2};

/// A single band of samples with its transform, CRS and no-data value.
///
/// Cells are addressed `(row, col)` from the upper-left corner.
///
/// ```ignore
/// use bandclip_core::Raster;
///
/// let mut red: Raster<u16> = Raster::new(7801, 7651);
/// red.set(10, 20, 5000)?;
/// assert_eq!(red.get(10, 20)?, 5000);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Zero-filled raster
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Raster over row-major `data`; fails unless `data.len() == rows * cols`
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        Array2::from_shape_vec((rows, cols), data)
            .map(Self::from_array)
            .map_err(|e| Error::Other(e.to_string()))
    }

    /// Raster over an array, with the default transform and no CRS or no-data
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Zero-filled raster of another element type sharing this raster's
    /// transform and CRS. No-data is left unset.
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    /// Convert every cell to another element type.
    ///
    /// Values that cannot be represented in `U` become `U::default_nodata()`.
    /// The no-data value is converted the same way.
    pub fn cast<U: RasterElement>(&self) -> Raster<U> {
        Raster {
            data: self
                .data
                .mapv(|v| num_traits::cast(v).unwrap_or_else(U::default_nodata)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: self.nodata.and_then(num_traits::cast),
        }
    }

    /// Copy out a sub-window, moving the transform origin to the window's
    /// upper-left corner. CRS and no-data are kept.
    pub fn window(&self, window: &Window) -> Result<Raster<T>> {
        if window.is_empty() || window.row_end() > self.rows() || window.col_end() > self.cols() {
            return Err(Error::IndexOutOfBounds {
                row: window.row_end(),
                col: window.col_end(),
                rows: self.rows(),
                cols: self.cols(),
            });
        }

        let data = self
            .data
            .slice(s![window.row_off..window.row_end(), window.col_off..window.col_end()])
            .to_owned();

        Ok(Raster {
            data,
            transform: self.transform.window_transform(window),
            crs: self.crs.clone(),
            nodata: self.nodata,
        })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> Error {
        Error::IndexOutOfBounds {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or_else(|| self.out_of_bounds(row, col))
    }

    /// # Safety
    /// `row < self.rows()` and `col < self.cols()`
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let err = self.out_of_bounds(row, col);
        let cell = self.data.get_mut((row, col)).ok_or(err)?;
        *cell = value;
        Ok(())
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Whether `value` is this raster's no-data (NaN always is)
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Minimum, maximum and mean over the valid cells
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut stats = RasterStatistics {
            min: None,
            max: None,
            mean: None,
            valid_count: 0,
            nodata_count: 0,
        };
        let mut sum = 0.0;

        for &value in self.data.iter() {
            let Some(v) = value.to_f64().filter(|_| !self.is_nodata(value)) else {
                stats.nodata_count += 1;
                continue;
            };
            if stats.min.map_or(true, |m| value < m) {
                stats.min = Some(value);
            }
            if stats.max.map_or(true, |m| value > m) {
                stats.max = Some(value);
            }
            sum += v;
            stats.valid_count += 1;
        }

        if stats.valid_count > 0 {
            stats.mean = Some(sum / stats.valid_count as f64);
        }
        stats
    }
}

/// Summary of the valid cells of a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_and_access() {
        let mut raster: Raster<f32> = Raster::new(10, 20);
        assert_eq!(raster.shape(), (10, 20));
        assert_eq!(raster.len(), 200);

        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.get(10, 0).is_err());
        assert!(matches!(
            raster.set(0, 20, 1.0),
            Err(Error::IndexOutOfBounds { row: 0, col: 20, .. })
        ));
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Raster::from_vec(vec![1u8, 2, 3], 2, 2).is_err());
        let r = Raster::from_vec(vec![1u8, 2, 3, 4], 2, 2).unwrap();
        assert_eq!(r.get(1, 0).unwrap(), 3);
    }

    #[test]
    fn test_statistics_skip_nodata() {
        let mut raster: Raster<f64> =
            Raster::from_vec((0..100).map(|v| v as f64).collect(), 10, 10).unwrap();
        raster.set(0, 0, f64::NAN).unwrap();
        raster.set(9, 9, -9999.0).unwrap();
        raster.set_nodata(Some(-9999.0));

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(98.0));
        assert_eq!(stats.valid_count, 98);
        assert_eq!(stats.nodata_count, 2);
        assert_eq!(stats.mean, Some((1..99).sum::<usize>() as f64 / 98.0));
    }

    #[test]
    fn test_window_copies_region_and_shifts_origin() {
        let mut raster: Raster<u16> = Raster::new(6, 8);
        raster.set_transform(GeoTransform::new(100.0, 200.0, 30.0, -30.0));
        raster.set_nodata(Some(0));
        raster.set(3, 4, 7).unwrap();

        let sub = raster.window(&Window::new(2, 1, 4, 3)).unwrap();
        assert_eq!(sub.shape(), (3, 4));
        assert_eq!(sub.get(2, 2).unwrap(), 7);
        assert_eq!(sub.transform().origin_x, 160.0);
        assert_eq!(sub.transform().origin_y, 170.0);
        assert_eq!(sub.nodata(), Some(0));

        assert!(raster.window(&Window::new(6, 0, 4, 3)).is_err());
    }

    #[test]
    fn test_cast_to_float() {
        let mut raster: Raster<u16> = Raster::filled(2, 2, 5000);
        raster.set_nodata(Some(0));

        let cast: Raster<f64> = raster.cast();
        assert_eq!(cast.get(1, 1).unwrap(), 5000.0);
        assert_eq!(cast.nodata(), Some(0.0));
    }

    #[test]
    fn test_cast_out_of_range_becomes_default_nodata() {
        let raster = Raster::from_vec(vec![-1.0f64, 300.0, 12.0], 1, 3).unwrap();
        let cast: Raster<u8> = raster.cast();
        assert_eq!(cast.get(0, 0).unwrap(), u8::MIN);
        assert_eq!(cast.get(0, 1).unwrap(), u8::MIN);
        assert_eq!(cast.get(0, 2).unwrap(), 12);
    }
}
