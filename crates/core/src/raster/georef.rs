//! Georeference: the CRS and transform pair attached to a raster on export

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{GeoTransform, Raster, RasterElement};
use crate::crs::CRS;

/// Where a raster sits on Earth: its CRS and pixel-to-world transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Georeference {
    pub crs: Option<CRS>,
    pub transform: GeoTransform,
}

impl Georeference {
    pub fn new(crs: Option<CRS>, transform: GeoTransform) -> Self {
        Self { crs, transform }
    }

    /// Georeference carried by an existing raster
    pub fn from_raster<T: RasterElement>(raster: &Raster<T>) -> Self {
        Self {
            crs: raster.crs().cloned(),
            transform: *raster.transform(),
        }
    }

    /// UTM zone 34N (EPSG:32634) at 30 m, origin (394365, 5574015).
    ///
    /// The fixed grid used by the original Landsat scene processing.
    pub fn landsat_utm34n() -> Self {
        Self {
            crs: Some(CRS::from_epsg(32634)),
            transform: GeoTransform::new(394365.0, 5574015.0, 30.0, -30.0),
        }
    }

    /// Stamp this georeference onto a raster
    pub fn apply<T: RasterElement>(&self, raster: &mut Raster<T>) {
        raster.set_transform(self.transform);
        raster.set_crs(self.crs.clone());
    }
}

impl fmt::Display for Georeference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.transform.to_affine();
        match &self.crs {
            Some(crs) => write!(f, "{} ", crs)?,
            None => write!(f, "no CRS ")?,
        }
        write!(f, "({a}, {b}, {c}, {d}, {e}, {g})")
    }
}
