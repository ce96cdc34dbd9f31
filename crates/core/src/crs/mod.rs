//! Coordinate reference systems
//!
//! Rasters carry the CRS they were read with. GeoTIFFs written by the
//! native codec identify it by EPSG code only; GDAL may also hand back WKT.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A CRS known by EPSG code, by WKT, or both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    epsg: Option<u32>,
    wkt: Option<String>,
}

impl CRS {
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    /// WGS84 geographic (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// EPSG codes 4000-4999 are geographic 2D systems. A CRS known only by
    /// WKT counts as projected.
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, Some(4000..=4999))
    }

    /// Same EPSG code, or identical WKT when either code is unknown
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        match (self.epsg, other.epsg, &self.wkt, &other.wkt) {
            (Some(a), Some(b), _, _) => a == b,
            (_, _, Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// `EPSG:<code>`, or the start of the WKT
    pub fn identifier(&self) -> String {
        match (self.epsg, &self.wkt) {
            (Some(code), _) => format!("EPSG:{}", code),
            (None, Some(wkt)) => format!("WKT:{}", wkt.chars().take(50).collect::<String>()),
            (None, None) => "unknown".to_string(),
        }
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}
