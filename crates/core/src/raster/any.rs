//! Rasters whose sample type is only known at runtime

use super::{DataType, GeoTransform, Raster, RasterElement};
use crate::crs::CRS;

/// A single-band raster of any supported sample type.
///
/// Produced when reading a file whose data type is not known in advance.
/// Use [`dispatch_any_raster!`](crate::dispatch_any_raster) to run generic code
/// on the concrete raster inside.
#[derive(Debug, Clone)]
pub enum AnyRaster {
    UInt8(Raster<u8>),
    Int8(Raster<i8>),
    UInt16(Raster<u16>),
    Int16(Raster<i16>),
    UInt32(Raster<u32>),
    Int32(Raster<i32>),
    UInt64(Raster<u64>),
    Int64(Raster<i64>),
    Float32(Raster<f32>),
    Float64(Raster<f64>),
}

/// Bind the concrete raster inside an [`AnyRaster`] and evaluate an expression
/// for it. Every arm must produce the same type.
///
/// ```ignore
/// let rows = dispatch_any_raster!(&any, r => r.rows());
/// ```
#[macro_export]
macro_rules! dispatch_any_raster {
    ($any:expr, $r:ident => $body:expr) => {
        match $any {
            $crate::raster::AnyRaster::UInt8($r) => $body,
            $crate::raster::AnyRaster::Int8($r) => $body,
            $crate::raster::AnyRaster::UInt16($r) => $body,
            $crate::raster::AnyRaster::Int16($r) => $body,
            $crate::raster::AnyRaster::UInt32($r) => $body,
            $crate::raster::AnyRaster::Int32($r) => $body,
            $crate::raster::AnyRaster::UInt64($r) => $body,
            $crate::raster::AnyRaster::Int64($r) => $body,
            $crate::raster::AnyRaster::Float32($r) => $body,
            $crate::raster::AnyRaster::Float64($r) => $body,
        }
    };
}

impl AnyRaster {
    pub fn data_type(&self) -> DataType {
        match self {
            AnyRaster::UInt8(_) => DataType::UInt8,
            AnyRaster::Int8(_) => DataType::Int8,
            AnyRaster::UInt16(_) => DataType::UInt16,
            AnyRaster::Int16(_) => DataType::Int16,
            AnyRaster::UInt32(_) => DataType::UInt32,
            AnyRaster::Int32(_) => DataType::Int32,
            AnyRaster::UInt64(_) => DataType::UInt64,
            AnyRaster::Int64(_) => DataType::Int64,
            AnyRaster::Float32(_) => DataType::Float32,
            AnyRaster::Float64(_) => DataType::Float64,
        }
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        dispatch_any_raster!(self, r => r.shape())
    }

    pub fn transform(&self) -> &GeoTransform {
        dispatch_any_raster!(self, r => r.transform())
    }

    pub fn crs(&self) -> Option<&CRS> {
        dispatch_any_raster!(self, r => r.crs())
    }

    /// No-data value widened to f64
    pub fn nodata(&self) -> Option<f64> {
        dispatch_any_raster!(self, r => r.nodata().and_then(|v| v.to_f64()))
    }

    /// Convert to a raster of a concrete element type
    pub fn cast<T: RasterElement>(&self) -> Raster<T> {
        dispatch_any_raster!(self, r => r.cast::<T>())
    }
}

macro_rules! impl_from_raster {
    ($t:ty, $variant:ident) => {
        impl From<Raster<$t>> for AnyRaster {
            fn from(raster: Raster<$t>) -> Self {
                AnyRaster::$variant(raster)
            }
        }
    };
}

impl_from_raster!(u8, UInt8);
impl_from_raster!(i8, Int8);
impl_from_raster!(u16, UInt16);
impl_from_raster!(i16, Int16);
impl_from_raster!(u32, UInt32);
impl_from_raster!(i32, Int32);
impl_from_raster!(u64, UInt64);
impl_from_raster!(i64, Int64);
impl_from_raster!(f32, Float32);
impl_from_raster!(f64, Float64);
