//! Options shared by the GeoTIFF backends

/// TIFF compression scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    None,
    #[default]
    Deflate,
    Lzw,
}

impl Compression {
    /// Name understood by the GDAL `COMPRESS` creation option
    pub fn as_gdal_str(&self) -> &'static str {
        match self {
            Compression::None => "NONE",
            Compression::Deflate => "DEFLATE",
            Compression::Lzw => "LZW",
        }
    }
}

/// Options for writing GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    pub compression: Compression,
    /// Tile size for tiled TIFFs (0 for strips). Only the GDAL backend tiles.
    pub tile_size: usize,
    /// BigTIFF for files > 4GB. Only the GDAL backend honours this.
    pub bigtiff: bool,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Deflate,
            tile_size: 256,
            bigtiff: false,
        }
    }
}
