//! Band catalog resolution
//!
//! A Landsat product directory holds one GeoTIFF per spectral band, named
//! with a product prefix and a band token, e.g.
//! `LC08_L1TP_187025_20200812_20200822_01_T1_sr_band4.tif`. The catalog maps
//! each band number to its file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bandclip_core::{Error, Result};
use tracing::{debug, warn};

/// Naming convention for band files
#[derive(Debug, Clone)]
pub struct CatalogParams {
    /// Accepted file name prefixes (default: `["LC"]`)
    pub prefixes: Vec<String>,
    /// Token immediately preceding the band number (default: `"band"`)
    pub token: String,
    /// File extension without the dot, matched case-insensitively (default: `"tif"`)
    pub extension: String,
    /// Bands `1..=expected_bands` must all be present (default: 7)
    pub expected_bands: u8,
}

impl Default for CatalogParams {
    fn default() -> Self {
        Self {
            prefixes: vec!["LC".to_string()],
            token: "band".to_string(),
            extension: "tif".to_string(),
            expected_bands: 7,
        }
    }
}

impl CatalogParams {
    /// Whether a file name has an accepted prefix, the band token and the
    /// raster extension
    pub fn matches(&self, file_name: &str) -> bool {
        self.prefixes.iter().any(|p| file_name.starts_with(p.as_str()))
            && has_extension(file_name, &self.extension)
            && file_name.contains(self.token.as_str())
    }

    /// Band number encoded in a file name: the digits right after the last
    /// occurrence of the band token that is followed by digits.
    pub fn band_number(&self, file_name: &str) -> Option<u8> {
        if self.token.is_empty() {
            return None;
        }
        file_name
            .match_indices(self.token.as_str())
            .filter_map(|(idx, _)| {
                let rest = &file_name[idx + self.token.len()..];
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<u8>().ok()
            })
            .last()
    }

    /// File name used for a band under this convention
    pub fn file_name(&self, prefix: &str, band: u8) -> String {
        format!("{}{}{}.{}", prefix, self.token, band, self.extension)
    }
}

fn has_extension(file_name: &str, extension: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Mapping from band number to raster file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandCatalog {
    dir: PathBuf,
    bands: BTreeMap<u8, PathBuf>,
}

impl BandCatalog {
    /// Empty catalog rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            bands: BTreeMap::new(),
        }
    }

    /// Add a band. Returns the previously registered path if the band was
    /// already present.
    pub fn insert(&mut self, band: u8, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.bands.insert(band, path.into())
    }

    /// Directory the catalog was resolved in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a band, or an [`Error::IncompleteCatalog`] naming it
    pub fn get(&self, band: u8) -> Result<&Path> {
        self.bands
            .get(&band)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::IncompleteCatalog {
                dir: self.dir.clone(),
                expected: band,
                missing: vec![band],
            })
    }

    /// Bands in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Path)> {
        self.bands.iter().map(|(b, p)| (*b, p.as_path()))
    }

    pub fn band_numbers(&self) -> Vec<u8> {
        self.bands.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Check that bands `1..=expected` are all present
    pub fn require(&self, expected: u8) -> Result<()> {
        let missing: Vec<u8> = (1..=expected)
            .filter(|b| !self.bands.contains_key(b))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::IncompleteCatalog {
                dir: self.dir.clone(),
                expected,
                missing,
            })
        }
    }
}

/// Scan a directory for band files and build a catalog.
///
/// The band number comes from the file name, not from listing or sort
/// order. Files for bands beyond `expected_bands` are ignored.
///
/// # Errors
/// - [`Error::Io`] if the directory cannot be listed
/// - [`Error::DuplicateBand`] if two files name the same band
/// - [`Error::IncompleteCatalog`] if any of bands `1..=expected_bands` is missing
pub fn resolve_catalog<P: AsRef<Path>>(dir: P, params: &CatalogParams) -> Result<BandCatalog> {
    let dir = dir.as_ref();

    let mut names: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if params.matches(&name) && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort();

    let mut catalog = BandCatalog::new(dir);
    let mut sorted_bands = Vec::with_capacity(names.len());

    for name in names {
        let Some(band) = params.band_number(&name) else {
            debug!("Skipping {}: no band number after '{}'", name, params.token);
            continue;
        };
        if band == 0 || band > params.expected_bands {
            debug!("Skipping {}: band {} outside 1..={}", name, band, params.expected_bands);
            continue;
        }

        let path = dir.join(&name);
        if let Some(first) = catalog.insert(band, path.clone()) {
            return Err(Error::DuplicateBand {
                band,
                first,
                second: path,
            });
        }
        sorted_bands.push(band);
    }

    if sorted_bands.windows(2).any(|w| w[0] > w[1]) {
        warn!(
            "File name order {:?} in {} differs from band order; using parsed band numbers",
            sorted_bands,
            dir.display()
        );
    }

    catalog.require(params.expected_bands)?;
    debug!("Resolved {} bands in {}", catalog.len(), dir.display());

    Ok(catalog)
}
