//! Reading vector boundary files
//!
//! Without the `gdal` feature only GeoJSON is understood. With it, any
//! OGR-readable format (shapefile, GeoPackage, GeoJSON, ...) is accepted and
//! features from every layer are returned.

use crate::error::{Error, Result};
use crate::vector::ClipGeometry;
use std::path::Path;

/// Read the polygon mask from a vector boundary file.
///
/// Any failure to open or parse the file is reported as
/// [`Error::VectorDriver`].
pub fn read_clip_geometry<P: AsRef<Path>>(path: P) -> Result<ClipGeometry> {
    let features = read_features(path)?;
    Ok(ClipGeometry::from_features(&features))
}

fn driver_error(path: &Path, reason: impl ToString) -> Error {
    Error::VectorDriver {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(not(feature = "gdal"))]
pub use self::geojson_reader::read_features;

#[cfg(feature = "gdal")]
pub use self::ogr_reader::read_features;

#[cfg(not(feature = "gdal"))]
mod geojson_reader {
    use super::driver_error;
    use crate::error::Result;
    use crate::vector::{Feature, FeatureCollection};
    use geojson::feature::Id;
    use geojson::GeoJson;
    use std::path::Path;

    /// Read every feature of a GeoJSON file
    pub fn read_features<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| driver_error(path, e))?;
        let geojson = text.parse::<GeoJson>().map_err(|e| driver_error(path, e))?;

        let raw: Vec<geojson::Feature> = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(g) => vec![geojson::Feature {
                bbox: None,
                geometry: Some(g),
                id: None,
                properties: None,
                foreign_members: None,
            }],
        };

        raw.into_iter()
            .map(|f| {
                let geometry = f
                    .geometry
                    .map(geo_types::Geometry::<f64>::try_from)
                    .transpose()
                    .map_err(|e| driver_error(path, e))?;
                let id = f.id.map(|id| match id {
                    Id::String(s) => s,
                    Id::Number(n) => n.to_string(),
                });
                Ok(Feature { geometry, id })
            })
            .collect()
    }
}

#[cfg(feature = "gdal")]
mod ogr_reader {
    use super::driver_error;
    use crate::error::Result;
    use crate::vector::{Feature, FeatureCollection};
    use gdal::vector::LayerAccess;
    use gdal::Dataset;
    use std::path::Path;

    /// Read every feature of every layer of an OGR dataset
    pub fn read_features<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
        let path = path.as_ref();
        let dataset = Dataset::open(path).map_err(|e| driver_error(path, e))?;

        let mut features = FeatureCollection::new();
        for mut layer in dataset.layers() {
            for feature in layer.features() {
                let geometry = match feature.geometry() {
                    Some(g) => Some(g.to_geo().map_err(|e| driver_error(path, e))?),
                    None => None,
                };
                features.push(Feature {
                    geometry,
                    id: feature.fid().map(|fid| fid.to_string()),
                });
            }
        }

        Ok(features)
    }
}

#[cfg(all(test, not(feature = "gdal")))]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BOUNDARY: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 7,
                "properties": {"name": "aoi"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[20, 20], [30, 20], [30, 30], [20, 20]]],
                        [[[40, 40], [50, 40], [50, 50], [40, 40]]]
                    ]
                }
            }
        ]
    }"#;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::with_suffix(".geojson").unwrap();
        tmp.write_all(contents.as_bytes()).unwrap();
        tmp
    }

    #[test]
    fn test_read_feature_collection() {
        let tmp = write_temp(BOUNDARY);

        let features = read_features(tmp.path()).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features.features[0].id.as_deref(), Some("7"));

        let clip = read_clip_geometry(tmp.path()).unwrap();
        assert_eq!(clip.len(), 3);
    }

    #[test]
    fn test_bare_geometry() {
        let tmp = write_temp(
            r#"{"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}"#,
        );
        let clip = read_clip_geometry(tmp.path()).unwrap();
        assert_eq!(clip.len(), 1);
    }

    #[test]
    fn test_unreadable_boundary_is_driver_error() {
        let tmp = write_temp("this is not geojson");
        let err = read_clip_geometry(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::VectorDriver { .. }));

        let err = read_clip_geometry("/definitely/not/here.geojson").unwrap_err();
        assert!(matches!(err, Error::VectorDriver { .. }));
    }
}
