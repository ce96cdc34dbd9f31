//! Vector features and the polygon mask used for clipping

use geo_types::{Coord, Geometry, MultiPolygon, Polygon};

/// A geographic feature read from a vector file.
///
/// Attributes are not retained; only the geometry matters for masking.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Collection of features
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

/// The areal part of a vector boundary, used as a raster mask.
///
/// Polygons and multipolygons are kept (geometry collections are flattened);
/// points and lines carry no area and are dropped. No validity, feature
/// count or CRS checks are made.
#[derive(Debug, Clone)]
pub struct ClipGeometry {
    polygons: MultiPolygon<f64>,
}

impl Default for ClipGeometry {
    fn default() -> Self {
        Self::from_polygons(Vec::new())
    }
}

impl ClipGeometry {
    pub fn from_polygons(polygons: Vec<Polygon<f64>>) -> Self {
        Self {
            polygons: MultiPolygon::new(polygons),
        }
    }

    pub fn from_features(features: &FeatureCollection) -> Self {
        let mut polygons = Vec::new();
        for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
            collect_polygons(geometry, &mut polygons);
        }
        Self::from_polygons(polygons)
    }

    pub fn polygons(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }

    /// Number of polygon parts
    pub fn len(&self) -> usize {
        self.polygons.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.0.is_empty()
    }

    /// Every vertex of every ring, exteriors and holes alike
    pub fn coords(&self) -> impl Iterator<Item = &Coord<f64>> {
        self.polygons.0.iter().flat_map(|polygon| {
            polygon
                .exterior()
                .coords()
                .chain(polygon.interiors().iter().flat_map(|ring| ring.coords()))
        })
    }
}

fn collect_polygons(geometry: &Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => out.push(p.clone()),
        Geometry::MultiPolygon(mp) => out.extend(mp.0.iter().cloned()),
        Geometry::Rect(r) => out.push(r.to_polygon()),
        Geometry::Triangle(t) => out.push(t.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            for g in gc.0.iter() {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}
