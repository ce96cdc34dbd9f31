//! Pixel windows and inside/outside masks for polygon boundaries

use geo::{BoundingRect, Coord, Intersects, LineString, Point, Polygon, Rect};
use ndarray::Array2;

use crate::maybe_rayon::*;
use bandclip_core::raster::{GeoTransform, Window};
use bandclip_core::ClipGeometry;

/// Smallest pixel window of a `rows` x `cols` grid covering every vertex
/// of the geometry, or `None` if the geometry misses the grid.
pub fn geometry_window(
    geometry: &ClipGeometry,
    transform: &GeoTransform,
    rows: usize,
    cols: usize,
) -> Option<Window> {
    let mut min_col = f64::INFINITY;
    let mut min_row = f64::INFINITY;
    let mut max_col = f64::NEG_INFINITY;
    let mut max_row = f64::NEG_INFINITY;

    for c in geometry.coords() {
        let (col, row) = transform.geo_to_pixel(c.x, c.y);
        min_col = min_col.min(col);
        min_row = min_row.min(row);
        max_col = max_col.max(col);
        max_row = max_row.max(row);
    }

    Window::enclosing(min_col, min_row, max_col, max_row, rows, cols)
}

/// Which pixels of `window` fall inside the geometry.
///
/// A pixel is inside when its center lies in a polygon, or with
/// `all_touched` when any part of the pixel touches one. The returned
/// array has the window's shape.
pub fn polygon_mask(
    geometry: &ClipGeometry,
    transform: &GeoTransform,
    window: &Window,
    all_touched: bool,
) -> Array2<bool> {
    let (rows, cols) = window.shape();

    // Polygons paired with their envelopes for a cheap rejection test
    let candidates: Vec<(&Polygon<f64>, Rect<f64>)> = geometry
        .polygons()
        .iter()
        .filter_map(|p| p.bounding_rect().map(|r| (p, r)))
        .collect();

    let data: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|r| {
            let row = window.row_off + r;
            let mut row_data = vec![false; cols];
            for (c, inside) in row_data.iter_mut().enumerate() {
                let col = window.col_off + c;
                *inside = if all_touched {
                    let cell = pixel_polygon(transform, col, row);
                    let Some(cell_rect) = cell.bounding_rect() else {
                        continue;
                    };
                    candidates
                        .iter()
                        .any(|(p, env)| env.intersects(&cell_rect) && p.intersects(&cell))
                } else {
                    let (x, y) = transform.pixel_to_geo(col, row);
                    let center = Point::new(x, y);
                    candidates
                        .iter()
                        .any(|(p, env)| env.intersects(&center) && p.intersects(&center))
                };
            }
            row_data
        })
        .collect();

    // rows * cols elements by construction
    Array2::from_shape_vec((rows, cols), data).unwrap_or_else(|_| Array2::from_elem((rows, cols), false))
}

/// Footprint of a pixel in world coordinates
fn pixel_polygon(transform: &GeoTransform, col: usize, row: usize) -> Polygon<f64> {
    let corner = |c: usize, r: usize| {
        let (x, y) = transform.pixel_to_geo_corner(c, r);
        Coord { x, y }
    };
    Polygon::new(
        LineString::new(vec![
            corner(col, row),
            corner(col + 1, row),
            corner(col + 1, row + 1),
            corner(col, row + 1),
            corner(col, row),
        ]),
        vec![],
    )
}
