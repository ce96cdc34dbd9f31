//! Pixel/world affine transforms

use serde::{Deserialize, Serialize};

use super::Window;

/// Maps pixel positions `(col, row)` to world coordinates `(x, y)`:
///
/// ```text
/// x = origin_x + col * pixel_width  + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// Landsat scenes are north-up, so both rotations are zero and
/// `pixel_height` is the negative pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X of the upper-left corner of pixel (0, 0)
    pub origin_x: f64,
    /// Y of the upper-left corner of pixel (0, 0)
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Negative for north-up grids
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    /// North-up transform without rotation
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// From GDAL order `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        let [origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height] = gt;
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation,
            col_rotation,
        }
    }

    /// GDAL order, the inverse of [`GeoTransform::from_gdal`]
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Coefficients in affine order `(a, b, c, d, e, f)`:
    /// `x = a*col + b*row + c`, `y = d*col + e*row + f`
    pub fn to_affine(&self) -> [f64; 6] {
        [
            self.pixel_width,
            self.row_rotation,
            self.origin_x,
            self.col_rotation,
            self.pixel_height,
            self.origin_y,
        ]
    }

    /// World coordinates of a pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// World coordinates of a pixel's upper-left corner
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64, row as f64)
    }

    fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// Fractional pixel position of a world coordinate. Floor it for the
    /// containing pixel. NaN for a singular transform.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det.abs() < 1e-10 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        (
            (self.pixel_height * dx - self.row_rotation * dy) / det,
            (self.pixel_width * dy - self.col_rotation * dx) / det,
        )
    }

    /// Transform of a sub-window: same pixel size and rotation, origin moved
    /// to the window's upper-left corner.
    pub fn window_transform(&self, window: &Window) -> GeoTransform {
        let (origin_x, origin_y) = self.pixel_to_geo_corner(window.col_off, window.row_off);
        GeoTransform {
            origin_x,
            origin_y,
            ..*self
        }
    }

    /// Reinterpret a transform whose origin is the center of pixel (0, 0) as
    /// one anchored at its upper-left corner, moving the origin back half a
    /// pixel along both axes.
    pub fn pixel_is_point_to_area(&self) -> GeoTransform {
        GeoTransform {
            origin_x: self.origin_x - 0.5 * (self.pixel_width + self.row_rotation),
            origin_y: self.origin_y - 0.5 * (self.col_rotation + self.pixel_height),
            ..*self
        }
    }

    /// World extent `(min_x, min_y, max_x, max_y)` of a `width` x `height` grid
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let corners = [(0, 0), (width, 0), (0, height), (width, height)]
            .map(|(c, r)| self.pixel_to_geo_corner(c, r));
        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
