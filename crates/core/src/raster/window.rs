//! Rectangular pixel windows

use serde::{Deserialize, Serialize};

/// A rectangular region of a raster in pixel space.
///
/// `col_off`/`row_off` locate the upper-left pixel; `width`/`height` count
/// columns and rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub fn new(col_off: usize, row_off: usize, width: usize, height: usize) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// Window covering a whole raster of the given shape
    pub fn full(rows: usize, cols: usize) -> Self {
        Self::new(0, 0, cols, rows)
    }

    /// Smallest integer window enclosing fractional pixel bounds, clipped to
    /// a raster of `rows` x `cols`.
    ///
    /// Starts are floored and stops are ceiled. Returns `None` when the
    /// bounds are not finite or miss the raster entirely.
    pub fn enclosing(
        min_col: f64,
        min_row: f64,
        max_col: f64,
        max_row: f64,
        rows: usize,
        cols: usize,
    ) -> Option<Self> {
        if ![min_col, min_row, max_col, max_row].iter().all(|v| v.is_finite()) {
            return None;
        }

        let col_start = min_col.floor().max(0.0);
        let row_start = min_row.floor().max(0.0);
        let col_stop = max_col.ceil().min(cols as f64);
        let row_stop = max_row.ceil().min(rows as f64);

        if col_stop <= col_start || row_stop <= row_start {
            return None;
        }

        Some(Self::new(
            col_start as usize,
            row_start as usize,
            (col_stop - col_start) as usize,
            (row_stop - row_start) as usize,
        ))
    }

    /// One past the last column
    pub fn col_end(&self) -> usize {
        self.col_off + self.width
    }

    /// One past the last row
    pub fn row_end(&self) -> usize {
        self.row_off + self.height
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing_floors_and_ceils() {
        let w = Window::enclosing(1.2, 2.7, 5.1, 6.0, 10, 10).unwrap();
        assert_eq!(w, Window::new(1, 2, 5, 4));
    }

    #[test]
    fn test_enclosing_clips_to_raster() {
        let w = Window::enclosing(-3.0, -1.5, 14.0, 20.0, 10, 12).unwrap();
        assert_eq!(w, Window::full(10, 12));
    }

    #[test]
    fn test_enclosing_outside_is_none() {
        assert!(Window::enclosing(20.0, 20.0, 30.0, 30.0, 10, 10).is_none());
        assert!(Window::enclosing(f64::NAN, 0.0, 1.0, 1.0, 10, 10).is_none());
    }
}
