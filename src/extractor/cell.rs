//! Cell qualification and per-cell footprints

use std::ops::Range;

use geo::{Coord, Polygon, Rect};

use crate::coordinate::CoordinateTransformer;
use crate::errors::{ConversionError, ConversionResult};
use crate::raster::{GeoTransform, RasterGrid};

/// A cell that passed the value checks and still needs geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellCandidate {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

/// Whether a cell value produces output: not no-data, and not zero when
/// zero cells are excluded
#[inline]
pub fn qualifies(grid: &RasterGrid, value: f64, exclude_zero: bool) -> bool {
    !(grid.is_nodata(value) || (exclude_zero && value == 0.0))
}

/// Lazily yield qualifying cells of `rows` in row-major order
pub fn surviving_cells(
    grid: &RasterGrid,
    rows: Range<usize>,
    exclude_zero: bool,
) -> impl Iterator<Item = CellCandidate> + '_ {
    rows.flat_map(move |row| {
        grid.row(row)
            .iter()
            .enumerate()
            .filter(move |(_, value)| qualifies(grid, **value, exclude_zero))
            .map(move |(col, value)| CellCandidate { row, col, value: *value })
    })
}

/// Builds target-system squares for individual cells
///
/// Only the lower-left and upper-right corners of a cell are transformed;
/// the square is the axis-aligned box spanned by the two results.
pub struct CellGeometryBuilder<'a> {
    transform: GeoTransform,
    transformer: &'a CoordinateTransformer,
}

impl<'a> CellGeometryBuilder<'a> {
    pub fn new(transform: GeoTransform, transformer: &'a CoordinateTransformer) -> Self {
        CellGeometryBuilder {
            transform,
            transformer,
        }
    }

    /// Native footprint of a cell as `(lower_left, upper_right)`
    pub fn native_corners(&self, row: usize, col: usize) -> (Coord<f64>, Coord<f64>) {
        let (x0, y0) = self.transform.cell_origin(row, col);
        let (res_x, res_y) = self.transform.resolution();
        (
            Coord { x: x0, y: y0 - res_y },
            Coord { x: x0 + res_x, y: y0 },
        )
    }

    /// Target-system square of cell `(row, col)`
    pub fn build(&self, row: usize, col: usize) -> ConversionResult<Polygon<f64>> {
        let (lower_left, upper_right) = self.native_corners(row, col);

        let a = self.transformer.transform(lower_left.x, lower_left.y)
            .map_err(|reason| ConversionError::cell(row, col, reason))?;
        let b = self.transformer.transform(upper_right.x, upper_right.y)
            .map_err(|reason| ConversionError::cell(row, col, reason))?;

        // Corners may come back swapped on either axis
        let min = Coord { x: a.x.min(b.x), y: a.y.min(b.y) };
        let max = Coord { x: a.x.max(b.x), y: a.y.max(b.y) };

        Ok(Rect::new(min, max).to_polygon())
    }
}
