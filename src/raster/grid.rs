//! In-memory raster grid

use super::geotransform::GeoTransform;
use crate::coordinate::CoordinateSystem;
use crate::errors::{ConversionError, ConversionResult};

/// Immutable row-major grid of cell values with its georeferencing
#[derive(Debug, Clone)]
pub struct RasterGrid {
    values: Vec<f64>,
    rows: usize,
    cols: usize,
    transform: GeoTransform,
    crs: CoordinateSystem,
    nodata: Option<f64>,
    source: String,
}

impl RasterGrid {
    /// Create a grid, checking that its shape and georeferencing are usable
    pub fn new(
        values: Vec<f64>,
        rows: usize,
        cols: usize,
        transform: GeoTransform,
        crs: CoordinateSystem,
        nodata: Option<f64>,
    ) -> ConversionResult<Self> {
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(ConversionError::InvalidGrid(format!(
                "{} values do not fill a {}x{} grid", values.len(), rows, cols
            )));
        }

        if !transform.is_valid() {
            return Err(ConversionError::InvalidGrid(format!(
                "resolution must be positive and finite, got {} x {}",
                transform.pixel_width, transform.pixel_height
            )));
        }

        Ok(RasterGrid {
            values,
            rows,
            cols,
            transform,
            crs,
            nodata,
            source: "<memory>".to_string(),
        })
    }

    /// Build a grid from nested rows, mostly useful for small fixtures
    pub fn from_rows(
        rows: &[Vec<f64>],
        transform: GeoTransform,
        crs: CoordinateSystem,
        nodata: Option<f64>,
    ) -> ConversionResult<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(ConversionError::InvalidGrid("rows have different lengths".to_string()));
        }

        let values = rows.iter().flatten().copied().collect();
        Self::new(values, rows.len(), cols, transform, crs, nodata)
    }

    /// Attach the identifier of the source this grid was read from
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Cell size as `(width, height)` in native units
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.resolution()
    }

    pub fn crs(&self) -> CoordinateSystem {
        self.crs
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Identifier of the source the grid was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// One row of values
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.values[start..start + self.cols]
    }

    /// Whether `value` is the no-data sentinel (a NaN sentinel matches NaN cells)
    #[inline]
    pub fn is_nodata(&self, value: f64) -> bool {
        match self.nodata {
            Some(nodata) if nodata.is_nan() => value.is_nan(),
            Some(nodata) => value == nodata,
            None => false,
        }
    }

    /// Human-readable description of the grid
    pub fn summary(&self) -> String {
        let (res_x, res_y) = self.resolution();
        let mut result = format!("Raster: {}\n", self.source);
        result.push_str(&format!("  Dimensions: {} rows x {} columns ({} pixels)\n",
                                 self.rows, self.cols, self.len()));
        result.push_str(&format!("  CRS: {}\n", self.crs.description()));
        result.push_str(&format!("  Pixel size: {} x {}\n", res_x, res_y));
        result.push_str(&format!("  Origin: ({}, {})\n", self.transform.origin_x, self.transform.origin_y));
        match self.nodata {
            Some(nodata) => result.push_str(&format!("  NoData: {}\n", nodata)),
            None => result.push_str("  NoData: none\n"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_transform() -> GeoTransform {
        GeoTransform::new(0.0, 0.0, 1.0, 1.0)
    }

    #[test]
    fn test_from_rows_is_row_major() {
        let grid = RasterGrid::from_rows(
            &[vec![5.0, -1.0], vec![0.0, 3.0]],
            unit_transform(),
            CoordinateSystem::WGS84,
            Some(-1.0),
        ).unwrap();

        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 2);
        assert_eq!(grid.row(0), &[5.0, -1.0]);
        assert_eq!(grid.row(1), &[0.0, 3.0]);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let err = RasterGrid::new(vec![1.0; 3], 2, 2, unit_transform(), CoordinateSystem::WGS84, None)
            .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidGrid(_)));

        let ragged = RasterGrid::from_rows(
            &[vec![1.0, 2.0], vec![3.0]],
            unit_transform(),
            CoordinateSystem::WGS84,
            None,
        );
        assert!(ragged.is_err());
    }

    #[test]
    fn test_non_positive_resolution_is_rejected() {
        let result = RasterGrid::new(
            vec![1.0],
            1,
            1,
            GeoTransform::new(0.0, 0.0, 1.0, 0.0),
            CoordinateSystem::WGS84,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_nan_nodata_matches_nan_cells() {
        let grid = RasterGrid::new(vec![f64::NAN, 1.0], 1, 2, unit_transform(), CoordinateSystem::WGS84, Some(f64::NAN))
            .unwrap();
        assert!(grid.is_nodata(f64::NAN));
        assert!(!grid.is_nodata(1.0));

        let no_sentinel = RasterGrid::new(vec![0.0], 1, 1, unit_transform(), CoordinateSystem::WGS84, None).unwrap();
        assert!(!no_sentinel.is_nodata(0.0));
    }

    #[test]
    fn test_summary_mentions_crs_and_size() {
        let grid = RasterGrid::new(vec![1.0; 6], 2, 3, GeoTransform::new(0.0, 0.0, 100.0, 100.0), CoordinateSystem::Mollweide, None)
            .unwrap()
            .with_source("pop.tif");
        let summary = grid.summary();
        assert!(summary.contains("pop.tif"));
        assert!(summary.contains("2 rows x 3 columns (6 pixels)"));
        assert!(summary.contains("ESRI:54009"));
        assert!(summary.contains("100 x 100"));
    }
}
