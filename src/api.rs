use std::path::{Path, PathBuf};
use log::info;

use crate::config::{RunConfig, StrategyKind};
use crate::coordinate::CoordinateSystem;
use crate::errors::ConversionResult;
use crate::extractor::{ExtractionOutput, ExtractionReport, FeatureExtractor};
use crate::raster::{GeoTiffReader, RasterGrid, RasterReader};
use crate::writer::{FeatureWriter, GeoJsonWriter};

/// Output system of every conversion
pub const TARGET_CRS: CoordinateSystem = CoordinateSystem::WGS84;

/// Main interface to the RasterVec library
///
/// Holds no state between calls; every conversion takes its own `RunConfig`.
pub struct RasterVec {
    reader: Box<dyn RasterReader>,
}

impl Default for RasterVec {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterVec {
    /// Create an instance reading GeoTIFF rasters
    pub fn new() -> Self {
        RasterVec {
            reader: Box::new(GeoTiffReader::new()),
        }
    }

    /// Create an instance with a custom raster reader
    pub fn with_reader(reader: Box<dyn RasterReader>) -> Self {
        RasterVec { reader }
    }

    /// Read a raster and describe it
    ///
    /// # Arguments
    /// * `input_path` - Raster source to inspect
    ///
    /// # Returns
    /// The grid summary or an error
    pub fn inspect(&self, input_path: &str) -> ConversionResult<String> {
        let grid = self.reader.read(input_path)?;
        Ok(grid.summary())
    }

    /// Convert an in-memory grid into features
    ///
    /// # Arguments
    /// * `grid` - Grid to convert
    /// * `config` - Settings of this run
    ///
    /// # Returns
    /// The accepted features in WGS84 and the run report
    pub fn convert_grid(&self, grid: &RasterGrid, config: &RunConfig) -> ConversionResult<ExtractionOutput> {
        FeatureExtractor::new(config).extract(grid)
    }

    /// Convert a raster file and write the features as GeoJSON
    ///
    /// Nothing is written when any step fails.
    ///
    /// # Arguments
    /// * `input_path` - Raster source
    /// * `output_path` - Destination, or `None` for the default name
    /// * `config` - Settings of this run
    ///
    /// # Returns
    /// The run report or an error
    pub fn convert_file(
        &self,
        input_path: &str,
        output_path: Option<&Path>,
        config: &RunConfig,
    ) -> ConversionResult<ExtractionReport> {
        info!("Processing raster file {}", input_path);

        let grid = self.reader.read(input_path)?;
        let output = self.convert_grid(&grid, config)?;

        let output_path = match output_path {
            Some(path) => path.to_path_buf(),
            None => default_output_path(input_path, config.strategy),
        };

        info!("Saving GeoJSON output to {}", output_path.display());
        GeoJsonWriter::new(&config.value_property).write(&output.features, TARGET_CRS, &output_path)?;

        Ok(output.report)
    }
}

/// Output path used when none is given
///
/// `<stem>_pixel_squares_flt.geojson` for pixel squares and
/// `<stem>.geojson` for merged regions, next to the input.
pub fn default_output_path(input_path: &str, strategy: StrategyKind) -> PathBuf {
    let input = Path::new(input_path);
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let file_name = match strategy {
        StrategyKind::PixelSquares => format!("{}_pixel_squares_flt.geojson", stem),
        StrategyKind::MergedRegions => format!("{}.geojson", stem),
    };

    input.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_paths() {
        assert_eq!(
            default_output_path("data/GHS_POP_E2030.tif", StrategyKind::PixelSquares),
            PathBuf::from("data/GHS_POP_E2030_pixel_squares_flt.geojson")
        );
        assert_eq!(
            default_output_path("pop.tif", StrategyKind::MergedRegions),
            PathBuf::from("pop.geojson")
        );
    }

    #[test]
    fn test_inspect_missing_file_fails() {
        assert!(RasterVec::new().inspect("/nonexistent/pop.tif").is_err());
    }
}
