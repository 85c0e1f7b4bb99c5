//! Extraction strategy definitions
//!
//! Both strategies share the coordinate transformer and region filter of a
//! run and differ only in how they iterate the grid and when they
//! materialise features.

use geo::Polygon;
use log::{info, warn};

use crate::config::{RunConfig, StrategyKind};
use crate::coordinate::CoordinateTransformer;
use crate::errors::ConversionResult;
use crate::raster::RasterGrid;

use super::filter::RegionFilter;
use super::merged_strategy::MergedRegionsStrategy;
use super::pixel_strategy::PixelSquaresStrategy;
use super::sink::ExtractionOutput;

/// Everything a strategy needs for one run, borrowed read-only
pub struct ExtractionContext<'a> {
    pub grid: &'a RasterGrid,
    pub transformer: &'a CoordinateTransformer,
    pub filter: &'a RegionFilter,
    pub config: &'a RunConfig,
}

/// A way of turning a grid into features
///
/// Geometry errors on single cells or regions are recovered inside the
/// strategy and reported through the output's report.
pub trait ExtractionStrategy {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Run the extraction
    ///
    /// # Arguments
    /// * `context` - Grid, transformer, filter and settings of the run
    ///
    /// # Returns
    /// The accepted features in emission order and the run report
    fn extract(&self, context: &ExtractionContext<'_>) -> ConversionResult<ExtractionOutput>;
}

/// Factory for extraction strategies
pub struct ExtractionStrategyFactory;

impl ExtractionStrategyFactory {
    /// Create the strategy selected by `kind`
    pub fn create_strategy(kind: StrategyKind) -> Box<dyn ExtractionStrategy> {
        match kind {
            StrategyKind::PixelSquares => Box::new(PixelSquaresStrategy::new()),
            StrategyKind::MergedRegions => Box::new(MergedRegionsStrategy::new()),
        }
    }
}

/// Drives one extraction: transformer, region, strategy
pub struct FeatureExtractor<'a> {
    config: &'a RunConfig,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        FeatureExtractor { config }
    }

    /// Extract features, loading the region named by the configuration
    pub fn extract(&self, grid: &RasterGrid) -> ConversionResult<ExtractionOutput> {
        let region = match &self.config.region {
            Some(source) => Some(source.load()?),
            None => None,
        };
        self.extract_with_region(grid, region)
    }

    /// Extract features against an already loaded region
    ///
    /// The transformer is built before any cell is visited, so an
    /// unsupported native system aborts the run without output.
    pub fn extract_with_region(
        &self,
        grid: &RasterGrid,
        region: Option<Polygon<f64>>,
    ) -> ConversionResult<ExtractionOutput> {
        let transformer = CoordinateTransformer::to_wgs84(grid.crs())
            .map_err(|e| e.in_source(grid.source()))?;
        let filter = RegionFilter::new(region, self.config.filter_mode);
        let strategy = ExtractionStrategyFactory::create_strategy(self.config.strategy);

        info!("Extracting {} from {} ({} -> {}).",
              strategy.name(), grid.source(), transformer.source_crs(), transformer.target_crs());
        if filter.region().is_some() {
            info!("Filtering with mode '{}'.", filter.mode());
        }

        let context = ExtractionContext {
            grid,
            transformer: &transformer,
            filter: &filter,
            config: self.config,
        };
        let output = strategy.extract(&context)?;

        info!("Number of features extracted after filtering: {}.", output.report.features);
        if output.report.skipped > 0 {
            warn!("Skipped {} items on geometry errors, first: {}",
                  output.report.skipped,
                  output.report.skipped_items.first().map(String::as_str).unwrap_or("-"));
        }

        Ok(output)
    }
}
