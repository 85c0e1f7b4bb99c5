//! Feature extraction from raster grids
//!
//! Two strategies share one region filter and coordinate transformer:
//! per-cell squares and merged same-value regions.

mod cell;
mod filter;
mod sink;
mod polygonize;
mod extractor_strategy;
mod pixel_strategy;
mod merged_strategy;

// Public exports
pub use cell::{qualifies, surviving_cells, CellCandidate, CellGeometryBuilder};
pub use filter::{accepts, RegionFilter};
pub use sink::{ExtractionOutput, ExtractionReport, Feature, FeatureSink, FeatureValue, MAX_SKIPPED_ITEMS};
pub use polygonize::{label_components, polygonize, Components, RegionPolygon};
pub use extractor_strategy::{ExtractionContext, ExtractionStrategy, ExtractionStrategyFactory};
pub use pixel_strategy::PixelSquaresStrategy;
pub use merged_strategy::MergedRegionsStrategy;

// Simple facade that builds the transformer and filter and runs a strategy
pub use extractor_strategy::FeatureExtractor;
