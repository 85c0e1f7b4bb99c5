//! Merged-region extraction
//!
//! All connected regions are polygonised in native coordinates first, the
//! whole collection is then reprojected, and only then filtered. Memory
//! follows the number of regions in the grid, not the number accepted.

use log::info;

use super::extractor_strategy::{ExtractionContext, ExtractionStrategy};
use super::polygonize::polygonize;
use super::sink::{Feature, FeatureSink, FeatureValue, ExtractionOutput};
use crate::errors::{ConversionError, ConversionResult};
use crate::utils::progress::ProgressTracker;

/// One feature per connected region of equal value
#[derive(Debug, Default)]
pub struct MergedRegionsStrategy;

impl MergedRegionsStrategy {
    pub fn new() -> Self {
        MergedRegionsStrategy
    }
}

impl ExtractionStrategy for MergedRegionsStrategy {
    fn name(&self) -> &'static str {
        "merged regions"
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> ConversionResult<ExtractionOutput> {
        let grid = context.grid;
        let mut sink = FeatureSink::new();
        sink.visit(grid.len());

        let regions = polygonize(grid, context.config.exclude_zero);
        info!("Found {} connected regions.", regions.len());

        let progress = ProgressTracker::optional(
            context.config.show_progress,
            regions.len() as u64,
            "Reprojecting regions",
        );

        // Reproject the full collection before any filtering
        let mut reprojected = Vec::with_capacity(regions.len());
        for (index, region) in regions.into_iter().enumerate() {
            match region {
                Ok(region) => match context.transformer.transform_polygon(&region.polygon) {
                    Ok(polygon) => reprojected.push(Feature::new(polygon, FeatureValue::Scalar(region.value))),
                    Err(reason) => sink.skip(&ConversionError::region(index, reason)),
                },
                Err(e) => sink.skip(&e),
            }
            progress.increment(1);
        }
        progress.finish();

        for feature in reprojected {
            if context.filter.accepts(&feature.geometry) {
                sink.append(feature);
            }
        }

        Ok(sink.drain())
    }
}
