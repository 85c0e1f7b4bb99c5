//! Per-cell ("pixel squares") extraction
//!
//! Qualifying cells are produced lazily, turned into target-system squares
//! and filtered before anything is stored, so memory follows the number of
//! accepted cells. Rows can be sharded across rayon workers; each shard fills
//! a private sink and shards are concatenated in row order.

use std::ops::Range;

use log::{debug, info};
use rayon::prelude::*;

use super::cell::{surviving_cells, CellGeometryBuilder};
use super::extractor_strategy::{ExtractionContext, ExtractionStrategy};
use super::sink::{Feature, FeatureSink, FeatureValue, ExtractionOutput};
use crate::errors::ConversionResult;
use crate::utils::progress::ProgressTracker;

/// Shards handed to each worker thread, on average
const SHARDS_PER_THREAD: usize = 4;

/// One feature per qualifying cell
#[derive(Debug, Default)]
pub struct PixelSquaresStrategy;

impl PixelSquaresStrategy {
    pub fn new() -> Self {
        PixelSquaresStrategy
    }

    /// Process a contiguous range of rows into a private sink
    fn extract_rows(
        &self,
        context: &ExtractionContext<'_>,
        rows: Range<usize>,
        progress: &ProgressTracker,
    ) -> FeatureSink {
        let grid = context.grid;
        let builder = CellGeometryBuilder::new(*grid.transform(), context.transformer);
        let exclude_zero = context.config.exclude_zero;
        let mut sink = FeatureSink::new();

        for row in rows {
            for cell in surviving_cells(grid, row..row + 1, exclude_zero) {
                match builder.build(cell.row, cell.col) {
                    Ok(square) => {
                        if context.filter.accepts(&square) {
                            // Truncation toward zero
                            sink.append(Feature::new(square, FeatureValue::Count(cell.value as i64)));
                        }
                    },
                    Err(e) => sink.skip(&e),
                }
            }
            sink.visit(grid.cols());
            progress.increment(1);
        }

        sink
    }

    /// Split `0..rows` into contiguous ranges for the worker pool
    fn shard_ranges(rows: usize) -> Vec<Range<usize>> {
        let shards = (rayon::current_num_threads() * SHARDS_PER_THREAD).max(1);
        let shard_rows = rows.div_ceil(shards).max(1);

        (0..rows)
            .step_by(shard_rows)
            .map(|start| start..(start + shard_rows).min(rows))
            .collect()
    }
}

impl ExtractionStrategy for PixelSquaresStrategy {
    fn name(&self) -> &'static str {
        "pixel squares"
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> ConversionResult<ExtractionOutput> {
        let grid = context.grid;
        let progress = ProgressTracker::optional(
            context.config.show_progress,
            grid.rows() as u64,
            "Scanning raster rows",
        );

        let sink = if context.config.parallel {
            let ranges = Self::shard_ranges(grid.rows());
            info!("Processing {} rows in {} shards on {} threads.",
                  grid.rows(), ranges.len(), rayon::current_num_threads());

            let shards: Vec<FeatureSink> = ranges
                .into_par_iter()
                .map(|range| self.extract_rows(context, range, &progress))
                .collect();

            let mut sink = FeatureSink::new();
            for (i, shard) in shards.into_iter().enumerate() {
                debug!("Shard {} contributed {} features", i, shard.len());
                sink.extend_shard(shard);
            }
            sink
        } else {
            self.extract_rows(context, 0..grid.rows(), &progress)
        };

        progress.finish();
        Ok(sink.drain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_ranges_cover_rows_in_order() {
        for rows in [0, 1, 7, 100, 1001] {
            let ranges = PixelSquaresStrategy::shard_ranges(rows);
            let covered: Vec<usize> = ranges.iter().cloned().flatten().collect();
            assert_eq!(covered, (0..rows).collect::<Vec<_>>());
            assert!(ranges.iter().all(|r| !r.is_empty()));
        }
    }
}
