//! Feature accumulation
//!
//! The sink owns the features of one run in emission order, together with
//! the bookkeeping for skipped items. It is drained exactly once.

use geo::Polygon;
use log::debug;

use crate::errors::ConversionError;

/// Number of skipped item descriptions kept for diagnosis
pub const MAX_SKIPPED_ITEMS: usize = 100;

/// Value attached to an output feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    /// Truncated cell value of a per-cell square
    Count(i64),
    /// Shared value of a merged region
    Scalar(f64),
}

impl FeatureValue {
    /// JSON representation, `null` for non-finite scalars
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FeatureValue::Count(v) => serde_json::Value::from(*v),
            FeatureValue::Scalar(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

/// One output record: a polygon in the target system and its value
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Polygon<f64>,
    pub value: FeatureValue,
}

impl Feature {
    pub fn new(geometry: Polygon<f64>, value: FeatureValue) -> Self {
        Feature { geometry, value }
    }
}

/// Summary of a finished extraction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionReport {
    /// Number of features emitted
    pub features: usize,
    /// Number of cells or regions skipped on geometry errors
    pub skipped: usize,
    /// Descriptions of the first skipped items
    pub skipped_items: Vec<String>,
    /// Number of grid cells examined
    pub cells_visited: usize,
}

/// Drained feature collection plus its report
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub features: Vec<Feature>,
    pub report: ExtractionReport,
}

/// Append-only feature collection
#[derive(Debug, Default)]
pub struct FeatureSink {
    features: Vec<Feature>,
    skipped: usize,
    skipped_items: Vec<String>,
    cells_visited: usize,
}

impl FeatureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an accepted feature
    #[inline]
    pub fn append(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Record an item skipped because of a geometry error
    pub fn skip(&mut self, error: &ConversionError) {
        debug!("Skipping: {}", error);
        self.skipped += 1;
        if self.skipped_items.len() < MAX_SKIPPED_ITEMS {
            self.skipped_items.push(error.to_string());
        }
    }

    /// Count examined cells
    pub fn visit(&mut self, cells: usize) {
        self.cells_visited += cells;
    }

    /// Concatenate a worker's private sink after the current contents
    pub fn extend_shard(&mut self, shard: FeatureSink) {
        self.features.extend(shard.features);
        self.skipped += shard.skipped;
        self.cells_visited += shard.cells_visited;

        let room = MAX_SKIPPED_ITEMS.saturating_sub(self.skipped_items.len());
        self.skipped_items.extend(shard.skipped_items.into_iter().take(room));
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Hand the collection over, consuming the sink
    pub fn drain(self) -> ExtractionOutput {
        let report = ExtractionReport {
            features: self.features.len(),
            skipped: self.skipped,
            skipped_items: self.skipped_items,
            cells_visited: self.cells_visited,
        };

        ExtractionOutput {
            features: self.features,
            report,
        }
    }
}
