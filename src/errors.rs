//! Error types for raster-to-vector conversion
//!
//! Construction-time failures (projection, region, raster, config) abort a
//! run. `Geometry` errors are per cell or per region and are recovered by
//! the extraction strategies; they only surface through the run report.

use std::io;
use thiserror::Error;

/// Errors raised while converting a raster into vector features
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The native coordinate system cannot be resolved to a transform
    #[error("Unsupported projection {crs}: {reason}")]
    UnsupportedProjection { crs: String, reason: String },

    /// A single cell or region could not be turned into valid geometry
    #[error("Geometry error at {item}: {reason}")]
    Geometry { item: String, reason: String },

    /// The requested region of interest could not be loaded
    #[error("Failed to load region from {source_id}: {reason}")]
    RegionLoad { source_id: String, reason: String },

    /// The feature collection could not be persisted
    #[error("Failed to write features to {path}: {reason}")]
    Write { path: String, reason: String },

    /// The raster source could not be read
    #[error("Failed to read raster {source_id}: {reason}")]
    RasterRead { source_id: String, reason: String },

    /// The raster grid is internally inconsistent
    #[error("Invalid raster grid: {0}")]
    InvalidGrid(String),

    /// The run configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ConversionError {
    /// Per-cell geometry failure
    pub fn cell(row: usize, col: usize, reason: impl Into<String>) -> Self {
        ConversionError::Geometry {
            item: format!("cell ({}, {})", row, col),
            reason: reason.into(),
        }
    }

    /// Per-region geometry failure
    pub fn region(index: usize, reason: impl Into<String>) -> Self {
        ConversionError::Geometry {
            item: format!("region #{}", index),
            reason: reason.into(),
        }
    }

    /// Name the raster source in a projection error raised without one
    pub fn in_source(self, source_id: &str) -> Self {
        match self {
            ConversionError::UnsupportedProjection { crs, reason } if !source_id.is_empty() => {
                ConversionError::UnsupportedProjection {
                    crs: format!("{} of {}", crs, source_id),
                    reason,
                }
            }
            other => other,
        }
    }

    /// Whether the error is recoverable by skipping the offending item
    pub fn is_skippable(&self) -> bool {
        matches!(self, ConversionError::Geometry { .. })
    }
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;
