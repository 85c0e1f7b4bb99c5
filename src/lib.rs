//! rastervec: raster grids to vector polygons
//!
//! Converts a gridded raster of per-cell values (population counts, for
//! instance) into polygons with an attached value, restricted to a region
//! of interest and reprojected into WGS84.
//!
//! Two strategies are available: one square per qualifying cell, or one
//! polygon per connected region of equal value.

pub mod errors;
pub mod coordinate;
pub mod raster;
pub mod region;
pub mod config;
pub mod extractor;
pub mod writer;
pub mod utils;
pub mod commands;
pub mod cli;
pub mod api;

// Re-export main components for easier access
pub use crate::api::{RasterVec, TARGET_CRS};
pub use crate::config::{FilterMode, RunConfig, StrategyKind};
pub use crate::errors::{ConversionError, ConversionResult};
pub use crate::extractor::{ExtractionOutput, ExtractionReport, Feature, FeatureValue};
pub use crate::raster::{GeoTransform, RasterGrid};
pub use crate::region::RegionSource;
