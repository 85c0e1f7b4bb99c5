//! Coordinate handling for geospatial data
//!
//! This module provides the coordinate systems a raster can be stored in,
//! the transformer that moves points into WGS84, and bounding boxes.

mod bbox;
mod transform;
mod crs;

// Re-export key types
pub use self::bbox::BoundingBox;
pub use self::transform::{CoordinateTransformer, EARTH_RADIUS};
pub use self::crs::{Authority, CoordinateSystem};
