//! Raster grids and the readers that load them
//!
//! A `RasterGrid` is loaded once per run and read-only afterwards.

mod geotransform;
mod grid;
mod reader;

pub use geotransform::GeoTransform;
pub use grid::RasterGrid;
pub use reader::{GeoTiffReader, RasterReader};
