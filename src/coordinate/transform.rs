//! Coordinate transformation functionality
//!
//! A `CoordinateTransformer` is built once per run from the raster's native
//! coordinate system and reused for every point. Construction resolves the
//! PROJ definitions; per-point calls do no setup work.

use std::f64::consts::PI;
use std::fmt;

use geo::{Coord, LineString, Polygon};
use log::debug;
use proj4rs::proj::Proj;

use super::crs::CoordinateSystem;
use crate::errors::{ConversionError, ConversionResult};

/// Earth radius in meters used by the spherical Web Mercator formulas
pub const EARTH_RADIUS: f64 = 6378137.0;

/// How points are moved between the two systems
enum TransformStrategy {
    /// Source and target are the same system
    Identity,
    /// Closed-form spherical Web Mercator to WGS84
    WebMercatorToWgs84,
    /// General case handled by proj4rs
    Proj4rs {
        source: Box<Proj>,
        target: Box<Proj>,
        source_is_geographic: bool,
        target_is_geographic: bool,
    },
}

/// Transformer for converting points from a native system to a target system
pub struct CoordinateTransformer {
    source_crs: CoordinateSystem,
    target_crs: CoordinateSystem,
    strategy: TransformStrategy,
}

impl fmt::Debug for CoordinateTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinateTransformer")
            .field("source_crs", &self.source_crs)
            .field("target_crs", &self.target_crs)
            .finish_non_exhaustive()
    }
}

impl CoordinateTransformer {
    /// Create a transformer from `source_crs` into `target_crs`
    ///
    /// # Errors
    /// `UnsupportedProjection` if either system has no known definition or
    /// its definition cannot be initialised.
    pub fn new(source_crs: CoordinateSystem, target_crs: CoordinateSystem) -> ConversionResult<Self> {
        let strategy = if source_crs == target_crs {
            TransformStrategy::Identity
        } else if source_crs == CoordinateSystem::WebMercator && target_crs == CoordinateSystem::WGS84 {
            TransformStrategy::WebMercatorToWgs84
        } else {
            TransformStrategy::Proj4rs {
                source: Box::new(Self::init_proj(&source_crs)?),
                target: Box::new(Self::init_proj(&target_crs)?),
                source_is_geographic: source_crs.is_geographic(),
                target_is_geographic: target_crs.is_geographic(),
            }
        };

        debug!("Built coordinate transformer {} -> {}", source_crs, target_crs);

        Ok(CoordinateTransformer {
            source_crs,
            target_crs,
            strategy,
        })
    }

    /// Create a transformer from a native system into WGS84 longitude/latitude
    pub fn to_wgs84(source_crs: CoordinateSystem) -> ConversionResult<Self> {
        Self::new(source_crs, CoordinateSystem::WGS84)
    }

    fn init_proj(crs: &CoordinateSystem) -> ConversionResult<Proj> {
        let definition = crs.proj_string().ok_or_else(|| ConversionError::UnsupportedProjection {
            crs: crs.identifier(),
            reason: "no PROJ definition is known for this coordinate system".to_string(),
        })?;

        Proj::from_proj_string(&definition).map_err(|e| ConversionError::UnsupportedProjection {
            crs: crs.identifier(),
            reason: format!("invalid PROJ definition '{}': {:?}", definition, e),
        })
    }

    /// Source coordinate system
    pub fn source_crs(&self) -> CoordinateSystem {
        self.source_crs
    }

    /// Target coordinate system
    pub fn target_crs(&self) -> CoordinateSystem {
        self.target_crs
    }

    /// Whether points pass through unchanged
    pub fn is_identity(&self) -> bool {
        matches!(self.strategy, TransformStrategy::Identity)
    }

    /// Transform a single point
    ///
    /// Returns a description of the failure when the underlying transform
    /// fails or produces a non-finite coordinate.
    #[inline]
    pub fn transform(&self, x: f64, y: f64) -> Result<Coord<f64>, String> {
        let (out_x, out_y) = match &self.strategy {
            TransformStrategy::Identity => (x, y),
            TransformStrategy::WebMercatorToWgs84 => web_mercator_to_wgs84(x, y),
            TransformStrategy::Proj4rs { source, target, source_is_geographic, target_is_geographic } => {
                let mut point = if *source_is_geographic {
                    (x.to_radians(), y.to_radians(), 0.0)
                } else {
                    (x, y, 0.0)
                };

                proj4rs::transform::transform(source, target, &mut point)
                    .map_err(|e| format!("transform of ({}, {}) failed: {:?}", x, y, e))?;

                if *target_is_geographic {
                    (point.0.to_degrees(), point.1.to_degrees())
                } else {
                    (point.0, point.1)
                }
            },
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(format!("transform of ({}, {}) produced non-finite ({}, {})", x, y, out_x, out_y));
        }

        Ok(Coord { x: out_x, y: out_y })
    }

    /// Transform every vertex of a polygon
    pub fn transform_polygon(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>, String> {
        if self.is_identity() {
            return Ok(polygon.clone());
        }

        let exterior = self.transform_ring(polygon.exterior())?;
        let interiors = polygon
            .interiors()
            .iter()
            .map(|ring| self.transform_ring(ring))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Polygon::new(exterior, interiors))
    }

    fn transform_ring(&self, ring: &LineString<f64>) -> Result<LineString<f64>, String> {
        ring.coords()
            .map(|c| self.transform(c.x, c.y))
            .collect::<Result<Vec<_>, _>>()
            .map(LineString::from)
    }
}

/// Convert from Web Mercator (EPSG:3857) to WGS84 (EPSG:4326)
fn web_mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 180.0 / (EARTH_RADIUS * PI);
    let lat = 180.0 / PI * (2.0 * f64::atan(f64::exp(y / EARTH_RADIUS)) - PI / 2.0);
    (lon, lat)
}
