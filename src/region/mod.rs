//! Region of interest loading
//!
//! A region is a single polygon expressed in WGS84 longitude/latitude. It is
//! either an axis-aligned bounding box or the first feature of a GeoJSON
//! file.

use std::fs;
use std::path::PathBuf;

use geo::{Geometry, Polygon};
use geojson::GeoJson;
use log::{debug, info};

use crate::coordinate::BoundingBox;
use crate::errors::{ConversionError, ConversionResult};

/// Where the region of interest comes from
#[derive(Debug, Clone, PartialEq)]
pub enum RegionSource {
    /// Axis-aligned box `(min_x, min_y, max_x, max_y)`
    BoundingBox(BoundingBox),
    /// First polygon feature of a GeoJSON file
    GeoJsonFile(PathBuf),
}

impl RegionSource {
    /// Identifier used in log lines and error messages
    pub fn describe(&self) -> String {
        match self {
            RegionSource::BoundingBox(bbox) => format!(
                "bbox({}, {}, {}, {})", bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
            ),
            RegionSource::GeoJsonFile(path) => path.display().to_string(),
        }
    }

    /// Load the region polygon
    ///
    /// # Returns
    /// The polygon in WGS84, or a `RegionLoad` error naming the source
    pub fn load(&self) -> ConversionResult<Polygon<f64>> {
        let polygon = match self {
            RegionSource::BoundingBox(bbox) => {
                if !bbox.is_valid() {
                    return Err(self.load_error("bounds must be finite with min <= max"));
                }
                bbox.to_polygon()
            },
            RegionSource::GeoJsonFile(path) => {
                let text = fs::read_to_string(path)
                    .map_err(|e| self.load_error(e.to_string()))?;
                self.parse_geojson(&text)?
            },
        };

        info!("Region of interest loaded from {} ({} vertices).",
              self.describe(), polygon.exterior().0.len());
        Ok(polygon)
    }

    fn load_error(&self, reason: impl Into<String>) -> ConversionError {
        ConversionError::RegionLoad {
            source_id: self.describe(),
            reason: reason.into(),
        }
    }

    fn parse_geojson(&self, text: &str) -> ConversionResult<Polygon<f64>> {
        let geojson = text.parse::<GeoJson>()
            .map_err(|e| self.load_error(format!("invalid GeoJSON: {}", e)))?;

        let geometry = match geojson {
            GeoJson::FeatureCollection(collection) => {
                if collection.features.len() > 1 {
                    debug!("Region file has {} features, using the first", collection.features.len());
                }
                collection.features
                    .into_iter()
                    .next()
                    .ok_or_else(|| self.load_error("feature collection is empty"))?
                    .geometry
            },
            GeoJson::Feature(feature) => feature.geometry,
            GeoJson::Geometry(geometry) => Some(geometry),
        }
        .ok_or_else(|| self.load_error("feature has no geometry"))?;

        let geometry = Geometry::<f64>::try_from(geometry.value)
            .map_err(|e| self.load_error(e.to_string()))?;

        match geometry {
            Geometry::Polygon(polygon) => Ok(polygon),
            Geometry::MultiPolygon(multi) if multi.0.len() == 1 => {
                multi.0.into_iter().next().ok_or_else(|| self.load_error("empty multipolygon"))
            },
            Geometry::MultiPolygon(multi) => Err(self.load_error(format!(
                "multipolygon with {} parts is not a single region", multi.0.len()
            ))),
            _ => Err(self.load_error("geometry is not a polygon")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_region(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_bbox_region() {
        let source = RegionSource::BoundingBox(BoundingBox::new(-14.6, 28.01, -13.72, 28.78));
        let polygon = source.load().unwrap();
        assert_eq!(polygon.exterior().0.len(), 5);
        assert!(polygon.interiors().is_empty());
    }

    #[test]
    fn test_inverted_bbox_is_region_error() {
        let source = RegionSource::BoundingBox(BoundingBox::new(1.0, 0.0, 0.0, 1.0));
        let err = source.load().unwrap_err();
        assert!(matches!(err, ConversionError::RegionLoad { .. }));
        assert!(err.to_string().contains("bbox(1, 0, 0, 1)"));
    }

    #[test]
    fn test_first_feature_of_collection() {
        let file = write_region(r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "island"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[5,5],[6,5],[6,6],[5,5]]]}}
            ]
        }"#);

        let polygon = RegionSource::GeoJsonFile(file.path().to_path_buf()).load().unwrap();
        assert_eq!(polygon.exterior().0[2].x, 2.0);
    }

    #[test]
    fn test_single_part_multipolygon_is_accepted() {
        let file = write_region(r#"{"type": "MultiPolygon",
            "coordinates": [[[[0,0],[1,0],[1,1],[0,0]]]]}"#);
        assert!(RegionSource::GeoJsonFile(file.path().to_path_buf()).load().is_ok());
    }

    #[test]
    fn test_unusable_regions_are_errors() {
        let point = write_region(r#"{"type": "Point", "coordinates": [1, 2]}"#);
        let multi = write_region(r#"{"type": "MultiPolygon", "coordinates": [
            [[[0,0],[1,0],[1,1],[0,0]]], [[[5,5],[6,5],[6,6],[5,5]]]]}"#);
        let garbage = write_region("not json");
        let empty = write_region(r#"{"type": "FeatureCollection", "features": []}"#);

        for file in [&point, &multi, &garbage, &empty] {
            let err = RegionSource::GeoJsonFile(file.path().to_path_buf()).load().unwrap_err();
            assert!(matches!(err, ConversionError::RegionLoad { .. }), "unexpected {:?}", err);
        }

        let missing = RegionSource::GeoJsonFile(PathBuf::from("/nonexistent/region.geojson"));
        assert!(missing.load().is_err());
    }
}
