//! Feature collection writers
//!
//! Writers persist a drained feature collection. Output is staged in a
//! temporary file next to the destination and renamed into place, so a
//! failed write leaves nothing at the target path.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use geojson::{FeatureCollection, Geometry, JsonObject, JsonValue};
use log::info;
use serde_json::json;

use crate::config::DEFAULT_VALUE_PROPERTY;
use crate::coordinate::CoordinateSystem;
use crate::errors::{ConversionError, ConversionResult};
use crate::extractor::Feature;

/// Persists a feature collection
pub trait FeatureWriter {
    /// Write `features`, expressed in `target_crs`, to `path`
    fn write(&self, features: &[Feature], target_crs: CoordinateSystem, path: &Path) -> ConversionResult<()>;
}

/// GeoJSON FeatureCollection writer
#[derive(Debug, Clone)]
pub struct GeoJsonWriter {
    value_property: String,
}

impl Default for GeoJsonWriter {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE_PROPERTY)
    }
}

impl GeoJsonWriter {
    /// Create a writer storing each feature's value under `value_property`
    pub fn new(value_property: &str) -> Self {
        GeoJsonWriter {
            value_property: value_property.to_string(),
        }
    }

    /// Build the in-memory collection
    pub fn to_collection(&self, features: &[Feature], target_crs: CoordinateSystem) -> FeatureCollection {
        let features = features
            .iter()
            .map(|feature| {
                let mut properties = JsonObject::new();
                properties.insert(self.value_property.clone(), feature.value.to_json());

                geojson::Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::from(&feature.geometry))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut foreign_members = JsonObject::new();
        foreign_members.insert(
            "crs".to_string(),
            json!({"type": "name", "properties": {"name": target_crs.urn()}}),
        );

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }
    }

    fn write_error(path: &Path, reason: impl Into<String>) -> ConversionError {
        ConversionError::Write {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl FeatureWriter for GeoJsonWriter {
    fn write(&self, features: &[Feature], target_crs: CoordinateSystem, path: &Path) -> ConversionResult<()> {
        let collection = self.to_collection(features, target_crs);

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.is_dir() {
            return Err(Self::write_error(path, format!("directory {} does not exist", dir.display())));
        }

        let staged = tempfile::Builder::new()
            .prefix(".rastervec-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| Self::write_error(path, e.to_string()))?;

        {
            let mut out = BufWriter::new(staged.as_file());
            serde_json::to_writer(&mut out, &collection)
                .map_err(|e| Self::write_error(path, e.to_string()))?;
            out.flush().map_err(|e| Self::write_error(path, e.to_string()))?;
        }
        staged.as_file()
            .sync_all()
            .map_err(|e| Self::write_error(path, e.to_string()))?;

        // Dropping the staged file on any error above removes it
        staged.persist(path)
            .map_err(|e| Self::write_error(path, e.error.to_string()))?;

        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        info!("Wrote {} features ({} bytes) to {}.", features.len(), size, path.display());
        Ok(())
    }
}

/// Parse a written collection back, mostly for checks and tests
pub fn read_collection(path: &Path) -> ConversionResult<FeatureCollection> {
    let text = fs::read_to_string(path)?;
    let value: JsonValue = serde_json::from_str(&text)
        .map_err(|e| ConversionError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    FeatureCollection::try_from(value)
        .map_err(|e| ConversionError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::FeatureValue;
    use geo::{coord, Rect};

    fn features() -> Vec<Feature> {
        vec![
            Feature::new(
                Rect::new(coord! { x: 0.0, y: 1.0 }, coord! { x: 1.0, y: 2.0 }).to_polygon(),
                FeatureValue::Count(5),
            ),
            Feature::new(
                Rect::new(coord! { x: 1.0, y: 0.0 }, coord! { x: 2.0, y: 1.0 }).to_polygon(),
                FeatureValue::Count(3),
            ),
        ]
    }

    #[test]
    fn test_collection_properties_and_crs() {
        let collection = GeoJsonWriter::new("pop").to_collection(&features(), CoordinateSystem::WGS84);
        assert_eq!(collection.features.len(), 2);

        let props = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(props["pop"], json!(5));

        let crs = &collection.foreign_members.as_ref().unwrap()["crs"];
        assert_eq!(crs["properties"]["name"], json!("urn:ogc:def:crs:EPSG::4326"));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");

        GeoJsonWriter::default().write(&features(), CoordinateSystem::WGS84, &path).unwrap();

        let collection = read_collection(&path).unwrap();
        assert_eq!(collection.features.len(), 2);
        assert_eq!(collection.features[1].property("population"), Some(&json!(3)));

        // Only the output file remains in the directory
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_directory_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.geojson");

        let err = GeoJsonWriter::default()
            .write(&features(), CoordinateSystem::WGS84, &path)
            .unwrap_err();
        assert!(matches!(err, ConversionError::Write { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_collection_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.geojson");
        GeoJsonWriter::default().write(&[], CoordinateSystem::WGS84, &path).unwrap();
        assert!(read_collection(&path).unwrap().features.is_empty());
    }
}
