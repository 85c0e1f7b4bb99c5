//! Run configuration
//!
//! Every conversion takes an explicit `RunConfig`. Values come from the
//! defaults, an optional TOML file, and command-line overrides, in that
//! order.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::coordinate::BoundingBox;
use crate::errors::{ConversionError, ConversionResult};
use crate::region::RegionSource;

/// Default name of the value attribute written for each feature
pub const DEFAULT_VALUE_PROPERTY: &str = "population";

/// How a candidate geometry is tested against the region of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Keep geometries that share at least one point with the region
    #[default]
    Intersects,
    /// Keep geometries whose centroid lies in the region or on its boundary
    CentroidContained,
}

impl FromStr for FilterMode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "intersects" => Ok(FilterMode::Intersects),
            "centroid" | "centroid-contained" | "centroid_contained" => Ok(FilterMode::CentroidContained),
            other => Err(ConversionError::Config(format!(
                "Unknown filter mode '{}', expected 'intersects' or 'centroid'", other
            ))),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Intersects => write!(f, "intersects"),
            FilterMode::CentroidContained => write!(f, "centroid-contained"),
        }
    }
}

/// Which extraction strategy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// One square per qualifying cell
    #[default]
    PixelSquares,
    /// One polygon per connected region of equal value
    MergedRegions,
}

impl FromStr for StrategyKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pixel" | "pixels" | "pixel-squares" | "pixel_squares" => Ok(StrategyKind::PixelSquares),
            "merged" | "merged-regions" | "merged_regions" => Ok(StrategyKind::MergedRegions),
            other => Err(ConversionError::Config(format!(
                "Unknown strategy '{}', expected 'pixel' or 'merged'", other
            ))),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::PixelSquares => write!(f, "pixel squares"),
            StrategyKind::MergedRegions => write!(f, "merged regions"),
        }
    }
}

/// Settings for one conversion run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Optional region of interest
    pub region: Option<RegionSource>,
    pub filter_mode: FilterMode,
    /// Drop zero-valued cells
    pub exclude_zero: bool,
    pub strategy: StrategyKind,
    /// Shard the per-cell loop across worker threads
    pub parallel: bool,
    /// Name of the output value attribute
    pub value_property: String,
    pub show_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            region: None,
            filter_mode: FilterMode::default(),
            exclude_zero: true,
            strategy: StrategyKind::default(),
            parallel: false,
            value_property: DEFAULT_VALUE_PROPERTY.to_string(),
            show_progress: false,
        }
    }
}

impl RunConfig {
    /// Read a configuration file
    ///
    /// Relative region file paths are resolved against the directory of the
    /// configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConversionResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConversionError::Config(format!("Cannot read {}: {}", path.display(), e)))?;

        let mut config = Self::from_toml_str(&content)?;
        if let Some(RegionSource::GeoJsonFile(region_path)) = &mut config.region {
            if region_path.is_relative() {
                if let Some(parent) = path.parent() {
                    *region_path = parent.join(&*region_path);
                }
            }
        }
        Ok(config)
    }

    /// Set the output property name, which must not be empty
    pub fn set_value_property(&mut self, name: &str) -> ConversionResult<()> {
        if name.trim().is_empty() {
            return Err(ConversionError::Config("value_property must not be empty".to_string()));
        }
        self.value_property = name.to_string();
        Ok(())
    }

    /// Parse a configuration from TOML text
    ///
    /// Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> ConversionResult<Self> {
        let toml_value: toml::Value = content
            .parse()
            .map_err(|e| ConversionError::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut config = RunConfig::default();

        if let Some(run) = toml_value.get("run") {
            if let Some(strategy) = Self::get_str(run, "strategy")? {
                config.strategy = strategy.parse()?;
            }
            if let Some(mode) = Self::get_str(run, "filter_mode")? {
                config.filter_mode = mode.parse()?;
            }
            if let Some(exclude_zero) = Self::get_bool(run, "exclude_zero")? {
                config.exclude_zero = exclude_zero;
            }
            if let Some(parallel) = Self::get_bool(run, "parallel")? {
                config.parallel = parallel;
            }
            if let Some(show_progress) = Self::get_bool(run, "show_progress")? {
                config.show_progress = show_progress;
            }
            if let Some(property) = Self::get_str(run, "value_property")? {
                config.set_value_property(property)?;
            }
        }

        if let Some(region) = toml_value.get("region") {
            config.region = Some(Self::parse_region(region)?);
        }

        Ok(config)
    }

    fn parse_region(region: &toml::Value) -> ConversionResult<RegionSource> {
        match (region.get("bbox"), Self::get_str(region, "file")?) {
            (Some(_), Some(_)) => Err(ConversionError::Config(
                "[region] takes either 'bbox' or 'file', not both".to_string()
            )),
            (Some(bbox), None) => {
                let values = bbox.as_array()
                    .ok_or_else(|| ConversionError::Config("[region] bbox must be an array".to_string()))?
                    .iter()
                    .map(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
                    .collect::<Option<Vec<f64>>>()
                    .ok_or_else(|| ConversionError::Config("[region] bbox must hold numbers".to_string()))?;
                let bbox = BoundingBox::from_slice(&values)?;
                if !bbox.is_valid() {
                    return Err(ConversionError::Config(format!(
                        "[region] bbox is inverted or not finite: {:?}", values
                    )));
                }
                Ok(RegionSource::BoundingBox(bbox))
            },
            (None, Some(file)) => Ok(RegionSource::GeoJsonFile(PathBuf::from(file))),
            (None, None) => Err(ConversionError::Config("[region] needs 'bbox' or 'file'".to_string())),
        }
    }

    fn get_str<'a>(table: &'a toml::Value, key: &str) -> ConversionResult<Option<&'a str>> {
        match table.get(key) {
            None => Ok(None),
            Some(value) => value.as_str()
                .map(Some)
                .ok_or_else(|| ConversionError::Config(format!("'{}' must be a string", key))),
        }
    }

    fn get_bool(table: &toml::Value, key: &str) -> ConversionResult<Option<bool>> {
        match table.get(key) {
            None => Ok(None),
            Some(value) => value.as_bool()
                .map(Some)
                .ok_or_else(|| ConversionError::Config(format!("'{}' must be true or false", key))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert!(config.exclude_zero);
        assert_eq!(config.strategy, StrategyKind::PixelSquares);
        assert_eq!(config.filter_mode, FilterMode::Intersects);
        assert_eq!(config.value_property, "population");
        assert!(config.region.is_none());
        assert!(!config.parallel);
    }

    #[test]
    fn test_full_toml() {
        let config = RunConfig::from_toml_str(r#"
            [run]
            strategy = "merged"
            filter_mode = "centroid"
            exclude_zero = false
            parallel = true
            value_property = "pop"

            [region]
            bbox = [-14.60, 28.01, -13.72, 28.78]
        "#).unwrap();

        assert_eq!(config.strategy, StrategyKind::MergedRegions);
        assert_eq!(config.filter_mode, FilterMode::CentroidContained);
        assert!(!config.exclude_zero);
        assert!(config.parallel);
        assert_eq!(config.value_property, "pop");
        assert_eq!(
            config.region,
            Some(RegionSource::BoundingBox(BoundingBox::new(-14.60, 28.01, -13.72, 28.78)))
        );
    }

    #[test]
    fn test_region_file_and_integer_bbox() {
        let config = RunConfig::from_toml_str("[region]\nfile = \"island.geojson\"").unwrap();
        assert_eq!(config.region, Some(RegionSource::GeoJsonFile(PathBuf::from("island.geojson"))));

        let config = RunConfig::from_toml_str("[region]\nbbox = [0, 0, 1, 1]").unwrap();
        assert!(matches!(config.region, Some(RegionSource::BoundingBox(_))));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for text in [
            "[run]\nstrategy = \"hexagons\"",
            "[run]\nfilter_mode = \"within\"",
            "[run]\nexclude_zero = \"yes\"",
            "[run]\nvalue_property = \"\"",
            "[region]\nbbox = [1, 2, 3]",
            "[region]\nbbox = [2, 0, 1, 1]",
            "[region]\nbbox = [0, 0, 1, 1]\nfile = \"a.geojson\"",
            "[region]",
            "not = [valid",
        ] {
            let err = RunConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, ConversionError::Config(_)), "{} gave {:?}", text, err);
        }
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("Intersects".parse::<FilterMode>().unwrap(), FilterMode::Intersects);
        assert_eq!("centroid-contained".parse::<FilterMode>().unwrap(), FilterMode::CentroidContained);
        assert_eq!("pixel".parse::<StrategyKind>().unwrap(), StrategyKind::PixelSquares);
        assert_eq!(FilterMode::CentroidContained.to_string(), "centroid-contained");
    }
}
