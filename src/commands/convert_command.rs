//! Raster to vector conversion command
//!
//! Reads the raster, extracts features with the configured strategy and
//! writes them as GeoJSON, reporting start, finish and elapsed time.

use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::ArgMatches;
use log::{info, warn};

use crate::api::{default_output_path, RasterVec};
use crate::commands::command_traits::Command;
use crate::config::RunConfig;
use crate::coordinate::BoundingBox;
use crate::errors::{ConversionError, ConversionResult};
use crate::region::RegionSource;

/// Command converting a raster into a GeoJSON feature collection
pub struct ConvertCommand {
    /// Path to the input raster
    input_file: String,
    /// Destination of the GeoJSON output
    output_file: PathBuf,
    /// Settings of the run
    config: RunConfig,
}

impl ConvertCommand {
    /// Create a new convert command
    ///
    /// Settings are taken from `--config` when given, then overridden by
    /// individual flags.
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    ///
    /// # Returns
    /// A new ConvertCommand instance or an error
    pub fn new(args: &ArgMatches) -> ConversionResult<Self> {
        let input_file = args.get_one::<String>("input")
            .ok_or_else(|| ConversionError::Config("Missing input file".to_string()))?
            .clone();

        let config = Self::build_config(args)?;

        let output_file = match args.get_one::<String>("output") {
            Some(path) => PathBuf::from(path),
            None => default_output_path(&input_file, config.strategy),
        };

        Ok(ConvertCommand {
            input_file,
            output_file,
            config,
        })
    }

    fn build_config(args: &ArgMatches) -> ConversionResult<RunConfig> {
        let mut config = match args.get_one::<String>("config") {
            Some(path) => {
                info!("Loading run configuration from {}", path);
                RunConfig::from_file(path)?
            },
            None => RunConfig::default(),
        };

        if let Some(strategy) = args.get_one::<String>("strategy") {
            config.strategy = strategy.parse()?;
        }
        if let Some(mode) = args.get_one::<String>("filter-mode") {
            config.filter_mode = mode.parse()?;
        }
        if let Some(bbox) = args.get_one::<String>("bbox") {
            config.region = Some(RegionSource::BoundingBox(BoundingBox::from_string(bbox)?));
        }
        if let Some(region) = args.get_one::<String>("region") {
            config.region = Some(RegionSource::GeoJsonFile(PathBuf::from(region)));
        }
        if let Some(property) = args.get_one::<String>("value-property") {
            config.set_value_property(property)?;
        }
        if args.get_flag("keep-zero") {
            config.exclude_zero = false;
        }
        if args.get_flag("parallel") {
            config.parallel = true;
        }
        config.show_progress = !args.get_flag("quiet");

        Ok(config)
    }

    fn unix_seconds() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl Command for ConvertCommand {
    fn execute(&self) -> ConversionResult<()> {
        let started = Instant::now();
        info!("Start time: {} (unix seconds)", Self::unix_seconds());
        info!("Strategy: {}; zero cells {}; region: {}",
              self.config.strategy,
              if self.config.exclude_zero { "excluded" } else { "kept" },
              self.config.region.as_ref().map(|r| r.describe()).unwrap_or_else(|| "none".to_string()));

        let report = RasterVec::new().convert_file(&self.input_file, Some(&self.output_file), &self.config)?;

        info!("Cells visited: {}; features written: {}.", report.cells_visited, report.features);
        if report.skipped > 0 {
            warn!("{} items were skipped on geometry errors.", report.skipped);
        }

        info!("Finish time: {} (unix seconds)", Self::unix_seconds());
        info!("Elapsed time: {:.2} s", started.elapsed().as_secs_f64());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::build_cli;
    use crate::config::{FilterMode, StrategyKind};

    fn command(args: &[&str]) -> ConversionResult<ConvertCommand> {
        let mut argv = vec!["rastervec"];
        argv.extend_from_slice(args);
        ConvertCommand::new(&build_cli().get_matches_from(argv))
    }

    #[test]
    fn test_flags_build_config() {
        let cmd = command(&[
            "pop.tif", "--strategy", "merged", "--filter-mode", "centroid",
            "--bbox", "-14.60,28.01,-13.72,28.78", "--keep-zero", "--parallel", "-q",
        ]).unwrap();

        assert_eq!(cmd.config.strategy, StrategyKind::MergedRegions);
        assert_eq!(cmd.config.filter_mode, FilterMode::CentroidContained);
        assert!(!cmd.config.exclude_zero);
        assert!(cmd.config.parallel);
        assert!(!cmd.config.show_progress);
        assert_eq!(
            cmd.config.region,
            Some(RegionSource::BoundingBox(BoundingBox::new(-14.60, 28.01, -13.72, 28.78)))
        );
        assert_eq!(cmd.output_file, PathBuf::from("pop.geojson"));
    }

    #[test]
    fn test_defaults_and_explicit_output() {
        let cmd = command(&["data/pop.tif"]).unwrap();
        assert_eq!(cmd.config.strategy, StrategyKind::PixelSquares);
        assert!(cmd.config.exclude_zero);
        assert_eq!(cmd.output_file, PathBuf::from("data/pop_pixel_squares_flt.geojson"));

        let cmd = command(&["pop.tif", "-o", "out.geojson", "--value-property", "people"]).unwrap();
        assert_eq!(cmd.output_file, PathBuf::from("out.geojson"));
        assert_eq!(cmd.config.value_property, "people");
    }

    #[test]
    fn test_empty_value_property_is_rejected() {
        let err = command(&["pop.tif", "--value-property", ""]).err().unwrap();
        assert!(matches!(err, ConversionError::Config(_)));
    }

    #[test]
    fn test_config_file_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("run.toml");
        std::fs::write(&config_path, "[run]\nstrategy = \"merged\"\nexclude_zero = false\n\n[region]\nfile = \"island.geojson\"\n").unwrap();

        let cmd = command(&["pop.tif", "--config", config_path.to_str().unwrap(), "--strategy", "pixel"]).unwrap();
        assert_eq!(cmd.config.strategy, StrategyKind::PixelSquares);
        assert!(!cmd.config.exclude_zero);
        assert_eq!(
            cmd.config.region,
            Some(RegionSource::GeoJsonFile(dir.path().join("island.geojson")))
        );
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(command(&["pop.tif", "--strategy", "hexagons"]).is_err());
        assert!(command(&["pop.tif", "--bbox", "1,2,3"]).is_err());
    }
}
