//! Command-line definition shared by the binary and the command tests

use clap::{Arg, ArgAction, Command as ClapCommand};

/// Build the argument parser
pub fn build_cli() -> ClapCommand {
    ClapCommand::new("rastervec")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert gridded rasters into GeoJSON polygons in WGS84")
        .arg(
            Arg::new("input")
                .help("Input GeoTIFF raster")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output GeoJSON file (defaults to a name derived from the input)")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("info")
                .long("info")
                .help("Print raster metadata and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("strategy")
                .long("strategy")
                .help("Extraction strategy (pixel or merged)")
                .value_name("STRATEGY")
                .required(false),
        )
        .arg(
            Arg::new("bbox")
                .long("bbox")
                .help("Region of interest in WGS84 (minx,miny,maxx,maxy)")
                .value_name("BBOX")
                .allow_hyphen_values(true)
                .conflicts_with("region")
                .required(false),
        )
        .arg(
            Arg::new("region")
                .long("region")
                .help("Region of interest as a GeoJSON polygon file")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("filter-mode")
                .long("filter-mode")
                .help("Region filter mode (intersects or centroid)")
                .value_name("MODE")
                .required(false),
        )
        .arg(
            Arg::new("keep-zero")
                .long("keep-zero")
                .help("Emit zero-valued cells")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .help("Process raster rows on all cores")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML run configuration")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("value-property")
                .long("value-property")
                .help("Name of the value attribute in the output")
                .value_name("NAME")
                .required(false),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Hide progress bars")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write log records to this file as well as stderr")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}
