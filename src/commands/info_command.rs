//! Raster inspection command

use clap::ArgMatches;
use log::info;

use crate::api::RasterVec;
use crate::commands::command_traits::Command;
use crate::errors::{ConversionError, ConversionResult};

/// Command printing a raster's metadata
pub struct InfoCommand {
    /// Path to the input raster
    input_file: String,
}

impl InfoCommand {
    /// Create a new info command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    ///
    /// # Returns
    /// A new InfoCommand instance or an error
    pub fn new(args: &ArgMatches) -> ConversionResult<Self> {
        let input_file = args.get_one::<String>("input")
            .ok_or_else(|| ConversionError::Config("Missing input file".to_string()))?
            .clone();

        Ok(InfoCommand { input_file })
    }
}

impl Command for InfoCommand {
    fn execute(&self) -> ConversionResult<()> {
        info!("Inspecting raster {}", self.input_file);
        let summary = RasterVec::new().inspect(&self.input_file)?;
        println!("{}", summary);
        Ok(())
    }
}
