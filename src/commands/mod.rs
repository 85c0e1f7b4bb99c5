//! CLI command implementations
//!
//! This module contains implementations of the commands supported by the
//! CLI application using the Command pattern.

pub mod command_traits;
pub mod info_command;
pub mod convert_command;

pub use command_traits::{Command, CommandFactory};
pub use info_command::InfoCommand;
pub use convert_command::ConvertCommand;

use clap::ArgMatches;
use crate::errors::ConversionResult;

/// Factory for creating command instances based on CLI arguments
pub struct RastervecCommandFactory;

impl RastervecCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        RastervecCommandFactory
    }
}

impl Default for RastervecCommandFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandFactory for RastervecCommandFactory {
    fn create_command(&self, args: &ArgMatches) -> ConversionResult<Box<dyn Command>> {
        if args.get_flag("info") {
            Ok(Box::new(InfoCommand::new(args)?))
        } else {
            Ok(Box::new(ConvertCommand::new(args)?))
        }
    }
}
