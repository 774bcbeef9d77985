//! Command-line argument definitions for the Echoview processor
//!
//! This module defines the CLI interface using the clap derive API.

use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the Echoview CSV processor
///
/// Converts Echoview CSV exports into gridded sample data using a
/// field-mapping file that names dimensions, variables and QC formulas.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "echoview-processor",
    version,
    about = "Convert Echoview CSV exports into gridded, QC-flagged sample data",
    long_about = "Reads echo-sounder CSV exports produced by Echoview and assembles them into \
                  dimensioned variables driven by a field-mapping file. Single-valued fields are \
                  collapsed into global attributes, QC formulas are evaluated per field, and \
                  temporal and geospatial coverage attributes are computed."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Parse one or more CSV exports
    Parse(ParseArgs),
    /// Check that a CSV header contains every mapped column
    Validate(ValidateArgs),
}

/// Arguments for the parse command
#[derive(Debug, Clone, Parser)]
pub struct ParseArgs {
    /// CSV files, directories (searched for *.csv) or glob patterns
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Field-mapping file
    ///
    /// Overrides the platform and default mapping lookup in the configured
    /// mapping directory.
    #[arg(
        short = 'm',
        long = "mapping",
        value_name = "FILE",
        help = "Field-mapping file (overrides platform lookup)"
    )]
    pub mapping: Option<PathBuf>,

    /// Platform identifier
    ///
    /// Selects `echoview_<platform>.txt` from the mapping directory and is
    /// recorded in the output metadata.
    #[arg(
        short = 'p',
        long = "platform",
        value_name = "NAME",
        help = "Platform identifier (selects echoview_<NAME>.txt)"
    )]
    pub platform: Option<String>,

    /// Attribute files merged into every result, after configured ones
    #[arg(
        short = 'a',
        long = "attributes",
        value_name = "FILE",
        help = "Attribute file to merge (repeatable)"
    )]
    pub attribute_files: Vec<PathBuf>,

    /// Deployment identifier looked up in the deployment database
    #[arg(
        long = "deployment-id",
        value_name = "ID",
        help = "Merge the deployment record with this identifier"
    )]
    pub deployment_id: Option<String>,

    /// Output format for results
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,

    /// Path to configuration file
    ///
    /// YAML configuration file. If not specified, looks for
    /// <config dir>/echoview-processor/config.yaml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (YAML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Arguments for the validate command (header-only check)
#[derive(Debug, Clone, Parser)]
pub struct ValidateArgs {
    /// CSV file whose header is checked
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    #[arg(
        short = 'm',
        long = "mapping",
        value_name = "FILE",
        help = "Field-mapping file (overrides platform lookup)"
    )]
    pub mapping: Option<PathBuf>,

    #[arg(
        short = 'p',
        long = "platform",
        value_name = "NAME",
        help = "Platform identifier (selects echoview_<NAME>.txt)"
    )]
    pub platform: Option<String>,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (YAML format)"
    )]
    pub config_file: Option<PathBuf>,

    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// Log level from `-v` count; `None` leaves the configured level in place
fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

impl ParseArgs {
    /// Validate the parse command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(mapping) = &self.mapping {
            if !mapping.exists() {
                return Err(Error::file_not_found(mapping.display().to_string()));
            }
        }

        for file in &self.attribute_files {
            if !file.exists() {
                return Err(Error::file_not_found(file.display().to_string()));
            }
        }

        if let Some(id) = &self.deployment_id {
            if id.trim().is_empty() {
                return Err(Error::configuration("Deployment id cannot be empty"));
            }
        }

        Ok(())
    }

    /// Log level requested on the command line, if any
    pub fn get_log_level(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else {
            verbosity_level(self.verbose)
        }
    }

    /// Progress bars are shown unless quiet or emitting JSON
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }
}

impl ValidateArgs {
    pub fn get_log_level(&self) -> Option<&'static str> {
        verbosity_level(self.verbose)
    }
}
