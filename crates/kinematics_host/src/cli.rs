//! Command-line interface handling for the kinematics host.
//!
//! This module provides command-line argument parsing using the `clap`
//! crate. Every option either locates the configuration file, names the
//! request source or overrides a configuration value.

use clap::{Arg, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// This structure holds all the command-line options that can be used to
/// override configuration file settings or provide runtime parameters.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Read requests from this file instead of stdin
    pub input: Option<PathBuf>,
    /// Optional override for the initial grid cell size
    pub cell_size: Option<f64>,
    /// Optional override for the request timeout in milliseconds
    pub request_timeout_ms: Option<u64>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
}

impl CliArgs {
    /// Builds the clap command describing every option.
    pub fn command() -> Command {
        Command::new("Kinematics Host")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Spatial grid and kinematic prediction engine over newline-delimited JSON")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("kinematics.toml"),
            )
            .arg(
                Arg::new("input")
                    .short('i')
                    .long("input")
                    .value_name("FILE")
                    .help("Read requests from FILE instead of stdin"),
            )
            .arg(
                Arg::new("cell-size")
                    .long("cell-size")
                    .value_name("UNITS")
                    .help("Grid cell size used for the startup init")
                    .value_parser(clap::value_parser!(f64)),
            )
            .arg(
                Arg::new("timeout-ms")
                    .long("timeout-ms")
                    .value_name("MS")
                    .help("Per-request timeout in milliseconds")
                    .value_parser(clap::value_parser!(u64)),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
    }

    /// Parses the process arguments.
    ///
    /// Exits with a usage message when the arguments are invalid.
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    /// Parses an explicit argument list, first element being the binary name.
    #[cfg(test)]
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&Self::command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &clap::ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("kinematics.toml")),
            input: matches.get_one::<String>("input").map(PathBuf::from),
            cell_size: matches.get_one::<f64>("cell-size").copied(),
            request_timeout_ms: matches.get_one::<u64>("timeout-ms").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }
}
