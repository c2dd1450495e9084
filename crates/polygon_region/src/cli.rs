//! Command-line interface handling for the region host.
//!
//! Arguments are parsed with the `clap` builder API; each option overrides the
//! matching setting from the configuration file.

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the region file
    pub regions_path: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Load and validate the region file, then exit
    pub check: bool,
}

fn command() -> Command {
    Command::new("Polygon Region Host")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Hosts polygonal protection regions and persists them to disk")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("polygon_region.toml"),
        )
        .arg(
            Arg::new("regions")
                .short('r')
                .long("regions")
                .value_name("FILE")
                .help("Region file path (overrides storage.path)"),
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
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Load and validate the region file, then exit")
                .action(ArgAction::SetTrue),
        )
}

impl CliArgs {
    /// Parses the process arguments; exits with usage on invalid input.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses an explicit argument list.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        command()
            .try_get_matches_from(args)
            .map(|matches| Self::from_matches(&matches))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("polygon_region.toml")),
            regions_path: matches.get_one::<String>("regions").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            check: matches.get_flag("check"),
        }
    }
}
