//! Command-line interface handling for the definition compiler.
//!
//! Arguments are parsed with the `clap` builder API and override the values
//! loaded from the configuration file.

use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Project file describing scenes and objects (JSON)
    pub project_path: PathBuf,
    /// Optional override for the output directory
    pub output_dir: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Whether to run the remote version check after compiling
    pub check_updates: bool,
    /// Prepare objects and update the project file without writing definitions
    pub dry_run: bool,
}

impl CliArgs {
    fn command() -> Command {
        Command::new("netdef")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Compiles network actor definitions from a scene project")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("netdef.toml"),
            )
            .arg(
                Arg::new("project")
                    .short('p')
                    .long("project")
                    .value_name("FILE")
                    .help("Project file (JSON) with scenes and objects")
                    .required(true),
            )
            .arg(
                Arg::new("output")
                    .short('o')
                    .long("output")
                    .value_name("DIR")
                    .help("Output directory for definition files"),
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
                Arg::new("check-updates")
                    .long("check-updates")
                    .help("Check for a newer version after compiling")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("dry-run")
                    .long("dry-run")
                    .help("Resolve objects without writing definition files")
                    .action(ArgAction::SetTrue),
            )
    }

    /// Parses the process arguments. Exits with a usage message on error.
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    /// Parses an explicit argument list.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    fn from_matches(matches: &clap::ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("netdef.toml")),
            project_path: matches
                .get_one::<String>("project")
                .map(PathBuf::from)
                .unwrap_or_default(),
            output_dir: matches.get_one::<String>("output").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            check_updates: matches.get_flag("check-updates"),
            dry_run: matches.get_flag("dry-run"),
        }
    }
}
