//! Command-line interface for termis.
//!
//! Parses arguments using clap and provides the [`Cli`] struct containing
//! all user-specified options.

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

/// Verbosity of diagnostic logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[value(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Command-line arguments for termis.
///
/// # Examples
///
/// ```bash
/// # Lay out ./termis.yml in the current iTerm2 window
/// termis
///
/// # Preview a layout without touching iTerm2
/// termis -c dev.yml --dry-run
///
/// # Layer a stored profile under the local config, in a new window
/// termis -p backend -n
///
/// # Store ./termis.yml as a global profile
/// termis -s backend
/// ```
#[derive(Parser, Debug)]
#[command(name = "termis")]
#[command(version)]
#[command(about = "iTerm2 layout orchestrator - create tabs and panes from YAML")]
#[command(long_about = "Termis lays out iTerm2 tabs and split panes from a YAML file.\n\n\
    Each pane is placed by a column/row[/sub_column] position and can set a\n\
    title, badge, working directory, profile, commands and tool integrations.")]
#[command(group(
    ArgGroup::new("action")
        .args(["wizard", "save_profile", "list_profiles", "tools_check"])
        .multiple(false)
))]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Open a new iTerm2 window instead of using the current one.
    #[arg(short, long, conflicts_with = "action")]
    pub new: bool,

    /// Stored profile from ~/.termis/profiles to load.
    ///
    /// With a config file present, the profile fills in whatever the config
    /// leaves out.
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Build a configuration interactively.
    #[arg(short, long)]
    pub wizard: bool,

    /// Print the operations that would be performed, without iTerm2.
    #[arg(short, long, conflicts_with = "action")]
    pub dry_run: bool,

    /// Logging verbosity (RUST_LOG overrides).
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info, value_name = "LEVEL")]
    pub log_level: LogLevel,

    /// Save the configuration file as a global profile.
    #[arg(short, long, value_name = "NAME")]
    pub save_profile: Option<String>,

    /// List stored global profiles.
    #[arg(short = 'g', long)]
    pub list_profiles: bool,

    /// Report which development tools are installed.
    #[arg(short, long)]
    pub tools_check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["termis"]).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(cli.log_level, LogLevel::Info);
        assert!(!cli.dry_run && !cli.new && !cli.wizard);
    }

    #[test]
    fn test_short_flags() {
        let cli =
            Cli::try_parse_from(["termis", "-c", "x.yml", "-p", "work", "-n", "-d", "-l", "warning"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.yml")));
        assert_eq!(cli.profile.as_deref(), Some("work"));
        assert!(cli.new && cli.dry_run);
        assert_eq!(cli.log_level, LogLevel::Warn);

        let cli = Cli::try_parse_from(["termis", "-s", "mine"]).unwrap();
        assert_eq!(cli.save_profile.as_deref(), Some("mine"));
        assert!(Cli::try_parse_from(["termis", "-g"]).unwrap().list_profiles);
        assert!(Cli::try_parse_from(["termis", "-t"]).unwrap().tools_check);
    }

    #[test]
    fn test_actions_are_exclusive() {
        for args in [
            &["termis", "-w", "-g"][..],
            &["termis", "-t", "-s", "x"],
            &["termis", "-g", "-d"],
            &["termis", "-w", "-n"],
        ] {
            let err = Cli::try_parse_from(args).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ArgumentConflict, "{:?}", args);
        }
    }
}
