//! Library interface for the `verbump` CLI.
//!
//! This crate exposes the CLI's argument parser as a library, primarily for
//! documentation generation and testing. The actual entry point is in
//! `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`commands`] - Command implementations
//! - [`style`] - Color handling for human output
//!
//! # Documentation Generation
//!
//! The [`command()`] function returns the clap `Command` for generating man pages
//! and shell completions via `xtask`.

pub mod commands;

pub mod style;

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode. With `Auto`, stdout
    /// and stderr are checked separately as each is written.
    pub fn apply(self) {
        match self {
            Self::Auto => owo_colors::unset_override(),
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG            Log filter (e.g., debug, verbump_core=trace)
    VERBUMP_LOG_PATH    Explicit log file path
    VERBUMP_LOG_DIR     Log directory

EXIT STATUS:
    0    Success (or dry run)
    1    Precondition or command failure
    2    No version declaration found
";

/// Command-line interface definition for verbump.
#[derive(Parser, Debug)]
#[command(name = "verbump")]
#[command(
    about = "Bump an Xcode project version on a dedicated branch as a single commit",
    long_about = None
)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// What to bump and how.
    #[command(flatten)]
    pub bump: commands::bump::BumpArgs,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, value_name = "DIR")]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Echo git commands before running them; repeat for more log detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long)]
    pub json: bool,
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;
    use verbump_core::BumpLevel;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_full_flag_set() {
        let cli = Cli::try_parse_from([
            "verbump",
            "--project",
            "ios/App.xcodeproj",
            "--part",
            "minor",
            "--branch-name",
            "release/bump",
            "--recreate-branch",
            "--allow-dirty",
            "--dry-run",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.bump.project.to_str(), Some("ios/App.xcodeproj"));
        assert_eq!(cli.bump.part, Some(BumpLevel::Minor));
        assert_eq!(cli.bump.branch_name.as_deref(), Some("release/bump"));
        assert!(cli.bump.recreate_branch);
        assert!(cli.bump.allow_dirty);
        assert!(cli.bump.dry_run);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn project_is_required() {
        assert!(Cli::try_parse_from(["verbump"]).is_err());
    }

    #[test]
    fn part_and_branch_default_to_config() {
        let cli = Cli::try_parse_from(["verbump", "--project", "App.xcodeproj"]).unwrap();
        assert_eq!(cli.bump.part, None);
        assert_eq!(cli.bump.branch_name, None);
    }

    #[test]
    fn rejects_unknown_part() {
        assert!(
            Cli::try_parse_from(["verbump", "--project", "App.xcodeproj", "--part", "build"])
                .is_err()
        );
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["verbump", "--project", "A.xcodeproj", "-q", "-v"]).is_err());
    }
}
