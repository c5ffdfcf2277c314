//! verbump CLI
#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use tracing::debug;
use verbump::{Cli, commands, style};
use verbump_core::config::ConfigLoader;
use verbump_core::workflow::WorkflowError;

mod observability;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.apply();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "fatal error");
            eprintln!("{} {err:#}", style::epaint("error:", style::ERROR));
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let cwd = start_dir(cli)?;

    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(ref config_path) = cli.config {
        let config_path = Utf8PathBuf::try_from(config_path.clone()).map_err(|e| {
            anyhow::anyhow!(
                "config path is not valid UTF-8: {}",
                e.into_path_buf().display()
            )
        })?;
        loader = loader.with_file(&config_path);
    }
    let config = loader.load().context("failed to load configuration")?;

    let obs_config = observability::ObservabilityConfig::from_env_with_overrides(
        config
            .log_dir
            .as_ref()
            .map(|dir| dir.as_std_path().to_path_buf()),
    );
    let env_filter = observability::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    let _guard = observability::init_observability(&obs_config, env_filter)
        .context("failed to initialize logging")?;

    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        color = ?cli.color,
        %cwd,
        "CLI initialized"
    );

    commands::bump::cmd_bump(&cli.bump, cli.json, cli.verbose > 0, &config, &cwd)
}

/// The directory to start from: `-C` if given, else the current directory.
///
/// A relative `-C` is taken relative to the current directory. The process
/// working directory itself is left alone.
fn start_dir(cli: &Cli) -> anyhow::Result<Utf8PathBuf> {
    let current = std::env::current_dir().context("failed to determine current directory")?;
    let dir = match cli.chdir {
        Some(ref dir) => current.join(dir),
        None => current,
    };
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }
    Utf8PathBuf::try_from(dir).map_err(|e| {
        anyhow::anyhow!(
            "directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })
}

/// Exit status for a failed run: the workflow's own code when there is one.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<WorkflowError>())
        .map_or(1, WorkflowError::exit_code)
}
