//! The bump command: thin CLI layer over `verbump_core::workflow`.

use std::path::PathBuf;

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use tracing::{debug, instrument};

use verbump_core::BumpLevel;
use verbump_core::branch::{BranchAction, BranchSpec};
use verbump_core::config::Config;
use verbump_core::exec::{self, SystemRunner};
use verbump_core::workflow::{
    self, WorkflowEvent, WorkflowOptions, WorkflowOutcome, WorkflowState,
};

use crate::style::{ACCENT, DIM, LABEL, NEW, OK, WARN, epaint, paint};

/// Arguments selecting what to bump.
#[derive(Args, Debug, Default)]
pub struct BumpArgs {
    /// Path to the .xcodeproj container (relative to the repository root)
    #[arg(long, value_name = "PATH")]
    pub project: PathBuf,

    /// Version component to bump [default: patch]
    #[arg(long, value_enum, value_name = "PART")]
    pub part: Option<BumpLevel>,

    /// Branch to commit the bump on [default: chore/bump-version]
    #[arg(long, value_name = "NAME")]
    pub branch_name: Option<String>,

    /// Reset the branch to the current commit if it already exists
    #[arg(long)]
    pub recreate_branch: bool,

    /// Proceed even with uncommitted changes
    #[arg(long)]
    pub allow_dirty: bool,

    /// Show what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl BumpArgs {
    /// Merge these flags with config values into workflow options.
    ///
    /// Flags win over config; config wins over built-in defaults.
    pub fn to_options(&self, config: &Config) -> anyhow::Result<WorkflowOptions> {
        let project = Utf8PathBuf::try_from(self.project.clone()).map_err(|e| {
            anyhow::anyhow!(
                "project path is not valid UTF-8: {}",
                e.into_path_buf().display()
            )
        })?;

        Ok(WorkflowOptions {
            project,
            level: self.part.unwrap_or_else(|| config.default_part()),
            branch: BranchSpec {
                name: self
                    .branch_name
                    .clone()
                    .unwrap_or_else(|| config.branch_name().to_string()),
                recreate: self.recreate_branch,
            },
            allow_dirty: self.allow_dirty,
            dry_run: self.dry_run,
            key: config.declaration_key().to_string(),
            commit_template: config.commit_message().to_string(),
        })
    }
}

/// Execute the bump.
///
/// Workflow failures are returned as `WorkflowError` inside the `anyhow`
/// chain so `main` can map them to an exit code.
#[instrument(name = "cmd_bump", skip_all, fields(json_output, echo))]
pub fn cmd_bump(
    args: &BumpArgs,
    global_json: bool,
    echo: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, echo, "executing bump command");

    if !exec::has_binary("git") {
        bail!("git not found on PATH");
    }

    let options = args.to_options(config)?;
    let runner = SystemRunner::new().with_echo(echo);

    let outcome = workflow::run_workflow(&runner, cwd, &options, |event| {
        if !global_json {
            print_event(&event, &options);
        }
    });

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some(status) = err.dirty_status() {
                print_dirty_status(status);
            }
            return Err(err.into());
        }
    };

    if global_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?
        );
    } else {
        print_summary(&outcome);
    }

    Ok(())
}

fn print_event(event: &WorkflowEvent, options: &WorkflowOptions) {
    match event {
        WorkflowEvent::RepositoryResolved { root, branch } => {
            println!("{}: {}", paint("Repository", LABEL), root);
            println!(
                "{}: {}",
                paint("Current branch", LABEL),
                branch.as_deref().unwrap_or("(detached HEAD)")
            );
        }
        WorkflowEvent::GuardSkipped => {
            println!("{}", paint("Skipping clean working tree check.", WARN));
        }
        WorkflowEvent::BranchSelected(switch) => {
            if switch.dry_run {
                println!(
                    "{} Would {} branch {} (exists={}, recreate={})",
                    paint("[dry-run]", WARN),
                    action_verb(switch.action),
                    paint(&switch.target, ACCENT),
                    switch.existed,
                    options.branch.recreate
                );
            } else {
                println!(
                    "{}: {} → {}",
                    paint("Branch", LABEL),
                    paint(switch.previous.as_deref().unwrap_or("(detached HEAD)"), DIM),
                    paint(&switch.target, ACCENT)
                );
            }
        }
        WorkflowEvent::FileMutated(mutation) => match mutation.backup {
            Some(ref backup) => println!(
                "  {} Updated {}: {} -> {} ({}); backup: {}",
                paint("✓", OK),
                mutation.file,
                paint(&mutation.old, DIM),
                paint(&mutation.new, NEW),
                mutation.count,
                backup
            ),
            None => println!(
                "{} Would bump {} in {}: {} -> {} ({})",
                paint("[dry-run]", WARN),
                options.key,
                mutation.file,
                paint(&mutation.old, DIM),
                paint(&mutation.new, NEW),
                mutation.count
            ),
        },
        WorkflowEvent::Committed(commit) => {
            println!(
                "  {} Committed: {} ({})",
                paint("✓", OK),
                commit.message,
                paint(&commit.hash, DIM)
            );
        }
        WorkflowEvent::Transition { to, .. }
            if options.dry_run && *to == WorkflowState::FileMutated =>
        {
            println!("{} Would: git add + git commit", paint("[dry-run]", WARN));
        }
        WorkflowEvent::Transition { .. } | WorkflowEvent::Aborted { .. } => {}
    }
}

const fn action_verb(action: BranchAction) -> &'static str {
    match action {
        BranchAction::Reset => "reset",
        BranchAction::Switch => "switch to",
        BranchAction::Create => "create",
    }
}

fn print_dirty_status(status: &str) {
    eprintln!("{}", epaint("Uncommitted changes:", WARN));
    for line in status.lines() {
        eprintln!("  {line}");
    }
}

fn print_summary(outcome: &WorkflowOutcome) {
    println!();
    if outcome.dry_run {
        println!("{}", paint("Dry run — no changes made.", WARN));
        return;
    }
    println!("{}", paint("Push with:", LABEL));
    println!("  git push -u origin {}", outcome.branch.target);
}
