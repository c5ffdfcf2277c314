//! Core library for verbump.
//!
//! Bumps the version declared in an Xcode project and commits the change on
//! a dedicated branch. The `verbump` CLI is a thin layer over this crate.
//!
//! # Modules
//!
//! - [`version`] - Version parsing and bump arithmetic
//! - [`exec`] - External command execution
//! - [`git`] - Git operations bound to a repository root
//! - [`guard`] - Working-tree cleanliness checks
//! - [`branch`] - Switching to or creating the bump branch
//! - [`project`] - Project container resolution
//! - [`declaration`] - Version declaration rewriting
//! - [`workflow`] - The end-to-end bump workflow
//! - [`config`] - Configuration loading and management
//! - [`error`] - Configuration error types
//!
//! # Quick Start
//!
//! ```no_run
//! use camino::Utf8Path;
//! use verbump_core::exec::SystemRunner;
//! use verbump_core::workflow::{WorkflowOptions, run_workflow};
//!
//! let options = WorkflowOptions::new("ios/App.xcodeproj");
//! let outcome = run_workflow(&SystemRunner::new(), Utf8Path::new("."), &options, |_| {})
//!     .expect("bump failed");
//! println!("{} -> {}", outcome.mutation.old, outcome.mutation.new);
//! ```
#![deny(unsafe_code)]

pub mod branch;

pub mod config;

pub mod declaration;

pub mod error;

pub mod exec;

pub mod git;

pub mod guard;

pub mod project;

pub mod version;

pub mod workflow;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult};

pub use version::BumpLevel;

pub use workflow::{FailureKind, WorkflowError, WorkflowOptions, WorkflowOutcome, run_workflow};

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;
