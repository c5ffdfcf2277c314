//! In-memory git used by unit tests.
//!
//! Interprets the subset of git commands the workflow issues and records every
//! invocation so tests can assert on exactly what would have run.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use super::{CommandOutput, CommandRunner};

#[derive(Debug)]
struct State {
    root: Option<Utf8PathBuf>,
    current: Option<String>,
    branches: BTreeSet<String>,
    unstaged_changes: bool,
    staged_changes: bool,
    supports_switch: bool,
    switch_is_noop: bool,
    broken_diff: bool,
    broken_commit: bool,
    staged: Vec<String>,
    commits: Vec<String>,
    calls: Vec<Vec<String>>,
}

/// A scripted stand-in for the `git` executable.
#[derive(Debug)]
pub struct FakeGit {
    state: RefCell<State>,
}

impl FakeGit {
    /// A clean repository at `root` with a single `main` branch checked out.
    pub fn new(root: &str) -> Self {
        Self {
            state: RefCell::new(State {
                root: Some(Utf8PathBuf::from(root)),
                current: Some("main".into()),
                branches: BTreeSet::from(["main".to_string()]),
                unstaged_changes: false,
                staged_changes: false,
                supports_switch: true,
                switch_is_noop: false,
                broken_diff: false,
                broken_commit: false,
                staged: Vec::new(),
                commits: Vec::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// A directory that is not inside any repository.
    pub fn outside_repo() -> Self {
        let fake = Self::new("/nowhere");
        fake.state.borrow_mut().root = None;
        fake
    }

    pub fn with_branch(self, name: &str) -> Self {
        self.state.borrow_mut().branches.insert(name.to_string());
        self
    }

    pub fn with_unstaged_changes(self) -> Self {
        self.state.borrow_mut().unstaged_changes = true;
        self
    }

    pub fn with_staged_changes(self) -> Self {
        self.state.borrow_mut().staged_changes = true;
        self
    }

    /// Behave like a git older than 2.23, which has no `switch` subcommand.
    pub fn without_switch(self) -> Self {
        self.state.borrow_mut().supports_switch = false;
        self
    }

    /// Branch commands exit 0 but leave HEAD where it was.
    pub fn with_noop_switch(self) -> Self {
        self.state.borrow_mut().switch_is_noop = true;
        self
    }

    /// HEAD points at a commit rather than a branch.
    pub fn detached(self) -> Self {
        self.state.borrow_mut().current = None;
        self
    }

    /// `git diff` dies with exit 128 instead of reporting a diff.
    pub fn with_broken_diff(self) -> Self {
        self.state.borrow_mut().broken_diff = true;
        self
    }

    /// `git commit` is rejected, as by a failing hook.
    pub fn with_broken_commit(self) -> Self {
        self.state.borrow_mut().broken_commit = true;
        self
    }

    pub fn current_branch(&self) -> String {
        self.state.borrow().current.clone().unwrap_or_default()
    }

    pub fn commits(&self) -> Vec<String> {
        self.state.borrow().commits.clone()
    }

    pub fn staged(&self) -> Vec<String> {
        self.state.borrow().staged.clone()
    }

    /// Every invocation so far, as argument vectors without the program name.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.borrow().calls.clone()
    }

    /// Whether any recorded invocation started with `subcommand`.
    pub fn ran(&self, subcommand: &str) -> bool {
        self.state
            .borrow()
            .calls
            .iter()
            .any(|call| call.first().is_some_and(|c| c == subcommand))
    }

    fn checkout(state: &mut State, branch: &str, create: bool, force: bool) -> CommandOutput {
        let exists = state.branches.contains(branch);
        if create && exists && !force {
            return fail(128, &format!("fatal: a branch named '{branch}' already exists"));
        }
        if !create && !exists {
            return fail(128, &format!("fatal: invalid reference: {branch}"));
        }
        if !state.switch_is_noop {
            state.branches.insert(branch.to_string());
            state.current = Some(branch.to_string());
        }
        ok("")
    }
}

impl CommandRunner for FakeGit {
    fn run(&self, program: &str, args: &[&str], _cwd: &Utf8Path) -> io::Result<CommandOutput> {
        assert_eq!(program, "git", "FakeGit only understands git");
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(args.iter().map(ToString::to_string).collect());

        if state.root.is_none() {
            return Ok(fail(
                128,
                "fatal: not a git repository (or any of the parent directories): .git",
            ));
        }

        let out = match args {
            ["rev-parse", "--show-toplevel"] => {
                ok(&format!("{}\n", state.root.as_ref().map_or("", |r| r.as_str())))
            }
            ["symbolic-ref", "-q", "HEAD"] => match state.current {
                Some(ref branch) => ok(&format!("refs/heads/{branch}\n")),
                None => fail(1, ""),
            },
            ["rev-parse", "--verify", "--quiet", reference] => {
                let branch = reference.strip_prefix("refs/heads/").unwrap_or(*reference);
                if state.branches.contains(branch) {
                    ok("0123456789abcdef\n")
                } else {
                    fail(1, "")
                }
            }
            ["rev-parse", "--short", "HEAD"] => ok(&format!("abc{:04}\n", state.commits.len())),
            ["diff", ..] if state.broken_diff => fail(128, "fatal: unable to read index"),
            ["diff", "--quiet"] => exit_if(state.unstaged_changes),
            ["diff", "--quiet", "--cached"] => exit_if(state.staged_changes),
            ["status", "--porcelain"] => {
                let mut lines = String::new();
                if state.staged_changes {
                    lines.push_str("M  Sources/App.swift\n");
                }
                if state.unstaged_changes {
                    lines.push_str(" M README.md\n");
                }
                ok(&lines)
            }
            ["switch", ..] if !state.supports_switch => fail(
                1,
                "git: 'switch' is not a git command. See 'git --help'.",
            ),
            ["switch", "-C", name] | ["checkout", "-B", name] => {
                Self::checkout(&mut state, name, true, true)
            }
            ["switch", "-c", name] | ["checkout", "-b", name] => {
                Self::checkout(&mut state, name, true, false)
            }
            ["switch", name] | ["checkout", name] => Self::checkout(&mut state, name, false, false),
            ["add", "--", path] => {
                state.staged.push((*path).to_string());
                ok("")
            }
            ["commit", ..] if state.broken_commit => {
                fail(1, "pre-commit hook exited with error code 1")
            }
            ["commit", "-m", message, "--", _path] => {
                state.commits.push((*message).to_string());
                state.staged.clear();
                ok("")
            }
            _ => fail(1, &format!("fake git: unsupported command {args:?}")),
        };
        Ok(out)
    }
}

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn fail(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

fn exit_if(changed: bool) -> CommandOutput {
    if changed { fail(1, "") } else { ok("") }
}
