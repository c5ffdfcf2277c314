//! Build-project containers and the version-declaration file inside them.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from resolving a project reference.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// The path is not a recognized build-project container.
    #[error("{path} is not a recognized project (expected one of: {expected})")]
    InvalidKind {
        /// The path that was given.
        path: Utf8PathBuf,
        /// Accepted container extensions.
        expected: String,
    },

    /// The container has no version-declaration file.
    #[error("{path} not found")]
    FileNotFound {
        /// The declaration file that was expected.
        path: Utf8PathBuf,
    },
}

/// Result alias for project resolution.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// A recognized build-project container kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    /// Xcode project bundle (`*.xcodeproj`).
    Xcode,
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xcode => write!(f, "xcode"),
        }
    }
}

impl ProjectKind {
    /// Directory extension that identifies this container.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Xcode => "xcodeproj",
        }
    }

    /// Declaration file path, relative to the container.
    pub const fn declaration_file(self) -> &'static str {
        match self {
            Self::Xcode => "project.pbxproj",
        }
    }

    /// All recognized container kinds.
    pub const ALL: &[Self] = &[Self::Xcode];

    /// Identify a container by its extension.
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        let extension = path.extension()?;
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.extension() == extension)
    }
}

/// A validated project reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFile {
    /// The container directory.
    pub container: Utf8PathBuf,
    /// The kind of container.
    pub kind: ProjectKind,
    /// The version-declaration file inside the container.
    pub file: Utf8PathBuf,
}

/// Resolve `project` against the repository root and validate it.
///
/// Relative paths are taken relative to `root`.
#[instrument(fields(%root, %project))]
pub fn resolve(root: &Utf8Path, project: &Utf8Path) -> ProjectResult<ProjectFile> {
    let container = if project.is_absolute() {
        project.to_path_buf()
    } else {
        root.join(project)
    };

    let kind = ProjectKind::from_path(&container).ok_or_else(|| ProjectError::InvalidKind {
        path: container.clone(),
        expected: ProjectKind::ALL
            .iter()
            .map(|kind| format!(".{}", kind.extension()))
            .collect::<Vec<_>>()
            .join(", "),
    })?;

    let file = container.join(kind.declaration_file());
    if !file.is_file() {
        return Err(ProjectError::FileNotFound { path: file });
    }

    debug!(%kind, %file, "resolved project");
    Ok(ProjectFile {
        container,
        kind,
        file,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn utf8_tmp(tmp: &TempDir) -> &Utf8Path {
        Utf8Path::from_path(tmp.path()).expect("tempdir is UTF-8")
    }

    fn make_project(root: &Utf8Path, name: &str) -> Utf8PathBuf {
        let container = root.join(name);
        fs::create_dir_all(&container).unwrap();
        fs::write(container.join("project.pbxproj"), "APP_SHORT_VERSION = 1.0;\n").unwrap();
        container
    }

    #[test]
    fn kind_from_extension() {
        assert_eq!(
            ProjectKind::from_path(Utf8Path::new("ios/App.xcodeproj")),
            Some(ProjectKind::Xcode)
        );
        assert_eq!(ProjectKind::from_path(Utf8Path::new("App.xcworkspace")), None);
        assert_eq!(ProjectKind::from_path(Utf8Path::new("App")), None);
    }

    #[test]
    fn resolves_relative_to_root() {
        let tmp = TempDir::new().unwrap();
        let root = utf8_tmp(&tmp);
        make_project(root, "ios/App.xcodeproj");

        let project = resolve(root, Utf8Path::new("ios/App.xcodeproj")).unwrap();
        assert_eq!(project.kind, ProjectKind::Xcode);
        assert_eq!(project.container, root.join("ios/App.xcodeproj"));
        assert_eq!(project.file, root.join("ios/App.xcodeproj/project.pbxproj"));
    }

    #[test]
    fn keeps_absolute_paths() {
        let tmp = TempDir::new().unwrap();
        let root = utf8_tmp(&tmp);
        let container = make_project(root, "App.xcodeproj");

        let project = resolve(Utf8Path::new("/elsewhere"), &container).unwrap();
        assert_eq!(project.container, container);
    }

    #[test]
    fn rejects_wrong_extension() {
        let tmp = TempDir::new().unwrap();
        let root = utf8_tmp(&tmp);
        make_project(root, "App.xcworkspace");

        let err = resolve(root, Utf8Path::new("App.xcworkspace")).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidKind { .. }));
        assert!(err.to_string().contains(".xcodeproj"));
    }

    #[test]
    fn missing_declaration_file() {
        let tmp = TempDir::new().unwrap();
        let root = utf8_tmp(&tmp);
        fs::create_dir_all(root.join("App.xcodeproj")).unwrap();

        let err = resolve(root, Utf8Path::new("App.xcodeproj")).unwrap_err();
        match err {
            ProjectError::FileNotFound { path } => {
                assert!(path.ends_with("App.xcodeproj/project.pbxproj"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
