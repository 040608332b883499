//! Directory layout of the target web application.

use std::path::{Component, Path, PathBuf};

use crate::rules::eq_ignore_case;

/// Where things live inside the application root.
///
/// Paths written as `~/a/b` (or `~\a\b`) are relative to the application root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    root: PathBuf,
    frontend_dir: String,
    bin_dir: String,
    frontend_dirs: Vec<String>,
}

impl AppLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            frontend_dir: "Frontend".to_string(),
            bin_dir: "Bin".to_string(),
            frontend_dirs: vec!["scripts".to_string(), "content".to_string()],
        }
    }

    /// Set the front-end assets directory, relative to the root
    pub fn with_frontend_dir(mut self, dir: impl Into<String>) -> Self {
        self.frontend_dir = dir.into();
        self
    }

    /// Set the binaries directory, relative to the root
    pub fn with_bin_dir(mut self, dir: impl Into<String>) -> Self {
        self.bin_dir = dir.into();
        self
    }

    /// Set the content directory names that default to the front-end root
    pub fn with_frontend_dirs(mut self, dirs: Vec<String>) -> Self {
        self.frontend_dirs = dirs;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frontend_root(&self) -> PathBuf {
        self.resolve(&self.frontend_dir)
    }

    pub fn bin_root(&self) -> PathBuf {
        self.resolve(&self.bin_dir)
    }

    /// Whether a content directory defaults to the front-end root.
    pub fn is_frontend_dir(&self, dir_name: &str) -> bool {
        self.frontend_dirs.iter().any(|d| eq_ignore_case(d, dir_name))
    }

    /// Resolve an application-relative path against the root.
    ///
    /// A leading `~` is optional, `/` and `\` both separate segments, and
    /// `.`/`..` are folded lexically. `..` never climbs above the root.
    pub fn resolve(&self, app_path: &str) -> PathBuf {
        let trimmed = app_path.strip_prefix('~').unwrap_or(app_path);

        let mut segments: Vec<&str> = Vec::new();
        for segment in trimmed.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }

        let mut path = self.root.clone();
        path.extend(segments);
        path
    }

    /// Render a path below the root in `~/a/b` form.
    pub fn to_app_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Some(format!("~/{}", parts.join("/")))
    }
}
