//! Discovery of package files and their destinations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use nudeploy_rules::PathRemapper;

use crate::package::PackageRef;
use crate::{DeployError, Result};

/// A file to copy out of an unpacked package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePlacement {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl FilePlacement {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Copy the file, creating the target directory and overwriting an existing target.
    pub fn copy(&self) -> Result<()> {
        let copy_failed = |source| DeployError::CopyFailed {
            from: self.source.clone(),
            to: self.target.clone(),
            source,
        };

        if let Some(parent) = self.target.parent() {
            fs::create_dir_all(parent).map_err(copy_failed)?;
        }
        fs::copy(&self.source, &self.target).map_err(copy_failed)?;
        Ok(())
    }
}

/// Placements found in a package's `content` folder.
#[derive(Debug, Default)]
pub struct ContentPlan {
    pub placements: Vec<FilePlacement>,
    /// `content/<id>.zip`, installed through the package system
    pub nested_archive: Option<PathBuf>,
}

/// Pick the first `lib/<framework>` folder that exists, in priority order.
///
/// Folder names are compared case-insensitively, an exact match wins. A
/// missing `lib` folder selects nothing; any other read error is returned.
pub fn select_lib_dir(lib_dir: &Path, frameworks: &[String]) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(lib_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DeployError::io(lib_dir, e)),
    };

    let mut folders: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DeployError::io(lib_dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            folders.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }

    Ok(frameworks.iter().find_map(|framework| {
        folders
            .iter()
            .find(|(name, _)| name == framework)
            .or_else(|| folders.iter().find(|(name, _)| name.eq_ignore_ascii_case(framework)))
            .map(|(_, path)| path.clone())
    }))
}

/// Files of the selected `lib` folder, flattened into `bin_root`.
pub fn binary_placements(
    install_path: &Path,
    frameworks: &[String],
    bin_root: &Path,
) -> Result<Vec<FilePlacement>> {
    let Some(lib_dir) = select_lib_dir(&install_path.join("lib"), frameworks)? else {
        return Ok(Vec::new());
    };

    let placements = sorted_files(&lib_dir)?
        .into_iter()
        .filter_map(|source| {
            let name = source.file_name()?.to_owned();
            Some(FilePlacement::new(source, bin_root.join(name)))
        })
        .collect();
    Ok(placements)
}

/// Placements for everything under `content/`.
///
/// Files below a subdirectory are routed through the remapper; loose files go
/// to the front-end root, except the nested `<id>.zip` archive.
pub fn content_placements(
    install_path: &Path,
    package: &PackageRef,
    remapper: &PathRemapper,
) -> Result<ContentPlan> {
    let content = install_path.join("content");
    let mut plan = ContentPlan::default();
    if !content.is_dir() {
        return Ok(plan);
    }

    for dir in sorted_dirs(&content)? {
        let Some(dir_name) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        for entry in WalkDir::new(&dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| DeployError::io(&dir, e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let source = entry.into_path();
            let relative = pathdiff::diff_paths(&source, &dir).unwrap_or_else(|| source.clone());
            let target = remapper.resolve(&relative, &dir_name, &package.id, &package.version);
            plan.placements.push(FilePlacement::new(source, target));
        }
    }

    let nested_name = format!("{}.zip", package.id);
    let frontend_root = remapper.layout().frontend_root();

    for source in sorted_files(&content)? {
        let Some(name) = source.file_name().map(|n| n.to_owned()) else {
            continue;
        };

        if name.to_string_lossy().eq_ignore_ascii_case(&nested_name) {
            plan.nested_archive = Some(source);
            continue;
        }
        plan.placements.push(FilePlacement::new(source, frontend_root.join(name)));
    }

    Ok(plan)
}

fn sorted_entries(dir: &Path, want_dirs: bool) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| DeployError::io(dir, e))? {
        let entry = entry.map_err(|e| DeployError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() == want_dirs {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    sorted_entries(dir, false)
}

fn sorted_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    sorted_entries(dir, true)
}
