//! Package system that unpacks nested application packages into the application root.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use super::{InstallProcess, PackageSystem, ValidationFailure};
use crate::Result;

/// Installs a zip archive by extracting its files below `target_root`.
#[derive(Debug, Clone)]
pub struct ZipPackageSystem {
    target_root: PathBuf,
}

impl ZipPackageSystem {
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        Self {
            target_root: target_root.into(),
        }
    }
}

impl PackageSystem for ZipPackageSystem {
    fn begin_install(&self, archive: File, overwrite: bool) -> Result<Box<dyn InstallProcess>> {
        Ok(Box::new(ZipInstallProcess::open(
            archive,
            self.target_root.clone(),
            overwrite,
        )))
    }
}

struct ZipInstallProcess {
    archive: Option<ZipArchive<File>>,
    /// Archive index and relative path of every file entry
    entries: Vec<(usize, PathBuf)>,
    target_root: PathBuf,
    overwrite: bool,
    pre_install: Vec<ValidationFailure>,
}

impl ZipInstallProcess {
    fn open(file: File, target_root: PathBuf, overwrite: bool) -> Self {
        let mut process = Self {
            archive: None,
            entries: Vec::new(),
            target_root,
            overwrite,
            pre_install: Vec::new(),
        };

        let mut archive = match ZipArchive::new(file) {
            Ok(archive) => archive,
            Err(e) => {
                process
                    .pre_install
                    .push(ValidationFailure::new(format!("not a readable package archive: {}", e)));
                return process;
            }
        };

        for index in 0..archive.len() {
            let entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    process.pre_install.push(ValidationFailure::for_subject(
                        format!("entry #{}", index),
                        e.to_string(),
                    ));
                    continue;
                }
            };

            if entry.is_dir() {
                continue;
            }

            match entry.enclosed_name() {
                Some(relative) => process.entries.push((index, relative)),
                None => process.pre_install.push(ValidationFailure::for_subject(
                    entry.name(),
                    "path escapes the installation directory",
                )),
            }
        }

        process.archive = Some(archive);
        process
    }

    fn extract(&mut self, index: usize, relative: &Path) -> io::Result<()> {
        let archive = self
            .archive
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "archive is not open"))?;
        let mut entry = archive.by_index(index).map_err(io::Error::from)?;

        let target = self.target_root.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = File::create(&target)?;
        io::copy(&mut entry, &mut output)?;
        Ok(())
    }
}

impl InstallProcess for ZipInstallProcess {
    fn pre_install_validation(&self) -> &[ValidationFailure] {
        &self.pre_install
    }

    fn validate(&mut self) -> Vec<ValidationFailure> {
        if self.overwrite {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|(_, relative)| self.target_root.join(relative).exists())
            .map(|(_, relative)| {
                ValidationFailure::for_subject(relative.display().to_string(), "file already exists")
            })
            .collect()
    }

    fn install(&mut self) -> Vec<ValidationFailure> {
        let entries = std::mem::take(&mut self.entries);
        let mut failures = Vec::new();

        for (index, relative) in &entries {
            if let Err(e) = self.extract(*index, relative) {
                failures.push(ValidationFailure::for_subject(
                    relative.display().to_string(),
                    e.to_string(),
                ));
            }
        }

        self.entries = entries;
        failures
    }
}
