//! Local package repository, where package archives are unpacked.

use log::{debug, warn};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::package::PackageRef;
use crate::{DeployError, Result};

/// Registration of unpacked packages.
pub trait LocalRepository: Send + Sync {
    /// Directory a package is unpacked into.
    fn install_path(&self, package: &PackageRef) -> PathBuf;

    fn is_installed(&self, package: &PackageRef) -> bool;

    /// Unpack `archive` and register the package, returning its install path.
    fn add_package(&self, package: &PackageRef, archive: &Path) -> Result<PathBuf>;

    /// Remove a package registration and its unpacked files.
    fn remove_package(&self, package: &PackageRef) -> Result<()>;
}

/// Repository laid out as `<root>/<id>.<version>/`.
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ids and versions become a directory name below the root.
    fn check_package(&self, package: &PackageRef) -> Result<()> {
        package.check_names().map_err(|message| DeployError::Manifest {
            path: self.root.clone(),
            message,
        })
    }
}

impl LocalRepository for FsRepository {
    fn install_path(&self, package: &PackageRef) -> PathBuf {
        self.root.join(package.dir_name())
    }

    fn is_installed(&self, package: &PackageRef) -> bool {
        package.check_names().is_ok() && self.install_path(package).is_dir()
    }

    fn add_package(&self, package: &PackageRef, archive_path: &Path) -> Result<PathBuf> {
        self.check_package(package)?;

        let file = File::open(archive_path).map_err(|e| DeployError::io(archive_path, e))?;
        let mut archive = ZipArchive::new(file).map_err(|source| DeployError::Archive {
            path: archive_path.to_path_buf(),
            source,
        })?;

        let install_path = self.install_path(package);
        if install_path.exists() {
            debug!("Replacing existing {}", install_path.display());
            fs::remove_dir_all(&install_path).map_err(|e| DeployError::io(&install_path, e))?;
        }

        if let Err(e) = unpack(&mut archive, archive_path, &install_path, package) {
            // A partly unpacked directory would count as installed
            if let Err(remove_err) = fs::remove_dir_all(&install_path) {
                warn!("Failed to clean up {}: {}", install_path.display(), remove_err);
            }
            return Err(e);
        }

        Ok(install_path)
    }

    fn remove_package(&self, package: &PackageRef) -> Result<()> {
        self.check_package(package)?;

        let install_path = self.install_path(package);
        if !install_path.exists() {
            return Err(DeployError::NotInstalled(package.clone()));
        }
        fs::remove_dir_all(&install_path).map_err(|e| DeployError::io(&install_path, e))
    }
}

fn unpack(
    archive: &mut ZipArchive<File>,
    archive_path: &Path,
    install_path: &Path,
    package: &PackageRef,
) -> Result<()> {
    fs::create_dir_all(install_path).map_err(|e| DeployError::io(install_path, e))?;
    archive
        .extract(install_path)
        .map_err(|source| DeployError::Archive {
            path: archive_path.to_path_buf(),
            source,
        })?;

    // Keep the archive next to its contents
    let kept = install_path.join(format!("{}.nupkg", package.dir_name()));
    fs::copy(archive_path, &kept).map_err(|e| DeployError::io(&kept, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn write_package(path: &Path) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        writer.start_file("Foo.nuspec", SimpleFileOptions::default()).unwrap();
        writer
            .write_all(b"<package><metadata><id>Foo</id><version>1.0.0</version></metadata></package>")
            .unwrap();
        writer.start_file("lib/net45/Foo.dll", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"MZ").unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_add_and_remove_package() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("Foo.1.0.0.nupkg");
        write_package(&archive);

        let repository = FsRepository::new(temp.path().join("packages"));
        let package = PackageRef::new("Foo", "1.0.0");
        assert!(!repository.is_installed(&package));

        let install_path = repository.add_package(&package, &archive).unwrap();
        assert_eq!(install_path, temp.path().join("packages/Foo.1.0.0"));
        assert!(repository.is_installed(&package));
        assert!(install_path.join("lib/net45/Foo.dll").is_file());
        assert!(install_path.join("Foo.1.0.0.nupkg").is_file());

        repository.remove_package(&package).unwrap();
        assert!(!repository.is_installed(&package));
        assert!(matches!(
            repository.remove_package(&package),
            Err(DeployError::NotInstalled(_))
        ));
    }

    #[test]
    fn test_add_replaces_previous_contents() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("Foo.1.0.0.nupkg");
        write_package(&archive);

        let repository = FsRepository::new(temp.path().join("packages"));
        let package = PackageRef::new("Foo", "1.0.0");
        let install_path = repository.install_path(&package);
        fs::create_dir_all(&install_path).unwrap();
        fs::write(install_path.join("stale.txt"), "old").unwrap();

        repository.add_package(&package, &archive).unwrap();
        assert!(!install_path.join("stale.txt").exists());
        assert!(install_path.join("Foo.nuspec").is_file());
    }

    #[test]
    fn test_add_rejects_non_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("Foo.1.0.0.nupkg");
        fs::write(&archive, "nope").unwrap();

        let repository = FsRepository::new(temp.path().join("packages"));
        let package = PackageRef::new("Foo", "1.0.0");
        assert!(matches!(
            repository.add_package(&package, &archive),
            Err(DeployError::Archive { .. })
        ));
        assert!(!repository.is_installed(&package));
    }

    #[test]
    fn test_failed_extraction_is_not_installed() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("Foo.1.0.0.nupkg");

        let payload = b"payload-payload-payload-payload";
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let stored = || SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file("Foo.nuspec", stored()).unwrap();
        writer
            .write_all(b"<package><metadata><id>Foo</id><version>1.0.0</version></metadata></package>")
            .unwrap();
        writer.start_file("content/data.txt", stored()).unwrap();
        writer.write_all(payload).unwrap();
        let mut bytes = writer.finish().unwrap().into_inner();

        // Corrupt the stored entry so its checksum no longer matches
        let at = bytes
            .windows(payload.len())
            .position(|window| window == payload)
            .unwrap();
        bytes[at] = b'X';
        fs::write(&archive, bytes).unwrap();

        let repository = FsRepository::new(temp.path().join("packages"));
        let package = PackageRef::new("Foo", "1.0.0");
        assert!(repository.add_package(&package, &archive).is_err());
        assert!(!repository.is_installed(&package));
        assert!(!repository.install_path(&package).exists());
    }

    #[test]
    fn test_rejects_names_outside_root() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("Foo.1.0.0.nupkg");
        write_package(&archive);

        let victim = temp.path().join("victim.1.0.0");
        fs::create_dir_all(&victim).unwrap();
        fs::write(victim.join("keep.txt"), "keep").unwrap();

        let repository = FsRepository::new(temp.path().join("packages"));
        fs::create_dir_all(repository.root()).unwrap();
        let package = PackageRef::new("../victim", "1.0.0");

        assert!(matches!(
            repository.add_package(&package, &archive),
            Err(DeployError::Manifest { .. })
        ));
        assert!(matches!(
            repository.remove_package(&package),
            Err(DeployError::Manifest { .. })
        ));
        assert!(!repository.is_installed(&package));
        assert!(!repository.is_installed(&package));
        assert!(victim.join("keep.txt").is_file());
    }
}
