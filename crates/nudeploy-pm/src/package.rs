//! Package identity and `.nuspec` manifest reading.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path};
use zip::ZipArchive;

use crate::{DeployError, Result};

/// Identity of an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    pub id: String,
    pub version: String,
}

impl PackageRef {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }

    /// Directory name used in the local package repository (`Foo.1.2.0`).
    pub fn dir_name(&self) -> String {
        format!("{}.{}", self.id, self.version)
    }

    /// Check that `id` and `version` are plain names, so that [`PackageRef::dir_name`]
    /// stays a single directory below the repository root.
    pub fn check_names(&self) -> std::result::Result<(), String> {
        check_name("id", &self.id)?;
        check_name("version", &self.version)?;
        check_name("directory name", &self.dir_name())
    }

    /// Read the identity from the `.nuspec` manifest at the root of a package archive.
    pub fn from_archive(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| DeployError::io(path, e))?;
        let mut archive = ZipArchive::new(file).map_err(|source| DeployError::Archive {
            path: path.to_path_buf(),
            source,
        })?;

        let manifest_name = archive
            .file_names()
            .find(|name| !name.contains('/') && name.to_ascii_lowercase().ends_with(".nuspec"))
            .map(str::to_string)
            .ok_or_else(|| DeployError::Manifest {
                path: path.to_path_buf(),
                message: "no .nuspec file at the archive root".to_string(),
            })?;

        let mut xml = String::new();
        archive
            .by_name(&manifest_name)
            .map_err(|source| DeployError::Archive {
                path: path.to_path_buf(),
                source,
            })?
            .read_to_string(&mut xml)
            .map_err(|e| DeployError::io(path, e))?;

        parse_nuspec(&xml).map_err(|message| DeployError::Manifest {
            path: path.to_path_buf(),
            message,
        })
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// Extract `package/metadata/id` and `package/metadata/version`.
pub fn parse_nuspec(xml: &str) -> std::result::Result<PackageRef, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut id = None;
    let mut version = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => stack.push(e.local_name().as_ref().to_vec()),
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(text) if stack.len() == 3 && stack[1] == b"metadata" => {
                let value = text.unescape().map_err(|e| e.to_string())?.into_owned();
                match stack[2].as_slice() {
                    b"id" => id = Some(value),
                    b"version" => version = Some(value),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let id = id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| "missing <id> in <metadata>".to_string())?;
    let version = version
        .filter(|version| !version.is_empty())
        .ok_or_else(|| "missing <version> in <metadata>".to_string())?;

    let package = PackageRef::new(id, version);
    package.check_names()?;
    Ok(package)
}

fn check_name(kind: &str, value: &str) -> std::result::Result<(), String> {
    let mut components = Path::new(value).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == value
    );

    if !single || value.contains(['/', '\\']) || value.contains("..") {
        return Err(format!("invalid package {} '{}'", kind, value));
    }
    Ok(())
}
