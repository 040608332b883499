//! Type registry for assemblies delivered by packages.

use log::info;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::{DeployError, Result};

/// Makes the types of a newly copied assembly available to the running application.
///
/// This is the one dynamic extension point of the deployer: hosts plug in
/// whatever loads code modules at runtime.
pub trait TypeRegistry: Send + Sync {
    fn register_assembly(&self, path: &Path) -> Result<()>;
}

/// Keeps track of registered assemblies in memory.
#[derive(Debug, Default)]
pub struct AssemblyRegistry {
    assemblies: Mutex<Vec<PathBuf>>,
}

impl AssemblyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered assemblies, in registration order.
    pub fn assemblies(&self) -> Vec<PathBuf> {
        self.assemblies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.assemblies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|p| p == path)
    }
}

impl TypeRegistry for AssemblyRegistry {
    fn register_assembly(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(DeployError::Registry {
                path: path.to_path_buf(),
                message: "assembly file does not exist".to_string(),
            });
        }

        let mut assemblies = self.assemblies.lock().unwrap_or_else(PoisonError::into_inner);
        if !assemblies.iter().any(|p| p == path) {
            info!("Registered assembly {}", path.display());
            assemblies.push(path.to_path_buf());
        }
        Ok(())
    }
}
