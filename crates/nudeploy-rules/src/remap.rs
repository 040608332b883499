//! Destination lookup for package content files.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::layout::AppLayout;
use crate::rules::MappingRules;

/// Placeholder replaced with the package version in destination templates.
pub const VERSION_TOKEN: &str = "{ver}";

/// Substitute the version into a destination template.
///
/// Plain string replacement of the literal token, the version is not reformatted.
pub fn expand_version(template: &str, version: &str) -> String {
    template.replace(VERSION_TOKEN, version)
}

/// Computes where a content file of a package ends up in the application.
#[derive(Debug, Clone)]
pub struct PathRemapper {
    rules: Arc<MappingRules>,
    layout: AppLayout,
}

impl PathRemapper {
    pub fn new(rules: Arc<MappingRules>, layout: AppLayout) -> Self {
        Self { rules, layout }
    }

    pub fn rules(&self) -> &MappingRules {
        &self.rules
    }

    pub fn layout(&self) -> &AppLayout {
        &self.layout
    }

    /// Resolve the destination of `relative_file`, found below the content
    /// directory `top_dir` of package `package_id` at `version`.
    ///
    /// A matching rule wins; otherwise `scripts` and `content` go below the
    /// front-end root and any other directory below the application root,
    /// keeping the directory name.
    pub fn resolve(
        &self,
        relative_file: impl AsRef<Path>,
        top_dir: &str,
        package_id: &str,
        version: &str,
    ) -> PathBuf {
        let mut target = match self.rules.mapping(package_id, top_dir) {
            Some(mapping) => self.layout.resolve(&expand_version(&mapping.to, version)),
            None if self.layout.is_frontend_dir(top_dir) => self.layout.frontend_root().join(top_dir),
            None => self.layout.root().join(top_dir),
        };

        for component in relative_file.as_ref().components() {
            if let Component::Normal(part) = component {
                target.push(part);
            }
        }

        target
    }
}
