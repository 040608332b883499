//! Mapping rules for relocating package content into a web application tree.
//!
//! A rule document names packages and, per package, which top-level content
//! directory goes where. Directories without a rule follow the default layout:
//! `scripts` and `content` land under the front-end assets root, everything
//! else directly under the application root.

mod error;
mod layout;
mod remap;
mod rules;
mod store;

pub use error::RuleError;
pub use layout::AppLayout;
pub use remap::{expand_version, PathRemapper, VERSION_TOKEN};
pub use rules::{MappingRules, PackageRule, PathMapping};
pub use store::{load_rules, rules};

pub type Result<T> = std::result::Result<T, RuleError>;
