//! Process-wide rule table.
//!
//! `load_rules` initialises the table on first use; the table is immutable
//! afterwards and lives until the process exits. Two threads racing through
//! the first load both parse the document, the first to finish is kept.

use lazy_static::lazy_static;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{MappingRules, Result, RuleError};

lazy_static! {
    static ref LOADED_RULES: RwLock<Option<Arc<MappingRules>>> = RwLock::new(None);
}

/// Load the process-wide rule table from `path`.
///
/// Once a table is loaded, later calls return it without reading `path`.
pub fn load_rules(path: &Path) -> Result<Arc<MappingRules>> {
    if let Some(rules) = loaded() {
        return Ok(rules);
    }

    let rules = Arc::new(MappingRules::load(path)?);
    let mut slot = LOADED_RULES.write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(slot.get_or_insert(rules)))
}

/// The process-wide rule table, if `load_rules` has succeeded.
pub fn rules() -> Result<Arc<MappingRules>> {
    loaded().ok_or(RuleError::NotLoaded)
}

fn loaded() -> Option<Arc<MappingRules>> {
    LOADED_RULES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
