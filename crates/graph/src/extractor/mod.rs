//! Import extraction seam.
//!
//! The graph builder never parses files itself; it asks an [`ImportExtractor`]
//! for the resolved import targets of a path.

mod memory;
mod source;

pub use memory::InMemoryImportExtractor;
pub use source::{ImportLanguage, SourceImportExtractor};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Produces the resolved imports of a file.
///
/// Returns `None` when the file is unknown or cannot be analyzed; the
/// builder treats that as a file without imports.
pub trait ImportExtractor: Send + Sync {
    fn extract(&self, filepath: &str) -> Option<FileImports>;
}

/// One resolved import target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDefinition {
    pub resolved_filepath: String,
}

/// Imports of one file, grouped by an extractor-defined key (statement kind)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileImports {
    pub groups: BTreeMap<String, Vec<ImportDefinition>>,
}

impl FileImports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, group: impl Into<String>, resolved_filepath: impl Into<String>) {
        self.groups
            .entry(group.into())
            .or_default()
            .push(ImportDefinition {
                resolved_filepath: resolved_filepath.into(),
            });
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }

    /// Every resolved target across all groups, first occurrence wins
    pub fn resolved_paths(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.groups
            .values()
            .flatten()
            .filter(|def| seen.insert(def.resolved_filepath.as_str()))
            .map(|def| def.resolved_filepath.clone())
            .collect()
    }
}
