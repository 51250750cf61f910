use super::{FileImports, ImportExtractor};
use std::collections::HashMap;

/// Import table held in memory, keyed by file path
#[derive(Debug, Clone, Default)]
pub struct InMemoryImportExtractor {
    files: HashMap<String, FileImports>,
}

impl InMemoryImportExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `filepath` with the given import targets in group `"imports"`
    #[must_use]
    pub fn with_imports<I, S>(mut self, filepath: impl Into<String>, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut file_imports = FileImports::new();
        for target in imports {
            file_imports.add("imports", target);
        }
        self.files.insert(filepath.into(), file_imports);
        self
    }

    pub fn insert(&mut self, filepath: impl Into<String>, imports: FileImports) {
        self.files.insert(filepath.into(), imports);
    }
}

impl ImportExtractor for InMemoryImportExtractor {
    fn extract(&self, filepath: &str) -> Option<FileImports> {
        self.files.get(filepath).cloned()
    }
}
