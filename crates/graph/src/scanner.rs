use crate::extractor::ImportLanguage;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Finds source files whose imports can be extracted (.gitignore aware)
pub struct SourceFileScanner {
    root: PathBuf,
}

impl SourceFileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Supported source files under the root, sorted
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);
        builder.filter_entry(move |entry| !Self::is_ignored_scope(entry.path(), &root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    if !entry.file_type().is_some_and(|file_type| file_type.is_file()) {
                        continue;
                    }

                    let path = entry.path();
                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > MAX_FILE_SIZE_BYTES {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                MAX_FILE_SIZE_BYTES
                            );
                            continue;
                        }
                    }

                    if ImportLanguage::from_path(path).is_some() {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("Found {} source files", files.len());
        files
    }

    /// Same as [`Self::scan`], as graph keys
    pub fn scan_paths(&self) -> Vec<String> {
        self.scan()
            .into_iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect()
    }

    fn is_ignored_scope(path: &Path, root: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        relative.components().any(|component| match component {
            std::path::Component::Normal(name) => {
                let lowered = name.to_string_lossy().to_lowercase();
                IGNORED_SCOPES.contains(&lowered.as_str())
            }
            _ => false,
        })
    }
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    // caches / builds
    ".cache",
    "node_modules",
    ".next",
    ".turbo",
    "build",
    "dist",
    "coverage",
    "target",
    ".venv",
    "venv",
    "__pycache__",
    // vendored code
    "vendor",
    "third_party",
];

const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MB
