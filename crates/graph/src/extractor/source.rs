use super::{FileImports, ImportExtractor};
use crate::error::{GraphError, Result};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Languages the source extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportLanguage {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
}

impl ImportLanguage {
    pub const EXTENSIONS: &'static [&'static str] = &[
        "rs", "py", "pyw", "js", "jsx", "mjs", "cjs", "ts", "mts", "cts", "tsx",
    ];

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "rs" => Some(Self::Rust),
            "py" | "pyw" => Some(Self::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        match self {
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Extensions tried, in order, for extensionless JS/TS specifiers
const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts"];

/// Import statement before resolution against the filesystem
#[derive(Debug)]
enum RawImport {
    /// JS/TS module specifier (`import`, `export ... from`, `require`, `import()`)
    Script {
        group: &'static str,
        specifier: String,
    },

    /// Python `import a.b` or `from ..a import b`
    Python {
        group: &'static str,
        level: usize,
        module: Vec<String>,
        names: Vec<String>,
    },

    /// Rust out-of-line `mod name;`
    RustModule { name: String },
}

impl RawImport {
    fn group(&self) -> &'static str {
        match self {
            Self::Script { group, .. } | Self::Python { group, .. } => group,
            Self::RustModule { .. } => "mod",
        }
    }
}

/// Extracts file-level imports from source files on disk using tree-sitter.
///
/// Only imports that resolve to an existing file are reported: relative
/// JS/TS specifiers, Python relative imports (and absolute ones found under a
/// configured root or next to the importing file), and Rust `mod` items.
/// Resolved paths keep the prefix style of the importing path, so graph keys
/// stay consistent with the file list the graph was built from.
#[derive(Debug, Clone, Default)]
pub struct SourceImportExtractor {
    python_roots: Vec<PathBuf>,
}

impl SourceImportExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory searched for absolute Python imports
    #[must_use]
    pub fn with_python_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.python_roots.push(root.into());
        self
    }

    pub fn extract_file(&self, path: &Path) -> Result<FileImports> {
        let language = ImportLanguage::from_path(path)
            .ok_or_else(|| GraphError::UnsupportedLanguage(path.display().to_string()))?;
        let source = std::fs::read_to_string(path)?;

        let mut parser = Parser::new();
        parser
            .set_language(&language.grammar())
            .map_err(|e| GraphError::parse(path.display().to_string(), format!("Failed to set language: {e}")))?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| GraphError::parse(path.display().to_string(), "parser returned no tree"))?;

        let mut raw = Vec::new();
        match language {
            ImportLanguage::Rust => collect_rust(tree.root_node(), &source, &mut raw),
            ImportLanguage::Python => collect_python(tree.root_node(), &source, &mut raw),
            ImportLanguage::JavaScript | ImportLanguage::TypeScript | ImportLanguage::Tsx => {
                collect_script(tree.root_node(), &source, &mut raw);
            }
        }

        let mut imports = FileImports::new();
        for import in &raw {
            for target in self.resolve(path, import) {
                imports.add(import.group(), target.to_string_lossy().into_owned());
            }
        }

        log::debug!(
            "Extracted {} of {} import statements from {}",
            imports.resolved_paths().len(),
            raw.len(),
            path.display()
        );
        Ok(imports)
    }

    fn resolve(&self, path: &Path, import: &RawImport) -> Vec<PathBuf> {
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        match import {
            RawImport::Script { specifier, .. } => resolve_script(base, specifier).into_iter().collect(),
            RawImport::Python {
                level,
                module,
                names,
                ..
            } => self.resolve_python(base, *level, module, names),
            RawImport::RustModule { name } => resolve_rust_module(path, base, name).into_iter().collect(),
        }
    }

    fn resolve_python(&self, base: &Path, level: usize, module: &[String], names: &[String]) -> Vec<PathBuf> {
        let anchors: Vec<PathBuf> = if level > 0 {
            let mut anchor = base.to_path_buf();
            for _ in 1..level {
                anchor = normalize(&anchor.join(".."));
            }
            vec![anchor]
        } else {
            std::iter::once(base.to_path_buf())
                .chain(self.python_roots.iter().cloned())
                .collect()
        };

        for anchor in anchors {
            let module_dir = module.iter().fold(anchor, |dir, segment| dir.join(segment));
            let mut found = Vec::new();

            if !module.is_empty() {
                found.extend(python_module(&module_dir));
            }
            for name in names {
                found.extend(python_module(&module_dir.join(name)));
            }
            if found.is_empty() && module.is_empty() {
                found.extend(existing(module_dir.join("__init__.py")));
            }

            if !found.is_empty() {
                return found;
            }
        }

        Vec::new()
    }
}

impl ImportExtractor for SourceImportExtractor {
    fn extract(&self, filepath: &str) -> Option<FileImports> {
        match self.extract_file(Path::new(filepath)) {
            Ok(imports) => Some(imports),
            Err(e) => {
                log::debug!("Skipping import extraction for {filepath}: {e}");
                None
            }
        }
    }
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

fn collect_script(node: Node, source: &str, out: &mut Vec<RawImport>) {
    match node.kind() {
        kind @ ("import_statement" | "export_statement") => {
            if let Some(specifier) = node.child_by_field_name("source") {
                out.push(RawImport::Script {
                    group: if kind == "import_statement" { "import" } else { "export" },
                    specifier: unquote(node_text(specifier, source)),
                });
            }
        }
        "call_expression" => {
            if let (Some(function), Some(arguments)) = (
                node.child_by_field_name("function"),
                node.child_by_field_name("arguments"),
            ) {
                let group = match function.kind() {
                    "import" => Some("dynamic_import"),
                    "identifier" if node_text(function, source) == "require" => Some("require"),
                    _ => None,
                };
                let first = arguments.named_child(0).filter(|arg| arg.kind() == "string");
                if let (Some(group), Some(arg)) = (group, first) {
                    out.push(RawImport::Script {
                        group,
                        specifier: unquote(node_text(arg, source)),
                    });
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_script(child, source, out);
    }
}

fn collect_python(node: Node, source: &str, out: &mut Vec<RawImport>) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                out.push(RawImport::Python {
                    group: "import",
                    level: 0,
                    module: dotted_segments(python_name(name, source)),
                    names: Vec::new(),
                });
            }
            return;
        }
        "import_from_statement" => {
            let (level, module) = match node.child_by_field_name("module_name") {
                Some(module) if module.kind() == "relative_import" => {
                    let mut level = 0;
                    let mut segments = Vec::new();
                    let mut cursor = module.walk();
                    for child in module.named_children(&mut cursor) {
                        match child.kind() {
                            "import_prefix" => level = node_text(child, source).matches('.').count(),
                            "dotted_name" => segments = dotted_segments(node_text(child, source)),
                            _ => {}
                        }
                    }
                    (level, segments)
                }
                Some(module) => (0, dotted_segments(node_text(module, source))),
                None => (0, Vec::new()),
            };

            let mut cursor = node.walk();
            let names = node
                .children_by_field_name("name", &mut cursor)
                .map(|name| python_name(name, source).to_string())
                .filter(|name| !name.is_empty() && !name.contains('.'))
                .collect();

            out.push(RawImport::Python {
                group: "from_import",
                level,
                module,
                names,
            });
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_python(child, source, out);
    }
}

/// Module path of a `dotted_name` or the original name of an `aliased_import`
fn python_name<'a>(node: Node, source: &'a str) -> &'a str {
    match node.kind() {
        "aliased_import" => node
            .child_by_field_name("name")
            .map(|name| node_text(name, source))
            .unwrap_or(""),
        _ => node_text(node, source),
    }
}

fn dotted_segments(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn collect_rust(node: Node, source: &str, out: &mut Vec<RawImport>) {
    if node.kind() == "mod_item" && node.child_by_field_name("body").is_none() {
        if let Some(name) = node.child_by_field_name("name") {
            out.push(RawImport::RustModule {
                name: node_text(name, source).to_string(),
            });
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_rust(child, source, out);
    }
}

fn resolve_script(base: &Path, specifier: &str) -> Option<PathBuf> {
    if !specifier.starts_with('.') {
        return None;
    }

    let target = normalize(&base.join(specifier));
    if target.is_file() {
        return Some(target);
    }

    // ESM TypeScript imports name the emitted `.js` file
    let script_ext = target
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "js" | "jsx" | "mjs" | "cjs"));
    if script_ext {
        for ext in ["ts", "tsx", "mts", "cts"] {
            if let Some(found) = existing(target.with_extension(ext)) {
                return Some(found);
            }
        }
    }

    SCRIPT_EXTENSIONS
        .iter()
        .find_map(|ext| existing(with_added_extension(&target, ext)))
        .or_else(|| {
            SCRIPT_EXTENSIONS
                .iter()
                .find_map(|ext| existing(target.join(format!("index.{ext}"))))
        })
}

fn resolve_rust_module(path: &Path, base: &Path, name: &str) -> Option<PathBuf> {
    let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("");
    let dir = if matches!(stem, "lib" | "main" | "mod") {
        base.to_path_buf()
    } else {
        base.join(stem)
    };

    existing(dir.join(format!("{name}.rs"))).or_else(|| existing(dir.join(name).join("mod.rs")))
}

fn python_module(path: &Path) -> Option<PathBuf> {
    existing(with_added_extension(path, "py")).or_else(|| existing(path.join("__init__.py")))
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

fn with_added_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Lexically resolve `.` and `..` without touching the filesystem.
/// A leading `./` is kept so keys match the scanner's output.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir if out.as_os_str().is_empty() => out.push("."),
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
