//! # Context Graph
//!
//! File-level import dependency graph for code-context retrieval.
//!
//! ## Features
//!
//! - **Import graph** - one node per file, one edge per distinct import
//! - **Related files** - breadth-first neighborhood by depth and direction
//! - **Import chains** - shortest path along import edges
//! - **Cycle detection** - iterative DFS, safe on very deep graphs
//! - **Statistics** - degree rankings and isolated files
//!
//! ## Architecture
//!
//! ```text
//! file list (SourceFileScanner or caller)
//!     │
//!     ├──> ImportExtractor
//!     │      ├─ SourceImportExtractor (tree-sitter: JS/TS, Python, Rust)
//!     │      └─ InMemoryImportExtractor (tables, tests)
//!     │
//!     ├──> DependencyGraphBuilder
//!     │      ├─ Scan each file once (Referenced -> Scanned)
//!     │      └─ Add unique importer -> imported edges
//!     │
//!     └──> DependencyGraph (petgraph arena + path index)
//!            ├─ find_related_files / get_import_chain
//!            ├─ detect_circular_dependencies
//!            └─ get_stats
//! ```
//!
//! ## Example
//!
//! ```rust
//! use context_graph::{BuildOptions, DependencyGraphBuilder, FindRelatedOptions, InMemoryImportExtractor};
//!
//! let builder = DependencyGraphBuilder::from_extractor(
//!     InMemoryImportExtractor::new()
//!         .with_imports("app.ts", ["db.ts"])
//!         .with_imports("db.ts", ["config.ts"]),
//! );
//! let graph = builder.build(&["app.ts", "db.ts"], &BuildOptions::default());
//!
//! let related = graph.find_related_files("app.ts", &FindRelatedOptions::default());
//! assert_eq!(related.all_files, vec!["db.ts", "config.ts"]);
//!
//! let chain = graph.get_import_chain("app.ts", "config.ts").unwrap();
//! assert_eq!(chain.length, 2);
//! ```

mod builder;
mod cycles;
mod error;
mod extractor;
mod graph;
mod scanner;
mod stats;
mod traversal;
mod types;

pub use builder::DependencyGraphBuilder;
pub use error::{GraphError, Result};
pub use extractor::{
    FileImports, ImportDefinition, ImportExtractor, ImportLanguage, InMemoryImportExtractor,
    SourceImportExtractor,
};
pub use graph::DependencyGraph;
pub use scanner::SourceFileScanner;
pub use types::{
    BuildOptions, Cycle, DependencyGraphStats, DependencyNode, Direction, FileDegree,
    FindRelatedOptions, GraphMetadata, ImportChain, NodeState, RelatedFilesResult,
};
