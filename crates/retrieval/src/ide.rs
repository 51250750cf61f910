use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Zero-based line/character position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub const fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range covering whole lines `start..=end`
    pub const fn lines(start: usize, end: usize) -> Self {
        Self {
            start: Position::new(start, 0),
            end: Position::new(end, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub filepath: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeInFile {
    pub filepath: String,
    pub range: Range,
}

/// Node of an editor's document-symbol tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSymbol {
    pub name: String,
    pub range: Range,
    #[serde(default)]
    pub children: Vec<DocumentSymbol>,
}

impl DocumentSymbol {
    pub fn new(name: impl Into<String>, range: Range) -> Self {
        Self {
            name: name.into(),
            range,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<DocumentSymbol>) -> Self {
        self.children = children;
        self
    }
}

/// Language-server navigation exposed by the editor
#[async_trait]
pub trait IdeNavigation: Send + Sync {
    async fn goto_definition(&self, location: &Location) -> anyhow::Result<Vec<RangeInFile>>;

    async fn goto_type_definition(&self, location: &Location) -> anyhow::Result<Vec<RangeInFile>>;

    async fn get_references(&self, location: &Location) -> anyhow::Result<Vec<RangeInFile>>;

    async fn get_document_symbols(&self, filepath: &str) -> anyhow::Result<Vec<DocumentSymbol>>;
}
