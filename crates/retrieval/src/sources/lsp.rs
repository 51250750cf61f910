use super::RetrievalSource;
use crate::collaborators::FileReader;
use crate::ide::{DocumentSymbol, IdeNavigation, Location, RangeInFile};
use crate::types::{RetrievalArguments, SourceKind};
use async_trait::async_trait;
use context_chunk::Chunk;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

static PASCAL_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-zA-Z0-9]*\b").expect("valid PascalCase pattern"));
static CAMEL_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z][a-zA-Z0-9]*\b").expect("valid camelCase pattern"));
static UPPER_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][A-Z0-9_]+\b").expect("valid UPPER_CASE pattern"));

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "be", "been", "being", "have", "has", "had", "do",
    "does", "did", "will", "would", "should", "could", "may", "might", "can", "this", "that",
    "these", "those", "i", "you", "he", "she", "it", "we", "they",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LspRetrievalConfig {
    pub include_definitions: bool,
    pub include_type_definitions: bool,

    /// References can be expensive for popular symbols
    pub include_references: bool,
    pub max_references_per_symbol: usize,

    /// Lines of surrounding text added on each side of a target range
    pub context_lines: usize,
}

impl Default for LspRetrievalConfig {
    fn default() -> Self {
        Self {
            include_definitions: true,
            include_type_definitions: true,
            include_references: false,
            max_references_per_symbol: 10,
            context_lines: 5,
        }
    }
}

/// Candidate code symbols mentioned in a natural-language query.
///
/// PascalCase, then camelCase/lowercase words, then UPPER_CASE constants;
/// stop words and names of two characters or fewer are dropped, and
/// duplicates are removed case-insensitively (first spelling wins).
pub fn extract_query_symbols(query: &str) -> Vec<String> {
    let matches = PASCAL_CASE
        .find_iter(query)
        .chain(CAMEL_CASE.find_iter(query))
        .chain(UPPER_CASE.find_iter(query))
        .map(|m| m.as_str());

    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    for candidate in matches {
        let lower = candidate.to_lowercase();
        if candidate.chars().count() > 2 && !STOP_WORDS.contains(&lower.as_str()) && seen.insert(lower) {
            symbols.push(candidate.to_string());
        }
    }
    symbols
}

/// Definitions, type definitions and (optionally) references of symbols the
/// query mentions, resolved through the editor's language server
pub struct LspDefinitionsSource {
    ide: Option<Arc<dyn IdeNavigation>>,
    reader: Arc<dyn FileReader>,
    config: LspRetrievalConfig,
}

impl LspDefinitionsSource {
    pub fn new(ide: Option<Arc<dyn IdeNavigation>>, reader: Arc<dyn FileReader>, config: LspRetrievalConfig) -> Self {
        Self { ide, reader, config }
    }

    pub fn config(&self) -> &LspRetrievalConfig {
        &self.config
    }

    async fn ranges_at(&self, ide: &dyn IdeNavigation, location: &Location, symbol: &str) -> Vec<RangeInFile> {
        let mut ranges = Vec::new();

        if self.config.include_definitions {
            match ide.goto_definition(location).await {
                Ok(found) => ranges.extend(found),
                Err(e) => log::debug!("goto_definition failed for {symbol}: {e:#}"),
            }
        }
        if self.config.include_type_definitions {
            match ide.goto_type_definition(location).await {
                Ok(found) => ranges.extend(found),
                Err(e) => log::debug!("goto_type_definition failed for {symbol}: {e:#}"),
            }
        }
        if self.config.include_references {
            match ide.get_references(location).await {
                Ok(found) => ranges.extend(found.into_iter().take(self.config.max_references_per_symbol)),
                Err(e) => log::debug!("get_references failed for {symbol}: {e:#}"),
            }
        }

        ranges
    }

    async fn ranges_to_chunks(&self, ranges: &[RangeInFile]) -> Vec<Chunk> {
        let mut file_cache: HashMap<&str, String> = HashMap::new();
        let mut chunks = Vec::new();

        for target in ranges {
            let filepath = target.filepath.as_str();
            if !file_cache.contains_key(filepath) {
                match self.reader.read_file(filepath).await {
                    Ok(content) => {
                        file_cache.insert(filepath, content);
                    }
                    Err(e) => {
                        log::debug!("Failed to read file for LSP range {filepath}: {e:#}");
                        continue;
                    }
                }
            }
            let Some(content) = file_cache.get(filepath) else {
                continue;
            };

            let lines: Vec<&str> = content.split('\n').collect();
            let start_line = target.range.start.line.saturating_sub(self.config.context_lines);
            if start_line >= lines.len() {
                continue;
            }
            let end_line = (target.range.end.line + self.config.context_lines)
                .min(lines.len() - 1)
                .max(start_line);

            let chunk = Chunk::new(filepath, start_line, end_line, lines[start_line..=end_line].join("\n"))
                .with_index(chunks.len())
                .with_metadata("source", "lsp")
                .with_metadata("targetRange", json!(target.range))
                .with_metadata("contextLines", self.config.context_lines);
            chunks.push(chunk);
        }

        chunks
    }
}

#[async_trait]
impl RetrievalSource for LspDefinitionsSource {
    fn kind(&self) -> SourceKind {
        SourceKind::LspDefinitions
    }

    async fn retrieve(&self, args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        let Some(ide) = self.ide.as_deref() else {
            log::debug!("No IDE navigation available, skipping LSP retrieval");
            return Ok(Vec::new());
        };
        let Some(current_file) = args.current_file.as_deref() else {
            log::debug!("LSP retrieval skipped: no current file");
            return Ok(Vec::new());
        };

        let symbols = extract_query_symbols(&args.query);
        if symbols.is_empty() {
            log::debug!("LSP retrieval skipped: no symbols in query");
            return Ok(Vec::new());
        }

        let document_symbols = match ide.get_document_symbols(current_file).await {
            Ok(found) => found,
            Err(e) => {
                log::debug!("Failed to get document symbols for {current_file}: {e:#}");
                return Ok(Vec::new());
            }
        };

        let mut ranges = Vec::new();
        for symbol in &symbols {
            for matched in find_matching_symbols(&document_symbols, symbol) {
                let location = Location {
                    filepath: current_file.to_string(),
                    position: matched.range.start,
                };
                ranges.extend(self.ranges_at(ide, &location, symbol).await);
            }
        }

        let total_ranges = ranges.len();
        let unique = dedup_ranges(ranges);
        let mut chunks = self.ranges_to_chunks(&unique).await;
        chunks.truncate(args.n_retrieve);

        log::debug!(
            "LSP retrieval: {} symbols, {} ranges ({} unique), {} chunks",
            symbols.len(),
            total_ranges,
            unique.len(),
            chunks.len()
        );
        Ok(chunks)
    }
}

/// Symbols whose name equals or contains `name`, depth-first through children
fn find_matching_symbols<'a>(symbols: &'a [DocumentSymbol], name: &str) -> Vec<&'a DocumentSymbol> {
    let mut matches = Vec::new();
    for symbol in symbols {
        if symbol.name.contains(name) {
            matches.push(symbol);
        }
        matches.extend(find_matching_symbols(&symbol.children, name));
    }
    matches
}

fn dedup_ranges(ranges: Vec<RangeInFile>) -> Vec<RangeInFile> {
    let mut seen = HashSet::new();
    ranges
        .into_iter()
        .filter(|range| seen.insert(range.clone()))
        .collect()
}
