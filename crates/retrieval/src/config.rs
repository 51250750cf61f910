//! Retrieval configuration.
//!
//! Loaded from TOML; every key is optional and falls back to the compiled
//! default. `CONTEXT_RETRIEVAL_CONFIG` may point at a config file.

use crate::collaborators::LogTelemetry;
use crate::coordinator::RetrievalCoordinator;
use crate::error::{Result, RetrievalError};
use crate::fusion::FusionOptions;
use crate::observer::{RetrievalLogger, RetrievalLoggerConfig};
use crate::pipeline::{RetrievalPipeline, DEFAULT_N_FINAL};
use crate::sources::{LspRetrievalConfig, RecentFilesTracker, SourceRegistry};
use crate::types::{SourceConfig, DEFAULT_N_RETRIEVE};
use context_chunk::LineChunker;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Environment variable holding the path of a TOML config file
pub const CONFIG_ENV_VAR: &str = "CONTEXT_RETRIEVAL_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub sources: SourceConfig,
    pub fusion: FusionOptions,
    pub logger: RetrievalLoggerConfig,
    pub lsp: LspRetrievalConfig,

    /// Per-source chunk cap
    pub n_retrieve: usize,

    /// Chunks kept after fusion
    pub n_final: usize,

    pub max_chunk_tokens: usize,
    pub recent_files_capacity: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),
            fusion: FusionOptions::default(),
            logger: RetrievalLoggerConfig::default(),
            lsp: LspRetrievalConfig::default(),
            n_retrieve: DEFAULT_N_RETRIEVE,
            n_final: DEFAULT_N_FINAL,
            max_chunk_tokens: LineChunker::DEFAULT_MAX_CHUNK_TOKENS,
            recent_files_capacity: RecentFilesTracker::DEFAULT_CAPACITY,
        }
    }
}

impl RetrievalConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("Loaded retrieval config from {}", path.display());
        Ok(config)
    }

    /// Config from the file named by [`CONFIG_ENV_VAR`], or defaults when unset
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_retrieve == 0 {
            return Err(RetrievalError::config("n_retrieve must be greater than 0"));
        }
        if self.n_final == 0 {
            return Err(RetrievalError::config("n_final must be greater than 0"));
        }
        if self.max_chunk_tokens == 0 {
            return Err(RetrievalError::config("max_chunk_tokens must be greater than 0"));
        }
        self.fusion.validate()
    }

    pub fn chunker(&self) -> Result<LineChunker> {
        Ok(LineChunker::new(self.max_chunk_tokens)?)
    }

    pub fn recent_files_tracker(&self) -> RecentFilesTracker {
        RecentFilesTracker::new(self.recent_files_capacity)
    }

    /// Coordinator over `registry` with this config's source selection,
    /// a [`RetrievalLogger`] (when enabled) and log-backed telemetry
    pub fn coordinator(&self, registry: SourceRegistry) -> RetrievalCoordinator {
        let coordinator = RetrievalCoordinator::new(registry)
            .with_default_sources(self.sources)
            .with_telemetry(Arc::new(LogTelemetry));

        if self.logger.enabled {
            coordinator.with_observer(Arc::new(RetrievalLogger::new(self.logger.clone())))
        } else {
            coordinator
        }
    }

    /// Chunks kept after fusion: `n_final` capped by `fusion.max_chunks`
    pub fn final_limit(&self) -> usize {
        self.n_final.min(self.fusion.max_chunks)
    }

    pub fn pipeline(&self, registry: SourceRegistry) -> RetrievalPipeline {
        RetrievalPipeline::new(self.coordinator(registry)).with_limits(self.n_retrieve, self.final_limit())
    }
}
