use crate::types::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Lifecycle events of one `retrieve_all` call.
///
/// Passed explicitly to the coordinator; implementations must not block or panic.
pub trait RetrievalObserver: Send + Sync {
    fn retrieval_started(&self, retrieval_id: &str, query: &str, n_retrieve: usize, sources: &[SourceKind]);

    fn source_started(&self, retrieval_id: &str, source: SourceKind);

    fn source_completed(&self, retrieval_id: &str, source: SourceKind, chunks: usize, duration_ms: u64);

    fn source_failed(&self, retrieval_id: &str, source: SourceKind, error: &str, duration_ms: u64);

    fn retrieval_completed(&self, retrieval_id: &str, total_chunks: usize);

    /// The retrieval was dropped before every source finished
    fn retrieval_cancelled(&self, retrieval_id: &str);
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RetrievalObserver for NoopObserver {
    fn retrieval_started(&self, _: &str, _: &str, _: usize, _: &[SourceKind]) {}
    fn source_started(&self, _: &str, _: SourceKind) {}
    fn source_completed(&self, _: &str, _: SourceKind, _: usize, _: u64) {}
    fn source_failed(&self, _: &str, _: SourceKind, _: &str, _: u64) {}
    fn retrieval_completed(&self, _: &str, _: usize) {}
    fn retrieval_cancelled(&self, _: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalLogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalLoggerConfig {
    pub enabled: bool,

    /// Events below this level are dropped
    pub level: RetrievalLogLevel,

    /// Dump the full retrieval context at start
    pub debug_mode: bool,

    /// Build and keep per-retrieval performance metrics
    pub log_performance: bool,

    /// Number of metrics records kept in memory
    pub history_limit: usize,
}

impl Default for RetrievalLoggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: RetrievalLogLevel::Info,
            debug_mode: false,
            log_performance: true,
            history_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Started,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLogEntry {
    pub source: SourceKind,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_retrieved: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetric {
    pub source: SourceKind,
    pub duration_ms: u64,
    pub chunks_retrieved: usize,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalPerformanceMetrics {
    pub retrieval_id: String,
    pub total_duration_ms: u64,
    pub total_chunks: usize,
    pub source_metrics: Vec<SourceMetric>,
    pub query: String,

    /// Unix time in milliseconds
    pub timestamp: u64,
}

struct ActiveRetrieval {
    query: String,
    started: Instant,
    entries: Vec<SourceLogEntry>,
}

#[derive(Default)]
struct LoggerState {
    active: HashMap<String, ActiveRetrieval>,
    history: VecDeque<RetrievalPerformanceMetrics>,
}

/// Structured retrieval logging on top of the `log` facade.
///
/// Tracks in-flight retrievals and keeps a bounded history of performance
/// metrics for completed ones.
pub struct RetrievalLogger {
    config: RetrievalLoggerConfig,
    state: Mutex<LoggerState>,
}

impl RetrievalLogger {
    pub fn new(config: RetrievalLoggerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LoggerState::default()),
        }
    }

    pub fn config(&self) -> &RetrievalLoggerConfig {
        &self.config
    }

    /// Metrics of recently completed retrievals, oldest first
    pub fn recent_metrics(&self) -> Vec<RetrievalPerformanceMetrics> {
        self.state().history.iter().cloned().collect()
    }

    /// Number of retrievals started but not yet completed
    pub fn active_retrievals(&self) -> usize {
        self.state().active.len()
    }

    fn should_log(&self, level: RetrievalLogLevel) -> bool {
        self.config.enabled && level >= self.config.level
    }

    // Logging state stays usable after a panic elsewhere
    fn state(&self) -> MutexGuard<'_, LoggerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_entry(&self, retrieval_id: &str, entry: SourceLogEntry) {
        if let Some(active) = self.state().active.get_mut(retrieval_id) {
            active.entries.push(entry);
        }
    }

    fn record_metrics(&self, metrics: RetrievalPerformanceMetrics) {
        if self.should_log(RetrievalLogLevel::Info) {
            match serde_json::to_string(&metrics) {
                Ok(json) => log::info!("[Retrieval] Performance metrics {json}"),
                Err(_) => log::info!("[Retrieval] Performance metrics {metrics:?}"),
            }
        }

        let mut state = self.state();
        state.history.push_back(metrics);
        while state.history.len() > self.config.history_limit {
            state.history.pop_front();
        }
    }
}

impl Default for RetrievalLogger {
    fn default() -> Self {
        Self::new(RetrievalLoggerConfig::default())
    }
}

impl RetrievalObserver for RetrievalLogger {
    fn retrieval_started(&self, retrieval_id: &str, query: &str, n_retrieve: usize, sources: &[SourceKind]) {
        self.state().active.insert(
            retrieval_id.to_string(),
            ActiveRetrieval {
                query: query.to_string(),
                started: Instant::now(),
                entries: Vec::new(),
            },
        );

        if self.should_log(RetrievalLogLevel::Info) {
            log::info!(
                "[Retrieval] Started retrieval {retrieval_id} query={query:?} n_retrieve={n_retrieve} sources={sources:?}"
            );
        }
        if self.config.enabled && self.config.debug_mode {
            log::debug!(
                "[Retrieval] Debug - full context: id={retrieval_id} query={query:?} n_retrieve={n_retrieve} sources={sources:?}"
            );
        }
    }

    fn source_started(&self, retrieval_id: &str, source: SourceKind) {
        self.push_entry(
            retrieval_id,
            SourceLogEntry {
                source,
                status: SourceStatus::Started,
                duration_ms: None,
                chunks_retrieved: None,
                error: None,
            },
        );

        if self.should_log(RetrievalLogLevel::Debug) {
            log::debug!("[Retrieval] Source {source} started ({retrieval_id})");
        }
    }

    fn source_completed(&self, retrieval_id: &str, source: SourceKind, chunks: usize, duration_ms: u64) {
        self.push_entry(
            retrieval_id,
            SourceLogEntry {
                source,
                status: SourceStatus::Completed,
                duration_ms: Some(duration_ms),
                chunks_retrieved: Some(chunks),
                error: None,
            },
        );

        if self.should_log(RetrievalLogLevel::Info) {
            log::info!("[Retrieval] Source {source} completed ({retrieval_id}): {chunks} chunks in {duration_ms}ms");
        }
    }

    fn source_failed(&self, retrieval_id: &str, source: SourceKind, error: &str, duration_ms: u64) {
        self.push_entry(
            retrieval_id,
            SourceLogEntry {
                source,
                status: SourceStatus::Error,
                duration_ms: Some(duration_ms),
                chunks_retrieved: None,
                error: Some(error.to_string()),
            },
        );

        if self.should_log(RetrievalLogLevel::Error) {
            log::error!("[Retrieval] Source {source} failed ({retrieval_id}) after {duration_ms}ms: {error}");
        }
    }

    fn retrieval_completed(&self, retrieval_id: &str, total_chunks: usize) {
        let Some(active) = self.state().active.remove(retrieval_id) else {
            log::warn!("[Retrieval] No context found for {retrieval_id}");
            return;
        };

        let total_duration_ms = u64::try_from(active.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if self.should_log(RetrievalLogLevel::Info) {
            log::info!(
                "[Retrieval] Completed retrieval {retrieval_id}: {total_chunks} chunks in {total_duration_ms}ms (query={:?})",
                active.query
            );
        }

        if !self.config.log_performance {
            return;
        }

        let source_metrics = active
            .entries
            .iter()
            .filter(|entry| entry.status != SourceStatus::Started)
            .map(|entry| SourceMetric {
                source: entry.source,
                duration_ms: entry.duration_ms.unwrap_or(0),
                chunks_retrieved: entry.chunks_retrieved.unwrap_or(0),
                success: entry.status == SourceStatus::Completed,
            })
            .collect();

        self.record_metrics(RetrievalPerformanceMetrics {
            retrieval_id: retrieval_id.to_string(),
            total_duration_ms,
            total_chunks,
            source_metrics,
            query: active.query,
            timestamp: unix_millis(),
        });
    }

    fn retrieval_cancelled(&self, retrieval_id: &str) {
        let Some(active) = self.state().active.remove(retrieval_id) else {
            return;
        };

        if self.should_log(RetrievalLogLevel::Warn) {
            let finished = active
                .entries
                .iter()
                .filter(|entry| entry.status != SourceStatus::Started)
                .count();
            log::warn!(
                "[Retrieval] Cancelled retrieval {retrieval_id} after {}ms with {finished} sources finished (query={:?})",
                active.started.elapsed().as_millis(),
                active.query
            );
        }
    }
}

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
