//! # Stage: Declarative Service Configuration
//!
//! ## Responsibility
//! Parse, validate, and hot-reload the TOML file that describes the router
//! service: listen address, scoring tuning, the model catalog, and the
//! performance table.
//! ```text
//! orchestra-router --config router.toml
//! ```
//!
//! ## Guarantees
//! - Deterministic: same TOML input always produces the same `ServiceConfig`
//! - Validated: all semantic constraints are checked before a config is accepted
//! - Defaulted: every section may be omitted; `models` falls back to the
//!   built-in catalog, and `performance` to mock telemetry only when the
//!   built-in catalog is in use
//! - Hot-reloadable: performance-table edits are picked up without restart
//! - Schema-exportable: JSON Schema output enables IDE autocomplete
//!
//! ## NOT Responsible For
//! - Scoring (that belongs to `routing`)
//! - Serving HTTP (that belongs to `web_api`)

pub mod loader;
pub mod validation;
pub mod watcher;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::routing::catalog::builtin_models;
use crate::routing::{
    Catalog, ModelCandidate, ModelRouter, PerformanceFeed, PerformanceSample, PerformanceTable,
    RoutingConfig,
};

// ── Default value functions ──────────────────────────────────────────────

/// Default bind address: all interfaces.
fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default HTTP port.
fn default_port() -> u16 {
    8080
}

/// Default maximum request body: 64 KiB. Routing requests are small.
fn default_max_request_size() -> usize {
    64 * 1024
}

/// Default enabled state: true.
fn default_true() -> bool {
    true
}

fn default_models() -> Vec<ModelCandidate> {
    builtin_models()
}

fn default_performance() -> Vec<PerformanceEntry> {
    let mut rows: Vec<PerformanceEntry> = PerformanceTable::builtin()
        .iter()
        .map(|(id, sample)| PerformanceEntry {
            model_id: id.to_string(),
            sample: sample.clone(),
        })
        .collect();
    rows.sort_by(|a, b| a.model_id.cmp(&b.model_id));
    rows
}

// ── Top-level config ─────────────────────────────────────────────────────

/// Root configuration for a router instance.
///
/// # Example
///
/// ```toml
/// [server]
/// port = 8080
///
/// [routing]
/// latency_ceiling_ms = 3000.0
///
/// [[models]]
/// id = "claude-3-opus"
/// name = "Claude 3 Opus"
/// provider = "Anthropic"
/// capabilities = ["reasoning", "creative", "analysis"]
/// cost_per_token = 0.000075
/// max_context_tokens = 200000
///
/// [[performance]]
/// model_id = "claude-3-opus"
/// avg_latency_ms = 1800.0
/// p95_latency_ms = 2900.0
/// p99_latency_ms = 4100.0
/// success_rate = 0.97
/// error_rate = 0.03
/// ```
///
/// # Panics
///
/// This type never panics during construction or access.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Scoring weights, ceilings, penalties, and token estimates.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// The model catalog. Loaded once at startup.
    #[serde(default = "default_models")]
    pub models: Vec<ModelCandidate>,
    /// Performance samples keyed by model id. Hot-reloadable.
    ///
    /// `None` means the section was omitted; see
    /// [`ServiceConfig::performance_rows`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<Vec<PerformanceEntry>>,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            routing: RoutingConfig::default(),
            models: default_models(),
            performance: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// The configured catalog.
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.models.clone())
    }

    /// The effective `[[performance]]` rows.
    ///
    /// An omitted section yields the built-in mock rows for the built-in
    /// catalog and no rows for a custom one. Models without a row score 0 on
    /// latency and reliability.
    pub fn performance_rows(&self) -> Vec<PerformanceEntry> {
        match &self.performance {
            Some(rows) => rows.clone(),
            None if self.models == builtin_models() => default_performance(),
            None => Vec::new(),
        }
    }

    /// The configured performance table.
    pub fn performance_table(&self) -> PerformanceTable {
        PerformanceTable::new(
            self.performance_rows()
                .into_iter()
                .map(|e| (e.model_id, e.sample)),
        )
    }

    /// Build a router plus the feed that refreshes its performance table.
    pub fn build_router(&self) -> (ModelRouter, PerformanceFeed) {
        let (feed, view) = PerformanceFeed::new(self.performance_table());
        let router = ModelRouter::new(self.catalog(), view, self.routing.clone());
        (router, feed)
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// HTTP listener configuration.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ServerConfig {
    /// IP address or hostname to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port the server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum allowed request body size in bytes.
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_request_size: default_max_request_size(),
        }
    }
}

// ── Performance rows ─────────────────────────────────────────────────────

/// One `[[performance]]` row: a sample plus the model it belongs to.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PerformanceEntry {
    /// Catalog id of the model this sample describes.
    pub model_id: String,
    /// The sample itself.
    #[serde(flatten)]
    pub sample: PerformanceSample,
}

// ── Observability ────────────────────────────────────────────────────────

/// Observability configuration: log format and metrics exposure.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ObservabilityConfig {
    /// Log output format. `LOG_FORMAT` in the environment overrides it.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Whether to register Prometheus metrics and serve `/metrics`.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            metrics_enabled: default_true(),
        }
    }
}

/// Log output format.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable, colorized log output.
    #[default]
    Pretty,
    /// Structured JSON log output for machine consumption.
    Json,
}

impl LogFormat {
    /// Format name understood by [`crate::init_tracing_with_format`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

/// Export the JSON Schema for `ServiceConfig`.
///
/// # Errors
///
/// Returns `serde_json::Error` if schema serialization fails.
///
/// # Panics
///
/// This function never panics.
pub fn export_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(ServiceConfig);
    serde_json::to_string_pretty(&schema)
}
