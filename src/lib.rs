//! # orchestra-router
//!
//! Picks the best language model for a classified user intent.
//!
//! ## Architecture
//!
//! ```text
//! command text ─► IntentClassifier ─► Intent ─┐
//!                                             ├─► ModelRouter::route ─► RoutingDecision
//!           RoutingConstraints (optional) ────┘        │
//!                                   Catalog + PerformanceView (snapshot)
//! ```
//!
//! The router is a pure function over an immutable catalog and a
//! consistently-snapshotted performance table, so a single
//! `Arc<ModelRouter>` can be shared by any number of concurrent callers.

// ── Lint policy ───────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(missing_docs)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod metrics;
pub mod routing;

#[cfg(feature = "web-api")]
pub mod web_api;

// Re-exports for convenience
pub use routing::{
    Capability, Catalog, Entity, EntityKind, Intent, IntentClassifier, IntentType, ModelCandidate,
    ModelRouter, PerformanceFeed, PerformanceSample, PerformanceView, RoutingConfig,
    RoutingConstraints, RoutingDecision, ScoreBreakdown,
};

/// Initialise the global tracing subscriber.
///
/// Reads the `LOG_FORMAT` environment variable to choose output format:
/// - `"json"` — structured JSON output for log aggregators
/// - anything else (including unset) — human-readable pretty output
///
/// Filter level is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`).
///
/// # Errors
///
/// Returns [`RouterError::Other`] if the global subscriber has already
/// been set (e.g. by a previous call or a test harness).
///
/// # Example
///
/// ```no_run
/// # use orchestra_router::{init_tracing, RouterError};
/// # fn example() -> Result<(), RouterError> {
/// init_tracing()?;
/// # Ok(()) }
/// ```
pub fn init_tracing() -> Result<(), RouterError> {
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    init_tracing_with_format(&format)
}

/// Initialise the global tracing subscriber with an explicit format name.
///
/// `"json"` selects structured output; anything else selects pretty output.
///
/// # Errors
///
/// Returns [`RouterError::Other`] if a global subscriber is already installed.
pub fn init_tracing_with_format(format: &str) -> Result<(), RouterError> {
    let result = match format {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_current_span(true)
            .with_span_list(true)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init(),
    };

    result.map_err(|e| RouterError::Other(format!("tracing init failed: {e}")))
}

/// Top-level router errors.
///
/// Every error surfaced by [`ModelRouter::route`] maps to a variant here.
/// All variants implement `std::error::Error` via [`thiserror`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    /// A caller-supplied constraint is outside its valid domain
    /// (negative or non-finite threshold).
    #[error("invalid constraint {field}: {value}")]
    InvalidConstraint {
        /// Wire name of the offending field (e.g. `max_cost`).
        field: &'static str,
        /// The rejected value, rendered for the error message.
        value: String,
    },

    /// The intent confidence is not a finite number in `[0, 1]`.
    #[error("invalid intent confidence: {value}")]
    InvalidIntent {
        /// The rejected confidence value.
        value: String,
    },

    /// No candidates are configured. This is a startup misconfiguration
    /// rather than a per-request condition.
    #[error("model catalog is empty")]
    EmptyCatalog,

    /// A configuration value is missing or invalid.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Catch-all for errors that do not fit a specific variant.
    #[error("{0}")]
    Other(String),
}

impl RouterError {
    /// Short, stable label used for the `err_type` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConstraint { .. } => "invalid_constraint",
            Self::InvalidIntent { .. } => "invalid_intent",
            Self::EmptyCatalog => "empty_catalog",
            Self::ConfigError(_) => "config",
            Self::Other(_) => "other",
        }
    }
}
