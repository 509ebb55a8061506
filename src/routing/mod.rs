//! # Stage: Model Routing
//!
//! ## Responsibility
//! Pick the best language model for a classified intent. Every candidate in
//! the static catalog is scored on capability match, latency, reliability,
//! cost, and intent confidence; caller constraints scale violators down; the
//! highest score wins and the next three are returned as alternatives.
//!
//! ## Guarantees
//! - Deterministic: identical inputs over an unchanged catalog and
//!   performance table produce an identical selection and ordering (ties
//!   break by model id ascending).
//! - Pure: `route()` mutates nothing; it reads the immutable catalog and one
//!   atomic snapshot of the performance table.
//! - Bounded: every score and the decision confidence lie in `[0, 1]`; cost
//!   and latency estimates are non-negative.
//! - Loud on misconfiguration: an empty catalog is an error, never an
//!   arbitrary pick.
//!
//! ## NOT Responsible For
//! - Executing the chat request (downstream)
//! - Collecting telemetry (only consumes it through [`PerformanceView`])
//! - Semantic intent understanding (the classifier is keyword-only)

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod constraints;
pub mod intent;
pub mod performance;
pub mod router;
pub mod scorer;

// Re-exports for convenience
pub use catalog::{Capability, Catalog, ModelCandidate};
pub use classifier::{ClassificationBreakdown, IntentClassifier};
pub use config::RoutingConfig;
pub use constraints::RoutingConstraints;
pub use intent::{Entity, EntityKind, Intent, IntentType};
pub use performance::{PerformanceFeed, PerformanceSample, PerformanceTable, PerformanceView};
pub use router::{ModelRouter, RoutingDecision};
pub use scorer::{CandidateScorer, Penalty, ScoreBreakdown};
