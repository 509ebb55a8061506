//! Model routing logic.
//!
//! The [`ModelRouter`] combines a [`CandidateScorer`] with the static
//! [`Catalog`] and a [`PerformanceView`] to pick the best model for each
//! classified intent, rank the runners-up, and explain the choice.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::catalog::{Capability, Catalog, ModelCandidate};
use super::config::RoutingConfig;
use super::constraints::RoutingConstraints;
use super::intent::Intent;
use super::performance::PerformanceView;
use super::scorer::{CandidateScorer, ScoreBreakdown};
use crate::{metrics, RouterError};

/// Candidates cheaper than this per token are called out as cost-effective.
const CHEAP_COST_PER_TOKEN: f64 = 0.00002;

/// Intent confidence above which the reasoning notes a clear request.
const HIGH_INTENT_CONFIDENCE: f64 = 0.9;

/// The outcome of routing one intent.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Highest-ranked candidate.
    pub selected: ModelCandidate,
    /// Runners-up in rank order (at most `max_alternatives`).
    pub alternatives: Vec<ModelCandidate>,
    /// Human-readable justification for the selection.
    pub reasoning: String,
    /// `cost_per_token * estimated_tokens(intent)` in USD.
    pub estimated_cost: f64,
    /// Selected candidate's average latency in ms.
    pub estimated_latency_ms: f64,
    /// Selected candidate's final score, in `[0, 1]`.
    pub confidence: f64,
    /// Score breakdown for every candidate, in rank order.
    pub ranking: Vec<ScoreBreakdown>,
}

impl RoutingDecision {
    /// Final score of the selected candidate.
    pub fn selected_score(&self) -> f64 {
        self.ranking.first().map_or(0.0, |b| b.total)
    }

    /// Final score of a ranked candidate, by id.
    pub fn score_of(&self, model_id: &str) -> Option<f64> {
        self.ranking
            .iter()
            .find(|b| b.model_id == model_id)
            .map(|b| b.total)
    }
}

/// Scoring model router.
///
/// Pure over its inputs: `route` reads the immutable catalog and one
/// snapshot of the performance table, and mutates nothing. Safe to share via
/// `Arc` across any number of concurrent callers.
///
/// # Panics
///
/// This type and its methods never panic.
pub struct ModelRouter {
    catalog: Catalog,
    performance: PerformanceView,
    scorer: CandidateScorer,
}

impl std::fmt::Debug for ModelRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRouter")
            .field("candidates", &self.catalog.len())
            .field("config", self.scorer.config())
            .finish()
    }
}

impl ModelRouter {
    /// Create a new router.
    ///
    /// # Arguments
    ///
    /// * `catalog` — Candidates to choose from. May be empty, in which case
    ///   every `route` call fails with [`RouterError::EmptyCatalog`].
    /// * `performance` — Read handle on the performance table.
    /// * `config` — Weights, ceilings, penalties, and token estimates.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn new(catalog: Catalog, performance: PerformanceView, config: RoutingConfig) -> Self {
        Self {
            catalog,
            performance,
            scorer: CandidateScorer::new(config),
        }
    }

    /// Route an intent to the best candidate.
    ///
    /// # Arguments
    ///
    /// * `intent` — The classified request. Unknown types are routed with
    ///   the default `{reasoning}` requirement and logged.
    /// * `constraints` — Optional caller limits, applied as score penalties.
    ///
    /// # Errors
    ///
    /// - [`RouterError::InvalidConstraint`] for a negative or non-finite
    ///   threshold.
    /// - [`RouterError::InvalidIntent`] if `intent.confidence` is outside
    ///   `[0, 1]`.
    /// - [`RouterError::EmptyCatalog`] if no candidates are configured.
    ///
    /// # Panics
    ///
    /// This function never panics.
    ///
    /// # Example
    ///
    /// ```rust
    /// use orchestra_router::{Intent, IntentType, ModelRouter};
    ///
    /// let router = ModelRouter::builtin();
    /// let decision = router.route(&Intent::new(IntentType::Creation, 0.9), None)?;
    /// assert!(decision.confidence <= 1.0);
    /// # Ok::<(), orchestra_router::RouterError>(())
    /// ```
    pub fn route(
        &self,
        intent: &Intent,
        constraints: Option<&RoutingConstraints>,
    ) -> Result<RoutingDecision, RouterError> {
        let started = Instant::now();
        let result = self.route_inner(intent, constraints);
        metrics::record_route_latency(started.elapsed());

        match &result {
            Ok(decision) => {
                metrics::inc_selection(&decision.selected.id);
                tracing::debug!(
                    intent = %intent.kind,
                    selected = %decision.selected.id,
                    confidence = decision.confidence,
                    estimated_cost = decision.estimated_cost,
                    alternatives = decision.alternatives.len(),
                    "routed intent"
                );
            }
            Err(e) => {
                metrics::inc_error(e.kind());
                tracing::debug!(intent = %intent.kind, error = %e, "routing rejected");
            }
        }

        result
    }

    fn route_inner(
        &self,
        intent: &Intent,
        constraints: Option<&RoutingConstraints>,
    ) -> Result<RoutingDecision, RouterError> {
        if let Some(c) = constraints {
            c.validate()?;
        }
        if !(0.0..=1.0).contains(&intent.confidence) {
            return Err(RouterError::InvalidIntent {
                value: intent.confidence.to_string(),
            });
        }
        if self.catalog.is_empty() {
            return Err(RouterError::EmptyCatalog);
        }

        if !intent.kind.is_known() {
            tracing::warn!(
                tag = intent.tag(),
                "unknown intent type, routing with default capability requirements"
            );
            metrics::inc_unknown_intent();
        }
        metrics::inc_request(intent.kind.as_str());

        let table = self.performance.snapshot();
        let required = intent.kind.required_capabilities();

        let mut ranked: Vec<(ScoreBreakdown, &ModelCandidate)> = self
            .catalog
            .candidates()
            .iter()
            .map(|candidate| {
                let sample = table.get(&candidate.id);
                let breakdown = self
                    .scorer
                    .score(candidate, sample, intent, &required, constraints);
                (breakdown, candidate)
            })
            .collect();

        ranked.sort_by(|(a, _), (b, _)| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.model_id.cmp(&b.model_id))
        });

        let config = self.scorer.config();
        let (top, selected) = match ranked.first() {
            Some((bd, candidate)) => (bd.total, *candidate),
            None => return Err(RouterError::EmptyCatalog),
        };

        let alternatives = ranked
            .iter()
            .skip(1)
            .take(config.max_alternatives)
            .map(|(_, c)| (*c).clone())
            .collect();

        let tokens = config.token_estimates.for_intent(intent.kind);
        let estimated_cost = (selected.cost_per_token * tokens as f64).max(0.0);
        let estimated_latency_ms = self
            .scorer
            .effective_latency(table.get(&selected.id))
            .max(0.0);

        Ok(RoutingDecision {
            selected: selected.clone(),
            alternatives,
            reasoning: explain(selected, top, intent),
            estimated_cost,
            estimated_latency_ms,
            confidence: top.clamp(0.0, 1.0),
            ranking: ranked.into_iter().map(|(bd, _)| bd).collect(),
        })
    }

    /// The catalog this router scores.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The tuning this router was built with.
    pub fn config(&self) -> &RoutingConfig {
        self.scorer.config()
    }

    /// Read handle on the performance table.
    pub fn performance(&self) -> &PerformanceView {
        &self.performance
    }

    /// A router over the built-in catalog and mock telemetry with default
    /// tuning. Intended for demos, tests, and benchmarks.
    pub fn builtin() -> Self {
        Self::new(
            Catalog::builtin(),
            PerformanceView::fixed(super::performance::PerformanceTable::builtin()),
            RoutingConfig::default(),
        )
    }
}

/// Build the justification sentence for a selection.
fn explain(candidate: &ModelCandidate, score: f64, intent: &Intent) -> String {
    let band = if score > 0.8 {
        "is highly suitable for"
    } else if score > 0.6 {
        "is a good match for"
    } else {
        "can handle"
    };

    let mut clauses = vec![format!("{} {band} {} requests", candidate.name, intent.kind)];
    if candidate.has(Capability::Fast) {
        clauses.push("offers fast response times".to_string());
    }
    if candidate.cost_per_token < CHEAP_COST_PER_TOKEN {
        clauses.push("is cost-effective".to_string());
    }
    if intent.confidence > HIGH_INTENT_CONFIDENCE {
        clauses.push("the request intent is clear".to_string());
    }
    if intent.mentioned_models().any(|id| id == candidate.id) {
        clauses.push("was mentioned by name".to_string());
    }

    format!("{}.", clauses.join(", "))
}

// ── Tests ──────────────────────────────────────────────────────────────
