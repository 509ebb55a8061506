//! Candidate scoring.
//!
//! Scores one [`ModelCandidate`] for one [`Intent`] and produces a score in
//! `0.0..=1.0`:
//!
//! | Signal           | Sub-score                                    | Weight |
//! |------------------|----------------------------------------------|--------|
//! | Capability match | fraction of required capabilities present    | 0.40   |
//! | Latency          | `1 - avg_latency_ms / latency_ceiling_ms`    | 0.15   |
//! | Reliability      | `success_rate`                               | 0.15   |
//! | Cost             | `1 - cost_per_token / cost_ceiling_per_token`| 0.20   |
//! | Intent           | `intent.confidence`                          | 0.10   |
//!
//! Each sub-score is clamped to `[0, 1]`; a candidate without a performance
//! sample gets `0` for latency and reliability. The weighted sum is clamped,
//! then constraint penalties multiply it down, in order: over cost, over
//! latency, missing required capability.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::catalog::{Capability, ModelCandidate};
use super::config::RoutingConfig;
use super::constraints::RoutingConstraints;
use super::intent::Intent;
use super::performance::PerformanceSample;

/// A constraint a candidate violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    /// Cost per token above `max_cost`.
    OverCost,
    /// Average latency above `max_latency`.
    OverLatency,
    /// Required capabilities not all present.
    MissingCapability,
}

/// Per-candidate breakdown of every signal's contribution.
///
/// Returned in the decision's ranking for transparency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Candidate id.
    pub model_id: String,
    /// Fraction of required capabilities present.
    pub capability_match: f64,
    /// Latency sub-score.
    pub latency_score: f64,
    /// Reliability sub-score.
    pub reliability_score: f64,
    /// Cost sub-score.
    pub cost_score: f64,
    /// Weighted sum before penalties, clamped to `[0, 1]`.
    pub composite: f64,
    /// Penalties applied, in application order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub penalties: Vec<Penalty>,
    /// Final score in `[0, 1]`.
    pub total: f64,
}

/// Weighted candidate scorer.
///
/// Stateless apart from its configuration and cheap to clone.
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    config: RoutingConfig,
}

impl CandidateScorer {
    /// Create a scorer with the given tuning.
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// The tuning this scorer was built with.
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Score `candidate` for `intent`.
    ///
    /// # Arguments
    ///
    /// * `candidate` — The model being scored.
    /// * `sample` — Its performance sample, if one has been reported.
    /// * `intent` — The classified request.
    /// * `required` — Capabilities the intent type needs.
    /// * `constraints` — Caller limits; penalties apply only when present.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn score(
        &self,
        candidate: &ModelCandidate,
        sample: Option<&PerformanceSample>,
        intent: &Intent,
        required: &BTreeSet<Capability>,
        constraints: Option<&RoutingConstraints>,
    ) -> ScoreBreakdown {
        let weights = &self.config.weights;

        let capability_match = candidate.capability_match(required);
        let latency_score = sample.map_or(0.0, |s| self.latency_signal(s.avg_latency_ms));
        let reliability_score = sample.map_or(0.0, |s| clamp_score(s.success_rate));
        let cost_score = self.cost_signal(candidate.cost_per_token);

        let composite = clamp_score(
            weights.capability * capability_match
                + weights.latency * latency_score
                + weights.reliability * reliability_score
                + weights.cost * cost_score
                + weights.confidence * intent.confidence,
        );

        let mut total = composite;
        let mut penalties = Vec::new();
        if let Some(c) = constraints {
            for penalty in self.violations(candidate, sample, c) {
                total *= self.factor(penalty);
                penalties.push(penalty);
            }
        }

        ScoreBreakdown {
            model_id: candidate.id.clone(),
            capability_match,
            latency_score,
            reliability_score,
            cost_score,
            composite,
            penalties,
            total: clamp_score(total),
        }
    }

    /// Average latency used for constraint checks and estimates.
    pub fn effective_latency(&self, sample: Option<&PerformanceSample>) -> f64 {
        sample.map_or(self.config.default_latency_ms, |s| s.avg_latency_ms)
    }

    // ── Individual signals ─────────────────────────────────────────────

    fn latency_signal(&self, avg_latency_ms: f64) -> f64 {
        clamp_score(1.0 - avg_latency_ms / self.config.latency_ceiling_ms)
    }

    fn cost_signal(&self, cost_per_token: f64) -> f64 {
        clamp_score(1.0 - cost_per_token / self.config.cost_ceiling_per_token)
    }

    // ── Penalties ──────────────────────────────────────────────────────

    fn violations(
        &self,
        candidate: &ModelCandidate,
        sample: Option<&PerformanceSample>,
        constraints: &RoutingConstraints,
    ) -> Vec<Penalty> {
        let mut out = Vec::new();
        if constraints
            .max_cost
            .is_some_and(|max| candidate.cost_per_token > max)
        {
            out.push(Penalty::OverCost);
        }
        if constraints
            .max_latency
            .is_some_and(|max| self.effective_latency(sample) > max)
        {
            out.push(Penalty::OverLatency);
        }
        if !candidate.covers(&constraints.required_capabilities) {
            out.push(Penalty::MissingCapability);
        }
        out
    }

    fn factor(&self, penalty: Penalty) -> f64 {
        let p = &self.config.penalties;
        match penalty {
            Penalty::OverCost => p.over_cost,
            Penalty::OverLatency => p.over_latency,
            Penalty::MissingCapability => p.missing_capability,
        }
    }
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::new(RoutingConfig::default())
    }
}

/// Clamp a raw score to `[0.0, 1.0]`. NaN maps to `0.0`.
fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
