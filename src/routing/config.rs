//! Routing configuration types.
//!
//! Provides [`RoutingConfig`] for tuning score weights, normalisation
//! ceilings, constraint penalties, and per-intent token estimates. All fields
//! have defaults matching the production tuning and are (de)serialisable via
//! serde for TOML/JSON config files.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::intent::IntentType;

// ── Default value functions ────────────────────────────────────────────

/// Average latency at which the latency sub-score reaches zero.
fn default_latency_ceiling_ms() -> f64 {
    3000.0
}

/// Cost per token at which the cost sub-score reaches zero.
fn default_cost_ceiling_per_token() -> f64 {
    0.0002
}

/// Latency assumed for a model with no performance sample.
fn default_latency_ms() -> f64 {
    1000.0
}

/// Number of runner-up candidates returned with a decision.
fn default_max_alternatives() -> usize {
    3
}

fn default_capability_weight() -> f64 {
    0.4
}

fn default_latency_weight() -> f64 {
    0.15
}

fn default_reliability_weight() -> f64 {
    0.15
}

fn default_cost_weight() -> f64 {
    0.2
}

fn default_confidence_weight() -> f64 {
    0.1
}

fn default_over_cost_penalty() -> f64 {
    0.5
}

fn default_over_latency_penalty() -> f64 {
    0.7
}

fn default_missing_capability_penalty() -> f64 {
    0.1
}

fn default_analysis_tokens() -> u64 {
    2000
}

fn default_creation_tokens() -> u64 {
    1500
}

fn default_search_tokens() -> u64 {
    500
}

fn default_tokens() -> u64 {
    1000
}

// ── RoutingConfig ──────────────────────────────────────────────────────

/// Configuration for the scoring router.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RoutingConfig {
    /// Average latency (ms) mapped to a latency sub-score of `0.0`.
    #[serde(default = "default_latency_ceiling_ms")]
    pub latency_ceiling_ms: f64,

    /// Cost per token (USD) mapped to a cost sub-score of `0.0`.
    #[serde(default = "default_cost_ceiling_per_token")]
    pub cost_ceiling_per_token: f64,

    /// Latency (ms) assumed for candidates without a performance sample,
    /// both for `max_latency` checks and for the decision's latency estimate.
    #[serde(default = "default_latency_ms")]
    pub default_latency_ms: f64,

    /// Maximum number of alternatives returned with a decision.
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,

    /// Composite score weights.
    #[serde(default)]
    pub weights: ScoreWeights,

    /// Multiplicative constraint penalties.
    #[serde(default)]
    pub penalties: PenaltyFactors,

    /// Expected token usage per intent type, used for cost estimates.
    #[serde(default)]
    pub token_estimates: TokenEstimates,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            latency_ceiling_ms: default_latency_ceiling_ms(),
            cost_ceiling_per_token: default_cost_ceiling_per_token(),
            default_latency_ms: default_latency_ms(),
            max_alternatives: default_max_alternatives(),
            weights: ScoreWeights::default(),
            penalties: PenaltyFactors::default(),
            token_estimates: TokenEstimates::default(),
        }
    }
}

/// Weights of the composite score.
///
/// The defaults sum to `1.0`; custom weights need not, because the composite
/// is clamped to `[0, 1]` anyway.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ScoreWeights {
    /// Weight of the capability-match ratio.
    #[serde(default = "default_capability_weight")]
    pub capability: f64,
    /// Weight of the latency sub-score.
    #[serde(default = "default_latency_weight")]
    pub latency: f64,
    /// Weight of the success-rate sub-score.
    #[serde(default = "default_reliability_weight")]
    pub reliability: f64,
    /// Weight of the cost sub-score.
    #[serde(default = "default_cost_weight")]
    pub cost: f64,
    /// Weight of the intent confidence.
    #[serde(default = "default_confidence_weight")]
    pub confidence: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            capability: default_capability_weight(),
            latency: default_latency_weight(),
            reliability: default_reliability_weight(),
            cost: default_cost_weight(),
            confidence: default_confidence_weight(),
        }
    }
}

/// Score multipliers applied when a candidate violates a caller constraint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PenaltyFactors {
    /// Applied when cost per token exceeds `max_cost`.
    #[serde(default = "default_over_cost_penalty")]
    pub over_cost: f64,
    /// Applied when average latency exceeds `max_latency`.
    #[serde(default = "default_over_latency_penalty")]
    pub over_latency: f64,
    /// Applied when required capabilities are not all present.
    #[serde(default = "default_missing_capability_penalty")]
    pub missing_capability: f64,
}

impl Default for PenaltyFactors {
    fn default() -> Self {
        Self {
            over_cost: default_over_cost_penalty(),
            over_latency: default_over_latency_penalty(),
            missing_capability: default_missing_capability_penalty(),
        }
    }
}

/// Expected tokens per request, by intent type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TokenEstimates {
    /// Tokens for `analysis` intents.
    #[serde(default = "default_analysis_tokens")]
    pub analysis: u64,
    /// Tokens for `creation` intents.
    #[serde(default = "default_creation_tokens")]
    pub creation: u64,
    /// Tokens for `search` intents.
    #[serde(default = "default_search_tokens")]
    pub search: u64,
    /// Tokens for every other intent type.
    #[serde(default = "default_tokens")]
    pub default: u64,
}

impl Default for TokenEstimates {
    fn default() -> Self {
        Self {
            analysis: default_analysis_tokens(),
            creation: default_creation_tokens(),
            search: default_search_tokens(),
            default: default_tokens(),
        }
    }
}

impl TokenEstimates {
    /// Expected token count for `kind`.
    pub fn for_intent(&self, kind: IntentType) -> u64 {
        match kind {
            IntentType::Analysis => self.analysis,
            IntentType::Creation => self.creation,
            IntentType::Search => self.search,
            _ => self.default,
        }
    }
}

/// Validate a [`RoutingConfig`], returning a list of human-readable errors.
///
/// # Returns
///
/// An empty `Vec` on success, or one error string per violated constraint.
///
/// # Panics
///
/// This function never panics.
pub fn validate(config: &RoutingConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if !(config.latency_ceiling_ms.is_finite() && config.latency_ceiling_ms > 0.0) {
        errors.push(format!(
            "routing.latency_ceiling_ms must be > 0, got {}",
            config.latency_ceiling_ms
        ));
    }

    if !(config.cost_ceiling_per_token.is_finite() && config.cost_ceiling_per_token > 0.0) {
        errors.push(format!(
            "routing.cost_ceiling_per_token must be > 0, got {}",
            config.cost_ceiling_per_token
        ));
    }

    if !(config.default_latency_ms.is_finite() && config.default_latency_ms >= 0.0) {
        errors.push(format!(
            "routing.default_latency_ms must be >= 0, got {}",
            config.default_latency_ms
        ));
    }

    let weights = [
        ("capability", config.weights.capability),
        ("latency", config.weights.latency),
        ("reliability", config.weights.reliability),
        ("cost", config.weights.cost),
        ("confidence", config.weights.confidence),
    ];
    for (name, w) in weights {
        if !(w.is_finite() && w >= 0.0) {
            errors.push(format!("routing.weights.{name} must be >= 0, got {w}"));
        }
    }

    let penalties = [
        ("over_cost", config.penalties.over_cost),
        ("over_latency", config.penalties.over_latency),
        ("missing_capability", config.penalties.missing_capability),
    ];
    for (name, p) in penalties {
        if !(p > 0.0 && p <= 1.0) {
            errors.push(format!(
                "routing.penalties.{name} must be in (0.0, 1.0], got {p}"
            ));
        }
    }

    errors
}

// ── Tests ──────────────────────────────────────────────────────────────
