//! Static model catalog.
//!
//! A [`Catalog`] is the immutable list of [`ModelCandidate`]s the router
//! scores. It is loaded once at startup (from config or the built-in table)
//! and shared behind an `Arc`, so cloning a catalog is cheap and never copies
//! candidate data.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A tag describing what a model is good at.
///
/// Serialised in kebab-case (`"long-context"`), which is also the form used
/// in config files and request bodies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Multi-step reasoning.
    Reasoning,
    /// Code generation and review.
    Coding,
    /// Open-ended writing.
    Creative,
    /// Low-latency responses.
    Fast,
    /// Large context window.
    LongContext,
    /// Image / audio input.
    Multimodal,
    /// Data and document analysis.
    Analysis,
}

impl Capability {
    /// Return the wire name of this capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reasoning => "reasoning",
            Self::Coding => "coding",
            Self::Creative => "creative",
            Self::Fast => "fast",
            Self::LongContext => "long-context",
            Self::Multimodal => "multimodal",
            Self::Analysis => "analysis",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One model/provider entry in the routing catalog.
///
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelCandidate {
    /// Stable identifier, also the tie-break key (e.g. `"claude-3-opus"`).
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Provider name (e.g. `"Anthropic"`).
    pub provider: String,
    /// Capability tags.
    pub capabilities: BTreeSet<Capability>,
    /// Cost per token in USD.
    pub cost_per_token: f64,
    /// Maximum context window in tokens.
    pub max_context_tokens: u64,
}

impl ModelCandidate {
    /// Build a candidate from its parts.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        capabilities: impl IntoIterator<Item = Capability>,
        cost_per_token: f64,
        max_context_tokens: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider: provider.into(),
            capabilities: capabilities.into_iter().collect(),
            cost_per_token,
            max_context_tokens,
        }
    }

    /// Return `true` if the candidate carries `capability`.
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Return `true` if every capability in `required` is present.
    pub fn covers(&self, required: &BTreeSet<Capability>) -> bool {
        required.is_subset(&self.capabilities)
    }

    /// Fraction of `required` present on this candidate.
    ///
    /// Defined as `1.0` for an empty requirement set.
    pub fn capability_match(&self, required: &BTreeSet<Capability>) -> f64 {
        if required.is_empty() {
            return 1.0;
        }
        let hits = required
            .iter()
            .filter(|c| self.capabilities.contains(c))
            .count();
        hits as f64 / required.len() as f64
    }
}

/// Immutable, cheaply clonable list of routing candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    candidates: Arc<[ModelCandidate]>,
}

impl Catalog {
    /// Wrap a list of candidates.
    ///
    /// An empty list is accepted here; [`super::ModelRouter::route`] reports
    /// it as [`crate::RouterError::EmptyCatalog`].
    pub fn new(candidates: Vec<ModelCandidate>) -> Self {
        Self {
            candidates: candidates.into(),
        }
    }

    /// The built-in catalog shipped with the service.
    pub fn builtin() -> Self {
        Self::new(builtin_models())
    }

    /// All candidates in catalog order.
    pub fn candidates(&self) -> &[ModelCandidate] {
        &self.candidates
    }

    /// Look up a candidate by id.
    pub fn get(&self, id: &str) -> Option<&ModelCandidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Return `true` if no candidates are configured.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Models available to the assistant platform out of the box.
pub fn builtin_models() -> Vec<ModelCandidate> {
    use Capability::*;

    vec![
        ModelCandidate::new(
            "gpt-4-turbo",
            "GPT-4 Turbo",
            "OpenAI",
            [Reasoning, Coding, Analysis, LongContext, Multimodal],
            0.00003,
            128_000,
        ),
        ModelCandidate::new(
            "gpt-3.5-turbo",
            "GPT-3.5 Turbo",
            "OpenAI",
            [Reasoning, Coding, Fast],
            0.000002,
            16_385,
        ),
        ModelCandidate::new(
            "claude-3-opus",
            "Claude 3 Opus",
            "Anthropic",
            [Reasoning, Creative, Analysis, Coding, LongContext],
            0.000075,
            200_000,
        ),
        ModelCandidate::new(
            "claude-3-sonnet",
            "Claude 3 Sonnet",
            "Anthropic",
            [Reasoning, Creative, Coding, Analysis, LongContext],
            0.000015,
            200_000,
        ),
        ModelCandidate::new(
            "claude-3-haiku",
            "Claude 3 Haiku",
            "Anthropic",
            [Reasoning, Fast, LongContext],
            0.00000125,
            200_000,
        ),
        ModelCandidate::new(
            "gemini-pro",
            "Gemini Pro",
            "Google",
            [Reasoning, Multimodal, Analysis],
            0.0000005,
            32_760,
        ),
        ModelCandidate::new(
            "mixtral-8x7b",
            "Mixtral 8x7B",
            "Mistral",
            [Reasoning, Coding, Fast],
            0.0000007,
            32_768,
        ),
    ]
}
