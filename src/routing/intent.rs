//! Classified request intents.
//!
//! An [`Intent`] is what the upstream command classifier hands the router:
//! a type tag, a confidence, and any entities it extracted. Unrecognised type
//! tags deserialize to [`IntentType::Unknown`] instead of failing (the raw
//! tag is kept for logging), and a missing tag defaults to
//! [`IntentType::Query`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::Capability;

/// The kind of command the user issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    /// Question answering (the default).
    #[default]
    Query,
    /// Moving around the application.
    Navigation,
    /// Looking something up.
    Search,
    /// Producing new content.
    Creation,
    /// Examining data or documents.
    Analysis,
    /// Changing settings.
    Configuration,
    /// Executing an operation.
    Action,
    /// Any tag the router does not recognise. Routed like [`Self::Query`].
    #[serde(other)]
    Unknown,
}

impl IntentType {
    /// Every recognised type, in classifier tie-break priority order.
    pub const KNOWN: [IntentType; 7] = [
        IntentType::Creation,
        IntentType::Analysis,
        IntentType::Action,
        IntentType::Configuration,
        IntentType::Search,
        IntentType::Navigation,
        IntentType::Query,
    ];

    /// Return the wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Navigation => "navigation",
            Self::Search => "search",
            Self::Creation => "creation",
            Self::Analysis => "analysis",
            Self::Configuration => "configuration",
            Self::Action => "action",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a wire tag. Anything unrecognised is [`Self::Unknown`].
    pub fn from_tag(tag: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .unwrap_or(Self::Unknown)
    }

    /// Return `false` for [`Self::Unknown`].
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Capabilities a model needs to serve this kind of intent.
    ///
    /// | Type          | Required                |
    /// |---------------|-------------------------|
    /// | creation      | creative, reasoning     |
    /// | analysis      | analysis, reasoning     |
    /// | action        | reasoning, coding       |
    /// | search        | reasoning, fast         |
    /// | anything else | reasoning               |
    pub fn required_capabilities(&self) -> BTreeSet<Capability> {
        use Capability::*;

        let list: &[Capability] = match self {
            Self::Creation => &[Creative, Reasoning],
            Self::Analysis => &[Analysis, Reasoning],
            Self::Action => &[Reasoning, Coding],
            Self::Search => &[Reasoning, Fast],
            Self::Configuration | Self::Query | Self::Navigation | Self::Unknown => &[Reasoning],
        };
        list.iter().copied().collect()
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of span extracted from a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Mention of a catalog model by id or display name.
    ModelName,
    /// A numeric literal.
    Number,
}

/// A typed span within the command text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// What kind of span this is.
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Normalised value: the model id for mentions, the literal for numbers.
    pub value: String,
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
}

/// A classified user command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireIntent")]
pub struct Intent {
    /// Type tag. Missing → `query`; unrecognised → `unknown`.
    #[serde(rename = "type", default)]
    pub kind: IntentType,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f64,
    /// Extracted entities, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,
    /// The tag as sent, when it was not recognised.
    #[serde(skip)]
    pub unknown_tag: Option<String>,
}

/// Wire shape of [`Intent`]; keeps the raw type tag.
#[derive(Deserialize)]
struct WireIntent {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    confidence: f64,
    #[serde(default)]
    entities: Vec<Entity>,
}

impl From<WireIntent> for Intent {
    fn from(wire: WireIntent) -> Self {
        let kind = wire
            .kind
            .as_deref()
            .map_or(IntentType::Query, IntentType::from_tag);
        let unknown_tag = if kind.is_known() { None } else { wire.kind };
        Self {
            kind,
            confidence: wire.confidence,
            entities: wire.entities,
            unknown_tag,
        }
    }
}

impl Intent {
    /// Build an intent without entities.
    pub fn new(kind: IntentType, confidence: f64) -> Self {
        Self {
            kind,
            confidence,
            entities: Vec::new(),
            unknown_tag: None,
        }
    }

    /// The type tag to log: the raw tag for unknown types.
    pub fn tag(&self) -> &str {
        self.unknown_tag.as_deref().unwrap_or(self.kind.as_str())
    }

    /// Ids of every catalog model mentioned in the command.
    pub fn mentioned_models(&self) -> impl Iterator<Item = &str> {
        self.entities
            .iter()
            .filter(|e| e.kind == EntityKind::ModelName)
            .map(|e| e.value.as_str())
    }
}
