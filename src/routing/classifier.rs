//! Keyword intent classification.
//!
//! Turns raw command text into an [`Intent`] for the router:
//!
//! 1. **Type** — count keyword hits per intent type; the type with the most
//!    hits wins, ties resolved by [`IntentType::KNOWN`] order. No hits →
//!    `query`.
//! 2. **Confidence** — `0.5 + 0.15 × hits`, capped at `0.95`. The fallback
//!    `query` gets `0.5`.
//! 3. **Entities** — catalog model mentions (by id or display name) and
//!    numeric literals, with character offsets into the original text.
//!
//! Matching is ASCII case-insensitive and whole-word.

use super::catalog::Catalog;
use super::intent::{Entity, EntityKind, Intent, IntentType};

/// Confidence assigned when no keyword matched.
const BASE_CONFIDENCE: f64 = 0.5;
/// Confidence added per keyword hit.
const CONFIDENCE_PER_HIT: f64 = 0.15;
/// Upper bound on keyword-derived confidence.
const MAX_CONFIDENCE: f64 = 0.95;

const MODEL_MENTION_CONFIDENCE: f64 = 0.9;
const NUMBER_CONFIDENCE: f64 = 1.0;

fn keywords(kind: IntentType) -> &'static [&'static str] {
    match kind {
        IntentType::Creation => &[
            "create", "write", "generate", "compose", "draft", "make", "build", "design",
        ],
        IntentType::Analysis => &[
            "analyze", "analyse", "analysis", "compare", "evaluate", "summarize", "summarise",
            "review", "insights", "trend", "trends",
        ],
        IntentType::Action => &[
            "run", "execute", "deploy", "start", "stop", "delete", "send", "trigger", "restart",
        ],
        IntentType::Configuration => &[
            "configure", "config", "setting", "settings", "enable", "disable", "preference",
            "preferences", "set up",
        ],
        IntentType::Search => &["search", "find", "look up", "lookup", "locate", "where is"],
        IntentType::Navigation => &[
            "go to", "open", "navigate", "take me", "switch to", "show me",
        ],
        IntentType::Query => &["what", "why", "how", "who", "when", "explain", "tell me"],
        IntentType::Unknown => &[],
    }
}

/// Per-type keyword hit counts for one command.
///
/// Returned by [`IntentClassifier::breakdown`] for observability.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClassificationBreakdown {
    /// `(type, hits)` for every known type, in tie-break priority order.
    pub hits: Vec<(IntentType, usize)>,
    /// Winning type.
    pub kind: IntentType,
    /// Confidence derived from the winner's hits.
    pub confidence: f64,
}

/// Keyword-based command classifier.
///
/// Holds the model names to look for; otherwise stateless.
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    /// `(model id, lowercase needles)` for mention extraction.
    models: Vec<(String, Vec<String>)>,
}

impl IntentClassifier {
    /// Create a classifier that recognises mentions of `catalog` models.
    pub fn new(catalog: &Catalog) -> Self {
        let models = catalog
            .candidates()
            .iter()
            .map(|c| {
                let mut needles = vec![c.id.to_ascii_lowercase()];
                let name = c.name.to_ascii_lowercase();
                if !needles.contains(&name) {
                    needles.push(name);
                }
                (c.id.clone(), needles)
            })
            .collect();
        Self { models }
    }

    /// Classify a command.
    ///
    /// # Example
    ///
    /// ```rust
    /// use orchestra_router::{Catalog, IntentClassifier, IntentType};
    ///
    /// let classifier = IntentClassifier::new(&Catalog::builtin());
    /// let intent = classifier.classify("Write a short story about a lighthouse");
    /// assert_eq!(intent.kind, IntentType::Creation);
    /// ```
    pub fn classify(&self, text: &str) -> Intent {
        let bd = self.breakdown(text);
        Intent {
            kind: bd.kind,
            confidence: bd.confidence,
            entities: self.entities(text),
            unknown_tag: None,
        }
    }

    /// Per-type keyword hits and the resulting type/confidence.
    pub fn breakdown(&self, text: &str) -> ClassificationBreakdown {
        let padded = normalise(text);

        let mut hits = Vec::with_capacity(IntentType::KNOWN.len());
        for kind in IntentType::KNOWN {
            let mut count = keywords(kind)
                .iter()
                .filter(|kw| padded.contains(&format!(" {kw} ")))
                .count();
            if kind == IntentType::Query && text.contains('?') {
                count += 1;
            }
            hits.push((kind, count));
        }

        let mut best = (IntentType::Query, 0_usize);
        for &(kind, count) in &hits {
            if count > best.1 {
                best = (kind, count);
            }
        }

        let confidence = if best.1 == 0 {
            BASE_CONFIDENCE
        } else {
            (BASE_CONFIDENCE + CONFIDENCE_PER_HIT * best.1 as f64).min(MAX_CONFIDENCE)
        };

        ClassificationBreakdown {
            hits,
            kind: best.0,
            confidence,
        }
    }

    /// Extract model mentions and numeric literals, sorted by position.
    pub fn entities(&self, text: &str) -> Vec<Entity> {
        let lower = text.to_ascii_lowercase();
        let mut out: Vec<Entity> = Vec::new();

        for (id, needles) in &self.models {
            for needle in needles {
                for (byte_start, _) in lower.match_indices(needle.as_str()) {
                    let byte_end = byte_start + needle.len();
                    if !is_word_boundary(&lower, byte_start, byte_end) {
                        continue;
                    }
                    let start = char_offset(text, byte_start);
                    if out.iter().any(|e| e.value == *id && e.start == start) {
                        continue;
                    }
                    out.push(Entity {
                        kind: EntityKind::ModelName,
                        value: id.clone(),
                        start,
                        end: char_offset(text, byte_end),
                        confidence: MODEL_MENTION_CONFIDENCE,
                    });
                }
            }
        }

        for (byte_start, byte_end) in number_spans(text) {
            let start = char_offset(text, byte_start);
            let end = char_offset(text, byte_end);
            let inside_mention = out
                .iter()
                .any(|e| e.kind == EntityKind::ModelName && start >= e.start && end <= e.end);
            if inside_mention {
                continue;
            }
            out.push(Entity {
                kind: EntityKind::Number,
                value: text[byte_start..byte_end].to_string(),
                start,
                end,
                confidence: NUMBER_CONFIDENCE,
            });
        }

        out.sort_by_key(|e| (e.start, e.end));
        out
    }
}

// ── Text helpers ───────────────────────────────────────────────────────

/// Lowercase, replace punctuation with spaces, collapse whitespace, and pad
/// with a leading/trailing space so `" kw "` matches whole words only.
fn normalise(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    format!(" {} ", words.join(" "))
}

/// `true` if `[start, end)` is not glued to an alphanumeric char on either side.
fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|c| c.is_ascii_alphanumeric())
        && !after.is_some_and(|c| c.is_ascii_alphanumeric())
}

/// Byte spans of standalone numeric literals (`42`, `3.5`).
fn number_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        let glued_before = start > 0 && bytes[start - 1].is_ascii_alphabetic();
        let glued_after = i < bytes.len() && bytes[i].is_ascii_alphabetic();
        if !glued_before && !glued_after {
            spans.push((start, i));
        }
    }
    spans
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new(&Catalog::builtin())
    }

    // -- type ------------------------------------------------------------

    #[test]
    fn test_classify_creation() {
        let intent = classifier().classify("Write a poem about autumn");
        assert_eq!(intent.kind, IntentType::Creation);
    }

    #[test]
    fn test_classify_analysis() {
        let intent = classifier().classify("Analyze last quarter's sales and compare regions");
        assert_eq!(intent.kind, IntentType::Analysis);
        assert!((intent.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_classify_search() {
        assert_eq!(
            classifier().classify("find the onboarding doc").kind,
            IntentType::Search
        );
    }

    #[test]
    fn test_classify_navigation() {
        assert_eq!(
            classifier().classify("go to the persona settings page").kind,
            IntentType::Configuration,
            "settings outranks navigation on tie priority"
        );
        assert_eq!(
            classifier().classify("take me to the dashboard").kind,
            IntentType::Navigation
        );
    }

    #[test]
    fn test_classify_action() {
        assert_eq!(
            classifier().classify("deploy the workflow").kind,
            IntentType::Action
        );
    }

    #[test]
    fn test_classify_question_mark_counts_as_query() {
        let intent = classifier().classify("Is the API up?");
        assert_eq!(intent.kind, IntentType::Query);
        assert!((intent.confidence - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_classify_no_keywords_falls_back_to_query() {
        let intent = classifier().classify("lorem ipsum dolor");
        assert_eq!(intent.kind, IntentType::Query);
        assert!((intent.confidence - BASE_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_classify_empty_text() {
        let intent = classifier().classify("");
        assert_eq!(intent.kind, IntentType::Query);
        assert!(intent.entities.is_empty());
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        // "restart" is an action keyword; "started" must not count as "start".
        let bd = classifier().breakdown("it started raining");
        let action = bd
            .hits
            .iter()
            .find(|(k, _)| *k == IntentType::Action)
            .map_or(0, |(_, n)| *n);
        assert_eq!(action, 0);
    }

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(
            classifier().classify("SUMMARIZE THIS REPORT").kind,
            IntentType::Analysis
        );
    }

    #[test]
    fn test_confidence_capped() {
        let intent = classifier()
            .classify("create write generate compose draft make build design a thing");
        assert!((intent.confidence - MAX_CONFIDENCE).abs() < f64::EPSILON);
    }

    // -- entities --------------------------------------------------------

    #[test]
    fn test_extracts_model_mention_by_id() {
        let text = "Use claude-3-opus for this";
        let intent = classifier().classify(text);
        let mention = intent
            .entities
            .iter()
            .find(|e| e.kind == EntityKind::ModelName)
            .cloned();
        let mention = mention.unwrap_or_else(|| std::panic::panic_any("test: no mention"));
        assert_eq!(mention.value, "claude-3-opus");
        assert_eq!(mention.start, 4);
        assert_eq!(mention.end, 17);
        // the "3" inside the id is not reported as a number
        assert!(!intent.entities.iter().any(|e| e.kind == EntityKind::Number));
    }

    #[test]
    fn test_extracts_model_mention_by_display_name() {
        let intent = classifier().classify("ask Mixtral 8x7B to help");
        assert_eq!(intent.mentioned_models().collect::<Vec<_>>(), ["mixtral-8x7b"]);
    }

    #[test]
    fn test_extracts_numbers_with_positions() {
        let intent = classifier().classify("generate 3 slogans under 12.5 words");
        let numbers: Vec<_> = intent
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Number)
            .map(|e| (e.value.as_str(), e.start, e.end))
            .collect();
        assert_eq!(numbers, [("3", 9, 10), ("12.5", 25, 29)]);
    }

    #[test]
    fn test_number_glued_to_letters_ignored() {
        let intent = classifier().classify("the v2 endpoint");
        assert!(intent.entities.is_empty());
    }

    #[test]
    fn test_positions_are_char_offsets() {
        let intent = classifier().classify("é 42");
        let n = &intent.entities[0];
        assert_eq!((n.start, n.end), (2, 4));
    }
}
