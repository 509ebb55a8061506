//! Integration tests for `ModelRouter::route`.
//!
//! Exercises the public routing API end to end: ranking order, score
//! bounds, determinism, constraint penalties, cost estimation, and the
//! snapshot behaviour of a live performance table.

use std::collections::BTreeSet;
use std::sync::Arc;

use orchestra_router::routing::{Penalty, PerformanceTable};
use orchestra_router::{
    Capability, Catalog, Intent, IntentClassifier, IntentType, ModelCandidate, ModelRouter,
    PerformanceFeed, PerformanceSample, PerformanceView, RouterError, RoutingConfig,
    RoutingConstraints, RoutingDecision,
};

// ============================================================================
// Helpers
// ============================================================================

const EPS: f64 = 1e-9;

fn model(id: &str, caps: &[Capability], cost: f64) -> ModelCandidate {
    ModelCandidate::new(id, id.to_uppercase(), "Test", caps.iter().copied(), cost, 32_000)
}

fn sample(avg: f64, success: f64) -> PerformanceSample {
    PerformanceSample::new(avg, avg * 1.5, avg * 2.0, success, 1.0 - success)
}

fn router(models: Vec<ModelCandidate>, samples: Vec<(&str, f64, f64)>) -> ModelRouter {
    let table = PerformanceTable::new(
        samples
            .into_iter()
            .map(|(id, avg, ok)| (id.to_string(), sample(avg, ok))),
    );
    ModelRouter::new(
        Catalog::new(models),
        PerformanceView::fixed(table),
        RoutingConfig::default(),
    )
}

fn route(
    router: &ModelRouter,
    intent: &Intent,
    constraints: Option<&RoutingConstraints>,
) -> RoutingDecision {
    router
        .route(intent, constraints)
        .unwrap_or_else(|e| std::panic::panic_any(format!("test: route failed: {e}")))
}

fn all_intents() -> Vec<Intent> {
    let kinds = [
        IntentType::Query,
        IntentType::Navigation,
        IntentType::Search,
        IntentType::Creation,
        IntentType::Analysis,
        IntentType::Configuration,
        IntentType::Action,
        IntentType::Unknown,
    ];
    let mut out = Vec::new();
    for kind in kinds {
        for confidence in [0.0, 0.35, 0.8, 1.0] {
            out.push(Intent::new(kind, confidence));
        }
    }
    out
}

fn constraint_sets() -> Vec<Option<RoutingConstraints>> {
    vec![
        None,
        Some(RoutingConstraints::default()),
        Some(RoutingConstraints {
            max_cost: Some(0.00001),
            ..RoutingConstraints::default()
        }),
        Some(RoutingConstraints {
            max_latency: Some(500.0),
            ..RoutingConstraints::default()
        }),
        Some(RoutingConstraints {
            max_cost: Some(0.0),
            max_latency: Some(0.0),
            required_capabilities: [Capability::Multimodal, Capability::Creative]
                .into_iter()
                .collect(),
        }),
    ]
}

// ============================================================================
// Ranking and bounds
// ============================================================================

#[test]
fn test_selected_scores_at_least_every_alternative() {
    let router = ModelRouter::builtin();
    for intent in all_intents() {
        for constraints in constraint_sets() {
            let decision = route(&router, &intent, constraints.as_ref());
            let top = decision.selected_score();
            for alt in &decision.alternatives {
                let alt_score = decision
                    .score_of(&alt.id)
                    .unwrap_or_else(|| std::panic::panic_any("test: alternative not ranked"));
                assert!(
                    top >= alt_score,
                    "{} ({top}) ranked above {} ({alt_score})",
                    decision.selected.id,
                    alt.id
                );
            }
        }
    }
}

#[test]
fn test_decision_values_are_bounded() {
    let router = ModelRouter::builtin();
    for intent in all_intents() {
        for constraints in constraint_sets() {
            let d = route(&router, &intent, constraints.as_ref());
            assert!((0.0..=1.0).contains(&d.confidence));
            assert!(d.estimated_cost >= 0.0);
            assert!(d.estimated_latency_ms >= 0.0);
            assert!(d.ranking.iter().all(|b| (0.0..=1.0).contains(&b.total)));
        }
    }
}

#[test]
fn test_alternatives_are_next_three_in_rank_order() {
    let router = ModelRouter::builtin();
    let d = route(&router, &Intent::new(IntentType::Analysis, 0.7), None);
    assert_eq!(d.alternatives.len(), 3);
    let ranked_ids: Vec<&str> = d.ranking.iter().map(|b| b.model_id.as_str()).collect();
    assert_eq!(ranked_ids[0], d.selected.id);
    for (i, alt) in d.alternatives.iter().enumerate() {
        assert_eq!(ranked_ids[i + 1], alt.id);
    }
}

#[test]
fn test_small_catalog_yields_fewer_alternatives() {
    let router = router(
        vec![
            model("a", &[Capability::Reasoning], 0.00001),
            model("b", &[Capability::Reasoning], 0.00002),
        ],
        vec![],
    );
    let d = route(&router, &Intent::new(IntentType::Query, 0.5), None);
    assert_eq!(d.alternatives.len(), 1);
}

#[test]
fn test_single_model_catalog_has_no_alternatives() {
    let router = router(vec![model("only", &[], 0.0)], vec![]);
    let d = route(&router, &Intent::new(IntentType::Creation, 0.5), None);
    assert_eq!(d.selected.id, "only");
    assert!(d.alternatives.is_empty());
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_route_is_deterministic() {
    let router = ModelRouter::builtin();
    for intent in all_intents() {
        for constraints in constraint_sets() {
            let first = route(&router, &intent, constraints.as_ref());
            let second = route(&router, &intent, constraints.as_ref());
            assert_eq!(first.selected.id, second.selected.id);
            let ids = |d: &RoutingDecision| -> Vec<String> {
                d.alternatives.iter().map(|m| m.id.clone()).collect()
            };
            assert_eq!(ids(&first), ids(&second));
            assert_eq!(first.reasoning, second.reasoning);
        }
    }
}

#[test]
fn test_catalog_order_does_not_change_selection() {
    let mut models = orchestra_router::routing::catalog::builtin_models();
    let forward = ModelRouter::new(
        Catalog::new(models.clone()),
        PerformanceView::fixed(PerformanceTable::builtin()),
        RoutingConfig::default(),
    );
    models.reverse();
    let reversed = ModelRouter::new(
        Catalog::new(models),
        PerformanceView::fixed(PerformanceTable::builtin()),
        RoutingConfig::default(),
    );
    for intent in all_intents() {
        let a = route(&forward, &intent, None);
        let b = route(&reversed, &intent, None);
        assert_eq!(a.selected.id, b.selected.id);
        assert_eq!(a.ranking, b.ranking);
    }
}

// ============================================================================
// Capability-driven scenarios
// ============================================================================

#[test]
fn test_creation_prefers_creative_model_over_cheap_fast_one() {
    let router = ModelRouter::builtin();
    let d = route(&router, &Intent::new(IntentType::Creation, 0.9), None);

    let opus = d
        .score_of("claude-3-opus")
        .unwrap_or_else(|| std::panic::panic_any("test: opus ranked"));
    let mixtral = d
        .score_of("mixtral-8x7b")
        .unwrap_or_else(|| std::panic::panic_any("test: mixtral ranked"));
    assert!(opus > mixtral, "opus {opus} should outrank mixtral {mixtral}");

    let pos = |id: &str| d.ranking.iter().position(|b| b.model_id == id);
    assert!(pos("claude-3-opus") < pos("mixtral-8x7b"));
}

#[test]
fn test_search_latency_penalty_flips_ordering() {
    let router = router(
        vec![
            model("quick", &[Capability::Reasoning], 0.0001),
            model("thorough", &[Capability::Reasoning, Capability::Fast], 0.0001),
        ],
        vec![("quick", 400.0, 0.9), ("thorough", 600.0, 0.9)],
    );
    let intent = Intent::new(IntentType::Search, 0.8);

    let unconstrained = route(&router, &intent, None);
    assert_eq!(unconstrained.selected.id, "thorough");

    let limits = RoutingConstraints {
        max_latency: Some(500.0),
        ..RoutingConstraints::default()
    };
    let constrained = route(&router, &intent, Some(&limits));
    assert_eq!(constrained.selected.id, "quick");

    let thorough = constrained
        .ranking
        .iter()
        .find(|b| b.model_id == "thorough")
        .unwrap_or_else(|| std::panic::panic_any("test: thorough ranked"));
    assert_eq!(thorough.penalties, vec![Penalty::OverLatency]);
    assert!((thorough.total - thorough.composite * 0.7).abs() < EPS);
}

#[test]
fn test_analysis_cost_estimate_uses_2000_tokens() {
    let router = router(
        vec![model("analyst", &[Capability::Analysis, Capability::Reasoning], 0.00003)],
        vec![("analyst", 900.0, 0.98)],
    );
    let d = route(&router, &Intent::new(IntentType::Analysis, 0.7), None);
    assert!((d.estimated_cost - 0.06).abs() < 1e-12);
    assert!((d.estimated_latency_ms - 900.0).abs() < EPS);
}

#[test]
fn test_missing_sample_uses_default_latency_estimate() {
    let router = router(vec![model("cold", &[Capability::Reasoning], 0.0)], vec![]);
    let d = route(&router, &Intent::new(IntentType::Query, 0.5), None);
    assert!((d.estimated_latency_ms - 1000.0).abs() < EPS);
    assert!(d.ranking[0].latency_score.abs() < EPS);
    assert!(d.ranking[0].reliability_score.abs() < EPS);
}

#[test]
fn test_uniform_capability_penalty_preserves_ranking() {
    let models = vec![
        model("alpha", &[Capability::Reasoning, Capability::Fast], 0.000001),
        model("bravo", &[Capability::Reasoning], 0.00005),
        model("charlie", &[Capability::Coding], 0.00002),
        model("delta", &[Capability::Reasoning, Capability::Creative], 0.0001),
    ];
    let samples = vec![
        ("alpha", 300.0, 0.99),
        ("bravo", 1500.0, 0.95),
        ("charlie", 800.0, 0.97),
        ("delta", 2000.0, 0.9),
    ];
    let router = router(models, samples);
    let intent = Intent::new(IntentType::Query, 0.6);

    let plain = route(&router, &intent, None);
    let limits = RoutingConstraints {
        required_capabilities: [Capability::Multimodal].into_iter().collect(),
        ..RoutingConstraints::default()
    };
    let penalised = route(&router, &intent, Some(&limits));

    let order = |d: &RoutingDecision| -> Vec<String> {
        d.ranking.iter().map(|b| b.model_id.clone()).collect()
    };
    assert_eq!(order(&plain), order(&penalised));
    for b in &penalised.ranking {
        assert_eq!(b.penalties, vec![Penalty::MissingCapability]);
        assert!((b.total - b.composite * 0.1).abs() < EPS);
    }
}

#[test]
fn test_equal_scores_break_ties_by_id() {
    let caps = [Capability::Reasoning];
    let router = router(
        vec![
            model("zeta", &caps, 0.00001),
            model("eta", &caps, 0.00001),
            model("beta", &caps, 0.00001),
        ],
        vec![
            ("zeta", 700.0, 0.97),
            ("eta", 700.0, 0.97),
            ("beta", 700.0, 0.97),
        ],
    );
    let limits = RoutingConstraints {
        required_capabilities: [Capability::Multimodal].into_iter().collect(),
        ..RoutingConstraints::default()
    };
    for constraints in [None, Some(&limits)] {
        let d = route(&router, &Intent::new(IntentType::Query, 0.5), constraints);
        assert_eq!(d.selected.id, "beta");
        let alts: Vec<&str> = d.alternatives.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(alts, vec!["eta", "zeta"]);
    }
}

#[test]
fn test_unknown_intent_routes_like_query() {
    let router = ModelRouter::builtin();
    let unknown = route(&router, &Intent::new(IntentType::Unknown, 0.6), None);
    let query = route(&router, &Intent::new(IntentType::Query, 0.6), None);
    assert_eq!(unknown.selected.id, query.selected.id);
    assert_eq!(unknown.ranking, query.ranking);
}

#[test]
fn test_unrecognised_wire_type_deserializes_to_unknown() {
    let intent: Intent = serde_json::from_str(r#"{"type": "teleport", "confidence": 0.4}"#)
        .unwrap_or_else(|e| std::panic::panic_any(format!("test: parse: {e}")));
    assert_eq!(intent.kind, IntentType::Unknown);
    let missing: Intent = serde_json::from_str(r#"{"confidence": 0.4}"#)
        .unwrap_or_else(|e| std::panic::panic_any(format!("test: parse: {e}")));
    assert_eq!(missing.kind, IntentType::Query);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_empty_catalog_is_an_error() {
    let router = router(vec![], vec![]);
    let result = router.route(&Intent::new(IntentType::Creation, 0.9), None);
    assert_eq!(result, Err(RouterError::EmptyCatalog));
}

#[test]
fn test_negative_thresholds_are_rejected() {
    let router = ModelRouter::builtin();
    let intent = Intent::new(IntentType::Query, 0.5);

    let cost = RoutingConstraints {
        max_cost: Some(-0.001),
        ..RoutingConstraints::default()
    };
    assert!(matches!(
        router.route(&intent, Some(&cost)),
        Err(RouterError::InvalidConstraint { field: "max_cost", .. })
    ));

    let latency = RoutingConstraints {
        max_latency: Some(-1.0),
        ..RoutingConstraints::default()
    };
    assert!(matches!(
        router.route(&intent, Some(&latency)),
        Err(RouterError::InvalidConstraint {
            field: "max_latency",
            ..
        })
    ));
}

#[test]
fn test_out_of_range_confidence_is_rejected() {
    let router = ModelRouter::builtin();
    for bad in [-0.1, 1.01, f64::NAN] {
        let result = router.route(&Intent::new(IntentType::Query, bad), None);
        assert!(matches!(result, Err(RouterError::InvalidIntent { .. })));
    }
}

#[test]
fn test_invalid_constraint_reported_before_empty_catalog() {
    let router = router(vec![], vec![]);
    let limits = RoutingConstraints {
        max_cost: Some(-1.0),
        ..RoutingConstraints::default()
    };
    let result = router.route(&Intent::new(IntentType::Query, 0.5), Some(&limits));
    assert!(matches!(result, Err(RouterError::InvalidConstraint { .. })));
}

// ============================================================================
// Reasoning text
// ============================================================================

#[test]
fn test_reasoning_names_selected_model() {
    let router = ModelRouter::builtin();
    for intent in all_intents() {
        let d = route(&router, &intent, None);
        assert!(!d.reasoning.is_empty());
        assert!(d.reasoning.contains(&d.selected.name));
        assert!(d.reasoning.ends_with('.'));
    }
}

// ============================================================================
// Live performance table
// ============================================================================

#[test]
fn test_published_table_changes_next_decision() {
    let models = vec![
        model("one", &[Capability::Reasoning], 0.00001),
        model("two", &[Capability::Reasoning], 0.00001),
    ];
    let (feed, view) = PerformanceFeed::new(PerformanceTable::new([
        ("one".to_string(), sample(200.0, 0.99)),
        ("two".to_string(), sample(2500.0, 0.80)),
    ]));
    let router = ModelRouter::new(Catalog::new(models), view, RoutingConfig::default());
    let intent = Intent::new(IntentType::Query, 0.5);
    assert_eq!(route(&router, &intent, None).selected.id, "one");

    feed.publish(PerformanceTable::new([
        ("one".to_string(), sample(2500.0, 0.80)),
        ("two".to_string(), sample(200.0, 0.99)),
    ]));
    assert_eq!(route(&router, &intent, None).selected.id, "two");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_routes_see_consistent_snapshots() {
    let models = vec![
        model("one", &[Capability::Reasoning], 0.00001),
        model("two", &[Capability::Reasoning], 0.00001),
    ];
    let fast_one = PerformanceTable::new([
        ("one".to_string(), sample(200.0, 0.99)),
        ("two".to_string(), sample(2500.0, 0.80)),
    ]);
    let fast_two = PerformanceTable::new([
        ("one".to_string(), sample(2500.0, 0.80)),
        ("two".to_string(), sample(200.0, 0.99)),
    ]);
    let (feed, view) = PerformanceFeed::new(fast_one.clone());
    let router = Arc::new(ModelRouter::new(
        Catalog::new(models),
        view,
        RoutingConfig::default(),
    ));

    let writer = tokio::spawn(async move {
        for i in 0..200 {
            let table = if i % 2 == 0 { fast_two.clone() } else { fast_one.clone() };
            feed.publish(table);
            tokio::task::yield_now().await;
        }
    });

    let mut readers = Vec::new();
    for _ in 0..4 {
        let router = Arc::clone(&router);
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                let d = route(&router, &Intent::new(IntentType::Query, 0.5), None);
                // Every published table has exactly one 200ms model and it
                // always wins, so a consistent snapshot estimates 200ms.
                assert!(
                    (d.estimated_latency_ms - 200.0).abs() < EPS,
                    "selected {} at {}ms",
                    d.selected.id,
                    d.estimated_latency_ms
                );
                tokio::task::yield_now().await;
            }
        }));
    }

    writer
        .await
        .unwrap_or_else(|e| std::panic::panic_any(format!("test: writer: {e}")));
    for r in readers {
        r.await
            .unwrap_or_else(|e| std::panic::panic_any(format!("test: reader: {e}")));
    }
}

// ============================================================================
// Classifier to router
// ============================================================================

#[test]
fn test_classified_text_routes_end_to_end() {
    let router = ModelRouter::builtin();
    let classifier = IntentClassifier::new(router.catalog());

    let intent = classifier.classify("write a short story about a lighthouse");
    assert_eq!(intent.kind, IntentType::Creation);

    let d = route(&router, &intent, None);
    let required: BTreeSet<Capability> = intent.kind.required_capabilities();
    assert!(d.selected.covers(&required));
}
