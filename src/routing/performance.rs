//! Per-model performance samples and their snapshot store.
//!
//! The table is written by a telemetry source (or the config watcher) and
//! read by the router. Writers replace the whole table; readers clone an
//! `Arc` to the current version, so one routing call always sees one
//! consistent table even if a refresh lands mid-call.
//!
//! The two halves are separate types: [`PerformanceFeed`] can publish,
//! [`PerformanceView`] can only read. The router is handed a view.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Rolling latency and reliability metrics for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PerformanceSample {
    /// Average latency in milliseconds.
    pub avg_latency_ms: f64,
    /// 95th percentile latency in milliseconds.
    pub p95_latency_ms: f64,
    /// 99th percentile latency in milliseconds.
    pub p99_latency_ms: f64,
    /// Fraction of successful calls, `0.0..=1.0`.
    pub success_rate: f64,
    /// Fraction of failed calls, `0.0..=1.0`.
    pub error_rate: f64,
    /// When the sample was last refreshed.
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl PerformanceSample {
    /// Build a sample stamped with the current time.
    pub fn new(
        avg_latency_ms: f64,
        p95_latency_ms: f64,
        p99_latency_ms: f64,
        success_rate: f64,
        error_rate: f64,
    ) -> Self {
        Self {
            avg_latency_ms,
            p95_latency_ms,
            p99_latency_ms,
            success_rate,
            error_rate,
            last_updated: Utc::now(),
        }
    }
}

/// One immutable version of the performance table, keyed by model id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceTable {
    samples: HashMap<String, PerformanceSample>,
}

impl PerformanceTable {
    /// Build a table from `(model_id, sample)` pairs. Later duplicates win.
    pub fn new(samples: impl IntoIterator<Item = (String, PerformanceSample)>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    /// Mock telemetry for the built-in catalog.
    pub fn builtin() -> Self {
        let rows = [
            ("gpt-4-turbo", 1200.0, 2100.0, 3200.0, 0.98, 0.02),
            ("gpt-3.5-turbo", 450.0, 800.0, 1200.0, 0.99, 0.01),
            ("claude-3-opus", 1800.0, 2900.0, 4100.0, 0.97, 0.03),
            ("claude-3-sonnet", 900.0, 1500.0, 2200.0, 0.98, 0.02),
            ("claude-3-haiku", 350.0, 600.0, 900.0, 0.99, 0.01),
            ("gemini-pro", 800.0, 1400.0, 2000.0, 0.96, 0.04),
            ("mixtral-8x7b", 400.0, 700.0, 1100.0, 0.95, 0.05),
        ];
        Self::new(rows.into_iter().map(|(id, avg, p95, p99, ok, err)| {
            (id.to_string(), PerformanceSample::new(avg, p95, p99, ok, err))
        }))
    }

    /// Sample for `model_id`, if one has been reported.
    pub fn get(&self, model_id: &str) -> Option<&PerformanceSample> {
        self.samples.get(model_id)
    }

    /// Number of models with a sample.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Return `true` if no samples are present.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate `(model_id, sample)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PerformanceSample)> {
        self.samples.iter().map(|(k, v)| (k.as_str(), v))
    }
}

type Slot = Arc<RwLock<Arc<PerformanceTable>>>;

/// Write half of the performance store.
///
/// Held by whatever refreshes telemetry. Cloning shares the same slot.
#[derive(Debug, Clone)]
pub struct PerformanceFeed {
    slot: Slot,
}

/// Read half of the performance store. Cannot publish.
#[derive(Debug, Clone)]
pub struct PerformanceView {
    slot: Slot,
}

impl PerformanceFeed {
    /// Create a store seeded with `initial` and return both halves.
    pub fn new(initial: PerformanceTable) -> (Self, PerformanceView) {
        let slot: Slot = Arc::new(RwLock::new(Arc::new(initial)));
        (
            Self { slot: slot.clone() },
            PerformanceView { slot },
        )
    }

    /// Replace the whole table. Readers holding an older snapshot keep it.
    pub fn publish(&self, table: PerformanceTable) {
        let table = Arc::new(table);
        *self.slot.write() = table;
        tracing::debug!("performance table refreshed");
    }

    /// Hand out another read half over the same slot.
    pub fn view(&self) -> PerformanceView {
        PerformanceView {
            slot: self.slot.clone(),
        }
    }
}

impl PerformanceView {
    /// A view over a fixed table with no feed attached.
    pub fn fixed(table: PerformanceTable) -> Self {
        PerformanceFeed::new(table).1
    }

    /// Current version of the table.
    pub fn snapshot(&self) -> Arc<PerformanceTable> {
        self.slot.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(avg: f64) -> PerformanceSample {
        PerformanceSample::new(avg, avg * 1.5, avg * 2.0, 0.9, 0.1)
    }

    #[test]
    fn test_builtin_table_covers_builtin_catalog() {
        let table = PerformanceTable::builtin();
        for model in crate::routing::catalog::builtin_models() {
            assert!(table.get(&model.id).is_some(), "missing sample for {}", model.id);
        }
    }

    #[test]
    fn test_table_later_duplicate_wins() {
        let table = PerformanceTable::new([
            ("m".to_string(), sample(100.0)),
            ("m".to_string(), sample(200.0)),
        ]);
        assert_eq!(table.len(), 1);
        assert!((table.get("m").map(|s| s.avg_latency_ms).unwrap_or(0.0) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_publish_visible_to_views() {
        let (feed, view) = PerformanceFeed::new(PerformanceTable::default());
        assert!(view.snapshot().is_empty());

        feed.publish(PerformanceTable::new([("m".to_string(), sample(100.0))]));
        assert_eq!(view.snapshot().len(), 1);
        assert_eq!(feed.view().snapshot().len(), 1);
    }

    #[test]
    fn test_old_snapshot_unchanged_after_publish() {
        let (feed, view) = PerformanceFeed::new(PerformanceTable::new([(
            "m".to_string(),
            sample(100.0),
        )]));
        let before = view.snapshot();
        feed.publish(PerformanceTable::new([("m".to_string(), sample(900.0))]));

        assert!((before.get("m").map(|s| s.avg_latency_ms).unwrap_or(0.0) - 100.0).abs() < 1e-9);
        assert!(
            (view.snapshot().get("m").map(|s| s.avg_latency_ms).unwrap_or(0.0) - 900.0).abs()
                < 1e-9
        );
    }

    #[test]
    fn test_fixed_view_reads_table() {
        let view = PerformanceView::fixed(PerformanceTable::builtin());
        assert_eq!(view.snapshot().len(), 7);
    }

    #[test]
    fn test_sample_toml_without_timestamp_parses() {
        let src = r#"
avg_latency_ms = 400.0
p95_latency_ms = 700.0
p99_latency_ms = 1100.0
success_rate = 0.95
error_rate = 0.05
"#;
        let parsed: PerformanceSample = toml::from_str(src)
            .unwrap_or_else(|e| std::panic::panic_any(format!("test: deserialize: {e}")));
        assert!((parsed.success_rate - 0.95).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_concurrent_readers_see_whole_tables() {
        let (feed, view) = PerformanceFeed::new(PerformanceTable::new([
            ("a".to_string(), sample(1.0)),
            ("b".to_string(), sample(1.0)),
        ]));

        let reader = tokio::spawn(async move {
            for _ in 0..1_000 {
                let snap = view.snapshot();
                let a = snap.get("a").map(|s| s.avg_latency_ms);
                let b = snap.get("b").map(|s| s.avg_latency_ms);
                assert_eq!(a, b, "snapshot mixed two table versions");
                tokio::task::yield_now().await;
            }
        });

        for i in 2..200 {
            let v = i as f64;
            feed.publish(PerformanceTable::new([
                ("a".to_string(), sample(v)),
                ("b".to_string(), sample(v)),
            ]));
            tokio::task::yield_now().await;
        }

        assert!(reader.await.is_ok());
    }
}
