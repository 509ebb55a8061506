//! Prometheus metrics for the model router.
//!
//! ## Usage
//!
//! Call [`init_metrics`] once at process startup. The helper functions
//! (`record_route_latency`, `inc_request`, …) are no-ops if `init_metrics`
//! was never called, so routing is always safe to run and observability
//! simply degrades gracefully.
//!
//! ## Metrics Exposed
//!
//! | Name | Type | Labels |
//! |------|------|--------|
//! | `router_requests_total` | Counter | `intent` |
//! | `router_selections_total` | Counter | `model` |
//! | `router_errors_total` | Counter | `err_type` |
//! | `router_unknown_intent_total` | Counter | |
//! | `router_route_duration_seconds` | Histogram | |

use crate::RouterError;
use prometheus::{
    core::Collector, CounterVec, Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry,
    TextEncoder,
};
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

// ── Internal metrics bundle ────────────────────────────────────────────────

/// All Prometheus metrics for the router, stored in a single [`OnceLock`].
pub struct Metrics {
    /// Prometheus registry that owns all metric descriptors.
    pub registry: Registry,
    /// Routing requests per intent type.
    pub requests_total: CounterVec,
    /// Selections per chosen model.
    pub selections_total: CounterVec,
    /// Routing failures by error kind.
    pub errors_total: CounterVec,
    /// Intents whose type tag was not recognised.
    pub unknown_intent_total: IntCounter,
    /// Wall time of one `route()` call.
    pub route_duration: Histogram,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

// Sub-millisecond scoring is the norm; the default buckets start at 5ms.
const ROUTE_BUCKETS: &[f64] = &[
    0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1,
];

fn init_err(e: prometheus::Error) -> RouterError {
    RouterError::Other(format!("metrics init failed: {e}"))
}

fn register_err(e: prometheus::Error) -> RouterError {
    RouterError::Other(format!("metrics registration failed: {e}"))
}

fn build(prefix: &str) -> Result<Metrics, RouterError> {
    let registry = Registry::new();

    let requests_total = CounterVec::new(
        Opts::new(
            format!("{prefix}_requests_total"),
            "Routing requests by intent type",
        ),
        &["intent"],
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(requests_total.clone()))
        .map_err(register_err)?;

    let selections_total = CounterVec::new(
        Opts::new(
            format!("{prefix}_selections_total"),
            "Routing decisions by selected model",
        ),
        &["model"],
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(selections_total.clone()))
        .map_err(register_err)?;

    let errors_total = CounterVec::new(
        Opts::new(
            format!("{prefix}_errors_total"),
            "Routing failures by error kind",
        ),
        &["err_type"],
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(errors_total.clone()))
        .map_err(register_err)?;

    let unknown_intent_total = IntCounter::new(
        format!("{prefix}_unknown_intent_total"),
        "Intents routed with an unrecognised type tag",
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(unknown_intent_total.clone()))
        .map_err(register_err)?;

    let route_duration = Histogram::with_opts(
        HistogramOpts::new(
            format!("{prefix}_route_duration_seconds"),
            "Duration of a single routing decision",
        )
        .buckets(ROUTE_BUCKETS.to_vec()),
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(route_duration.clone()))
        .map_err(register_err)?;

    Ok(Metrics {
        registry,
        requests_total,
        selections_total,
        errors_total,
        unknown_intent_total,
        route_duration,
    })
}

// ── Initialisation ─────────────────────────────────────────────────────────

/// Initialise all Prometheus metrics and register them with a private registry.
///
/// Calling it a second time is a no-op (returns `Ok(())`).
///
/// # Errors
///
/// Returns [`RouterError::Other`] if metric construction or registry
/// registration fails.
///
/// # Panics
///
/// This function never panics.
pub fn init_metrics() -> Result<(), RouterError> {
    if METRICS.get().is_some() {
        return Ok(());
    }
    let bundle = build("router")?;
    // A racing initialiser builds identical descriptors; first one wins.
    let _ = METRICS.set(bundle);
    Ok(())
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

// ── Public helper functions ────────────────────────────────────────────────

/// Record how long one routing decision took.
///
/// # Panics
///
/// This function never panics.
pub fn record_route_latency(d: Duration) {
    if let Some(m) = metrics() {
        m.route_duration.observe(d.as_secs_f64());
    }
}

/// Count a routing request for `intent`.
///
/// # Panics
///
/// This function never panics.
pub fn inc_request(intent: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.requests_total.get_metric_with_label_values(&[intent]) {
            c.inc();
        }
    }
}

/// Count a decision that selected `model`.
///
/// # Panics
///
/// This function never panics.
pub fn inc_selection(model: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.selections_total.get_metric_with_label_values(&[model]) {
            c.inc();
        }
    }
}

/// Count a routing failure of kind `err_type`.
///
/// # Panics
///
/// This function never panics.
pub fn inc_error(err_type: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.errors_total.get_metric_with_label_values(&[err_type]) {
            c.inc();
        }
    }
}

/// Count an intent routed with an unrecognised type tag.
///
/// # Panics
///
/// This function never panics.
pub fn inc_unknown_intent() {
    if let Some(m) = metrics() {
        m.unknown_intent_total.inc();
    }
}

/// Gather all registered metrics as a raw list of metric families.
///
/// Returns an empty `Vec` if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    metrics().map_or_else(Vec::new, |m| m.registry.gather())
}

/// Gather and encode all metrics in the Prometheus text exposition format.
///
/// Returns an empty string if metrics have not been initialised or if
/// encoding fails.
///
/// # Panics
///
/// This function never panics.
pub fn gather_metrics() -> String {
    let families = gather();
    if families.is_empty() {
        return String::new();
    }
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// A structured snapshot of the router counters, used by the health endpoint.
#[derive(Debug, Default, serde::Serialize)]
pub struct MetricsSummary {
    /// Request counts keyed by intent label.
    pub requests_total: HashMap<String, u64>,
    /// Selection counts keyed by model id.
    pub selections_total: HashMap<String, u64>,
    /// Error counts keyed by error kind.
    pub errors_total: HashMap<String, u64>,
    /// Unknown-intent count.
    pub unknown_intent_total: u64,
}

fn collect_by_label(vec: &CounterVec, label: &str) -> HashMap<String, u64> {
    let mut out = HashMap::new();
    for family in vec.collect() {
        for metric in family.get_metric() {
            let key = metric
                .get_label()
                .iter()
                .find(|l| l.get_name() == label)
                .map_or("unknown", |l| l.get_value());
            out.insert(key.to_string(), metric.get_counter().get_value() as u64);
        }
    }
    out
}

/// Return a structured summary of current counter values.
///
/// Returns a zeroed [`MetricsSummary`] if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn get_metrics_summary() -> MetricsSummary {
    let Some(m) = metrics() else {
        return MetricsSummary::default();
    };
    MetricsSummary {
        requests_total: collect_by_label(&m.requests_total, "intent"),
        selections_total: collect_by_label(&m.selections_total, "model"),
        errors_total: collect_by_label(&m.errors_total, "err_type"),
        unknown_intent_total: m.unknown_intent_total.get(),
    }
}
