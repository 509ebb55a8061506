//! Configuration validation engine.
//!
//! ## Responsibility
//! Validate semantic constraints on a parsed [`ServiceConfig`] that cannot
//! be expressed through the type system alone: range checks on rates and
//! latencies, unique model ids, and performance rows that point at real
//! catalog entries.
//!
//! ## Guarantees
//! - Every validation rule has at least one test that triggers it
//! - Validation collects *all* errors before returning (no short-circuit)
//! - Error messages include the field path and the invalid value
//!
//! ## NOT Responsible For
//! - Parsing TOML (that belongs to `loader`)
//! - File I/O (that belongs to `loader`)

use std::collections::HashSet;

use super::ServiceConfig;
use crate::routing::config as routing_config;

/// Errors arising from configuration parsing, validation, or I/O.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing failed.
    #[error("Parse error in {file}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        file: String,
        /// Underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// One or more semantic validation rules failed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A specific field has an out-of-range or contradictory value.
    #[error("Field '{field}' has invalid value {value}: {reason}")]
    InvalidField {
        /// Dot-separated field path (e.g., "models[2].cost_per_token").
        field: String,
        /// String representation of the invalid value.
        value: String,
        /// Human-readable explanation of the constraint.
        reason: String,
    },

    /// File I/O error.
    #[error("IO error reading {file}: {source}")]
    Io {
        /// Path of the file that could not be read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn invalid(field: String, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidField {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn check_rate(errors: &mut Vec<ConfigError>, field: String, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(invalid(field, value, "must be between 0.0 and 1.0"));
    }
}

fn check_latency(errors: &mut Vec<ConfigError>, field: String, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.push(invalid(field, value, "must be a finite, non-negative number"));
    }
}

/// Validate all semantic constraints on a [`ServiceConfig`].
///
/// Collects every violation before returning so the caller sees the full
/// scope of issues at once.
///
/// # Returns
///
/// - `Ok(())` if all constraints pass.
/// - `Err(Vec<ConfigError>)` with every violation found.
///
/// # Panics
///
/// This function never panics.
pub fn validate(config: &ServiceConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // ── Server ───────────────────────────────────────────────────────
    if config.server.port == 0 {
        errors.push(invalid("server.port".into(), 0, "must be at least 1"));
    }

    if config.server.max_request_size == 0 {
        errors.push(invalid(
            "server.max_request_size".into(),
            0,
            "must be at least 1",
        ));
    }

    // ── Routing tuning ───────────────────────────────────────────────
    for message in routing_config::validate(&config.routing) {
        errors.push(ConfigError::Validation(message));
    }

    // ── Catalog ──────────────────────────────────────────────────────
    if config.models.is_empty() {
        errors.push(invalid(
            "models".into(),
            "[]",
            "at least one model must be defined",
        ));
    }

    let mut seen_ids = HashSet::new();
    for (i, model) in config.models.iter().enumerate() {
        if model.id.trim().is_empty() {
            errors.push(invalid(format!("models[{i}].id"), "\"\"", "must not be empty"));
        } else if !seen_ids.insert(model.id.as_str()) {
            errors.push(invalid(
                format!("models[{i}].id"),
                &model.id,
                "duplicate model id",
            ));
        }

        if model.name.trim().is_empty() {
            errors.push(invalid(
                format!("models[{i}].name"),
                "\"\"",
                "must not be empty",
            ));
        }

        if !model.cost_per_token.is_finite() || model.cost_per_token < 0.0 {
            errors.push(invalid(
                format!("models[{i}].cost_per_token"),
                model.cost_per_token,
                "must be a finite, non-negative number",
            ));
        }

        if model.max_context_tokens == 0 {
            errors.push(invalid(
                format!("models[{i}].max_context_tokens"),
                0,
                "must be at least 1",
            ));
        }
    }

    // ── Performance table ────────────────────────────────────────────
    let rows = config.performance_rows();
    let mut seen_rows = HashSet::new();
    for (i, row) in rows.iter().enumerate() {
        let prefix = format!("performance[{i}]");

        if !seen_ids.contains(row.model_id.as_str()) {
            errors.push(invalid(
                format!("{prefix}.model_id"),
                &row.model_id,
                "does not name a model in the catalog",
            ));
        }
        if !seen_rows.insert(row.model_id.as_str()) {
            errors.push(invalid(
                format!("{prefix}.model_id"),
                &row.model_id,
                "duplicate performance row",
            ));
        }

        let s = &row.sample;
        check_latency(&mut errors, format!("{prefix}.avg_latency_ms"), s.avg_latency_ms);
        check_latency(&mut errors, format!("{prefix}.p95_latency_ms"), s.p95_latency_ms);
        check_latency(&mut errors, format!("{prefix}.p99_latency_ms"), s.p99_latency_ms);
        check_rate(&mut errors, format!("{prefix}.success_rate"), s.success_rate);
        check_rate(&mut errors, format!("{prefix}.error_rate"), s.error_rate);

        if s.p95_latency_ms > s.p99_latency_ms {
            errors.push(invalid(
                format!("{prefix}.p95_latency_ms"),
                s.p95_latency_ms,
                "must be \u{2264} p99_latency_ms",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
