//! Caller-supplied routing limits.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::catalog::Capability;
use crate::RouterError;

/// Optional limits a caller attaches to a routing request.
///
/// Violations never filter a candidate out; they scale its score down (see
/// [`super::config::PenaltyFactors`]). Field names also accept the camelCase
/// spelling (`maxCost`, `maxLatency`, `requiredCapabilities`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingConstraints {
    /// Highest acceptable cost per token (USD).
    #[serde(default, alias = "maxCost", skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
    /// Highest acceptable average latency (ms).
    #[serde(default, alias = "maxLatency", skip_serializing_if = "Option::is_none")]
    pub max_latency: Option<f64>,
    /// Capabilities the selected model must have.
    #[serde(
        default,
        alias = "requiredCapabilities",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub required_capabilities: BTreeSet<Capability>,
}

impl RoutingConstraints {
    /// Reject negative or non-finite thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidConstraint`] naming the first bad field.
    pub fn validate(&self) -> Result<(), RouterError> {
        check_threshold("max_cost", self.max_cost)?;
        check_threshold("max_latency", self.max_latency)?;
        Ok(())
    }
}

fn check_threshold(field: &'static str, value: Option<f64>) -> Result<(), RouterError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(RouterError::InvalidConstraint {
            field,
            value: v.to_string(),
        }),
        _ => Ok(()),
    }
}
