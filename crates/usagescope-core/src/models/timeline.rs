//! Timeline breakdown derived for a grouped row

use serde::{Deserialize, Serialize};

/// Quantity/price pair for one timeline stage
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageMetric {
    /// Number of items in the stage
    pub quantity: f64,
    /// Total price of the stage
    pub total_price: f64,
}

impl StageMetric {
    fn uniform(value: f64) -> Self {
        Self {
            quantity: value,
            total_price: value,
        }
    }
}

/// Per-row breakdown of the usage pipeline stages.
///
/// Values are a deterministic placeholder derived from the row's aggregated
/// total until the timeline endpoint is wired in: rated and billing carry the
/// total, raw items 110% of it and failed items the remaining 10%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    /// Raw submitted usage items
    pub usage_items: StageMetric,
    /// Items that passed rating
    pub usage_items_rated: StageMetric,
    /// Items that reached billing
    pub usage_billing_items: StageMetric,
    /// Items rejected along the way
    pub usage_items_failed: StageMetric,
}

impl TimelineSnapshot {
    /// Derive the placeholder snapshot from a grouped row's aggregated total.
    pub fn from_aggregated_total(total: f64) -> Self {
        Self {
            usage_items: StageMetric::uniform(total * 1.1),
            usage_items_rated: StageMetric::uniform(total),
            usage_billing_items: StageMetric::uniform(total),
            usage_items_failed: StageMetric::uniform(total * 0.1),
        }
    }

    /// Whether the failed stage should be rendered.
    pub fn has_failed_items(&self) -> bool {
        self.usage_items_failed.quantity > 0.0 || self.usage_items_failed.total_price > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_derivation_from_total() {
        let snapshot = TimelineSnapshot::from_aggregated_total(200.0);

        assert!((snapshot.usage_items_rated.quantity - 200.0).abs() < f64::EPSILON);
        assert!((snapshot.usage_items_rated.total_price - 200.0).abs() < f64::EPSILON);
        assert!((snapshot.usage_items.quantity - 220.0).abs() < 1e-9);
        assert!((snapshot.usage_items.total_price - 220.0).abs() < 1e-9);
        assert!((snapshot.usage_items_failed.quantity - 20.0).abs() < 1e-9);
        assert!((snapshot.usage_items_failed.total_price - 20.0).abs() < 1e-9);
        assert!((snapshot.usage_billing_items.quantity - 200.0).abs() < f64::EPSILON);
        assert!(snapshot.has_failed_items());
    }

    #[test]
    fn zero_total_hides_failed_stage() {
        let snapshot = TimelineSnapshot::from_aggregated_total(0.0);
        assert!(!snapshot.has_failed_items());
    }
}
