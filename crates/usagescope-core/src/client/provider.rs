//! Pluggable usage data source

use async_trait::async_trait;

use super::AggregationClient;
use crate::error::Result;
use crate::models::{AggregationType, FilterCriteria, UsageRecord};

/// Source of usage records for the form's submit operation.
///
/// The UI takes a provider and never branches on live-vs-fixture itself.
#[async_trait]
pub trait UsageDataProvider: Send + Sync {
    /// Fetch usage records matching the criteria.
    async fn fetch_usage(&self, criteria: &FilterCriteria) -> Result<Vec<UsageRecord>>;
}

/// Provider backed by the live aggregation endpoint
pub struct LiveProvider {
    client: AggregationClient,
}

impl LiveProvider {
    /// Wrap an aggregation client.
    pub fn new(client: AggregationClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UsageDataProvider for LiveProvider {
    async fn fetch_usage(&self, criteria: &FilterCriteria) -> Result<Vec<UsageRecord>> {
        self.client.fetch_aggregated_usage(criteria).await
    }
}

/// Offline provider producing canned usage records for manual testing
#[derive(Debug, Default)]
pub struct FixtureProvider;

impl FixtureProvider {
    fn record(criteria: &FilterCriteria, sku: Option<&str>, amount: f64) -> UsageRecord {
        let fallback = |value: &str, default: &str| {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };
        UsageRecord {
            request_group_id: fallback(&criteria.request_group_id, "X"),
            entity_id: fallback(&criteria.entity_id, "2"),
            sku_id: sku.map(ToString::to_string),
            usage_amount: amount,
            quantity: 0.0,
        }
    }

    fn canned(criteria: &FilterCriteria) -> Vec<UsageRecord> {
        let per_sku = vec![
            Self::record(criteria, Some("123"), 1234.56),
            Self::record(criteria, Some("124"), 567.89),
            {
                let mut r = Self::record(criteria, Some("125"), 543.33);
                if criteria.entity_id.trim().is_empty() {
                    r.entity_id = "3".to_string();
                }
                r
            },
        ];

        match criteria.aggregation_type {
            AggregationType::Sku => per_sku,
            AggregationType::RequestGroup if criteria.has_sku_filter() => per_sku,
            AggregationType::RequestGroup => {
                vec![Self::record(criteria, None, 2345.78)]
            }
        }
    }
}

#[async_trait]
impl UsageDataProvider for FixtureProvider {
    async fn fetch_usage(&self, criteria: &FilterCriteria) -> Result<Vec<UsageRecord>> {
        let mut usages = Self::canned(criteria);
        if criteria.has_sku_filter() {
            usages.retain(|usage| usage.sku_id.as_deref() == Some(criteria.sku_id.as_str()));
        }
        Ok(usages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityType;

    fn criteria(aggregation_type: AggregationType, sku: &str) -> FilterCriteria {
        FilterCriteria {
            request_group_id: "RG1".to_string(),
            entity_id: "E1".to_string(),
            entity_type: EntityType::Entitlement,
            sku_id: sku.to_string(),
            aggregation_type,
        }
    }

    #[tokio::test]
    async fn sku_aggregation_yields_per_sku_records() {
        let usages = FixtureProvider
            .fetch_usage(&criteria(AggregationType::Sku, ""))
            .await
            .unwrap();
        assert_eq!(usages.len(), 3);
        assert!(usages.iter().all(|u| u.sku_id.is_some()));
    }

    #[tokio::test]
    async fn request_group_aggregation_yields_single_record() {
        let usages = FixtureProvider
            .fetch_usage(&criteria(AggregationType::RequestGroup, ""))
            .await
            .unwrap();
        assert_eq!(usages.len(), 1);
        assert!(usages[0].sku_id.is_none());
        assert!((usages[0].usage_amount - 2345.78).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn sku_filter_narrows_the_canned_set() {
        let usages = FixtureProvider
            .fetch_usage(&criteria(AggregationType::RequestGroup, "124"))
            .await
            .unwrap();
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].sku_id.as_deref(), Some("124"));
    }

    #[tokio::test]
    async fn unknown_sku_filter_yields_nothing() {
        let usages = FixtureProvider
            .fetch_usage(&criteria(AggregationType::Sku, "999"))
            .await
            .unwrap();
        assert!(usages.is_empty());
    }
}
