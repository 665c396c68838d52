//! HTTP client for the usage-analytics aggregation backend

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::{AggregationType, EntityType, FilterCriteria, UsageRecord};

const AGGREGATE_PATH: &str = "/api/v1/usage-analytics/aggregate";
const TIMELINE_PATH: &str = "/api/usage/timeline";

/// Search portion of the aggregation request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchCriteria {
    request_group_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
}

/// Grouping portion of the aggregation request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregationCriteria {
    group_by: Vec<&'static str>,
    measures: Vec<&'static str>,
    aggregation_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregateRequest {
    search_criteria: SearchCriteria,
    aggregation_criteria: AggregationCriteria,
}

/// One bucket of the aggregation response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageBucket {
    #[serde(default)]
    group_by: Option<GroupByFields>,
    #[serde(default)]
    sum_values: Option<SumValues>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupByFields {
    request_group_id: Option<String>,
    subscription_id: Option<String>,
    account_id: Option<String>,
    unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SumValues {
    total_price: Option<f64>,
    quantity: Option<f64>,
}

/// Error body optionally returned by the backend on a non-2xx response
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Timeline request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineRequest {
    request_group_id: String,
    entity_id: String,
    entity_type: EntityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    sku_id: Option<String>,
}

/// Client for the aggregation and timeline endpoints.
///
/// Exactly one attempt per call; errors surface to the caller, which must not
/// retry automatically.
pub struct AggregationClient {
    http: reqwest::Client,
    base_url: String,
}

impl AggregationClient {
    /// Create a client from the API configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch aggregated usage for the given filter criteria and reshape each
    /// response bucket into a [`UsageRecord`]. Group-by fields the backend
    /// omits fall back to the input criteria values.
    pub async fn fetch_aggregated_usage(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<UsageRecord>> {
        let body = build_aggregate_request(criteria);
        let url = format!("{}{AGGREGATE_PATH}", self.base_url);
        debug!(url = %url, "sending aggregation request");

        let response = self.http.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .message
                .unwrap_or_else(|| "Failed to fetch usage data".to_string());
            error!(%status, %message, "aggregation request failed");
            return Err(Error::request(message));
        }

        let buckets: Vec<UsageBucket> = response.json().await?;
        Ok(map_buckets(buckets, criteria))
    }

    /// Fetch the timeline breakdown for one usage row and return the backend's
    /// JSON body as-is. Collaborator interface for the real timeline source;
    /// the TUI currently derives a local placeholder instead.
    pub async fn fetch_timeline(
        &self,
        request_group_id: &str,
        entity_id: &str,
        entity_type: EntityType,
        sku_id: Option<&str>,
    ) -> Result<serde_json::Value> {
        let body = TimelineRequest {
            request_group_id: request_group_id.to_string(),
            entity_id: entity_id.to_string(),
            entity_type,
            sku_id: sku_id.filter(|s| !s.trim().is_empty()).map(ToString::to_string),
        };
        let url = format!("{}{TIMELINE_PATH}", self.base_url);
        debug!(url = %url, "sending timeline request");

        let response = self.http.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .message
                .unwrap_or_else(|| "Failed to fetch timeline data".to_string());
            error!(%status, %message, "timeline request failed");
            return Err(Error::request(message));
        }

        Ok(response.json().await?)
    }
}

fn build_aggregate_request(criteria: &FilterCriteria) -> AggregateRequest {
    let (subscription_id, account_id) = match criteria.entity_type {
        EntityType::Entitlement => (Some(criteria.entity_id.clone()), None),
        EntityType::Account => (None, Some(criteria.entity_id.clone())),
    };

    let group_by = match (criteria.aggregation_type, criteria.entity_type) {
        (AggregationType::Sku, _) => vec!["UNIT"],
        (AggregationType::RequestGroup, EntityType::Entitlement) => {
            vec!["REQUEST_GROUP_ID", "SUBSCRIPTION_ID"]
        }
        (AggregationType::RequestGroup, EntityType::Account) => {
            vec!["REQUEST_GROUP_ID", "ACCOUNT_ID"]
        }
    };

    AggregateRequest {
        search_criteria: SearchCriteria {
            request_group_id: criteria.request_group_id.clone(),
            subscription_id,
            account_id,
            unit: criteria
                .has_sku_filter()
                .then(|| criteria.sku_id.clone()),
        },
        aggregation_criteria: AggregationCriteria {
            group_by,
            measures: vec!["TOTAL_PRICE", "QUANTITY"],
            aggregation_type: "SUM",
        },
    }
}

fn map_buckets(buckets: Vec<UsageBucket>, criteria: &FilterCriteria) -> Vec<UsageRecord> {
    buckets
        .into_iter()
        .map(|bucket| {
            let group_by = bucket.group_by.unwrap_or_default();
            let sums = bucket.sum_values.unwrap_or_default();
            UsageRecord {
                request_group_id: group_by
                    .request_group_id
                    .unwrap_or_else(|| criteria.request_group_id.clone()),
                entity_id: group_by
                    .subscription_id
                    .or(group_by.account_id)
                    .unwrap_or_else(|| criteria.entity_id.clone()),
                sku_id: group_by
                    .unit
                    .or_else(|| criteria.has_sku_filter().then(|| criteria.sku_id.clone())),
                usage_amount: sums.total_price.unwrap_or(0.0),
                quantity: sums.quantity.unwrap_or(0.0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(entity_type: EntityType, aggregation_type: AggregationType) -> FilterCriteria {
        FilterCriteria {
            request_group_id: "RG1".to_string(),
            entity_id: "E1".to_string(),
            entity_type,
            sku_id: String::new(),
            aggregation_type,
        }
    }

    #[test]
    fn entitlement_criteria_use_subscription_id() {
        let request =
            build_aggregate_request(&criteria(EntityType::Entitlement, AggregationType::RequestGroup));

        assert_eq!(request.search_criteria.subscription_id.as_deref(), Some("E1"));
        assert!(request.search_criteria.account_id.is_none());
        assert_eq!(
            request.aggregation_criteria.group_by,
            vec!["REQUEST_GROUP_ID", "SUBSCRIPTION_ID"]
        );
    }

    #[test]
    fn account_criteria_use_account_id() {
        let request =
            build_aggregate_request(&criteria(EntityType::Account, AggregationType::RequestGroup));

        assert!(request.search_criteria.subscription_id.is_none());
        assert_eq!(request.search_criteria.account_id.as_deref(), Some("E1"));
        assert_eq!(
            request.aggregation_criteria.group_by,
            vec!["REQUEST_GROUP_ID", "ACCOUNT_ID"]
        );
    }

    #[test]
    fn sku_aggregation_groups_by_unit() {
        let request =
            build_aggregate_request(&criteria(EntityType::Entitlement, AggregationType::Sku));
        assert_eq!(request.aggregation_criteria.group_by, vec!["UNIT"]);
        assert_eq!(request.aggregation_criteria.measures, vec!["TOTAL_PRICE", "QUANTITY"]);
        assert_eq!(request.aggregation_criteria.aggregation_type, "SUM");
    }

    #[test]
    fn blank_sku_filter_is_not_serialized() {
        let mut c = criteria(EntityType::Entitlement, AggregationType::RequestGroup);
        c.sku_id = "  ".to_string();
        let request = build_aggregate_request(&c);
        assert!(request.search_criteria.unit.is_none());

        c.sku_id = "ABC".to_string();
        let request = build_aggregate_request(&c);
        assert_eq!(request.search_criteria.unit.as_deref(), Some("ABC"));
    }

    #[test]
    fn bucket_fields_fall_back_to_input_criteria() {
        let mut c = criteria(EntityType::Entitlement, AggregationType::RequestGroup);
        c.sku_id = "ABC".to_string();

        let records = map_buckets(
            vec![UsageBucket {
                group_by: None,
                sum_values: None,
            }],
            &c,
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].request_group_id, "RG1");
        assert_eq!(records[0].entity_id, "E1");
        assert_eq!(records[0].sku_id.as_deref(), Some("ABC"));
        assert!((records[0].usage_amount).abs() < f64::EPSILON);
    }

    #[test]
    fn bucket_group_by_values_win_over_input() {
        let records = map_buckets(
            vec![UsageBucket {
                group_by: Some(GroupByFields {
                    request_group_id: Some("RG9".to_string()),
                    subscription_id: Some("E9".to_string()),
                    account_id: None,
                    unit: Some("125".to_string()),
                }),
                sum_values: Some(SumValues {
                    total_price: Some(42.5),
                    quantity: Some(3.0),
                }),
            }],
            &criteria(EntityType::Entitlement, AggregationType::Sku),
        );

        assert_eq!(records[0].request_group_id, "RG9");
        assert_eq!(records[0].entity_id, "E9");
        assert_eq!(records[0].sku_id.as_deref(), Some("125"));
        assert!((records[0].usage_amount - 42.5).abs() < f64::EPSILON);
        assert!((records[0].quantity - 3.0).abs() < f64::EPSILON);
    }
}
