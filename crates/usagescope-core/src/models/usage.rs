//! Usage records and the grouping transform

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::AggregationType;

/// One aggregation bucket returned by the backend, reshaped for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// Billing batch identifier
    pub request_group_id: String,
    /// Entitlement or account id
    pub entity_id: String,
    /// Billable unit, when the bucket carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku_id: Option<String>,
    /// Summed total price for the bucket
    pub usage_amount: f64,
    /// Summed quantity for the bucket
    #[serde(default)]
    pub quantity: f64,
}

/// A display row produced by grouping usage records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedRow {
    /// Stable row identity: the group key string. Selection state compares
    /// this key, never row positions, since rows are recomputed per frame.
    pub key: String,
    /// Billing batch identifier shared by all items in the group
    pub request_group_id: String,
    /// Entity id shared by all items in the group
    pub entity_id: String,
    /// SKU of the first record in the group, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku_id: Option<String>,
    /// The records that make up this group
    pub items: Vec<UsageRecord>,
    /// Sum of `usage_amount` over `items`
    pub aggregated_total: f64,
}

/// Group key for a record under the given aggregation type.
fn group_key(record: &UsageRecord, aggregation_type: AggregationType) -> String {
    match aggregation_type {
        AggregationType::Sku => format!(
            "{}_{}_{}",
            record.request_group_id,
            record.entity_id,
            record.sku_id.as_deref().unwrap_or_default()
        ),
        AggregationType::RequestGroup => {
            format!("{}_{}", record.request_group_id, record.entity_id)
        }
    }
}

/// Partition usage records into grouped rows and sum each group's usage
/// amount. Every input record lands in exactly one group; group order follows
/// first appearance in the input.
pub fn group_usage(records: &[UsageRecord], aggregation_type: AggregationType) -> Vec<GroupedRow> {
    let mut rows: Vec<GroupedRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = group_key(record, aggregation_type);
        let idx = *index.entry(key.clone()).or_insert_with(|| {
            rows.push(GroupedRow {
                key,
                request_group_id: record.request_group_id.clone(),
                entity_id: record.entity_id.clone(),
                sku_id: record.sku_id.clone(),
                items: Vec::new(),
                aggregated_total: 0.0,
            });
            rows.len() - 1
        });

        let row = &mut rows[idx];
        row.items.push(record.clone());
        row.aggregated_total += record.usage_amount;
    }

    rows
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn record(rg: &str, entity: &str, sku: Option<&str>, amount: f64) -> UsageRecord {
        UsageRecord {
            request_group_id: rg.to_string(),
            entity_id: entity.to_string(),
            sku_id: sku.map(ToString::to_string),
            usage_amount: amount,
            quantity: 0.0,
        }
    }

    #[test]
    fn request_group_aggregation_sums_matching_records() {
        let records = vec![
            record("RG1", "E1", None, 100.0),
            record("RG1", "E1", None, 50.0),
        ];

        let rows = group_usage(&records, AggregationType::RequestGroup);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "RG1_E1");
        assert!((rows[0].aggregated_total - 150.0).abs() < f64::EPSILON);
        assert_eq!(rows[0].items.len(), 2);
    }

    #[test]
    fn sku_aggregation_splits_by_unit() {
        let records = vec![
            record("RG1", "E1", Some("123"), 10.0),
            record("RG1", "E1", Some("124"), 20.0),
            record("RG1", "E1", Some("123"), 5.0),
        ];

        let rows = group_usage(&records, AggregationType::Sku);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "RG1_E1_123");
        assert!((rows[0].aggregated_total - 15.0).abs() < f64::EPSILON);
        assert_eq!(rows[1].key, "RG1_E1_124");
        assert!((rows[1].aggregated_total - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn request_group_aggregation_ignores_sku_differences() {
        let records = vec![
            record("RG1", "E1", Some("123"), 10.0),
            record("RG1", "E1", Some("124"), 20.0),
        ];

        let rows = group_usage(&records, AggregationType::RequestGroup);

        assert_eq!(rows.len(), 1);
        assert!((rows[0].aggregated_total - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn group_order_follows_first_appearance() {
        let records = vec![
            record("RG1", "E2", None, 1.0),
            record("RG1", "E1", None, 2.0),
            record("RG1", "E2", None, 3.0),
        ];

        let rows = group_usage(&records, AggregationType::RequestGroup);

        assert_eq!(rows[0].entity_id, "E2");
        assert_eq!(rows[1].entity_id, "E1");
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(group_usage(&[], AggregationType::RequestGroup).is_empty());
    }

    fn arb_record() -> impl Strategy<Value = UsageRecord> {
        (
            prop::sample::select(vec!["RG1", "RG2"]),
            prop::sample::select(vec!["E1", "E2", "E3"]),
            prop::option::of(prop::sample::select(vec!["123", "124"])),
            0.0f64..1000.0,
        )
            .prop_map(|(rg, entity, sku, amount)| record(rg, entity, sku, amount))
    }

    proptest! {
        #[test]
        fn grouping_partitions_input_exactly(
            records in prop::collection::vec(arb_record(), 0..40),
            sku_level in any::<bool>(),
        ) {
            let aggregation = if sku_level {
                AggregationType::Sku
            } else {
                AggregationType::RequestGroup
            };
            let rows = group_usage(&records, aggregation);

            let grouped_count: usize = rows.iter().map(|r| r.items.len()).sum();
            prop_assert_eq!(grouped_count, records.len());

            for row in &rows {
                let expected: f64 = row.items.iter().map(|i| i.usage_amount).sum();
                prop_assert!((row.aggregated_total - expected).abs() < 1e-9);
                for item in &row.items {
                    prop_assert_eq!(&item.request_group_id, &row.request_group_id);
                    prop_assert_eq!(&item.entity_id, &row.entity_id);
                }
            }
        }
    }
}
