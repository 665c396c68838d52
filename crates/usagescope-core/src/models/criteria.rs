//! Filter criteria entered in the query form

use serde::{Deserialize, Serialize};

/// Which identifier the entity id field refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// A customer's subscribed offer instance
    #[default]
    Entitlement,
    /// The billed customer account
    Account,
}

impl EntityType {
    /// Display label for the entity id column/field
    pub fn id_label(self) -> &'static str {
        match self {
            Self::Entitlement => "Entitlement Id",
            Self::Account => "Account Id",
        }
    }

    /// The other variant, for toggling in the form
    pub fn toggled(self) -> Self {
        match self {
            Self::Entitlement => Self::Account,
            Self::Account => Self::Entitlement,
        }
    }
}

/// Grouping strategy for the aggregation query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationType {
    /// Group by request group plus entitlement/account id
    #[default]
    RequestGroup,
    /// Group by billable unit (SKU)
    Sku,
}

impl AggregationType {
    /// Dropdown label; the request-group option names the active entity type
    pub fn label(self, entity_type: EntityType) -> &'static str {
        match (self, entity_type) {
            (Self::RequestGroup, EntityType::Entitlement) => "Request Group & Entitlement Id",
            (Self::RequestGroup, EntityType::Account) => "Request Group & Account Id",
            (Self::Sku, _) => "SKU",
        }
    }

    /// The other variant, for toggling in the form
    pub fn toggled(self) -> Self {
        match self {
            Self::RequestGroup => Self::Sku,
            Self::Sku => Self::RequestGroup,
        }
    }
}

/// Form fields, used for focus tracking and inline validation messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    /// Request group id text input
    RequestGroupId,
    /// Entitlement/account id text input
    EntityId,
    /// Entity type choice
    EntityType,
    /// Optional SKU text input
    Sku,
    /// Aggregation type choice
    Aggregation,
    /// Submit action
    Submit,
}

/// A failed local validation, tied to the offending field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field the message belongs to
    pub field: FormField,
    /// User-visible message
    pub message: String,
}

/// Everything the operator has entered in the query form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Billing batch identifier (required)
    pub request_group_id: String,
    /// Entitlement or account id (required)
    pub entity_id: String,
    /// Which identifier `entity_id` is
    pub entity_type: EntityType,
    /// Optional SKU/unit filter
    pub sku_id: String,
    /// Grouping strategy
    pub aggregation_type: AggregationType,
}

impl FilterCriteria {
    /// Validate required fields. Checks run in form order and stop at the
    /// first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_group_id.trim().is_empty() {
            return Err(ValidationError {
                field: FormField::RequestGroupId,
                message: "Request Group Id is required".to_string(),
            });
        }
        if self.entity_id.trim().is_empty() {
            return Err(ValidationError {
                field: FormField::EntityId,
                message: format!("{} is required", self.entity_type.id_label()),
            });
        }
        Ok(())
    }

    /// Whether a SKU filter was supplied
    pub fn has_sku_filter(&self) -> bool {
        !self.sku_id.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn criteria(rg: &str, entity: &str, entity_type: EntityType) -> FilterCriteria {
        FilterCriteria {
            request_group_id: rg.to_string(),
            entity_id: entity.to_string(),
            entity_type,
            ..FilterCriteria::default()
        }
    }

    #[rstest]
    #[case("", EntityType::Entitlement)]
    #[case("   ", EntityType::Account)]
    fn blank_request_group_fails_first(#[case] rg: &str, #[case] entity_type: EntityType) {
        let err = criteria(rg, "", entity_type).validate().unwrap_err();
        assert_eq!(err.field, FormField::RequestGroupId);
        assert_eq!(err.message, "Request Group Id is required");
    }

    #[rstest]
    #[case(EntityType::Entitlement, "Entitlement Id is required")]
    #[case(EntityType::Account, "Account Id is required")]
    fn blank_entity_id_names_the_entity_type(
        #[case] entity_type: EntityType,
        #[case] expected: &str,
    ) {
        let err = criteria("RG1", "  ", entity_type).validate().unwrap_err();
        assert_eq!(err.field, FormField::EntityId);
        assert_eq!(err.message, expected);
    }

    #[test]
    fn complete_criteria_validate() {
        assert!(criteria("RG1", "E1", EntityType::Entitlement)
            .validate()
            .is_ok());
    }

    #[rstest]
    #[case(EntityType::Entitlement, "Request Group & Entitlement Id")]
    #[case(EntityType::Account, "Request Group & Account Id")]
    fn request_group_label_follows_entity_type(
        #[case] entity_type: EntityType,
        #[case] expected: &str,
    ) {
        assert_eq!(AggregationType::RequestGroup.label(entity_type), expected);
        assert_eq!(AggregationType::Sku.label(entity_type), "SKU");
    }

    #[test]
    fn sku_filter_ignores_whitespace() {
        let mut c = criteria("RG1", "E1", EntityType::Entitlement);
        assert!(!c.has_sku_filter());
        c.sku_id = "  ".to_string();
        assert!(!c.has_sku_filter());
        c.sku_id = "ABC".to_string();
        assert!(c.has_sku_filter());
    }
}
