//! Data models for UsageScope

mod criteria;
mod timeline;
mod usage;

pub use criteria::{AggregationType, EntityType, FilterCriteria, FormField, ValidationError};
pub use timeline::{StageMetric, TimelineSnapshot};
pub use usage::{group_usage, GroupedRow, UsageRecord};
