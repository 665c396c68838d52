//! Service layer talking to the usage-analytics backend
//!
//! The TUI and the one-shot CLI query go through [`UsageDataProvider`] so the
//! live HTTP client and the offline fixture set are interchangeable.

mod aggregation;
mod provider;

pub use aggregation::AggregationClient;
pub use provider::{FixtureProvider, LiveProvider, UsageDataProvider};
