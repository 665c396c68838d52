//! # UsageScope
//!
//! Terminal client for metered-usage billing aggregation.
//!
//! UsageScope queries a billing system's usage-analytics endpoint, groups the
//! returned usage buckets by a chosen key, and presents the result as a form
//! plus results table with an on-demand per-row timeline breakdown.
//!
//! ## Architecture
//!
//! - **Client**: HTTP aggregation client and the pluggable usage data provider
//! - **Models**: filter criteria, usage records, grouped rows, timeline snapshots
//! - **TUI**: terminal form, results table, and timeline panel
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive form
//! usagescope tui
//!
//! # One-shot query from the command line
//! usagescope query --request-group RG1 --entity E1
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tui;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::client::{AggregationClient, FixtureProvider, LiveProvider, UsageDataProvider};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
}
