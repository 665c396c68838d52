//! Terminal user interface for UsageScope
//!
//! A single-screen query form with a grouped results table and an on-demand
//! timeline panel per row.

mod app;
mod event;
mod ui;

pub use app::App;
pub use event::{Event, EventHandler};
