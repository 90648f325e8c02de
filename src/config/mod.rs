// src/config/mod.rs
pub mod dashboards;

pub use dashboards::{load_dashboards_default, load_dashboards_from, DashboardConfig};
