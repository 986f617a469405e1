//! Console reporting: user/team growth, prefecture breakdowns and the
//! dashboard overview combining entity counts with subscription figures.

pub mod dashboard;
pub mod growth;

pub use dashboard::DashboardOverview;
pub use growth::{GrowthReport, GrowthSummary};
