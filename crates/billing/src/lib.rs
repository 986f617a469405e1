//! Subscription billing figures for the B-Net admin console.
//!
//! Provides the plan catalog (product identifier aliases → cadence, tier,
//! yen price) and the pure aggregator that turns subscription documents
//! into counts, monthly-equivalent revenue and the six-month trend.

pub mod aggregator;
pub mod catalog;

pub use aggregator::{AggregateSummary, AggregationInput, SubscriptionAggregator};
pub use catalog::{Cadence, PlanCatalog, PlanEntry, Tier};
