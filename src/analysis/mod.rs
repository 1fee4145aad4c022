//! Aggregation of fetched statement records.

pub mod aggregator;

pub use aggregator::*;
