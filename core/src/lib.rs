//! Casino promotion evaluation: per-user aggregation of deposits and
//! wagering, an outer join of the two, and one deposit/wager/bonus rule.

pub mod aggregator;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod export;
pub mod ingest;
pub mod merger;
pub mod store;
pub mod table;
pub mod types;
