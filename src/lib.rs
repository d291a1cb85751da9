//! chart-harvest - Fund chart time-series collector
//!
//! This library drives timed page interactions, routes the chart responses
//! they trigger into per-period data slots, and ingests completed page data
//! into a deduplicated daily history.

pub mod cli;
pub mod collector;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod repository;
pub mod routing;
pub mod schedule;
