//! Shared fixtures and instrumentation helpers for graphscan test suites.

pub mod ci;
pub mod datasets;
pub mod recording;
