//! This crate provides a geo analytics server. It holds small tabular datasets in memory and
//! answers the questions a regional dashboard asks of them: which regions lead and lag on a
//! metric, how each region trends over time, and a short executive summary in plain sentences.
//!
//! Datasets are ingested from CSV uploads or posted JSON records, and a fixed sample dataset is
//! always available under the `sample` identifier. Values are loosely typed and are coerced to
//! numbers or dates only when an analysis needs them. Anything that fails to coerce is treated as
//! missing and left out, rather than failing the request.
//!
//! The server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, and built on top of various popular
//!   components, including the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of JSON request and response data.
//! * [csv] parses uploaded files and [chrono] handles calendar bucketing.

pub mod app;
pub mod app_state;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod format;
pub mod metrics;
pub mod models;
pub mod operation;
pub mod operations;
pub mod server;
pub mod store;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod types;
pub mod validated;
