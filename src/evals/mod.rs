//! Quality evaluation harness.
//!
//! Generates content through the same services the API serves, then grades
//! the results with the OpenAI Evals API. Driven by the `eval` CLI
//! subcommands, not by the HTTP server.

pub mod datasets;
pub mod ids;
pub mod runner;
pub mod setup;
