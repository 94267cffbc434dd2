//! Library entrypoint for the price alert worker.
//!
//! `main.rs` only wires settings into these pieces; integration tests under
//! `tests/` drive the evaluator and monitor with in-memory collaborators.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod templates;

pub mod controllers;
pub mod routes;

pub mod worker;
