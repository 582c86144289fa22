//! `credit-scoring` library crate.
//!
//! The binary (`credit`) is a thin wrapper around this library so that:
//!
//! - scoring, fraud rules and batch processing are testable without spawning processes
//! - the CLI and the TUI share one pipeline
//! - storage and reporting stay swappable behind small module boundaries

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fraud;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod scoring;
pub mod store;
pub mod tui;
