//! # inkcard
//!
//! Async shell around `inkcard-core`: configuration, the distribution
//! facade, the HTTP API and the CLI.

pub mod api;
pub mod cli;
pub mod config;
pub mod distribution;
