//! Property Report: fix-and-flip screening for residential listings.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod provider;
pub mod strategy;
pub mod engine;
pub mod report;
