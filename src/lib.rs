//! scenegrab - release feed watcher
//!
//! This library crate exposes the run pipeline for integration testing.

pub mod config;
pub mod feed;
pub mod fetch;
pub mod filter;
pub mod pipeline;
pub mod provider;
pub mod render;
