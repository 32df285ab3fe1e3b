//! Common test utilities for the photo frame crate.
//!
//! - `cli`: CLI runner with an isolated home and fluent assertions
//! - `fixtures`: Test images and records
#![allow(dead_code)]

pub mod cli;

use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
