//! Photo frame library - a gallery of normalized images rotated across display slots.
//!
//! This library exposes the core functionality of the `pf` CLI for use in tests
//! and other front ends.
//!
//! # Modules
//!
//! - `record`: The stored image record and its data-URI payload
//! - `store`: Durable storage (`SQLite`) behind the [`store::ImageStore`] trait
//! - `normalize`: Decoding, resizing and WebP encoding of incoming images
//! - `gallery`: Ordered in-memory view over the store
//! - `ingest`: Adding files or raw bytes to the gallery
//! - `rotation`: Timer-driven slot rotation
//! - `display`: Rendering seam used by the rotation
//! - `sync`: JSON export and import
//! - `config`: Configuration file handling
//! - `error`: Error types with user-recoverable hints
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod gallery;
pub mod ingest;
pub mod logging;
pub mod normalize;
pub mod record;
pub mod rotation;
pub mod store;
pub mod sync;
