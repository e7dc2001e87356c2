//! Bounce Terraform module declarations between a local checkout and a registry.
//!
//! # Modules
//!
//! - [`parser`]: Brace-aware scanning of `module` blocks
//! - [`source`]: Local/published source classification and rendering
//! - [`render`]: Canonical re-rendering of a parsed block
//! - [`version`]: Version arithmetic, registry client, cache and credentials
//! - [`bounce`]: File transformer, batch driver and file discovery
//! - [`repository`]: Repository naming convention (`terraform-<provider>-<name>`)
//! - [`config`]: Registry and runtime configuration
//! - [`error`]: Top-level error type
//! - [`logging`]: Tracing subscriber setup

pub mod bounce;
pub mod config;
pub mod error;
pub mod logging;
pub mod parser;
pub mod render;
pub mod repository;
pub mod source;
pub mod version;
