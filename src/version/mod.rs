//! Version layer for published module lookups
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Transformer │────▶│   Cached    │────▶│  Terraform  │
//! │ (per block) │     │  Registry   │     │  Registry   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │VersionCache │     │ Credentials │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`semver`]: Version parsing, ordering and constraint formatting
//! - [`registry`]: Registry trait and catalog coordinates
//! - [`registries`]: HTTP implementation of the Terraform registry protocol
//! - [`cache`]: Process-wide memoization of latest versions
//! - [`credentials`]: Token lookup for private registry hosts
//! - [`error`]: Error types for version and registry operations

pub mod cache;
pub mod credentials;
pub mod error;
pub mod registries;
pub mod registry;
pub mod semver;
