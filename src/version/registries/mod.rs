//! Registry implementations for resolving module versions

pub mod terraform;

pub use terraform::TerraformRegistry;
