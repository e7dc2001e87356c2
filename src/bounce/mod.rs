//! Bounce layer
//! - transformer.rs: Per-file block selection, rendering and write-back
//! - batch.rs: Concurrent driver and summary over many files
//! - discovery.rs: Directory walk for declaration files

pub mod batch;
pub mod discovery;
pub mod transformer;

pub use batch::{BatchOptions, BatchSummary, run_batch};
pub use discovery::find_module_files;
pub use transformer::{
    BounceMode, FileReport, Transformation, Transformer, UnresolvedBlock, UnresolvedReason,
};
