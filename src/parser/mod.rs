//! Parser layer
//! - scanner.rs: Bracket counting aware of strings, comments and heredocs
//! - block.rs: `module` block state machine
//! - types.rs: Parsed block record

pub mod block;
pub mod scanner;
pub mod types;

pub use block::ModuleBlockParser;
pub use scanner::{BraceScanner, LineDelta};
pub use types::ModuleBlock;
