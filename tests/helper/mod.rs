#![allow(dead_code)]

pub mod registry;

pub use registry::{SharedRegistry, StubRegistry, create_test_transformer, write_file};
