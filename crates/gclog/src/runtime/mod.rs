//! Runtime module — process lifecycle: logging boot and the batch runner.

pub mod boot;
pub mod batch;
