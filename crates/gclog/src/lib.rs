// Domain-driven module structure for the gclog engine.

// Core infrastructure
pub mod parser;
pub mod preprocess;
pub mod event;

// Domain modules
pub mod pipeline;
pub mod stats;
pub mod conf;
pub mod runtime;

pub use event::model::{EventKind, TypedEvent};
pub use parser::model::{GcLogError, NormalizedLine, RawLine};
pub use pipeline::{Mode, Pipeline, PipelineConfig, RunOutput};
