/// Event classification
///
/// # Architecture
///
/// - `model.rs`: `TypedEvent`, `EventKind`, payloads and capability traits
/// - `grammars/`: one grammar per event kind, grouped by collector
/// - `catalogue.rs`: ordered grammar catalogue and the per-file `Classifier`

pub mod model;
pub mod grammars;
pub mod catalogue;

// Re-export commonly used types
pub use catalogue::{Catalogue, Classifier};
pub use model::{
    Collection, Concurrent, EventKind, HasDuration, HasRegions, HasTimes, HasTimestamp,
    HasTrigger, Stamp, TypedEvent,
};
