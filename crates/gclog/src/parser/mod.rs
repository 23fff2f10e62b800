/// GC log primitives shared by preprocessing and classification
///
/// # Architecture
///
/// - `model.rs`: raw/normalized lines, driver steps, collector families, errors
/// - `units.rs`: exact decimal parsing for durations
/// - `memory.rs`: unit-aware sizes and region snapshots
/// - `lexicon.rs`: trigger/cause phrase resolution
/// - `decorator.rs`: datestamp, timestamp and unified-logging decorators
/// - `metrics.rs`: parsing counters

pub mod model;
pub mod units;
pub mod memory;
pub mod lexicon;
pub mod decorator;
pub mod metrics;

// Re-export commonly used types
pub use model::{Family, GcLogError, NormalizedLine, RawLine};
pub use lexicon::Trigger;
pub use memory::{Memory, Region, RegionSnapshot};

/// Regex fragment for a JDK 8 style `-XX:+PrintGCDateStamps` decorator.
pub const DATESTAMP: &str = r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}[.,]\d{3}(?:[+-]\d{4}|Z)";

/// Regex fragment for a relative `-XX:+PrintGCTimeStamps` decorator (seconds since JVM start).
pub const TIMESTAMP: &str = r"\d{1,10}[.,]\d{3}";
