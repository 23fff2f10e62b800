//! Stats module — run aggregation over typed events.

pub mod summary;

pub use summary::{PauseStat, RunSummary, SummarySnapshot};
