use thiserror::Error;
use serde::{Serialize, Deserialize};


/// Collector family a log line belongs to.
///
/// The first six are collector/logging families proper. `HeapAtGc` and
/// `GcTimeLimit` are cross-cutting preprocessing concerns that can appear in
/// any legacy-format log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Serial,
    Parallel,
    Cms,
    G1,
    Shenandoah,
    /// JDK 9+ unified logging (`-Xlog:gc*`)
    Unified,
    /// `-XX:+PrintHeapAtGC` blocks
    HeapAtGc,
    /// `-XX:+UseGCOverheadLimit` warnings split off Parallel full GCs
    GcTimeLimit,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Serial => "serial",
            Family::Parallel => "parallel",
            Family::Cms => "cms",
            Family::G1 => "g1",
            Family::Shenandoah => "shenandoah",
            Family::Unified => "unified",
            Family::HeapAtGc => "heap_at_gc",
            Family::GcTimeLimit => "gc_time_limit",
        }
    }
}

/// One line of the input, exactly as read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawLine {
    /// Zero-based position in the input
    pub index: usize,
    pub text: String,
}

impl RawLine {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self { index, text: text.into() }
    }
}

/// A logical GC log line produced by preprocessing.
///
/// `first_line..=last_line` is the contiguous span of raw lines this line was
/// assembled from. Lines that were interleaved with the record but emitted
/// separately (concurrent-phase fragments) are kept in `entangled` for
/// diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedLine {
    pub text: String,
    pub first_line: usize,
    pub last_line: usize,
    pub entangled: Vec<RawLine>,
}

impl NormalizedLine {
    pub fn new(text: impl Into<String>, first_line: usize, last_line: usize) -> Self {
        Self {
            text: text.into(),
            first_line,
            last_line,
            entangled: Vec::new(),
        }
    }

    pub fn single(text: impl Into<String>, line: usize) -> Self {
        Self::new(text, line, line)
    }

    pub fn span(&self) -> std::ops::RangeInclusive<usize> {
        self.first_line..=self.last_line
    }
}

/// What the driver did with a run of raw lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Produced (or completed) a normalized line
    Emitted,
    /// Folded into a record still being assembled
    Accumulated,
    /// Recognized noise with no analytic value
    Ignored,
    /// Malformed beyond recovery (e.g. conflicting stamps)
    Discarded,
}

/// One driver decision. The steps of a run partition the raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step {
    pub first_line: usize,
    pub consumed: usize,
    pub disposition: Disposition,
}

#[derive(Debug, Error)]
pub enum GcLogError {
    #[error("Invalid regex pattern for {name}: {source}")]
    InvalidPattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Trigger lexicon out of order: {0}")]
    LexiconOrder(String),

    #[error("Invalid JVM start date: {0}")]
    InvalidStartDate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Compile a regex, naming the grammar or matcher it belongs to on failure.
pub fn compile(name: &'static str, pattern: &str) -> Result<regex::Regex, GcLogError> {
    regex::Regex::new(pattern).map_err(|source| GcLogError::InvalidPattern { name, source })
}
