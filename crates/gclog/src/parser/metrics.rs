use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

use super::model::Disposition;

/// Error categories for metrics recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricErrorType {
    /// Input file could not be read
    Io,
    /// Blocking worker task failed or was cancelled
    Worker,
}

/// A wrapper that forces the wrapped data onto its own cache line(s).
///
/// Batch workers update these counters concurrently; keeping each group on
/// its own 64-byte line stops cores from invalidating each other's cache.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Driver outcomes, counted in raw lines
#[derive(Debug, Default)]
pub struct LineMetrics {
    pub raw: AtomicU64,
    pub emitted: AtomicU64,
    pub accumulated: AtomicU64,
    pub ignored: AtomicU64,
    pub discarded: AtomicU64,
}

/// Classification outcomes, counted in normalized lines
#[derive(Debug, Default)]
pub struct ClassifyMetrics {
    pub classified: AtomicU64,
    pub unknown: AtomicU64,
}

/// Per-file totals
#[derive(Debug, Default)]
pub struct TotalMetrics {
    pub files: AtomicU64,
    pub time_nanos: AtomicU64,
}

#[derive(Debug, Default)]
pub struct ErrorMetrics {
    pub io: AtomicU64,
    pub worker: AtomicU64,
}

/// Counters for preprocessing and classification.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` reads are not
/// transactional across groups.
#[derive(Debug, Default)]
pub struct ParsingMetrics {
    pub lines: CacheAligned<LineMetrics>,
    pub classify: CacheAligned<ClassifyMetrics>,
    pub totals: CacheAligned<TotalMetrics>,
    pub errors: CacheAligned<ErrorMetrics>,
}

impl ParsingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one driver step covering `consumed` raw lines.
    #[inline]
    pub fn record_step(&self, disposition: Disposition, consumed: usize) {
        let n = consumed as u64;
        self.lines.0.raw.fetch_add(n, Ordering::Relaxed);
        let counter = match disposition {
            Disposition::Emitted => &self.lines.0.emitted,
            Disposition::Accumulated => &self.lines.0.accumulated,
            Disposition::Ignored => &self.lines.0.ignored,
            Disposition::Discarded => &self.lines.0.discarded,
        };
        counter.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_classification(&self, unknown: bool) {
        self.classify.0.classified.fetch_add(1, Ordering::Relaxed);
        if unknown {
            self.classify.0.unknown.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_file(&self, time_nanos: u64) {
        self.totals.0.files.fetch_add(1, Ordering::Relaxed);
        self.totals.0.time_nanos.fetch_add(time_nanos, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self, error_type: MetricErrorType) {
        match error_type {
            MetricErrorType::Io => self.errors.0.io.fetch_add(1, Ordering::Relaxed),
            MetricErrorType::Worker => self.errors.0.worker.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let classified = self.classify.0.classified.load(Ordering::Relaxed);
        let unknown = self.classify.0.unknown.load(Ordering::Relaxed);
        let files = self.totals.0.files.load(Ordering::Relaxed);
        let time_nanos = self.totals.0.time_nanos.load(Ordering::Relaxed);

        MetricsSnapshot {
            raw_lines: self.lines.0.raw.load(Ordering::Relaxed),
            emitted_lines: self.lines.0.emitted.load(Ordering::Relaxed),
            accumulated_lines: self.lines.0.accumulated.load(Ordering::Relaxed),
            ignored_lines: self.lines.0.ignored.load(Ordering::Relaxed),
            discarded_lines: self.lines.0.discarded.load(Ordering::Relaxed),

            classified,
            unknown,
            recognition_rate: if classified > 0 {
                (classified - unknown) as f64 / classified as f64
            } else {
                1.0
            },

            files,
            avg_file_time_ms: if files > 0 {
                (time_nanos as f64 / files as f64) / 1_000_000.0
            } else {
                0.0
            },

            io_errors: self.errors.0.io.load(Ordering::Relaxed),
            worker_errors: self.errors.0.worker.load(Ordering::Relaxed),
        }
    }
}

/// A read-only snapshot of parsing metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    // Lines
    pub raw_lines: u64,
    pub emitted_lines: u64,
    pub accumulated_lines: u64,
    pub ignored_lines: u64,
    pub discarded_lines: u64,

    // Classification
    pub classified: u64,
    pub unknown: u64,
    pub recognition_rate: f64,

    // Performance
    pub files: u64,
    pub avg_file_time_ms: f64,

    // Errors
    pub io_errors: u64,
    pub worker_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_empty() {
        let snap = ParsingMetrics::new().snapshot();
        assert_eq!(snap.raw_lines, 0);
        assert_eq!(snap.classified, 0);
        assert_eq!(snap.recognition_rate, 1.0);
        assert_eq!(snap.avg_file_time_ms, 0.0);
    }

    #[test]
    fn test_record_steps() {
        let metrics = ParsingMetrics::new();
        metrics.record_step(Disposition::Emitted, 1);
        metrics.record_step(Disposition::Accumulated, 3);
        metrics.record_step(Disposition::Ignored, 2);
        metrics.record_step(Disposition::Discarded, 1);

        let snap = metrics.snapshot();
        assert_eq!(snap.raw_lines, 7);
        assert_eq!(snap.accumulated_lines, 3);
        assert_eq!(snap.ignored_lines, 2);
        assert_eq!(snap.discarded_lines, 1);
    }

    #[test]
    fn test_recognition_rate() {
        let metrics = ParsingMetrics::new();
        for unknown in [false, false, false, true] {
            metrics.record_classification(unknown);
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.unknown, 1);
        assert!((snap.recognition_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(ParsingMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        m.record_step(Disposition::Emitted, 1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(metrics.snapshot().emitted_lines, 4000);
    }

    #[test]
    fn test_errors() {
        let metrics = ParsingMetrics::new();
        metrics.record_error(MetricErrorType::Io);
        metrics.record_error(MetricErrorType::Worker);
        metrics.record_file(2_000_000);
        let snap = metrics.snapshot();
        assert_eq!((snap.io_errors, snap.worker_errors), (1, 1));
        assert_eq!(snap.avg_file_time_ms, 2.0);
    }
}
