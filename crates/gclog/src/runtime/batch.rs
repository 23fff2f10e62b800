//! Batch — run the pipeline over many files with bounded parallelism.
//!
//! Files are read with `tokio::fs`; the CPU-bound pipeline runs on the
//! blocking pool. A semaphore sized by `workers` bounds how many files are in
//! flight, and every file's events are folded into one shared summary.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::conf::GcLogConfig;
use crate::parser::metrics::{MetricErrorType, MetricsSnapshot};
use crate::parser::model::GcLogError;
use crate::pipeline::{Mode, Pipeline, RunOutput};
use crate::preprocess::Flags;
use crate::stats::{RunSummary, SummarySnapshot};

/// Outcome for one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub raw_lines: usize,
    pub normalized_lines: usize,
    pub events: usize,
    pub unknown: usize,
    pub residual_lines: usize,
    pub ends_with_unknown: bool,
    pub flags: Flags,
    /// Set when the file could not be read or its worker failed
    pub error: Option<String>,
}

impl FileReport {
    fn failed(path: &Path, error: &GcLogError) -> Self {
        Self {
            path: path.display().to_string(),
            raw_lines: 0,
            normalized_lines: 0,
            events: 0,
            unknown: 0,
            residual_lines: 0,
            ends_with_unknown: false,
            flags: Flags::default(),
            error: Some(error.to_string()),
        }
    }

    fn from_output(path: &Path, raw_lines: usize, output: &RunOutput) -> Self {
        Self {
            path: path.display().to_string(),
            raw_lines,
            normalized_lines: output.normalized.len(),
            events: output.events.len(),
            unknown: output.events.iter().filter(|e| e.is_unknown()).count(),
            residual_lines: output.residual.len(),
            ends_with_unknown: output.ends_with_unknown,
            flags: output.flags,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub mode: Mode,
    pub files: Vec<FileReport>,
    /// Absent in preprocess mode
    pub summary: Option<SummarySnapshot>,
    pub metrics: MetricsSnapshot,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }
}

/// Process every file in `paths`. Per-file failures are reported, not
/// returned; only pipeline construction can fail the batch.
pub async fn run_batch(paths: Vec<PathBuf>, config: &GcLogConfig) -> Result<BatchReport, GcLogError> {
    let pipeline = Arc::new(Pipeline::new(&config.pipeline())?);
    let summary = Arc::new(RunSummary::new());
    let permits = Arc::new(Semaphore::new(config.workers.max(1)));

    info!(files = paths.len(), workers = config.workers, "batch: starting");

    let mut tasks = JoinSet::new();
    for (index, path) in paths.iter().cloned().enumerate() {
        let pipeline = pipeline.clone();
        let summary = summary.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let report = match permits.acquire_owned().await {
                Ok(_permit) => process_file(&path, pipeline, &summary).await,
                Err(_) => FileReport::failed(&path, &GcLogError::Worker("semaphore closed".to_string())),
            };
            (index, report)
        });
    }

    let mut reports: Vec<Option<FileReport>> = vec![None; paths.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, report)) => reports[index] = Some(report),
            Err(e) => {
                pipeline.metrics().record_error(MetricErrorType::Worker);
                warn!("batch: task failed: {}", e);
            }
        }
    }

    let files: Vec<FileReport> = reports
        .into_iter()
        .zip(&paths)
        .map(|(report, path)| {
            report.unwrap_or_else(|| FileReport::failed(path, &GcLogError::Worker("task aborted".to_string())))
        })
        .collect();

    let report = BatchReport {
        mode: pipeline.mode(),
        summary: (pipeline.mode() == Mode::Classify).then(|| summary.snapshot()),
        metrics: pipeline.metrics().snapshot(),
        files,
    };
    info!(
        files = report.files.len(),
        failures = report.failures(),
        recognition_rate = report.metrics.recognition_rate,
        "batch: done"
    );
    Ok(report)
}

async fn process_file(path: &Path, pipeline: Arc<Pipeline>, summary: &RunSummary) -> FileReport {
    let started = Instant::now();

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(source) => {
            pipeline.metrics().record_error(MetricErrorType::Io);
            let error = GcLogError::Io {
                path: path.display().to_string(),
                source,
            };
            warn!("{}", error);
            return FileReport::failed(path, &error);
        }
    };
    let text = String::from_utf8_lossy(&bytes).into_owned();

    let worker = pipeline.clone();
    let result = tokio::task::spawn_blocking(move || {
        let lines: Vec<&str> = text.lines().collect();
        worker.run(&lines).map(|output| (lines.len(), output))
    })
    .await;

    let (raw_lines, output) = match result {
        Ok(Ok(done)) => done,
        Ok(Err(error)) => {
            pipeline.metrics().record_error(MetricErrorType::Worker);
            warn!(path = %path.display(), "{}", error);
            return FileReport::failed(path, &error);
        }
        Err(join) => {
            pipeline.metrics().record_error(MetricErrorType::Worker);
            let error = GcLogError::Worker(join.to_string());
            warn!(path = %path.display(), "{}", error);
            return FileReport::failed(path, &error);
        }
    };

    summary.record_output(&output);
    let elapsed = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
    pipeline.metrics().record_file(elapsed);

    if output.ends_with_unknown {
        warn!(path = %path.display(), "log ends with an unrecognized line");
    }
    debug!(
        path = %path.display(),
        raw_lines,
        events = output.events.len(),
        residual = output.residual.len(),
        "batch: file done"
    );
    FileReport::from_output(path, raw_lines, &output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gclog-batch-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let report = run_batch(vec![PathBuf::from("/nonexistent/gc.log")], &GcLogConfig::default())
            .await
            .unwrap();
        assert_eq!(report.failures(), 1);
        assert_eq!(report.metrics.io_errors, 1);
        assert!(report.files[0].error.as_deref().unwrap().contains("/nonexistent/gc.log"));
    }

    #[tokio::test]
    async fn test_reports_keep_input_order() {
        let a = write_temp("a.log", "1.000: [GC concurrent-mark-start]\n");
        let b = write_temp("b.log", "garbage\n");
        let config = GcLogConfig {
            workers: 1,
            ..GcLogConfig::default()
        };
        let report = run_batch(vec![a.clone(), b.clone()], &config).await.unwrap();
        std::fs::remove_file(&a).ok();
        std::fs::remove_file(&b).ok();

        assert_eq!(report.files[0].path, a.display().to_string());
        assert!(!report.files[0].ends_with_unknown);
        assert!(report.files[1].ends_with_unknown);
        assert_eq!(report.summary.as_ref().unwrap().unknown, 1);
        assert_eq!(report.metrics.files, 2);
    }

    #[tokio::test]
    async fn test_preprocess_mode_has_no_summary() {
        let a = write_temp("pre.log", "1.000: 1.000: [GC concurrent-mark-start]\n");
        let config = GcLogConfig {
            mode: Mode::Preprocess,
            ..GcLogConfig::default()
        };
        let report = run_batch(vec![a.clone()], &config).await.unwrap();
        std::fs::remove_file(&a).ok();

        assert!(report.summary.is_none());
        assert_eq!(report.files[0].normalized_lines, 1);
        assert_eq!(report.files[0].events, 0);
    }
}
