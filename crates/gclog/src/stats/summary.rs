//! Summary — fold typed events into per-trigger pause statistics.
//!
//! Workers may record into the same summary concurrently; every map is a
//! `DashMap` and the scalar totals are relaxed atomics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;

use crate::event::model::{EventKind, TypedEvent};
use crate::parser::lexicon::Trigger;
use crate::parser::memory::Anomaly;
use crate::pipeline::RunOutput;

/// Pause statistics for one trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PauseStat {
    pub count: u64,
    pub total: Duration,
    pub max: Duration,
}

impl PauseStat {
    fn add(&mut self, pause: Duration) {
        self.count += 1;
        self.total += pause;
        self.max = self.max.max(pause);
    }

    fn absorb(&mut self, other: &PauseStat) {
        self.count += other.count;
        self.total += other.total;
        self.max = self.max.max(other.max);
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    by_trigger: DashMap<Trigger, PauseStat>,
    by_kind: DashMap<EventKind, u64>,
    anomalies: DashMap<String, u64>,
    events: AtomicU64,
    unknown: AtomicU64,
    residual_lines: AtomicU64,
    truncated_files: AtomicU64,
    pause_nanos: AtomicU64,
    max_pause_nanos: AtomicU64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: &TypedEvent) {
        self.events.fetch_add(1, Ordering::Relaxed);
        *self.by_kind.entry(event.kind()).or_default() += 1;

        if event.is_unknown() {
            self.unknown.fetch_add(1, Ordering::Relaxed);
            return;
        }

        if let Some(pause) = event.pause() {
            let nanos = u64::try_from(pause.as_nanos()).unwrap_or(u64::MAX);
            self.pause_nanos.fetch_add(nanos, Ordering::Relaxed);
            self.max_pause_nanos.fetch_max(nanos, Ordering::Relaxed);

            let trigger = event.as_trigger().map_or(Trigger::Unknown, |t| t.trigger());
            self.by_trigger.entry(trigger).or_default().add(pause);
        }

        if let Some(collection) = event.as_collection() {
            for anomaly in &collection.anomalies {
                *self.anomalies.entry(anomaly_label(anomaly)).or_default() += 1;
            }
        }
    }

    /// Record everything one file produced.
    pub fn record_output(&self, output: &RunOutput) {
        for event in &output.events {
            self.record(event);
        }
        self.residual_lines
            .fetch_add(output.residual.len() as u64, Ordering::Relaxed);
        if output.ends_with_unknown {
            self.truncated_files.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn merge(&self, other: &RunSummary) {
        for entry in other.by_trigger.iter() {
            self.by_trigger.entry(*entry.key()).or_default().absorb(entry.value());
        }
        for entry in other.by_kind.iter() {
            *self.by_kind.entry(*entry.key()).or_default() += *entry.value();
        }
        for entry in other.anomalies.iter() {
            *self.anomalies.entry(entry.key().clone()).or_default() += *entry.value();
        }
        for (mine, theirs) in [
            (&self.events, &other.events),
            (&self.unknown, &other.unknown),
            (&self.residual_lines, &other.residual_lines),
            (&self.truncated_files, &other.truncated_files),
            (&self.pause_nanos, &other.pause_nanos),
        ] {
            mine.fetch_add(theirs.load(Ordering::Relaxed), Ordering::Relaxed);
        }
        self.max_pause_nanos
            .fetch_max(other.max_pause_nanos.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SummarySnapshot {
        let mut by_trigger: Vec<(Trigger, PauseStat)> =
            self.by_trigger.iter().map(|e| (*e.key(), *e.value())).collect();
        by_trigger.sort_by_key(|(trigger, _)| *trigger);

        let mut by_kind: Vec<(EventKind, u64)> =
            self.by_kind.iter().map(|e| (*e.key(), *e.value())).collect();
        by_kind.sort_by_key(|(kind, _)| *kind);

        let mut anomalies: Vec<(String, u64)> = self
            .anomalies
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        anomalies.sort();

        SummarySnapshot {
            events: self.events.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            residual_lines: self.residual_lines.load(Ordering::Relaxed),
            truncated_files: self.truncated_files.load(Ordering::Relaxed),
            total_pause: Duration::from_nanos(self.pause_nanos.load(Ordering::Relaxed)),
            max_pause: Duration::from_nanos(self.max_pause_nanos.load(Ordering::Relaxed)),
            by_trigger,
            by_kind,
            anomalies,
        }
    }
}

fn anomaly_label(anomaly: &Anomaly) -> String {
    match anomaly {
        Anomaly::OccupancyExceedsCapacity { region } => {
            format!("{}_occupancy_exceeds_capacity", region.as_str())
        }
        Anomaly::OldShrankDuringYoung => "old_shrank_during_young".to_string(),
        Anomaly::InconsistentRegions { region } => format!("{}_inconsistent", region.as_str()),
    }
}

/// Sorted, serializable view of a [`RunSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct SummarySnapshot {
    pub events: u64,
    pub unknown: u64,
    pub residual_lines: u64,
    /// Files whose last event was unrecognized
    pub truncated_files: u64,
    pub total_pause: Duration,
    pub max_pause: Duration,
    pub by_trigger: Vec<(Trigger, PauseStat)>,
    pub by_kind: Vec<(EventKind, u64)>,
    pub anomalies: Vec<(String, u64)>,
}

impl SummarySnapshot {
    pub fn trigger(&self, trigger: Trigger) -> Option<&PauseStat> {
        self.by_trigger.iter().find(|(t, _)| *t == trigger).map(|(_, s)| s)
    }

    pub fn kind_count(&self, kind: EventKind) -> u64 {
        self.by_kind
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, n)| *n)
    }
}
