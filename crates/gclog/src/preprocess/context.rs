//! Context — rolling state the driver threads through one file.

use std::collections::VecDeque;

use serde::Serialize;

use crate::event::model::EventKind;
use crate::parser::model::{Family, NormalizedLine};

/// File-level observations surfaced with the run output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Flags {
    /// At least one line carried a datestamp decorator
    pub datestamps_seen: bool,
    /// Some line carried the same decorator more than once
    pub repeated_datestamps: bool,
    /// `icms_dc=` seen: CMS in incremental mode
    pub incremental_mode: bool,
    pub unified_logging: bool,
}

/// Where we are inside a `-XX:+PrintHeapAtGC` dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeapBlock {
    #[default]
    None,
    /// Between `{Heap before` and the collection it precedes
    Before,
    /// Between `Heap after` and the closing `}`
    After,
    /// The end-of-run `Heap` summary
    Footer,
}

/// A stop-the-world record being assembled from several physical lines.
#[derive(Debug, Clone)]
pub struct Record {
    pub family: Family,
    pub text: String,
    pub first_line: usize,
    pub last_line: usize,
    /// Raw lines consumed while the record was open but emitted on their own
    pub entangled: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct Context {
    prior_event: Option<EventKind>,
    record: Option<Record>,
    deferred: VecDeque<NormalizedLine>,
    pub heap_block: HeapBlock,
    /// Index of the raw line being processed
    cursor: usize,
    pub flags: Flags,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prior_event(&self) -> Option<EventKind> {
        self.prior_event
    }

    pub fn prior_family(&self) -> Option<Family> {
        self.prior_event.and_then(|kind| kind.family())
    }

    pub(crate) fn set_prior_event(&mut self, kind: EventKind) {
        self.prior_event = Some(kind);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, index: usize) {
        self.cursor = index;
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub fn record_family(&self) -> Option<Family> {
        self.record.as_ref().map(|r| r.family)
    }

    /// True when `family` owns the open record.
    pub fn in_record(&self, family: Family) -> bool {
        self.record_family() == Some(family)
    }

    /// Open a record at the current line. An already open record is replaced;
    /// the driver flushes before handing a start line to a matcher.
    pub fn begin_record(&mut self, family: Family, text: impl Into<String>) {
        self.record = Some(Record {
            family,
            text: text.into(),
            first_line: self.cursor,
            last_line: self.cursor,
            entangled: Vec::new(),
        });
    }

    /// Append a fragment to the open record. No-op when nothing is open.
    pub fn append(&mut self, fragment: &str) {
        if let Some(record) = self.record.as_mut() {
            record.text.push_str(fragment);
        }
    }

    /// Stretch the open record's span to cover `line`.
    pub(crate) fn extend_record(&mut self, line: usize) {
        if let Some(record) = self.record.as_mut() {
            record.last_line = record.last_line.max(line);
        }
    }

    pub(crate) fn take_record(&mut self) -> Option<Record> {
        self.record.take()
    }

    /// Queue an interleaved fragment found on the current line. It is emitted
    /// after the open record closes (immediately when none is open).
    pub fn defer(&mut self, text: impl Into<String>) {
        let line = self.cursor;
        if let Some(record) = self.record.as_mut() {
            if record.entangled.last() != Some(&line) {
                record.entangled.push(line);
            }
        }
        self.deferred.push_back(NormalizedLine::single(text, line));
    }

    pub(crate) fn pop_deferred(&mut self) -> Option<NormalizedLine> {
        self.deferred.pop_front()
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lifecycle() {
        let mut ctx = Context::new();
        ctx.set_cursor(4);
        ctx.begin_record(Family::Cms, "2.000: [GC 2.000: [ParNew");
        assert!(ctx.in_record(Family::Cms));
        assert!(!ctx.in_record(Family::Serial));

        ctx.set_cursor(6);
        ctx.append(": 1K->0K(2K), 0.1 secs]");
        ctx.extend_record(6);
        let record = ctx.take_record().unwrap();
        assert_eq!((record.first_line, record.last_line), (4, 6));
        assert!(record.text.ends_with("secs]"));
        assert!(ctx.record().is_none());
    }

    #[test]
    fn test_defer_marks_entangled_line() {
        let mut ctx = Context::new();
        ctx.begin_record(Family::G1, "[GC pause (young)");
        ctx.set_cursor(1);
        ctx.defer("[GC concurrent-mark-start]");
        assert_eq!(ctx.record().unwrap().entangled, vec![1]);

        let deferred = ctx.pop_deferred().unwrap();
        assert_eq!(deferred.span(), 1..=1);
        assert!(!ctx.has_deferred());
    }

    #[test]
    fn test_append_without_record_is_ignored() {
        let mut ctx = Context::new();
        ctx.append("orphan");
        assert!(ctx.record().is_none());
    }

    #[test]
    fn test_prior_family() {
        let mut ctx = Context::new();
        assert_eq!(ctx.prior_family(), None);
        ctx.set_prior_event(EventKind::ShenandoahInitMark);
        assert_eq!(ctx.prior_family(), Some(Family::Shenandoah));
    }
}
