//! Driver — sequential state machine over the raw lines of one file.
//!
//! ```text
//! Idle ──start line──► Accumulating(family) ──continuation──► EmitPending
//!   ▲                        │   ▲                                │
//!   │                        └───┘ detail / interleaved           │
//!   └──────────────── next line is not a bare [Times: ...] ◄──────┘
//! ```
//!
//! Emitted lines are held back by one line so that a `[Times: ...]` block
//! printed on its own line can still be attached. Deferred fragments are
//! released right after the record they interrupted.

use regex::Regex;

use super::context::Context;
use super::stamp::Stamped;
use super::{Flags, LineMatcher, MatcherSet, Reassembly};
use crate::event::catalogue::Classifier;
use crate::event::model::{EventKind, TypedEvent};
use crate::parser::metrics::ParsingMetrics;
use crate::parser::model::{compile, Disposition, GcLogError, NormalizedLine, RawLine, Step};

/// Driver state, derived from the context and the pending line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Accumulating,
    EmitPending,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Accumulating => "accumulating",
            State::EmitPending => "emit_pending",
        }
    }
}

/// Everything one driver run produced.
#[derive(Debug, Default)]
pub struct Preprocessed {
    pub lines: Vec<NormalizedLine>,
    /// One event per line, same order
    pub events: Vec<TypedEvent>,
    pub steps: Vec<Step>,
    pub flags: Flags,
}

/// Decision for the current line, in the spirit of a grouping action.
enum Route<'m> {
    /// Bare `[Times: ...]` closing the pending line
    Absorb,
    /// The open record's owner claims the line
    Owner(&'m dyn LineMatcher),
    /// The open record is interrupted; flush it, then probe
    FlushAndProbe,
    Probe,
}

/// One driver per file. Holds the context and the per-file classifier.
pub struct Driver<'a> {
    matchers: &'a MatcherSet,
    classifier: Classifier,
    metrics: &'a ParsingMetrics,
    trailing_times: Regex,
    ctx: Context,
    pending: Option<NormalizedLine>,
    out: Preprocessed,
}

impl<'a> Driver<'a> {
    pub fn new(
        matchers: &'a MatcherSet,
        classifier: Classifier,
        metrics: &'a ParsingMetrics,
    ) -> Result<Self, GcLogError> {
        Ok(Self {
            matchers,
            classifier,
            metrics,
            trailing_times: compile("trailing_times", super::families::TRAILING_TIMES)?,
            ctx: Context::new(),
            pending: None,
            out: Preprocessed::default(),
        })
    }

    pub fn state(&self) -> State {
        if self.ctx.record().is_some() {
            State::Accumulating
        } else if self.pending.is_some() {
            State::EmitPending
        } else {
            State::Idle
        }
    }

    pub fn run(mut self, raw: &[RawLine]) -> Preprocessed {
        let stamped: Vec<Stamped<'_>> = raw
            .iter()
            .map(|line| self.matchers.stamps().normalize(&line.text))
            .collect();
        for s in &stamped {
            if let Stamped::Kept { datestamp, repeated, .. } = s {
                self.ctx.flags.datestamps_seen |= *datestamp;
                self.ctx.flags.repeated_datestamps |= *repeated;
            }
        }

        let mut index = 0;
        while index < raw.len() {
            self.ctx.set_cursor(index);
            let consumed = match &stamped[index] {
                Stamped::Discard { reason } => {
                    tracing::debug!(line = index, reason = *reason, "preprocess: discarding line");
                    self.record_step(index, 1, Disposition::Discarded);
                    1
                }
                Stamped::Kept { text, .. } => {
                    let next = stamped.get(index + 1).and_then(|s| s.text());
                    self.step(index, text, next, raw)
                }
            };
            index += consumed;
        }

        self.release();
        self.flush(raw);
        self.release();

        self.out.flags = self.ctx.flags;
        tracing::debug!(
            raw = raw.len(),
            lines = self.out.lines.len(),
            steps = self.out.steps.len(),
            "preprocess: file done"
        );
        self.out
    }

    /// Handle the line at `index`; returns how many raw lines were consumed.
    fn step(&mut self, index: usize, text: &str, next: Option<&str>, raw: &[RawLine]) -> usize {
        let matchers = self.matchers;

        let route = if self.pending.is_some()
            && self.ctx.record().is_none()
            && self.trailing_times.is_match(text)
        {
            Route::Absorb
        } else {
            match self.ctx.record_family() {
                Some(family) => match matchers.owner(family).filter(|m| m.matches(text, &self.ctx)) {
                    Some(owner) => Route::Owner(owner),
                    None => Route::FlushAndProbe,
                },
                None => Route::Probe,
            }
        };

        tracing::trace!(line = index, state = self.state().as_str(), "preprocess: step");

        let matcher = match route {
            Route::Absorb => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.text.push(' ');
                    pending.text.push_str(text.trim());
                    pending.last_line = index;
                }
                self.record_step(index, 1, Disposition::Emitted);
                return 1;
            }
            Route::Owner(owner) => Some(owner),
            Route::FlushAndProbe => {
                if let Some(record) = self.ctx.record() {
                    tracing::debug!(
                        family = record.family.as_str(),
                        first_line = record.first_line,
                        interrupted_at = index,
                        "preprocess: flushing interrupted record"
                    );
                }
                self.release();
                self.flush(raw);
                self.release();
                matchers.claim(text, &self.ctx)
            }
            Route::Probe => {
                self.release();
                matchers.claim(text, &self.ctx)
            }
        };

        let reassembly = match matcher {
            Some(m) => m.reassemble(text, next, &mut self.ctx),
            None => Reassembly::Emit { text: text.to_string(), consumed: 1 },
        };
        self.apply(index, reassembly, raw)
    }

    fn apply(&mut self, index: usize, reassembly: Reassembly, raw: &[RawLine]) -> usize {
        let consumed = reassembly.consumed().clamp(1, raw.len() - index);
        let last = index + consumed - 1;

        let disposition = match reassembly {
            Reassembly::Emit { text, .. } => {
                if self.ctx.record().is_some() {
                    // Never overtake the open record
                    self.ctx.defer(text);
                } else {
                    self.pending = Some(NormalizedLine::new(text, index, last));
                }
                Disposition::Emitted
            }
            Reassembly::Complete { .. } => {
                self.ctx.extend_record(last);
                self.flush(raw);
                Disposition::Emitted
            }
            Reassembly::Accumulate { .. } => {
                self.ctx.extend_record(last);
                Disposition::Accumulated
            }
            Reassembly::Ignore { .. } => {
                self.ctx.extend_record(last);
                Disposition::Ignored
            }
        };
        self.record_step(index, consumed, disposition);
        consumed
    }

    /// Move the open record, if any, into the pending slot.
    fn flush(&mut self, raw: &[RawLine]) {
        let Some(record) = self.ctx.take_record() else { return };
        let entangled = record
            .entangled
            .iter()
            .filter_map(|&i| raw.get(i).cloned())
            .collect();
        let mut line = NormalizedLine::new(record.text, record.first_line, record.last_line);
        line.entangled = entangled;
        tracing::trace!(
            family = record.family.as_str(),
            first_line = line.first_line,
            last_line = line.last_line,
            "preprocess: record complete"
        );
        // Whatever was pending precedes the record
        if let Some(earlier) = self.pending.take() {
            self.emit(earlier);
        }
        self.pending = Some(line);
    }

    /// Classify and emit the pending line, then any deferred fragments once
    /// no record is open.
    fn release(&mut self) {
        if let Some(line) = self.pending.take() {
            self.emit(line);
        }
        if self.ctx.record().is_none() {
            while let Some(line) = self.ctx.pop_deferred() {
                self.emit(line);
            }
        }
    }

    fn emit(&mut self, line: NormalizedLine) {
        let event = self.classifier.classify(&line, self.out.events.last());
        let kind = event.kind();
        self.metrics.record_classification(kind == EventKind::Unknown);
        if kind != EventKind::Unknown {
            self.ctx.set_prior_event(kind);
        } else {
            tracing::trace!(first_line = line.first_line, "preprocess: unrecognized line");
        }
        self.out.lines.push(line);
        self.out.events.push(event);
    }

    fn record_step(&mut self, first_line: usize, consumed: usize, disposition: Disposition) {
        self.metrics.record_step(disposition, consumed);
        self.out.steps.push(Step {
            first_line,
            consumed,
            disposition,
        });
    }
}
