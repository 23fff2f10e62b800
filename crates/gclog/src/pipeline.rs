//! Pipeline — preprocess and classify one file's lines.
//!
//! The catalogue and matcher set are built once and shared read-only; every
//! call to [`Pipeline::run`] gets its own context, driver and classifier.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::event::catalogue::{Catalogue, Classifier};
use crate::event::model::TypedEvent;
use crate::parser::decorator::parse_datestamp;
use crate::parser::metrics::ParsingMetrics;
use crate::parser::model::{GcLogError, NormalizedLine, RawLine, Step};
use crate::preprocess::{Driver, Flags, MatcherSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Normalized lines only. Lines are still classified internally: some
    /// matchers depend on the kind of the previous event, so the output
    /// matches what [`Mode::Classify`] normalizes.
    Preprocess,
    /// Normalized lines plus typed events
    #[default]
    Classify,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Preprocess => "preprocess",
            Mode::Classify => "classify",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub mode: Mode,
    /// JVM start, `2021-10-27T10:13:37.450-0400`; anchors datestamp-only logs
    pub jvm_start_date: Option<String>,
    /// Without a start date, use the first datestamp as the origin
    pub datestamp_origin_first_line: bool,
}

/// Result of one file.
#[derive(Debug, Default, Serialize)]
pub struct RunOutput {
    pub normalized: Vec<NormalizedLine>,
    /// Empty in [`Mode::Preprocess`]
    pub events: Vec<TypedEvent>,
    /// Raw lines that ended up only in unrecognized events
    pub residual: Vec<RawLine>,
    pub ends_with_unknown: bool,
    pub flags: Flags,
    pub steps: Vec<Step>,
}

pub struct Pipeline {
    catalogue: Arc<Catalogue>,
    matchers: MatcherSet,
    mode: Mode,
    jvm_start: Option<DateTime<FixedOffset>>,
    origin_from_first: bool,
    metrics: ParsingMetrics,
}

impl Pipeline {
    /// Builds the lexicon-checked catalogue and matchers; fails fast on a bad
    /// pattern or start date.
    pub fn new(config: &PipelineConfig) -> Result<Self, GcLogError> {
        let jvm_start = match config.jvm_start_date.as_deref() {
            Some(text) => Some(
                parse_datestamp(text).ok_or_else(|| GcLogError::InvalidStartDate(text.to_string()))?,
            ),
            None => None,
        };
        let catalogue = Arc::new(Catalogue::new()?);
        let matchers = MatcherSet::new()?;

        tracing::debug!(
            mode = config.mode.as_str(),
            kinds = catalogue.kinds().count(),
            jvm_start = ?jvm_start,
            "pipeline: ready"
        );

        Ok(Self {
            catalogue,
            matchers,
            mode: config.mode,
            jvm_start,
            origin_from_first: config.datestamp_origin_first_line,
            metrics: ParsingMetrics::new(),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn metrics(&self) -> &ParsingMetrics {
        &self.metrics
    }

    /// Process one file's lines, in order.
    pub fn run<S: AsRef<str>>(&self, lines: &[S]) -> Result<RunOutput, GcLogError> {
        let raw: Vec<RawLine> = lines
            .iter()
            .enumerate()
            .map(|(i, l)| RawLine::new(i, l.as_ref().trim_end_matches(['\r', '\n'])))
            .collect();
        self.run_raw(&raw)
    }

    pub fn run_raw(&self, raw: &[RawLine]) -> Result<RunOutput, GcLogError> {
        let classifier = Classifier::new(Arc::clone(&self.catalogue), self.jvm_start, self.origin_from_first);
        let driver = Driver::new(&self.matchers, classifier, &self.metrics)?;
        let pre = driver.run(raw);

        let mut output = RunOutput {
            normalized: pre.lines,
            flags: pre.flags,
            steps: pre.steps,
            ..RunOutput::default()
        };
        if self.mode == Mode::Preprocess {
            return Ok(output);
        }

        output.ends_with_unknown = pre.events.last().is_some_and(|e| e.is_unknown());
        output.residual = residual(raw, &output.normalized, &pre.events);
        output.events = pre.events;
        Ok(output)
    }
}

/// Raw lines covered by unknown events and by no recognized one.
fn residual(raw: &[RawLine], lines: &[NormalizedLine], events: &[TypedEvent]) -> Vec<RawLine> {
    let mut recognized = vec![false; raw.len()];
    let mut unknown = vec![false; raw.len()];
    for (line, event) in lines.iter().zip(events) {
        let marks = if event.is_unknown() { &mut unknown } else { &mut recognized };
        for i in line.span().filter(|i| *i < raw.len()) {
            marks[i] = true;
        }
    }
    raw.iter()
        .filter(|r| unknown[r.index] && !recognized[r.index])
        .cloned()
        .collect()
}
