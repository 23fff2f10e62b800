use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::trace;

use super::grammars::{
    cms, g1, info, parallel, safepoint, serial, shenandoah, unified, verbose, DecoratedLine,
    EventGrammar, Prior,
};
use super::model::{EventKind, Stamp, TypedEvent};
use crate::parser::decorator::{Decorator, DecoratorParser};
use crate::parser::lexicon;
use crate::parser::model::{Family, GcLogError, NormalizedLine};

/// Ordered grammar catalogue. Immutable once built and shared across files.
pub struct Catalogue {
    decorators: DecoratorParser,
    grammars: Vec<Box<dyn EventGrammar>>,
}

impl Catalogue {
    pub fn new() -> Result<Self, GcLogError> {
        lexicon::validate()?;

        let grammars: Vec<Box<dyn EventGrammar>> = vec![
            // Order matters! More specific grammars first
            Box::new(info::blank_line()?),
            Box::new(unified::UnifiedSafepointGrammar::new()?),
            Box::new(info::GcInfoGrammar::new()?),
            // Shenandoah before unified: `Pause Full` is shared
            Box::new(shenandoah::degenerated_gc()?),
            Box::new(shenandoah::full_gc()?),
            Box::new(shenandoah::init_mark()?),
            Box::new(shenandoah::final_mark()?),
            Box::new(shenandoah::init_update()?),
            Box::new(shenandoah::final_update()?),
            Box::new(shenandoah::concurrent()?),
            Box::new(unified::unified_young()?),
            Box::new(unified::unified_old()?),
            Box::new(unified::unified_remark()?),
            Box::new(unified::unified_cleanup()?),
            Box::new(unified::unified_concurrent()?),
            Box::new(g1::g1_young_initial_mark()?),
            Box::new(g1::g1_mixed_pause()?),
            Box::new(g1::g1_young_pause()?),
            Box::new(g1::g1_full_gc()?),
            Box::new(g1::g1_remark()?),
            Box::new(g1::g1_cleanup()?),
            Box::new(g1::g1_concurrent()?),
            // Escalated collections embed the young collection they started as
            Box::new(cms::cms_serial_old()?),
            Box::new(cms::par_new()?),
            Box::new(cms::cms_initial_mark()?),
            Box::new(cms::cms_remark()?),
            Box::new(cms::cms_concurrent()?),
            Box::new(parallel::parallel_compacting_old()?),
            Box::new(parallel::parallel_serial_old()?),
            Box::new(parallel::parallel_scavenge()?),
            Box::new(serial::serial_old()?),
            Box::new(serial::serial_new()?),
            // Generic shapes last
            Box::new(verbose::verbose_gc_old()?),
            Box::new(verbose::verbose_gc_young()?),
            Box::new(safepoint::StoppedTimeGrammar::new()?),
            Box::new(safepoint::ConcurrentTimeGrammar::new()?),
            Box::new(info::command_line_flags()?),
            Box::new(info::memory()?),
            Box::new(info::version()?),
            Box::new(info::log_rotation()?),
            Box::new(info::tenuring_distribution()?),
            Box::new(info::class_unloading()?),
            Box::new(info::footer_heap()?),
            Box::new(info::gc_overhead_limit()?),
        ];

        Ok(Self {
            decorators: DecoratorParser::new()?,
            grammars,
        })
    }

    /// Event kinds in priority order.
    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.grammars.iter().map(|g| g.kind())
    }

    pub fn split<'a>(&self, line: &'a str) -> (Decorator, &'a str) {
        self.decorators.split(line)
    }

    /// First grammar that both matches and extracts.
    pub fn find(&self, line: &DecoratedLine<'_>, prior: &Prior<'_>) -> Option<TypedEvent> {
        for grammar in &self.grammars {
            if !grammar.matches(line, prior) {
                continue;
            }
            match grammar.extract(line, prior) {
                Some(event) => return Some(event),
                None => trace!(
                    kind = grammar.kind().as_str(),
                    line = line.text,
                    "Grammar matched but extraction failed"
                ),
            }
        }
        None
    }
}

/// Per-file classifier: resolves stamps and tracks the collector in use.
pub struct Classifier {
    catalogue: Arc<Catalogue>,
    origin: Option<DateTime<FixedOffset>>,
    origin_from_first: bool,
    collector: Option<Family>,
}

impl Classifier {
    /// `jvm_start` anchors datestamp-only lines; without it the first
    /// datestamp in the file is used when `origin_from_first` is set.
    pub fn new(
        catalogue: Arc<Catalogue>,
        jvm_start: Option<DateTime<FixedOffset>>,
        origin_from_first: bool,
    ) -> Self {
        Self {
            catalogue,
            origin: jvm_start,
            origin_from_first,
            collector: None,
        }
    }

    /// Total: every line yields an event, `Unknown` when nothing matches.
    pub fn classify(&mut self, line: &NormalizedLine, prior: Option<&TypedEvent>) -> TypedEvent {
        let text = line.text.trim_end();
        let (decorator, body) = self.catalogue.split(text);
        let stamp = self.resolve_stamp(&decorator, prior);
        let decorated = DecoratedLine {
            text,
            body,
            decorator: &decorator,
            stamp,
        };
        let context = Prior {
            event: prior,
            collector: self.collector,
        };

        let event = self
            .catalogue
            .find(&decorated, &context)
            .unwrap_or_else(|| TypedEvent::unknown(stamp, line.text.as_str()));

        if let Some(family) = event.kind().family().filter(|f| *f != Family::Unified) {
            self.collector = Some(family);
        }
        event
    }

    fn resolve_stamp(&mut self, decorator: &Decorator, prior: Option<&TypedEvent>) -> Stamp {
        match (decorator.datestamp, decorator.uptime) {
            (datestamp, Some(uptime)) => {
                if let (None, Some(ds), true) = (self.origin, datestamp, self.origin_from_first) {
                    self.origin = chrono::Duration::from_std(uptime).ok().map(|up| ds - up);
                }
                Stamp { datestamp, timestamp: Some(uptime) }
            }
            (Some(ds), None) => {
                if self.origin.is_none() && self.origin_from_first {
                    self.origin = Some(ds);
                }
                let timestamp = self.origin.and_then(|origin| (ds - origin).to_std().ok());
                Stamp { datestamp: Some(ds), timestamp }
            }
            (None, None) => prior.map(|p| p.stamp()).unwrap_or_default(),
        }
    }
}
