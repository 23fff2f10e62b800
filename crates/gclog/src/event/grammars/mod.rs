//! Grammars — a structural predicate plus field extraction, one per event kind.
//!
//! Most blocking collections differ only in their line shape, so they share
//! [`CollectionGrammar`] and are told apart by their patterns. Patterns are
//! written as templates; `<SIZE>`, `<YOUNG>`, `<TIMES>` and friends expand to
//! regex fragments with well-known capture names that the shared extraction
//! code understands.

pub mod serial;
pub mod parallel;
pub mod cms;
pub mod g1;
pub mod shenandoah;
pub mod unified;
pub mod verbose;
pub mod safepoint;
pub mod info;

use regex::{Captures, Regex};

use crate::event::model::{Collection, Concurrent, EventKind, Info, Scope, Stamp, Times, TypedEvent};
use crate::parser::decorator::Decorator;
use crate::parser::lexicon;
use crate::parser::memory::{Memory, Region, RegionSnapshot};
use crate::parser::model::{compile, Family, GcLogError};
use crate::parser::units::{self, TimeUnit};
use crate::parser::{DATESTAMP, TIMESTAMP};

/// A normalized line after its decorator has been split off.
#[derive(Debug)]
pub struct DecoratedLine<'a> {
    /// The whole normalized line
    pub text: &'a str,
    /// Everything after the decorator
    pub body: &'a str,
    pub decorator: &'a Decorator,
    /// Resolved stamp (decorator, origin-relative datestamp or inherited)
    pub stamp: Stamp,
}

/// What the classifier knows about the events before this line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prior<'a> {
    pub event: Option<&'a TypedEvent>,
    /// Family of the most recent collector-specific event
    pub collector: Option<Family>,
}

pub trait EventGrammar: Send + Sync {
    fn kind(&self) -> EventKind;

    /// Cheap structural check.
    fn matches(&self, line: &DecoratedLine<'_>, prior: &Prior<'_>) -> bool;

    /// Field extraction; `None` lets the catalogue fall through.
    fn extract(&self, line: &DecoratedLine<'_>, prior: &Prior<'_>) -> Option<TypedEvent>;
}

// ─── Templates ──────────────────────────────────────────────────────

const SIZE: &str = r"\d{1,12}(?:[.,]\d{1,3})? ?[BKMG]";
const NUMBER: &str = r"\d{1,12}[.,]\d{1,9}";
const PAREN: &str = r"\((?:[^()]|\(\))*\)";
const TRIGGER: &str = r"(?: \((?:System\.gc\(\)|[^()]+)\))?";
const TIMES: &str =
    r"(?:\s*\[Times: user=(?P<user><N>) sys=(?P<sys><N>), real=(?P<real><N>) secs\])?";
const UNIFIED_CPU: &str = r"(?: User=(?P<user><N>)s Sys=(?P<sys><N>)s Real=(?P<real><N>)s)?";
const EDEN: &str = r"(?:\s*\[Eden: (?P<eden_b><SIZE>)\((?P<eden_cb><SIZE>)\)->(?P<eden_a><SIZE>)\((?P<eden_c><SIZE>)\) Survivors: (?P<surv_b><SIZE>)->(?P<surv_a><SIZE>) Heap: (?P<heap_b><SIZE>)\((?P<heap_cb><SIZE>)\)->(?P<heap_a><SIZE>)\((?P<heap_c><SIZE>)\)\](?:, \[Metaspace: <CLASS>\])?)?";
const GC_TIME_LIMIT: &str =
    r"(?:\s*GC time (?:would exceed|is exceeding) GCTimeLimit of \d{1,3}%)?";

/// `before->after(capacity)` with captures `{prefix}_b`, `{prefix}_a`, `{prefix}_c`.
fn trio(prefix: &str) -> String {
    format!(r"(?P<{prefix}_b><SIZE>)->(?P<{prefix}_a><SIZE>)\((?P<{prefix}_c><SIZE>)\)")
}

/// Expand template tokens into a regex.
pub fn expand(template: &str) -> String {
    let inner = format!(r"(?:{DATESTAMP}: ?)?(?:{TIMESTAMP}: ?)?");
    template
        .replace("<TIMES>", TIMES)
        .replace("<UCPU>", UNIFIED_CPU)
        .replace("<EDEN>", EDEN)
        .replace("<GCLIMIT>", GC_TIME_LIMIT)
        .replace("<YOUNG>", &trio("young"))
        .replace("<OLD>", &trio("old"))
        .replace("<TOTAL>", &trio("total"))
        .replace("<CLASS>", &trio("class"))
        .replace("<TRIGGER>", TRIGGER)
        .replace("<INNER>", &inner)
        .replace("<PAREN>", PAREN)
        .replace("<SIZE>", SIZE)
        .replace("<N>", NUMBER)
}

/// Which decorator style a pattern applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Legacy,
    Unified,
    Any,
}

pub struct Pattern {
    style: Style,
    regex: Regex,
    requires: Option<Family>,
    unless: Option<&'static str>,
}

impl Pattern {
    pub fn new(name: &'static str, style: Style, template: &str) -> Result<Self, GcLogError> {
        Ok(Self {
            style,
            regex: compile(name, &expand(template))?,
            requires: None,
            unless: None,
        })
    }

    pub fn legacy(name: &'static str, template: &str) -> Result<Self, GcLogError> {
        Self::new(name, Style::Legacy, template)
    }

    pub fn unified(name: &'static str, template: &str) -> Result<Self, GcLogError> {
        Self::new(name, Style::Unified, template)
    }

    pub fn any(name: &'static str, template: &str) -> Result<Self, GcLogError> {
        Self::new(name, Style::Any, template)
    }

    /// Only match after an event of `family`.
    pub fn requires(mut self, family: Family) -> Self {
        self.requires = Some(family);
        self
    }

    /// Like [`Pattern::requires`], waived when capture `group` participated.
    pub fn requires_unless(mut self, family: Family, group: &'static str) -> Self {
        self.requires = Some(family);
        self.unless = Some(group);
        self
    }

    fn applies(&self, line: &DecoratedLine<'_>) -> bool {
        match self.style {
            Style::Any => true,
            Style::Legacy => !line.decorator.is_unified(),
            Style::Unified => line.decorator.is_unified(),
        }
    }

    pub fn is_match(&self, line: &DecoratedLine<'_>, prior: &Prior<'_>) -> bool {
        match self.requires {
            None => self.applies(line) && self.regex.is_match(line.body),
            Some(_) => self.captures(line, prior).is_some(),
        }
    }

    pub fn captures<'t>(&self, line: &DecoratedLine<'t>, prior: &Prior<'_>) -> Option<Captures<'t>> {
        if !self.applies(line) {
            return None;
        }
        let caps = self.regex.captures(line.body)?;
        if let Some(family) = self.requires {
            let waived = self.unless.is_some_and(|group| caps.name(group).is_some());
            if !waived && prior.collector != Some(family) {
                return None;
            }
        }
        Some(caps)
    }
}

fn first_captures<'t>(
    patterns: &[Pattern],
    line: &DecoratedLine<'t>,
    prior: &Prior<'_>,
) -> Option<Captures<'t>> {
    patterns.iter().find_map(|p| p.captures(line, prior))
}

// ─── Extraction helpers ─────────────────────────────────────────────

fn group<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| m.as_str())
}

/// Region snapshot from a `{prefix}_b/_a/_c` trio or a `{prefix}_o/_c` occupancy pair.
pub fn snapshot(caps: &Captures<'_>, prefix: &str, region: Region) -> Option<RegionSnapshot> {
    let capacity = group(caps, &format!("{prefix}_c"))?;
    if let Some(before) = group(caps, &format!("{prefix}_b")) {
        let after = group(caps, &format!("{prefix}_a"))?;
        return RegionSnapshot::parse(region, before, after, capacity);
    }
    let used = group(caps, &format!("{prefix}_o"))?;
    RegionSnapshot::parse(region, used, used, capacity)
}

/// G1 `[Eden: …]` block: young is eden plus survivors, combined is `Heap:`.
fn eden_block(caps: &Captures<'_>) -> Option<(RegionSnapshot, RegionSnapshot)> {
    let eden = RegionSnapshot::parse(
        Region::Young,
        group(caps, "eden_b")?,
        group(caps, "eden_a")?,
        group(caps, "eden_c")?,
    )?
    .with_capacity_before(Memory::parse(group(caps, "eden_cb")?)?);
    let survivors = RegionSnapshot::parse(
        Region::Young,
        group(caps, "surv_b")?,
        group(caps, "surv_a")?,
        group(caps, "surv_a")?,
    )?
    .with_capacity_before(Memory::parse(group(caps, "surv_b")?)?);
    let young = eden.plus(Region::Young, &survivors)?;
    let heap = RegionSnapshot::parse(
        Region::Combined,
        group(caps, "heap_b")?,
        group(caps, "heap_a")?,
        group(caps, "heap_c")?,
    )?
    .with_capacity_before(Memory::parse(group(caps, "heap_cb")?)?);
    Some((young, heap))
}

pub fn times(caps: &Captures<'_>) -> Option<Times> {
    Some(Times {
        user: units::seconds(group(caps, "user")?)?,
        sys: units::seconds(group(caps, "sys")?)?,
        real: units::seconds(group(caps, "real")?)?,
    })
}

/// Shared collection extraction: duration `dur`, region trios, G1 eden
/// block, `[Times: …]`, and the trigger resolved from the whole line.
pub fn build_collection(
    caps: &Captures<'_>,
    line: &DecoratedLine<'_>,
    unit: TimeUnit,
    scope: Scope,
) -> Option<Collection> {
    let duration = unit.parse(group(caps, "dur")?)?;
    let mut collection = Collection::new(line.stamp, lexicon::resolve(line.text), duration)
        .with_times(times(caps));

    for (prefix, region) in [
        ("young", Region::Young),
        ("old", Region::Old),
        ("total", Region::Combined),
        ("heap", Region::Combined),
        ("class", Region::ClassSpace),
    ] {
        if let Some(s) = snapshot(caps, prefix, region) {
            collection = collection.with_region(s);
        }
    }
    if let Some((young, heap)) = eden_block(caps) {
        collection = collection.with_region(young).with_region(heap);
    }
    Some(collection.finish(scope))
}

// ─── Shared grammar shapes ──────────────────────────────────────────

/// A blocking collection told apart from its siblings by line shape alone.
pub struct CollectionGrammar {
    kind: EventKind,
    patterns: Vec<Pattern>,
    unit: TimeUnit,
    scope: Scope,
}

impl CollectionGrammar {
    pub fn new(kind: EventKind, unit: TimeUnit, scope: Scope, patterns: Vec<Pattern>) -> Self {
        Self { kind, patterns, unit, scope }
    }
}

impl EventGrammar for CollectionGrammar {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn matches(&self, line: &DecoratedLine<'_>, prior: &Prior<'_>) -> bool {
        self.patterns.iter().any(|p| p.is_match(line, prior))
    }

    fn extract(&self, line: &DecoratedLine<'_>, prior: &Prior<'_>) -> Option<TypedEvent> {
        let caps = first_captures(&self.patterns, line, prior)?;
        let collection = build_collection(&caps, line, self.unit, self.scope)?;
        TypedEvent::from_collection(self.kind, collection)
    }
}

/// A concurrent phase: `phase`, optional `wall` elapsed time, optional
/// `<TOTAL>` heap occupancy.
pub struct ConcurrentGrammar {
    kind: EventKind,
    patterns: Vec<Pattern>,
    unit: TimeUnit,
}

impl ConcurrentGrammar {
    pub fn new(kind: EventKind, unit: TimeUnit, patterns: Vec<Pattern>) -> Self {
        Self { kind, patterns, unit }
    }
}

impl EventGrammar for ConcurrentGrammar {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn matches(&self, line: &DecoratedLine<'_>, prior: &Prior<'_>) -> bool {
        self.patterns.iter().any(|p| p.is_match(line, prior))
    }

    fn extract(&self, line: &DecoratedLine<'_>, prior: &Prior<'_>) -> Option<TypedEvent> {
        let caps = first_captures(&self.patterns, line, prior)?;
        let elapsed = match group(&caps, "wall") {
            Some(wall) => Some(self.unit.parse(wall)?),
            None => None,
        };
        let concurrent = Concurrent {
            stamp: line.stamp,
            phase: group(&caps, "phase")?.trim().to_string(),
            elapsed,
            combined: snapshot(&caps, "total", Region::Combined),
            times: times(&caps),
        };
        TypedEvent::from_concurrent(self.kind, concurrent)
    }
}

/// Lines kept for context only; the payload is the trimmed body.
pub struct InfoGrammar {
    kind: EventKind,
    patterns: Vec<Pattern>,
}

impl InfoGrammar {
    pub fn new(kind: EventKind, patterns: Vec<Pattern>) -> Self {
        Self { kind, patterns }
    }
}

impl EventGrammar for InfoGrammar {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn matches(&self, line: &DecoratedLine<'_>, prior: &Prior<'_>) -> bool {
        self.patterns.iter().any(|p| p.is_match(line, prior))
    }

    fn extract(&self, line: &DecoratedLine<'_>, _prior: &Prior<'_>) -> Option<TypedEvent> {
        let info = Info {
            stamp: line.stamp,
            text: line.body.trim().to_string(),
        };
        TypedEvent::from_info(self.kind, info)
    }
}
