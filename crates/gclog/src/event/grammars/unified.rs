//! JDK 9+ unified logging (`-Xlog:gc*`) summary lines, shared by every
//! collector. The `gc,cpu` line is joined onto its summary by preprocessing.

use regex::Regex;

use crate::event::model::{EventKind, Safepoint, Scope, TypedEvent};
use crate::parser::model::{compile, GcLogError};
use crate::parser::units::{self, TimeUnit};

use super::{CollectionGrammar, ConcurrentGrammar, DecoratedLine, EventGrammar, Pattern, Prior};

fn summary(
    kind: EventKind,
    name: &'static str,
    pause: &str,
    scope: Scope,
) -> Result<CollectionGrammar, GcLogError> {
    let template = format!(r"^GC\(\d+\) Pause {pause}(?: <PAREN>)*(?: <TOTAL>)? (?P<dur><N>) ?ms<UCPU>$");
    Ok(CollectionGrammar::new(
        kind,
        TimeUnit::Millis,
        scope,
        vec![Pattern::unified(name, &template)?],
    ))
}

pub fn unified_young() -> Result<CollectionGrammar, GcLogError> {
    summary(EventKind::UnifiedYoung, "unified_young", "(?:Young|Initial Mark|Mixed)", Scope::Mixed)
}

pub fn unified_old() -> Result<CollectionGrammar, GcLogError> {
    summary(EventKind::UnifiedOld, "unified_old", "Full", Scope::Full)
}

pub fn unified_remark() -> Result<CollectionGrammar, GcLogError> {
    summary(EventKind::UnifiedRemark, "unified_remark", "Remark", Scope::Pause)
}

pub fn unified_cleanup() -> Result<CollectionGrammar, GcLogError> {
    summary(EventKind::UnifiedCleanup, "unified_cleanup", "Cleanup", Scope::Pause)
}

pub fn unified_concurrent() -> Result<ConcurrentGrammar, GcLogError> {
    Ok(ConcurrentGrammar::new(
        EventKind::UnifiedConcurrent,
        TimeUnit::Millis,
        vec![Pattern::unified(
            "unified_concurrent",
            r"^GC\(\d+\) Concurrent (?P<phase>[A-Z][A-Za-z ]*?)(?: <PAREN>)*(?: (?P<wall><N>) ?ms)?<UCPU>$",
        )?],
    ))
}

/// JDK 13+ `-Xlog:safepoint` line.
pub struct UnifiedSafepointGrammar {
    regex: Regex,
}

impl UnifiedSafepointGrammar {
    pub fn new() -> Result<Self, GcLogError> {
        Ok(Self {
            regex: compile(
                "unified_safepoint",
                r#"^Safepoint "(?P<op>[^"]+)", Time since last: \d+ ns, Reaching safepoint: (?P<reach>\d+) ns,(?: Cleanup: \d+ ns,)? At safepoint: \d+ ns, Total: (?P<total>\d+) ns$"#,
            )?,
        })
    }
}

impl EventGrammar for UnifiedSafepointGrammar {
    fn kind(&self) -> EventKind {
        EventKind::UnifiedSafepoint
    }

    fn matches(&self, line: &DecoratedLine<'_>, _prior: &Prior<'_>) -> bool {
        line.decorator.is_unified() && self.regex.is_match(line.body)
    }

    fn extract(&self, line: &DecoratedLine<'_>, _prior: &Prior<'_>) -> Option<TypedEvent> {
        let caps = self.regex.captures(line.body)?;
        Some(TypedEvent::UnifiedSafepoint(Safepoint {
            stamp: line.stamp,
            operation: Some(caps["op"].to_string()),
            stopped: units::nanos(&caps["total"])?,
            reaching: units::nanos(&caps["reach"]),
        }))
    }
}
