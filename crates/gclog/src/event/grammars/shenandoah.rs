//! Shenandoah (`-XX:+UseShenandoahGC`), both the JDK 8 bracketed format
//! and JDK 11+ unified logging. Durations are printed in milliseconds.

use crate::event::model::{EventKind, Scope};
use crate::parser::model::{Family, GcLogError};
use crate::parser::units::TimeUnit;

use super::{CollectionGrammar, ConcurrentGrammar, Pattern};

fn legacy_pause(name: &str) -> String {
    format!(r"^\[Pause {name}(?: <PAREN>)*(?: <TOTAL>)?, (?P<dur><N>) ms\]$")
}

fn unified_pause(name: &str) -> String {
    format!(r"^GC\(\d+\) Pause {name}(?: <PAREN>)*(?: <TOTAL>)? (?P<dur><N>) ?ms$")
}

fn pause(
    kind: EventKind,
    name: &'static str,
    phrase: &str,
    scope: Scope,
) -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        kind,
        TimeUnit::Millis,
        scope,
        vec![
            Pattern::legacy(name, &legacy_pause(phrase))?,
            Pattern::unified(name, &unified_pause(phrase))?,
        ],
    ))
}

pub fn init_mark() -> Result<CollectionGrammar, GcLogError> {
    pause(EventKind::ShenandoahInitMark, "shenandoah_init_mark", "Init Mark", Scope::Pause)
}

pub fn final_mark() -> Result<CollectionGrammar, GcLogError> {
    pause(EventKind::ShenandoahFinalMark, "shenandoah_final_mark", "Final Mark", Scope::Pause)
}

pub fn init_update() -> Result<CollectionGrammar, GcLogError> {
    pause(EventKind::ShenandoahInitUpdate, "shenandoah_init_update", "Init Update Refs", Scope::Pause)
}

pub fn final_update() -> Result<CollectionGrammar, GcLogError> {
    pause(EventKind::ShenandoahFinalUpdate, "shenandoah_final_update", "Final Update Refs", Scope::Pause)
}

pub fn degenerated_gc() -> Result<CollectionGrammar, GcLogError> {
    pause(EventKind::ShenandoahDegeneratedGc, "shenandoah_degenerated_gc", "Degenerated GC", Scope::Full)
}

/// The unified `Pause Full` line is shared with every other collector, so
/// that form only counts as Shenandoah after Shenandoah events.
pub fn full_gc() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::ShenandoahFullGc,
        TimeUnit::Millis,
        Scope::Full,
        vec![
            Pattern::legacy("shenandoah_full_gc", &legacy_pause("Full"))?,
            Pattern::unified("shenandoah_full_gc", &unified_pause("Full"))?.requires(Family::Shenandoah),
        ],
    ))
}

pub fn concurrent() -> Result<ConcurrentGrammar, GcLogError> {
    Ok(ConcurrentGrammar::new(
        EventKind::ShenandoahConcurrent,
        TimeUnit::Millis,
        vec![
            Pattern::legacy(
                "shenandoah_concurrent",
                r"^\[Concurrent (?P<phase>[a-z][a-z ]*?)(?: <PAREN>)*(?: <TOTAL>)?, (?P<wall><N>) ms\]$",
            )?,
            Pattern::unified(
                "shenandoah_concurrent",
                r"^GC\(\d+\) Concurrent (?P<phase>[a-z][a-z ]*?)(?: <PAREN>)*(?: <TOTAL>)? (?P<wall><N>) ?ms$",
            )?,
        ],
    ))
}
