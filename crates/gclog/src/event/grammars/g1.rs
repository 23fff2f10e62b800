//! G1 (`-XX:+UseG1GC`) in JDK 7/8 `-XX:+PrintGCDetails` format.
//!
//! Young, mixed and initial-mark pauses share one line shape; the
//! parenthesised pause type tells them apart. Remembered-set statistics and
//! the per-phase timing tree never reach the classifier.

use crate::event::model::{EventKind, Scope};
use crate::parser::model::{Family, GcLogError};
use crate::parser::units::TimeUnit;

use super::{CollectionGrammar, ConcurrentGrammar, Pattern};

const TO_SPACE: &str = r"(?: \(to-space (?:exhausted|overflow)\))?";

fn pause(kind: EventKind, name: &'static str, pause_type: &str) -> Result<CollectionGrammar, GcLogError> {
    let template = format!(
        r"^\[GC pause<TRIGGER> {pause_type}{TO_SPACE}(?: <TOTAL>)?, (?P<dur><N>) secs\]<EDEN><TIMES>$"
    );
    Ok(CollectionGrammar::new(
        kind,
        TimeUnit::Seconds,
        Scope::Mixed,
        vec![Pattern::legacy(name, &template)?],
    ))
}

pub fn g1_young_pause() -> Result<CollectionGrammar, GcLogError> {
    pause(EventKind::G1YoungPause, "g1_young_pause", r"\(young\)")
}

pub fn g1_mixed_pause() -> Result<CollectionGrammar, GcLogError> {
    pause(EventKind::G1MixedPause, "g1_mixed_pause", r"\(mixed\)")
}

pub fn g1_young_initial_mark() -> Result<CollectionGrammar, GcLogError> {
    pause(
        EventKind::G1YoungInitialMark,
        "g1_young_initial_mark",
        r"\(young\) \(initial-mark\)",
    )
}

/// Full GC. Without the `[Eden: …]` block the line is indistinguishable
/// from a plain `-verbose:gc` full collection, so it only counts as G1 when
/// the log has already shown G1 events.
pub fn g1_full_gc() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::G1FullGc,
        TimeUnit::Seconds,
        Scope::Full,
        vec![Pattern::legacy(
            "g1_full_gc",
            r"^\[Full GC<TRIGGER>\s+<TOTAL>, (?P<dur><N>) secs\]<EDEN><TIMES>$",
        )?
        .requires_unless(Family::G1, "eden_b")],
    ))
}

pub fn g1_remark() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::G1Remark,
        TimeUnit::Seconds,
        Scope::Pause,
        vec![Pattern::legacy(
            "g1_remark",
            r"^\[GC remark\b.*, (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

pub fn g1_cleanup() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::G1Cleanup,
        TimeUnit::Seconds,
        Scope::Pause,
        vec![Pattern::legacy(
            "g1_cleanup",
            r"^\[GC cleanup <TOTAL>, (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

pub fn g1_concurrent() -> Result<ConcurrentGrammar, GcLogError> {
    Ok(ConcurrentGrammar::new(
        EventKind::G1Concurrent,
        TimeUnit::Seconds,
        vec![Pattern::legacy(
            "g1_concurrent",
            r"^\[GC concurrent-(?P<phase>[a-z-]+)(?:,[^\]]*?)?(?:, (?P<wall><N>) secs)?\]<TIMES>$",
        )?],
    ))
}
