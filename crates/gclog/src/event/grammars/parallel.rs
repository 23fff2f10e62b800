//! Parallel collector (`-XX:+UseParallelGC`): `PSYoungGen` scavenges and
//! `PSOldGen` / `ParOldGen` full collections.

use crate::event::model::{EventKind, Scope};
use crate::parser::model::GcLogError;
use crate::parser::units::TimeUnit;

use super::{CollectionGrammar, Pattern};

pub fn parallel_scavenge() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::ParallelScavenge,
        TimeUnit::Seconds,
        Scope::Young,
        vec![Pattern::legacy(
            "parallel_scavenge",
            r"^\[GC(?:--)?<TRIGGER>(?:--)? \[PSYoungGen: <YOUNG>\] <TOTAL>, (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

fn parallel_full(kind: EventKind, name: &'static str, old_gen: &str) -> Result<CollectionGrammar, GcLogError> {
    let template = format!(
        r"^\[Full GC<TRIGGER> \[PSYoungGen: <YOUNG>\] \[{old_gen}: <OLD>\] <TOTAL>,? \[(?:PSPermGen|Metaspace): <CLASS>\]<GCLIMIT>, (?P<dur><N>) secs\]<TIMES>$"
    );
    Ok(CollectionGrammar::new(
        kind,
        TimeUnit::Seconds,
        Scope::Full,
        vec![Pattern::legacy(name, &template)?],
    ))
}

/// `-XX:-UseParallelOldGC`: serial mark-sweep-compact of the old generation.
pub fn parallel_serial_old() -> Result<CollectionGrammar, GcLogError> {
    parallel_full(EventKind::ParallelSerialOld, "parallel_serial_old", "PSOldGen")
}

pub fn parallel_compacting_old() -> Result<CollectionGrammar, GcLogError> {
    parallel_full(EventKind::ParallelCompactingOld, "parallel_compacting_old", "ParOldGen")
}
