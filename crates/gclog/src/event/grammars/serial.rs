//! Serial collector (`-XX:+UseSerialGC`): `DefNew` young, `Tenured` old.

use crate::event::model::{EventKind, Scope};
use crate::parser::model::GcLogError;
use crate::parser::units::TimeUnit;

use super::{CollectionGrammar, Pattern};

pub fn serial_new() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::SerialNew,
        TimeUnit::Seconds,
        Scope::Young,
        vec![Pattern::legacy(
            "serial_new",
            r"^\[GC<TRIGGER> ?<INNER>\[DefNew: <YOUNG>, <N> secs\] <TOTAL>, (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

/// Full collections, including a young collection that escalated.
pub fn serial_old() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::SerialOld,
        TimeUnit::Seconds,
        Scope::Full,
        vec![Pattern::legacy(
            "serial_old",
            r"^\[(?:Full )?GC<TRIGGER> ?<INNER>(?:\[DefNew(?: \(promotion failed\))?: <YOUNG>, <N> secs\]<INNER>)?\[Tenured: <OLD>, <N> secs\] <TOTAL>, \[(?:Metaspace|Perm) ?: <CLASS>\], (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::grammars::testing::run;
    use crate::event::model::TypedEvent;
    use crate::parser::lexicon::Trigger;
    use crate::parser::memory::{Memory, Region};
    use std::time::Duration;

    #[test]
    fn test_serial_new() {
        let line = "2.218: [GC (Allocation Failure) 2.218: [DefNew: 139776K->17472K(157248K), 0.0459940 secs] 139776K->26457K(506816K), 0.0460580 secs] [Times: user=0.03 sys=0.01, real=0.04 secs]";
        let event = run(&serial_new().unwrap(), line, None).unwrap();
        let TypedEvent::SerialNew(c) = event else { panic!("wrong kind") };
        assert_eq!(c.trigger, Trigger::AllocationFailure);
        assert_eq!(c.duration, Duration::from_nanos(46_058_000));
        assert_eq!(c.stamp.timestamp, Some(Duration::from_millis(2_218)));
        assert_eq!(c.region(Region::Young).unwrap().after, Memory::from_kilobytes(17_472));
        // old is derived: 26457 - 17472
        assert_eq!(c.region(Region::Old).unwrap().after, Memory::from_kilobytes(8_985));
        assert!(c.times.is_some());
        assert!(c.anomalies.is_empty());
    }

    #[test]
    fn test_serial_old_after_promotion_failure() {
        let line = "5.600: [GC (Allocation Failure) 5.600: [DefNew: 157247K->157247K(157248K), 0.0000200 secs]5.600: [Tenured: 349465K->349465K(349568K), 0.0600000 secs] 506712K->506641K(506816K), [Metaspace: 2671K->2671K(1056768K)], 0.0601000 secs]";
        let event = run(&serial_old().unwrap(), line, None).unwrap();
        assert_eq!(event.kind(), EventKind::SerialOld);
        let c = event.as_collection().unwrap();
        assert_eq!(c.region(Region::Old).unwrap().before, Memory::from_kilobytes(349_465));
        assert_eq!(c.region(Region::ClassSpace).unwrap().capacity, Memory::from_kilobytes(1_056_768));
    }

    #[test]
    fn test_serial_old_full_gc() {
        let line = "[Full GC (System.gc()) [Tenured: 0K->2394K(349568K), 0.0100 secs] 7990K->2394K(506816K), [Metaspace: 2671K->2671K(1056768K)], 0.0110 secs]";
        let event = run(&serial_old().unwrap(), line, None).unwrap();
        assert_eq!(event.as_collection().unwrap().trigger, Trigger::SystemGc);
    }

    #[test]
    fn test_perm_gen_spelling() {
        let line = "[Full GC [Tenured: 0K->2394K(349568K), 0.0100 secs] 7990K->2394K(506816K), [Perm : 2671K->2671K(21248K)], 0.0110 secs]";
        assert!(run(&serial_old().unwrap(), line, None).is_some());
    }

    #[test]
    fn test_serial_new_does_not_take_full_gc() {
        let line = "[Full GC (System.gc()) [Tenured: 0K->2394K(349568K), 0.0100 secs] 7990K->2394K(506816K), [Metaspace: 2671K->2671K(1056768K)], 0.0110 secs]";
        assert!(run(&serial_new().unwrap(), line, None).is_none());
    }
}
