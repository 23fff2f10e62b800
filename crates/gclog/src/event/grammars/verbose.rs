//! Plain `-verbose:gc` / `-XX:+PrintGC` lines: heap totals only.

use crate::event::model::{EventKind, Scope};
use crate::parser::model::GcLogError;
use crate::parser::units::TimeUnit;

use super::{CollectionGrammar, Pattern};

pub fn verbose_gc_young() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::VerboseGcYoung,
        TimeUnit::Seconds,
        Scope::Young,
        vec![Pattern::legacy(
            "verbose_gc_young",
            r"^\[GC(?:--)?<TRIGGER>(?:--)? +<TOTAL>, (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

pub fn verbose_gc_old() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::VerboseGcOld,
        TimeUnit::Seconds,
        Scope::Full,
        vec![Pattern::legacy(
            "verbose_gc_old",
            r"^\[Full GC<TRIGGER> +<TOTAL>, (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::grammars::testing::run;
    use crate::parser::lexicon::Trigger;
    use crate::parser::memory::Region;

    #[test]
    fn test_young() {
        let line = "1.234: [GC (Allocation Failure)  65536K->12815K(251392K), 0.0102110 secs]";
        let event = run(&verbose_gc_young().unwrap(), line, None).unwrap();
        let c = event.as_collection().unwrap();
        assert_eq!(c.trigger, Trigger::AllocationFailure);
        assert_eq!(c.regions.len(), 1);
        assert!(c.region(Region::Combined).is_some());
    }

    #[test]
    fn test_jdk6_young_without_trigger() {
        assert!(run(&verbose_gc_young().unwrap(), "[GC 65536K->12815K(251392K), 0.0102110 secs]", None).is_some());
    }

    #[test]
    fn test_old() {
        let line = "[Full GC (System.gc())  1024M->256M(2048M), 1.2000000 secs]";
        let event = run(&verbose_gc_old().unwrap(), line, None).unwrap();
        assert_eq!(event.kind(), EventKind::VerboseGcOld);
        assert!(run(&verbose_gc_young().unwrap(), line, None).is_none());
    }

    #[test]
    fn test_detailed_lines_are_not_verbose() {
        let line = "[GC (Allocation Failure) [PSYoungGen: 65536K->10735K(76288K)] 65536K->12815K(251392K), 0.0102110 secs]";
        assert!(run(&verbose_gc_young().unwrap(), line, None).is_none());
    }
}
