//! Concurrent Mark Sweep (`-XX:+UseConcMarkSweepGC`): `ParNew` young
//! collections, stop-the-world initial mark and remark, concurrent phases,
//! and the serial fallback after a concurrent mode failure.

use crate::event::model::{EventKind, Scope};
use crate::parser::model::GcLogError;
use crate::parser::units::TimeUnit;

use super::{CollectionGrammar, ConcurrentGrammar, Pattern};

pub fn par_new() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::ParNew,
        TimeUnit::Seconds,
        Scope::Young,
        vec![Pattern::legacy(
            "par_new",
            r"^\[GC<TRIGGER> ?<INNER>\[ParNew: <YOUNG>, <N> secs\] <TOTAL>(?: icms_dc=\d{1,3} )?, (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

/// Serial old collection: explicit full GCs, promotion failures and
/// concurrent mode failures.
pub fn cms_serial_old() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::CmsSerialOld,
        TimeUnit::Seconds,
        Scope::Full,
        vec![Pattern::legacy(
            "cms_serial_old",
            r"^\[(?:Full )?GC<TRIGGER> ?<INNER>(?:\[ParNew(?: \(promotion failed\))?: <YOUNG>, <N> secs\]<INNER>)?\[CMS(?: \(concurrent mode (?:failure|interrupted)\))?: <OLD>, <N> secs\] <TOTAL>, \[(?:Metaspace|CMS Perm ?): <CLASS>\](?: icms_dc=\d{1,3} )?, (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

pub fn cms_initial_mark() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::CmsInitialMark,
        TimeUnit::Seconds,
        Scope::Pause,
        vec![Pattern::legacy(
            "cms_initial_mark",
            r"^\[GC<TRIGGER> ?\[1 CMS-initial-mark: (?P<old_o><SIZE>)\((?P<old_c><SIZE>)\)\] (?P<heap_o><SIZE>)\((?P<heap_c><SIZE>)\), (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

pub fn cms_remark() -> Result<CollectionGrammar, GcLogError> {
    Ok(CollectionGrammar::new(
        EventKind::CmsRemark,
        TimeUnit::Seconds,
        Scope::Pause,
        vec![Pattern::legacy(
            "cms_remark",
            r"^\[GC<TRIGGER> ?\[YG occupancy: (?P<young_o><SIZE>) \((?P<young_c><SIZE>)\)\].*?\[1 CMS-remark: (?P<old_o><SIZE>)\((?P<old_c><SIZE>)\)\] (?P<heap_o><SIZE>)\((?P<heap_c><SIZE>)\), (?P<dur><N>) secs\]<TIMES>$",
        )?],
    ))
}

pub fn cms_concurrent() -> Result<ConcurrentGrammar, GcLogError> {
    Ok(ConcurrentGrammar::new(
        EventKind::CmsConcurrent,
        TimeUnit::Seconds,
        vec![Pattern::legacy(
            "cms_concurrent",
            r"^\[CMS-concurrent-(?P<phase>[a-z-]+?)(?:: (?P<cpu><N>)/(?P<wall><N>) secs)?\]<TIMES>$",
        )?],
    ))
}
