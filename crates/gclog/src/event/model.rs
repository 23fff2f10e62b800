use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::parser::lexicon::Trigger;
use crate::parser::memory::{Anomaly, Region, RegionSnapshot};
use crate::parser::model::Family;

/// Fieldless discriminant of [`TypedEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // Serial
    SerialNew,
    SerialOld,
    // Parallel
    ParallelScavenge,
    ParallelSerialOld,
    ParallelCompactingOld,
    // CMS
    ParNew,
    CmsSerialOld,
    CmsInitialMark,
    CmsRemark,
    CmsConcurrent,
    // G1
    G1YoungPause,
    G1MixedPause,
    G1YoungInitialMark,
    G1FullGc,
    G1Remark,
    G1Cleanup,
    G1Concurrent,
    // Shenandoah
    ShenandoahInitMark,
    ShenandoahFinalMark,
    ShenandoahInitUpdate,
    ShenandoahFinalUpdate,
    ShenandoahDegeneratedGc,
    ShenandoahFullGc,
    ShenandoahConcurrent,
    // -verbose:gc without details
    VerboseGcYoung,
    VerboseGcOld,
    // Unified logging
    UnifiedYoung,
    UnifiedOld,
    UnifiedRemark,
    UnifiedCleanup,
    UnifiedConcurrent,
    UnifiedSafepoint,
    // Safepoint / application time
    ApplicationStoppedTime,
    ApplicationConcurrentTime,
    // Informational
    HeaderCommandLineFlags,
    HeaderMemory,
    HeaderVersion,
    GcInfo,
    LogRotation,
    TenuringDistribution,
    ClassUnloading,
    FooterHeap,
    GcOverheadLimit,
    BlankLine,
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SerialNew => "serial_new",
            EventKind::SerialOld => "serial_old",
            EventKind::ParallelScavenge => "parallel_scavenge",
            EventKind::ParallelSerialOld => "parallel_serial_old",
            EventKind::ParallelCompactingOld => "parallel_compacting_old",
            EventKind::ParNew => "par_new",
            EventKind::CmsSerialOld => "cms_serial_old",
            EventKind::CmsInitialMark => "cms_initial_mark",
            EventKind::CmsRemark => "cms_remark",
            EventKind::CmsConcurrent => "cms_concurrent",
            EventKind::G1YoungPause => "g1_young_pause",
            EventKind::G1MixedPause => "g1_mixed_pause",
            EventKind::G1YoungInitialMark => "g1_young_initial_mark",
            EventKind::G1FullGc => "g1_full_gc",
            EventKind::G1Remark => "g1_remark",
            EventKind::G1Cleanup => "g1_cleanup",
            EventKind::G1Concurrent => "g1_concurrent",
            EventKind::ShenandoahInitMark => "shenandoah_init_mark",
            EventKind::ShenandoahFinalMark => "shenandoah_final_mark",
            EventKind::ShenandoahInitUpdate => "shenandoah_init_update",
            EventKind::ShenandoahFinalUpdate => "shenandoah_final_update",
            EventKind::ShenandoahDegeneratedGc => "shenandoah_degenerated_gc",
            EventKind::ShenandoahFullGc => "shenandoah_full_gc",
            EventKind::ShenandoahConcurrent => "shenandoah_concurrent",
            EventKind::VerboseGcYoung => "verbose_gc_young",
            EventKind::VerboseGcOld => "verbose_gc_old",
            EventKind::UnifiedYoung => "unified_young",
            EventKind::UnifiedOld => "unified_old",
            EventKind::UnifiedRemark => "unified_remark",
            EventKind::UnifiedCleanup => "unified_cleanup",
            EventKind::UnifiedConcurrent => "unified_concurrent",
            EventKind::UnifiedSafepoint => "unified_safepoint",
            EventKind::ApplicationStoppedTime => "application_stopped_time",
            EventKind::ApplicationConcurrentTime => "application_concurrent_time",
            EventKind::HeaderCommandLineFlags => "header_command_line_flags",
            EventKind::HeaderMemory => "header_memory",
            EventKind::HeaderVersion => "header_version",
            EventKind::GcInfo => "gc_info",
            EventKind::LogRotation => "log_rotation",
            EventKind::TenuringDistribution => "tenuring_distribution",
            EventKind::ClassUnloading => "class_unloading",
            EventKind::FooterHeap => "footer_heap",
            EventKind::GcOverheadLimit => "gc_overhead_limit",
            EventKind::BlankLine => "blank_line",
            EventKind::Unknown => "unknown",
        }
    }

    /// Collector family, for kinds that belong to one.
    pub fn family(&self) -> Option<Family> {
        use EventKind::*;
        match self {
            SerialNew | SerialOld => Some(Family::Serial),
            ParallelScavenge | ParallelSerialOld | ParallelCompactingOld => Some(Family::Parallel),
            ParNew | CmsSerialOld | CmsInitialMark | CmsRemark | CmsConcurrent => Some(Family::Cms),
            G1YoungPause | G1MixedPause | G1YoungInitialMark | G1FullGc | G1Remark | G1Cleanup
            | G1Concurrent => Some(Family::G1),
            ShenandoahInitMark | ShenandoahFinalMark | ShenandoahInitUpdate
            | ShenandoahFinalUpdate | ShenandoahDegeneratedGc | ShenandoahFullGc
            | ShenandoahConcurrent => Some(Family::Shenandoah),
            UnifiedYoung | UnifiedOld | UnifiedRemark | UnifiedCleanup | UnifiedConcurrent
            | UnifiedSafepoint | GcInfo => Some(Family::Unified),
            _ => None,
        }
    }

    /// Stop-the-world collections and pauses.
    pub fn is_blocking(&self) -> bool {
        use EventKind::*;
        matches!(
            self,
            SerialNew | SerialOld | ParallelScavenge | ParallelSerialOld | ParallelCompactingOld
                | ParNew | CmsSerialOld | CmsInitialMark | CmsRemark | G1YoungPause
                | G1MixedPause | G1YoungInitialMark | G1FullGc | G1Remark | G1Cleanup
                | ShenandoahInitMark | ShenandoahFinalMark | ShenandoahInitUpdate
                | ShenandoahFinalUpdate | ShenandoahDegeneratedGc | ShenandoahFullGc
                | VerboseGcYoung | VerboseGcOld | UnifiedYoung | UnifiedOld | UnifiedRemark
                | UnifiedCleanup
        )
    }
}

/// When an event happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stamp {
    pub datestamp: Option<DateTime<FixedOffset>>,
    /// Time since JVM start
    pub timestamp: Option<Duration>,
}

/// `[Times: user=0.07 sys=0.00, real=0.02 secs]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Times {
    pub user: Duration,
    pub sys: Duration,
    pub real: Duration,
}

/// A stop-the-world collection or pause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub stamp: Stamp,
    pub trigger: Trigger,
    pub duration: Duration,
    pub regions: Vec<RegionSnapshot>,
    pub times: Option<Times>,
    pub anomalies: Vec<Anomaly>,
}

/// How much of the heap a collection covers; decides which region
/// consistency checks apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Young-only collection of a generational heap
    Young,
    /// Young or mixed collection of a region-based heap
    Mixed,
    /// Whole-heap collection
    Full,
    /// A pause that reports no per-generation breakdown
    Pause,
}

impl Collection {
    pub fn new(stamp: Stamp, trigger: Trigger, duration: Duration) -> Self {
        Self {
            stamp,
            trigger,
            duration,
            regions: Vec::new(),
            times: None,
            anomalies: Vec::new(),
        }
    }

    pub fn with_region(mut self, snapshot: RegionSnapshot) -> Self {
        self.regions.retain(|r| r.region != snapshot.region);
        self.regions.push(snapshot);
        self
    }

    pub fn with_times(mut self, times: Option<Times>) -> Self {
        self.times = times;
        self
    }

    /// Derive missing regions and record data-quality anomalies.
    pub fn finish(mut self, scope: Scope) -> Self {
        if matches!(scope, Scope::Young | Scope::Mixed) && self.region(Region::Old).is_none() {
            if let (Some(young), Some(combined)) =
                (self.region(Region::Young), self.region(Region::Combined))
            {
                match combined.minus(Region::Old, young) {
                    Some(old) => {
                        if scope == Scope::Young && old.delta() < 0 {
                            self.anomalies.push(Anomaly::OldShrankDuringYoung);
                        }
                        self.regions.push(old);
                    }
                    None => self
                        .anomalies
                        .push(Anomaly::InconsistentRegions { region: Region::Old }),
                }
            }
        }
        for snapshot in &self.regions {
            for anomaly in snapshot.anomalies() {
                if !self.anomalies.contains(&anomaly) {
                    self.anomalies.push(anomaly);
                }
            }
        }
        self
    }

    pub fn region(&self, region: Region) -> Option<&RegionSnapshot> {
        self.regions.iter().find(|r| r.region == region)
    }
}

/// A concurrent phase running alongside the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Concurrent {
    pub stamp: Stamp,
    pub phase: String,
    pub elapsed: Option<Duration>,
    pub combined: Option<RegionSnapshot>,
    pub times: Option<Times>,
}

/// Time the application was held at a safepoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Safepoint {
    pub stamp: Stamp,
    pub operation: Option<String>,
    pub stopped: Duration,
    /// Time taken to bring threads to the safepoint
    pub reaching: Option<Duration>,
}

/// `Application time: N seconds`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppTime {
    pub stamp: Stamp,
    pub running: Duration,
}

/// Header, footer and other non-collection lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Info {
    pub stamp: Stamp,
    pub text: String,
}

/// A line no grammar recognized, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unrecognized {
    pub stamp: Stamp,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "event", rename_all = "snake_case")]
pub enum TypedEvent {
    SerialNew(Collection),
    SerialOld(Collection),
    ParallelScavenge(Collection),
    ParallelSerialOld(Collection),
    ParallelCompactingOld(Collection),
    ParNew(Collection),
    CmsSerialOld(Collection),
    CmsInitialMark(Collection),
    CmsRemark(Collection),
    CmsConcurrent(Concurrent),
    G1YoungPause(Collection),
    G1MixedPause(Collection),
    G1YoungInitialMark(Collection),
    G1FullGc(Collection),
    G1Remark(Collection),
    G1Cleanup(Collection),
    G1Concurrent(Concurrent),
    ShenandoahInitMark(Collection),
    ShenandoahFinalMark(Collection),
    ShenandoahInitUpdate(Collection),
    ShenandoahFinalUpdate(Collection),
    ShenandoahDegeneratedGc(Collection),
    ShenandoahFullGc(Collection),
    ShenandoahConcurrent(Concurrent),
    VerboseGcYoung(Collection),
    VerboseGcOld(Collection),
    UnifiedYoung(Collection),
    UnifiedOld(Collection),
    UnifiedRemark(Collection),
    UnifiedCleanup(Collection),
    UnifiedConcurrent(Concurrent),
    UnifiedSafepoint(Safepoint),
    ApplicationStoppedTime(Safepoint),
    ApplicationConcurrentTime(AppTime),
    HeaderCommandLineFlags(Info),
    HeaderMemory(Info),
    HeaderVersion(Info),
    GcInfo(Info),
    LogRotation(Info),
    TenuringDistribution(Info),
    ClassUnloading(Info),
    FooterHeap(Info),
    GcOverheadLimit(Info),
    BlankLine(Info),
    Unknown(Unrecognized),
}

impl TypedEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TypedEvent::SerialNew(_) => EventKind::SerialNew,
            TypedEvent::SerialOld(_) => EventKind::SerialOld,
            TypedEvent::ParallelScavenge(_) => EventKind::ParallelScavenge,
            TypedEvent::ParallelSerialOld(_) => EventKind::ParallelSerialOld,
            TypedEvent::ParallelCompactingOld(_) => EventKind::ParallelCompactingOld,
            TypedEvent::ParNew(_) => EventKind::ParNew,
            TypedEvent::CmsSerialOld(_) => EventKind::CmsSerialOld,
            TypedEvent::CmsInitialMark(_) => EventKind::CmsInitialMark,
            TypedEvent::CmsRemark(_) => EventKind::CmsRemark,
            TypedEvent::CmsConcurrent(_) => EventKind::CmsConcurrent,
            TypedEvent::G1YoungPause(_) => EventKind::G1YoungPause,
            TypedEvent::G1MixedPause(_) => EventKind::G1MixedPause,
            TypedEvent::G1YoungInitialMark(_) => EventKind::G1YoungInitialMark,
            TypedEvent::G1FullGc(_) => EventKind::G1FullGc,
            TypedEvent::G1Remark(_) => EventKind::G1Remark,
            TypedEvent::G1Cleanup(_) => EventKind::G1Cleanup,
            TypedEvent::G1Concurrent(_) => EventKind::G1Concurrent,
            TypedEvent::ShenandoahInitMark(_) => EventKind::ShenandoahInitMark,
            TypedEvent::ShenandoahFinalMark(_) => EventKind::ShenandoahFinalMark,
            TypedEvent::ShenandoahInitUpdate(_) => EventKind::ShenandoahInitUpdate,
            TypedEvent::ShenandoahFinalUpdate(_) => EventKind::ShenandoahFinalUpdate,
            TypedEvent::ShenandoahDegeneratedGc(_) => EventKind::ShenandoahDegeneratedGc,
            TypedEvent::ShenandoahFullGc(_) => EventKind::ShenandoahFullGc,
            TypedEvent::ShenandoahConcurrent(_) => EventKind::ShenandoahConcurrent,
            TypedEvent::VerboseGcYoung(_) => EventKind::VerboseGcYoung,
            TypedEvent::VerboseGcOld(_) => EventKind::VerboseGcOld,
            TypedEvent::UnifiedYoung(_) => EventKind::UnifiedYoung,
            TypedEvent::UnifiedOld(_) => EventKind::UnifiedOld,
            TypedEvent::UnifiedRemark(_) => EventKind::UnifiedRemark,
            TypedEvent::UnifiedCleanup(_) => EventKind::UnifiedCleanup,
            TypedEvent::UnifiedConcurrent(_) => EventKind::UnifiedConcurrent,
            TypedEvent::UnifiedSafepoint(_) => EventKind::UnifiedSafepoint,
            TypedEvent::ApplicationStoppedTime(_) => EventKind::ApplicationStoppedTime,
            TypedEvent::ApplicationConcurrentTime(_) => EventKind::ApplicationConcurrentTime,
            TypedEvent::HeaderCommandLineFlags(_) => EventKind::HeaderCommandLineFlags,
            TypedEvent::HeaderMemory(_) => EventKind::HeaderMemory,
            TypedEvent::HeaderVersion(_) => EventKind::HeaderVersion,
            TypedEvent::GcInfo(_) => EventKind::GcInfo,
            TypedEvent::LogRotation(_) => EventKind::LogRotation,
            TypedEvent::TenuringDistribution(_) => EventKind::TenuringDistribution,
            TypedEvent::ClassUnloading(_) => EventKind::ClassUnloading,
            TypedEvent::FooterHeap(_) => EventKind::FooterHeap,
            TypedEvent::GcOverheadLimit(_) => EventKind::GcOverheadLimit,
            TypedEvent::BlankLine(_) => EventKind::BlankLine,
            TypedEvent::Unknown(_) => EventKind::Unknown,
        }
    }

    /// Wrap a collection payload in the variant for `kind`.
    pub fn from_collection(kind: EventKind, c: Collection) -> Option<Self> {
        Some(match kind {
            EventKind::SerialNew => TypedEvent::SerialNew(c),
            EventKind::SerialOld => TypedEvent::SerialOld(c),
            EventKind::ParallelScavenge => TypedEvent::ParallelScavenge(c),
            EventKind::ParallelSerialOld => TypedEvent::ParallelSerialOld(c),
            EventKind::ParallelCompactingOld => TypedEvent::ParallelCompactingOld(c),
            EventKind::ParNew => TypedEvent::ParNew(c),
            EventKind::CmsSerialOld => TypedEvent::CmsSerialOld(c),
            EventKind::CmsInitialMark => TypedEvent::CmsInitialMark(c),
            EventKind::CmsRemark => TypedEvent::CmsRemark(c),
            EventKind::G1YoungPause => TypedEvent::G1YoungPause(c),
            EventKind::G1MixedPause => TypedEvent::G1MixedPause(c),
            EventKind::G1YoungInitialMark => TypedEvent::G1YoungInitialMark(c),
            EventKind::G1FullGc => TypedEvent::G1FullGc(c),
            EventKind::G1Remark => TypedEvent::G1Remark(c),
            EventKind::G1Cleanup => TypedEvent::G1Cleanup(c),
            EventKind::ShenandoahInitMark => TypedEvent::ShenandoahInitMark(c),
            EventKind::ShenandoahFinalMark => TypedEvent::ShenandoahFinalMark(c),
            EventKind::ShenandoahInitUpdate => TypedEvent::ShenandoahInitUpdate(c),
            EventKind::ShenandoahFinalUpdate => TypedEvent::ShenandoahFinalUpdate(c),
            EventKind::ShenandoahDegeneratedGc => TypedEvent::ShenandoahDegeneratedGc(c),
            EventKind::ShenandoahFullGc => TypedEvent::ShenandoahFullGc(c),
            EventKind::VerboseGcYoung => TypedEvent::VerboseGcYoung(c),
            EventKind::VerboseGcOld => TypedEvent::VerboseGcOld(c),
            EventKind::UnifiedYoung => TypedEvent::UnifiedYoung(c),
            EventKind::UnifiedOld => TypedEvent::UnifiedOld(c),
            EventKind::UnifiedRemark => TypedEvent::UnifiedRemark(c),
            EventKind::UnifiedCleanup => TypedEvent::UnifiedCleanup(c),
            _ => return None,
        })
    }

    pub fn from_concurrent(kind: EventKind, c: Concurrent) -> Option<Self> {
        Some(match kind {
            EventKind::CmsConcurrent => TypedEvent::CmsConcurrent(c),
            EventKind::G1Concurrent => TypedEvent::G1Concurrent(c),
            EventKind::ShenandoahConcurrent => TypedEvent::ShenandoahConcurrent(c),
            EventKind::UnifiedConcurrent => TypedEvent::UnifiedConcurrent(c),
            _ => return None,
        })
    }

    pub fn from_info(kind: EventKind, i: Info) -> Option<Self> {
        Some(match kind {
            EventKind::HeaderCommandLineFlags => TypedEvent::HeaderCommandLineFlags(i),
            EventKind::HeaderMemory => TypedEvent::HeaderMemory(i),
            EventKind::HeaderVersion => TypedEvent::HeaderVersion(i),
            EventKind::GcInfo => TypedEvent::GcInfo(i),
            EventKind::LogRotation => TypedEvent::LogRotation(i),
            EventKind::TenuringDistribution => TypedEvent::TenuringDistribution(i),
            EventKind::ClassUnloading => TypedEvent::ClassUnloading(i),
            EventKind::FooterHeap => TypedEvent::FooterHeap(i),
            EventKind::GcOverheadLimit => TypedEvent::GcOverheadLimit(i),
            EventKind::BlankLine => TypedEvent::BlankLine(i),
            _ => return None,
        })
    }

    pub fn unknown(stamp: Stamp, text: impl Into<String>) -> Self {
        TypedEvent::Unknown(Unrecognized { stamp, text: text.into() })
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypedEvent::Unknown(_))
    }

    /// Collection payload of blocking events.
    pub fn as_collection(&self) -> Option<&Collection> {
        use TypedEvent::*;
        match self {
            SerialNew(c) | SerialOld(c) | ParallelScavenge(c) | ParallelSerialOld(c)
            | ParallelCompactingOld(c) | ParNew(c) | CmsSerialOld(c) | CmsInitialMark(c)
            | CmsRemark(c) | G1YoungPause(c) | G1MixedPause(c) | G1YoungInitialMark(c)
            | G1FullGc(c) | G1Remark(c) | G1Cleanup(c) | ShenandoahInitMark(c)
            | ShenandoahFinalMark(c) | ShenandoahInitUpdate(c) | ShenandoahFinalUpdate(c)
            | ShenandoahDegeneratedGc(c) | ShenandoahFullGc(c) | VerboseGcYoung(c)
            | VerboseGcOld(c) | UnifiedYoung(c) | UnifiedOld(c) | UnifiedRemark(c)
            | UnifiedCleanup(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_concurrent(&self) -> Option<&Concurrent> {
        use TypedEvent::*;
        match self {
            CmsConcurrent(c) | G1Concurrent(c) | ShenandoahConcurrent(c) | UnifiedConcurrent(c) => {
                Some(c)
            }
            _ => None,
        }
    }

    pub fn as_safepoint(&self) -> Option<&Safepoint> {
        match self {
            TypedEvent::UnifiedSafepoint(s) | TypedEvent::ApplicationStoppedTime(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_info(&self) -> Option<&Info> {
        use TypedEvent::*;
        match self {
            HeaderCommandLineFlags(i) | HeaderMemory(i) | HeaderVersion(i) | GcInfo(i)
            | LogRotation(i) | TenuringDistribution(i) | ClassUnloading(i) | FooterHeap(i)
            | GcOverheadLimit(i) | BlankLine(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_timestamped(&self) -> &dyn HasTimestamp {
        use TypedEvent::*;
        match self {
            SerialNew(c) | SerialOld(c) | ParallelScavenge(c) | ParallelSerialOld(c)
            | ParallelCompactingOld(c) | ParNew(c) | CmsSerialOld(c) | CmsInitialMark(c)
            | CmsRemark(c) | G1YoungPause(c) | G1MixedPause(c) | G1YoungInitialMark(c)
            | G1FullGc(c) | G1Remark(c) | G1Cleanup(c) | ShenandoahInitMark(c)
            | ShenandoahFinalMark(c) | ShenandoahInitUpdate(c) | ShenandoahFinalUpdate(c)
            | ShenandoahDegeneratedGc(c) | ShenandoahFullGc(c) | VerboseGcYoung(c)
            | VerboseGcOld(c) | UnifiedYoung(c) | UnifiedOld(c) | UnifiedRemark(c)
            | UnifiedCleanup(c) => c,
            CmsConcurrent(c) | G1Concurrent(c) | ShenandoahConcurrent(c) | UnifiedConcurrent(c) => c,
            UnifiedSafepoint(s) | ApplicationStoppedTime(s) => s,
            ApplicationConcurrentTime(a) => a,
            HeaderCommandLineFlags(i) | HeaderMemory(i) | HeaderVersion(i) | GcInfo(i)
            | LogRotation(i) | TenuringDistribution(i) | ClassUnloading(i) | FooterHeap(i)
            | GcOverheadLimit(i) | BlankLine(i) => i,
            Unknown(u) => u,
        }
    }

    pub fn as_duration(&self) -> Option<&dyn HasDuration> {
        if let Some(c) = self.as_collection() {
            return Some(c);
        }
        if let Some(s) = self.as_safepoint() {
            return Some(s);
        }
        match self {
            TypedEvent::ApplicationConcurrentTime(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_regions(&self) -> Option<&dyn HasRegions> {
        self.as_collection().map(|c| c as &dyn HasRegions)
    }

    pub fn as_trigger(&self) -> Option<&dyn HasTrigger> {
        self.as_collection().map(|c| c as &dyn HasTrigger)
    }

    pub fn as_times(&self) -> Option<&dyn HasTimes> {
        if let Some(c) = self.as_collection() {
            return Some(c);
        }
        self.as_concurrent().map(|c| c as &dyn HasTimes)
    }

    pub fn stamp(&self) -> Stamp {
        *self.as_timestamped().stamp()
    }

    pub fn timestamp(&self) -> Option<Duration> {
        self.as_timestamped().timestamp()
    }

    /// Stop-the-world time attributed to this event.
    pub fn pause(&self) -> Option<Duration> {
        if self.kind().is_blocking() {
            self.as_duration().map(|d| d.duration())
        } else {
            None
        }
    }
}

// ─── Capability traits ──────────────────────────────────────────────

pub trait HasTimestamp {
    fn stamp(&self) -> &Stamp;

    fn timestamp(&self) -> Option<Duration> {
        self.stamp().timestamp
    }
}

pub trait HasDuration {
    fn duration(&self) -> Duration;
}

pub trait HasRegions {
    fn regions(&self) -> &[RegionSnapshot];

    fn region(&self, region: Region) -> Option<&RegionSnapshot> {
        self.regions().iter().find(|r| r.region == region)
    }
}

pub trait HasTrigger {
    fn trigger(&self) -> Trigger;
}

pub trait HasTimes {
    fn times(&self) -> Option<&Times>;
}

impl HasTimestamp for Collection {
    fn stamp(&self) -> &Stamp {
        &self.stamp
    }
}

impl HasTimestamp for Concurrent {
    fn stamp(&self) -> &Stamp {
        &self.stamp
    }
}

impl HasTimestamp for Safepoint {
    fn stamp(&self) -> &Stamp {
        &self.stamp
    }
}

impl HasTimestamp for AppTime {
    fn stamp(&self) -> &Stamp {
        &self.stamp
    }
}

impl HasTimestamp for Info {
    fn stamp(&self) -> &Stamp {
        &self.stamp
    }
}

impl HasTimestamp for Unrecognized {
    fn stamp(&self) -> &Stamp {
        &self.stamp
    }
}

impl HasDuration for Collection {
    fn duration(&self) -> Duration {
        self.duration
    }
}

impl HasDuration for Safepoint {
    fn duration(&self) -> Duration {
        self.stopped
    }
}

impl HasDuration for AppTime {
    fn duration(&self) -> Duration {
        self.running
    }
}

impl HasRegions for Collection {
    fn regions(&self) -> &[RegionSnapshot] {
        &self.regions
    }
}

impl HasTrigger for Collection {
    fn trigger(&self) -> Trigger {
        self.trigger
    }
}

impl HasTimes for Collection {
    fn times(&self) -> Option<&Times> {
        self.times.as_ref()
    }
}

impl HasTimes for Concurrent {
    fn times(&self) -> Option<&Times> {
        self.times.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::memory::Memory;

    fn k(n: u64) -> Memory {
        Memory::from_kilobytes(n)
    }

    fn stamp(ms: u64) -> Stamp {
        Stamp { datestamp: None, timestamp: Some(Duration::from_millis(ms)) }
    }

    #[test]
    fn test_young_collection_derives_old() {
        let c = Collection::new(stamp(1), Trigger::AllocationFailure, Duration::from_millis(5))
            .with_region(RegionSnapshot::new(Region::Young, k(86_199), k(8_454), k(92_160)))
            .with_region(RegionSnapshot::new(Region::Combined, k(1_973_018), k(1_895_536), k(3_574_784)))
            .finish(Scope::Young);

        let old = c.region(Region::Old).unwrap();
        assert_eq!(old.before, k(1_886_819));
        assert_eq!(old.after, k(1_887_082));
        assert!(c.anomalies.is_empty());
    }

    #[test]
    fn test_old_shrinking_in_young_collection_is_flagged() {
        let c = Collection::new(stamp(1), Trigger::AllocationFailure, Duration::from_millis(5))
            .with_region(RegionSnapshot::new(Region::Young, k(100), k(10), k(200)))
            .with_region(RegionSnapshot::new(Region::Combined, k(1_000), k(500), k(2_000)))
            .finish(Scope::Young);
        assert_eq!(c.anomalies, vec![Anomaly::OldShrankDuringYoung]);
    }

    #[test]
    fn test_young_above_combined_is_inconsistent() {
        let c = Collection::new(stamp(1), Trigger::Unknown, Duration::from_millis(5))
            .with_region(RegionSnapshot::new(Region::Young, k(100), k(10), k(200)))
            .with_region(RegionSnapshot::new(Region::Combined, k(50), k(20), k(2_000)))
            .finish(Scope::Mixed);
        assert_eq!(c.anomalies, vec![Anomaly::InconsistentRegions { region: Region::Old }]);
        assert!(c.region(Region::Old).is_none());
    }

    #[test]
    fn test_full_scope_does_not_derive() {
        let c = Collection::new(stamp(1), Trigger::SystemGc, Duration::from_millis(5))
            .with_region(RegionSnapshot::new(Region::Young, k(100), k(0), k(200)))
            .with_region(RegionSnapshot::new(Region::Combined, k(1_000), k(500), k(2_000)))
            .finish(Scope::Full);
        assert!(c.region(Region::Old).is_none());
    }

    #[test]
    fn test_capability_accessors() {
        let c = Collection::new(stamp(42), Trigger::SystemGc, Duration::from_millis(7));
        let event = TypedEvent::from_collection(EventKind::SerialOld, c).unwrap();

        assert_eq!(event.kind(), EventKind::SerialOld);
        assert_eq!(event.timestamp(), Some(Duration::from_millis(42)));
        assert_eq!(event.pause(), Some(Duration::from_millis(7)));
        assert_eq!(event.as_trigger().unwrap().trigger(), Trigger::SystemGc);
        assert!(event.as_regions().unwrap().regions().is_empty());
        assert_eq!(event.kind().family(), Some(Family::Serial));
    }

    #[test]
    fn test_wrong_payload_kind_is_rejected() {
        let c = Collection::new(stamp(1), Trigger::Unknown, Duration::ZERO);
        assert!(TypedEvent::from_collection(EventKind::CmsConcurrent, c).is_none());
        let info = Info { stamp: Stamp::default(), text: String::new() };
        assert!(TypedEvent::from_info(EventKind::SerialNew, info).is_none());
    }

    #[test]
    fn test_app_time_is_not_a_pause() {
        let event = TypedEvent::ApplicationConcurrentTime(AppTime {
            stamp: stamp(1),
            running: Duration::from_secs(1),
        });
        assert_eq!(event.pause(), None);
        assert_eq!(event.as_duration().unwrap().duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_unknown_serializes_with_kind_tag() {
        let json = serde_json::to_string(&TypedEvent::unknown(Stamp::default(), "garbage")).unwrap();
        assert!(json.contains(r#""kind":"unknown""#));
        assert!(json.contains("garbage"));
    }
}
