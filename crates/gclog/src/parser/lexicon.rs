//! Lexicon — resolve the cause of a collection from its log text.
//!
//! A single line can carry several cause phrases at once, e.g. a
//! `promotion failed` young collection that escalated into a
//! `concurrent mode failure`. The table is ordered so the more specific (and
//! more severe) phrase wins: failure phrases first, then explicit requests,
//! then routine causes.

use serde::{Deserialize, Serialize};

use super::model::GcLogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    ConcurrentModeFailure,
    ConcurrentModeInterrupted,
    ToSpaceExhausted,
    ToSpaceOverflow,
    PromotionFailed,
    GcOverheadLimit,
    EvacuationFailurePinned,
    EvacuationFailure,
    MetadataGcClearSoftReferences,
    MetadataGcThreshold,
    LastDitchCollection,
    GcLocker,
    SystemGc,
    HeapInspection,
    HeapDump,
    JvmtiForceGc,
    DiagnosticCommand,
    G1EvacuationPause,
    G1HumongousAllocation,
    G1CompactionPause,
    G1PreventiveCollection,
    G1PeriodicCollection,
    CmsInitialMark,
    CmsFinalRemark,
    CmsConcurrentMark,
    Ergonomics,
    AllocationFailure,
    AllocationContextStats,
    OutsideOfCycle,
    Unknown,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::ConcurrentModeFailure => "concurrent_mode_failure",
            Trigger::ConcurrentModeInterrupted => "concurrent_mode_interrupted",
            Trigger::ToSpaceExhausted => "to_space_exhausted",
            Trigger::ToSpaceOverflow => "to_space_overflow",
            Trigger::PromotionFailed => "promotion_failed",
            Trigger::GcOverheadLimit => "gc_overhead_limit",
            Trigger::EvacuationFailurePinned => "evacuation_failure_pinned",
            Trigger::EvacuationFailure => "evacuation_failure",
            Trigger::MetadataGcClearSoftReferences => "metadata_gc_clear_soft_references",
            Trigger::MetadataGcThreshold => "metadata_gc_threshold",
            Trigger::LastDitchCollection => "last_ditch_collection",
            Trigger::GcLocker => "gc_locker",
            Trigger::SystemGc => "system_gc",
            Trigger::HeapInspection => "heap_inspection",
            Trigger::HeapDump => "heap_dump",
            Trigger::JvmtiForceGc => "jvmti_force_gc",
            Trigger::DiagnosticCommand => "diagnostic_command",
            Trigger::G1EvacuationPause => "g1_evacuation_pause",
            Trigger::G1HumongousAllocation => "g1_humongous_allocation",
            Trigger::G1CompactionPause => "g1_compaction_pause",
            Trigger::G1PreventiveCollection => "g1_preventive_collection",
            Trigger::G1PeriodicCollection => "g1_periodic_collection",
            Trigger::CmsInitialMark => "cms_initial_mark",
            Trigger::CmsFinalRemark => "cms_final_remark",
            Trigger::CmsConcurrentMark => "cms_concurrent_mark",
            Trigger::Ergonomics => "ergonomics",
            Trigger::AllocationFailure => "allocation_failure",
            Trigger::AllocationContextStats => "allocation_context_stats",
            Trigger::OutsideOfCycle => "outside_of_cycle",
            Trigger::Unknown => "unknown",
        }
    }

    /// Collections caused by the collector running out of room.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Trigger::ConcurrentModeFailure
                | Trigger::ConcurrentModeInterrupted
                | Trigger::ToSpaceExhausted
                | Trigger::ToSpaceOverflow
                | Trigger::PromotionFailed
                | Trigger::GcOverheadLimit
                | Trigger::EvacuationFailurePinned
                | Trigger::EvacuationFailure
        )
    }
}

/// Priority-ordered phrase table. First match wins.
const LEXICON: &[(&str, Trigger)] = &[
    // Failures
    ("concurrent mode failure", Trigger::ConcurrentModeFailure),
    ("concurrent mode interrupted", Trigger::ConcurrentModeInterrupted),
    ("to-space exhausted", Trigger::ToSpaceExhausted),
    ("to-space overflow", Trigger::ToSpaceOverflow),
    ("promotion failed", Trigger::PromotionFailed),
    ("GC time would exceed GCTimeLimit", Trigger::GcOverheadLimit),
    ("GC time is exceeding GCTimeLimit", Trigger::GcOverheadLimit),
    ("Evacuation Failure: Pinned", Trigger::EvacuationFailurePinned),
    ("Evacuation Failure", Trigger::EvacuationFailure),
    // Metadata and explicit requests
    ("Metadata GC Clear Soft References", Trigger::MetadataGcClearSoftReferences),
    ("Metadata GC Threshold", Trigger::MetadataGcThreshold),
    ("Last ditch collection", Trigger::LastDitchCollection),
    ("GCLocker Initiated GC", Trigger::GcLocker),
    ("System.gc()", Trigger::SystemGc),
    ("(System)", Trigger::SystemGc),
    ("Heap Inspection Initiated GC", Trigger::HeapInspection),
    ("Heap Dump Initiated GC", Trigger::HeapDump),
    ("JvmtiEnv ForceGarbageCollection", Trigger::JvmtiForceGc),
    ("Diagnostic Command", Trigger::DiagnosticCommand),
    // Routine
    ("G1 Evacuation Pause", Trigger::G1EvacuationPause),
    ("G1 Humongous Allocation", Trigger::G1HumongousAllocation),
    ("G1 Compaction Pause", Trigger::G1CompactionPause),
    ("G1 Preventive Collection", Trigger::G1PreventiveCollection),
    ("G1 Periodic Collection", Trigger::G1PeriodicCollection),
    ("CMS Initial Mark", Trigger::CmsInitialMark),
    ("CMS Final Remark", Trigger::CmsFinalRemark),
    ("CMS Concurrent Mark", Trigger::CmsConcurrentMark),
    ("Ergonomics", Trigger::Ergonomics),
    ("Allocation Failure", Trigger::AllocationFailure),
    ("Update Allocation Context Stats", Trigger::AllocationContextStats),
    ("Outside of Cycle", Trigger::OutsideOfCycle),
];

/// Resolve the trigger of a whole (normalized) line.
pub fn resolve(text: &str) -> Trigger {
    LEXICON
        .iter()
        .find(|(phrase, _)| text.contains(phrase))
        .map(|(_, trigger)| *trigger)
        .unwrap_or(Trigger::Unknown)
}

/// Check that no phrase is shadowed by a shorter phrase listed before it.
pub fn validate() -> Result<(), GcLogError> {
    validate_table(LEXICON)
}

fn validate_table(table: &[(&str, Trigger)]) -> Result<(), GcLogError> {
    for (i, (earlier, _)) in table.iter().enumerate() {
        if let Some((later, _)) = table[i + 1..]
            .iter()
            .find(|(later, _)| later.contains(earlier))
        {
            return Err(GcLogError::LexiconOrder(format!(
                "{later:?} is shadowed by {earlier:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_ordered() {
        assert!(validate().is_ok());
    }

    #[test]
    fn test_shadowed_phrase_is_rejected() {
        let table = [
            ("Evacuation Failure", Trigger::EvacuationFailure),
            ("Evacuation Failure: Pinned", Trigger::EvacuationFailurePinned),
        ];
        assert!(matches!(validate_table(&table), Err(GcLogError::LexiconOrder(_))));
    }

    #[test]
    fn test_failure_outranks_routine_cause() {
        let line = "[GC (Allocation Failure) 1.2: [ParNew (promotion failed): 1K->2K(3K), 0.1 secs]1.3: [CMS (concurrent mode failure): 4K->5K(6K), 0.5 secs] 7K->5K(9K), [Metaspace: 1K->1K(2K)], 0.6 secs]";
        assert_eq!(resolve(line), Trigger::ConcurrentModeFailure);
    }

    #[test]
    fn test_pinned_evacuation_failure() {
        let line = "GC(12) Pause Young (Normal) (G1 Evacuation Pause) (Evacuation Failure: Pinned) 24M->20M(256M) 3.523ms";
        assert_eq!(resolve(line), Trigger::EvacuationFailurePinned);
    }

    #[test]
    fn test_system_gc_both_spellings() {
        assert_eq!(resolve("[Full GC (System.gc()) 1K->1K(2K), 0.1 secs]"), Trigger::SystemGc);
        assert_eq!(resolve("[Full GC (System) [PSYoungGen: 1K->0K(2K)]"), Trigger::SystemGc);
    }

    #[test]
    fn test_no_phrase_is_unknown() {
        assert_eq!(resolve("[GC 1K->0K(2K), 0.1 secs]"), Trigger::Unknown);
        assert!(!Trigger::Unknown.is_failure());
        assert!(Trigger::ToSpaceExhausted.is_failure());
    }
}
