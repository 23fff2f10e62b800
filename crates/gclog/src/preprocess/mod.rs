/// Preprocessing: turn physical log lines into logical records
///
/// # Architecture
///
/// - `stamp.rs`: collapse duplicated datestamp/timestamp decorators
/// - `context.rs`: per-file rolling state (open record, deferred fragments, flags)
/// - `families/`: one line matcher per collector family plus cross-cutting ones
/// - `driver.rs`: the sequential state machine over one file
///
/// ```text
/// RawLine ─► StampNormalizer ─► LineMatcher (owner first, then by priority)
///                                  │
///                                  ├─ Emit / Complete ─► NormalizedLine ─► Classifier
///                                  ├─ Accumulate (record stays open in Context)
///                                  └─ Ignore
/// ```

pub mod context;
pub mod stamp;
pub mod families;
pub mod driver;

pub use context::{Context, Flags};
pub use driver::{Driver, Preprocessed};

use crate::parser::model::{Family, GcLogError};
use families::{
    CmsMatcher, G1Matcher, HeapAtGcMatcher, ParallelMatcher, SerialMatcher, ShenandoahMatcher,
    TimeLimitMatcher, UnifiedMatcher,
};
use stamp::StampNormalizer;

/// What a matcher did with the line(s) it was handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassembly {
    /// A complete line that stands on its own
    Emit { text: String, consumed: usize },
    /// The open record in the context is finished
    Complete { consumed: usize },
    /// Folded into the open record, or queued as a deferred fragment
    Accumulate { consumed: usize },
    /// Detail output with no analytic value
    Ignore { consumed: usize },
}

impl Reassembly {
    pub fn consumed(&self) -> usize {
        match self {
            Reassembly::Emit { consumed, .. }
            | Reassembly::Complete { consumed }
            | Reassembly::Accumulate { consumed }
            | Reassembly::Ignore { consumed } => *consumed,
        }
    }
}

/// One collector family's knowledge of how its records are laid out.
pub trait LineMatcher: Send + Sync {
    fn family(&self) -> Family;

    /// Cheap structural check; never consumes input.
    fn matches(&self, line: &str, ctx: &Context) -> bool;

    /// Reassemble starting at `line`. `next` is the following physical line
    /// (already stamp-normalized) for matchers that join two lines.
    fn reassemble(&self, line: &str, next: Option<&str>, ctx: &mut Context) -> Reassembly;
}

/// Stamp normalizer plus the family matchers in priority order.
///
/// Shared read-only across files.
pub struct MatcherSet {
    stamps: StampNormalizer,
    matchers: Vec<Box<dyn LineMatcher>>,
}

impl MatcherSet {
    pub fn new() -> Result<Self, GcLogError> {
        let matchers: Vec<Box<dyn LineMatcher>> = vec![
            // Order matters! Cross-cutting matchers wrap any family's records
            Box::new(HeapAtGcMatcher::new()?),
            Box::new(TimeLimitMatcher::new()?),
            Box::new(UnifiedMatcher::new()?),
            Box::new(G1Matcher::new()?),
            Box::new(CmsMatcher::new()?),
            Box::new(ParallelMatcher::new()?),
            Box::new(SerialMatcher::new()?),
            Box::new(ShenandoahMatcher::new()?),
        ];
        Ok(Self {
            stamps: StampNormalizer::new()?,
            matchers,
        })
    }

    pub fn stamps(&self) -> &StampNormalizer {
        &self.stamps
    }

    /// The matcher responsible for records of `family`.
    pub fn owner(&self, family: Family) -> Option<&dyn LineMatcher> {
        self.matchers
            .iter()
            .find(|m| m.family() == family)
            .map(|m| m.as_ref())
    }

    /// First matcher, in priority order, that claims `line`.
    pub fn claim(&self, line: &str, ctx: &Context) -> Option<&dyn LineMatcher> {
        self.matchers
            .iter()
            .find(|m| m.matches(line, ctx))
            .map(|m| m.as_ref())
    }

    pub fn families(&self) -> impl Iterator<Item = Family> + '_ {
        self.matchers.iter().map(|m| m.family())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_matcher_per_family() {
        let set = MatcherSet::new().unwrap();
        let families: Vec<_> = set.families().collect();
        let unique: std::collections::HashSet<_> = families.iter().collect();
        assert_eq!(families.len(), unique.len());
        assert_eq!(families.len(), 8);
        assert_eq!(families[0], Family::HeapAtGc);
    }

    #[test]
    fn test_owner_lookup() {
        let set = MatcherSet::new().unwrap();
        assert_eq!(set.owner(Family::Cms).map(|m| m.family()), Some(Family::Cms));
    }

    #[test]
    fn test_unclaimed_line() {
        let set = MatcherSet::new().unwrap();
        let ctx = Context::new();
        assert!(set.claim("Exception in thread \"main\" java.lang.OutOfMemoryError", &ctx).is_none());
        assert!(set.claim("2.000: [GC (Allocation Failure) 2.000: [ParNew: 1K->0K(2K), 0.1 secs]", &ctx).is_none());
    }

    #[test]
    fn test_reassembly_consumed() {
        assert_eq!(Reassembly::Emit { text: String::new(), consumed: 2 }.consumed(), 2);
        assert_eq!(Reassembly::Ignore { consumed: 1 }.consumed(), 1);
    }
}
