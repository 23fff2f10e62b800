//! Shenandoah — skip the heuristics chatter printed between pauses.
//!
//! JDK 8 Shenandoah writes free-set, pacer and CSet selection reports as bare
//! lines. The distinctive ones are always dropped; generic-looking ones only
//! when the last event came from Shenandoah.

use regex::Regex;

use crate::parser::model::{compile, Family, GcLogError};
use crate::preprocess::{Context, LineMatcher, Reassembly};

pub struct ShenandoahMatcher {
    distinctive: Regex,
    contextual: Regex,
}

impl ShenandoahMatcher {
    pub fn new() -> Result<Self, GcLogError> {
        Ok(Self {
            distinctive: compile(
                "shenandoah_distinctive",
                r"^\s*(?:Pacer for |Adaptive CSet Selection\. |Free: \d+[BKMG] \(\d+ regions\)|Evacuation Reserve: |Collectable Garbage: |Concurrent marking triggered\. |Learning \d+ of \d+\. )",
            )?,
            contextual: compile(
                "shenandoah_contextual",
                r"^\s*(?:Trigger: |Cancelling GC: |Failed to allocate |Uncommitted \d+[BKMG]\. |Using \d+ of \d+ workers for |Periodic GC triggered|Good progress for |Free headroom: |Immediate Garbage: )",
            )?,
        })
    }
}

impl LineMatcher for ShenandoahMatcher {
    fn family(&self) -> Family {
        Family::Shenandoah
    }

    fn matches(&self, line: &str, ctx: &Context) -> bool {
        self.distinctive.is_match(line)
            || (ctx.prior_family() == Some(Family::Shenandoah) && self.contextual.is_match(line))
    }

    fn reassemble(&self, _line: &str, _next: Option<&str>, _ctx: &mut Context) -> Reassembly {
        Reassembly::Ignore { consumed: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::model::EventKind;

    #[test]
    fn test_distinctive_lines_always_match() {
        let matcher = ShenandoahMatcher::new().unwrap();
        let ctx = Context::new();
        for line in [
            "Pacer for Mark. Expected Live: 6M, Free: 44M, Non-Taxable: 4M, Alloc Tax Rate: 0.5x",
            "Adaptive CSet Selection. Target Free: 6M, Actual Free: 52M, Max CSet: 2M, Min Garbage: 0B",
            "Free: 45M (46 regions), Max regular: 1024K, Max humongous: 45056K, External frag: 3%, Internal frag: 0%",
            "Collectable Garbage: 3M (20%), Immediate Garbage: 0B (0%), CSet: 3M (20%)",
        ] {
            assert!(matcher.matches(line, &ctx), "{line}");
        }
    }

    #[test]
    fn test_contextual_lines_need_shenandoah_prior() {
        let matcher = ShenandoahMatcher::new().unwrap();
        let mut ctx = Context::new();
        let line = "Trigger: Free (45 MB) is below minimum threshold (51 MB)";
        assert!(!matcher.matches(line, &ctx));

        ctx.set_prior_event(EventKind::ShenandoahFinalMark);
        assert!(matcher.matches(line, &ctx));
        assert!(matcher.matches("Using 2 of 4 workers for concurrent marking", &ctx));

        ctx.set_prior_event(EventKind::G1YoungPause);
        assert!(!matcher.matches(line, &ctx));
    }

    #[test]
    fn test_pauses_are_not_claimed() {
        let matcher = ShenandoahMatcher::new().unwrap();
        let mut ctx = Context::new();
        ctx.set_prior_event(EventKind::ShenandoahInitMark);
        assert!(!matcher.matches("0.427: [Pause Init Mark, 0.243 ms]", &ctx));
    }
}
