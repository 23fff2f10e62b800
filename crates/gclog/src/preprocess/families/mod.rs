/// Line matchers, one per collector family plus two cross-cutting ones
///
/// # Architecture
///
/// - `heap_at_gc.rs`: `-XX:+PrintHeapAtGC` dumps wrapped around any collection
/// - `time_limit.rs`: GC overhead warnings that split Parallel full GCs
/// - `unified.rs`: JDK 9+ unified logging detail tags
/// - `g1.rs`, `cms.rs`, `parallel.rs`, `serial.rs`, `shenandoah.rs`: legacy
///   collector output
///
/// Several families share one shape: a stop-the-world record whose start line
/// stops mid collector tag and whose sizes arrive on a later line. That shape
/// lives in [`SplitRecord`].

pub mod heap_at_gc;
pub mod time_limit;
pub mod unified;
pub mod g1;
pub mod cms;
pub mod parallel;
pub mod serial;
pub mod shenandoah;

pub use heap_at_gc::HeapAtGcMatcher;
pub use time_limit::TimeLimitMatcher;
pub use unified::UnifiedMatcher;
pub use g1::G1Matcher;
pub use cms::CmsMatcher;
pub use parallel::ParallelMatcher;
pub use serial::SerialMatcher;
pub use shenandoah::ShenandoahMatcher;

use regex::Regex;

use super::{Context, Reassembly};
use crate::parser::model::{compile, Family, GcLogError};
use crate::parser::{DATESTAMP, TIMESTAMP};

/// Optional legacy decorator (`DS: TS: `) in front of `body`.
pub(crate) fn decorated(body: &str) -> String {
    format!(r"(?:{DATESTAMP}: ?)?(?:{TIMESTAMP}: ?)?{body}")
}

/// `-XX:+PrintTenuringDistribution` output printed inside a young collection.
pub(crate) const TENURING: &str = r"^(?:Desired survivor size \d+ bytes, new threshold \d+ \(max(?: threshold)? \d+\)|- age +\d+: +\d+ bytes, +\d+ total)\s*$";

/// A `[Times: ...]` block on a line of its own.
pub(crate) const TRAILING_TIMES: &str = r"^\s*\[Times: user=[\d.,]+ sys=[\d.,]+, real=[\d.,]+ secs\]\s*$";

/// A record split across physical lines.
///
/// `start` must capture the opening fragment as `record` and may capture an
/// interleaved concurrent fragment on the same line as `conc`. While the
/// record is open, `continuation` closes it, `interleaved` lines are deferred
/// until it closes and `noise` lines are skipped.
pub(crate) struct SplitRecord {
    family: Family,
    start: Regex,
    continuation: Regex,
    interleaved: Option<Regex>,
    noise: Vec<Regex>,
}

impl SplitRecord {
    pub fn new(
        family: Family,
        start: &str,
        continuation: &str,
        interleaved: Option<&str>,
        noise: &[&str],
    ) -> Result<Self, GcLogError> {
        Ok(Self {
            family,
            start: compile("split_record_start", start)?,
            continuation: compile("split_record_continuation", continuation)?,
            interleaved: interleaved
                .map(|p| compile("split_record_interleaved", p))
                .transpose()?,
            noise: noise
                .iter()
                .map(|p| compile("split_record_noise", p))
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn starts(&self, line: &str) -> bool {
        self.start.is_match(line)
    }

    fn interleaves(&self, line: &str) -> bool {
        self.interleaved.as_ref().is_some_and(|re| re.is_match(line))
    }

    fn is_noise(&self, line: &str) -> bool {
        self.noise.iter().any(|re| re.is_match(line))
    }

    /// Start line when idle; continuation, interleaved or noise when open.
    pub fn matches(&self, line: &str, ctx: &Context) -> bool {
        if ctx.in_record(self.family) {
            self.continuation.is_match(line) || self.interleaves(line) || self.is_noise(line)
        } else {
            self.starts(line)
        }
    }

    pub fn reassemble(&self, line: &str, ctx: &mut Context) -> Reassembly {
        if ctx.in_record(self.family) {
            if self.continuation.is_match(line) {
                ctx.append(line);
                return Reassembly::Complete { consumed: 1 };
            }
            if self.interleaves(line) {
                tracing::trace!(
                    family = self.family.as_str(),
                    line = ctx.cursor(),
                    "preprocess: deferring interleaved fragment"
                );
                ctx.defer(line);
                return Reassembly::Accumulate { consumed: 1 };
            }
            return Reassembly::Ignore { consumed: 1 };
        }

        let Some(caps) = self.start.captures(line) else {
            return Reassembly::Emit { text: line.to_string(), consumed: 1 };
        };
        ctx.begin_record(self.family, &caps["record"]);
        if let Some(conc) = caps.name("conc") {
            ctx.defer(conc.as_str());
        }
        Reassembly::Accumulate { consumed: 1 }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn cms_like() -> SplitRecord {
        SplitRecord::new(
            Family::Cms,
            &format!(r"^(?P<record>{}\[GC.*?\[ParNew)(?P<conc>{}\[CMS-concurrent-.*)?$", decorated(""), decorated("")),
            r"^: \d",
            Some(&format!(r"^{}\[CMS-concurrent-", decorated(""))),
            &[TENURING],
        )
        .unwrap()
    }

    #[test]
    fn test_split_record_round() {
        let split = cms_like();
        let mut ctx = Context::new();
        assert!(split.matches("1.000: [GC 1.000: [ParNew", &ctx));
        assert_eq!(
            split.reassemble("1.000: [GC 1.000: [ParNew", &mut ctx),
            Reassembly::Accumulate { consumed: 1 }
        );

        ctx.set_cursor(1);
        assert!(split.matches("Desired survivor size 1114112 bytes, new threshold 1 (max 15)", &ctx));
        assert_eq!(
            split.reassemble("- age   1:    2224472 bytes,    2224472 total", &mut ctx),
            Reassembly::Ignore { consumed: 1 }
        );

        ctx.set_cursor(2);
        assert_eq!(
            split.reassemble(": 1K->0K(2K), 0.1 secs] 5K->3K(9K), 0.2 secs]", &mut ctx),
            Reassembly::Complete { consumed: 1 }
        );
        assert_eq!(
            ctx.take_record().unwrap().text,
            "1.000: [GC 1.000: [ParNew: 1K->0K(2K), 0.1 secs] 5K->3K(9K), 0.2 secs]"
        );
    }

    #[test]
    fn test_split_record_same_line_fragment() {
        let split = cms_like();
        let mut ctx = Context::new();
        split.reassemble("1.000: [GC 1.000: [ParNew1.001: [CMS-concurrent-mark-start]", &mut ctx);
        assert_eq!(ctx.record().unwrap().text, "1.000: [GC 1.000: [ParNew");
        assert_eq!(ctx.record().unwrap().entangled, vec![0]);
        assert_eq!(ctx.pop_deferred().unwrap().text, "1.001: [CMS-concurrent-mark-start]");
    }

    #[test]
    fn test_split_record_ignores_unrelated_when_open() {
        let split = cms_like();
        let mut ctx = Context::new();
        split.reassemble("1.000: [GC 1.000: [ParNew", &mut ctx);
        assert!(!split.matches("Total time for which application threads were stopped: 0.1 seconds", &ctx));
        assert!(!split.matches("1.000: [GC 1.000: [ParNew", &ctx));
    }

    #[test]
    fn test_trailing_times_pattern() {
        let re = Regex::new(TRAILING_TIMES).unwrap();
        assert!(re.is_match(" [Times: user=0.01 sys=0.00, real=0.01 secs]"));
        assert!(!re.is_match("[GC 1K->0K(2K), 0.1 secs] [Times: user=0.01 sys=0.00, real=0.01 secs]"));
    }
}
