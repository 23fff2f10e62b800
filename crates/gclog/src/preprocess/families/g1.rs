//! G1 — fold `-XX:+PrintGCDetails` blocks into their pause line.
//!
//! ```text
//! 2.000: [GC pause (G1 Evacuation Pause) (young), 0.0057663 secs]
//!    [Parallel Time: 4.6 ms, GC Workers: 8]          <- ignored
//!       [GC Worker Start (ms): Min: ...]             <- ignored
//!    [Eden: 24.0M(24.0M)->0.0B(13.0M) ...]           <- appended
//!  [Times: user=0.01 sys=0.00, real=0.01 secs]       <- appended, record complete
//! ```
//!
//! A pause line can also stop right after its type, with a concurrent cycle
//! message written into the gap and the duration following later.

use regex::Regex;

use super::decorated;
use crate::parser::model::{compile, Family, GcLogError};
use crate::preprocess::{Context, LineMatcher, Reassembly};

pub struct G1Matcher {
    /// Pause that stops before its duration, maybe with a concurrent fragment glued on
    split_start: Regex,
    /// Complete summary line that may be followed by a detail block
    summary: Regex,
    duration: Regex,
    eden: Regex,
    times: Regex,
    /// First line of a detail block; decides whether a summary opens a record
    block: Regex,
    detail: Regex,
    /// Collector tags of the other legacy families
    foreign: Regex,
    concurrent: Regex,
    ergonomics: Regex,
}

impl G1Matcher {
    pub fn new() -> Result<Self, GcLogError> {
        let decor = decorated("");
        Ok(Self {
            split_start: compile(
                "g1_split_start",
                &format!(
                    r"^(?P<record>{decor}\[GC pause (?:\([^()]*\) )?\((?:young|mixed)\)(?: \((?:initial-mark|to-space exhausted|to-space overflow)\))*)(?: ?(?P<conc>{decor}\[GC concurrent-.*))?\s*$"
                ),
            )?,
            summary: compile(
                "g1_summary",
                &format!(r"^{decor}\[(?:GC pause|GC remark|GC cleanup|Full GC)\b.*secs\]\s*$"),
            )?,
            duration: compile("g1_duration", r"^, \d+[.,]\d+ secs\]\s*$")?,
            eden: compile("g1_eden", r"^\s*\[Eden: ")?,
            times: compile("g1_times", r"^\s*\[Times: ")?,
            block: compile(
                "g1_block",
                r"^(?:\s*\[(?:Eden: |Times: |Parallel Time|GC Worker|Other: )|\s+\[)",
            )?,
            detail: compile("g1_detail", r"^\s+(?:\[|\S+: )")?,
            foreign: compile(
                "g1_foreign",
                r"\[(?:ParNew|ASParNew|CMS|ASCMS|DefNew|Tenured|PSYoungGen|ParOldGen|PSOldGen)[: \]]",
            )?,
            concurrent: compile("g1_concurrent", &format!(r"^{decor}\[GC concurrent-[^\]]*\]\s*$"))?,
            ergonomics: compile("g1_ergonomics", &format!(r"^\s*{decor}\[G1Ergonomics "))?,
        })
    }

    fn is_detail(&self, line: &str) -> bool {
        self.eden.is_match(line) || self.times.is_match(line) || self.detail.is_match(line)
    }

    fn is_summary(&self, line: &str) -> bool {
        self.summary.is_match(line) && !self.foreign.is_match(line)
    }

    fn open_record(&self, line: &str, ctx: &Context) -> bool {
        ctx.in_record(Family::G1)
            && (self.duration.is_match(line)
                || self.is_detail(line)
                || self.concurrent.is_match(line)
                || self.ergonomics.is_match(line))
    }
}

impl LineMatcher for G1Matcher {
    fn family(&self) -> Family {
        Family::G1
    }

    fn matches(&self, line: &str, ctx: &Context) -> bool {
        if ctx.in_record(Family::G1) {
            return self.open_record(line, ctx);
        }
        self.split_start.is_match(line) || self.is_summary(line) || self.ergonomics.is_match(line)
    }

    fn reassemble(&self, line: &str, next: Option<&str>, ctx: &mut Context) -> Reassembly {
        let details_follow = next.is_some_and(|n| self.block.is_match(n));

        if self.ergonomics.is_match(line) {
            return Reassembly::Ignore { consumed: 1 };
        }

        if ctx.in_record(Family::G1) {
            // Eden and Times are indented like the rest of the block; test them first
            if self.eden.is_match(line) || self.times.is_match(line) {
                ctx.append(" ");
                ctx.append(line.trim());
                let done = self.times.is_match(line) || !next.is_some_and(|n| self.times.is_match(n));
                return if done {
                    Reassembly::Complete { consumed: 1 }
                } else {
                    Reassembly::Accumulate { consumed: 1 }
                };
            }
            if self.duration.is_match(line) {
                ctx.append(line.trim_end());
                return if details_follow {
                    Reassembly::Accumulate { consumed: 1 }
                } else {
                    Reassembly::Complete { consumed: 1 }
                };
            }
            if self.concurrent.is_match(line) {
                ctx.defer(line);
                return Reassembly::Accumulate { consumed: 1 };
            }
            return Reassembly::Ignore { consumed: 1 };
        }

        if let Some(caps) = self.split_start.captures(line) {
            ctx.begin_record(Family::G1, &caps["record"]);
            if let Some(conc) = caps.name("conc") {
                ctx.defer(conc.as_str().trim_end());
            }
            return Reassembly::Accumulate { consumed: 1 };
        }

        if details_follow && self.is_summary(line) {
            ctx.begin_record(Family::G1, line.trim_end());
            return Reassembly::Accumulate { consumed: 1 };
        }
        Reassembly::Emit { text: line.to_string(), consumed: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::families::testing::feed;

    const DETAILED: &[&str] = &[
        "2016-10-18T12:00:00.123+0200: 27.003: [GC pause (G1 Evacuation Pause) (young), 0.0057663 secs]",
        "   [Parallel Time: 4.6 ms, GC Workers: 8]",
        "      [GC Worker Start (ms): Min: 27003.1, Avg: 27003.2, Max: 27003.3, Diff: 0.2]",
        "      [Processed Buffers: Min: 0, Avg: 7.1, Max: 20, Diff: 20, Sum: 57]",
        "   [Code Root Fixup: 0.0 ms]",
        "   [Other: 1.0 ms]",
        "      [Choose CSet: 0.0 ms]",
        "   [Eden: 24.0M(24.0M)->0.0B(13.0M) Survivors: 0.0B->3072.0K Heap: 24.0M(256.0M)->3619.4K(256.0M)]",
        " [Times: user=0.01 sys=0.00, real=0.01 secs]",
    ];

    #[test]
    fn test_detail_block_folds_into_pause() {
        let matcher = G1Matcher::new().unwrap();
        let (out, _) = feed(&matcher, DETAILED);
        assert_eq!(
            out,
            vec!["2016-10-18T12:00:00.123+0200: 27.003: [GC pause (G1 Evacuation Pause) (young), 0.0057663 secs] [Eden: 24.0M(24.0M)->0.0B(13.0M) Survivors: 0.0B->3072.0K Heap: 24.0M(256.0M)->3619.4K(256.0M)] [Times: user=0.01 sys=0.00, real=0.01 secs]".to_string()]
        );
    }

    #[test]
    fn test_summary_without_details_is_emitted() {
        let matcher = G1Matcher::new().unwrap();
        let mut ctx = Context::new();
        let line = "27.003: [GC pause (young) 1024M->512M(2048M), 0.0500000 secs]";
        assert_eq!(
            matcher.reassemble(line, Some("27.100: [GC concurrent-mark-start]"), &mut ctx),
            Reassembly::Emit { text: line.to_string(), consumed: 1 }
        );
    }

    #[test]
    fn test_concurrent_fragment_glued_to_pause() {
        let matcher = G1Matcher::new().unwrap();
        let (out, _) = feed(
            &matcher,
            &[
                "27.003: [GC pause (G1 Evacuation Pause) (young) 27.004: [GC concurrent-root-region-scan-end, 0.0001000 secs]",
                ", 0.0057663 secs]",
                " [Times: user=0.01 sys=0.00, real=0.01 secs]",
            ],
        );
        assert_eq!(
            out,
            vec![
                "27.003: [GC pause (G1 Evacuation Pause) (young), 0.0057663 secs] [Times: user=0.01 sys=0.00, real=0.01 secs]".to_string(),
                "27.004: [GC concurrent-root-region-scan-end, 0.0001000 secs]".to_string(),
            ]
        );
    }

    #[test]
    fn test_concurrent_line_inside_split_pause_is_deferred() {
        let matcher = G1Matcher::new().unwrap();
        let (out, _) = feed(
            &matcher,
            &[
                "27.003: [GC pause (G1 Evacuation Pause) (mixed)",
                " 27.003: [G1Ergonomics (CSet Construction) start choosing CSet, _pending_cards: 0]",
                "27.004: [GC concurrent-cleanup-end, 0.0000500 secs]",
                ", 0.0100000 secs]",
            ],
        );
        assert_eq!(out[0], "27.003: [GC pause (G1 Evacuation Pause) (mixed), 0.0100000 secs]");
        assert_eq!(out[1], "27.004: [GC concurrent-cleanup-end, 0.0000500 secs]");
    }

    #[test]
    fn test_full_gc_with_eden_block() {
        let matcher = G1Matcher::new().unwrap();
        let (out, _) = feed(
            &matcher,
            &[
                "5.000: [Full GC (Allocation Failure)  1024M->256M(2048M), 1.2000000 secs]",
                "   [Eden: 0.0B(100.0M)->0.0B(100.0M) Survivors: 0.0B->0.0B Heap: 1024.0M(2048.0M)->256.0M(2048.0M)], [Metaspace: 2671K->2671K(1056768K)]",
                " [Times: user=1.50 sys=0.00, real=1.20 secs]",
            ],
        );
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("secs] [Eden: "));
        assert!(out[0].ends_with("real=1.20 secs]"));
    }

    #[test]
    fn test_unrelated_lines_not_claimed() {
        let matcher = G1Matcher::new().unwrap();
        let ctx = Context::new();
        assert!(!matcher.matches("27.100: [GC concurrent-mark-start]", &ctx));
        assert!(!matcher.matches("   [Parallel Time: 4.6 ms, GC Workers: 8]", &ctx));
    }

    #[test]
    fn test_other_collectors_full_gc_not_claimed() {
        let matcher = G1Matcher::new().unwrap();
        let ctx = Context::new();
        for line in [
            "44.684: [Full GC (System.gc()) 44.684: [CMS: 1879696K->1879530K(3482624K), 3.3169930 secs] 1896402K->1879530K(3574784K), [Metaspace: 27854K->27854K(1073152K)], 3.3178530 secs] [Times: user=3.20 sys=0.00, real=3.32 secs]",
            "4.000: [Full GC (Ergonomics) [PSYoungGen: 100K->0K(2000K)] [ParOldGen: 4000K->3000K(7000K)] 4100K->3000K(9000K), [Metaspace: 2000K->2000K(1056768K)], 0.0500000 secs]",
            "6.000: [Full GC (System.gc()) 6.000: [Tenured: 0K->2394K(349568K), 0.0100 secs] 7990K->2394K(506816K), [Metaspace: 2671K->2671K(1056768K)], 0.0110 secs]",
        ] {
            assert!(!matcher.matches(line, &ctx), "{line}");
        }
    }

    #[test]
    fn test_summary_needs_bracketed_detail_to_open() {
        let matcher = G1Matcher::new().unwrap();
        let mut ctx = Context::new();
        let line = "5.000: [Full GC (Allocation Failure)  1024M->256M(2048M), 1.2000000 secs]";
        let step = matcher.reassemble(
            line,
            Some(" CMS: abort preclean due to time 48.000: [CMS-concurrent-abortable-preclean: 0.100/5.000 secs]"),
            &mut ctx,
        );
        assert_eq!(step, Reassembly::Emit { text: line.to_string(), consumed: 1 });
        assert!(ctx.record().is_none());
    }
}
