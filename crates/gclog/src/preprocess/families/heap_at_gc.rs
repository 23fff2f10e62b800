//! Heap-at-GC — strip `-XX:+PrintHeapAtGC` dumps from around collections.
//!
//! ```text
//! 27067.966: [GC{Heap before gc invocations=498:      <- record opens as "27067.966: [GC "
//!  par new generation   total 1033216K, used ...     <- ignored
//! 27067.967: [ParNew: ...], 0.1235000 secs]           <- appended, record complete
//! Heap after gc invocations=499:                      <- ignored
//!  ...
//! }                                                   <- ignored, block closed
//! ```
//!
//! While the record is open only dump lines, collection fragments and
//! concurrent-phase fragments belong to it. Concurrent fragments are emitted
//! after the record; any other line interrupts it.

use regex::Regex;

use super::{decorated, TENURING};
use crate::parser::model::{compile, Family, GcLogError};
use crate::preprocess::context::HeapBlock;
use crate::preprocess::{Context, LineMatcher, Reassembly};

pub struct HeapAtGcMatcher {
    before: Regex,
    after: Regex,
    close: Regex,
    footer: Regex,
    detail: Regex,
    tenuring: Regex,
    continuation: Regex,
    concurrent: Regex,
    glued: Regex,
    complete: Regex,
}

impl HeapAtGcMatcher {
    pub fn new() -> Result<Self, GcLogError> {
        Ok(Self {
            before: compile(
                "heap_before",
                r"^(?P<head>.*?)\{Heap before (?:GC|gc) invocations=\d+(?: \(full \d+\))?:\s*$",
            )?,
            after: compile("heap_after", r"^Heap after (?:GC|gc) invocations=\d+(?: \(full \d+\))?:\s*$")?,
            close: compile("heap_close", r"^\}\s*$")?,
            footer: compile("heap_footer", r"^Heap\s*$")?,
            detail: compile(
                "heap_detail",
                r"^\s+\S.*(?:total \d+K, used \d+K|\d+K, +\d+% used|used \d+K, capacity \d+K|region size \d+K|No shared spaces configured)",
            )?,
            tenuring: compile("heap_tenuring", TENURING)?,
            continuation: compile(
                "heap_continuation",
                &format!(
                    r"^(?:{}|(?: \((?:promotion failed|concurrent mode (?:failure|interrupted))\))?: \d|, \d+[.,]\d+ secs\])",
                    decorated(r"\[(?:ParNew|ASParNew|DefNew|Tenured|CMS|ASCMS|PSYoungGen|ParOldGen|PSOldGen)")
                ),
            )?,
            concurrent: compile(
                "heap_concurrent",
                &format!(
                    r"^(?:\s*CMS: abort preclean due to time )?(?P<conc>{})",
                    decorated(r"\[(?:CMS-concurrent-|GC concurrent-).*")
                ),
            )?,
            glued: compile("heap_glued", &decorated(r"\[(?:CMS-concurrent-|GC concurrent-).*$"))?,
            complete: compile("heap_complete", r"secs\](?:\s*\[Times: [^\]]*\])?\s*$")?,
        })
    }

    fn is_structural(&self, line: &str) -> bool {
        self.before.is_match(line) || self.after.is_match(line) || self.footer.is_match(line)
    }

    fn is_dump(&self, line: &str) -> bool {
        self.detail.is_match(line) || self.tenuring.is_match(line)
    }
}

impl LineMatcher for HeapAtGcMatcher {
    fn family(&self) -> Family {
        Family::HeapAtGc
    }

    fn matches(&self, line: &str, ctx: &Context) -> bool {
        if ctx.in_record(Family::HeapAtGc) && ctx.heap_block == HeapBlock::Before {
            // A new dump or any unrelated line means this record was truncated
            return self.is_dump(line) || self.concurrent.is_match(line) || self.continuation.is_match(line);
        }
        if self.is_structural(line) {
            return true;
        }
        ctx.heap_block != HeapBlock::None && (self.close.is_match(line) || self.detail.is_match(line))
    }

    fn reassemble(&self, line: &str, _next: Option<&str>, ctx: &mut Context) -> Reassembly {
        if let Some(caps) = self.before.captures(line) {
            ctx.heap_block = HeapBlock::Before;
            let head = caps["head"].trim_end();
            if head.is_empty() {
                return Reassembly::Ignore { consumed: 1 };
            }
            ctx.begin_record(Family::HeapAtGc, format!("{head} "));
            return Reassembly::Accumulate { consumed: 1 };
        }
        if self.after.is_match(line) {
            ctx.heap_block = HeapBlock::After;
            return Reassembly::Ignore { consumed: 1 };
        }
        if self.footer.is_match(line) && !ctx.in_record(Family::HeapAtGc) {
            ctx.heap_block = HeapBlock::Footer;
            return Reassembly::Emit { text: line.trim_end().to_string(), consumed: 1 };
        }
        if self.close.is_match(line) {
            ctx.heap_block = HeapBlock::None;
            return Reassembly::Ignore { consumed: 1 };
        }
        if self.is_dump(line) {
            return Reassembly::Ignore { consumed: 1 };
        }
        if !ctx.in_record(Family::HeapAtGc) {
            return Reassembly::Emit { text: line.trim_end().to_string(), consumed: 1 };
        }
        if let Some(conc) = self.concurrent.captures(line).and_then(|c| c.name("conc")) {
            ctx.defer(conc.as_str().trim_end());
            return Reassembly::Accumulate { consumed: 1 };
        }

        // The collection the dump was wrapped around, maybe with a concurrent
        // fragment glued to a bare collector tag
        let fragment = match self.glued.find(line).filter(|m| m.start() > 0) {
            Some(m) => {
                ctx.defer(m.as_str().trim_end());
                &line[..m.start()]
            }
            None => line,
        };
        ctx.append(fragment);
        if self.complete.is_match(fragment) {
            ctx.heap_block = HeapBlock::None;
            Reassembly::Complete { consumed: 1 }
        } else {
            Reassembly::Accumulate { consumed: 1 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::families::testing::feed;

    const CMS_BLOCK: &[&str] = &[
        "27067.966: [GC{Heap before gc invocations=498:",
        " par new generation   total 1033216K, used 1033216K [0x00000006fae00000, 0x000000073fe00000, 0x000000073fe00000)",
        "  eden space 918464K, 100% used [0x00000006fae00000, 0x0000000732ff0000, 0x0000000732ff0000)",
        "  from space 114752K, 100% used [0x0000000739c00000, 0x0000000740c00000, 0x0000000740c00000)",
        "  to   space 114752K,   0% used [0x0000000732ff0000, 0x0000000739c00000, 0x0000000739c00000)",
        " concurrent mark-sweep generation total 3145728K, used 1900000K [0x000000073fe00000, 0x00000007c0000000, 0x00000007c0000000)",
        " Metaspace       used 100000K, capacity 110000K, committed 110000K, reserved 1140000K",
        "  class space    used 10000K, capacity 12000K, committed 12000K, reserved 1048576K",
        "27067.967: [ParNew: 1033216K->114752K(1033216K), 0.1234567 secs] 2933216K->2100000K(4178944K), 0.1235000 secs] [Times: user=0.50 sys=0.01, real=0.12 secs]",
        "Heap after gc invocations=499:",
        " par new generation   total 1033216K, used 114752K [0x00000006fae00000, 0x000000073fe00000, 0x000000073fe00000)",
        "  eden space 918464K,   0% used [0x00000006fae00000, 0x00000006fae00000, 0x0000000732ff0000)",
        "}",
    ];

    #[test]
    fn test_before_line_opens_record() {
        let matcher = HeapAtGcMatcher::new().unwrap();
        let mut ctx = Context::new();
        let step = matcher.reassemble(CMS_BLOCK[0], None, &mut ctx);
        assert_eq!(step, Reassembly::Accumulate { consumed: 1 });
        assert_eq!(ctx.record().unwrap().text, "27067.966: [GC ");
        assert_eq!(ctx.heap_block, HeapBlock::Before);
    }

    #[test]
    fn test_block_folds_to_one_record() {
        let matcher = HeapAtGcMatcher::new().unwrap();
        let (out, ctx) = feed(&matcher, CMS_BLOCK);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("27067.966: [GC 27067.967: [ParNew: 1033216K->114752K(1033216K)"));
        assert!(out[0].ends_with("real=0.12 secs]"));
        assert_eq!(ctx.heap_block, HeapBlock::None);
    }

    #[test]
    fn test_full_gc_head_keeps_trigger() {
        let matcher = HeapAtGcMatcher::new().unwrap();
        let mut ctx = Context::new();
        matcher.reassemble("5.000: [Full GC (System.gc()) {Heap before GC invocations=5 (full 1):", None, &mut ctx);
        assert_eq!(ctx.record().unwrap().text, "5.000: [Full GC (System.gc()) ");
    }

    #[test]
    fn test_standalone_block_is_ignored() {
        let matcher = HeapAtGcMatcher::new().unwrap();
        let mut ctx = Context::new();
        assert_eq!(
            matcher.reassemble("{Heap before GC invocations=0 (full 0):", None, &mut ctx),
            Reassembly::Ignore { consumed: 1 }
        );
        assert!(ctx.record().is_none());
        assert!(matcher.matches(CMS_BLOCK[1], &ctx));
        assert!(!matcher.matches("1.000: [GC (Allocation Failure) [PSYoungGen: 1K->0K(2K)] 5K->3K(9K), 0.01 secs]", &ctx));
    }

    #[test]
    fn test_detail_lines_need_a_block() {
        let matcher = HeapAtGcMatcher::new().unwrap();
        let ctx = Context::new();
        assert!(!matcher.matches(CMS_BLOCK[1], &ctx));
        assert!(!matcher.matches("}", &ctx));
    }

    #[test]
    fn test_footer_then_details() {
        let matcher = HeapAtGcMatcher::new().unwrap();
        let (out, ctx) = feed(
            &matcher,
            &[
                "Heap",
                " garbage-first heap   total 262144K, used 8192K [0x00000000f0000000, 0x0000000100000000)",
                "  region size 1024K, 3 young (3072K), 0 survivors (0K)",
                " Metaspace       used 2671K, capacity 4486K, committed 4864K, reserved 1056768K",
            ],
        );
        assert_eq!(out, vec!["Heap".to_string()]);
        assert_eq!(ctx.heap_block, HeapBlock::Footer);
    }

    #[test]
    fn test_concurrent_fragment_inside_block_is_deferred() {
        let matcher = HeapAtGcMatcher::new().unwrap();
        let (out, _) = feed(
            &matcher,
            &[
                CMS_BLOCK[0],
                CMS_BLOCK[1],
                "27067.967: [CMS-concurrent-abortable-preclean: 0.100/0.200 secs] [Times: user=0.20 sys=0.01, real=0.20 secs]",
                CMS_BLOCK[8],
                CMS_BLOCK[9],
                CMS_BLOCK[12],
            ],
        );
        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("27067.966: [GC 27067.967: [ParNew: "));
        assert!(out[1].starts_with("27067.967: [CMS-concurrent-abortable-preclean: "));
    }

    #[test]
    fn test_split_collector_tag_inside_block() {
        let matcher = HeapAtGcMatcher::new().unwrap();
        let (out, _) = feed(
            &matcher,
            &[
                CMS_BLOCK[0],
                CMS_BLOCK[1],
                "27067.967: [ParNew27067.968: [CMS-concurrent-reset: 0.010/0.010 secs]",
                "Desired survivor size 1114112 bytes, new threshold 1 (max 15)",
                ": 1033216K->114752K(1033216K), 0.1234567 secs] 2933216K->2100000K(4178944K), 0.1235000 secs]",
            ],
        );
        assert_eq!(
            out,
            vec![
                "27067.966: [GC 27067.967: [ParNew: 1033216K->114752K(1033216K), 0.1234567 secs] 2933216K->2100000K(4178944K), 0.1235000 secs]".to_string(),
                "27067.968: [CMS-concurrent-reset: 0.010/0.010 secs]".to_string(),
            ]
        );
    }

    #[test]
    fn test_unrelated_line_interrupts_open_block() {
        let matcher = HeapAtGcMatcher::new().unwrap();
        let mut ctx = Context::new();
        matcher.reassemble("100.000: [GC{Heap before gc invocations=1:", None, &mut ctx);
        assert!(matcher.matches(CMS_BLOCK[1], &ctx));
        assert!(!matcher.matches(
            "Total time for which application threads were stopped: 0.0001000 seconds",
            &ctx
        ));
        assert!(!matcher.matches("300.000: [GC (CMS Initial Mark) [1 CMS-initial-mark: 1K(2K)] 1K(3K), 0.01 secs]", &ctx));
        assert!(!matcher.matches("Heap after gc invocations=2:", &ctx));
    }
}
