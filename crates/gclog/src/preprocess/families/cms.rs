//! CMS — rejoin ParNew/CMS records torn apart by concurrent-phase output.
//!
//! The background collector writes its phase messages while a young
//! collection is being logged, so a record can stop mid collector tag:
//!
//! ```text
//! 2.000: [GC (Allocation Failure) 2.000: [ParNew2.001: [CMS-concurrent-abortable-preclean: 0.100/0.200 secs]
//! : 86199K->8454K(92160K), 0.0200000 secs] 1973018K->1895536K(3574784K), 0.0210000 secs]
//! ```
//!
//! The concurrent fragment is peeled off and emitted after the record it
//! interrupted.

use regex::Regex;

use super::{decorated, SplitRecord, TENURING};
use crate::parser::model::{compile, Family, GcLogError};
use crate::preprocess::{Context, LineMatcher, Reassembly};

pub struct CmsMatcher {
    record: SplitRecord,
    abort_preclean: Regex,
    incremental: Regex,
}

impl CmsMatcher {
    pub fn new() -> Result<Self, GcLogError> {
        let decor = decorated("");
        let record = SplitRecord::new(
            Family::Cms,
            &format!(
                r"^(?P<record>{decor}\[(?:Full )?GC.*?\[(?:ParNew|CMS)(?: \(promotion failed\))?)(?P<conc>{decor}\[CMS-concurrent-.*)?\s*$"
            ),
            r"^(?: \((?:concurrent mode (?:failure|interrupted)|promotion failed)\))?: \d",
            Some(&format!(r"^{decor}\[CMS-concurrent-[^\]]*\](?:\s*\[Times: [^\]]*\])?\s*$")),
            &[TENURING],
        )?;
        Ok(Self {
            record,
            abort_preclean: compile("cms_abort_preclean", r"^\s*CMS: abort preclean due to time ")?,
            incremental: compile("cms_incremental", r" icms_dc=\d+ ")?,
        })
    }
}

impl LineMatcher for CmsMatcher {
    fn family(&self) -> Family {
        Family::Cms
    }

    fn matches(&self, line: &str, ctx: &Context) -> bool {
        if ctx.in_record(Family::Cms) {
            return self.record.matches(line, ctx);
        }
        self.record.starts(line) || self.abort_preclean.is_match(line) || self.incremental.is_match(line)
    }

    fn reassemble(&self, line: &str, _next: Option<&str>, ctx: &mut Context) -> Reassembly {
        if self.incremental.is_match(line) {
            ctx.flags.incremental_mode = true;
        }

        if ctx.in_record(Family::Cms) || self.record.starts(line) {
            return self.record.reassemble(line, ctx);
        }

        if let Some(found) = self.abort_preclean.find(line) {
            let rest = line[found.end()..].trim_start();
            if rest.is_empty() {
                return Reassembly::Ignore { consumed: 1 };
            }
            return Reassembly::Emit { text: rest.to_string(), consumed: 1 };
        }
        Reassembly::Emit { text: line.to_string(), consumed: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::families::testing::feed;

    #[test]
    fn test_same_line_fragment_is_peeled() {
        let matcher = CmsMatcher::new().unwrap();
        let (out, _) = feed(
            &matcher,
            &[
                "2.000: [GC (Allocation Failure) 2.000: [ParNew2.001: [CMS-concurrent-abortable-preclean: 0.100/0.200 secs] [Times: user=0.20 sys=0.01, real=0.20 secs]",
                ": 86199K->8454K(92160K), 0.0200000 secs] 1973018K->1895536K(3574784K), 0.0210000 secs] [Times: user=0.07 sys=0.00, real=0.02 secs]",
            ],
        );
        assert_eq!(
            out,
            vec![
                "2.000: [GC (Allocation Failure) 2.000: [ParNew: 86199K->8454K(92160K), 0.0200000 secs] 1973018K->1895536K(3574784K), 0.0210000 secs] [Times: user=0.07 sys=0.00, real=0.02 secs]".to_string(),
                "2.001: [CMS-concurrent-abortable-preclean: 0.100/0.200 secs] [Times: user=0.20 sys=0.01, real=0.20 secs]".to_string(),
            ]
        );
    }

    #[test]
    fn test_fragment_on_its_own_line_is_deferred() {
        let matcher = CmsMatcher::new().unwrap();
        let (out, _) = feed(
            &matcher,
            &[
                "2.000: [GC (Allocation Failure) 2.000: [ParNew",
                "2.001: [CMS-concurrent-abortable-preclean: 0.100/0.200 secs] [Times: user=0.20 sys=0.01, real=0.20 secs]",
                "Desired survivor size 1114112 bytes, new threshold 1 (max 15)",
                "- age   1:    2224472 bytes,    2224472 total",
                ": 86199K->8454K(92160K), 0.0200000 secs] 1973018K->1895536K(3574784K), 0.0210000 secs]",
            ],
        );
        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("2.000: [GC (Allocation Failure) 2.000: [ParNew: 86199K"));
        assert!(out[1].starts_with("2.001: [CMS-concurrent-abortable-preclean"));
    }

    #[test]
    fn test_concurrent_mode_failure_continuation() {
        let matcher = CmsMatcher::new().unwrap();
        let (out, _) = feed(
            &matcher,
            &[
                "44.684: [Full GC44.684: [CMS44.700: [CMS-concurrent-mark: 0.500/0.600 secs]",
                " (concurrent mode failure): 1218548K->413373K(1465840K), 3.3177510 secs] 1324634K->413373K(1572464K), [CMS Perm : 83118K->83118K(131072K)], 3.3178530 secs]",
            ],
        );
        assert_eq!(
            out[0],
            "44.684: [Full GC44.684: [CMS (concurrent mode failure): 1218548K->413373K(1465840K), 3.3177510 secs] 1324634K->413373K(1572464K), [CMS Perm : 83118K->83118K(131072K)], 3.3178530 secs]"
        );
        assert_eq!(out[1], "44.700: [CMS-concurrent-mark: 0.500/0.600 secs]");
    }

    #[test]
    fn test_abort_preclean_prefix_is_stripped() {
        let matcher = CmsMatcher::new().unwrap();
        let (out, _) = feed(
            &matcher,
            &[" CMS: abort preclean due to time 19.000: [CMS-concurrent-abortable-preclean: 1.000/5.000 secs] [Times: user=1.00 sys=0.01, real=5.00 secs]"],
        );
        assert_eq!(
            out,
            vec!["19.000: [CMS-concurrent-abortable-preclean: 1.000/5.000 secs] [Times: user=1.00 sys=0.01, real=5.00 secs]".to_string()]
        );
    }

    #[test]
    fn test_incremental_mode_flag() {
        let matcher = CmsMatcher::new().unwrap();
        let (_, ctx) = feed(
            &matcher,
            &["[GC [ParNew: 1000K->100K(2000K), 0.0010000 secs] 5000K->4200K(10000K) icms_dc=5 , 0.0011000 secs]"],
        );
        assert!(ctx.flags.incremental_mode);
    }

    #[test]
    fn test_complete_record_is_not_claimed() {
        let matcher = CmsMatcher::new().unwrap();
        let ctx = Context::new();
        assert!(!matcher.matches(
            "2.000: [GC (Allocation Failure) 2.000: [ParNew: 86199K->8454K(92160K), 0.0200000 secs] 1973018K->1895536K(3574784K), 0.0210000 secs]",
            &ctx
        ));
        assert!(!matcher.matches("2.001: [CMS-concurrent-mark-start]", &ctx));
    }
}
