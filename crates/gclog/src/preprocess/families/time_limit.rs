//! GC time limit — rejoin Parallel full collections split by an overhead warning.
//!
//! With `-XX:+UseGCOverheadLimit` the JVM prints the warning in the middle of
//! the record and breaks the line before the duration:
//!
//! ```text
//! 3743.645: [Full GC [PSYoungGen: ...] ... [PSPermGen: ...]      GC time would exceed GCTimeLimit of 98%
//! , 33.6887649 secs] [Times: user=33.68 sys=0.02, real=33.69 secs]
//! ```

use regex::Regex;

use crate::parser::model::{compile, Family, GcLogError};
use crate::preprocess::{Context, LineMatcher, Reassembly};

pub struct TimeLimitMatcher {
    start: Regex,
    tail: Regex,
}

impl TimeLimitMatcher {
    pub fn new() -> Result<Self, GcLogError> {
        Ok(Self {
            start: compile(
                "time_limit_start",
                r"^.+\]\s+GC time (?:would exceed|is exceeding) GCTimeLimit of \d{1,3}%\s*$",
            )?,
            tail: compile("time_limit_tail", r"^\s*, \d+[.,]\d+ secs\]")?,
        })
    }
}

impl LineMatcher for TimeLimitMatcher {
    fn family(&self) -> Family {
        Family::GcTimeLimit
    }

    fn matches(&self, line: &str, ctx: &Context) -> bool {
        if ctx.in_record(Family::GcTimeLimit) {
            self.tail.is_match(line)
        } else {
            self.start.is_match(line)
        }
    }

    fn reassemble(&self, line: &str, next: Option<&str>, ctx: &mut Context) -> Reassembly {
        if ctx.in_record(Family::GcTimeLimit) {
            ctx.append(line.trim_start());
            return Reassembly::Complete { consumed: 1 };
        }
        match next.filter(|n| self.tail.is_match(n)) {
            Some(tail) => Reassembly::Emit {
                text: format!("{}{}", line.trim_end(), tail.trim_start()),
                consumed: 2,
            },
            None => {
                // Tail not adjacent (or not yet written); wait for it
                ctx.begin_record(Family::GcTimeLimit, line.trim_end());
                Reassembly::Accumulate { consumed: 1 }
            }
        }
    }
}
