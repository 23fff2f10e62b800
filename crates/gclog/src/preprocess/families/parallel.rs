//! Parallel — drop `-XX:+PrintAdaptiveSizePolicy` output from inside records.
//!
//! ```text
//! 2.000: [GC (Allocation Failure) AdaptiveSizeStart: 2.100 collection: 1
//! PSAdaptiveSize::compute_eden_space_size: ...
//! AdaptiveSizeStop: collection: 1
//! [PSYoungGen: 1000K->100K(2000K)] 5000K->4100K(9000K), 0.0100000 secs]
//! ```

use super::{decorated, SplitRecord};
use crate::parser::model::{Family, GcLogError};
use crate::preprocess::{Context, LineMatcher, Reassembly};

pub struct ParallelMatcher {
    record: SplitRecord,
}

impl ParallelMatcher {
    pub fn new() -> Result<Self, GcLogError> {
        let record = SplitRecord::new(
            Family::Parallel,
            &format!(
                r"^(?P<record>{}\[(?:Full )?GC(?:--)?(?: \((?:System\.gc\(\)|[^()]+)\))?(?:--)? )AdaptiveSizeStart: .*$",
                decorated("")
            ),
            r"^\[PSYoungGen: ",
            None,
            &[
                r"^\s*(?:AdaptiveSize|PSAdaptiveSize|PSAdjust|PSYoung generation size|PSOld generation size)",
                r"^\s+(?:avg_|[a-z_]+:\s|\w+ = )",
            ],
        )?;
        Ok(Self { record })
    }
}

impl LineMatcher for ParallelMatcher {
    fn family(&self) -> Family {
        Family::Parallel
    }

    fn matches(&self, line: &str, ctx: &Context) -> bool {
        self.record.matches(line, ctx)
    }

    fn reassemble(&self, line: &str, _next: Option<&str>, ctx: &mut Context) -> Reassembly {
        self.record.reassemble(line, ctx)
    }
}
