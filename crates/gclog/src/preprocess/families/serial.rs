//! Serial — rejoin DefNew/Tenured records split by tenuring output.

use super::{decorated, SplitRecord, TENURING};
use crate::parser::model::{Family, GcLogError};
use crate::preprocess::{Context, LineMatcher, Reassembly};

pub struct SerialMatcher {
    record: SplitRecord,
}

impl SerialMatcher {
    pub fn new() -> Result<Self, GcLogError> {
        let decor = decorated("");
        let record = SplitRecord::new(
            Family::Serial,
            &format!(r"^(?P<record>{decor}\[(?:Full )?GC.*?\[(?:DefNew|Tenured)(?: \(promotion failed\))?)\s*$"),
            r"^(?: \(promotion failed\))?: \d",
            None,
            &[TENURING],
        )?;
        Ok(Self { record })
    }
}

impl LineMatcher for SerialMatcher {
    fn family(&self) -> Family {
        Family::Serial
    }

    fn matches(&self, line: &str, ctx: &Context) -> bool {
        self.record.matches(line, ctx)
    }

    fn reassemble(&self, line: &str, _next: Option<&str>, ctx: &mut Context) -> Reassembly {
        self.record.reassemble(line, ctx)
    }
}
