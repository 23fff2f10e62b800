//! `-XX:+PrintGCApplicationStoppedTime` and `-XX:+PrintGCApplicationConcurrentTime`.

use regex::Regex;

use crate::event::model::{AppTime, EventKind, Safepoint, TypedEvent};
use crate::parser::model::{compile, GcLogError};
use crate::parser::units;

use super::{DecoratedLine, EventGrammar, Prior};

pub struct StoppedTimeGrammar {
    regex: Regex,
}

impl StoppedTimeGrammar {
    pub fn new() -> Result<Self, GcLogError> {
        Ok(Self {
            regex: compile(
                "application_stopped_time",
                r"^Total time for which application threads were stopped: (?P<dur>\d+[.,]\d+) seconds(?:, Stopping threads took: (?P<reach>\d+[.,]\d+) seconds)?$",
            )?,
        })
    }
}

impl EventGrammar for StoppedTimeGrammar {
    fn kind(&self) -> EventKind {
        EventKind::ApplicationStoppedTime
    }

    fn matches(&self, line: &DecoratedLine<'_>, _prior: &Prior<'_>) -> bool {
        self.regex.is_match(line.body)
    }

    fn extract(&self, line: &DecoratedLine<'_>, _prior: &Prior<'_>) -> Option<TypedEvent> {
        let caps = self.regex.captures(line.body)?;
        Some(TypedEvent::ApplicationStoppedTime(Safepoint {
            stamp: line.stamp,
            operation: None,
            stopped: units::seconds(&caps["dur"])?,
            reaching: caps.name("reach").and_then(|m| units::seconds(m.as_str())),
        }))
    }
}

pub struct ConcurrentTimeGrammar {
    regex: Regex,
}

impl ConcurrentTimeGrammar {
    pub fn new() -> Result<Self, GcLogError> {
        Ok(Self {
            regex: compile(
                "application_concurrent_time",
                r"^Application time: (?P<dur>\d+[.,]\d+) seconds$",
            )?,
        })
    }
}

impl EventGrammar for ConcurrentTimeGrammar {
    fn kind(&self) -> EventKind {
        EventKind::ApplicationConcurrentTime
    }

    fn matches(&self, line: &DecoratedLine<'_>, _prior: &Prior<'_>) -> bool {
        self.regex.is_match(line.body)
    }

    fn extract(&self, line: &DecoratedLine<'_>, _prior: &Prior<'_>) -> Option<TypedEvent> {
        let caps = self.regex.captures(line.body)?;
        Some(TypedEvent::ApplicationConcurrentTime(AppTime {
            stamp: line.stamp,
            running: units::seconds(&caps["dur"])?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::grammars::testing::run;
    use std::time::Duration;

    #[test]
    fn test_stopped_time() {
        let line = "2.500: Total time for which application threads were stopped: 0.0212340 seconds, Stopping threads took: 0.0000150 seconds";
        let Some(TypedEvent::ApplicationStoppedTime(s)) = run(&StoppedTimeGrammar::new().unwrap(), line, None) else {
            panic!("not recognized")
        };
        assert_eq!(s.stopped, Duration::from_nanos(21_234_000));
        assert_eq!(s.reaching, Some(Duration::from_micros(15)));
        assert_eq!(s.stamp.timestamp, Some(Duration::from_millis(2_500)));
    }

    #[test]
    fn test_stopped_time_jdk7_and_unified() {
        let grammar = StoppedTimeGrammar::new().unwrap();
        assert!(run(&grammar, "Total time for which application threads were stopped: 0,0012340 seconds", None).is_some());
        let unified = "[0.100s][info][safepoint] Total time for which application threads were stopped: 0.0001234 seconds, Stopping threads took: 0.0000100 seconds";
        assert!(run(&grammar, unified, None).is_some());
    }

    #[test]
    fn test_concurrent_time() {
        let Some(TypedEvent::ApplicationConcurrentTime(a)) =
            run(&ConcurrentTimeGrammar::new().unwrap(), "3.100: Application time: 0.5000000 seconds", None)
        else {
            panic!("not recognized")
        };
        assert_eq!(a.running, Duration::from_millis(500));
    }
}
