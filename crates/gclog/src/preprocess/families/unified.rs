//! Unified logging — keep summaries, drop detail tags, attach CPU times.
//!
//! `-Xlog:gc*` prints one summary per collection on the bare `gc` tag and the
//! CPU times on the line after it under `gc,cpu`. Everything else under a
//! `gc,*` tag set (phases, heap, ergonomics, metaspace) is detail.

use regex::Regex;

use crate::parser::decorator::{DecoratorParser, UnifiedTags};
use crate::parser::model::{compile, Family, GcLogError};
use crate::preprocess::{Context, LineMatcher, Reassembly};

pub struct UnifiedMatcher {
    decorators: DecoratorParser,
    gc_id: Regex,
    pause: Regex,
    concurrent: Regex,
}

impl UnifiedMatcher {
    pub fn new() -> Result<Self, GcLogError> {
        Ok(Self {
            decorators: DecoratorParser::new()?,
            gc_id: compile("unified_gc_id", r"^GC\((?P<id>\d+)\) ")?,
            pause: compile("unified_pause", r"^GC\(\d+\) Pause ")?,
            concurrent: compile("unified_concurrent", r"^GC\(\d+\) Concurrent ")?,
        })
    }

    fn gc_id<'a>(&self, body: &'a str) -> Option<&'a str> {
        self.gc_id.captures(body).and_then(|c| c.name("id")).map(|m| m.as_str())
    }

    /// Body of the `gc,cpu` line following a summary for the same collection.
    fn cpu_tail<'a>(&self, next: &'a str, id: &str) -> Option<&'a str> {
        let (decorator, body) = self.decorators.split(next);
        let tags = decorator.unified?;
        if !tags.is(&["gc", "cpu"]) || self.gc_id(body) != Some(id) {
            return None;
        }
        self.gc_id.find(body).map(|m| body[m.end()..].trim_end())
    }

    fn keeps(&self, tags: &UnifiedTags, body: &str) -> bool {
        if tags.has("safepoint") || tags.has("init") {
            return true;
        }
        if !tags.has("gc") {
            // Not a collector line; leave it to the classifier
            return true;
        }
        tags.is(&["gc"]) || (tags.is(&["gc", "marking"]) && self.concurrent.is_match(body))
    }
}

impl LineMatcher for UnifiedMatcher {
    fn family(&self) -> Family {
        Family::Unified
    }

    fn matches(&self, line: &str, _ctx: &Context) -> bool {
        line.starts_with('[') && self.decorators.split(line).0.is_unified()
    }

    fn reassemble(&self, line: &str, next: Option<&str>, ctx: &mut Context) -> Reassembly {
        ctx.flags.unified_logging = true;
        let (decorator, body) = self.decorators.split(line);
        let tags = decorator.unified.unwrap_or_default();

        if matches!(tags.level.as_deref(), Some("debug" | "trace")) || !self.keeps(&tags, body) {
            return Reassembly::Ignore { consumed: 1 };
        }

        if tags.is(&["gc"]) && self.pause.is_match(body) {
            let joined = self
                .gc_id(body)
                .and_then(|id| next.and_then(|n| self.cpu_tail(n, id)));
            if let Some(cpu) = joined {
                return Reassembly::Emit {
                    text: format!("{} {cpu}", line.trim_end()),
                    consumed: 2,
                };
            }
        }
        Reassembly::Emit { text: line.trim_end().to_string(), consumed: 1 }
    }
}
