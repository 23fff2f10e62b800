//! Decorator — split a normalized line into its decorators and body.
//!
//! Legacy logs prefix events with an optional datestamp and an optional
//! uptime (`2016-10-18T12:00:00.000+0200: 27.003: `). Unified logs prefix them
//! with bracketed fields (`[0.052s][info][gc,start] `). Grammars only ever see
//! the body.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use super::model::{compile, GcLogError};
use super::units;
use super::{DATESTAMP, TIMESTAMP};

/// JDK datestamps use a `+0200` offset; `%z` accepts that form.
const DATESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Unified-logging fields found on a line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedTags {
    pub level: Option<String>,
    pub tags: Vec<String>,
}

impl UnifiedTags {
    pub fn has(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Exact tag set, order-insensitive (`&["gc", "cpu"]`).
    pub fn is(&self, set: &[&str]) -> bool {
        self.tags.len() == set.len() && set.iter().all(|t| self.has(t))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decorator {
    pub datestamp: Option<DateTime<FixedOffset>>,
    pub uptime: Option<Duration>,
    pub unified: Option<UnifiedTags>,
}

impl Decorator {
    pub fn is_unified(&self) -> bool {
        self.unified.is_some()
    }
}

pub fn parse_datestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let normalized = text.trim().replacen(',', ".", 1).replace('Z', "+0000");
    DateTime::parse_from_str(&normalized, DATESTAMP_FORMAT).ok()
}

pub struct DecoratorParser {
    legacy: Regex,
    uptime: Regex,
    datestamp: Regex,
    tags: Regex,
}

impl DecoratorParser {
    pub fn new() -> Result<Self, GcLogError> {
        Ok(Self {
            legacy: compile(
                "legacy_decorator",
                &format!(r"^(?:(?P<ds>{DATESTAMP}): ?)?(?:(?P<ts>{TIMESTAMP}): ?)?"),
            )?,
            uptime: compile("unified_uptime", r"^(?P<n>\d+(?:[.,]\d+)?)(?P<unit>s|ms|ns)$")?,
            datestamp: compile("unified_datestamp", &format!("^{DATESTAMP}$"))?,
            tags: compile("unified_tags", r"^[a-z0-9_]+(?:,[a-z0-9_]+)*\s*$")?,
        })
    }

    pub fn split<'a>(&self, line: &'a str) -> (Decorator, &'a str) {
        if line.starts_with('[') {
            if let Some(split) = self.split_unified(line) {
                return split;
            }
        }
        self.split_legacy(line)
    }

    fn split_legacy<'a>(&self, line: &'a str) -> (Decorator, &'a str) {
        let mut decorator = Decorator::default();
        let Some(caps) = self.legacy.captures(line) else {
            return (decorator, line);
        };
        decorator.datestamp = caps.name("ds").and_then(|m| parse_datestamp(m.as_str()));
        decorator.uptime = caps.name("ts").and_then(|m| units::seconds(m.as_str()));
        let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        (decorator, &line[end..])
    }

    fn split_unified<'a>(&self, line: &'a str) -> Option<(Decorator, &'a str)> {
        let mut decorator = Decorator::default();
        let mut tags = UnifiedTags::default();
        let mut fields = 0usize;
        let mut rest = line;

        while let Some(inner) = rest.strip_prefix('[') {
            let Some(close) = inner.find(']') else { break };
            let field = &inner[..close];
            if self.datestamp.is_match(field) {
                decorator.datestamp = parse_datestamp(field);
            } else if let Some(caps) = self.uptime.captures(field) {
                decorator.uptime = match &caps["unit"] {
                    "s" => units::seconds(&caps["n"]),
                    "ms" => units::millis(&caps["n"]),
                    _ => units::nanos(&caps["n"]),
                };
            } else if matches!(field.trim(), "trace" | "debug" | "info" | "warning" | "error") {
                tags.level = Some(field.trim().to_string());
            } else if self.tags.is_match(field) {
                tags.tags = field.trim().split(',').map(str::to_string).collect();
            } else {
                break;
            }
            fields += 1;
            rest = &inner[close + 1..];
        }

        if fields == 0 {
            return None;
        }
        decorator.unified = Some(tags);
        Some((decorator, rest.strip_prefix(' ').unwrap_or(rest)))
    }
}
