//! Headers, footers and other lines that carry context but no GC work.

use regex::Regex;

use crate::event::model::{EventKind, Info, TypedEvent};
use crate::parser::model::{compile, GcLogError};

use super::{DecoratedLine, EventGrammar, InfoGrammar, Pattern, Prior};

pub fn command_line_flags() -> Result<InfoGrammar, GcLogError> {
    Ok(InfoGrammar::new(
        EventKind::HeaderCommandLineFlags,
        vec![Pattern::legacy("header_command_line_flags", r"^CommandLine flags: .+$")?],
    ))
}

pub fn memory() -> Result<InfoGrammar, GcLogError> {
    Ok(InfoGrammar::new(
        EventKind::HeaderMemory,
        vec![Pattern::legacy(
            "header_memory",
            r"^Memory: \d+k page, physical \d+k\(\d+k free\)(?:, swap \d+k\(\d+k free\))?$",
        )?],
    ))
}

pub fn version() -> Result<InfoGrammar, GcLogError> {
    Ok(InfoGrammar::new(
        EventKind::HeaderVersion,
        vec![Pattern::legacy(
            "header_version",
            r"^(?:OpenJDK|Java HotSpot\(TM\)) .*\(.+\) for .+$",
        )?],
    ))
}

pub fn log_rotation() -> Result<InfoGrammar, GcLogError> {
    Ok(InfoGrammar::new(
        EventKind::LogRotation,
        vec![Pattern::any(
            "log_rotation",
            r"^\s*GC log file (?:created .+|has reached the maximum size\. Saved as .+)$",
        )?],
    ))
}

pub fn tenuring_distribution() -> Result<InfoGrammar, GcLogError> {
    Ok(InfoGrammar::new(
        EventKind::TenuringDistribution,
        vec![Pattern::any(
            "tenuring_distribution",
            r"^(?:Desired survivor size \d+ bytes, new threshold \d+ \(max(?: threshold)? \d+\)|- age +\d+: +\d+ bytes, +\d+ total)$",
        )?],
    ))
}

pub fn class_unloading() -> Result<InfoGrammar, GcLogError> {
    Ok(InfoGrammar::new(
        EventKind::ClassUnloading,
        vec![Pattern::legacy("class_unloading", r"^\[(?:Unloading|Loaded) class .+\]$")?],
    ))
}

pub fn footer_heap() -> Result<InfoGrammar, GcLogError> {
    Ok(InfoGrammar::new(
        EventKind::FooterHeap,
        vec![Pattern::legacy("footer_heap", r"^Heap$")?],
    ))
}

pub fn gc_overhead_limit() -> Result<InfoGrammar, GcLogError> {
    Ok(InfoGrammar::new(
        EventKind::GcOverheadLimit,
        vec![Pattern::legacy(
            "gc_overhead_limit",
            r"^\s*GC time (?:would exceed|is exceeding) GCTimeLimit of \d{1,3}%$",
        )?],
    ))
}

pub fn blank_line() -> Result<InfoGrammar, GcLogError> {
    Ok(InfoGrammar::new(
        EventKind::BlankLine,
        vec![Pattern::any("blank_line", r"^\s*$")?],
    ))
}

/// Unified-logging startup banner (`gc,init` and `Using G1`).
pub struct GcInfoGrammar {
    banner: Regex,
}

impl GcInfoGrammar {
    pub fn new() -> Result<Self, GcLogError> {
        Ok(Self {
            banner: compile("gc_info", r"^(?:Using [A-Z][A-Za-z ]+|Version: .+|CPUs: .+|Memory: \d+[KMG])$")?,
        })
    }
}

impl EventGrammar for GcInfoGrammar {
    fn kind(&self) -> EventKind {
        EventKind::GcInfo
    }

    fn matches(&self, line: &DecoratedLine<'_>, _prior: &Prior<'_>) -> bool {
        match &line.decorator.unified {
            Some(tags) => tags.has("init") || self.banner.is_match(line.body),
            None => false,
        }
    }

    fn extract(&self, line: &DecoratedLine<'_>, _prior: &Prior<'_>) -> Option<TypedEvent> {
        Some(TypedEvent::GcInfo(Info {
            stamp: line.stamp,
            text: line.body.trim().to_string(),
        }))
    }
}
