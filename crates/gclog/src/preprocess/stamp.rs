//! Stamp normalizer — reduce duplicated or garbled legacy decorators.
//!
//! Misconfigured logging (several `-Xloggc` writers, or stamps enabled twice)
//! produces lines like `DS: DS: TS: TS: [GC ...`, sometimes with the colon
//! missing or two stamps run together. The leading run of stamps is reduced to
//! at most one datestamp followed by at most one timestamp. A run whose copies
//! disagree belongs to two different events and the line is discarded.

use std::borrow::Cow;

use regex::Regex;

use crate::parser::model::{compile, GcLogError};
use crate::parser::{DATESTAMP, TIMESTAMP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Datestamp,
    Timestamp,
}

#[derive(Debug)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    /// Followed by `:` in the input
    separated: bool,
}

/// Result of normalizing one physical line.
#[derive(Debug, PartialEq, Eq)]
pub enum Stamped<'a> {
    Kept {
        text: Cow<'a, str>,
        /// The line carried a datestamp decorator
        datestamp: bool,
        /// A decorator appeared more than once
        repeated: bool,
    },
    Discard {
        reason: &'static str,
    },
}

impl Stamped<'_> {
    pub fn text(&self) -> Option<&str> {
        match self {
            Stamped::Kept { text, .. } => Some(text.as_ref()),
            Stamped::Discard { .. } => None,
        }
    }
}

pub struct StampNormalizer {
    datestamp: Regex,
    timestamp: Regex,
    inner_run: Regex,
}

impl StampNormalizer {
    pub fn new() -> Result<Self, GcLogError> {
        Ok(Self {
            datestamp: compile("stamp_datestamp", &format!("^{DATESTAMP}"))?,
            timestamp: compile("stamp_timestamp", &format!("^{TIMESTAMP}"))?,
            inner_run: compile(
                "stamp_inner_run",
                &format!(r"(?:(?:{DATESTAMP}|{TIMESTAMP}): ?){{2,}}"),
            )?,
        })
    }

    pub fn normalize<'a>(&self, line: &'a str) -> Stamped<'a> {
        let (tokens, payload) = self.leading_run(line);
        if tokens.is_empty() {
            return Stamped::Kept {
                text: self.collapse_inner(line),
                datestamp: false,
                repeated: false,
            };
        }

        let Some((datestamp, timestamp)) = agree(&tokens) else {
            return Stamped::Discard { reason: "conflicting decorators" };
        };
        if payload.trim().is_empty() {
            return Stamped::Discard { reason: "decorator without payload" };
        }

        let repeated = tokens.len() > usize::from(datestamp.is_some()) + usize::from(timestamp.is_some());
        let canonical = is_canonical(&tokens);
        let prefix = &line[..line.len() - payload.len()];

        let text = match (canonical, self.collapse_inner(payload)) {
            (true, Cow::Borrowed(_)) => Cow::Borrowed(line),
            (true, Cow::Owned(collapsed)) => Cow::Owned(format!("{prefix}{collapsed}")),
            (false, collapsed) => Cow::Owned(format!("{}{collapsed}", render(datestamp, timestamp))),
        };

        Stamped::Kept {
            text,
            datestamp: datestamp.is_some(),
            repeated,
        }
    }

    /// Split the leading run of stamps from the rest of the line.
    fn leading_run<'a>(&self, line: &'a str) -> (Vec<Token<'a>>, &'a str) {
        let mut tokens = Vec::new();
        let mut rest = line;
        loop {
            let (kind, found) = if let Some(m) = self.datestamp.find(rest) {
                (TokenKind::Datestamp, m)
            } else if let Some(m) = self.timestamp.find(rest) {
                (TokenKind::Timestamp, m)
            } else {
                break;
            };
            let after = &rest[found.end()..];
            let separated = after.starts_with(':');
            let after = after.strip_prefix(':').unwrap_or(after);
            let after = after.strip_prefix(' ').unwrap_or(after);

            // An unseparated number is only a stamp when another stamp or a
            // record follows it directly.
            let glued = after.starts_with('[')
                || self.datestamp.is_match(after)
                || self.timestamp.is_match(after);
            if !separated && !glued {
                break;
            }
            tokens.push(Token {
                kind,
                text: found.as_str(),
                separated,
            });
            rest = after;
        }
        (tokens, rest)
    }

    /// Collapse runs of two or more stamps inside the payload when every copy
    /// agrees. Disagreeing inner runs are left alone.
    fn collapse_inner<'a>(&self, payload: &'a str) -> Cow<'a, str> {
        if !self.inner_run.is_match(payload) {
            return Cow::Borrowed(payload);
        }
        let mut out = String::with_capacity(payload.len());
        let mut last = 0;
        let mut changed = false;
        for m in self.inner_run.find_iter(payload) {
            let (tokens, tail) = self.leading_run(m.as_str());
            let replacement = match agree(&tokens) {
                Some((ds, ts)) if tail.is_empty() => render(ds, ts),
                _ => continue,
            };
            if replacement != m.as_str() {
                out.push_str(&payload[last..m.start()]);
                out.push_str(&replacement);
                last = m.end();
                changed = true;
            }
        }
        if !changed {
            return Cow::Borrowed(payload);
        }
        out.push_str(&payload[last..]);
        Cow::Owned(out)
    }
}

/// The single datestamp and timestamp of a run, or `None` when copies differ.
fn agree<'a>(tokens: &[Token<'a>]) -> Option<(Option<&'a str>, Option<&'a str>)> {
    let mut datestamp: Option<&str> = None;
    let mut timestamp: Option<&str> = None;
    for token in tokens {
        let slot = match token.kind {
            TokenKind::Datestamp => &mut datestamp,
            TokenKind::Timestamp => &mut timestamp,
        };
        match *slot {
            Some(seen) if !same_stamp(seen, token.text) => return None,
            Some(_) => {}
            None => *slot = Some(token.text),
        }
    }
    Some((datestamp, timestamp))
}

/// Stamps compare equal regardless of the decimal separator.
fn same_stamp(a: &str, b: &str) -> bool {
    a == b || a.replace(',', ".") == b.replace(',', ".")
}

/// At most one datestamp then at most one timestamp, each followed by `:`.
fn is_canonical(tokens: &[Token<'_>]) -> bool {
    match tokens {
        [only] => only.separated,
        [first, second] => {
            first.kind == TokenKind::Datestamp
                && second.kind == TokenKind::Timestamp
                && first.separated
                && second.separated
        }
        _ => false,
    }
}

fn render(datestamp: Option<&str>, timestamp: Option<&str>) -> String {
    let mut out = String::new();
    for stamp in [datestamp, timestamp].into_iter().flatten() {
        out.push_str(stamp);
        out.push_str(": ");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(line: &str) -> Option<String> {
        StampNormalizer::new().unwrap().normalize(line).text().map(str::to_string)
    }

    // ─── untouched lines ────────────────────────────────────────────

    #[test]
    fn test_plain_lines_are_borrowed() {
        let normalizer = StampNormalizer::new().unwrap();
        for line in [
            "2.000: [GC (Allocation Failure) 2.000: [ParNew: 1K->0K(2K), 0.1 secs]",
            "2021-10-27T10:13:37.450-0400: 2.000: [GC concurrent-mark-start]",
            "[0.052s][info][gc] Using G1",
            "Total time for which application threads were stopped: 0.0001 seconds",
            "",
        ] {
            let Stamped::Kept { text, repeated, .. } = normalizer.normalize(line) else {
                panic!("discarded {line}");
            };
            assert!(matches!(text, Cow::Borrowed(_)), "{line}");
            assert!(!repeated);
        }
    }

    #[test]
    fn test_missing_space_is_kept() {
        assert_eq!(normalize("2.000:[GC 1K->0K(2K), 0.1 secs]").unwrap(), "2.000:[GC 1K->0K(2K), 0.1 secs]");
    }

    // ─── duplicated decorators ──────────────────────────────────────

    #[test]
    fn test_duplicated_datestamp_collapses() {
        let line = "2021-10-27T10:13:37.450-0400: 2021-10-27T10:13:37.450-0400: [GC concurrent-root-region-scan-start]";
        let normalizer = StampNormalizer::new().unwrap();
        let Stamped::Kept { text, datestamp, repeated } = normalizer.normalize(line) else {
            panic!("discarded");
        };
        assert_eq!(text, "2021-10-27T10:13:37.450-0400: [GC concurrent-root-region-scan-start]");
        assert!(datestamp);
        assert!(repeated);
    }

    #[test]
    fn test_duplicated_pairs_collapse() {
        let line = "2021-10-27T10:13:37.450-0400: 5.000: 2021-10-27T10:13:37.450-0400: 5.000: [GC pause (young), 0.1 secs]";
        assert_eq!(
            normalize(line).unwrap(),
            "2021-10-27T10:13:37.450-0400: 5.000: [GC pause (young), 0.1 secs]"
        );
    }

    #[test]
    fn test_concatenated_stamps_without_separator() {
        let line = "2021-10-27T10:13:37.450-04002021-10-27T10:13:37.450-0400: 5.000: [GC concurrent-mark-start]";
        assert_eq!(
            normalize(line).unwrap(),
            "2021-10-27T10:13:37.450-0400: 5.000: [GC concurrent-mark-start]"
        );
    }

    #[test]
    fn test_timestamp_before_datestamp_is_reordered() {
        let line = "5.000: 2021-10-27T10:13:37.450-0400: [GC concurrent-mark-start]";
        assert_eq!(
            normalize(line).unwrap(),
            "2021-10-27T10:13:37.450-0400: 5.000: [GC concurrent-mark-start]"
        );
    }

    #[test]
    fn test_inner_duplicate_collapses() {
        let line = "2.000: [GC (Allocation Failure) 2.001: 2.001: [ParNew: 1K->0K(2K), 0.1 secs]";
        assert_eq!(
            normalize(line).unwrap(),
            "2.000: [GC (Allocation Failure) 2.001: [ParNew: 1K->0K(2K), 0.1 secs]"
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let normalizer = StampNormalizer::new().unwrap();
        let once = normalize("5.000: 5.000: 5.000: [GC concurrent-mark-start]").unwrap();
        let twice = normalizer.normalize(&once).text().unwrap().to_string();
        assert_eq!(once, twice);
    }

    // ─── discard policy ─────────────────────────────────────────────

    #[test]
    fn test_conflicting_stamps_are_discarded() {
        let normalizer = StampNormalizer::new().unwrap();
        let line = "2021-10-27T10:13:37.450-0400: 2021-10-27T10:13:38.000-0400: [GC concurrent-mark-start]";
        assert_eq!(
            normalizer.normalize(line),
            Stamped::Discard { reason: "conflicting decorators" }
        );
        assert!(normalize("5.000: 6.000: [GC remark, 0.1 secs]").is_none());
    }

    #[test]
    fn test_stamp_without_payload_is_discarded() {
        assert!(normalize("2021-10-27T10:13:37.450-0400: ").is_none());
    }

    #[test]
    fn test_inner_conflicting_run_is_left_alone() {
        let line = "2.000: [GC 2.001: 2.002: [ParNew: 1K->0K(2K), 0.1 secs]";
        assert_eq!(normalize(line).unwrap(), line);
    }
}
