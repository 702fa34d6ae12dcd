/*
    LogFox
    https://github.com/dbalsom/logfox

    Copyright 2024-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/errors.rs

    Parse diagnostics. Both well-log formats tolerate a fair amount of
    corruption in the wild, so parsers accumulate issue records on the
    structures they produce instead of failing outright. A process-wide
    escape level decides which severities are merely logged and which
    surface as failures to the caller.
*/

use std::{
    fmt,
    fmt::{Display, Formatter},
    sync::atomic::{AtomicU8, Ordering},
};

use crate::WellLogError;

#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl Severity {
    /// Step a severity down one level when it is propagated from child to
    /// parent. A single malformed attribute should not lift a whole logical
    /// file to ERROR, so ERROR becomes WARNING; WARNING is severe enough
    /// that the fact it happened must stay visible, and INFO/DEBUG have
    /// nowhere lower to go.
    pub fn decrease(self) -> Severity {
        match self {
            Severity::Error => Severity::Warning,
            other => other,
        }
    }

    fn from_u8(value: u8) -> Severity {
        match value {
            0 => Severity::Debug,
            1 => Severity::Info,
            2 => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Severity::Debug => write!(f, "debug"),
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic recorded while parsing: what went wrong, where the
/// standard defines the violated rule, and what the parser did about it.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseIssue {
    pub severity: Severity,
    pub problem: String,
    pub specification: String,
    pub action: String,
}

impl ParseIssue {
    pub fn new(
        severity: Severity,
        problem: impl Into<String>,
        specification: impl Into<String>,
        action: impl Into<String>,
    ) -> ParseIssue {
        ParseIssue {
            severity,
            problem: problem.into(),
            specification: specification.into(),
            action: action.into(),
        }
    }

    pub fn message(&self) -> String {
        let mut msg = format!("Problem: {}.", self.problem);
        if !self.specification.is_empty() {
            msg.push_str(&format!("\nSpecification reference: {}.", self.specification));
        }
        if !self.action.is_empty() {
            msg.push_str(&format!("\nTaken action: {}.", self.action));
        }
        msg
    }
}

static ESCAPE_LEVEL: AtomicU8 = AtomicU8::new(Severity::Warning as u8);

/// The threshold at or below which issues are sent to the logger and
/// execution continues. Issues above it surface as failures.
pub fn escape_level() -> Severity {
    Severity::from_u8(ESCAPE_LEVEL.load(Ordering::Relaxed))
}

/// Set the process-wide escape level. Intended to be called once at
/// startup; changing it concurrently with active parsing is on the caller.
pub fn set_escape_level(severity: Severity) {
    ESCAPE_LEVEL.store(severity as u8, Ordering::Relaxed);
}

fn log_message(severity: Severity, msg: &str) {
    match severity {
        Severity::Debug => log::debug!("{}", msg),
        Severity::Info => log::info!("{}", msg),
        Severity::Warning => log::warn!("{}", msg),
        Severity::Error => log::error!("{}", msg),
    }
}

/// Route a batch of issues through the escape level: each one at or below
/// the level is logged, the first one above it fails the operation.
pub fn report(issues: &[ParseIssue], context: &str) -> Result<(), WellLogError> {
    for issue in issues {
        let msg = format!("At: {}\n{}", context, issue.message());
        if escape_level() < issue.severity {
            return Err(WellLogError::Parse(msg));
        }
        log_message(issue.severity, &msg);
    }
    Ok(())
}

/// Log issues without ever escalating. Used by the index scanners, whose
/// contract is to terminate cleanly and leave the already-indexed portion
/// usable no matter what they ran into.
pub fn log_issues(issues: &[ParseIssue], context: &str) {
    for issue in issues {
        let msg = format!("At: {}\n{}", context, issue.message());
        log_message(issue.severity, &msg);
    }
}

/// The worst severity among a set of issues, or DEBUG when there are none.
pub fn max_severity(issues: &[ParseIssue]) -> Severity {
    issues.iter().fold(Severity::Debug, |acc, issue| acc.max(issue.severity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrease_steps_error_down_and_keeps_the_rest() {
        assert_eq!(Severity::Error.decrease(), Severity::Warning);
        assert_eq!(Severity::Warning.decrease(), Severity::Warning);
        assert_eq!(Severity::Info.decrease(), Severity::Info);
        assert_eq!(Severity::Debug.decrease(), Severity::Debug);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn message_skips_empty_sections() {
        let issue = ParseIssue::new(Severity::Info, "short record", "", "skipped");
        let msg = issue.message();
        assert!(msg.contains("Problem: short record."));
        assert!(!msg.contains("Specification reference"));
        assert!(msg.contains("Taken action: skipped."));
    }

    #[test]
    fn max_severity_of_empty_is_debug() {
        assert_eq!(max_severity(&[]), Severity::Debug);
    }

    #[test]
    fn escape_level_gates_escalation() {
        let error_issue = ParseIssue::new(Severity::Error, "bad attribute", "", "continued");

        // raising the level makes ERROR issues log instead of fail
        set_escape_level(Severity::Error);
        assert!(report(&[error_issue.clone()], "context").is_ok());

        // at the default threshold they surface as failures
        set_escape_level(Severity::Warning);
        assert!(report(&[error_issue], "context").is_err());

        let warning_issue = ParseIssue::new(Severity::Warning, "odd value", "", "continued");
        assert!(report(&[warning_issue], "context").is_ok());
    }
}
