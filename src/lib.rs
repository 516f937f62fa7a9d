//! Shared plumbing for the stratus check plugins.
//!
//! Every binary in this crate is a standalone monitoring check: it evaluates
//! one condition, prints a single result line to stdout, and exits with the
//! conventional monitoring-plugin status code. This module holds the pieces
//! all of them share, the `Status` vocabulary and the `CheckResult` that
//! carries a status plus its message to the process exit.

pub mod scripts;

use std::fmt;
use std::process;

/// The canonical monitoring-plugin statuses.
///
/// Exit codes follow the convention every check scheduler understands:
/// OK=0, WARNING=1, CRITICAL=2, UNKNOWN=3.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    /// Terminate the process with this status' exit code.
    pub fn exit(self) -> ! {
        process::exit(self.exit_code())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        write!(f, "{}", label)
    }
}

/// The outcome of one check run.
///
/// Checks build one of these and hand it to `exit`, which prints the
/// result line (`<name> <STATUS>: <message>`) and terminates.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckResult {
    pub status: Status,
    pub message: String,
}

impl CheckResult {
    pub fn new<S: Into<String>>(status: Status, message: S) -> CheckResult {
        CheckResult {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for the error path every check funnels failures through.
    pub fn unknown<S: Into<String>>(message: S) -> CheckResult {
        CheckResult::new(Status::Unknown, message)
    }

    /// Print the result line under the given plugin name and exit.
    pub fn exit(self, name: &str) -> ! {
        println!("{} {}", name, self);
        self.status.exit()
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

#[cfg(test)]
mod test {
    use super::{CheckResult, Status};

    #[test]
    fn exit_codes_follow_the_plugin_convention() {
        assert_eq!(Status::Ok.exit_code(), 0);
        assert_eq!(Status::Warning.exit_code(), 1);
        assert_eq!(Status::Critical.exit_code(), 2);
        assert_eq!(Status::Unknown.exit_code(), 3);
    }

    #[test]
    fn statuses_display_uppercase() {
        assert_eq!(Status::Ok.to_string(), "OK");
        assert_eq!(Status::Warning.to_string(), "WARNING");
        assert_eq!(Status::Critical.to_string(), "CRITICAL");
        assert_eq!(Status::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn result_line_has_status_and_message() {
        let result = CheckResult::new(Status::Critical, "21 > 20 messages for pattern /error/");
        assert_eq!(
            format!("CloudWatch Logs {}", result),
            "CloudWatch Logs CRITICAL: 21 > 20 messages for pattern /error/"
        );
    }

    #[test]
    fn unknown_is_a_shorthand() {
        let result = CheckResult::unknown("no AWS region configured");
        assert_eq!(result.status, Status::Unknown);
        assert_eq!(result.to_string(), "UNKNOWN: no AWS region configured");
    }
}
