//! Check a CloudWatch Logs group for lines matching a pattern
//!
//! Matched lines are counted against `--warning-over` and
//! `--critical-over`. Scans are incremental: a state file remembers how far
//! the previous run got, so each invocation only reports new lines.

mod args;
mod cloudwatch;
mod scan;
mod sigv4;
mod state;

use std::env;

use structopt::StructOpt;

use stratus_plugins::{CheckResult, Status};

use crate::args::Args;
use crate::cloudwatch::{CloudWatchLogsClient, FilteredLogEvent};
use crate::scan::{LogScanner, ScanError};
use crate::state::{default_state_dir, state_file_name, CursorStore};

const CHECK_NAME: &str = "CloudWatch Logs";

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let argv: Vec<String> = env::args().skip(1).collect();
    let args = Args::from_args();
    run(&args, &argv)
        .unwrap_or_else(|err| CheckResult::unknown(err.to_string()))
        .exit(CHECK_NAME);
}

/// `AWS_PROFILE` feeds both credential lookup and the state file key, so
/// switching profiles never reuses another profile's cursor.
fn active_profile() -> String {
    env::var("AWS_PROFILE")
        .ok()
        .filter(|profile| !profile.is_empty())
        .unwrap_or_else(|| cloudwatch::DEFAULT_PROFILE.to_owned())
}

fn run(args: &Args, argv: &[String]) -> Result<CheckResult, ScanError> {
    let profile = active_profile();
    let state_dir = args.state_dir.clone().unwrap_or_else(default_state_dir);
    let store = CursorStore::new(
        &state_dir,
        &state_file_name(&args.log_group_name, argv, &profile),
    );

    let region = cloudwatch::resolve_region(args.region.as_deref(), &profile)?;
    let credentials = cloudwatch::resolve_credentials(
        args.access_key_id.as_deref(),
        args.secret_access_key.as_deref(),
        &profile,
    )?;
    let client = CloudWatchLogsClient::new(region, credentials)?;

    let events = LogScanner::new(&client, &store, &args.log_group_name, &args.pattern).scan()?;
    Ok(evaluate(&events, args))
}

/// Map the match count to a result, mentioning the crossed threshold and
/// always naming the pattern. With `--return` the matched lines follow on
/// their own lines.
fn evaluate(events: &[FilteredLogEvent], args: &Args) -> CheckResult {
    let count = events.len();
    let mut status = Status::Ok;
    let mut message = count.to_string();
    if count > args.critical_over {
        status = Status::Critical;
        message += &format!(" > {}", args.critical_over);
    } else if count > args.warning_over {
        status = Status::Warning;
        message += &format!(" > {}", args.warning_over);
    }
    message += &format!(" messages for pattern /{}/", args.pattern);
    if args.return_content && !events.is_empty() {
        message.push('\n');
        for event in events {
            message.push_str(&event.message);
        }
    }
    CheckResult::new(status, message)
}
