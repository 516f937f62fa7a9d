//! Command line parsing

use std::path::PathBuf;

use serde::Deserialize;
use structopt::StructOpt;

/// Check a CloudWatch Logs group for lines matching a pattern.
///
/// Scans are incremental: each run picks up where the previous one left
/// off, remembering its place in a state file keyed on the log group, the
/// arguments, and the active AWS profile.
#[derive(Deserialize, Debug, StructOpt)]
#[structopt(
    name = "check-cloudwatch-logs (part of stratus-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp,
    after_help = "Examples:

    Warn when any line in the group mentions ERROR, going critical over 10,
    printing the matched lines:

        check-cloudwatch-logs --log-group-name /aws/lambda/sample \\
            --pattern ERROR --critical-over 10 --return"
)]
pub(crate) struct Args {
    #[structopt(long = "region", value_name = "REGION", help = "AWS region")]
    pub region: Option<String>,
    #[structopt(
        long = "access-key-id",
        value_name = "ACCESS-KEY-ID",
        help = "AWS access key ID"
    )]
    pub access_key_id: Option<String>,
    #[structopt(
        long = "secret-access-key",
        value_name = "SECRET-ACCESS-KEY",
        help = "AWS secret access key"
    )]
    pub secret_access_key: Option<String>,
    #[structopt(
        long = "log-group-name",
        value_name = "LOG-GROUP-NAME",
        help = "Log group name"
    )]
    pub log_group_name: String,
    #[structopt(
        short = "p",
        long = "pattern",
        value_name = "PATTERN",
        help = "Pattern to search for. The value is recognized as the pattern \
                syntax of CloudWatch Logs."
    )]
    pub pattern: String,
    #[structopt(
        short = "w",
        long = "warning-over",
        value_name = "WARNING",
        default_value = "0",
        help = "Warn if matched lines is over a number"
    )]
    pub warning_over: usize,
    #[structopt(
        short = "c",
        long = "critical-over",
        value_name = "CRITICAL",
        default_value = "0",
        help = "Critical if matched lines is over a number"
    )]
    pub critical_over: usize,
    #[structopt(
        short = "s",
        long = "state-dir",
        value_name = "DIR",
        help = "Dir to keep state files under"
    )]
    pub state_dir: Option<PathBuf>,
    #[structopt(short = "r", long = "return", help = "Output matched lines")]
    pub return_content: bool,
}

#[cfg(test)]
mod test {
    use structopt::StructOpt;

    use super::Args;

    fn build_args(argv: Vec<&str>) -> Args {
        Args::from_iter(argv.into_iter())
    }

    #[test]
    fn defaults() {
        let args = build_args(vec![
            "check-cloudwatch-logs",
            "--log-group-name",
            "/aws/lambda/sample",
            "-p",
            "ERROR",
        ]);
        assert_eq!(args.log_group_name, "/aws/lambda/sample");
        assert_eq!(args.pattern, "ERROR");
        assert_eq!(args.warning_over, 0);
        assert_eq!(args.critical_over, 0);
        assert_eq!(args.region, None);
        assert_eq!(args.state_dir, None);
        assert_eq!(args.return_content, false);
    }

    #[test]
    fn thresholds_and_return_flag() {
        let args = build_args(vec![
            "check-cloudwatch-logs",
            "--log-group-name",
            "/aws/lambda/sample",
            "--pattern",
            "ERROR",
            "-w",
            "10",
            "-c",
            "100",
            "-s",
            "/var/tmp/checks",
            "--return",
        ]);
        assert_eq!(args.warning_over, 10);
        assert_eq!(args.critical_over, 100);
        assert_eq!(args.state_dir, Some("/var/tmp/checks".into()));
        assert_eq!(args.return_content, true);
    }

    #[test]
    fn log_group_and_pattern_are_required() {
        assert!(Args::from_iter_safe(vec!["check-cloudwatch-logs"]).is_err());
        assert!(
            Args::from_iter_safe(vec!["check-cloudwatch-logs", "-p", "ERROR"])
                .is_err()
        );
        assert!(Args::from_iter_safe(vec![
            "check-cloudwatch-logs",
            "--log-group-name",
            "/aws/lambda/sample",
        ])
        .is_err());
    }
}
