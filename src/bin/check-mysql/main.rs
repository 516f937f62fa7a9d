//! Check a MySQL server
//!
//! Subcommands cover replication health, connection count, uptime, and the
//! read-only flag. Each prints a single result line named after the
//! subcommand, like `MySQL Replication OK: 3 seconds behind`.

mod args;
mod checks;
mod db;
mod mycnf;
mod version;

use structopt::StructOpt;

use stratus_plugins::CheckResult;

use crate::args::Command;

fn main() {
    let command = Command::from_args();
    let (name, result) = match &command {
        Command::Replication {
            mysql,
            warning,
            critical,
        } => (
            "MySQL Replication",
            checks::check_replication(mysql, *warning, *critical),
        ),
        Command::Connection {
            mysql,
            warning,
            critical,
        } => (
            "MySQL Connection",
            checks::check_connection(mysql, *warning, *critical),
        ),
        Command::Uptime {
            mysql,
            warning,
            critical,
        } => (
            "MySQL Uptime",
            checks::check_uptime(mysql, *warning, *critical),
        ),
        Command::Readonly { mysql, expected } => (
            "MySQL Readonly",
            checks::check_readonly(mysql, *expected),
        ),
    };
    result
        .unwrap_or_else(|err| CheckResult::unknown(err.to_string()))
        .exit(name);
}
