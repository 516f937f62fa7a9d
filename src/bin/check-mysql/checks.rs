//! The subcommand checks
//!
//! Each check connects, runs a statement or two, and maps the answer to a
//! result. The judgment functions are pure so they can be exercised
//! without a server.

use std::collections::HashMap;

use mysql::Value;

use stratus_plugins::{CheckResult, Status};

use crate::args::{MysqlOpts, OnOff};
use crate::db::{self, CheckError};
use crate::version::MysqlVersion;

/// The statement and column names replication status is reported under.
///
/// MySQL 8.0.22 renamed the SLAVE statements and columns to their REPLICA
/// equivalents, and 8.4 dropped the old names entirely, so the server
/// version picks the vocabulary.
pub(crate) struct ReplicationTerms {
    status_query: &'static str,
    io_running: &'static str,
    sql_running: &'static str,
    lag: &'static str,
}

const REPLICA_TERMS: ReplicationTerms = ReplicationTerms {
    status_query: "SHOW REPLICA STATUS",
    io_running: "Replica_IO_Running",
    sql_running: "Replica_SQL_Running",
    lag: "Seconds_Behind_Source",
};

const SLAVE_TERMS: ReplicationTerms = ReplicationTerms {
    status_query: "SHOW SLAVE STATUS",
    io_running: "Slave_IO_Running",
    sql_running: "Slave_SQL_Running",
    lag: "Seconds_Behind_Master",
};

impl ReplicationTerms {
    fn for_version(version: MysqlVersion) -> &'static ReplicationTerms {
        const RENAME: MysqlVersion = MysqlVersion {
            major: 8,
            minor: 0,
            patch: 22,
        };
        if version >= RENAME {
            &REPLICA_TERMS
        } else {
            &SLAVE_TERMS
        }
    }
}

pub(crate) fn check_replication(
    mysql: &MysqlOpts,
    warning: i64,
    critical: i64,
) -> Result<CheckResult, CheckError> {
    let mut conn = db::connect(mysql)?;
    let terms = ReplicationTerms::for_version(db::server_version(&mut conn)?);
    let row = db::first_row_map(&mut conn, terms.status_query)?;
    Ok(replication_result(terms, row.as_ref(), warning, critical))
}

fn replication_result(
    terms: &ReplicationTerms,
    row: Option<&HashMap<String, Value>>,
    warning: i64,
    critical: i64,
) -> CheckResult {
    let row = match row {
        Some(row) => row,
        None => return CheckResult::new(Status::Ok, "this server is not a replica"),
    };
    let io = db::text_value(row, terms.io_running).unwrap_or_default();
    let sql = db::text_value(row, terms.sql_running).unwrap_or_default();
    if io != "Yes" || sql != "Yes" {
        return CheckResult::new(
            Status::Critical,
            format!(
                "{} is {:?}, {} is {:?}",
                terms.io_running, io, terms.sql_running, sql
            ),
        );
    }
    let lag = match db::int_value(row, terms.lag) {
        Some(lag) => lag,
        None => return CheckResult::unknown(format!("{} is NULL", terms.lag)),
    };
    if lag > critical {
        CheckResult::new(
            Status::Critical,
            format!("{} seconds behind (> {})", lag, critical),
        )
    } else if lag > warning {
        CheckResult::new(
            Status::Warning,
            format!("{} seconds behind (> {})", lag, warning),
        )
    } else {
        CheckResult::new(Status::Ok, format!("{} seconds behind", lag))
    }
}

pub(crate) fn check_connection(
    mysql: &MysqlOpts,
    warning: i64,
    critical: i64,
) -> Result<CheckResult, CheckError> {
    let mut conn = db::connect(mysql)?;
    let connected = db::global_status(&mut conn, "Threads_connected")?;
    Ok(connection_result(connected, warning, critical))
}

fn connection_result(connected: i64, warning: i64, critical: i64) -> CheckResult {
    if connected > critical {
        CheckResult::new(
            Status::Critical,
            format!("{} connections (> {})", connected, critical),
        )
    } else if connected > warning {
        CheckResult::new(
            Status::Warning,
            format!("{} connections (> {})", connected, warning),
        )
    } else {
        CheckResult::new(Status::Ok, format!("{} connections", connected))
    }
}

pub(crate) fn check_uptime(
    mysql: &MysqlOpts,
    warning: i64,
    critical: i64,
) -> Result<CheckResult, CheckError> {
    let mut conn = db::connect(mysql)?;
    let uptime = db::global_status(&mut conn, "Uptime")?;
    Ok(uptime_result(uptime, warning, critical))
}

/// Uptime alerts under the threshold: a freshly restarted server is the
/// suspicious one.
fn uptime_result(uptime: i64, warning: i64, critical: i64) -> CheckResult {
    let pretty = format_uptime(uptime);
    if uptime < critical {
        CheckResult::new(
            Status::Critical,
            format!("{} (< {} seconds)", pretty, critical),
        )
    } else if uptime < warning {
        CheckResult::new(
            Status::Warning,
            format!("{} (< {} seconds)", pretty, warning),
        )
    } else {
        CheckResult::new(Status::Ok, pretty)
    }
}

/// `up N days, H:MM`, the shape `uptime(1)` prints.
fn format_uptime(seconds: i64) -> String {
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    format!("up {} days, {}:{:02}", days, hours, minutes)
}

pub(crate) fn check_readonly(
    mysql: &MysqlOpts,
    expected: OnOff,
) -> Result<CheckResult, CheckError> {
    let mut conn = db::connect(mysql)?;
    let read_only = db::global_read_only(&mut conn)?;
    Ok(readonly_result(read_only, expected))
}

fn readonly_result(read_only: i64, expected: OnOff) -> CheckResult {
    let actual = if read_only != 0 { OnOff::On } else { OnOff::Off };
    if actual == expected {
        CheckResult::new(Status::Ok, format!("read_only is {}", actual))
    } else {
        CheckResult::new(
            Status::Critical,
            format!("read_only is {}, expected {}", actual, expected),
        )
    }
}
