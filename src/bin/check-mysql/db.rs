//! Connection building and query helpers
//!
//! SHOW-style statements answer over the text protocol with wide,
//! version-dependent column sets, so rows get turned into name → value
//! maps and read back out by column name.

use std::collections::HashMap;
use std::fmt;

use derive_more::From;
use mysql::prelude::Queryable;
use mysql::{from_value_opt, Conn, OptsBuilder, Row, SslOpts, Value};

use crate::args::MysqlOpts;
use crate::mycnf::{self, CnfError};
use crate::version::MysqlVersion;

#[derive(Debug, From)]
pub(crate) enum CheckError {
    /// my.cnf handling failed
    Cnf(CnfError),
    /// The driver reported a connection or query failure
    Mysql(mysql::Error),
    /// The server answered with a shape we cannot use
    BadReply(String),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CheckError::Cnf(e) => write!(f, "{}", e),
            CheckError::Mysql(e) => write!(f, "{}", e),
            CheckError::BadReply(e) => write!(f, "{}", e),
        }
    }
}

/// Open a connection per the resolved options. `--config` values are
/// applied first; an explicit socket wins over host and port.
pub(crate) fn connect(opts: &MysqlOpts) -> Result<Conn, CheckError> {
    let opts = mycnf::apply(opts)?;
    let mut builder = OptsBuilder::new()
        .user(Some(opts.user.clone()))
        .pass(opts.password.clone())
        .prefer_socket(false);
    builder = match &opts.socket {
        Some(socket) => builder.socket(Some(socket.display().to_string())),
        None => builder
            .ip_or_hostname(Some(opts.host.clone()))
            .tcp_port(opts.port),
    };
    if opts.tls {
        let mut ssl = SslOpts::default();
        if let Some(path) = &opts.tls_root_cert {
            ssl = ssl.with_root_cert_path(Some(path.clone()));
        }
        if opts.tls_skip_verify {
            ssl = ssl
                .with_danger_accept_invalid_certs(true)
                .with_danger_skip_domain_validation(true);
        }
        builder = builder.ssl_opts(Some(ssl));
    }
    Ok(Conn::new(builder)?)
}

/// `SELECT VERSION()` reduced to its numeric triple.
pub(crate) fn server_version(conn: &mut Conn) -> Result<MysqlVersion, CheckError> {
    let raw: Option<String> = conn.query_first("SELECT VERSION()")?;
    let raw = raw.ok_or_else(|| {
        CheckError::BadReply("SELECT VERSION() returned no row".to_owned())
    })?;
    raw.parse()
        .map_err(|err| CheckError::BadReply(format!("{}", err)))
}

/// One numeric value out of `SHOW GLOBAL STATUS LIKE '<name>'`. Statuses
/// the server reports as words rather than numbers are a bad reply, not a
/// conversion panic.
pub(crate) fn global_status(conn: &mut Conn, name: &str) -> Result<i64, CheckError> {
    let row = first_row_map(conn, &format!("SHOW GLOBAL STATUS LIKE '{}'", name))?
        .ok_or_else(|| CheckError::BadReply(format!("no {} in SHOW GLOBAL STATUS", name)))?;
    int_value(&row, "Value").ok_or_else(|| {
        CheckError::BadReply(format!("{} is not a number in SHOW GLOBAL STATUS", name))
    })
}

/// `SELECT @@global.read_only`: 1 when the server refuses writes.
pub(crate) fn global_read_only(conn: &mut Conn) -> Result<i64, CheckError> {
    let value: Option<i64> = conn.query_first("SELECT @@global.read_only")?;
    value.ok_or_else(|| {
        CheckError::BadReply("SELECT @@global.read_only returned no row".to_owned())
    })
}

/// The first result row of `query` as a column-name → value map, or None
/// when the statement returns nothing.
pub(crate) fn first_row_map(
    conn: &mut Conn,
    query: &str,
) -> Result<Option<HashMap<String, Value>>, CheckError> {
    let row: Option<Row> = conn.query_first(query)?;
    Ok(row.map(|row| {
        let columns = row.columns();
        columns
            .iter()
            .map(|column| column.name_str().into_owned())
            .zip(row.unwrap())
            .collect()
    }))
}

/// Text form of a column; NULL and absent columns are both None.
pub(crate) fn text_value(row: &HashMap<String, Value>, column: &str) -> Option<String> {
    match row.get(column) {
        None | Some(Value::NULL) => None,
        Some(value) => from_value_opt(value.clone()).ok(),
    }
}

/// Numeric form of a column; the text protocol hands numbers over as
/// byte strings, so both get parsed.
pub(crate) fn int_value(row: &HashMap<String, Value>, column: &str) -> Option<i64> {
    match row.get(column) {
        None | Some(Value::NULL) => None,
        Some(value) => from_value_opt(value.clone()).ok(),
    }
}
