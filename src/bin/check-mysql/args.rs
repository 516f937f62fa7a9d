//! Command line parsing
//!
//! Every subcommand shares the connection options; the flag letters keep
//! the established contract (`-p` is the port, `-P` the password).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use structopt::StructOpt;

/// Connection options shared by every subcommand.
#[derive(Clone, Debug, Deserialize, StructOpt)]
pub(crate) struct MysqlOpts {
    #[structopt(
        short = "H",
        long = "host",
        value_name = "HOST",
        default_value = "localhost",
        help = "Hostname"
    )]
    pub host: String,
    #[structopt(
        short = "p",
        long = "port",
        value_name = "PORT",
        default_value = "3306",
        help = "Port"
    )]
    pub port: u16,
    #[structopt(
        short = "S",
        long = "socket",
        value_name = "SOCKET",
        help = "Path to unix socket"
    )]
    pub socket: Option<PathBuf>,
    #[structopt(
        short = "u",
        long = "user",
        value_name = "USER",
        default_value = "root",
        help = "Username"
    )]
    pub user: String,
    #[structopt(
        short = "P",
        long = "password",
        value_name = "PASSWORD",
        env = "MYSQL_PASSWORD",
        hide_env_values = true,
        help = "Password"
    )]
    pub password: Option<String>,
    #[structopt(
        long = "config",
        value_name = "FILE",
        help = "my.cnf format file to read connection values from"
    )]
    pub cnf: Option<PathBuf>,
    #[structopt(
        long = "profile",
        value_name = "PROFILE",
        default_value = "client",
        help = "my.cnf profile to use"
    )]
    pub profile: String,
    #[structopt(long = "tls", help = "Enable a TLS connection")]
    pub tls: bool,
    #[structopt(
        long = "tls-root-cert",
        value_name = "PEM",
        help = "Root certificate used for TLS certificate verification"
    )]
    pub tls_root_cert: Option<PathBuf>,
    #[structopt(long = "tls-skip-verify", help = "Disable TLS certificate verification")]
    pub tls_skip_verify: bool,
}

/// Expected value of `@@global.read_only`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub(crate) enum OnOff {
    On,
    Off,
}

impl FromStr for OnOff {
    type Err = String;

    fn from_str(s: &str) -> Result<OnOff, String> {
        match s {
            "ON" => Ok(OnOff::On),
            "OFF" => Ok(OnOff::Off),
            _ => Err(format!("expected ON or OFF, got {:?}", s)),
        }
    }
}

impl fmt::Display for OnOff {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OnOff::On => write!(f, "ON"),
            OnOff::Off => write!(f, "OFF"),
        }
    }
}

/// Check a MySQL server.
#[derive(Debug, Deserialize, StructOpt)]
#[structopt(
    name = "check-mysql (part of stratus-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp,
    after_help = "Examples:

    Warn when a replica is more than a minute behind, critical at five:

        check-mysql replication -H db1 -u monitor -w 60 -c 300

    Make sure a primary has not been flipped to read-only:

        check-mysql readonly -H db1 --config /etc/my.cnf OFF"
)]
pub(crate) enum Command {
    /// Check replication thread health and lag on a replica
    #[structopt(name = "replication")]
    Replication {
        #[structopt(flatten)]
        mysql: MysqlOpts,
        #[structopt(
            short = "w",
            long = "warning",
            value_name = "SECONDS",
            default_value = "250",
            help = "Warn if the replica is behind by over this many seconds"
        )]
        warning: i64,
        #[structopt(
            short = "c",
            long = "critical",
            value_name = "SECONDS",
            default_value = "500",
            help = "Critical if the replica is behind by over this many seconds"
        )]
        critical: i64,
    },
    /// Check the number of connected threads
    #[structopt(name = "connection")]
    Connection {
        #[structopt(flatten)]
        mysql: MysqlOpts,
        #[structopt(
            short = "w",
            long = "warning",
            value_name = "N",
            default_value = "250",
            help = "Warn if connections is over a number"
        )]
        warning: i64,
        #[structopt(
            short = "c",
            long = "critical",
            value_name = "N",
            default_value = "280",
            help = "Critical if connections is over a number"
        )]
        critical: i64,
    },
    /// Check that the server has been up long enough
    #[structopt(name = "uptime")]
    Uptime {
        #[structopt(flatten)]
        mysql: MysqlOpts,
        #[structopt(
            short = "w",
            long = "warning",
            value_name = "SECONDS",
            default_value = "0",
            help = "Warn if uptime is under this many seconds"
        )]
        warning: i64,
        #[structopt(
            short = "c",
            long = "critical",
            value_name = "SECONDS",
            default_value = "0",
            help = "Critical if uptime is under this many seconds"
        )]
        critical: i64,
    },
    /// Check that @@global.read_only matches the expected value
    #[structopt(name = "readonly")]
    Readonly {
        #[structopt(flatten)]
        mysql: MysqlOpts,
        #[structopt(name = "ON|OFF", help = "Expected value of @@global.read_only")]
        expected: OnOff,
    },
}

#[cfg(test)]
mod test {
    use structopt::StructOpt;

    use super::{Command, MysqlOpts, OnOff};

    #[test]
    fn connection_defaults() {
        let opts = MysqlOpts::from_iter(vec!["check-mysql"]);
        assert_eq!(opts.host, "localhost");
        assert_eq!(opts.port, 3306);
        assert_eq!(opts.socket, None);
        assert_eq!(opts.user, "root");
        assert_eq!(opts.profile, "client");
        assert_eq!(opts.tls, false);
    }

    #[test]
    fn short_flags_keep_their_letters() {
        let opts = MysqlOpts::from_iter(vec![
            "check-mysql",
            "-H",
            "db1.internal",
            "-p",
            "3307",
            "-u",
            "monitor",
            "-P",
            "hunter2",
            "-S",
            "/run/mysqld/mysqld.sock",
        ]);
        assert_eq!(opts.host, "db1.internal");
        assert_eq!(opts.port, 3307);
        assert_eq!(opts.user, "monitor");
        assert_eq!(opts.password, Some("hunter2".to_owned()));
        assert_eq!(opts.socket, Some("/run/mysqld/mysqld.sock".into()));
    }

    #[test]
    fn replication_thresholds() {
        let command = Command::from_iter(vec!["check-mysql", "replication"]);
        match command {
            Command::Replication {
                warning, critical, ..
            } => {
                assert_eq!(warning, 250);
                assert_eq!(critical, 500);
            }
            other => panic!("parsed {:?}", other),
        }

        let command =
            Command::from_iter(vec!["check-mysql", "replication", "-w", "60", "-c", "300"]);
        match command {
            Command::Replication {
                warning, critical, ..
            } => {
                assert_eq!(warning, 60);
                assert_eq!(critical, 300);
            }
            other => panic!("parsed {:?}", other),
        }
    }

    #[test]
    fn readonly_takes_a_positional_expectation() {
        let command = Command::from_iter(vec!["check-mysql", "readonly", "ON"]);
        match command {
            Command::Readonly { expected, .. } => assert_eq!(expected, OnOff::On),
            other => panic!("parsed {:?}", other),
        }

        assert!(Command::from_iter_safe(vec!["check-mysql", "readonly"]).is_err());
        assert!(Command::from_iter_safe(vec!["check-mysql", "readonly", "maybe"]).is_err());
    }

    #[test]
    fn a_subcommand_is_required() {
        assert!(Command::from_iter_safe(vec!["check-mysql"]).is_err());
        assert!(Command::from_iter_safe(vec!["check-mysql", "explode"]).is_err());
    }
}
