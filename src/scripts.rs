//! Documentation about the various scripts contained herein
//!
//! - [check-cloudwatch-logs](#check-cloudwatch-logs)
//! - [check-mysql](#check-mysql)
//!
//! # check-cloudwatch-logs
//!
//! Needs AWS credentials with `logs:FilterLogEvents` on the group.
//!
//! ```plain
//! $ check-cloudwatch-logs --help
//! check-cloudwatch-logs (part of stratus-plugins) 0.1.0
//! Check a CloudWatch Logs group for lines matching a pattern.
//!
//! Scans are incremental: each run picks up where the previous one left off, remembering its place
//! in a state file keyed on the log group, the arguments, and the active AWS profile.
//!
//! USAGE:
//!     check-cloudwatch-logs [FLAGS] [OPTIONS] --log-group-name <LOG-GROUP-NAME> --pattern <PATTERN>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -r, --return     Output matched lines
//!     -V, --version    Prints version information
//!
//! OPTIONS:
//!         --access-key-id <ACCESS-KEY-ID>            AWS access key ID
//!     -c, --critical-over <CRITICAL>                 Critical if matched lines is over a number [default: 0]
//!         --log-group-name <LOG-GROUP-NAME>          Log group name
//!     -p, --pattern <PATTERN>                        Pattern to search for. The value is recognized as the
//!                                                    pattern syntax of CloudWatch Logs.
//!         --region <REGION>                          AWS region
//!         --secret-access-key <SECRET-ACCESS-KEY>    AWS secret access key
//!     -s, --state-dir <DIR>                          Dir to keep state files under
//!     -w, --warning-over <WARNING>                   Warn if matched lines is over a number [default: 0]
//!
//! Examples:
//!
//!     Warn when any line in the group mentions ERROR, going critical over 10,
//!     printing the matched lines:
//!
//!         check-cloudwatch-logs --log-group-name /aws/lambda/sample \
//!             --pattern ERROR --critical-over 10 --return
//! ```
//!
//! # check-mysql
//!
//! Needs a MySQL account that can run `SHOW GLOBAL STATUS` and, for the
//! replication check, `SHOW REPLICA STATUS` (`REPLICATION CLIENT`).
//!
//! ```plain
//! $ check-mysql --help
//! check-mysql (part of stratus-plugins) 0.1.0
//! Check a MySQL server.
//!
//! USAGE:
//!     check-mysql <SUBCOMMAND>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! SUBCOMMANDS:
//!     connection     Check the number of connected threads
//!     help           Prints this message or the help of the given subcommand(s)
//!     readonly       Check that @@global.read_only matches the expected value
//!     replication    Check replication thread health and lag on a replica
//!     uptime         Check that the server has been up long enough
//!
//! Examples:
//!
//!     Warn when a replica is more than a minute behind, critical at five:
//!
//!         check-mysql replication -H db1 -u monitor -w 60 -c 300
//!
//!     Make sure a primary has not been flipped to read-only:
//!
//!         check-mysql readonly -H db1 --config /etc/my.cnf OFF
//! ```
//!
//! Every subcommand takes the same connection options:
//!
//! ```plain
//! $ check-mysql replication --help
//! check-mysql-replication 0.1.0
//! Check replication thread health and lag on a replica
//!
//! USAGE:
//!     check-mysql replication [FLAGS] [OPTIONS]
//!
//! FLAGS:
//!     -h, --help               Prints help information
//!         --tls                Enable a TLS connection
//!         --tls-skip-verify    Disable TLS certificate verification
//!     -V, --version            Prints version information
//!
//! OPTIONS:
//!         --config <FILE>          my.cnf format file to read connection values from
//!     -c, --critical <SECONDS>     Critical if the replica is behind by over this many seconds [default: 500]
//!     -H, --host <HOST>            Hostname [default: localhost]
//!     -P, --password <PASSWORD>    Password [env: MYSQL_PASSWORD]
//!     -p, --port <PORT>            Port [default: 3306]
//!         --profile <PROFILE>      my.cnf profile to use [default: client]
//!     -S, --socket <SOCKET>        Path to unix socket
//!         --tls-root-cert <PEM>    Root certificate used for TLS certificate verification
//!     -u, --user <USER>            Username [default: root]
//!     -w, --warning <SECONDS>      Warn if the replica is behind by over this many seconds [default: 250]
//! ```
