//! my.cnf style configuration
//!
//! `--config` points at a my.cnf format file and `--profile` names the
//! section to read. Values present in the section override the command
//! line flags' values; empty values and absent keys leave them alone.
//! Sections and keys are matched case-insensitively, and bare boolean keys
//! (`no-auto-rehash`) are tolerated since real my.cnf files carry them.

use std::fmt;
use std::path::{Path, PathBuf};

use configparser::ini::Ini;

use crate::args::MysqlOpts;

#[derive(Debug)]
pub(crate) enum CnfError {
    /// The file could not be read or parsed
    Read { path: PathBuf, message: String },
    /// The requested profile section is absent
    MissingProfile { profile: String, path: PathBuf },
    /// A port override that is not a TCP port number
    InvalidPort { value: String, path: PathBuf },
}

impl fmt::Display for CnfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CnfError::Read { path, message } => {
                write!(f, "could not read {}: {}", path.display(), message)
            }
            CnfError::MissingProfile { profile, path } => {
                write!(f, "cannot find profile {} in {}", profile, path.display())
            }
            CnfError::InvalidPort { value, path } => {
                write!(f, "invalid port {:?} in {}", value, path.display())
            }
        }
    }
}

/// The connection values a profile section can override.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct CnfProfile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub socket: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

pub(crate) fn load_profile(path: &Path, profile: &str) -> Result<CnfProfile, CnfError> {
    let mut file = Ini::new();
    file.load(path).map_err(|message| CnfError::Read {
        path: path.to_owned(),
        message,
    })?;
    if !file.sections().contains(&profile.to_lowercase()) {
        return Err(CnfError::MissingProfile {
            profile: profile.to_owned(),
            path: path.to_owned(),
        });
    }

    // Empty values do not override anything.
    let value = |key: &str| file.get(profile, key).filter(|value| !value.is_empty());
    let port = match value("port") {
        Some(raw) => Some(raw.parse().map_err(|_| CnfError::InvalidPort {
            value: raw.clone(),
            path: path.to_owned(),
        })?),
        None => None,
    };
    Ok(CnfProfile {
        host: value("host"),
        port,
        socket: value("socket"),
        user: value("user"),
        password: value("password"),
    })
}

/// A copy of `opts` with the configured profile applied on top. Without
/// `--config` the copy is returned unchanged.
pub(crate) fn apply(opts: &MysqlOpts) -> Result<MysqlOpts, CnfError> {
    let path = match &opts.cnf {
        Some(path) => path,
        None => return Ok(opts.clone()),
    };
    let profile = load_profile(path, &opts.profile)?;
    let mut merged = opts.clone();
    if let Some(host) = profile.host {
        merged.host = host;
    }
    if let Some(port) = profile.port {
        merged.port = port;
    }
    if let Some(socket) = profile.socket {
        merged.socket = Some(PathBuf::from(socket));
    }
    if let Some(user) = profile.user {
        merged.user = user;
    }
    if let Some(password) = profile.password {
        merged.password = Some(password);
    }
    Ok(merged)
}
