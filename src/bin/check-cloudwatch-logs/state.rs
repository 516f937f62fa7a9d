//! Persisted scan position for the incremental log check.
//!
//! Each invocation owns one small JSON state file keyed by the log group and
//! the exact argument list, so differently-parameterized checks against the
//! same group never share a cursor. A missing file is normal; an unreadable
//! or undecodable one is an error the operator should see, never something
//! to silently reset.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Where the last scan left off, as written to the state file.
///
/// Field names are part of the on-disk format; state files written by
/// earlier releases must keep loading.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct ScanCursor {
    #[serde(rename = "NextToken")]
    pub next_token: Option<String>,
    #[serde(rename = "StartTime")]
    pub start_time: Option<i64>,
}

#[derive(Debug)]
pub(crate) enum StateError {
    Read {
        path: PathBuf,
        source: io::Error,
    },
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    Write {
        path: PathBuf,
        source: io::Error,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StateError::Read { path, source } => {
                write!(f, "cannot read state file {}: {}", path.display(), source)
            }
            StateError::Corrupt { path, source } => write!(
                f,
                "corrupt state file {} (delete it to start over): {}",
                path.display(),
                source
            ),
            StateError::Write { path, source } => {
                write!(f, "cannot write state file {}: {}", path.display(), source)
            }
        }
    }
}

/// One state file under the state directory.
pub(crate) struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(state_dir: &Path, file_name: &str) -> CursorStore {
        CursorStore {
            path: state_dir.join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` means no previous state, which is fine. Anything else
    /// wrong with the file is fatal: a corrupt cursor treated as absent
    /// would re-alert on everything it had already seen.
    pub fn load(&self) -> Result<Option<ScanCursor>, StateError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StateError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    pub fn save(&self, cursor: &ScanCursor) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StateError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let body = serde_json::to_vec(cursor).expect("cursor always serializes");
        fs::write(&self.path, body).map_err(|source| StateError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Deterministic state-file name for one invocation.
///
/// The log group becomes a filesystem-safe prefix and the digest covers the
/// active AWS profile plus the full raw argument list, so any change to
/// either gets its own cursor file.
pub(crate) fn state_file_name(log_group_name: &str, argv: &[String], profile: &str) -> String {
    let unsafe_chars = Regex::new(r"[^-a-zA-Z0-9_.]").expect("static pattern");
    let prefix = unsafe_chars.replace_all(log_group_name, "_");
    let digest = Sha256::digest(format!("{} {}", profile, argv.join(" ")).as_bytes());
    format!(
        "{}-{}.json",
        prefix.trim_start_matches('_'),
        hex::encode(digest)
    )
}

/// Default directory for state files: the plugin workdir when the agent
/// provides one, the system temp directory otherwise.
pub(crate) fn default_state_dir() -> PathBuf {
    let base = env::var_os("CHECK_PLUGIN_WORKDIR")
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir);
    base.join("check-cloudwatch-logs")
}
