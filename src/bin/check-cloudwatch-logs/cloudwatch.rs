//! Talk to the CloudWatch Logs API
//!
//! This module defines the `FilterLogEvents` wire types, a thin signed HTTP
//! client for the endpoint, and the resolution of region and credentials
//! from flags, the environment, and the shared credentials file.
//!
//! The client is hidden behind the `CloudWatchLogs` trait so the scanner can
//! be driven by a scripted stand-in in tests.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use configparser::ini::Ini;
use derive_more::From;
use directories::UserDirs;
use serde::{Deserialize, Serialize};

use crate::sigv4::{self, CanonicalRequest};

pub(crate) use crate::sigv4::Credentials;

/// Profile used when `AWS_PROFILE` is unset.
pub(crate) const DEFAULT_PROFILE: &str = "default";

const SERVICE: &str = "logs";
const TARGET_FILTER_LOG_EVENTS: &str = "Logs_20140328.FilterLogEvents";
const CONTENT_TYPE_AMZ_JSON: &str = "application/x-amz-json-1.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One page request against `FilterLogEvents`.
///
/// `start_time` is milliseconds since the epoch, inclusive. A `next_token`
/// continues the page sequence from a previous response.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilterLogEventsRequest {
    pub log_group_name: String,
    pub filter_pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// One page of matched events. `next_token` is absent on the final page.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilterLogEventsResponse {
    #[serde(default)]
    pub events: Vec<FilteredLogEvent>,
    pub next_token: Option<String>,
}

/// A single event that matched the filter pattern.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilteredLogEvent {
    pub message: String,
    pub timestamp: i64,
}

/// The one API call the plugin makes.
pub(crate) trait CloudWatchLogs {
    fn filter_log_events(
        &self,
        request: &FilterLogEventsRequest,
    ) -> Result<FilterLogEventsResponse, CloudWatchError>;
}

/// An error document returned by the endpoint in place of a result page.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub status: u16,
    pub kind: String,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} (http status {})",
            self.kind, self.message, self.status
        )
    }
}

#[derive(Debug, From)]
pub(crate) enum CloudWatchError {
    /// Errors from the HTTP transport
    Http(reqwest::Error),
    /// The endpoint answered 200 with something other than a result page
    Json(serde_json::Error),
    /// The endpoint answered with an error document
    Api(ApiError),
    /// No usable region or credentials could be resolved
    Config(String),
}

impl fmt::Display for CloudWatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CloudWatchError::Http(e) => write!(f, "{}", e),
            CloudWatchError::Json(e) => write!(f, "invalid response from CloudWatch Logs: {}", e),
            CloudWatchError::Api(e) => write!(f, "{}", e),
            CloudWatchError::Config(e) => write!(f, "{}", e),
        }
    }
}

/// The region to sign for: `--region`, then `AWS_REGION` or
/// `AWS_DEFAULT_REGION`, then the `region` key of the shared credentials
/// profile.
pub(crate) fn resolve_region(flag: Option<&str>, profile: &str) -> Result<String, CloudWatchError> {
    if let Some(region) = flag {
        return Ok(region.to_owned());
    }
    if let Some(region) = env_value("AWS_REGION").or_else(|| env_value("AWS_DEFAULT_REGION")) {
        return Ok(region);
    }
    if let Some(file) = load_shared_credentials()? {
        if let Some(region) = file.get(profile, "region") {
            return Ok(region);
        }
    }
    Err(CloudWatchError::Config(
        "no AWS region was configured (use --region or set AWS_REGION)".to_owned(),
    ))
}

/// Static credentials from flags, then the `AWS_ACCESS_KEY_ID` family of
/// environment variables, then the shared credentials profile.
pub(crate) fn resolve_credentials(
    access_key_id: Option<&str>,
    secret_access_key: Option<&str>,
    profile: &str,
) -> Result<Credentials, CloudWatchError> {
    if let (Some(access_key_id), Some(secret_access_key)) = (access_key_id, secret_access_key) {
        return Ok(Credentials {
            access_key_id: access_key_id.to_owned(),
            secret_access_key: secret_access_key.to_owned(),
            session_token: None,
        });
    }
    if let (Some(access_key_id), Some(secret_access_key)) = (
        env_value("AWS_ACCESS_KEY_ID"),
        env_value("AWS_SECRET_ACCESS_KEY"),
    ) {
        return Ok(Credentials {
            access_key_id,
            secret_access_key,
            session_token: env_value("AWS_SESSION_TOKEN"),
        });
    }
    if let Some(file) = load_shared_credentials()? {
        if let (Some(access_key_id), Some(secret_access_key)) = (
            file.get(profile, "aws_access_key_id"),
            file.get(profile, "aws_secret_access_key"),
        ) {
            return Ok(Credentials {
                access_key_id,
                secret_access_key,
                session_token: file.get(profile, "aws_session_token"),
            });
        }
    }
    Err(CloudWatchError::Config(format!(
        "no AWS credentials found for profile {} \
         (use --access-key-id and --secret-access-key, or set AWS_ACCESS_KEY_ID \
         and AWS_SECRET_ACCESS_KEY, or add the profile to the shared credentials file)",
        profile
    )))
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn shared_credentials_path() -> Option<PathBuf> {
    if let Some(path) = env_value("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }
    UserDirs::new().map(|dirs| dirs.home_dir().join(".aws").join("credentials"))
}

fn load_shared_credentials() -> Result<Option<Ini>, CloudWatchError> {
    let path = match shared_credentials_path() {
        Some(path) => path,
        None => return Ok(None),
    };
    if !path.exists() {
        return Ok(None);
    }
    let mut file = Ini::new();
    file.load(&path).map_err(|err| {
        CloudWatchError::Config(format!("could not read {}: {}", path.display(), err))
    })?;
    Ok(Some(file))
}

/// The real client. One signed POST per page.
pub(crate) struct CloudWatchLogsClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    host: String,
    region: String,
    credentials: Credentials,
}

impl CloudWatchLogsClient {
    pub fn new(region: String, credentials: Credentials) -> Result<Self, CloudWatchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let host = format!("logs.{}.amazonaws.com", region);
        Ok(CloudWatchLogsClient {
            http,
            endpoint: format!("https://{}/", host),
            host,
            region,
            credentials,
        })
    }
}

impl CloudWatchLogs for CloudWatchLogsClient {
    fn filter_log_events(
        &self,
        request: &FilterLogEventsRequest,
    ) -> Result<FilterLogEventsResponse, CloudWatchError> {
        let body = serde_json::to_vec(request)?;
        let now = Utc::now();
        let amz_date = sigv4::format_amz_date(&now);

        // Names stay sorted so the list is already in canonical order.
        let mut headers = vec![
            ("content-type".to_owned(), CONTENT_TYPE_AMZ_JSON.to_owned()),
            ("host".to_owned(), self.host.clone()),
            ("x-amz-date".to_owned(), amz_date.clone()),
        ];
        if let Some(token) = &self.credentials.session_token {
            headers.push(("x-amz-security-token".to_owned(), token.clone()));
        }
        headers.push((
            "x-amz-target".to_owned(),
            TARGET_FILTER_LOG_EVENTS.to_owned(),
        ));
        let authorization = sigv4::authorization(
            &self.credentials,
            &self.region,
            SERVICE,
            &now,
            &CanonicalRequest {
                method: "POST",
                path: "/",
                query: "",
                headers: &headers,
                payload: &body,
            },
        );

        let mut http_request = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", CONTENT_TYPE_AMZ_JSON)
            .header("X-Amz-Date", amz_date)
            .header("X-Amz-Target", TARGET_FILTER_LOG_EVENTS)
            .header("Authorization", authorization);
        if let Some(token) = &self.credentials.session_token {
            http_request = http_request.header("X-Amz-Security-Token", token.clone());
        }

        let response = http_request.body(body).send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(CloudWatchError::Api(api_error(status.as_u16(), &text)));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// CloudWatch error documents carry `__type` and `message`, but broken
/// proxies can hand back anything, so both fields get fallbacks.
fn api_error(status: u16, text: &str) -> ApiError {
    #[derive(Default, Deserialize)]
    struct ErrorBody {
        #[serde(rename = "__type")]
        kind: Option<String>,
        message: Option<String>,
    }

    let body: ErrorBody = serde_json::from_str(text).unwrap_or_default();
    ApiError {
        status,
        kind: body.kind.unwrap_or_else(|| "UnknownError".to_owned()),
        message: body.message.unwrap_or_else(|| text.trim().to_owned()),
    }
}
