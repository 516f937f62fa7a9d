//! AWS Signature Version 4 for the one request shape this plugin sends.
//!
//! Nothing here is CloudWatch-specific: the signer canonicalizes whatever
//! request it is given, derives the signing key for the request's scope, and
//! returns the `Authorization` header value. The tests are the worked
//! example from the AWS signing documentation.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

#[derive(Clone, Debug)]
pub(crate) struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// A request reduced to the parts SigV4 signs.
///
/// Callers supply header names lowercased, values trimmed, and the list
/// sorted by name; the query string must already be in canonical form
/// (sorted, percent-encoded) or empty.
pub(crate) struct CanonicalRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub headers: &'a [(String, String)],
    pub payload: &'a [u8],
}

impl<'a> CanonicalRequest<'a> {
    pub fn signed_headers(&self) -> String {
        self.headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }

    fn text(&self) -> String {
        let mut out = String::new();
        out.push_str(self.method);
        out.push('\n');
        out.push_str(self.path);
        out.push('\n');
        out.push_str(self.query);
        out.push('\n');
        for (name, value) in self.headers {
            out.push_str(name);
            out.push(':');
            out.push_str(value.trim());
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.signed_headers());
        out.push('\n');
        out.push_str(&hex_sha256(self.payload));
        out
    }
}

pub(crate) fn format_amz_date(when: &DateTime<Utc>) -> String {
    when.format("%Y%m%dT%H%M%SZ").to_string()
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn string_to_sign(amz_date: &str, scope: &str, request: &CanonicalRequest) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex_sha256(request.text().as_bytes())
    )
}

fn signature(secret: &str, date: &str, region: &str, service: &str, sts: &str) -> String {
    let key = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let key = hmac_sha256(&key, region.as_bytes());
    let key = hmac_sha256(&key, service.as_bytes());
    let key = hmac_sha256(&key, b"aws4_request");
    hex::encode(hmac_sha256(&key, sts.as_bytes()))
}

/// The `Authorization` header value for a request signed at `when`.
pub(crate) fn authorization(
    credentials: &Credentials,
    region: &str,
    service: &str,
    when: &DateTime<Utc>,
    request: &CanonicalRequest,
) -> String {
    let date = when.format("%Y%m%d").to_string();
    let amz_date = format_amz_date(when);
    let scope = format!("{}/{}/{}/aws4_request", date, region, service);
    let sts = string_to_sign(&amz_date, &scope, request);
    let signature = signature(
        &credentials.secret_access_key,
        &date,
        region,
        service,
        &sts,
    );
    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM,
        credentials.access_key_id,
        scope,
        request.signed_headers(),
        signature
    )
}
