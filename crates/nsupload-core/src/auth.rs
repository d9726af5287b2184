//! Authorization headers for RESTlet calls.
//!
//! Either a pre-shared header string is sent as-is, or every request gets a
//! fresh OAuth 1.0a header signed with HMAC-SHA256.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Method;
use sha2::Sha256;
use url::Url;

use crate::error::RestError;
use crate::protocol::RestletRequest;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA256";
pub const OAUTH_VERSION: &str = "1.0";

/// RFC 3986 unreserved characters stay, everything else is encoded
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

type HmacSha256 = Hmac<Sha256>;

pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token_key: String,
    pub token_secret: String,
    pub realm: String,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &self.token_key)
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

/// Authentication mode, resolved once per call from the config
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Static(String),
    OAuth(OAuthCredentials),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Static(_) => f.write_str("Static(<redacted>)"),
            Credentials::OAuth(oauth) => f.debug_tuple("OAuth").field(oauth).finish(),
        }
    }
}

/// Where a method carries the payload on the wire. This decides which
/// fields the OAuth signature covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadPlacement {
    /// Payload is appended to the query string and signed with it
    Query,
    /// Payload travels in the body and is left out of the signature
    Body,
}

impl PayloadPlacement {
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::DELETE {
            PayloadPlacement::Query
        } else {
            PayloadPlacement::Body
        }
    }
}

/// The data set an OAuth signature must cover: the URL's own query
/// parameters, plus the payload when it travels in the query string.
pub fn signed_data(
    method: &Method,
    url: &Url,
    payload: &RestletRequest,
) -> BTreeMap<String, String> {
    let mut data: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
    if PayloadPlacement::for_method(method) == PayloadPlacement::Query {
        data.extend(payload.fields());
    }
    data
}

impl Credentials {
    /// Header value for exactly this (method, url, payload). Never reuse it
    /// for another request.
    pub fn sign_header(
        &self,
        method: &Method,
        url: &Url,
        payload: &RestletRequest,
    ) -> Result<String, RestError> {
        match self {
            Credentials::Static(header) => Ok(header.clone()),
            Credentials::OAuth(oauth) => {
                let data = signed_data(method, url, payload);
                OAuthSigner::new(oauth).authorize(method, url, &data)
            }
        }
    }
}

pub struct OAuthSigner<'a> {
    credentials: &'a OAuthCredentials,
}

impl<'a> OAuthSigner<'a> {
    pub fn new(credentials: &'a OAuthCredentials) -> Self {
        Self { credentials }
    }

    /// Header with a fresh nonce and the current timestamp
    pub fn authorize(
        &self,
        method: &Method,
        url: &Url,
        data: &BTreeMap<String, String>,
    ) -> Result<String, RestError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.authorize_with(method, url, data, &generate_nonce(), timestamp)
    }

    pub fn authorize_with(
        &self,
        method: &Method,
        url: &Url,
        data: &BTreeMap<String, String>,
        nonce: &str,
        timestamp: u64,
    ) -> Result<String, RestError> {
        let mut oauth = self.oauth_params(nonce, timestamp);
        let base = base_string(method, url, &oauth, data);
        let signature = hmac_sha256_base64(&base, &self.signing_key())?;
        oauth.insert("oauth_signature".to_string(), signature);
        Ok(self.header(&oauth))
    }

    fn oauth_params(&self, nonce: &str, timestamp: u64) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "oauth_consumer_key".to_string(),
                self.credentials.consumer_key.clone(),
            ),
            ("oauth_nonce".to_string(), nonce.to_string()),
            (
                "oauth_signature_method".to_string(),
                SIGNATURE_METHOD.to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.credentials.token_key.clone()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ])
    }

    fn signing_key(&self) -> String {
        format!(
            "{}&{}",
            percent_encode(&self.credentials.consumer_secret),
            percent_encode(&self.credentials.token_secret)
        )
    }

    fn header(&self, oauth: &BTreeMap<String, String>) -> String {
        let mut parts = Vec::with_capacity(oauth.len() + 1);
        if !self.credentials.realm.is_empty() {
            parts.push(format!("realm=\"{}\"", self.credentials.realm));
        }
        for (key, value) in oauth {
            parts.push(format!("{}=\"{}\"", percent_encode(key), percent_encode(value)));
        }
        format!("OAuth {}", parts.join(", "))
    }
}

/// `METHOD&enc(base url)&enc(sorted, encoded parameters)`
pub fn base_string(
    method: &Method,
    url: &Url,
    oauth: &BTreeMap<String, String>,
    data: &BTreeMap<String, String>,
) -> String {
    let mut base_url = url.clone();
    base_url.set_query(None);
    base_url.set_fragment(None);

    let params: BTreeMap<String, String> = oauth
        .iter()
        .chain(data.iter())
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    let param_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.as_str().to_uppercase(),
        percent_encode(base_url.as_str()),
        percent_encode(&param_string)
    )
}

pub fn hmac_sha256_base64(base_string: &str, key: &str) -> Result<String, RestError> {
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(key.as_bytes())
        .map_err(|e| RestError::Signing(e.to_string()))?;
    mac.update(base_string.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// 32 random alphanumeric characters
fn generate_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
