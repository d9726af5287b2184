use thiserror::Error;

/// Message shown whenever the version gate blocks an operation
pub const OUTDATED_ADVISORY: &str =
    "The RESTlet endpoint likely needs updating to the latest revision of vscodeExtensionRestlet.js";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum RestError {
    #[error("no authentication method found in settings (set `authentication`, or `netSuiteKey` and `consumerToken`)")]
    NoAuthConfigured,

    /// The version request itself failed. Fail-closed: reported with the
    /// same advisory as an outdated endpoint, the cause kept as source.
    #[error("{advisory}", advisory = OUTDATED_ADVISORY)]
    VersionCheckFailed(#[source] Box<RestError>),

    #[error("{advisory}", advisory = OUTDATED_ADVISORY)]
    OutdatedEndpoint { remote: String, minimum: String },

    #[error("invalid restlet URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("RESTlet returned HTTP {status}")]
    Remote {
        status: u16,
        body: serde_json::Value,
    },

    #[error("malformed RESTlet response: {0}")]
    MalformedResponse(String),

    #[error("failed to sign request: {0}")]
    Signing(String),
}

impl RestError {
    /// Parsed body of a non-2xx response, if that is what this error is
    pub fn remote_body(&self) -> Option<&serde_json::Value> {
        match self {
            RestError::Remote { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_errors_share_advisory() {
        let outdated = RestError::OutdatedEndpoint {
            remote: "0.9.0".into(),
            minimum: "1.0.2".into(),
        };
        let failed = RestError::VersionCheckFailed(Box::new(RestError::Transport(
            TransportError::Other("connection refused".into()),
        )));

        assert_eq!(outdated.to_string(), OUTDATED_ADVISORY);
        assert_eq!(failed.to_string(), OUTDATED_ADVISORY);
    }

    #[test]
    fn test_version_check_failed_keeps_cause() {
        let failed = RestError::VersionCheckFailed(Box::new(RestError::Transport(
            TransportError::Other("connection refused".into()),
        )));
        let source = std::error::Error::source(&failed).unwrap();
        assert!(source.to_string().contains("connection refused"));
    }

    #[test]
    fn test_remote_body() {
        let err = RestError::Remote {
            status: 404,
            body: serde_json::json!({"error": {"message": "missing"}}),
        };
        assert_eq!(err.remote_body().unwrap()["error"]["message"], "missing");
        assert!(RestError::NoAuthConfigured.remote_body().is_none());
    }
}
