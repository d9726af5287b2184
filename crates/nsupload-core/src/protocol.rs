use serde::{Deserialize, Serialize};

use crate::error::RestError;

/// What a RESTlet request addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    File,
    Directory,
    Version,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::File => "file",
            RequestKind::Directory => "directory",
            RequestKind::Version => "version",
        }
    }
}

/// Payload of one RESTlet call. Sent as query parameters for GET/DELETE
/// and as the JSON body for POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestletRequest {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl RestletRequest {
    pub fn version() -> Self {
        Self {
            kind: RequestKind::Version,
            name: None,
            content: None,
        }
    }

    pub fn entry(kind: RequestKind, name: String) -> Self {
        Self {
            kind,
            name: Some(name),
            content: None,
        }
    }

    pub fn upload(name: String, content: String) -> Self {
        Self {
            kind: RequestKind::File,
            name: Some(name),
            content: Some(content),
        }
    }

    /// Payload fields as string pairs, in wire order
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![("type".to_string(), self.kind.as_str().to_string())];
        if let Some(name) = &self.name {
            fields.push(("name".to_string(), name.clone()));
        }
        if let Some(content) = &self.content {
            fields.push(("content".to_string(), content.clone()));
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub restlet_version: String,
}

/// One file in a file or directory response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// `{ "error": { "code": ..., "message": ... } }` as returned on failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Entries of a file or directory response. A bare object is treated as a
/// single entry.
pub fn parse_entries(body: &serde_json::Value) -> Result<Vec<RemoteEntry>, RestError> {
    let parsed = match body {
        serde_json::Value::Array(_) => serde_json::from_value(body.clone()),
        serde_json::Value::Object(_) => {
            serde_json::from_value::<RemoteEntry>(body.clone()).map(|e| vec![e])
        }
        other => {
            return Err(RestError::MalformedResponse(format!(
                "expected file entries, got {}",
                json_kind(other)
            )))
        }
    };
    parsed.map_err(|e| RestError::MalformedResponse(format!("invalid file entries: {}", e)))
}

/// Error detail embedded in a response body, if any
pub fn remote_error(body: &serde_json::Value) -> Option<RemoteErrorDetail> {
    match body.get("error")? {
        serde_json::Value::String(message) => Some(RemoteErrorDetail {
            code: None,
            message: Some(message.clone()),
        }),
        detail @ serde_json::Value::Object(_) => serde_json::from_value(detail.clone()).ok(),
        _ => None,
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let req = RestletRequest::upload("SuiteScripts/src/a.js".into(), "x=1".into());
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"type": "file", "name": "SuiteScripts/src/a.js", "content": "x=1"})
        );

        let version = RestletRequest::version();
        assert_eq!(serde_json::to_value(&version).unwrap(), json!({"type": "version"}));
    }

    #[test]
    fn test_request_fields() {
        let req = RestletRequest::entry(RequestKind::Directory, "SuiteScripts/lib".into());
        assert_eq!(
            req.fields(),
            vec![
                ("type".to_string(), "directory".to_string()),
                ("name".to_string(), "SuiteScripts/lib".to_string()),
            ]
        );
    }

    #[test]
    fn test_version_response() {
        let resp: VersionResponse =
            serde_json::from_value(json!({"restletVersion": "1.0.2"})).unwrap();
        assert_eq!(resp.restlet_version, "1.0.2");
    }

    #[test]
    fn test_parse_entries_array() {
        let body = json!([
            {"name": "a.js", "fullPath": "SuiteScripts/a.js", "content": "a"},
            {"fullPath": "SuiteScripts/lib/b.js", "content": "b"}
        ]);
        let entries = parse_entries(&body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name.as_deref(), Some("a.js"));
        assert_eq!(entries[1].full_path.as_deref(), Some("SuiteScripts/lib/b.js"));
        assert_eq!(entries[1].content, "b");
    }

    #[test]
    fn test_parse_entries_single_object() {
        let entries = parse_entries(&json!({"content": "x=1"})).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "x=1");
    }

    #[test]
    fn test_parse_entries_rejects_scalars() {
        let err = parse_entries(&json!("nope")).unwrap_err();
        assert!(matches!(err, RestError::MalformedResponse(m) if m.contains("a string")));
    }

    #[test]
    fn test_remote_error() {
        let detail = remote_error(&json!({"error": {"code": "RCRD_DSNT_EXIST", "message": "gone"}}))
            .unwrap();
        assert_eq!(detail.code.as_deref(), Some("RCRD_DSNT_EXIST"));
        assert_eq!(detail.message.as_deref(), Some("gone"));

        let plain = remote_error(&json!({"error": "boom"})).unwrap();
        assert_eq!(plain.message.as_deref(), Some("boom"));

        assert!(remote_error(&json!([{"content": "x"}])).is_none());
    }
}
