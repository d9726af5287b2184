use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::auth::{Credentials, OAuthCredentials};
use crate::error::RestError;

/// Section name used in VS Code `settings.json`
pub const SETTINGS_SECTION: &str = "netSuiteUpload";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadConfig {
    /// Remote folder the workspace root maps to (default: SuiteScripts)
    pub root_directory: Option<String>,

    /// RESTlet URL, including its script/deploy query parameters
    pub restlet: String,

    /// Pre-shared Authorization header value (NLAuth or similar)
    pub authentication: Option<String>,

    /// OAuth token key
    #[serde(rename = "netSuiteKey")]
    pub netsuite_key: Option<String>,

    /// OAuth token secret
    #[serde(rename = "netSuiteSecret")]
    pub netsuite_secret: Option<String>,

    /// OAuth consumer key
    pub consumer_token: Option<String>,

    /// OAuth consumer secret
    pub consumer_secret: Option<String>,

    /// OAuth realm, usually the account id
    pub realm: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl UploadConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "nsupload", "nsupload") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("nsupload-config.json")
        }
    }

    /// Settings file VS Code keeps inside a workspace
    pub fn workspace_settings_path(workspace_root: &Path) -> PathBuf {
        workspace_root.join(".vscode").join("settings.json")
    }

    /// Load config from a plain config file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Load the `netSuiteUpload` section of a VS Code settings file.
    ///
    /// The file is JSONC, so comments and trailing commas are allowed. Both
    /// the nested form (`"netSuiteUpload": { "restlet": ... }`) and the dotted
    /// form (`"netSuiteUpload.restlet": ...`) are accepted; dotted keys win
    /// when both are present. `None` when the file has neither.
    pub fn load_vscode_settings(path: &Path) -> Result<Option<Self>> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings = jsonc_parser::parse_to_serde_value(&data, &Default::default())
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path.display(), e))?
            .unwrap_or(serde_json::Value::Null);
        Self::from_vscode_settings(&settings)
    }

    pub fn from_vscode_settings(settings: &serde_json::Value) -> Result<Option<Self>> {
        let mut section = match settings.get(SETTINGS_SECTION) {
            Some(serde_json::Value::Object(map)) => Some(map.clone()),
            _ => None,
        };

        let prefix = format!("{}.", SETTINGS_SECTION);
        if let Some(map) = settings.as_object() {
            for (key, value) in map {
                if let Some(field) = key.strip_prefix(&prefix) {
                    section
                        .get_or_insert_with(serde_json::Map::new)
                        .insert(field.to_string(), value.clone());
                }
            }
        }

        let Some(section) = section else {
            return Ok(None);
        };
        serde_json::from_value(serde_json::Value::Object(section))
            .map(Some)
            .with_context(|| format!("invalid `{}` settings", SETTINGS_SECTION))
    }

    /// Remote root folder, with the override applied
    pub fn remote_root(&self) -> &str {
        non_empty(&self.root_directory).unwrap_or(crate::paths::DEFAULT_REMOTE_ROOT)
    }

    /// Resolve which authentication mode this config selects.
    /// A non-empty static header always wins over OAuth keys.
    pub fn credentials(&self) -> Result<Credentials, RestError> {
        if let Some(header) = non_empty(&self.authentication) {
            return Ok(Credentials::Static(header.to_string()));
        }

        match (non_empty(&self.netsuite_key), non_empty(&self.consumer_token)) {
            (Some(token_key), Some(consumer_key)) => Ok(Credentials::OAuth(OAuthCredentials {
                consumer_key: consumer_key.to_string(),
                consumer_secret: self.consumer_secret.clone().unwrap_or_default(),
                token_key: token_key.to_string(),
                token_secret: self.netsuite_secret.clone().unwrap_or_default(),
                realm: self.realm.clone().unwrap_or_default(),
            })),
            _ => Err(RestError::NoAuthConfigured),
        }
    }
}
