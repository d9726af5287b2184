use std::path::{Path, PathBuf};

use reqwest::Method;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{Credentials, PayloadPlacement};
use crate::config::UploadConfig;
use crate::error::RestError;
use crate::paths::PathResolver;
use crate::protocol::{RequestKind, RestletRequest, VersionResponse};
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::version::VersionCheck;

/// A 2xx answer from the RESTlet
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

/// The four RESTlet operations. Data operations run the version check
/// first and never reach the network for data when it does not pass.
///
/// Holds no mutable state: every call signs and sends its own requests.
pub struct RestletClient {
    config: UploadConfig,
    url: Url,
    resolver: PathResolver,
    transport: Box<dyn Transport>,
}

impl RestletClient {
    pub fn new(
        config: UploadConfig,
        workspace_root: impl Into<PathBuf>,
        transport: Box<dyn Transport>,
    ) -> Result<Self, RestError> {
        let url = Url::parse(config.restlet.trim()).map_err(|source| RestError::InvalidUrl {
            url: config.restlet.clone(),
            source,
        })?;
        let resolver = PathResolver::from_config(workspace_root, &config);

        Ok(Self {
            config,
            url,
            resolver,
            transport,
        })
    }

    pub fn with_reqwest(
        config: UploadConfig,
        workspace_root: impl Into<PathBuf>,
    ) -> Result<Self, RestError> {
        Self::new(config, workspace_root, Box::new(ReqwestTransport::new()))
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// GET `{type: kind, name}` for a file or a directory listing
    pub async fn fetch_entry(
        &self,
        kind: RequestKind,
        local_path: &Path,
    ) -> Result<RestResponse, RestError> {
        let credentials = self.config.credentials()?;
        self.guard(&credentials).await?;

        let name = self.resolver.relative_path(local_path);
        info!("fetching {} {}", kind.as_str(), name);
        self.send(&credentials, Method::GET, RestletRequest::entry(kind, name))
            .await
    }

    /// POST `{type: "file", name, content}`
    pub async fn push_file(
        &self,
        local_path: &Path,
        content: String,
    ) -> Result<RestResponse, RestError> {
        let credentials = self.config.credentials()?;
        self.guard(&credentials).await?;

        let name = self.resolver.relative_path(local_path);
        info!("uploading {} ({} bytes)", name, content.len());
        self.send(&credentials, Method::POST, RestletRequest::upload(name, content))
            .await
    }

    /// DELETE `{type: "file", name}`
    pub async fn remove_file(&self, local_path: &Path) -> Result<RestResponse, RestError> {
        let credentials = self.config.credentials()?;
        self.guard(&credentials).await?;

        let name = self.resolver.relative_path(local_path);
        info!("deleting {}", name);
        self.send(
            &credentials,
            Method::DELETE,
            RestletRequest::entry(RequestKind::File, name),
        )
        .await
    }

    /// GET `{type: "version"}`. This is the version check itself, so it is
    /// not gated.
    pub async fn fetch_version(&self) -> Result<RestResponse, RestError> {
        let credentials = self.config.credentials()?;
        self.send(&credentials, Method::GET, RestletRequest::version())
            .await
    }

    /// Ask the RESTlet for its version and compare it with the minimum.
    /// Any failure along the way counts as needing an update.
    pub async fn check_version(&self) -> VersionCheck {
        match self.config.credentials() {
            Ok(credentials) => self.check_version_with(&credentials).await,
            Err(e) => VersionCheck::Failed(e),
        }
    }

    async fn check_version_with(&self, credentials: &Credentials) -> VersionCheck {
        let resp = match self
            .send(credentials, Method::GET, RestletRequest::version())
            .await
        {
            Ok(resp) => resp,
            Err(e) => return VersionCheck::Failed(e),
        };

        match serde_json::from_value::<VersionResponse>(resp.body) {
            Ok(version) => VersionCheck::from_reported(&version.restlet_version),
            Err(e) => VersionCheck::Failed(RestError::MalformedResponse(format!(
                "no restletVersion in version response: {}",
                e
            ))),
        }
    }

    /// Guard stage shared by every data operation
    async fn guard(&self, credentials: &Credentials) -> Result<(), RestError> {
        let check = self.check_version_with(credentials).await;
        match &check {
            VersionCheck::Compatible(remote) => debug!("RESTlet v{} is compatible", remote),
            VersionCheck::Outdated(remote) => warn!("RESTlet v{} is too old", remote),
            VersionCheck::Failed(e) => warn!("version check failed: {:#}", e),
        }
        check.into_result().map(|_| ())
    }

    async fn send(
        &self,
        credentials: &Credentials,
        method: Method,
        payload: RestletRequest,
    ) -> Result<RestResponse, RestError> {
        let authorization = credentials.sign_header(&method, &self.url, &payload)?;

        let (query, body) = match PayloadPlacement::for_method(&method) {
            PayloadPlacement::Query => (payload.fields(), None),
            PayloadPlacement::Body => (Vec::new(), Some(payload)),
        };

        let request = HttpRequest {
            method,
            url: self.url.clone(),
            query,
            body,
            authorization,
        };

        let resp = self.transport.execute(request).await?;
        let status = resp.status;
        let body = resp.json_body();

        if !resp.is_success() {
            warn!("RESTlet returned HTTP {}", status);
            return Err(RestError::Remote { status, body });
        }
        Ok(RestResponse { status, body })
    }
}
