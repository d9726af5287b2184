//! File and directory sync on top of the RESTlet operations.
//!
//! Directory operations run one file at a time and keep going after a
//! failure; the report says which files made it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};

use nsupload_platform::filesystem::FileSystem;

use crate::client::{RestResponse, RestletClient};
use crate::protocol::{self, RemoteEntry, RequestKind, VersionResponse};

/// Per-file results of a directory operation
#[derive(Debug, Default)]
pub struct SyncReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    fn record(&mut self, path: PathBuf, result: Result<()>) {
        match result {
            Ok(()) => self.succeeded.push(path),
            Err(e) => {
                error!("{}: {:#}", path.display(), e);
                self.failed.push((path, e));
            }
        }
    }
}

pub struct FileSync {
    client: RestletClient,
    fs: Box<dyn FileSystem>,
}

impl FileSync {
    pub fn new(client: RestletClient, fs: Box<dyn FileSystem>) -> Self {
        Self { client, fs }
    }

    pub fn client(&self) -> &RestletClient {
        &self.client
    }

    pub async fn upload_file(&self, path: &Path) -> Result<RestResponse> {
        if self.fs.is_dir(path) {
            bail!("{} is a directory; use upload-dir", path.display());
        }
        let data = self.fs.read_file(path)?;
        let content = String::from_utf8(data)
            .with_context(|| format!("{} is not valid UTF-8 text", path.display()))?;

        let resp = self.client.push_file(path, content).await?;
        info!("uploaded {}", path.display());
        Ok(resp)
    }

    /// Overwrite the local file with its remote content
    pub async fn download_file(&self, path: &Path) -> Result<()> {
        let entry = self.fetch_file(path).await?;
        self.fs.write_file(path, entry.content.as_bytes())?;
        info!("downloaded {} ({} bytes)", path.display(), entry.content.len());
        Ok(())
    }

    /// Remote content of a file; the local copy is left alone
    pub async fn preview_file(&self, path: &Path) -> Result<String> {
        Ok(self.fetch_file(path).await?.content)
    }

    /// Delete the remote copy. The local file is kept.
    pub async fn delete_file(&self, path: &Path) -> Result<RestResponse> {
        let resp = self.client.remove_file(path).await?;
        info!("deleted remote copy of {}", path.display());
        Ok(resp)
    }

    /// Upload every file under `dir`, one at a time
    pub async fn upload_directory(&self, dir: &Path) -> Result<SyncReport> {
        let files = self.fs.walk_files(dir)?;
        info!("uploading {} files from {}", files.len(), dir.display());

        let mut report = SyncReport::default();
        for file in files {
            let result = self.upload_file(&file).await.map(|_| ());
            report.record(file, result);
        }
        Ok(report)
    }

    /// Download a remote directory listing into the workspace
    pub async fn download_directory(&self, dir: &Path) -> Result<SyncReport> {
        let resp = self.client.fetch_entry(RequestKind::Directory, dir).await?;
        check_embedded_error(&resp)?;
        let entries = protocol::parse_entries(&resp.body)?;
        info!("downloading {} files into {}", entries.len(), dir.display());

        let mut report = SyncReport::default();
        for entry in entries {
            let target = match self.entry_path(dir, &entry) {
                Some(target) => target,
                None => {
                    warn!("skipping remote entry without a path");
                    continue;
                }
            };
            let result = self.fs.write_file(&target, entry.content.as_bytes());
            report.record(target, result);
        }
        Ok(report)
    }

    /// Version the RESTlet reports, without gating on it
    pub async fn restlet_version(&self) -> Result<String> {
        let resp = self.client.fetch_version().await?;
        let version: VersionResponse = serde_json::from_value(resp.body)
            .context("no restletVersion in version response")?;
        Ok(version.restlet_version)
    }

    async fn fetch_file(&self, path: &Path) -> Result<RemoteEntry> {
        let resp = self.client.fetch_entry(RequestKind::File, path).await?;
        check_embedded_error(&resp)?;

        let mut entries = protocol::parse_entries(&resp.body)?;
        if entries.is_empty() {
            bail!(
                "{} was not found remotely",
                self.client.resolver().relative_path(path)
            );
        }
        Ok(entries.swap_remove(0))
    }

    fn entry_path(&self, dir: &Path, entry: &RemoteEntry) -> Option<PathBuf> {
        if let Some(full_path) = entry.full_path.as_deref().filter(|p| !p.is_empty()) {
            return Some(self.client.resolver().local_path(full_path));
        }
        let name = entry.name.as_deref().filter(|n| !n.is_empty())?;
        let file_name = Path::new(name).file_name()?;
        Some(dir.join(file_name))
    }
}

/// Some RESTlet failures come back as 2xx with an `error` object
fn check_embedded_error(resp: &RestResponse) -> Result<()> {
    if let Some(detail) = protocol::remote_error(&resp.body) {
        bail!(
            "RESTlet error: {}",
            detail
                .message
                .or(detail.code)
                .unwrap_or_else(|| "unknown error".to_string())
        );
    }
    Ok(())
}
