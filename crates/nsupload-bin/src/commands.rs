use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use nsupload_core::client::RestletClient;
use nsupload_core::config::UploadConfig;
use nsupload_core::error::RestError;
use nsupload_core::paths::{self, PathResolver};
use nsupload_core::protocol;
use nsupload_core::sync::{FileSync, SyncReport};
use nsupload_core::version::{VersionCheck, MIN_RESTLET_VERSION};
use nsupload_platform::local::LocalFileSystem;

/// Values given on the command line or through the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub restlet: Option<String>,
    pub authentication: Option<String>,
    pub root_directory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    UploadFile(PathBuf),
    DownloadFile(PathBuf),
    PreviewFile(PathBuf),
    DeleteFile(PathBuf),
    UploadDir(PathBuf),
    DownloadDir(PathBuf),
    Version,
}

/// Explicit config file, else the workspace's VS Code settings when they
/// carry a `netSuiteUpload` section, else the user config. Command-line
/// values win over all of them.
pub fn load_config(workspace: &Path, overrides: &Overrides) -> Result<UploadConfig> {
    load_config_from(workspace, &UploadConfig::default_path(), overrides)
}

fn load_config_from(
    workspace: &Path,
    default_path: &Path,
    overrides: &Overrides,
) -> Result<UploadConfig> {
    let mut config = match &overrides.config_path {
        Some(path) => {
            info!("loading config from {}", path.display());
            UploadConfig::load(path)?
        }
        None => match workspace_settings(workspace)? {
            Some(config) => config,
            None if default_path.exists() => {
                info!("loading config from {}", default_path.display());
                UploadConfig::load(default_path)?
            }
            None => {
                info!("no config found, using command-line values only");
                UploadConfig::default()
            }
        },
    };

    if let Some(restlet) = &overrides.restlet {
        config.restlet = restlet.clone();
    }
    if let Some(auth) = &overrides.authentication {
        config.authentication = Some(auth.clone());
    }
    if let Some(root) = &overrides.root_directory {
        config.root_directory = Some(root.clone());
    }

    if config.restlet.is_empty() {
        bail!("RESTlet URL is required (--restlet or `restlet` in settings)");
    }
    Ok(config)
}

fn workspace_settings(workspace: &Path) -> Result<Option<UploadConfig>> {
    let settings = UploadConfig::workspace_settings_path(workspace);
    if !settings.exists() {
        return Ok(None);
    }
    let config = UploadConfig::load_vscode_settings(&settings)?;
    match &config {
        Some(_) => info!("loading settings from {}", settings.display()),
        None => info!("no netSuiteUpload section in {}", settings.display()),
    }
    Ok(config)
}

/// Absolute form of `path`, checked to lie inside the resolver's workspace
pub fn resolve_target(resolver: &PathResolver, path: &Path, must_exist: bool) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let joined = paths::normalize(&joined);

    let resolved = match joined.canonicalize() {
        Ok(p) => p,
        Err(_) if !must_exist => match (joined.parent(), joined.file_name()) {
            (Some(parent), Some(name)) if parent.exists() => parent.canonicalize()?.join(name),
            _ => joined.clone(),
        },
        Err(e) => {
            return Err(e).with_context(|| format!("no such file: {}", path.display()));
        }
    };

    if !resolver.contains(&resolved) {
        bail!(
            "{} is outside the workspace {}; open the folder that maps to the file cabinet root",
            resolved.display(),
            resolver.workspace_root().display()
        );
    }
    Ok(resolved)
}

fn open_workspace(workspace: &Path) -> Result<PathBuf> {
    let root = workspace.canonicalize().with_context(|| {
        format!(
            "no workspace is open at {}; open the folder that maps to SuiteScripts",
            workspace.display()
        )
    })?;
    if !root.is_dir() {
        bail!("workspace {} is not a directory", root.display());
    }
    Ok(root)
}

pub async fn run(workspace: &Path, overrides: Overrides, command: Command) -> Result<()> {
    let root = open_workspace(workspace)?;
    let config = load_config(&root, &overrides)?;
    let client = RestletClient::with_reqwest(config, &root)?;
    let sync = FileSync::new(client, Box::new(LocalFileSystem::new()));
    let resolver = sync.client().resolver();

    match command {
        Command::UploadFile(path) => {
            let file = resolve_target(resolver, &path, true)?;
            sync.upload_file(&file).await?;
            println!("Uploaded {}", file.display());
        }
        Command::DownloadFile(path) => {
            let file = resolve_target(resolver, &path, false)?;
            sync.download_file(&file).await?;
            println!("Downloaded {}", file.display());
        }
        Command::PreviewFile(path) => {
            let file = resolve_target(resolver, &path, false)?;
            let content = sync.preview_file(&file).await?;
            print!("{}", content);
        }
        Command::DeleteFile(path) => {
            let file = resolve_target(resolver, &path, false)?;
            sync.delete_file(&file).await?;
            println!("Deleted remote copy of {}", file.display());
        }
        Command::UploadDir(path) => {
            let dir = resolve_target(resolver, &path, true)?;
            let report = sync.upload_directory(&dir).await?;
            finish_report("Uploaded", &report)?;
        }
        Command::DownloadDir(path) => {
            let dir = resolve_target(resolver, &path, false)?;
            let report = sync.download_directory(&dir).await?;
            finish_report("Downloaded", &report)?;
        }
        Command::Version => {
            let reported = sync.restlet_version().await?;
            let status = if VersionCheck::from_reported(&reported).needs_update() {
                format!("needs updating (minimum {})", MIN_RESTLET_VERSION)
            } else {
                "supported".to_string()
            };
            println!("RESTlet version {}: {}", reported, status);
        }
    }
    Ok(())
}

fn finish_report(action: &str, report: &SyncReport) -> Result<()> {
    for path in &report.succeeded {
        println!("{} {}", action, path.display());
    }
    for (path, err) in &report.failed {
        println!("FAILED {}: {}", path.display(), describe_error(err));
    }
    println!(
        "{} {} of {} files",
        action,
        report.succeeded.len(),
        report.total()
    );

    if !report.is_complete() {
        warn!("{} files failed", report.failed.len());
        bail!("{} of {} files failed", report.failed.len(), report.total());
    }
    Ok(())
}

/// Error returned from `main`, carrying only the user-facing text
pub fn user_error(err: anyhow::Error) -> anyhow::Error {
    anyhow::anyhow!(describe_error(&err))
}

/// User-facing text for an error coming out of a command
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<RestError>() {
        Some(rest @ RestError::Remote { status, .. }) => match remote_message(rest) {
            Some(message) => format!("NetSuite error: {}", message),
            None => format!("Unexpected error: RESTlet returned HTTP {}", status),
        },
        Some(RestError::VersionCheckFailed(cause)) => {
            format!("{} (version check failed: {})", err, describe_rest_error(cause))
        }
        _ => format!("{:#}", err),
    }
}

fn describe_rest_error(err: &RestError) -> String {
    match err {
        RestError::Remote { status, .. } => {
            remote_message(err).unwrap_or_else(|| format!("HTTP {}", status))
        }
        other => other.to_string(),
    }
}

fn remote_message(err: &RestError) -> Option<String> {
    let detail = protocol::remote_error(err.remote_body()?)?;
    detail.message.or(detail.code)
}
