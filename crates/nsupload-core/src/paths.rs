//! Mapping between local workspace paths and file cabinet paths.

use std::path::{Component, Path, PathBuf};

use crate::config::UploadConfig;

/// Remote folder the workspace root maps to when no override is configured
pub const DEFAULT_REMOTE_ROOT: &str = "SuiteScripts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    workspace_root: PathBuf,
    remote_root: Vec<String>,
}

/// Fold `.` and `..` segments without touching the disk.
/// `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn push_segment(segments: &mut Vec<String>, segment: &str) {
    match segment {
        "" | "." => {}
        ".." => {
            segments.pop();
        }
        other => segments.push(other.to_string()),
    }
}

fn remote_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for segment in path.split(['/', '\\']) {
        push_segment(&mut segments, segment);
    }
    segments
}

impl PathResolver {
    pub fn new(workspace_root: impl Into<PathBuf>, root_override: Option<&str>) -> Self {
        let root = root_override
            .filter(|r| !r.trim_matches(['/', '\\']).is_empty())
            .unwrap_or(DEFAULT_REMOTE_ROOT);
        Self {
            workspace_root: workspace_root.into(),
            remote_root: remote_segments(root),
        }
    }

    pub fn from_config(workspace_root: impl Into<PathBuf>, config: &UploadConfig) -> Self {
        Self::new(workspace_root, Some(config.remote_root()))
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Remote root folder, `/`-joined
    pub fn remote_root(&self) -> String {
        self.remote_root.join("/")
    }

    /// Whether `path` lies inside the workspace once `.` and `..` are folded
    pub fn contains(&self, path: &Path) -> bool {
        normalize(path).starts_with(&self.workspace_root)
    }

    /// File cabinet path for a local file: the remote root joined with the
    /// path relative to the workspace root, always `/`-separated.
    ///
    /// Callers are expected to pass paths inside the workspace; anything
    /// else is joined as-is, minus its root.
    pub fn relative_path(&self, absolute: &Path) -> String {
        let stripped = absolute
            .strip_prefix(&self.workspace_root)
            .unwrap_or(absolute);

        let mut segments = self.remote_root.clone();
        for component in stripped.components() {
            match component {
                Component::Normal(s) => push_segment(&mut segments, &s.to_string_lossy()),
                Component::ParentDir => {
                    segments.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        segments.join("/")
    }

    /// Local path for a file cabinet path from a directory listing.
    ///
    /// The remote root is stripped when the path starts with it, otherwise
    /// only the first folder is. `.` and `..` segments never escape the
    /// workspace.
    pub fn local_path(&self, remote_full_path: &str) -> PathBuf {
        let segments: Vec<&str> = remote_full_path
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .collect();

        let under_root = segments.len() >= self.remote_root.len()
            && segments
                .iter()
                .zip(&self.remote_root)
                .all(|(a, b)| *a == b.as_str());

        let skip = if under_root {
            self.remote_root.len()
        } else {
            1.min(segments.len())
        };

        let mut path = self.workspace_root.clone();
        for segment in &segments[skip..] {
            path.push(segment);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root() {
        let resolver = PathResolver::new("/proj", None);
        assert_eq!(
            resolver.relative_path(Path::new("/proj/src/a.js")),
            "SuiteScripts/src/a.js"
        );
        assert_eq!(resolver.relative_path(Path::new("/proj/a.js")), "SuiteScripts/a.js");
    }

    #[test]
    fn test_root_override() {
        let resolver = PathResolver::new("/proj", Some("SuiteScripts/Acme/"));
        assert_eq!(
            resolver.relative_path(Path::new("/proj/src/a.js")),
            "SuiteScripts/Acme/src/a.js"
        );
        assert_eq!(resolver.remote_root(), "SuiteScripts/Acme");
    }

    #[test]
    fn test_blank_override_uses_default() {
        let resolver = PathResolver::new("/proj", Some("/"));
        assert_eq!(resolver.relative_path(Path::new("/proj/a.js")), "SuiteScripts/a.js");
    }

    #[test]
    fn test_workspace_root_itself() {
        let resolver = PathResolver::new("/proj", None);
        assert_eq!(resolver.relative_path(Path::new("/proj")), "SuiteScripts");
    }

    #[test]
    fn test_dot_segments_normalized() {
        let resolver = PathResolver::new("/proj", None);
        assert_eq!(
            resolver.relative_path(Path::new("/proj/src/./lib/../a.js")),
            "SuiteScripts/src/a.js"
        );
    }

    #[test]
    fn test_from_config() {
        let config = UploadConfig {
            root_directory: Some("Custom".into()),
            ..Default::default()
        };
        let resolver = PathResolver::from_config("/proj", &config);
        assert_eq!(resolver.relative_path(Path::new("/proj/x.js")), "Custom/x.js");
    }

    #[test]
    fn test_contains() {
        let resolver = PathResolver::new("/proj", None);
        assert!(resolver.contains(Path::new("/proj/src/a.js")));
        assert!(!resolver.contains(Path::new("/project/a.js")));
        assert!(!resolver.contains(Path::new("/other/a.js")));
    }

    #[test]
    fn test_contains_folds_parent_segments() {
        let resolver = PathResolver::new("/proj", None);
        assert!(!resolver.contains(Path::new("/proj/missing/../../outside.js")));
        assert!(!resolver.contains(Path::new("/proj/..")));
        assert!(resolver.contains(Path::new("/proj/missing/../src/./a.js")));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d.js")), Path::new("/a/c/d.js"));
        assert_eq!(normalize(Path::new("/a/../../b")), Path::new("/b"));
        assert_eq!(normalize(Path::new("a/./b")), Path::new("a/b"));
    }

    #[test]
    fn test_local_path_strips_remote_root() {
        let resolver = PathResolver::new("/proj", Some("SuiteScripts/Acme"));
        assert_eq!(
            resolver.local_path("SuiteScripts/Acme/src/a.js"),
            PathBuf::from("/proj/src/a.js")
        );
    }

    #[test]
    fn test_local_path_outside_root_strips_first_folder() {
        let resolver = PathResolver::new("/proj", None);
        assert_eq!(
            resolver.local_path("Templates/email/a.html"),
            PathBuf::from("/proj/email/a.html")
        );
    }

    #[test]
    fn test_local_path_cannot_escape_workspace() {
        let resolver = PathResolver::new("/proj", None);
        assert_eq!(
            resolver.local_path("SuiteScripts/../../etc/passwd"),
            PathBuf::from("/proj/etc/passwd")
        );
    }

    #[test]
    fn test_relative_then_local_returns_same_file() {
        let resolver = PathResolver::new("/proj", None);
        let remote = resolver.relative_path(Path::new("/proj/lib/util.js"));
        assert_eq!(resolver.local_path(&remote), PathBuf::from("/proj/lib/util.js"));
    }
}
