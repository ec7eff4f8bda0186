//! Local checkout status
//!
//! Resolves record paths on this machine and checks whether each checkout
//! exists and points at the remote recorded in the manifest.

use std::path::{Path, PathBuf};

use git2::Repository;
use serde::Serialize;

use crate::record::RepositoryRecord;

/// State of a record's local checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutStatus {
    /// Nothing exists at the path
    Missing,
    /// The path exists but is not a git repository
    NotARepository,
    /// A git checkout. `origin` is the URL configured locally, if any.
    Present {
        origin: Option<String>,
        origin_matches: bool,
    },
}

impl CheckoutStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, CheckoutStatus::Present { origin_matches: true, .. })
    }
}

/// Replace a leading `~` with the current user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    let home = || directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());

    if path == "~" {
        if let Some(home) = home() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolved local path of a record
pub fn local_path(record: &RepositoryRecord) -> PathBuf {
    expand_path(&record.path)
}

pub fn checkout_status(record: &RepositoryRecord) -> CheckoutStatus {
    inspect(&local_path(record), &record.remotes.origin)
}

/// Inspect `path` and compare its `origin` remote against `expected_origin`
pub fn inspect(path: &Path, expected_origin: &str) -> CheckoutStatus {
    if !path.exists() {
        return CheckoutStatus::Missing;
    }

    let repo = match Repository::open(path) {
        Ok(repo) => repo,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "not a git repository");
            return CheckoutStatus::NotARepository;
        }
    };

    let origin = repo
        .find_remote("origin")
        .ok()
        .and_then(|remote| remote.url().map(String::from));

    let origin_matches = origin
        .as_deref()
        .is_some_and(|url| same_remote(url, expected_origin));
    if !origin_matches {
        tracing::warn!(
            path = %path.display(),
            expected = expected_origin,
            actual = ?origin,
            "origin remote differs from manifest"
        );
    }

    CheckoutStatus::Present {
        origin,
        origin_matches,
    }
}

/// Compare remote URLs ignoring a trailing `.git` or `/`, and treating the
/// https and scp-like ssh forms of a GitHub URL as the same remote.
pub fn same_remote(a: &str, b: &str) -> bool {
    normalize_remote(a) == normalize_remote(b)
}

fn normalize_remote(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    let url = url.strip_suffix(".git").unwrap_or(url);
    let url = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))
        .or_else(|| url.strip_prefix("https://github.com/"))
        .map(|repo| format!("github.com/{}", repo))
        .unwrap_or_else(|| url.to_string());
    url.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/srv/loom"), PathBuf::from("/srv/loom"));
        if let Some(dirs) = directories::BaseDirs::new() {
            assert_eq!(expand_path("~/x/loom"), dirs.home_dir().join("x/loom"));
            assert_eq!(expand_path("~"), dirs.home_dir());
        }
        // Only a leading tilde is special
        assert_eq!(expand_path("~other/x"), PathBuf::from("~other/x"));
    }

    #[test]
    fn test_same_remote() {
        assert!(same_remote("https://github.com/x/loom.git", "git@github.com:x/loom.git"));
        assert!(same_remote("https://github.com/x/loom", "https://github.com/X/Loom.git/"));
        assert!(!same_remote("https://github.com/x/loom.git", "https://github.com/y/loom.git"));
    }

    #[test]
    fn test_inspect_missing_and_plain_dir() {
        let dir = tempdir().unwrap();
        assert_eq!(
            inspect(&dir.path().join("absent"), "https://github.com/x/loom.git"),
            CheckoutStatus::Missing
        );
        assert_eq!(
            inspect(dir.path(), "https://github.com/x/loom.git"),
            CheckoutStatus::NotARepository
        );
    }

    #[test]
    fn test_inspect_git_checkout() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.remote("origin", "git@github.com:x/loom.git").unwrap();

        let status = inspect(dir.path(), "https://github.com/x/loom.git");
        assert!(status.is_healthy());

        let status = inspect(dir.path(), "https://github.com/x/vault.git");
        assert_eq!(
            status,
            CheckoutStatus::Present {
                origin: Some("git@github.com:x/loom.git".into()),
                origin_matches: false,
            }
        );
    }
}
