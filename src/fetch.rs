//! Source tree resolution.
//!
//! Kernel and busybox checkouts form a process-wide cache under the repos
//! root: fetched lazily on first reference, shared by every sandbox that
//! names the same version, and never deleted except by `kernelbox clean`.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::process::Cmd;

/// Which component a source tree holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Kernel,
    InitSystem,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kernel => write!(f, "kernel"),
            Self::InitSystem => write!(f, "init system"),
        }
    }
}

/// An on-disk checkout of a versioned component.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub kind: SourceKind,
    pub path: PathBuf,
}

/// Resolves source trees, fetching them on first reference.
pub trait SourceFetcher {
    /// Resolve the tree for `kind`. `version` keys kernel checkouts and is
    /// ignored for the single shared init-system tree. Idempotent: an
    /// existing checkout is returned without re-fetching.
    fn fetch(&self, kind: SourceKind, version: Option<&str>) -> Result<SourceTree>;
}

/// Fetches sources with `git clone`, streaming progress to the terminal.
pub struct GitFetcher<'a> {
    config: &'a Config,
}

impl<'a> GitFetcher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }
}

impl SourceFetcher for GitFetcher<'_> {
    fn fetch(&self, kind: SourceKind, version: Option<&str>) -> Result<SourceTree> {
        let (dest, branch) = match kind {
            SourceKind::InitSystem => (self.config.busybox_dir(), None),
            SourceKind::Kernel => {
                let version = version.ok_or_else(|| Error::FetchFailed {
                    kind,
                    reason: "no kernel version given".to_string(),
                })?;
                (self.config.linux_dir(version), Some(version))
            }
        };

        if dest.exists() {
            println!("  {} source: {} (cached)", kind, dest.display());
            return Ok(SourceTree { kind, path: dest });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let url = match kind {
            SourceKind::InitSystem => &self.config.busybox_git_url,
            SourceKind::Kernel => &self.config.linux_git_url,
        };

        println!("  Cloning {} source...", kind);
        println!("    URL: {}", url);
        println!("    Destination: {}", dest.display());

        let mut cmd = Cmd::new("git").arg("clone");
        if let Some(branch) = branch {
            // Shallow clone of the one tag we need; full kernel history is
            // multiple gigabytes.
            cmd = cmd.args(["--branch", branch, "--depth", "1"]);
        }
        let cloned = cmd
            .arg(url)
            .arg_path(&dest)
            .error_msg("git clone failed")
            .run_interactive();

        if let Err(e) = cloned {
            // Drop the partial checkout so the next attempt starts clean.
            if dest.exists() {
                let _ = fs::remove_dir_all(&dest);
            }
            return Err(Error::FetchFailed {
                kind,
                reason: e.to_string(),
            });
        }

        if !dest.join("Makefile").exists() {
            return Err(Error::FetchFailed {
                kind,
                reason: "checkout is invalid (no Makefile)".to_string(),
            });
        }

        Ok(SourceTree { kind, path: dest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            sandbox_root: dir.join("sandbox"),
            repos_root: dir.join("repos"),
            busybox_git_url: "https://example.invalid/busybox.git".to_string(),
            linux_git_url: "https://example.invalid/linux.git".to_string(),
        }
    }

    #[test]
    fn existing_checkout_is_returned_without_fetching() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let dest = config.linux_dir("v6.6");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("Makefile"), "all:\n").unwrap();

        // The bogus URL guarantees this would fail if it tried to clone.
        let tree = GitFetcher::new(&config)
            .fetch(SourceKind::Kernel, Some("v6.6"))
            .unwrap();
        assert_eq!(tree.path, dest);
        assert_eq!(tree.kind, SourceKind::Kernel);
    }

    #[test]
    fn kernel_fetch_requires_a_version() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());

        let err = GitFetcher::new(&config)
            .fetch(SourceKind::Kernel, None)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::FetchFailed {
                kind: SourceKind::Kernel,
                ..
            }
        ));
    }
}
