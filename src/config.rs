//! Configuration for kernelbox.
//!
//! Reads overrides from the environment (a `.env` file is loaded at startup);
//! defaults put the sandbox and source directories under the working
//! directory. Environment variables win over defaults.

use std::env;
use std::path::{Path, PathBuf};

/// Default git URL for the busybox init system.
pub const DEFAULT_BUSYBOX_GIT_URL: &str = "https://git.busybox.net/busybox.git";
/// Default git URL for the Linux kernel.
pub const DEFAULT_LINUX_GIT_URL: &str = "https://github.com/torvalds/linux.git";

/// kernelbox configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one subdirectory per sandbox.
    pub sandbox_root: PathBuf,
    /// Shared source cache: one linux checkout per version, one busybox tree.
    pub repos_root: PathBuf,
    /// Git URL for busybox.
    pub busybox_git_url: String,
    /// Git URL for the Linux kernel.
    pub linux_git_url: String,
}

impl Config {
    /// Load configuration, resolving relative path overrides against `base_dir`.
    pub fn load(base_dir: &Path) -> Self {
        let sandbox_root = path_var("KERNELBOX_SANDBOX_ROOT", base_dir, "sandbox");
        let repos_root = path_var("KERNELBOX_REPOS_ROOT", base_dir, "repos");

        let busybox_git_url = env::var("BUSYBOX_GIT_URL")
            .unwrap_or_else(|_| DEFAULT_BUSYBOX_GIT_URL.to_string());
        let linux_git_url =
            env::var("LINUX_GIT_URL").unwrap_or_else(|_| DEFAULT_LINUX_GIT_URL.to_string());

        Self {
            sandbox_root,
            repos_root,
            busybox_git_url,
            linux_git_url,
        }
    }

    /// The single shared busybox checkout.
    pub fn busybox_dir(&self) -> PathBuf {
        self.repos_root.join("busybox")
    }

    /// Kernel checkout for one version tag.
    pub fn linux_dir(&self, version: &str) -> PathBuf {
        self.repos_root.join("linux").join(version)
    }
}

fn path_var(key: &str, base_dir: &Path, default: &str) -> PathBuf {
    match env::var(key) {
        Ok(value) => {
            let path = PathBuf::from(value);
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        }
        Err(_) => base_dir.join(default),
    }
}
