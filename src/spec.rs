//! Sandbox spec records.
//!
//! One `sandbox.json` per sandbox directory is the single source of truth
//! for that sandbox's identity and build intent. The record is written once
//! by `create`, read (never mutated) by `run`, and deleted with the sandbox.

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};
use crate::paths::SandboxPaths;

/// Declarative description of one sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SandboxSpec {
    pub name: String,
    /// Git tag naming the kernel source tree to build against.
    pub kernel_version: String,
    /// Config lines appended to the base defconfig, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub kernel_buildconfig: Vec<String>,
    /// Rebuild artifacts even when they already exist on disk.
    pub force_rebuild: bool,
}

/// Raw on-disk shape; required fields are checked when converting to
/// `SandboxSpec` instead of silently defaulting.
#[derive(Debug, Deserialize)]
struct RawSpec {
    name: Option<String>,
    kernel_version: Option<String>,
    #[serde(default)]
    kernel_buildconfig: Vec<String>,
    #[serde(default)]
    force_rebuild: bool,
}

impl SandboxSpec {
    /// Load and validate the spec record for the sandbox called `name`.
    pub fn load(paths: &SandboxPaths, name: &str) -> Result<Self> {
        let spec_file = paths.spec_file();
        if !spec_file.exists() {
            return Err(Error::NoSuchSandbox(name.to_string()));
        }

        let text = fs::read_to_string(&spec_file)?;
        let raw: RawSpec = serde_json::from_str(&text).map_err(|e| Error::SpecInvalid {
            path: spec_file.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSpec) -> Result<Self> {
        let name = raw.name.ok_or(Error::MissingRequiredField("name"))?;
        let kernel_version = raw
            .kernel_version
            .ok_or(Error::MissingRequiredField("kernel_version"))?;

        Ok(Self {
            name,
            kernel_version,
            kernel_buildconfig: raw.kernel_buildconfig,
            force_rebuild: raw.force_rebuild,
        })
    }

    /// Persist the record, failing if the sandbox already exists.
    pub fn create(&self, paths: &SandboxPaths) -> Result<()> {
        if paths.dir().exists() {
            return Err(Error::AlreadyExists(self.name.clone()));
        }

        fs::create_dir_all(paths.dir())?;
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::SpecInvalid {
            path: paths.spec_file().display().to_string(),
            reason: e.to_string(),
        })?;
        fs::write(paths.spec_file(), json + "\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn paths_in(dir: &Path, name: &str) -> SandboxPaths {
        SandboxPaths::new(dir, name)
    }

    #[test]
    fn roundtrip_through_disk() {
        let tmp = TempDir::new().unwrap();
        let paths = paths_in(tmp.path(), "demo");
        let spec = SandboxSpec {
            name: "demo".to_string(),
            kernel_version: "v6.6".to_string(),
            kernel_buildconfig: vec!["CONFIG_KGDB=y".to_string()],
            force_rebuild: true,
        };

        spec.create(&paths).unwrap();
        let loaded = SandboxSpec::load(&paths, "demo").unwrap();
        assert_eq!(loaded, spec);
    }

    #[test]
    fn optional_fields_default() {
        let tmp = TempDir::new().unwrap();
        let paths = paths_in(tmp.path(), "bare");
        fs::create_dir_all(paths.dir()).unwrap();
        fs::write(
            paths.spec_file(),
            r#"{"name": "bare", "kernel_version": "v6.6"}"#,
        )
        .unwrap();

        let loaded = SandboxSpec::load(&paths, "bare").unwrap();
        assert!(loaded.kernel_buildconfig.is_empty());
        assert!(!loaded.force_rebuild);
    }

    #[test]
    fn missing_kernel_version_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let paths = paths_in(tmp.path(), "broken");
        fs::create_dir_all(paths.dir()).unwrap();
        fs::write(paths.spec_file(), r#"{"name": "broken"}"#).unwrap();

        let err = SandboxSpec::load(&paths, "broken").unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField("kernel_version")));
    }

    #[test]
    fn unparseable_record_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let paths = paths_in(tmp.path(), "garbled");
        fs::create_dir_all(paths.dir()).unwrap();
        fs::write(paths.spec_file(), "not json").unwrap();

        let err = SandboxSpec::load(&paths, "garbled").unwrap_err();
        assert!(matches!(err, Error::SpecInvalid { .. }));
    }

    #[test]
    fn load_without_record_is_no_such_sandbox() {
        let tmp = TempDir::new().unwrap();
        let paths = paths_in(tmp.path(), "ghost");

        let err = SandboxSpec::load(&paths, "ghost").unwrap_err();
        assert!(matches!(err, Error::NoSuchSandbox(name) if name == "ghost"));
    }

    #[test]
    fn create_refuses_existing_sandbox() {
        let tmp = TempDir::new().unwrap();
        let paths = paths_in(tmp.path(), "dup");
        let spec = SandboxSpec {
            name: "dup".to_string(),
            kernel_version: "v6.6".to_string(),
            kernel_buildconfig: Vec::new(),
            force_rebuild: false,
        };

        spec.create(&paths).unwrap();
        let before = fs::read_to_string(paths.spec_file()).unwrap();

        let mut again = spec.clone();
        again.kernel_version = "v6.7".to_string();
        let err = again.create(&paths).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(name) if name == "dup"));

        // The original record is untouched.
        let after = fs::read_to_string(paths.spec_file()).unwrap();
        assert_eq!(before, after);
    }
}
