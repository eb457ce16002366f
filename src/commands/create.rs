//! Create command - persist a new sandbox spec record.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::paths::SandboxPaths;
use crate::spec::SandboxSpec;

/// Execute the create command. Artifacts are built on the first `run`.
pub fn cmd_create(
    config: &Config,
    name: &str,
    kernel_version: &str,
    buildconfig: Option<&Path>,
    force_rebuild: bool,
) -> Result<()> {
    let kernel_buildconfig = match buildconfig {
        Some(path) => read_fragment(path)?,
        None => Vec::new(),
    };

    let spec = SandboxSpec {
        name: name.to_string(),
        kernel_version: kernel_version.to_string(),
        kernel_buildconfig,
        force_rebuild,
    };

    let paths = SandboxPaths::new(&config.sandbox_root, name);
    spec.create(&paths)?;

    println!("Created sandbox '{}' (kernel {})", name, kernel_version);
    println!("  Spec: {}", paths.spec_file().display());
    println!("Build and boot it with: kernelbox run --name {}", name);
    Ok(())
}

/// One config line per non-empty line of the file, kept verbatim --
/// `# CONFIG_FOO is not set` lines are meaningful to the kernel tooling.
fn read_fragment(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read buildconfig {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
