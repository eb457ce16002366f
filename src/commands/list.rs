//! List command - one line per sandbox directory.

use anyhow::Result;
use std::fs;

use crate::config::Config;
use crate::paths::SandboxPaths;
use crate::spec::SandboxSpec;

/// Execute the list command.
pub fn cmd_list(config: &Config) -> Result<()> {
    let names = sandbox_names(config)?;
    if names.is_empty() {
        println!("No sandboxes.");
        println!("Create one with: kernelbox create --name <name> --kernel-version <tag>");
        return Ok(());
    }

    for name in names {
        let paths = SandboxPaths::new(&config.sandbox_root, &name);
        match SandboxSpec::load(&paths, &name) {
            Ok(spec) => println!("{}  (kernel {})", name, spec.kernel_version),
            Err(_) => println!("{}  [invalid spec]", name),
        }
    }
    Ok(())
}

/// Sandbox directory names under the sandbox root, sorted.
pub fn sandbox_names(config: &Config) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if !config.sandbox_root.exists() {
        return Ok(names);
    }

    for entry in fs::read_dir(&config.sandbox_root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
