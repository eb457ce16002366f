//! Remove command - delete a sandbox directory.

use anyhow::Result;
use std::fs;

use crate::config::Config;
use crate::error::Error;
use crate::paths::SandboxPaths;

/// Execute the remove command.
pub fn cmd_remove(config: &Config, name: &str) -> Result<()> {
    let paths = SandboxPaths::new(&config.sandbox_root, name);
    if !paths.dir().exists() {
        return Err(Error::NoSuchSandbox(name.to_string()).into());
    }

    fs::remove_dir_all(paths.dir())?;
    println!("Removed sandbox '{}'", name);
    Ok(())
}
