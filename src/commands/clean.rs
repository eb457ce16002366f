//! Clean command - drop the shared source cache.

use anyhow::Result;
use std::fs;

use crate::config::Config;

/// Execute the clean command. Sandboxes and their artifacts are preserved;
/// sources are re-fetched lazily on the next run.
pub fn cmd_clean(config: &Config) -> Result<()> {
    if config.repos_root.exists() {
        println!("Removing {}...", config.repos_root.display());
        fs::remove_dir_all(&config.repos_root)?;
        println!("Source cache cleaned (sandboxes preserved).");
    } else {
        println!("No source cache to clean.");
    }
    Ok(())
}
