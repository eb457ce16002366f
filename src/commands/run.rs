//! Run command - build a sandbox's artifacts and boot them.

use anyhow::Result;

use crate::config::Config;
use crate::fetch::GitFetcher;
use crate::pipeline::SandboxPipeline;
use crate::process::HostRunner;
use crate::qemu;

/// Execute the run command.
pub fn cmd_run(config: &Config, name: &str) -> Result<()> {
    let fetcher = GitFetcher::new(config);
    let runner = HostRunner;
    let pipeline = SandboxPipeline::new(config, &fetcher, &runner);

    let artifacts = pipeline.run(name)?;
    qemu::boot(&artifacts)?;
    Ok(())
}
