//! kernelbox - build and boot disposable kernel sandboxes under QEMU.
//!
//! A sandbox is one directory holding a spec record, a kernel image, and a
//! rootfs archive. Sources are fetched lazily into a shared cache; builds
//! are skipped when the artifacts already exist.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use kernelbox::commands;
use kernelbox::config::Config;

#[derive(Parser)]
#[command(name = "kernelbox")]
#[command(about = "Disposable QEMU sandboxes for kernel experimentation")]
#[command(
    after_help = "QUICK START:\n  kernelbox create --name demo --kernel-version v6.6\n  kernelbox run --name demo\n  kernelbox list\n  kernelbox remove --name demo"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a sandbox spec (artifacts are built on first run)
    Create {
        /// Sandbox name (one directory per name)
        #[arg(long)]
        name: String,
        /// Kernel git tag to build against (e.g. v6.6)
        #[arg(long)]
        kernel_version: String,
        /// File of kernel config lines appended to the base defconfig
        #[arg(long)]
        buildconfig: Option<PathBuf>,
        /// Always rebuild artifacts, even when they already exist
        #[arg(long)]
        force_rebuild: bool,
    },

    /// Build the sandbox's artifacts if stale, then boot them in QEMU
    Run {
        /// Sandbox name
        #[arg(long)]
        name: String,
    },

    /// Delete a sandbox directory
    Remove {
        /// Sandbox name
        #[arg(long)]
        name: String,
    },

    /// List sandboxes
    List,

    /// Remove the shared source cache (sandboxes are preserved)
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    let base_dir = std::env::current_dir()?;
    let config = Config::load(&base_dir);

    match cli.command {
        Commands::Create {
            name,
            kernel_version,
            buildconfig,
            force_rebuild,
        } => {
            commands::cmd_create(
                &config,
                &name,
                &kernel_version,
                buildconfig.as_deref(),
                force_rebuild,
            )?;
        }

        Commands::Run { name } => {
            commands::cmd_run(&config, &name)?;
        }

        Commands::Remove { name } => {
            commands::cmd_remove(&config, &name)?;
        }

        Commands::List => {
            commands::cmd_list(&config)?;
        }

        Commands::Clean => {
            commands::cmd_clean(&config)?;
        }
    }

    Ok(())
}
