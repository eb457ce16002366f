//! QEMU launch glue.
//!
//! The pipeline's job ends at the two artifact paths; this boots them on
//! the serial console.

use anyhow::{Context, Result};

use crate::pipeline::SandboxArtifacts;
use crate::process::Cmd;

const QEMU_BIN: &str = "qemu-system-x86_64";

/// Boot a sandbox's kernel and rootfs in QEMU.
pub fn boot(artifacts: &SandboxArtifacts) -> Result<()> {
    which::which(QEMU_BIN)
        .with_context(|| format!("'{}' not found in PATH. Is QEMU installed?", QEMU_BIN))?;

    println!("Booting sandbox...");
    println!("  Kernel: {}", artifacts.kernel_image.display());
    println!("  Rootfs: {}", artifacts.rootfs_image.display());
    println!("Press Ctrl+A, X to exit QEMU\n");

    Cmd::new(QEMU_BIN)
        .arg("-kernel")
        .arg_path(&artifacts.kernel_image)
        .arg("-initrd")
        .arg_path(&artifacts.rootfs_image)
        .args([
            "-append",
            "rdinit=/bin/sh console=ttyS0,115200",
            "-nographic",
            "-serial",
            "mon:stdio",
        ])
        .error_msg("QEMU exited abnormally")
        .run_interactive()?;

    Ok(())
}
