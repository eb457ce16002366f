//! Artifact building.
//!
//! One builder, two targets, each an explicitly ordered stage list. The
//! builder owns the rebuild-skip decision: an artifact already on disk is a
//! cache hit unless the spec forces a rebuild. Products land at the output
//! path only after the underlying build reported success, so a failed build
//! leaves nothing there and the next run retries from the staleness check.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BuildTarget, Error, Result};
use crate::paths::ROOTFS_IMAGE_NAME;
use crate::process::ToolRunner;

/// Where the kernel build drops its boot image inside the tree.
const KERNEL_IMAGE_IN_TREE: &str = "arch/x86/boot/bzImage";

/// Coarse staleness: artifact presence or an explicit force. No content
/// hashing, no timestamps.
pub fn is_stale(output: &Path, force_rebuild: bool) -> bool {
    force_rebuild || !output.exists()
}

/// Ordered stages of a kernel build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KernelStage {
    /// `make mrproper`; forces a non-incremental rebuild. Wipes `.config`,
    /// so it must come before `WriteConfig`.
    CleanTree,
    /// Write the effective config as the tree's active configuration.
    WriteConfig,
    /// `make -j<nproc>`.
    Compile,
    /// Copy the boot image to the sandbox, only after a successful compile.
    CopyImage,
}

/// Ordered stages of a rootfs build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootfsStage {
    /// `make defconfig` when the busybox tree has no config yet.
    EnsureConfig,
    /// `make install` into the shared `_install` staging tree.
    Install,
    /// Pack the staging tree into a gzipped newc cpio archive beside it.
    Archive,
    /// Copy the archive to the sandbox, only after archiving succeeded.
    CopyArchive,
}

/// Builds one artifact per call through an injected tool runner.
pub struct ImageBuilder<'a> {
    runner: &'a dyn ToolRunner,
}

impl<'a> ImageBuilder<'a> {
    pub fn new(runner: &'a dyn ToolRunner) -> Self {
        Self { runner }
    }

    /// Build the kernel image into `output`.
    pub fn build_kernel(
        &self,
        tree: &Path,
        effective_config: &str,
        force_rebuild: bool,
        output: &Path,
    ) -> Result<()> {
        if !is_stale(output, force_rebuild) {
            println!("  [SKIP] kernel image already built");
            return Ok(());
        }

        let mut stages = Vec::new();
        if force_rebuild {
            stages.push(KernelStage::CleanTree);
        }
        stages.extend([
            KernelStage::WriteConfig,
            KernelStage::Compile,
            KernelStage::CopyImage,
        ]);

        for stage in stages {
            self.kernel_stage(stage, tree, effective_config, output)?;
        }
        Ok(())
    }

    fn kernel_stage(
        &self,
        stage: KernelStage,
        tree: &Path,
        effective_config: &str,
        output: &Path,
    ) -> Result<()> {
        match stage {
            KernelStage::CleanTree => {
                println!("  Cleaning kernel tree...");
                self.make(BuildTarget::Kernel, tree, &["mrproper".to_string()])
            }
            KernelStage::WriteConfig => {
                fs::write(tree.join(".config"), effective_config)?;
                Ok(())
            }
            KernelStage::Compile => {
                println!("  Building kernel...");
                self.make(BuildTarget::Kernel, tree, &[jobs_arg()])
            }
            KernelStage::CopyImage => copy_artifact(&tree.join(KERNEL_IMAGE_IN_TREE), output),
        }
    }

    /// Build the rootfs archive into `output`. The staging tree must already
    /// hold any overlay the sandbox wants archived in.
    pub fn build_rootfs(
        &self,
        tree: &Path,
        staging: &Path,
        force_rebuild: bool,
        output: &Path,
    ) -> Result<()> {
        if !is_stale(output, force_rebuild) {
            println!("  [SKIP] rootfs archive already built");
            return Ok(());
        }

        for stage in [
            RootfsStage::EnsureConfig,
            RootfsStage::Install,
            RootfsStage::Archive,
            RootfsStage::CopyArchive,
        ] {
            self.rootfs_stage(stage, tree, staging, output)?;
        }
        Ok(())
    }

    fn rootfs_stage(
        &self,
        stage: RootfsStage,
        tree: &Path,
        staging: &Path,
        output: &Path,
    ) -> Result<()> {
        match stage {
            RootfsStage::EnsureConfig => {
                if tree.join(".config").exists() {
                    return Ok(());
                }
                println!("  Generating default busybox config...");
                self.make(BuildTarget::Rootfs, tree, &["defconfig".to_string()])
            }
            RootfsStage::Install => {
                println!("  Installing busybox into staging...");
                self.make(BuildTarget::Rootfs, tree, &[jobs_arg(), "install".to_string()])
            }
            RootfsStage::Archive => {
                println!("  Archiving staging tree...");
                let scratch = scratch_archive(tree);
                let pack = format!("find . | cpio -o -H newc | gzip > '{}'", scratch.display());
                let status = self
                    .runner
                    .run("sh", &["-c".to_string(), pack], staging)?;
                if status != 0 {
                    return Err(Error::BuildFailed {
                        target: BuildTarget::Rootfs,
                        status,
                    });
                }
                Ok(())
            }
            RootfsStage::CopyArchive => copy_artifact(&scratch_archive(tree), output),
        }
    }

    fn make(&self, target: BuildTarget, tree: &Path, args: &[String]) -> Result<()> {
        let status = self.runner.run("make", args, tree)?;
        if status != 0 {
            return Err(Error::BuildFailed { target, status });
        }
        Ok(())
    }
}

/// Scratch location the rootfs archive is packed to before the copy to the
/// sandbox. Lives beside the staging tree, never at the output path, so a
/// failed pack leaves nothing at the destination.
fn scratch_archive(tree: &Path) -> PathBuf {
    tree.join(ROOTFS_IMAGE_NAME)
}

fn jobs_arg() -> String {
    let cpus = match std::thread::available_parallelism() {
        Ok(n) => n.get(),
        Err(e) => {
            eprintln!("  [WARN] Could not detect CPU count ({}), using 4", e);
            4
        }
    };
    format!("-j{}", cpus)
}

fn copy_artifact(produced: &Path, output: &Path) -> Result<()> {
    if !produced.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("expected build product missing: {}", produced.display()),
        )));
    }
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(produced, output)?;
    println!("  Wrote {}", output.display());
    Ok(())
}
