//! Sandbox build orchestration.
//!
//! `run` drives one sandbox from its persisted spec to a pair of bootable
//! artifacts. The two artifacts are staleness-checked independently, so a
//! change that invalidates only one of them rebuilds only that one. Every
//! tool invocation is a blocking call; builds against the shared staging
//! tree must be serialized by the caller (one pipeline per host at a time).

use std::fs;
use std::path::PathBuf;

use crate::build::{self, ImageBuilder};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{SourceFetcher, SourceKind, SourceTree};
use crate::kconfig::ConfigComposer;
use crate::overlay;
use crate::paths::SandboxPaths;
use crate::process::ToolRunner;
use crate::spec::SandboxSpec;

/// Architecture-default config used as the composition base.
const BASE_DEFCONFIG: &str = "arch/x86/configs/x86_64_defconfig";

/// Paths of the two build products handed to the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxArtifacts {
    pub kernel_image: PathBuf,
    pub rootfs_image: PathBuf,
}

/// Orchestrates spec loading, source fetching, and the two build stages.
pub struct SandboxPipeline<'a> {
    config: &'a Config,
    fetcher: &'a dyn SourceFetcher,
    runner: &'a dyn ToolRunner,
}

impl<'a> SandboxPipeline<'a> {
    pub fn new(
        config: &'a Config,
        fetcher: &'a dyn SourceFetcher,
        runner: &'a dyn ToolRunner,
    ) -> Self {
        Self {
            config,
            fetcher,
            runner,
        }
    }

    /// Bring the named sandbox's artifacts up to date and return their paths.
    pub fn run(&self, name: &str) -> Result<SandboxArtifacts> {
        let paths = SandboxPaths::new(&self.config.sandbox_root, name);
        let spec = SandboxSpec::load(&paths, name)?;

        let init_tree = self.fetcher.fetch(SourceKind::InitSystem, None)?;
        let kernel_tree = self
            .fetcher
            .fetch(SourceKind::Kernel, Some(&spec.kernel_version))?;

        self.rootfs_stage(&spec, &init_tree, &paths)?;
        self.kernel_stage(&spec, &kernel_tree, &paths)?;

        Ok(SandboxArtifacts {
            kernel_image: paths.kernel_image(),
            rootfs_image: paths.rootfs_image(),
        })
    }

    fn rootfs_stage(
        &self,
        spec: &SandboxSpec,
        init_tree: &SourceTree,
        paths: &SandboxPaths,
    ) -> Result<()> {
        let output = paths.rootfs_image();
        if !build::is_stale(&output, spec.force_rebuild) {
            println!("[SKIP] rootfs up to date");
            return Ok(());
        }

        println!("Building rootfs for sandbox '{}'...", spec.name);
        let staging = init_tree.path.join("_install");

        // The overlay borrows the shared staging tree; revert must run even
        // when the build fails.
        let handle = overlay::apply(&paths.overlay_dir(), &staging)?;
        let built = ImageBuilder::new(self.runner).build_rootfs(
            &init_tree.path,
            &staging,
            spec.force_rebuild,
            &output,
        );
        let reverted = handle.revert();
        built?;
        reverted?;
        Ok(())
    }

    fn kernel_stage(
        &self,
        spec: &SandboxSpec,
        kernel_tree: &SourceTree,
        paths: &SandboxPaths,
    ) -> Result<()> {
        let output = paths.kernel_image();
        if !build::is_stale(&output, spec.force_rebuild) {
            println!("[SKIP] kernel up to date");
            return Ok(());
        }

        println!(
            "Building kernel {} for sandbox '{}'...",
            spec.kernel_version, spec.name
        );
        let base = fs::read_to_string(kernel_tree.path.join(BASE_DEFCONFIG))?;
        let effective = ConfigComposer::new(self.runner).compose(
            &kernel_tree.path,
            &base,
            &spec.kernel_buildconfig,
        )?;
        ImageBuilder::new(self.runner).build_kernel(
            &kernel_tree.path,
            &effective,
            spec.force_rebuild,
            &output,
        )
    }
}
