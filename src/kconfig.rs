//! Kernel configuration composition.
//!
//! A sandbox's config starts from the architecture defconfig; the spec's
//! buildconfig lines are appended verbatim and the combined text is reduced
//! by the kernel's own config tooling, never reimplemented here.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::process::ToolRunner;

/// Reduction passes over a merged config. Declaration order is the only
/// valid execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReducePass {
    /// `make olddefconfig`: fill every unset option with the architecture
    /// default consistent with what is already set.
    ResolveDefaults,
    /// `make localmodconfig`: disable subsystems no loaded module needs.
    Localize,
}

impl ReducePass {
    fn make_target(self) -> &'static str {
        match self {
            Self::ResolveDefaults => "olddefconfig",
            Self::Localize => "localmodconfig",
        }
    }
}

/// The reduction sequence for a fragment merge: defaults must be resolved
/// before the config is localized.
pub const REDUCE_ORDER: [ReducePass; 2] = [ReducePass::ResolveDefaults, ReducePass::Localize];

/// Append fragment lines to a base config. Pure text; order-preserving.
pub fn merge_text(base: &str, fragment: &[String]) -> String {
    let mut merged = base.to_string();
    if !merged.is_empty() && !merged.ends_with('\n') {
        merged.push('\n');
    }
    for line in fragment {
        merged.push_str(line);
        merged.push('\n');
    }
    merged
}

/// Composes a buildable kernel config from a base and a fragment.
pub struct ConfigComposer<'a> {
    runner: &'a dyn ToolRunner,
}

impl<'a> ConfigComposer<'a> {
    pub fn new(runner: &'a dyn ToolRunner) -> Self {
        Self { runner }
    }

    /// Produce the effective config for `tree`.
    ///
    /// An empty fragment returns the base text untouched and invokes
    /// nothing. Otherwise the merged text becomes the tree's `.config`,
    /// both reduction passes run over it, and the reduced text is read
    /// back and returned.
    pub fn compose(&self, tree: &Path, base: &str, fragment: &[String]) -> Result<String> {
        if fragment.is_empty() {
            return Ok(base.to_string());
        }

        let config_path = tree.join(".config");
        fs::write(&config_path, merge_text(base, fragment))?;
        self.reduce(tree, &REDUCE_ORDER)?;
        Ok(fs::read_to_string(&config_path)?)
    }

    /// Run reduction passes over the tree's `.config`.
    ///
    /// Precondition: `passes` is in declaration order. Localizing before
    /// defaults are resolved yields an invalid config, so a misordered
    /// list is a caller bug and panics.
    pub fn reduce(&self, tree: &Path, passes: &[ReducePass]) -> Result<()> {
        assert!(
            passes.windows(2).all(|w| w[0] < w[1]),
            "config reduction passes out of order: {:?}",
            passes
        );

        for pass in passes {
            let target = pass.make_target();
            println!("  make {}...", target);
            let status = self.runner.run("make", &[target.to_string()], tree)?;
            if status != 0 {
                return Err(Error::ConfigConflict {
                    pass: target,
                    reason: format!("make {} exited with status {}", target, status),
                });
            }
        }
        Ok(())
    }
}
