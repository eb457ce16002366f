//! Shared test utilities for kernelbox tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use kernelbox::config::Config;
use kernelbox::error::{Error, Result};
use kernelbox::fetch::{SourceFetcher, SourceKind, SourceTree};
use kernelbox::process::ToolRunner;

/// Test environment rooted in a temp directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub config: Config,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let config = Config {
            sandbox_root: base.join("sandbox"),
            repos_root: base.join("repos"),
            busybox_git_url: "https://example.invalid/busybox.git".to_string(),
            linux_git_url: "https://example.invalid/linux.git".to_string(),
        };
        fs::create_dir_all(&config.sandbox_root).expect("Failed to create sandbox root");

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// The shared busybox install staging tree.
    pub fn busybox_staging(&self) -> PathBuf {
        self.config.busybox_dir().join("_install")
    }
}

/// Fetcher that materializes minimal source trees instead of cloning.
pub struct MockFetcher {
    config: Config,
    /// Fail fetches of this kind with `FetchFailed`.
    pub fail_kind: Option<SourceKind>,
    pub calls: RefCell<Vec<SourceKind>>,
}

impl MockFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            fail_kind: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(config: &Config, kind: SourceKind) -> Self {
        let mut fetcher = Self::new(config);
        fetcher.fail_kind = Some(kind);
        fetcher
    }
}

impl SourceFetcher for MockFetcher {
    fn fetch(&self, kind: SourceKind, version: Option<&str>) -> Result<SourceTree> {
        self.calls.borrow_mut().push(kind);
        if self.fail_kind == Some(kind) {
            return Err(Error::FetchFailed {
                kind,
                reason: "mock fetch failure".to_string(),
            });
        }

        let path = match kind {
            SourceKind::InitSystem => self.config.busybox_dir(),
            SourceKind::Kernel => self
                .config
                .linux_dir(version.expect("kernel fetch needs a version")),
        };

        fs::create_dir_all(&path)?;
        fs::write(path.join("Makefile"), "all:\n")?;
        if kind == SourceKind::Kernel {
            let configs = path.join("arch/x86/configs");
            fs::create_dir_all(&configs)?;
            fs::write(configs.join("x86_64_defconfig"), "CONFIG_64BIT=y\n")?;
        }

        Ok(SourceTree { kind, path })
    }
}

/// A recorded build-tool invocation.
#[derive(Debug, Clone)]
pub struct RunnerCall {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
}

impl RunnerCall {
    pub fn arg_line(&self) -> String {
        self.args.join(" ")
    }

    /// The bare kernel compile is the only `make` call with a lone -j flag.
    pub fn is_kernel_compile(&self) -> bool {
        self.program == "make" && self.args.len() == 1 && self.args[0].starts_with("-j")
    }

    pub fn is_busybox_install(&self) -> bool {
        self.program == "make" && self.args.iter().any(|a| a == "install")
    }

    pub fn is_archive(&self) -> bool {
        self.program == "sh" && self.arg_line().contains("cpio")
    }
}

/// Handler deciding a mock invocation's side effects and exit code.
pub type CallHandler = Box<dyn Fn(&RunnerCall) -> i32>;

/// ToolRunner that records invocations instead of spawning processes.
pub struct MockRunner {
    pub calls: RefCell<Vec<RunnerCall>>,
    handler: CallHandler,
}

impl MockRunner {
    /// Runner whose handler simulates successful builds by creating the
    /// files the pipeline expects each tool to produce.
    pub fn succeeding() -> Self {
        Self::with_handler(Box::new(simulate_success))
    }

    pub fn with_handler(handler: CallHandler) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            handler,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Argument lines of every `make` invocation, in order.
    pub fn make_targets(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.program == "make")
            .map(|c| c.arg_line())
            .collect()
    }

    pub fn ran_busybox_install(&self) -> bool {
        self.calls.borrow().iter().any(|c| c.is_busybox_install())
    }

    pub fn ran_archive(&self) -> bool {
        self.calls.borrow().iter().any(|c| c.is_archive())
    }

    pub fn ran_kernel_compile(&self) -> bool {
        self.calls.borrow().iter().any(|c| c.is_kernel_compile())
    }
}

impl ToolRunner for MockRunner {
    fn run(&self, program: &str, args: &[String], dir: &Path) -> std::io::Result<i32> {
        let call = RunnerCall {
            program: program.to_string(),
            args: args.to_vec(),
            dir: dir.to_path_buf(),
        };
        let code = (self.handler)(&call);
        self.calls.borrow_mut().push(call);
        Ok(code)
    }
}

/// Create the files the real tools would have produced, then report success.
pub fn simulate_success(call: &RunnerCall) -> i32 {
    if call.is_busybox_install() {
        let bin = call.dir.join("_install/bin");
        fs::create_dir_all(&bin).expect("create staging bin");
        fs::write(bin.join("busybox"), "busybox").expect("write busybox");
    } else if call.is_kernel_compile() {
        let boot = call.dir.join("arch/x86/boot");
        fs::create_dir_all(&boot).expect("create boot dir");
        fs::write(boot.join("bzImage"), "kernel image").expect("write bzImage");
    } else if call.is_archive() {
        // The pack pipeline runs inside staging and writes beside it.
        let scratch = call
            .dir
            .parent()
            .expect("staging has a parent")
            .join("rootfs.img");
        fs::write(scratch, "rootfs archive").expect("write archive");
    }
    0
}
