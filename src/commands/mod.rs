//! # CLI Command Implementations
//!
//! One module per `gam` subcommand. Each holds an `Args` struct derived with
//! `clap` and an `execute` function that wires the real host, docker and
//! git implementations into the `gam` library and renders the result.
//!
//! A command fails (exit code 1) when any unit it processed failed, after
//! every unit has been attempted and reported.

pub mod affected;
pub mod build;
pub mod changed;
pub mod completions;
pub mod dirty;
pub mod hash;
pub mod sync;
pub mod tag;

use std::path::PathBuf;

use clap::Args;

use gam::config::VariantSelection;
use gam::docker::DefaultDockerOperations;
use gam::filesystem::DiskHost;
use gam::git::DefaultGitOperations;
use gam::output::OutputConfig;
use gam::process::RunOptions;

/// Global settings shared by every command.
pub struct Context {
    pub root: PathBuf,
    pub run: RunOptions,
    pub out: OutputConfig,
}

impl Context {
    pub fn new(root: PathBuf, max_buffer: usize, color_flag: &str) -> Self {
        // build contexts are joined onto the root and the children also run
        // in it, so a relative root would be applied twice
        let root = root.canonicalize().unwrap_or(root);
        let run = RunOptions::default()
            .with_max_buffer(max_buffer)
            .with_cwd(root.clone());
        Self {
            root,
            run,
            out: OutputConfig::from_env_and_flag(color_flag),
        }
    }

    pub fn host(&self) -> DiskHost {
        DiskHost::new(self.root.clone())
    }

    pub fn docker(&self) -> DefaultDockerOperations {
        DefaultDockerOperations::new(self.run.clone())
    }

    pub fn git(&self) -> DefaultGitOperations {
        DefaultGitOperations::new(self.run.clone())
    }
}

/// Which variants a per-project command processes besides the default.
#[derive(Args, Debug)]
pub struct VariantArgs {
    /// Also process this variant (repeatable)
    #[arg(long = "variant", value_name = "NAME", conflicts_with = "all_variants")]
    pub variants: Vec<String>,

    /// Also process every declared variant
    #[arg(long)]
    pub all_variants: bool,
}

impl VariantArgs {
    pub fn selection(&self) -> VariantSelection {
        if self.all_variants {
            VariantSelection::All
        } else if self.variants.is_empty() {
            VariantSelection::DefaultOnly
        } else {
            VariantSelection::Named(self.variants.clone())
        }
    }
}
