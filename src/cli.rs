//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use gam::defaults::DEFAULT_MAX_BUFFER;

use crate::commands::{self, Context};

/// gam - Affected-change builds, artifact sync and image tagging for monorepos
#[derive(Parser, Debug)]
#[command(name = "gam")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Workspace root containing gam.json
    #[arg(long, global = true, value_name = "DIR", env = "GAM_ROOT", default_value = ".")]
    root: PathBuf,

    /// Capture ceiling in bytes for each stream of a child process
    #[arg(long, global = true, value_name = "BYTES", env = "GAM_MAX_BUFFER", default_value_t = DEFAULT_MAX_BUFFER)]
    max_buffer: usize,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the projects and variants affected by changes between two revisions
    Affected(commands::affected::AffectedArgs),

    /// Build the docker images of a project
    Build(commands::build::BuildArgs),

    /// Copy changed workspace artifacts into a project
    Sync(commands::sync::SyncArgs),

    /// Re-tag a project's local images under the workspace organization
    Tag(commands::tag::TagArgs),

    /// List files changed between two revisions
    Changed(commands::changed::ChangedArgs),

    /// Report whether the working tree has uncommitted changes
    Dirty(commands::dirty::DirtyArgs),

    /// Print the commit hash of HEAD
    Hash(commands::hash::HashArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let context = Context::new(self.root, self.max_buffer, &self.color);

        match self.command {
            Commands::Affected(args) => commands::affected::execute(args, &context),
            Commands::Build(args) => commands::build::execute(args, &context),
            Commands::Sync(args) => commands::sync::execute(args, &context),
            Commands::Tag(args) => commands::tag::execute(args, &context),
            Commands::Changed(args) => commands::changed::execute(args, &context),
            Commands::Dirty(args) => commands::dirty::execute(args, &context),
            Commands::Hash(args) => commands::hash::execute(args, &context),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set. Logs go to stderr so that
/// stdout stays machine-readable.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // a second init (e.g. in-process tests) is harmless
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
