//! # Changed Command Implementation
//!
//! Prints the files changed between the merge base of two revisions and the
//! head revision, one repository-relative path per line.

use anyhow::Result;
use clap::Args;

use gam::config;
use gam::defaults::{DEFAULT_BASE, DEFAULT_HEAD};
use gam::git::GitOperations;

use super::Context;

/// List files changed between two revisions
#[derive(Args, Debug)]
pub struct ChangedArgs {
    /// Base revision. Defaults to the workspace's `affected.defaultBase`,
    /// or `main` outside a workspace.
    #[arg(long, value_name = "REV")]
    pub base: Option<String>,

    /// Head revision.
    #[arg(long, value_name = "REV", default_value = DEFAULT_HEAD)]
    pub head: String,
}

/// Execute the `changed` command.
pub fn execute(args: ChangedArgs, context: &Context) -> Result<()> {
    let base = match args.base {
        Some(base) => base,
        None => config::load_workspace(&context.host())
            .map(|workspace| workspace.affected.default_base)
            .unwrap_or_else(|_| DEFAULT_BASE.to_string()),
    };

    for file in context.git().changed_files(&base, &args.head)? {
        println!("{}", file);
    }
    Ok(())
}
