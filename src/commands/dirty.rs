//! # Dirty Command Implementation
//!
//! Prints `true` when the working tree has untracked, uncommitted or staged
//! files, `false` otherwise. With `--check`, exits non-zero when dirty
//! instead, for use in shell conditions.

use anyhow::Result;
use clap::Args;

use gam::git::GitOperations;

use super::Context;

/// Report whether the working tree has uncommitted changes
#[derive(Args, Debug)]
pub struct DirtyArgs {
    /// Fail when the working tree is dirty
    #[arg(long)]
    pub check: bool,
}

/// Execute the `dirty` command.
pub fn execute(args: DirtyArgs, context: &Context) -> Result<()> {
    let dirty = context.git().repo_dirty()?;
    println!("{}", dirty);

    if args.check && dirty {
        anyhow::bail!("Working tree at {} is dirty", context.root.display());
    }
    Ok(())
}
