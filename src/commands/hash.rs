//! # Hash Command Implementation
//!
//! Prints the commit hash of HEAD. With `--clean-only` nothing is printed
//! when the working tree is dirty, so callers can tell an exact build
//! revision from a modified checkout.

use anyhow::Result;
use clap::Args;

use gam::git::{GitOperations, HashOptions};

use super::Context;

/// Print the commit hash of HEAD
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Print nothing when the working tree is dirty
    #[arg(long)]
    pub clean_only: bool,

    /// Print the abbreviated hash
    #[arg(long)]
    pub short: bool,
}

/// Execute the `hash` command.
pub fn execute(args: HashArgs, context: &Context) -> Result<()> {
    let options = HashOptions {
        clean_only: args.clean_only,
        short: args.short,
    };

    if let Some(hash) = context.git().hash(options)? {
        println!("{}", hash);
    }
    Ok(())
}
