//! # Sync Command Implementation
//!
//! Copies the workspace artifacts a project consumes into its default unit
//! and every variant. Destinations already holding identical content are
//! left alone.

use anyhow::Result;
use clap::Args;

use gam::orchestrators;
use gam::output::Marker;

use super::Context;

/// Copy changed workspace artifacts into a project
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Project name as declared in gam.json
    pub project: String,
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs, context: &Context) -> Result<()> {
    let mut host = context.host();
    let report = orchestrators::sync(&mut host, &args.project)?;
    let out = &context.out;

    for destination in &report.synced {
        println!("{}", out.line(Marker::Ok, &format!("synced {}", destination)));
    }
    for destination in &report.skipped {
        println!(
            "{}",
            out.line(Marker::Info, &format!("up to date {}", destination))
        );
    }
    for failure in &report.failed {
        println!(
            "{}",
            out.line(
                Marker::Err,
                &format!("{}: {}", failure.destination, failure.message)
            )
        );
    }

    if !report.success() {
        anyhow::bail!(
            "Sync of {} failed for {} destination(s)",
            report.project,
            report.failed.len()
        );
    }
    Ok(())
}
