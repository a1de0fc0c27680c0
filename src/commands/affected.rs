//! # Affected Command Implementation
//!
//! Prints the affected projects between two revisions as JSON on stdout, in
//! the shape `{"<project>": {"sync": bool, "variants": [..]}}`. With
//! `--build`, every affected project is then built: its default image plus
//! the variants listed for it.

use anyhow::Result;
use clap::Args;

use gam::affected;
use gam::orchestrators::build_affected;

use super::build::report;
use super::Context;

/// List the projects and variants affected by changes between two revisions
#[derive(Args, Debug)]
pub struct AffectedArgs {
    /// Base revision. Defaults to the workspace's `affected.defaultBase`.
    #[arg(long, value_name = "REV")]
    pub base: Option<String>,

    /// Head revision. Defaults to HEAD.
    #[arg(long, value_name = "REV")]
    pub head: Option<String>,

    /// Build the affected units after listing them.
    #[arg(long)]
    pub build: bool,
}

/// Execute the `affected` command.
pub fn execute(args: AffectedArgs, context: &Context) -> Result<()> {
    let host = context.host();
    let result = affected::affected(
        &host,
        &context.git(),
        args.base.as_deref(),
        args.head.as_deref(),
    )?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !args.build {
        return Ok(());
    }

    let reports = build_affected(&host, &context.docker(), &result)?;
    let mut failed = Vec::new();
    for build in &reports {
        eprintln!("{}", report(&context.out, build));
        if !build.success() {
            failed.push(build.project.clone());
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("Build failed for: {}", failed.join(", "));
    }
    Ok(())
}
