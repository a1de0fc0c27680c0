//! # Build Command Implementation
//!
//! Builds a project's default image and the selected variants with
//! `docker build`, one after another, then prints one status line per unit.

use anyhow::Result;
use clap::Args;

use gam::orchestrators::{self, BuildReport, UnitStatus};
use gam::output::{Marker, OutputConfig};

use super::{Context, VariantArgs};

/// Build the docker images of a project
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Project name as declared in gam.json
    pub project: String,

    #[command(flatten)]
    pub variants: VariantArgs,
}

/// Execute the `build` command.
pub fn execute(args: BuildArgs, context: &Context) -> Result<()> {
    let build = orchestrators::build(
        &context.host(),
        &context.docker(),
        &args.project,
        &args.variants.selection(),
    )?;

    println!("{}", report(&context.out, &build));

    if !build.success() {
        anyhow::bail!(
            "Build of {} failed for: {}",
            build.project,
            build.failures().join(", ")
        );
    }
    Ok(())
}

/// One status line per unit of `build`, default first.
pub fn report(out: &OutputConfig, build: &BuildReport) -> String {
    let units = std::iter::once(("default", &build.default)).chain(
        build
            .variants
            .iter()
            .map(|variant| (variant.name.as_str(), &variant.outcome)),
    );

    units
        .map(|(name, status)| unit_line(out, &build.project, name, status))
        .collect::<Vec<_>>()
        .join("\n")
}

fn unit_line(out: &OutputConfig, project: &str, unit: &str, status: &UnitStatus) -> String {
    let marker = if status.success() {
        Marker::Ok
    } else {
        Marker::Err
    };
    out.line(marker, &format!("{} {}: {}", project, unit, status))
}
