//! # Tag Command Implementation
//!
//! Re-tags the images a project's units built under the workspace
//! organization, once per `--tag`, and prints every image created.

use anyhow::Result;
use clap::Args;

use gam::orchestrators::{self, TagOutcome};
use gam::output::Marker;

use super::{Context, VariantArgs};

/// Re-tag a project's local images under the workspace organization
#[derive(Args, Debug)]
pub struct TagArgs {
    /// Project name as declared in gam.json
    pub project: String,

    /// Tag to apply (repeatable)
    #[arg(long = "tag", value_name = "TAG", required = true)]
    pub tags: Vec<String>,

    #[command(flatten)]
    pub variants: VariantArgs,
}

/// Execute the `tag` command.
pub fn execute(args: TagArgs, context: &Context) -> Result<()> {
    let report = orchestrators::tag(
        &context.host(),
        &context.docker(),
        &args.project,
        &args.tags,
        &args.variants.selection(),
    )?;
    let out = &context.out;

    for image in report.tags() {
        println!("{}", out.line(Marker::Ok, &image));
    }

    let units = report
        .variants
        .iter()
        .map(|variant| (variant.name.as_str(), &variant.outcome))
        .chain(std::iter::once(("default", &report.default)));

    let mut failed = Vec::new();
    for (unit, outcome) in units {
        let lines = failure_lines(unit, outcome);
        if lines.is_empty() {
            continue;
        }
        for (marker, text) in lines {
            eprintln!("{}", out.line(marker, &text));
        }
        failed.push(unit.to_string());
    }

    if !failed.is_empty() {
        anyhow::bail!("Tag of {} failed for: {}", report.project, failed.join(", "));
    }
    Ok(())
}

/// Status lines for a unit that did not tag everything. Targets that failed
/// next to ones that succeeded are warnings; a unit with nothing tagged is
/// an error.
fn failure_lines(unit: &str, outcome: &TagOutcome) -> Vec<(Marker, String)> {
    match outcome {
        TagOutcome::Aborted { message } => vec![(Marker::Err, format!("{}: {}", unit, message))],
        TagOutcome::Tagged { images, failed } => {
            let marker = if images.is_empty() {
                Marker::Err
            } else {
                Marker::Warn
            };
            failed
                .iter()
                .map(|image| (marker, format!("{}: could not tag {}", unit, image)))
                .collect()
        }
    }
}
