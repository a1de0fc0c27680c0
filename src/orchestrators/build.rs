//! Docker image builds for a project's units.

use std::path::PathBuf;

use log::{info, warn};
use serde::Serialize;

use super::{UnitStatus, VariantOutcome};
use crate::affected::AffectedResult;
use crate::config::{self, VariantManifest, VariantSelection};
use crate::docker::DockerOperations;
use crate::error::Result;
use crate::filesystem::Host;
use crate::path;

/// Per-unit build statuses of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub project: String,
    pub default: UnitStatus,
    pub variants: Vec<VariantOutcome<UnitStatus>>,
}

impl BuildReport {
    /// Whether every unit built successfully.
    pub fn success(&self) -> bool {
        self.default.success() && self.variants.iter().all(|v| v.outcome.success())
    }

    /// Names of the units that did not build, `default` for the default unit.
    pub fn failures(&self) -> Vec<String> {
        let mut failures = Vec::new();
        if !self.default.success() {
            failures.push("default".to_string());
        }
        failures.extend(
            self.variants
                .iter()
                .filter(|v| !v.outcome.success())
                .map(|v| v.name.clone()),
        );
        failures
    }
}

/// Build the default image of `project`, then each selected variant.
///
/// Every unit is attempted; a failing build is recorded and the next unit
/// still runs.
pub fn build<H, D>(host: &H, docker: &D, project: &str, selection: &VariantSelection) -> Result<BuildReport>
where
    H: Host + ?Sized,
    D: DockerOperations + ?Sized,
{
    let metadata = config::load_project(host, project)?;
    let variants = metadata.manifest.select(selection)?;
    let root = metadata.root(project)?;

    info!("Start Project: {}", project);

    info!("Start Default");
    let default = build_unit(host, docker, root, &metadata.manifest.default_unit());
    info!("Finish Default");

    let mut outcomes = Vec::with_capacity(variants.len());
    for (name, unit) in variants {
        info!("Start Variant: {}", name);
        let outcome = build_unit(host, docker, root, &unit);
        info!("Finish Variant: {}", name);
        outcomes.push(VariantOutcome { name, outcome });
    }

    info!("Finish Project: {}", project);

    Ok(BuildReport {
        project: project.to_string(),
        default,
        variants: outcomes,
    })
}

/// Build every project in `affected`: its default image plus the variants
/// listed as affected. Projects run one after another in name order.
pub fn build_affected<H, D>(host: &H, docker: &D, affected: &AffectedResult) -> Result<Vec<BuildReport>>
where
    H: Host + ?Sized,
    D: DockerOperations + ?Sized,
{
    affected
        .iter()
        .map(|(project, entry)| {
            build(
                host,
                docker,
                project,
                &VariantSelection::Named(entry.variants.clone()),
            )
        })
        .collect()
}

fn build_unit<H, D>(host: &H, docker: &D, root: &str, unit: &VariantManifest) -> UnitStatus
where
    H: Host + ?Sized,
    D: DockerOperations + ?Sized,
{
    let context = host.root().join(path::join(root, &unit.build.context));

    let mut options = unit.build.options.clone();
    if let Some(file) = &options.file {
        let dockerfile: PathBuf = host.root().join(path::join(root, file));
        options.file = Some(dockerfile.to_string_lossy().into_owned());
    }

    match docker.build(&context, &options) {
        Ok(result) => {
            for line in result.sanitized_stdout() {
                info!("{}", line);
            }
            let status = UnitStatus::from_result(&result);
            if !status.success() {
                warn!("Build of {} failed: {:?}", context.display(), status);
            }
            status
        }
        Err(e) => {
            warn!("Build of {} failed: {}", context.display(), e);
            UnitStatus::Failed {
                message: e.to_string(),
            }
        }
    }
}
