//! # Affected-Unit Resolution
//!
//! Given the files changed between two revisions, work out which projects
//! and which of their variants need attention.
//!
//! A unit is **sync-affected** when it consumes an artifact one of whose
//! source paths changed; that check wins over the path-based one. Otherwise
//! it is **build-affected** when a changed file lies under its build context
//! or is its Dockerfile. A project appears in the result when its default
//! unit or any variant is affected; `variants` lists only the variants that
//! are affected themselves, in manifest order.
//!
//! [`resolve`] is a pure function of its inputs. [`affected`] wraps it with
//! workspace loading and git change detection.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::Serialize;

use crate::config::{self, ProjectManifest, VariantManifest, Workspace};
use crate::defaults::DEFAULT_HEAD;
use crate::error::{Error, Result};
use crate::filesystem::Host;
use crate::git::GitOperations;
use crate::path;

/// How one project is affected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AffectedProject {
    /// An artifact consumed by the project or one of its variants changed.
    pub sync: bool,
    /// Variants affected in their own right, in declaration order.
    pub variants: Vec<String>,
}

/// Affected projects by name.
pub type AffectedResult = BTreeMap<String, AffectedProject>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Impact {
    Sync,
    Build,
    Unaffected,
}

/// Names of the workspace artifacts with at least one changed source path.
pub fn affected_artifacts(artifacts: &BTreeMap<String, Vec<String>>, changed: &[String]) -> BTreeSet<String> {
    artifacts
        .iter()
        .filter(|(_, sources)| {
            sources
                .iter()
                .any(|source| changed.iter().any(|file| path::contains(source, file)))
        })
        .map(|(name, _)| name.clone())
        .collect()
}

fn check_artifacts<'a>(
    workspace: &Workspace,
    names: impl IntoIterator<Item = &'a String>,
) -> Result<()> {
    for name in names {
        if !workspace.artifacts.contains_key(name) {
            return Err(Error::ArtifactNotFound {
                artifact: name.clone(),
            });
        }
    }
    Ok(())
}

fn validate(workspace: &Workspace, manifest: &ProjectManifest) -> Result<()> {
    check_artifacts(workspace, manifest.artifacts.keys())?;
    for (_, over) in &manifest.variants {
        if let Some(artifacts) = &over.artifacts {
            check_artifacts(workspace, artifacts.keys())?;
        }
    }
    Ok(())
}

fn impact(root: &str, unit: &VariantManifest, artifacts: &BTreeSet<String>, changed: &[String]) -> Impact {
    if unit.artifacts.keys().any(|name| artifacts.contains(name)) {
        return Impact::Sync;
    }

    let context = path::join(root, &unit.build.context);
    if changed.iter().any(|file| path::contains(&context, file)) {
        return Impact::Build;
    }

    if let Some(dockerfile) = &unit.build.options.file {
        let dockerfile = path::join(root, dockerfile);
        if changed.iter().any(|file| path::contains(&dockerfile, file)) {
            return Impact::Build;
        }
    }

    Impact::Unaffected
}

/// Compute the affected projects for a change-set.
///
/// `manifests` must hold a manifest for every workspace project. Fails when
/// a manifest refers to an artifact the workspace does not declare.
pub fn resolve(
    workspace: &Workspace,
    manifests: &BTreeMap<String, ProjectManifest>,
    changed: &[String],
) -> Result<AffectedResult> {
    let changed: Vec<String> = changed.iter().map(|file| path::normalize(file)).collect();
    let artifacts = affected_artifacts(&workspace.artifacts, &changed);
    debug!("Affected artifacts: {:?}", artifacts);

    let mut result = AffectedResult::new();

    for (name, project) in &workspace.projects {
        let manifest = manifests.get(name).ok_or_else(|| Error::ProjectNotFound {
            project: name.clone(),
        })?;
        validate(workspace, manifest)?;

        let mut entry: Option<AffectedProject> = None;
        let mut mark = |impact: Impact, variant: Option<&str>| {
            if impact == Impact::Unaffected {
                return;
            }
            let entry = entry.get_or_insert_with(AffectedProject::default);
            if impact == Impact::Sync {
                entry.sync = true;
            }
            if let Some(variant) = variant {
                entry.variants.push(variant.to_string());
            }
        };

        mark(impact(&project.root, &manifest.default_unit(), &artifacts, &changed), None);
        for (variant, unit) in manifest.effective_variants() {
            mark(impact(&project.root, &unit, &artifacts, &changed), Some(variant.as_str()));
        }

        if let Some(entry) = entry {
            result.insert(name.clone(), entry);
        }
    }

    Ok(result)
}

/// Resolve affected projects for the changes between `base` and `head`.
///
/// `base` defaults to the workspace's `affected.defaultBase`, `head` to
/// `HEAD`.
pub fn affected<H, G>(host: &H, git: &G, base: Option<&str>, head: Option<&str>) -> Result<AffectedResult>
where
    H: Host + ?Sized,
    G: GitOperations + ?Sized,
{
    let workspace = config::load_workspace(host)?;
    let base = base.unwrap_or(workspace.affected.default_base.as_str());
    let head = head.unwrap_or(DEFAULT_HEAD);

    let changed = git.changed_files(base, head)?;
    debug!("{} files changed between {} and {}", changed.len(), base, head);

    let manifests = config::load_manifests(host, &workspace)?;
    resolve(&workspace, &manifests, &changed)
}
