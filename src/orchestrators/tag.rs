//! Re-tagging of locally built images under the workspace organization.
//!
//! The images a unit produced are the `tag` entries of its docker build
//! options. Each of them must exist locally before anything is tagged. The
//! default unit's images are re-tagged as `<org>/<repository>:<tag>`; a
//! variant's as `<org>/<image>-<tag>`, since a variant image already carries
//! its variant in the tag and keeps it.

use log::{info, warn};
use serde::Serialize;

use super::VariantOutcome;
use crate::config::{self, VariantManifest, VariantSelection};
use crate::docker::DockerOperations;
use crate::error::{Error, Result};
use crate::filesystem::Host;

/// Outcome of tagging one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum TagOutcome {
    /// Source images were found; `images` were tagged, `failed` were not.
    Tagged {
        images: Vec<String>,
        failed: Vec<String>,
    },
    /// The unit was aborted before tagging anything.
    Aborted { message: String },
}

impl TagOutcome {
    pub fn success(&self) -> bool {
        matches!(self, TagOutcome::Tagged { failed, .. } if failed.is_empty())
    }

    fn images(&self) -> &[String] {
        match self {
            TagOutcome::Tagged { images, .. } => images,
            TagOutcome::Aborted { .. } => &[],
        }
    }
}

/// Per-unit tag outcomes of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagReport {
    pub project: String,
    pub variants: Vec<VariantOutcome<TagOutcome>>,
    pub default: TagOutcome,
}

impl TagReport {
    pub fn success(&self) -> bool {
        self.default.success() && self.variants.iter().all(|v| v.outcome.success())
    }

    /// Every image tag created, variants first.
    pub fn tags(&self) -> Vec<String> {
        self.variants
            .iter()
            .flat_map(|v| v.outcome.images().iter().cloned())
            .chain(self.default.images().iter().cloned())
            .collect()
    }
}

/// Strip a trailing `:tag` from an image reference, leaving a registry
/// port such as `localhost:5000/api` intact.
fn repository(image: &str) -> &str {
    let slash = image.rfind('/');
    match image.rfind(':') {
        Some(colon) if slash.map_or(true, |slash| colon > slash) => &image[..colon],
        _ => image,
    }
}

/// The target reference for `source` re-tagged as `tag`.
pub fn target_name(organization: &str, source: &str, tag: &str, variant: bool) -> String {
    let name = if variant {
        format!("{}-{}", source, tag)
    } else {
        format!("{}:{}", repository(source), tag)
    };

    if organization.is_empty() {
        name
    } else {
        format!("{}/{}", organization, name)
    }
}

/// Tag the selected variants of `project`, then its default unit.
///
/// A unit with no source images, or with a source image missing locally,
/// is aborted before any tag command runs for it; the remaining units are
/// still processed.
pub fn tag<H, D>(
    host: &H,
    docker: &D,
    project: &str,
    tags: &[String],
    selection: &VariantSelection,
) -> Result<TagReport>
where
    H: Host + ?Sized,
    D: DockerOperations + ?Sized,
{
    let metadata = config::load_project(host, project)?;
    let variants = metadata.manifest.select(selection)?;
    let organization = metadata.workspace.organization.as_str();

    info!("Start Project: {}", project);

    let mut outcomes = Vec::with_capacity(variants.len());
    for (name, unit) in variants {
        info!("Start Variant: {}", name);
        let outcome = tag_unit(docker, organization, tags, &unit, true);
        info!("Finish Variant: {}", name);
        outcomes.push(VariantOutcome { name, outcome });
    }

    info!("Start Default");
    let default = tag_unit(
        docker,
        organization,
        tags,
        &metadata.manifest.default_unit(),
        false,
    );
    info!("Finish Default");

    info!("Finish Project: {}", project);

    Ok(TagReport {
        project: project.to_string(),
        variants: outcomes,
        default,
    })
}

fn tag_unit<D: DockerOperations + ?Sized>(
    docker: &D,
    organization: &str,
    tags: &[String],
    unit: &VariantManifest,
    variant: bool,
) -> TagOutcome {
    match try_tag_unit(docker, organization, tags, unit, variant) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("{}", e);
            TagOutcome::Aborted {
                message: e.to_string(),
            }
        }
    }
}

fn try_tag_unit<D: DockerOperations + ?Sized>(
    docker: &D,
    organization: &str,
    tags: &[String],
    unit: &VariantManifest,
    variant: bool,
) -> Result<TagOutcome> {
    let sources = &unit.build.options.tag;
    if sources.is_empty() {
        return Err(Error::SourceTagsNotFound);
    }

    for source in sources {
        if !docker.image_exists(source)? {
            return Err(Error::SourceTagNotFound {
                tag: source.clone(),
            });
        }
    }

    let mut images = Vec::new();
    let mut failed = Vec::new();

    for source in sources {
        let targets: Vec<String> = tags
            .iter()
            .map(|tag| target_name(organization, source, tag, variant))
            .collect();

        let results = docker.tag(source, &targets);
        for (target, result) in targets.into_iter().zip(results.iter()) {
            if result.success() {
                info!("Tagged: {} as {}", source, target);
                images.push(target);
            } else {
                warn!(
                    "Failed to tag {} as {}: {}",
                    source,
                    target,
                    result.stderr_text().trim()
                );
                failed.push(target);
            }
        }
    }

    Ok(TagOutcome::Tagged { images, failed })
}
