//! # Workspace and Manifest Model
//!
//! This module defines the two JSON documents gam reads and the logic for
//! loading them through a [`Host`].
//!
//! ## Key Components
//!
//! - **`Workspace`** (`gam.json` at the host root): the organization name,
//!   the default git base for change detection, every project's root
//!   directory, and the named artifacts with their source paths.
//!
//! - **`ProjectManifest`** (`gam-manifest.json` in each project root): the
//!   default unit's build context, docker build options and consumed
//!   artifacts, plus optional variant overrides.
//!
//! - **`VariantManifest`**: the effective, fully resolved configuration of
//!   one unit. The default unit is taken from the manifest as is; a variant
//!   is computed by [`ProjectManifest::variant`], which overlays the variant's
//!   partial override on the default and returns a new value.
//!
//! ## Variant Merge Rules
//!
//! - `build.context`: the variant's value when present.
//! - `build.options`: merged field by field (see
//!   [`DockerBuildOptions::merged`]).
//! - `artifacts`: replaced wholesale when the variant declares it.
//!
//! Variants keep their declaration order from the manifest. Documents are
//! read fresh on every call; nothing is cached between operations.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::defaults::{DEFAULT_BASE, MANIFEST_FILE, WORKSPACE_FILE};
use crate::docker::DockerBuildOptions;
use crate::error::{Error, Result};
use crate::filesystem::Host;
use crate::path;

/// Change-detection settings of the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedConfig {
    /// Git ref compared against when no base is given.
    #[serde(rename = "defaultBase", default = "default_base")]
    pub default_base: String,
}

fn default_base() -> String {
    DEFAULT_BASE.to_string()
}

impl Default for AffectedConfig {
    fn default() -> Self {
        Self {
            default_base: default_base(),
        }
    }
}

/// Location of one project in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project directory relative to the workspace root.
    pub root: String,
}

/// The `gam.json` workspace document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Image namespace prefixed to generated tags.
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub affected: AffectedConfig,
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectConfig>,
    /// Artifact name -> source paths relative to the workspace root.
    #[serde(default)]
    pub artifacts: BTreeMap<String, Vec<String>>,
}

impl Workspace {
    /// Look up a project by name.
    pub fn project(&self, name: &str) -> Result<&ProjectConfig> {
        self.projects.get(name).ok_or_else(|| Error::ProjectNotFound {
            project: name.to_string(),
        })
    }

    /// Path of a project's manifest relative to the workspace root.
    pub fn manifest_path(&self, name: &str) -> Result<String> {
        Ok(path::join(&self.project(name)?.root, MANIFEST_FILE))
    }
}

fn default_context() -> String {
    ".".to_string()
}

/// Docker build settings of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Build context relative to the project root.
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default)]
    pub options: DockerBuildOptions,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            context: default_context(),
            options: DockerBuildOptions::default(),
        }
    }
}

/// Effective configuration of a single unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantManifest {
    pub build: BuildConfig,
    /// Artifact name -> destination directory relative to the project root.
    pub artifacts: BTreeMap<String, String>,
}

/// Partial build settings declared by a variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuildOverride {
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub options: Option<DockerBuildOptions>,
}

/// Partial unit configuration declared under `variants`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VariantOverride {
    #[serde(default)]
    pub build: Option<BuildOverride>,
    #[serde(default)]
    pub artifacts: Option<BTreeMap<String, String>>,
}

/// The `gam-manifest.json` project document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub artifacts: BTreeMap<String, String>,
    /// Variant overrides in declaration order.
    #[serde(default, deserialize_with = "ordered_variants")]
    pub variants: Vec<(String, VariantOverride)>,
}

/// Which units of a project an operation covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VariantSelection {
    /// Only the default unit.
    #[default]
    DefaultOnly,
    /// The default unit and every declared variant.
    All,
    /// The default unit and the named variants.
    Named(Vec<String>),
}

impl ProjectManifest {
    /// The default unit's configuration.
    pub fn default_unit(&self) -> VariantManifest {
        VariantManifest {
            build: self.build.clone(),
            artifacts: self.artifacts.clone(),
        }
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|(name, _)| name.as_str())
    }

    /// The effective configuration of a variant, merged over the default.
    pub fn variant(&self, name: &str) -> Result<VariantManifest> {
        let (_, over) = self
            .variants
            .iter()
            .find(|(variant, _)| variant == name)
            .ok_or_else(|| Error::VariantNotFound {
                variant: name.to_string(),
            })?;
        Ok(self.merge(over))
    }

    /// Every variant with its effective configuration, in declaration order.
    pub fn effective_variants(&self) -> Vec<(String, VariantManifest)> {
        self.variants
            .iter()
            .map(|(name, over)| (name.clone(), self.merge(over)))
            .collect()
    }

    /// Resolve a selection to effective variant configurations.
    ///
    /// Named variants are returned in the requested order, without
    /// duplicates. An unknown name fails the whole selection.
    pub fn select(&self, selection: &VariantSelection) -> Result<Vec<(String, VariantManifest)>> {
        match selection {
            VariantSelection::DefaultOnly => Ok(Vec::new()),
            VariantSelection::All => Ok(self.effective_variants()),
            VariantSelection::Named(names) => {
                let mut selected: Vec<(String, VariantManifest)> = Vec::new();
                for name in names {
                    let manifest = self.variant(name)?;
                    if !selected.iter().any(|(existing, _)| existing == name) {
                        selected.push((name.clone(), manifest));
                    }
                }
                Ok(selected)
            }
        }
    }

    fn merge(&self, over: &VariantOverride) -> VariantManifest {
        let mut build = self.build.clone();
        if let Some(build_override) = &over.build {
            if let Some(context) = &build_override.context {
                build.context = context.clone();
            }
            if let Some(options) = &build_override.options {
                build.options = self.build.options.merged(options);
            }
        }

        VariantManifest {
            build,
            artifacts: over
                .artifacts
                .clone()
                .unwrap_or_else(|| self.artifacts.clone()),
        }
    }
}

fn ordered_variants<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, VariantOverride)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVariants;

    impl<'de> Visitor<'de> for OrderedVariants {
        type Value = Vec<(String, VariantOverride)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of variant names to variant manifests")
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut variants: Vec<(String, VariantOverride)> = Vec::new();
            while let Some((name, manifest)) = map.next_entry::<String, VariantOverride>()? {
                match variants.iter_mut().find(|(existing, _)| *existing == name) {
                    Some(entry) => entry.1 = manifest,
                    None => variants.push((name, manifest)),
                }
            }
            Ok(variants)
        }
    }

    deserializer.deserialize_any(OrderedVariants)
}

/// A project's workspace entry and manifest, loaded together.
#[derive(Debug, Clone)]
pub struct ProjectMetadata {
    pub workspace: Workspace,
    pub manifest: ProjectManifest,
}

impl ProjectMetadata {
    /// The project's root directory relative to the workspace root.
    pub fn root<'a>(&'a self, project: &str) -> Result<&'a str> {
        Ok(self.workspace.project(project)?.root.as_str())
    }
}

fn manifest_error(path: &str, e: impl fmt::Display) -> Error {
    Error::Manifest {
        path: path.to_string(),
        message: e.to_string(),
    }
}

/// Parse a workspace document.
pub fn parse_workspace(content: &str) -> Result<Workspace> {
    serde_json::from_str(content).map_err(|e| manifest_error(WORKSPACE_FILE, e))
}

/// Parse a project manifest document read from `path`.
pub fn parse_manifest(content: &str, path: &str) -> Result<ProjectManifest> {
    serde_json::from_str(content).map_err(|e| manifest_error(path, e))
}

fn read_document<H: Host + ?Sized>(host: &H, path: &str) -> Result<String> {
    if !host.exists(path) {
        return Err(manifest_error(path, "file not found"));
    }
    host.read_to_string(path)
}

/// Load `gam.json` from the host root.
pub fn load_workspace<H: Host + ?Sized>(host: &H) -> Result<Workspace> {
    parse_workspace(&read_document(host, WORKSPACE_FILE)?)
}

/// Load one project's manifest.
pub fn load_manifest<H: Host + ?Sized>(host: &H, workspace: &Workspace, project: &str) -> Result<ProjectManifest> {
    let path = workspace.manifest_path(project)?;
    parse_manifest(&read_document(host, &path)?, &path)
}

/// Load the manifest of every project in the workspace.
pub fn load_manifests<H: Host + ?Sized>(host: &H, workspace: &Workspace) -> Result<BTreeMap<String, ProjectManifest>> {
    workspace
        .projects
        .keys()
        .map(|name| Ok((name.clone(), load_manifest(host, workspace, name)?)))
        .collect()
}

/// Load the workspace and one project's manifest.
pub fn load_project<H: Host + ?Sized>(host: &H, project: &str) -> Result<ProjectMetadata> {
    let workspace = load_workspace(host)?;
    let manifest = load_manifest(host, &workspace, project)?;
    Ok(ProjectMetadata { workspace, manifest })
}
