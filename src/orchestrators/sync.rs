//! Artifact synchronization into a project's units.
//!
//! Every artifact a unit consumes is copied from its workspace source paths
//! into the unit's destination directory. Copies are skipped when the
//! destination already holds identical content, compared by SHA-256 digest.
//! A source is read and hashed at most once per run, however many
//! destinations it has.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::{self, ProjectManifest, Workspace};
use crate::error::{Error, Result};
use crate::filesystem::Host;
use crate::path;

/// A destination that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub destination: String,
    pub message: String,
}

/// What one sync run did, by destination path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub project: String,
    /// Destinations written.
    pub synced: Vec<String>,
    /// Destinations already up to date.
    pub skipped: Vec<String>,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// A source file whose content and digest are loaded on first use.
struct Source<'a> {
    path: &'a str,
    content: Option<Vec<u8>>,
    digest: Option<String>,
}

impl<'a> Source<'a> {
    fn new(path: &'a str) -> Self {
        Self {
            path,
            content: None,
            digest: None,
        }
    }

    fn content<H: Host + ?Sized>(&mut self, host: &H) -> Result<&[u8]> {
        if self.content.is_none() {
            self.content = Some(host.read(self.path)?);
        }
        Ok(self.content.as_deref().unwrap_or_default())
    }

    fn digest<H: Host + ?Sized>(&mut self, host: &H) -> Result<String> {
        if let Some(digest) = &self.digest {
            return Ok(digest.clone());
        }
        let computed = digest(self.content(host)?);
        debug!("Source {} has digest {}", self.path, computed);
        self.digest = Some(computed.clone());
        Ok(computed)
    }
}

/// Destination directories per artifact name, across the default unit and
/// every variant, relative to the workspace root.
fn destinations(root: &str, manifest: &ProjectManifest) -> BTreeMap<String, BTreeSet<String>> {
    let mut destinations: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    let units = std::iter::once(manifest.default_unit())
        .chain(manifest.effective_variants().into_iter().map(|(_, unit)| unit));
    for unit in units {
        for (name, directory) in unit.artifacts {
            destinations
                .entry(name)
                .or_default()
                .insert(path::join(root, &directory));
        }
    }

    destinations
}

/// Destination file paths per source path.
fn artifact_map(
    workspace: &Workspace,
    destinations: &BTreeMap<String, BTreeSet<String>>,
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (name, directories) in destinations {
        let sources = workspace
            .artifacts
            .get(name)
            .ok_or_else(|| Error::ArtifactNotFound {
                artifact: name.clone(),
            })?;

        for source in sources {
            let source = path::normalize(source);
            let file_name = path::file_name(&source);
            let targets = map.entry(source).or_default();
            for directory in directories {
                targets.insert(path::join(directory, &file_name));
            }
        }
    }

    Ok(map)
}

/// Copy every artifact `project` consumes into its destinations.
///
/// Fails before writing anything when an artifact is undeclared or a source
/// path is missing. Once copying starts, a destination that cannot be
/// written is recorded and the remaining destinations are still processed.
pub fn sync<H: Host + ?Sized>(host: &mut H, project: &str) -> Result<SyncReport> {
    let metadata = config::load_project(&*host, project)?;
    let root = metadata.root(project)?;

    info!("Start Project: {}", project);

    let destinations = destinations(root, &metadata.manifest);
    let map = artifact_map(&metadata.workspace, &destinations)?;

    for source in map.keys() {
        if !host.exists(source) {
            return Err(Error::ArtifactSourceNotFound {
                path: source.clone(),
            });
        }
    }

    let mut report = SyncReport {
        project: project.to_string(),
        ..Default::default()
    };

    for (source_path, targets) in &map {
        let mut source = Source::new(source_path);

        for destination in targets {
            match sync_one(host, &mut source, destination) {
                Ok(true) => report.synced.push(destination.clone()),
                Ok(false) => report.skipped.push(destination.clone()),
                Err(e) => {
                    warn!("Failed to sync {} to {}: {}", source_path, destination, e);
                    report.failed.push(SyncFailure {
                        destination: destination.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    info!("Finish Project: {}", project);
    Ok(report)
}

/// Returns whether the destination was written.
fn sync_one<H: Host + ?Sized>(host: &mut H, source: &mut Source<'_>, destination: &str) -> Result<bool> {
    if host.exists(destination) {
        let current = digest(&host.read(destination)?);
        if current == source.digest(&*host)? {
            debug!("Skipping {}: up to date", destination);
            return Ok(false);
        }
    }

    info!("Syncing: {} to {}", source.path, destination);
    let content = source.content(&*host)?.to_vec();
    host.write(destination, &content)?;
    Ok(true)
}
