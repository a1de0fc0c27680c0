//! Recording test doubles for the docker and git seams.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::docker::{DockerBuildOptions, DockerOperations};
use crate::error::{Error, Result};
use crate::git::{GitOperations, HashOptions};
use crate::process::ProcessResult;

/// Docker double that records every call and never spawns anything.
#[derive(Default)]
pub struct MockDockerOperations {
    pub builds: Mutex<Vec<(PathBuf, DockerBuildOptions)>>,
    pub tags: Mutex<Vec<(String, Vec<String>)>>,
    pub image_checks: Mutex<Vec<String>>,
    /// Images reported as present by `image_exists`.
    pub images: HashSet<String>,
    /// Exit status per build context; contexts not listed exit 0.
    pub build_status: HashMap<PathBuf, i32>,
    /// Build output replayed as stdout.
    pub build_stdout: String,
}

impl MockDockerOperations {
    pub fn with_images(images: &[&str]) -> Self {
        Self {
            images: images.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn built_contexts(&self) -> Vec<PathBuf> {
        self.builds
            .lock()
            .unwrap()
            .iter()
            .map(|(context, _)| context.clone())
            .collect()
    }
}

impl DockerOperations for MockDockerOperations {
    fn build(&self, context: &Path, options: &DockerBuildOptions) -> Result<ProcessResult> {
        self.builds
            .lock()
            .unwrap()
            .push((context.to_path_buf(), options.clone()));
        let status = self.build_status.get(context).copied().unwrap_or(0);
        Ok(ProcessResult::from_output(status, &self.build_stdout, ""))
    }

    fn tag(&self, source: &str, targets: &[String]) -> Vec<ProcessResult> {
        self.tags
            .lock()
            .unwrap()
            .push((source.to_string(), targets.to_vec()));
        targets
            .iter()
            .map(|_| ProcessResult::from_output(0, "", ""))
            .collect()
    }

    fn image_exists(&self, image: &str) -> Result<bool> {
        self.image_checks.lock().unwrap().push(image.to_string());
        Ok(self.images.contains(image))
    }
}

/// Git double returning a fixed change-set from a clean repository with no
/// commits.
#[derive(Default)]
pub struct MockGitOperations {
    pub changed: Vec<String>,
    pub fail: bool,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl MockGitOperations {
    pub fn with_changes(changed: &[&str]) -> Self {
        Self {
            changed: changed.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl GitOperations for MockGitOperations {
    fn changed_files(&self, base: &str, head: &str) -> Result<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((base.to_string(), head.to_string()));
        if self.fail {
            return Err(Error::GitCommand {
                command: format!("git merge-base {} {}", base, head),
                stderr: "fatal: Not a valid object name".to_string(),
            });
        }
        Ok(self.changed.clone())
    }

    fn repo_dirty(&self) -> Result<bool> {
        Ok(false)
    }

    fn hash(&self, _options: HashOptions) -> Result<Option<String>> {
        Ok(None)
    }
}
