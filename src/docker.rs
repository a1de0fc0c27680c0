//! # Docker Adapter
//!
//! Fixed option tables for the `docker`, `docker build`, `docker tag` and
//! `docker images` commands, and typed operations on top of them.
//!
//! The [`DockerOperations`] trait is the seam the orchestrators use, so
//! that tests can record builds and tags without a docker daemon.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::{CommandBuilder, CommandSpec, OptionSpec, Separator};
use crate::error::{Error, Result};
use crate::process::{ProcessHandle, ProcessResult, RunOptions};

/// Global `docker` options.
pub static DOCKER: CommandSpec = CommandSpec::new(
    "docker",
    &[
        OptionSpec::required("config", "--config", Separator::Space),
        OptionSpec::required("context", "--context", Separator::Space),
        OptionSpec::switch("debug", "--debug"),
        OptionSpec::switch("help", "--help"),
        OptionSpec::required("host", "--host", Separator::Space).multiple(),
        OptionSpec::required("logLevel", "--log-level", Separator::Space),
        OptionSpec::switch("tls", "--tls"),
        OptionSpec::required("tlscacert", "--tlscacert", Separator::Space),
        OptionSpec::required("tlscert", "--tlscert", Separator::Space),
        OptionSpec::required("tlskey", "--tlskey", Separator::Space),
        OptionSpec::switch("tlsverify", "--tlsverify"),
        OptionSpec::switch("version", "--version"),
    ],
);

/// `docker build` options.
pub static BUILD: CommandSpec = CommandSpec::new(
    "build",
    &[
        OptionSpec::required("addHost", "--add-host", Separator::Space).multiple(),
        OptionSpec::required("buildArg", "--build-arg", Separator::Space).multiple(),
        OptionSpec::required("cacheFrom", "--cache-from", Separator::Space).multiple(),
        OptionSpec::switch("disableContentTrust", "--disable-content-trust"),
        OptionSpec::required("file", "--file", Separator::Space),
        OptionSpec::required("iidfile", "--iidfile", Separator::Space),
        OptionSpec::required("isolation", "--isolation", Separator::Space),
        OptionSpec::required("label", "--label", Separator::Space).multiple(),
        OptionSpec::required("network", "--network", Separator::Space),
        OptionSpec::switch("noCache", "--no-cache"),
        OptionSpec::required("output", "--output", Separator::Space),
        OptionSpec::required("platform", "--platform", Separator::Space),
        OptionSpec::required("progress", "--progress", Separator::Space),
        OptionSpec::switch("pull", "--pull"),
        OptionSpec::switch("quiet", "--quiet"),
        OptionSpec::required("secret", "--secret", Separator::Space),
        OptionSpec::required("ssh", "--ssh", Separator::Space),
        OptionSpec::required("tag", "--tag", Separator::Space).multiple(),
        OptionSpec::required("target", "--target", Separator::Space),
    ],
);

/// `docker tag` takes no options, only `SOURCE TARGET`.
pub static TAG: CommandSpec = CommandSpec::new("tag", &[]);

/// `docker images` options.
pub static IMAGES: CommandSpec = CommandSpec::new(
    "images",
    &[
        OptionSpec::switch("all", "--all"),
        OptionSpec::switch("digests", "--digests"),
        OptionSpec::required("filter", "--filter", Separator::Space).multiple(),
        OptionSpec::required("format", "--format", Separator::Space),
        OptionSpec::switch("noTrunc", "--no-trunc"),
        OptionSpec::switch("quiet", "--quiet"),
    ],
);

/// Structured `docker build` flags as they appear in a project manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerBuildOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_host: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_arg: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_from: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_content_trust: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iidfile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isolation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

fn pick<T: Clone>(over: &Option<T>, base: &Option<T>) -> Option<T> {
    over.clone().or_else(|| base.clone())
}

fn pick_list(over: &[String], base: &[String]) -> Vec<String> {
    if over.is_empty() {
        base.to_vec()
    } else {
        over.to_vec()
    }
}

impl DockerBuildOptions {
    /// Overlay `over` on top of these options, returning a new value.
    ///
    /// Scalars take the overriding value when present; lists take the
    /// overriding list when it is non-empty.
    pub fn merged(&self, over: &DockerBuildOptions) -> DockerBuildOptions {
        DockerBuildOptions {
            add_host: pick_list(&over.add_host, &self.add_host),
            build_arg: pick_list(&over.build_arg, &self.build_arg),
            cache_from: pick_list(&over.cache_from, &self.cache_from),
            disable_content_trust: pick(&over.disable_content_trust, &self.disable_content_trust),
            file: pick(&over.file, &self.file),
            iidfile: pick(&over.iidfile, &self.iidfile),
            isolation: pick(&over.isolation, &self.isolation),
            label: pick_list(&over.label, &self.label),
            network: pick(&over.network, &self.network),
            no_cache: pick(&over.no_cache, &self.no_cache),
            output: pick(&over.output, &self.output),
            platform: pick(&over.platform, &self.platform),
            progress: pick(&over.progress, &self.progress),
            pull: pick(&over.pull, &self.pull),
            quiet: pick(&over.quiet, &self.quiet),
            secret: pick(&over.secret, &self.secret),
            ssh: pick(&over.ssh, &self.ssh),
            tag: pick_list(&over.tag, &self.tag),
            target: pick(&over.target, &self.target),
        }
    }
}

/// Assemble `docker build [options] <context>` without running it.
pub fn build_command(context: &Path, options: &DockerBuildOptions) -> Result<CommandBuilder> {
    let mut command = CommandBuilder::new(&[&DOCKER, &BUILD]);

    for host in &options.add_host {
        command.value("addHost", host)?;
    }
    for arg in &options.build_arg {
        command.value("buildArg", arg)?;
    }
    for cache in &options.cache_from {
        command.value("cacheFrom", cache)?;
    }
    if options.disable_content_trust == Some(true) {
        command.flag("disableContentTrust")?;
    }
    if let Some(file) = &options.file {
        command.value("file", file)?;
    }
    if let Some(iidfile) = &options.iidfile {
        command.value("iidfile", iidfile)?;
    }
    if let Some(isolation) = &options.isolation {
        command.value("isolation", isolation)?;
    }
    for label in &options.label {
        command.value("label", label)?;
    }
    if let Some(network) = &options.network {
        command.value("network", network)?;
    }
    if options.no_cache == Some(true) {
        command.flag("noCache")?;
    }
    if let Some(output) = &options.output {
        command.value("output", output)?;
    }
    if let Some(platform) = &options.platform {
        command.value("platform", platform)?;
    }
    if let Some(progress) = &options.progress {
        command.value("progress", progress)?;
    }
    if options.pull == Some(true) {
        command.flag("pull")?;
    }
    if options.quiet == Some(true) {
        command.flag("quiet")?;
    }
    if let Some(secret) = &options.secret {
        command.value("secret", secret)?;
    }
    if let Some(ssh) = &options.ssh {
        command.value("ssh", ssh)?;
    }
    for tag in &options.tag {
        command.value("tag", tag)?;
    }
    if let Some(target) = &options.target {
        command.value("target", target)?;
    }

    command.parameter(&context.to_string_lossy());
    Ok(command)
}

/// Run `docker build` synchronously.
pub fn build(context: &Path, options: &DockerBuildOptions, run: &RunOptions) -> Result<ProcessResult> {
    build_command(context, options)?.run_sync(run)
}

/// Start `docker build` on the current tokio runtime.
pub fn build_async(
    context: &Path,
    options: &DockerBuildOptions,
    run: &RunOptions,
) -> Result<ProcessHandle> {
    Ok(build_command(context, options)?.spawn(run))
}

/// Run `docker tag <source> <target>` once per target.
///
/// One result per target, in order. A target that fails, even at spawn
/// time, does not stop the remaining ones.
pub fn tag(source: &str, targets: &[String], run: &RunOptions) -> Vec<ProcessResult> {
    let mut command = CommandBuilder::new(&[&DOCKER, &TAG]);

    targets
        .iter()
        .map(|target| {
            command.reset().parameter(source).parameter(target);
            match command.run_sync(run) {
                Ok(result) => result,
                Err(Error::Spawn { source, .. }) => ProcessResult::from_error(source),
                Err(e) => ProcessResult::from_error(io::Error::other(e.to_string())),
            }
        })
        .collect()
}

/// Start `docker tag <source> <target>` for every target on the current
/// tokio runtime.
pub fn tag_async(source: &str, targets: &[String], run: &RunOptions) -> Vec<ProcessHandle> {
    let mut command = CommandBuilder::new(&[&DOCKER, &TAG]);

    targets
        .iter()
        .map(|target| {
            command.reset().parameter(source).parameter(target);
            command.spawn(run)
        })
        .collect()
}

/// Whether `docker images --quiet <image>` lists anything.
pub fn image_exists(image: &str, run: &RunOptions) -> Result<bool> {
    let mut command = CommandBuilder::new(&[&DOCKER, &IMAGES]);
    command.flag("quiet")?.parameter(image);
    let result = command.run_sync(run)?;
    Ok(!result.sanitized_stdout().is_empty())
}

/// Trait for docker operations - allows mocking in tests
pub trait DockerOperations {
    fn build(&self, context: &Path, options: &DockerBuildOptions) -> Result<ProcessResult>;

    fn tag(&self, source: &str, targets: &[String]) -> Vec<ProcessResult>;

    fn image_exists(&self, image: &str) -> Result<bool>;
}

/// The default implementation of `DockerOperations`, which runs the
/// system's `docker` binary.
#[derive(Debug, Clone, Default)]
pub struct DefaultDockerOperations {
    run: RunOptions,
}

impl DefaultDockerOperations {
    pub fn new(run: RunOptions) -> Self {
        Self { run }
    }
}

impl DockerOperations for DefaultDockerOperations {
    fn build(&self, context: &Path, options: &DockerBuildOptions) -> Result<ProcessResult> {
        build(context, options, &self.run)
    }

    fn tag(&self, source: &str, targets: &[String]) -> Vec<ProcessResult> {
        tag(source, targets, &self.run)
    }

    fn image_exists(&self, image: &str) -> Result<bool> {
        image_exists(image, &self.run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_command_without_options() {
        let command = build_command(Path::new("/repo/app"), &DockerBuildOptions::default()).unwrap();
        assert_eq!(command.to_array(), vec!["docker", "build", "/repo/app"]);
    }

    #[test]
    fn test_build_command_maps_every_kind_of_option() {
        let options = DockerBuildOptions {
            build_arg: vec!["A=1".to_string(), "B=2".to_string()],
            file: Some("docker/Dockerfile".to_string()),
            no_cache: Some(true),
            pull: Some(false),
            tag: vec!["acme/api:1".to_string()],
            target: Some("release".to_string()),
            ..Default::default()
        };

        let command = build_command(Path::new("ctx"), &options).unwrap();
        assert_eq!(
            command.to_string(),
            "docker build --build-arg A=1 --build-arg B=2 --file docker/Dockerfile \
             --no-cache --tag acme/api:1 --target release ctx"
        );
    }

    #[test]
    fn test_build_command_rejects_blank_required_value() {
        let options = DockerBuildOptions {
            file: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_command(Path::new("ctx"), &options),
            Err(Error::Option { .. })
        ));
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let options: DockerBuildOptions = serde_json::from_str(
            r#"{"buildArg": ["X=1"], "noCache": true, "cacheFrom": ["a"], "tag": ["api:latest"]}"#,
        )
        .unwrap();
        assert_eq!(options.build_arg, vec!["X=1"]);
        assert_eq!(options.no_cache, Some(true));
        assert_eq!(options.cache_from, vec!["a"]);
        assert_eq!(options.tag, vec!["api:latest"]);
    }

    #[test]
    fn test_merged_prefers_override_values() {
        let base = DockerBuildOptions {
            file: Some("Dockerfile".to_string()),
            tag: vec!["api:latest".to_string()],
            build_arg: vec!["A=1".to_string()],
            ..Default::default()
        };
        let over = DockerBuildOptions {
            file: Some("Dockerfile.alpine".to_string()),
            tag: vec!["api:alpine".to_string()],
            ..Default::default()
        };

        let merged = base.merged(&over);
        assert_eq!(merged.file.as_deref(), Some("Dockerfile.alpine"));
        assert_eq!(merged.tag, vec!["api:alpine"]);
        assert_eq!(merged.build_arg, vec!["A=1"]);
    }

    #[test]
    fn test_tag_spawn_failure_does_not_abort_other_targets() {
        // No docker binary is assumed here; either way every target yields a result.
        let targets = vec!["acme/api:1".to_string(), "acme/api:2".to_string()];
        let results = tag("api:latest", &targets, &RunOptions::default());
        assert_eq!(results.len(), 2);
    }

    fn unreachable_cwd() -> RunOptions {
        RunOptions::default().with_cwd("/nonexistent/gam-test")
    }

    #[tokio::test]
    async fn test_build_async_spawn_failure_is_reported_in_result() {
        let handle = build_async(Path::new("."), &DockerBuildOptions::default(), &unreachable_cwd())
            .unwrap();
        assert_eq!(handle.command(), "docker build .");

        let result = handle.wait().await;
        assert!(result.error().is_some());
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_build_async_rejects_invalid_options() {
        let options = DockerBuildOptions {
            file: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(build_async(Path::new("."), &options, &RunOptions::default()).is_err());
    }

    #[tokio::test]
    async fn test_tag_async_returns_one_handle_per_target() {
        let targets = vec!["acme/api:1".to_string(), "acme/api:2".to_string()];
        let handles = tag_async("api:latest", &targets, &unreachable_cwd());
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].command(), "docker tag api:latest acme/api:1");
        assert_eq!(handles[1].command(), "docker tag api:latest acme/api:2");

        for handle in handles {
            let result = handle.wait().await;
            assert!(result.error().is_some());
        }
    }
}
