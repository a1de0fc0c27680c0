//! # Error Handling
//!
//! This module defines the centralized error type for `gam`. It uses the
//! `thiserror` library to build a single `Error` enum that covers every
//! failure the library reports, with a message naming the offending option,
//! project, variant, artifact or tag.
//!
//! ## Taxonomy
//!
//! - **Schema violations** (`Error::Option`): an option was used in a way its
//!   descriptor forbids. Fatal to the single command-building call.
//! - **Lookup failures** (`ProjectNotFound`, `VariantNotFound`,
//!   `ArtifactNotFound`, `ArtifactSourceNotFound`, `SourceTagsNotFound`,
//!   `SourceTagNotFound`): fatal to the current unit or operation.
//! - **Process failures**: a non-zero exit status is *not* an error. It is
//!   carried as data in [`crate::process::ProcessResult`]. Only a failure to
//!   spawn the child at all surfaces as `Error::Spawn` on the synchronous path.
//!
//! The `Result` type alias is used to return `Result<T, Error>` from
//! functions throughout the crate.

use std::fmt;

use thiserror::Error;

/// The specific way an option invocation broke its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionViolation {
    /// A `Required` option was invoked without an argument.
    MissingArgument,
    /// A `None` option was invoked with an argument.
    TooManyArguments,
    /// A `Single` option was invoked a second time.
    Duplicate,
    /// No option with this name is registered on the command segment.
    Unknown,
}

impl fmt::Display for OptionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            OptionViolation::MissingArgument => "Argument missing",
            OptionViolation::TooManyArguments => "Too many arguments",
            OptionViolation::Duplicate => "Option occurs more than once",
            OptionViolation::Unknown => "Unknown option",
        };
        f.write_str(message)
    }
}

/// Main error type for gam operations
#[derive(Error, Debug)]
pub enum Error {
    /// An option was invoked in violation of its descriptor.
    #[error("Option error: {option}: {violation}")]
    Option {
        option: String,
        violation: OptionViolation,
    },

    /// A command segment name did not match any declared segment.
    #[error("Command segment not found: {segment}")]
    SegmentNotFound { segment: String },

    /// The project is not declared in the workspace.
    #[error("Project not found: {project}")]
    ProjectNotFound { project: String },

    /// The variant is not declared in the project manifest.
    #[error("Variant: {variant} not found")]
    VariantNotFound { variant: String },

    /// An artifact name is referenced by a manifest but not declared in the
    /// workspace.
    #[error("Artifact: {artifact} not found")]
    ArtifactNotFound { artifact: String },

    /// A workspace artifact source path does not exist on the host.
    #[error("Artifact Source Path: {path} not found")]
    ArtifactSourceNotFound { path: String },

    /// The manifest declares no `tag` build option to tag from.
    #[error("Source tags not found")]
    SourceTagsNotFound,

    /// A declared source tag has no local image.
    #[error("Source tag: {tag} not found")]
    SourceTagNotFound { tag: String },

    /// The child process could not be spawned at all.
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A git step whose output is needed to continue exited unsuccessfully.
    #[error("Git command failed: {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// A workspace or manifest document could not be parsed.
    #[error("Manifest error in {path}: {message}")]
    Manifest { path: String, message: String },

    /// A host filesystem operation failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    pub(crate) fn option(option: &str, violation: OptionViolation) -> Self {
        Error::Option {
            option: option.to_string(),
            violation,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
