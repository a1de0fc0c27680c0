//! Default values for gam configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

/// Maximum number of bytes captured per output stream of a child process.
///
/// Output beyond this limit is dropped and the capture is flagged as
/// truncated. Overridden by `--max-buffer` or `GAM_MAX_BUFFER`.
pub const DEFAULT_MAX_BUFFER: usize = 10 * 1024 * 1024;

/// Workspace file name, resolved against the workspace root.
pub const WORKSPACE_FILE: &str = "gam.json";

/// Per-project manifest file name, resolved against each project root.
pub const MANIFEST_FILE: &str = "gam-manifest.json";

/// Head revision used by change detection when none is given.
pub const DEFAULT_HEAD: &str = "HEAD";

/// Base revision used when the workspace does not declare `affected.defaultBase`.
pub const DEFAULT_BASE: &str = "main";

/// Dockerfile name used when a build declares no `file` option.
pub const DOCKERFILE: &str = "Dockerfile";
