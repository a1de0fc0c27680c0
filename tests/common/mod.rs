//! Shared test utilities for the E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_workspace(configs::WORKSPACE);
//!     fixture.command().arg("dirty").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::git_available;
    pub use super::TestFixture;
}

/// Workspace and manifest documents used across tests.
#[allow(dead_code)]
pub mod configs {
    /// Two projects sharing one artifact.
    pub const WORKSPACE: &str = r#"{
    "organization": "acme",
    "affected": {"defaultBase": "main"},
    "projects": {
        "api": {"root": "apps/api"},
        "web": {"root": "apps/web"}
    },
    "artifacts": {
        "proto": ["shared/proto/api.proto"]
    }
}"#;

    /// Default unit consuming `proto`, plus a `slim` variant with its own context.
    pub const API_MANIFEST: &str = r#"{
    "build": {"context": ".", "options": {"tag": ["api:latest"]}},
    "artifacts": {"proto": "generated/proto"},
    "variants": {
        "slim": {"build": {"context": "slim", "options": {"tag": ["api:slim"]}}}
    }
}"#;

    /// Plain project with no artifacts.
    pub const WEB_MANIFEST: &str = r#"{
    "build": {"context": ".", "options": {"tag": ["web:latest"]}}
}"#;
}

/// Whether a `git` binary is on `PATH`. Tests that need one return early
/// when it is not.
#[allow(dead_code)]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// A temporary workspace directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `gam.json`.
    pub fn with_workspace(self, content: &str) -> Self {
        self.with_file("gam.json", content)
    }

    /// Write `gam-manifest.json` under a project root.
    pub fn with_manifest(self, root: &str, content: &str) -> Self {
        self.with_file(&format!("{}/gam-manifest.json", root), content)
    }

    /// The two-project workspace from [`configs`].
    pub fn with_sample_workspace(self) -> Self {
        self.with_workspace(configs::WORKSPACE)
            .with_manifest("apps/api", configs::API_MANIFEST)
            .with_manifest("apps/web", configs::WEB_MANIFEST)
            .with_file("shared/proto/api.proto", "syntax = \"proto3\";\n")
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Initialize a repository on branch `main` and commit everything.
    pub fn with_git_commit(self) -> Self {
        self.git(&["init", "--quiet", "--initial-branch=main"]);
        self.git(&["config", "user.email", "test@example.com"]);
        self.git(&["config", "user.name", "Test"]);
        self.git(&["config", "commit.gpgsign", "false"]);
        self.commit_all("initial");
        self
    }

    /// Stage everything and commit it.
    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "--all"]);
        self.git(&["commit", "--quiet", "-m", message]);
    }

    /// Run git in the fixture directory, panicking on failure.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A `gam` command rooted at this fixture.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("gam");
        cmd.current_dir(self.path())
            .env_remove("GAM_ROOT")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_sample_workspace_is_valid_json() {
        for document in [configs::WORKSPACE, configs::API_MANIFEST, configs::WEB_MANIFEST] {
            serde_json::from_str::<serde_json::Value>(document).unwrap();
        }
    }
}
